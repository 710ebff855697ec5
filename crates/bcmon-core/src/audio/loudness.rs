//! Loudness normalisation
//!
//! Single-pass, linear-mode loudness normalisation for monitoring. This is an
//! approximation: delivery-grade compliance needs a two-pass measure then
//! normalise run, which a live player cannot do.

use serde::{Deserialize, Serialize};
use std::fmt;

/// True-peak ceiling in dBTP
pub const TRUE_PEAK_CEILING: f64 = -1.0;

/// Loudness range target in LU
pub const LOUDNESS_RANGE_TARGET: f64 = 11.0;

/// Name shown for the disabled state
pub const NONE_PROFILE: &str = "none";

/// Named integrated-loudness target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoudnessProfile {
    pub name: String,
    /// Integrated loudness target (LUFS)
    pub target_lufs: f64,
}

impl LoudnessProfile {
    pub fn new(name: impl Into<String>, target_lufs: f64) -> Self {
        Self {
            name: name.into(),
            target_lufs,
        }
    }

    /// EBU R128 broadcast target
    pub fn ebu_r128() -> Self {
        Self::new("ebu_r128", -23.0)
    }

    /// ATSC A/85 broadcast target
    pub fn atsc() -> Self {
        Self::new("atsc", -24.0)
    }

    /// Podcast/streaming speech target
    pub fn podcast() -> Self {
        Self::new("podcast", -16.0)
    }
}

impl fmt::Display for LoudnessProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} LUFS)", self.name, self.target_lufs)
    }
}

/// Default cycling table after `none`
pub fn default_profiles() -> Vec<LoudnessProfile> {
    vec![
        LoudnessProfile::ebu_r128(),
        LoudnessProfile::atsc(),
        LoudnessProfile::podcast(),
    ]
}

/// Parameters of one loudness-normalisation filter stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoudnessStage {
    /// Integrated loudness target (LUFS)
    pub integrated: f64,
    /// True-peak ceiling (dBTP)
    pub true_peak: f64,
    /// Loudness range target (LU)
    pub range: f64,
    /// Linear (single-pass gain) mode
    pub linear: bool,
}

/// Build the stage for `profile`; None (loudness off) yields no stage
pub fn build_loudness_stage(profile: Option<&LoudnessProfile>) -> Option<LoudnessStage> {
    profile.map(|p| LoudnessStage {
        integrated: p.target_lufs,
        true_peak: TRUE_PEAK_CEILING,
        range: LOUDNESS_RANGE_TARGET,
        linear: true,
    })
}

/// Position in the loudness cycle `none -> profiles[0] -> ... -> none`
#[derive(Debug, Clone)]
pub struct LoudnessCycle {
    profiles: Vec<LoudnessProfile>,
    /// 0 = none, i = profiles[i - 1]
    index: usize,
}

impl LoudnessCycle {
    /// Start at `none`
    ///
    /// Entries named `none` are skipped since the disabled state is always
    /// the implicit first entry.
    pub fn new(profiles: Vec<LoudnessProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .filter(|p| p.name != NONE_PROFILE && p.target_lufs.is_finite())
            .collect();
        Self { profiles, index: 0 }
    }

    /// Active profile, None when loudness normalisation is off
    pub fn current(&self) -> Option<&LoudnessProfile> {
        self.index.checked_sub(1).and_then(|i| self.profiles.get(i))
    }

    /// Advance to the next profile and return it
    pub fn advance(&mut self) -> Option<&LoudnessProfile> {
        self.index = (self.index + 1) % (self.profiles.len() + 1);
        self.current()
    }

    /// Step back, undoing one [`Self::advance`]
    pub fn retreat(&mut self) {
        let len = self.profiles.len() + 1;
        self.index = (self.index + len - 1) % len;
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Name of the active entry, `none` when off
    pub fn name(&self) -> &str {
        self.current().map(|p| p.name.as_str()).unwrap_or(NONE_PROFILE)
    }

    pub fn profiles(&self) -> &[LoudnessProfile] {
        &self.profiles
    }
}

impl Default for LoudnessCycle {
    fn default() -> Self {
        Self::new(default_profiles())
    }
}
