//! Channel routing planner
//!
//! Maps a [`RoutingMode`] and the channel count of the active track onto a
//! stereo [`PanMatrix`]. Downmixes are power-preserving: each member of a
//! group of `n` channels contributes with gain `1/√n`, so the sum of squared
//! gains per output is 1.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Channel routing requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RoutingMode {
    /// Pass-through for mono/stereo, full downmix above that
    #[default]
    Default,
    /// 1-based stereo pair: channels `2(n-1)` and `2(n-1)+1`
    StereoPair(u32),
    /// 1-based single channel on both outputs
    Solo(u32),
    /// Even channels to the left, odd channels to the right
    AllChannelDownmix,
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Default => write!(f, "Default"),
            RoutingMode::StereoPair(n) => write!(f, "Pair {} (ch {}+{})", n, (2 * n).saturating_sub(1), 2 * n),
            RoutingMode::Solo(n) => write!(f, "Solo ch {}", n),
            RoutingMode::AllChannelDownmix => write!(f, "Downmix all"),
        }
    }
}

/// Requested routing cannot be built for the active track
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Pair {pair} needs {needed} channels, track has {channels}")]
    PairOutOfRange { pair: u32, needed: u32, channels: u32 },

    #[error("Channel {channel} not available, track has {channels}")]
    SoloOutOfRange { channel: u32, channels: u32 },

    #[error("Channel and pair numbers start at 1")]
    InvalidIndex,

    #[error("No audio channels available")]
    NoChannels,
}

/// Linear mapping of input channels onto a stereo output
///
/// `left[i]` / `right[i]` hold the gain of input channel `i` in each output;
/// zero gains are left out of the lavfi form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanMatrix {
    pub inputs: u32,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl PanMatrix {
    fn silent(inputs: u32) -> Self {
        Self {
            inputs,
            left: vec![0.0; inputs as usize],
            right: vec![0.0; inputs as usize],
        }
    }

    /// Sum of squared gains feeding (left, right)
    pub fn power(&self) -> (f64, f64) {
        let sum = |gains: &[f64]| gains.iter().map(|g| g * g).sum::<f64>();
        (sum(&self.left), sum(&self.right))
    }
}

/// Build the pan matrix for `mode` on a track with `channels` channels
///
/// Returns `Ok(None)` when no pan stage is needed (Default on a mono or
/// stereo track).
pub fn plan_routing(mode: RoutingMode, channels: u32) -> Result<Option<PanMatrix>, RoutingError> {
    if channels == 0 {
        return Err(RoutingError::NoChannels);
    }

    match mode {
        RoutingMode::Default if channels <= 2 => Ok(None),
        RoutingMode::Default | RoutingMode::AllChannelDownmix => Ok(Some(downmix(channels))),
        RoutingMode::StereoPair(0) | RoutingMode::Solo(0) => Err(RoutingError::InvalidIndex),
        RoutingMode::StereoPair(pair) => {
            let needed = pair.saturating_mul(2);
            if needed > channels {
                return Err(RoutingError::PairOutOfRange {
                    pair,
                    needed,
                    channels,
                });
            }
            let mut matrix = PanMatrix::silent(channels);
            matrix.left[(needed - 2) as usize] = 1.0;
            matrix.right[(needed - 1) as usize] = 1.0;
            Ok(Some(matrix))
        }
        RoutingMode::Solo(channel) => {
            if channel > channels {
                return Err(RoutingError::SoloOutOfRange { channel, channels });
            }
            let mut matrix = PanMatrix::silent(channels);
            matrix.left[(channel - 1) as usize] = 1.0;
            matrix.right[(channel - 1) as usize] = 1.0;
            Ok(Some(matrix))
        }
    }
}

/// Even-indexed channels to the left, odd-indexed to the right, each group
/// scaled by `1/√(group size)`
fn downmix(channels: u32) -> PanMatrix {
    let even = channels.div_ceil(2);
    let odd = channels / 2;
    let gain = |size: u32| if size == 0 { 0.0 } else { 1.0 / (size as f64).sqrt() };

    let mut matrix = PanMatrix::silent(channels);
    for i in 0..channels as usize {
        if i % 2 == 0 {
            matrix.left[i] = gain(even);
        } else {
            matrix.right[i] = gain(odd);
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_six_channel_downmix_is_power_preserving() {
        let matrix = plan_routing(RoutingMode::AllChannelDownmix, 6).unwrap().unwrap();
        let expected = 1.0 / 3f64.sqrt();
        for i in [0, 2, 4] {
            assert_relative_eq!(matrix.left[i], expected);
            assert_eq!(matrix.right[i], 0.0);
        }
        for i in [1, 3, 5] {
            assert_relative_eq!(matrix.right[i], expected);
            assert_eq!(matrix.left[i], 0.0);
        }
        let (left, right) = matrix.power();
        assert_relative_eq!(left, 1.0, epsilon = 1e-12);
        assert_relative_eq!(right, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mono_downmix_leaves_right_silent() {
        let matrix = plan_routing(RoutingMode::AllChannelDownmix, 1).unwrap().unwrap();
        assert_eq!(matrix.left, vec![1.0]);
        assert_eq!(matrix.right, vec![0.0]);
    }

    #[test]
    fn test_odd_channel_count_groups() {
        // 3 channels: left gets 0 and 2, right gets 1 unscaled
        let matrix = plan_routing(RoutingMode::AllChannelDownmix, 3).unwrap().unwrap();
        assert_relative_eq!(matrix.left[0], std::f64::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(matrix.left[2], std::f64::consts::FRAC_1_SQRT_2);
        assert_eq!(matrix.right[1], 1.0);
    }

    #[test]
    fn test_default_passes_through_stereo() {
        assert_eq!(plan_routing(RoutingMode::Default, 1), Ok(None));
        assert_eq!(plan_routing(RoutingMode::Default, 2), Ok(None));
    }

    #[test]
    fn test_default_downmixes_multichannel() {
        assert_eq!(
            plan_routing(RoutingMode::Default, 6),
            plan_routing(RoutingMode::AllChannelDownmix, 6)
        );
    }

    #[test]
    fn test_stereo_pair_mapping() {
        let matrix = plan_routing(RoutingMode::StereoPair(2), 6).unwrap().unwrap();
        assert_eq!(matrix.left, vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(matrix.right, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pair_out_of_range() {
        assert_eq!(
            plan_routing(RoutingMode::StereoPair(3), 4),
            Err(RoutingError::PairOutOfRange {
                pair: 3,
                needed: 6,
                channels: 4
            })
        );
        assert!(plan_routing(RoutingMode::StereoPair(2), 4).is_ok());
    }

    #[test]
    fn test_solo_mapping_and_range() {
        let matrix = plan_routing(RoutingMode::Solo(3), 4).unwrap().unwrap();
        assert_eq!(matrix.left, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(matrix.left, matrix.right);

        assert!(plan_routing(RoutingMode::Solo(4), 4).is_ok());
        assert_eq!(
            plan_routing(RoutingMode::Solo(5), 4),
            Err(RoutingError::SoloOutOfRange {
                channel: 5,
                channels: 4
            })
        );
    }

    #[test]
    fn test_zero_index_and_zero_channels() {
        assert_eq!(
            plan_routing(RoutingMode::StereoPair(0), 8),
            Err(RoutingError::InvalidIndex)
        );
        assert_eq!(plan_routing(RoutingMode::Solo(0), 8), Err(RoutingError::InvalidIndex));
        assert_eq!(plan_routing(RoutingMode::Default, 0), Err(RoutingError::NoChannels));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(RoutingMode::StereoPair(2).to_string(), "Pair 2 (ch 3+4)");
        assert_eq!(RoutingMode::Solo(5).to_string(), "Solo ch 5");
    }
}
