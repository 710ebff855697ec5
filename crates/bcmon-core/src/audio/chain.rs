//! Filter chain descriptors
//!
//! The router builds a [`FilterChain`] of structured stages. Only the host
//! adapter turns a stage into text, using [`FilterStage::to_lavfi`].

use super::loudness::LoudnessStage;
use super::routing::PanMatrix;
use serde::Serialize;
use std::fmt::Write;

/// One stage of the audio filter graph
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterStage {
    /// Channel remapping to stereo
    Pan(PanMatrix),
    /// Loudness normalisation
    Loudness(LoudnessStage),
}

impl FilterStage {
    /// Label identifying the stage in the host's filter graph
    pub fn label(&self) -> &'static str {
        match self {
            FilterStage::Pan(_) => "bcmon_pan",
            FilterStage::Loudness(_) => "bcmon_loudnorm",
        }
    }

    /// libavfilter description, e.g. `pan=stereo|c0=c0|c1=c1`
    pub fn to_lavfi(&self) -> String {
        match self {
            FilterStage::Pan(matrix) => {
                let mut out = String::from("pan=stereo");
                for (output, gains) in [&matrix.left, &matrix.right].into_iter().enumerate() {
                    let _ = write!(out, "|c{}={}", output, pan_terms(gains));
                }
                out
            }
            FilterStage::Loudness(stage) => format!(
                "loudnorm=I={}:TP={}:LRA={}:linear={}",
                stage.integrated, stage.true_peak, stage.range, stage.linear
            ),
        }
    }
}

/// `g*cN` terms joined with `+`; unit gains drop the factor and an output
/// fed by nothing is written as `0*c0`
fn pan_terms(gains: &[f64]) -> String {
    let terms: Vec<String> = gains
        .iter()
        .enumerate()
        .filter(|(_, g)| **g != 0.0)
        .map(|(i, g)| {
            if (*g - 1.0).abs() < 1e-12 {
                format!("c{}", i)
            } else {
                format!("{:.6}*c{}", g, i)
            }
        })
        .collect();

    if terms.is_empty() {
        "0*c0".to_string()
    } else {
        terms.join("+")
    }
}

/// Ordered filter stages, submitted to the host as a whole
pub type FilterChain = Vec<FilterStage>;
