//! Decay shapes applied to the rate estimate.

use serde::{Deserialize, Serialize};

/// Shape of the fade-out applied to a meter's rate as time passes.
///
/// Every kind maps the elapsed fraction of the window, in `[0, 1]`, to a
/// multiplier in `[0, 1]`. A fraction of `0` keeps the rate untouched and a
/// fraction of `1` fully decays it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayKind {
    /// Constant-rate fade reaching zero at the window edge
    #[default]
    Linear,
    /// Exponential decay with the window as time constant
    MeanLifetime,
    /// Exponential decay halving every window
    HalfLife,
}

impl DecayKind {
    /// Every decay kind.
    pub const ALL: [DecayKind; 3] = [
        DecayKind::Linear,
        DecayKind::MeanLifetime,
        DecayKind::HalfLife,
    ];

    /// Multiplier to apply to the rate after `fraction` of the window elapsed.
    pub fn multiplier(&self, fraction: f64) -> f64 {
        match self {
            DecayKind::Linear => 1.0 - fraction,
            DecayKind::MeanLifetime => (-fraction).exp(),
            DecayKind::HalfLife => 0.5_f64.powf(fraction),
        }
    }

    /// Name used in configuration files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecayKind::Linear => "linear",
            DecayKind::MeanLifetime => "mean_lifetime",
            DecayKind::HalfLife => "half_life",
        }
    }
}

impl std::fmt::Display for DecayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
