// src/config.rs - Tunable matching thresholds

use log::{debug, info};
use serde::Serialize;
use std::env;

const DEFAULT_AMBIGUOUS_MIN: f64 = 0.55;
const DEFAULT_AUTO_LINK_AUDIT: f64 = 0.80;
const DEFAULT_AUTO_LINK: f64 = 0.95;

/// Score thresholds steering candidate retention and downstream review
/// routing. Passed into the engine and resolution workflow explicitly so
/// alternate threshold sets can be exercised in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    /// Floor for a scored grant to be kept as a candidate at all.
    pub ambiguous_min: f64,
    /// Lower bound of the "link, but flag for audit" band.
    pub auto_link_audit: f64,
    /// Reserved fully-automatic tier. Documented policy knob only: no code
    /// path links a grant without a human decision.
    pub auto_link: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            ambiguous_min: DEFAULT_AMBIGUOUS_MIN,
            auto_link_audit: DEFAULT_AUTO_LINK_AUDIT,
            auto_link: DEFAULT_AUTO_LINK,
        }
    }
}

/// Review routing band for a candidate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreBand {
    /// At or above `auto_link`. Never acted on automatically.
    AutoLink,
    /// At or above `auto_link_audit`: link on acceptance, flag for audit.
    NeedsAudit,
    /// Everything else above the floor needs a full human review.
    NeedsFullReview,
}

impl MatchThresholds {
    /// Create configuration from environment variables, falling back to the
    /// defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: f64| -> f64 {
            env::var(key)
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(fallback)
        };

        let config = Self {
            ambiguous_min: read("GRANTLINK_AMBIGUOUS_MIN", defaults.ambiguous_min),
            auto_link_audit: read("GRANTLINK_AUTO_LINK_AUDIT", defaults.auto_link_audit),
            auto_link: read("GRANTLINK_AUTO_LINK", defaults.auto_link),
        };
        debug!("Match threshold config: {:?}", config);
        config
    }

    pub fn band(&self, score: f64) -> ScoreBand {
        if score >= self.auto_link {
            ScoreBand::AutoLink
        } else if score >= self.auto_link_audit {
            ScoreBand::NeedsAudit
        } else {
            ScoreBand::NeedsFullReview
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!(
            "Match thresholds: ambiguous_min={:.2}, auto_link_audit={:.2}, auto_link={:.2}",
            self.ambiguous_min, self.auto_link_audit, self.auto_link
        );
    }
}
