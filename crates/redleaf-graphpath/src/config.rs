//! Evaluation configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Knobs for an [`crate::Evaluator`].
///
/// Every field has a default, so a partial JSON document is accepted:
///
/// ```
/// use redleaf_graphpath::EvalConfig;
///
/// let config = EvalConfig::from_json_str(r#"{ "scan_limit": 10000 }"#).unwrap();
/// assert_eq!(config.scan_limit, Some(10000));
/// assert!(!config.prefer_scan);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Decline every efficient `initials`/`terminals` answer, so all
    /// operators take their population-scanning path.
    pub prefer_scan: bool,
    /// Refuse brute-force scans over populations larger than this.
    pub scan_limit: Option<u64>,
}

impl EvalConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Configuration that forces the brute-force strategy everywhere.
    pub fn scanning() -> Self {
        Self {
            prefer_scan: true,
            ..Self::default()
        }
    }
}
