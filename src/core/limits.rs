//! Batching ceilings (normative defaults).
//!
//! Ceilings are enforced by truncation-with-warning, never by failure: a
//! runaway lens is bounded, not killed. All values are per recompute pass.

use serde::{Deserialize, Serialize};

use super::error::{CeilingError, CoreError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    /// Drafts one instance may register per pass ("frame").
    pub per_frame_draft_cap: usize,
    /// Raw outputs accepted from a single evaluate call.
    pub max_drafts_per_lens_batch: usize,
    /// Total drafts across the whole recompute, shared in walk order.
    pub max_drafts_per_recompute: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            per_frame_draft_cap: 512,
            max_drafts_per_lens_batch: 256,
            max_drafts_per_recompute: 4096,
        }
    }
}

impl Limits {
    /// All ceilings must be positive.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("perFrameDraftCap", self.per_frame_draft_cap),
            ("maxDraftsPerLensBatch", self.max_drafts_per_lens_batch),
            ("maxDraftsPerRecompute", self.max_drafts_per_recompute),
        ] {
            if value == 0 {
                return Err(CeilingError { field }.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Limits;

    #[test]
    fn limits_defaults() {
        let limits = Limits::default();
        assert_eq!(limits.per_frame_draft_cap, 512);
        assert_eq!(limits.max_drafts_per_lens_batch, 256);
        assert_eq!(limits.max_drafts_per_recompute, 4096);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let limits = Limits {
            per_frame_draft_cap: 0,
            ..Limits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn partial_config_backfills_defaults() {
        let limits: Limits =
            serde_json::from_str(r#"{"maxDraftsPerRecompute": 2000}"#).unwrap();
        assert_eq!(limits.max_drafts_per_recompute, 2000);
        assert_eq!(limits.max_drafts_per_lens_batch, 256);
    }
}
