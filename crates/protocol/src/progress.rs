//! Progress snapshot assembled from backend output.

use serde::{Deserialize, Serialize};

/// Download/install progress parsed from backend log lines.
///
/// All fields start unset; a snapshot is complete only once every field
/// has been populated for the current window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_speed: Option<f64>,
}

impl InstallProgress {
    /// True once all five fields have been captured.
    pub fn is_complete(&self) -> bool {
        self.percent.is_some()
            && self.eta.is_some()
            && self.bytes.is_some()
            && self.down_speed.is_some()
            && self.disk_speed.is_some()
    }

    /// Clears all fields, starting a fresh window.
    pub fn reset(&mut self) {
        *self = InstallProgress::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_of_five_is_incomplete() {
        let progress = InstallProgress {
            percent: Some(42.5),
            eta: Some("00:05:00".into()),
            bytes: Some("120.00MB".into()),
            down_speed: Some(3.2),
            disk_speed: None,
        };
        assert!(!progress.is_complete());
    }

    #[test]
    fn complete_then_reset() {
        let mut progress = InstallProgress {
            percent: Some(42.5),
            eta: Some("00:05:00".into()),
            bytes: Some("120.00MB".into()),
            down_speed: Some(3.2),
            disk_speed: Some(5.1),
        };
        assert!(progress.is_complete());
        progress.reset();
        assert_eq!(progress, InstallProgress::default());
    }
}
