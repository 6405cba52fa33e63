//! Pass/fail records produced by self-tests and the portal harness.

use std::time::Duration;

use serde::Serialize;

use crate::envelope::Envelope;
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
}

/// Outcome of one accessor call under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    /// Envelope error, or the validation failure for a malformed envelope
    pub error: Option<String>,
    pub data_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl TestResult {
    /// Judge an envelope: it passes exactly when it validates.
    pub fn from_envelope<S: Into<String>>(name: S, envelope: &Envelope) -> Self {
        let (status, error) = match validation::check(envelope) {
            Ok(()) => (TestStatus::Pass, None),
            Err(failure) => (
                TestStatus::Fail,
                Some(
                    envelope
                        .error()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| failure.to_string()),
                ),
            ),
        };

        Self {
            name: name.into(),
            status,
            error,
            data_count: envelope.data().len(),
            elapsed_ms: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }
}

/// `successes / attempts * 100`, rounded to one decimal; `None` without attempts.
pub fn success_rate(successes: usize, attempts: usize) -> Option<f64> {
    if attempts == 0 {
        return None;
    }
    let rate = successes as f64 / attempts as f64 * 100.0;
    Some((rate * 10.0).round() / 10.0)
}

/// Render a rate the way reports print it (`"66.7%"`).
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.1}%", rate),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Metadata;

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(success_rate(2, 3), Some(66.7));
        assert_eq!(success_rate(1, 3), Some(33.3));
        assert_eq!(success_rate(4, 4), Some(100.0));
        assert_eq!(success_rate(0, 0), None);
        assert_eq!(format_rate(success_rate(4, 5)), "80.0%");
        assert_eq!(format_rate(None), "n/a");
    }

    #[test]
    fn test_result_from_failed_envelope_keeps_error() {
        let env = Envelope::http_status(Metadata::new("s").with_country("us"), 502);
        let result = TestResult::from_envelope("list_datasets(us)", &env);
        assert!(!result.passed());
        assert_eq!(result.error.as_deref(), Some("HTTP Error: 502 - Bad Gateway"));
        assert_eq!(result.data_count, 0);
    }

    #[test]
    fn test_result_from_unidentified_envelope_fails_validation() {
        let env = Envelope::success(Metadata::new("s"), vec![]);
        let result = TestResult::from_envelope("anonymous", &env);
        assert_eq!(result.status, TestStatus::Fail);
        assert_eq!(result.error.as_deref(), Some("Missing metadata field: country"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let env = Envelope::success(Metadata::new("s").with_action("get_catalogue"), vec![]);
        let value = serde_json::to_value(TestResult::from_envelope("get_catalogue", &env))
            .expect("serializes");
        assert_eq!(value["status"], "pass");
        assert!(value.get("elapsed_ms").is_none());
    }
}
