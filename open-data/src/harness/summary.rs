//! Success rates and the overall verdict of a harness run.

use std::time::Duration;

use super::state::{ConnectionState, GroupOutcome, SourceProgress, TestGroup};
use crate::colors::Tone;
use crate::results::{TestResult, success_rate};

/// Share of reachable portals needed for a partial success
pub const PARTIAL_SUCCESS_RATE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// Every targeted portal was reachable and the workflow passed
    FullySuccessful,
    /// At least half the targeted portals were reachable
    PartiallySuccessful,
    MostlyFailed,
}

impl Assessment {
    pub fn assess(connection_rate: Option<f64>, workflow_passed: bool) -> Self {
        match connection_rate {
            Some(rate) if rate >= 100.0 && workflow_passed => Assessment::FullySuccessful,
            Some(rate) if rate >= PARTIAL_SUCCESS_RATE => Assessment::PartiallySuccessful,
            _ => Assessment::MostlyFailed,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Assessment::FullySuccessful => "All tests passed! The portal API is working correctly.",
            Assessment::PartiallySuccessful => {
                "Some tests failed. The portal API is partially working."
            }
            Assessment::MostlyFailed => {
                "Most tests failed. There may be network issues or API problems."
            }
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Assessment::FullySuccessful => Tone::Pass,
            Assessment::PartiallySuccessful => Tone::Warn,
            Assessment::MostlyFailed => Tone::Fail,
        }
    }
}

/// Rates over attempted sources only; `None` when nothing was attempted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub connection_rate: Option<f64>,
    pub organization_rate: Option<f64>,
    pub dataset_rate: Option<f64>,
    pub resource_rate: Option<f64>,
    pub workflow_passed: bool,
    pub assessment: Assessment,
}

impl RunSummary {
    pub fn from_sources(sources: &[SourceProgress]) -> Self {
        let tested = sources
            .iter()
            .filter(|s| s.connection() != ConnectionState::NotTested)
            .count();
        let reachable = sources.iter().filter(|s| s.is_reachable()).count();
        let connection_rate = success_rate(reachable, tested);
        let workflow_passed = sources
            .iter()
            .any(|s| s.outcome(TestGroup::Workflow) == GroupOutcome::Passed);

        Self {
            connection_rate,
            organization_rate: group_rate(sources, TestGroup::Organizations),
            dataset_rate: group_rate(sources, TestGroup::Datasets),
            resource_rate: group_rate(sources, TestGroup::Resources),
            workflow_passed,
            assessment: Assessment::assess(connection_rate, workflow_passed),
        }
    }
}

fn group_rate(sources: &[SourceProgress], group: TestGroup) -> Option<f64> {
    let (passed, attempted) = sources
        .iter()
        .map(|s| s.outcome(group))
        .fold((0, 0), |(passed, attempted), outcome| match outcome {
            GroupOutcome::Passed => (passed + 1, attempted + 1),
            GroupOutcome::Failed => (passed, attempted + 1),
            GroupOutcome::Skipped => (passed, attempted),
        });
    success_rate(passed, attempted)
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub sources: Vec<SourceProgress>,
    /// Every timed case, in run order
    pub results: Vec<TestResult>,
    pub summary: RunSummary,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_fully_successful(&self) -> bool {
        self.summary.assessment == Assessment::FullySuccessful
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_fully_successful() { 0 } else { 1 }
    }

    /// Countries whose connection check passed, in run order.
    pub fn working_countries(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.is_reachable())
            .map(SourceProgress::country)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(country: &str, reachable: bool, groups: &[(TestGroup, bool)]) -> SourceProgress {
        let mut source = SourceProgress::new(country);
        source.record_connection(reachable).expect("connection");
        for (group, passed) in groups {
            source.record_group(*group, *passed).expect("group");
        }
        source
    }

    #[test]
    fn test_assessment_levels() {
        assert_eq!(Assessment::assess(Some(100.0), true), Assessment::FullySuccessful);
        assert_eq!(Assessment::assess(Some(100.0), false), Assessment::PartiallySuccessful);
        assert_eq!(Assessment::assess(Some(50.0), true), Assessment::PartiallySuccessful);
        assert_eq!(Assessment::assess(Some(33.3), true), Assessment::MostlyFailed);
        assert_eq!(Assessment::assess(None, true), Assessment::MostlyFailed);
    }

    #[test]
    fn test_unreachable_sources_leave_group_denominators() {
        let sources = vec![
            source(
                "us",
                true,
                &[
                    (TestGroup::Organizations, true),
                    (TestGroup::Datasets, false),
                    (TestGroup::Workflow, true),
                ],
            ),
            source("uk", true, &[(TestGroup::Organizations, false)]),
            source("br", false, &[]),
        ];

        let summary = RunSummary::from_sources(&sources);
        assert_eq!(summary.connection_rate, Some(66.7));
        assert_eq!(summary.organization_rate, Some(50.0));
        assert_eq!(summary.dataset_rate, Some(0.0));
        assert_eq!(summary.resource_rate, None);
        assert!(summary.workflow_passed);
        assert_eq!(summary.assessment, Assessment::PartiallySuccessful);
    }

    #[test]
    fn test_exit_code_follows_assessment() {
        let sources = vec![source("us", true, &[(TestGroup::Workflow, true)])];
        let report = RunReport {
            summary: RunSummary::from_sources(&sources),
            sources,
            results: Vec::new(),
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.working_countries(), vec!["us"]);
    }
}
