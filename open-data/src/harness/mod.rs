//! Integration test harness for the CKAN portal facade.
//!
//! The run is strictly sequential: supported countries, one connection check
//! per portal, then organization, dataset and resource groups for the
//! reachable portals, and finally the search-to-organization workflow.

pub mod report;
pub mod runner;
pub mod state;
pub mod summary;
pub mod workflow;

pub use report::{ConsoleReporter, NullReporter, Reporter};
pub use runner::Harness;
pub use state::{ConnectionState, GroupOutcome, SourceProgress, StateError, TestGroup};
pub use summary::{Assessment, RunReport, RunSummary};
pub use workflow::{WorkflowOutcome, WorkflowStep, run_workflow};

use crate::error::{OpenDataError, Result};

/// Portals checked in fast mode when no country is requested
pub const PRIMARY_COUNTRIES: [&str; 3] = ["us", "uk", "au"];

/// Preferred portal for the workflow when it is reachable
pub const WORKFLOW_COUNTRY: &str = "us";

/// Working portals visited by the organization and dataset groups in fast mode
pub const FAST_GROUP_LIMIT: usize = 2;

/// Working portals visited by the resource group in fast mode
pub const FAST_RESOURCE_LIMIT: usize = 1;

/// Which portals a run targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessOptions {
    countries: Option<Vec<String>>,
    pub fast: bool,
}

impl HarnessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the run to one portal. Unknown codes are rejected.
    pub fn with_country(mut self, code: &str) -> Result<Self> {
        let portal = open_data_ckan::portals::find(code)
            .ok_or_else(|| OpenDataError::unknown_country(code.trim().to_lowercase()))?;
        self.countries
            .get_or_insert_with(Vec::new)
            .push(portal.code.to_string());
        Ok(self)
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn has_explicit_countries(&self) -> bool {
        self.countries.is_some()
    }

    /// Requested countries, or every registered portal.
    pub fn targets(&self) -> Vec<String> {
        match &self.countries {
            Some(countries) => countries.clone(),
            None => open_data_ckan::portals::codes()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Countries whose connection is checked.
    pub fn connection_targets(&self) -> Vec<String> {
        if self.fast && !self.has_explicit_countries() {
            PRIMARY_COUNTRIES.iter().map(|c| c.to_string()).collect()
        } else {
            self.targets()
        }
    }

    /// How many working portals `group` visits.
    pub fn group_limit(&self, group: TestGroup) -> usize {
        match (self.fast, group) {
            (true, TestGroup::Resources) => FAST_RESOURCE_LIMIT,
            (true, _) => FAST_GROUP_LIMIT,
            (false, _) => usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_every_portal() {
        let options = HarnessOptions::new();
        assert_eq!(options.targets().len(), open_data_ckan::PORTALS.len());
        assert_eq!(options.connection_targets(), options.targets());
    }

    #[test]
    fn test_fast_mode_limits_connections_to_primary_portals() {
        let options = HarnessOptions::new().with_fast(true);
        assert_eq!(options.connection_targets(), vec!["us", "uk", "au"]);
        assert_eq!(options.group_limit(TestGroup::Datasets), 2);
        assert_eq!(options.group_limit(TestGroup::Resources), 1);

        let options = options.with_country("LV").expect("known country");
        assert_eq!(options.connection_targets(), vec!["lv"]);
    }

    #[test]
    fn test_unknown_country_is_rejected() {
        let err = HarnessOptions::new().with_country("zz").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("zz"));
        assert!(message.contains("us, uk, au"));
    }
}
