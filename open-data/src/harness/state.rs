//! Per-portal progress through a harness run.
//!
//! A source starts `NotTested`. Its connection check moves it to `Reachable`
//! or `Unreachable`, once. Only a reachable source may record test groups,
//! each exactly once. Groups never recorded report as skipped and are left
//! out of success-rate denominators.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotTested,
    Reachable,
    Unreachable,
}

/// Test groups that depend on a working connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestGroup {
    Organizations,
    Datasets,
    Resources,
    Workflow,
}

impl TestGroup {
    pub const ALL: [TestGroup; 4] = [
        TestGroup::Organizations,
        TestGroup::Datasets,
        TestGroup::Resources,
        TestGroup::Workflow,
    ];
}

impl fmt::Display for TestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestGroup::Organizations => "organizations",
            TestGroup::Datasets => "datasets",
            TestGroup::Resources => "resources",
            TestGroup::Workflow => "workflow",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    Passed,
    Failed,
    Skipped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("connection to {country} was already tested")]
    ConnectionAlreadyTested { country: String },

    #[error("{group} cannot run for {country}: portal is not reachable")]
    NotReachable { country: String, group: TestGroup },

    #[error("{group} for {country} was already recorded")]
    AlreadyRecorded { country: String, group: TestGroup },
}

/// Progress of one portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProgress {
    country: String,
    connection: ConnectionState,
    groups: BTreeMap<TestGroup, bool>,
}

impl SourceProgress {
    pub fn new<S: Into<String>>(country: S) -> Self {
        Self {
            country: country.into(),
            connection: ConnectionState::NotTested,
            groups: BTreeMap::new(),
        }
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_reachable(&self) -> bool {
        self.connection == ConnectionState::Reachable
    }

    pub fn record_connection(&mut self, reachable: bool) -> Result<(), StateError> {
        if self.connection != ConnectionState::NotTested {
            return Err(StateError::ConnectionAlreadyTested {
                country: self.country.clone(),
            });
        }
        self.connection = if reachable {
            ConnectionState::Reachable
        } else {
            ConnectionState::Unreachable
        };
        Ok(())
    }

    /// Whether `group` may still run for this source.
    pub fn may_run(&self, group: TestGroup) -> bool {
        self.is_reachable() && !self.groups.contains_key(&group)
    }

    pub fn record_group(&mut self, group: TestGroup, passed: bool) -> Result<(), StateError> {
        if !self.is_reachable() {
            return Err(StateError::NotReachable {
                country: self.country.clone(),
                group,
            });
        }
        if self.groups.contains_key(&group) {
            return Err(StateError::AlreadyRecorded {
                country: self.country.clone(),
                group,
            });
        }
        self.groups.insert(group, passed);
        Ok(())
    }

    pub fn outcome(&self, group: TestGroup) -> GroupOutcome {
        match self.groups.get(&group) {
            Some(true) => GroupOutcome::Passed,
            Some(false) => GroupOutcome::Failed,
            None => GroupOutcome::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_source_cannot_record_groups() {
        let mut source = SourceProgress::new("br");
        assert_eq!(source.connection(), ConnectionState::NotTested);
        assert!(!source.may_run(TestGroup::Datasets));

        source.record_connection(false).expect("first check");
        assert_eq!(source.connection(), ConnectionState::Unreachable);
        for group in TestGroup::ALL {
            assert!(!source.may_run(group));
            assert!(matches!(
                source.record_group(group, true),
                Err(StateError::NotReachable { .. })
            ));
            assert_eq!(source.outcome(group), GroupOutcome::Skipped);
        }
    }

    #[test]
    fn test_groups_are_terminal() {
        let mut source = SourceProgress::new("uk");
        source.record_connection(true).expect("first check");
        assert!(source.may_run(TestGroup::Organizations));

        source
            .record_group(TestGroup::Organizations, false)
            .expect("first record");
        assert!(!source.may_run(TestGroup::Organizations));
        assert_eq!(source.outcome(TestGroup::Organizations), GroupOutcome::Failed);
        assert_eq!(
            source.record_group(TestGroup::Organizations, true),
            Err(StateError::AlreadyRecorded {
                country: "uk".into(),
                group: TestGroup::Organizations
            })
        );
        assert_eq!(source.outcome(TestGroup::Organizations), GroupOutcome::Failed);
    }

    #[test]
    fn test_connection_is_tested_once() {
        let mut source = SourceProgress::new("us");
        source.record_connection(true).expect("first check");
        assert!(source.record_connection(false).is_err());
        assert!(source.is_reachable());
    }
}
