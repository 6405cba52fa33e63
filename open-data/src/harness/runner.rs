use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use serde_json::Value;
use tracing::{info, warn};

use super::HarnessOptions;
use super::WORKFLOW_COUNTRY;
use super::report::Reporter;
use super::state::{SourceProgress, StateError, TestGroup};
use super::summary::{RunReport, RunSummary};
use super::workflow::run_workflow;
use crate::colors::Tone;
use crate::envelope::{Envelope, Record};
use crate::portal::PortalApi;
use crate::results::{TestResult, format_rate};

const ORGANIZATION_LIMIT: u32 = 5;
const DATASET_LIMIT: u32 = 10;
const SEARCH_LIMIT: u32 = 5;
const SEARCH_QUERY: &str = "climate";
const RESOURCE_QUERY: &str = "data";

fn field<'a>(record: Option<&'a Record>, key: &str) -> Option<&'a str> {
    record
        .and_then(|r| r.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn note(result: Result<(), StateError>) {
    if let Err(err) = result {
        warn!(error = %err, "harness state");
    }
}

/// Drives a [`PortalApi`] through the harness sequence.
pub struct Harness {
    api: Arc<dyn PortalApi>,
    reporter: Arc<dyn Reporter>,
    options: HarnessOptions,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("options", &self.options)
            .finish()
    }
}

/// Timed cases of one run.
#[derive(Default)]
struct Session {
    results: Vec<TestResult>,
}

impl Harness {
    pub fn new(
        api: Arc<dyn PortalApi>,
        reporter: Arc<dyn Reporter>,
        options: HarnessOptions,
    ) -> Self {
        Self {
            api,
            reporter,
            options,
        }
    }

    pub async fn run(&self) -> RunReport {
        let started = Instant::now();
        let mut session = Session::default();

        self.reporter.header("Universal CKAN API - Test Suite");
        self.reporter.line(&format!(
            "Started at: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        self.reporter.line(&format!(
            "Fast mode: {}",
            if self.options.fast { "Yes" } else { "No" }
        ));
        self.reporter.line(&format!(
            "Testing countries: {}",
            upper_list(&self.options.targets())
        ));

        self.supported_countries(&mut session).await;
        let mut sources = self.connections(&mut session).await;

        if sources.iter().any(SourceProgress::is_reachable) {
            self.organizations(&mut session, &mut sources).await;
            self.datasets(&mut session, &mut sources).await;
            self.resources(&mut session, &mut sources).await;
            self.workflow(&mut sources).await;
        } else {
            self.reporter
                .warn("No working connections found, skipping remaining tests");
        }

        let report = RunReport {
            summary: RunSummary::from_sources(&sources),
            sources,
            results: session.results,
            elapsed: started.elapsed(),
        };
        self.print_summary(&report);
        info!(
            assessment = ?report.summary.assessment,
            cases = report.results.len(),
            "harness run finished"
        );
        report
    }

    /// Run one timed case, report it, and hand back its envelope.
    async fn case<F>(&self, session: &mut Session, name: String, call: F) -> (bool, Envelope)
    where
        F: Future<Output = Envelope>,
    {
        self.reporter.case_started(&name);
        let start = Instant::now();
        let envelope = call.await;
        let result = TestResult::from_envelope(name, &envelope).with_elapsed(start.elapsed());
        self.reporter.case_finished(&result);
        let passed = result.passed();
        session.results.push(result);
        (passed, envelope)
    }

    async fn supported_countries(&self, session: &mut Session) -> bool {
        self.reporter.header("Testing Supported Countries Function");
        let api = Arc::clone(&self.api);
        let (passed, envelope) = self
            .case(session, "get_supported_countries".to_string(), async move {
                api.supported_countries()
            })
            .await;

        if passed {
            self.reporter.info(&format!(
                "Found {} supported countries",
                envelope.data().len()
            ));
            for country in envelope.data() {
                self.reporter.line(&format!(
                    "    - {}: {}",
                    field(Some(country), "code").unwrap_or("?"),
                    field(Some(country), "name").unwrap_or("?")
                ));
            }
        }
        passed
    }

    async fn connections(&self, session: &mut Session) -> Vec<SourceProgress> {
        self.reporter.header("Testing Portal Connections");
        if self.options.fast && !self.options.has_explicit_countries() {
            self.reporter.info("Fast mode: Testing only primary countries");
        }

        let mut sources = Vec::new();
        for country in self.options.connection_targets() {
            self.reporter
                .section(&format!("Testing {} portal:", country.to_uppercase()));
            let (reachable, _) = self
                .case(
                    session,
                    format!("test_portal_connection({})", country),
                    self.api.test_connection(&country),
                )
                .await;

            if !reachable {
                self.reporter.warn(&format!(
                    "Skipping {} due to connection failure",
                    country.to_uppercase()
                ));
            }
            let mut source = SourceProgress::new(country);
            note(source.record_connection(reachable));
            sources.push(source);
        }
        sources
    }

    /// Indices of working sources `group` still has to visit.
    fn visit(&self, sources: &[SourceProgress], group: TestGroup) -> Vec<usize> {
        sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_reachable())
            .take(self.options.group_limit(group))
            .filter(|(_, s)| s.may_run(group))
            .map(|(i, _)| i)
            .collect()
    }

    async fn organizations(&self, session: &mut Session, sources: &mut [SourceProgress]) {
        self.reporter.header("Testing Organization Functions");
        for index in self.visit(sources, TestGroup::Organizations) {
            let country = sources[index].country().to_string();
            self.reporter.section(&format!(
                "Testing organization functions for {}:",
                country.to_uppercase()
            ));

            let (listed, orgs) = self
                .case(
                    session,
                    format!("list_organizations({})", country),
                    self.api.list_organizations(&country, ORGANIZATION_LIMIT),
                )
                .await;

            let mut details = false;
            if listed {
                if let Some(name) = field(orgs.first(), "name") {
                    (details, _) = self
                        .case(
                            session,
                            format!("get_organization_details({}, {})", country, name),
                            self.api.get_organization_details(&country, name),
                        )
                        .await;
                }
            }
            note(sources[index].record_group(TestGroup::Organizations, listed && details));
        }
    }

    async fn datasets(&self, session: &mut Session, sources: &mut [SourceProgress]) {
        self.reporter.header("Testing Dataset Functions");
        for index in self.visit(sources, TestGroup::Datasets) {
            let country = sources[index].country().to_string();
            self.reporter.section(&format!(
                "Testing dataset functions for {}:",
                country.to_uppercase()
            ));

            let (listed, _) = self
                .case(
                    session,
                    format!("list_datasets({})", country),
                    self.api.list_datasets(&country, DATASET_LIMIT),
                )
                .await;
            let (searched, found) = self
                .case(
                    session,
                    format!("search_datasets({}, '{}')", country, SEARCH_QUERY),
                    self.api.search_datasets(&country, SEARCH_QUERY, SEARCH_LIMIT),
                )
                .await;

            let mut details = false;
            if searched {
                if let Some(name) = field(found.first(), "name") {
                    (details, _) = self
                        .case(
                            session,
                            format!("get_dataset_details({}, {})", country, name),
                            self.api.get_dataset_details(&country, name),
                        )
                        .await;
                }
            }
            note(sources[index].record_group(TestGroup::Datasets, listed && searched && details));
        }
    }

    async fn resources(&self, session: &mut Session, sources: &mut [SourceProgress]) {
        self.reporter.header("Testing Resource Functions");
        for index in self.visit(sources, TestGroup::Resources) {
            let country = sources[index].country().to_string();
            self.reporter.section(&format!(
                "Testing resource functions for {}:",
                country.to_uppercase()
            ));

            let search = self.api.search_datasets(&country, RESOURCE_QUERY, 1).await;
            let dataset = if search.is_success() {
                field(search.first(), "name")
            } else {
                None
            };
            let Some(dataset) = dataset else {
                self.reporter.warn(&format!(
                    "Could not find dataset for resource testing in {}",
                    country.to_uppercase()
                ));
                note(sources[index].record_group(TestGroup::Resources, false));
                continue;
            };

            let (listed, resources) = self
                .case(
                    session,
                    format!("get_dataset_resources({}, {})", country, dataset),
                    self.api.get_dataset_resources(&country, dataset),
                )
                .await;

            let mut details = false;
            if listed {
                if let Some(id) = field(resources.first(), "id") {
                    (details, _) = self
                        .case(
                            session,
                            format!("get_resource_details({}, {})", country, id),
                            self.api.get_resource_details(&country, id),
                        )
                        .await;
                }
            }
            note(sources[index].record_group(TestGroup::Resources, listed && details));
        }
    }

    async fn workflow(&self, sources: &mut [SourceProgress]) -> bool {
        self.reporter.header("Testing Integrated Workflow");
        let index = sources
            .iter()
            .position(|s| s.is_reachable() && s.country() == WORKFLOW_COUNTRY)
            .or_else(|| sources.iter().position(SourceProgress::is_reachable));
        let Some(index) = index else {
            return false;
        };
        if !sources[index].may_run(TestGroup::Workflow) {
            return false;
        }

        let country = sources[index].country().to_string();
        self.reporter.section(&format!(
            "Testing integrated workflow for {}:",
            country.to_uppercase()
        ));
        let outcome = run_workflow(self.api.as_ref(), self.reporter.as_ref(), &country).await;
        note(sources[index].record_group(TestGroup::Workflow, outcome.passed));
        outcome.passed
    }

    fn print_summary(&self, report: &RunReport) {
        let summary = &report.summary;
        self.reporter.header("Test Summary");
        self.reporter.line(&format!(
            "Total execution time: {:.2} seconds",
            report.elapsed.as_secs_f64()
        ));
        self.reporter.line(&format!(
            "Connection success rate: {}",
            format_rate(summary.connection_rate)
        ));
        if !report.working_countries().is_empty() {
            let rates = [
                ("Organization", summary.organization_rate),
                ("Dataset", summary.dataset_rate),
                ("Resource", summary.resource_rate),
            ];
            for (label, rate) in rates {
                self.reporter.line(&format!(
                    "{} function success rate: {}",
                    label,
                    format_rate(rate)
                ));
            }
        }
        self.reporter.line(&format!(
            "Integrated workflow: {}",
            if summary.workflow_passed { "PASS" } else { "FAIL" }
        ));

        self.reporter.header("Overall Assessment");
        let assessment = summary.assessment;
        match assessment.tone() {
            Tone::Pass => self.reporter.pass(assessment.message()),
            Tone::Warn => self.reporter.warn(assessment.message()),
            _ => self.reporter.fail(assessment.message()),
        }
    }
}

fn upper_list(countries: &[String]) -> String {
    countries
        .iter()
        .map(|c| c.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ")
}
