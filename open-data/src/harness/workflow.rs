//! Search → details → resources → organization, judged as one unit.

use serde_json::Value;
use tracing::{debug, info};

use super::report::Reporter;
use crate::envelope::Record;
use crate::portal::PortalApi;

/// Keyword the workflow searches for
pub const WORKFLOW_QUERY: &str = "climate";

/// Datasets requested by the search step
pub const WORKFLOW_SEARCH_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Search,
    Details,
    Resources,
    Organization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub passed: bool,
    /// Steps that succeeded, in order
    pub completed: Vec<WorkflowStep>,
}

impl WorkflowOutcome {
    fn stop(completed: Vec<WorkflowStep>) -> Self {
        Self {
            passed: false,
            completed,
        }
    }
}

fn text<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn organization_name(record: &Record) -> Option<&str> {
    record
        .get("organization")
        .and_then(|org| org.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Run the workflow against `country`.
///
/// Every required step stops the run on failure. The organization lookup is
/// attempted when the dataset names one, and its failure only warns.
pub async fn run_workflow(
    api: &dyn PortalApi,
    reporter: &dyn Reporter,
    country: &str,
) -> WorkflowOutcome {
    let mut completed = Vec::with_capacity(4);

    reporter.step(1, &format!("Searching for {} datasets...", WORKFLOW_QUERY));
    let search = api
        .search_datasets(country, WORKFLOW_QUERY, WORKFLOW_SEARCH_LIMIT)
        .await;
    if let Some(err) = search.error() {
        reporter.fail(&format!("Search failed: {}", err));
        return WorkflowOutcome::stop(completed);
    }
    let Some(first) = search.first() else {
        reporter.warn(&format!("No {} datasets found", WORKFLOW_QUERY));
        return WorkflowOutcome::stop(completed);
    };
    let Some(dataset_name) = text(first, "name") else {
        reporter.fail("Search result has no dataset name");
        return WorkflowOutcome::stop(completed);
    };
    reporter.pass(&format!(
        "Found {} {} datasets",
        search.data().len(),
        WORKFLOW_QUERY
    ));
    completed.push(WorkflowStep::Search);

    reporter.step(2, "Getting dataset details...");
    let details = api.get_dataset_details(country, dataset_name).await;
    if let Some(err) = details.error() {
        reporter.fail(&format!("Dataset details failed: {}", err));
        return WorkflowOutcome::stop(completed);
    }
    let dataset = details.first().cloned().unwrap_or_default();
    let title = text(&dataset, "title").unwrap_or(dataset_name);
    reporter.pass(&format!("Got details for '{}'", title));
    completed.push(WorkflowStep::Details);

    reporter.step(3, "Getting dataset resources...");
    let resources = api.get_dataset_resources(country, dataset_name).await;
    if let Some(err) = resources.error() {
        reporter.fail(&format!("Resources failed: {}", err));
        return WorkflowOutcome::stop(completed);
    }
    reporter.pass(&format!("Found {} resources", resources.data().len()));
    completed.push(WorkflowStep::Resources);

    reporter.step(4, "Getting organization information...");
    match organization_name(&dataset) {
        Some(org_name) => {
            let org = api.get_organization_details(country, org_name).await;
            match org.error() {
                Some(err) => reporter.warn(&format!("Organization details failed: {}", err)),
                None => {
                    let org_title = org
                        .first()
                        .and_then(|record| text(record, "title"))
                        .unwrap_or(org_name);
                    reporter.pass(&format!("Got organization '{}'", org_title));
                    completed.push(WorkflowStep::Organization);
                }
            }
        }
        None => debug!(country, dataset = dataset_name, "dataset has no organization"),
    }

    reporter.pass("Integrated workflow completed successfully!");
    info!(country, steps = completed.len(), "workflow passed");
    WorkflowOutcome {
        passed: true,
        completed,
    }
}
