//! Static registry of FiscalData endpoints known to answer.

use serde::Serialize;

use super::FISCAL_SOURCE;
use crate::envelope::{Envelope, Metadata, Record, to_record};
use crate::error::EnvelopeError;

/// Verified endpoints, in registration order.
pub const ENDPOINTS: &[&str] = &[
    "v2/accounting/od/debt_to_penny",
    "v2/accounting/od/avg_interest_rates",
    "v2/accounting/od/schedules_fed_debt",
    "v2/accounting/od/stmt_debt",
    "v2/accounting/od/stmt_tsy_gov_sec_hldgs",
    "v2/accounting/od/mts",
    "v2/accounting/od/receipts",
    "v2/accounting/od/outlays",
    "v2/accounting/od/deficit",
    "v2/accounting/od/supplemental_monthly_statement",
    "v2/accounting/dts/gs_cfs",
    "v2/accounting/dts/ds_gf",
    "v2/accounting/dts/debt_to_the_penny",
    "v2/accounting/od/avg_maturity_secs",
    "v2/accounting/od/securities",
    "v2/debt/msd/msd_summary",
    "v2/debt/msd/msd_detail",
    "v2/debt/ie/ie_bpd",
    "v2/revenue/rc/collections",
    "v2/revenue/rc/quarterly_collections",
    "v2/revenue/rc/annual_collections",
    "v2/revenue/rc/receipts",
    "v2/revenue/rc/expenditures",
    "v2/expenditures/budget/budget_function",
    "v2/expenditures/budget/budget_subfunction",
    "v2/expenditures/budget/budget_account",
    "v2/expenditures/budget/budget_object_class",
    "v2/expenditures/agency/agency",
];

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    pub endpoint: &'static str,
    pub category: &'static str,
    pub name: String,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<usize>,
}

impl EndpointDescriptor {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            category: category_of(endpoint),
            name: display_name(endpoint),
            path: endpoint,
            match_score: None,
        }
    }

    fn scored(endpoint: &'static str, score: usize) -> Self {
        Self {
            match_score: Some(score),
            ..Self::new(endpoint)
        }
    }
}

/// Second path segment, or `"unknown"` for paths too short to have one.
pub fn category_of(endpoint: &str) -> &str {
    let segments: Vec<&str> = endpoint.split('/').collect();
    if segments.len() > 2 {
        segments[1]
    } else {
        "unknown"
    }
}

/// `v2/accounting/od/debt_to_penny` becomes `Accounting/Od/Debt To Penny`.
pub fn display_name(endpoint: &str) -> String {
    let stripped = endpoint.replace("v2/", "").replace('_', " ");

    let mut name = String::with_capacity(stripped.len());
    let mut after_letter = false;
    for c in stripped.chars() {
        if c.is_alphabetic() {
            if after_letter {
                name.extend(c.to_lowercase());
            } else {
                name.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            name.push(c);
            after_letter = false;
        }
    }
    name
}

/// Every endpoint, in registration order.
pub fn list_all() -> Vec<EndpointDescriptor> {
    ENDPOINTS.iter().copied().map(EndpointDescriptor::new).collect()
}

/// Endpoints whose path contains `category` exactly as given.
pub fn filter_by_category(category: &str) -> Vec<EndpointDescriptor> {
    ENDPOINTS
        .iter()
        .copied()
        .filter(|endpoint| endpoint.contains(category))
        .map(EndpointDescriptor::new)
        .collect()
}

/// Number of whitespace-separated query tokens found in `endpoint`.
pub fn match_score(query: &str, endpoint: &str) -> usize {
    let haystack = endpoint.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|token| haystack.contains(token))
        .count()
}

/// Endpoints matching at least one query token, best match first.
///
/// Ties keep registration order.
pub fn search(query: &str) -> Vec<EndpointDescriptor> {
    let mut matches: Vec<EndpointDescriptor> = ENDPOINTS
        .iter()
        .copied()
        .filter_map(|endpoint| match match_score(query, endpoint) {
            0 => None,
            score => Some(EndpointDescriptor::scored(endpoint, score)),
        })
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    matches
}

fn records(descriptors: &[EndpointDescriptor]) -> Result<Vec<Record>, EnvelopeError> {
    descriptors.iter().map(to_record).collect()
}

/// Catalogue envelope.
pub fn get_catalogue() -> Envelope {
    let metadata = Metadata::new(FISCAL_SOURCE)
        .with_action("get_catalogue")
        .with("description", "Available U.S. Treasury FiscalData datasets");
    Envelope::from_result(metadata, records(&list_all()))
}

/// Category envelope; an empty match is an error envelope.
pub fn get_datasets_by_category(category: &str) -> Envelope {
    let metadata = Metadata::new(FISCAL_SOURCE)
        .with_action("get_datasets_by_category")
        .with("category", category);

    let found = filter_by_category(category);
    if found.is_empty() {
        tracing::warn!(category, "no catalogue entries for category");
        return Envelope::no_datasets(metadata, category);
    }
    Envelope::from_result(metadata, records(&found))
}

/// Search envelope.
pub fn search_datasets(query: &str) -> Envelope {
    let metadata = Metadata::new(FISCAL_SOURCE)
        .with_action("search_datasets")
        .with("query", query);
    Envelope::from_result(metadata, records(&search(query)))
}
