use tracing::info;

use super::FISCAL_SOURCE;
use super::catalogue;
use super::client::FiscalDataClient;
use super::series::{DateRange, Series};
use crate::envelope::{Envelope, Metadata, Record, to_record};
use crate::results::{TestResult, format_rate, success_rate};

impl FiscalDataClient {
    /// Exercise the catalogue, two live series, search and category lookup.
    ///
    /// The envelope's data are the per-check results; its metadata carries
    /// the totals. Failed checks do not make the envelope itself an error.
    pub async fn test_endpoints(&self) -> Envelope {
        let unbounded = DateRange::unbounded();
        let mut results = Vec::with_capacity(5);

        results.push(TestResult::from_envelope(
            "get_catalogue",
            &catalogue::get_catalogue(),
        ));
        for series in [Series::DebtToPenny, Series::YieldRates] {
            let envelope = self.series(series, &unbounded).await;
            results.push(TestResult::from_envelope(series.accessor(), &envelope));
        }
        results.push(TestResult::from_envelope(
            "search_datasets",
            &catalogue::search_datasets("debt"),
        ));
        results.push(TestResult::from_envelope(
            "get_datasets_by_category",
            &catalogue::get_datasets_by_category("accounting"),
        ));

        let total = results.len();
        let passed = results.iter().filter(|r| r.passed()).count();
        info!(passed, total, "fiscal data self-test finished");

        let metadata = Metadata::new(FISCAL_SOURCE)
            .with_action("test_endpoints")
            .with("total_tests", total)
            .with("successful_tests", passed)
            .with("failed_tests", total - passed)
            .with("success_rate", format_rate(success_rate(passed, total)));

        let records: Result<Vec<Record>, _> = results.iter().map(to_record).collect();
        Envelope::from_result(metadata, records)
    }
}
