//! Named data series: preset endpoint, fields and sort, plus a date window.

use chrono::NaiveDate;

use super::client::{DatasetQuery, FiscalDataClient};
use crate::envelope::Envelope;

/// Page size ceiling of every series request
pub const SERIES_PAGE_SIZE: u32 = 500;

/// Most recent first
pub const SERIES_SORT: &str = "-record_date";

const DATE_FIELD: &str = "record_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    /// Total public debt outstanding, daily
    DebtToPenny,
    /// Average interest rates on Treasury securities
    YieldRates,
    /// Revenue collections, used as the monthly statement series
    MonthlyStatement,
    /// Interest expense on the public debt
    InterestExpense,
}

impl Series {
    pub const ALL: [Series; 4] = [
        Series::DebtToPenny,
        Series::YieldRates,
        Series::MonthlyStatement,
        Series::InterestExpense,
    ];

    pub fn endpoint(self) -> &'static str {
        match self {
            Series::DebtToPenny => "v2/accounting/od/debt_to_penny",
            Series::YieldRates => "v2/accounting/od/avg_interest_rates",
            Series::MonthlyStatement => "v2/revenue/rc/collections",
            Series::InterestExpense => "v2/debt/ie/ie_bpd",
        }
    }

    /// Field list; `None` returns every field.
    pub fn fields(self) -> Option<&'static str> {
        match self {
            // Only fields present in every record; others trigger 400s
            Series::DebtToPenny => Some("record_date,tot_pub_debt_out_amt"),
            _ => None,
        }
    }

    /// Accessor name used in self-test reports.
    pub fn accessor(self) -> &'static str {
        match self {
            Series::DebtToPenny => "get_debt_to_penny",
            Series::YieldRates => "get_treasury_yield_rates",
            Series::MonthlyStatement => "get_monthly_treasury_statement",
            Series::InterestExpense => "get_interest_expense",
        }
    }

    /// Query for this series over `range`.
    pub fn query(self, range: &DateRange) -> DatasetQuery {
        let mut query = DatasetQuery::new()
            .sort(SERIES_SORT)
            .page_size(SERIES_PAGE_SIZE);
        if let Some(fields) = self.fields() {
            query = query.fields(fields);
        }
        let filter = range.filter_expression();
        if !filter.is_empty() {
            query = query.filter(filter);
        }
        query
    }
}

/// Optional inclusive bounds on `record_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// No bounds: the full most-recent-first listing.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// FiscalData filter for this window, empty when unbounded.
    pub fn filter_expression(&self) -> String {
        let start = self.start.map(|d| d.format("%Y-%m-%d").to_string());
        let end = self.end.map(|d| d.format("%Y-%m-%d").to_string());
        build_filter(start.as_deref(), end.as_deref())
    }
}

/// Comma-joined `field:operator:value` triples bounding `record_date`.
pub fn build_filter(start: Option<&str>, end: Option<&str>) -> String {
    let mut clauses = Vec::with_capacity(2);
    if let Some(start) = start {
        clauses.push(format!("{}:gte:{}", DATE_FIELD, start));
    }
    if let Some(end) = end {
        clauses.push(format!("{}:lte:{}", DATE_FIELD, end));
    }
    clauses.join(",")
}

impl FiscalDataClient {
    pub async fn series(&self, series: Series, range: &DateRange) -> Envelope {
        self.get_dataset_data(series.endpoint(), &series.query(range))
            .await
    }

    pub async fn debt_to_penny(&self, range: &DateRange) -> Envelope {
        self.series(Series::DebtToPenny, range).await
    }

    pub async fn treasury_yield_rates(&self, range: &DateRange) -> Envelope {
        self.series(Series::YieldRates, range).await
    }

    pub async fn monthly_treasury_statement(&self, range: &DateRange) -> Envelope {
        self.series(Series::MonthlyStatement, range).await
    }

    pub async fn interest_expense(&self, range: &DateRange) -> Envelope {
        self.series(Series::InterestExpense, range).await
    }
}
