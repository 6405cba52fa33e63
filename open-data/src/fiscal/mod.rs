//! U.S. Treasury FiscalData API: endpoint catalogue, request executor and
//! named series.

pub mod catalogue;
pub mod client;
pub mod series;
mod selftest;

pub use catalogue::EndpointDescriptor;
pub use client::{DatasetQuery, FiscalDataClient, QueryParams};
pub use series::{DateRange, Series, build_filter};

/// `metadata.source` of every FiscalData envelope
pub const FISCAL_SOURCE: &str = "us_treasury_fiscaldata";
