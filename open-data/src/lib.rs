//! Uniform `{data, metadata, error}` access to the U.S. Treasury FiscalData
//! API and to national CKAN portals, with an integration test harness for the
//! portals.

pub use open_data_ckan as ckan;

pub mod colors;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fiscal;
pub mod harness;
pub mod logging;
pub mod portal;
pub mod results;
pub mod validation;

pub use colors::{ColorHelper, ColorMode, Tone};
pub use config::{FiscalDataConfig, PortalConfig};
pub use envelope::{Envelope, Metadata, Outcome, PageInfo, Record};
pub use error::{EnvelopeError, ErrorKind, OpenDataError, Result};
pub use fiscal::{DatasetQuery, DateRange, FiscalDataClient, Series};
pub use harness::{Harness, HarnessOptions, RunReport};
pub use portal::{CkanPortals, PortalApi};
pub use results::{TestResult, TestStatus};
