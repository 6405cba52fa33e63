use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::FISCAL_SOURCE;
use crate::config::FiscalDataConfig;
use crate::envelope::{Envelope, Metadata, PageInfo, Record};
use crate::error::{EnvelopeError, Result};

/// Query string sent to FiscalData, keyed by parameter name.
pub type QueryParams = BTreeMap<String, String>;

pub const PAGE_SIZE_PARAM: &str = "page[size]";
pub const PAGE_NUMBER_PARAM: &str = "page[number]";

/// Page size of [`FiscalDataClient::get_dataset_summary`]
pub const SUMMARY_PAGE_SIZE: u32 = 5;

/// Options of a dataset query. Unset options are left to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetQuery {
    /// Comma-separated field list
    pub fields: Option<String>,
    /// Filter expression such as `record_date:gte:2024-01-01`
    pub filter: Option<String>,
    /// Sort field, `-` prefix for descending
    pub sort: Option<String>,
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

impl DatasetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<S: Into<String>>(mut self, fields: S) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort<S: Into<String>>(mut self, sort: S) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Query parameters; empty strings are treated as unset.
    pub fn to_params(&self, default_page_size: u32) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert(
            PAGE_SIZE_PARAM.to_string(),
            self.page_size.unwrap_or(default_page_size).to_string(),
        );
        params.insert(
            PAGE_NUMBER_PARAM.to_string(),
            self.page_number.unwrap_or(1).to_string(),
        );

        let optional = [
            ("fields", &self.fields),
            ("filter", &self.filter),
            ("sort", &self.sort),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.insert(key.to_string(), value.to_string());
            }
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct FiscalPayload {
    #[serde(default)]
    data: Vec<Record>,
    #[serde(default)]
    meta: Option<FiscalMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct FiscalMeta {
    #[serde(rename = "total-count")]
    total_count: Option<u64>,
    #[serde(rename = "page-number")]
    page_number: Option<u64>,
    #[serde(rename = "page-size")]
    page_size: Option<u64>,
    #[serde(rename = "total-pages")]
    total_pages: Option<u64>,
}

/// Client for the Treasury FiscalData API
///
/// Every call returns an [`Envelope`]; transport, status and payload failures
/// never escape as `Err`.
#[derive(Debug, Clone)]
pub struct FiscalDataClient {
    config: FiscalDataConfig,
    http_client: reqwest::Client,
}

impl FiscalDataClient {
    /// Client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FiscalDataConfig::new())
    }

    pub fn with_config(config: FiscalDataConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &FiscalDataConfig {
        &self.config
    }

    /// Issue one GET against `endpoint`.
    ///
    /// `page[size]` falls back to the configured default and `format` is
    /// always `json`.
    pub async fn execute(&self, endpoint: &str, mut params: QueryParams) -> Envelope {
        params
            .entry(PAGE_SIZE_PARAM.to_string())
            .or_insert_with(|| self.config.default_page_size.to_string());
        params.insert("format".to_string(), "json".to_string());

        let metadata = Metadata::new(FISCAL_SOURCE)
            .with_action(endpoint)
            .with_endpoint(endpoint)
            .with("params", params_value(&params));

        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        debug!(%url, ?params, "fiscal data request");

        let envelope = match self.fetch(&url, &params).await {
            Ok(body) => match parse_payload(&body, self.config.default_page_size) {
                Ok((data, total_count, page_info)) => {
                    Envelope::success(metadata.with_pagination(total_count, page_info), data)
                }
                Err(err) => Envelope::failure(metadata, err),
            },
            Err(err) => Envelope::failure(metadata, err),
        };

        if let Some(err) = envelope.error() {
            warn!(endpoint, error = %err, "fiscal data request failed");
        }
        envelope
    }

    async fn fetch(
        &self,
        url: &str,
        params: &QueryParams,
    ) -> std::result::Result<String, EnvelopeError> {
        let response = self.http_client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnvelopeError::http_status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Records of one dataset page.
    pub async fn get_dataset_data(&self, endpoint: &str, query: &DatasetQuery) -> Envelope {
        self.execute(endpoint, query.to_params(self.config.default_page_size))
            .await
    }

    /// First few records of a dataset, to see its shape.
    pub async fn get_dataset_summary(&self, endpoint: &str) -> Envelope {
        let query = DatasetQuery::new()
            .page_size(SUMMARY_PAGE_SIZE)
            .page_number(1);
        self.get_dataset_data(endpoint, &query).await
    }
}

fn params_value(params: &QueryParams) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Split a FiscalData body into records and pagination.
fn parse_payload(
    body: &str,
    default_page_size: u32,
) -> std::result::Result<(Vec<Record>, u64, PageInfo), EnvelopeError> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(EnvelopeError::MalformedResponse(
            "expected a JSON object with `data` and `meta`".to_string(),
        ));
    }

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        return Err(EnvelopeError::Remote(describe_remote_error(error, value.get("message"))));
    }

    let payload: FiscalPayload = serde_json::from_value(value)?;
    let meta = payload.meta.unwrap_or_default();
    let page_info = PageInfo {
        page_number: meta.page_number.unwrap_or(1),
        page_size: meta.page_size.unwrap_or(u64::from(default_page_size)),
        total_pages: meta.total_pages.unwrap_or(1),
    };

    Ok((payload.data, meta.total_count.unwrap_or(0), page_info))
}

fn describe_remote_error(error: &Value, message: Option<&Value>) -> String {
    let error = match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match message.and_then(Value::as_str) {
        Some(message) if !message.is_empty() => format!("{} - {}", error, message),
        _ => error,
    }
}
