use crate::models;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Request timeout portal clients use unless configured otherwise
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the CKAN client
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Base URL for the CKAN API (e.g., "https://catalog.data.gov/api/3")
    pub base_path: String,
    /// User agent string for HTTP requests
    pub user_agent: Option<String>,
    /// HTTP client instance
    pub client: reqwest::Client,
}

impl Configuration {
    /// Create a new configuration with default values
    pub fn new() -> Configuration {
        Configuration::default()
    }

    /// Configuration pointing at a portal site root, with the request timeout
    /// baked into the HTTP client.
    pub fn for_portal(
        site_root: &str,
        user_agent: Option<String>,
        timeout: Duration,
    ) -> Result<Configuration, CkanError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(ref ua) = user_agent {
            builder = builder.user_agent(ua.as_str());
        }
        let client = builder
            .build()
            .map_err(|e| CkanError::RequestError(Box::new(e)))?;

        Ok(Configuration {
            base_path: crate::portals::api_base(site_root),
            user_agent,
            client,
        })
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            base_path: "https://catalog.data.gov/api/3".to_owned(),
            user_agent: Some("open-data-rs/0.1".to_owned()),
            client: reqwest::Client::new(),
        }
    }
}

/// # CKAN Client
///
/// A read-only client for the CKAN action API. Works against any CKAN
/// instance; [`crate::portals`] lists the national portals this workspace
/// targets.
///
/// Every method issues exactly one GET request against
/// `{base_path}/action/{action}` and unwraps the `{success, result, error}`
/// wrapper CKAN puts around every payload.
///
/// ## Usage
///
/// ```rust,no_run
/// use open_data_ckan::{CkanClient, Configuration};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = CkanClient::new(Arc::new(Configuration::default()));
///
///     let results = client.package_search(Some("climate"), Some(10), Some(0), None).await?;
///
///     println!("Found {} datasets", results.count.unwrap_or(0));
///     for package in results.results {
///         println!("Dataset: {}", package.title.unwrap_or_default());
///     }
///
///     Ok(())
/// }
/// ```
pub struct CkanClient {
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for CkanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CkanClient")
            .field("base_path", &self.configuration.base_path)
            .finish()
    }
}

/// Errors that can occur when interacting with the CKAN API
///
/// # Examples
///
/// ```rust
/// # use open_data_ckan::CkanError;
/// fn describe(err: &CkanError) -> String {
///     match err {
///         CkanError::RequestError(e) => format!("network: {}", e),
///         CkanError::ParseError(e) => format!("bad payload: {}", e),
///         CkanError::ApiError { status, message } => format!("{}: {}", status, message),
///         CkanError::ActionFailed { message } => format!("ckan: {}", message),
///     }
/// }
/// ```
#[derive(Debug)]
pub enum CkanError {
    /// Network-level errors: connection failures, timeouts, DNS resolution,
    /// or a body that could not be read.
    RequestError(Box<dyn std::error::Error + Send + Sync>),

    /// The response body was not valid JSON or did not match the expected schema.
    ParseError(serde_json::Error),

    /// The portal answered with a non-2xx HTTP status.
    ///
    /// - 404: Dataset not found
    /// - 403: Insufficient permissions
    /// - 400: Invalid parameters
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error description from the body, or the raw body text
        message: String,
    },

    /// The HTTP call succeeded but CKAN reported `success: false`, or the
    /// wrapper carried no result.
    ActionFailed {
        /// Error description from the CKAN error block
        message: String,
    },
}

impl CkanError {
    /// True when the underlying transport gave up waiting.
    pub fn is_timeout(&self) -> bool {
        self.reqwest_error().is_some_and(reqwest::Error::is_timeout)
    }

    /// True when no connection could be established (refused, DNS, TLS).
    pub fn is_connect(&self) -> bool {
        self.reqwest_error().is_some_and(reqwest::Error::is_connect)
    }

    fn reqwest_error(&self) -> Option<&reqwest::Error> {
        match self {
            CkanError::RequestError(e) => e.downcast_ref::<reqwest::Error>(),
            _ => None,
        }
    }
}

impl std::fmt::Display for CkanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CkanError::RequestError(e) => write!(f, "Request error: {}", e),
            CkanError::ParseError(e) => write!(f, "Parse error: {}", e),
            CkanError::ApiError { status, message } => {
                write!(f, "CKAN API error ({}): {}", status, message)
            }
            CkanError::ActionFailed { message } => write!(f, "CKAN action failed: {}", message),
        }
    }
}

impl std::error::Error for CkanError {}

impl CkanClient {
    /// Create a new CKAN client instance
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use open_data_ckan::{CkanClient, Configuration};
    /// # use std::sync::Arc;
    /// let config = Arc::new(Configuration {
    ///     base_path: "https://data.gov.uk/api/3".to_string(),
    ///     user_agent: Some("my-rust-app/1.0".to_string()),
    ///     client: reqwest::Client::new(),
    /// });
    ///
    /// let client = CkanClient::new(config);
    /// ```
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self { configuration }
    }

    /// Base path this client sends requests to.
    pub fn base_path(&self) -> &str {
        &self.configuration.base_path
    }

    /// Search for datasets (packages)
    ///
    /// # Arguments
    ///
    /// * `q` - Search query string (searches title, description, tags, etc.)
    /// * `rows` - Maximum number of results to return
    /// * `start` - Starting offset for pagination (0-based)
    /// * `fq` - Additional filter queries in Solr format
    ///
    /// With no query the portal returns its most relevant datasets, which is
    /// how dataset listing is done.
    pub async fn package_search(
        &self,
        q: Option<&str>,
        rows: Option<i32>,
        start: Option<i32>,
        fq: Option<&str>,
    ) -> Result<models::PackageSearchResult, CkanError> {
        let rows_str = rows.map(|r| r.to_string());
        let start_str = start.map(|s| s.to_string());

        let mut params = Vec::new();
        if let Some(q) = q {
            params.push(("q", q));
        }
        if let Some(ref rows_s) = rows_str {
            params.push(("rows", rows_s.as_str()));
        }
        if let Some(ref start_s) = start_str {
            params.push(("start", start_s.as_str()));
        }
        if let Some(fq) = fq {
            params.push(("fq", fq));
        }

        self.action("package_search", &params).await
    }

    /// Retrieve a specific dataset by its ID or name
    pub async fn package_show(&self, id: &str) -> Result<models::Package, CkanError> {
        self.action("package_show", &[("id", id)]).await
    }

    /// Retrieve a single resource by ID
    pub async fn resource_show(&self, id: &str) -> Result<models::Resource, CkanError> {
        self.action("resource_show", &[("id", id)]).await
    }

    /// List organizations with full records
    ///
    /// # Arguments
    ///
    /// * `sort` - Sort order (e.g. "name asc")
    /// * `limit` - Maximum number of organizations to return
    /// * `offset` - Number of organizations to skip
    pub async fn organization_list(
        &self,
        sort: Option<&str>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<models::Organization>, CkanError> {
        let limit_str = limit.map(|l| l.to_string());
        let offset_str = offset.map(|o| o.to_string());

        let mut params = vec![("all_fields", "true")];
        if let Some(sort) = sort {
            params.push(("sort", sort));
        }
        if let Some(ref limit_s) = limit_str {
            params.push(("limit", limit_s.as_str()));
        }
        if let Some(ref offset_s) = offset_str {
            params.push(("offset", offset_s.as_str()));
        }

        self.action("organization_list", &params).await
    }

    /// Retrieve one organization by ID or name
    pub async fn organization_show(&self, id: &str) -> Result<models::Organization, CkanError> {
        self.action("organization_show", &[("id", id), ("include_datasets", "false")])
            .await
    }

    /// Site status: CKAN version, site title, enabled extensions.
    ///
    /// Cheapest action a portal exposes, used as a reachability probe.
    pub async fn status_show(&self) -> Result<serde_json::Value, CkanError> {
        self.action("status_show", &[]).await
    }

    async fn action<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CkanError> {
        let url = self.action_url(action, params);

        let mut request = self.configuration.client.get(&url);
        if let Some(ref ua) = self.configuration.user_agent {
            request = request.header(reqwest::header::USER_AGENT, ua.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| CkanError::RequestError(Box::new(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CkanError::RequestError(Box::new(e)))?;

        if !status.is_success() {
            // CKAN describes 4xx failures in its usual wrapper; fall back to the raw body.
            let message = serde_json::from_str::<models::ActionResponse>(&body)
                .ok()
                .and_then(|wrapper| wrapper.error)
                .map(|error| error.describe())
                .unwrap_or(body);
            return Err(CkanError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let wrapper: models::ActionResponse =
            serde_json::from_str(&body).map_err(CkanError::ParseError)?;

        if !wrapper.success {
            return Err(CkanError::ActionFailed {
                message: wrapper
                    .error
                    .map(|error| error.describe())
                    .unwrap_or_else(|| "CKAN API reported failure".to_string()),
            });
        }

        match wrapper.result {
            Some(result) => serde_json::from_value(result).map_err(CkanError::ParseError),
            None => Err(CkanError::ActionFailed {
                message: "No result data in API response".to_string(),
            }),
        }
    }

    fn action_url(&self, action: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/action/{}",
            self.configuration.base_path.trim_end_matches('/'),
            action
        );

        if !params.is_empty() {
            url.push('?');
            let query_string = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push_str(&query_string);
        }

        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_path: &str) -> CkanClient {
        CkanClient::new(Arc::new(Configuration {
            base_path: base_path.to_string(),
            user_agent: None,
            client: reqwest::Client::new(),
        }))
    }

    #[test]
    fn test_action_url_encodes_params() {
        let url = client("https://data.gov.uk/api/3/")
            .action_url("package_search", &[("q", "climate change"), ("rows", "5")]);
        assert_eq!(
            url,
            "https://data.gov.uk/api/3/action/package_search?q=climate%20change&rows=5"
        );
    }

    #[test]
    fn test_action_url_without_params() {
        let url = client("http://localhost/api/3").action_url("status_show", &[]);
        assert_eq!(url, "http://localhost/api/3/action/status_show");
    }
}
