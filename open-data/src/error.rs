use open_data_ckan::CkanError;
use thiserror::Error;

/// Why an envelope carries no data.
///
/// The `Display` output is what lands in the envelope's `error` field. Each
/// variant starts with a fixed prefix (see [`ErrorKind::prefix`]) so callers
/// can tell failure kinds apart without parsing the rest of the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Connection refused, DNS failure, TLS handshake failure
    #[error("Connection error: unable to connect to API ({0})")]
    Transport(String),

    /// The fixed per-request timeout elapsed
    #[error("Request timeout: API is taking too long to respond")]
    Timeout,

    /// Non-2xx HTTP status
    #[error("HTTP Error: {status} - {reason}")]
    HttpStatus { status: u16, reason: String },

    /// Body is not JSON, or not the JSON shape the endpoint documents
    #[error("Invalid JSON response from API: {0}")]
    MalformedResponse(String),

    /// The payload itself reports an error
    #[error("API Error: {0}")]
    Remote(String),

    /// A catalogue filter matched nothing
    #[error("No datasets found for category: {category}")]
    NoDatasets { category: String },

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Field-less view of [`EnvelopeError`], for matching on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Timeout,
    HttpStatus,
    MalformedResponse,
    RemoteLogical,
    NotFound,
    Unexpected,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Transport,
        ErrorKind::Timeout,
        ErrorKind::HttpStatus,
        ErrorKind::MalformedResponse,
        ErrorKind::RemoteLogical,
        ErrorKind::NotFound,
        ErrorKind::Unexpected,
    ];

    /// Stable leading text of every error message of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            ErrorKind::Transport => "Connection error",
            ErrorKind::Timeout => "Request timeout",
            ErrorKind::HttpStatus => "HTTP Error",
            ErrorKind::MalformedResponse => "Invalid JSON response from API",
            ErrorKind::RemoteLogical => "API Error",
            ErrorKind::NotFound => "No datasets found",
            ErrorKind::Unexpected => "Unexpected error",
        }
    }

    /// Recover the kind from a serialized `error` string.
    pub fn classify(message: &str) -> Option<ErrorKind> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| message.starts_with(kind.prefix()))
    }
}

impl EnvelopeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnvelopeError::Transport(_) => ErrorKind::Transport,
            EnvelopeError::Timeout => ErrorKind::Timeout,
            EnvelopeError::HttpStatus { .. } => ErrorKind::HttpStatus,
            EnvelopeError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            EnvelopeError::Remote(_) => ErrorKind::RemoteLogical,
            EnvelopeError::NoDatasets { .. } => ErrorKind::NotFound,
            EnvelopeError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// HTTP status error with the canonical reason phrase for `status`.
    pub fn http_status(status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown Status");
        EnvelopeError::HttpStatus {
            status,
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for EnvelopeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EnvelopeError::Timeout
        } else if err.is_connect() {
            EnvelopeError::Transport(err.to_string())
        } else if let Some(status) = err.status() {
            EnvelopeError::http_status(status.as_u16())
        } else if err.is_decode() {
            EnvelopeError::MalformedResponse(err.to_string())
        } else {
            EnvelopeError::Unexpected(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        EnvelopeError::MalformedResponse(err.to_string())
    }
}

impl From<CkanError> for EnvelopeError {
    fn from(err: CkanError) -> Self {
        if err.is_timeout() {
            return EnvelopeError::Timeout;
        }
        if err.is_connect() {
            return EnvelopeError::Transport(err.to_string());
        }
        match err {
            CkanError::RequestError(e) => EnvelopeError::Unexpected(e.to_string()),
            CkanError::ParseError(e) => EnvelopeError::MalformedResponse(e.to_string()),
            CkanError::ApiError { status, .. } => EnvelopeError::http_status(status),
            CkanError::ActionFailed { message } => EnvelopeError::Remote(message),
        }
    }
}

/// Errors raised while setting up clients, before any envelope exists
#[derive(Error, Debug)]
pub enum OpenDataError {
    /// HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error from the underlying CKAN client
    #[error("CKAN client error: {0}")]
    CkanError(#[from] CkanError),

    /// Invalid URL error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Country code with no registered portal
    #[error("Invalid country: {code} (valid countries: {valid})")]
    UnknownCountry { code: String, valid: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl OpenDataError {
    /// Create an unknown-country error listing every registered code
    pub fn unknown_country<S: Into<String>>(code: S) -> Self {
        Self::UnknownCountry {
            code: code.into(),
            valid: open_data_ckan::portals::codes().join(", "),
        }
    }

    /// Create a new configuration error
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// Type alias for Results using OpenDataError
pub type Result<T> = std::result::Result<T, OpenDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_round_trips_through_its_message() {
        let samples = [
            EnvelopeError::Transport("dns error".into()),
            EnvelopeError::Timeout,
            EnvelopeError::http_status(503),
            EnvelopeError::MalformedResponse("expected value".into()),
            EnvelopeError::Remote("Invalid filter".into()),
            EnvelopeError::NoDatasets {
                category: "weather".into(),
            },
            EnvelopeError::Unexpected("boom".into()),
        ];

        for err in samples {
            assert_eq!(ErrorKind::classify(&err.to_string()), Some(err.kind()));
        }
    }

    #[test]
    fn test_http_status_message() {
        assert_eq!(
            EnvelopeError::http_status(404).to_string(),
            "HTTP Error: 404 - Not Found"
        );
        assert_eq!(
            EnvelopeError::http_status(599).to_string(),
            "HTTP Error: 599 - Unknown Status"
        );
    }

    #[test]
    fn test_prefixes_are_distinct() {
        for a in ErrorKind::ALL {
            for b in ErrorKind::ALL {
                if a != b {
                    assert!(!a.prefix().starts_with(b.prefix()));
                }
            }
        }
    }

    #[test]
    fn test_ckan_errors_map_to_kinds() {
        let parse = CkanError::ParseError(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(EnvelopeError::from(parse).kind(), ErrorKind::MalformedResponse);

        let status = CkanError::ApiError {
            status: 403,
            message: "Authorization Error".into(),
        };
        assert_eq!(
            EnvelopeError::from(status),
            EnvelopeError::HttpStatus {
                status: 403,
                reason: "Forbidden".into()
            }
        );

        let failed = CkanError::ActionFailed {
            message: "Not found".into(),
        };
        assert_eq!(EnvelopeError::from(failed).to_string(), "API Error: Not found");

        let other = CkanError::RequestError(Box::new(std::io::Error::other("odd")));
        assert_eq!(EnvelopeError::from(other).kind(), ErrorKind::Unexpected);

        assert_eq!(ErrorKind::classify("something else"), None);
    }
}
