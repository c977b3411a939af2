use serde::Deserialize;
use waypoint_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AmadeusError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Amadeus returned {status}: {detail}")]
    Api {
        status: u16,
        codes: Vec<u32>,
        detail: String,
    },
    #[error("Authentication failed: {0}")]
    Auth(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    code: Option<u32>,
    title: Option<String>,
    detail: Option<String>,
}

impl AmadeusError {
    /// Builds an API error from a non-2xx response body, keeping the
    /// provider's error codes when the body is the standard error envelope.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => {
                let codes = parsed.errors.iter().filter_map(|e| e.code).collect();
                let detail = parsed
                    .errors
                    .iter()
                    .map(|e| {
                        e.detail
                            .clone()
                            .or_else(|| e.title.clone())
                            .unwrap_or_else(|| "unknown error".to_string())
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                AmadeusError::Api { status, codes, detail }
            }
            _ => AmadeusError::Api {
                status,
                codes: Vec::new(),
                detail: body.chars().take(200).collect(),
            },
        }
    }

    pub fn has_code(&self, code: u32) -> bool {
        matches!(self, AmadeusError::Api { codes, .. } if codes.contains(&code))
    }
}

impl From<AmadeusError> for CoreError {
    fn from(err: AmadeusError) -> Self {
        CoreError::UpstreamUnavailable(err.to_string())
    }
}
