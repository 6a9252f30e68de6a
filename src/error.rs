use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerieslyError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No data returned from {0}")]
    NoData(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unparseable timestamp: {0}")]
    Timestamp(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SerieslyError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SerieslyError::Http(status),
            None if err.is_decode() => SerieslyError::Serialization(err.to_string()),
            None => SerieslyError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SerieslyError {
    fn from(err: serde_json::Error) -> Self {
        SerieslyError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SerieslyError {
    fn from(err: std::io::Error) -> Self {
        SerieslyError::Io(err.to_string())
    }
}

impl IntoResponse for SerieslyError {
    fn into_response(self) -> Response {
        let status = match self {
            SerieslyError::InvalidUrl(_)
            | SerieslyError::InvalidWindow(_)
            | SerieslyError::InvalidQuery(_)
            | SerieslyError::Timestamp(_) => StatusCode::BAD_REQUEST,
            SerieslyError::NoData(_) => StatusCode::NOT_FOUND,
            SerieslyError::Transport(_)
            | SerieslyError::Http(_)
            | SerieslyError::Serialization(_) => StatusCode::BAD_GATEWAY,
            SerieslyError::Io(_) | SerieslyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SerieslyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (SerieslyError::InvalidWindow("step".into()), StatusCode::BAD_REQUEST),
            (SerieslyError::NoData("http://db/".into()), StatusCode::NOT_FOUND),
            (
                SerieslyError::Http(reqwest::StatusCode::SERVICE_UNAVAILABLE),
                StatusCode::BAD_GATEWAY,
            ),
            (SerieslyError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_messages() {
        let err = SerieslyError::Http(reqwest::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "HTTP error: 404 Not Found");

        let err = SerieslyError::Timestamp("yesterday".into());
        assert_eq!(err.to_string(), "Unparseable timestamp: yesterday");
    }
}
