//! Error types for the realtime pipeline.
//!
//! [`RealtimeError`] covers everything between the upstream feed and the
//! caller. [`FailureClass`] is how a request boundary should report it.

use thiserror::Error;

use crate::geo::ValidationError;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },
    #[error("Invalid feed URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("Feed decode error: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Feed decode error: message has no GTFS-RT header")]
    MissingHeader,
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
}

/// Response class a request boundary maps a [`RealtimeError`] onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    ServiceUnavailable,
    Internal,
    BadRequest,
}

impl FailureClass {
    /// The HTTP status code conventionally used for this class.
    pub fn http_status(self) -> u16 {
        match self {
            FailureClass::ServiceUnavailable => 503,
            FailureClass::Internal => 500,
            FailureClass::BadRequest => 400,
        }
    }
}

impl RealtimeError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            RealtimeError::Transport(_)
            | RealtimeError::UpstreamStatus { .. }
            | RealtimeError::InvalidUrl { .. } => FailureClass::ServiceUnavailable,
            RealtimeError::Decode(_) | RealtimeError::MissingHeader => FailureClass::Internal,
            RealtimeError::Validation(_) => FailureClass::BadRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_upstream_status_is_service_unavailable() {
        let err = RealtimeError::UpstreamStatus {
            url: "https://example.org/VehiclePositions.pb".to_string(),
            status: 502,
        };
        assert_eq!(err.failure_class(), FailureClass::ServiceUnavailable);
        assert_eq!(err.failure_class().http_status(), 503);
        assert_eq!(
            err.to_string(),
            "Upstream returned HTTP 502 for https://example.org/VehiclePositions.pb"
        );
    }

    #[test]
    fn test_decode_error_is_internal() {
        let bad_bytes: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let decode_err = crate::gtfs_rt::FeedMessage::decode(bad_bytes).unwrap_err();
        let err: RealtimeError = decode_err.into();

        assert!(matches!(err, RealtimeError::Decode(_)));
        assert_eq!(err.failure_class(), FailureClass::Internal);
        assert_eq!(RealtimeError::MissingHeader.failure_class(), FailureClass::Internal);
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err: RealtimeError = ValidationError::Radius(0.0).into();
        assert_eq!(err.failure_class(), FailureClass::BadRequest);
        assert_eq!(err.failure_class().http_status(), 400);
    }
}
