//! Tests for the error system
//!
//! These tests verify error construction, context handling and the
//! aggregated exhaustion message.

#[cfg(test)]
mod tests {
    use crate::error::{AttemptFailure, ErrorContext, ServiceError};

    fn failure(label: &str, url: &str, error: ServiceError) -> AttemptFailure {
        AttemptFailure {
            label: label.to_string(),
            url: url.to_string(),
            error,
        }
    }

    #[test]
    fn test_exhausted_message_format() {
        let err = ServiceError::exhausted(vec![
            failure("Android Emulator", "http://10.0.2.2:8000", ServiceError::timeout("Request timed out")),
            failure("Localhost", "http://localhost:8000", ServiceError::network("Connection refused")),
        ]);

        assert_eq!(
            err.to_string(),
            "Cannot connect to server. Tried:\n\
             • Android Emulator (http://10.0.2.2:8000)\n\
             • Localhost (http://localhost:8000)\n\
             \n\
             Final error: Network error: Connection refused"
        );
    }

    #[test]
    fn test_exhausted_without_attempts() {
        let err = ServiceError::exhausted(Vec::new());
        assert!(err.to_string().ends_with("Final error: no endpoints configured"));
    }

    #[test]
    fn test_context_is_transparent() {
        let err = ServiceError::exhausted(vec![failure("A", "http://a", ServiceError::http(404, "Not Found"))])
            .with_context_value("scan_id", "1234");

        assert!(err.to_string().starts_with("Cannot connect to server."));
        assert!(matches!(err.root(), ServiceError::Exhausted { .. }));
        assert_eq!(err.attempts().len(), 1);
        assert_eq!(err.attempts()[0].to_string(), "A (http://a): HTTP 404: Not Found");
    }

    #[test]
    fn test_endpoint_context() {
        let context = ErrorContext::for_endpoint("Localhost", "http://localhost:8000/predict")
            .status_code(502)
            .with("attempt", 3);

        let err = ServiceError::http(502, "Bad Gateway").with_context(context);

        assert_eq!(err.endpoint_label(), Some("Localhost"));
        assert_eq!(err.status_code(), Some(502));
        assert!(err.is_endpoint_failure());

        match err {
            ServiceError::WithContext { context, .. } => {
                assert_eq!(context.data.get("attempt").map(String::as_str), Some("3"));
                assert!(context.timestamp.is_some());
            }
            other => panic!("expected context wrapper, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_failure_classification() {
        assert!(ServiceError::network("refused").is_endpoint_failure());
        assert!(ServiceError::timeout("slow").is_endpoint_failure());
        assert!(ServiceError::parsing("bad json").is_endpoint_failure());
        assert!(!ServiceError::configuration("no endpoints").is_endpoint_failure());
        assert!(!ServiceError::ScanInProgress.is_endpoint_failure());
        assert!(ServiceError::timeout("slow").with_context(ErrorContext::new()).is_timeout());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ServiceError = json_err.into();
        assert!(matches!(err, ServiceError::Parsing(_)));
    }
}
