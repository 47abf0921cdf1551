//! Cost engine error types

use thiserror::Error;

/// Cost engine error types
#[derive(Debug, Error)]
pub enum CostEngineError {
    /// Date range is inverted or otherwise unusable
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange { start: String, end: String },

    /// Budget limits or engine configuration is malformed
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The external record store failed or timed out
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// A derived value diverged from its source records beyond tolerance
    #[error("Data inconsistency detected: {details}")]
    DataInconsistency { details: String },
}

/// Cost engine result type
pub type CostEngineResult<T> = Result<T, CostEngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range_error() {
        let error = CostEngineError::InvalidRange {
            start: "2026-03-10".to_string(),
            end: "2026-03-01".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid date range: 2026-03-10 > 2026-03-01"
        );
    }

    #[test]
    fn test_invalid_configuration_error() {
        let error = CostEngineError::InvalidConfiguration {
            message: "negative total budget: -50.00".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration: negative total budget: -50.00"
        );
    }

    #[test]
    fn test_storage_unavailable_error() {
        let error = CostEngineError::StorageUnavailable {
            message: "read timed out after 5s".to_string(),
        };
        assert!(error.to_string().contains("read timed out"));
    }

    #[test]
    fn test_data_inconsistency_error() {
        let error = CostEngineError::DataInconsistency {
            details: "breakdown sum 99.98 diverges from total 100.10".to_string(),
        };
        assert!(error.to_string().contains("breakdown sum"));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CostEngineError>();
        assert_sync::<CostEngineError>();
    }

    #[test]
    fn test_result_type() {
        let success: CostEngineResult<i32> = Ok(42);
        assert!(success.is_ok());

        let failure: CostEngineResult<i32> = Err(CostEngineError::InvalidConfiguration {
            message: "test".to_string(),
        });
        assert!(failure.is_err());
    }
}
