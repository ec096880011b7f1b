use thiserror::Error;

/// The only failure `assess` surfaces to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssessError {
    #[error("Invalid location: latitude={latitude}, longitude={longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Invalid feature vector: {0}")]
    InvalidFeatureVector(String),
}

/// Failures reported by report/weather readers. The engine degrades on all of them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store request timed out")]
    Timeout,

    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_location_message_names_coordinates() {
        let err = AssessError::InvalidLocation { latitude: 200.0, longitude: 10.0 };
        let msg = err.to_string();
        assert!(msg.contains("latitude=200"));
        assert!(msg.contains("longitude=10"));
    }

    #[test]
    fn store_error_messages() {
        assert_eq!(StoreError::Timeout.to_string(), "Store request timed out");
        assert!(StoreError::Unavailable("down".into()).to_string().contains("down"));
    }
}
