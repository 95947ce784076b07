//! Error types for the KubeRay common crate
//!
//! Errors carry the offending identifier (container name, quantity string)
//! so a reconciler can put them straight into an event or status message.

use thiserror::Error;

/// Main error type for common KubeRay operations
#[derive(Debug, Error)]
pub enum Error {
    /// A container looked up by name is not present in the pod spec
    #[error("can not find container {container}")]
    ContainerNotFound {
        /// Name of the container that was requested
        container: String,
    },

    /// A resource quantity string could not be parsed
    #[error("invalid quantity '{value}': {message}")]
    InvalidQuantity {
        /// The raw quantity string
        value: String,
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create a container-not-found error
    pub fn container_not_found(container: impl Into<String>) -> Self {
        Self::ContainerNotFound {
            container: container.into(),
        }
    }

    /// Create an invalid-quantity error
    pub fn invalid_quantity(value: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
            message: msg.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// None of these errors go away by retrying: they all describe the
    /// shape of the input objects.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ContainerNotFound { .. } => false,
            Error::InvalidQuantity { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Story: a missing container is reported by name
    ///
    /// The reconciler surfaces this message in events, so the container
    /// name must be part of the rendered error.
    #[test]
    fn story_container_not_found_names_the_container() {
        let err = Error::container_not_found("ray-worker");
        assert_eq!(err.to_string(), "can not find container ray-worker");
        match &err {
            Error::ContainerNotFound { container } => assert_eq!(container, "ray-worker"),
            _ => panic!("Expected ContainerNotFound variant"),
        }
    }

    #[test]
    fn test_invalid_quantity_message() {
        let err = Error::invalid_quantity("12Qi", "unknown suffix 'Qi'");
        assert!(err.to_string().contains("12Qi"));
        assert!(err.to_string().contains("unknown suffix"));
    }

    #[test]
    fn test_errors_are_not_retryable() {
        assert!(!Error::container_not_found("c").is_retryable());
        assert!(!Error::invalid_quantity("x", "bad").is_retryable());
    }
}
