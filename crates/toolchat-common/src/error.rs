use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The incoming request was rejected before any provider was contacted.
    #[error("{0}")]
    Validation(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_bare_message() {
        let err = Error::Validation("Invalid message".into());
        assert_eq!(err.to_string(), "Invalid message");
        assert!(err.is_validation());
    }

    #[test]
    fn provider_error_is_not_validation() {
        let err = Error::Provider("status=429".into());
        assert!(!err.is_validation());
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }
}
