use std::error::Error;
use std::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum ChatError {
    // State errors
    StateLock(String),

    // Connection errors
    ConnectionError(String),

    // Messages errors
    MessageParseError(String),
    SerializationError(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateLock(msg) => write!(f, "State lock error: {}", msg),
            Self::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Self::MessageParseError(msg) => write!(f, "Message parse error: {}", msg),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for ChatError {}

// Converting from PoisonError to facilitate poisoned mutex handling
impl<T> From<PoisonError<T>> for ChatError {
    fn from(err: PoisonError<T>) -> Self {
        ChatError::StateLock(format!("Mutex poisoned: {}", err))
    }
}

// Generic result type for the chat channel
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_display_messages() {
        let err = ChatError::ConfigError("feed interval must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: feed interval must be positive"
        );
    }

    #[test]
    fn test_poison_conversion() {
        let lock = Arc::new(Mutex::new(0u8));
        let poisoner = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err: ChatError = lock.lock().unwrap_err().into();
        assert!(matches!(err, ChatError::StateLock(_)));
    }
}
