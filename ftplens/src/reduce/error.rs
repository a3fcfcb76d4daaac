//! Reduction error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a reduction pass
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("Log file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_found_message() {
        let err = ReduceError::InputNotFound {
            path: PathBuf::from("/var/log/vsftpd.log"),
        };

        assert_eq!(err.to_string(), "Log file not found: /var/log/vsftpd.log");
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = ReduceError::Read {
            path: PathBuf::from("x.log"),
            source: std::io::Error::other("disk on fire"),
        };

        let msg = err.to_string();
        assert!(msg.contains("x.log"));
        assert!(msg.contains("disk on fire"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
