//! Top-level error type for starting and running the bridge.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

/// Failures that stop the bridge from starting.
///
/// Errors raised while the bridge runs are answered on the wire or logged;
/// only setup reports through this type.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A Unix socket could not be connected.
    #[error("failed to connect to {}: {source}", path.display())]
    Connect {
        /// Socket path that was dialled.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The Prometheus exporter could not be installed.
    #[cfg(feature = "metrics")]
    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_names_the_socket() {
        let err = BridgeError::Connect {
            path: PathBuf::from("/run/nfd.sock"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to connect to /run/nfd.sock"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn config_errors_convert() {
        let parse = crate::config::BridgeConfig::from_toml("bogus = 1").expect_err("unknown key");
        let err = BridgeError::from(parse);
        assert!(matches!(err, BridgeError::Config(ConfigError::Parse(_))));
    }
}
