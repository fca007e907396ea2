//! Engine endpoint parsing.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::EngineError;

/// Where the engine API listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEndpoint {
    /// `host:port` reached over plain TCP.
    Tcp(String),
    /// Filesystem path of a Unix domain socket.
    Unix(PathBuf),
}

impl EngineEndpoint {
    /// Value for the HTTP `Host` header.
    pub fn host_header(&self) -> &str {
        match self {
            EngineEndpoint::Tcp(addr) => addr,
            // The engine ignores Host on its local socket.
            EngineEndpoint::Unix(_) => "localhost",
        }
    }
}

impl FromStr for EngineEndpoint {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(addr) = s.strip_prefix("tcp://").or_else(|| s.strip_prefix("http://")) {
            let addr = addr.trim_end_matches('/');
            match addr.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    Ok(EngineEndpoint::Tcp(addr.to_string()))
                }
                _ => Err(EngineError::InvalidEndpoint(s.to_string())),
            }
        } else if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(EngineError::InvalidEndpoint(s.to_string()));
            }
            Ok(EngineEndpoint::Unix(PathBuf::from(path)))
        } else {
            Err(EngineError::InvalidEndpoint(s.to_string()))
        }
    }
}

impl fmt::Display for EngineEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEndpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            EngineEndpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
