//! Command-line configuration
//!
//! The server takes one or more ports (one room per port); the client takes
//! a host and a port. Log levels come from `RUST_LOG`.

use crate::error::AppError;
use crate::session::DEFAULT_OUTBOUND_QUEUE_DEPTH;

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Ports to listen on, one room each
    pub ports: Vec<u16>,
    /// Outbound queue depth per session
    pub queue_depth: usize,
}

impl ServerConfig {
    /// Parse `<port> [<port> ...]` (program name already stripped)
    pub fn from_args<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let ports = args
            .into_iter()
            .map(|arg| parse_port(&arg))
            .collect::<Result<Vec<_>, _>>()?;

        if ports.is_empty() {
            return Err(AppError::Usage("chat_server <port> [<port> ...]".to_string()));
        }

        Ok(Self {
            ports,
            queue_depth: DEFAULT_OUTBOUND_QUEUE_DEPTH,
        })
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
}

impl ClientConfig {
    /// Parse `<host> <port>` (program name already stripped)
    pub fn from_args<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let [host, port] = args.as_slice() else {
            return Err(AppError::Usage("chat_client <host> <port>".to_string()));
        };
        Ok(Self {
            host: host.clone(),
            port: parse_port(port)?,
        })
    }

    /// Address in `host:port` form
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(arg: &str) -> Result<u16, AppError> {
    arg.parse()
        .map_err(|_| AppError::InvalidPort(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_server_multiple_ports() {
        let config = ServerConfig::from_args(args(&["9000", "9001"])).unwrap();
        assert_eq!(config.ports, vec![9000, 9001]);
        assert_eq!(config.queue_depth, DEFAULT_OUTBOUND_QUEUE_DEPTH);
    }

    #[test]
    fn test_server_requires_a_port() {
        assert!(matches!(
            ServerConfig::from_args(Vec::new()),
            Err(AppError::Usage(_))
        ));
    }

    #[test]
    fn test_server_rejects_bad_port() {
        assert!(matches!(
            ServerConfig::from_args(args(&["9000", "http"])),
            Err(AppError::InvalidPort(p)) if p == "http"
        ));
        assert!(matches!(
            ServerConfig::from_args(args(&["70000"])),
            Err(AppError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_client_host_and_port() {
        let config = ClientConfig::from_args(args(&["localhost", "9000"])).unwrap();
        assert_eq!(config.addr(), "localhost:9000");
    }

    #[test]
    fn test_client_wrong_arity() {
        assert!(matches!(
            ClientConfig::from_args(args(&["localhost"])),
            Err(AppError::Usage(_))
        ));
    }
}
