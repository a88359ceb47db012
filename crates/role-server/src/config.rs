//! Server Configuration
//!
//! Identity advertised on `initialize`, transport selection and the
//! optional advisory tool family (`MCP_*` and `BIND_ADDR` variables).

use std::net::SocketAddr;
use std::str::FromStr;

use role_core::Toolset;
use role_runtime::config::ConfigError;

/// How MCP messages reach the server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// One message per line on stdin/stdout
    Stdio,
    /// Streamable HTTP at `/mcp` over axum
    Http,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::InvalidValue {
                key: "MCP_TRANSPORT".into(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub description: String,
    pub transport: Transport,
    /// Only used by the HTTP transport
    pub bind_addr: SocketAddr,
    /// Expose the advisory tools next to the role tools
    pub advisory_tools: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "llm-mcp-server".into(),
            version: "1.0.0".into(),
            description: "MCP server with LLM capabilities".into(),
            transport: Transport::Stdio,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            advisory_tools: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let transport = match var("MCP_TRANSPORT") {
            Some(raw) => raw.parse()?,
            None => defaults.transport,
        };

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR".into(),
                value: raw,
            })?,
            None => defaults.bind_addr,
        };

        let advisory_tools = match var("MCP_ADVISORY_TOOLS") {
            Some(raw) => parse_flag("MCP_ADVISORY_TOOLS", &raw)?,
            None => defaults.advisory_tools,
        };

        Ok(Self {
            name: var("MCP_SERVER_NAME").unwrap_or(defaults.name),
            version: var("MCP_SERVER_VERSION").unwrap_or(defaults.version),
            description: var("MCP_DESCRIPTION").unwrap_or(defaults.description),
            transport,
            bind_addr,
            advisory_tools,
        })
    }

    pub const fn toolset(&self) -> Toolset {
        Toolset::with_advisory(self.advisory_tools)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            value: raw.to_string(),
        }),
    }
}
