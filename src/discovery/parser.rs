//! Instance-list parsing.
//!
//! Routes carry their backend addresses as a single `;`-separated string.
//! Two token conventions are supported, selected by [`ParseMode`]:
//!
//! ```text
//! host_port:  localhost:8090;localhost:8091;[::1]:8092
//! uri:        http://localhost:8090;https://secure.internal:8443
//! ```
//!
//! Instance ids are `{service_id}-{n}` with `n` counting tokens from 1, so the
//! same string always produces the same ids. Re-registration relies on that.

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::discovery::instance::ServiceInstance;
use crate::error::ConfigurationError;

/// Token delimiter inside an instance-list string.
pub const INSTANCE_DELIMITER: char = ';';

/// Which token convention an instance list uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Absolute URIs; `https`/`wss` mark the instance secure.
    Uri,
    /// Bare `host:port` pairs; instances are never secure.
    #[default]
    HostPort,
}

impl std::fmt::Display for ParseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseMode::Uri => write!(f, "uri"),
            ParseMode::HostPort => write!(f, "host_port"),
        }
    }
}

/// Raw instance configuration attached to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInstanceConfig {
    pub instances: String,
    pub route_id: Option<String>,
}

impl RouteInstanceConfig {
    pub fn new(instances: impl Into<String>, route_id: Option<String>) -> Self {
        Self {
            instances: instances.into(),
            route_id,
        }
    }

    /// True when there is nothing to register.
    pub fn is_empty(&self) -> bool {
        self.instances.trim().is_empty()
    }

    /// Build the instances for `service_id`.
    pub fn service_instances(
        &self,
        service_id: &str,
        mode: ParseMode,
    ) -> Result<Vec<ServiceInstance>, ConfigurationError> {
        parse_instances(&self.instances, service_id, mode)
    }
}

/// Parse a full instance list. Any bad token rejects the whole list.
pub fn parse_instances(
    instances: &str,
    service_id: &str,
    mode: ParseMode,
) -> Result<Vec<ServiceInstance>, ConfigurationError> {
    instances
        .split(INSTANCE_DELIMITER)
        .enumerate()
        .map(|(index, raw)| {
            let position = index + 1;
            let token = raw.trim();
            if token.is_empty() {
                return Err(ConfigurationError::EmptyToken { position });
            }

            let (host, port, secure) = match mode {
                ParseMode::Uri => parse_uri_token(token)?,
                ParseMode::HostPort => {
                    let (host, port) = parse_host_port_token(token)?;
                    (host, port, false)
                }
            };

            Ok(ServiceInstance::new(
                format!("{service_id}-{position}"),
                service_id,
                host,
                port,
                secure,
            ))
        })
        .collect()
}

fn parse_uri_token(token: &str) -> Result<(String, u16, bool), ConfigurationError> {
    let url = Url::parse(token).map_err(|source| match source {
        url::ParseError::InvalidPort => ConfigurationError::InvalidPort {
            token: token.to_string(),
        },
        source => ConfigurationError::InvalidUri {
            token: token.to_string(),
            source,
        },
    })?;

    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => {
            return Err(ConfigurationError::MissingHost {
                token: token.to_string(),
            })
        }
    };

    let port = url
        .port_or_known_default()
        .ok_or_else(|| ConfigurationError::MissingPort {
            token: token.to_string(),
        })?;

    let secure = matches!(url.scheme(), "https" | "wss");

    Ok((host, port, secure))
}

fn parse_host_port_token(token: &str) -> Result<(String, u16), ConfigurationError> {
    let (host, port) = if let Some(rest) = token.strip_prefix('[') {
        // [v6]:port
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| ConfigurationError::MissingHost {
                token: token.to_string(),
            })?;
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| ConfigurationError::MissingPort {
                token: token.to_string(),
            })?;
        (host, port)
    } else {
        let (host, port) =
            token
                .rsplit_once(':')
                .ok_or_else(|| ConfigurationError::MissingPort {
                    token: token.to_string(),
                })?;
        if host.contains(':') {
            return Err(ConfigurationError::MissingHost {
                token: token.to_string(),
            });
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(ConfigurationError::MissingHost {
            token: token.to_string(),
        });
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| ConfigurationError::InvalidPort {
            token: token.to_string(),
        })?;

    Ok((host.to_string(), port))
}
