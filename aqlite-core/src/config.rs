/// Connection and engine configuration
use crate::types::DEFAULT_PORT;
use crate::{Error, Result};
use std::fmt;

/// One seed node of the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub port: u16,
}

impl Host {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

/// Parse a seed list such as `"10.0.0.1:3000, node-b"`.
///
/// Entries are comma separated; an entry without `:port` gets the default port.
pub fn parse_hosts(seeds: &str) -> Result<Vec<Host>> {
    let mut hosts = Vec::new();
    for entry in seeds.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once(':') {
            Some((name, port)) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::InvalidArgument(format!("missing host name in '{}'", entry)));
                }
                let port = port.trim().parse::<u16>().map_err(|_| {
                    Error::InvalidArgument(format!("invalid port in '{}'", entry))
                })?;
                hosts.push(Host::new(name, port));
            }
            None => hosts.push(Host::new(entry, DEFAULT_PORT)),
        }
    }

    if hosts.is_empty() {
        return Err(Error::InvalidArgument("no hosts given".into()));
    }
    Ok(hosts)
}

/// Client-side connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Seed nodes
    pub hosts: Vec<Host>,

    /// Credentials, only applied when both user and password are non-empty
    pub user: Option<String>,
    pub password: Option<String>,

    /// TTL given to newly written records (None = never expire)
    pub default_ttl: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hosts: vec![Host::new("localhost", DEFAULT_PORT)],
            user: None,
            password: None,
            default_ttl: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the seed list
    pub fn with_hosts(mut self, hosts: Vec<Host>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Set user credentials
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the TTL applied to written records
    pub fn with_default_ttl(mut self, seconds: u32) -> Self {
        self.default_ttl = Some(seconds);
        self
    }

    /// Credentials pair, if both parts are present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.hosts.is_empty() {
            return Err("at least one host is required".to_string());
        }

        if self.hosts.iter().any(|h| h.name.trim().is_empty()) {
            return Err("host names must not be empty".to_string());
        }

        if self.default_ttl == Some(0) {
            return Err("default_ttl must be greater than 0 when set".to_string());
        }

        Ok(())
    }
}

/// Execution engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Thread name of the read/scan queue
    pub query_queue_name: String,

    /// Thread name of the write/management queue
    pub write_queue_name: String,

    /// Thread name of the delivery context
    pub delivery_name: String,

    /// Reinterpret UPDATE literals to match the existing bin type
    pub narrow_updates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_queue_name: "aqlite-query".to_string(),
            write_queue_name: "aqlite-write".to_string(),
            delivery_name: "aqlite-delivery".to_string(),
            narrow_updates: true,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix all thread names (useful when several engines share a process)
    pub fn with_thread_prefix(mut self, prefix: &str) -> Self {
        self.query_queue_name = format!("{}-query", prefix);
        self.write_queue_name = format!("{}-write", prefix);
        self.delivery_name = format!("{}-delivery", prefix);
        self
    }

    /// Toggle type narrowing on UPDATE
    pub fn with_narrow_updates(mut self, enabled: bool) -> Self {
        self.narrow_updates = enabled;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        let names = [&self.query_queue_name, &self.write_queue_name, &self.delivery_name];
        if names.iter().any(|n| n.is_empty()) {
            return Err("thread names must not be empty".to_string());
        }
        if self.query_queue_name == self.write_queue_name {
            return Err("query and write queues must have distinct names".to_string());
        }
        Ok(())
    }
}
