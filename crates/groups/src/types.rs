//! Identity types for servers, tables and regions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing a server address or table name from text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The server address is not of the form `host:port`.
    #[error("invalid server address: {0}")]
    ServerAddress(String),

    /// The table name is not of the form `[namespace:]qualifier`.
    #[error("invalid table name: {0}")]
    TableName(String),
}

/// Host and port of a worker server.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Creates a new server address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ParseError::ServerAddress(s.to_string()))?;

        if host.is_empty() {
            return Err(ParseError::ServerAddress(s.to_string()));
        }

        let port = port
            .parse()
            .map_err(|_| ParseError::ServerAddress(s.to_string()))?;

        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for ServerAddress {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerAddress> for String {
    fn from(address: ServerAddress) -> Self {
        address.to_string()
    }
}

/// Namespace-qualified table name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName {
    namespace: String,
    qualifier: String,
}

impl TableName {
    /// Namespace used when a table name carries none.
    pub const DEFAULT_NAMESPACE: &'static str = "default";

    /// Creates a new table name.
    pub fn new(namespace: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            qualifier: qualifier.into(),
        }
    }

    /// The namespace the table lives in.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The table name within its namespace.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.qualifier)
    }
}

impl FromStr for TableName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, qualifier) = s
            .split_once(':')
            .unwrap_or((Self::DEFAULT_NAMESPACE, s));

        if namespace.is_empty() || qualifier.is_empty() || qualifier.contains(':') {
            return Err(ParseError::TableName(s.to_string()));
        }

        Ok(Self::new(namespace, qualifier))
    }
}

impl TryFrom<String> for TableName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TableName> for String {
    fn from(table: TableName) -> Self {
        table.to_string()
    }
}

/// A region: an independently assigned shard of a table.
///
/// Ordered by table first so that regions of one table sort together.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionInfo {
    table: TableName,
    encoded_name: String,
}

impl RegionInfo {
    /// Creates a new region of `table` identified by `encoded_name`.
    pub fn new(table: TableName, encoded_name: impl Into<String>) -> Self {
        Self {
            table,
            encoded_name: encoded_name.into(),
        }
    }

    /// The table owning this region.
    #[must_use]
    pub const fn table(&self) -> &TableName {
        &self.table
    }

    /// The encoded region key.
    #[must_use]
    pub fn encoded_name(&self) -> &str {
        &self.encoded_name
    }
}

impl fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.encoded_name)
    }
}

/// Transitional state of a region that is moving between servers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionState {
    /// Waiting to be opened.
    PendingOpen,
    /// Being opened on the server.
    Opening,
    /// Waiting to be closed.
    PendingClose,
    /// Being closed on the server.
    Closing,
    /// Closed, not yet reassigned.
    Offline,
}

/// A region currently in transition, and the server it is moving on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTransition {
    /// The moving region.
    pub region: RegionInfo,

    /// The server the transition is happening on.
    pub server: ServerAddress,

    /// Current transition state.
    pub state: TransitionState,
}

/// A single placement decision produced by a placement algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPlan {
    /// The region to move.
    pub region: RegionInfo,

    /// Where the region currently lives, if anywhere.
    pub source: Option<ServerAddress>,

    /// Where the region should go.
    pub destination: ServerAddress,
}

impl fmt::Display for RegionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(
                f,
                "region={}, source={source}, destination={}",
                self.region, self.destination
            ),
            None => write!(
                f,
                "region={}, source=none, destination={}",
                self.region, self.destination
            ),
        }
    }
}
