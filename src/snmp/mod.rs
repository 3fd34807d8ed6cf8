// SNMP v1/v2c GET of a single OID through `snmp2`'s tokio session.
// Each attempt opens its own session, so a reply left over from an earlier attempt never
// reaches a later one.

use serde::{Deserialize, Deserializer};
use snmp2::AsyncSession;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Printer-MIB prtMarkerLifeCount: total pages printed by the marker.
const PAGE_COUNT_ARCS: [u32; 13] = [1, 3, 6, 1, 2, 1, 43, 10, 2, 1, 4, 1, 1];

#[derive(Debug, Error)]
pub enum SnmpError {
    #[error("cannot resolve address {0}")]
    Resolve(String),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response from {address} after {attempts} attempt(s)")]
    Timeout { address: String, attempts: u32 },

    #[error("bad response: {0}")]
    Protocol(String),

    #[error("agent returned error-status {status} (index {index})")]
    ErrorStatus { status: u32, index: u32 },

    #[error("agent has no value for {0}")]
    NoSuchName(Oid),
}

impl SnmpError {
    /// The agent did answer; another attempt gets the same answer.
    fn is_final(&self) -> bool {
        matches!(self, SnmpError::ErrorStatus { .. } | SnmpError::NoSuchName(_))
    }
}

/// Object identifier, at least two arcs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn page_count() -> Self {
        Self(PAGE_COUNT_ARCS.to_vec())
    }

    fn to_wire(&self) -> Result<snmp2::Oid<'static>, SnmpError> {
        let arcs: Vec<u64> = self.0.iter().map(|arc| u64::from(*arc)).collect();
        snmp2::Oid::from(&arcs).map_err(|e| SnmpError::Protocol(format!("OID {self}: {e:?}")))
    }
}

impl Default for Oid {
    fn default() -> Self {
        Self::page_count()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = String;

    /// Accepts dotted notation with an optional leading dot (`.1.3.6...`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        let arcs = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| format!("invalid OID {s:?}: arc {part:?} is not a number"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if arcs.len() < 2 {
            return Err(format!("invalid OID {s:?}: needs at least two arcs"));
        }
        if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(format!("invalid OID {s:?}: bad leading arcs"));
        }
        Ok(Self(arcs))
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Owned copy of a varbind value; the session's values borrow its receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Other(String),
}

impl SnmpValue {
    /// Numeric reading usable as a page counter. Negative integers and non-numbers yield None.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            SnmpValue::Integer(v) => u64::try_from(*v).ok(),
            SnmpValue::Counter32(v) | SnmpValue::Gauge32(v) => Some(u64::from(*v)),
            SnmpValue::Counter64(v) => Some(*v),
            // Some agents report counters as decimal strings.
            SnmpValue::OctetString(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            _ => None,
        }
    }

    fn is_exception(&self) -> bool {
        matches!(
            self,
            SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance | SnmpValue::EndOfMibView
        )
    }
}

impl From<&snmp2::Value<'_>> for SnmpValue {
    fn from(value: &snmp2::Value<'_>) -> Self {
        match value {
            snmp2::Value::Integer(v) => SnmpValue::Integer(*v),
            snmp2::Value::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
            snmp2::Value::Null => SnmpValue::Null,
            snmp2::Value::IpAddress(ip) => SnmpValue::IpAddress(*ip),
            snmp2::Value::Counter32(v) => SnmpValue::Counter32(*v),
            snmp2::Value::Unsigned32(v) => SnmpValue::Gauge32(*v),
            snmp2::Value::Timeticks(v) => SnmpValue::TimeTicks(*v),
            snmp2::Value::Counter64(v) => SnmpValue::Counter64(*v),
            snmp2::Value::NoSuchObject => SnmpValue::NoSuchObject,
            snmp2::Value::NoSuchInstance => SnmpValue::NoSuchInstance,
            snmp2::Value::EndOfMibView => SnmpValue::EndOfMibView,
            other => SnmpValue::Other(format!("{other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "v1", alias = "1")]
    V1,
    #[default]
    #[serde(rename = "v2c", alias = "2c")]
    V2c,
}

/// Connection parameters shared by every request.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub community: String,
    pub version: SnmpVersion,
    pub port: u16,
    pub timeout: Duration,
    pub retries: u32,
}

pub struct SnmpClient {
    options: ClientOptions,
    next_request_id: AtomicI32,
}

impl SnmpClient {
    pub fn new(options: ClientOptions) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| (d.subsec_nanos() & 0x00ff_ffff) as i32)
            .unwrap_or(1);
        Self {
            options,
            next_request_id: AtomicI32::new(seed),
        }
    }

    /// GET one OID from the agent at `address` (IP, `ip:port` or hostname).
    /// An attempt that times out or gets an undecodable or mismatched reply is retried;
    /// an error-status or an exception value from the agent is returned at once.
    #[instrument(skip(self), fields(operation = "snmp_get", oid = %target))]
    pub async fn get(&self, address: &str, target: &Oid) -> Result<SnmpValue, SnmpError> {
        let agent = self.resolve(address).await?;
        let wire_oid = target.to_wire()?;

        let attempts = self.options.retries + 1;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match tokio::time::timeout(self.options.timeout, self.attempt(agent, &wire_oid, target))
                .await
            {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.is_final() => return Err(e),
                Ok(Err(e)) => {
                    debug!(attempt, %agent, error = %e, "SNMP attempt failed");
                    last_error = Some(e);
                }
                Err(_) => debug!(attempt, %agent, "SNMP request timed out"),
            }
        }
        Err(last_error.unwrap_or(SnmpError::Timeout {
            address: address.to_string(),
            attempts,
        }))
    }

    async fn attempt(
        &self,
        agent: SocketAddr,
        wire_oid: &snmp2::Oid<'_>,
        target: &Oid,
    ) -> Result<SnmpValue, SnmpError> {
        let community = self.options.community.as_bytes();
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) & 0x7fff_ffff;
        let mut session = match self.options.version {
            SnmpVersion::V1 => AsyncSession::new_v1(agent, community, request_id).await?,
            SnmpVersion::V2c => AsyncSession::new_v2c(agent, community, request_id).await?,
        };

        let mut response = session
            .get(wire_oid)
            .await
            .map_err(|e| SnmpError::Protocol(format!("{e:?}")))?;
        if response.error_status != 0 {
            return Err(SnmpError::ErrorStatus {
                status: response.error_status,
                index: response.error_index,
            });
        }
        let value = match response.varbinds.next() {
            Some((_, value)) => SnmpValue::from(&value),
            None => return Err(SnmpError::Protocol(format!("response does not carry {target}"))),
        };
        if value.is_exception() {
            return Err(SnmpError::NoSuchName(target.clone()));
        }
        Ok(value)
    }

    async fn resolve(&self, address: &str) -> Result<SocketAddr, SnmpError> {
        if let Ok(addr) = address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.options.port));
        }
        let resolved = match address.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => {
                tokio::net::lookup_host(address).await.ok().and_then(|mut it| it.next())
            }
            _ => tokio::net::lookup_host((address, self.options.port))
                .await
                .ok()
                .and_then(|mut it| it.next()),
        };
        resolved.ok_or_else(|| SnmpError::Resolve(address.to_string()))
    }
}
