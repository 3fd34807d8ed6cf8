use std::collections::BTreeSet;

use crate::snmp::Oid;

/// A polled device as described by configuration. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Unique identity; the archive keys snapshots by this name.
    pub name: String,
    pub description: String,
    /// OID of the counter to read.
    pub query_target: Oid,
    /// IP address, `ip:port` or hostname.
    pub address: String,
    pub groups: BTreeSet<String>,
}

