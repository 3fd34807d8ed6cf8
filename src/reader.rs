// Counter reader: device descriptor in, page count or nothing out.

use async_trait::async_trait;
use tracing::warn;

use crate::models::DeviceDescriptor;
use crate::snmp::{ClientOptions, SnmpClient};

/// Reads the current counter of a device. A device that does not answer yields `None`;
/// protocol failures never escape as errors.
#[async_trait]
pub trait CounterReader: Send + Sync {
    async fn read(&self, device: &DeviceDescriptor) -> Option<u64>;
}

pub struct SnmpCounterReader {
    client: SnmpClient,
}

impl SnmpCounterReader {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            client: SnmpClient::new(options),
        }
    }
}

#[async_trait]
impl CounterReader for SnmpCounterReader {
    async fn read(&self, device: &DeviceDescriptor) -> Option<u64> {
        let value = match self
            .client
            .get(&device.address, &device.query_target)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    device = %device.name,
                    address = %device.address,
                    error = %e,
                    operation = "read_counter",
                    "no answer"
                );
                return None;
            }
        };
        let counter = value.as_counter();
        if counter.is_none() {
            warn!(
                device = %device.name,
                oid = %device.query_target,
                value = ?value,
                operation = "read_counter",
                "value is not a page counter"
            );
        }
        counter
    }
}
