// Collection run: poll every configured device, archive what answered.
// Reads run concurrently (bounded); archive writes are applied one by one afterwards.

use chrono::NaiveDate;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, info, warn};

use crate::archive_repo::ArchiveRepo;
use crate::models::{CollectionOutcome, CollectionResult, DeviceDescriptor};
use crate::reader::CounterReader;

/// Options for one collection run.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Overwrite a snapshot already taken today.
    pub refresh: bool,
    /// Devices polled at the same time.
    pub concurrency: usize,
}

/// Polls `devices` and stores each answer under `today`. Results follow configuration order.
/// A device that does not answer, or whose write fails, never stops the others.
pub async fn run<R: CounterReader + ?Sized>(
    reader: &R,
    repo: &ArchiveRepo,
    devices: &[DeviceDescriptor],
    today: NaiveDate,
    options: CollectOptions,
) -> Vec<CollectionResult> {
    let readings: Vec<(&DeviceDescriptor, Option<u64>)> = stream::iter(devices)
        .map(|device| async move { (device, reader.read(device).await) })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut results = Vec::with_capacity(readings.len());
    for (device, reading) in readings {
        let outcome = match reading {
            None => CollectionOutcome::NoAnswer,
            Some(counter) => match repo.put(today, &device.name, counter, options.refresh).await {
                Ok(stored) => {
                    debug!(device = %device.name, counter, ?stored, "snapshot archived");
                    CollectionOutcome::Collected { counter, stored }
                }
                Err(e) => {
                    warn!(
                        device = %device.name,
                        error = %e,
                        operation = "put",
                        "failed to archive snapshot"
                    );
                    CollectionOutcome::StoreFailed {
                        counter,
                        error: e.to_string(),
                    }
                }
            },
        };
        results.push(CollectionResult {
            device_name: device.name.clone(),
            description: device.description.clone(),
            outcome,
        });
    }

    let collected = results.iter().filter(|r| r.is_collected()).count();
    info!(
        date = %today,
        devices = results.len(),
        collected,
        refresh = options.refresh,
        "collection complete"
    );
    results
}
