// Domain models: device descriptors, archived snapshots, collection and report results.

mod collection;
mod device;
mod report;
mod snapshot;

pub use collection::{CollectionOutcome, CollectionResult};
pub use device::DeviceDescriptor;
pub use report::{
    GroupAggregate, IncompleteEntry, MissingSide, Report, ReportEntry, signed_delta,
};
pub use snapshot::{PutOutcome, Snapshot};
