// # dnssync-core
//
// Core library for reconciling DNS zones between providers.
//
// ## Architecture Overview
//
// - **Model**: durations, record types, typed record content, records, zones
// - **DnsProvider**: Trait every DNS backend implements (zones + record CRUD)
// - **SyncEngine**: Diffs a source zone against a destination zone and
//   applies the resulting create/update/delete actions
// - **ProviderRegistry**: Static registry of provider factories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic knows nothing about
//    provider wire formats
// 2. **Comparable Content**: Records compare by normalized data, so quoting
//    and formatting differences never cause changes
// 3. **Sequential Application**: Actions are applied one at a time, in order
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod registry;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfig, SyncConfig};
pub use error::{Error, Result};
pub use memory::{MemoryProvider, MemoryZones};
pub use model::{DnsRecordType, Record, RecordData, RecordDataKind, Time, Zone, ZoneCache};
pub use registry::{ProviderInfo, ProviderRegistry};
pub use sync::{SyncAction, SyncActionKind, SyncEngine, SyncEvent, SyncSummary, ZoneOutcome, plan_sync};
pub use traits::{DnsProvider, DnsProviderFactory, find_record_ttl};
