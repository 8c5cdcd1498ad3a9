//! Diffing two record sets into sync actions

use std::collections::HashMap;

use crate::model::{DnsRecordType, Record};
use crate::sync::SyncAction;

type BucketKey = (String, DnsRecordType);

/// Records grouped by `(host, type)`, remembering first-seen key order
#[derive(Default)]
struct Buckets {
    order: Vec<BucketKey>,
    source: HashMap<BucketKey, Vec<Record>>,
    destination: HashMap<BucketKey, Vec<Record>>,
}

impl Buckets {
    fn key_of(record: &Record) -> BucketKey {
        (record.host().to_string(), record.record_type())
    }

    fn note_key(&mut self, key: &BucketKey) {
        if !self.source.contains_key(key) && !self.destination.contains_key(key) {
            self.order.push(key.clone());
        }
    }

    fn push_source(&mut self, record: Record) {
        let key = Self::key_of(&record);
        self.note_key(&key);
        self.source.entry(key).or_default().push(record);
    }

    fn push_destination(&mut self, record: Record) {
        let key = Self::key_of(&record);
        self.note_key(&key);
        self.destination.entry(key).or_default().push(record);
    }

    fn take(&mut self, key: &BucketKey) -> (Vec<Record>, Vec<Record>) {
        (
            self.source.remove(key).unwrap_or_default(),
            self.destination.remove(key).unwrap_or_default(),
        )
    }

    fn put_back(&mut self, key: BucketKey, source: Vec<Record>, destination: Vec<Record>) {
        self.source.insert(key.clone(), source);
        self.destination.insert(key, destination);
    }
}

/// Compute the actions that make `destination` match `source`
///
/// Records are grouped by `(host, type)`. Source records of types the
/// destination cannot write are ignored. Destination records are ignored
/// when the source cannot read their type or the destination cannot write
/// it, so provider-managed records (NS and the like) are left alone.
///
/// Two passes run over every group, in the order groups were first seen:
///
/// 1. Exact match: a source record whose normalized data equals a
///    destination record's consumes it. Differing TTLs yield an update.
/// 2. Residual: each remaining source record takes the first remaining
///    destination record as an update, or becomes a create. Destination
///    records still left over are deleted.
///
/// The residual pairing is positional, not content-aware.
pub fn plan_sync<R, W>(
    source: &[Record],
    destination: &[Record],
    source_can_read: R,
    destination_can_write: W,
) -> Vec<SyncAction>
where
    R: Fn(DnsRecordType) -> bool,
    W: Fn(DnsRecordType) -> bool,
{
    let mut buckets = Buckets::default();

    for record in source {
        if destination_can_write(record.record_type()) {
            buckets.push_source(record.clone());
        }
    }

    for record in destination {
        let record_type = record.record_type();
        if source_can_read(record_type) && destination_can_write(record_type) {
            buckets.push_destination(record.clone());
        }
    }

    let order = buckets.order.clone();
    let mut actions = Vec::new();

    for key in &order {
        let (sources, mut destinations) = buckets.take(key);
        let mut unmatched = Vec::with_capacity(sources.len());

        for source in sources {
            let wanted = source.data().normalized();
            match destinations
                .iter()
                .position(|d| d.data().normalized() == wanted)
            {
                Some(index) => {
                    let destination = destinations.remove(index);
                    if !source.ttl_matches(&destination) {
                        actions.push(SyncAction::Update {
                            source,
                            destination,
                        });
                    }
                }
                None => unmatched.push(source),
            }
        }

        buckets.put_back(key.clone(), unmatched, destinations);
    }

    for key in &order {
        let (sources, mut destinations) = buckets.take(key);

        for source in sources {
            if destinations.is_empty() {
                actions.push(SyncAction::Create { source });
            } else {
                let destination = destinations.remove(0);
                actions.push(SyncAction::Update {
                    source,
                    destination,
                });
            }
        }

        actions.extend(
            destinations
                .into_iter()
                .map(|destination| SyncAction::Delete { destination }),
        );
    }

    actions
}
