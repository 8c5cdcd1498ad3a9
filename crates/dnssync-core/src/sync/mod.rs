//! Zone reconciliation
//!
//! The SyncEngine is responsible for:
//! - Fetching the same zone from a source and a destination provider
//! - Diffing the two record sets into [`SyncAction`]s ([`plan_sync`])
//! - Applying the actions to the destination, strictly in order
//! - Reporting every zone as synced, skipped or failed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   get_zone    ┌──────────────┐   get_zone   ┌─────────────┐
//! │   Source    │──────────────▶│  SyncEngine  │◀─────────────│ Destination │
//! └─────────────┘               └──────────────┘              └─────────────┘
//!                                  │        │                        ▲
//!                      SyncEvent   │        │ create/update/delete   │
//!                                  ▼        └────────────────────────┘
//!                            ┌──────────┐
//!                            │  Events  │
//!                            └──────────┘
//! ```
//!
//! ## Ordering
//!
//! Every provider call is awaited before the next one is made. Providers
//! update their zone caches after each successful call, and later actions
//! rely on those updates. Zones in a multi-zone run are processed one at a
//! time in sorted order; a failing zone does not stop the others.

mod action;
mod plan;

pub use action::{SyncAction, SyncActionKind};
pub use plan::plan_sync;

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::DnsProvider;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Both zones were fetched and diffing begins
    ZoneStarted {
        zone: String,
        source: String,
        destination: String,
    },

    /// Zone was not synced (missing on one side)
    ZoneSkipped { zone: String, reason: String },

    /// Action computed; in dry-run mode it is not applied
    ActionPlanned { zone: String, action: String },

    /// Action applied to the destination
    ActionApplied { zone: String, action: String },

    /// Action failed; the rest of the zone is abandoned
    ActionFailed {
        zone: String,
        action: String,
        error: String,
    },

    /// All actions for the zone were applied
    ZoneCompleted { zone: String, applied: usize },

    /// Zone could not be synced
    ZoneFailed { zone: String, error: String },
}

/// What happened to one zone
#[derive(Debug, Clone)]
pub enum ZoneOutcome {
    /// Zone exists on both sides; `actions` were applied (or only planned
    /// in dry-run mode)
    Synced { actions: Vec<SyncAction> },
    /// Zone is missing on one side
    Skipped { reason: String },
}

/// Result of a multi-zone run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Zones synced, with the number of actions each needed
    pub synced: Vec<(String, usize)>,
    /// Zones skipped, with the reason
    pub skipped: Vec<(String, String)>,
    /// Zones that failed, with the error
    pub failed: Vec<(String, String)>,
}

impl SyncSummary {
    /// Whether any zone failed
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Total actions across synced zones
    pub fn total_actions(&self) -> usize {
        self.synced.iter().map(|(_, n)| n).sum()
    }
}

/// Reconciles zones from a source provider into a destination provider
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`], keeping the event receiver
/// 2. Drain the receiver (or drop it) while calling [`SyncEngine::run()`]
///    or [`SyncEngine::sync_zone()`]
///
/// Events are sent with backpressure: if the receiver is alive but not
/// drained, the engine waits for room in the channel.
pub struct SyncEngine {
    source: Box<dyn DnsProvider>,
    destination: Box<dyn DnsProvider>,
    dry_run: bool,
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `source`: Provider records are read from
    /// - `destination`: Provider records are written to; must not be read-only
    /// - `config`: Engine settings
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        source: Box<dyn DnsProvider>,
        destination: Box<dyn DnsProvider>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        if destination.read_only() {
            return Err(Error::config(format!(
                "Provider {} is read-only and cannot be a sync destination",
                destination.id()
            )));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            source,
            destination,
            dry_run: config.dry_run,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    pub fn source(&self) -> &dyn DnsProvider {
        self.source.as_ref()
    }

    pub fn destination(&self) -> &dyn DnsProvider {
        self.destination.as_ref()
    }

    /// Sync several zones, one at a time in sorted order
    ///
    /// With no zones given, every zone the destination lists is synced.
    /// Per-zone failures are recorded in the summary; only failing to list
    /// the destination's zones is an error.
    pub async fn run(&mut self, zones: &[String]) -> Result<SyncSummary> {
        let mut zones = if zones.is_empty() {
            self.destination.list_zones().await?
        } else {
            zones.to_vec()
        };
        zones.sort();
        zones.dedup();

        let mut summary = SyncSummary::default();

        for zone in zones {
            match self.sync_zone(&zone).await {
                Ok(ZoneOutcome::Synced { actions }) => {
                    summary.synced.push((zone, actions.len()));
                }
                Ok(ZoneOutcome::Skipped { reason }) => {
                    summary.skipped.push((zone, reason));
                }
                Err(e) => {
                    error!("Failed to sync zone {}: {}", zone, e);
                    self.emit_event(SyncEvent::ZoneFailed {
                        zone: zone.clone(),
                        error: e.to_string(),
                    })
                    .await;
                    summary.failed.push((zone, e.to_string()));
                }
            }
        }

        info!(
            "Sync finished: {} synced, {} skipped, {} failed",
            summary.synced.len(),
            summary.skipped.len(),
            summary.failed.len()
        );

        Ok(summary)
    }

    /// Sync one zone
    ///
    /// # Returns
    ///
    /// - `Ok(ZoneOutcome::Synced)`: all actions were applied
    /// - `Ok(ZoneOutcome::Skipped)`: the zone is missing on either side
    /// - `Err(Error)`: fetching failed, or an action failed; actions before
    ///   the failing one stay applied
    pub async fn sync_zone(&mut self, zone: &str) -> Result<ZoneOutcome> {
        let source_zone = self.source.get_zone(zone).await?;
        let destination_zone = self.destination.get_zone(zone).await?;

        let (source_zone, destination_zone) = match (source_zone, destination_zone) {
            (None, _) => {
                return Ok(self
                    .skip(zone, format!("Zone {zone} does not exist in source provider {}", self.source.id()))
                    .await);
            }
            (_, None) => {
                return Ok(self
                    .skip(
                        zone,
                        format!(
                            "Zone {zone} does not exist in destination provider {}",
                            self.destination.id()
                        ),
                    )
                    .await);
            }
            (Some(s), Some(d)) => (s, d),
        };

        info!(
            "Syncing zone {} from {} to {}",
            zone,
            self.source.id(),
            self.destination.id()
        );
        self.emit_event(SyncEvent::ZoneStarted {
            zone: zone.to_string(),
            source: self.source.id().to_string(),
            destination: self.destination.id().to_string(),
        })
        .await;

        let actions = {
            let source = self.source.as_ref();
            let destination = self.destination.as_ref();
            plan_sync(
                source_zone.records(),
                destination_zone.records(),
                |t| source.can_read_type(t),
                |t| destination.can_write_type(t),
            )
        };
        debug!("Zone {} needs {} action(s)", zone, actions.len());

        for action in &actions {
            info!("{}", action);
            self.emit_event(SyncEvent::ActionPlanned {
                zone: zone.to_string(),
                action: action.to_string(),
            })
            .await;

            if self.dry_run {
                continue;
            }

            match self.apply(zone, action).await {
                Ok(()) => {
                    self.emit_event(SyncEvent::ActionApplied {
                        zone: zone.to_string(),
                        action: action.to_string(),
                    })
                    .await;
                }
                Err(e) => {
                    self.emit_event(SyncEvent::ActionFailed {
                        zone: zone.to_string(),
                        action: action.to_string(),
                        error: e.to_string(),
                    })
                    .await;
                    return Err(e);
                }
            }
        }

        if !self.dry_run && !actions.is_empty() {
            self.destination
                .commit_zone(zone)
                .await
                .map_err(|e| Error::provider(self.destination.id(), e.to_string()))?;
        }

        self.emit_event(SyncEvent::ZoneCompleted {
            zone: zone.to_string(),
            applied: if self.dry_run { 0 } else { actions.len() },
        })
        .await;

        Ok(ZoneOutcome::Synced { actions })
    }

    /// Apply one action to the destination
    async fn apply(&mut self, zone: &str, action: &SyncAction) -> Result<()> {
        let result = match action {
            SyncAction::Create { source } => self
                .destination
                .create_record(zone, source)
                .await
                .map(|_| ()),
            SyncAction::Update {
                source,
                destination,
            } => self
                .destination
                .update_record(zone, destination, source)
                .await
                .map(|_| ()),
            SyncAction::Delete { destination } => {
                self.destination.delete_record(zone, destination).await
            }
        };

        result.map_err(|e| match e {
            Error::Provider { .. } => e,
            other => Error::provider(self.destination.id(), format!("{action}: {other}")),
        })
    }

    async fn skip(&self, zone: &str, reason: String) -> ZoneOutcome {
        warn!("{}", reason);
        self.emit_event(SyncEvent::ZoneSkipped {
            zone: zone.to_string(),
            reason: reason.clone(),
        })
        .await;
        ZoneOutcome::Skipped { reason }
    }

    /// Emit a sync event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    async fn emit_event(&self, event: SyncEvent) {
        // A dropped receiver only means nobody is listening
        if self.event_tx.send(event).await.is_err() {
            debug!("Event receiver dropped, event discarded");
        }
    }
}
