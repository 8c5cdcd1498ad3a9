//! Reconciliation steps

use crate::model::Record;
use std::fmt;

/// Kind of a [`SyncAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncActionKind {
    Create,
    Update,
    Delete,
}

/// One change to apply to the destination provider
#[derive(Debug, Clone)]
pub enum SyncAction {
    /// Create the source record in the destination
    Create { source: Record },
    /// Rewrite a destination record to match a source record
    Update { source: Record, destination: Record },
    /// Remove a destination record with no source counterpart
    Delete { destination: Record },
}

impl SyncAction {
    pub fn kind(&self) -> SyncActionKind {
        match self {
            Self::Create { .. } => SyncActionKind::Create,
            Self::Update { .. } => SyncActionKind::Update,
            Self::Delete { .. } => SyncActionKind::Delete,
        }
    }

    /// Source record, for creates and updates
    pub fn source(&self) -> Option<&Record> {
        match self {
            Self::Create { source } | Self::Update { source, .. } => Some(source),
            Self::Delete { .. } => None,
        }
    }

    /// Destination record, for updates and deletes
    pub fn destination(&self) -> Option<&Record> {
        match self {
            Self::Update { destination, .. } | Self::Delete { destination } => Some(destination),
            Self::Create { .. } => None,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { source } => write!(f, "Create {source}"),
            Self::Update {
                source,
                destination,
            } => write!(f, "Update {destination} -> {source}"),
            Self::Delete { destination } => write!(f, "Delete {destination}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        let old = Record::parse("www 300 IN A 192.0.2.1").unwrap();
        let new = Record::parse("www 600 IN A 192.0.2.1").unwrap();

        let update = SyncAction::Update {
            source: new.clone(),
            destination: old.clone(),
        };
        assert_eq!(
            update.to_string(),
            "Update www 300 IN A 192.0.2.1 -> www 600 IN A 192.0.2.1"
        );
        assert_eq!(update.kind(), SyncActionKind::Update);

        let create = SyncAction::Create { source: new };
        assert_eq!(create.to_string(), "Create www 600 IN A 192.0.2.1");
        assert!(create.destination().is_none());

        let delete = SyncAction::Delete { destination: old };
        assert_eq!(delete.to_string(), "Delete www 300 IN A 192.0.2.1");
        assert!(delete.source().is_none());
    }
}
