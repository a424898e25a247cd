//! Cadence event storage trait.

use crate::StoreError;
use curator_types::{EventKind, Timestamp};

pub trait EventStore: Send + Sync {
    fn last_event(&self, kind: EventKind) -> Result<Option<Timestamp>, StoreError>;

    fn record_event(&self, kind: EventKind, at: Timestamp) -> Result<(), StoreError>;
}
