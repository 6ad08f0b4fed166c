//! Snapshots of machine instances for host-side persistence.
//!
//! The engine never reads or writes a store. A host persists the snapshot
//! (or just its `current_state`) after a successful `fire` and restores a
//! machine from it when the entity is loaded again.

use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::CheckpointError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable state of one machine instance.
///
/// Listeners and predicates are code and are not part of a snapshot; the
/// host re-wires them from its definition on restore.
///
/// # Example
///
/// ```rust
/// use turnstile::checkpoint::MachineSnapshot;
/// use turnstile::core::StateHistory;
///
/// let snapshot = MachineSnapshot::new("idling".into(), StateHistory::new());
/// let json = snapshot.to_json().unwrap();
/// let restored = MachineSnapshot::from_json(&json).unwrap();
///
/// assert_eq!(restored.current_state, "idling");
/// assert_eq!(restored.id, snapshot.id);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: String,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// Current state of the machine
    pub current_state: State,

    /// Committed transitions
    pub history: StateHistory,
}

impl MachineSnapshot {
    pub fn new(current_state: State, history: StateHistory) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            taken_at: Utc::now(),
            current_state,
            history,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Compact encoding for hosts that store snapshots as blobs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let snapshot: Self = bincode::deserialize(bytes)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub(crate) fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            })
        }
    }
}
