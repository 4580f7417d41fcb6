use chrono::{DateTime, Utc};
use serde_yaml::Value;

use super::node::{Mapping, Mismatch, Node};
use crate::error::SnapshotError;

/// A decoded snapshot whose top-level shape has been checked.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: i64,
    /// `timestamp` as UTC calendar time.
    pub updated: DateTime<Utc>,
    /// `compute.instance`: machine type name -> instance descriptor.
    pub instances: Mapping,
}

/// Decode snapshot bytes and validate `about.timestamp` and `compute.instance`.
///
/// Only the document skeleton is checked here. Individual machine types and
/// regions are validated by the flattener, which skips bad entries instead of
/// rejecting the file.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    let value: Value = serde_yaml::from_slice(bytes)?;
    let mut root = match Node::from(value) {
        Node::Mapping(map) => map,
        other => {
            return Err(SnapshotError::InvalidStructure(format!(
                "document root: expected mapping, found {}",
                other.kind()
            )))
        }
    };

    let timestamp = root
        .get("about")
        .ok_or(Mismatch::Missing)
        .and_then(|about| about.field("timestamp"))
        .and_then(Node::integer)
        .map_err(|mismatch| SnapshotError::MissingTimestamp(mismatch.to_string()))?;
    let updated = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
        SnapshotError::MissingTimestamp(format!("{timestamp} is outside the representable range"))
    })?;

    let mut compute = match root.shift_remove("compute") {
        Some(Node::Mapping(map)) => map,
        Some(other) => return Err(invalid("compute", other.kind())),
        None => {
            return Err(SnapshotError::InvalidStructure(
                "compute: missing".to_string(),
            ))
        }
    };

    let instances = match compute.shift_remove("instance") {
        Some(Node::Mapping(map)) => map,
        Some(other) => return Err(invalid("compute.instance", other.kind())),
        None => {
            return Err(SnapshotError::InvalidStructure(
                "compute.instance: missing".to_string(),
            ))
        }
    };

    Ok(Snapshot {
        timestamp,
        updated,
        instances,
    })
}

fn invalid(path: &str, found: &str) -> SnapshotError {
    SnapshotError::InvalidStructure(format!("{path}: expected mapping, found {found}"))
}
