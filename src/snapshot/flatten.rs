use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::node::{Mismatch, Node};
use super::parser::Snapshot;

/// One machine type × region price point of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub machine_type: String,
    pub region_name: String,
    pub hour_price: f64,
    pub spot_hour_price: f64,
    pub updated_ts: i64,
    pub updated: DateTime<Utc>,
}

/// Catalog entry for a machine type that produced at least one price record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineTypeEntry {
    pub family: String,
    pub machine_type: String,
    pub cpu_cores: Option<i64>,
    pub memory_gb: Option<f64>,
}

impl MachineTypeEntry {
    fn from_descriptor(name: &str, descriptor: &Node) -> Self {
        Self {
            family: machine_family(name).to_string(),
            machine_type: name.to_string(),
            cpu_cores: descriptor.field("cpu").and_then(Node::integer).ok(),
            memory_gb: descriptor.field("ram").and_then(Node::number).ok(),
        }
    }
}

/// Family prefix of a machine type name: `n2d-highmem-8` -> `n2d`.
pub fn machine_family(machine_type: &str) -> &str {
    machine_type.split('-').next().unwrap_or(machine_type)
}

/// Entries dropped while flattening, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    /// Instance descriptor is not a mapping.
    pub machine_not_mapping: usize,
    /// `cost` is missing or not a mapping.
    pub cost_not_mapping: usize,
    /// A region's price node is not a mapping.
    pub region_not_mapping: usize,
    /// `hour` or `hour_spot` is absent.
    pub missing_price: usize,
    /// `hour` or `hour_spot` is present but not a number.
    pub non_numeric_price: usize,
}

impl SkipStats {
    pub fn machine_types(&self) -> usize {
        self.machine_not_mapping + self.cost_not_mapping
    }

    pub fn regions(&self) -> usize {
        self.region_not_mapping + self.missing_price + self.non_numeric_price
    }

    pub fn is_empty(&self) -> bool {
        self.machine_types() == 0 && self.regions() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub records: Vec<PriceRecord>,
    pub machine_types: Vec<MachineTypeEntry>,
    pub skipped: SkipStats,
}

/// Read both prices of a region entry, or say why the entry is unusable.
fn region_prices(price: &Node) -> Result<(f64, f64), Mismatch> {
    let hour = price.field("hour")?;
    let hour_spot = price.field("hour_spot")?;
    Ok((hour.number()?, hour_spot.number()?))
}

/// Flatten `compute.instance` into one record per machine type × region.
///
/// Malformed machine types and regions are dropped without failing the
/// snapshot; `Flattened::skipped` says how many and why.
pub fn flatten(snapshot: &Snapshot) -> Flattened {
    let mut out = Flattened::default();

    for (machine_type, descriptor) in &snapshot.instances {
        if descriptor.mapping().is_err() {
            debug!(machine_type = %machine_type, found = descriptor.kind(), "instance descriptor is not a mapping; skipping");
            out.skipped.machine_not_mapping += 1;
            continue;
        }

        let cost = match descriptor.field("cost").and_then(Node::mapping) {
            Ok(cost) => cost,
            Err(mismatch) => {
                debug!(machine_type = %machine_type, %mismatch, "cost is not a mapping; skipping");
                out.skipped.cost_not_mapping += 1;
                continue;
            }
        };

        let before = out.records.len();
        for (region_name, price) in cost {
            if price.mapping().is_err() {
                out.skipped.region_not_mapping += 1;
                continue;
            }
            match region_prices(price) {
                Ok((hour_price, spot_hour_price)) => out.records.push(PriceRecord {
                    machine_type: machine_type.clone(),
                    region_name: region_name.clone(),
                    hour_price,
                    spot_hour_price,
                    updated_ts: snapshot.timestamp,
                    updated: snapshot.updated,
                }),
                Err(Mismatch::Missing) => out.skipped.missing_price += 1,
                Err(mismatch @ Mismatch::WrongType { .. }) => {
                    debug!(machine_type = %machine_type, region = %region_name, %mismatch, "non-numeric price; skipping");
                    out.skipped.non_numeric_price += 1;
                }
            }
        }

        if out.records.len() > before {
            out.machine_types
                .push(MachineTypeEntry::from_descriptor(machine_type, descriptor));
        }
    }

    out
}
