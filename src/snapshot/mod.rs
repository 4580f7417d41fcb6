//! Snapshot decoding and flattening.
pub mod flatten;
pub mod node;
pub mod parser;

pub use flatten::{flatten, Flattened, MachineTypeEntry, PriceRecord, SkipStats};
pub use node::{Mismatch, Node};
pub use parser::{parse_snapshot, Snapshot};
