//! Domain layer - pure data types and text normalization
//!
//! Everything in this layer is synchronous and free of driver dependencies:
//! result records, work items, post identifiers, and count normalization.

pub mod identifier;
pub mod record;
pub mod stats;

pub use identifier::{absolutize, ItemIdentifier};
pub use record::{Fetched, ItemRecord, RunResult, WorkItem, MISSING_TEXT, PLATFORM};
pub use stats::{is_stats_text, parse_count};
