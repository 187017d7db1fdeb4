//! # Taglet Core Library
//!
//! This crate provides the incremental multi-string suffix index that powers
//! Taglet's tag autocomplete: fast substring search over a growing set of
//! short strings, with O(pattern length + matches) query cost and amortized
//! linear construction via Ukkonen's online algorithm.
//!
//! ## Architecture
//!
//! - **Types** (`types`): Symbol alphabet, tag records, match/result types
//! - **Buffer** (`buffer`): The shared text buffer and string registry
//! - **Tree** (`tree`): The suffix-tree automaton and its online builder
//! - **Search** (`search`): Pattern walk and occurrence collection
//! - **Index** (`index`): The public `TagIndex` facade
//! - **Snapshot** (`snapshot`): Versioned export/restore and on-disk storage
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust
//! use taglet_core::TagIndex;
//!
//! let mut index = TagIndex::new();
//! index.insert("banana", Some("42")).unwrap();
//!
//! let result = index.find("ana");
//! assert_eq!(result.total_found, 2);
//! assert_eq!(result.matches[0].tag_id.as_str(), "42");
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod index;
pub mod search;
pub mod snapshot;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TagletError};
pub use index::{SharedTagIndex, TagIndex};
pub use snapshot::{Snapshot, SnapshotStore, SNAPSHOT_VERSION};
pub use types::{FindResult, IndexStats, Match, TagId, TagRecord};
