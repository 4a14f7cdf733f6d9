//! Ancestry index over parent-referencing records.
//!
//! Takes a flat collection of records that each name their parent (a forest
//! expressed as parent pointers), precomputes every id's ancestor and
//! descendant chains with hop distances, and answers ancestry queries
//! against the result.
//!
//! # Key Types
//!
//! - [`AncestryIndex`] -- The immutable index and its query engine
//! - [`AncestryInfo`] -- Per-id parent, ancestor and descendant maps
//! - [`DistanceMap`] -- Append-ordered id → distance map
//! - [`NodeKey`] -- Integer-or-string id read from JSON records
//! - [`FieldSelectors`] -- Which record fields hold the id and parent id
//!
//! # Example
//!
//! ```
//! use kin_index::AncestryIndex;
//!
//! let edges = [(10, 3), (11, 3), (13, 11), (15, 13), (16, 13)];
//! let index = AncestryIndex::build(edges, |e| e.0, |e| Some(e.1)).unwrap();
//!
//! assert_eq!(index.closest_common_ancestor(&15, &16, None).unwrap(), Some(13));
//! assert_eq!(index.closest_common_ancestor(&15, &10, None).unwrap(), Some(3));
//! ```

pub mod ancestry;
pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod json;
pub mod key;
pub mod node_table;

pub use ancestry::{Ancestry, AncestryInfo, Origin};
pub use config::FieldSelectors;
pub use distance::{Distance, DistanceMap};
pub use error::{IndexError, IndexResult};
pub use index::{AncestryIndex, CommonAncestor, Parented, SiblingCandidate, Summary};
pub use json::JsonIndex;
pub use key::{Key, NodeKey};
pub use node_table::NodeTable;
