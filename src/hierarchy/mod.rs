//! Ancestor chains over parent-pointer tables

mod depth;
mod flatten;

pub use depth::hierarchy_depth;
pub use flatten::{flatten_hierarchy, HierarchyFlattener};
