//! frameshape - Reshaping transformations for in-memory tables
//!
//! Flattens parent-pointer hierarchies into ancestor columns, explodes
//! list-valued columns into rows, and merges, concatenates or extracts columns.
//! Every operation takes a [`Table`] and hands back a new one, except
//! [`merge_columns`] which writes in place.

pub mod config;
pub mod convert;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod transform;
pub mod validate;

pub use config::{ConcatOptions, DepthOptions, ExtractOptions, FlattenOptions, Keep, MergeOptions};
pub use convert::{
    clear_nan, convert_to_type, truncate_strings, ConversionKind, TimeUnit, TypeMapping,
};
pub use error::{Error, Result};
pub use hierarchy::{flatten_hierarchy, hierarchy_depth, HierarchyFlattener};
pub use model::{CellValue, RowIndex, Table};
pub use transform::{
    concatenate_columns, explode, explode_many, extract_dict_key, extract_dictionary,
    merge_columns, merged_columns,
};
pub use validate::check_duplicated_labels;
