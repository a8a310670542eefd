//! Column and row reshaping operations

mod concat;
mod explode;
mod extract;
mod merge;

pub use concat::concatenate_columns;
pub use explode::{explode, explode_many};
pub use extract::{extract_dict_key, extract_dictionary};
pub use merge::{merge_columns, merged_columns};
