//! Options for the reshaping operations

use std::fmt;

use indexmap::IndexMap;

use crate::error::Error;
use crate::model::CellValue;

/// Name of the depth column when none is given
pub const DEFAULT_DEPTH_COLUMN: &str = "depth";

/// Separator between a column name and a map key in extracted column names
pub const DEFAULT_SEPARATOR: &str = ".";

/// Options for flattening a parent-pointer hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Column holding each row's own key. The row index is used when unset.
    pub key_column: Option<String>,
    /// Fail once ancestor chains are still open after this many generations
    pub max_generations: Option<usize>,
}

impl FlattenOptions {
    /// Create options keyed on the row index
    pub fn new() -> Self {
        Self::default()
    }

    /// Key rows on a column instead of the index
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    /// Bound the number of generated ancestor columns
    pub fn with_max_generations(mut self, limit: usize) -> Self {
        self.max_generations = Some(limit);
        self
    }
}

/// Options for computing hierarchy depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthOptions {
    /// How the hierarchy is flattened first
    pub flatten: FlattenOptions,
    /// Column receiving the depth
    pub result_column: String,
}

impl Default for DepthOptions {
    fn default() -> Self {
        Self {
            flatten: FlattenOptions::default(),
            result_column: DEFAULT_DEPTH_COLUMN.to_string(),
        }
    }
}

impl DepthOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key rows on a column instead of the index
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.flatten.key_column = Some(column.into());
        self
    }

    /// Bound the number of generations walked
    pub fn with_max_generations(mut self, limit: usize) -> Self {
        self.flatten.max_generations = Some(limit);
        self
    }

    /// Set the depth column name
    pub fn with_result_column(mut self, column: impl Into<String>) -> Self {
        self.result_column = column.into();
        self
    }
}

/// Which non-null value a keep-merge selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    First,
    Last,
}

impl std::str::FromStr for Keep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Keep::First),
            "last" => Ok(Keep::Last),
            _ => Err(Error::InvalidKeep(s.to_string())),
        }
    }
}

/// Reduces one row's values, in column order, to a single value
pub type Aggregator<'a> = Box<dyn Fn(&[CellValue]) -> CellValue + 'a>;

/// Options for merging columns. Exactly one of `keep` and `aggregator` must be set.
#[derive(Default)]
pub struct MergeOptions<'a> {
    pub keep: Option<Keep>,
    pub aggregator: Option<Aggregator<'a>>,
}

impl<'a> MergeOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the first or last non-null value
    pub fn with_keep(mut self, keep: Keep) -> Self {
        self.keep = Some(keep);
        self
    }

    /// Reduce the values with a function
    pub fn with_aggregator<F>(mut self, aggregator: F) -> Self
    where
        F: Fn(&[CellValue]) -> CellValue + 'a,
    {
        self.aggregator = Some(Box::new(aggregator));
        self
    }
}

impl fmt::Debug for MergeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeOptions")
            .field("keep", &self.keep)
            .field("aggregator", &self.aggregator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Options for concatenating columns into long form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatOptions {
    /// Column recording which source column each value came from
    pub descriptor_column: Option<String>,
    /// Descriptor overrides keyed by source column; unmapped columns use their own name
    pub label_map: IndexMap<String, String>,
}

impl ConcatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor column
    pub fn with_descriptor(mut self, column: impl Into<String>) -> Self {
        self.descriptor_column = Some(column.into());
        self
    }

    /// Override the descriptor written for one source column
    pub fn with_label(mut self, column: impl Into<String>, label: impl Into<String>) -> Self {
        self.label_map.insert(column.into(), label.into());
        self
    }
}

/// Options for extracting map keys into columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Keys to extract. Defaults to the keys of the first map in the column.
    pub key_list: Option<Vec<String>>,
    /// Prefix of the new column names. Defaults to the source column; empty means bare keys.
    pub prefix: Option<String>,
    /// Separator between prefix and key
    pub separator: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            key_list: None,
            prefix: None,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract exactly these keys
    pub fn with_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.key_list = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Set the prefix of the new column names
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the separator between prefix and key
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_from_str() {
        assert_eq!("first".parse::<Keep>(), Ok(Keep::First));
        assert_eq!("last".parse::<Keep>(), Ok(Keep::Last));
        assert_eq!(
            "something_wrong".parse::<Keep>(),
            Err(Error::InvalidKeep("something_wrong".to_string()))
        );
    }

    #[test]
    fn test_depth_defaults() {
        let options = DepthOptions::new().with_key_column("employee");
        assert_eq!(options.result_column, "depth");
        assert_eq!(options.flatten.key_column.as_deref(), Some("employee"));
    }
}
