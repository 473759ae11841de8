use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, IndexResult};
use crate::rstar_tree::rtree_constants::{
    DEFAULT_MAX_ENTRIES, DEFAULT_MIN_ENTRIES, DEFAULT_REINSERT_COUNT,
};

/// Fanout parameters of an R*-tree, fixed for the lifetime of a cursor.
///
/// * `max_entries` (M): most points a leaf or children an internal node holds
///   between insertions.
/// * `min_entries` (m): fewest entries a non-root node holds after a split.
/// * `reinsert_count` (p): points moved out of an overflowing leaf by forced
///   reinsertion.
///
/// Valid parameters satisfy `M >= 2`, `1 <= m <= M/2` and
/// `1 <= p <= M + 1 - m`. The last bound guarantees a leaf still holds at
/// least `m` points after giving up `p` of its `M + 1`.
///
/// # Examples
///
/// ```rust
/// use tristar::TreeConfig;
///
/// let config = TreeConfig::builder()
///     .max_entries(8)
///     .min_entries(3)
///     .reinsert_count(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_entries(), 8);
///
/// assert!(TreeConfig::new(4, 3, 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    max_entries: usize,
    min_entries: usize,
    reinsert_count: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_entries: DEFAULT_MAX_ENTRIES,
            min_entries: DEFAULT_MIN_ENTRIES,
            reinsert_count: DEFAULT_REINSERT_COUNT,
        }
    }
}

impl TreeConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidConfig`] if the parameters violate the
    /// bounds listed on [`TreeConfig`].
    pub fn new(
        max_entries: usize,
        min_entries: usize,
        reinsert_count: usize,
    ) -> IndexResult<TreeConfig> {
        let config = TreeConfig {
            max_entries,
            min_entries,
            reinsert_count,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::new()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub fn reinsert_count(&self) -> usize {
        self.reinsert_count
    }

    /// Checks the fanout bounds.
    ///
    /// `reinsert_count` is capped at `M + 1 - m`, not `M`: the overflowing
    /// leaf holds `M + 1` points and must keep `m` of them after reinsertion.
    pub fn validate(&self) -> IndexResult<()> {
        let (max, min, reinsert) = (self.max_entries, self.min_entries, self.reinsert_count);
        let problem = if max < 2 {
            Some(format!("max_entries must be at least 2, got {}", max))
        } else if min < 1 || min > max / 2 {
            Some(format!(
                "min_entries must be between 1 and {} for max_entries {}, got {}",
                max / 2,
                max,
                min
            ))
        } else if reinsert < 1 || reinsert > max + 1 - min {
            Some(format!(
                "reinsert_count must be between 1 and {} for max_entries {} and min_entries {}, got {}; \
                 a leaf of max_entries + 1 points must keep min_entries after giving up reinsert_count",
                max + 1 - min,
                max,
                min,
                reinsert
            ))
        } else {
            None
        };

        match problem {
            Some(message) => {
                log::error!("Rejected tree configuration: {}", message);
                Err(IndexError::InvalidConfig(message))
            }
            None => Ok(()),
        }
    }

    /// Split positions tried by the split strategy: `m..=M+1-m`.
    pub(crate) fn split_range(&self) -> std::ops::RangeInclusive<usize> {
        self.min_entries..=(self.max_entries + 1 - self.min_entries)
    }
}

/// Fluent builder for [`TreeConfig`].
///
/// Setters reject obviously invalid values immediately and remember the first
/// error; [`TreeConfigBuilder::build`] reports it, or validates the combined
/// parameters if every setter succeeded.
#[derive(Debug, Default)]
pub struct TreeConfigBuilder {
    error: Option<IndexError>,
    config: TreeConfig,
}

impl TreeConfigBuilder {
    pub fn new() -> Self {
        TreeConfigBuilder {
            error: None,
            config: TreeConfig::default(),
        }
    }

    /// Sets M. Values below 2 are rejected.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        if self.error.is_none() {
            if max_entries < 2 {
                self.error = Some(IndexError::InvalidConfig(format!(
                    "max_entries must be at least 2, got {}",
                    max_entries
                )));
            } else {
                self.config.max_entries = max_entries;
            }
        }
        self
    }

    /// Sets m. Zero is rejected.
    pub fn min_entries(mut self, min_entries: usize) -> Self {
        if self.error.is_none() {
            if min_entries == 0 {
                self.error = Some(IndexError::InvalidConfig(
                    "min_entries must be at least 1".to_string(),
                ));
            } else {
                self.config.min_entries = min_entries;
            }
        }
        self
    }

    /// Sets p. Zero is rejected.
    pub fn reinsert_count(mut self, reinsert_count: usize) -> Self {
        if self.error.is_none() {
            if reinsert_count == 0 {
                self.error = Some(IndexError::InvalidConfig(
                    "reinsert_count must be at least 1".to_string(),
                ));
            } else {
                self.config.reinsert_count = reinsert_count;
            }
        }
        self
    }

    pub fn build(self) -> IndexResult<TreeConfig> {
        if let Some(err) = self.error {
            log::error!("Tree configuration failed: {}", err);
            return Err(err);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
