//! Tree parameters.

use crate::error::ConfigError;

/// Minimum degree used when none is given: nodes split once they reach `2 * 3 - 1 = 5`
/// keys.
pub const DEFAULT_MIN_DEGREE: usize = 3;

/// Largest accepted minimum degree; `2t - 1` still fits in a `usize`.
pub const MAX_MIN_DEGREE: usize = usize::MAX / 2;

/// Parameters fixed for the lifetime of a [`CatalogTree`](crate::CatalogTree).
///
/// # Examples
///
/// ```
/// use catalog_btree::TreeConfig;
///
/// let config = TreeConfig::new(2).unwrap().with_verify_invariants(true);
/// assert_eq!(config.max_keys(), 3);
/// assert_eq!(config.min_keys(), 1);
/// assert!(TreeConfig::new(1).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeConfig {
    min_degree: usize,
    verify_invariants: bool,
}

impl TreeConfig {
    /// Creates a config with minimum degree `t`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MinDegreeTooSmall`] if `min_degree < 2`, and
    /// [`ConfigError::MinDegreeTooLarge`] if `min_degree > MAX_MIN_DEGREE`.
    pub const fn new(min_degree: usize) -> Result<Self, ConfigError> {
        if min_degree < 2 {
            return Err(ConfigError::MinDegreeTooSmall(min_degree));
        }
        if min_degree > MAX_MIN_DEGREE {
            return Err(ConfigError::MinDegreeTooLarge {
                got: min_degree,
                max: MAX_MIN_DEGREE,
            });
        }
        Ok(Self {
            min_degree,
            verify_invariants: cfg!(debug_assertions),
        })
    }

    /// Enables or disables a full invariant check after every successful mutation.
    ///
    /// On by default in debug builds. A failed check panics, since it can only mean a
    /// rebalancing bug.
    #[must_use]
    pub const fn with_verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }

    /// The minimum degree `t`.
    #[must_use]
    pub const fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Whether mutations are followed by an invariant check.
    #[must_use]
    pub const fn verify_invariants(&self) -> bool {
        self.verify_invariants
    }

    /// Most keys any node holds at rest: `2t - 1`.
    #[must_use]
    pub const fn max_keys(&self) -> usize {
        2 * self.min_degree - 1
    }

    /// Fewest keys a non-root node holds: `t - 1`.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        self.min_degree - 1
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            min_degree: DEFAULT_MIN_DEGREE,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TreeConfig::default();
        assert_eq!(config.min_degree(), DEFAULT_MIN_DEGREE);
        assert_eq!(config.max_keys(), 5);
        assert_eq!(config.min_keys(), 2);
        assert_eq!(config.verify_invariants(), cfg!(debug_assertions));
    }

    #[test]
    fn rejects_degenerate_degree() {
        assert_eq!(TreeConfig::new(0), Err(ConfigError::MinDegreeTooSmall(0)));
        assert_eq!(TreeConfig::new(1), Err(ConfigError::MinDegreeTooSmall(1)));
        assert!(TreeConfig::new(2).is_ok());
    }

    #[test]
    fn rejects_overflowing_degree() {
        assert_eq!(
            TreeConfig::new(usize::MAX),
            Err(ConfigError::MinDegreeTooLarge {
                got: usize::MAX,
                max: MAX_MIN_DEGREE,
            })
        );
        assert!(TreeConfig::new(MAX_MIN_DEGREE + 1).is_err());

        let widest = TreeConfig::new(MAX_MIN_DEGREE).unwrap();
        assert_eq!(widest.max_keys(), usize::MAX - 2);
        assert_eq!(widest.min_keys(), MAX_MIN_DEGREE - 1);
    }

    #[test]
    fn verify_toggle() {
        let config = TreeConfig::new(4).unwrap().with_verify_invariants(false);
        assert!(!config.verify_invariants());
        assert_eq!(config.max_keys(), 7);
    }
}
