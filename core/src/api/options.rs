//! Construction options.

/// Maximum number of structured nesting levels a builder resolves by default.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Options applied when resolving and building an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Upper bound on [`ArrayModel::nesting_depth`](structarray_model::ArrayModel::nesting_depth).
    pub max_nesting_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl BuildOptions {
    /// Returns a copy of these options with every field set in `overrides` replaced.
    pub fn override_with(&self, overrides: &BuildOptionsOverride) -> Self {
        Self {
            max_nesting_depth: overrides
                .max_nesting_depth
                .unwrap_or(self.max_nesting_depth),
        }
    }
}

/// Partial [`BuildOptions`]; unset fields keep the base value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptionsOverride {
    pub max_nesting_depth: Option<usize>,
}
