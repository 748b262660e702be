//! Builder configuration.

/// Defaults applied by the [`ViewBuilder`](crate::ViewBuilder).
///
/// Values set on an individual node override these.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    /// Rows realized beyond the visible window of a table.
    pub overscan: usize,
    /// Row height used when a table node does not declare one.
    pub row_height: f32,
    /// Viewport height used when a table node does not declare one.
    pub viewport_height: f32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            overscan: 1,
            row_height: 40.0,
            viewport_height: 400.0,
        }
    }
}

impl BuilderConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default overscan.
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Set the default row height.
    pub fn with_row_height(mut self, row_height: f32) -> Self {
        self.row_height = row_height;
        self
    }

    /// Set the default viewport height.
    pub fn with_viewport_height(mut self, viewport_height: f32) -> Self {
        self.viewport_height = viewport_height;
        self
    }
}
