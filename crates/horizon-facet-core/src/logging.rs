//! Logging and debugging facilities for Horizon Facet.
//!
//! This module provides:
//! - Target and span names for filtering the runtime's `tracing` output
//! - Debug visualization for realized surface trees
//! - Performance tracing hooks for profiling builds and table windows
//!
//! # Tracing Integration
//!
//! Horizon Facet uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_facet=debug,horizon_facet_core::binding=trace")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`SurfaceTreeDebug`] to dump what a view realized on a [`MemorySurface`]:
//!
//! ```
//! use horizon_facet_core::logging::SurfaceTreeDebug;
//! use horizon_facet_core::surface::{MemorySurface, NodeKind, Surface};
//! use serde_json::Map;
//!
//! let surface = MemorySurface::new();
//! let root = surface.create_node(NodeKind::Container, Some("form"), &Map::new());
//! let output = SurfaceTreeDebug::new().format_subtree(&surface, root);
//! assert!(output.contains("form"));
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::surface::{MemorySurface, NodeId, StateFlag};

/// Span names used throughout Horizon Facet for tracing.
pub mod span_names {
    /// View construction span.
    pub const BUILD: &str = "horizon_facet::build";
    /// Table window recomputation span.
    pub const TABLE_WINDOW: &str = "horizon_facet::table_window";
    /// Validation pass span.
    pub const VALIDATE: &str = "horizon_facet::validate";
    /// Outbound request span.
    pub const REQUEST: &str = "horizon_facet::request";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_facet_core";
    /// Binding reads and writes.
    pub const BINDING: &str = "horizon_facet_core::binding";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_facet_core::signal";
    /// Rendering surface target.
    pub const SURFACE: &str = "horizon_facet_core::surface";
    /// View builder target.
    pub const BUILDER: &str = "horizon_facet::builder";
    /// Controls and validation.
    pub const CONTROL: &str = "horizon_facet::control";
    /// Virtualized table target.
    pub const TABLE: &str = "horizon_facet::table";
    /// View controller lifecycle.
    pub const CONTROLLER: &str = "horizon_facet::controller";
    /// Popover lifecycle and stacking.
    pub const POPOVER: &str = "horizon_facet::popover";
    /// Request client target.
    pub const NET: &str = "horizon_facet_net";
}

/// Style options for surface tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for surface tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show node kinds.
    pub show_kinds: bool,
    /// Whether to show display values.
    pub show_values: bool,
    /// Whether to show state flags.
    pub show_flags: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_values: false,
            show_flags: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_values: true,
            ..Default::default()
        }
    }

    /// Options for minimal output: names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            show_values: false,
            show_flags: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing realized surface trees.
#[derive(Debug, Clone, Default)]
pub struct SurfaceTreeDebug {
    options: TreeFormatOptions,
}

impl SurfaceTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every root tree on the surface.
    pub fn format_all(&self, surface: &MemorySurface) -> String {
        let roots = surface.roots();

        let mut output = String::new();
        writeln!(output, "Surface Tree ({} total nodes):", surface.node_count())
            .expect("write to String");

        if roots.is_empty() {
            writeln!(output, "  (empty)").expect("write to String");
        } else {
            for root in roots {
                self.format_subtree_into(surface, root, 0, true, &mut output);
            }
        }
        output
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, surface: &MemorySurface, root: NodeId) -> String {
        let mut output = String::new();
        self.format_subtree_into(surface, root, 0, true, &mut output);
        output
    }

    fn format_subtree_into(
        &self,
        surface: &MemorySurface,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Some(kind) = surface.kind(id) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(surface.name(id).as_deref().unwrap_or("(unnamed)"));

        if self.options.show_ids {
            write!(output, " [{id:?}]").expect("write to String");
        }
        if self.options.show_kinds {
            write!(output, " ({kind})").expect("write to String");
        }
        if self.options.show_values
            && let Some(value) = surface.display_value(id).filter(|v| !v.is_null())
        {
            write!(output, " = {value}").expect("write to String");
        }
        if self.options.show_flags {
            if surface.has_flag(id, StateFlag::Invalid) {
                output.push_str(" !invalid");
            }
            if surface.has_flag(id, StateFlag::Obscured) {
                output.push_str(" ~obscured");
            }
        }
        output.push('\n');

        let children = surface.children(id);
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_subtree_into(surface, child, depth + 1, i + 1 == child_count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

impl fmt::Display for TreeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii => f.write_str("ascii"),
            Self::Unicode => f.write_str("unicode"),
            Self::Compact => f.write_str("compact"),
        }
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_facet::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{NodeKind, Surface};
    use serde_json::{Map, json};

    fn sample() -> (MemorySurface, NodeId) {
        let surface = MemorySurface::new();
        let root = surface.create_node(NodeKind::Container, Some("form"), &Map::new());
        let name = surface.create_node(NodeKind::TextField, Some("name"), &Map::new());
        let save = surface.create_node(NodeKind::Button, Some("save"), &Map::new());
        surface.append_child(root, name).unwrap();
        surface.append_child(root, save).unwrap();
        surface.set_display_value(name, &json!("Jane")).unwrap();
        surface.set_state_flag(name, StateFlag::Invalid, true).unwrap();
        (surface, root)
    }

    #[test]
    fn test_tree_format_empty() {
        let surface = MemorySurface::new();
        let output = SurfaceTreeDebug::new().format_all(&surface);
        assert!(output.contains("Surface Tree (0 total nodes)"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let (surface, root) = sample();
        let output = SurfaceTreeDebug::new().format_subtree(&surface, root);

        assert!(output.contains("form"));
        assert!(output.contains("name"));
        assert!(output.contains("(text-field)"));
        assert!(output.contains("!invalid"));
        assert!(output.lines().nth(2).unwrap().starts_with('\u{2514}'));
    }

    #[test]
    fn test_tree_format_values() {
        let (surface, root) = sample();
        let output = SurfaceTreeDebug::with_options(TreeFormatOptions::detailed())
            .format_subtree(&surface, root);
        assert!(output.contains("= \"Jane\""));
    }

    #[test]
    fn test_tree_format_minimal() {
        let (surface, root) = sample();
        let output = SurfaceTreeDebug::with_options(TreeFormatOptions::minimal())
            .format_subtree(&surface, root);

        assert!(output.contains("save"));
        assert!(!output.contains("(button)"));
        assert!(!output.contains('['));
    }

    #[test]
    fn test_tree_format_max_depth() {
        let (surface, root) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(0),
            ..Default::default()
        };
        let output = SurfaceTreeDebug::with_options(options).format_subtree(&surface, root);
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
