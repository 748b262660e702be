//! Virtualized tables.
//!
//! A [`Table`] realizes only the rows inside its current [`RowWindow`]: the
//! rows visible in the viewport plus a small overscan. Scrolling realizes rows
//! that enter the window, destroys rows that leave it, and leaves every other
//! row untouched.
//!
//! The row sequence lives in the caller's binding context; the table only
//! holds the key it is found at. Each realized row is a container bound to
//! that row's object, and each cell is a label bound to the column key.
//!
//! # Example
//!
//! ```
//! use horizon_facet::widget::table::compute_row_window;
//!
//! // 100 rows of 40px in a 200px viewport, scrolled to 400px, one row of overscan.
//! let window = compute_row_window(400.0, 40.0, 200.0, 100, 1);
//! assert_eq!(window.range(), 10..16);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use horizon_facet_core::logging::{PerfSpan, span_names, targets};
use horizon_facet_core::surface::{EventKind, NodeId, NodeKind, SubscriptionId, Surface, SurfaceEvent};
use horizon_facet_core::{BindingContext, BindingError, DataKey, Signal};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::config::BuilderConfig;
use crate::error::{BuildError, ConfigurationError};
use crate::node::{ColumnSpec, ControlSpec, RowHandler, TableSpec};
use crate::widget::control::{BindingFailure, Control, ControlWiring};

/// A contiguous range of row indices `start..end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RowWindow {
    pub start: usize,
    pub end: usize,
}

impl RowWindow {
    /// The empty window.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for RowWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Clamp a scroll offset into `[0, max(0, rows * row_height - viewport)]`.
///
/// A non-finite offset clamps to 0.
pub fn clamp_offset(offset: f32, row_height: f32, viewport_height: f32, row_count: usize) -> f32 {
    if !offset.is_finite() {
        return 0.0;
    }
    let total = row_count as f32 * row_height;
    let max_offset = (total - viewport_height).max(0.0);
    offset.clamp(0.0, max_offset)
}

/// Compute the rows to realize for a scroll position.
///
/// The offset is clamped first. The window starts at the first row under the
/// viewport's top edge and spans `ceil(viewport / row_height) + overscan` rows,
/// cut off at the end of the sequence.
pub fn compute_row_window(
    offset: f32,
    row_height: f32,
    viewport_height: f32,
    row_count: usize,
    overscan: usize,
) -> RowWindow {
    if row_count == 0 || !(row_height > 0.0) {
        return RowWindow::EMPTY;
    }

    let offset = clamp_offset(offset, row_height, viewport_height, row_count);
    let start = ((offset / row_height).floor() as usize).min(row_count);
    let visible = (viewport_height.max(0.0) / row_height).ceil() as usize;
    let end = start.saturating_add(visible).saturating_add(overscan).min(row_count);
    RowWindow::new(start, end)
}

struct RealizedRow {
    node: NodeId,
    cells: Vec<Control>,
}

struct TableState {
    viewport_height: f32,
    offset: f32,
    window: RowWindow,
    rows: BTreeMap<usize, RealizedRow>,
    scroll_subscription: Option<SubscriptionId>,
    torn_down: bool,
}

struct TableInner {
    name: String,
    node: NodeId,
    surface: Arc<dyn Surface>,
    context: BindingContext,
    rows_key: DataKey,
    columns: Vec<ColumnSpec>,
    row_height: f32,
    overscan: usize,
    on_row_activated: Option<RowHandler>,
    binding_failed: Option<Arc<Signal<BindingFailure>>>,
    state: Mutex<TableState>,
    window_changed: Signal<RowWindow>,
}

/// A virtualized table over a row sequence.
///
/// Cloning yields another handle to the same table.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Realize a table over the sequence at `spec.rows_key` in `context`.
    ///
    /// Unset row height, viewport and overscan fall back to `defaults`.
    pub fn new(
        surface: Arc<dyn Surface>,
        spec: &TableSpec,
        context: BindingContext,
        defaults: &BuilderConfig,
    ) -> Result<Table, BuildError> {
        Self::realize(surface, spec, context, defaults, None)
    }

    pub(crate) fn realize(
        surface: Arc<dyn Surface>,
        spec: &TableSpec,
        context: BindingContext,
        defaults: &BuilderConfig,
        binding_failed: Option<Arc<Signal<BindingFailure>>>,
    ) -> Result<Table, BuildError> {
        let row_height = spec.row_height.unwrap_or(defaults.row_height);
        let viewport_height = spec.viewport_height.unwrap_or(defaults.viewport_height);
        validate_row_height(row_height)?;
        validate_viewport(viewport_height)?;
        if spec.columns.is_empty() {
            return Err(ConfigurationError::MissingColumns {
                table: spec.display_name(),
            }
            .into());
        }

        let node = surface.create_node(NodeKind::Table, spec.name.as_deref(), &spec.options);
        let table = Table {
            inner: Arc::new(TableInner {
                name: spec.display_name(),
                node,
                surface: surface.clone(),
                context,
                rows_key: spec.rows_key.clone(),
                columns: spec.columns.clone(),
                row_height,
                overscan: spec.overscan.unwrap_or(defaults.overscan),
                on_row_activated: spec.on_row_activated.clone(),
                binding_failed,
                state: Mutex::new(TableState {
                    viewport_height,
                    offset: 0.0,
                    window: RowWindow::EMPTY,
                    rows: BTreeMap::new(),
                    scroll_subscription: None,
                    torn_down: false,
                }),
                window_changed: Signal::new(),
            }),
        };

        let weak = Arc::downgrade(&table.inner);
        let subscription = surface.subscribe(
            node,
            EventKind::Scroll,
            Arc::new(move |event| {
                if let (Some(inner), SurfaceEvent::Scroll { offset }) = (weak.upgrade(), event) {
                    Table { inner }.on_scroll(*offset);
                }
            }),
        );
        match subscription {
            Ok(id) => table.inner.state.lock().scroll_subscription = Some(id),
            Err(err) => {
                surface.destroy_node(node);
                return Err(err.into());
            }
        }

        let initial = {
            let mut state = table.inner.state.lock();
            let window = table.window_for(&state, state.offset);
            table.apply_window(&mut state, window)
        };
        if let Err(err) = initial {
            table.teardown();
            return Err(err);
        }

        tracing::debug!(
            target: targets::TABLE,
            table = %table.inner.name,
            row_height,
            viewport_height,
            window = %table.row_window(),
            "table realized"
        );
        Ok(table)
    }

    /// The table's name (its rows key when unnamed).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The surface node hosting the rows.
    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.inner.columns
    }

    pub fn row_height(&self) -> f32 {
        self.inner.row_height
    }

    pub fn overscan(&self) -> usize {
        self.inner.overscan
    }

    pub fn viewport_height(&self) -> f32 {
        self.inner.state.lock().viewport_height
    }

    /// The current, clamped scroll offset.
    pub fn scroll_offset(&self) -> f32 {
        self.inner.state.lock().offset
    }

    /// Number of rows in the bound sequence.
    pub fn row_count(&self) -> usize {
        self.inner.context.sequence_len(&self.inner.rows_key)
    }

    /// A copy of the bound row sequence.
    pub fn rows(&self) -> Vec<Value> {
        match self.inner.context.read(&self.inner.rows_key) {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        }
    }

    /// The window currently realized.
    pub fn row_window(&self) -> RowWindow {
        self.inner.state.lock().window
    }

    /// Indices of realized rows, ascending.
    pub fn realized_rows(&self) -> Vec<usize> {
        self.inner.state.lock().rows.keys().copied().collect()
    }

    /// The surface node of a realized row.
    pub fn row_node(&self, index: usize) -> Option<NodeId> {
        self.inner.state.lock().rows.get(&index).map(|row| row.node)
    }

    /// The cell controls of a realized row, in column order.
    pub fn row_cells(&self, index: usize) -> Vec<Control> {
        self.inner
            .state
            .lock()
            .rows
            .get(&index)
            .map(|row| row.cells.clone())
            .unwrap_or_default()
    }

    /// The binding context of a row.
    ///
    /// The context shares the caller's store: edits through it are edits to
    /// the row sequence.
    pub fn row_context(&self, index: usize) -> Option<BindingContext> {
        (index < self.row_count()).then(|| self.make_row_context(index))
    }

    /// Invoke the row activation handler for a row.
    ///
    /// Returns `false` when there is no handler or the index is out of range.
    pub fn activate_row(&self, index: usize) -> bool {
        let (Some(handler), Some(context)) = (&self.inner.on_row_activated, self.row_context(index)) else {
            return false;
        };
        tracing::trace!(target: targets::TABLE, table = %self.inner.name, index, "row activated");
        handler(&context);
        true
    }

    /// Emitted with the new window whenever it changes.
    pub fn window_changed(&self) -> &Signal<RowWindow> {
        &self.inner.window_changed
    }

    /// Replace the bound sequence and re-render the current window.
    pub fn set_rows(&self, rows: Vec<Value>) -> Result<(), BindingError> {
        self.inner.context.write(&self.inner.rows_key, Value::Array(rows))?;
        self.refresh();
        Ok(())
    }

    /// Tear down every realized row and realize the window again.
    ///
    /// Call after mutating the bound sequence from outside the table.
    pub fn refresh(&self) {
        let _perf = PerfSpan::new(span_names::TABLE_WINDOW);
        let window = {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                return;
            }
            let rows = std::mem::take(&mut state.rows);
            for row in rows.into_values() {
                self.inner.surface.destroy_node(row.node);
            }
            state.window = RowWindow::EMPTY;

            let window = self.window_for(&state, state.offset);
            if let Err(err) = self.apply_window(&mut state, window) {
                tracing::warn!(target: targets::TABLE, table = %self.inner.name, %err, "refresh failed");
            }
            state.window
        };
        tracing::debug!(target: targets::TABLE, table = %self.inner.name, %window, "table refreshed");
        self.inner.window_changed.emit(window);
    }

    /// Scroll to `offset` and update the realized rows.
    ///
    /// The latest call wins; there is no queue of pending offsets.
    pub fn on_scroll(&self, offset: f32) {
        let _perf = PerfSpan::new(span_names::TABLE_WINDOW);
        let changed = {
            let mut state = self.inner.state.lock();
            if state.torn_down {
                return;
            }
            state.offset = clamp_offset(offset, self.inner.row_height, state.viewport_height, self.row_count());
            let window = self.window_for(&state, state.offset);
            let previous = state.window;
            if window != previous
                && let Err(err) = self.apply_window(&mut state, window)
            {
                tracing::warn!(target: targets::TABLE, table = %self.inner.name, %err, "scroll update failed");
            }
            (state.window != previous).then_some(state.window)
        };

        if let Some(window) = changed {
            tracing::trace!(target: targets::TABLE, table = %self.inner.name, offset, %window, "window moved");
            self.inner.window_changed.emit(window);
        }
    }

    /// Resize the viewport and update the realized rows.
    pub fn set_viewport_height(&self, height: f32) -> Result<(), ConfigurationError> {
        validate_viewport(height)?;
        let offset = {
            let mut state = self.inner.state.lock();
            state.viewport_height = height;
            state.offset
        };
        self.on_scroll(offset);
        Ok(())
    }

    /// Destroy every realized row and the table node.
    ///
    /// Later scrolls and refreshes are ignored.
    pub fn teardown(&self) {
        let mut state = self.inner.state.lock();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        if let Some(id) = state.scroll_subscription.take() {
            self.inner.surface.unsubscribe(id);
        }
        for row in std::mem::take(&mut state.rows).into_values() {
            self.inner.surface.destroy_node(row.node);
        }
        state.window = RowWindow::EMPTY;
        self.inner.surface.destroy_node(self.inner.node);
        tracing::debug!(target: targets::TABLE, table = %self.inner.name, "table torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.state.lock().torn_down
    }

    fn window_for(&self, state: &TableState, offset: f32) -> RowWindow {
        compute_row_window(
            offset,
            self.inner.row_height,
            state.viewport_height,
            self.row_count(),
            self.inner.overscan,
        )
    }

    fn apply_window(&self, state: &mut TableState, window: RowWindow) -> Result<(), BuildError> {
        let row_count = self.row_count();
        state.offset = clamp_offset(state.offset, self.inner.row_height, state.viewport_height, row_count);

        let leaving: Vec<usize> = state.rows.keys().copied().filter(|i| !window.contains(*i)).collect();
        for index in leaving {
            if let Some(row) = state.rows.remove(&index) {
                self.inner.surface.destroy_node(row.node);
            }
        }

        let entering: Vec<usize> = window.range().filter(|i| !state.rows.contains_key(i)).collect();
        let needs_reorder = match (entering.first(), state.rows.keys().next_back()) {
            (Some(first_new), Some(last_kept)) => first_new < last_kept,
            _ => false,
        };

        for index in entering {
            let row = self.realize_row(index)?;
            self.inner.surface.append_child(self.inner.node, row.node)?;
            state.rows.insert(index, row);
        }

        if needs_reorder {
            for row in state.rows.values() {
                self.inner.surface.append_child(self.inner.node, row.node)?;
            }
        }

        state.window = window;
        Ok(())
    }

    fn make_row_context(&self, index: usize) -> BindingContext {
        self.inner.context.child(&self.inner.rows_key).row(index)
    }

    fn realize_row(&self, index: usize) -> Result<RealizedRow, BuildError> {
        let context = self.make_row_context(index);
        let node = self.inner.surface.create_node(NodeKind::Row, None, &Map::new());

        match self.populate_row(node, &context) {
            Ok(cells) => Ok(RealizedRow { node, cells }),
            Err(err) => {
                self.inner.surface.destroy_node(node);
                Err(err)
            }
        }
    }

    fn populate_row(&self, node: NodeId, context: &BindingContext) -> Result<Vec<Control>, BuildError> {
        let surface = &self.inner.surface;
        let mut cells = Vec::with_capacity(self.inner.columns.len());

        for column in &self.inner.columns {
            let mut spec = ControlSpec::label(column.key.clone()).named(column.label.clone());
            if let Some(width) = column.width {
                spec = spec.with_option("width", width);
            }
            let wiring = ControlWiring {
                renderer: column.renderer.clone(),
                binding_failed: self.inner.binding_failed.clone(),
                ..Default::default()
            };
            let cell = Control::realize(surface, &spec, context.clone(), wiring)?;
            surface.append_child(node, cell.node())?;
            cells.push(cell);
        }

        if let Some(handler) = &self.inner.on_row_activated {
            let handler = handler.clone();
            let context = context.clone();
            surface.subscribe(node, EventKind::Activate, Arc::new(move |_| handler(&context)))?;
        }
        Ok(cells)
    }
}

fn validate_row_height(row_height: f32) -> Result<(), ConfigurationError> {
    if row_height.is_finite() && row_height > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidRowHeight { value: row_height })
    }
}

fn validate_viewport(height: f32) -> Result<(), ConfigurationError> {
    if height.is_finite() && height >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidViewportHeight { value: height })
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Table")
            .field("name", &self.inner.name)
            .field("node", &self.inner.node)
            .field("row_height", &self.inner.row_height)
            .field("window", &state.window)
            .field("offset", &state.offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_facet_core::MemorySurface;
    use serde_json::json;

    fn rows(n: usize) -> Value {
        Value::Array((0..n).map(|i| json!({"id": i, "name": format!("row {i}")})).collect())
    }

    fn table(n: usize, row_height: f32, viewport: f32) -> (Arc<MemorySurface>, BindingContext, Table) {
        let memory = MemorySurface::shared();
        let ctx = BindingContext::new(json!({ "rows": rows(n) }));
        let spec = TableSpec::new("rows")
            .column(ColumnSpec::new("Name", "name"))
            .with_row_height(row_height)
            .with_viewport_height(viewport);
        let table = Table::new(memory.clone(), &spec, ctx.clone(), &BuilderConfig::default()).unwrap();
        (memory, ctx, table)
    }

    #[test]
    fn test_window_formula() {
        assert_eq!(compute_row_window(0.0, 40.0, 200.0, 100, 1), RowWindow::new(0, 6));
        assert_eq!(compute_row_window(60.0, 40.0, 200.0, 100, 0), RowWindow::new(1, 6));
        assert_eq!(compute_row_window(0.0, 40.0, 210.0, 100, 0), RowWindow::new(0, 6));
    }

    #[test]
    fn test_window_clamps_offset() {
        // Total height 400, viewport 200: offsets beyond 200 clamp to 200.
        assert_eq!(compute_row_window(10_000.0, 40.0, 200.0, 10, 1), RowWindow::new(5, 10));
        assert_eq!(compute_row_window(-50.0, 40.0, 200.0, 10, 1), RowWindow::new(0, 6));
        assert_eq!(compute_row_window(f32::NAN, 40.0, 200.0, 10, 1), RowWindow::new(0, 6));
        // Content shorter than the viewport never scrolls.
        assert_eq!(compute_row_window(80.0, 40.0, 400.0, 3, 1), RowWindow::new(0, 3));
    }

    #[test]
    fn test_window_empty_sequence() {
        assert!(compute_row_window(0.0, 40.0, 200.0, 0, 1).is_empty());
        assert!(compute_row_window(120.0, 40.0, 200.0, 0, 1).is_empty());
    }

    #[test]
    fn test_window_property_over_offsets() {
        let (row_height, viewport, count, overscan) = (25.0_f32, 110.0_f32, 57_usize, 2_usize);
        let max_offset = count as f32 * row_height - viewport;
        for step in 0..400 {
            let offset = step as f32 * 3.7 - 20.0;
            let window = compute_row_window(offset, row_height, viewport, count, overscan);
            let clamped = offset.clamp(0.0, max_offset);
            let start = (clamped / row_height).floor() as usize;
            let end = (start + (viewport / row_height).ceil() as usize + overscan).min(count);
            assert_eq!(window, RowWindow::new(start, end), "offset {offset}");
        }
    }

    #[test]
    fn test_invalid_geometry_is_rejected_at_setup() {
        let memory = MemorySurface::shared();
        let ctx = BindingContext::new(json!({"rows": []}));
        let base = TableSpec::new("rows").column(ColumnSpec::new("Name", "name"));
        let defaults = BuilderConfig::default();

        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = Table::new(memory.clone(), &base.clone().with_row_height(bad), ctx.clone(), &defaults)
                .unwrap_err();
            assert!(matches!(
                err,
                BuildError::Configuration(ConfigurationError::InvalidRowHeight { .. })
            ));
        }

        let err = Table::new(memory.clone(), &base.clone().with_viewport_height(-5.0), ctx.clone(), &defaults)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Configuration(ConfigurationError::InvalidViewportHeight { .. })
        ));

        let err = Table::new(memory.clone(), &TableSpec::new("rows"), ctx, &defaults).unwrap_err();
        assert!(matches!(err, BuildError::Configuration(ConfigurationError::MissingColumns { .. })));
        assert_eq!(memory.node_count(), 0);
    }

    #[test]
    fn test_zero_rows_renders_empty_window() {
        let (memory, _ctx, table) = table(0, 40.0, 200.0);
        assert!(table.row_window().is_empty());
        assert!(memory.children(table.node()).is_empty());
        table.on_scroll(500.0);
        assert!(table.realized_rows().is_empty());
    }

    #[test]
    fn test_scroll_keeps_retained_rows() {
        let (memory, _ctx, table) = table(50, 40.0, 120.0);
        assert_eq!(table.realized_rows(), vec![0, 1, 2, 3]);
        let kept = table.row_node(2).unwrap();

        table.on_scroll(80.0);
        assert_eq!(table.realized_rows(), vec![2, 3, 4, 5]);
        assert_eq!(table.row_node(2), Some(kept));
        assert_eq!(memory.children(table.node()).len(), 4);
    }

    #[test]
    fn test_scrolling_up_keeps_surface_order() {
        let (memory, _ctx, table) = table(50, 40.0, 120.0);
        table.on_scroll(400.0);
        table.on_scroll(360.0);

        let expected: Vec<NodeId> = table
            .realized_rows()
            .into_iter()
            .filter_map(|i| table.row_node(i))
            .collect();
        assert_eq!(memory.children(table.node()), expected);
    }

    #[test]
    fn test_cells_display_rendered_values() {
        let memory = MemorySurface::shared();
        let ctx = BindingContext::new(json!({"rows": [{"name": "alpha"}]}));
        let spec = TableSpec::new("rows").column(
            ColumnSpec::new("Name", "name").with_renderer(|v| json!(v.and_then(Value::as_str).unwrap_or("").to_uppercase())),
        );
        let table = Table::new(memory.clone(), &spec, ctx, &BuilderConfig::default()).unwrap();

        let cells = table.row_cells(0);
        assert_eq!(cells.len(), 1);
        assert_eq!(memory.display_value(cells[0].node()), Some(json!("ALPHA")));
    }

    #[test]
    fn test_set_rows_rerenders() {
        let (memory, ctx, table) = table(3, 40.0, 400.0);
        table.set_rows(vec![json!({"name": "only"})]).unwrap();

        assert_eq!(ctx.read(&"rows".into()), Some(json!([{"name": "only"}])));
        assert_eq!(table.realized_rows(), vec![0]);
        let cell = table.row_cells(0)[0].node();
        assert_eq!(memory.display_value(cell), Some(json!("only")));
    }

    #[test]
    fn test_scroll_events_from_surface() {
        let (memory, _ctx, table) = table(20, 40.0, 40.0);
        let windows = Arc::new(Mutex::new(Vec::new()));
        let windows_clone = windows.clone();
        table.window_changed().connect(move |w| windows_clone.lock().push(*w));

        memory.dispatch(table.node(), SurfaceEvent::Scroll { offset: 120.0 });
        memory.dispatch(table.node(), SurfaceEvent::Scroll { offset: 120.0 });

        assert_eq!(table.row_window(), RowWindow::new(3, 5));
        assert_eq!(*windows.lock(), vec![RowWindow::new(3, 5)]);
    }

    #[test]
    fn test_row_activation_shares_store() {
        let memory = MemorySurface::shared();
        let ctx = BindingContext::new(json!({"rows": [{"id": 1}, {"id": 2}]}));
        let spec = TableSpec::new("rows")
            .column(ColumnSpec::new("Id", "id"))
            .on_row_activated(|row| {
                row.write(&"seen".into(), json!(true)).unwrap();
            });
        let table = Table::new(memory.clone(), &spec, ctx.clone(), &BuilderConfig::default()).unwrap();

        memory.dispatch(table.row_node(1).unwrap(), SurfaceEvent::Activate);
        assert_eq!(ctx.read(&"rows[1].seen".into()), Some(json!(true)));

        assert!(table.activate_row(0));
        assert!(!table.activate_row(9));
        assert_eq!(ctx.read(&"rows[0].seen".into()), Some(json!(true)));
    }

    #[test]
    fn test_teardown_destroys_everything() {
        let (memory, _ctx, table) = table(10, 40.0, 80.0);
        table.teardown();

        assert_eq!(memory.node_count(), 0);
        assert_eq!(memory.subscription_count(), 0);
        table.on_scroll(100.0);
        table.refresh();
        assert!(table.realized_rows().is_empty());
    }

    #[test]
    fn test_viewport_resize() {
        let (_memory, _ctx, table) = table(30, 40.0, 40.0);
        assert_eq!(table.row_window(), RowWindow::new(0, 2));

        table.set_viewport_height(200.0).unwrap();
        assert_eq!(table.row_window(), RowWindow::new(0, 6));
        assert!(table.set_viewport_height(f32::NAN).is_err());
    }
}
