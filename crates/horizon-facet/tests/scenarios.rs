//! End-to-end tests driving views through the in-memory surface.

use std::sync::Arc;

use horizon_facet::prelude::*;
use horizon_facet::widget::table::compute_row_window;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    surface: Arc<MemorySurface>,
    builder: ViewBuilder,
    stack: PopoverStack,
    host: NodeId,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let surface = MemorySurface::shared();
        let host = surface.create_node(NodeKind::Container, Some("host"), &Map::new());
        Self {
            builder: ViewBuilder::new(surface.clone()),
            stack: PopoverStack::new(surface.clone()),
            surface,
            host,
        }
    }

    fn label_texts(&self, table: &Table) -> Vec<Value> {
        table
            .realized_rows()
            .into_iter()
            .flat_map(|i| table.row_cells(i))
            .filter_map(|cell| self.surface.display_value(cell.node()))
            .collect()
    }
}

fn record_editor() -> ConfigNode {
    ConfigNode::from(
        ContainerSpec::new()
            .named("record-editor")
            .child(ControlSpec::text_field("name").with_option("required", true))
            .child(ControlSpec::button("Save").named("save").with_action(ButtonAction::Apply)),
    )
}

// ============================================================================
// Binding laws
// ============================================================================

#[test]
fn test_display_equals_bound_value() {
    let h = Harness::new();
    let data = BindingContext::new(json!({
        "name": "Jane",
        "age": 41,
        "address": {"city": "Oslo"},
        "tags": ["a", "b"]
    }));
    let node = ConfigNode::from(
        ContainerSpec::new()
            .child(ControlSpec::text_field("name"))
            .child(ControlSpec::label("age"))
            .child(ControlSpec::label("address.city"))
            .child(ControlSpec::label("tags[1]")),
    );

    let view = h.builder.build(&node, &data).unwrap();
    for control in view.controls() {
        let key = control.key().unwrap();
        assert_eq!(h.surface.display_value(control.node()), data.read(key), "key {key}");
    }
}

#[test]
fn test_user_edits_write_through() {
    let h = Harness::new();
    let data = BindingContext::new(json!({"profile": {"name": "Jane"}}));
    let node = ConfigNode::from(
        ContainerSpec::new()
            .with_context("profile")
            .child(ControlSpec::text_field("name"))
            .child(ControlSpec::text_field("email")),
    );
    let view = h.builder.build(&node, &data).unwrap();

    for (name, value) in [("name", json!("Ann")), ("email", json!("ann@example.com"))] {
        let field = view.control(name).unwrap();
        h.surface.dispatch(field.node(), SurfaceEvent::Change(value.clone()));
        assert_eq!(data.read(&DataKey::parse(&format!("profile.{name}"))), Some(value));
    }
}

#[test]
fn test_rebuild_shows_identical_values() {
    let h = Harness::new();
    let data = BindingContext::new(json!({"name": "Jane"}));
    let mut controller = ViewController::new(&h.builder, record_editor(), data, h.host).unwrap();

    let shown = |controller: &ViewController| -> Vec<Option<Value>> {
        controller
            .view()
            .unwrap()
            .controls()
            .iter()
            .map(|c| h.surface.display_value(c.node()))
            .collect()
    };
    let first = shown(&controller);
    controller.rebuild().unwrap();
    controller.rebuild().unwrap();

    assert_eq!(shown(&controller), first);
    assert_eq!(h.surface.children(h.host).len(), 1);
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_scenario_a_scroll_shows_second_row_only() {
    let h = Harness::new();
    let data = BindingContext::new(json!({
        "rows": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]
    }));
    let spec = TableSpec::new("rows")
        .column(ColumnSpec::new("Id", "id"))
        .with_row_height(40.0)
        .with_viewport_height(40.0);
    let view = h.builder.build(&ConfigNode::from(spec), &data).unwrap();
    let table = view.table("rows").unwrap();

    table.on_scroll(40.0);

    assert_eq!(table.realized_rows(), vec![1]);
    assert_eq!(h.label_texts(&table), vec![json!(2)]);
    assert_eq!(h.surface.descendants_of_kind(table.node(), NodeKind::Label).len(), 1);
}

#[test]
fn test_realized_rows_match_window_for_any_offset() {
    let h = Harness::new();
    let rows: Vec<Value> = (0..120).map(|i| json!({"n": i})).collect();
    let data = BindingContext::new(json!({ "rows": rows }));
    let spec = TableSpec::new("rows")
        .column(ColumnSpec::new("N", "n"))
        .with_row_height(30.0)
        .with_viewport_height(95.0)
        .with_overscan(2);
    let table = Table::new(h.surface.clone(), &spec, data, &BuilderConfig::default()).unwrap();

    let offsets = [0.0, 15.0, 29.9, 30.0, 451.0, 1200.0, 3505.0, 10_000.0, 60.0, -3.0, 2999.0];
    for offset in offsets {
        table.on_scroll(offset);
        let expected = compute_row_window(offset, 30.0, 95.0, 120, 2);
        assert_eq!(table.row_window(), expected, "offset {offset}");
        assert_eq!(table.realized_rows(), expected.range().collect::<Vec<_>>(), "offset {offset}");
        assert_eq!(h.surface.children(table.node()).len(), expected.len());

        let shown: Vec<Value> = h.label_texts(&table);
        let wanted: Vec<Value> = expected.range().map(|i| json!(i)).collect();
        assert_eq!(shown, wanted, "offset {offset}");
    }
}

#[test]
fn test_column_formats_from_json() {
    let h = Harness::new();
    let node = ConfigNode::from_json(&json!({
        "type": "table",
        "name": "orders",
        "key": "orders",
        "rowHeight": 20,
        "viewportHeight": 100,
        "columns": [
            {"label": "Total", "key": "total", "format": "currency"},
            {"label": "Placed", "key": "placed", "format": "date:iso"}
        ]
    }))
    .unwrap();
    let data = BindingContext::new(json!({
        "orders": [{"total": 1234.5, "placed": "2024-03-05T09:30:00Z"}]
    }));

    let view = h.builder.build(&node, &data).unwrap();
    let table = view.table("orders").unwrap();
    assert_eq!(h.label_texts(&table), vec![json!("$1,234.50"), json!("2024-03-05")]);
}

#[test]
fn test_copy_on_apply_row_edit() {
    let h = Harness::new();
    let data = BindingContext::new(json!({
        "rows": [{"id": 1, "name": "Ada"}, {"id": 2, "name": "Grace"}]
    }));
    let spec = TableSpec::new("rows")
        .column(ColumnSpec::new("Name", "name"))
        .with_row_height(20.0)
        .with_viewport_height(200.0);
    let table = Table::new(h.surface.clone(), &spec, data.clone(), &BuilderConfig::default()).unwrap();

    // The opener edits a copy of row 1 in a popover.
    let row = table.row_context(1).unwrap();
    let draft = BindingContext::new(row.snapshot());
    let target = table.clone();
    let popover = PopoverBuilder::new(record_editor(), draft)
        .on_apply(move |edited| {
            let mut rows = target.rows();
            rows[1] = edited;
            target.set_rows(rows).unwrap();
        })
        .show(&h.builder, &h.stack, h.host)
        .unwrap();

    popover.control("name").unwrap().set_value(json!("Hopper")).unwrap();
    assert_eq!(data.read(&DataKey::parse("rows[1].name")), Some(json!("Grace")));

    assert_eq!(popover.apply(), Ok(ApplyOutcome::Applied));
    assert_eq!(data.read(&DataKey::parse("rows[1].name")), Some(json!("Hopper")));
    assert_eq!(h.label_texts(&table), vec![json!("Ada"), json!("Hopper")]);
}

// ============================================================================
// Popovers
// ============================================================================

#[test]
fn test_scenario_b_empty_required_name_blocks_apply() {
    let h = Harness::new();
    let applied = Arc::new(Mutex::new(Vec::new()));
    let sink = applied.clone();
    let popover = PopoverBuilder::new(record_editor(), BindingContext::new(json!({"id": 3})))
        .on_apply(move |value| sink.lock().push(value))
        .show(&h.builder, &h.stack, h.host)
        .unwrap();

    popover.control("name").unwrap().set_value(json!("")).unwrap();
    h.surface.dispatch(popover.control("save").unwrap().node(), SurfaceEvent::Activate);

    assert!(!popover.validate());
    assert!(applied.lock().is_empty());
    assert_eq!(popover.state(), LifecycleState::Visible);
}

#[test]
fn test_scenario_c_valid_name_applies_once() {
    let h = Harness::new();
    let applied = Arc::new(Mutex::new(Vec::new()));
    let sink = applied.clone();
    let popover = PopoverBuilder::new(record_editor(), BindingContext::new(json!({"id": 3})))
        .on_apply(move |value| sink.lock().push(value))
        .show(&h.builder, &h.stack, h.host)
        .unwrap();
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let recorded = outcomes.clone();
    popover.dismissed().connect(move |outcome| recorded.lock().push(*outcome));

    popover.control("name").unwrap().set_value(json!("Jane")).unwrap();
    let save = popover.control("save").unwrap().node();
    h.surface.dispatch(save, SurfaceEvent::Activate);
    h.surface.dispatch(save, SurfaceEvent::Activate);
    assert_eq!(popover.apply(), Err(LifecycleError::Dismissed));

    assert_eq!(*applied.lock(), vec![json!({"id": 3, "name": "Jane"})]);
    assert_eq!(popover.state(), LifecycleState::Dismissed);
    assert_eq!(*outcomes.lock(), vec![PopoverOutcome::Applied]);
}

#[test]
fn test_popover_stack_restores_in_lifo_order() {
    let h = Harness::new();
    let open = || {
        PopoverBuilder::new(record_editor(), BindingContext::new(json!({"name": "x"})))
            .show(&h.builder, &h.stack, h.host)
            .unwrap()
    };
    let p1 = open();
    let p2 = open();
    let p3 = open();
    let states = || [p1.state(), p2.state(), p3.state()];

    assert_eq!(states(), [LifecycleState::Obscured, LifecycleState::Obscured, LifecycleState::Visible]);

    // Dismissing from below is refused and changes nothing.
    assert_eq!(p1.dismiss(), Err(LifecycleError::NotTopmost));
    assert_eq!(p2.remove(), Err(LifecycleError::NotTopmost));
    assert_eq!(states(), [LifecycleState::Obscured, LifecycleState::Obscured, LifecycleState::Visible]);
    assert!(h.surface.contains(p1.node()));

    p3.dismiss().unwrap();
    assert_eq!(states(), [LifecycleState::Obscured, LifecycleState::Visible, LifecycleState::Dismissed]);

    p2.dismiss().unwrap();
    assert_eq!(states(), [LifecycleState::Visible, LifecycleState::Dismissed, LifecycleState::Dismissed]);

    p1.dismiss().unwrap();
    assert!(h.stack.is_empty());
    assert_eq!(h.surface.children(h.host), Vec::<NodeId>::new());
}

#[test]
fn test_apply_callback_may_open_another_popover() {
    let h = Harness::new();
    let builder = h.builder.clone();
    let stack = h.stack.clone();
    let host = h.host;
    let follow_up = Arc::new(Mutex::new(None));
    let slot = follow_up.clone();

    let first = PopoverBuilder::new(record_editor(), BindingContext::new(json!({"name": "Jane"})))
        .on_apply(move |value| {
            let next = PopoverBuilder::new(record_editor(), BindingContext::new(value))
                .show(&builder, &stack, host)
                .unwrap();
            *slot.lock() = Some(next);
        })
        .show(&h.builder, &h.stack, h.host)
        .unwrap();

    assert_eq!(first.apply(), Ok(ApplyOutcome::Applied));
    let next = follow_up.lock().take().unwrap();
    assert_eq!(next.state(), LifecycleState::Visible);
    assert_eq!(next.data().unwrap().read(&DataKey::parse("name")), Some(json!("Jane")));
    assert_eq!(h.stack.len(), 1);
}

#[test]
fn test_late_completion_after_dismissal_is_a_no_op() {
    let h = Harness::new();
    let popover = PopoverBuilder::new(record_editor(), BindingContext::new(json!({"name": "Jane"})))
        .show(&h.builder, &h.stack, h.host)
        .unwrap();
    let pending = popover.weak_data();

    popover.dismiss().unwrap();
    assert_eq!(pending.write_if_alive(&DataKey::parse("name"), json!("late")), None);
}
