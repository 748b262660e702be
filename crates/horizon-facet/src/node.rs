//! Configuration nodes.
//!
//! A [`ConfigNode`] is an immutable description of a piece of UI. The
//! [`ViewBuilder`](crate::ViewBuilder) interprets it; nothing in a node runs
//! until then. Nodes are cheap to clone: handlers are reference-counted.
//!
//! Nodes can be assembled in code:
//!
//! ```
//! use horizon_facet::node::{ButtonAction, ConfigNode, ContainerSpec, ControlSpec};
//!
//! let form = ConfigNode::from(
//!     ContainerSpec::new()
//!         .named("editor")
//!         .child(ControlSpec::text_field("name").with_option("required", true))
//!         .child(ControlSpec::button("Save").with_action(ButtonAction::Apply)),
//! );
//! assert_eq!(form.name(), Some("editor"));
//! ```
//!
//! or read from JSON, where the `type` field selects the node kind:
//!
//! ```
//! use horizon_facet::node::ConfigNode;
//! use serde_json::json;
//!
//! let node = ConfigNode::from_json(&json!({
//!     "type": "container",
//!     "children": [
//!         {"type": "text-field", "key": "name", "options": {"required": true}},
//!         {"type": "button", "options": {"title": "Save"}, "action": "apply"}
//!     ]
//! }))
//! .unwrap();
//! assert!(matches!(node, ConfigNode::Container(_)));
//!
//! assert!(ConfigNode::from_json(&json!({"type": "slider"})).is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use horizon_facet_core::{BindingContext, DataKey};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::format::CellFormat;
use crate::widget::validator::{RuleSet, Validator};

/// Handler invoked with the button's binding context on activation.
pub type TapHandler = Arc<dyn Fn(&BindingContext) + Send + Sync>;

/// Handler invoked with a row's binding context on row activation.
///
/// The context shares the table's store; clone the data to isolate edits.
pub type RowHandler = Arc<dyn Fn(&BindingContext) + Send + Sync>;

/// Maps a bound value to the value a cell displays.
pub type CellRenderer = Arc<dyn Fn(Option<&Value>) -> Value + Send + Sync>;

// ============================================================================
// Controls
// ============================================================================

/// The kinds of leaf controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// A pressable button.
    Button,
    /// An editable text field.
    TextField,
    /// A read-only label.
    Label,
}

impl FromStr for ControlKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "button" => Ok(Self::Button),
            "text-field" | "textField" | "text_field" => Ok(Self::TextField),
            "label" => Ok(Self::Label),
            other => Err(ConfigurationError::unknown_kind(other)),
        }
    }
}

/// What a button does when activated.
#[derive(Clone)]
pub enum ButtonAction {
    /// Invoke an application handler.
    Tap(TapHandler),
    /// Validate and confirm the enclosing popover.
    Apply,
    /// Request deletion through the enclosing popover.
    Remove,
    /// Close the enclosing popover without action.
    Dismiss,
}

impl ButtonAction {
    /// Create a tap action from a closure.
    pub fn tap<F>(handler: F) -> Self
    where
        F: Fn(&BindingContext) + Send + Sync + 'static,
    {
        Self::Tap(Arc::new(handler))
    }
}

impl FromStr for ButtonAction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apply" => Ok(Self::Apply),
            "remove" => Ok(Self::Remove),
            "dismiss" => Ok(Self::Dismiss),
            other => Err(ConfigurationError::malformed(format!("unknown button action '{other}'"))),
        }
    }
}

impl fmt::Debug for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tap(_) => f.write_str("Tap(..)"),
            Self::Apply => f.write_str("Apply"),
            Self::Remove => f.write_str("Remove"),
            Self::Dismiss => f.write_str("Dismiss"),
        }
    }
}

/// Description of a leaf control.
#[derive(Debug, Clone)]
pub struct ControlSpec {
    pub kind: ControlKind,
    pub key: Option<DataKey>,
    pub name: Option<String>,
    pub options: Map<String, Value>,
    pub action: Option<ButtonAction>,
    /// Validators run after the declarative `required` and `pattern` rules.
    pub validators: RuleSet,
}

impl ControlSpec {
    /// A control of `kind` with no binding.
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            key: None,
            name: None,
            options: Map::new(),
            action: None,
            validators: RuleSet::new(),
        }
    }

    /// A button with a title.
    pub fn button(title: impl Into<String>) -> Self {
        Self::new(ControlKind::Button).with_option("title", Value::String(title.into()))
    }

    /// A text field bound to `key`, named after the key.
    pub fn text_field(key: impl Into<DataKey>) -> Self {
        Self::new(ControlKind::TextField).bound_to(key)
    }

    /// A label bound to `key`, named after the key.
    pub fn label(key: impl Into<DataKey>) -> Self {
        Self::new(ControlKind::Label).bound_to(key)
    }

    /// A label showing fixed text.
    pub fn static_label(text: impl Into<String>) -> Self {
        Self::new(ControlKind::Label).with_option("text", Value::String(text.into()))
    }

    /// Bind to a data key. Unnamed controls take the key as their name.
    pub fn bound_to(mut self, key: impl Into<DataKey>) -> Self {
        let key = key.into();
        if self.name.is_none() && !key.is_self() {
            self.name = Some(key.to_string());
        }
        self.key = Some(key);
        self
    }

    /// Set the control's name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set one opaque option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Attach a custom validator. Buttons ignore validators.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(validator);
        self
    }

    /// Set the button action.
    pub fn with_action(mut self, action: ButtonAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Set a tap handler.
    pub fn on_tap<F>(self, handler: F) -> Self
    where
        F: Fn(&BindingContext) + Send + Sync + 'static,
    {
        self.with_action(ButtonAction::tap(handler))
    }
}

// ============================================================================
// Containers
// ============================================================================

/// Description of a container of child nodes.
#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    pub name: Option<String>,
    pub options: Map<String, Value>,
    /// Rebinds the subtree to the value at this key.
    pub context_key: Option<DataKey>,
    pub children: Vec<ConfigNode>,
}

impl ContainerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Bind children to the nested value at `key`.
    pub fn with_context(mut self, key: impl Into<DataKey>) -> Self {
        self.context_key = Some(key.into());
        self
    }

    pub fn child(mut self, node: impl Into<ConfigNode>) -> Self {
        self.children.push(node.into());
        self
    }
}

// ============================================================================
// Tables
// ============================================================================

/// One table column.
#[derive(Clone)]
pub struct ColumnSpec {
    pub label: String,
    /// Resolved against each row.
    pub key: DataKey,
    pub width: Option<f32>,
    pub renderer: Option<CellRenderer>,
}

impl ColumnSpec {
    pub fn new(label: impl Into<String>, key: impl Into<DataKey>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            width: None,
            renderer: None,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Render cells with a named format.
    pub fn with_format(self, format: CellFormat) -> Self {
        self.with_renderer(move |value| format.render(value))
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("label", &self.label)
            .field("key", &self.key)
            .field("width", &self.width)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

/// Description of a virtualized table.
#[derive(Clone)]
pub struct TableSpec {
    pub name: Option<String>,
    /// Key of the row sequence in the enclosing context.
    pub rows_key: DataKey,
    pub columns: Vec<ColumnSpec>,
    /// Falls back to the builder default when unset.
    pub row_height: Option<f32>,
    /// Falls back to the builder default when unset.
    pub viewport_height: Option<f32>,
    /// Falls back to the builder default when unset.
    pub overscan: Option<usize>,
    pub options: Map<String, Value>,
    pub on_row_activated: Option<RowHandler>,
}

impl TableSpec {
    /// A table over the sequence at `rows_key`.
    pub fn new(rows_key: impl Into<DataKey>) -> Self {
        Self {
            name: None,
            rows_key: rows_key.into(),
            columns: Vec::new(),
            row_height: None,
            viewport_height: None,
            overscan: None,
            options: Map::new(),
            on_row_activated: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_row_height(mut self, row_height: f32) -> Self {
        self.row_height = Some(row_height);
        self
    }

    pub fn with_viewport_height(mut self, viewport_height: f32) -> Self {
        self.viewport_height = Some(viewport_height);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = Some(overscan);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the row activation handler.
    pub fn on_row_activated<F>(mut self, handler: F) -> Self
    where
        F: Fn(&BindingContext) + Send + Sync + 'static,
    {
        self.on_row_activated = Some(Arc::new(handler));
        self
    }

    /// A display name for diagnostics.
    pub(crate) fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.rows_key.to_string())
    }
}

impl fmt::Debug for TableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSpec")
            .field("name", &self.name)
            .field("rows_key", &self.rows_key)
            .field("columns", &self.columns)
            .field("row_height", &self.row_height)
            .field("viewport_height", &self.viewport_height)
            .field("overscan", &self.overscan)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConfigNode
// ============================================================================

/// An immutable description of UI, interpreted by the view builder.
#[derive(Debug, Clone)]
pub enum ConfigNode {
    /// A container with ordered children.
    Container(ContainerSpec),
    /// A leaf control.
    Control(ControlSpec),
    /// A virtualized table.
    Table(TableSpec),
    /// A bare list of nodes, realized as an implicit container.
    Array(Vec<ConfigNode>),
}

impl ConfigNode {
    /// The node's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Container(spec) => spec.name.as_deref(),
            Self::Control(spec) => spec.name.as_deref(),
            Self::Table(spec) => spec.name.as_deref(),
            Self::Array(_) => None,
        }
    }

    /// Interpret a JSON node description.
    ///
    /// Tap and row handlers cannot be expressed in JSON; attach them in code.
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Value::Object(map) => Self::from_json_object(map),
            other => Err(ConfigurationError::malformed(format!(
                "expected a node object or array, got {other}"
            ))),
        }
    }

    fn from_json_object(map: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigurationError::malformed("node is missing a string 'type'"))?;

        match kind {
            "container" => {
                let mut spec = ContainerSpec::new();
                spec.name = string_field(map, "name")?;
                spec.options = options_field(map)?;
                spec.context_key = string_field(map, "context")?.map(DataKey::from);
                if let Some(children) = map.get("children") {
                    let Value::Array(children) = children else {
                        return Err(ConfigurationError::malformed("'children' must be an array"));
                    };
                    spec.children = children
                        .iter()
                        .map(Self::from_json)
                        .collect::<Result<_, _>>()?;
                }
                Ok(Self::Container(spec))
            }
            "table" => {
                let raw: TableJson = serde_json::from_value(Value::Object(map.clone()))
                    .map_err(|err| ConfigurationError::malformed(format!("table: {err}")))?;
                raw.into_spec().map(Self::Table)
            }
            other => {
                let mut spec = ControlSpec::new(other.parse()?);
                spec.options = options_field(map)?;
                if let Some(key) = string_field(map, "key")? {
                    spec = spec.bound_to(key);
                }
                if let Some(name) = string_field(map, "name")? {
                    spec.name = Some(name);
                }
                if let Some(action) = string_field(map, "action")? {
                    spec.action = Some(action.parse()?);
                }
                Ok(Self::Control(spec))
            }
        }
    }
}

impl From<ContainerSpec> for ConfigNode {
    fn from(spec: ContainerSpec) -> Self {
        Self::Container(spec)
    }
}

impl From<ControlSpec> for ConfigNode {
    fn from(spec: ControlSpec) -> Self {
        Self::Control(spec)
    }
}

impl From<TableSpec> for ConfigNode {
    fn from(spec: TableSpec) -> Self {
        Self::Table(spec)
    }
}

impl From<Vec<ConfigNode>> for ConfigNode {
    fn from(nodes: Vec<ConfigNode>) -> Self {
        Self::Array(nodes)
    }
}

fn string_field(map: &Map<String, Value>, field: &str) -> Result<Option<String>, ConfigurationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigurationError::malformed(format!(
            "'{field}' must be a string, got {other}"
        ))),
    }
}

fn options_field(map: &Map<String, Value>) -> Result<Map<String, Value>, ConfigurationError> {
    match map.get("options") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(options)) => Ok(options.clone()),
        Some(other) => Err(ConfigurationError::malformed(format!(
            "'options' must be an object, got {other}"
        ))),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnJson {
    label: String,
    key: String,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableJson {
    #[serde(default)]
    name: Option<String>,
    key: String,
    #[serde(default)]
    columns: Vec<ColumnJson>,
    #[serde(default)]
    row_height: Option<f32>,
    #[serde(default)]
    viewport_height: Option<f32>,
    #[serde(default)]
    overscan: Option<usize>,
    #[serde(default)]
    options: Map<String, Value>,
}

impl TableJson {
    fn into_spec(self) -> Result<TableSpec, ConfigurationError> {
        let mut spec = TableSpec::new(self.key);
        spec.name = self.name;
        spec.row_height = self.row_height;
        spec.viewport_height = self.viewport_height;
        spec.overscan = self.overscan;
        spec.options = self.options;

        for column in self.columns {
            let mut col = ColumnSpec::new(column.label, column.key);
            col.width = column.width;
            if let Some(format) = column.format {
                col = col.with_format(format.parse()?);
            }
            spec.columns.push(col);
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_control_kind_parse() {
        assert_eq!("button".parse::<ControlKind>().unwrap(), ControlKind::Button);
        assert_eq!("textField".parse::<ControlKind>().unwrap(), ControlKind::TextField);
        assert_eq!(
            "slider".parse::<ControlKind>(),
            Err(ConfigurationError::unknown_kind("slider"))
        );
    }

    #[test]
    fn test_bound_controls_take_key_as_name() {
        let spec = ControlSpec::text_field("address.city");
        assert_eq!(spec.name.as_deref(), Some("address.city"));

        let spec = ControlSpec::text_field("name").named("customer");
        assert_eq!(spec.name.as_deref(), Some("customer"));

        let spec = ControlSpec::label(".");
        assert!(spec.name.is_none());
    }

    #[test]
    fn test_from_json_container() {
        let node = ConfigNode::from_json(&json!({
            "type": "container",
            "name": "address",
            "context": "address",
            "options": {"padding": 8},
            "children": [
                {"type": "label", "key": "city"},
                [{"type": "button", "action": "dismiss"}]
            ]
        }))
        .unwrap();

        let ConfigNode::Container(spec) = node else {
            panic!("expected container");
        };
        assert_eq!(spec.name.as_deref(), Some("address"));
        assert_eq!(spec.context_key, Some(DataKey::parse("address")));
        assert_eq!(spec.options.get("padding"), Some(&json!(8)));
        assert_eq!(spec.children.len(), 2);
        assert!(matches!(spec.children[1], ConfigNode::Array(ref items) if items.len() == 1));
    }

    #[test]
    fn test_from_json_table() {
        let node = ConfigNode::from_json(&json!({
            "type": "table",
            "key": "rows",
            "rowHeight": 32,
            "columns": [
                {"label": "Name", "key": "name", "width": 120},
                {"label": "Total", "key": "total", "format": "currency"}
            ]
        }))
        .unwrap();

        let ConfigNode::Table(spec) = node else {
            panic!("expected table");
        };
        assert_eq!(spec.row_height, Some(32.0));
        assert_eq!(spec.columns.len(), 2);
        assert_eq!(spec.columns[0].width, Some(120.0));
        let render = spec.columns[1].renderer.as_ref().unwrap();
        assert_eq!(render(Some(&json!(2))), json!("$2.00"));
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            ConfigNode::from_json(&json!({"type": "slider"})),
            Err(ConfigurationError::UnknownKind { .. })
        ));
        assert!(ConfigNode::from_json(&json!({"children": []})).is_err());
        assert!(ConfigNode::from_json(&json!("button")).is_err());
        assert!(ConfigNode::from_json(&json!({"type": "label", "key": 3})).is_err());
        assert!(ConfigNode::from_json(&json!({"type": "button", "action": "explode"})).is_err());
        assert!(ConfigNode::from_json(&json!({"type": "table", "columns": []})).is_err());
    }
}
