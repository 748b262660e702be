//! Bound leaf controls.
//!
//! A [`Control`] is one realized surface node tied to a binding context and,
//! optionally, a data key. Its displayed value always comes from the context;
//! user edits on text fields are written straight back through the key.
//!
//! Controls without a key are display-only and never write.

use std::fmt;
use std::sync::{Arc, Weak};

use horizon_facet_core::logging::targets;
use horizon_facet_core::surface::{EventKind, NodeId, NodeKind, StateFlag, Surface, SurfaceEvent};
use horizon_facet_core::{BindingContext, BindingError, DataKey, Property, Signal};
use serde_json::Value;

use crate::error::BuildError;
use crate::node::{CellRenderer, ControlKind, ControlSpec, TapHandler};
use crate::widget::validator::{RuleSet, ValidationFailure};

impl From<ControlKind> for NodeKind {
    fn from(kind: ControlKind) -> Self {
        match kind {
            ControlKind::Button => NodeKind::Button,
            ControlKind::TextField => NodeKind::TextField,
            ControlKind::Label => NodeKind::Label,
        }
    }
}

/// A user edit that could not be written to its binding context.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingFailure {
    /// Name of the control that received the edit.
    pub control: Option<String>,
    /// The key the edit targeted.
    pub key: DataKey,
    /// Why the write was rejected.
    pub error: BindingError,
}

/// Everything a control is wired to besides its spec.
#[derive(Clone, Default)]
pub(crate) struct ControlWiring {
    pub(crate) on_activate: Option<TapHandler>,
    pub(crate) renderer: Option<CellRenderer>,
    pub(crate) binding_failed: Option<Arc<Signal<BindingFailure>>>,
}

struct ControlInner {
    kind: ControlKind,
    name: Option<String>,
    node: NodeId,
    key: Option<DataKey>,
    context: BindingContext,
    surface: Arc<dyn Surface>,
    rules: RuleSet,
    renderer: Option<CellRenderer>,
    fixed_display: Option<Value>,
    failure: Property<Option<ValidationFailure>>,
    binding_failed: Option<Arc<Signal<BindingFailure>>>,
    value_changed: Signal<Value>,
}

/// A realized, bound control.
///
/// Cloning yields another handle to the same control.
///
/// # Signals
///
/// - [`value_changed`](Self::value_changed): after a user edit was written
/// - [`validation_changed`](Self::validation_changed): when the recorded failure changes
#[derive(Clone)]
pub struct Control {
    inner: Arc<ControlInner>,
}

impl Control {
    pub(crate) fn realize(
        surface: &Arc<dyn Surface>,
        spec: &ControlSpec,
        context: BindingContext,
        wiring: ControlWiring,
    ) -> Result<Control, BuildError> {
        let rules = match spec.kind {
            ControlKind::Button => RuleSet::new(),
            _ => {
                let mut rules = RuleSet::from_options(&spec.options)?;
                rules.extend(&spec.validators);
                rules
            }
        };
        let fixed_display = match spec.kind {
            ControlKind::Button => spec.options.get("title").cloned(),
            ControlKind::Label => spec.options.get("text").cloned(),
            ControlKind::TextField => None,
        };

        let node = surface.create_node(spec.kind.into(), spec.name.as_deref(), &spec.options);
        let control = Control {
            inner: Arc::new(ControlInner {
                kind: spec.kind,
                name: spec.name.clone(),
                node,
                key: spec.key.clone(),
                context,
                surface: surface.clone(),
                rules,
                renderer: wiring.renderer,
                fixed_display,
                failure: Property::new(None),
                binding_failed: wiring.binding_failed,
                value_changed: Signal::new(),
            }),
        };

        if let Err(err) = control.wire(wiring.on_activate) {
            surface.destroy_node(node);
            return Err(err);
        }
        Ok(control)
    }

    fn wire(&self, on_activate: Option<TapHandler>) -> Result<(), BuildError> {
        self.refresh();
        let surface = &self.inner.surface;
        let weak = Arc::downgrade(&self.inner);

        match self.inner.kind {
            ControlKind::TextField => {
                surface.subscribe(
                    self.inner.node,
                    EventKind::Change,
                    Arc::new(move |event| {
                        if let (Some(inner), SurfaceEvent::Change(value)) = (weak.upgrade(), event) {
                            Control { inner }.handle_user_change(value.clone());
                        }
                    }),
                )?;
            }
            ControlKind::Button => {
                if let Some(handler) = on_activate {
                    surface.subscribe(
                        self.inner.node,
                        EventKind::Activate,
                        Arc::new(move |_| {
                            if let Some(inner) = Weak::upgrade(&weak) {
                                tracing::trace!(target: targets::CONTROL, name = ?inner.name, "button activated");
                                handler(&inner.context);
                            }
                        }),
                    )?;
                }
            }
            ControlKind::Label => {}
        }
        Ok(())
    }

    /// The control kind.
    pub fn kind(&self) -> ControlKind {
        self.inner.kind
    }

    /// The control's name.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The surface node backing this control.
    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    /// The data key, if the control is bound.
    pub fn key(&self) -> Option<&DataKey> {
        self.inner.key.as_ref()
    }

    /// The binding context the control resolves against.
    pub fn context(&self) -> &BindingContext {
        &self.inner.context
    }

    /// The bound value, read through the key.
    ///
    /// `None` for unbound controls and unresolvable keys.
    pub fn value(&self) -> Option<Value> {
        self.inner
            .key
            .as_ref()
            .and_then(|key| self.inner.context.read(key))
    }

    /// Write a value through the key and refresh the display.
    ///
    /// Unbound controls only update what they display.
    pub fn set_value(&self, value: Value) -> Result<(), BindingError> {
        let Some(key) = &self.inner.key else {
            self.show(&value);
            return Ok(());
        };
        self.inner.context.write(key, value)?;
        self.refresh();
        Ok(())
    }

    /// Re-read the bound value and push it to the surface.
    pub fn refresh(&self) {
        let display = match (&self.inner.key, &self.inner.fixed_display) {
            (Some(key), _) => self.inner.context.with_value(key, |value| match &self.inner.renderer {
                Some(render) => render(value),
                None => value.cloned().unwrap_or(Value::Null),
            }),
            (None, Some(fixed)) => fixed.clone(),
            (None, None) => match &self.inner.renderer {
                Some(render) => render(None),
                None => Value::Null,
            },
        };
        self.show(&display);
    }

    fn show(&self, display: &Value) {
        if let Err(err) = self.inner.surface.set_display_value(self.inner.node, display) {
            tracing::debug!(target: targets::CONTROL, name = ?self.inner.name, %err, "display update skipped");
        }
    }

    /// Apply a user-committed edit.
    ///
    /// A rejected write is reported and dropped; the display falls back to the
    /// data it is bound to.
    fn handle_user_change(&self, value: Value) {
        let Some(key) = &self.inner.key else {
            tracing::trace!(target: targets::CONTROL, name = ?self.inner.name, "edit on unbound control ignored");
            return;
        };

        match self.inner.context.write(key, value.clone()) {
            Ok(()) => {
                self.refresh();
                self.inner.value_changed.emit(value);
                if self.inner.failure.with(Option::is_some) {
                    self.validate();
                }
            }
            Err(error) => {
                tracing::warn!(
                    target: targets::CONTROL,
                    name = ?self.inner.name,
                    %key,
                    %error,
                    "user edit could not be bound, dropping it"
                );
                self.refresh();
                if let Some(signal) = &self.inner.binding_failed {
                    signal.emit(BindingFailure {
                        control: self.inner.name.clone(),
                        key: key.clone(),
                        error,
                    });
                }
            }
        }
    }

    /// Run the control's rules, record the outcome and flag the node.
    ///
    /// Buttons and controls without rules are always valid.
    pub fn validate(&self) -> bool {
        if self.inner.kind == ControlKind::Button {
            return true;
        }

        let outcome = self
            .inner
            .key
            .as_ref()
            .map_or(Ok(()), |key| self.inner.context.with_value(key, |v| self.inner.rules.check(v)));
        let failure = outcome.err();
        let valid = failure.is_none();

        if let Err(err) = self
            .inner
            .surface
            .set_state_flag(self.inner.node, StateFlag::Invalid, !valid)
        {
            tracing::debug!(target: targets::CONTROL, name = ?self.inner.name, %err, "invalid flag not applied");
        }

        if failure != self.inner.failure.get() {
            tracing::debug!(target: targets::CONTROL, name = ?self.inner.name, ?failure, "validation changed");
            self.inner.failure.set(failure);
        }
        valid
    }

    /// The failure recorded by the last [`validate`](Self::validate), if any.
    pub fn validation_failure(&self) -> Option<ValidationFailure> {
        self.inner.failure.get()
    }

    /// Emitted with the new value after a user edit was written.
    pub fn value_changed(&self) -> &Signal<Value> {
        &self.inner.value_changed
    }

    /// Emitted when the recorded validation failure changes.
    pub fn validation_changed(&self) -> &Signal<Option<ValidationFailure>> {
        self.inner.failure.changed()
    }

    /// Whether two handles refer to the same control.
    pub fn ptr_eq(&self, other: &Control) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("kind", &self.inner.kind)
            .field("name", &self.inner.name)
            .field("node", &self.inner.node)
            .field("key", &self.inner.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::validator::Validator;
    use horizon_facet_core::MemorySurface;
    use parking_lot::Mutex;
    use serde_json::json;

    fn setup(data: Value) -> (Arc<MemorySurface>, Arc<dyn Surface>, BindingContext) {
        let memory = MemorySurface::shared();
        let surface: Arc<dyn Surface> = memory.clone();
        (memory, surface, BindingContext::new(data))
    }

    #[test]
    fn test_initial_display_matches_read() {
        let (memory, surface, ctx) = setup(json!({"name": "Ada"}));
        let field = Control::realize(&surface, &ControlSpec::text_field("name"), ctx, Default::default()).unwrap();

        assert_eq!(memory.display_value(field.node()), Some(json!("Ada")));
        assert_eq!(memory.kind(field.node()), Some(NodeKind::TextField));
        assert_eq!(field.value(), Some(json!("Ada")));
    }

    #[test]
    fn test_user_change_writes_through() {
        let (memory, surface, ctx) = setup(json!({"id": 3}));
        let field = Control::realize(&surface, &ControlSpec::text_field("name"), ctx.clone(), Default::default())
            .unwrap();

        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        field.value_changed().connect(move |v| changes_clone.lock().push(v.clone()));

        memory.dispatch(field.node(), SurfaceEvent::Change(json!("Jane")));

        assert_eq!(ctx.snapshot(), json!({"id": 3, "name": "Jane"}));
        assert_eq!(memory.display_value(field.node()), Some(json!("Jane")));
        assert_eq!(*changes.lock(), vec![json!("Jane")]);
    }

    #[test]
    fn test_rejected_edit_is_reported_and_dropped() {
        let (memory, surface, ctx) = setup(json!({"name": "Ada"}));
        let failures = Arc::new(Signal::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        failures.connect(move |f: &BindingFailure| seen_clone.lock().push(f.clone()));

        let wiring = ControlWiring {
            binding_failed: Some(failures),
            ..Default::default()
        };
        let field = Control::realize(&surface, &ControlSpec::text_field("name.first"), ctx.clone(), wiring)
            .unwrap();

        memory.dispatch(field.node(), SurfaceEvent::Change(json!("A")));

        assert_eq!(ctx.snapshot(), json!({"name": "Ada"}));
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].control.as_deref(), Some("name.first"));
        assert!(matches!(seen[0].error, BindingError::NotAContainer { .. }));
    }

    #[test]
    fn test_unbound_label_never_writes() {
        let (memory, surface, ctx) = setup(json!({}));
        let label =
            Control::realize(&surface, &ControlSpec::static_label("Total"), ctx.clone(), Default::default()).unwrap();

        assert_eq!(memory.display_value(label.node()), Some(json!("Total")));
        label.set_value(json!("Sum")).unwrap();
        assert_eq!(memory.display_value(label.node()), Some(json!("Sum")));
        assert_eq!(ctx.snapshot(), json!({}));
        assert_eq!(label.value(), None);
    }

    #[test]
    fn test_validate_flags_node() {
        let (memory, surface, ctx) = setup(json!({"name": ""}));
        let spec = ControlSpec::text_field("name").with_option("required", true);
        let field = Control::realize(&surface, &spec, ctx, Default::default()).unwrap();

        assert!(!field.validate());
        assert_eq!(field.validation_failure(), Some(ValidationFailure::Required));
        assert!(memory.has_flag(field.node(), StateFlag::Invalid));

        // Fixing the value through the UI re-validates automatically.
        memory.dispatch(field.node(), SurfaceEvent::Change(json!("Jane")));
        assert_eq!(field.validation_failure(), None);
        assert!(!memory.has_flag(field.node(), StateFlag::Invalid));
    }

    #[test]
    fn test_custom_validator_runs_after_declared_rules() {
        struct Even;
        impl Validator for Even {
            fn validate(&self, value: Option<&Value>) -> Result<(), ValidationFailure> {
                match value.and_then(Value::as_i64) {
                    Some(n) if n % 2 != 0 => Err(ValidationFailure::Rejected {
                        message: "Must be even".into(),
                    }),
                    _ => Ok(()),
                }
            }
        }

        let (memory, surface, ctx) = setup(json!({"count": 3}));
        let spec = ControlSpec::text_field("count")
            .with_option("required", true)
            .with_validator(Even);
        let field = Control::realize(&surface, &spec, ctx.clone(), Default::default()).unwrap();

        assert!(!field.validate());
        let failure = field.validation_failure().unwrap();
        assert_eq!(failure.to_string(), "Must be even");
        assert!(memory.has_flag(field.node(), StateFlag::Invalid));

        ctx.write(&"count".into(), Value::Null).unwrap();
        assert!(!field.validate());
        assert_eq!(field.validation_failure(), Some(ValidationFailure::Required));

        field.set_value(json!(4)).unwrap();
        assert!(field.validate());
    }

    #[test]
    fn test_button_tap_receives_context() {
        let (memory, surface, ctx) = setup(json!({"id": 7}));
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let wiring = ControlWiring {
            on_activate: Some(Arc::new(move |ctx: &BindingContext| {
                *seen_clone.lock() = ctx.read(&"id".into());
            })),
            ..Default::default()
        };
        let button = Control::realize(&surface, &ControlSpec::button("Go"), ctx, wiring).unwrap();

        assert_eq!(memory.display_value(button.node()), Some(json!("Go")));
        assert!(button.validate());
        memory.dispatch(button.node(), SurfaceEvent::Activate);
        assert_eq!(*seen.lock(), Some(json!(7)));
    }

    #[test]
    fn test_bad_pattern_creates_no_node() {
        let (memory, surface, ctx) = setup(json!({}));
        let spec = ControlSpec::text_field("code").with_option("pattern", "(");
        assert!(Control::realize(&surface, &spec, ctx, Default::default()).is_err());
        assert_eq!(memory.node_count(), 0);
    }
}
