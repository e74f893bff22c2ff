//! Control state types for the renderable form controls

use std::sync::atomic::{AtomicU64, Ordering};

use crate::callback::Listener;
use crate::error::ControlError;
use crate::value::FieldValue;

static NEXT_CONTROL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a control instance. Every constructed control gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

impl ControlId {
    fn next() -> Self {
        ControlId(NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Notification emitted when a control's value changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChanged {
    /// Control that changed
    pub control: ControlId,
    /// Label (field name) of the control
    pub label: String,
    /// The new value
    pub value: FieldValue,
}

/// Scrollable multi-line text area
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextAreaState {
    pub text: String,
    /// Preferred size in character cells (columns, rows), if any
    pub size: Option<(u32, u32)>,
}

/// On/off toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleState {
    pub checked: bool,
}

/// Selector over a fixed list of options
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorState {
    pub options: Vec<String>,
    pub selected: Option<usize>,
}

impl SelectorState {
    /// Text of the selected option.
    pub fn selected_text(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|s| s.as_str())
    }

    fn position(&self, value: &str) -> Option<usize> {
        self.options.iter().position(|o| o == value)
    }
}

/// Bounded integer stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperState {
    pub value: i64,
    pub min: i64,
    /// `None` means unbounded upward
    pub max: Option<i64>,
    pub step: i64,
}

impl StepperState {
    /// Check a value against the bounds.
    pub fn accepts(&self, value: i64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    fn clamp(&self, value: i64) -> i64 {
        let value = value.max(self.min);
        match self.max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

/// Static image placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailState {
    pub width: u32,
    pub height: u32,
    /// Grayscale pixels, row-major
    pub pixels: Vec<u8>,
}

impl Default for ThumbnailState {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0],
        }
    }
}

/// The kind-specific state of a control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    TextArea(TextAreaState),
    Toggle(ToggleState),
    Selector(SelectorState),
    Stepper(StepperState),
    Thumbnail(ThumbnailState),
}

impl ControlKind {
    /// Name of the value kind this control accepts.
    pub fn value_kind(&self) -> &'static str {
        match self {
            ControlKind::TextArea(_) | ControlKind::Selector(_) => "text",
            ControlKind::Toggle(_) => "bool",
            ControlKind::Stepper(_) => "int",
            ControlKind::Thumbnail(_) => "none",
        }
    }
}

/// A renderable form control.
///
/// Controls are not `Clone`. A copy is a new instance with its own
/// [`ControlId`], built through one of the constructors.
#[derive(Debug)]
pub struct Control {
    id: ControlId,
    label: String,
    enabled: bool,
    kind: ControlKind,
    listener: Listener<ValueChanged>,
}

impl Control {
    fn with_kind(label: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            id: ControlId::next(),
            label: label.into(),
            enabled: true,
            kind,
            listener: Listener::none(),
        }
    }

    /// Create a scrollable text area, optionally sized in character cells.
    pub fn text_area(label: impl Into<String>, text: impl Into<String>, size: Option<(u32, u32)>) -> Self {
        Self::with_kind(
            label,
            ControlKind::TextArea(TextAreaState {
                text: text.into(),
                size,
            }),
        )
    }

    /// Create a toggle.
    pub fn toggle(label: impl Into<String>, checked: bool) -> Self {
        Self::with_kind(label, ControlKind::Toggle(ToggleState { checked }))
    }

    /// Create a selector pre-set to `selected` (no selection when it is not an option).
    pub fn selector(label: impl Into<String>, options: Vec<String>, selected: Option<&str>) -> Self {
        let selected = selected.and_then(|s| options.iter().position(|o| o == s));
        Self::with_kind(label, ControlKind::Selector(SelectorState { options, selected }))
    }

    /// Create a stepper with a lower bound and no upper bound.
    pub fn stepper(label: impl Into<String>, value: i64, min: i64) -> Self {
        let state = StepperState {
            value: value.max(min),
            min,
            max: None,
            step: 1,
        };
        Self::with_kind(label, ControlKind::Stepper(state))
    }

    /// Create a 1x1 placeholder image.
    pub fn thumbnail(label: impl Into<String>) -> Self {
        Self::with_kind(label, ControlKind::Thumbnail(ThumbnailState::default()))
    }

    builder_field!(enabled, bool);

    /// Register the change listener.
    pub fn listener(mut self, listener: Listener<ValueChanged>) -> Self {
        self.listener = listener;
        self
    }

    /// Replace the change listener.
    pub fn set_listener(&mut self, listener: Listener<ValueChanged>) {
        self.listener = listener;
    }

    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Current value of the control.
    pub fn value(&self) -> FieldValue {
        match &self.kind {
            ControlKind::TextArea(s) => FieldValue::Text(s.text.clone()),
            ControlKind::Toggle(s) => FieldValue::Bool(s.checked),
            ControlKind::Selector(s) => s
                .selected_text()
                .map(FieldValue::text)
                .unwrap_or(FieldValue::None),
            ControlKind::Stepper(s) => FieldValue::Int(s.value),
            ControlKind::Thumbnail(_) => FieldValue::None,
        }
    }

    /// Programmatic assignment, used when syncing from a document.
    ///
    /// Works on disabled controls. Returns the change notification when the
    /// value actually changed.
    pub fn sync(&mut self, value: FieldValue) -> Result<Option<ValueChanged>, ControlError> {
        self.assign(value)
    }

    /// User edit. Rejected on disabled controls.
    pub fn edit(&mut self, value: FieldValue) -> Result<Option<ValueChanged>, ControlError> {
        if !self.enabled {
            return Err(ControlError::Disabled {
                label: self.label.clone(),
            });
        }
        self.assign(value)
    }

    /// Step an integer control up by its step size.
    pub fn increment(&mut self) -> Result<Option<ValueChanged>, ControlError> {
        self.step_by(1)
    }

    /// Step an integer control down by its step size, stopping at the minimum.
    pub fn decrement(&mut self) -> Result<Option<ValueChanged>, ControlError> {
        self.step_by(-1)
    }

    fn step_by(&mut self, direction: i64) -> Result<Option<ValueChanged>, ControlError> {
        let next = match &self.kind {
            ControlKind::Stepper(s) => s.clamp(s.value.saturating_add(direction * s.step)),
            other => {
                return Err(ControlError::kind_mismatch(
                    self.label.clone(),
                    other.value_kind(),
                    "int",
                ))
            }
        };
        self.edit(FieldValue::Int(next))
    }

    fn assign(&mut self, value: FieldValue) -> Result<Option<ValueChanged>, ControlError> {
        let mismatch = |label: &str, kind: &ControlKind, value: &FieldValue| {
            ControlError::kind_mismatch(label, kind.value_kind(), value.kind_name())
        };

        let changed = match (&mut self.kind, &value) {
            (ControlKind::TextArea(s), FieldValue::Text(text)) => {
                let changed = s.text != *text;
                s.text.clone_from(text);
                changed
            }
            (ControlKind::TextArea(s), FieldValue::None) => {
                let changed = !s.text.is_empty();
                s.text.clear();
                changed
            }
            (ControlKind::Toggle(s), FieldValue::Bool(checked)) => {
                let changed = s.checked != *checked;
                s.checked = *checked;
                changed
            }
            (ControlKind::Selector(s), FieldValue::Text(text)) => {
                let index = s.position(text).ok_or_else(|| ControlError::UnknownOption {
                    label: self.label.clone(),
                    value: text.clone(),
                })?;
                let changed = s.selected != Some(index);
                s.selected = Some(index);
                changed
            }
            (ControlKind::Selector(s), FieldValue::None) => s.selected.take().is_some(),
            (ControlKind::Stepper(s), FieldValue::Int(v)) => {
                if !s.accepts(*v) {
                    return Err(ControlError::OutOfRange {
                        label: self.label.clone(),
                        value: *v,
                        min: s.min,
                        max: s.max,
                    });
                }
                let changed = s.value != *v;
                s.value = *v;
                changed
            }
            (ControlKind::Thumbnail(_), FieldValue::None) => false,
            (kind, value) => return Err(mismatch(&self.label, &*kind, value)),
        };

        if !changed {
            return Ok(None);
        }

        let change = ValueChanged {
            control: self.id,
            label: self.label.clone(),
            value: self.value(),
        };
        log::trace!("Control '{}' changed to {:?}", self.label, change.value);
        self.listener.notify(&change);
        Ok(Some(change))
    }
}
