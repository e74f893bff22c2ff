//! Field descriptors produced from templates.

use std::fmt;

use ome_form::{Control, FieldValue};
use serde::{Deserialize, Serialize};

use super::error::TemplateError;

/// Type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text (`var`)
    Text,
    /// On/off (`bool`)
    Boolean,
    /// One of a fixed list of values (`enum`)
    Enum,
    /// Non-negative integer (`int`)
    Integer,
    /// Image placeholder (`thumbnail`)
    Thumbnail,
}

impl FieldType {
    /// Look up a type by its template spelling.
    pub fn from_template_name(name: &str) -> Result<Self, TemplateError> {
        match name {
            "var" => Ok(FieldType::Text),
            "bool" => Ok(FieldType::Boolean),
            "enum" => Ok(FieldType::Enum),
            "int" => Ok(FieldType::Integer),
            "thumbnail" => Ok(FieldType::Thumbnail),
            other => Err(TemplateError::UnknownType(other.to_string())),
        }
    }

    /// Spelling used in template text.
    pub fn template_name(&self) -> &'static str {
        match self {
            FieldType::Text => "var",
            FieldType::Boolean => "bool",
            FieldType::Enum => "enum",
            FieldType::Integer => "int",
            FieldType::Thumbnail => "thumbnail",
        }
    }

    /// Default used when the template declares none.
    pub fn implicit_default(&self) -> FieldValue {
        match self {
            FieldType::Boolean => FieldValue::Bool(false),
            FieldType::Integer => FieldValue::Int(0),
            FieldType::Text | FieldType::Enum | FieldType::Thumbnail => FieldValue::None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_name())
    }
}

/// Row sentinel for fields whose row is assigned at layout time.
pub const UNASSIGNED_ROW: i32 = -1;

/// Cell of a field in the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: i32,
    pub column: i32,
}

impl GridPosition {
    pub fn is_assigned(&self) -> bool {
        self.row != UNASSIGNED_ROW
    }
}

impl Default for GridPosition {
    fn default() -> Self {
        Self {
            row: UNASSIGNED_ROW,
            column: 1,
        }
    }
}

/// Size of a field in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub width: u32,
    pub height: u32,
}

impl Span {
    pub const UNIT: Span = Span {
        width: 1,
        height: 1,
    };

    pub fn is_unit(&self) -> bool {
        *self == Self::UNIT
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::UNIT
    }
}

/// One form field described by a template block.
///
/// Scalar properties are fixed once parsed. [`FieldDescriptor::copy`] is the
/// way to get an independent descriptor (with its own control) to change.
#[derive(Debug)]
pub struct FieldDescriptor {
    pub(super) field_type: FieldType,
    pub(super) name: String,
    pub(super) default_value: FieldValue,
    pub(super) enum_values: Option<Vec<String>>,
    pub(super) name_map: Option<String>,
    pub(super) value_map: Option<String>,
    pub(super) grid: GridPosition,
    pub(super) span: Span,
    pub(super) repeated: bool,
    pub(super) control: Control,
}

impl FieldDescriptor {
    /// Build the control for a field of the given shape.
    pub(super) fn build_control(
        field_type: FieldType,
        name: &str,
        default_value: &FieldValue,
        enum_values: Option<&[String]>,
        span: Span,
    ) -> Control {
        match field_type {
            FieldType::Text => {
                let size = (!span.is_unit()).then_some((span.width, span.height));
                Control::text_area(name, default_value.as_text().unwrap_or_default(), size)
            }
            FieldType::Boolean => Control::toggle(name, default_value.as_bool().unwrap_or(false)),
            FieldType::Enum => Control::selector(
                name,
                enum_values.map(<[String]>::to_vec).unwrap_or_default(),
                default_value.as_text(),
            ),
            FieldType::Integer => Control::stepper(name, default_value.as_int().unwrap_or(0), 0),
            FieldType::Thumbnail => Control::thumbnail(name),
        }
    }

    /// Deep copy with a freshly built control in its initial state.
    pub fn copy(&self) -> FieldDescriptor {
        let enum_values = self.enum_values.as_ref().map(|v| v.to_vec());
        let control = Self::build_control(
            self.field_type,
            &self.name,
            &self.default_value,
            enum_values.as_deref(),
            self.span,
        )
        .enabled(self.control.is_enabled());

        FieldDescriptor {
            field_type: self.field_type,
            name: self.name.clone(),
            default_value: self.default_value.clone(),
            enum_values,
            name_map: self.name_map.clone(),
            value_map: self.value_map.clone(),
            grid: self.grid,
            span: self.span,
            repeated: self.repeated,
            control,
        }
    }

    /// Copy placed on another grid row.
    pub fn copy_at_row(&self, row: i32) -> FieldDescriptor {
        let mut copy = self.copy();
        copy.grid.row = row;
        copy
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &FieldValue {
        &self.default_value
    }

    /// Allowed values; `Some` exactly for enum fields.
    pub fn enum_values(&self) -> Option<&[String]> {
        self.enum_values.as_deref()
    }

    pub fn name_map(&self) -> Option<&str> {
        self.name_map.as_deref()
    }

    pub fn value_map(&self) -> Option<&str> {
        self.value_map.as_deref()
    }

    pub fn grid(&self) -> GridPosition {
        self.grid
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut Control {
        &mut self.control
    }
}
