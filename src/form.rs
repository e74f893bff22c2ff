//! A form built from a template set.

use ome_form::{Control, ControlError, FieldValue, ValueChanged};
use thiserror::Error;

use crate::template::{FieldDescriptor, Span, TemplateSet, UNASSIGNED_ROW};

/// Errors from form operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("No field named '{0}'")]
    UnknownField(String),

    #[error("Field '{0}' is not repeatable")]
    NotRepeated(String),

    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Grid cell assigned to a field for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub name: String,
    pub row: i32,
    pub column: i32,
    pub span: Span,
}

/// Fields of a template set, in declaration order.
#[derive(Debug, Default)]
pub struct Form {
    fields: Vec<FieldDescriptor>,
}

impl Form {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn from_templates(set: TemplateSet) -> Self {
        Self::new(set.into_fields())
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut FieldDescriptor, FormError> {
        self.fields
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Every instance of a field, the original first.
    pub fn instances(&self, name: &str) -> Vec<&FieldDescriptor> {
        self.fields.iter().filter(|f| f.name() == name).collect()
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.field(name).map(FieldDescriptor::control)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.field_mut(name).ok().map(FieldDescriptor::control_mut)
    }

    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.control(name).map(Control::value)
    }

    /// Apply a user edit to a field's control.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<Option<ValueChanged>, FormError> {
        Ok(self.field_mut(name)?.control_mut().edit(value)?)
    }

    /// Assign a value programmatically (disabled controls accept it too).
    pub fn sync(&mut self, name: &str, value: FieldValue) -> Result<Option<ValueChanged>, FormError> {
        Ok(self.field_mut(name)?.control_mut().sync(value)?)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), FormError> {
        self.field_mut(name)?.control_mut().set_enabled(enabled);
        Ok(())
    }

    /// Add another instance of a repeated field below its last instance.
    pub fn repeat(&mut self, name: &str) -> Result<&FieldDescriptor, FormError> {
        let last = self
            .fields
            .iter()
            .rposition(|f| f.name() == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;

        let source = &self.fields[last];
        if !source.is_repeated() {
            return Err(FormError::NotRepeated(name.to_string()));
        }
        let row = if source.grid().is_assigned() {
            let height = i32::try_from(source.span().height).unwrap_or(i32::MAX);
            source.grid().row.saturating_add(height)
        } else {
            UNASSIGNED_ROW
        };
        let copy = source.copy_at_row(row);
        log::debug!("Repeated field '{}' at row {}", name, row);

        self.fields.insert(last + 1, copy);
        Ok(&self.fields[last + 1])
    }

    /// Grid cells for every field.
    ///
    /// Explicit rows are kept. Fields without a row get one row each after
    /// the last explicit row, in declaration order. Rows stop at `i32::MAX`.
    pub fn placements(&self) -> Vec<Placement> {
        let mut next_row = self
            .fields
            .iter()
            .filter(|f| f.grid().is_assigned())
            .map(|f| f.grid().row)
            .max()
            .unwrap_or(0)
            .saturating_add(1);

        self.fields
            .iter()
            .map(|f| {
                let grid = f.grid();
                let row = if grid.is_assigned() {
                    grid.row
                } else {
                    let row = next_row;
                    next_row = next_row.saturating_add(1);
                    row
                };
                Placement {
                    name: f.name().to_string(),
                    row,
                    column: grid.column,
                    span: f.span(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Form {
        Form::from_templates(TemplateSet::parse(
            r#"
            {name "First Name" type "var" grid "1,1"}
            {name "Last Name" type "var" grid "1,2"}
            {name "Laser Power" type "int" repeated "true" grid "3,1"}
            {name "Notes" type "var"}
            {name "PMT" type "bool"}
            "#,
        ))
    }

    #[test]
    fn test_set_and_value() {
        let mut form = form();
        let change = form.set("First Name", FieldValue::text("Ada")).unwrap();
        assert_eq!(change.map(|c| c.label), Some("First Name".to_string()));
        assert_eq!(form.value("First Name"), Some(FieldValue::text("Ada")));
        assert_eq!(form.set("First Name", FieldValue::text("Ada")).unwrap(), None);

        assert_eq!(
            form.set("Nope", FieldValue::None).unwrap_err(),
            FormError::UnknownField("Nope".into())
        );
        assert!(matches!(
            form.set("Laser Power", FieldValue::Int(-3)),
            Err(FormError::Control(ControlError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_disabled_field() {
        let mut form = form();
        form.set_enabled("PMT", false).unwrap();
        assert!(matches!(
            form.set("PMT", FieldValue::Bool(true)),
            Err(FormError::Control(ControlError::Disabled { .. }))
        ));
        assert!(form.sync("PMT", FieldValue::Bool(true)).unwrap().is_some());
    }

    #[test]
    fn test_placements_append_unassigned_rows() {
        let form = form();
        let cells: Vec<_> = form
            .placements()
            .into_iter()
            .map(|p| (p.name, p.row, p.column))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("First Name".to_string(), 1, 1),
                ("Last Name".to_string(), 1, 2),
                ("Laser Power".to_string(), 3, 1),
                ("Notes".to_string(), 4, 1),
                ("PMT".to_string(), 5, 1),
            ]
        );
    }

    #[test]
    fn test_repeat_field() {
        let mut form = form();
        form.set("Laser Power", FieldValue::Int(7)).unwrap();

        let copy = form.repeat("Laser Power").unwrap();
        assert_eq!(copy.grid().row, 4);
        assert_eq!(copy.control().value(), FieldValue::Int(0));

        let instances = form.instances("Laser Power");
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].control().value(), FieldValue::Int(7));
        assert_ne!(instances[0].control().id(), instances[1].control().id());

        assert_eq!(form.repeat("PMT").unwrap_err(), FormError::NotRepeated("PMT".into()));
    }

    #[test]
    fn test_rows_near_limit_do_not_overflow() {
        let mut form = Form::from_templates(TemplateSet::parse(
            r#"
            {name "Edge" type "var" grid "2147483647,1" repeated "true" span "1,3"}
            {name "Loose" type "var"}
            {name "Other" type "var"}
            "#,
        ));
        let rows: Vec<i32> = form.placements().iter().map(|p| p.row).collect();
        assert_eq!(rows, vec![i32::MAX, i32::MAX, i32::MAX]);

        let copy = form.repeat("Edge").unwrap();
        assert_eq!(copy.grid().row, i32::MAX);
    }
}
