//! Template grammar.
//!
//! A template is a brace-delimited block of `key "value"` entries:
//!
//! ```text
//! {
//!   name "Experiment Type"
//!   type "enum"
//!   values "FRET", "FISH", "Other"
//!   default "Other"
//!   grid "2,1"
//! }
//! ```
//!
//! Entries are usually one per line but may share a line. Keys are matched
//! exactly and unknown keys are skipped. Repeated `values` entries extend
//! the list; any other repeated key keeps its last value. `default` is
//! coerced only after all entries are read, so it may appear before `type`.

use ome_form::FieldValue;

use super::error::TemplateError;
use super::field::{FieldDescriptor, FieldType, GridPosition, Span};

/// One `key "value"[, "value"...]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    values: Vec<String>,
    line: usize,
}

impl Entry {
    /// The value as a single string (multiple quoted parts are comma-joined).
    fn value(&self) -> String {
        self.values.join(",")
    }
}

/// Text between the first `{` and the last `}`.
fn block_body(definition: &str) -> Result<&str, TemplateError> {
    let open = definition.find('{');
    let close = definition.rfind('}');
    match (open, close) {
        (Some(open), Some(close)) if open < close => Ok(&definition[open + 1..close]),
        _ => Err(TemplateError::MissingDelimiters),
    }
}

fn tokenize(body: &str) -> Result<Vec<Entry>, TemplateError> {
    let mut entries = Vec::new();

    for (index, raw_line) in body.lines().enumerate() {
        let line = index + 1;
        let mut rest = raw_line.trim();
        if rest.starts_with('#') {
            continue;
        }

        while !rest.is_empty() {
            let key_end = rest
                .find(|c: char| c.is_whitespace() || c == '"')
                .unwrap_or(rest.len());
            let key = rest[..key_end].to_string();
            rest = rest[key_end..].trim_start();

            let mut values = Vec::new();
            while let Some(quoted) = rest.strip_prefix('"') {
                let close = quoted
                    .find('"')
                    .ok_or(TemplateError::Unterminated { line })?;
                values.push(quoted[..close].to_string());
                rest = quoted[close + 1..].trim_start();
                match rest.strip_prefix(',') {
                    Some(more) => rest = more.trim_start(),
                    None => break,
                }
            }

            if key.is_empty() || values.is_empty() {
                return Err(TemplateError::MissingValue { key, line });
            }
            entries.push(Entry { key, values, line });
        }
    }

    Ok(entries)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, TemplateError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(TemplateError::invalid_bool(key, value))
    }
}

fn parse_pair(key: &str, value: &str) -> Result<(i64, i64), TemplateError> {
    let (a, b) = value
        .split_once(',')
        .ok_or_else(|| TemplateError::invalid_number(key, value))?;
    let a = a.trim().parse().map_err(|_| TemplateError::invalid_number(key, value))?;
    let b = b.trim().parse().map_err(|_| TemplateError::invalid_number(key, value))?;
    Ok((a, b))
}

fn coerce_default(
    field_type: FieldType,
    raw: &str,
    enum_values: Option<&[String]>,
) -> Result<FieldValue, TemplateError> {
    match field_type {
        FieldType::Text => Ok(FieldValue::text(raw)),
        FieldType::Enum => {
            let known = enum_values.is_some_and(|values| values.iter().any(|v| v == raw));
            if known {
                Ok(FieldValue::text(raw))
            } else {
                Err(TemplateError::invalid_default(field_type, raw))
            }
        }
        FieldType::Boolean => parse_bool("default", raw)
            .map(FieldValue::Bool)
            .map_err(|_| TemplateError::invalid_default(field_type, raw)),
        FieldType::Integer => match raw.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(FieldValue::Int(v)),
            _ => Err(TemplateError::invalid_default(field_type, raw)),
        },
        FieldType::Thumbnail => {
            log::debug!("Ignoring default {:?} on thumbnail field", raw);
            Ok(FieldValue::None)
        }
    }
}

impl FieldDescriptor {
    /// Parse one template block into a field descriptor.
    pub fn parse(definition: &str) -> Result<FieldDescriptor, TemplateError> {
        let entries = tokenize(block_body(definition)?)?;

        let mut type_name: Option<String> = None;
        let mut name = String::new();
        let mut name_map = None;
        let mut value_map = None;
        let mut repeated = false;
        let mut grid = GridPosition::default();
        let mut span = Span::default();
        let mut values: Option<Vec<String>> = None;
        let mut raw_default: Option<String> = None;

        for entry in &entries {
            let value = entry.value();
            match entry.key.as_str() {
                "nameMap" => name_map = Some(value),
                "name" => name = value,
                "type" => type_name = Some(value),
                "valueMap" => value_map = Some(value),
                "repeated" => repeated = parse_bool(&entry.key, &value)?,
                "grid" => {
                    let (row, column) = parse_pair(&entry.key, &value)?;
                    grid = GridPosition {
                        row: i32::try_from(row).map_err(|_| TemplateError::invalid_number("grid", &value))?,
                        column: i32::try_from(column)
                            .map_err(|_| TemplateError::invalid_number("grid", &value))?,
                    };
                }
                "span" => {
                    let (width, height) = parse_pair(&entry.key, &value)?;
                    span = match (u32::try_from(width), u32::try_from(height)) {
                        (Ok(w), Ok(h)) if w >= 1 && h >= 1 => Span {
                            width: w,
                            height: h,
                        },
                        _ => return Err(TemplateError::InvalidSpan { width, height }),
                    };
                }
                "values" => {
                    values.get_or_insert_with(Vec::new).extend(
                        entry
                            .values
                            .iter()
                            .flat_map(|v| v.split(','))
                            .map(str::trim)
                            .filter(|v| !v.is_empty())
                            .map(str::to_string),
                    );
                }
                "default" => raw_default = Some(value),
                other => log::debug!("Ignoring unknown template key '{}' on line {}", other, entry.line),
            }
        }

        let field_type = FieldType::from_template_name(type_name.as_deref().ok_or(TemplateError::MissingType)?)?;

        let enum_values = match field_type {
            FieldType::Enum => Some(values.unwrap_or_default()),
            _ => {
                if values.is_some() {
                    log::debug!("Ignoring 'values' on {} field '{}'", field_type, name);
                }
                None
            }
        };

        let default_value = match raw_default {
            Some(raw) => coerce_default(field_type, &raw, enum_values.as_deref())?,
            None => field_type.implicit_default(),
        };

        let control = FieldDescriptor::build_control(
            field_type,
            &name,
            &default_value,
            enum_values.as_deref(),
            span,
        );

        log::trace!("Parsed {} field '{}'", field_type, name);

        Ok(FieldDescriptor {
            field_type,
            name,
            default_value,
            enum_values,
            name_map,
            value_map,
            grid,
            span,
            repeated,
            control,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ome_form::{ControlError, ControlKind};

    #[test]
    fn test_single_line_text_field() {
        let field = FieldDescriptor::parse(r#"{name "Pockel Cell" type "var" default "" grid "1,1"}"#).unwrap();
        assert_eq!(field.field_type(), FieldType::Text);
        assert_eq!(field.name(), "Pockel Cell");
        assert_eq!(field.default_value(), &FieldValue::text(""));
        assert_eq!(field.grid(), GridPosition { row: 1, column: 1 });
        assert_eq!(field.span(), Span::UNIT);
        assert!(field.enum_values().is_none());
        assert!(matches!(field.control().kind(), ControlKind::TextArea(t) if t.size.is_none()));
    }

    #[test]
    fn test_integer_field_and_stepper() {
        let mut field = FieldDescriptor::parse(r#"{name "Count" type "int" default "3"}"#).unwrap();
        assert_eq!(field.field_type(), FieldType::Integer);
        assert_eq!(field.default_value(), &FieldValue::Int(3));
        assert_eq!(field.control().value(), FieldValue::Int(3));

        let stepper = field.control_mut();
        assert!(stepper.edit(FieldValue::Int(0)).is_ok());
        assert!(stepper.edit(FieldValue::Int(1_000_000)).is_ok());
        assert!(matches!(
            stepper.edit(FieldValue::Int(-1)),
            Err(ControlError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_multi_line_block() {
        let def = r#"
        {
          nameMap "Experiment"
          name "Experiment Type"
          type "enum"
          values "FRET", "FISH", "Other"
          default "Other"
          valueMap "Experiment:Type"
          grid "2,3"
          span "2,1"
          repeated "false"
        }"#;
        let field = FieldDescriptor::parse(def).unwrap();
        assert_eq!(field.name(), "Experiment Type");
        assert_eq!(field.name_map(), Some("Experiment"));
        assert_eq!(field.value_map(), Some("Experiment:Type"));
        assert_eq!(
            field.enum_values(),
            Some(&["FRET".to_string(), "FISH".to_string(), "Other".to_string()][..])
        );
        assert_eq!(field.default_value(), &FieldValue::text("Other"));
        assert_eq!(field.grid(), GridPosition { row: 2, column: 3 });
        assert_eq!(field.span(), Span { width: 2, height: 1 });
        assert!(!field.is_repeated());
        assert_eq!(field.control().value(), FieldValue::text("Other"));
    }

    #[test]
    fn test_single_quoted_value_list() {
        let field = FieldDescriptor::parse(r#"{name "Wheel" type "enum" values "None, 1 TFI 650SP"}"#).unwrap();
        assert_eq!(
            field.enum_values(),
            Some(&["None".to_string(), "1 TFI 650SP".to_string()][..])
        );
        assert_eq!(field.default_value(), &FieldValue::None);
        assert_eq!(field.control().value(), FieldValue::None);
    }

    #[test]
    fn test_values_over_several_lines() {
        let def = "{\n name \"Wheel\"\n type \"enum\"\n values \"None\",\n values \"1 TFI 650SP\"\n}";
        let field = FieldDescriptor::parse(def).unwrap();
        assert_eq!(
            field.enum_values(),
            Some(&["None".to_string(), "1 TFI 650SP".to_string()][..])
        );
    }

    #[test]
    fn test_default_before_type() {
        let def = "{\n default \"true\"\n name \"Photodiode\"\n type \"bool\"\n}";
        let field = FieldDescriptor::parse(def).unwrap();
        assert_eq!(field.default_value(), &FieldValue::Bool(true));
        assert_eq!(field.control().value(), FieldValue::Bool(true));
    }

    #[test]
    fn test_implicit_defaults() {
        let b = FieldDescriptor::parse(r#"{name "b" type "bool"}"#).unwrap();
        assert_eq!(b.default_value(), &FieldValue::Bool(false));
        let i = FieldDescriptor::parse(r#"{name "i" type "int"}"#).unwrap();
        assert_eq!(i.default_value(), &FieldValue::Int(0));
        let t = FieldDescriptor::parse(r#"{name "t" type "var"}"#).unwrap();
        assert_eq!(t.default_value(), &FieldValue::None);
        assert_eq!(t.control().value(), FieldValue::text(""));
        let e = FieldDescriptor::parse(r#"{name "e" type "enum"}"#).unwrap();
        assert_eq!(e.enum_values(), Some(&[][..]));
    }

    #[test]
    fn test_text_area_sized_by_span() {
        let field = FieldDescriptor::parse(r#"{name "Description" type "var" span "4,3"}"#).unwrap();
        match field.control().kind() {
            ControlKind::TextArea(t) => assert_eq!(t.size, Some((4, 3))),
            other => panic!("expected text area, got {:?}", other),
        }
    }

    #[test]
    fn test_thumbnail_has_no_default() {
        let field = FieldDescriptor::parse(r#"{name "Preview" type "thumbnail" default "x"}"#).unwrap();
        assert_eq!(field.default_value(), &FieldValue::None);
        assert!(matches!(field.control().kind(), ControlKind::Thumbnail(_)));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let field = FieldDescriptor::parse(r#"{name "x" type "var" tooltip "hello"}"#).unwrap();
        assert_eq!(field.name(), "x");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            FieldDescriptor::parse(r#"name "x" type "var""#).unwrap_err(),
            TemplateError::MissingDelimiters
        );
        assert_eq!(
            FieldDescriptor::parse(r#"{name "x"}"#).unwrap_err(),
            TemplateError::MissingType
        );
        assert_eq!(
            FieldDescriptor::parse(r#"{name "x" type "float"}"#).unwrap_err(),
            TemplateError::UnknownType("float".into())
        );
        assert_eq!(
            FieldDescriptor::parse("{name \"x\n type \"var\"}").unwrap_err(),
            TemplateError::Unterminated { line: 1 }
        );
        assert!(matches!(
            FieldDescriptor::parse(r#"{name type "var"}"#).unwrap_err(),
            TemplateError::MissingValue { .. }
        ));
        assert!(matches!(
            FieldDescriptor::parse(r#"{name "n" type "int" default "three"}"#).unwrap_err(),
            TemplateError::InvalidDefault { field_type: FieldType::Integer, .. }
        ));
        assert!(matches!(
            FieldDescriptor::parse(r#"{name "n" type "int" default "-2"}"#).unwrap_err(),
            TemplateError::InvalidDefault { .. }
        ));
        assert!(matches!(
            FieldDescriptor::parse(r#"{name "n" type "enum" values "a,b" default "c"}"#).unwrap_err(),
            TemplateError::InvalidDefault { .. }
        ));
        assert!(matches!(
            FieldDescriptor::parse(r#"{name "n" type "var" grid "x,1"}"#).unwrap_err(),
            TemplateError::InvalidNumber { .. }
        ));
        assert!(matches!(
            FieldDescriptor::parse(r#"{name "n" type "var" span "0,1"}"#).unwrap_err(),
            TemplateError::InvalidSpan { width: 0, height: 1 }
        ));
        assert!(matches!(
            FieldDescriptor::parse(r#"{name "n" type "var" repeated "yes"}"#).unwrap_err(),
            TemplateError::InvalidBool { .. }
        ));
    }

    #[test]
    fn test_copy_is_independent() {
        let field = FieldDescriptor::parse(
            r#"{name "Type" type "enum" values "A", "B" default "A" grid "3,2" span "1,1" repeated "true"}"#,
        )
        .unwrap();
        let mut copy = field.copy();

        assert_eq!(copy.field_type(), field.field_type());
        assert_eq!(copy.name(), field.name());
        assert_eq!(copy.default_value(), field.default_value());
        assert_eq!(copy.enum_values(), field.enum_values());
        assert_eq!(copy.grid(), field.grid());
        assert_eq!(copy.span(), field.span());
        assert_eq!(copy.is_repeated(), field.is_repeated());

        assert_ne!(
            copy.enum_values().map(|v| v.as_ptr()),
            field.enum_values().map(|v| v.as_ptr()),
            "enum values must not share storage"
        );
        assert_ne!(copy.control().id(), field.control().id());

        copy.control_mut().edit(FieldValue::text("B")).unwrap();
        assert_eq!(copy.control().value(), FieldValue::text("B"));
        assert_eq!(field.control().value(), FieldValue::text("A"));
    }

    #[test]
    fn test_copy_resets_control_state() {
        let mut field = FieldDescriptor::parse(r#"{name "Gain" type "int" default "2"}"#).unwrap();
        field.control_mut().edit(FieldValue::Int(9)).unwrap();
        let copy = field.copy();
        assert_eq!(copy.control().value(), FieldValue::Int(2));
    }
}
