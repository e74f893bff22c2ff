//! Notebook form for the WiscScan acquisition software.
//!
//! Mirrors the login and experiment setup screens of the instrument. Plain
//! fields map onto attributes through their `valueMap`; the laser and
//! detector check boxes add or remove preset nodes under `CustomAttributes`.

use ome_form::FieldValue;

use crate::binder::{BindError, CreatePolicy, FieldBinding, LoadReport, Session, Target, WriteOutcome};
use crate::document::Document;
use crate::form::Form;
use crate::template::TemplateSet;

/// Experiment types offered by the instrument, in display order.
pub const EXPERIMENT_TYPES: [&str; 19] = [
    "Time-lapse",
    "4-D+",
    "PGI/Documentation",
    "Photoablation",
    "Fluorescense-Lifetime",
    "Spectral-Imaging",
    "FP",
    "FRET",
    "Screen",
    "Immunocytochemistry Immunofluorescence",
    "FISH",
    "Electrophysiology",
    "Ion-Imaging",
    "Colocalization",
    "FRAP",
    "Photoactivation",
    "Uncaging",
    "Optical-Trapping",
    "Other",
];

pub const TI_SAPPHIRE: &str = "Ti-Sapphire";
pub const PHOTODIODE: &str = "Photodiode Bio-Rad 1024TLD";
pub const PMT: &str = "PMT Hamamatsu H7422";
pub const GAIN: &str = "Gain";

const CUSTOM_ATTRIBUTES: &str = "CustomAttributes";
const DESCRIPTION: &str = "Description";

const LASER_PRESETS: &[(&str, &str)] = &[("Medium", "Ti-Sapphire"), ("Type", "Solid State")];
const PHOTODIODE_PRESETS: &[(&str, &str)] =
    &[("Manufacturer", "Bio-Rad"), ("Model", "1024LD"), ("Type", "Photodiode")];
const PMT_PRESETS: &[(&str, &str)] = &[("Manufacturer", "Hamamatsu"), ("Model", "H7422"), ("Type", "PMT")];

// Existing hardware is recognised by one attribute, whatever its other values.
const LASER_MATCH: &[(&str, &str)] = &[("Medium", "Ti-Sapphire")];
const PHOTODIODE_MATCH: &[(&str, &str)] = &[("Type", "Photodiode")];
const PMT_MATCH: &[(&str, &str)] = &[("Type", "PMT")];

/// Fields shown for completeness that the notebook cannot store.
const UNSUPPORTED: &[&str] = &[
    "OME Name",
    "Password",
    "Group",
    "Temperature",
    "Pockel Cell",
    "Tap Settings",
    "Wheel",
    "Holder",
    "Laser Power",
];

const FIELD_TEMPLATES: &str = r#"
# Login
{ name "First Name"  type "var" valueMap "Experimenter:FirstName" grid "1,1" }
{ name "Last Name"   type "var" valueMap "Experimenter:LastName"  grid "2,1" }
{ name "OME Name"    type "var" grid "3,1" }
{ name "Password"    type "var" grid "4,1" }
{ name "Email"       type "var" valueMap "Experimenter:Email"     grid "5,1" }
{ name "Group"       type "enum" values "None" default "None"     grid "6,1" }

# Experiment setup
{
  name "Experiment Type"
  type "enum"
  values "Time-lapse", "4-D+", "PGI/Documentation", "Photoablation",
  values "Fluorescense-Lifetime", "Spectral-Imaging", "FP", "FRET", "Screen",
  values "Immunocytochemistry Immunofluorescence", "FISH", "Electrophysiology",
  values "Ion-Imaging", "Colocalization", "FRAP", "Photoactivation", "Uncaging",
  values "Optical-Trapping", "Other"
  default "Other"
  valueMap "Experiment:Type"
  grid "7,1"
}
{ name "Project Name" type "var" valueMap "Project:Name" grid "8,1" }
{ name "Description"  type "var" valueMap "Experiment:Description" grid "9,1" span "1,4" }
{ name "Temperature"  type "var" grid "13,1" }
{ name "Pockel Cell"  type "var" default "" grid "14,1" }
{ name "Tap Settings" type "var" grid "15,1" }
{ name "Wheel"  type "enum" values "None", "1 TFI 650SP" default "None" grid "16,1" }
{ name "Holder" type "enum" values "None", "1 TFI 650SP" default "None" grid "17,1" }

# Hardware
{ name "Ti-Sapphire" type "bool" grid "18,1" }
{ name "Laser Power" type "var"  grid "18,2" }
{ name "Photodiode Bio-Rad 1024TLD" type "bool" grid "19,1" }
{ name "PMT Hamamatsu H7422" type "bool" grid "20,1" }
{ name "Gain" type "var" grid "20,2" }
"#;

/// The notebook form bound to one open document.
#[derive(Debug)]
pub struct Notebook {
    form: Form,
    session: Session,
    editable: bool,
}

fn bindings(form: &Form) -> Result<Vec<FieldBinding>, BindError> {
    let mut bindings = form
        .fields()
        .iter()
        .filter_map(|f| f.value_map().map(|map| FieldBinding::from_value_map(f.name(), map)))
        .map(|binding| {
            // The description may sit on a different Experiment than the type.
            binding.map(|b| {
                if b.field() == DESCRIPTION {
                    b.with_target_key("Experiment/Description")
                } else {
                    b
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let laser = Target::new("Laser").in_container(CUSTOM_ATTRIBUTES);
    let photodiode = Target::new("Detector")
        .with_key("photodiode")
        .in_container(CUSTOM_ATTRIBUTES);
    let pmt = Target::new("Detector").with_key("pmt").in_container(CUSTOM_ATTRIBUTES);

    bindings.push(FieldBinding::toggle(TI_SAPPHIRE, laser, LASER_PRESETS).matching(LASER_MATCH));
    bindings.push(FieldBinding::toggle(PHOTODIODE, photodiode, PHOTODIODE_PRESETS).matching(PHOTODIODE_MATCH));
    bindings.push(FieldBinding::toggle(PMT, pmt.clone(), PMT_PRESETS).matching(PMT_MATCH));
    bindings.push(FieldBinding::attribute(GAIN, pmt, "Gain").with_policy(CreatePolicy::RequireBound));
    Ok(bindings)
}

impl Notebook {
    /// Build the notebook on a document and load its values.
    pub fn open(document: Document, editable: bool) -> Result<Self, BindError> {
        let templates = TemplateSet::parse(FIELD_TEMPLATES);
        for rejected in templates.rejected() {
            log::error!("Built-in notebook template rejected: {}", rejected.error);
        }
        let form = Form::from_templates(templates);
        let session = Session::open(document).with_bindings(bindings(&form)?);

        let mut notebook = Self {
            form,
            session,
            editable,
        };
        notebook.reload()?;
        Ok(notebook)
    }

    /// Switch to another document and reload every field.
    pub fn replace_document(&mut self, document: Document) -> Result<LoadReport, BindError> {
        self.session.replace_document(document);
        self.reload()
    }

    fn reload(&mut self) -> Result<LoadReport, BindError> {
        let report = self.session.load(&mut self.form)?;
        self.apply_enabled()?;
        Ok(report)
    }

    fn pmt_on(&self) -> bool {
        self.form.value(PMT).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn apply_enabled(&mut self) -> Result<(), BindError> {
        let names: Vec<String> = self.form.fields().iter().map(|f| f.name().to_string()).collect();
        let pmt_on = self.pmt_on();
        for name in names {
            let enabled = if UNSUPPORTED.contains(&name.as_str()) {
                false
            } else if name == GAIN {
                self.editable && pmt_on
            } else {
                self.editable
            };
            self.form.set_enabled(&name, enabled)?;
        }
        Ok(())
    }

    /// Allow or forbid user edits of the supported fields.
    pub fn set_editable(&mut self, editable: bool) -> Result<(), BindError> {
        self.editable = editable;
        self.apply_enabled()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Apply a user edit and write it to the document.
    ///
    /// Turning the PMT off clears and disables its gain. A failed write puts
    /// the previous value back into the form.
    pub fn edit(&mut self, name: &str, value: FieldValue) -> Result<WriteOutcome, BindError> {
        let previous = self.form.value(name);
        let Some(change) = self.form.set(name, value)? else {
            return Ok(WriteOutcome::Unchanged);
        };
        let outcome = match self.session.write(&change) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(previous) = previous {
                    if let Err(restore) = self.form.sync(name, previous) {
                        log::warn!("Could not restore '{}' after a failed write: {}", name, restore);
                    }
                }
                return Err(e);
            }
        };

        if name == PMT {
            if !self.pmt_on() {
                self.form.sync(GAIN, FieldValue::None)?;
            }
            self.apply_enabled()?;
        }
        Ok(outcome)
    }

    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.form.value(name)
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn document(&self) -> &Document {
        self.session.tree()
    }

    pub fn into_document(self) -> Document {
        self.session.into_tree()
    }
}
