//! Tests for pushing document values into the form.

use ome_form::FieldValue;

use crate::binder::{FieldBinding, Session, Target, WriteOutcome};
use crate::document::{AttributedTree, Document};
use crate::form::Form;
use crate::template::TemplateSet;

const TEMPLATES: &str = r#"
{name "First Name" type "var" valueMap "Experimenter:FirstName"}
{name "Last Name" type "var" valueMap "Experimenter:LastName"}
{name "Experiment Type" type "enum" values "FRET", "FISH", "Other" default "Other" valueMap "Experiment:Type"}
{name "Frames" type "int" valueMap "Experiment:Frames"}
{name "Laser" type "bool" default "false"}
"#;

const DOCUMENT: &str = r#"<OME>
  <Experimenter LastName="Lovelace"/>
  <Experimenter FirstName="Ada" LastName="Byron"/>
  <Experiment Type="FRET" Frames="12"/>
  <CustomAttributes>
    <Laser Medium="Ti-Sapphire" Type="Solid State"/>
  </CustomAttributes>
</OME>"#;

fn session(xml: &str) -> (Session, Form) {
    let form = Form::from_templates(TemplateSet::parse(TEMPLATES));
    let mut bindings: Vec<_> = form
        .fields()
        .iter()
        .filter_map(|f| FieldBinding::from_value_map(f.name(), f.value_map()?).ok())
        .collect();
    bindings.push(FieldBinding::toggle(
        "Laser",
        Target::new("Laser").in_container("CustomAttributes"),
        &[("Medium", "Ti-Sapphire"), ("Type", "Solid State")],
    ));
    (Session::open(Document::parse(xml).unwrap()).with_bindings(bindings), form)
}

#[test]
fn test_load_pushes_document_values() {
    let (mut session, mut form) = session(DOCUMENT);
    let report = session.load(&mut form).unwrap();

    assert_eq!(report.values_pushed, 5);
    assert_eq!(form.value("First Name"), Some(FieldValue::text("Ada")));
    assert_eq!(
        form.value("Last Name"),
        Some(FieldValue::text("Byron")),
        "both fields share the Experimenter bound by the first match"
    );
    assert_eq!(form.value("Experiment Type"), Some(FieldValue::text("FRET")));
    assert_eq!(form.value("Frames"), Some(FieldValue::Int(12)));
    assert_eq!(form.value("Laser"), Some(FieldValue::Bool(true)));
}

#[test]
fn test_load_never_writes() {
    let (mut session, mut form) = session(DOCUMENT);
    let before = session.tree().to_xml().unwrap();

    let report = session.load(&mut form).unwrap();
    assert_eq!(report.writes_applied, 0);
    assert_eq!(
        report.suppressed, 5,
        "every pushed change is handed back and suppressed"
    );
    assert!(!session.is_loading(), "guard released after load");
    assert_eq!(session.tree().to_xml().unwrap(), before);
}

#[test]
fn test_load_empty_document_uses_defaults() {
    let (mut session, mut form) = session("<OME/>");
    form.set("First Name", FieldValue::text("stale")).unwrap();

    session.load(&mut form).unwrap();
    assert_eq!(form.value("First Name"), Some(FieldValue::text("")));
    assert_eq!(form.value("Experiment Type"), Some(FieldValue::text("Other")));
    assert_eq!(form.value("Frames"), Some(FieldValue::Int(0)));
    assert_eq!(form.value("Laser"), Some(FieldValue::Bool(false)));
    assert_eq!(session.tree().node_count(), 1, "load never creates nodes");
}

#[test]
fn test_unfit_values_fall_back_to_default() {
    let xml = r#"<OME><Experiment Type="Tea Party" Frames="-3"/></OME>"#;
    let (mut session, mut form) = session(xml);
    session.load(&mut form).unwrap();
    assert_eq!(form.value("Experiment Type"), Some(FieldValue::text("Other")));
    assert_eq!(form.value("Frames"), Some(FieldValue::Int(0)));
}

#[test]
fn test_edits_after_load_are_written() {
    let (mut session, mut form) = session(DOCUMENT);
    session.load(&mut form).unwrap();

    let change = form.set("First Name", FieldValue::text("Augusta")).unwrap().unwrap();
    let outcome = session.write(&change).unwrap();

    let experimenters = session.tree().nodes_by_tag("Experimenter");
    assert_eq!(outcome, WriteOutcome::Applied { node: experimenters[1] });
    assert_eq!(
        session.tree().attribute(experimenters[1], "FirstName"),
        Some("Augusta")
    );
    assert_eq!(session.tree().attribute(experimenters[0], "FirstName"), None);
}

#[test]
fn test_reload_is_stable() {
    let (mut session, mut form) = session(DOCUMENT);
    session.load(&mut form).unwrap();
    let bound = session.bound_node("First Name");

    let report = session.load(&mut form).unwrap();
    assert_eq!(report.suppressed, 0, "nothing changed on the second load");
    assert_eq!(session.bound_node("First Name"), bound);
}
