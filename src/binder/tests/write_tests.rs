//! Tests for writing control changes into the document.

use ome_form::{FieldValue, ValueChanged};

use crate::binder::{BindError, CreatePolicy, FieldBinding, Session, Target, WriteOutcome};
use crate::document::{AttributedTree, Document};
use crate::form::Form;
use crate::template::TemplateSet;

fn project_form() -> Form {
    Form::from_templates(TemplateSet::parse(
        r#"
        {name "Project Name" type "var" valueMap "Project:Name"}
        {name "Description" type "var" valueMap "Project:Description"}
        {name "First Name" type "var" valueMap "Experimenter:FirstName"}
        "#,
    ))
}

fn bindings(form: &Form) -> Vec<FieldBinding> {
    form.fields()
        .iter()
        .filter_map(|f| FieldBinding::from_value_map(f.name(), f.value_map()?).ok())
        .collect()
}

#[test]
fn test_write_creates_missing_project() {
    let doc = Document::parse("<OME/>").unwrap();
    let mut form = project_form();
    let mut session = Session::open(doc).with_bindings(bindings(&form));

    let change = form
        .set("Project Name", FieldValue::text("Cells"))
        .unwrap()
        .expect("value changed");
    let outcome = session.write(&change).unwrap();

    let tree = session.tree();
    let projects = tree.nodes_by_tag("Project");
    assert_eq!(projects.len(), 1, "exactly one Project node is created");
    assert_eq!(outcome, WriteOutcome::Applied { node: projects[0] });
    assert_eq!(tree.attribute(projects[0], "Name"), Some("Cells"));
    assert_eq!(tree.parent(projects[0]), Some(tree.root()));
}

#[test]
fn test_second_field_reuses_bound_node() {
    let doc = Document::parse("<OME/>").unwrap();
    let mut form = project_form();
    let mut session = Session::open(doc).with_bindings(bindings(&form));

    let name = form.set("Project Name", FieldValue::text("Cells")).unwrap().unwrap();
    session.write(&name).unwrap();
    let desc = form
        .set("Description", FieldValue::text("HeLa, day 3"))
        .unwrap()
        .unwrap();
    session.write(&desc).unwrap();

    let projects = session.tree().nodes_by_tag("Project");
    assert_eq!(projects.len(), 1);
    assert_eq!(
        session.tree().attribute(projects[0], "Description"),
        Some("HeLa, day 3")
    );
}

#[test]
fn test_write_touches_only_the_written_field() {
    let xml = r#"<OME><Project Name="Old" Description="keep"/><Experimenter FirstName="Ada"/></OME>"#;
    let mut form = project_form();
    let mut session = Session::open(Document::parse(xml).unwrap()).with_bindings(bindings(&form));
    session.load(&mut form).unwrap();

    // another field edited in the form but not written yet
    form.set("First Name", FieldValue::text("Grace")).unwrap();

    let change = form.set("Project Name", FieldValue::text("New")).unwrap().unwrap();
    session.write(&change).unwrap();

    let tree = session.tree();
    let project = tree.nodes_by_tag("Project")[0];
    let experimenter = tree.nodes_by_tag("Experimenter")[0];
    assert_eq!(tree.attribute(project, "Name"), Some("New"));
    assert_eq!(tree.attribute(project, "Description"), Some("keep"));
    assert_eq!(tree.attribute(experimenter, "FirstName"), Some("Ada"));
    assert_eq!(
        form.value("First Name"),
        Some(FieldValue::text("Grace")),
        "writing does not reload the form"
    );
}

#[test]
fn test_write_same_value_is_unchanged() {
    let xml = r#"<OME><Project Name="Cells"/></OME>"#;
    let mut session = Session::open(Document::parse(xml).unwrap())
        .with_bindings([FieldBinding::attribute("Project Name", Target::new("Project"), "Name")]);

    let change = ValueChanged {
        control: ome_form::Control::toggle("unused", false).id(),
        label: "Project Name".into(),
        value: FieldValue::text("Cells"),
    };
    assert_eq!(session.write(&change).unwrap(), WriteOutcome::Unchanged);
}

#[test]
fn test_unbound_field() {
    let mut form = project_form();
    let mut session = Session::open(Document::parse("<OME/>").unwrap());
    let change = form.set("Project Name", FieldValue::text("x")).unwrap().unwrap();
    assert_eq!(session.write(&change).unwrap(), WriteOutcome::Unbound);
    assert!(session.tree().nodes_by_tag("Project").is_empty());
}

#[test]
fn test_require_bound_without_node() {
    let form_text = r#"{name "Gain" type "var"}"#;
    let mut form = Form::from_templates(TemplateSet::parse(form_text));
    let binding = FieldBinding::attribute("Gain", Target::new("Detector").with_key("pmt"), "Gain")
        .with_policy(CreatePolicy::RequireBound);
    let mut session = Session::open(Document::parse(r#"<OME><Detector Type="Photodiode"/></OME>"#).unwrap())
        .with_bindings([binding]);

    let change = form.set("Gain", FieldValue::text("5")).unwrap().unwrap();
    let err = session.write(&change).unwrap_err();
    assert!(matches!(err, BindError::RequireBound { ref tag, .. } if tag == "Detector"));

    let detector = session.tree().nodes_by_tag("Detector")[0];
    assert!(
        !session.tree().has_attribute(detector, "Gain"),
        "an unrelated Detector is never written"
    );
}

#[test]
fn test_replace_document_clears_bindings() {
    let mut form = project_form();
    let mut session = Session::open(Document::parse("<OME/>").unwrap()).with_bindings(bindings(&form));

    let change = form.set("Project Name", FieldValue::text("Cells")).unwrap().unwrap();
    session.write(&change).unwrap();
    assert!(!session.state().is_empty());

    let old = session.replace_document(Document::parse("<OME><Project/></OME>").unwrap());
    assert_eq!(old.nodes_by_tag("Project").len(), 1);
    assert!(session.state().is_empty());
    assert_eq!(session.bound_node("Project Name"), None);
}
