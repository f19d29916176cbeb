//! Tests for schema types.

use super::*;
use careform_core::Scalar;

const STAGE_TREE_YAML: &str = r#"
apiVersion: v1
kind: DecisionTree
metadata:
  id: hiv-care-stage
  name: HIV care stage
options:
  basePath: encounter
  tree:
    root: start
    nodes:
      start:
        value: unknown
        branches:
          - patientField: gender
            equalTo: female
            node: pregnancy
          - dataField: cd4
            lessThanOrEqualTo: 200
            value: stage-4
      pregnancy:
        value: stage-1
        branches:
          - dataField: pregnant
            equalTo: true
            value: pmtct
"#;

const REFILL_SCHEDULER_YAML: &str = r#"
apiVersion: v1
kind: EventScheduler
metadata:
  id: arv-refill
  name: ARV refill reminder
  enabled: false
options:
  group: arv-refill
  datetimeField: arvDispensedAt
  trigger:
    kind: greaterThan
    field: arvQuantity
    value: 0
  events:
    - offsetDays: 28
      documentType: ARVEncounter
      type: refill-due
      name: Refill due
    - offsetDays: 35
      offsetMinutes: 30
      documentType: ARVEncounter
      type: refill-overdue
"#;

fn parse(yaml: &str) -> ControlDocument {
    let envelope: ControlEnvelope = serde_yaml::from_str(yaml).unwrap();
    envelope.parse_full().unwrap()
}

#[test]
fn parse_decision_tree_document() {
    let doc = parse(STAGE_TREE_YAML);
    assert_eq!(doc.kind(), ControlKind::DecisionTree);
    assert_eq!(doc.id(), "hiv-care-stage");
    assert!(doc.metadata.enabled);

    let options = doc.as_decision_tree().unwrap();
    assert_eq!(options.base_path.as_deref(), Some("encounter"));
    assert_eq!(options.tree.root, "start");

    let start = &options.tree.nodes["start"];
    assert_eq!(start.value.as_deref(), Some("unknown"));
    assert_eq!(
        start.branches[0],
        DecisionBranch::to_node(
            FieldRef::Patient("gender".into()),
            Condition::EqualTo(Scalar::String("female".into())),
            "pregnancy",
        )
    );
    assert_eq!(
        start.branches[1],
        DecisionBranch::to_value(
            FieldRef::Data("cd4".into()),
            Condition::LessThanOrEqualTo(200.0),
            "stage-4",
        )
    );
    assert_eq!(
        options.tree.nodes["pregnancy"].branches[0].condition,
        Condition::EqualTo(Scalar::Bool(true))
    );
}

#[test]
fn parse_event_scheduler_document() {
    let doc = parse(REFILL_SCHEDULER_YAML);
    assert_eq!(doc.kind(), ControlKind::EventScheduler);
    assert!(!doc.metadata.enabled);

    let options = doc.as_event_scheduler().unwrap();
    assert_eq!(options.group, "arv-refill");
    assert_eq!(options.events_field, "events");
    assert!(!options.schedule_now);
    assert_eq!(
        options.trigger,
        Trigger::GreaterThan {
            field: "arvQuantity".into(),
            value: 0.0
        }
    );
    assert_eq!(options.events.len(), 2);
    assert_eq!(options.events[0].offset_days, Some(28));
    assert_eq!(options.events[0].offset_minutes, None);
    assert_eq!(options.events[1].offset_minutes, Some(30));
    assert_eq!(options.events[1].event_type, "refill-overdue");
}

#[test]
fn trigger_defaults_to_always() {
    let options: EventSchedulerOptions = serde_json::from_value(serde_json::json!({
        "group": "G",
        "datetimeField": "visitDate",
        "events": []
    }))
    .unwrap();
    assert_eq!(options.trigger, Trigger::Always);
}

#[test]
fn branch_requires_single_field_reference() {
    let both = serde_json::json!({
        "dataField": "a", "patientField": "b", "equalTo": 1, "node": "x"
    });
    let err = serde_json::from_value::<DecisionBranch>(both).unwrap_err();
    assert!(err.to_string().contains("only one of `dataField`"));

    let neither = serde_json::json!({ "equalTo": 1, "node": "x" });
    assert!(serde_json::from_value::<DecisionBranch>(neither).is_err());
}

#[test]
fn branch_requires_single_condition() {
    let two = serde_json::json!({
        "dataField": "a", "equalTo": 1, "greaterThan": 0, "value": "x"
    });
    let err = serde_json::from_value::<DecisionBranch>(two).unwrap_err();
    assert!(err.to_string().contains("exactly one of `equalTo`"));
}

#[test]
fn branch_rejects_unknown_keys() {
    let unknown = serde_json::json!({ "dataField": "a", "equalTo": 1, "node": "x", "lessThan": 3 });
    assert!(serde_json::from_value::<DecisionBranch>(unknown).is_err());
}

#[test]
fn branch_keeps_node_and_value_for_validator() {
    let branch: DecisionBranch = serde_json::from_value(serde_json::json!({
        "dataField": "a", "equalTo": "yes", "node": "next", "value": "done"
    }))
    .unwrap();
    assert_eq!(branch.node.as_deref(), Some("next"));
    assert_eq!(branch.value.as_deref(), Some("done"));
}

#[test]
fn branch_serializes_flat() {
    let branch = DecisionBranch::to_node(
        FieldRef::Data("weight".into()),
        Condition::GreaterThan(80.0),
        "heavy",
    );
    assert_eq!(
        serde_json::to_value(&branch).unwrap(),
        serde_json::json!({ "dataField": "weight", "greaterThan": 80.0, "node": "heavy" })
    );
}

#[test]
fn unknown_kind_is_rejected() {
    let yaml = STAGE_TREE_YAML.replace("kind: DecisionTree", "kind: Questionnaire");
    let envelope: ControlEnvelope = serde_yaml::from_str(&yaml).unwrap();
    let err = envelope.parse_full().unwrap_err();
    assert!(err.contains("unknown control kind"));
}

#[test]
fn document_survives_yaml_export() {
    let doc = parse(REFILL_SCHEDULER_YAML);
    let yaml = doc.to_yaml().unwrap();
    assert_eq!(parse(&yaml), doc);
}
