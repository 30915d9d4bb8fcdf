//! End-to-end flattening of both document forms through the public API

use pretty_assertions::assert_eq;
use treeflat::heartbeat::{ExamineeJoiner, HeartbeatFlattener, HeartbeatSchema};
use treeflat::pipeline::FlattenProcessor;
use treeflat::{markup_to_table, sessions_to_table, FlattenConfig, FlattenError, LookupPolicy, Value};

const ONE_SESSION: &str = r#"{
    "sessions": [{
        "examineeId": "E-100",
        "form": "A",
        "heartbeats": [{
            "interactions": [
                {"interactionType": "click", "value": "B", "time": 1000},
                {"interactionType": "keypress", "value": "x", "time": 1010}
            ],
            "events": [
                {"type": "navigation", "action": "next", "time": 1020, "itemId": "item-2",
                 "value": {"from": "item-1", "to": "item-2"}}
            ]
        }]
    }]
}"#;

const CUSTOMERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<c:Customers xmlns:c="urn:example:customers">
  <c:CustomerRecord>
    <c:CustomerResultData>
      <c:CustomerName>
        <c:First>Grace</c:First>
        <c:Last>Hopper</c:Last>
      </c:CustomerName>
    </c:CustomerResultData>
    <c:CustomerEventData>
      <c:TestSessionEvent>
        <c:SequenceNo>1</c:SequenceNo>
        <c:Description>Candidate starts the test</c:Description>
      </c:TestSessionEvent>
      <c:TestSessionEvent>
        <c:SequenceNo>884</c:SequenceNo>
        <c:Description>Candidate completes the test</c:Description>
      </c:TestSessionEvent>
    </c:CustomerEventData>
  </c:CustomerRecord>
</c:Customers>"#;

#[test]
fn session_with_interactions_and_event() {
    let processor = FlattenProcessor::new();
    let sessions = processor.parse_sessions(ONE_SESSION).unwrap();

    let flattener = HeartbeatFlattener::new(HeartbeatSchema::default()).unwrap();
    let rows = flattener.flatten(&sessions[0].heartbeats[0]);
    assert_eq!(rows.len(), 3);

    let joiner = ExamineeJoiner::new("session", flattener);
    let table = joiner.join(&sessions).unwrap();
    assert_eq!(table.len(), 3);
    for row in 0..3 {
        assert_eq!(table.get(row, "session"), Some(&Value::Int(0)));
        assert_eq!(table.get(row, "examineeId"), Some(&Value::from("E-100")));
        assert_eq!(table.get(row, "form"), Some(&Value::from("A")));
    }

    let kinds: Vec<&str> = table
        .column("kind")
        .unwrap()
        .into_iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(kinds, vec!["interaction", "interaction", "event"]);
    assert_eq!(table.get(2, "from"), Some(&Value::from("item-1")));
    assert_eq!(table.get(2, "interactionType"), Some(&Value::Null));
}

#[test]
fn session_table_matches_convenience_function() {
    let direct = sessions_to_table(ONE_SESSION).unwrap();
    let configured = FlattenProcessor::new().process_sessions(ONE_SESSION).unwrap();
    assert_eq!(direct, configured);
}

#[test]
fn event_with_only_from_value() {
    let json = r#"[{"id": 7, "heartbeats": [{"interactions": [], "events": [
        {"type": "navigation", "action": "leave", "time": 5, "itemId": "item-9",
         "value": {"from": "item-9"}}
    ]}]}]"#;

    let table = sessions_to_table(json).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0, "from"), Some(&Value::from("item-9")));
    assert_eq!(table.get(0, "to"), Some(&Value::Null));
}

#[test]
fn sessions_are_numbered_in_input_order() {
    let json = r#"[
        {"id": "a", "heartbeats": [{"interactions": [
            {"interactionType": "click", "value": 1, "time": 1}], "events": []}]},
        {"id": "b", "heartbeats": [{"interactions": [
            {"interactionType": "click", "value": 2, "time": 2}], "events": []}]}
    ]"#;

    let table = sessions_to_table(json).unwrap();
    assert_eq!(table.get(0, "session"), Some(&Value::Int(0)));
    assert_eq!(table.get(1, "session"), Some(&Value::Int(1)));
    assert_eq!(table.get(1, "id"), Some(&Value::from("b")));
}

#[test]
fn customer_events_under_one_customer() {
    let table = markup_to_table(CUSTOMERS).unwrap();

    assert_eq!(
        table.schema().columns(),
        &["FirstName", "LastName", "SequenceNo", "Description"]
    );
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "FirstName"), table.get(1, "FirstName"));
    assert_eq!(table.get(0, "LastName"), Some(&Value::from("Hopper")));
    assert_eq!(table.get(1, "LastName"), Some(&Value::from("Hopper")));
    assert_eq!(table.get(0, "SequenceNo"), Some(&Value::from("1")));
    assert_eq!(table.get(1, "SequenceNo"), Some(&Value::from("884")));
    assert_eq!(
        table.get(1, "Description"),
        Some(&Value::from("Candidate completes the test"))
    );
}

#[test]
fn markup_without_matching_records() {
    let table = markup_to_table("<Customers><Archive><Entry>1</Entry></Archive></Customers>").unwrap();
    assert!(table.is_empty());
    assert_eq!(table.schema().columns(), &["FirstName", "LastName"]);
}

#[test]
fn missing_name_block_depends_on_policy() {
    let xml = "<Customers>\
        <CustomerRecord><CustomerEventData><TestSessionEvent>\
        <SequenceNo>3</SequenceNo></TestSessionEvent></CustomerEventData></CustomerRecord>\
        </Customers>";

    let err = markup_to_table(xml).unwrap_err();
    assert!(matches!(err, FlattenError::StructuralLookup { .. }));

    let config = FlattenConfig {
        lookup_policy: LookupPolicy::Skip,
        ..FlattenConfig::default()
    };
    let table = FlattenProcessor::with_config(config)
        .unwrap()
        .process_markup(xml)
        .unwrap();
    assert!(table.is_empty());
}

#[test]
fn malformed_markup_is_rejected_before_flattening() {
    let err = markup_to_table("<Customers><CustomerRecord></Customers>").unwrap_err();
    assert!(matches!(err, FlattenError::Markup(_)));
}

#[test]
fn configured_depth_bound_is_enforced() {
    let config = FlattenConfig {
        max_depth: 3,
        ..FlattenConfig::default()
    };
    let processor = FlattenProcessor::with_config(config).unwrap();

    let err = processor.process_markup(CUSTOMERS).unwrap_err();
    assert!(matches!(err, FlattenError::DepthExceeded { max_depth: 3, .. }));
}

#[test]
fn very_deep_markup_reports_depth_error() {
    let xml = "<a>".repeat(100_000) + &"</a>".repeat(100_000);
    let err = markup_to_table(&xml).unwrap_err();
    assert!(matches!(err, FlattenError::DepthExceeded { max_depth: 1024, .. }));
}
