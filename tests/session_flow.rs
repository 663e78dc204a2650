use std::cell::RefCell;

use rule_builder::{
    field, BuilderConfig, BuilderSession, ComplexityLevel, Edit, EvaluationRequest,
    EvaluationResponse, EvaluationSink, GroupType, NodePath, Operator, RuleError, SampleDataSource,
    SaveSink, SinkError, ValueSpec,
};
use serde_json::{json, Value};

/// In-memory rule store.
#[derive(Default)]
struct MemoryStore {
    rules: Vec<Value>,
}

impl SaveSink for MemoryStore {
    fn save(&mut self, envelope: &Value) -> Result<(), SinkError> {
        self.rules.push(envelope.clone());
        Ok(())
    }
}

/// Evaluation service that fails a configurable number of times before
/// answering, and records every request it sees.
struct FlakyService {
    failures_left: RefCell<usize>,
    seen: RefCell<Vec<EvaluationRequest>>,
}

impl FlakyService {
    fn new(failures: usize) -> Self {
        Self {
            failures_left: RefCell::new(failures),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl EvaluationSink for FlakyService {
    fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse, SinkError> {
        self.seen.borrow_mut().push(request.clone());
        let mut left = self.failures_left.borrow_mut();
        if *left > 0 {
            *left -= 1;
            return Err(SinkError::new("connection refused"));
        }
        let amount = request.data["amount"].as_f64().unwrap_or_default();
        Ok(EvaluationResponse {
            success: true,
            result: amount > 1000.0,
            error: None,
        })
    }
}

/// Service that always answers `success: false`.
struct Refusing;

impl EvaluationSink for Refusing {
    fn evaluate(&self, _: &EvaluationRequest) -> Result<EvaluationResponse, SinkError> {
        Ok(EvaluationResponse {
            success: false,
            result: false,
            error: Some("unknown field $.amount".to_owned()),
        })
    }
}

struct Sample;

impl SampleDataSource for Sample {
    fn sample(&self) -> Result<Value, SinkError> {
        Ok(json!({ "amount": 5000, "customer": { "country": "DE" } }))
    }
}

fn build_rule(session: &mut BuilderSession) {
    session.set_name("Large transfer");
    session.set_description("Flags transfers above the reporting limit");
    session.add_condition(NodePath::root()).unwrap();
    session
        .apply(&Edit::UpdateChild {
            group: NodePath::root(),
            index: 0,
            node: field("$.amount").gt("1000").into(),
        })
        .unwrap();
    session.apply(&Edit::AddGroup { group: NodePath::root() }).unwrap();
    let nested = NodePath::from(vec![1]);
    session
        .apply(&Edit::Retype {
            group: nested.clone(),
            group_type: GroupType::Or,
            name: Some("Risky destination".to_owned()),
        })
        .unwrap();
    for country in ["KP", "IR"] {
        session
            .apply(&Edit::AddCondition {
                group: nested.clone(),
                condition: field("$.customer.country").eq(country),
            })
            .unwrap();
    }
}

#[test]
fn build_preview_and_save() {
    let mut session = BuilderSession::new();
    build_rule(&mut session);

    assert!(session.validation().is_valid());
    let metrics = session.metrics();
    assert_eq!(metrics.total_conditions, 3);
    assert_eq!(metrics.group_count, 2);
    assert_eq!(session.complexity(), ComplexityLevel::Medium);

    let preview = session.preview().unwrap().to_owned();
    assert!(preview.contains("Risky destination"));

    let mut store = MemoryStore::default();
    session.save(&mut store).unwrap();
    assert_eq!(store.rules.len(), 1);
    let saved = &store.rules[0];
    assert_eq!(saved["name"], "Large transfer");
    assert_eq!(saved["businessLogic"]["conditions"][1]["type"], "OR");
    assert_eq!(
        saved["businessLogic"]["conditions"][1]["conditions"][1]["value_prop"]["value"],
        "IR"
    );
    assert!(session.tree().is_blank());
}

#[test]
fn saved_rule_imports_back() {
    let mut session = BuilderSession::new();
    build_rule(&mut session);
    let original = session.tree().clone();

    let mut store = MemoryStore::default();
    session.save(&mut store).unwrap();

    let text = serde_json::to_string(&store.rules[0]).unwrap();
    session.import(&text).unwrap();
    assert_eq!(session.tree(), &original);
    assert!(session.undo());
    assert!(session.tree().is_blank());
}

#[test]
fn incomplete_rule_is_never_saved() {
    let mut session = BuilderSession::new();
    session.add_condition(NodePath::root()).unwrap();
    session.apply(&Edit::AddGroup { group: NodePath::root() }).unwrap();

    let mut store = MemoryStore::default();
    let err = session.save(&mut store).unwrap_err();
    let RuleError::Validation(failed) = err else {
        panic!("expected validation failure");
    };
    let messages: Vec<String> = failed.issues.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "Rule name is required",
            "Incomplete condition found",
            "Empty AND group found",
        ]
    );
    assert_eq!(failed.issues[2].path(), NodePath::from(vec![1]));
    assert!(store.rules.is_empty());
    assert!(session.show_validation());
    assert_eq!(session.tree().root().len(), 2);
}

#[test]
fn evaluation_retry_keeps_rule_and_data() {
    let mut session = BuilderSession::new();
    build_rule(&mut session);
    session.load_sample(&Sample).unwrap();

    let service = FlakyService::new(1);
    let err = session.evaluate(&service).unwrap_err();
    assert!(matches!(err, RuleError::Evaluation(ref e) if e.reason == "connection refused"));
    assert_eq!(session.tree().name, "Large transfer");
    assert_eq!(session.test_data().unwrap()["amount"], 5000);

    assert!(session.evaluate(&service).unwrap());

    let seen = service.seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1].business_logic["type"], "AND");
    assert!(seen[1].business_logic.get("name").is_none());
}

#[test]
fn evaluation_failure_reports_service_error() {
    let mut session = BuilderSession::new();
    build_rule(&mut session);
    session.set_test_data_text(r#"{"amount": 10}"#).unwrap();
    let err = session.evaluate(&Refusing).unwrap_err();
    assert_eq!(
        err.to_string(),
        "evaluation unavailable: unknown field $.amount"
    );
}

#[test]
fn evaluation_blocks_on_invalid_rule() {
    let mut session = BuilderSession::new();
    let service = FlakyService::new(0);
    assert!(matches!(
        session.evaluate(&service),
        Err(RuleError::Validation(_))
    ));
    assert!(service.seen.borrow().is_empty());
}

#[test]
fn configured_session() {
    let config = BuilderConfig::from_json_str(
        r#"{"default_field": "$.amount", "thresholds": {"medium": 3, "high": 6}, "expanded_by_default": false}"#,
    )
    .unwrap();
    let mut session = BuilderSession::with_config(config).unwrap();
    assert!(!session.expansion().is_expanded(&NodePath::root()));

    session.set_name("r");
    session.add_condition(NodePath::root()).unwrap();
    let cond = session.tree().root().children()[0].as_condition().unwrap();
    assert_eq!(cond.field, "$.amount");
    assert_eq!(cond.operator, Some(Operator::Eq));
    // score 1 + 2 + 3 = 6
    assert_eq!(session.complexity(), ComplexityLevel::High);
}

#[test]
fn rename_condition_and_group_by_path() {
    let mut session = BuilderSession::new();
    build_rule(&mut session);
    session
        .apply(&Edit::RenameCondition {
            condition: NodePath::from(vec![1, 0]),
            name: Some("North Korea".to_owned()),
        })
        .unwrap();
    session
        .apply(&Edit::Rename {
            group: NodePath::from(vec![1]),
            name: None,
        })
        .unwrap();

    let inner = session.tree().root().children()[1].as_group().unwrap();
    assert_eq!(inner.display_name(1), "Any Condition (Level 1)");
    let first = inner.children()[0].as_condition().unwrap();
    assert_eq!(first.display_name(0), "North Korea");
    assert_eq!(
        inner.children()[1].as_condition().unwrap().display_name(1),
        "Condition 2"
    );
}

#[test]
fn json_path_values_in_session() {
    let mut session = BuilderSession::new();
    session.set_name("limits");
    session
        .apply(&Edit::AddCondition {
            group: NodePath::root(),
            condition: field("$.amount")
                .against_path(Operator::Le, "$.limit")
                .with_value(ValueSpec::json_path("$.limit").with_offset(-1)),
        })
        .unwrap();
    let text = session.preview().unwrap().to_owned();
    let value: Value = serde_json::from_str(&text).unwrap();
    let prop = &value["businessLogic"]["conditions"][0]["value_prop"];
    assert_eq!(prop["type"], "json-path");
    assert_eq!(prop["offset"], -1);
}

#[test]
fn expansion_and_focus() {
    let mut session = BuilderSession::new();
    build_rule(&mut session);
    session.collapse_all();
    assert!(!session.expansion().is_expanded(&NodePath::from(vec![1])));
    session.expansion_mut().toggle(&NodePath::from(vec![1]));
    assert!(session.expansion().is_expanded(&NodePath::from(vec![1])));

    session.focus_mut().focus(NodePath::from(vec![1]));
    assert!(session.focus().is_visible(&NodePath::from(vec![1, 1])));
    assert!(!session.focus().is_visible(&NodePath::from(vec![0])));
}
