use rule_builder::{
    field, BuilderSession, Edit, EvaluationRequest, EvaluationResponse, EvaluationSink,
    GroupType, NodePath, RuleError, SaveSink, SinkError,
};
use serde_json::{json, Value};

/// Prints saved rules instead of storing them.
struct PrintStore;

impl SaveSink for PrintStore {
    fn save(&mut self, envelope: &Value) -> Result<(), SinkError> {
        println!("saved: {envelope}");
        Ok(())
    }
}

/// Passes documents whose destination is on a fixed list.
struct ListService;

impl EvaluationSink for ListService {
    fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse, SinkError> {
        let country = request.data["destination"]["country"].as_str();
        Ok(EvaluationResponse {
            success: true,
            result: matches!(country, Some("KP" | "IR")),
            error: None,
        })
    }
}

fn main() -> Result<(), RuleError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .init();

    let mut session = BuilderSession::new();

    // A save attempt on the empty rule lists everything that is missing.
    if let Err(RuleError::Validation(failed)) = session.save(&mut PrintStore) {
        for issue in &failed.issues {
            println!("{}: {issue}", issue.path());
        }
    }

    session.set_name("Sanctioned destination");
    session.apply(&Edit::AddCondition {
        group: NodePath::root(),
        condition: field("$.amount").gt("0"),
    })?;
    session.apply(&Edit::AddGroup {
        group: NodePath::root(),
    })?;
    let nested = NodePath::from(vec![1]);
    session.apply(&Edit::Retype {
        group: nested.clone(),
        group_type: GroupType::Or,
        name: None,
    })?;
    for country in ["KP", "IR", "SY"] {
        session.apply(&Edit::AddCondition {
            group: nested.clone(),
            condition: field("$.destination.country").eq(country),
        })?;
    }

    // Changed our mind about Syria.
    session.undo();

    println!("{}", session.preview()?);
    println!("complexity: {}", session.complexity());

    session.set_test_data(json!({ "amount": 120, "destination": { "country": "IR" } }));
    let passed = session.evaluate(&ListService)?;
    println!("evaluation: {}", if passed { "pass" } else { "fail" });

    session.save(&mut PrintStore)?;
    println!("after save, blank: {}", session.tree().is_blank());
    Ok(())
}
