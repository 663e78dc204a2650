use std::sync::Arc;
use std::thread;

use rule_builder::serial::{from_json, to_json};
use rule_builder::{compute_metrics, field, validate, ComplexityLevel, Group, RuleMetrics, RuleTree};

fn screening_rule() -> RuleTree {
    RuleTree::with_root(
        "Large transfer screening",
        Group::and([
            field("$.amount").gt("10000").into(),
            Group::or([
                field("$.customer.country").eq("KP").into(),
                field("$.customer.country").eq("IR").into(),
                field("$.customer.tags").contains("pep").into(),
            ])
            .into(),
            Group::not(field("$.customer.verified").eq("true")).into(),
        ]),
    )
}

#[test]
fn snapshots_shared_across_threads() {
    let tree = Arc::new(screening_rule());
    let expected = compute_metrics(&tree);

    let mut handles = vec![];

    // Metrics for display
    let t = Arc::clone(&tree);
    handles.push(thread::spawn(move || compute_metrics(&t)));

    // Validation before save
    let t = Arc::clone(&tree);
    handles.push(thread::spawn(move || {
        assert!(validate(&t).is_valid());
        compute_metrics(&t)
    }));

    // Serialization for preview
    let t = Arc::clone(&tree);
    handles.push(thread::spawn(move || {
        let restored = from_json(&to_json(&t)).unwrap();
        assert_eq!(restored, *t);
        compute_metrics(&restored)
    }));

    let results: Vec<RuleMetrics> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for metrics in results {
        assert_eq!(metrics, expected);
    }
    assert_eq!(expected.level(), ComplexityLevel::Medium);
}

#[test]
fn many_threads_same_answer() {
    let tree = Arc::new(screening_rule());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = Arc::clone(&tree);
            thread::spawn(move || (compute_metrics(&t), validate(&t).messages()))
        })
        .collect();

    let first = compute_metrics(&tree);
    for handle in handles {
        let (metrics, messages) = handle.join().unwrap();
        assert_eq!(metrics, first);
        assert!(messages.is_empty());
    }
}

#[test]
fn model_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RuleTree>();
    assert_send_sync::<Group>();
    assert_send_sync::<rule_builder::BuilderSession>();
    assert_send_sync::<rule_builder::ValidationReport>();
}
