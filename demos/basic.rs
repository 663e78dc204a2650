use rule_builder::serial::to_string_pretty;
use rule_builder::{compute_metrics, field, validate, Group, RuleTree};

fn main() {
    // Define a rule
    let tree = RuleTree::with_root(
        "Large transfer",
        Group::and([
            field("$.amount").gt("10000").into(),
            Group::or([
                field("$.customer.country").eq("KP").into(),
                field("$.customer.tags").contains("pep").into(),
            ])
            .named("Risky customer")
            .into(),
        ]),
    )
    .described("Flags transfers that need manual review");

    println!("{tree}");

    let metrics = compute_metrics(&tree);
    println!(
        "{} conditions, {} groups, depth {}, complexity {} ({})",
        metrics.total_conditions,
        metrics.group_count,
        metrics.max_depth,
        metrics.complexity_score,
        metrics.level()
    );

    let report = validate(&tree);
    if report.is_valid() {
        println!("Rule is complete.");
    } else {
        for message in report.messages() {
            println!("- {message}");
        }
    }

    match to_string_pretty(&tree) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("could not render rule: {e}"),
    }
}
