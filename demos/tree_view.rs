use rule_builder::{field, walk, ExpansionState, FocusStack, Group, NodePath, NodeRef, RuleTree};

/// Render the tree the way the side panel shows it: one line per visible
/// node, indented by depth, skipping the contents of collapsed groups.
fn render(tree: &RuleTree, expansion: &ExpansionState, focus: &FocusStack) {
    let mut hidden_under: Option<NodePath> = None;
    for (path, depth, node) in walk(tree.root()) {
        if let Some(collapsed) = &hidden_under {
            if collapsed.is_prefix_of(&path) {
                continue;
            }
            hidden_under = None;
        }
        if !focus.is_visible(&path) {
            continue;
        }

        let indent = "  ".repeat(depth);
        match node {
            NodeRef::Group(group) => {
                let marker = if expansion.is_expanded(&path) { "▾" } else { "▸" };
                println!(
                    "{indent}{marker} {} [{}] {}",
                    group.display_name(depth),
                    group.group_type(),
                    group.summary()
                );
                if !expansion.is_expanded(&path) {
                    hidden_under = Some(path);
                }
            }
            NodeRef::Condition(condition) => {
                let index = path.last().unwrap_or_default();
                println!("{indent}• {}: {condition}", condition.display_name(index));
            }
        }
    }
}

fn main() {
    let tree = RuleTree::with_root(
        "Checkout risk",
        Group::and([
            field("$.cart.total").ge("500").into(),
            Group::or([
                field("$.user.age_days").lt("7").into(),
                Group::not(field("$.user.email_verified").eq("true")).into(),
            ])
            .into(),
        ]),
    );

    let mut expansion = ExpansionState::new();
    let mut focus = FocusStack::new();

    println!("-- expanded --");
    render(&tree, &expansion, &focus);

    println!("-- nested group collapsed --");
    expansion.toggle(&NodePath::from(vec![1]));
    render(&tree, &expansion, &focus);

    println!("-- focused on the OR branch --");
    expansion.expand_all(tree.root());
    focus.focus(NodePath::from(vec![1]));
    render(&tree, &expansion, &focus);
    let crumbs: Vec<String> = focus.crumbs().iter().map(ToString::to_string).collect();
    println!("breadcrumbs: {}", crumbs.join(" > "));
}
