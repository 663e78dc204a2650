//! JSON form of rule trees.
//!
//! This is the shape the builder previews, saves, and sends to the
//! evaluation service. Keys follow the established wire names, so the
//! conversion is written out by hand rather than derived.
//!
//! ## Wire Format
//!
//! ```text
//! envelope   { "name", "description"?, "businessLogic": group }
//! group      { "type": "AND" | "OR" | "NOT", "name"?, "conditions": [node, ...] }
//! condition  { "field", "operator",
//!              "comparison_prop": { "type", "name" },
//!              "value_prop": { "type", "value", "offset" },
//!              "name"? }
//! ```
//!
//! A node is read as a group when it has both `type` and `conditions`, and
//! as a condition when it has both `field` and `operator`. An empty
//! `operator` string stands for a cleared operator. On input the envelope
//! also accepts the older `business_logic` key.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::{
    ComparisonSpec, Condition, Group, GroupType, Node, NodePath, Operator, RuleTree, ValueSpec,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LOGIC_KEY: &str = "businessLogic";
const LEGACY_LOGIC_KEY: &str = "business_logic";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Input JSON does not describe a rule tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed rule at '{path}': {reason}")]
pub struct MalformedRule {
    pub path: NodePath,
    pub reason: String,
}

impl MalformedRule {
    fn new(path: &NodePath, reason: impl Into<String>) -> Self {
        Self {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors from the text helpers [`to_string_pretty`] and [`from_str`].
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Malformed(#[from] MalformedRule),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// The save envelope for `tree`.
#[must_use]
pub fn to_json(tree: &RuleTree) -> Value {
    let mut envelope = Map::new();
    envelope.insert("name".to_owned(), Value::from(tree.name.as_str()));
    if !tree.description.is_empty() {
        envelope.insert(
            "description".to_owned(),
            Value::from(tree.description.as_str()),
        );
    }
    envelope.insert(LOGIC_KEY.to_owned(), group_to_json(tree.root()));
    Value::Object(envelope)
}

/// A single group, without the envelope.
#[must_use]
pub fn group_to_json(group: &Group) -> Value {
    let mut out = Map::new();
    out.insert("type".to_owned(), Value::from(group.group_type().as_str()));
    if let Some(name) = group.name() {
        out.insert("name".to_owned(), Value::from(name));
    }
    let conditions = group.children().iter().map(node_to_json).collect();
    out.insert("conditions".to_owned(), Value::Array(conditions));
    Value::Object(out)
}

fn node_to_json(node: &Node) -> Value {
    match node {
        Node::Group(g) => group_to_json(g),
        Node::Condition(c) => condition_to_json(c),
    }
}

fn condition_to_json(condition: &Condition) -> Value {
    let mut out = json!({
        "field": condition.field,
        "operator": condition.operator.map_or("", Operator::as_str),
        "comparison_prop": {
            "type": condition.comparison.kind.as_str(),
            "name": condition.comparison.name,
        },
        "value_prop": {
            "type": condition.value.kind.as_str(),
            "value": condition.value.value,
            "offset": condition.value.offset,
        },
    });
    if let (Some(name), Value::Object(map)) = (&condition.name, &mut out) {
        map.insert("name".to_owned(), Value::from(name.as_str()));
    }
    out
}

/// Pretty-printed envelope, as shown in the preview pane.
///
/// # Errors
///
/// Returns [`SerializeError::Json`] if the JSON writer fails.
pub fn to_string_pretty(tree: &RuleTree) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(&to_json(tree))?)
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Rebuild a tree from its envelope.
///
/// # Errors
///
/// Returns [`MalformedRule`] naming the first node that is not a valid group
/// or condition.
pub fn from_json(value: &Value) -> Result<RuleTree, MalformedRule> {
    let root_path = NodePath::root();
    let envelope = value
        .as_object()
        .ok_or_else(|| MalformedRule::new(&root_path, "rule must be a JSON object"))?;

    let name = optional_str(envelope, "name", &root_path)?.unwrap_or_default();
    let description = optional_str(envelope, "description", &root_path)?.unwrap_or_default();
    let logic = envelope
        .get(LOGIC_KEY)
        .or_else(|| envelope.get(LEGACY_LOGIC_KEY))
        .ok_or_else(|| MalformedRule::new(&root_path, format!("missing '{LOGIC_KEY}'")))?;

    let root = group_from_json(logic)?;
    Ok(RuleTree::with_root(name, root).described(description))
}

/// Read a single group, without the envelope.
///
/// # Errors
///
/// Returns [`MalformedRule`] if `value` is not a group or any descendant is invalid.
pub fn group_from_json(value: &Value) -> Result<Group, MalformedRule> {
    match node_from_json(value, &NodePath::root())? {
        Node::Group(g) => Ok(g),
        Node::Condition(_) => Err(MalformedRule::new(
            &NodePath::root(),
            "expected a group, found a condition",
        )),
    }
}

/// Parse JSON text into a tree.
///
/// # Errors
///
/// Returns [`SerializeError::Json`] for invalid JSON text and
/// [`SerializeError::Malformed`] for JSON that is not a rule.
pub fn from_str(text: &str) -> Result<RuleTree, SerializeError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(from_json(&value)?)
}

fn node_from_json(value: &Value, path: &NodePath) -> Result<Node, MalformedRule> {
    let obj = value
        .as_object()
        .ok_or_else(|| MalformedRule::new(path, "node must be a JSON object"))?;

    if obj.contains_key("type") && obj.contains_key("conditions") {
        group_fields(obj, path).map(Node::Group)
    } else if obj.contains_key("field") && obj.contains_key("operator") {
        condition_fields(obj, path).map(Node::Condition)
    } else {
        Err(MalformedRule::new(
            path,
            "node is neither a group (type, conditions) nor a condition (field, operator)",
        ))
    }
}

fn group_fields(obj: &Map<String, Value>, path: &NodePath) -> Result<Group, MalformedRule> {
    let group_type: GroupType = enum_field(obj, "type", path)?;
    let items = obj
        .get("conditions")
        .and_then(Value::as_array)
        .ok_or_else(|| MalformedRule::new(path, "'conditions' must be an array"))?;

    let mut children = items
        .iter()
        .enumerate()
        .map(|(index, item)| node_from_json(item, &path.child(index)))
        .collect::<Result<Vec<_>, _>>()?;

    if group_type == GroupType::Not && children.len() > 1 {
        warn!(
            path = %path,
            children = children.len(),
            "NOT group with several children; keeping the first"
        );
        children.truncate(1);
    }

    let mut group = Group::with_children(group_type, children);
    if let Some(name) = optional_str(obj, "name", path)? {
        group = group.named(name);
    }
    Ok(group)
}

fn condition_fields(
    obj: &Map<String, Value>,
    path: &NodePath,
) -> Result<Condition, MalformedRule> {
    let field = required_str(obj, "field", path)?;
    let operator = match required_str(obj, "operator", path)?.as_str() {
        "" => None,
        _ => Some(enum_field::<Operator>(obj, "operator", path)?),
    };

    let comparison = match obj.get("comparison_prop") {
        None | Some(Value::Null) => ComparisonSpec::simple(),
        Some(Value::Object(prop)) => ComparisonSpec {
            kind: match prop.get("type") {
                None | Some(Value::Null) => Default::default(),
                Some(_) => enum_field(prop, "type", path)?,
            },
            name: optional_str(prop, "name", path)?.unwrap_or_default(),
        },
        Some(_) => {
            return Err(MalformedRule::new(path, "'comparison_prop' must be an object"));
        }
    };

    let value = match obj.get("value_prop") {
        None | Some(Value::Null) => ValueSpec::constant(""),
        Some(Value::Object(prop)) => ValueSpec {
            kind: match prop.get("type") {
                None | Some(Value::Null) => Default::default(),
                Some(_) => enum_field(prop, "type", path)?,
            },
            value: scalar_text(prop.get("value"), path)?,
            offset: offset(prop.get("offset"), path)?,
        },
        Some(_) => return Err(MalformedRule::new(path, "'value_prop' must be an object")),
    };

    Ok(Condition {
        field,
        operator,
        comparison,
        value,
        name: optional_str(obj, "name", path)?,
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn required_str(
    obj: &Map<String, Value>,
    key: &str,
    path: &NodePath,
) -> Result<String, MalformedRule> {
    optional_str(obj, key, path)?
        .ok_or_else(|| MalformedRule::new(path, format!("missing '{key}'")))
}

/// `null` and a missing key both read as `None`.
fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
    path: &NodePath,
) -> Result<Option<String>, MalformedRule> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(MalformedRule::new(path, format!("'{key}' must be a string"))),
    }
}

fn enum_field<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
    path: &NodePath,
) -> Result<T, MalformedRule> {
    let raw = required_str(obj, key, path)?;
    serde_json::from_value(Value::String(raw.clone()))
        .map_err(|_| MalformedRule::new(path, format!("unknown {key} '{raw}'")))
}

/// Values are kept as text; numbers and booleans are accepted and stringified.
fn scalar_text(value: Option<&Value>, path: &NodePath) -> Result<String, MalformedRule> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        Some(_) => Err(MalformedRule::new(path, "'value' must be a scalar")),
    }
}

fn offset(value: Option<&Value>, path: &NodePath) -> Result<Option<i64>, MalformedRule> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| MalformedRule::new(path, "'offset' must be an integer or null")),
    }
}
