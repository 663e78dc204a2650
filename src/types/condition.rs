use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::group::Group;

/// Comparison operators a condition can apply to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    Any,
    All,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Any,
        Operator::All,
    ];

    /// The token used on the wire (`"eq"`, `"startswith"`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Ge => "ge",
            Operator::Le => "le",
            Operator::Contains => "contains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Any => "any",
            Operator::All => "all",
        }
    }

    /// Human readable label shown in the condition editor.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Operator::Eq => "equals",
            Operator::Ne => "not equals",
            Operator::Gt => "greater than",
            Operator::Lt => "less than",
            Operator::Ge => "greater than or equal",
            Operator::Le => "less than or equal",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
            Operator::Any => "any",
            Operator::All => "all",
        }
    }

    /// Compact symbol shown in the tree view.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "≠",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => "≥",
            Operator::Le => "≤",
            other => other.label(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Operator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_owned()))
    }
}

/// How the field side of a comparison is produced before the operator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonKind {
    #[default]
    Simple,
    Items,
    Aggregation,
    Func,
    Proc,
}

impl ComparisonKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonKind::Simple => "simple",
            ComparisonKind::Items => "items",
            ComparisonKind::Aggregation => "aggregation",
            ComparisonKind::Func => "func",
            ComparisonKind::Proc => "proc",
        }
    }

    /// Every kind except `simple` needs a named function/aggregation/procedure.
    #[must_use]
    pub fn requires_name(self) -> bool {
        self != ComparisonKind::Simple
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ComparisonSpec {
    pub kind: ComparisonKind,
    pub name: String,
}

impl ComparisonSpec {
    #[must_use]
    pub fn simple() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn named(kind: ComparisonKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Whether the right-hand value is a literal or a path into the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    #[default]
    Const,
    JsonPath,
}

impl ValueKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Const => "const",
            ValueKind::JsonPath => "json-path",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ValueSpec {
    pub kind: ValueKind,
    pub value: String,
    pub offset: Option<i64>,
}

impl ValueSpec {
    #[must_use]
    pub fn constant(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Const,
            value: value.into(),
            offset: None,
        }
    }

    #[must_use]
    pub fn json_path(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::JsonPath,
            value: path.into(),
            offset: None,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A leaf comparison: `field operator value`.
///
/// `operator` is `None` while the user has cleared it in the editor; such a
/// condition is reported as incomplete by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub field: String,
    pub operator: Option<Operator>,
    pub comparison: ComparisonSpec,
    pub value: ValueSpec,
    pub name: Option<String>,
}

impl Default for Condition {
    /// The blank condition the editor appends: empty field, `eq`, simple
    /// comparison, empty constant value.
    fn default() -> Self {
        Self {
            field: String::new(),
            operator: Some(Operator::Eq),
            comparison: ComparisonSpec::simple(),
            value: ValueSpec::constant(""),
            name: None,
        }
    }
}

impl Condition {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: ValueSpec) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_comparison(mut self, comparison: ComparisonSpec) -> Self {
        self.comparison = comparison;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: ValueSpec) -> Self {
        self.value = value;
        self
    }

    /// Label shown for a condition at `index` among its siblings.
    #[must_use]
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => default_condition_name(index),
        }
    }
}

/// `Condition N`, numbered from 1.
#[must_use]
pub fn default_condition_name(index: usize) -> String {
    format!("Condition {}", index + 1)
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operator.map_or("?", Operator::symbol);
        match self.value.kind {
            ValueKind::Const => write!(f, "({} {op} \"{}\")", self.field, self.value.value),
            ValueKind::JsonPath => write!(f, "({} {op} {})", self.field, self.value.value),
        }
    }
}

impl Not for Condition {
    type Output = Group;

    fn not(self) -> Group {
        Group::not(self)
    }
}

/// Intermediate builder for conditions on one field.
/// Created by [`field()`]; each method produces a [`Condition`] with a constant value.
#[derive(Debug, Clone)]
pub struct FieldCondition {
    path: String,
}

macro_rules! comparison_methods {
    ($($method:ident => $op:ident),* $(,)?) => {
        impl FieldCondition {
            $(
                #[must_use]
                pub fn $method(self, value: impl Into<String>) -> Condition {
                    Condition::new(self.path, Operator::$op, ValueSpec::constant(value))
                }
            )*

            /// Compare against another path in the same document instead of a constant.
            #[must_use]
            pub fn against_path(self, op: Operator, path: impl Into<String>) -> Condition {
                Condition::new(self.path, op, ValueSpec::json_path(path))
            }
        }
    };
}

comparison_methods! {
    eq => Eq,
    ne => Ne,
    gt => Gt,
    lt => Lt,
    ge => Ge,
    le => Le,
    contains => Contains,
    starts_with => StartsWith,
    ends_with => EndsWith,
    any => Any,
    all => All,
}

#[must_use]
pub fn field(path: &str) -> FieldCondition {
    FieldCondition {
        path: path.to_owned(),
    }
}
