mod condition;
mod error;
mod group;
mod path;
mod tree;

pub use condition::{
    default_condition_name, field, ComparisonKind, ComparisonSpec, Condition, FieldCondition,
    Operator, UnknownOperator, ValueKind, ValueSpec,
};
pub use error::EditError;
pub use group::{Group, GroupType, Node, NodeRef};
pub use path::{InvalidPath, NodePath};
pub use tree::RuleTree;
