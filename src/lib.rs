//! Rule logic trees for a visual business-rule builder.
//!
//! A rule is a tree of AND/OR/NOT [`Group`]s over field comparisons
//! ([`Condition`]). The tree is edited through pure functions in [`editor`]
//! that return new snapshots, checked by [`validate()`], summarized by
//! [`compute_metrics`], and exchanged with other systems as JSON via
//! [`serial`]. [`BuilderSession`] ties these together for an editor screen.

mod config;
pub mod editor;
mod error;
pub mod identity;
mod metrics;
pub mod serial;
mod session;
pub mod sink;
mod types;
mod validate;

pub use config::{BuilderConfig, ConfigError};
pub use editor::Edit;
pub use error::RuleError;
pub use identity::{node_at, path_of, walk, ExpansionState, FocusStack};
pub use metrics::{compute_metrics, ComplexityLevel, ComplexityThresholds, RuleMetrics};
pub use serial::{MalformedRule, SerializeError};
pub use session::BuilderSession;
pub use sink::{
    EvaluationRequest, EvaluationResponse, EvaluationSink, EvaluationUnavailable,
    SampleDataSource, SaveSink, SinkError,
};
pub use types::{
    default_condition_name, field, ComparisonKind, ComparisonSpec, Condition, EditError,
    FieldCondition, Group, GroupType, InvalidPath, Node, NodePath, NodeRef, Operator, RuleTree,
    UnknownOperator, ValueKind, ValueSpec,
};
pub use validate::{validate, ValidationFailed, ValidationIssue, ValidationReport};
