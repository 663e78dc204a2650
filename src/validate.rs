//! Completeness checks run before a rule is saved or evaluated.

use std::fmt;

use thiserror::Error;

use crate::identity::walk;
use crate::{ComparisonKind, Condition, GroupType, NodePath, NodeRef, RuleTree};

/// One problem found in a rule, with the path of the node to focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NameRequired,
    NoConditions,
    EmptyGroup {
        path: NodePath,
        group_type: GroupType,
    },
    IncompleteCondition {
        path: NodePath,
    },
    ComparisonNameRequired {
        path: NodePath,
        kind: ComparisonKind,
    },
}

impl ValidationIssue {
    /// The offending node; rule-level issues point at the root.
    #[must_use]
    pub fn path(&self) -> NodePath {
        match self {
            ValidationIssue::NameRequired | ValidationIssue::NoConditions => NodePath::root(),
            ValidationIssue::EmptyGroup { path, .. }
            | ValidationIssue::IncompleteCondition { path }
            | ValidationIssue::ComparisonNameRequired { path, .. } => path.clone(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NameRequired => f.write_str("Rule name is required"),
            ValidationIssue::NoConditions => f.write_str("At least one condition is required"),
            ValidationIssue::EmptyGroup { group_type, .. } => {
                write!(f, "Empty {group_type} group found")
            }
            ValidationIssue::IncompleteCondition { .. } => {
                f.write_str("Incomplete condition found")
            }
            ValidationIssue::ComparisonNameRequired { kind, .. } => {
                write!(f, "Comparison name is required for {kind} comparison")
            }
        }
    }
}

/// Every issue found, in depth-first pre-order after the rule-level ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Display strings, in report order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// # Errors
    ///
    /// Returns [`ValidationFailed`] with every issue when the report is not valid.
    pub fn into_result(self) -> Result<(), ValidationFailed> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationFailed {
                issues: self.issues,
            })
        }
    }
}

/// A rule was rejected because it is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule failed validation: {}", join_messages(.issues))]
pub struct ValidationFailed {
    pub issues: Vec<ValidationIssue>,
}

fn join_messages(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a rule for completeness. Never stops at the first problem.
#[must_use]
pub fn validate(tree: &RuleTree) -> ValidationReport {
    let mut issues = Vec::new();

    if tree.name.trim().is_empty() {
        issues.push(ValidationIssue::NameRequired);
    }
    if tree.root().is_empty() {
        issues.push(ValidationIssue::NoConditions);
    }

    for (path, _, node) in walk(tree.root()) {
        match node {
            NodeRef::Group(group) => {
                if group.is_empty() {
                    issues.push(ValidationIssue::EmptyGroup {
                        path,
                        group_type: group.group_type(),
                    });
                }
            }
            NodeRef::Condition(condition) => {
                if is_incomplete(condition) {
                    issues.push(ValidationIssue::IncompleteCondition { path: path.clone() });
                }
                let comparison = &condition.comparison;
                if comparison.kind.requires_name() && comparison.name.trim().is_empty() {
                    issues.push(ValidationIssue::ComparisonNameRequired {
                        path,
                        kind: comparison.kind,
                    });
                }
            }
        }
    }

    ValidationReport { issues }
}

fn is_incomplete(condition: &Condition) -> bool {
    condition.field.trim().is_empty()
        || condition.operator.is_none()
        || condition.value.value.is_empty()
}
