use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::walk;
use crate::{NodeRef, RuleTree};

/// Size and nesting summary of a rule, shown next to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RuleMetrics {
    pub total_conditions: usize,
    /// Groups including the root.
    pub group_count: usize,
    /// Deepest node; a condition directly under the root is at depth 1.
    pub max_depth: usize,
    pub complexity_score: usize,
}

impl RuleMetrics {
    #[must_use]
    pub fn level(&self) -> ComplexityLevel {
        ComplexityThresholds::default().classify(self.complexity_score)
    }

    #[must_use]
    pub fn level_with(&self, thresholds: &ComplexityThresholds) -> ComplexityLevel {
        thresholds.classify(self.complexity_score)
    }
}

/// Compute metrics in one depth-first pass from the root at depth 0.
#[must_use]
pub fn compute_metrics(tree: &RuleTree) -> RuleMetrics {
    let mut metrics = RuleMetrics::default();
    for (_, depth, node) in walk(tree.root()) {
        match node {
            NodeRef::Group(_) => metrics.group_count += 1,
            NodeRef::Condition(_) => metrics.total_conditions += 1,
        }
        metrics.max_depth = metrics.max_depth.max(depth);
    }
    metrics.complexity_score =
        metrics.total_conditions + metrics.group_count * 2 + metrics.max_depth * 3;
    debug!(
        conditions = metrics.total_conditions,
        groups = metrics.group_count,
        depth = metrics.max_depth,
        score = metrics.complexity_score,
        "computed rule metrics"
    );
    metrics
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplexityLevel::Low => "Low",
            ComplexityLevel::Medium => "Medium",
            ComplexityLevel::High => "High",
        })
    }
}

/// Score boundaries: below `medium` is Low, below `high` is Medium, the rest High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    pub medium: usize,
    pub high: usize,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            medium: 10,
            high: 25,
        }
    }
}

impl ComplexityThresholds {
    #[must_use]
    pub fn classify(&self, score: usize) -> ComplexityLevel {
        if score < self.medium {
            ComplexityLevel::Low
        } else if score < self.high {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field, Group};

    #[test]
    fn empty_tree_counts_root_only() {
        let metrics = compute_metrics(&RuleTree::new());
        assert_eq!(
            metrics,
            RuleMetrics {
                total_conditions: 0,
                group_count: 1,
                max_depth: 0,
                complexity_score: 2,
            }
        );
        assert_eq!(metrics.level(), ComplexityLevel::Low);
    }

    #[test]
    fn and_with_nested_or() {
        let tree = RuleTree::with_root(
            "r",
            Group::and([
                field("$.a").eq("1").into(),
                Group::or([field("$.b").eq("2").into(), field("$.c").eq("3").into()]).into(),
            ]),
        );
        let metrics = compute_metrics(&tree);
        assert_eq!(metrics.total_conditions, 3);
        assert_eq!(metrics.group_count, 2);
        assert_eq!(metrics.max_depth, 2);
        assert_eq!(metrics.complexity_score, 13);
        assert_eq!(metrics.level(), ComplexityLevel::Medium);
    }

    #[test]
    fn deep_nesting_is_high() {
        let mut root = Group::and([field("$.leaf").eq("x").into()]);
        for _ in 0..5 {
            root = Group::or([root.into()]);
        }
        let metrics = compute_metrics(&RuleTree::with_root("deep", root));
        assert_eq!(metrics.group_count, 6);
        assert_eq!(metrics.max_depth, 6);
        assert_eq!(metrics.complexity_score, 1 + 12 + 18);
        assert_eq!(metrics.level(), ComplexityLevel::High);
    }

    #[test]
    fn threshold_boundaries() {
        let t = ComplexityThresholds::default();
        assert_eq!(t.classify(9), ComplexityLevel::Low);
        assert_eq!(t.classify(10), ComplexityLevel::Medium);
        assert_eq!(t.classify(24), ComplexityLevel::Medium);
        assert_eq!(t.classify(25), ComplexityLevel::High);
    }

    #[test]
    fn custom_thresholds() {
        let t = ComplexityThresholds { medium: 3, high: 5 };
        let metrics = compute_metrics(&RuleTree::new());
        assert_eq!(metrics.level_with(&t), ComplexityLevel::Low);
        assert_eq!(t.classify(4), ComplexityLevel::Medium);
        assert_eq!(t.classify(5), ComplexityLevel::High);
    }

    #[test]
    fn level_display() {
        assert_eq!(ComplexityLevel::Medium.to_string(), "Medium");
    }
}
