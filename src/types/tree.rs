use std::fmt;

use super::group::{Group, GroupType};

/// A complete named rule: metadata plus the root group.
///
/// A fresh tree has an empty name and description and an empty AND root,
/// which is the state the builder starts in and returns to after a save.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleTree {
    pub name: String,
    pub description: String,
    root: Group,
}

impl Default for RuleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            root: Group::new(GroupType::And),
        }
    }

    /// Build a tree around an existing root. The root is normalized so the
    /// NOT invariant holds everywhere.
    #[must_use]
    pub fn with_root(name: impl Into<String>, root: Group) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            root: root.normalized(),
        }
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Same metadata, different root.
    #[must_use]
    pub fn replace_root(&self, root: Group) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            root: root.normalized(),
        }
    }

    /// Whether the tree is still in its freshly created state.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::new()
    }
}

impl fmt::Display for RuleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;

    #[test]
    fn new_tree_is_empty_and_root() {
        let tree = RuleTree::new();
        assert_eq!(tree.name, "");
        assert_eq!(tree.description, "");
        assert_eq!(tree.root().group_type(), GroupType::And);
        assert!(tree.root().is_empty());
        assert!(tree.is_blank());
    }

    #[test]
    fn replace_root_keeps_metadata() {
        let tree = RuleTree::with_root("limits", Group::new(GroupType::Or)).described("d");
        let next = tree.replace_root(Group::and([field("$.a").eq("1").into()]));
        assert_eq!(next.name, "limits");
        assert_eq!(next.description, "d");
        assert_eq!(next.root().len(), 1);
        assert_eq!(tree.root().group_type(), GroupType::Or);
        assert!(!next.is_blank());
    }

    #[test]
    fn display_includes_name_and_logic() {
        let tree = RuleTree::with_root("r", Group::and([field("$.a").eq("1").into()]));
        assert_eq!(tree.to_string(), "r: (($.a = \"1\"))");
    }
}
