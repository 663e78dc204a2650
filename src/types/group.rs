use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use super::condition::Condition;

/// Boolean combinator of a [`Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupType {
    #[default]
    And,
    Or,
    Not,
}

impl GroupType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::And => "AND",
            GroupType::Or => "OR",
            GroupType::Not => "NOT",
        }
    }

    /// Label used when a group has no explicit name. `depth` 0 is the root.
    #[must_use]
    pub fn default_name(self, depth: usize) -> String {
        let base = match self {
            GroupType::And => "All Conditions",
            GroupType::Or => "Any Condition",
            GroupType::Not => "None True",
        };
        if depth == 0 {
            base.to_owned()
        } else {
            format!("{base} (Level {depth})")
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A child of a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Condition(Condition),
    Group(Group),
}

impl Node {
    #[must_use]
    pub fn as_node_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Condition(c) => NodeRef::Condition(c),
            Node::Group(g) => NodeRef::Group(g),
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Condition(_) => None,
        }
    }

    #[must_use]
    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            Node::Condition(c) => Some(c),
            Node::Group(_) => None,
        }
    }

    /// Enforce the NOT invariant on this node and everything below it.
    pub(crate) fn normalized(self) -> Node {
        match self {
            Node::Group(g) => Node::Group(g.normalized()),
            leaf @ Node::Condition(_) => leaf,
        }
    }
}

impl From<Condition> for Node {
    fn from(c: Condition) -> Self {
        Node::Condition(c)
    }
}

impl From<Group> for Node {
    fn from(g: Group) -> Self {
        Node::Group(g)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Condition(c) => write!(f, "{c}"),
            Node::Group(g) => write!(f, "{g}"),
        }
    }
}

/// Borrowed view of any node in a tree, including the root group
/// (which is not wrapped in a [`Node`]).
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Condition(&'a Condition),
    Group(&'a Group),
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn as_group(self) -> Option<&'a Group> {
        match self {
            NodeRef::Group(g) => Some(g),
            NodeRef::Condition(_) => None,
        }
    }

    #[must_use]
    pub fn as_condition(self) -> Option<&'a Condition> {
        match self {
            NodeRef::Condition(c) => Some(c),
            NodeRef::Group(_) => None,
        }
    }

    /// Whether both refer to the same node in memory.
    #[must_use]
    pub fn same_node(self, other: NodeRef<'_>) -> bool {
        match (self, other) {
            (NodeRef::Condition(a), NodeRef::Condition(b)) => std::ptr::eq(a, b),
            (NodeRef::Group(a), NodeRef::Group(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }
}

/// An AND/OR/NOT container of conditions and nested groups.
///
/// Children are private so that the NOT invariant (at most one child) holds
/// for every value of this type; edits go through [`crate::editor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Group {
    group_type: GroupType,
    name: Option<String>,
    children: Vec<Node>,
}

impl Group {
    /// An empty group of the given type.
    #[must_use]
    pub fn new(group_type: GroupType) -> Self {
        Self {
            group_type,
            name: None,
            children: Vec::new(),
        }
    }

    /// Build a group from children. A NOT group keeps only the first child,
    /// and nested groups are normalized the same way.
    #[must_use]
    pub fn with_children(group_type: GroupType, children: Vec<Node>) -> Self {
        Self {
            group_type,
            name: None,
            children,
        }
        .normalized()
    }

    #[must_use]
    pub fn and(children: impl IntoIterator<Item = Node>) -> Self {
        Self::with_children(GroupType::And, children.into_iter().collect())
    }

    #[must_use]
    pub fn or(children: impl IntoIterator<Item = Node>) -> Self {
        Self::with_children(GroupType::Or, children.into_iter().collect())
    }

    #[must_use]
    pub fn not(child: impl Into<Node>) -> Self {
        Self::with_children(GroupType::Not, vec![child.into()])
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Explicit name, or the type-and-depth default.
    #[must_use]
    pub fn display_name(&self, depth: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.group_type.default_name(depth),
        }
    }

    /// `"2 conditions"`, `"1 condition"`: the child summary shown in the tree view.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.children.len() {
            1 => "1 condition".to_owned(),
            n => format!("{n} conditions"),
        }
    }

    pub(crate) fn set_type(&mut self, group_type: GroupType) {
        self.group_type = group_type;
        self.enforce_not();
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Drop every child but the first when this is a NOT group.
    pub(crate) fn enforce_not(&mut self) {
        if self.group_type == GroupType::Not {
            self.children.truncate(1);
        }
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.enforce_not();
        self.children = self.children.into_iter().map(Node::normalized).collect();
        self
    }

    /// Whether the NOT invariant holds here and in every nested group.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if self.group_type == GroupType::Not && self.children.len() > 1 {
            return false;
        }
        self.children
            .iter()
            .filter_map(Node::as_group)
            .all(Group::is_well_formed)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.group_type, self.children.as_slice()) {
            (t, []) => write!(f, "({t})"),
            (GroupType::Not, [only]) => write!(f, "(NOT {only})"),
            (t, [first, rest @ ..]) => {
                write!(f, "({first}")?;
                for child in rest {
                    write!(f, " {t} {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Not for Group {
    type Output = Group;

    fn not(self) -> Group {
        Group::not(self)
    }
}
