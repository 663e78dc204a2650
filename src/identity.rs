//! Positional node identity and the view state built on it.

use std::collections::BTreeSet;

use crate::editor::Edit;
use crate::{Group, GroupType, Node, NodePath, NodeRef};

/// Find where `target` sits in the tree rooted at `root`.
///
/// Matching is by reference: `target` must borrow a node inside `root`.
/// A structurally equal node from another tree is not found.
#[must_use]
pub fn path_of(root: &Group, target: NodeRef<'_>) -> Option<NodePath> {
    let mut steps = Vec::new();
    if find(NodeRef::Group(root), target, &mut steps) {
        Some(NodePath::from(steps))
    } else {
        None
    }
}

fn find(here: NodeRef<'_>, target: NodeRef<'_>, steps: &mut Vec<usize>) -> bool {
    if here.same_node(target) {
        return true;
    }
    let NodeRef::Group(group) = here else {
        return false;
    };
    for (index, child) in group.children().iter().enumerate() {
        steps.push(index);
        if find(child.as_node_ref(), target, steps) {
            return true;
        }
        steps.pop();
    }
    false
}

/// The node at `path`, or `None` if some step does not exist.
#[must_use]
pub fn node_at<'a>(root: &'a Group, path: &NodePath) -> Option<NodeRef<'a>> {
    let mut here = NodeRef::Group(root);
    for &index in path.indices() {
        here = here.as_group()?.child(index).map(Node::as_node_ref)?;
    }
    Some(here)
}

/// Like [`node_at`], but only for groups.
#[must_use]
pub fn group_at<'a>(root: &'a Group, path: &NodePath) -> Option<&'a Group> {
    node_at(root, path).and_then(NodeRef::as_group)
}

/// Every node in depth-first pre-order as `(path, depth, node)`.
#[must_use]
pub fn walk(root: &Group) -> Vec<(NodePath, usize, NodeRef<'_>)> {
    let mut out = Vec::new();
    let mut stack = vec![(NodePath::root(), NodeRef::Group(root))];
    while let Some((path, node)) = stack.pop() {
        if let NodeRef::Group(group) = node {
            for (index, child) in group.children().iter().enumerate().rev() {
                stack.push((path.child(index), child.as_node_ref()));
            }
        }
        let depth = path.depth();
        out.push((path, depth, node));
    }
    out
}

/// Paths of every group in the tree, root first.
#[must_use]
pub fn group_paths(root: &Group) -> Vec<NodePath> {
    walk(root)
        .into_iter()
        .filter(|(_, _, node)| node.as_group().is_some())
        .map(|(path, _, _)| path)
        .collect()
}

/// Where the node at `path` in `root` ends up once `edit` is applied to
/// `root`, or `None` if the edit removes it.
///
/// Paths outside the edited group are returned unchanged.
#[must_use]
pub fn relocate(root: &Group, edit: &Edit, path: &NodePath) -> Option<NodePath> {
    match edit {
        Edit::AddCondition { group, .. } | Edit::AddGroup { group } => {
            // adding to a NOT group replaces its only child
            let replaces = group_at(root, group).is_some_and(|g| g.group_type() == GroupType::Not);
            if replaces && step_below(group, path).is_some() {
                None
            } else {
                Some(path.clone())
            }
        }
        Edit::UpdateChild { group, index, .. } => {
            if group.child(*index).is_prefix_of(path) {
                None
            } else {
                Some(path.clone())
            }
        }
        Edit::DeleteChild { group, index } => match step_below(group, path) {
            Some(step) if step == *index => None,
            Some(step) if step > *index => {
                let mut steps = path.indices().to_vec();
                steps[group.depth()] = step - 1;
                Some(NodePath::from(steps))
            }
            _ => Some(path.clone()),
        },
        Edit::Retype {
            group,
            group_type: GroupType::Not,
            ..
        } => match step_below(group, path) {
            Some(step) if step > 0 => None,
            _ => Some(path.clone()),
        },
        Edit::Retype { .. } | Edit::Rename { .. } | Edit::RenameCondition { .. } => {
            Some(path.clone())
        }
    }
}

/// The child index `path` takes directly under `group`, if it lies strictly
/// inside it.
fn step_below(group: &NodePath, path: &NodePath) -> Option<usize> {
    if group.is_prefix_of(path) {
        path.indices().get(group.depth()).copied()
    } else {
        None
    }
}

/// Expanded/collapsed flags for the tree view.
///
/// Groups are expanded unless they have been collapsed. Keys are paths, so
/// the state belongs to one tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionState {
    flipped: BTreeSet<NodePath>,
    default_expanded: bool,
}

impl Default for ExpansionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpansionState {
    #[must_use]
    pub fn new() -> Self {
        Self::with_default(true)
    }

    /// State where groups with no explicit flag start as `expanded`.
    #[must_use]
    pub fn with_default(expanded: bool) -> Self {
        Self {
            flipped: BTreeSet::new(),
            default_expanded: expanded,
        }
    }

    #[must_use]
    pub fn is_expanded(&self, path: &NodePath) -> bool {
        // `flipped` holds the paths whose state differs from the default.
        self.flipped.contains(path) != self.default_expanded
    }

    pub fn set_expanded(&mut self, path: NodePath, expanded: bool) {
        if expanded == self.default_expanded {
            self.flipped.remove(&path);
        } else {
            self.flipped.insert(path);
        }
    }

    /// Flip one group; returns the new state.
    pub fn toggle(&mut self, path: &NodePath) -> bool {
        let expanded = !self.is_expanded(path);
        self.set_expanded(path.clone(), expanded);
        expanded
    }

    pub fn expand_all(&mut self, root: &Group) {
        for path in group_paths(root) {
            self.set_expanded(path, true);
        }
    }

    pub fn collapse_all(&mut self, root: &Group) {
        for path in group_paths(root) {
            self.set_expanded(path, false);
        }
    }

    /// Forget every explicit flag.
    pub fn clear(&mut self) {
        self.flipped.clear();
    }

    /// Move every explicit flag to the path `f` gives it; flags mapped to
    /// `None` are forgotten.
    pub fn remap(&mut self, f: impl FnMut(&NodePath) -> Option<NodePath>) {
        self.flipped = self.flipped.iter().filter_map(f).collect();
    }
}

/// Breadcrumb trail of focused groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusStack {
    crumbs: Vec<NodePath>,
}

impl FocusStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `path` as the active focus. Focusing the active path again is a no-op.
    pub fn focus(&mut self, path: NodePath) {
        if self.crumbs.last() != Some(&path) {
            self.crumbs.push(path);
        }
    }

    /// Pop the active focus, returning it.
    pub fn back(&mut self) -> Option<NodePath> {
        self.crumbs.pop()
    }

    /// Drop every crumb after `index`, making `crumbs()[index]` active.
    pub fn jump_to(&mut self, index: usize) {
        self.crumbs.truncate(index.saturating_add(1));
    }

    #[must_use]
    pub fn active(&self) -> Option<&NodePath> {
        self.crumbs.last()
    }

    #[must_use]
    pub fn crumbs(&self) -> &[NodePath] {
        &self.crumbs
    }

    pub fn clear(&mut self) {
        self.crumbs.clear();
    }

    /// Move every crumb to the path `f` gives it, dropping those mapped to
    /// `None`.
    pub fn remap(&mut self, f: impl FnMut(&NodePath) -> Option<NodePath>) {
        self.crumbs = self.crumbs.iter().filter_map(f).collect();
        self.crumbs.dedup();
    }

    /// Whether the node at `path` is shown under the current focus: nothing
    /// is focused, the node is an ancestor of the focus, or it lies inside
    /// the focused branch.
    #[must_use]
    pub fn is_visible(&self, path: &NodePath) -> bool {
        match self.active() {
            None => true,
            Some(focus) => path.is_prefix_of(focus) || focus.is_prefix_of(path),
        }
    }
}
