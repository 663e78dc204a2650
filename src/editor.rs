//! Pure tree transformations.
//!
//! Every function takes the current group (or tree) by reference and returns
//! a new value; the input is never modified, so earlier snapshots stay valid.
//! Each operation leaves the NOT invariant intact: a NOT group never holds
//! more than one child.

use tracing::debug;

use crate::{Condition, EditError, Group, GroupType, Node, NodePath, RuleTree};

/// Append a blank condition. A NOT group has its children replaced instead.
#[must_use]
pub fn add_condition(group: &Group) -> Group {
    add_condition_with(group, Condition::default())
}

/// Like [`add_condition`], with a caller-supplied starting condition.
#[must_use]
pub fn add_condition_with(group: &Group, condition: Condition) -> Group {
    add_child(group, Node::Condition(condition))
}

/// Append an empty AND group. A NOT group has its children replaced instead.
#[must_use]
pub fn add_group(group: &Group) -> Group {
    add_child(group, Node::Group(Group::new(GroupType::And)))
}

fn add_child(group: &Group, child: Node) -> Group {
    let mut next = group.clone();
    let child = child.normalized();
    if next.group_type() == GroupType::Not {
        *next.children_mut() = vec![child];
    } else {
        next.children_mut().push(child);
    }
    next
}

/// Replace `children[index]` with `new_child`.
///
/// # Errors
///
/// Returns [`EditError::IndexOutOfRange`] if `index` is not a current position.
pub fn update_child(group: &Group, index: usize, new_child: Node) -> Result<Group, EditError> {
    check_index(group, index)?;
    let mut next = group.clone();
    next.children_mut()[index] = new_child.normalized();
    Ok(next)
}

/// Remove `children[index]`; later children shift down by one.
///
/// # Errors
///
/// Returns [`EditError::IndexOutOfRange`] if `index` is not a current position.
pub fn delete_child(group: &Group, index: usize) -> Result<Group, EditError> {
    check_index(group, index)?;
    let mut next = group.clone();
    next.children_mut().remove(index);
    Ok(next)
}

/// Change the group's type.
///
/// Retyping to NOT keeps only the first child; the dropped children are gone
/// for good and retyping back does not restore them. The name becomes `name`
/// when given, otherwise it is cleared so the type-derived default applies.
#[must_use]
pub fn retype(group: &Group, new_type: GroupType, name: Option<String>) -> Group {
    let mut next = group.clone();
    next.set_type(new_type);
    next.set_name(name);
    next
}

/// Set or clear the group's display name.
#[must_use]
pub fn rename(group: &Group, name: Option<String>) -> Group {
    let mut next = group.clone();
    next.set_name(name);
    next
}

fn check_index(group: &Group, index: usize) -> Result<(), EditError> {
    if index < group.len() {
        Ok(())
    } else {
        Err(EditError::IndexOutOfRange {
            index,
            len: group.len(),
        })
    }
}

/// One user edit, addressed by the path of the node it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    AddCondition {
        group: NodePath,
        condition: Condition,
    },
    AddGroup {
        group: NodePath,
    },
    UpdateChild {
        group: NodePath,
        index: usize,
        node: Node,
    },
    DeleteChild {
        group: NodePath,
        index: usize,
    },
    Retype {
        group: NodePath,
        group_type: GroupType,
        name: Option<String>,
    },
    Rename {
        group: NodePath,
        name: Option<String>,
    },
    RenameCondition {
        condition: NodePath,
        name: Option<String>,
    },
}

impl Edit {
    /// Short name of the operation, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Edit::AddCondition { .. } => "add_condition",
            Edit::AddGroup { .. } => "add_group",
            Edit::UpdateChild { .. } => "update_child",
            Edit::DeleteChild { .. } => "delete_child",
            Edit::Retype { .. } => "retype",
            Edit::Rename { .. } => "rename",
            Edit::RenameCondition { .. } => "rename_condition",
        }
    }

    /// The path this edit is addressed to.
    #[must_use]
    pub fn target(&self) -> &NodePath {
        match self {
            Edit::AddCondition { group, .. }
            | Edit::AddGroup { group }
            | Edit::UpdateChild { group, .. }
            | Edit::DeleteChild { group, .. }
            | Edit::Retype { group, .. }
            | Edit::Rename { group, .. } => group,
            Edit::RenameCondition { condition, .. } => condition,
        }
    }
}

/// Apply an edit to a whole tree, rebuilding only the groups on the path to
/// the target.
///
/// # Errors
///
/// Returns [`EditError`] if the path does not lead to a node of the kind the
/// edit needs, or a child index is out of range.
pub fn apply(tree: &RuleTree, edit: &Edit) -> Result<RuleTree, EditError> {
    let root = match edit {
        Edit::AddCondition { group, condition } => {
            edit_group_at(tree.root(), group, |g| Ok(add_condition_with(g, condition.clone())))?
        }
        Edit::AddGroup { group } => edit_group_at(tree.root(), group, |g| Ok(add_group(g)))?,
        Edit::UpdateChild { group, index, node } => {
            edit_group_at(tree.root(), group, |g| update_child(g, *index, node.clone()))?
        }
        Edit::DeleteChild { group, index } => {
            edit_group_at(tree.root(), group, |g| delete_child(g, *index))?
        }
        Edit::Retype {
            group,
            group_type,
            name,
        } => edit_group_at(tree.root(), group, |g| Ok(retype(g, *group_type, name.clone())))?,
        Edit::Rename { group, name } => {
            edit_group_at(tree.root(), group, |g| Ok(rename(g, name.clone())))?
        }
        Edit::RenameCondition { condition, name } => {
            rename_condition_at(tree.root(), condition, name.clone())?
        }
    };
    debug!(edit = edit.kind(), target = %edit.target(), "applied edit");
    Ok(tree.replace_root(root))
}

/// Rebuild `root` with `f` applied to the group at `path`.
///
/// # Errors
///
/// Returns [`EditError`] if `path` does not name a group, or whatever `f` returns.
pub fn edit_group_at<F>(root: &Group, path: &NodePath, f: F) -> Result<Group, EditError>
where
    F: FnOnce(&Group) -> Result<Group, EditError>,
{
    rebuild(root, path.indices(), NodePath::root(), f)
}

fn rebuild<F>(group: &Group, steps: &[usize], here: NodePath, f: F) -> Result<Group, EditError>
where
    F: FnOnce(&Group) -> Result<Group, EditError>,
{
    let Some((&index, rest)) = steps.split_first() else {
        return f(group);
    };
    let child = group.child(index).ok_or(EditError::IndexOutOfRange {
        index,
        len: group.len(),
    })?;
    let child_path = here.child(index);
    let Node::Group(inner) = child else {
        return Err(EditError::NotAGroup { path: child_path });
    };
    let rebuilt = rebuild(inner, rest, child_path, f)?;
    let mut next = group.clone();
    next.children_mut()[index] = Node::Group(rebuilt);
    Ok(next)
}

fn rename_condition_at(
    root: &Group,
    path: &NodePath,
    name: Option<String>,
) -> Result<Group, EditError> {
    let (Some(parent), Some(index)) = (path.parent(), path.last()) else {
        return Err(EditError::NotACondition { path: path.clone() });
    };
    edit_group_at(root, &parent, |g| {
        let Some(Node::Condition(condition)) = g.child(index) else {
            return match g.child(index) {
                Some(_) => Err(EditError::NotACondition { path: path.clone() }),
                None => Err(EditError::IndexOutOfRange {
                    index,
                    len: g.len(),
                }),
            };
        };
        let mut renamed = condition.clone();
        renamed.name = name;
        update_child(g, index, Node::Condition(renamed))
    })
}
