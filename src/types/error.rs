use thiserror::Error;

use super::path::NodePath;

/// A tree edit addressed something that does not exist in the current snapshot.
///
/// These are caller errors: indices and paths derived from the tree being
/// edited are always valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("child index {index} out of range for group with {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("node at '{path}' is a condition, not a group")]
    NotAGroup { path: NodePath },

    #[error("node at '{path}' is a group, not a condition")]
    NotACondition { path: NodePath },
}
