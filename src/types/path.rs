use std::fmt;
use std::str::FromStr;

/// Position of a node as the child indices taken from the root.
///
/// The empty path is the root group. Paths are positional: inserting or
/// deleting an earlier sibling changes the path of every later one, so a path
/// is only meaningful for the tree snapshot it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of steps from the root, which is also the node's depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }

    /// The enclosing group's path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, init)| Self(init.to_vec()))
    }

    /// Index of this node within its parent, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Whether `self` lies on the way from the root to `other` (or is `other`).
    #[must_use]
    pub fn is_prefix_of(&self, other: &NodePath) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(steps: Vec<usize>) -> Self {
        Self(steps)
    }
}

impl From<&[usize]> for NodePath {
    fn from(steps: &[usize]) -> Self {
        Self(steps.to_vec())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

/// Returned when a string is not of the form `root` or `root/0/2/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPath(pub String);

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid node path '{}'", self.0)
    }
}

impl std::error::Error for InvalidPath {}

impl FromStr for NodePath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        if parts.next() != Some("root") {
            return Err(InvalidPath(s.to_owned()));
        }
        parts
            .map(|step| step.parse::<usize>().map_err(|_| InvalidPath(s.to_owned())))
            .collect::<Result<Vec<_>, _>>()
            .map(NodePath)
    }
}
