use super::path::{PathError, Segment, TreePath};
use std::collections::BTreeMap;

/// A node in a configuration tree: either a nested branch or a scalar leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(BTreeMap<String, Node>),
    Leaf(f64),
}

/// A nested, string-keyed attribute tree with `f64` leaves.
///
/// This is the scalar skeleton of a vehicle configuration: every quantity an
/// optimizer variable or a pipeline step touches lives at some dotted path
/// (`wings.main_wing.areas.reference`, `propulsors.turbofan.thrust.total_design`).
/// Branches use ordered maps so wildcard expansion is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: BTreeMap<String, Node>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a scalar leaf at a concrete path, creating intermediate
    /// branches as needed. Fails if the path contains a wildcard or if the
    /// traversal runs through an existing leaf.
    pub fn set(&mut self, path: &TreePath, value: f64) -> Result<(), PathError> {
        if path.has_wildcard() {
            return Err(PathError::UnexpectedWildcard(path.to_string()));
        }
        let segments = path.segments();
        let mut current = &mut self.root;
        for segment in &segments[..segments.len() - 1] {
            let Segment::Key(key) = segment else {
                return Err(PathError::UnexpectedWildcard(path.to_string()));
            };
            let entry = current
                .entry(key.clone())
                .or_insert_with(|| Node::Branch(BTreeMap::new()));
            match entry {
                Node::Branch(children) => current = children,
                Node::Leaf(_) => return Err(PathError::NotALeaf(path.to_string())),
            }
        }
        let Segment::Key(last) = &segments[segments.len() - 1] else {
            return Err(PathError::UnexpectedWildcard(path.to_string()));
        };
        match current.get(last) {
            Some(Node::Branch(_)) => Err(PathError::NotALeaf(path.to_string())),
            _ => {
                current.insert(last.clone(), Node::Leaf(value));
                Ok(())
            }
        }
    }

    /// Reads the scalar leaf at a concrete path.
    pub fn get(&self, path: &TreePath) -> Result<f64, PathError> {
        match self.node_at(path)? {
            Node::Leaf(value) => Ok(*value),
            Node::Branch(_) => Err(PathError::NotALeaf(path.to_string())),
        }
    }

    /// Whether a concrete path resolves to a scalar leaf.
    pub fn contains(&self, path: &TreePath) -> bool {
        matches!(self.node_at(path), Ok(Node::Leaf(_)))
    }

    /// Expands a path against the tree's current membership, replacing each
    /// wildcard segment with every sibling key at that level. Every expansion
    /// must terminate at a scalar leaf. Expansion order follows the ordered
    /// branch maps, so repeated calls on an unchanged tree are identical.
    pub fn resolve(&self, path: &TreePath) -> Result<Vec<TreePath>, PathError> {
        let mut matches = Vec::new();
        expand(&self.root, path.segments(), &mut Vec::new(), &mut matches);
        if matches.is_empty() {
            if path.has_wildcard() {
                return Err(PathError::NoMatches(path.to_string()));
            }
            // Distinguish "missing" from "present but not a leaf".
            return match self.node_at(path) {
                Ok(_) => Err(PathError::NotALeaf(path.to_string())),
                Err(err) => Err(err),
            };
        }
        let matches = matches
            .into_iter()
            .map(|keys| {
                TreePath::from_segments(keys.into_iter().map(Segment::Key).collect())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// All leaves in the tree, in deterministic path order.
    pub fn leaves(&self) -> Vec<(TreePath, f64)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &mut Vec::new(), &mut out);
        out
    }

    fn node_at(&self, path: &TreePath) -> Result<&Node, PathError> {
        if path.has_wildcard() {
            return Err(PathError::UnexpectedWildcard(path.to_string()));
        }
        let mut current = &self.root;
        let segments = path.segments();
        for (i, segment) in segments.iter().enumerate() {
            let Segment::Key(key) = segment else {
                return Err(PathError::UnexpectedWildcard(path.to_string()));
            };
            let node = current
                .get(key)
                .ok_or_else(|| PathError::NotFound(path.to_string()))?;
            if i == segments.len() - 1 {
                return Ok(node);
            }
            match node {
                Node::Branch(children) => current = children,
                Node::Leaf(_) => return Err(PathError::NotFound(path.to_string())),
            }
        }
        Err(PathError::NotFound(path.to_string()))
    }
}

fn expand(
    level: &BTreeMap<String, Node>,
    remaining: &[Segment],
    prefix: &mut Vec<String>,
    matches: &mut Vec<Vec<String>>,
) {
    let Some((segment, rest)) = remaining.split_first() else {
        return;
    };
    match segment {
        Segment::Key(key) => {
            if let Some(node) = level.get(key) {
                prefix.push(key.clone());
                descend(node, rest, prefix, matches);
                prefix.pop();
            }
        }
        Segment::Wildcard => {
            for (key, node) in level {
                prefix.push(key.clone());
                descend(node, rest, prefix, matches);
                prefix.pop();
            }
        }
    }
}

fn descend(
    node: &Node,
    rest: &[Segment],
    prefix: &mut Vec<String>,
    matches: &mut Vec<Vec<String>>,
) {
    match (node, rest.is_empty()) {
        (Node::Leaf(_), true) => matches.push(prefix.clone()),
        (Node::Branch(children), false) => expand(children, rest, prefix, matches),
        _ => {}
    }
}

fn collect_leaves(
    level: &BTreeMap<String, Node>,
    prefix: &mut Vec<String>,
    out: &mut Vec<(TreePath, f64)>,
) {
    for (key, node) in level {
        prefix.push(key.clone());
        match node {
            Node::Leaf(value) => {
                let segments = prefix.iter().map(|k| Segment::key(k)).collect();
                if let Ok(path) = TreePath::from_segments(segments) {
                    out.push((path, *value));
                }
            }
            Node::Branch(children) => collect_leaves(children, prefix, out),
        }
        prefix.pop();
    }
}
