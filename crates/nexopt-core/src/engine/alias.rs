use super::config::AliasEntry;
use super::error::EngineError;
use crate::core::forest::ConfigForest;
use crate::core::path::{Segment, TreePath};

/// Which trees a forest target writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TreeSelector {
    /// Every tree in the forest, base included.
    All,
    Tag(String),
}

/// A resolved alias target: a leaf (or wildcard family of leaves) in the
/// configuration forest, or a scalar in the evaluation context's summary
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Forest {
        selector: TreeSelector,
        path: TreePath,
    },
    Summary {
        path: TreePath,
    },
}

/// An alias entry resolved against the forest's static shape. Built once at
/// configure time so malformed targets fail before the first evaluation;
/// wildcard membership is still expanded per call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AliasPlan {
    pub name: String,
    pub targets: Vec<Target>,
}

const FOREST_ROOT: &str = "configs";
const SUMMARY_ROOT: &str = "summary";

pub(crate) fn resolve_alias(
    entry: &AliasEntry,
    forest: &ConfigForest,
) -> Result<AliasPlan, EngineError> {
    let mut targets = Vec::with_capacity(entry.targets.len());
    for raw in &entry.targets {
        targets.push(resolve_target(&entry.name, raw, forest)?);
    }
    Ok(AliasPlan {
        name: entry.name.clone(),
        targets,
    })
}

fn resolve_target(
    name: &str,
    raw: &str,
    forest: &ConfigForest,
) -> Result<Target, EngineError> {
    let invalid = |reason: String| EngineError::AliasTarget {
        name: name.to_string(),
        target: raw.to_string(),
        reason,
    };

    let path = TreePath::parse(raw).map_err(|err| invalid(err.to_string()))?;
    let (root, rest) = path.split_first();

    match root {
        Segment::Key(key) if key == SUMMARY_ROOT => {
            if rest.is_none() {
                return Err(invalid("summary target names no quantity".into()));
            }
            if path.has_wildcard() {
                return Err(invalid("summary targets cannot contain wildcards".into()));
            }
            // Steps write into the context under the full `summary.*` path,
            // so the plan keeps the root segment and pack reads the same key.
            Ok(Target::Summary { path: path.clone() })
        }
        Segment::Key(key) if key == FOREST_ROOT => {
            let rest = rest.ok_or_else(|| invalid("forest target names no tree".into()))?;
            let (tree, leaf) = rest.split_first();
            let selector = match tree {
                Segment::Wildcard => TreeSelector::All,
                Segment::Key(tag) => {
                    if !forest.contains_tree(tag) {
                        return Err(invalid(format!("unknown configuration '{tag}'")));
                    }
                    TreeSelector::Tag(tag.clone())
                }
            };
            let leaf = leaf.ok_or_else(|| invalid("forest target names no leaf".into()))?;
            // Static shape check; wildcard expansion happens again per call.
            forest
                .resolve(&leaf)
                .map_err(|err| invalid(err.to_string()))?;
            Ok(Target::Forest {
                selector,
                path: leaf,
            })
        }
        _ => Err(invalid(format!(
            "target must start with '{FOREST_ROOT}.' or '{SUMMARY_ROOT}.'"
        ))),
    }
}

impl TreeSelector {
    pub(crate) fn expand<'a>(&'a self, forest: &'a ConfigForest) -> Vec<&'a str> {
        match self {
            TreeSelector::All => forest.tags(),
            TreeSelector::Tag(tag) => vec![tag.as_str()],
        }
    }
}
