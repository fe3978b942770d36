//! core::branch_tree
//!
//! Branch names grouped into folders by their `/` separated segments.
//!
//! # Architecture
//!
//! The tree is an arena: nodes live in one `Vec` and refer to their
//! children by index. It is built once from a flat list of names and every
//! traversal uses an explicit stack, so arbitrarily deep names such as
//! `a/b/c/.../z` never grow the call stack.
//!
//! # Example
//!
//! ```
//! use gitlane::core::branch_tree::BranchTree;
//! use gitlane::core::types::BranchName;
//!
//! let names = ["main", "feature/login", "feature/ui/nav"]
//!     .iter()
//!     .map(|n| BranchName::new(*n).unwrap())
//!     .collect::<Vec<_>>();
//! let tree = BranchTree::build(&names);
//!
//! let rows: Vec<_> = tree.walk().map(|(depth, node)| (depth, node.label.as_str())).collect();
//! assert_eq!(
//!     rows,
//!     vec![(0, "feature"), (1, "login"), (1, "ui"), (2, "nav"), (0, "main")]
//! );
//! ```

use serde::Serialize;

use super::types::BranchName;

/// Index of a node inside a [`BranchTree`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Last path segment shown for this node.
    pub label: String,
    /// The full branch name when this node is a branch.
    ///
    /// A name can be both a branch and a folder (`a` next to `a/b` is not a
    /// valid ref layout in git, but the tree tolerates it).
    pub branch: Option<BranchName>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchTree {
    nodes: Vec<TreeNode>,
}

impl BranchTree {
    const ROOT: NodeId = 0;

    /// Build the tree. Children are kept sorted: folders and branches
    /// interleave alphabetically by label.
    pub fn build(names: &[BranchName]) -> Self {
        let mut tree = Self {
            nodes: vec![TreeNode {
                label: String::new(),
                branch: None,
                children: Vec::new(),
            }],
        };

        for name in names {
            let mut current = Self::ROOT;
            for segment in name.segments() {
                current = tree.child_or_insert(current, segment);
            }
            tree.nodes[current].branch = Some(name.clone());
        }

        tree
    }

    fn child_or_insert(&mut self, parent: NodeId, label: &str) -> NodeId {
        let position = self.nodes[parent]
            .children
            .binary_search_by(|&child| self.nodes[child].label.as_str().cmp(label));
        match position {
            Ok(found) => self.nodes[parent].children[found],
            Err(insert_at) => {
                let id = self.nodes.len();
                self.nodes.push(TreeNode {
                    label: label.to_string(),
                    branch: None,
                    children: Vec::new(),
                });
                self.nodes[parent].children.insert(insert_at, id);
                id
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Top-level nodes.
    pub fn roots(&self) -> &[NodeId] {
        &self.nodes[Self::ROOT].children
    }

    pub fn is_empty(&self) -> bool {
        self.roots().is_empty()
    }

    /// Number of branches in the tree.
    pub fn branch_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.branch.is_some()).count()
    }

    /// Depth-first pre-order walk yielding `(depth, node)`.
    pub fn walk(&self) -> Walk<'_> {
        let stack = self.roots().iter().rev().map(|&id| (0, id)).collect();
        Walk { tree: self, stack }
    }

    /// Deepest nesting level (0 for a flat list).
    pub fn max_depth(&self) -> usize {
        self.walk().map(|(depth, _)| depth).max().unwrap_or(0)
    }
}

/// Iterator returned by [`BranchTree::walk`].
pub struct Walk<'a> {
    tree: &'a BranchTree,
    stack: Vec<(usize, NodeId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        let node = &self.tree.nodes[id];
        self.stack
            .extend(node.children.iter().rev().map(|&child| (depth + 1, child)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<BranchName> {
        list.iter().map(|n| BranchName::new(*n).unwrap()).collect()
    }

    #[test]
    fn flat_names_are_roots() {
        let tree = BranchTree::build(&names(&["main", "develop"]));
        let labels: Vec<_> = tree.roots().iter().map(|&id| tree.node(id).label.clone()).collect();
        assert_eq!(labels, vec!["develop", "main"]);
        assert_eq!(tree.max_depth(), 0);
    }

    #[test]
    fn folders_group_shared_prefixes() {
        let tree = BranchTree::build(&names(&["feature/a", "feature/b", "fix/c"]));
        assert_eq!(tree.roots().len(), 2);

        let feature = tree.node(tree.roots()[0]);
        assert_eq!(feature.label, "feature");
        assert!(feature.is_folder());
        assert!(feature.branch.is_none());
        assert_eq!(feature.children.len(), 2);
        assert_eq!(tree.branch_count(), 3);
    }

    #[test]
    fn leaf_keeps_full_name() {
        let tree = BranchTree::build(&names(&["team/alice/wip"]));
        let leaf = tree.walk().last().unwrap().1;
        assert_eq!(leaf.label, "wip");
        assert_eq!(leaf.branch.as_ref().unwrap().as_str(), "team/alice/wip");
    }

    #[test]
    fn empty_input() {
        let tree = BranchTree::build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.walk().count(), 0);
    }

    #[test]
    fn very_deep_names_walk_without_recursion() {
        let deep = (0..5000).map(|i| format!("s{i}")).collect::<Vec<_>>().join("/");
        let tree = BranchTree::build(&names(&[deep.as_str()]));
        assert_eq!(tree.max_depth(), 4999);
        assert_eq!(tree.branch_count(), 1);
    }
}
