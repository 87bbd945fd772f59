use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::EndpointDescriptor;

/// One folder of the endpoint tree. The root node is the unnamed folder.
///
/// The tree borrows from the endpoint list it was built from and is meant to
/// be rebuilt whenever that list changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FolderNode<'a> {
    pub items: Vec<&'a EndpointDescriptor>,
    pub children: BTreeMap<String, FolderNode<'a>>,
}

/// Splits a folder path into its non-empty segments.
///
/// `" /a//b/ "` yields `["a", "b"]`; an empty or slash-only path is the root.
pub fn folder_segments(path: &str) -> Vec<&str> {
    path.trim().split('/').filter(|segment| !segment.is_empty()).collect()
}

pub fn build_tree(endpoints: &[EndpointDescriptor]) -> FolderNode<'_> {
    let mut root = FolderNode::default();
    for endpoint in endpoints {
        let mut node = &mut root;
        for segment in folder_segments(&endpoint.folder_path) {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.items.push(endpoint);
    }
    root
}

/// Every folder path in use, including parent folders, sorted and unique.
pub fn folder_suggestions(endpoints: &[EndpointDescriptor]) -> Vec<String> {
    let mut paths = BTreeSet::new();
    for endpoint in endpoints {
        let segments = folder_segments(&endpoint.folder_path);
        for depth in 1..=segments.len() {
            paths.insert(segments[..depth].join("/"));
        }
    }
    paths.into_iter().collect()
}

impl<'a> FolderNode<'a> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.children.is_empty()
    }

    /// Number of endpoints in this folder and all of its sub-folders.
    pub fn endpoint_count(&self) -> usize {
        self.items.len()
            + self
                .children
                .values()
                .map(FolderNode::endpoint_count)
                .sum::<usize>()
    }

    /// Resolves a folder path relative to this node.
    pub fn get(&self, path: &str) -> Option<&FolderNode<'a>> {
        folder_segments(path)
            .into_iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Folder path of the node holding `endpoint_id`, if any.
    pub fn locate(&self, endpoint_id: &str) -> Option<String> {
        self.walk()
            .into_iter()
            .find(|entry| entry.node.items.iter().any(|ep| ep.id == endpoint_id))
            .map(|entry| entry.path)
    }

    /// Depth-first listing in display order: this node first, then each
    /// child folder alphabetically. Paths are slash-joined; the root is `""`
    /// at depth 0.
    pub fn walk(&self) -> Vec<WalkEntry<'_, 'a>> {
        let mut out = Vec::new();
        self.walk_into(String::new(), "", 0, &mut out);
        out
    }

    fn walk_into<'n>(&'n self, path: String, name: &'n str, depth: usize, out: &mut Vec<WalkEntry<'n, 'a>>) {
        out.push(WalkEntry {
            path: path.clone(),
            name,
            depth,
            node: self,
        });
        for (child_name, child) in &self.children {
            let child_path = if depth == 0 {
                child_name.clone()
            } else {
                format!("{path}/{child_name}")
            };
            child.walk_into(child_path, child_name, depth + 1, out);
        }
    }
}

/// One folder visited by [`FolderNode::walk`].
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEntry<'n, 'a> {
    pub path: String,
    /// Folder name as stored in the tree; empty for the root.
    pub name: &'n str,
    /// Number of folders above this one; the root is 0.
    pub depth: usize,
    pub node: &'n FolderNode<'a>,
}
