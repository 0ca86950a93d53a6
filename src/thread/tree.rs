//! In-memory assembly of a story's comment tree from fetched pages.
//!
//! The tree is the single shared structure behind one thread view. Only the
//! merge path here and the reconciler may mutate it; every other collaborator
//! reads through the walk API.

use std::collections::HashMap;

use tracing::warn;

use crate::models::comment::CommentNode;
use crate::models::page::{ChildPage, ScopeId};
use crate::thread::depth;

#[derive(Debug, Clone, Copy)]
struct ScopeTotal {
    /// Issue sequence number of the fetch that reported this total.
    seq: u64,
    total: i64,
}

#[derive(Debug)]
pub struct ThreadTree {
    story_id: String,
    nodes: HashMap<String, CommentNode>,
    /// Ordered ids of the loaded direct children per scope. Always a
    /// contiguous run of the server's ordered child list, never sparse.
    children: HashMap<ScopeId, Vec<String>>,
    totals: HashMap<ScopeId, ScopeTotal>,
}

impl ThreadTree {
    pub fn new(story_id: impl Into<String>) -> Self {
        Self {
            story_id: story_id.into(),
            nodes: HashMap::new(),
            children: HashMap::new(),
            totals: HashMap::new(),
        }
    }

    pub fn story_id(&self) -> &str {
        &self.story_id
    }

    pub fn node(&self, id: &str) -> Option<&CommentNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut CommentNode> {
        self.nodes.get_mut(id)
    }

    pub fn loaded_children(&self, scope: &ScopeId) -> &[String] {
        self.children.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn loaded_count(&self, scope: &ScopeId) -> usize {
        self.loaded_children(scope).len()
    }

    /// The freshest known total child count for a scope. Falls back to the
    /// node's own `child_count` before any page for the scope has landed.
    pub fn total_children(&self, scope: &ScopeId) -> i64 {
        if let Some(t) = self.totals.get(scope) {
            return t.total;
        }
        match scope {
            ScopeId::Root => 0,
            ScopeId::Node(id) => self.nodes.get(id).map(|n| n.child_count).unwrap_or(0),
        }
    }

    /// Merges one fetched page into the scope's loaded-children list and
    /// returns how many new nodes were added.
    ///
    /// Duplicate ids keep their first occurrence and whatever local mutation
    /// state it has accumulated. Nodes with out-of-bounds or inconsistent
    /// depth never enter the tree.
    pub fn merge_page(&mut self, scope: &ScopeId, seq: u64, page: ChildPage) -> usize {
        let mut added = 0;
        for item in page.items {
            if !self.accepts(scope, &item) {
                warn!(
                    "Dropping malformed node {} (depth {}) from scope {}",
                    item.id, item.depth, scope
                );
                continue;
            }
            if self.nodes.contains_key(&item.id) {
                continue;
            }
            let id = item.id.clone();
            self.nodes.insert(id.clone(), item);
            self.children.entry(scope.clone()).or_default().push(id);
            added += 1;
        }

        let fresher = self.totals.get(scope).map_or(true, |t| seq > t.seq);
        if fresher {
            self.totals.insert(
                scope.clone(),
                ScopeTotal {
                    seq,
                    total: page.total_child_count,
                },
            );
            if let ScopeId::Node(parent_id) = scope {
                if let Some(parent) = self.nodes.get_mut(parent_id) {
                    parent.child_count = page.total_child_count;
                }
            }
        }

        added
    }

    fn accepts(&self, scope: &ScopeId, item: &CommentNode) -> bool {
        if !depth::is_visible(item.depth) || item.story_id != self.story_id {
            return false;
        }
        match scope {
            ScopeId::Root => item.parent_id.is_none() && item.depth == depth::MIN_DEPTH,
            ScopeId::Node(parent_id) => {
                if item.parent_id.as_deref() != Some(parent_id.as_str()) {
                    return false;
                }
                match self.nodes.get(parent_id) {
                    Some(parent) => item.depth == depth::child_depth(parent.depth),
                    // Parent not loaded locally; bounds check above still holds.
                    None => true,
                }
            }
        }
    }

    /// Unloads everything beneath a scope: the loaded-children list, every
    /// loaded descendant node, and their pagination totals. The scope's own
    /// node (if any) stays in place. Returns the evicted node ids.
    pub fn evict_scope(&mut self, scope: &ScopeId) -> Vec<String> {
        let mut evicted = Vec::new();
        self.totals.remove(scope);
        let Some(child_ids) = self.children.remove(scope) else {
            return evicted;
        };
        for id in child_ids {
            let nested = self.evict_scope(&ScopeId::Node(id.clone()));
            evicted.extend(nested);
            self.nodes.remove(&id);
            evicted.push(id);
        }
        evicted
    }
}
