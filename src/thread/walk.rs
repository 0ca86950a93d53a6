//! Read-only traversal surface for presentation collaborators.
//!
//! Collaborators compose nested UI from `children_of` or drive a
//! `ThreadVisitor` over the loaded tree. Per-node behavior (reply, react,
//! delete, load-more) is dispatched through the capability set rather than
//! injected into child components. The walk never fetches; loading is always
//! an explicit loader call.

use crate::models::comment::CommentNode;
use crate::models::page::ScopeId;
use crate::thread::{depth, ThreadView};

/// One loaded direct child of a scope, annotated for rendering.
#[derive(Debug)]
pub struct ChildEntry<'a> {
    pub node: &'a CommentNode,
    pub loaded_children: usize,
    pub total_children: i64,
    pub has_more_children: bool,
}

/// What the current viewer may do with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_reply: bool,
    pub can_react: bool,
    pub can_delete: bool,
}

/// Node plus everything a visitor needs to dispatch behavior.
#[derive(Debug)]
pub struct NodeContext<'a> {
    pub node: &'a CommentNode,
    pub capabilities: Capabilities,
    pub has_more_children: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    Continue,
    SkipChildren,
    Stop,
}

pub trait ThreadVisitor {
    fn visit(&mut self, ctx: &NodeContext<'_>) -> VisitFlow;
}

impl ThreadView {
    pub fn node(&self, id: &str) -> Option<&CommentNode> {
        self.tree.node(id)
    }

    /// Ordered loaded children of a scope, each annotated with whether the
    /// server knows about more children than are loaded.
    pub fn children_of(&self, scope: &ScopeId) -> Vec<ChildEntry<'_>> {
        self.tree
            .loaded_children(scope)
            .iter()
            .filter_map(|id| self.tree.node(id))
            .map(|node| {
                let child_scope = ScopeId::Node(node.id.clone());
                let loaded = self.tree.loaded_count(&child_scope);
                let total = self.tree.total_children(&child_scope);
                ChildEntry {
                    node,
                    loaded_children: loaded,
                    total_children: total,
                    has_more_children: total > loaded as i64,
                }
            })
            .collect()
    }

    pub fn has_more(&self, scope: &ScopeId) -> bool {
        self.tree.total_children(scope) > self.tree.loaded_count(scope) as i64
    }

    /// Depth-first walk over the loaded tree in display order.
    pub fn walk(&self, visitor: &mut dyn ThreadVisitor) {
        self.walk_scope(&ScopeId::Root, visitor);
    }

    fn walk_scope(&self, scope: &ScopeId, visitor: &mut dyn ThreadVisitor) -> VisitFlow {
        for id in self.tree.loaded_children(scope) {
            let Some(node) = self.tree.node(id) else {
                continue;
            };
            let child_scope = ScopeId::Node(node.id.clone());
            let ctx = NodeContext {
                node,
                capabilities: self.capabilities_for(node),
                has_more_children: self.has_more(&child_scope),
            };
            match visitor.visit(&ctx) {
                VisitFlow::Stop => return VisitFlow::Stop,
                VisitFlow::SkipChildren => continue,
                VisitFlow::Continue => {
                    if self.walk_scope(&child_scope, visitor) == VisitFlow::Stop {
                        return VisitFlow::Stop;
                    }
                }
            }
        }
        VisitFlow::Continue
    }

    fn capabilities_for(&self, node: &CommentNode) -> Capabilities {
        let signed_in = self.viewer.is_some();
        let live = !node.is_tombstone();
        Capabilities {
            can_reply: signed_in && live && depth::can_attach(node.depth),
            can_react: signed_in && live,
            can_delete: live && self.viewer.as_deref() == Some(node.author_id.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::testutil::{node, page};

    fn loaded_view() -> ThreadView {
        let mut v = ThreadView::new("s1", Some("author-1".to_string()), 10).unwrap();
        let t = v.begin_fetch(&ScopeId::Root).unwrap().unwrap();
        let mut a = node("a", None, 0);
        a.child_count = 3;
        v.apply_fetch(t, page(vec![a, node("b", None, 0)], None, 2));
        let t = v.begin_fetch(&ScopeId::Node("a".to_string())).unwrap().unwrap();
        v.apply_fetch(
            t,
            page(vec![node("a1", Some("a"), 1)], Some("a1".to_string()), 3),
        );
        v
    }

    struct Collector {
        seen: Vec<String>,
        stop_at: Option<String>,
    }

    impl ThreadVisitor for Collector {
        fn visit(&mut self, ctx: &NodeContext<'_>) -> VisitFlow {
            self.seen.push(ctx.node.id.clone());
            if self.stop_at.as_deref() == Some(ctx.node.id.as_str()) {
                return VisitFlow::Stop;
            }
            VisitFlow::Continue
        }
    }

    #[test]
    fn children_are_annotated_with_has_more() {
        let v = loaded_view();
        let roots = v.children_of(&ScopeId::Root);
        assert_eq!(roots.len(), 2);
        let a = &roots[0];
        assert_eq!(a.node.id, "a");
        assert_eq!(a.loaded_children, 1);
        assert_eq!(a.total_children, 3);
        assert!(a.has_more_children);
        assert!(!roots[1].has_more_children);
    }

    #[test]
    fn walk_visits_loaded_nodes_in_display_order() {
        let v = loaded_view();
        let mut c = Collector {
            seen: Vec::new(),
            stop_at: None,
        };
        v.walk(&mut c);
        assert_eq!(c.seen, ["a", "a1", "b"]);
    }

    #[test]
    fn walk_stops_on_request() {
        let v = loaded_view();
        let mut c = Collector {
            seen: Vec::new(),
            stop_at: Some("a1".to_string()),
        };
        v.walk(&mut c);
        assert_eq!(c.seen, ["a", "a1"]);
    }

    #[test]
    fn capabilities_respect_viewer_depth_and_tombstones() {
        let mut v = ThreadView::new("s1", Some("author-1".to_string()), 10).unwrap();
        let t = v.begin_fetch(&ScopeId::Root).unwrap().unwrap();
        let mut dead = node("dead", None, 0);
        dead.content = String::new();
        v.apply_fetch(t, page(vec![node("a", None, 0), dead], None, 2));
        let t = v.begin_fetch(&ScopeId::Node("a".to_string())).unwrap().unwrap();
        v.apply_fetch(t, page(vec![node("a1", Some("a"), 1)], None, 1));
        let t = v.begin_fetch(&ScopeId::Node("a1".to_string())).unwrap().unwrap();
        v.apply_fetch(t, page(vec![node("a1x", Some("a1"), 2)], None, 1));

        struct Caps(std::collections::HashMap<String, Capabilities>);
        impl ThreadVisitor for Caps {
            fn visit(&mut self, ctx: &NodeContext<'_>) -> VisitFlow {
                self.0.insert(ctx.node.id.clone(), ctx.capabilities);
                VisitFlow::Continue
            }
        }
        let mut caps = Caps(std::collections::HashMap::new());
        v.walk(&mut caps);

        // Author may delete their own live comment and reply below the limit.
        assert!(caps.0["a"].can_delete && caps.0["a"].can_reply);
        // Max-depth node may not grow further.
        assert!(!caps.0["a1x"].can_reply);
        // Tombstones expose no actions.
        let dead = caps.0["dead"];
        assert!(!dead.can_reply && !dead.can_react && !dead.can_delete);
    }
}
