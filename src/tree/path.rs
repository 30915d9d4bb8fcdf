//! Persistent ancestor paths
//!
//! A [`Path`] is a reference-counted cons chain from the current node back to the
//! root. Extending a path allocates one link and shares the parent's history, so an
//! emitted path can never be changed by later traversal steps.

use std::fmt;
use std::rc::Rc;

use super::node::Node;

struct Link<'a> {
    node: &'a Node,
    parent: Option<Rc<Link<'a>>>,
    depth: usize,
}

/// Immutable root-to-node chain of borrowed nodes
#[derive(Clone)]
pub struct Path<'a> {
    head: Rc<Link<'a>>,
}

impl<'a> Path<'a> {
    /// Path consisting of the root alone
    pub fn root(node: &'a Node) -> Self {
        Self {
            head: Rc::new(Link {
                node,
                parent: None,
                depth: 1,
            }),
        }
    }

    /// New path one level deeper; `self` is left untouched
    pub fn child(&self, node: &'a Node) -> Self {
        Self {
            head: Rc::new(Link {
                node,
                parent: Some(Rc::clone(&self.head)),
                depth: self.head.depth + 1,
            }),
        }
    }

    /// Number of nodes in the path, root included
    pub fn depth(&self) -> usize {
        self.head.depth
    }

    /// The node this path ends at
    pub fn last(&self) -> &'a Node {
        self.head.node
    }

    pub fn parent(&self) -> Option<Path<'a>> {
        self.head.parent.as_ref().map(|link| Path {
            head: Rc::clone(link),
        })
    }

    /// Nodes from root to the current node
    pub fn nodes(&self) -> Vec<&'a Node> {
        let mut nodes = Vec::with_capacity(self.depth());
        let mut cursor = Some(&self.head);
        while let Some(link) = cursor {
            nodes.push(link.node);
            cursor = link.parent.as_ref();
        }
        nodes.reverse();
        nodes
    }

    /// Node at a root-relative position
    pub fn get(&self, index: usize) -> Option<&'a Node> {
        if index >= self.depth() {
            return None;
        }
        let mut cursor = &self.head;
        while cursor.depth > index + 1 {
            cursor = cursor.parent.as_ref()?;
        }
        Some(cursor.node)
    }

    pub fn first(&self) -> &'a Node {
        let mut cursor = &self.head;
        while let Some(parent) = cursor.parent.as_ref() {
            cursor = parent;
        }
        cursor.node
    }

    /// Local tag names from root to the current node
    pub fn local_names(&self) -> Vec<&'a str> {
        self.nodes().into_iter().map(Node::local_name).collect()
    }

    /// Whether the path below the root is exactly `pattern`
    pub fn matches_below_root<S: AsRef<str>>(&self, pattern: &[S]) -> bool {
        if self.depth() != pattern.len() + 1 {
            return false;
        }
        let mut cursor = &self.head;
        for expected in pattern.iter().rev() {
            if cursor.node.local_name() != expected.as_ref() {
                return false;
            }
            match cursor.parent.as_ref() {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
        true
    }
}

impl fmt::Debug for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.local_names()).finish()
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.local_names().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_does_not_affect_parent() {
        let a = Node::new("a");
        let b = Node::new("b");
        let c = Node::new("c");

        let root = Path::root(&a);
        let ab = root.child(&b);
        let ac = root.child(&c);

        assert_eq!(root.depth(), 1);
        assert_eq!(ab.local_names(), vec!["a", "b"]);
        assert_eq!(ac.local_names(), vec!["a", "c"]);
        assert_eq!(ab.to_string(), "/a/b");
    }

    #[test]
    fn test_get_and_first() {
        let a = Node::new("a");
        let b = Node::new("b");
        let c = Node::new("c");
        let path = Path::root(&a).child(&b).child(&c);

        assert_eq!(path.get(0).map(Node::tag), Some("a"));
        assert_eq!(path.get(1).map(Node::tag), Some("b"));
        assert_eq!(path.get(2).map(Node::tag), Some("c"));
        assert!(path.get(3).is_none());
        assert_eq!(path.first().tag(), "a");
        assert_eq!(path.parent().map(|p| p.last().tag()), Some("b"));
    }

    #[test]
    fn test_matches_below_root() {
        let root = Node::new("Customers");
        let rec = Node::new("ns:CustomerRecord");
        let data = Node::new("CustomerEventData");
        let path = Path::root(&root).child(&rec).child(&data);

        assert!(path.matches_below_root(&["CustomerRecord", "CustomerEventData"]));
        assert!(!path.matches_below_root(&["CustomerRecord"]));
        assert!(!path.matches_below_root(&["customerrecord", "CustomerEventData"]));
        assert!(Path::root(&root).matches_below_root::<&str>(&[]));
    }
}
