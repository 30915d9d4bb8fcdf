//! Lazy preorder traversal emitting (path, leaf fields) records

use std::slice;

use super::node::Node;
use super::path::Path;
use crate::error::FlattenError;

/// Default bound on path depth
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Direct children of a node that carry non-empty text, as (local name, trimmed text).
///
/// Names may repeat; [`LeafFields::get`] returns the first and
/// [`LeafFields::duplicate_name`] reports the repetition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeafFields(Vec<(String, String)>);

impl LeafFields {
    pub fn of(node: &Node) -> Self {
        Self(
            node.children()
                .iter()
                .filter_map(|child| {
                    child
                        .trimmed_text()
                        .map(|text| (child.local_name().to_string(), text.to_string()))
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First field with the given name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// First name that occurs more than once
    pub fn duplicate_name(&self) -> Option<&str> {
        self.0
            .iter()
            .enumerate()
            .find(|(idx, (name, _))| self.0[..*idx].iter().any(|(seen, _)| seen == name))
            .map(|(_, (name, _))| name.as_str())
    }
}

/// One emission of the walker
#[derive(Debug, Clone)]
pub struct LeafRecord<'a> {
    pub path: Path<'a>,
    pub fields: LeafFields,
}

struct Frame<'a> {
    path: Path<'a>,
    children: slice::Iter<'a, Node>,
}

/// Single-pass preorder walker over a borrowed tree.
///
/// Yields a [`LeafRecord`] for every node with at least one text-bearing child, in
/// document order. Auxiliary space is one frame per open ancestor. When a path would
/// grow past `max_depth` the walker yields [`FlattenError::DepthExceeded`] once and
/// then ends.
pub struct TreeWalker<'a> {
    root: Option<&'a Node>,
    stack: Vec<Frame<'a>>,
    max_depth: usize,
    visited: usize,
}

impl<'a> TreeWalker<'a> {
    pub fn new(root: &'a Node) -> Self {
        Self::with_max_depth(root, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(root: &'a Node, max_depth: usize) -> Self {
        Self {
            root: Some(root),
            stack: Vec::new(),
            max_depth,
            visited: 0,
        }
    }

    /// Nodes entered so far
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Enter a node: record the visit and open a frame for its children
    fn enter(&mut self, path: Path<'a>) -> Result<Option<LeafRecord<'a>>, FlattenError> {
        let node = path.last();
        if path.depth() > self.max_depth {
            self.stack.clear();
            return Err(FlattenError::DepthExceeded {
                max_depth: self.max_depth,
                tag: node.tag().to_string(),
            });
        }

        self.visited += 1;
        self.stack.push(Frame {
            path: path.clone(),
            children: node.children().iter(),
        });

        let fields = LeafFields::of(node);
        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(LeafRecord { path, fields }))
        }
    }
}

impl<'a> Iterator for TreeWalker<'a> {
    type Item = Result<LeafRecord<'a>, FlattenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            match self.enter(Path::root(root)) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }

        loop {
            let frame = self.stack.last_mut()?;
            match frame.children.next() {
                Some(child) => {
                    let path = frame.path.child(child);
                    match self.enter(path) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Node {
        Node::new("root")
            .with_field("title", "top")
            .with_child(
                Node::new("a")
                    .with_field("x", " 1 ")
                    .with_child(Node::new("b").with_field("y", "2"))
                    .with_child(Node::new("empty")),
            )
            .with_child(Node::new("c").with_field("z", "   "))
            .with_child(Node::new("d").with_field("w", "4"))
    }

    fn collect(root: &Node) -> Vec<LeafRecord<'_>> {
        TreeWalker::new(root).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_preorder_emission() {
        let tree = sample_tree();
        let records = collect(&tree);

        let paths: Vec<String> = records.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(paths, vec!["/root", "/root/a", "/root/a/b", "/root/d"]);
        assert_eq!(records[1].fields.get("x"), Some("1"));
        assert_eq!(records[0].fields.len(), 1);
    }

    #[test]
    fn test_duplicate_field_names() {
        let node = Node::new("e")
            .with_field("a", "1")
            .with_field("b", "2")
            .with_field("x:a", "3");
        let fields = LeafFields::of(&node);
        assert_eq!(fields.duplicate_name(), Some("a"));
        assert_eq!(fields.get("a"), Some("1"));

        let unique = LeafFields::of(&Node::new("e").with_field("a", "1").with_field("b", "2"));
        assert_eq!(unique.duplicate_name(), None);
    }

    #[test]
    fn test_visits_every_node_once() {
        let tree = sample_tree();
        let mut walker = TreeWalker::new(&tree);
        for record in walker.by_ref() {
            record.unwrap();
        }
        assert_eq!(walker.visited(), tree.subtree_len());
    }

    #[test]
    fn test_last_node_is_child_of_previous() {
        let tree = sample_tree();
        for record in collect(&tree) {
            if let Some(parent) = record.path.parent() {
                let last = record.path.last();
                assert!(parent
                    .last()
                    .children()
                    .iter()
                    .any(|c| std::ptr::eq(c, last)));
                assert_eq!(parent.depth() + 1, record.path.depth());
            }
        }
    }

    #[test]
    fn test_emitted_paths_survive_later_steps() {
        let tree = sample_tree();
        let mut walker = TreeWalker::new(&tree);
        let first = walker.next().unwrap().unwrap();
        let rest: Vec<_> = walker.collect();

        assert_eq!(rest.len(), 3);
        assert_eq!(first.path.local_names(), vec!["root"]);
    }

    #[test]
    fn test_single_pass() {
        let tree = sample_tree();
        let mut walker = TreeWalker::new(&tree);
        assert_eq!(walker.by_ref().count(), 4);
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_depth_bound() {
        let mut deep = Node::new("n5").with_field("v", "x");
        for i in (0..5).rev() {
            deep = Node::new(format!("n{}", i)).with_child(deep);
        }

        let results: Vec<_> = TreeWalker::with_max_depth(&deep, 3).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(FlattenError::DepthExceeded { max_depth: 3, .. })
        ));

        // text-bearing leaves sit one level below n5
        let ok: Vec<_> = TreeWalker::with_max_depth(&deep, 7).collect();
        assert_eq!(ok.len(), 1);
        assert!(ok[0].is_ok());
    }
}
