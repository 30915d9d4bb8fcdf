//! Markup adapter
//!
//! Builds a [`Node`] tree from XML text. Tag names are kept qualified; matching code
//! strips namespace prefixes itself.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::DocumentAdapter;
use crate::error::FlattenError;
use crate::tree::{Node, DEFAULT_MAX_DEPTH};

/// XML → [`Node`] adapter.
///
/// Elements nested deeper than `max_depth` (root at depth 1) are rejected with
/// [`FlattenError::DepthExceeded`] while reading, before the tree is built.
#[derive(Debug, Clone, Copy)]
pub struct MarkupAdapter {
    max_depth: usize,
}

impl MarkupAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn check_depth(&self, open: &[Node], tag: &str) -> Result<(), FlattenError> {
        if open.len() >= self.max_depth {
            return Err(FlattenError::DepthExceeded {
                max_depth: self.max_depth,
                tag: tag.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MarkupAdapter {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

impl DocumentAdapter for MarkupAdapter {
    type Document = Node;

    fn parse(&self, raw: &str) -> Result<Node, FlattenError> {
        let mut reader = Reader::from_str(raw);
        reader.config_mut().trim_text(true);

        let mut open: Vec<Node> = Vec::new();
        let mut root: Option<Node> = None;

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|e| FlattenError::Markup(format!("at byte {}: {}", position, e)))?;

            match event {
                Event::Start(start) => {
                    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    self.check_depth(&open, &tag)?;
                    open.push(Node::new(tag));
                }
                Event::Empty(empty) => {
                    let tag = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                    self.check_depth(&open, &tag)?;
                    attach(&mut open, &mut root, Node::new(tag))?;
                }
                Event::End(_) => {
                    let node = open.pop().ok_or_else(|| {
                        FlattenError::Markup(format!("unexpected closing tag at byte {}", position))
                    })?;
                    attach(&mut open, &mut root, node)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| FlattenError::Markup(e.to_string()))?;
                    append_text(&mut open, &text)?;
                }
                Event::CData(cdata) => {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    append_text(&mut open, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(FlattenError::Markup(format!(
                "unclosed element <{}>",
                unclosed.tag()
            )));
        }
        root.ok_or_else(|| FlattenError::Markup("document has no root element".to_string()))
    }
}

/// Hand a finished element to its parent, or make it the root
fn attach(open: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), FlattenError> {
    match open.last_mut() {
        Some(parent) => {
            parent.push_child(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(FlattenError::Markup(format!(
            "multiple root elements; second is <{}>",
            node.tag()
        ))),
    }
}

fn append_text(open: &mut [Node], text: &str) -> Result<(), FlattenError> {
    match open.last_mut() {
        Some(node) => {
            node.append_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(FlattenError::Markup(
            "text content outside the root element".to_string(),
        )),
    }
}
