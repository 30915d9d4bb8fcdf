//! Owned hierarchical node

/// A named node with ordered children and optional text content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    tag: String,
    children: Vec<Node>,
    text: Option<String>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Builder: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append a text-only child
    pub fn with_field(self, tag: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_child(Node::new(tag).with_text(text))
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Append a text segment to this node's content
    pub fn append_text(&mut self, segment: &str) {
        match &mut self.text {
            Some(text) => text.push_str(segment),
            None => self.text = Some(segment.to_string()),
        }
    }

    /// Qualified tag as it appeared in the source
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Tag with any namespace prefix (`ns:Tag` or `{uri}Tag`) removed
    pub fn local_name(&self) -> &str {
        local_name(&self.tag)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Trimmed text, or None when absent or blank
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// First direct child whose local name equals `name`
    pub fn first_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    /// Total number of nodes in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }
}

// Children are released from a heap worklist so arbitrarily deep trees never
// recurse on drop.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Strip a namespace prefix from a tag name
pub fn local_name(tag: &str) -> &str {
    if let Some(rest) = tag.strip_prefix('{') {
        if let Some(end) = rest.find('}') {
            return &rest[end + 1..];
        }
    }
    match tag.rfind(':') {
        Some(idx) => &tag[idx + 1..],
        None => tag,
    }
}
