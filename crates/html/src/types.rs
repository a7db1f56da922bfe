use std::fmt;

/// Attribute list in source order. Valueless attributes (`<input disabled>`) carry `None`.
pub type Attributes = Vec<(String, Option<String>)>;

/// Index of a node inside a [`crate::Document`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document { doctype: Option<String> },
    Element { name: String, attributes: Attributes },
    Text { text: String },
    Comment { text: String },
}

impl NodeKind {
    pub fn allows_children(&self) -> bool {
        matches!(self, NodeKind::Document { .. } | NodeKind::Element { .. })
    }
}

/// One arena slot: the node payload plus its links.
///
/// Invariant: `parent` is `Some(p)` iff this node appears exactly once in `p`'s
/// `children`. Detached records stay in the arena with `parent == None` and are
/// unreachable from the root.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeRecord {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    UnknownNode(NodeId),
    WrongNodeKind(NodeId),
    InvalidParent(NodeId),
    Detached(NodeId),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownNode(id) => write!(f, "unknown node {id}"),
            TreeError::WrongNodeKind(id) => write!(f, "node {id} has the wrong kind"),
            TreeError::InvalidParent(id) => write!(f, "node {id} cannot have children"),
            TreeError::Detached(id) => write!(f, "node {id} is not attached to a parent"),
        }
    }
}

impl std::error::Error for TreeError {}
