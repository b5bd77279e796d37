//! Arena-backed relationship forests
//!
//! Each forest is a sequence of ELR frames whose descendants are concept
//! nodes. Rows arrive flat with a depth, so insertion keeps a cursor holding
//! the most recently appended node at every depth below the current frame;
//! a row at depth D attaches to `cursor[D - 1]` (or the frame when D is 0).

use crate::model::LinkbaseKind;
use compact_str::CompactString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    Root,
    ParentChild,
    /// Resolved to a dimensional arcrole when the arc is emitted.
    PendingDimension,
    SummationItem(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Frame {
        role_uri: Option<String>,
        title: Option<String>,
    },
    Concept {
        prefix: CompactString,
        name: CompactString,
        relation: Relation,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    #[error("no ELR section precedes this row")]
    NoFrame,
    #[error("depth {depth} has no ancestor chain (deepest insertable depth is {available})")]
    MissingAncestor { depth: usize, available: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<Node>,
    frames: Vec<NodeId>,
    cursor: Vec<NodeId>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        id
    }

    /// Starts a new ELR frame; later rows attach below it.
    pub fn push_frame(&mut self, role_uri: Option<String>, title: Option<String>) -> NodeId {
        let id = self.alloc(NodeKind::Frame { role_uri, title });
        self.frames.push(id);
        self.cursor.clear();
        id
    }

    /// Appends a concept node at `depth` below the current frame.
    pub fn insert_at_depth(
        &mut self,
        depth: usize,
        prefix: &str,
        name: &str,
        relation: Relation,
    ) -> Result<NodeId, InsertError> {
        let frame = *self.frames.last().ok_or(InsertError::NoFrame)?;
        if depth > self.cursor.len() {
            return Err(InsertError::MissingAncestor {
                depth,
                available: self.cursor.len(),
            });
        }
        let parent = match depth {
            0 => frame,
            d => self.cursor[d - 1],
        };

        let id = self.alloc(NodeKind::Concept {
            prefix: CompactString::from(prefix),
            name: CompactString::from(name),
            relation,
        });
        self.nodes[parent.0].children.push(id);
        self.cursor.truncate(depth);
        self.cursor.push(id);
        Ok(id)
    }

    pub fn frames(&self) -> &[NodeId] {
        &self.frames
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Number of concept nodes.
    pub fn concept_count(&self) -> usize {
        self.nodes.len() - self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The presentation, definition and calculation forests.
#[derive(Debug, Clone, Default)]
pub struct Forests {
    pub presentation: Forest,
    pub definition: Forest,
    pub calculation: Forest,
}

impl Forests {
    pub fn get(&self, kind: LinkbaseKind) -> &Forest {
        match kind {
            LinkbaseKind::Presentation => &self.presentation,
            LinkbaseKind::Definition => &self.definition,
            LinkbaseKind::Calculation => &self.calculation,
        }
    }

    pub fn get_mut(&mut self, kind: LinkbaseKind) -> &mut Forest {
        match kind {
            LinkbaseKind::Presentation => &mut self.presentation,
            LinkbaseKind::Definition => &mut self.definition,
            LinkbaseKind::Calculation => &mut self.calculation,
        }
    }
}
