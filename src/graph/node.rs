use std::fmt;

/// Identifier of a node inside a [`Graph`](super::Graph). Notation variables
/// such as `u_12` or `n12.` map to `NodeId(12)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<usize> for NodeId {
  fn from(id: usize) -> Self {
    Self(id)
  }
}

/// Everything a node carries besides its id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
  /// The node label. `None` is the wildcard: it matches (and is matched by) any label.
  pub name: Option<String>,
  /// Token this node was built from: the 1-based CoNLL-U id, or the index
  /// of a penman `~e.N` alignment
  pub token_id: Option<usize>,
  pub upos: Option<String>,
  /// Set on a node whose definition graph was attached below it
  pub expanded: bool,
  /// Set on a definition root that replaced the node it defines
  pub substituted: bool,
  /// Set on nodes brought in by a definition graph
  pub fourlang: bool,
  /// On matched subgraphs: the pattern variable this node was bound to
  pub mapping: Option<NodeId>,
}

impl NodeData {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      ..Default::default()
    }
  }

  pub fn wildcard() -> Self {
    Default::default()
  }

  pub fn with_token(mut self, token_id: usize) -> Self {
    self.token_id = Some(token_id);
    self
  }

  pub fn with_upos(mut self, upos: impl Into<String>) -> Self {
    self.upos = Some(upos.into());
    self
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn is_wildcard(&self) -> bool {
    self.name.is_none()
  }
}

/// A directed edge. The colour is the relation (deprel, AMR role, 4lang
/// edge type 0/1/2, ...). An edge without a colour is ignored by the dot
/// renderer and matches any pattern edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
  pub source: NodeId,
  pub target: NodeId,
  pub color: Option<String>,
}

impl Edge {
  pub fn new(source: NodeId, target: NodeId, color: Option<String>) -> Self {
    Self {
      source,
      target,
      color,
    }
  }

  pub fn color(&self) -> Option<&str> {
    self.color.as_deref()
  }

  pub fn endpoints(&self) -> (NodeId, NodeId) {
    (self.source, self.target)
  }
}

impl fmt::Display for Edge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.color {
      Some(c) => write!(f, "{} -{}-> {}", self.source, c, self.target),
      None => write!(f, "{} -> {}", self.source, self.target),
    }
  }
}
