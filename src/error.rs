use thiserror::Error;

use crate::graph::NodeId;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed notation, pattern or CoNLL-U text
  #[error("parse error: {0}")]
  Parse(String),
  /// The graph can't be written out starting from its top node
  #[error("layout error: {0}")]
  Layout(String),
  #[error("graph is not connected ({components} components)")]
  UnconnectedGraph { components: usize },
  #[error("no such node: {0}")]
  UnknownNode(NodeId),
  /// A relational operand matched a subgraph without a unique in-degree-0 node
  #[error("matched subgraph has {roots} root candidates, expected exactly one")]
  AmbiguousRoot { roots: usize },
  #[error("pattern variable {0} is not bound by the match")]
  UnboundVariable(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
