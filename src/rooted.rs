use std::ops::Deref;
use std::str::FromStr;

use crate::graph::{Graph, NodeId};
use crate::{Error, Result};

/// A graph with exactly one designated root node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootedGraph {
  graph: Graph,
  root: NodeId,
}

impl RootedGraph {
  pub fn new(graph: Graph, root: NodeId) -> Result<Self> {
    if !graph.contains_node(root) {
      return Err(Error::UnknownNode(root));
    }
    Ok(Self { graph, root })
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn into_inner(self) -> Graph {
    self.graph
  }

  /// Penman string laid out from the root, which is marked `<root>`
  pub fn to_penman(&self) -> Result<String> {
    self.graph.to_penman_from(self.root, true)
  }

  pub fn to_bolinas(&self, external: Option<NodeId>, keep_node_ids: bool) -> Result<String> {
    self.graph.to_bolinas(self.root, external, keep_node_ids)
  }

  pub(crate) fn parts_mut(&mut self) -> (&mut Graph, &mut NodeId) {
    (&mut self.graph, &mut self.root)
  }
}

impl Deref for RootedGraph {
  type Target = Graph;

  fn deref(&self) -> &Graph {
    &self.graph
  }
}

/// Parses a penman string that marks exactly one node `<root>`
impl FromStr for RootedGraph {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match Graph::from_penman(s)? {
      (graph, Some(root)) => Self::new(graph, root),
      (_, None) => Err(Error::Parse("no node is marked <root>".to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::NodeData;

  #[test]
  fn test_parse_rooted() {
    let g: RootedGraph = "(u_2 / dog  :0-of (u_5<root> / bark))".parse().unwrap();
    assert_eq!(g.root(), NodeId(5));
    assert_eq!(g.name(g.root()), Some("bark"));
    assert_eq!(g.to_penman().unwrap(), "(u_5<root> / bark  :0 (u_2 / dog))");

    assert!("(u_2 / dog)".parse::<RootedGraph>().is_err());
  }

  #[test]
  fn test_root_has_to_exist() {
    let mut graph = Graph::new();
    graph.add_node(NodeId(1), NodeData::new("a"));
    assert!(matches!(
      RootedGraph::new(graph.clone(), NodeId(2)),
      Err(Error::UnknownNode(NodeId(2)))
    ));
    let rooted = RootedGraph::new(graph, NodeId(1)).unwrap();
    assert_eq!(rooted.to_bolinas(None, true).unwrap(), "(n1. :a)");
  }
}
