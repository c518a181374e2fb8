mod algo;
mod dot;
mod node;

use std::collections::{HashMap, HashSet};

use petgraph::Direction::{self, Incoming, Outgoing};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

pub use algo::Disconnected;
pub use dot::EdgePalette;
pub use node::{Edge, NodeData, NodeId};

/// A stored node: its id, and its data unless it is a placeholder
#[derive(Debug, Clone)]
struct Slot {
  id: NodeId,
  data: Option<NodeData>,
}

/// A directed graph with labeled nodes and coloured edges, at most one edge
/// per ordered node pair.
///
/// Nodes and edges keep their insertion order, which is what the notation
/// encoders lay graphs out by. A node can exist without any data: endpoints
/// that `add_edge` had to create are such placeholders until `add_node` gives
/// them data.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// Compacted after every removal, so indices follow insertion order
  inner: StableDiGraph<Slot, Edge>,
  index: HashMap<NodeId, NodeIndex>,
}

impl Graph {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn node_count(&self) -> usize {
    self.inner.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.inner.edge_count()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.node_count() == 0
  }

  fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
    self.index.get(&id).copied()
  }

  /// Adds a node, or replaces the data of an existing one
  pub fn add_node(&mut self, id: NodeId, data: NodeData) {
    let ix = self.ensure_node(id);
    self.inner[ix].data = Some(data);
  }

  fn ensure_node(&mut self, id: NodeId) -> NodeIndex {
    if let Some(ix) = self.index_of(id) {
      return ix;
    }
    let ix = self.inner.add_node(Slot { id, data: None });
    self.index.insert(id, ix);
    ix
  }

  /// Adds an edge, creating placeholder endpoints as needed. Re-adding an
  /// existing edge with a colour recolours it.
  pub fn add_edge(&mut self, source: NodeId, target: NodeId, color: Option<String>) {
    let s = self.ensure_node(source);
    let t = self.ensure_node(target);
    match self.inner.find_edge(s, t) {
      Some(ix) => {
        if color.is_some() {
          self.inner[ix].color = color;
        }
      }
      None => {
        self.inner.add_edge(s, t, Edge::new(source, target, color));
      }
    }
  }

  fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeIndex> {
    self.inner.find_edge(self.index_of(source)?, self.index_of(target)?)
  }

  pub fn contains_node(&self, id: NodeId) -> bool {
    self.index.contains_key(&id)
  }

  pub fn contains_edge(&self, source: NodeId, target: NodeId) -> bool {
    self.find_edge(source, target).is_some()
  }

  /// Data of a node, `None` for unknown nodes and for placeholders
  pub fn node(&self, id: NodeId) -> Option<&NodeData> {
    let ix = self.index_of(id)?;
    self.inner[ix].data.as_ref()
  }

  /// Mutable data of a node. Placeholders get empty data on first access.
  pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
    let ix = self.index_of(id)?;
    Some(self.inner[ix].data.get_or_insert_with(NodeData::default))
  }

  pub fn name(&self, id: NodeId) -> Option<&str> {
    self.node(id).and_then(NodeData::name)
  }

  /// Node ids in insertion order
  pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
    self.inner.node_indices().map(move |ix| self.inner[ix].id)
  }

  pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Option<&NodeData>)> + '_ {
    self.inner.node_indices().map(move |ix| {
      let slot = &self.inner[ix];
      (slot.id, slot.data.as_ref())
    })
  }

  /// Edges in insertion order
  pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
    self.inner.edge_indices().map(move |ix| &self.inner[ix])
  }

  pub fn edge(&self, source: NodeId, target: NodeId) -> Option<&Edge> {
    let ix = self.find_edge(source, target)?;
    self.inner.edge_weight(ix)
  }

  /// Edges leaving (or entering) `id`, oldest first
  fn edges_directed(&self, id: NodeId, dir: Direction) -> Vec<EdgeIndex> {
    let Some(ix) = self.index_of(id) else {
      return Vec::new();
    };
    let mut edges = self.inner.edges_directed(ix, dir).map(|e| e.id()).collect::<Vec<_>>();
    edges.sort();
    edges
  }

  pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
    self
      .edges_directed(id, Outgoing)
      .into_iter()
      .map(|e| self.inner[e].target)
      .collect()
  }

  pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
    self
      .edges_directed(id, Incoming)
      .into_iter()
      .map(|e| self.inner[e].source)
      .collect()
  }

  pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
    self
      .edges_directed(id, Outgoing)
      .into_iter()
      .map(move |e| &self.inner[e])
  }

  pub fn out_degree(&self, id: NodeId) -> usize {
    self
      .index_of(id)
      .map_or(0, |ix| self.inner.edges_directed(ix, Outgoing).count())
  }

  pub fn in_degree(&self, id: NodeId) -> usize {
    self
      .index_of(id)
      .map_or(0, |ix| self.inner.edges_directed(ix, Incoming).count())
  }

  /// Edges touching `id` in either direction, in insertion order, with their index
  pub(crate) fn incident_edges(&self, id: NodeId) -> Vec<(usize, &Edge)> {
    let mut edges = self.edges_directed(id, Outgoing);
    edges.extend(self.edges_directed(id, Incoming));
    edges.sort();
    edges.dedup();
    edges
      .into_iter()
      .map(|e| (e.index(), &self.inner[e]))
      .collect()
  }

  /// Nodes with in-degree 0
  pub fn roots(&self) -> Vec<NodeId> {
    self.node_ids().filter(|id| self.in_degree(*id) == 0).collect()
  }

  /// Node labels, for diagnostics
  pub fn labels(&self) -> Vec<String> {
    self
      .nodes()
      .map(|(id, data)| match data.and_then(NodeData::name) {
        Some(name) => name.to_string(),
        None => format!("<{}>", id),
      })
      .collect()
  }

  pub fn remove_node(&mut self, id: NodeId) {
    self.remove_nodes([id]);
  }

  /// Removes nodes together with every edge touching them
  pub fn remove_nodes<I>(&mut self, ids: I)
  where
    I: IntoIterator<Item = NodeId>,
  {
    let mut removed = false;
    for id in ids.into_iter().collect::<HashSet<_>>() {
      if let Some(ix) = self.index.remove(&id) {
        self.inner.remove_node(ix);
        removed = true;
      }
    }
    if removed {
      self.compact();
    }
  }

  /// Removes every node of `other` from this graph
  pub fn remove_graph(&mut self, other: &Graph) {
    self.remove_nodes(other.node_ids());
  }

  /// Rebuilds the storage without vacant slots, which later insertions would reuse
  fn compact(&mut self) {
    let old = std::mem::take(&mut self.inner);
    self.index.clear();
    for ix in old.node_indices() {
      let slot = old[ix].clone();
      let id = slot.id;
      let new_ix = self.inner.add_node(slot);
      self.index.insert(id, new_ix);
    }
    for ix in old.edge_indices() {
      let edge = old[ix].clone();
      if let (Some(s), Some(t)) = (self.index_of(edge.source), self.index_of(edge.target)) {
        self.inner.add_edge(s, t, edge);
      }
    }
  }

  /// The subgraph induced by `ids`, without any connectivity check. Ids not
  /// in the graph are ignored; node and edge order follow this graph.
  pub fn induced_subgraph<I>(&self, ids: I) -> Graph
  where
    I: IntoIterator<Item = NodeId>,
  {
    let keep = ids.into_iter().collect::<HashSet<_>>();
    let mut sub = Graph::new();
    for (id, data) in self.nodes().filter(|(id, _)| keep.contains(id)) {
      sub.ensure_node(id);
      if let Some(data) = data {
        sub.add_node(id, data.clone());
      }
    }
    for e in self.edges() {
      if keep.contains(&e.source) && keep.contains(&e.target) {
        sub.add_edge(e.source, e.target, e.color.clone());
      }
    }
    sub
  }

  /// Union of both graphs. Where both define a node or an edge, `other` wins.
  pub fn compose(&self, other: &Graph) -> Graph {
    let mut composed = self.clone();
    for (id, data) in other.nodes() {
      match data {
        Some(data) => composed.add_node(id, data.clone()),
        None => {
          composed.ensure_node(id);
        }
      }
    }
    for e in other.edges() {
      composed.add_edge(e.source, e.target, e.color.clone());
      // add_edge keeps an existing colour, but other's (missing) colour wins
      if e.color.is_none() {
        if let Some(ix) = composed.find_edge(e.source, e.target) {
          composed.inner[ix].color = None;
        }
      }
    }
    composed
  }

  /// Moves every edge of `from` onto `into` and drops `from`. Data of `into` is kept.
  pub fn merge_node_into(&mut self, from: NodeId, into: NodeId) -> crate::Result<()> {
    if !self.contains_node(from) {
      return Err(crate::Error::UnknownNode(from));
    }
    if !self.contains_node(into) {
      return Err(crate::Error::UnknownNode(into));
    }
    if from == into {
      return Ok(());
    }

    let moved = self
      .incident_edges(from)
      .into_iter()
      .map(|(_, e)| {
        let source = if e.source == from { into } else { e.source };
        let target = if e.target == from { into } else { e.target };
        (source, target, e.color.clone())
      })
      .collect::<Vec<_>>();

    self.remove_node(from);
    for (source, target, color) in moved {
      self.add_edge(source, target, color);
    }
    Ok(())
  }
}

/// Graphs are equal when they have the same nodes with the same data and the
/// same coloured edges, regardless of insertion order.
impl PartialEq for Graph {
  fn eq(&self, other: &Self) -> bool {
    self.node_count() == other.node_count()
      && self.edge_count() == other.edge_count()
      && self
        .nodes()
        .all(|(id, data)| other.contains_node(id) && other.node(id) == data)
      && self
        .edges()
        .all(|e| other.edge(e.source, e.target).map(|o| &o.color) == Some(&e.color))
  }
}

impl Eq for Graph {}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain() -> Graph {
    let mut g = Graph::new();
    g.add_node(NodeId(1), NodeData::new("a"));
    g.add_node(NodeId(2), NodeData::new("b"));
    g.add_node(NodeId(3), NodeData::new("c"));
    g.add_edge(NodeId(1), NodeId(2), Some("x".to_string()));
    g.add_edge(NodeId(2), NodeId(3), Some("y".to_string()));
    g
  }

  #[test]
  fn test_placeholder_endpoints() {
    let mut g = Graph::new();
    g.add_edge(NodeId(0), NodeId(1), Some("root".to_string()));
    assert!(g.contains_node(NodeId(0)));
    assert!(g.node(NodeId(0)).is_none());

    g.add_node(NodeId(0), NodeData::new("root"));
    assert_eq!(g.name(NodeId(0)), Some("root"));
    assert_eq!(g.node_ids().collect::<Vec<_>>(), vec![NodeId(0), NodeId(1)]);
  }

  #[test]
  fn test_readding_edge_recolours() {
    let mut g = chain();
    g.add_edge(NodeId(1), NodeId(2), None);
    assert_eq!(g.edge(NodeId(1), NodeId(2)).unwrap().color(), Some("x"));
    g.add_edge(NodeId(1), NodeId(2), Some("z".to_string()));
    assert_eq!(g.edge(NodeId(1), NodeId(2)).unwrap().color(), Some("z"));
    assert_eq!(g.edge_count(), 2);
  }

  #[test]
  fn test_remove_nodes_drops_edges() {
    let mut g = chain();
    g.remove_node(NodeId(2));
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.edge_count(), 0);
    assert!(g.successors(NodeId(1)).is_empty());
  }

  #[test]
  fn test_order_survives_removal() {
    let mut g = chain();
    g.remove_node(NodeId(1));
    g.add_node(NodeId(7), NodeData::new("d"));
    g.add_edge(NodeId(7), NodeId(2), Some("z".to_string()));

    assert_eq!(
      g.node_ids().collect::<Vec<_>>(),
      vec![NodeId(2), NodeId(3), NodeId(7)]
    );
    assert_eq!(
      g.edges().map(Edge::endpoints).collect::<Vec<_>>(),
      vec![(NodeId(2), NodeId(3)), (NodeId(7), NodeId(2))]
    );
    assert_eq!(g.predecessors(NodeId(2)), vec![NodeId(7)]);
    assert_eq!(g.successors(NodeId(2)), vec![NodeId(3)]);
  }

  #[test]
  fn test_compose_other_wins() {
    let g1 = chain();
    let mut g2 = Graph::new();
    g2.add_node(NodeId(3), NodeData::new("C"));
    g2.add_node(NodeId(4), NodeData::new("d"));
    g2.add_edge(NodeId(3), NodeId(4), Some("w".to_string()));
    g2.add_edge(NodeId(2), NodeId(3), Some("v".to_string()));

    let composed = g1.compose(&g2);
    assert_eq!(composed.node_count(), 4);
    assert_eq!(composed.name(NodeId(3)), Some("C"));
    assert_eq!(composed.edge(NodeId(2), NodeId(3)).unwrap().color(), Some("v"));
    assert_eq!(composed.edge_count(), 3);
  }

  #[test]
  fn test_equality_ignores_order() {
    let g1 = chain();
    let mut g2 = Graph::new();
    g2.add_node(NodeId(3), NodeData::new("c"));
    g2.add_node(NodeId(1), NodeData::new("a"));
    g2.add_node(NodeId(2), NodeData::new("b"));
    g2.add_edge(NodeId(2), NodeId(3), Some("y".to_string()));
    g2.add_edge(NodeId(1), NodeId(2), Some("x".to_string()));
    assert_eq!(g1, g2);

    g2.add_edge(NodeId(1), NodeId(2), Some("q".to_string()));
    assert_ne!(g1, g2);
  }

  #[test]
  fn test_merge_node_into() {
    let mut g = chain();
    g.add_node(NodeId(9), NodeData::new("def"));
    g.merge_node_into(NodeId(2), NodeId(9)).unwrap();
    assert!(!g.contains_node(NodeId(2)));
    assert!(g.contains_edge(NodeId(1), NodeId(9)));
    assert!(g.contains_edge(NodeId(9), NodeId(3)));
    assert_eq!(g.name(NodeId(9)), Some("def"));
  }
}
