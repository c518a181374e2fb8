use std::collections::HashMap;

use petgraph::algo::{astar, dijkstra, has_path_connecting};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use tracing::debug;

use super::{Graph, NodeId};
use crate::utils::k_combinations;
use crate::{Error, Result};

/// What `Graph::subgraph` does when the requested nodes fall apart into
/// several weakly connected components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disconnected {
  /// Fail with `Error::UnconnectedGraph`
  #[default]
  Error,
  /// Pull in the nodes of undirected shortest paths from the first component
  /// to every other one, until the subgraph is connected
  BridgeShortestPath,
}

impl Graph {
  /// Shortest directed path from `from` to `to`, both ends included
  pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    let (start, goal) = (self.index_of(from)?, self.index_of(to)?);
    let (_, path) = astar(&self.inner, start, |ix| ix == goal, |_| 1usize, |_| 0)?;
    Some(path.into_iter().map(|ix| self.inner[ix].id).collect())
  }

  /// Number of edges on the shortest directed path, 0 if `from == to`
  pub fn shortest_path_length(&self, from: NodeId, to: NodeId) -> Option<usize> {
    let (start, goal) = (self.index_of(from)?, self.index_of(to)?);
    dijkstra(&self.inner, start, Some(goal), |_| 1usize)
      .get(&goal)
      .copied()
  }

  pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
    match (self.index_of(from), self.index_of(to)) {
      (Some(start), Some(goal)) => has_path_connecting(&self.inner, start, goal, None),
      _ => false,
    }
  }

  /// Shortest path ignoring edge direction
  pub fn undirected_shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    self.symmetrized().shortest_path(from, to)
  }

  /// Weakly connected components, each in node insertion order, ordered by
  /// their first node
  pub fn weakly_connected_components(&self) -> Vec<Vec<NodeId>> {
    let mut sets = UnionFind::<usize>::new(self.inner.node_count());
    for e in self.inner.edge_references() {
      sets.union(e.source().index(), e.target().index());
    }

    let mut components: Vec<Vec<NodeId>> = Vec::new();
    let mut component_of: HashMap<usize, usize> = HashMap::new();
    for ix in self.inner.node_indices() {
      let rep = sets.find(ix.index());
      let idx = *component_of.entry(rep).or_insert(components.len());
      if idx == components.len() {
        components.push(Vec::new());
      }
      components[idx].push(self.inner[ix].id);
    }
    components
  }

  pub fn is_weakly_connected(&self) -> bool {
    self.weakly_connected_components().len() <= 1
  }

  /// Nodes without any edge
  pub fn isolates(&self) -> Vec<NodeId> {
    self
      .node_ids()
      .filter(|id| self.in_degree(*id) == 0 && self.out_degree(*id) == 0)
      .collect()
  }

  /// A copy where every edge also exists in the other direction, with the
  /// same colour unless that reverse edge was already there
  pub fn symmetrized(&self) -> Graph {
    let mut sym = self.clone();
    for e in self.edges() {
      if !sym.contains_edge(e.target, e.source) {
        sym.add_edge(e.target, e.source, e.color.clone());
      }
    }
    sym
  }

  /// The subgraph induced by `ids`, which has to be weakly connected unless
  /// `on_disconnected` says how to connect it
  pub fn subgraph<I>(&self, ids: I, on_disconnected: Disconnected) -> Result<Graph>
  where
    I: IntoIterator<Item = NodeId>,
  {
    let mut ids = ids.into_iter().collect::<Vec<_>>();
    loop {
      let sub = self.induced_subgraph(ids.iter().copied());
      let components = sub.weakly_connected_components();
      if components.len() <= 1 {
        return Ok(sub);
      }

      match on_disconnected {
        Disconnected::Error => {
          return Err(Error::UnconnectedGraph {
            components: components.len(),
          });
        }
        Disconnected::BridgeShortestPath => {
          let anchor = components[0][0];
          for component in components.iter().skip(1) {
            let path = self
              .undirected_shortest_path(anchor, component[0])
              .ok_or(Error::UnconnectedGraph {
                components: components.len(),
              })?;
            debug!(from = %anchor, to = %component[0], ?path, "bridging components");
            ids.extend(path);
          }
        }
      }
    }
  }

  /// All weakly connected induced subgraphs on exactly `size` nodes
  pub fn connected_subgraphs(&self, size: usize) -> Vec<Graph> {
    let ids = self.node_ids().collect::<Vec<_>>();
    k_combinations(&ids, size)
      .into_iter()
      .map(|nodes| self.induced_subgraph(nodes))
      .filter(|sub| !sub.is_empty() && sub.is_weakly_connected())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::NodeData;

  /// 1 -> 2 -> 3, 4 -> 3, 5 alone
  fn sample() -> Graph {
    let mut g = Graph::new();
    for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")] {
      g.add_node(NodeId(id), NodeData::new(name));
    }
    g.add_edge(NodeId(1), NodeId(2), Some("x".to_string()));
    g.add_edge(NodeId(2), NodeId(3), Some("x".to_string()));
    g.add_edge(NodeId(4), NodeId(3), Some("y".to_string()));
    g
  }

  #[test]
  fn test_shortest_paths() {
    let g = sample();
    assert_eq!(g.shortest_path_length(NodeId(1), NodeId(3)), Some(2));
    assert_eq!(g.shortest_path_length(NodeId(1), NodeId(1)), Some(0));
    assert_eq!(g.shortest_path_length(NodeId(3), NodeId(1)), None);
    assert!(!g.has_path(NodeId(1), NodeId(4)));
    assert_eq!(
      g.undirected_shortest_path(NodeId(1), NodeId(4)),
      Some(vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)])
    );
  }

  #[test]
  fn test_components() {
    let g = sample();
    assert_eq!(
      g.weakly_connected_components(),
      vec![vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)], vec![NodeId(5)]]
    );
    assert_eq!(g.isolates(), vec![NodeId(5)]);
  }

  #[test]
  fn test_subgraph_policies() {
    let g = sample();
    let wanted = [NodeId(1), NodeId(4)];

    assert!(matches!(
      g.subgraph(wanted, Disconnected::Error),
      Err(Error::UnconnectedGraph { components: 2 })
    ));

    let bridged = g.subgraph(wanted, Disconnected::BridgeShortestPath).unwrap();
    assert!(bridged.is_weakly_connected());
    for id in wanted {
      assert!(bridged.contains_node(id));
    }
    assert_eq!(bridged.node_count(), 4);

    // no path at all between the components
    assert!(
      g.subgraph([NodeId(1), NodeId(5)], Disconnected::BridgeShortestPath)
        .is_err()
    );
  }

  #[test]
  fn test_symmetrized() {
    let g = sample().symmetrized();
    assert!(g.has_path(NodeId(3), NodeId(1)));
    assert_eq!(g.edge(NodeId(3), NodeId(4)).unwrap().color(), Some("y"));
    assert_eq!(g.edge_count(), 6);
  }

  #[test]
  fn test_connected_subgraphs() {
    let g = sample();
    // {1,2}, {2,3}, {3,4}
    assert_eq!(g.connected_subgraphs(2).len(), 3);
    assert_eq!(g.connected_subgraphs(1).len(), 5);
  }
}
