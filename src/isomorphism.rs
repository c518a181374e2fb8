//! Subgraph monomorphism search
//!
//! Finds injective maps from pattern nodes to target nodes that keep every
//! pattern edge (in its direction) and agree with the pattern's label
//! matchers. Extra target edges between mapped nodes are allowed.
//!
//! The search binds pattern nodes one at a time, starting from the
//! best-connected pattern node and growing breadth-first, so that most
//! nodes draw their candidates from the neighbourhood of a node that is
//! already bound.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::ControlFlow;

use crate::graph::{Graph, NodeId};
use crate::pattern::Pattern;

/// Pattern node -> target node
pub type Mapping = HashMap<NodeId, NodeId>;

#[derive(Debug, Clone, Copy)]
struct Anchor {
  node: NodeId,
  /// the pattern edge runs from the anchor to the node being bound
  outgoing: bool,
}

struct Search<'a, F> {
  pattern: &'a Pattern,
  target: &'a Graph,
  order: Vec<NodeId>,
  anchors: Vec<Option<Anchor>>,
  mapping: Mapping,
  used: HashSet<NodeId>,
  on_match: F,
}

/// Binding order: breadth-first over the undirected pattern, each component
/// started from its highest-degree node, with the neighbour each node was
/// reached from
fn binding_order(pattern: &Graph) -> (Vec<NodeId>, Vec<Option<Anchor>>) {
  let degree = |id: NodeId| pattern.in_degree(id) + pattern.out_degree(id);
  let mut order = Vec::with_capacity(pattern.node_count());
  let mut anchors = Vec::with_capacity(pattern.node_count());
  let mut seen = HashSet::new();

  while seen.len() < pattern.node_count() {
    let mut start = None;
    for id in pattern.node_ids().filter(|id| !seen.contains(id)) {
      if start.is_none_or(|best| degree(id) > degree(best)) {
        start = Some(id);
      }
    }
    let Some(start) = start else {
      break;
    };

    seen.insert(start);
    let mut queue = VecDeque::from([(start, None)]);
    while let Some((node, anchor)) = queue.pop_front() {
      order.push(node);
      anchors.push(anchor);

      let forward = pattern.successors(node).into_iter().map(|n| (n, true));
      let backward = pattern.predecessors(node).into_iter().map(|n| (n, false));
      for (next, outgoing) in forward.chain(backward) {
        if seen.insert(next) {
          queue.push_back((next, Some(Anchor { node, outgoing })));
        }
      }
    }
  }

  (order, anchors)
}

impl<F> Search<'_, F>
where
  F: FnMut(&Mapping) -> ControlFlow<()>,
{
  fn feasible(&self, p: NodeId, t: NodeId) -> bool {
    let pattern = self.pattern.graph();
    if self.used.contains(&t)
      || !self.pattern.node_matches(p, self.target.node(t))
      || self.target.out_degree(t) < pattern.out_degree(p)
      || self.target.in_degree(t) < pattern.in_degree(p)
    {
      return false;
    }

    // every pattern edge between p and an already bound node (or p itself)
    pattern.incident_edges(p).into_iter().all(|(_, edge)| {
      let bound = |n: NodeId| {
        if n == p {
          Some(t)
        } else {
          self.mapping.get(&n).copied()
        }
      };
      match (bound(edge.source), bound(edge.target)) {
        (Some(source), Some(target)) => self
          .target
          .edge(source, target)
          .is_some_and(|e| self.pattern.edge_matches(edge.source, edge.target, e)),
        _ => true,
      }
    })
  }

  fn extend(&mut self, depth: usize) -> ControlFlow<()> {
    if depth == self.order.len() {
      return (self.on_match)(&self.mapping);
    }

    let p = self.order[depth];
    let candidates = match self.anchors[depth] {
      Some(anchor) => {
        let from = self.mapping[&anchor.node];
        if anchor.outgoing {
          self.target.successors(from)
        } else {
          self.target.predecessors(from)
        }
      }
      None => self.target.node_ids().collect(),
    };

    for t in candidates {
      if !self.feasible(p, t) {
        continue;
      }
      self.mapping.insert(p, t);
      self.used.insert(t);
      self.extend(depth + 1)?;
      self.mapping.remove(&p);
      self.used.remove(&t);
    }
    ControlFlow::Continue(())
  }
}

/// Calls `on_match` with every monomorphism of `pattern` into `target`
/// until it breaks. An empty pattern has exactly one, empty, match.
pub fn for_each_monomorphism<F>(pattern: &Pattern, target: &Graph, on_match: F)
where
  F: FnMut(&Mapping) -> ControlFlow<()>,
{
  if pattern.graph().node_count() > target.node_count() {
    return;
  }

  let (order, anchors) = binding_order(pattern.graph());
  let mut search = Search {
    pattern,
    target,
    order,
    anchors,
    mapping: HashMap::new(),
    used: HashSet::new(),
    on_match,
  };
  let _ = search.extend(0);
}

pub fn first_monomorphism(pattern: &Pattern, target: &Graph) -> Option<Mapping> {
  let mut found = None;
  for_each_monomorphism(pattern, target, |mapping| {
    found = Some(mapping.clone());
    ControlFlow::Break(())
  });
  found
}

pub fn all_monomorphisms(pattern: &Pattern, target: &Graph) -> Vec<Mapping> {
  let mut found = Vec::new();
  for_each_monomorphism(pattern, target, |mapping| {
    found.push(mapping.clone());
    ControlFlow::Continue(())
  });
  found
}

pub fn is_monomorphic(pattern: &Pattern, target: &Graph) -> bool {
  first_monomorphism(pattern, target).is_some()
}

/// The part of `target` covered by a match: the subgraph induced by the
/// mapped nodes, each node annotated with the pattern variable bound to it
pub fn matched_subgraph(target: &Graph, mapping: &Mapping) -> Graph {
  let mut sub = target.induced_subgraph(mapping.values().copied());
  for (var, node) in mapping.iter() {
    if let Some(data) = sub.node_mut(*node) {
      data.mapping = Some(*var);
    }
  }
  sub
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pattern::MatcherConfig;

  fn pattern(s: &str) -> Pattern {
    Pattern::compile(s, &MatcherConfig::default()).unwrap()
  }

  fn target() -> Graph {
    let (g, _) = Graph::from_penman(
      "(u_1 / see  :nsubj (u_2 / dog)  :obj (u_3 / cat  :amod (u_4 / black))  :obl (u_5 / dog))",
    )
    .unwrap();
    g
  }

  #[test]
  fn test_all_monomorphisms() {
    let g = target();
    let p = pattern("(u_0 / see :nsubj|obl (u_1 / dog))");
    let mut found = all_monomorphisms(&p, &g)
      .into_iter()
      .map(|m| m[&NodeId(1)])
      .collect::<Vec<_>>();
    found.sort();
    assert_eq!(found, vec![NodeId(2), NodeId(5)]);

    assert!(is_monomorphic(&pattern("(u_0 / cat :amod (u_1))"), &g));
    assert!(!is_monomorphic(&pattern("(u_0 / cat :nsubj (u_1))"), &g));
    assert!(!is_monomorphic(&pattern("(u_0 / dog :nsubj-of (u_1 / cat))"), &g));
  }

  #[test]
  fn test_injective() {
    let g = target();
    // both objects would have to be the one cat
    let p = pattern("(u_0 / see :obj (u_1 / cat) :obj (u_2 / cat))");
    assert!(!is_monomorphic(&p, &g));
    // two dogs, bound either way round
    let p = pattern("(u_0 / see :nsubj|obl (u_1 / dog) :nsubj|obl (u_2 / dog))");
    assert_eq!(all_monomorphisms(&p, &g).len(), 2);
  }

  #[test]
  fn test_not_induced() {
    let mut g = target();
    g.add_edge(NodeId(2), NodeId(3), Some("chases".to_string()));
    // the extra dog -> cat edge doesn't get in the way
    assert!(is_monomorphic(&pattern("(u_0 / see :nsubj (u_1) :obj (u_2))"), &g));
  }

  #[test]
  fn test_disconnected_pattern_and_self_loops() {
    let mut g = target();
    let p = pattern("(u_0 / black)");
    assert_eq!(all_monomorphisms(&p, &g).len(), 1);

    let p = pattern("(u_0 / dog :self u_0)");
    assert!(!is_monomorphic(&p, &g));
    g.add_edge(NodeId(5), NodeId(5), Some("self".to_string()));
    assert_eq!(first_monomorphism(&p, &g).unwrap()[&NodeId(0)], NodeId(5));
  }

  #[test]
  fn test_empty_pattern() {
    let empty = Pattern::from_graph(Graph::new(), &MatcherConfig::default());
    assert_eq!(all_monomorphisms(&empty, &target()), vec![Mapping::new()]);
    assert!(!is_monomorphic(&pattern("(u_0 / a)"), &Graph::new()));
  }

  #[test]
  fn test_matched_subgraph() {
    let g = target();
    let p = pattern("(u_7 / cat :amod (u_9 / .*))");
    let m = first_monomorphism(&p, &g).unwrap();
    let sub = matched_subgraph(&g, &m);

    assert_eq!(sub.node_count(), 2);
    assert_eq!(sub.node(NodeId(3)).unwrap().mapping, Some(NodeId(7)));
    assert_eq!(sub.node(NodeId(4)).unwrap().mapping, Some(NodeId(9)));
    assert_eq!(sub.edge(NodeId(3), NodeId(4)).unwrap().color(), Some("amod"));
    // the target itself is left alone
    assert_eq!(g.node(NodeId(3)).unwrap().mapping, None);
  }
}
