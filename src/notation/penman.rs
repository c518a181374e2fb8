//! Penman notation: `(u_1<root> / label  :role (u_2 / label2))`
//!
//! Decoding un-inverts `-of` roles, drops `UNKNOWN` edges and turns
//! attribute constants into nodes of their own. Encoding writes every node
//! as `u_N`, lays the graph out depth-first from a top node and inverts
//! roles where an edge has to be walked backwards.

use std::collections::HashSet;

use tracing::error;

use super::{is_plain_symbol, parse_document, quote, split_role, Atom, IdAllocator, Target, Tree};
use crate::graph::{Graph, NodeData, NodeId};
use crate::{Error, Result};

pub const ROOT_MARKER: &str = "<root>";

/// Role that stands for "no known relation": the child is kept, the edge isn't
pub const UNKNOWN_ROLE: &str = "UNKNOWN";

fn bare_var(var: &str) -> &str {
  var.strip_suffix(ROOT_MARKER).unwrap_or(var)
}

fn lookup(alloc: &IdAllocator, var: &str) -> Result<NodeId> {
  alloc
    .get(bare_var(var))
    .ok_or_else(|| Error::Parse(format!("undeclared variable {}", var)))
}

fn build(tree: &Tree<'_>, alloc: &mut IdAllocator, graph: &mut Graph) -> Result<()> {
  let id = lookup(alloc, tree.var)?;
  let mut data = match &tree.label {
    Some(label) => NodeData::new(label.text()),
    None => NodeData::wildcard(),
  };
  data.token_id = tree.alignment;
  graph.add_node(id, data);

  for branch in tree.branches.iter() {
    let (color, inverted) = split_role(branch.role);
    let child = match &branch.target {
      Target::Node(child) => lookup(alloc, child.var)?,
      Target::Atom(Atom::Symbol(sym)) if alloc.get(sym).is_some() => lookup(alloc, sym)?,
      Target::Atom(constant) => {
        let constant_id = alloc.fresh();
        let mut data = NodeData::new(constant.text());
        data.token_id = branch.alignment;
        graph.add_node(constant_id, data);
        constant_id
      }
      Target::Empty => {
        return Err(Error::Parse(format!(
          "role :{} of {} has no target",
          branch.role, tree.var
        )));
      }
    };

    if color.as_deref() != Some(UNKNOWN_ROLE) {
      if inverted {
        graph.add_edge(child, id, color);
      } else {
        graph.add_edge(id, child, color);
      }
    }

    if let Target::Node(child_tree) = &branch.target {
      build(child_tree, alloc, graph)?;
    }
  }

  Ok(())
}

/// Writes a graph depth-first from its top node
struct Layout<'g> {
  graph: &'g Graph,
  /// nodes reachable from the top along out-edges
  forward: HashSet<NodeId>,
  visited: HashSet<NodeId>,
  written: HashSet<usize>,
  out: String,
}

impl<'g> Layout<'g> {
  fn new(graph: &'g Graph, top: NodeId) -> Self {
    let mut forward = HashSet::from([top]);
    let mut stack = vec![top];
    while let Some(node) = stack.pop() {
      for next in graph.successors(node) {
        if graph.node(next).is_some() && forward.insert(next) {
          stack.push(next);
        }
      }
    }

    Self {
      graph,
      forward,
      visited: HashSet::new(),
      written: HashSet::new(),
      out: String::new(),
    }
  }

  fn write_node(&mut self, id: NodeId, mark_root: bool) {
    let graph = self.graph;
    self.visited.insert(id);

    self.out.push('(');
    self.out.push_str(&var_name(id));
    if mark_root {
      self.out.push_str(ROOT_MARKER);
    }
    if let Some(name) = graph.name(id) {
      self.out.push_str(" / ");
      self.out.push_str(&label_text(name));
    }

    for (idx, edge) in graph.incident_edges(id) {
      if self.written.contains(&idx) {
        continue;
      }
      let inverted = edge.source != id;
      let other = if inverted { edge.source } else { edge.target };
      if graph.node(other).is_none() {
        continue;
      }
      // the other end still gets reached going forward and writes this edge itself
      if inverted && !self.visited.contains(&other) && self.forward.contains(&other) {
        continue;
      }

      self.written.insert(idx);
      self.out.push_str("  :");
      self.out.push_str(edge.color().unwrap_or(""));
      if inverted {
        self.out.push_str("-of");
      }
      self.out.push(' ');
      if self.visited.contains(&other) {
        self.out.push_str(&var_name(other));
      } else {
        self.write_node(other, false);
      }
    }

    self.out.push(')');
  }
}

fn var_name(id: NodeId) -> String {
  format!("u_{}", id)
}

fn label_text(label: &str) -> String {
  if is_plain_symbol(label) {
    label.to_string()
  } else {
    quote(label)
  }
}

impl Graph {
  /// Decodes a penman string, returning the graph and the node marked
  /// `<root>`, if any
  pub fn from_penman(s: &str) -> Result<(Graph, Option<NodeId>)> {
    let tree = parse_document(s)?;

    let mut declared = Vec::new();
    tree.walk(&mut |t| declared.push(t.var));

    let mut root_var = None;
    let mut seen = HashSet::new();
    for var in declared.iter().copied() {
      if let Some(bare) = var.strip_suffix(ROOT_MARKER) {
        if root_var.replace(bare).is_some() {
          return Err(Error::Parse(format!(
            "more than one node marked {}",
            ROOT_MARKER
          )));
        }
      }
      let bare = bare_var(var);
      if bare.is_empty() {
        return Err(Error::Parse(format!("node without a variable: {}", var)));
      }
      if !seen.insert(bare) {
        return Err(Error::Parse(format!("variable {} is declared twice", bare)));
      }
    }

    let mut alloc = IdAllocator::new(declared.iter().copied().map(bare_var));
    let mut graph = Graph::new();
    build(&tree, &mut alloc, &mut graph)?;

    let root = match root_var {
      Some(var) => Some(lookup(&alloc, var)?),
      None => None,
    };
    Ok((graph, root))
  }

  /// The node a rootless graph is written from: the first labeled node
  /// without incoming edges, or failing that the first labeled node
  pub fn default_top(&self) -> Option<NodeId> {
    let mut labeled = self.nodes().filter(|(_, data)| data.is_some()).map(|(id, _)| id);
    let first = labeled.next()?;
    std::iter::once(first)
      .chain(labeled)
      .find(|id| self.in_degree(*id) == 0)
      .or(Some(first))
  }

  /// Encodes the graph from its default top, without a root marker
  pub fn to_penman(&self) -> Result<String> {
    let top = self
      .default_top()
      .ok_or_else(|| Error::Layout("graph has no labeled nodes".to_string()))?;
    self.to_penman_from(top, false)
  }

  /// Encodes the graph depth-first from `top`. Nodes without data are
  /// skipped along with their edges; every other node has to be reachable
  /// from `top` in either direction.
  pub fn to_penman_from(&self, top: NodeId, mark_root: bool) -> Result<String> {
    if self.node(top).is_none() {
      return Err(Error::Layout(format!("top node {} has no data", top)));
    }

    let mut layout = Layout::new(self, top);
    layout.write_node(top, mark_root);

    let unreached = self
      .nodes()
      .filter(|(id, data)| data.is_some() && !layout.visited.contains(id))
      .map(|(id, _)| id)
      .collect::<Vec<_>>();
    if !unreached.is_empty() {
      error!(labels = ?self.labels(), ?unreached, "can't lay out graph");
      return Err(Error::Layout(format!(
        "nodes {:?} are not reachable from {}",
        unreached, top
      )));
    }

    Ok(layout.out)
  }
}
