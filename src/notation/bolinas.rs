//! Bolinas (hyperedge replacement) notation: `(n1. :label :color (n2. :label2))`
//!
//! Node labels are written as unary edges right after the variable, the
//! external node carries a trailing `*`, and edges are only ever walked
//! forwards.

use std::collections::HashSet;

use tracing::error;

use super::{IdAllocator, Target, Tree, parse_document};
use crate::graph::{Graph, NodeData, NodeId};
use crate::{Error, Result};

const EXTERNAL_MARKER: char = '*';
const ANONYMOUS: &str = ".";

/// A graph read from bolinas notation
#[derive(Debug, Clone, PartialEq)]
pub struct Bolinas {
  pub graph: Graph,
  pub top: NodeId,
  /// The node marked `*`, if any
  pub external: Option<NodeId>,
}

fn split_external(var: &str) -> (&str, bool) {
  match var.strip_suffix(EXTERNAL_MARKER) {
    Some(bare) => (bare, true),
    None => (var, false),
  }
}

struct Reader {
  alloc: IdAllocator,
  graph: Graph,
  external: Option<NodeId>,
}

impl Reader {
  fn node_id(&mut self, var: &str) -> Result<NodeId> {
    let (bare, is_external) = split_external(var);
    let id = if bare == ANONYMOUS {
      self.alloc.fresh()
    } else {
      self
        .alloc
        .get(bare)
        .ok_or_else(|| Error::Parse(format!("undeclared variable {}", var)))?
    };
    if is_external && self.external.replace(id).is_some() {
      return Err(Error::Parse("more than one external node".to_string()));
    }
    Ok(id)
  }

  fn build(&mut self, tree: &Tree<'_>, id: NodeId) -> Result<()> {
    if tree.label.is_some() {
      return Err(Error::Parse(format!(
        "bolinas node {} has a penman style label",
        tree.var
      )));
    }
    self.graph.add_node(id, NodeData::wildcard());

    let mut labeled = false;
    for branch in tree.branches.iter() {
      let color = (!branch.role.is_empty()).then(|| branch.role.to_string());
      match &branch.target {
        Target::Empty => {
          if labeled {
            return Err(Error::Parse(format!("node {} has two labels", tree.var)));
          }
          labeled = true;
          if let Some(data) = self.graph.node_mut(id) {
            data.name = color;
          }
        }
        Target::Node(child) => {
          let child_id = self.node_id(child.var)?;
          self.graph.add_edge(id, child_id, color);
          self.build(child, child_id)?;
        }
        Target::Atom(atom) => {
          let target = self.alloc.get(atom.text()).ok_or_else(|| {
            Error::Parse(format!("{} is not a declared variable", atom.text()))
          })?;
          self.graph.add_edge(id, target, color);
        }
      }
    }
    Ok(())
  }
}

/// Replaces the characters that would end a role
fn sanitize_label(label: &str) -> String {
  label
    .chars()
    .map(|c| if c.is_whitespace() || matches!(c, '(' | ')' | '~') { '_' } else { c })
    .collect()
}

struct Writer<'g> {
  graph: &'g Graph,
  external: Option<NodeId>,
  keep_node_ids: bool,
  visited: HashSet<NodeId>,
  out: String,
}

impl Writer<'_> {
  fn var_name(&self, id: NodeId) -> String {
    if self.keep_node_ids {
      format!("n{}.", id)
    } else {
      ANONYMOUS.to_string()
    }
  }

  fn write_node(&mut self, id: NodeId) -> Result<()> {
    let graph = self.graph;
    self.visited.insert(id);

    self.out.push('(');
    self.out.push_str(&self.var_name(id));
    if self.external == Some(id) {
      self.out.push(EXTERNAL_MARKER);
    }
    if let Some(name) = graph.name(id) {
      self.out.push_str(" :");
      self.out.push_str(&sanitize_label(name));
    }

    for edge in graph.out_edges(id) {
      if graph.node(edge.target).is_none() {
        continue;
      }
      self.out.push_str(" :");
      self.out.push_str(edge.color().unwrap_or(""));
      self.out.push(' ');
      if self.visited.contains(&edge.target) {
        if !self.keep_node_ids {
          return Err(Error::Layout(format!(
            "node {} is reentrant, which needs node ids",
            edge.target
          )));
        }
        self.out.push_str(&self.var_name(edge.target));
      } else {
        self.write_node(edge.target)?;
      }
    }

    self.out.push(')');
    Ok(())
  }
}

impl Graph {
  /// Writes the graph in bolinas notation, walking out-edges from `top`.
  /// Every labeled node has to be reachable from `top`.
  pub fn to_bolinas(
    &self,
    top: NodeId,
    external: Option<NodeId>,
    keep_node_ids: bool,
  ) -> Result<String> {
    if self.node(top).is_none() {
      return Err(Error::Layout(format!("top node {} has no data", top)));
    }

    let mut writer = Writer {
      graph: self,
      external,
      keep_node_ids,
      visited: HashSet::new(),
      out: String::new(),
    };
    writer.write_node(top)?;

    let unreached = self
      .nodes()
      .filter(|(id, data)| data.is_some() && !writer.visited.contains(id))
      .map(|(id, _)| id)
      .collect::<Vec<_>>();
    if !unreached.is_empty() {
      error!(labels = ?self.labels(), ?unreached, "can't write graph as bolinas");
      return Err(Error::Layout(format!(
        "nodes {:?} are not reachable from {}",
        unreached, top
      )));
    }
    Ok(writer.out)
  }

  pub fn from_bolinas(s: &str) -> Result<Bolinas> {
    let tree = parse_document(s)?;

    let mut declared = Vec::new();
    tree.walk(&mut |t| declared.push(split_external(t.var).0));
    let named = declared
      .iter()
      .copied()
      .filter(|var| *var != ANONYMOUS)
      .collect::<Vec<_>>();
    if named.iter().collect::<HashSet<_>>().len() != named.len() {
      return Err(Error::Parse("a variable is declared twice".to_string()));
    }

    let mut reader = Reader {
      alloc: IdAllocator::new(named),
      graph: Graph::new(),
      external: None,
    };
    let top = reader.node_id(tree.var)?;
    reader.build(&tree, top)?;

    Ok(Bolinas {
      graph: reader.graph,
      top,
      external: reader.external,
    })
  }
}
