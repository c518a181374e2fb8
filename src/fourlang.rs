//! Expanding 4lang concept graphs with definition graphs

use tracing::debug;

use crate::graph::NodeId;
use crate::rooted::RootedGraph;
use crate::{Error, Result};

/// Colour of the edge from an expanded node to its definition
pub const DEFINITION_EDGE: &str = "0";

impl RootedGraph {
  /// Adds the definition of `node` to this graph.
  ///
  /// With `substitute`, `node` is merged into the definition root, which
  /// takes over its edges (and the root, if `node` was the root).
  /// Otherwise the definition hangs off `node` through a `0` edge. Nodes
  /// the definition brings in are flagged `fourlang`.
  pub fn expand(&mut self, node: NodeId, definition: &RootedGraph, substitute: bool) -> Result<()> {
    let def_root = definition.root();
    let (graph, root) = self.parts_mut();
    if !graph.contains_node(node) {
      return Err(Error::UnknownNode(node));
    }

    let added = definition
      .node_ids()
      .filter(|id| !graph.contains_node(*id))
      .collect::<Vec<_>>();
    *graph = graph.compose(definition.graph());
    for id in added {
      if let Some(data) = graph.node_mut(id) {
        data.fourlang = true;
      }
    }
    if substitute {
      graph.merge_node_into(node, def_root)?;
      if *root == node {
        *root = def_root;
      }
      if let Some(data) = graph.node_mut(def_root) {
        data.substituted = true;
      }
    } else {
      graph.add_edge(node, def_root, Some(DEFINITION_EDGE.to_string()));
      if let Some(data) = graph.node_mut(node) {
        data.expanded = true;
      }
    }

    debug!(%node, %def_root, substitute, "expanded node");
    Ok(())
  }
}
