use std::collections::{HashMap, HashSet};

use super::Graph;
use crate::utils::dot_clean;

/// Dot colour to draw each edge label with
pub type EdgePalette = HashMap<String, String>;

impl Graph {
  /// Renders the graph in the dot language. Node lines and edge lines are
  /// each sorted, so equal graphs render byte-identically whatever order they
  /// were built in. Isolated nodes and uncoloured edges are left out.
  pub fn to_dot(&self, marked: &HashSet<String>, palette: Option<&EdgePalette>) -> String {
    let isolates = self.isolates().into_iter().collect::<HashSet<_>>();
    let mut lines = vec![
      "digraph finite_state_machine {".to_string(),
      "\tdpi=70;".to_string(),
    ];

    let mut node_lines = Vec::new();
    for (id, data) in self.nodes().filter(|(id, _)| !isolates.contains(id)) {
      let printname = match data.and_then(|d| d.name()) {
        Some(name) => dot_clean(name),
        None => id.to_string(),
      };
      let is_marked = marked.contains(&printname);
      let style = match data {
        Some(d) if d.expanded && is_marked => ", style=filled, fillcolor=purple",
        Some(d) if d.expanded => ", style=\"filled\"",
        Some(d) if d.fourlang => ", style=\"filled\", fillcolor=red",
        Some(d) if d.substituted => ", style=\"filled\"",
        _ if is_marked => ", style=filled, fillcolor=lightblue",
        _ => "",
      };
      node_lines.push(format!(
        "\t{} [shape = circle, label = \"{}\"{}];",
        id, printname, style
      ));
    }
    node_lines.sort();
    lines.append(&mut node_lines);

    let mut edge_lines = Vec::new();
    for e in self.edges() {
      let Some(color) = e.color() else {
        continue;
      };
      match palette.and_then(|p| p.get(color)) {
        Some(dot_color) => edge_lines.push(format!(
          "\t{} -> {} [ label = \"{}\", color = \"{}\" ];",
          e.source, e.target, color, dot_color
        )),
        None => edge_lines.push(format!(
          "\t{} -> {} [ label = \"{}\" ];",
          e.source, e.target, color
        )),
      }
    }
    edge_lines.sort();
    lines.append(&mut edge_lines);

    lines.push("}".to_string());
    lines.join("\n")
  }
}
