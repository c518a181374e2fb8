//! Compiling rule specifications into matchable patterns
//!
//! A pattern is written in penman notation. Node labels and edge colours
//! are regular expressions, anchored at the start of the target label and
//! on word boundaries, so `(dog|cat)` matches `dog` but not `doghouse`. A
//! node without a label matches anything.
//!
//! Three relational forms wrap a pair of patterns:
//!
//! ```text
//! 2((u_0 / a), (u_0 / b))          roots at most 2 edges apart
//! path((u_0 / a), (u_0 / b))       a directed path between the roots
//! undirected((u_0 / a), (u_0 / b)) a path ignoring edge direction
//! ```

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::graph::{Edge, Graph, NodeData, NodeId};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
  pub case_sensitive: bool,
}

impl Default for MatcherConfig {
  fn default() -> Self {
    Self {
      case_sensitive: true,
    }
  }
}

/// A pattern label, matched as a word-anchored regex with a plain
/// equality fallback. Labels that aren't valid regexes only match equal
/// labels.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
  literal: String,
  regex: Option<Regex>,
}

impl LabelMatcher {
  pub fn new(label: &str, case_sensitive: bool) -> Self {
    let regex = RegexBuilder::new(&format!(r"^\b(?:{})\b", label))
      .case_insensitive(!case_sensitive)
      .build()
      .ok();
    Self {
      literal: label.to_string(),
      regex,
    }
  }

  pub fn matches(&self, target: &str) -> bool {
    self
      .regex
      .as_ref()
      .is_some_and(|regex| regex.is_match(target))
      || self.literal == target
  }

  pub fn as_str(&self) -> &str {
    &self.literal
  }
}

/// A pattern graph with compiled labels. Nodes keep the ids of their
/// `u_N` variables.
#[derive(Debug, Clone)]
pub struct Pattern {
  graph: Graph,
  nodes: HashMap<NodeId, LabelMatcher>,
  edges: HashMap<(NodeId, NodeId), LabelMatcher>,
}

impl Pattern {
  pub fn compile(s: &str, config: &MatcherConfig) -> Result<Self> {
    let (graph, _) = Graph::from_penman(s)?;
    Ok(Self::from_graph(graph, config))
  }

  pub fn from_graph(graph: Graph, config: &MatcherConfig) -> Self {
    let nodes = graph
      .nodes()
      .filter_map(|(id, data)| {
        let name = data.and_then(NodeData::name)?;
        Some((id, LabelMatcher::new(name, config.case_sensitive)))
      })
      .collect();
    let edges = graph
      .edges()
      .filter_map(|e| {
        let color = e.color()?;
        Some((e.endpoints(), LabelMatcher::new(color, config.case_sensitive)))
      })
      .collect();

    Self {
      graph,
      nodes,
      edges,
    }
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Whether a target node can stand in for pattern node `id`. Unlabeled
  /// nodes on either side always can.
  pub fn node_matches(&self, id: NodeId, target: Option<&NodeData>) -> bool {
    match (self.nodes.get(&id), target.and_then(NodeData::name)) {
      (Some(label), Some(name)) => label.matches(name),
      _ => true,
    }
  }

  /// Whether a target edge can stand in for the pattern edge
  /// `source -> target`. Uncoloured edges on either side always can.
  pub fn edge_matches(&self, source: NodeId, target: NodeId, edge: &Edge) -> bool {
    match (self.edges.get(&(source, target)), edge.color()) {
      (Some(label), Some(color)) => label.matches(color),
      _ => true,
    }
  }
}

/// One entry of a rule's positive or negative list
#[derive(Debug, Clone)]
pub enum Clause {
  /// A plain pattern that has to occur in the target
  Graph(Pattern),
  /// The roots of a `from` match and a `to` match are at most `distance`
  /// directed edges apart
  MaxDistance {
    distance: usize,
    from: Pattern,
    to: Pattern,
  },
  /// A directed path leads from a `from` root to a `to` root
  PathBetween { from: Pattern, to: Pattern },
  /// A path ignoring edge direction connects the two roots
  Undirected { from: Pattern, to: Pattern },
}

impl Clause {
  pub fn compile(s: &str, config: &MatcherConfig) -> Result<Self> {
    regex_static!(MAX_DISTANCE, r"^(\d+)\((.*),(.*)\)$");
    regex_static!(PATH, r"^path\((.*),(.*)\)$");
    regex_static!(UNDIRECTED, r"^undirected\((.*),(.*)\)$");

    let s = s.trim();
    if let Some(caps) = MAX_DISTANCE.captures(s) {
      let distance = caps[1]
        .parse()
        .map_err(|e| Error::Parse(format!("distance {}: {}", &caps[1], e)))?;
      Ok(Self::MaxDistance {
        distance,
        from: Pattern::compile(&caps[2], config)?,
        to: Pattern::compile(&caps[3], config)?,
      })
    } else if let Some(caps) = PATH.captures(s) {
      Ok(Self::PathBetween {
        from: Pattern::compile(&caps[1], config)?,
        to: Pattern::compile(&caps[2], config)?,
      })
    } else if let Some(caps) = UNDIRECTED.captures(s) {
      Ok(Self::Undirected {
        from: Pattern::compile(&caps[1], config)?,
        to: Pattern::compile(&caps[2], config)?,
      })
    } else {
      Ok(Self::Graph(Pattern::compile(s, config)?))
    }
  }
}

/// Clauses that all have to match, clauses none of which may match, and
/// the key reported when the rule fires
#[derive(Debug, Clone)]
pub struct Rule<K> {
  pub positive: Vec<Clause>,
  pub negative: Vec<Clause>,
  pub key: K,
}

impl<K> Rule<K> {
  pub fn compile<S>(positive: &[S], negative: &[S], key: K, config: &MatcherConfig) -> Result<Self>
  where
    S: AsRef<str>,
  {
    let compile_all = |clauses: &[S]| {
      clauses
        .iter()
        .map(|c| Clause::compile(c.as_ref(), config))
        .collect::<Result<Vec<_>>>()
    };

    Ok(Self {
      positive: compile_all(positive)?,
      negative: compile_all(negative)?,
      key,
    })
  }
}
