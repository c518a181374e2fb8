//! Predicate-argument triples from rule matches
//!
//! Each extraction pattern names which pattern variables head the
//! predicate and each argument. After a match, every argument head is
//! grown into a phrase chunk along modifier edges, and the chunk is read
//! off the sentence tokens in sentence order.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::graph::{Graph, NodeId};
use crate::matcher::Matcher;
use crate::pattern::MatcherConfig;
use crate::{Error, Result};

/// A sentence graph together with the sentence tokens. Node `token_id`s
/// index the tokens, starting at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceGraph {
  pub graph: Graph,
  pub tokens: Vec<Option<String>>,
}

impl SentenceGraph {
  pub fn new(graph: Graph, tokens: Vec<Option<String>>) -> Self {
    Self { graph, tokens }
  }

  /// The tokens of `nodes` in sentence order, joined with spaces. Nodes
  /// without a token are left out.
  pub fn text<I>(&self, nodes: I) -> String
  where
    I: IntoIterator<Item = NodeId>,
  {
    let token_ids = nodes
      .into_iter()
      .filter_map(|id| self.graph.node(id).and_then(|data| data.token_id))
      .collect::<BTreeSet<_>>();

    token_ids
      .into_iter()
      .filter_map(|token_id| token_id.checked_sub(1))
      .filter_map(|idx| self.tokens.get(idx).and_then(Option::as_deref))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Edge colours followed when growing chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
  /// Followed recursively from argument heads
  pub chunk_edges: Vec<String>,
  /// Followed one step from predicate heads
  pub predicate_edges: Vec<String>,
}

impl Default for ChunkConfig {
  fn default() -> Self {
    let owned = |colors: &[&str]| -> Vec<String> { colors.iter().map(|c| c.to_string()).collect() };
    Self {
      chunk_edges: owned(&[
        "NMOD", "AMOD", "ADVMOD", "DET", "COMPOUND", "APPOS", "FLAT", "CASE",
      ]),
      predicate_edges: owned(&["AMOD", "COP", "DET"]),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
  /// Pattern variables whose nodes (with their direct modifiers) make up
  /// the predicate
  Heads(Vec<usize>),
  /// A fixed predicate text
  Constant(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPattern {
  pub pattern: String,
  pub predicate: Predicate,
  /// Pattern variables heading each argument, in argument order
  pub arguments: Vec<Vec<usize>>,
}

impl ExtractionPattern {
  pub fn new(pattern: &str, predicate: Predicate, arguments: Vec<Vec<usize>>) -> Self {
    Self {
      pattern: pattern.to_string(),
      predicate,
      arguments,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
  pub predicate: String,
  pub arguments: Vec<String>,
}

impl Triple {
  pub fn new<I, S>(predicate: &str, arguments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      predicate: predicate.to_string(),
      arguments: arguments.into_iter().map(Into::into).collect(),
    }
  }
}

pub struct TripleExtractor {
  patterns: Vec<ExtractionPattern>,
  matcher: Matcher<usize>,
  config: ChunkConfig,
}

impl TripleExtractor {
  /// Compiles the patterns into one case-insensitive matcher, keyed by
  /// pattern position
  pub fn new(patterns: Vec<ExtractionPattern>, config: ChunkConfig) -> Result<Self> {
    let matcher = Matcher::new(
      patterns
        .iter()
        .enumerate()
        .map(|(idx, p)| (vec![p.pattern.as_str()], Vec::new(), idx)),
      MatcherConfig {
        case_sensitive: false,
      },
    )?;
    Ok(Self {
      patterns,
      matcher,
      config,
    })
  }

  /// English UD copula and `nmod` constructions
  pub fn ud_defaults() -> Result<Self> {
    Self::new(
      vec![
        // He is the brother of the composer -> is the brother of (He, the composer)
        ExtractionPattern::new(
          "(u_0 / .* :nsubj (u_1 / .*) :nmod (u_2 / .* :case (u_3 / of)))",
          Predicate::Heads(vec![0, 3]),
          vec![vec![1], vec![2]],
        ),
        // The area is the most populous area -> is (The area, the most populous area)
        ExtractionPattern::new(
          "(u_0 / .* :nsubj (u_1 / .*) :cop (u_2 / .*))",
          Predicate::Heads(vec![2]),
          vec![vec![1], vec![0]],
        ),
        // The area is the largest area in the world -> is (The area, the largest area, in the world)
        ExtractionPattern::new(
          "(u_0 / .* :nsubj (u_1 / .*) :cop (u_2 / .*) :nmod (u_3 / .* :case (u_4 / .*)))",
          Predicate::Heads(vec![2]),
          vec![vec![1], vec![0], vec![3, 4]],
        ),
      ],
      ChunkConfig::default(),
    )
  }

  /// DRS agents: `is (event, agent)`
  pub fn drs_defaults() -> Result<Self> {
    Self::new(
      vec![ExtractionPattern::new(
        "(u_0 / .* :Agent (u_1 / .*))",
        Predicate::Constant("is".to_string()),
        vec![vec![0], vec![1]],
      )],
      ChunkConfig::default(),
    )
  }

  pub fn patterns(&self) -> &[ExtractionPattern] {
    &self.patterns
  }

  /// Triples for every match of every pattern, in pattern order
  pub fn extract(&self, sentence: &SentenceGraph) -> Result<Vec<Triple>> {
    let mut triples = Vec::new();
    for fired in self.matcher.matches_with_subgraphs(&sentence.graph)? {
      let pattern = &self.patterns[*fired.key];
      for sub in fired.subgraphs.iter() {
        let triple = self.triple(pattern, sub, sentence)?;
        debug!(pattern = *fired.key, ?triple, "extracted");
        triples.push(triple);
      }
    }
    Ok(triples)
  }

  fn triple(
    &self,
    pattern: &ExtractionPattern,
    sub: &Graph,
    sentence: &SentenceGraph,
  ) -> Result<Triple> {
    let bindings = sub
      .nodes()
      .filter_map(|(id, data)| Some((data?.mapping?.0, id)))
      .collect::<HashMap<_, _>>();
    let bound = |vars: &[usize]| {
      vars
        .iter()
        .map(|var| bindings.get(var).copied().ok_or(Error::UnboundVariable(*var)))
        .collect::<Result<Vec<_>>>()
    };

    let argument_heads = pattern
      .arguments
      .iter()
      .map(|vars| bound(vars))
      .collect::<Result<Vec<_>>>()?;
    let predicate_heads = match &pattern.predicate {
      Predicate::Heads(vars) => bound(vars)?,
      Predicate::Constant(_) => Vec::new(),
    };
    let all_heads = argument_heads
      .iter()
      .flatten()
      .chain(predicate_heads.iter())
      .copied()
      .collect::<HashSet<_>>();

    let mut remaining = sentence.graph.clone();
    let mut arguments = Vec::with_capacity(argument_heads.len());
    for heads in argument_heads.iter() {
      let mut nodes = Vec::new();
      let mut visited = HashSet::new();
      for head in heads.iter() {
        self.chunk(*head, &remaining, &all_heads, &mut visited, &mut nodes);
      }
      arguments.push(sentence.text(nodes.iter().copied()));
      remaining.remove_nodes(nodes);
    }

    let predicate = match &pattern.predicate {
      Predicate::Constant(text) => text.clone(),
      Predicate::Heads(_) => {
        let mut nodes = Vec::new();
        for head in predicate_heads.iter() {
          nodes.push(*head);
          nodes.extend(
            sentence
              .graph
              .out_edges(*head)
              .filter(|e| !all_heads.contains(&e.target))
              .filter(|e| self.follows(&self.config.predicate_edges, e.color()))
              .map(|e| e.target),
          );
        }
        sentence.text(nodes)
      }
    };

    Ok(Triple {
      predicate,
      arguments,
    })
  }

  fn follows(&self, colors: &[String], color: Option<&str>) -> bool {
    color.is_some_and(|color| colors.iter().any(|c| c == color))
  }

  /// `head` and everything below it along chunk edges, stopping at other heads
  fn chunk(
    &self,
    head: NodeId,
    graph: &Graph,
    all_heads: &HashSet<NodeId>,
    visited: &mut HashSet<NodeId>,
    nodes: &mut Vec<NodeId>,
  ) {
    if !graph.contains_node(head) || !visited.insert(head) {
      return;
    }
    nodes.push(head);
    for edge in graph.out_edges(head) {
      if all_heads.contains(&edge.target) || !self.follows(&self.config.chunk_edges, edge.color()) {
        continue;
      }
      self.chunk(edge.target, graph, all_heads, visited, nodes);
    }
  }
}
