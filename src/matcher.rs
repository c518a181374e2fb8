use tracing::{debug, trace};

use crate::graph::{Graph, NodeId};
use crate::isomorphism::{all_monomorphisms, first_monomorphism, matched_subgraph};
use crate::pattern::{Clause, MatcherConfig, Pattern, Rule};
use crate::{Error, Result};

/// A rule that fired on a graph
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<'m, K> {
  pub key: &'m K,
  /// Position of the rule in the matcher
  pub index: usize,
  /// One matched subgraph per positive clause, empty unless requested
  pub subgraphs: Vec<Graph>,
}

/// Evaluates a list of rules against graphs.
///
/// A rule fires when none of its negative clauses and all of its positive
/// clauses match. Only the first match of each positive clause is kept,
/// so rules never backtrack across clauses.
#[derive(Debug, Clone)]
pub struct Matcher<K> {
  rules: Vec<Rule<K>>,
}

impl<K> Matcher<K> {
  /// Compiles `(positive, negative, key)` rule specifications
  pub fn new<I, S>(specs: I, config: MatcherConfig) -> Result<Self>
  where
    I: IntoIterator<Item = (Vec<S>, Vec<S>, K)>,
    S: AsRef<str>,
  {
    let rules = specs
      .into_iter()
      .map(|(positive, negative, key)| Rule::compile(&positive, &negative, key, &config))
      .collect::<Result<Vec<_>>>()?;
    Ok(Self { rules })
  }

  pub fn from_rules(rules: Vec<Rule<K>>) -> Self {
    Self { rules }
  }

  pub fn rules(&self) -> &[Rule<K>] {
    &self.rules
  }

  /// Rules that fire on `graph`, in rule order
  pub fn matches(&self, graph: &Graph) -> Result<Vec<RuleMatch<'_, K>>> {
    self.run(graph, false)
  }

  /// Like `matches`, also returning the matched subgraphs, whose nodes
  /// carry the pattern variable they were bound to
  pub fn matches_with_subgraphs(&self, graph: &Graph) -> Result<Vec<RuleMatch<'_, K>>> {
    self.run(graph, true)
  }

  fn run(&self, graph: &Graph, keep_subgraphs: bool) -> Result<Vec<RuleMatch<'_, K>>> {
    let mut fired = Vec::new();

    'rules: for (index, rule) in self.rules.iter().enumerate() {
      for clause in rule.negative.iter() {
        if clause_match(clause, graph)?.is_some() {
          debug!(rule = index, "vetoed by negative clause");
          continue 'rules;
        }
      }

      let mut subgraphs = Vec::with_capacity(rule.positive.len());
      for (n, clause) in rule.positive.iter().enumerate() {
        match clause_match(clause, graph)? {
          Some(sub) => subgraphs.push(sub),
          None => {
            trace!(rule = index, clause = n, "positive clause didn't match");
            continue 'rules;
          }
        }
      }

      debug!(rule = index, "rule fired");
      if !keep_subgraphs {
        subgraphs.clear();
      }
      fired.push(RuleMatch {
        key: &rule.key,
        index,
        subgraphs,
      });
    }

    Ok(fired)
  }
}

/// The subgraph of the first match of `clause`, if there is one
fn clause_match(clause: &Clause, graph: &Graph) -> Result<Option<Graph>> {
  match clause {
    Clause::Graph(pattern) => {
      Ok(first_monomorphism(pattern, graph).map(|mapping| matched_subgraph(graph, &mapping)))
    }
    Clause::MaxDistance { distance, from, to } => related(from, to, graph, |r1, r2| {
      graph
        .shortest_path_length(r1, r2)
        .is_some_and(|length| length <= *distance)
    }),
    Clause::PathBetween { from, to } => related(from, to, graph, |r1, r2| graph.has_path(r1, r2)),
    Clause::Undirected { from, to } => {
      let symmetric = graph.symmetrized();
      related(from, to, graph, |r1, r2| symmetric.has_path(r1, r2))
    }
  }
}

/// The node of a matched subgraph without incoming edges
fn match_root(sub: &Graph) -> Result<NodeId> {
  match sub.roots().as_slice() {
    [root] => Ok(*root),
    roots => Err(Error::AmbiguousRoot { roots: roots.len() }),
  }
}

/// Tries every pair of matches of `from` and `to` in order, returning the
/// union of the first pair whose roots pass `test`. Roots are only checked
/// for pairs that get tried.
fn related<F>(from: &Pattern, to: &Pattern, graph: &Graph, test: F) -> Result<Option<Graph>>
where
  F: Fn(NodeId, NodeId) -> bool,
{
  let matched = |pattern: &Pattern| {
    all_monomorphisms(pattern, graph)
      .iter()
      .map(|mapping| matched_subgraph(graph, mapping))
      .collect::<Vec<_>>()
  };

  let firsts = matched(from);
  let seconds = matched(to);
  trace!(
    from = firsts.len(),
    to = seconds.len(),
    "relational clause operands"
  );
  if seconds.is_empty() {
    return Ok(None);
  }

  for sub1 in firsts.iter() {
    let root1 = match_root(sub1)?;
    for sub2 in seconds.iter() {
      if test(root1, match_root(sub2)?) {
        return Ok(Some(sub1.compose(sub2)));
      }
    }
  }
  Ok(None)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::NodeData;

  /// see -nsubj-> dog, see -obj-> cat -amod-> black, see -obl-> park -case-> in
  fn target() -> Graph {
    let (g, _) = Graph::from_penman(
      "(u_1 / see  :nsubj (u_2 / dog)  :obj (u_3 / cat  :amod (u_4 / black))  :obl (u_5 / park  :case (u_6 / in)))",
    )
    .unwrap();
    g
  }

  fn keys<K: Copy>(fired: Vec<RuleMatch<'_, K>>) -> Vec<K> {
    fired.into_iter().map(|m| *m.key).collect()
  }

  fn fires(positive: &str, negative: &[&str]) -> bool {
    let matcher = Matcher::new(
      vec![(vec![positive], negative.to_vec(), ())],
      MatcherConfig::default(),
    )
    .unwrap();
    !matcher.matches(&target()).unwrap().is_empty()
  }

  #[test]
  fn test_positive_and_negative() {
    crate::init_tracing();
    let matcher = Matcher::new(
      vec![
        (vec!["(u_0 / see :nsubj (u_1 / dog))"], vec![], 'a'),
        (
          vec!["(u_0 / see :nsubj (u_1 / dog))"],
          vec!["(u_0 / cat :amod (u_1 / black))"],
          'b',
        ),
        (
          vec!["(u_0 / see :nsubj (u_1 / dog))", "(u_0 / cat)"],
          vec!["(u_0 / cat :amod (u_1 / white))"],
          'c',
        ),
        (
          vec!["(u_0 / see :nsubj (u_1 / dog))", "(u_0 / mouse)"],
          vec![],
          'd',
        ),
      ],
      MatcherConfig::default(),
    )
    .unwrap();

    let fired = matcher.matches(&target()).unwrap();
    assert_eq!(fired.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 2]);
    assert!(fired.iter().all(|m| m.subgraphs.is_empty()));
    assert_eq!(keys(fired), vec!['a', 'c']);
  }

  #[test]
  fn test_case_sensitivity() {
    let specs = || vec![(vec!["(u_0 / SEE :NSUBJ (u_1 / Dog))"], vec![], 0)];
    let strict = Matcher::new(specs(), MatcherConfig::default()).unwrap();
    assert!(strict.matches(&target()).unwrap().is_empty());

    let relaxed = Matcher::new(
      specs(),
      MatcherConfig {
        case_sensitive: false,
      },
    )
    .unwrap();
    assert_eq!(keys(relaxed.matches(&target()).unwrap()), vec![0]);
  }

  #[test]
  fn test_subgraphs_carry_mapping() {
    let matcher = Matcher::new(
      vec![(
        vec!["(u_0 / cat :amod (u_1 / .*))", "(u_5 / park)"],
        vec![],
        "k",
      )],
      MatcherConfig::default(),
    )
    .unwrap();

    let fired = matcher.matches_with_subgraphs(&target()).unwrap();
    assert_eq!(fired.len(), 1);
    let subgraphs = &fired[0].subgraphs;
    assert_eq!(subgraphs.len(), 2);
    assert_eq!(subgraphs[0].node(NodeId(3)).unwrap().mapping, Some(NodeId(0)));
    assert_eq!(subgraphs[0].node(NodeId(4)).unwrap().mapping, Some(NodeId(1)));
    assert_eq!(subgraphs[1].node_ids().collect::<Vec<_>>(), vec![NodeId(5)]);
    assert_eq!(subgraphs[1].node(NodeId(5)).unwrap().mapping, Some(NodeId(5)));
  }

  #[test]
  fn test_wildcards() {
    assert!(fires("(u_0 :obj (u_1))", &[]));
    assert!(fires("(u_0 / see :nsubj (u_1))", &[]));
    assert!(!fires("(u_0 :iobj (u_1))", &[]));

    let mut g = target();
    g.add_edge(NodeId(2), NodeId(6), None);
    let matcher = Matcher::new(
      vec![(vec!["(u_0 / dog :anything (u_1 / in))"], vec![], ())],
      MatcherConfig::default(),
    )
    .unwrap();
    assert_eq!(matcher.matches(&g).unwrap().len(), 1);
  }

  #[test]
  fn test_max_distance() {
    // see -> cat -> black: roots see and black are 2 apart
    assert!(fires("2((u_0 / see),(u_0 / black))", &[]));
    assert!(!fires("1((u_0 / see),(u_0 / black))", &[]));
    assert!(fires("1((u_0 / see),(u_0 / cat))", &[]));
    assert!(fires("0((u_0 / see :obj (u_1)),(u_0 / see))", &[]));
    // distances are directed
    assert!(!fires("5((u_0 / black),(u_0 / see))", &[]));
    // no operand match at all
    assert!(!fires("3((u_0 / mouse),(u_0 / see))", &[]));
  }

  #[test]
  fn test_operator_subgraph_is_union() {
    let matcher = Matcher::new(
      vec![(vec!["1((u_0 / see :nsubj (u_1)),(u_2 / park)) "], vec![], ())],
      MatcherConfig::default(),
    )
    .unwrap();
    let fired = matcher.matches_with_subgraphs(&target()).unwrap();
    let sub = &fired[0].subgraphs[0];
    assert_eq!(
      sub.node_ids().collect::<Vec<_>>(),
      vec![NodeId(1), NodeId(2), NodeId(5)]
    );
    assert!(sub.contains_edge(NodeId(1), NodeId(2)));
    // the path between the roots isn't part of either operand
    assert_eq!(sub.edge_count(), 1);
  }

  #[test]
  fn test_path_and_undirected() {
    assert!(fires("path((u_0 / see),(u_0 / in))", &[]));
    assert!(!fires("path((u_0 / in),(u_0 / see))", &[]));
    assert!(fires("undirected((u_0 / in),(u_0 / see))", &[]));
    assert!(fires("undirected((u_0 / black),(u_0 / dog))", &[]));
    assert!(!fires("path((u_0 / black),(u_0 / dog))", &[]));

    // an operator can veto too
    assert!(!fires(
      "(u_0 / see)",
      &["undirected((u_0 / black),(u_0 / dog))"]
    ));
  }

  #[test]
  fn test_first_pair_wins_over_later_ambiguous_root() {
    let (mut g, _) = Graph::from_penman("(u_1 / see  :obj (u_3 / cat))").unwrap();
    g.add_node(NodeId(9), NodeData::new("see"));
    g.add_edge(NodeId(9), NodeId(9), Some("again".to_string()));

    let matcher = Matcher::new(
      vec![
        (vec!["(u_0 / cat)"], vec![], "plain"),
        (vec!["1((u_0 / see),(u_0 / cat))"], vec![], "near"),
      ],
      MatcherConfig::default(),
    )
    .unwrap();
    assert_eq!(keys(matcher.matches(&g).unwrap()), vec!["plain", "near"]);

    // the looping see only gets its root checked once cat -> see fails
    let matcher = Matcher::new(
      vec![(vec!["path((u_0 / cat),(u_0 / see))"], vec![], ())],
      MatcherConfig::default(),
    )
    .unwrap();
    assert!(matches!(
      matcher.matches(&g),
      Err(Error::AmbiguousRoot { roots: 0 })
    ));
  }

  #[test]
  fn test_ambiguous_root() {
    let mut g = target();
    g.add_edge(NodeId(4), NodeId(3), Some("back".to_string()));
    let matcher = Matcher::new(
      vec![(vec!["path((u_0 / cat :amod (u_1)),(u_0 / see))"], vec![], ())],
      MatcherConfig::default(),
    )
    .unwrap();
    assert!(matches!(
      matcher.matches(&g),
      Err(Error::AmbiguousRoot { roots: 0 })
    ));
  }
}
