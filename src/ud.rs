//! Universal Dependencies sentences, read from CoNLL-U
//!
//! This is the common structure dependency parsers hand over; `to_graph`
//! turns it into the sentence graph that rules are matched against.

use std::str::FromStr;

use crate::extract::SentenceGraph;
use crate::graph::{Graph, NodeData, NodeId};
use crate::utils::normalize_edge;
use crate::{Error, Result};

/// Name of the node 0 that sits above the root word
const ROOT_LABEL: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdWord {
  /// 1-based position in the sentence
  pub id: usize,
  pub text: String,
  pub lemma: String,
  pub upos: String,
  /// 0 for the root word
  pub head: usize,
  pub deprel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdSentence {
  pub words: Vec<UdWord>,
}

fn parse_word(line: &str) -> Result<Option<UdWord>> {
  let columns = line.split('\t').collect::<Vec<_>>();
  if columns.len() != 10 {
    return Err(Error::Parse(format!(
      "expected 10 CoNLL-U columns, got {}: {}",
      columns.len(),
      line
    )));
  }

  // multiword token ranges and empty nodes
  if columns[0].contains(['-', '.']) {
    return Ok(None);
  }

  let number = |column: &str, what: &str| {
    column
      .parse::<usize>()
      .map_err(|e| Error::Parse(format!("{} {:?}: {}", what, column, e)))
  };
  let text = columns[1].to_string();
  let lemma = match columns[2] {
    "_" => text.clone(),
    lemma => lemma.to_string(),
  };

  Ok(Some(UdWord {
    id: number(columns[0], "word id")?,
    text,
    lemma,
    upos: columns[3].to_string(),
    head: number(columns[6], "head")?,
    deprel: columns[7].to_string(),
  }))
}

impl FromStr for UdSentence {
  type Err = Error;

  /// Reads one sentence; comment lines are skipped, a blank line ends it
  fn from_str(s: &str) -> Result<Self> {
    let mut words = Vec::new();
    for line in s.lines().map(str::trim_end) {
      if line.starts_with('#') {
        continue;
      }
      if line.is_empty() {
        if words.is_empty() {
          continue;
        }
        break;
      }
      if let Some(word) = parse_word(line)? {
        words.push(word);
      }
    }
    Ok(Self { words })
  }
}

impl UdSentence {
  pub fn tokens(&self) -> Vec<&str> {
    self.words.iter().map(|w| w.text.as_str()).collect()
  }

  /// One node per word named by its lemma, plus a `root` node 0 above the
  /// root word. Edges run head -> dependent, coloured with the normalised
  /// relation.
  pub fn to_graph(&self) -> SentenceGraph {
    let mut graph = Graph::new();
    for word in self.words.iter() {
      graph.add_node(
        NodeId(word.id),
        NodeData::new(word.lemma.clone())
          .with_token(word.id)
          .with_upos(word.upos.clone()),
      );
      if word.head == 0 {
        graph.add_node(NodeId(0), NodeData::new(ROOT_LABEL));
      }
      graph.add_edge(
        NodeId(word.head),
        NodeId(word.id),
        Some(normalize_edge(&word.deprel)),
      );
    }

    SentenceGraph::new(
      graph,
      self.words.iter().map(|w| Some(w.text.clone())).collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SENTENCE: &str = "# sent_id = 1
# text = Im Park schläft er.
1-2\tIm\t_\t_\t_\t_\t_\t_\t_\t_
1\tIn\tin\tADP\tAPPR\t_\t3\tcase\t_\t_
2\tdem\tder\tDET\tART\t_\t3\tdet\t_\t_
3\tPark\tPark\tNOUN\tNN\t_\t4\tobl\t_\t_
4\tschläft\tschlafen\tVERB\tVVFIN\t_\t0\troot\t_\t_
5\ter\ter\tPRON\tPPER\t_\t4\tnsubj:pass\t_\t_
5.1\tja\t_\t_\t_\t_\t_\t_\t_\t_
6\t.\t_\tPUNCT\t$.\t_\t4\tpunct\t_\t_

1\tnext\tnext\tADJ\tJJ\t_\t0\troot\t_\t_
";

  #[test]
  fn test_read_conllu() {
    let sentence: UdSentence = SENTENCE.parse().unwrap();
    assert_eq!(sentence.words.len(), 6);
    assert_eq!(sentence.tokens(), vec!["In", "dem", "Park", "schläft", "er", "."]);
    assert_eq!(sentence.words[3].lemma, "schlafen");
    assert_eq!(sentence.words[5].lemma, ".");
    assert_eq!(sentence.words[4].deprel, "nsubj:pass");

    assert!("1\tIn\tin".parse::<UdSentence>().is_err());
    assert!("x\tIn\tin\tADP\t_\t_\t3\tcase\t_\t_".parse::<UdSentence>().is_err());
  }

  #[test]
  fn test_to_graph() {
    let sentence: UdSentence = SENTENCE.parse().unwrap();
    let sen = sentence.to_graph();
    let g = &sen.graph;

    assert_eq!(g.node_count(), 7);
    assert_eq!(g.name(NodeId(0)), Some("root"));
    assert_eq!(g.edge(NodeId(0), NodeId(4)).unwrap().color(), Some("ROOT"));
    assert_eq!(g.edge(NodeId(4), NodeId(5)).unwrap().color(), Some("NSUBJ_PASS"));
    assert_eq!(g.roots(), vec![NodeId(0)]);

    let park = g.node(NodeId(3)).unwrap();
    assert_eq!(park.token_id, Some(3));
    assert_eq!(park.upos.as_deref(), Some("NOUN"));
    assert_eq!(sen.text(g.node_ids()), "In dem Park schläft er .");
  }

  #[test]
  fn test_root_node_follows_head() {
    let sentence: UdSentence = "1\tGo\tgo\tVERB\tVB\t_\t0\tROOT\t_\t_\n2\t!\t!\tPUNCT\t.\t_\t1\tpunct\t_\t_\n"
      .parse()
      .unwrap();
    let g = sentence.to_graph().graph;
    assert_eq!(g.name(NodeId(0)), Some("root"));
    assert_eq!(g.edge(NodeId(0), NodeId(1)).unwrap().color(), Some("ROOT"));
    assert!(g.nodes().all(|(_, data)| data.is_some()));
  }
}
