#[macro_use]
extern crate lazy_static;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

pub mod error;
pub mod extract;
pub mod fourlang;
pub mod graph;
pub mod isomorphism;
pub mod matcher;
pub mod notation;
pub mod pattern;
pub mod rooted;
pub mod ud;
pub mod utils;

pub use crate::error::{Error, Result};
pub use crate::extract::{
  ChunkConfig, ExtractionPattern, Predicate, SentenceGraph, Triple, TripleExtractor,
};
pub use crate::graph::{Disconnected, Edge, EdgePalette, Graph, NodeData, NodeId};
pub use crate::matcher::{Matcher, RuleMatch};
pub use crate::notation::Bolinas;
pub use crate::pattern::{Clause, LabelMatcher, MatcherConfig, Pattern, Rule};
pub use crate::rooted::RootedGraph;
pub use crate::ud::{UdSentence, UdWord};

/// Installs a test-writer subscriber once; `RUST_LOG` picks the level
#[cfg(test)]
pub(crate) fn init_tracing() {
  use tracing_subscriber::EnvFilter;

  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

#[test]
fn test_sentence_to_triples() {
  init_tracing();

  let conllu = "# text = He is the brother of the composer
1\tHe\the\tPRON\tPRP\t_\t4\tnsubj\t_\t_
2\tis\tbe\tAUX\tVBZ\t_\t4\tcop\t_\t_
3\tthe\tthe\tDET\tDT\t_\t4\tdet\t_\t_
4\tbrother\tbrother\tNOUN\tNN\t_\t0\troot\t_\t_
5\tof\tof\tADP\tIN\t_\t7\tcase\t_\t_
6\tthe\tthe\tDET\tDT\t_\t7\tdet\t_\t_
7\tcomposer\tcomposer\tNOUN\tNN\t_\t4\tnmod\t_\t_
";
  let sentence: UdSentence = conllu.parse().unwrap();
  let graph = sentence.to_graph();

  let matcher = Matcher::new(
    vec![
      (vec!["(u_0 / brother :nsubj (u_1 / he))"], vec![], "kinship"),
      (
        vec!["(u_0 / brother :nsubj (u_1 / he))"],
        vec!["(u_0 / composer :det (u_1 / a))"],
        "indefinite",
      ),
      (vec!["(u_0 / .* :nsubj (u_1 / she))"], vec![], "female"),
    ],
    MatcherConfig {
      case_sensitive: false,
    },
  )
  .unwrap();
  let fired = matcher
    .matches(&graph.graph)
    .unwrap()
    .into_iter()
    .map(|m| *m.key)
    .collect::<Vec<_>>();
  assert_eq!(fired, vec!["kinship", "indefinite"]);

  let triples = TripleExtractor::ud_defaults().unwrap().extract(&graph).unwrap();
  assert_eq!(
    triples,
    vec![
      Triple::new("is the brother of", ["He", "the composer"]),
      Triple::new("is", ["He", "the brother of the composer"]),
      Triple::new("is", ["He", "the brother", "of the composer"]),
    ]
  );
}
