//! Recursive-descent reader for the bracketed graph notations
//!
//! Both penman and bolinas strings share one surface syntax:
//!
//! ```text
//! (var [/ label] :role target :role target ...)
//! ```
//!
//! where a target is a nested node, a bare symbol (a reference to another
//! variable or a constant), a quoted string, or nothing at all (a unary edge,
//! which bolinas uses for node labels). Labels, constants and roles may carry
//! a surface alignment such as `~e.2`. This module parses that syntax into
//! a small tree; `penman` and `bolinas` turn the tree into a `Graph`.

pub mod bolinas;
pub mod penman;

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::graph::NodeId;
use crate::{Error, Result};

pub use bolinas::Bolinas;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tree<'a> {
  pub var: &'a str,
  pub label: Option<Atom<'a>>,
  /// First token index of the label's alignment
  pub alignment: Option<usize>,
  pub branches: Vec<Branch<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch<'a> {
  /// The role without its leading colon, may be empty
  pub role: &'a str,
  pub target: Target<'a>,
  /// First token index aligned to an atom target
  pub alignment: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target<'a> {
  Node(Tree<'a>),
  Atom(Atom<'a>),
  Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Atom<'a> {
  Symbol(&'a str),
  Quoted(String),
}

impl Atom<'_> {
  pub fn text(&self) -> &str {
    match self {
      Self::Symbol(s) => s,
      Self::Quoted(s) => s,
    }
  }
}

impl<'a> Tree<'a> {
  /// Pre-order walk over this node and every nested node
  pub fn walk(&self, visit: &mut impl FnMut(&Tree<'a>)) {
    visit(self);
    for branch in self.branches.iter() {
      if let Target::Node(child) = &branch.target {
        child.walk(visit);
      }
    }
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str)>;

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  if let Some(m) = re.find(s) {
    if m.start() > 0 {
      return (None, s);
    }
    let (_, rest) = s.split_at(m.end());
    (Some(m.as_str()), rest)
  } else {
    (None, s)
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(Error::Parse(format!("couldn't match {} at {}", re, s)))
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(Error::Parse(format!("couldn't match {} at {}", c, s)))
  }
}

fn skip_whitespace(s: &str) -> &str {
  s.trim_start()
}

/// Skips leading whitespace and `#` metadata lines
fn skip_metadata(s: &str) -> &str {
  regex_static!(METADATA, r"(\s*#[^\n]*\n)*\s*");
  optional_re(&*METADATA, s).1
}

regex_static!(SYMBOL, r#"[^\s()/:~"]+"#);

fn parse_symbol(s: &str) -> ParseResult<'_, &str> {
  needed_re(&*SYMBOL, s)
}

fn parse_quoted(s: &str) -> ParseResult<'_, String> {
  regex_static!(QUOTED, r#""(?:[^"\\]|\\.)*""#);
  let (quoted, s) = needed_re(&*QUOTED, s)?;
  let inner = &quoted[1..quoted.len() - 1];

  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      if let Some(escaped) = chars.next() {
        out.push(escaped);
      }
    } else {
      out.push(c);
    }
  }
  Ok((out, s))
}

fn parse_atom(s: &str) -> ParseResult<'_, Atom<'_>> {
  if s.starts_with('"') {
    let (text, s) = parse_quoted(s)?;
    Ok((Atom::Quoted(text), s))
  } else {
    let (sym, s) = parse_symbol(s)?;
    Ok((Atom::Symbol(sym), s))
  }
}

/// An optional alignment suffix (`~e.2`, `~e.2,3` or `~2`), giving its first index
fn parse_alignment(s: &str) -> ParseResult<'_, Option<usize>> {
  regex_static!(ALIGNMENT, r"~(?:[A-Za-z]+\.)?(\d+)(?:,\d+)*");
  let (Some(alignment), rest) = optional_re(&*ALIGNMENT, s) else {
    return Ok((None, s));
  };

  let indices = alignment.rsplit('.').next().unwrap_or(alignment);
  let first = indices.trim_start_matches('~').split(',').next().unwrap_or("");
  let index = first
    .parse()
    .map_err(|_| Error::Parse(format!("bad alignment {}", alignment)))?;
  Ok((Some(index), rest))
}

fn parse_branch(s: &str) -> ParseResult<'_, Branch<'_>> {
  regex_static!(ROLE, r":[^\s()~]*");
  let (role, s) = needed_re(&*ROLE, s).map_err(|e| Error::Parse(format!("role: {}", e)))?;
  let (_, s) = parse_alignment(s)?;
  let s = skip_whitespace(s);

  let (target, alignment, s) = if s.starts_with('(') {
    let (tree, s) = parse_tree(s)?;
    (Target::Node(tree), None, s)
  } else if s.starts_with(':') || s.starts_with(')') {
    (Target::Empty, None, s)
  } else {
    let (atom, s) = parse_atom(s).map_err(|e| Error::Parse(format!("role target: {}", e)))?;
    let (alignment, s) = parse_alignment(s)?;
    (Target::Atom(atom), alignment, s)
  };

  Ok((
    Branch {
      role: &role[1..],
      target,
      alignment,
    },
    s,
  ))
}

pub(crate) fn parse_tree(s: &str) -> ParseResult<'_, Tree<'_>> {
  let (_, s) = needed_char('(', s)?;
  let s = skip_whitespace(s);
  let (var, s) = parse_symbol(s).map_err(|e| Error::Parse(format!("variable: {}", e)))?;
  let s = skip_whitespace(s);

  let (label, alignment, s) = if let (Some(_), s) = optional_char('/', s) {
    let s = skip_whitespace(s);
    let (atom, s) = parse_atom(s).map_err(|e| Error::Parse(format!("label: {}", e)))?;
    let (alignment, s) = parse_alignment(s)?;
    (Some(atom), alignment, s)
  } else {
    (None, None, s)
  };

  let mut branches = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), rest) = optional_char(')', rem) {
      return Ok((
        Tree {
          var,
          label,
          alignment,
          branches,
        },
        rest,
      ));
    }
    if rem.is_empty() {
      return Err(Error::Parse(format!("unclosed node {}", var)));
    }
    let (branch, rest) = parse_branch(rem)?;
    branches.push(branch);
    rem = rest;
  }
}

/// Parses a whole document: optional metadata, one tree, nothing after it
pub(crate) fn parse_document(s: &str) -> Result<Tree<'_>> {
  let s = skip_metadata(s);
  let (tree, rest) = parse_tree(s)?;
  let rest = skip_whitespace(rest);
  if rest.is_empty() {
    Ok(tree)
  } else {
    Err(Error::Parse(format!("trailing input after graph: {}", rest)))
  }
}

/// Splits a role into its colour and whether it was written inverted (`-of`)
pub(crate) fn split_role(role: &str) -> (Option<String>, bool) {
  let (color, inverted) = match role.strip_suffix("-of") {
    Some(stripped) => (stripped, true),
    None => (role, false),
  };
  if color.is_empty() {
    (None, inverted)
  } else {
    (Some(color.to_string()), inverted)
  }
}

/// The node id a variable names: `u_12` and `n12.` are both 12. Other
/// variables (`c2`, `b`) don't name an id.
pub(crate) fn numeric_id(var: &str) -> Option<usize> {
  regex_static!(NUMBERED, r"^(?:u_(\d+)|n(\d+)\.)$");
  NUMBERED
    .captures(var)
    .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
    .and_then(|m| m.as_str().parse().ok())
}

/// Hands out node ids for variables, keeping numbered variables on their
/// number and putting everything else after the largest number seen
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
  ids: HashMap<String, NodeId>,
  next: usize,
}

impl IdAllocator {
  /// Registers every variable up front so fresh ids never collide with
  /// numbered ones. A variable whose number is already taken by another
  /// one gets a fresh id.
  pub fn new<'v, I>(vars: I) -> Self
  where
    I: IntoIterator<Item = &'v str>,
  {
    let vars = vars.into_iter().collect::<Vec<_>>();
    let mut alloc = Self::default();
    let mut taken: HashSet<usize> = HashSet::new();

    for var in vars.iter().copied() {
      if let Some(n) = numeric_id(var) {
        alloc.next = alloc.next.max(n + 1);
        if !alloc.ids.contains_key(var) && taken.insert(n) {
          alloc.ids.insert(var.to_string(), NodeId(n));
        }
      }
    }
    for var in vars.iter().copied() {
      if !alloc.ids.contains_key(var) {
        let id = alloc.fresh();
        alloc.ids.insert(var.to_string(), id);
      }
    }

    alloc
  }

  pub fn get(&self, var: &str) -> Option<NodeId> {
    self.ids.get(var).copied()
  }

  pub fn fresh(&mut self) -> NodeId {
    let id = NodeId(self.next);
    self.next += 1;
    id
  }
}

/// Labels that can be written without quotes
pub(crate) fn is_plain_symbol(s: &str) -> bool {
  regex_static!(PLAIN, r#"^[^\s()/:~"]+$"#);
  PLAIN.is_match(s)
}

pub(crate) fn quote(s: &str) -> String {
  format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
