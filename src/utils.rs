/// Normalises a dependency relation into an edge colour: `nsubj:pass` -> `NSUBJ_PASS`
pub fn normalize_edge(deprel: &str) -> String {
  deprel.replace(':', "_").to_uppercase()
}

/// Makes a label safe to use as a dot node label
pub fn dot_clean(label: &str) -> String {
  const UNSAFE: &str = "\\=@-,'\".!:;<>/{}[]()#^?";
  const KEYWORDS: [&str; 4] = ["graph", "node", "strict", "edge"];

  let mut s = label
    .chars()
    .map(|c| if UNSAFE.contains(c) { '_' } else { c })
    .collect::<String>()
    .replace('$', "_dollars")
    .replace('%', "_percent")
    .replace(['|', '*'], " ");

  if s.starts_with(|c: char| c.is_ascii_digit()) || KEYWORDS.contains(&s.as_str()) {
    s.insert(0, 'X');
  }
  s
}

/// All subsets of `items` with exactly `k` elements, each in the original order.
///
/// ```
/// assert_eq!(graphformula::utils::k_combinations(&[1, 2, 3], 2), vec![
///   vec![1, 2],
///   vec![1, 3],
///   vec![2, 3],
/// ]);
/// ```
pub fn k_combinations<T>(items: &[T], k: usize) -> Vec<Vec<T>>
where
  T: Clone,
{
  if k == 0 {
    return vec![Vec::new()];
  }
  if items.len() < k {
    return Vec::new();
  }

  let (head, tail) = items.split_at(1);
  let mut with_head = k_combinations(tail, k - 1)
    .into_iter()
    .map(|mut rest| {
      rest.insert(0, head[0].clone());
      rest
    })
    .collect::<Vec<_>>();
  with_head.extend(k_combinations(tail, k));
  with_head
}

#[test]
fn test_dot_clean() {
  assert_eq!(dot_clean("ice-cream"), "ice_cream");
  assert_eq!(dot_clean("5"), "X5");
  assert_eq!(dot_clean("node"), "Xnode");
  assert_eq!(dot_clean("100%"), "X100_percent");
  assert_eq!(dot_clean("a|b"), "a b");
}

#[test]
fn test_normalize_edge() {
  assert_eq!(normalize_edge("nsubj:pass"), "NSUBJ_PASS");
  assert_eq!(normalize_edge("det"), "DET");
}
