use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, TranslationNode};
use crate::{Result, SyncError};

/// A validated dotted key such as `welcome.title`: one or more non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn prefix(&self, depth: usize) -> String {
        self.segments[..=depth].join(".")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        to_path(s)
    }
}

/// Split a dotted key into segments. Empty input, leading/trailing dots and
/// doubled dots are all rejected.
pub fn to_path(dotted: &str) -> Result<KeyPath> {
    if dotted.trim().is_empty() {
        return Err(SyncError::invalid_key(dotted, "key is empty"));
    }
    let segments: Vec<String> = dotted.split('.').map(str::to_string).collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(SyncError::invalid_key(dotted, "key contains an empty segment"));
    }
    Ok(KeyPath { segments })
}

/// What a key path currently addresses inside a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<'a> {
    Leaf(&'a str),
    Branch,
    Absent,
    /// A proper prefix of the path is a leaf, so the path cannot exist without
    /// replacing that leaf.
    BlockedByLeaf(String),
}

impl Probe<'_> {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Probe::Branch | Probe::BlockedByLeaf(_))
    }
}

pub fn probe<'a>(catalog: &'a Catalog, path: &KeyPath) -> Probe<'a> {
    let mut current = catalog;
    let last = path.segments.len() - 1;
    for (depth, segment) in path.segments.iter().enumerate() {
        match current.get(segment) {
            None => return Probe::Absent,
            Some(TranslationNode::Leaf(text)) if depth == last => return Probe::Leaf(text),
            Some(TranslationNode::Leaf(_)) => return Probe::BlockedByLeaf(path.prefix(depth)),
            Some(TranslationNode::Branch(_)) if depth == last => return Probe::Branch,
            Some(TranslationNode::Branch(inner)) => current = inner,
        }
    }
    Probe::Absent
}

/// The leaf string at `path`, if there is one.
pub fn read<'a>(catalog: &'a Catalog, path: &KeyPath) -> Option<&'a str> {
    match probe(catalog, path) {
        Probe::Leaf(text) => Some(text),
        _ => None,
    }
}

/// Result of a [`write`]. The two `Replaced*` variants mean structure was
/// lost and must be surfaced to the caller as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated { previous: String },
    Unchanged,
    /// The path addressed a nested group, which is now a single leaf.
    ReplacedBranch,
    /// A leaf at `prefix` had to become a group to make room for the path.
    ReplacedLeaf { prefix: String, previous: String },
}

impl WriteOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ReplacedBranch | Self::ReplacedLeaf { .. })
    }

    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Return a copy of `catalog` with `value` stored at `path`, creating
/// intermediate groups as needed. The input catalog is left untouched.
pub fn write(catalog: &Catalog, path: &KeyPath, value: &str) -> (Catalog, WriteOutcome) {
    let mut next = catalog.clone();
    let outcome = write_in_place(&mut next, path, 0, value);
    (next, outcome)
}

fn write_in_place(catalog: &mut Catalog, path: &KeyPath, depth: usize, value: &str) -> WriteOutcome {
    let segment = &path.segments[depth];
    let entries = catalog.entries_mut();

    if depth + 1 == path.segments.len() {
        let outcome = match entries.get(segment) {
            Some(TranslationNode::Leaf(old)) if old == value => return WriteOutcome::Unchanged,
            Some(TranslationNode::Leaf(old)) => WriteOutcome::Updated {
                previous: old.clone(),
            },
            Some(TranslationNode::Branch(_)) => WriteOutcome::ReplacedBranch,
            None => WriteOutcome::Created,
        };
        entries.insert(segment.clone(), TranslationNode::Leaf(value.to_string()));
        return outcome;
    }

    let node = entries
        .entry(segment.clone())
        .or_insert_with(|| TranslationNode::Branch(Catalog::new()));
    let (mut child, replaced) =
        std::mem::replace(node, TranslationNode::Branch(Catalog::new())).into_branch();
    let inner = write_in_place(&mut child, path, depth + 1, value);
    *node = TranslationNode::Branch(child);
    match replaced {
        Some(previous) => WriteOutcome::ReplacedLeaf {
            prefix: path.prefix(depth),
            previous,
        },
        None => inner,
    }
}

/// Depth-first `(dotted key, value)` pairs in insertion order.
pub fn flatten(catalog: &Catalog) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(catalog, "", &mut out);
    out
}

fn flatten_into(catalog: &Catalog, prefix: &str, out: &mut Vec<(String, String)>) {
    for (segment, node) in catalog.iter() {
        let key = if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}.{segment}")
        };
        match node {
            TranslationNode::Leaf(text) => out.push((key, text.clone())),
            TranslationNode::Branch(inner) => flatten_into(inner, &key, out),
        }
    }
}

/// Rebuild a catalog from dotted pairs. Pairs that would overwrite structure
/// built by earlier pairs are rejected instead of silently replacing it.
pub fn unflatten<I, K, V>(pairs: I) -> Result<Catalog>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut catalog = Catalog::new();
    for (key, value) in pairs {
        let path = to_path(key.as_ref())?;
        match probe(&catalog, &path) {
            Probe::Branch => {
                return Err(SyncError::invalid_key(
                    key.as_ref(),
                    "already used as a group of nested keys",
                ))
            }
            Probe::BlockedByLeaf(prefix) => {
                return Err(SyncError::invalid_key(
                    key.as_ref(),
                    format!("`{prefix}` already holds a string"),
                ))
            }
            Probe::Leaf(_) | Probe::Absent => {}
        }
        write_in_place(&mut catalog, &path, 0, value.as_ref());
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(json: &str) -> Catalog {
        Catalog::from_json_str(json).unwrap()
    }

    #[test]
    fn to_path_rejects_malformed_keys() {
        for bad in ["", "   ", ".a", "a.", "a..b", "."] {
            let err = to_path(bad).unwrap_err();
            assert!(matches!(err, SyncError::InvalidKey { .. }), "{bad:?}");
        }
        let path = to_path("welcome.title").unwrap();
        assert_eq!(path.segments(), ["welcome", "title"]);
        assert_eq!(path.to_string(), "welcome.title");
    }

    #[test]
    fn write_then_read_returns_value() {
        let base = cat(r#"{"x":{"y":"1"},"z":"2"}"#);
        for (key, value) in [("a.b.c", "deep"), ("x.y", "changed"), ("z", ""), ("x.w", "new")] {
            let path = to_path(key).unwrap();
            let (next, _) = write(&base, &path, value);
            assert_eq!(read(&next, &path), Some(value), "{key}");
        }
    }

    #[test]
    fn write_leaves_input_untouched() {
        let base = cat(r#"{"a":{"b":"Hello"}}"#);
        let (next, outcome) = write(&base, &to_path("a.b").unwrap(), "Bonjour");
        assert_eq!(
            outcome,
            WriteOutcome::Updated {
                previous: "Hello".into()
            }
        );
        assert_eq!(read(&base, &to_path("a.b").unwrap()), Some("Hello"));
        assert_eq!(read(&next, &to_path("a.b").unwrap()), Some("Bonjour"));
    }

    #[test]
    fn write_reports_structural_conflicts() {
        let base = cat(r#"{"a":{"b":"Hello"}}"#);
        let (next, outcome) = write(&base, &to_path("a").unwrap(), "flat");
        assert_eq!(outcome, WriteOutcome::ReplacedBranch);
        assert!(outcome.is_conflict());
        assert_eq!(read(&next, &to_path("a").unwrap()), Some("flat"));

        let (next, outcome) = write(&base, &to_path("a.b.c").unwrap(), "deeper");
        assert_eq!(
            outcome,
            WriteOutcome::ReplacedLeaf {
                prefix: "a.b".into(),
                previous: "Hello".into()
            }
        );
        assert_eq!(read(&next, &to_path("a.b.c").unwrap()), Some("deeper"));
    }

    #[test]
    fn unchanged_write_is_not_a_change() {
        let base = cat(r#"{"a":"x"}"#);
        let (_, outcome) = write(&base, &to_path("a").unwrap(), "x");
        assert!(!outcome.changed());
    }

    #[test]
    fn probe_distinguishes_shapes() {
        let base = cat(r#"{"a":{"b":"Hello"},"c":"C"}"#);
        assert_eq!(probe(&base, &to_path("a.b").unwrap()), Probe::Leaf("Hello"));
        assert_eq!(probe(&base, &to_path("a").unwrap()), Probe::Branch);
        assert_eq!(probe(&base, &to_path("a.q").unwrap()), Probe::Absent);
        assert_eq!(
            probe(&base, &to_path("c.d").unwrap()),
            Probe::BlockedByLeaf("c".into())
        );
        assert_eq!(read(&base, &to_path("a").unwrap()), None);
    }

    #[test]
    fn flatten_is_depth_first_in_insertion_order() {
        let base = cat(r#"{"z":"1","a":{"m":"2","b":{"c":"3"}},"y":"4"}"#);
        let keys: Vec<_> = flatten(&base).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a.m", "a.b.c", "y"]);
    }

    #[test]
    fn unflatten_of_flatten_is_identity() {
        let base = cat(r#"{"nav":{"home":"Home","about":{"title":"About","body":"Text"}},"footer":"F"}"#);
        assert_eq!(unflatten(flatten(&base)).unwrap(), base);
    }

    #[test]
    fn unflatten_rejects_overlapping_keys() {
        assert!(unflatten([("a", "x"), ("a.b", "y")]).is_err());
        assert!(unflatten([("a.b", "y"), ("a", "x")]).is_err());
        assert!(unflatten([("a..b", "y")]).is_err());
    }
}
