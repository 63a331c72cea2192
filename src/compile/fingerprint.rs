use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;
use xxhash_rust::xxh3::Xxh3;

use crate::composition::page::Page;
use crate::data::catalog::DataCatalog;
use crate::foundation::error::{VizError, VizResult};
use crate::spec::intent::{ResolvedIntent, ResolvedViz};
use crate::tree::build::{PageTree, TreeNode};

const XXH3_SEED: u64 = 0x5f3c_9a17_d2e4_b860;
const FORMAT_TAG: &str = "vizdeck-page-v1";

/// Parameter names whose values change on every run and never affect rendered content.
pub const VOLATILE_PARAMS: &[&str] = &["generated_at", "timestamp", "build_time", "chart_id"];

/// Stable 128-bit digest of everything that affects one page's rendered artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentFingerprint {
    /// High 64 bits of the digest.
    pub hi: u64,
    /// Low 64 bits of the digest.
    pub lo: u64,
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

impl From<ContentFingerprint> for String {
    fn from(fp: ContentFingerprint) -> Self {
        fp.to_string()
    }
}

impl TryFrom<String> for ContentFingerprint {
    type Error = VizError;

    fn try_from(s: String) -> VizResult<Self> {
        s.parse()
    }
}

impl std::str::FromStr for ContentFingerprint {
    type Err = VizError;

    fn from_str(s: &str) -> VizResult<Self> {
        if s.len() != 32 || !s.is_ascii() {
            return Err(VizError::cache_io(format!("malformed fingerprint '{s}'")));
        }
        let part = |r: &str| {
            u64::from_str_radix(r, 16)
                .map_err(|_| VizError::cache_io(format!("malformed fingerprint '{s}'")))
        };
        Ok(Self {
            hi: part(&s[..16])?,
            lo: part(&s[16..])?,
        })
    }
}

/// Fingerprint a page from its resolved tree and the data it reads.
///
/// Covers the page id, title and style, every resolved leaf (volatile parameters excluded),
/// display labels of segments present in the tree, and the content signature of each
/// referenced data source. `PageMeta` is not hashed.
pub fn fingerprint_page(page: &Page, tree: &PageTree, catalog: &DataCatalog) -> ContentFingerprint {
    let mut h = StableHasher::new();
    h.write_str(FORMAT_TAG);
    h.write_str(page.id());
    h.write_str(page.title());
    write_map(&mut h, page.style_params());

    let mut sources = BTreeSet::new();
    let mut segments = BTreeSet::new();
    collect(&tree.root, &mut sources, &mut segments);

    h.write_u32(sources.len() as u32);
    for name in &sources {
        h.write_str(name);
        match catalog.get(name) {
            Some(src) => {
                h.write_u8(1);
                h.write_str(&src.signature);
            }
            None => h.write_u8(0),
        }
    }

    let used: Vec<(&str, &str)> = tree
        .labels
        .entries()
        .filter(|(raw, _)| segments.contains(raw))
        .collect();
    h.write_u32(used.len() as u32);
    for (raw, shown) in used {
        h.write_str(raw);
        h.write_str(shown);
    }

    write_node(&mut h, &tree.root);
    h.finish()
}

fn collect<'a>(
    node: &'a TreeNode<ResolvedIntent>,
    sources: &mut BTreeSet<&'a str>,
    segments: &mut BTreeSet<&'a str>,
) {
    for leaf in node.leaves() {
        if let ResolvedIntent::Viz(v) = leaf {
            sources.extend(v.data.as_deref());
            sources.extend(v.filter.as_ref().and_then(|f| f.source()));
        }
    }
    for child in node.children() {
        segments.insert(child.label());
        collect(child, sources, segments);
    }
}

fn write_node(h: &mut StableHasher, node: &TreeNode<ResolvedIntent>) {
    h.write_str(node.label());
    h.write_u32(node.leaves().len() as u32);
    for leaf in node.leaves() {
        write_leaf(h, leaf);
    }
    h.write_u32(node.children().len() as u32);
    for child in node.children() {
        write_node(h, child);
    }
}

fn write_leaf(h: &mut StableHasher, leaf: &ResolvedIntent) {
    match leaf {
        ResolvedIntent::Viz(v) => {
            h.write_u8(0);
            write_viz(h, v);
        }
        ResolvedIntent::Text(t) => {
            h.write_u8(1);
            h.write_str(&t.content);
        }
        ResolvedIntent::Layout(l) => {
            h.write_u8(2);
            h.write_str(l.layout.as_str());
            write_map(h, &l.params);
        }
        ResolvedIntent::Input(i) => {
            h.write_u8(3);
            h.write_str(&i.id);
            h.write_str(&i.variable);
            h.write_str(i.input_type.as_str());
            h.write_opt_str(i.label.as_deref());
            h.write_u32(i.options.len() as u32);
            for o in &i.options {
                h.write_json(o);
            }
            h.write_opt_str(i.show_when.as_deref());
        }
    }
}

fn write_viz(h: &mut StableHasher, v: &ResolvedViz) {
    h.write_str(v.kind.as_str());
    match &v.filter {
        Some(f) => {
            h.write_u8(1);
            h.write_str(f.text());
            h.write_opt_str(f.source());
        }
        None => h.write_u8(0),
    }
    let stable: Vec<(&String, &Value)> = v
        .params
        .iter()
        .filter(|(k, _)| !VOLATILE_PARAMS.contains(&k.as_str()))
        .collect();
    h.write_u32(stable.len() as u32);
    for (k, val) in stable {
        h.write_str(k);
        h.write_json(val);
    }
}

fn write_map(h: &mut StableHasher, map: &BTreeMap<String, Value>) {
    h.write_u32(map.len() as u32);
    for (k, v) in map {
        h.write_str(k);
        h.write_json(v);
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    fn write_opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.write_u8(1);
                self.write_str(s);
            }
            None => self.write_u8(0),
        }
    }

    fn write_json(&mut self, v: &Value) {
        match v {
            Value::Null => self.write_u8(0),
            Value::Bool(b) => {
                self.write_u8(1);
                self.write_u8(u8::from(*b));
            }
            Value::Number(n) => {
                self.write_u8(2);
                self.write_str(&n.to_string());
            }
            Value::String(s) => {
                self.write_u8(3);
                self.write_str(s);
            }
            Value::Array(items) => {
                self.write_u8(4);
                self.write_u32(items.len() as u32);
                for item in items {
                    self.write_json(item);
                }
            }
            Value::Object(map) => {
                self.write_u8(5);
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                self.write_u32(keys.len() as u32);
                for k in keys {
                    self.write_str(k);
                    self.write_json(&map[k]);
                }
            }
        }
    }

    fn finish(self) -> ContentFingerprint {
        let v = self.inner.digest128();
        ContentFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/fingerprint.rs"]
mod tests;
