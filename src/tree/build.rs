use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::composition::page::Page;
use crate::foundation::error::ItemError;
use crate::foundation::value::Params;
use crate::spec::intent::{ResolvedIntent, param};
use crate::spec::resolve::{parse_path, resolve_intent};

/// A named node of the output tree.
///
/// Children are unique by label and kept in first-seen order; leaves are kept in arrival order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TreeNode<L> {
    label: String,
    children: Vec<TreeNode<L>>,
    leaves: Vec<L>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl<L> TreeNode<L> {
    /// An empty unlabeled root.
    pub fn root() -> Self {
        Self::labeled(String::new())
    }

    fn labeled(label: String) -> Self {
        Self {
            label,
            children: Vec::new(),
            leaves: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Raw path segment (empty at the root).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Child nodes in first-seen order.
    pub fn children(&self) -> &[TreeNode<L>] {
        &self.children
    }

    /// Leaves attached directly to this node.
    pub fn leaves(&self) -> &[L] {
        &self.leaves
    }

    /// Child by raw label.
    pub fn child(&self, label: &str) -> Option<&TreeNode<L>> {
        self.index.get(label).map(|&i| &self.children[i])
    }

    /// Node at `path` below this one.
    pub fn descendant(&self, path: &[&str]) -> Option<&TreeNode<L>> {
        path.iter().try_fold(self, |node, seg| node.child(seg))
    }

    /// Descend `path`, creating missing nodes, and append `leaf` at its end.
    pub fn insert(&mut self, path: &[String], leaf: L) {
        let mut node = self;
        for seg in path {
            let i = match node.index.get(seg) {
                Some(&i) => i,
                None => {
                    node.children.push(TreeNode::labeled(seg.clone()));
                    let i = node.children.len() - 1;
                    node.index.insert(seg.clone(), i);
                    i
                }
            };
            node = &mut node.children[i];
        }
        node.leaves.push(leaf);
    }

    /// Total leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len() + self.children.iter().map(TreeNode::leaf_count).sum::<usize>()
    }

    /// Leaves in depth-first order (a node's own leaves before its children's).
    pub fn iter_leaves(&self) -> Box<dyn Iterator<Item = &L> + '_> {
        Box::new(
            self.leaves
                .iter()
                .chain(self.children.iter().flat_map(|c| c.iter_leaves())),
        )
    }

    /// Same shape, leaves transformed by reference. Leaves are visited in
    /// [`iter_leaves`](Self::iter_leaves) order.
    pub fn map_ref<M>(&self, f: &mut impl FnMut(&L) -> M) -> TreeNode<M> {
        let leaves = self.leaves.iter().map(&mut *f).collect();
        TreeNode {
            label: self.label.clone(),
            children: self.children.iter().map(|c| c.map_ref(f)).collect(),
            leaves,
            index: self.index.clone(),
        }
    }

    /// Like [`map_ref`](Self::map_ref), but collects every leaf error instead of stopping at
    /// the first.
    pub fn try_map_ref<M, E>(
        &self,
        f: &mut impl FnMut(&L) -> Result<M, E>,
    ) -> Result<TreeNode<M>, Vec<E>> {
        let mut errors = Vec::new();
        let mapped = self.try_map_into(f, &mut errors);
        if errors.is_empty() {
            Ok(mapped)
        } else {
            Err(errors)
        }
    }

    fn try_map_into<M, E>(
        &self,
        f: &mut impl FnMut(&L) -> Result<M, E>,
        errors: &mut Vec<E>,
    ) -> TreeNode<M> {
        let mut leaves = Vec::with_capacity(self.leaves.len());
        for l in &self.leaves {
            match f(l) {
                Ok(m) => leaves.push(m),
                Err(e) => errors.push(e),
            }
        }
        TreeNode {
            label: self.label.clone(),
            children: self
                .children
                .iter()
                .map(|c| c.try_map_into(f, errors))
                .collect(),
            leaves,
            index: self.index.clone(),
        }
    }
}

impl<L> Default for TreeNode<L> {
    fn default() -> Self {
        Self::root()
    }
}

/// Build a tree from `(path, leaf)` pairs in one pass, preserving input order.
pub fn build_tree<L, I>(items: I) -> TreeNode<L>
where
    I: IntoIterator<Item = (Vec<String>, L)>,
{
    let mut root = TreeNode::root();
    for (path, leaf) in items {
        root.insert(&path, leaf);
    }
    root
}

/// Display labels for raw path segments. Applied at emission only; tree identity and merging
/// always use raw segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LabelTable(BTreeMap<String, String>);

impl LabelTable {
    /// Constructor.
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }

    /// Display text for a segment; unmapped segments show as themselves.
    pub fn display<'a>(&'a self, segment: &'a str) -> &'a str {
        self.0.get(segment).map(String::as_str).unwrap_or(segment)
    }

    /// Mapped entries, ordered by raw segment.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The resolved tree of one page plus the items that failed to resolve.
#[derive(Debug)]
pub struct PageTree {
    /// Root node; its label is empty.
    pub root: TreeNode<ResolvedIntent>,
    /// Display labels from the page's collection.
    pub labels: LabelTable,
    /// Content index of each leaf, in [`TreeNode::iter_leaves`] order.
    pub origins: Vec<usize>,
    /// Per-intent failures, attributed by content index.
    pub errors: Vec<ItemError>,
}

/// Resolve, expand and place every intent of `page`.
///
/// A failing intent (or expanded slice) is recorded in `errors` and skipped; the rest of the
/// tree is still built.
#[tracing::instrument(skip(page), fields(page = %page.id()))]
pub fn build_page_tree(page: &Page) -> PageTree {
    let outer: Option<Arc<Params>> = page.outer_frame();
    let mut root = TreeNode::root();
    let mut origin_tree = TreeNode::root();
    let mut errors = Vec::new();

    for (index, entry) in page.collection().entries().iter().enumerate() {
        let frames: Vec<Arc<Params>> = outer
            .iter()
            .chain(entry.frames.iter())
            .cloned()
            .collect();
        let attributed =
            || parse_path(entry.intent.params.get(param::TABGROUP)).unwrap_or_default();
        match resolve_intent(&entry.intent, &frames) {
            Ok(slices) => {
                for slice in slices {
                    match slice {
                        Ok(item) => {
                            let path = item.path().to_vec();
                            origin_tree.insert(&path, index);
                            root.insert(&path, item);
                        }
                        Err(e) => errors.push(ItemError::new(index, attributed(), e)),
                    }
                }
            }
            Err(e) => errors.push(ItemError::new(index, attributed(), e)),
        }
    }

    for e in &errors {
        warn!(error = %e, "skipping intent");
    }
    debug!(leaves = root.leaf_count(), errors = errors.len(), "page tree built");

    PageTree {
        root,
        labels: LabelTable::new(page.collection().label_table().clone()),
        origins: origin_tree.iter_leaves().copied().collect(),
        errors,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tree/build.rs"]
mod tests;
