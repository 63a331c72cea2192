use std::fmt::Write as _;

use crate::spec::intent::ResolvedIntent;
use crate::tree::build::{LabelTable, TreeNode};

/// One-line description of a resolved item.
pub fn describe(item: &ResolvedIntent) -> String {
    match item {
        ResolvedIntent::Viz(v) => match &v.title {
            Some(t) => format!("{}: {t}", v.kind),
            None => v.kind.to_string(),
        },
        ResolvedIntent::Text(t) => {
            let first = t.content.lines().next().unwrap_or_default();
            format!("text: {}", first.trim())
        }
        ResolvedIntent::Layout(l) => format!("layout: {}", l.layout.as_str()),
        ResolvedIntent::Input(i) => format!("input: {} ({})", i.id, i.variable),
    }
}

/// Render a tree as indented text: nodes show their display label (with the raw segment in
/// brackets when remapped), leaves are `*` lines.
pub fn render_tree_text<L>(
    title: &str,
    root: &TreeNode<L>,
    labels: &LabelTable,
    leaf: impl Fn(&L) -> String,
) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    write_node(&mut out, root, labels, &leaf, 1);
    out
}

fn write_node<L>(
    out: &mut String,
    node: &TreeNode<L>,
    labels: &LabelTable,
    leaf: &impl Fn(&L) -> String,
    depth: usize,
) {
    let pad = "  ".repeat(depth);
    for l in node.leaves() {
        let _ = writeln!(out, "{pad}* {}", leaf(l));
    }
    for child in node.children() {
        let shown = labels.display(child.label());
        if shown == child.label() {
            let _ = writeln!(out, "{pad}{shown}");
        } else {
            let _ = writeln!(out, "{pad}{shown} [{}]", child.label());
        }
        write_node(out, child, labels, leaf, depth + 1);
    }
}
