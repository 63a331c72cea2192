use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::foundation::error::{VizError, VizResult};
use crate::render::charts::ChartPayload;
use crate::spec::intent::{InputControl, LayoutBlock, LayoutKind};
use crate::tree::build::{LabelTable, TreeNode};

/// One leaf of a rendered page.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum RenderedItem {
    /// Shaped chart data.
    Chart(ChartPayload),
    /// Markdown passed through verbatim.
    Text {
        /// Markdown source.
        content: String,
    },
    /// Structural block.
    Layout(LayoutBlock),
    /// Input control.
    Input(InputControl),
}

/// Everything a backend needs to write one page.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderedPage {
    /// Page id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Page style parameters, passed through to front matter.
    pub style: BTreeMap<String, Value>,
    /// Build timestamp, shown as the document date.
    pub generated_at: Option<String>,
    /// Display names for tab segments.
    pub labels: LabelTable,
    /// Rendered content, shaped like the page tree.
    pub tree: TreeNode<RenderedItem>,
}

/// Sink that turns a rendered page into an artifact on disk.
pub trait DocumentBackend: Send + Sync {
    /// Write the page and return the artifact path.
    fn emit(&self, page: &RenderedPage) -> VizResult<PathBuf>;
}

/// Writes `<out_dir>/<page id>.qmd`: a front-matter header, then the tree as nested tab sets.
#[derive(Clone, Debug)]
pub struct MarkdownBackend {
    out_dir: PathBuf,
}

impl MarkdownBackend {
    /// Constructor.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Directory artifacts are written to.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl DocumentBackend for MarkdownBackend {
    fn emit(&self, page: &RenderedPage) -> VizResult<PathBuf> {
        let path = self.out_dir.join(format!("{}.qmd", page.id));
        write_file(&path, &to_markdown(page)?)?;
        Ok(path)
    }
}

/// Write the pretty JSON of a rendered page to `<out_dir>/<page id>.preview.json`.
pub fn write_preview(out_dir: &Path, page: &RenderedPage) -> VizResult<PathBuf> {
    let path = out_dir.join(format!("{}.preview.json", page.id));
    let json = serde_json::to_string_pretty(page)?;
    write_file(&path, &json)?;
    Ok(path)
}

fn write_file(path: &Path, contents: &str) -> VizResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| VizError::render(format!("create {}: {e}", parent.display())))?;
    }
    std::fs::write(path, contents)
        .map_err(|e| VizError::render(format!("write {}: {e}", path.display())))
}

/// Markdown for one page.
pub fn to_markdown(page: &RenderedPage) -> VizResult<String> {
    let mut out = String::new();
    out.push_str("---\n");
    let _ = writeln!(out, "title: {}", serde_json::to_string(&page.title)?);
    if let Some(at) = &page.generated_at {
        let _ = writeln!(out, "date: {}", serde_json::to_string(at)?);
    }
    if !page.style.is_empty() {
        let _ = writeln!(out, "vizdeck-style: {}", serde_json::to_string(&page.style)?);
    }
    out.push_str("---\n");
    write_node(&mut out, &page.tree, &page.labels, 2)?;
    Ok(out)
}

fn write_node(
    out: &mut String,
    node: &TreeNode<RenderedItem>,
    labels: &LabelTable,
    level: usize,
) -> VizResult<()> {
    for item in node.leaves() {
        out.push('\n');
        write_item(out, item)?;
    }
    if node.children().is_empty() {
        return Ok(());
    }
    out.push_str("\n::: {.panel-tabset}\n");
    let hashes = "#".repeat(level.min(6));
    for child in node.children() {
        let _ = writeln!(out, "\n{hashes} {}", labels.display(child.label()));
        write_node(out, child, labels, level + 1)?;
    }
    out.push_str("\n:::\n");
    Ok(())
}

fn write_item(out: &mut String, item: &RenderedItem) -> VizResult<()> {
    match item {
        RenderedItem::Text { content } => {
            out.push_str(content.trim_end());
            out.push('\n');
        }
        RenderedItem::Chart(chart) => {
            match &chart.show_when {
                Some(cond) => {
                    let _ = writeln!(
                        out,
                        "::: {{.vizdeck-chart show-when={}}}",
                        serde_json::to_string(cond)?
                    );
                }
                None => out.push_str("::: {.vizdeck-chart}\n"),
            }
            if let Some(title) = &chart.title {
                let _ = writeln!(out, "**{title}**\n");
            }
            out.push_str("```json\n");
            out.push_str(&serde_json::to_string(chart)?);
            out.push_str("\n```\n:::\n");
        }
        RenderedItem::Layout(block) => match block.layout {
            LayoutKind::Divider => out.push_str("* * *\n"),
            LayoutKind::Spacer => out.push_str("&nbsp;\n"),
            LayoutKind::Callout => {
                let text = block.params.get("text").and_then(Value::as_str).unwrap_or("");
                let _ = writeln!(out, "::: {{.callout-note}}\n{text}\n:::");
            }
            LayoutKind::Pagination => out.push_str("{{< pagebreak >}}\n"),
        },
        RenderedItem::Input(input) => {
            out.push_str("::: {.vizdeck-input}\n```json\n");
            out.push_str(&serde_json::to_string(input)?);
            out.push_str("\n```\n:::\n");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
