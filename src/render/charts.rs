use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::data::catalog::DataCatalog;
use crate::data::table::{Cell, DataTable};
use crate::foundation::error::{VizError, VizResult};
use crate::spec::intent::{ChartKind, ResolvedViz, param};

const DEFAULT_BINS: u64 = 30;
const MAX_BINS: u64 = 10_000;
const VARIABLE_OPTIONS: &[&str] = &[
    "x_var",
    "y_var",
    "group_var",
    "stack_var",
    "color_var",
    param::WEIGHT_VAR,
];

/// Shaped data for one chart, ready for a document backend.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ChartPayload {
    /// Chart recipe.
    pub kind: ChartKind,
    /// Title.
    pub title: Option<String>,
    /// Subtitle.
    pub subtitle: Option<String>,
    /// Carried verbatim for client-side visibility.
    pub show_when: Option<String>,
    /// Rows remaining after filtering, before aggregation.
    pub rows: usize,
    /// Recipe-specific aggregated data.
    pub data: Value,
}

/// The rows a chart reads after its filter and `drop_na_vars` have been applied.
pub struct BoundRows<'a> {
    source: &'a str,
    table: &'a DataTable,
    rows: Vec<&'a [Cell]>,
}

impl<'a> BoundRows<'a> {
    /// Bind `viz` to its data source and select its rows.
    pub fn bind(viz: &ResolvedViz, catalog: &'a DataCatalog) -> VizResult<Self> {
        let Some(name) = viz.data.as_deref() else {
            return Err(VizError::required(&viz.path, viz.kind.as_str(), param::DATA));
        };
        let src = catalog.require(name)?;
        let table = &src.table;

        let mask = match &viz.filter {
            Some(f) => {
                if let Some(bound) = f.source()
                    && bound != name
                {
                    return Err(VizError::data_binding(
                        f.text(),
                        format!("filter is bound to '{bound}' but the chart reads '{name}'"),
                    ));
                }
                Some(f.mask(table)?)
            }
            None => None,
        };

        let mut bound = Self {
            source: src.name.as_str(),
            table,
            rows: Vec::new(),
        };
        let na_cols: Vec<usize> = if viz.drop_na_vars {
            VARIABLE_OPTIONS
                .iter()
                .filter_map(|opt| viz.str_param(opt))
                .map(|col| bound.column(col))
                .collect::<VizResult<_>>()?
        } else {
            Vec::new()
        };
        bound.rows = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(i, _)| mask.as_ref().is_none_or(|m| m[*i]))
            .filter(|(_, row)| na_cols.iter().all(|&c| !row[c].is_null()))
            .map(|(_, row)| row.as_slice())
            .collect();
        Ok(bound)
    }

    /// Column index by name; unknown names are data binding errors.
    pub fn column(&self, name: &str) -> VizResult<usize> {
        self.table.column_index(name).ok_or_else(|| {
            VizError::data_binding(
                name,
                format!("unknown column '{name}' in data source '{}'", self.source),
            )
        })
    }

    /// Rows left after filtering and null dropping.
    pub fn rows(&self) -> &[&'a [Cell]] {
        &self.rows
    }

    /// Number of bound rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows survived binding.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-row weight: 1 without `weight_var`, 0 for a missing weight.
    pub fn weights(&self, viz: &ResolvedViz) -> VizResult<Vec<f64>> {
        let Some(col) = viz.weight_var.as_deref() else {
            return Ok(vec![1.0; self.rows.len()]);
        };
        let c = self.column(col)?;
        self.rows
            .iter()
            .map(|row| match &row[c] {
                Cell::Null => Ok(0.0),
                cell => cell.as_f64().ok_or_else(|| not_numeric(col, cell)),
            })
            .collect()
    }

    /// Numeric value of `col` per row (`None` for `NA`).
    fn numbers(&self, col: &str) -> VizResult<Vec<Option<f64>>> {
        let c = self.column(col)?;
        self.rows
            .iter()
            .map(|row| match &row[c] {
                Cell::Null => Ok(None),
                cell => cell.as_f64().map(Some).ok_or_else(|| not_numeric(col, cell)),
            })
            .collect()
    }

    /// Category label of `col` per row; `NA` shows as `"NA"`.
    fn labels(&self, col: &str) -> VizResult<Vec<String>> {
        let c = self.column(col)?;
        Ok(self.rows.iter().map(|row| row[c].to_string()).collect())
    }
}

fn not_numeric(col: &str, cell: &Cell) -> VizError {
    VizError::data_binding(col, format!("column '{col}' holds non-numeric value '{cell}'"))
}

/// A data-shaping recipe for one chart kind.
pub trait ChartRenderer: Send + Sync {
    /// Chart kind this renderer handles.
    fn kind(&self) -> ChartKind;

    /// Shape the bound rows into the chart's data payload.
    fn shape(&self, viz: &ResolvedViz, rows: &BoundRows<'_>) -> VizResult<Value>;
}

/// Renderers by chart kind.
#[derive(Clone)]
pub struct RendererRegistry {
    renderers: HashMap<ChartKind, Arc<dyn ChartRenderer>>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.renderers.keys().collect();
        kinds.sort();
        f.debug_struct("RendererRegistry").field("kinds", &kinds).finish()
    }
}

impl RendererRegistry {
    /// No renderers.
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// The four built-in recipes.
    pub fn builtin() -> Self {
        Self::empty()
            .register(Histogram)
            .register(Bar)
            .register(StackedBar)
            .register(Scatter)
    }

    /// Add or replace the renderer for its kind.
    pub fn register(mut self, renderer: impl ChartRenderer + 'static) -> Self {
        self.renderers.insert(renderer.kind(), Arc::new(renderer));
        self
    }

    /// Validate, bind and shape one visualization.
    pub fn render(&self, viz: &ResolvedViz, catalog: &DataCatalog) -> VizResult<ChartPayload> {
        let renderer = self.renderers.get(&viz.kind).ok_or_else(|| {
            VizError::configuration(format!("no renderer registered for '{}'", viz.kind))
        })?;
        for name in viz.kind.required() {
            if viz.param(name).is_none() {
                return Err(VizError::required(&viz.path, viz.kind.as_str(), *name));
            }
        }
        let rows = BoundRows::bind(viz, catalog)?;
        debug!(kind = %viz.kind, rows = rows.len(), "shaping chart");
        let data = renderer.shape(viz, &rows)?;
        Ok(ChartPayload {
            kind: viz.kind,
            title: viz.title.clone(),
            subtitle: viz.str_param(param::SUBTITLE).map(str::to_owned),
            show_when: viz.show_when.clone(),
            rows: rows.len(),
            data,
        })
    }
}

fn required_str<'v>(viz: &'v ResolvedViz, name: &str) -> VizResult<&'v str> {
    viz.str_param(name)
        .ok_or_else(|| VizError::configuration(format!("'{name}' must name a column")))
}

/// Ordered distinct values, honoring a preferred order first.
fn ordered_levels(values: &[String], preferred: Option<&Value>) -> Vec<String> {
    let mut levels: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = preferred {
        for item in items {
            let s = match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if values.contains(&s) && !levels.contains(&s) {
                levels.push(s);
            }
        }
    }
    for v in values {
        if !levels.contains(v) {
            levels.push(v.clone());
        }
    }
    levels
}

struct Histogram;

impl ChartRenderer for Histogram {
    fn kind(&self) -> ChartKind {
        ChartKind::Histogram
    }

    fn shape(&self, viz: &ResolvedViz, rows: &BoundRows<'_>) -> VizResult<Value> {
        let x = required_str(viz, "x_var")?;
        let bins = match viz.param("bins") {
            None => DEFAULT_BINS,
            Some(v) => v
                .as_u64()
                .filter(|b| (1..=MAX_BINS).contains(b))
                .ok_or_else(|| {
                    VizError::configuration(format!(
                        "bins must be an integer between 1 and {MAX_BINS}, got {v}"
                    ))
                })?,
        };
        let values = rows.numbers(x)?;
        let weights = rows.weights(viz)?;
        let present: Vec<(f64, f64)> = values
            .iter()
            .zip(&weights)
            .filter_map(|(v, w)| v.map(|v| (v, *w)))
            .collect();

        let Some((lo, hi)) = present.iter().fold(None, |acc: Option<(f64, f64)>, (v, _)| {
            Some(match acc {
                None => (*v, *v),
                Some((lo, hi)) => (lo.min(*v), hi.max(*v)),
            })
        }) else {
            return Ok(json!({ "x_var": x, "bins": [], "missing": values.len() }));
        };

        let n = if hi > lo { bins as usize } else { 1 };
        let width = if hi > lo { (hi - lo) / n as f64 } else { 0.0 };
        let mut counts = vec![0.0; n];
        for (v, w) in &present {
            let i = if width > 0.0 {
                (((v - lo) / width) as usize).min(n - 1)
            } else {
                0
            };
            counts[i] += w;
        }
        let buckets: Vec<Value> = counts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let start = lo + width * i as f64;
                let end = if i + 1 == n { hi } else { lo + width * (i + 1) as f64 };
                json!({ "start": start, "end": end, "count": c })
            })
            .collect();
        Ok(json!({
            "x_var": x,
            "bins": buckets,
            "missing": values.len() - present.len(),
        }))
    }
}

struct Bar;

impl ChartRenderer for Bar {
    fn kind(&self) -> ChartKind {
        ChartKind::Bar
    }

    fn shape(&self, viz: &ResolvedViz, rows: &BoundRows<'_>) -> VizResult<Value> {
        let x = required_str(viz, "x_var")?;
        let xs = rows.labels(x)?;
        let weights = rows.weights(viz)?;
        let categories = ordered_levels(&xs, viz.param("x_order"));

        let Some(group) = viz.str_param("group_var") else {
            let mut counts = vec![0.0; categories.len()];
            for (v, w) in xs.iter().zip(&weights) {
                if let Some(i) = categories.iter().position(|c| c == v) {
                    counts[i] += w;
                }
            }
            let bars: Vec<Value> = categories
                .iter()
                .zip(&counts)
                .map(|(c, n)| json!({ "x": c, "value": n }))
                .collect();
            return Ok(json!({ "x_var": x, "bars": bars }));
        };

        let gs = rows.labels(group)?;
        let groups = ordered_levels(&gs, None);
        let mut counts = vec![vec![0.0; categories.len()]; groups.len()];
        for ((v, g), w) in xs.iter().zip(&gs).zip(&weights) {
            let gi = groups.iter().position(|c| c == g);
            let xi = categories.iter().position(|c| c == v);
            if let (Some(gi), Some(xi)) = (gi, xi) {
                counts[gi][xi] += w;
            }
        }
        let bars: Vec<Value> = groups
            .iter()
            .zip(&counts)
            .flat_map(|(g, row)| {
                categories
                    .iter()
                    .zip(row)
                    .map(move |(c, n)| json!({ "x": c, "group": g, "value": n }))
            })
            .collect();
        Ok(json!({ "x_var": x, "group_var": group, "bars": bars }))
    }
}

struct StackedBar;

impl ChartRenderer for StackedBar {
    fn kind(&self) -> ChartKind {
        ChartKind::StackedBar
    }

    fn shape(&self, viz: &ResolvedViz, rows: &BoundRows<'_>) -> VizResult<Value> {
        let x = required_str(viz, "x_var")?;
        let stack = required_str(viz, "stack_var")?;
        let xs = rows.labels(x)?;
        let ss = rows.labels(stack)?;
        let weights = rows.weights(viz)?;
        let categories = ordered_levels(&xs, viz.param("x_order"));
        let stacks = ordered_levels(&ss, viz.param("stack_order"));

        let mut table = vec![vec![0.0; stacks.len()]; categories.len()];
        for ((v, s), w) in xs.iter().zip(&ss).zip(&weights) {
            let xi = categories.iter().position(|c| c == v);
            let si = stacks.iter().position(|c| c == s);
            if let (Some(xi), Some(si)) = (xi, si) {
                table[xi][si] += w;
            }
        }
        let shares: Vec<Vec<f64>> = table
            .iter()
            .map(|row| {
                let total: f64 = row.iter().sum();
                row.iter()
                    .map(|n| if total > 0.0 { n / total } else { 0.0 })
                    .collect()
            })
            .collect();
        Ok(json!({
            "x_var": x,
            "stack_var": stack,
            "categories": categories,
            "stacks": stacks,
            "counts": table,
            "shares": shares,
        }))
    }
}

struct Scatter;

impl ChartRenderer for Scatter {
    fn kind(&self) -> ChartKind {
        ChartKind::Scatter
    }

    fn shape(&self, viz: &ResolvedViz, rows: &BoundRows<'_>) -> VizResult<Value> {
        let x = required_str(viz, "x_var")?;
        let y = required_str(viz, "y_var")?;
        let xs = rows.numbers(x)?;
        let ys = rows.numbers(y)?;
        let colors = viz
            .str_param("color_var")
            .map(|c| rows.labels(c))
            .transpose()?;

        let mut points = Vec::new();
        for (i, (xv, yv)) in xs.iter().zip(&ys).enumerate() {
            let (Some(xv), Some(yv)) = (xv, yv) else {
                continue;
            };
            let mut p = json!({ "x": xv, "y": yv });
            if let Some(colors) = &colors {
                p["color"] = Value::String(colors[i].clone());
            }
            points.push(p);
        }
        Ok(json!({ "x_var": x, "y_var": y, "points": points }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/charts.rs"]
mod tests;
