//! JSON project files: data sources, output locations and pages, mirroring the builder API.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::composition::collection::ContentCollection;
use crate::composition::page::{Dashboard, Page, PageMeta};
use crate::data::table::DataTable;
use crate::expression::filter::Filter;
use crate::foundation::error::{VizError, VizResult};
use crate::foundation::value::{ParamValue, Params};
use crate::spec::intent::{IntentKind, RawIntent, Templates, param};

/// Top level of a project file.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDef {
    /// Data source name to JSON records file, relative to the project file.
    #[serde(default)]
    pub data: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub output: OutputDef,
    /// Pages in output order.
    pub pages: Vec<PageDef>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Where artifacts and the manifest go unless the command line says otherwise.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDef {
    /// Output directory, relative to the project file.
    pub out_dir: Option<PathBuf>,
    /// Manifest path, relative to the project file.
    pub manifest: Option<PathBuf>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct PageDef {
    /// Unique page id; also the artifact file stem.
    pub id: String,
    /// Title.
    pub title: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub style: BTreeMap<String, Value>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(flatten)]
    pub content: GroupDef,
}

/// A collection scope: its defaults frame, display labels and ordered items.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct GroupDef {
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
}

/// One entry of an `items` list, tagged by `kind`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDef {
    Viz {
        #[serde(flatten)]
        params: BTreeMap<String, Value>,
    },
    Vizzes {
        /// Parameters holding one value per generated visualization.
        vary: BTreeMap<String, Vec<Value>>,
        #[serde(default)]
        tabgroup_template: Option<String>,
        #[serde(default)]
        title_template: Option<String>,
        #[serde(flatten)]
        params: BTreeMap<String, Value>,
    },
    Text {
        #[serde(flatten)]
        params: BTreeMap<String, Value>,
    },
    Layout {
        #[serde(flatten)]
        params: BTreeMap<String, Value>,
    },
    Input {
        #[serde(flatten)]
        params: BTreeMap<String, Value>,
    },
    /// A nested collection; its defaults sit inside the enclosing ones.
    Group(GroupDef),
}

impl ProjectDef {
    /// Read and parse a project file. Relative paths inside resolve against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> VizResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VizError::configuration(format!("read project {}: {e}", path.display()))
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json_str(&text, base)
    }

    /// Parse project JSON, resolving relative paths against `base_dir`.
    pub fn from_json_str(text: &str, base_dir: impl Into<PathBuf>) -> VizResult<Self> {
        let mut def: ProjectDef = serde_json::from_str(text)
            .map_err(|e| VizError::configuration(format!("invalid project file: {e}")))?;
        def.base_dir = base_dir.into();
        Ok(def)
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    /// Configured artifact directory, resolved.
    pub fn out_dir(&self) -> Option<PathBuf> {
        self.output.out_dir.as_deref().map(|p| self.resolve(p))
    }

    /// Configured manifest path, resolved.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.output.manifest.as_deref().map(|p| self.resolve(p))
    }

    /// Load data and build the dashboard.
    ///
    /// A data file that cannot be loaded is left out of the catalog with a warning, so only
    /// pages that read it fail.
    pub fn into_dashboard(self) -> VizResult<Dashboard> {
        let mut dashboard = Dashboard::new();
        for (name, rel) in &self.data {
            let path = self.resolve(rel);
            match DataTable::from_path(&path) {
                Ok(table) => dashboard = dashboard.data_source(name.clone(), table)?,
                Err(e) => warn!(source = %name, error = %e, "data source not loaded"),
            }
        }
        for page in self.pages {
            let mut p = Page::new(page.id, page.title)
                .content(page.content.into_collection()?)
                .meta(PageMeta {
                    generated_at: page.generated_at,
                });
            if let Some(data) = page.data {
                p = p.data(data);
            }
            for (k, v) in page.style {
                p = p.style(k, v);
            }
            dashboard = dashboard.page(p)?;
        }
        Ok(dashboard)
    }
}

impl GroupDef {
    /// Build the collection this scope describes.
    pub fn into_collection(self) -> VizResult<ContentCollection> {
        let mut c = ContentCollection::new();
        if !self.defaults.is_empty() {
            c = c.with_defaults(to_params(self.defaults)?);
        }
        c = c.labels(self.labels);
        for item in self.items {
            c = match item {
                ItemDef::Group(group) => c.nest(group.into_collection()?),
                other => c.item(other.into_intent()?),
            };
        }
        Ok(c)
    }
}

impl ItemDef {
    fn into_intent(self) -> VizResult<RawIntent> {
        let (kind, params) = match self {
            ItemDef::Viz { params } => (IntentKind::Viz, params),
            ItemDef::Text { params } => (IntentKind::Text, params),
            ItemDef::Layout { params } => (IntentKind::Layout, params),
            ItemDef::Input { params } => (IntentKind::Input, params),
            ItemDef::Vizzes {
                vary,
                tabgroup_template,
                title_template,
                params,
            } => {
                let mut all = to_params(params)?;
                for (name, values) in vary {
                    let seq = values
                        .into_iter()
                        .map(|v| param_value(&name, v))
                        .collect::<VizResult<Vec<_>>>()?;
                    all.insert(name, ParamValue::Seq(seq));
                }
                return Ok(RawIntent {
                    kind: IntentKind::Viz,
                    params: all,
                    templates: Templates {
                        tabgroup: tabgroup_template,
                        title: title_template,
                    },
                });
            }
            ItemDef::Group(_) => {
                return Err(VizError::structure("a group is not a single item"));
            }
        };
        Ok(RawIntent::new(kind, to_params(params)?))
    }
}

fn to_params(map: BTreeMap<String, Value>) -> VizResult<Params> {
    map.into_iter()
        .map(|(k, v)| {
            let v = param_value(&k, v)?;
            Ok((k, v))
        })
        .collect()
}

/// `filter` may be an expression string or `{ "expr": ..., "data": ... }`.
fn param_value(name: &str, v: Value) -> VizResult<ParamValue> {
    if name != param::FILTER {
        return Ok(ParamValue::Value(v));
    }
    match v {
        Value::Object(mut obj) => {
            let expr = match obj.remove("expr") {
                Some(Value::String(s)) => s,
                _ => {
                    return Err(VizError::configuration(
                        "filter object needs a string 'expr'",
                    ));
                }
            };
            let mut f = Filter::new(expr);
            match obj.remove("data") {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => f = f.on(s),
                Some(_) => return Err(VizError::configuration("filter 'data' must be a string")),
            }
            Ok(ParamValue::Filter(f))
        }
        other => Ok(ParamValue::Value(other)),
    }
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
