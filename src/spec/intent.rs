use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::expression::filter::{Filter, Predicate};
use crate::foundation::value::{ParamValue, Params};

/// Well-known parameter names shared by every intent kind.
pub mod param {
    /// Renderer kind of a visualization.
    pub const TYPE: &str = "type";
    /// Slash-delimited tree path.
    pub const TABGROUP: &str = "tabgroup";
    /// Display title.
    pub const TITLE: &str = "title";
    /// Row filter predicate.
    pub const FILTER: &str = "filter";
    /// Named data source.
    pub const DATA: &str = "data";
    /// Drop rows with missing values in the variables a chart reads.
    pub const DROP_NA_VARS: &str = "drop_na_vars";
    /// Column holding per-row weights.
    pub const WEIGHT_VAR: &str = "weight_var";
    /// Client-side visibility condition, carried opaque into the output.
    pub const SHOW_WHEN: &str = "show_when";
    /// Secondary title line.
    pub const SUBTITLE: &str = "subtitle";
}

const COMMON_OPTIONS: &[&str] = &[
    param::TYPE,
    param::TABGROUP,
    param::TITLE,
    param::FILTER,
    param::DATA,
    param::DROP_NA_VARS,
    param::WEIGHT_VAR,
    param::SHOW_WHEN,
    param::SUBTITLE,
];

/// What a builder call asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// A chart.
    Viz,
    /// A markdown block.
    Text,
    /// A structural block (divider, spacer, callout, pagination).
    Layout,
    /// An input control driving client-side visibility.
    Input,
}

/// Renderer kinds understood by the built-in registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Equal-width buckets over one numeric variable.
    Histogram,
    /// Category counts, optionally split by a group variable.
    Bar,
    /// Cross-tabulated counts of two categorical variables.
    StackedBar,
    /// Point cloud of two numeric variables.
    Scatter,
}

impl ChartKind {
    /// Every known kind.
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Histogram,
        ChartKind::Bar,
        ChartKind::StackedBar,
        ChartKind::Scatter,
    ];

    /// Parse the `type` parameter.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Name used for the `type` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Bar => "bar",
            Self::StackedBar => "stackedbar",
            Self::Scatter => "scatter",
        }
    }

    /// Kind-specific option names (on top of the common ones).
    pub fn options(self) -> &'static [&'static str] {
        match self {
            Self::Histogram => &["x_var", "bins"],
            Self::Bar => &["x_var", "group_var", "x_order"],
            Self::StackedBar => &["x_var", "stack_var", "x_order", "stack_order"],
            Self::Scatter => &["x_var", "y_var", "color_var"],
        }
    }

    /// Options that must be set after resolution.
    pub fn required(self) -> &'static [&'static str] {
        match self {
            Self::Histogram | Self::Bar => &["x_var"],
            Self::StackedBar => &["x_var", "stack_var"],
            Self::Scatter => &["x_var", "y_var"],
        }
    }

    /// Return `true` when `name` is a common or kind-specific option.
    pub fn recognizes(self, name: &str) -> bool {
        COMMON_OPTIONS.contains(&name) || self.options().contains(&name)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder templates accepted by vectorized entry points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Templates {
    /// Replaces `tabgroup` per expanded intent, e.g. `"by_sex/{title}"`.
    pub tabgroup: Option<String>,
    /// Replaces `title` per expanded intent, e.g. `"{x_var} by {group_var}"`.
    pub title: Option<String>,
}

impl Templates {
    /// Return `true` when neither template is set.
    pub fn is_empty(&self) -> bool {
        self.tabgroup.is_none() && self.title.is_none()
    }
}

/// One builder call's worth of input, before defaults and expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct RawIntent {
    /// What kind of item this is.
    pub kind: IntentKind,
    /// Explicit parameters; values may be sequences on vectorized calls.
    pub params: Params,
    /// Placeholder templates applied after expansion.
    pub templates: Templates,
}

impl RawIntent {
    /// Create an intent without templates.
    pub fn new(kind: IntentKind, params: Params) -> Self {
        Self {
            kind,
            params,
            templates: Templates::default(),
        }
    }
}

/// A visualization after defaults merge and one slice of expansion.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedViz {
    /// Renderer kind.
    pub kind: ChartKind,
    /// Tree path segments (empty means the root).
    pub path: Vec<String>,
    /// Display title.
    pub title: Option<String>,
    /// Named data source the chart reads.
    pub data: Option<String>,
    /// Unevaluated, bound row filter.
    pub filter: Option<Predicate>,
    /// Drop rows with `NA` in any variable the chart reads.
    pub drop_na_vars: bool,
    /// Per-row weight column.
    pub weight_var: Option<String>,
    /// Client-side visibility condition, never evaluated here.
    pub show_when: Option<String>,
    /// Every resolved parameter except the filter, as concrete values.
    pub params: BTreeMap<String, Value>,
}

impl ResolvedViz {
    /// Raw parameter value by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    /// String parameter by name.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    /// Turn the resolved form back into a raw intent. Resolving it again yields `self`.
    /// Explicit raw intent that resolves back to this one.
    pub fn to_raw(&self) -> RawIntent {
        let mut params: Params = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), ParamValue::Value(v.clone())))
            .collect();
        if let Some(p) = &self.filter {
            let mut f = Filter::new(p.text());
            if let Some(src) = p.source() {
                f = f.on(src);
            }
            params.insert(param::FILTER.to_owned(), ParamValue::Filter(f));
        }
        RawIntent::new(IntentKind::Viz, params)
    }
}

/// A markdown block.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TextBlock {
    /// Tree path segments.
    pub path: Vec<String>,
    /// Markdown source.
    pub content: String,
}

/// Structural block kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// Horizontal rule.
    Divider,
    /// Vertical whitespace.
    Spacer,
    /// Highlighted note.
    Callout,
    /// Split the page at this point.
    Pagination,
}

impl LayoutKind {
    const ALL: [LayoutKind; 4] = [
        LayoutKind::Divider,
        LayoutKind::Spacer,
        LayoutKind::Callout,
        LayoutKind::Pagination,
    ];

    pub(crate) fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Name used for the `layout` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Divider => "divider",
            Self::Spacer => "spacer",
            Self::Callout => "callout",
            Self::Pagination => "pagination",
        }
    }
}

/// A resolved structural block.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayoutBlock {
    /// Tree path segments.
    pub path: Vec<String>,
    /// Block kind.
    pub layout: LayoutKind,
    /// Remaining block options (`text`, `height`, `tone`, ...).
    pub params: BTreeMap<String, Value>,
}

/// Input control kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// Drop-down of options.
    Select,
    /// Multi-select check boxes.
    Checkbox,
    /// Numeric slider.
    Slider,
}

impl InputType {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        [Self::Select, Self::Checkbox, Self::Slider]
            .into_iter()
            .find(|t| t.as_str() == s)
    }

    /// Name used for the `input_type` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Slider => "slider",
        }
    }
}

/// A resolved input control.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct InputControl {
    /// Tree path segments.
    pub path: Vec<String>,
    /// Control identifier referenced by `show_when` conditions.
    pub id: String,
    /// Control kind.
    pub input_type: InputType,
    /// Column the control filters on in the rendered artifact.
    pub variable: String,
    /// Display label.
    pub label: Option<String>,
    /// Choices offered by select/checkbox controls.
    pub options: Vec<Value>,
    /// Client-side visibility condition.
    pub show_when: Option<String>,
}

/// A fully resolved content item, ready for the tree builder and renderers.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ResolvedIntent {
    /// A chart.
    Viz(ResolvedViz),
    /// A markdown block.
    Text(TextBlock),
    /// A structural block.
    Layout(LayoutBlock),
    /// An input control.
    Input(InputControl),
}

impl ResolvedIntent {
    /// Tree path segments.
    pub fn path(&self) -> &[String] {
        match self {
            Self::Viz(v) => &v.path,
            Self::Text(t) => &t.path,
            Self::Layout(l) => &l.path,
            Self::Input(i) => &i.path,
        }
    }

    /// The visualization, if this is one.
    pub fn as_viz(&self) -> Option<&ResolvedViz> {
        match self {
            Self::Viz(v) => Some(v),
            Self::Text(_) | Self::Layout(_) | Self::Input(_) => None,
        }
    }
}
