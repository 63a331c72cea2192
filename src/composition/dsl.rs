use serde_json::Value;

use crate::expression::filter::Filter;
use crate::foundation::value::{ParamValue, Params};
use crate::spec::intent::{ChartKind, IntentKind, LayoutKind, RawIntent, Templates, param};

/// Anything that can be appended to a [`ContentCollection`](crate::ContentCollection).
pub trait IntoIntent {
    /// Produce the raw intent.
    fn into_intent(self) -> RawIntent;
}

impl IntoIntent for RawIntent {
    fn into_intent(self) -> RawIntent {
        self
    }
}

fn set(params: &mut Params, name: &str, value: impl Into<ParamValue>) {
    params.insert(name.to_owned(), value.into());
}

/// A single visualization.
#[derive(Clone, Debug, Default)]
pub struct Viz {
    params: Params,
}

impl Viz {
    /// A visualization of the given kind.
    pub fn new(kind: ChartKind) -> Self {
        Self::untyped().param(param::TYPE, kind.as_str())
    }

    /// A visualization whose `type` comes from an enclosing defaults frame.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Set any option, recognized or not.
    pub fn param(mut self, name: impl AsRef<str>, value: impl Into<ParamValue>) -> Self {
        set(&mut self.params, name.as_ref(), value);
        self
    }

    /// Title.
    pub fn title(self, title: impl Into<String>) -> Self {
        self.param(param::TITLE, title.into())
    }

    /// Slash-separated tab path, e.g. `"demographics/age"`.
    pub fn tabgroup(self, path: impl Into<String>) -> Self {
        self.param(param::TABGROUP, path.into())
    }

    /// Data source name from the dashboard catalog.
    pub fn data(self, source: impl Into<String>) -> Self {
        self.param(param::DATA, source.into())
    }

    /// Row filter applied before shaping.
    pub fn filter(self, filter: Filter) -> Self {
        self.param(param::FILTER, filter)
    }

    /// Column on the x axis.
    pub fn x_var(self, column: impl Into<String>) -> Self {
        self.param("x_var", column.into())
    }

    /// Column on the y axis.
    pub fn y_var(self, column: impl Into<String>) -> Self {
        self.param("y_var", column.into())
    }

    /// Column splitting bars into groups.
    pub fn group_var(self, column: impl Into<String>) -> Self {
        self.param("group_var", column.into())
    }

    /// Column stacked within each bar.
    pub fn stack_var(self, column: impl Into<String>) -> Self {
        self.param("stack_var", column.into())
    }

    /// Column mapped to point color.
    pub fn color_var(self, column: impl Into<String>) -> Self {
        self.param("color_var", column.into())
    }

    /// Numeric column weighting each row.
    pub fn weight_var(self, column: impl Into<String>) -> Self {
        self.param(param::WEIGHT_VAR, column.into())
    }

    /// Histogram bin count.
    pub fn bins(self, bins: u32) -> Self {
        self.param("bins", bins)
    }

    /// Drop rows with nulls in any referenced variable before shaping.
    pub fn drop_na_vars(self, drop: bool) -> Self {
        self.param(param::DROP_NA_VARS, drop)
    }

    /// Opaque client-side visibility condition.
    pub fn show_when(self, condition: impl Into<String>) -> Self {
        self.param(param::SHOW_WHEN, condition.into())
    }
}

impl IntoIntent for Viz {
    fn into_intent(self) -> RawIntent {
        RawIntent::new(IntentKind::Viz, self.params)
    }
}

/// Several visualizations from one call: parameters set with [`Vizzes::vary`] hold one value
/// per generated visualization, everything else is shared.
#[derive(Clone, Debug, Default)]
pub struct Vizzes {
    params: Params,
    templates: Templates,
}

impl Vizzes {
    /// Visualizations of the given kind.
    pub fn new(kind: ChartKind) -> Self {
        Self::untyped().param(param::TYPE, kind.as_str())
    }

    /// Visualizations whose `type` comes from an enclosing defaults frame.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Set an option shared by every generated visualization.
    pub fn param(mut self, name: impl AsRef<str>, value: impl Into<ParamValue>) -> Self {
        set(&mut self.params, name.as_ref(), value);
        self
    }

    /// Set an option that takes one value per generated visualization.
    pub fn vary<I, T>(self, name: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        self.param(name, ParamValue::seq(values))
    }

    /// Per-visualization tabgroup, e.g. `"by_variable/{x_var}"`.
    pub fn tabgroup_template(mut self, template: impl Into<String>) -> Self {
        self.templates.tabgroup = Some(template.into());
        self
    }

    /// Per-visualization title, e.g. `"{x_var} by {group_var}"`.
    pub fn title_template(mut self, template: impl Into<String>) -> Self {
        self.templates.title = Some(template.into());
        self
    }
}

impl IntoIntent for Vizzes {
    fn into_intent(self) -> RawIntent {
        RawIntent {
            kind: IntentKind::Viz,
            params: self.params,
            templates: self.templates,
        }
    }
}

/// A markdown block.
#[derive(Clone, Debug)]
pub struct Text {
    params: Params,
}

impl Text {
    /// Constructor.
    pub fn new(markdown: impl Into<String>) -> Self {
        let mut params = Params::new();
        set(&mut params, "content", markdown.into());
        Self { params }
    }

    /// Slash-separated tab path.
    pub fn tabgroup(mut self, path: impl Into<String>) -> Self {
        set(&mut self.params, param::TABGROUP, path.into());
        self
    }
}

impl IntoIntent for Text {
    fn into_intent(self) -> RawIntent {
        RawIntent::new(IntentKind::Text, self.params)
    }
}

/// A structural block.
#[derive(Clone, Debug)]
pub struct Layout {
    params: Params,
}

impl Layout {
    /// Constructor.
    pub fn new(kind: LayoutKind) -> Self {
        let mut params = Params::new();
        set(&mut params, "layout", kind.as_str());
        Self { params }
    }

    /// Horizontal rule.
    pub fn divider() -> Self {
        Self::new(LayoutKind::Divider)
    }

    /// Vertical space.
    pub fn spacer() -> Self {
        Self::new(LayoutKind::Spacer)
    }

    /// Callout box with the given text.
    pub fn callout(text: impl Into<String>) -> Self {
        Self::new(LayoutKind::Callout).param("text", text.into())
    }

    /// Page break.
    pub fn pagination() -> Self {
        Self::new(LayoutKind::Pagination)
    }

    /// Set an arbitrary layout parameter.
    pub fn param(mut self, name: impl AsRef<str>, value: impl Into<ParamValue>) -> Self {
        set(&mut self.params, name.as_ref(), value);
        self
    }

    /// Slash-separated tab path, e.g. `"demographics/age"`.
    pub fn tabgroup(self, path: impl Into<String>) -> Self {
        self.param(param::TABGROUP, path.into())
    }
}

impl IntoIntent for Layout {
    fn into_intent(self) -> RawIntent {
        RawIntent::new(IntentKind::Layout, self.params)
    }
}

/// An input control.
#[derive(Clone, Debug)]
pub struct Input {
    params: Params,
}

impl Input {
    fn with_type(input_type: &str, variable: impl Into<String>) -> Self {
        let mut params = Params::new();
        set(&mut params, "input_type", input_type);
        set(&mut params, "variable", variable.into());
        Self { params }
    }

    /// Drop-down over `options`; the control id defaults to the variable.
    pub fn select<I, T>(variable: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::with_type("select", variable).options(options)
    }

    /// Checkbox group over `options`.
    pub fn checkbox<I, T>(variable: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::with_type("checkbox", variable).options(options)
    }

    /// Numeric range slider.
    pub fn slider(variable: impl Into<String>, min: f64, max: f64) -> Self {
        let mut input = Self::with_type("slider", variable);
        set(&mut input.params, "min", min);
        set(&mut input.params, "max", max);
        input
    }

    fn options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let list: Vec<Value> = options.into_iter().map(Into::into).collect();
        set(&mut self.params, "options", Value::Array(list));
        self
    }

    /// Identifier referenced by `show_when` conditions (defaults to the variable name).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        set(&mut self.params, "id", id.into());
        self
    }

    /// Display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        set(&mut self.params, "label", label.into());
        self
    }

    /// Slash-separated tab path.
    pub fn tabgroup(mut self, path: impl Into<String>) -> Self {
        set(&mut self.params, param::TABGROUP, path.into());
        self
    }

    /// Opaque client-side visibility condition.
    pub fn show_when(mut self, condition: impl Into<String>) -> Self {
        set(&mut self.params, param::SHOW_WHEN, condition.into());
        self
    }
}

impl IntoIntent for Input {
    fn into_intent(self) -> RawIntent {
        RawIntent::new(IntentKind::Input, self.params)
    }
}
