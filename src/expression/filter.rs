use std::sync::Arc;

use crate::data::table::DataTable;
use crate::expression::ast::Expr;
use crate::expression::eval::eval_mask;
use crate::expression::parser::parse_expr;
use crate::foundation::error::{VizError, VizResult};

/// A user-supplied row predicate, kept as source text until the intent is resolved.
///
/// ```text
/// Filter::new("age >= 18 & in(region, 'north', 'south')").on("survey")
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    text: String,
    source: Option<String>,
}

impl Filter {
    /// Wrap an expression. Syntax is checked when the owning intent is resolved.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// Bind the predicate to a named data source. Unbound filters use the intent's `data`.
    pub fn on(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Expression source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Explicitly bound data source, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Parse and bind, producing an unevaluated [`Predicate`].
    pub(crate) fn compile(&self, default_source: Option<&str>) -> VizResult<Predicate> {
        let expr = parse_expr(&self.text).map_err(|e| {
            VizError::configuration(format!("invalid filter `{}`: {e}", self.text))
        })?;
        Ok(Predicate {
            text: self.text.clone(),
            source: self
                .source
                .clone()
                .or_else(|| default_source.map(str::to_owned)),
            expr: Arc::new(expr),
        })
    }
}

/// A parsed filter bound to its data source. Evaluated lazily against a concrete table.
#[derive(Clone, Debug)]
pub struct Predicate {
    text: String,
    source: Option<String>,
    expr: Arc<Expr>,
}

impl Predicate {
    /// Expression source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Data source the predicate is bound to.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Column names the predicate reads.
    pub fn columns(&self) -> Vec<&str> {
        self.expr.columns()
    }

    /// Evaluate against `table`, returning one keep-flag per row.
    pub fn mask(&self, table: &DataTable) -> VizResult<Vec<bool>> {
        eval_mask(&self.expr, table, &self.text)
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.source == other.source
    }
}

impl serde::Serialize for Predicate {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct as _;
        let mut st = s.serialize_struct("Predicate", 2)?;
        st.serialize_field("expr", &self.text)?;
        st.serialize_field("data", &self.source)?;
        st.end()
    }
}
