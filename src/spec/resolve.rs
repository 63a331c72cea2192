use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::expression::filter::Filter;
use crate::foundation::error::{VizError, VizResult};
use crate::foundation::value::{ParamValue, Params, scalar_text};
use crate::spec::expand::{apply_templates, expand};
use crate::spec::intent::{
    ChartKind, InputControl, InputType, IntentKind, LayoutBlock, LayoutKind, RawIntent,
    ResolvedIntent, ResolvedViz, TextBlock, param,
};

/// Merge a defaults stack with an item's explicit parameters.
///
/// Frames are ordered outermost first; later frames override earlier ones per key and explicit
/// parameters override every frame. Keys never mentioned by the item are inherited.
pub fn merge_defaults<'a, I>(frames: I, explicit: &Params) -> Params
where
    I: IntoIterator<Item = &'a Params>,
{
    let mut merged = Params::new();
    for frame in frames {
        merged.extend(frame.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Resolve one raw intent into its concrete items.
///
/// Defaults apply to visualizations only. An arity error fails the whole intent; template or
/// typing errors fail just the affected slice, so the result holds one entry per slice.
pub fn resolve_intent(
    raw: &RawIntent,
    frames: &[Arc<Params>],
) -> VizResult<Vec<VizResult<ResolvedIntent>>> {
    let merged = match raw.kind {
        IntentKind::Viz => merge_defaults(frames.iter().map(|f| f.as_ref()), &raw.params),
        IntentKind::Text | IntentKind::Layout | IntentKind::Input => raw.params.clone(),
    };
    let slices = expand(&merged)?;
    Ok(slices
        .into_iter()
        .map(|slice| {
            let slice = apply_templates(slice, &raw.templates)?;
            type_intent(raw.kind, slice)
        })
        .collect())
}

/// Parse a slash-delimited tree path. Absent or empty means the root.
pub fn parse_path(value: Option<&ParamValue>) -> VizResult<Vec<String>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let text = match value {
        ParamValue::Value(Value::Null) => return Ok(Vec::new()),
        ParamValue::Value(Value::String(s)) => s.as_str(),
        ParamValue::Value(_) | ParamValue::Filter(_) | ParamValue::Seq(_) => {
            return Err(VizError::configuration("tabgroup must be a string"));
        }
    };
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split('/')
        .map(|seg| {
            if seg.is_empty() {
                Err(VizError::configuration(format!(
                    "tabgroup '{text}' has an empty segment"
                )))
            } else {
                Ok(seg.to_owned())
            }
        })
        .collect()
}

fn type_intent(kind: IntentKind, params: Params) -> VizResult<ResolvedIntent> {
    let path = parse_path(params.get(param::TABGROUP))?;
    match kind {
        IntentKind::Viz => type_viz(path, params).map(ResolvedIntent::Viz),
        IntentKind::Text => {
            let values = concrete(params)?;
            let content = opt_text(&values, "content")?
                .ok_or_else(|| VizError::configuration("text block needs 'content'"))?;
            Ok(ResolvedIntent::Text(TextBlock { path, content }))
        }
        IntentKind::Layout => {
            let mut values = concrete(params)?;
            let name = opt_text(&values, "layout")?
                .ok_or_else(|| VizError::configuration("layout block needs 'layout'"))?;
            let layout = LayoutKind::parse(&name)
                .ok_or_else(|| VizError::configuration(format!("unknown layout '{name}'")))?;
            values.remove("layout");
            values.remove(param::TABGROUP);
            Ok(ResolvedIntent::Layout(LayoutBlock {
                path,
                layout,
                params: values,
            }))
        }
        IntentKind::Input => {
            let values = concrete(params)?;
            let ty = opt_text(&values, "input_type")?
                .ok_or_else(|| VizError::configuration("input needs 'input_type'"))?;
            let input_type = InputType::parse(&ty)
                .ok_or_else(|| VizError::configuration(format!("unknown input type '{ty}'")))?;
            let variable = opt_text(&values, "variable")?
                .ok_or_else(|| VizError::configuration("input needs 'variable'"))?;
            let id = opt_text(&values, "id")?.unwrap_or_else(|| variable.clone());
            let options = match values.get("options") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items.clone(),
                Some(_) => return Err(VizError::configuration("input 'options' must be a list")),
            };
            Ok(ResolvedIntent::Input(InputControl {
                path,
                id,
                input_type,
                variable,
                label: opt_text(&values, "label")?,
                options,
                show_when: opt_text(&values, param::SHOW_WHEN)?,
            }))
        }
    }
}

fn type_viz(path: Vec<String>, mut params: Params) -> VizResult<ResolvedViz> {
    let filter = match params.remove(param::FILTER) {
        None | Some(ParamValue::Value(Value::Null)) => None,
        Some(ParamValue::Filter(f)) => Some(f),
        Some(ParamValue::Value(Value::String(s))) => Some(Filter::new(s)),
        Some(_) => {
            return Err(VizError::configuration(
                "filter must be a predicate or expression string",
            ));
        }
    };
    let values = concrete(params)?;

    let type_name = opt_text(&values, param::TYPE)?
        .ok_or_else(|| VizError::configuration("visualization has no 'type'"))?;
    let kind = ChartKind::parse(&type_name)
        .ok_or_else(|| VizError::configuration(format!("unknown chart type '{type_name}'")))?;

    for name in values.keys().filter(|k| !kind.recognizes(k)) {
        warn!(kind = %kind, option = %name, "unrecognized option passed through");
    }

    let data = opt_text(&values, param::DATA)?;
    let filter = filter
        .map(|f| f.compile(data.as_deref()))
        .transpose()?;
    let drop_na_vars = match values.get(param::DROP_NA_VARS) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(VizError::configuration("drop_na_vars must be a boolean")),
    };

    Ok(ResolvedViz {
        kind,
        path,
        title: opt_text(&values, param::TITLE)?,
        data,
        filter,
        drop_na_vars,
        weight_var: opt_text(&values, param::WEIGHT_VAR)?,
        show_when: opt_text(&values, param::SHOW_WHEN)?,
        params: values,
    })
}

fn concrete(params: Params) -> VizResult<BTreeMap<String, Value>> {
    params
        .into_iter()
        .map(|(k, v)| match v {
            ParamValue::Value(v) => Ok((k, v)),
            ParamValue::Filter(_) | ParamValue::Seq(_) => Err(VizError::configuration(format!(
                "parameter '{k}' must be a plain value"
            ))),
        })
        .collect()
}

fn opt_text(values: &BTreeMap<String, Value>, name: &str) -> VizResult<Option<String>> {
    match values.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => Ok(scalar_text(v)),
        Some(_) => Err(VizError::configuration(format!(
            "parameter '{name}' must be a scalar"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spec/resolve.rs"]
mod tests;
