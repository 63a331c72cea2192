use std::collections::BTreeMap;

use tracing::debug;

use crate::foundation::error::{VizError, VizResult};
use crate::foundation::value::{ParamValue, Params, scalar_text};
use crate::spec::intent::{Templates, param};

/// Fan one parameter bag out into `N` concrete bags, `N` being the longest sequence.
///
/// Sequences of length 1 broadcast like scalars. Sequences of differing lengths above 1
/// are a configuration error naming every offending parameter. Output order follows
/// sequence position.
pub fn expand(params: &Params) -> VizResult<Vec<Params>> {
    let mut lengths: BTreeMap<&str, usize> = BTreeMap::new();
    for (name, value) in params {
        let ParamValue::Seq(items) = value else {
            continue;
        };
        if items.is_empty() {
            return Err(VizError::configuration(format!(
                "parameter '{name}' is an empty sequence"
            )));
        }
        if items.iter().any(|i| matches!(i, ParamValue::Seq(_))) {
            return Err(VizError::configuration(format!(
                "parameter '{name}' nests sequences"
            )));
        }
        lengths.insert(name, items.len());
    }

    let long: Vec<(&str, usize)> = lengths
        .iter()
        .filter(|(_, len)| **len > 1)
        .map(|(n, l)| (*n, *l))
        .collect();
    let n = long.first().map(|(_, l)| *l).unwrap_or(1);
    if long.iter().any(|(_, l)| *l != n) {
        let detail = long
            .iter()
            .map(|(name, len)| format!("{name} ({len})"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(VizError::configuration(format!(
            "vectorized parameters have mismatched lengths: {detail}"
        )));
    }

    if n > 1 {
        debug!(count = n, "expanding vectorized intent");
    }
    Ok((0..n).map(|i| slice(params, i)).collect())
}

fn slice(params: &Params, i: usize) -> Params {
    params
        .iter()
        .map(|(k, v)| {
            let v = match v {
                ParamValue::Seq(items) if items.len() == 1 => items[0].clone(),
                ParamValue::Seq(items) => items[i].clone(),
                other => other.clone(),
            };
            (k.clone(), v)
        })
        .collect()
}

/// Substitute `{name}` placeholders with the named parameter's text.
///
/// `{{` and `}}` stand for literal braces.
pub fn substitute(template: &str, params: &Params) -> VizResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(VizError::configuration(format!(
                        "unclosed placeholder in template `{template}`"
                    )));
                }
                let name = name.trim();
                let text = params
                    .get(name)
                    .and_then(ParamValue::as_value)
                    .and_then(scalar_text)
                    .ok_or_else(|| {
                        VizError::configuration(format!(
                            "template `{template}` references unknown parameter '{name}'"
                        ))
                    })?;
                out.push_str(&text);
            }
            '}' => {
                return Err(VizError::configuration(format!(
                    "unmatched '}}' in template `{template}`"
                )));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Write templated `title` and `tabgroup` into one expanded parameter bag.
///
/// The title goes first so a tabgroup template may reference `{title}`.
pub fn apply_templates(mut params: Params, templates: &Templates) -> VizResult<Params> {
    if let Some(t) = &templates.title {
        let title = substitute(t, &params)?;
        params.insert(param::TITLE.to_owned(), title.into());
    }
    if let Some(t) = &templates.tabgroup {
        let tabgroup = substitute(t, &params)?;
        params.insert(param::TABGROUP.to_owned(), tabgroup.into());
    }
    Ok(params)
}

#[cfg(test)]
#[path = "../../tests/unit/spec/expand.rs"]
mod tests;
