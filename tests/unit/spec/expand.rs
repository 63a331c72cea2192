use super::*;

fn params(pairs: Vec<(&str, ParamValue)>) -> Params {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

#[test]
fn scalars_expand_to_a_single_bag() {
    let p = params(vec![("x_var", "age".into()), ("bins", 10.into())]);
    let out = expand(&p).unwrap();
    assert_eq!(out, vec![p]);
}

#[test]
fn equal_lengths_expand_positionally_and_length_one_broadcasts() {
    let p = params(vec![
        ("x_var", ParamValue::seq(["age", "income", "height"])),
        ("title", ParamValue::seq(["Age", "Income", "Height"])),
        ("group_var", ParamValue::seq(["sex"])),
        ("type", "bar".into()),
    ]);
    let out = expand(&p).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out[1]["x_var"].as_str(), Some("income"));
    assert_eq!(out[1]["title"].as_str(), Some("Income"));
    assert_eq!(out[2]["group_var"].as_str(), Some("sex"));
    assert!(out.iter().all(|b| b["type"].as_str() == Some("bar")));
}

#[test]
fn mismatched_lengths_name_every_offender() {
    let p = params(vec![
        ("x_var", ParamValue::seq(["a", "b", "c"])),
        ("title", ParamValue::seq(["A", "B"])),
    ]);
    let err = expand(&p).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, VizError::Configuration(_)));
    assert!(msg.contains("x_var (3)"), "{msg}");
    assert!(msg.contains("title (2)"), "{msg}");
}

#[test]
fn empty_and_nested_sequences_are_rejected() {
    let empty = params(vec![("x_var", ParamValue::Seq(Vec::new()))]);
    assert!(matches!(expand(&empty), Err(VizError::Configuration(_))));

    let nested = params(vec![(
        "x_var",
        ParamValue::Seq(vec![ParamValue::seq(["a"]), "b".into()]),
    )]);
    assert!(matches!(expand(&nested), Err(VizError::Configuration(_))));
}

#[test]
fn json_arrays_are_atomic() {
    let p = params(vec![("x_order", serde_json::json!(["lo", "mid", "hi"]).into())]);
    assert_eq!(expand(&p).unwrap().len(), 1);
}

#[test]
fn substitute_fills_placeholders_and_keeps_escaped_braces() {
    let p = params(vec![("x_var", "age".into()), ("bins", 20.into())]);
    assert_eq!(
        substitute("{x_var} in {bins} bins {{raw}}", &p).unwrap(),
        "age in 20 bins {raw}"
    );
}

#[test]
fn substitute_rejects_unknown_or_unclosed_placeholders() {
    let p = params(vec![("x_var", "age".into())]);
    let err = substitute("by/{missing}", &p).unwrap_err();
    assert!(err.to_string().contains("'missing'"));
    assert!(substitute("by/{x_var", &p).is_err());
    assert!(substitute("by/x}", &p).is_err());
}

#[test]
fn tabgroup_template_sees_templated_title() {
    let p = params(vec![("x_var", "age".into())]);
    let t = Templates {
        tabgroup: Some("demo/{title}".to_owned()),
        title: Some("Distribution of {x_var}".to_owned()),
    };
    let out = apply_templates(p, &t).unwrap();
    assert_eq!(out["title"].as_str(), Some("Distribution of age"));
    assert_eq!(out["tabgroup"].as_str(), Some("demo/Distribution of age"));
}
