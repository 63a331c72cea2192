use super::*;

use std::collections::BTreeMap;

use crate::expression::filter::Filter;

fn survey() -> DataCatalog {
    let t = DataTable::from_json_str(
        r#"[
            {"age": 20, "sex": "f", "region": "north", "w": 1, "income": 10},
            {"age": 30, "sex": "m", "region": "south", "w": 2, "income": 20},
            {"age": 40, "sex": "f", "region": "south", "w": 1, "income": null},
            {"age": null, "sex": "m", "region": "north", "w": 3, "income": 40}
        ]"#,
    )
    .unwrap();
    let mut c = DataCatalog::new();
    c.insert("survey", t).unwrap();
    c
}

fn viz(kind: ChartKind, params: Value) -> ResolvedViz {
    let params: BTreeMap<String, Value> = match params {
        Value::Object(m) => m.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    ResolvedViz {
        kind,
        path: vec!["demo".to_owned()],
        title: Some("T".to_owned()),
        data: params.get("data").and_then(Value::as_str).map(str::to_owned),
        filter: None,
        drop_na_vars: false,
        weight_var: params.get("weight_var").and_then(Value::as_str).map(str::to_owned),
        show_when: None,
        params,
    }
}

#[test]
fn histogram_buckets_cover_the_range() {
    let v = viz(
        ChartKind::Histogram,
        json!({"data": "survey", "x_var": "age", "bins": 2}),
    );
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    let bins = out.data["bins"].as_array().unwrap();
    assert_eq!(bins.len(), 2);
    assert_eq!(bins[0]["start"], json!(20.0));
    assert_eq!(bins[1]["end"], json!(40.0));
    assert_eq!(bins[0]["count"], json!(1.0));
    assert_eq!(bins[1]["count"], json!(2.0));
    assert_eq!(out.data["missing"], json!(1));
}

#[test]
fn histogram_defaults_to_thirty_bins() {
    let v = viz(ChartKind::Histogram, json!({"data": "survey", "x_var": "age"}));
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    assert_eq!(out.data["bins"].as_array().unwrap().len(), 30);
}

#[test]
fn histogram_rejects_out_of_range_bin_counts() {
    for bins in [json!(0), json!(10_001), json!(1_000_000_000_000_000u64), json!(2.5)] {
        let v = viz(
            ChartKind::Histogram,
            json!({"data": "survey", "x_var": "age", "bins": bins}),
        );
        let err = RendererRegistry::builtin().render(&v, &survey()).unwrap_err();
        assert!(matches!(err, VizError::Configuration(_)), "{bins}: {err}");
    }
    let v = viz(
        ChartKind::Histogram,
        json!({"data": "survey", "x_var": "age", "bins": 10_000}),
    );
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    assert_eq!(out.data["bins"].as_array().unwrap().len(), 10_000);
}

#[test]
fn bar_counts_are_weighted_and_ordered() {
    let v = viz(
        ChartKind::Bar,
        json!({"data": "survey", "x_var": "sex", "weight_var": "w", "x_order": ["m", "f"]}),
    );
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    assert_eq!(
        out.data["bars"],
        json!([{"x": "m", "value": 5.0}, {"x": "f", "value": 2.0}])
    );
}

#[test]
fn bar_with_group_splits_each_category() {
    let v = viz(
        ChartKind::Bar,
        json!({"data": "survey", "x_var": "sex", "group_var": "region"}),
    );
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    assert_eq!(out.data["bars"].as_array().unwrap().len(), 4);
}

#[test]
fn stackedbar_shares_sum_to_one() {
    let v = viz(
        ChartKind::StackedBar,
        json!({"data": "survey", "x_var": "region", "stack_var": "sex"}),
    );
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    for row in out.data["shares"].as_array().unwrap() {
        let sum: f64 = row.as_array().unwrap().iter().filter_map(Value::as_f64).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}

#[test]
fn scatter_skips_missing_points() {
    let v = viz(
        ChartKind::Scatter,
        json!({"data": "survey", "x_var": "age", "y_var": "income", "color_var": "sex"}),
    );
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    let points = out.data["points"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["color"], json!("f"));
}

#[test]
fn missing_required_option_names_path_and_option() {
    let v = viz(ChartKind::StackedBar, json!({"data": "survey", "x_var": "sex"}));
    let err = RendererRegistry::builtin().render(&v, &survey()).unwrap_err();
    match err {
        VizError::RequiredParameterMissing { path, param, .. } => {
            assert_eq!(path, "demo");
            assert_eq!(param, "stack_var");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn missing_data_source_is_required_and_unknown_source_is_binding() {
    let v = viz(ChartKind::Bar, json!({"x_var": "sex"}));
    assert!(matches!(
        RendererRegistry::builtin().render(&v, &survey()),
        Err(VizError::RequiredParameterMissing { .. })
    ));
    let v = viz(ChartKind::Bar, json!({"x_var": "sex", "data": "census"}));
    assert!(matches!(
        RendererRegistry::builtin().render(&v, &survey()),
        Err(VizError::DataBinding { .. })
    ));
}

#[test]
fn unknown_column_is_a_binding_error() {
    let v = viz(ChartKind::Bar, json!({"data": "survey", "x_var": "height"}));
    assert!(matches!(
        RendererRegistry::builtin().render(&v, &survey()),
        Err(VizError::DataBinding { .. })
    ));
}

#[test]
fn filter_and_drop_na_narrow_the_rows() {
    let mut v = viz(ChartKind::Bar, json!({"data": "survey", "x_var": "sex", "y_var": "income"}));
    v.filter = Some(Filter::new("age >= 30").compile(Some("survey")).unwrap());
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    assert_eq!(out.rows, 2);

    let mut v = viz(ChartKind::Scatter, json!({"data": "survey", "x_var": "age", "y_var": "income"}));
    v.drop_na_vars = true;
    let out = RendererRegistry::builtin().render(&v, &survey()).unwrap();
    assert_eq!(out.rows, 2);
}

#[test]
fn filter_bound_elsewhere_is_rejected() {
    let mut v = viz(ChartKind::Bar, json!({"data": "survey", "x_var": "sex"}));
    v.filter = Some(Filter::new("age > 1").on("census").compile(None).unwrap());
    assert!(matches!(
        RendererRegistry::builtin().render(&v, &survey()),
        Err(VizError::DataBinding { .. })
    ));
}

#[test]
fn empty_registry_rejects_every_kind() {
    let v = viz(ChartKind::Bar, json!({"data": "survey", "x_var": "sex"}));
    assert!(matches!(
        RendererRegistry::empty().render(&v, &survey()),
        Err(VizError::Configuration(_))
    ));
}
