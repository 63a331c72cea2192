use super::*;

use crate::composition::collection::ContentCollection;
use crate::composition::dsl::{Text, Viz, Vizzes};
use crate::expression::filter::Filter;
use crate::foundation::error::VizError;
use crate::spec::intent::ChartKind;

fn p(s: &str) -> Vec<String> {
    s.split('/').map(str::to_owned).collect()
}

#[test]
fn nested_path_creates_empty_intermediate_nodes() {
    let tree = build_tree(vec![(p("x/y/z"), "leaf")]);
    let x = tree.child("x").unwrap();
    let y = x.child("y").unwrap();
    let z = y.child("z").unwrap();
    assert!(x.leaves().is_empty());
    assert!(y.leaves().is_empty());
    assert_eq!(z.leaves(), ["leaf"]);
}

#[test]
fn same_path_merges_into_one_node_in_arrival_order() {
    let tree = build_tree(vec![
        (p("demo/age"), 1),
        (p("other"), 2),
        (p("demo/age"), 3),
        (p("demo"), 4),
    ]);
    assert_eq!(tree.children().len(), 2);
    assert_eq!(tree.children()[0].label(), "demo");
    let age = tree.descendant(&["demo", "age"]).unwrap();
    assert_eq!(age.leaves(), [1, 3]);
    assert_eq!(tree.child("demo").unwrap().leaves(), [4]);
    assert_eq!(tree.leaf_count(), 4);
}

#[test]
fn segments_match_exactly_without_trimming() {
    let page = Page::new("home", "Home").content(
        ContentCollection::new()
            .item(Text::new("one").tabgroup("a/b"))
            .item(Text::new("two").tabgroup("a/ b")),
    );
    let built = build_page_tree(&page);
    assert!(built.errors.is_empty());
    let a = built.root.child("a").unwrap();
    let labels: Vec<_> = a.children().iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["b", " b"]);
}

#[test]
fn non_ascii_filters_resolve_or_fail_per_item() {
    let page = Page::new("home", "Home").data("survey").content(
        ContentCollection::new()
            .item(
                Viz::new(ChartKind::Bar)
                    .x_var("ville")
                    .filter(Filter::new("is_na(été)")),
            )
            .item(
                Viz::new(ChartKind::Bar)
                    .x_var("ville")
                    .filter(Filter::new("größe <€ 3")),
            ),
    );
    let built = build_page_tree(&page);
    assert_eq!(built.root.leaf_count(), 1);
    let v = built.root.leaves()[0].as_viz().unwrap();
    assert_eq!(v.filter.as_ref().unwrap().text(), "is_na(été)");
    assert_eq!(built.errors.len(), 1);
    assert_eq!(built.errors[0].index, 1);
    assert!(matches!(built.errors[0].error, VizError::Configuration(_)));
}

#[test]
fn iter_leaves_is_depth_first() {
    let tree = build_tree(vec![(p("a/b"), 1), (Vec::new(), 0), (p("a"), 2), (p("c"), 3)]);
    let order: Vec<i32> = tree.iter_leaves().copied().collect();
    assert_eq!(order, vec![0, 2, 1, 3]);
}

#[test]
fn map_ref_keeps_shape() {
    let tree = build_tree(vec![(p("a/b"), 1), (p("a"), 2)]);
    let doubled = tree.map_ref(&mut |n| n * 2);
    assert_eq!(doubled.descendant(&["a", "b"]).unwrap().leaves(), [2]);
    assert_eq!(doubled.child("a").unwrap().leaves(), [4]);
}

#[test]
fn try_map_ref_collects_every_error_in_leaf_order() {
    let tree = build_tree(vec![(p("a/b"), 1), (Vec::new(), 2), (p("a"), 3), (p("c"), 4)]);
    let ok = tree.try_map_ref(&mut |n| Ok::<_, String>(n + 1)).unwrap();
    assert_eq!(ok.iter_leaves().copied().collect::<Vec<_>>(), vec![3, 4, 2, 5]);

    let err = tree
        .try_map_ref(&mut |n| if n % 2 == 1 { Err(*n) } else { Ok(*n) })
        .unwrap_err();
    assert_eq!(err, vec![3, 1]);
}

#[test]
fn origins_follow_leaf_order() {
    let page = Page::new("home", "Home").content(
        ContentCollection::new()
            .item(Text::new("deep").tabgroup("a/b"))
            .item(Text::new("top"))
            .item(Text::new("mid").tabgroup("a")),
    );
    let built = build_page_tree(&page);
    assert_eq!(built.origins, vec![1, 2, 0]);
}

#[test]
fn labels_do_not_affect_merging() {
    let page = Page::new("home", "Home").content(
        ContentCollection::new()
            .item(Text::new("one").tabgroup("demo"))
            .labels([("demo", "Demographics")])
            .item(Text::new("two").tabgroup("demo")),
    );
    let built = build_page_tree(&page);
    assert_eq!(built.root.children().len(), 1);
    assert_eq!(built.root.child("demo").unwrap().leaves().len(), 2);
    assert_eq!(built.labels.display("demo"), "Demographics");
    assert_eq!(built.labels.display("other"), "other");
}

#[test]
fn page_data_is_inherited_and_items_may_override_it() {
    let page = Page::new("home", "Home").data("survey").content(
        ContentCollection::new()
            .item(Viz::new(ChartKind::Bar).x_var("sex"))
            .item(Viz::new(ChartKind::Bar).x_var("sex").data("census")),
    );
    let built = build_page_tree(&page);
    let data: Vec<_> = built
        .root
        .leaves()
        .iter()
        .map(|l| l.as_viz().unwrap().data.clone().unwrap())
        .collect();
    assert_eq!(data, vec!["survey", "census"]);
}

#[test]
fn bad_intents_are_skipped_and_attributed() {
    let page = Page::new("home", "Home").content(
        ContentCollection::new()
            .item(Viz::new(ChartKind::Histogram).x_var("age").tabgroup("demo"))
            .item(
                Vizzes::new(ChartKind::Bar)
                    .vary("x_var", ["a", "b", "c"])
                    .vary("title", ["A", "B"])
                    .param("tabgroup", "demo"),
            )
            .item(Viz::untyped().x_var("age").tabgroup("demo")),
    );
    let built = build_page_tree(&page);
    assert_eq!(built.root.leaf_count(), 1);
    assert_eq!(built.errors.len(), 2);
    assert_eq!(built.errors[0].index, 1);
    assert_eq!(built.errors[0].path, vec!["demo".to_owned()]);
    assert!(matches!(built.errors[0].error, VizError::Configuration(_)));
    assert_eq!(built.errors[1].index, 2);
}

#[test]
fn vectorized_intents_land_in_templated_paths() {
    let page = Page::new("home", "Home").content(
        ContentCollection::new().item(
            Vizzes::new(ChartKind::Histogram)
                .vary("x_var", ["age", "income"])
                .tabgroup_template("dist/{x_var}"),
        ),
    );
    let built = build_page_tree(&page);
    assert!(built.errors.is_empty());
    let dist = built.root.child("dist").unwrap();
    let labels: Vec<_> = dist.children().iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["age", "income"]);
}
