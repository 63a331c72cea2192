use super::*;

use crate::composition::dsl::{Text, Viz};
use crate::spec::intent::ChartKind;

fn frame_keys(e: &Entry) -> Vec<Vec<String>> {
    e.frames.iter().map(|f| f.keys().cloned().collect()).collect()
}

#[test]
fn appended_items_capture_the_frames_in_force() {
    let c = ContentCollection::new()
        .item(Text::new("intro"))
        .with_defaults([("type", "bar")])
        .item(Viz::untyped().x_var("sex"));
    assert_eq!(c.len(), 2);
    assert!(c.entries()[0].frames.is_empty());
    assert_eq!(frame_keys(&c.entries()[1]), vec![vec!["type".to_owned()]]);
}

#[test]
fn appending_never_changes_an_earlier_value() {
    let base = ContentCollection::new().item(Text::new("a"));
    let grown = base.clone().item(Text::new("b"));
    assert_eq!(base.len(), 1);
    assert_eq!(grown.len(), 2);
    assert!(Arc::ptr_eq(
        &base.entries()[0].intent,
        &grown.entries()[0].intent
    ));
}

#[test]
fn nest_puts_outer_frames_first() {
    let inner = ContentCollection::new()
        .with_defaults([("bins", 10)])
        .item(Viz::new(ChartKind::Histogram).x_var("age"));
    let outer = ContentCollection::new()
        .with_defaults([("data", "survey")])
        .nest(inner);
    assert_eq!(
        frame_keys(&outer.entries()[0]),
        vec![vec!["data".to_owned()], vec!["bins".to_owned()]]
    );
}

#[test]
fn combine_concatenates_and_keeps_left_defaults() {
    let a = ContentCollection::new()
        .with_defaults([("type", "bar")])
        .item(Viz::untyped().x_var("a"));
    let b = ContentCollection::new().item(Text::new("b"));
    let c = (a + b).item(Viz::untyped().x_var("c"));
    assert_eq!(c.len(), 3);
    assert!(c.entries()[1].frames.is_empty());
    assert_eq!(c.entries()[2].frames.len(), 1);
}

#[test]
fn combination_is_associative_over_entries_and_labels() {
    let a = ContentCollection::new()
        .item(Text::new("a").tabgroup("x"))
        .labels([("x", "Ex")]);
    let b = ContentCollection::new()
        .with_defaults([("type", "bar")])
        .item(Viz::untyped().tabgroup("x/y"))
        .labels([("x", "Ex (b)")]);
    let c = ContentCollection::new()
        .item(Text::new("c").tabgroup("z"))
        .labels([("z", "Zed")]);

    let left = (a.clone() + b.clone()) + c.clone();
    let right = a + (b + c);
    assert_eq!(left.entries(), right.entries());
    assert_eq!(left.label_table(), right.label_table());
    assert_eq!(left.label_table()["x"], "Ex (b)");
}

#[test]
fn collect_combines_in_order() {
    let parts = vec![
        ContentCollection::new().item(Text::new("1")),
        ContentCollection::new().item(Text::new("2")),
    ];
    let all: ContentCollection = parts.into_iter().collect();
    let contents: Vec<_> = all
        .intents()
        .map(|i| i.params["content"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(contents, vec!["1", "2"]);
}
