use super::*;

use crate::composition::collection::ContentCollection;
use crate::composition::dsl::{Text, Viz};
use crate::composition::page::PageMeta;
use crate::data::table::{Cell, DataTable};
use crate::expression::filter::Filter;
use crate::spec::intent::ChartKind;
use crate::tree::build::build_page_tree;

fn catalog(ages: &[f64]) -> DataCatalog {
    let mut t = DataTable::new(["age"]).unwrap();
    for a in ages {
        t.push_row(vec![Cell::Number(*a)]).unwrap();
    }
    let mut c = DataCatalog::new();
    c.insert("survey", t).unwrap();
    c
}

fn page() -> Page {
    Page::new("home", "Home").data("survey").content(
        ContentCollection::new()
            .item(Text::new("intro"))
            .item(
                Viz::new(ChartKind::Histogram)
                    .x_var("age")
                    .tabgroup("demo")
                    .filter(Filter::new("age > 18")),
            )
            .labels([("demo", "Demographics"), ("unused", "Unused")]),
    )
}

fn fp_of(page: &Page, cat: &DataCatalog) -> ContentFingerprint {
    fingerprint_page(page, &build_page_tree(page), cat)
}

#[test]
fn same_input_same_fingerprint() {
    let cat = catalog(&[20.0, 30.0]);
    assert_eq!(fp_of(&page(), &cat), fp_of(&page(), &cat));
}

#[test]
fn display_is_32_hex_digits_and_parses_back() {
    let fp = fp_of(&page(), &catalog(&[1.0]));
    let s = fp.to_string();
    assert_eq!(s.len(), 32);
    assert_eq!(s.parse::<ContentFingerprint>().unwrap(), fp);
    assert!("xyz".parse::<ContentFingerprint>().is_err());
}

#[test]
fn generated_at_does_not_change_the_fingerprint() {
    let cat = catalog(&[20.0]);
    let stamped = page().meta(PageMeta {
        generated_at: Some("2026-10-19T08:00:00Z".to_owned()),
    });
    assert_eq!(fp_of(&page(), &cat), fp_of(&stamped, &cat));

    let with_volatile = Page::new("home", "Home").content(
        ContentCollection::new().item(Viz::new(ChartKind::Bar).x_var("a").param("chart_id", "c1")),
    );
    let with_other_id = Page::new("home", "Home").content(
        ContentCollection::new().item(Viz::new(ChartKind::Bar).x_var("a").param("chart_id", "c2")),
    );
    assert_eq!(fp_of(&with_volatile, &cat), fp_of(&with_other_id, &cat));
}

#[test]
fn content_changes_change_the_fingerprint() {
    let cat = catalog(&[20.0]);
    let base = fp_of(&page(), &cat);

    assert_ne!(base, fp_of(&page().style("theme", "dark"), &cat));
    assert_ne!(base, fp_of(&page().content(ContentCollection::new().item(Text::new("more"))), &cat));
    assert_ne!(base, fp_of(&page(), &catalog(&[20.0, 21.0])));

    let relabeled = page().content(ContentCollection::new().labels([("demo", "People")]));
    assert_ne!(base, fp_of(&relabeled, &cat));
}

#[test]
fn labels_for_absent_segments_are_ignored() {
    let cat = catalog(&[20.0]);
    let extra = page().content(ContentCollection::new().labels([("nowhere", "Nowhere")]));
    assert_eq!(fp_of(&page(), &cat), fp_of(&extra, &cat));
}

fn chart_page(viz: Viz) -> Page {
    Page::new("home", "Home")
        .data("survey")
        .content(ContentCollection::new().item(viz))
}

fn base_viz() -> Viz {
    Viz::new(ChartKind::Histogram)
        .x_var("age")
        .bins(10)
        .tabgroup("demo")
        .filter(Filter::new("age > 18"))
}

#[test]
fn every_resolved_viz_parameter_feeds_the_fingerprint() {
    let cat = catalog(&[20.0]);
    let base = fp_of(&chart_page(base_viz()), &cat);
    assert_eq!(base, fp_of(&chart_page(base_viz()), &cat));

    let variants = [
        ("bins", base_viz().bins(11)),
        ("x_var", base_viz().x_var("income")),
        ("tabgroup", base_viz().tabgroup("demo/age")),
        ("filter", base_viz().filter(Filter::new("age > 19"))),
        ("filter source", base_viz().filter(Filter::new("age > 18").on("census"))),
        ("title", base_viz().title("Ages")),
        ("data", base_viz().data("census")),
        ("drop_na_vars", base_viz().drop_na_vars(true)),
        ("weight_var", base_viz().weight_var("w")),
        ("show_when", base_viz().show_when("input.sex == 'f'")),
        ("unrecognized option", base_viz().param("palette", "warm")),
    ];
    for (what, viz) in variants {
        assert_ne!(base, fp_of(&chart_page(viz), &cat), "changing {what}");
    }

    let kind = Viz::new(ChartKind::Bar)
        .x_var("age")
        .bins(10)
        .tabgroup("demo")
        .filter(Filter::new("age > 18"));
    assert_ne!(base, fp_of(&chart_page(kind), &cat), "changing type");
}
