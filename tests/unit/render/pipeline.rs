use super::*;

use std::sync::atomic::AtomicUsize;

use crate::composition::collection::ContentCollection;
use crate::composition::dsl::{Text, Viz};
use crate::data::table::DataTable;
use crate::spec::intent::ChartKind;

#[derive(Default)]
struct CountingBackend {
    dir: PathBuf,
    emitted: AtomicUsize,
}

impl DocumentBackend for CountingBackend {
    fn emit(&self, page: &RenderedPage) -> VizResult<PathBuf> {
        self.emitted.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("{}.out", page.id));
        std::fs::write(&path, &page.title).map_err(|e| VizError::render(e.to_string()))?;
        Ok(path)
    }
}

fn dashboard() -> Dashboard {
    let table = DataTable::from_json_str(r#"[{"age": 20, "sex": "f"}, {"age": 40, "sex": "m"}]"#)
        .unwrap();
    Dashboard::new()
        .data_source("survey", table)
        .unwrap()
        .page(
            Page::new("good", "Good").data("survey").content(
                ContentCollection::new()
                    .item(Viz::new(ChartKind::Histogram).x_var("age").tabgroup("demo")),
            ),
        )
        .unwrap()
        .page(
            Page::new("bad", "Bad").data("survey").content(
                ContentCollection::new()
                    .item(Text::new("ok"))
                    .item(Viz::new(ChartKind::Bar).x_var("nope"))
                    .item(Viz::new(ChartKind::Scatter).x_var("age")),
            ),
        )
        .unwrap()
}

#[test]
fn render_page_reports_every_failing_item_in_content_order() {
    let d = dashboard();
    let page = d.page_by_id("bad").unwrap();
    let errors = render_page(page, build_page_tree(page), d.catalog(), &RendererRegistry::builtin())
        .unwrap_err();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].index, 1);
    assert!(matches!(errors[0].error, VizError::DataBinding { .. }));
    assert_eq!(errors[1].index, 2);
    assert!(matches!(errors[1].error, VizError::RequiredParameterMissing { .. }));
}

#[test]
fn failing_pages_do_not_stop_others_and_are_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let backend = CountingBackend {
        dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut manifest = BuildManifest::empty(dir.path().join("m.json"));
    let summary = generate(
        &dashboard(),
        &RendererRegistry::builtin(),
        &backend,
        &mut manifest,
        &GenerateOpts::default(),
    )
    .unwrap();
    assert_eq!(summary.rendered().collect::<Vec<_>>(), vec!["good"]);
    assert_eq!(summary.failed().collect::<Vec<_>>(), vec!["bad"]);
    assert!(summary.has_failures());
    assert!(manifest.get("good").is_some());
    assert!(manifest.get("bad").is_none());
    assert_eq!(backend.emitted.load(Ordering::SeqCst), 1);
    assert!(summary.to_string().contains("1 rendered, 0 skipped, 1 failed"));
}

#[test]
fn zero_threads_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let backend = CountingBackend {
        dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut manifest = BuildManifest::empty(dir.path().join("m.json"));
    let opts = GenerateOpts {
        parallel: true,
        threads: Some(0),
        ..Default::default()
    };
    let err = generate(
        &dashboard(),
        &RendererRegistry::builtin(),
        &backend,
        &mut manifest,
        &opts,
    )
    .unwrap_err();
    assert!(matches!(err, VizError::Configuration(_)));
    assert_eq!(backend.emitted.load(Ordering::SeqCst), 0);
}

#[test]
fn cancelled_units_fail_without_emitting() {
    let dir = tempfile::tempdir().unwrap();
    let backend = CountingBackend {
        dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut manifest = BuildManifest::empty(dir.path().join("m.json"));
    let opts = GenerateOpts {
        cancel: Some(Arc::new(AtomicBool::new(true))),
        ..Default::default()
    };
    let summary = generate(
        &dashboard(),
        &RendererRegistry::builtin(),
        &backend,
        &mut manifest,
        &opts,
    )
    .unwrap();
    match &summary.report("good").unwrap().outcome {
        UnitOutcome::Failed(UnitFailure::Unit(VizError::Cancelled)) => {}
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.emitted.load(Ordering::SeqCst), 0);
    assert!(manifest.is_empty());
}

#[test]
fn preview_rejects_unknown_ids_and_skips_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let d = dashboard();
    let reg = RendererRegistry::builtin();
    assert!(matches!(
        preview(&d, &reg, &["missing".to_owned()], dir.path()),
        Err(VizError::Structure(_))
    ));

    let summary = preview(&d, &reg, &["good".to_owned()], dir.path()).unwrap();
    assert_eq!(summary.units.len(), 1);
    assert!(dir.path().join("good.preview.json").is_file());
    assert!(!dir.path().join("bad.preview.json").exists());
}
