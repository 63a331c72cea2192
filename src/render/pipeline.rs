use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::compile::fingerprint::{ContentFingerprint, fingerprint_page};
use crate::compile::manifest::{BuildManifest, ManifestEntry, UnitState};
use crate::composition::page::{Dashboard, Page};
use crate::data::catalog::DataCatalog;
use crate::foundation::error::{ItemError, VizError, VizResult};
use crate::render::backend::{DocumentBackend, RenderedItem, RenderedPage, write_preview};
use crate::render::charts::RendererRegistry;
use crate::spec::intent::ResolvedIntent;
use crate::tree::build::{PageTree, build_page_tree};

/// Options for one generation pass.
#[derive(Clone, Debug)]
pub struct GenerateOpts {
    /// Skip units whose fingerprint matches the manifest.
    pub incremental: bool,
    /// Regenerate stale units on a rayon pool.
    pub parallel: bool,
    /// Pool size; `None` lets rayon decide. Must be at least 1 when set.
    pub threads: Option<usize>,
    /// Checked before each unit starts; set it to stop scheduling further units.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            incremental: true,
            parallel: false,
            threads: None,
            cancel: None,
        }
    }
}

/// Why a unit produced no artifact.
#[derive(Debug)]
pub enum UnitFailure {
    /// One or more content items could not be resolved or rendered.
    Items(Vec<ItemError>),
    /// The unit as a whole failed (backend write, cancellation).
    Unit(VizError),
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Items(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            Self::Unit(e) => write!(f, "{e}"),
        }
    }
}

/// What happened to one unit.
#[derive(Debug)]
pub enum UnitOutcome {
    /// Up to date; the previous artifact was kept.
    Fresh { artifact: PathBuf },
    /// Emitted during this pass.
    Rendered { artifact: PathBuf },
    /// Not emitted; the manifest entry (if any) is unchanged.
    Failed(UnitFailure),
}

/// Per-unit line of a [`GenerationSummary`].
#[derive(Debug)]
pub struct UnitReport {
    /// Page id.
    pub id: String,
    /// Fingerprint computed this pass.
    pub fingerprint: ContentFingerprint,
    /// What happened to the page.
    pub outcome: UnitOutcome,
}

impl UnitReport {
    /// Whether the page failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Failed(_))
    }
}

/// End-of-pass account of every unit, in dashboard order.
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// One report per page, in dashboard order.
    pub units: Vec<UnitReport>,
    /// Set when the previous manifest was discarded.
    pub manifest_reset: Option<String>,
    /// Manifest writes that failed after a successful emit.
    pub cache_warnings: Vec<String>,
}

impl GenerationSummary {
    fn ids<'a>(&'a self, pred: impl Fn(&UnitOutcome) -> bool + 'a) -> impl Iterator<Item = &'a str> {
        self.units
            .iter()
            .filter(move |u| pred(&u.outcome))
            .map(|u| u.id.as_str())
    }

    /// Ids of pages rendered this pass.
    pub fn rendered(&self) -> impl Iterator<Item = &str> {
        self.ids(|o| matches!(o, UnitOutcome::Rendered { .. }))
    }

    /// Ids of pages skipped as fresh.
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.ids(|o| matches!(o, UnitOutcome::Fresh { .. }))
    }

    /// Ids of failed pages.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.ids(|o| matches!(o, UnitOutcome::Failed(_)))
    }

    /// Whether any page failed.
    pub fn has_failures(&self) -> bool {
        self.units.iter().any(UnitReport::is_failed)
    }

    /// Report for one page.
    pub fn report(&self, id: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.id == id)
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = &self.manifest_reset {
            writeln!(f, "manifest reset: {reason}")?;
        }
        for u in &self.units {
            match &u.outcome {
                UnitOutcome::Fresh { artifact } => {
                    writeln!(f, "skipped   {} ({})", u.id, artifact.display())?
                }
                UnitOutcome::Rendered { artifact } => {
                    writeln!(f, "rendered  {} -> {}", u.id, artifact.display())?
                }
                UnitOutcome::Failed(why) => writeln!(f, "FAILED    {}: {why}", u.id)?,
            }
        }
        for w in &self.cache_warnings {
            writeln!(f, "warning   {w}")?;
        }
        write!(
            f,
            "{} rendered, {} skipped, {} failed",
            self.rendered().count(),
            self.skipped().count(),
            self.failed().count()
        )
    }
}

/// Render every leaf of a resolved page.
///
/// Any resolution or render error fails the whole page; the returned errors cover both, in
/// content order.
pub fn render_page(
    page: &Page,
    tree: PageTree,
    catalog: &DataCatalog,
    registry: &RendererRegistry,
) -> Result<RenderedPage, Vec<ItemError>> {
    let mut next = 0usize;
    let rendered = tree.root.try_map_ref(&mut |leaf: &ResolvedIntent| {
        let index = tree.origins.get(next).copied().unwrap_or(next);
        next += 1;
        match leaf {
            ResolvedIntent::Viz(v) => registry
                .render(v, catalog)
                .map(RenderedItem::Chart)
                .map_err(|e| ItemError::new(index, v.path.clone(), e)),
            ResolvedIntent::Text(t) => Ok(RenderedItem::Text {
                content: t.content.clone(),
            }),
            ResolvedIntent::Layout(l) => Ok(RenderedItem::Layout(l.clone())),
            ResolvedIntent::Input(i) => Ok(RenderedItem::Input(i.clone())),
        }
    });
    match rendered {
        Ok(out) if tree.errors.is_empty() => Ok(RenderedPage {
            id: page.id().to_owned(),
            title: page.title().to_owned(),
            style: page.style_params().clone(),
            generated_at: page.page_meta().generated_at.clone(),
            labels: tree.labels,
            tree: out,
        }),
        Ok(_) => Err(tree.errors),
        Err(render_errors) => {
            let mut all = tree.errors;
            all.extend(render_errors);
            all.sort_by_key(|e| e.index);
            Err(all)
        }
    }
}

struct StaleUnit<'a> {
    slot: usize,
    page: &'a Page,
    tree: PageTree,
    fingerprint: ContentFingerprint,
}

/// Run one generation pass over `dashboard`.
///
/// Each page is resolved and fingerprinted; fresh pages are skipped, stale ones are rendered,
/// emitted through `backend` and recorded in `manifest` one at a time. A failing page never
/// stops the others. Only invalid options abort the pass.
#[tracing::instrument(skip_all, fields(pages = dashboard.pages().len(), incremental = opts.incremental))]
pub fn generate(
    dashboard: &Dashboard,
    registry: &RendererRegistry,
    backend: &dyn DocumentBackend,
    manifest: &mut BuildManifest,
    opts: &GenerateOpts,
) -> VizResult<GenerationSummary> {
    let pool = if opts.parallel {
        Some(build_thread_pool(opts.threads)?)
    } else {
        None
    };

    let catalog = dashboard.catalog();
    let mut slots: Vec<Option<UnitReport>> = Vec::with_capacity(dashboard.pages().len());
    let mut stale = Vec::new();

    for (slot, page) in dashboard.pages().iter().enumerate() {
        let tree = build_page_tree(page);
        let fingerprint = fingerprint_page(page, &tree, catalog);
        // Resolution failed; the page is reported without rendering or emitting.
        if !tree.errors.is_empty() {
            debug!(unit = page.id(), %fingerprint, errors = tree.errors.len(), "resolution failed");
            let errors = render_page(page, tree, catalog, registry)
                .err()
                .unwrap_or_default();
            slots.push(Some(UnitReport {
                id: page.id().to_owned(),
                fingerprint,
                outcome: UnitOutcome::Failed(UnitFailure::Items(errors)),
            }));
            continue;
        }
        let state = manifest.classify(page.id(), fingerprint, opts.incremental);
        debug!(unit = page.id(), %fingerprint, ?state, "classified");
        if state == UnitState::Fresh {
            let artifact = manifest
                .get(page.id())
                .map(|e| e.artifact.clone())
                .unwrap_or_default();
            slots.push(Some(UnitReport {
                id: page.id().to_owned(),
                fingerprint,
                outcome: UnitOutcome::Fresh { artifact },
            }));
        } else {
            // Unknown and Stale both move on to rendering.
            slots.push(None);
            stale.push(StaleUnit {
                slot,
                page,
                tree,
                fingerprint,
            });
        }
    }

    let manifest_reset = manifest.reset_reason().map(str::to_owned);
    let cache_warnings = Mutex::new(Vec::new());
    let shared = Mutex::new(manifest);
    let run = |unit: StaleUnit<'_>| -> (usize, UnitReport) {
        let StaleUnit {
            slot,
            page,
            tree,
            fingerprint,
        } = unit;
        let id = page.id().to_owned();
        let report = |outcome| UnitReport {
            id: id.clone(),
            fingerprint,
            outcome,
        };
        let cancelled = opts
            .cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed));
        if cancelled {
            let failure = UnitFailure::Unit(VizError::Cancelled);
            return (slot, report(UnitOutcome::Failed(failure)));
        }
        let rendered = match render_page(page, tree, catalog, registry) {
            Ok(r) => r,
            Err(errors) => {
                return (slot, report(UnitOutcome::Failed(UnitFailure::Items(errors))));
            }
        };
        let artifact = match backend.emit(&rendered) {
            Ok(path) => path,
            Err(e) => return (slot, report(UnitOutcome::Failed(UnitFailure::Unit(e)))),
        };
        let entry = ManifestEntry {
            fingerprint,
            artifact: artifact.clone(),
        };
        let recorded = shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&id, entry);
        if let Err(e) = recorded {
            warn!(unit = %id, error = %e, "artifact written but manifest not updated");
            cache_warnings
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{id}: {e}"));
        }
        debug!(unit = %id, state = ?UnitState::Rendered, artifact = %artifact.display(), "recorded");
        (slot, report(UnitOutcome::Rendered { artifact }))
    };

    let done: Vec<(usize, UnitReport)> = match &pool {
        Some(pool) => pool.install(|| stale.into_par_iter().map(run).collect()),
        None => stale.into_iter().map(run).collect(),
    };
    for (slot, report) in done {
        slots[slot] = Some(report);
    }

    let summary = GenerationSummary {
        units: slots.into_iter().flatten().collect(),
        manifest_reset,
        cache_warnings: cache_warnings
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner),
    };
    for u in summary.units.iter().filter(|u| u.is_failed()) {
        if let UnitOutcome::Failed(why) = &u.outcome {
            warn!(unit = %u.id, error = %why, "unit failed");
        }
    }
    info!(
        rendered = summary.rendered().count(),
        skipped = summary.skipped().count(),
        failed = summary.failed().count(),
        "generation finished"
    );
    Ok(summary)
}

/// Render the selected pages (all when `ids` is empty) to `<out_dir>/<id>.preview.json`.
///
/// Never reads or writes the manifest and never calls a document backend. An id that names
/// no page is a structural error.
#[tracing::instrument(skip(dashboard, registry), fields(out_dir = %out_dir.display()))]
pub fn preview(
    dashboard: &Dashboard,
    registry: &RendererRegistry,
    ids: &[String],
    out_dir: &Path,
) -> VizResult<GenerationSummary> {
    let pages: Vec<&Page> = if ids.is_empty() {
        dashboard.pages().iter().collect()
    } else {
        ids.iter()
            .map(|id| {
                dashboard
                    .page_by_id(id)
                    .ok_or_else(|| VizError::structure(format!("no page with id '{id}'")))
            })
            .collect::<VizResult<_>>()?
    };

    let mut summary = GenerationSummary::default();
    for page in pages {
        let tree = build_page_tree(page);
        let fingerprint = fingerprint_page(page, &tree, dashboard.catalog());
        let outcome = match render_page(page, tree, dashboard.catalog(), registry) {
            Ok(rendered) => match write_preview(out_dir, &rendered) {
                Ok(artifact) => UnitOutcome::Rendered { artifact },
                Err(e) => UnitOutcome::Failed(UnitFailure::Unit(e)),
            },
            Err(errors) => UnitOutcome::Failed(UnitFailure::Items(errors)),
        };
        summary.units.push(UnitReport {
            id: page.id().to_owned(),
            fingerprint,
            outcome,
        });
    }
    info!(
        rendered = summary.rendered().count(),
        failed = summary.failed().count(),
        "preview finished"
    );
    Ok(summary)
}

fn build_thread_pool(threads: Option<usize>) -> VizResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(VizError::configuration(
            "generation 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| VizError::configuration(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
