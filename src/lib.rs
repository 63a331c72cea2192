//! vizdeck compiles declarative dashboard specifications into rendered documents.
//!
//! Content is described with immutable builder values:
//!
//! - Collect [`Viz`], [`Vizzes`], [`Text`], [`Layout`] and [`Input`] items into a
//!   [`ContentCollection`], optionally under defaults frames
//! - Place collections on [`Page`]s of a [`Dashboard`] together with the data they read
//! - Run [`generate`] to resolve, fingerprint and emit every page, skipping pages whose
//!   [`ContentFingerprint`] matches the [`BuildManifest`]
//!
//! Projects can also be loaded from JSON with [`ProjectDef`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub(crate) mod compile;
pub(crate) mod composition;
pub(crate) mod data;
pub(crate) mod expression;
pub(crate) mod foundation;
pub(crate) mod project;
pub(crate) mod render;
pub(crate) mod spec;
pub(crate) mod tree;

pub use crate::foundation::error::{ItemError, VizError, VizResult};
pub use crate::foundation::value::{ParamValue, Params};

pub use crate::data::catalog::{DataCatalog, DataSource};
pub use crate::data::table::{Cell, DataTable};
pub use crate::expression::filter::{Filter, Predicate};

pub use crate::spec::expand::{apply_templates, expand, substitute};
pub use crate::spec::intent::{
    ChartKind, InputControl, InputType, IntentKind, LayoutBlock, LayoutKind, RawIntent,
    ResolvedIntent, ResolvedViz, Templates, TextBlock, param,
};
pub use crate::spec::resolve::{merge_defaults, parse_path, resolve_intent};

pub use crate::composition::collection::ContentCollection;
pub use crate::composition::dsl::{Input, IntoIntent, Layout, Text, Viz, Vizzes};
pub use crate::composition::page::{Dashboard, Page, PageMeta};

pub use crate::tree::build::{LabelTable, PageTree, TreeNode, build_page_tree, build_tree};
pub use crate::tree::text::{describe, render_tree_text};

pub use crate::compile::fingerprint::{ContentFingerprint, VOLATILE_PARAMS, fingerprint_page};
pub use crate::compile::manifest::{BuildManifest, ManifestEntry, UnitState};

pub use crate::render::backend::{
    DocumentBackend, MarkdownBackend, RenderedItem, RenderedPage, to_markdown, write_preview,
};
pub use crate::render::charts::{BoundRows, ChartPayload, ChartRenderer, RendererRegistry};
pub use crate::render::pipeline::{
    GenerateOpts, GenerationSummary, UnitFailure, UnitOutcome, UnitReport, generate, preview,
    render_page,
};

pub use crate::project::{GroupDef, ItemDef, OutputDef, PageDef, ProjectDef};
