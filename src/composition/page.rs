use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::composition::collection::ContentCollection;
use crate::data::catalog::DataCatalog;
use crate::data::table::DataTable;
use crate::foundation::error::{VizError, VizResult};
use crate::foundation::value::Params;
use crate::spec::intent::param;

/// Bookkeeping attached to a page that never affects its fingerprint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// Wall-clock stamp written into the artifact header, if any.
    pub generated_at: Option<String>,
}

/// One output unit: a titled page rendered to one document.
#[derive(Clone, Debug)]
pub struct Page {
    id: String,
    title: String,
    data: Option<String>,
    style: BTreeMap<String, Value>,
    content: ContentCollection,
    meta: PageMeta,
}

impl Page {
    /// Create an empty page. `id` names the artifact and the manifest entry.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            data: None,
            style: BTreeMap::new(),
            content: ContentCollection::new(),
            meta: PageMeta::default(),
        }
    }

    /// Default data source for every visualization on the page.
    pub fn data(mut self, source: impl Into<String>) -> Self {
        self.data = Some(source.into());
        self
    }

    /// Set one presentation option (theme, width, ...).
    pub fn style(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    /// Append a collection to the page's content.
    pub fn content(mut self, content: ContentCollection) -> Self {
        self.content = self.content.combine(content);
        self
    }

    /// Attach build metadata. Never part of the fingerprint.
    pub fn meta(mut self, meta: PageMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Page id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Page-level data source inherited by every item.
    pub fn data_source(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Style parameters.
    pub fn style_params(&self) -> &BTreeMap<String, Value> {
        &self.style
    }

    /// Page content.
    pub fn collection(&self) -> &ContentCollection {
        &self.content
    }

    /// Build metadata.
    pub fn page_meta(&self) -> &PageMeta {
        &self.meta
    }

    /// The frame placed outside every entry's own defaults stack.
    pub(crate) fn outer_frame(&self) -> Option<Arc<Params>> {
        let data = self.data.as_ref()?;
        let mut frame = Params::new();
        frame.insert(param::DATA.to_owned(), data.clone().into());
        Some(Arc::new(frame))
    }
}

/// The top-level document set: ordered pages plus the data they read.
#[derive(Clone, Debug, Default)]
pub struct Dashboard {
    pages: Vec<Page>,
    ids: HashSet<String>,
    catalog: DataCatalog,
}

impl Dashboard {
    /// Empty dashboard with no pages and no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a data source.
    pub fn data_source(mut self, name: impl Into<String>, table: DataTable) -> VizResult<Self> {
        self.catalog.insert(name, table)?;
        Ok(self)
    }

    /// Append a page. Ids must be unique, non-empty and free of surrounding whitespace.
    pub fn page(mut self, page: Page) -> VizResult<Self> {
        let id = page.id.as_str();
        if id.trim().is_empty() {
            return Err(VizError::structure("page id must be non-empty"));
        }
        if id.trim() != id {
            return Err(VizError::structure(format!(
                "page id '{id}' has surrounding whitespace"
            )));
        }
        if id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(VizError::structure(format!(
                "page id '{id}' must be a plain file stem"
            )));
        }
        if !self.ids.insert(id.to_owned()) {
            return Err(VizError::structure(format!("duplicate page id '{id}'")));
        }
        self.pages.push(page);
        Ok(self)
    }

    /// Pages in insertion order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Look up a page by id.
    pub fn page_by_id(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Registered data sources.
    pub fn catalog(&self) -> &DataCatalog {
        &self.catalog
    }
}
