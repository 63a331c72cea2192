use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::table::DataTable;
use crate::foundation::error::{VizError, VizResult};

/// A registered data source with its precomputed content signature.
#[derive(Debug)]
pub struct DataSource {
    /// Registered name.
    pub name: String,
    /// Table contents.
    pub table: DataTable,
    /// SHA-256 content signature of `table`.
    pub signature: String,
}

/// Named data sources available to every page of a dashboard.
#[derive(Clone, Debug, Default)]
pub struct DataCatalog {
    sources: BTreeMap<String, Arc<DataSource>>,
}

impl DataCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under a unique name.
    pub fn insert(&mut self, name: impl Into<String>, table: DataTable) -> VizResult<()> {
        let name = name.into();
        if self.sources.contains_key(&name) {
            return Err(VizError::structure(format!(
                "duplicate data source '{name}'"
            )));
        }
        let signature = table.signature();
        self.sources.insert(
            name.clone(),
            Arc::new(DataSource {
                name,
                table,
                signature,
            }),
        );
        Ok(())
    }

    /// Look up a source by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<DataSource>> {
        self.sources.get(name)
    }

    /// Resolve a source or fail with a data binding error naming the reference.
    pub fn require(&self, name: &str) -> VizResult<&Arc<DataSource>> {
        self.get(name).ok_or_else(|| {
            VizError::data_binding(name, format!("no data source named '{name}'"))
        })
    }

    /// Registered source names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
