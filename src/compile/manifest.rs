use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::compile::fingerprint::ContentFingerprint;
use crate::foundation::error::{VizError, VizResult};

const MANIFEST_VERSION: u32 = 1;

/// What the manifest remembers about one output unit.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestEntry {
    /// Fingerprint the artifact was rendered from.
    pub fingerprint: ContentFingerprint,
    /// Where the artifact was written.
    pub artifact: PathBuf,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ManifestFile {
    version: u32,
    units: BTreeMap<String, ManifestEntry>,
}

/// Where a unit stands in one generation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitState {
    /// No manifest entry for the unit; it is rendered like a stale one.
    Unknown,
    /// Fingerprint and artifact match the manifest; emission is skipped.
    Fresh,
    /// Must be rendered.
    Stale,
    /// Rendered this pass and recorded.
    Rendered,
}

/// Persisted map from output unit id to the fingerprint of its last successful render.
///
/// Written only after a unit's artifact has been produced, so a unit is never marked fresh
/// for content it did not emit.
#[derive(Debug)]
pub struct BuildManifest {
    path: PathBuf,
    units: BTreeMap<String, ManifestEntry>,
    reset_reason: Option<String>,
}

impl BuildManifest {
    /// An empty manifest that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            units: BTreeMap::new(),
            reset_reason: None,
        }
    }

    /// Load from `path`. A missing file yields an empty manifest; an unreadable, corrupt or
    /// outdated one is a cache error.
    pub fn load(path: impl Into<PathBuf>) -> VizResult<Self> {
        let path = path.into();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(e) => {
                return Err(VizError::cache_io(format!(
                    "read manifest {}: {e}",
                    path.display()
                )));
            }
        };
        let file: ManifestFile = serde_json::from_slice(&bytes).map_err(|e| {
            VizError::cache_io(format!("parse manifest {}: {e}", path.display()))
        })?;
        if file.version != MANIFEST_VERSION {
            return Err(VizError::cache_io(format!(
                "manifest version mismatch ({} != {MANIFEST_VERSION})",
                file.version
            )));
        }
        debug!(units = file.units.len(), path = %path.display(), "manifest loaded");
        Ok(Self {
            path,
            units: file.units,
            reset_reason: None,
        })
    }

    /// Load from `path`, falling back to an empty manifest (every unit stale) when the
    /// existing one cannot be used.
    pub fn load_or_reset(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "ignoring unusable manifest; rebuilding everything");
                let mut m = Self::empty(path);
                m.reset_reason = Some(e.to_string());
                m
            }
        }
    }

    /// Why the previous manifest was discarded, if it was.
    pub fn reset_reason(&self) -> Option<&str> {
        self.reset_reason.as_deref()
    }

    /// Manifest file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded entry for a page, if any.
    pub fn get(&self, id: &str) -> Option<&ManifestEntry> {
        self.units.get(id)
    }

    /// Number of recorded pages.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Classify a fingerprinted unit. Without `incremental` every unit is stale; otherwise a
    /// unit is fresh when the recorded fingerprint matches and its artifact still exists.
    pub fn classify(&self, id: &str, fp: ContentFingerprint, incremental: bool) -> UnitState {
        if !incremental {
            return UnitState::Stale;
        }
        match self.units.get(id) {
            None => UnitState::Unknown,
            Some(e) if e.fingerprint == fp && e.artifact.is_file() => UnitState::Fresh,
            Some(_) => UnitState::Stale,
        }
    }

    /// Upsert one unit and persist the whole manifest.
    pub fn record(&mut self, id: &str, entry: ManifestEntry) -> VizResult<()> {
        self.units.insert(id.to_owned(), entry);
        self.save()
    }

    /// Write atomically: serialize to a sibling temp file, then rename over the target.
    pub fn save(&self) -> VizResult<()> {
        let file = ManifestFile {
            version: MANIFEST_VERSION,
            units: self.units.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                VizError::cache_io(format!("create {}: {e}", parent.display()))
            })?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)
            .map_err(|e| VizError::cache_io(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            VizError::cache_io(format!("replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/manifest.rs"]
mod tests;
