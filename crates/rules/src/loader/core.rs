//! Core [`ControlLoader`] struct: filesystem-backed control loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::schema::{ControlDocument, ControlEnvelope};
use crate::validation::validate_document;

use super::error::{ControlError, LoadResult, LoadStatus, Result};

const EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// A stored document and the file it came from.
#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    document: ControlDocument,
}

/// Filesystem-backed control loader.
///
/// Scans a directory (recursively) for `*.yml`, `*.yaml` and `*.json` files,
/// deserializes them into [`ControlDocument`] instances via two-pass
/// deserialization, validates them, and maintains an in-memory map keyed by
/// control id.
pub struct ControlLoader {
    /// Root directory containing control documents.
    controls_dir: PathBuf,
    /// In-memory store keyed by `metadata.id`.
    documents: Arc<RwLock<HashMap<String, Entry>>>,
}

impl ControlLoader {
    pub fn new(controls_dir: PathBuf) -> Self {
        Self {
            controls_dir,
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn controls_dir(&self) -> &Path {
        &self.controls_dir
    }

    /// Replace the in-memory set with the contents of the controls directory.
    ///
    /// Dotfiles and files with other extensions are skipped. Files are visited
    /// in path order; parse and validation errors are reported per file but
    /// do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        self.documents.write().expect("documents lock poisoned").clear();
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.controls_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| EXTENSIONS.contains(&e))
                .unwrap_or(false);
            if !supported {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML or JSON file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path) {
                Ok(doc) => LoadStatus::Loaded {
                    control_id: doc.id().to_string(),
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load control file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Load, validate and store a single control file.
    ///
    /// A control id already loaded from a different file is rejected; the
    /// first file wins.
    pub fn load_file(&self, path: &Path) -> Result<ControlDocument> {
        let document = load_document(path)?;
        let id = document.id().to_string();

        let mut documents = self.documents.write().expect("documents lock poisoned");
        if let Some(existing) = documents.get(&id) {
            if existing.path != path {
                return Err(ControlError::Validation(format!(
                    "duplicate control id '{}' (already loaded from {})",
                    id,
                    existing.path.display()
                )));
            }
        }

        info!(control_id = %id, kind = %document.kind(), path = %path.display(), "loaded control");
        documents.insert(
            id,
            Entry {
                path: path.to_path_buf(),
                document: document.clone(),
            },
        );
        Ok(document)
    }

    /// Get a control by id.
    pub fn get(&self, id: &str) -> Option<ControlDocument> {
        self.documents
            .read()
            .expect("documents lock poisoned")
            .get(id)
            .map(|entry| entry.document.clone())
    }

    /// All loaded controls, ordered by id.
    pub fn all(&self) -> Vec<ControlDocument> {
        let documents = self.documents.read().expect("documents lock poisoned");
        let mut all: Vec<_> = documents.values().map(|e| e.document.clone()).collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("documents lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse and validate a single control file without storing it.
///
/// First pass: deserialize as [`ControlEnvelope`] (YAML, or JSON for `.json`
/// files) to read the `kind`. Second pass: deserialize `options` into the
/// kind-specific type. The result must pass [`validate_document`].
pub fn load_document(path: &Path) -> Result<ControlDocument> {
    let contents = fs::read_to_string(path)?;

    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let envelope: ControlEnvelope = if is_json {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };

    envelope.control_kind().map_err(ControlError::UnknownKind)?;
    let document = envelope.parse_full().map_err(|e| {
        ControlError::Validation(format!(
            "failed to parse control '{}': {}",
            envelope.metadata.id, e
        ))
    })?;

    let result = validate_document(&document);
    for warning in &result.warnings {
        warn!(
            control_id = %document.id(),
            path = %warning.path,
            "{}",
            warning.message
        );
    }
    if !result.valid {
        let messages: Vec<String> = result
            .errors
            .iter()
            .map(|e| match &e.suggestion {
                Some(s) => format!("{}: {} ({})", e.path, e.message, s),
                None => format!("{}: {}", e.path, e.message),
            })
            .collect();
        return Err(ControlError::Validation(format!(
            "control '{}' is invalid: {}",
            document.id(),
            messages.join("; ")
        )));
    }

    Ok(document)
}
