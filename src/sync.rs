//! Refreshes a bundled registry directory from an upstream Vulkan-Headers
//! checkout.
//!
//! The new tree is assembled and validated in a scratch directory next to
//! the target and only then renamed over it, so a failed sync leaves the
//! previous registry in place.

use regex::{NoExpand, Regex};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::accessor::{bundled_registry_dir, RegistryParser, XmlRegistryParser, DEFAULT_API, REGISTRY_FILE};
use crate::error::SyncError;
use crate::types::HeaderVersion;

/// Marker file written next to `vk.xml`, holding the header version.
pub const VERSION_FILE: &str = "VERSION";

/// Directory of a Vulkan-Headers checkout that holds `vk.xml`.
pub const UPSTREAM_REGISTRY_DIR: &str = "registry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub version: HeaderVersion,
    pub files_copied: usize,
    pub target: PathBuf,
    /// Whether the manifest version line was rewritten.
    pub manifest_updated: bool,
}

#[derive(Debug, Clone)]
pub struct Synchronizer<P = XmlRegistryParser> {
    target: PathBuf,
    manifest: Option<PathBuf>,
    api: String,
    parser: P,
}

impl Synchronizer {
    pub fn new(target: impl Into<PathBuf>) -> Synchronizer {
        Synchronizer {
            target: target.into(),
            manifest: None,
            api: String::from(DEFAULT_API),
            parser: XmlRegistryParser,
        }
    }

    /// Synchronizer for the directory `get_vulkan_object` reads from.
    pub fn bundled() -> Synchronizer {
        Synchronizer::new(bundled_registry_dir())
    }
}

impl<P: RegistryParser> Synchronizer<P> {
    /// Manifest whose `version = "..."` line follows the registry version.
    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    pub fn with_parser<Q: RegistryParser>(self, parser: Q) -> Synchronizer<Q> {
        Synchronizer {
            target: self.target,
            manifest: self.manifest,
            api: self.api,
            parser,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Replaces the target directory with the `registry/` tree of
    /// `source_root` and writes the version marker.
    pub fn sync(&self, source_root: impl AsRef<Path>) -> Result<SyncReport, SyncError> {
        let source_root = source_root.as_ref();
        let source = locate(source_root)?;
        tracing::info!(source = %source.display(), dir = %self.target.display(), "syncing registry");

        let parent = match self.target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(SyncError::io(&parent))?;

        let staging = tempfile::Builder::new()
            .prefix(".registry-staging")
            .tempdir_in(&parent)
            .map_err(SyncError::io(&parent))?;
        let staged = staging.path().join(UPSTREAM_REGISTRY_DIR);
        let files_copied = copy_tree(&source, &staged)?;
        tracing::info!(files = files_copied, "staged registry files");

        let staged_file = staged.join(REGISTRY_FILE);
        let bytes = fs::read(&staged_file).map_err(SyncError::io(&staged_file))?;
        let obj = self
            .parser
            .parse(&bytes, &self.api)
            .map_err(|e| SyncError::MalformedSource {
                path: source.join(REGISTRY_FILE),
                source: e,
            })?;
        let version = obj.header_version;
        tracing::info!(%version, extensions = obj.extensions.len(), "validated staged registry");

        let marker = staged.join(VERSION_FILE);
        fs::write(&marker, format!("{}\n", version)).map_err(SyncError::io(&marker))?;

        self.swap(&staged, &parent)?;
        tracing::info!(dir = %self.target.display(), %version, "registry updated");

        let manifest_updated = match &self.manifest {
            Some(manifest) => update_manifest_version(manifest, version),
            None => false,
        };

        Ok(SyncReport {
            version,
            files_copied,
            target: self.target.clone(),
            manifest_updated,
        })
    }

    fn swap(&self, staged: &Path, parent: &Path) -> Result<(), SyncError> {
        let backup_dir = tempfile::Builder::new()
            .prefix(".registry-previous")
            .tempdir_in(parent)
            .map_err(SyncError::io(parent))?;
        let backup = backup_dir.path().join("previous");

        let had_previous = self.target.exists();
        if had_previous {
            fs::rename(&self.target, &backup).map_err(SyncError::io(&self.target))?;
        }

        if let Err(source) = fs::rename(staged, &self.target) {
            if had_previous {
                if let Err(e) = fs::rename(&backup, &self.target) {
                    tracing::error!(
                        backup = %backup.display(),
                        error = %e,
                        "failed to restore previous registry"
                    );
                    // keep the old tree on disk for manual recovery
                    let _ = backup_dir.into_path();
                }
            }
            return Err(SyncError::Io {
                path: self.target.clone(),
                source,
            });
        }
        Ok(())
    }
}

/// Checks that `root` looks like a Vulkan-Headers checkout and returns its
/// registry directory.
fn locate(root: &Path) -> Result<PathBuf, SyncError> {
    let registry = root.join(UPSTREAM_REGISTRY_DIR);
    let file = registry.join(REGISTRY_FILE);

    if !root.is_dir() {
        return Err(SyncError::SourceNotFound { path: root.to_path_buf() });
    }
    if !registry.is_dir() {
        return Err(SyncError::SourceNotFound { path: registry });
    }
    if !file.is_file() {
        return Err(SyncError::SourceNotFound { path: file });
    }
    Ok(registry)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize, SyncError> {
    let mut copied = 0;

    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| from.to_path_buf(), Path::to_path_buf);
            SyncError::Io {
                path,
                source: io::Error::from(e),
            }
        })?;
        let relative = match entry.path().strip_prefix(from) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(SyncError::io(&dest))?;
        } else {
            fs::copy(entry.path(), &dest).map_err(SyncError::io(entry.path()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Reads the version marker of a registry directory. Returns `None` when the
/// directory has no marker.
pub fn read_version_marker(dir: impl AsRef<Path>) -> Result<Option<HeaderVersion>, SyncError> {
    let path = dir.as_ref().join(VERSION_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(SyncError::Io { path, source }),
    };
    match text.trim().parse() {
        Ok(version) => Ok(Some(version)),
        Err(source) => Err(SyncError::InvalidMarker { path, source }),
    }
}

/// Rewrites the first `version = "..."` line of a manifest. Problems are
/// logged and reported as `false`.
pub fn update_manifest_version(manifest: &Path, version: HeaderVersion) -> bool {
    let text = match fs::read_to_string(manifest) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(manifest = %manifest.display(), error = %e, "cannot read manifest");
            return false;
        }
    };

    let re = match Regex::new(r#"(?m)^version\s*=\s*"[^"]*""#) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(error = %e, "invalid manifest version pattern");
            return false;
        }
    };
    if !re.is_match(&text) {
        tracing::warn!(manifest = %manifest.display(), "manifest has no version line");
        return false;
    }

    let line = format!("version = \"{}\"", version);
    let updated = re.replacen(&text, 1, NoExpand(&line));
    if let Err(e) = fs::write(manifest, updated.as_bytes()) {
        tracing::warn!(manifest = %manifest.display(), error = %e, "cannot write manifest");
        return false;
    }

    tracing::info!(manifest = %manifest.display(), %version, "manifest version updated");
    true
}
