use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{FatalError, LoadError};
use crate::parse::parse_stream;
use crate::resolve::resolve;
use crate::types::{Diagnostic, VulkanObject};

/// Name of the registry document inside a registry directory.
pub const REGISTRY_FILE: &str = "vk.xml";

/// API used when none is requested explicitly.
pub const DEFAULT_API: &str = "vulkan";

/// Overrides the location of the bundled registry directory.
pub const REGISTRY_DIR_ENV: &str = "VULKAN_OBJECT_REGISTRY_DIR";

/// Directory holding the bundled `vk.xml` and its companions.
pub fn bundled_registry_dir() -> PathBuf {
    match env::var_os(REGISTRY_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/registry")),
    }
}

//--------------------------------------------------------------------------------------------------
/// Turns the raw bytes of a registry document into a snapshot.
pub trait RegistryParser {
    fn parse(&self, source: &[u8], api: &str) -> Result<VulkanObject, FatalError>;
}

/// Parser for the upstream XML registry format.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlRegistryParser;

impl XmlRegistryParser {
    /// Same as `parse`, but also returns everything the parser had to skip or
    /// could not interpret.
    pub fn parse_with_diagnostics(
        &self,
        source: &[u8],
        api: &str,
    ) -> Result<(VulkanObject, Vec<Diagnostic>), FatalError> {
        let (raw, mut diagnostics) = parse_stream(source)?;
        let obj = resolve(raw, api, &mut diagnostics)?;
        Ok((obj, diagnostics))
    }
}

impl RegistryParser for XmlRegistryParser {
    fn parse(&self, source: &[u8], api: &str) -> Result<VulkanObject, FatalError> {
        let (obj, diagnostics) = self.parse_with_diagnostics(source, api)?;
        for d in diagnostics.iter() {
            tracing::debug!(diagnostic = %d, "registry diagnostic");
        }
        if !diagnostics.is_empty() {
            tracing::warn!(count = diagnostics.len(), "registry parsed with diagnostics");
        }
        Ok(obj)
    }
}

impl<P: RegistryParser + ?Sized> RegistryParser for &P {
    fn parse(&self, source: &[u8], api: &str) -> Result<VulkanObject, FatalError> {
        (**self).parse(source, api)
    }
}

//--------------------------------------------------------------------------------------------------
/// Loads a snapshot from a registry on disk. Every call to `load` reads the
/// file again.
#[derive(Debug, Clone)]
pub struct RegistryLoader<P = XmlRegistryParser> {
    source: PathBuf,
    api: String,
    parser: P,
}

impl RegistryLoader {
    /// `path` is either a registry directory or the registry file itself.
    pub fn new(path: impl Into<PathBuf>) -> RegistryLoader {
        let path = path.into();
        let source = if path.is_dir() {
            path.join(REGISTRY_FILE)
        } else {
            path
        };
        RegistryLoader {
            source,
            api: String::from(DEFAULT_API),
            parser: XmlRegistryParser,
        }
    }

    pub fn bundled() -> RegistryLoader {
        RegistryLoader::new(bundled_registry_dir().join(REGISTRY_FILE))
    }
}

impl<P: RegistryParser> RegistryLoader<P> {
    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    pub fn with_parser<Q: RegistryParser>(self, parser: Q) -> RegistryLoader<Q> {
        RegistryLoader {
            source: self.source,
            api: self.api,
            parser,
        }
    }

    pub fn source_file(&self) -> &Path {
        &self.source
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn load(&self) -> Result<VulkanObject, LoadError> {
        let bytes = fs::read(&self.source).map_err(|source| LoadError::SourceUnavailable {
            path: self.source.clone(),
            source,
        })?;
        let obj = self
            .parser
            .parse(&bytes, &self.api)
            .map_err(|source| LoadError::MalformedSource {
                path: self.source.clone(),
                source,
            })?;
        tracing::info!(
            path = %self.source.display(),
            api = %obj.api,
            version = %obj.header_version,
            extensions = obj.extensions.len(),
            "loaded registry snapshot"
        );
        Ok(obj)
    }
}

//--------------------------------------------------------------------------------------------------
/// Cached snapshots of the bundled registry, one per API.
static SNAPSHOTS: RwLock<BTreeMap<String, Arc<VulkanObject>>> = RwLock::new(BTreeMap::new());

/// Loads a snapshot from `path` without touching the process-wide cache.
pub fn load_vulkan_object(path: impl AsRef<Path>) -> Result<VulkanObject, LoadError> {
    RegistryLoader::new(path.as_ref()).load()
}

/// Returns the snapshot of the bundled registry for [`DEFAULT_API`].
pub fn get_vulkan_object() -> Result<Arc<VulkanObject>, LoadError> {
    get_vulkan_object_for(DEFAULT_API)
}

/// Returns the snapshot of the bundled registry for `api`. The first
/// successful call per API loads it; later calls share the same `Arc`. A
/// failed load is not cached.
pub fn get_vulkan_object_for(api: &str) -> Result<Arc<VulkanObject>, LoadError> {
    if let Some(obj) = SNAPSHOTS.read().unwrap_or_else(PoisonError::into_inner).get(api) {
        return Ok(Arc::clone(obj));
    }

    let mut cached = SNAPSHOTS.write().unwrap_or_else(PoisonError::into_inner);
    // another thread may have loaded it while we waited for the write lock
    if let Some(obj) = cached.get(api) {
        return Ok(Arc::clone(obj));
    }
    let obj = Arc::new(RegistryLoader::bundled().with_api(api).load()?);
    cached.insert(String::from(api), Arc::clone(&obj));
    Ok(obj)
}

/// Reads the bundled registry again and replaces the cached snapshot for
/// [`DEFAULT_API`].
pub fn reload_vulkan_object() -> Result<Arc<VulkanObject>, LoadError> {
    reload_vulkan_object_for(DEFAULT_API)
}

/// Reads the bundled registry again and replaces the cached snapshot for
/// `api`. On failure the previous snapshot stays cached. Other APIs keep
/// their snapshots.
pub fn reload_vulkan_object_for(api: &str) -> Result<Arc<VulkanObject>, LoadError> {
    let obj = Arc::new(RegistryLoader::bundled().with_api(api).load()?);
    SNAPSHOTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(String::from(api), Arc::clone(&obj));
    Ok(obj)
}

/// Drops the cached snapshots of every API; the next `get_vulkan_object`
/// loads from disk.
pub fn reset_vulkan_object() {
    SNAPSHOTS.write().unwrap_or_else(PoisonError::into_inner).clear();
}
