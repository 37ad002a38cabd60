//! The Vulkan API registry (`vk.xml`) bundled with this crate, exposed as a
//! typed in-memory snapshot.
//!
//! ```no_run
//! let vk = vulkan_object::get_vulkan_object()?;
//! println!("{} extensions in {}", vk.extensions.len(), vk.header_version);
//! # Ok::<(), vulkan_object::LoadError>(())
//! ```
//!
//! The bundled registry is refreshed from a Vulkan-Headers checkout with the
//! `update` binary, or programmatically through [`Synchronizer`].

#[cfg(feature = "serialize")]
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod util;
mod accessor;
mod error;
mod parse;
mod resolve;
mod sync;
mod types;

pub use accessor::{
    bundled_registry_dir, get_vulkan_object, get_vulkan_object_for, load_vulkan_object,
    reload_vulkan_object, reload_vulkan_object_for, reset_vulkan_object, RegistryLoader, RegistryParser, XmlRegistryParser, DEFAULT_API,
    REGISTRY_DIR_ENV, REGISTRY_FILE,
};
pub use error::{FatalError, LoadError, SyncError};
pub use sync::{
    read_version_marker, update_manifest_version, SyncReport, Synchronizer, UPSTREAM_REGISTRY_DIR,
    VERSION_FILE,
};
pub use types::*;
