//! Prints a short summary of the bundled registry, or of the registry
//! directory passed as the first argument.

use vulkan_object::{get_vulkan_object, load_vulkan_object, LoadError};

fn main() -> Result<(), LoadError> {
    let vk = match std::env::args_os().nth(1) {
        Some(path) => std::sync::Arc::new(load_vulkan_object(path)?),
        None => get_vulkan_object()?,
    };

    println!("Vulkan header version {}", vk.header_version);
    println!("{} core versions", vk.versions.len());
    println!("{} extensions", vk.extensions.len());
    println!("{} commands", vk.commands.len());
    println!("{} structs", vk.structs.len());
    Ok(())
}
