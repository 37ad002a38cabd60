use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Problems from which the parser can recover. The affected attribute or
/// element is skipped and parsing continues with its next sibling, so the
/// resulting snapshot is missing whatever the skipped markup described.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Diagnostic {
    #[error("{xpath}: unexpected element <{name}>")]
    UnexpectedElement { xpath: String, name: String },

    #[error("{xpath}: unexpected attribute '{name}'")]
    UnexpectedAttribute { xpath: String, name: String },

    #[error("{xpath}: unexpected value '{value}' of attribute '{name}'")]
    UnexpectedAttributeValue {
        xpath: String,
        name: String,
        value: String,
    },

    #[error("{xpath}: missing element <{name}>")]
    MissingElement { xpath: String, name: String },

    #[error("{xpath}: missing attribute '{name}'")]
    MissingAttribute { xpath: String, name: String },

    #[error("{xpath}: {desc}")]
    SchemaViolation { xpath: String, desc: String },

    #[error("{xpath}: {desc}")]
    Internal { xpath: String, desc: &'static str },
}

/// Version of the Vulkan headers a registry was published with, as encoded by
/// the `VK_HEADER_VERSION` and `VK_HEADER_VERSION_COMPLETE` defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct HeaderVersion {
    /// Variant from `VK_MAKE_API_VERSION`; 0 for Vulkan, 1 for Vulkan SC.
    pub variant: u32,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HeaderVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> HeaderVersion {
        HeaderVersion {
            variant: 0,
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for HeaderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a version of the form MAJOR.MINOR.PATCH")]
pub struct ParseHeaderVersionError(String);

impl FromStr for HeaderVersion {
    type Err = ParseHeaderVersionError;

    fn from_str(s: &str) -> Result<HeaderVersion, ParseHeaderVersionError> {
        let err = || ParseHeaderVersionError(String::from(s));
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, ParseHeaderVersionError> {
            parts.next().ok_or_else(err)?.parse().map_err(|_| err())
        };
        let version = HeaderVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

/// Rust structure representing the Vulkan registry, filtered for one API.
///
/// Every map preserves the order in which the registry declares its items.
/// Items appear only when a feature (core version) or a supported extension
/// requires them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct VulkanObject {
    /// API the snapshot was resolved for, e.g. `vulkan` or `vulkansc`.
    pub api: String,

    pub header_version: HeaderVersion,

    /// Core versions, keyed by feature name such as `VK_VERSION_1_1`.
    pub versions: IndexMap<String, Version>,

    pub extensions: IndexMap<String, Extension>,

    pub handles: IndexMap<String, Handle>,

    /// Commands are the Vulkan API's name for functions. Aliased commands get
    /// their own entry.
    pub commands: IndexMap<String, Command>,

    /// Structures and unions.
    pub structs: IndexMap<String, Struct>,

    pub enums: IndexMap<String, Enum>,

    /// `VkXxxFlagBits` enumerations.
    pub bitmasks: IndexMap<String, Bitmask>,

    /// `VkXxxFlags` typedefs.
    pub flags: IndexMap<String, Flags>,

    /// Contents of the `API Constants` enums block.
    pub constants: IndexMap<String, Constant>,

    /// Windowing systems, keyed by short name.
    pub platforms: IndexMap<String, Platform>,

    /// Suffixes such as `KHR` or `EXT` identifying extension authors.
    pub vendor_tags: Vec<String>,
}

/// Feature level of the API, such as Vulkan 1.0 or 1.1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Version {
    /// `VK_VERSION_1_1`
    pub name: String,
    /// `VK_API_VERSION_1_1`
    pub name_api: String,
    /// `1.1`
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ExtensionKind {
    #[default]
    Instance,
    Device,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Extension {
    /// `VK_KHR_surface`
    pub name: String,
    /// Value of the `*_EXTENSION_NAME` enum with its quotes removed.
    pub name_string: String,
    /// Value of the `*_SPEC_VERSION` enum.
    pub spec_version: u32,
    pub number: u32,
    pub kind: ExtensionKind,
    /// Dependency expression, e.g. `VK_KHR_surface+VK_KHR_get_surface_capabilities2`.
    pub depends: Option<String>,
    /// Author suffix taken from the name (`KHR` for `VK_KHR_surface`).
    pub vendor_tag: Option<String>,
    pub platform: Option<String>,
    /// Preprocessor guard of the extension's platform.
    pub protect: Option<String>,
    pub provisional: bool,
    /// Whether the extension is ratified for the snapshot's API.
    pub ratified: bool,
    pub promoted_to: Option<String>,
    pub deprecated_by: Option<String>,
    pub obsoleted_by: Option<String>,
    pub special_use: Vec<String>,

    pub handles: Vec<String>,
    pub commands: Vec<String>,
    pub structs: Vec<String>,
    pub enums: Vec<String>,
    pub bitmasks: Vec<String>,
    pub flags: Vec<String>,
    /// Fields this extension adds to existing enums, keyed by enum name.
    pub enum_fields: IndexMap<String, Vec<String>>,
    /// Flags this extension adds to existing bitmasks, keyed by bitmask name.
    pub flag_bits: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Handle {
    pub name: String,
    pub aliases: Vec<String>,
    /// `VK_OBJECT_TYPE_*` enum naming this handle type.
    pub object_type: String,
    pub parent: Option<String>,
    /// `VK_DEFINE_HANDLE` rather than `VK_DEFINE_NON_DISPATCHABLE_HANDLE`.
    pub dispatchable: bool,
    /// Owned by the instance (parent chain ends at `VkInstance`).
    pub instance: bool,
    /// Owned by a device (parent chain passes through `VkDevice`).
    pub device: bool,
    pub protect: Option<String>,
    pub version: Option<String>,
    pub extensions: Vec<String>,
}

/// Shared shape of command parameters and structure members.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Param {
    pub name: String,
    /// Base type without qualifiers, e.g. `VkInstanceCreateInfo`.
    pub type_name: String,
    /// Type with qualifiers and pointers, e.g. `const VkInstanceCreateInfo*`.
    pub full_type: String,
    pub is_const: bool,
    pub pointer: bool,
    /// Value of the `len` attribute with `null-terminated` removed.
    pub length: Option<String>,
    pub null_terminated: bool,
    /// Array dimensions, e.g. `["4"]` or `["VK_UUID_SIZE"]`.
    pub fixed_size_array: Vec<String>,
    /// The value itself may be null or zero.
    pub optional: bool,
    /// For pointers, whether the pointee may be absent (`optional="false,true"`).
    pub optional_pointer: bool,
    pub extern_sync: bool,
    pub no_auto_validity: bool,
    /// Declaration as it appears in C, e.g. `const char* pApplicationName`.
    pub c_declaration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Member {
    pub param: Param,
    pub limit_type: Option<String>,
    pub selector: Option<String>,
    pub selection: Vec<String>,
    pub bit_field_width: Option<u32>,
    /// Fixed value of the member, set on `sType` members.
    pub values: Option<String>,
}

impl std::ops::Deref for Member {
    type Target = Param;

    fn deref(&self) -> &Param {
        &self.param
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CommandScope {
    Inside,
    Outside,
    Both,
}

impl FromStr for CommandScope {
    type Err = ();

    fn from_str(s: &str) -> Result<CommandScope, ()> {
        match s {
            "inside" => Ok(CommandScope::Inside),
            "outside" => Ok(CommandScope::Outside),
            "both" => Ok(CommandScope::Both),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Command {
    pub name: String,
    /// For alias entries, the name of the command being aliased.
    pub alias: Option<String>,
    pub return_type: String,
    pub params: Vec<Param>,
    /// First parameter is an instance-level handle.
    pub instance: bool,
    /// First parameter is a device-level handle.
    pub device: bool,
    pub queues: Vec<String>,
    pub tasks: Vec<String>,
    pub allow_no_queues: bool,
    pub success_codes: Vec<String>,
    pub error_codes: Vec<String>,
    /// Recordable in primary command buffers.
    pub primary: bool,
    /// Recordable in secondary command buffers.
    pub secondary: bool,
    pub render_pass: Option<CommandScope>,
    pub video_coding: Option<CommandScope>,
    pub implicit_extern_sync_params: Vec<String>,
    /// `VKAPI_ATTR VkResult VKAPI_CALL vkCreateInstance(...);`
    pub c_prototype: String,
    pub protect: Option<String>,
    pub version: Option<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Struct {
    pub name: String,
    pub aliases: Vec<String>,
    pub members: Vec<Member>,
    pub union: bool,
    pub returned_only: bool,
    /// `VK_STRUCTURE_TYPE_*` value of the `sType` member.
    pub s_type: Option<String>,
    pub allow_duplicate: bool,
    /// Structures this one can be chained into via `pNext`.
    pub extends: Vec<String>,
    /// Structures that can be chained into this one.
    pub extended_by: Vec<String>,
    pub protect: Option<String>,
    pub version: Option<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct EnumField {
    pub name: String,
    pub aliases: Vec<String>,
    pub value: i64,
    pub negative: bool,
    pub protect: Option<String>,
    /// Extensions which add this field; empty for core fields.
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Enum {
    pub name: String,
    pub aliases: Vec<String>,
    pub bit_width: u32,
    pub fields: Vec<EnumField>,
    pub protect: Option<String>,
    pub version: Option<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Flag {
    pub name: String,
    pub aliases: Vec<String>,
    pub value: u64,
    /// Value is a combination of several bits.
    pub multi_bit: bool,
    /// Value is zero.
    pub zero: bool,
    pub protect: Option<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Bitmask {
    /// `VkCullModeFlagBits`
    pub name: String,
    pub aliases: Vec<String>,
    /// `VkCullModeFlags`
    pub flag_name: String,
    pub bit_width: u32,
    pub flags: Vec<Flag>,
    pub protect: Option<String>,
    pub version: Option<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Flags {
    /// `VkCullModeFlags`
    pub name: String,
    pub aliases: Vec<String>,
    /// Bitmask providing the values, absent for reserved flags.
    pub bitmask_name: Option<String>,
    /// `VkFlags` or `VkFlags64`
    pub base_flags_type: String,
    pub bit_width: u32,
    pub protect: Option<String>,
    pub version: Option<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Constant {
    pub name: String,
    pub aliases: Vec<String>,
    pub type_name: String,
    /// Value as written in the registry, e.g. `256` or `(~0U)`.
    pub value: String,
}

/// A platform refers to a windowing system which Vulkan can use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Platform {
    pub name: String,
    /// C macro name which is used to guard platform-specific definitions.
    pub protect: String,
}
