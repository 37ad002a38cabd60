//! Turns the raw registry into a `VulkanObject` for one API: filters by the
//! `api`/`supported` attributes, computes enum values, and records which core
//! version or extensions require each item.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;

use crate::error::FatalError;
use crate::parse::*;
use crate::types::*;
use crate::util::{integer_value, split_list};

/// Values of enums added by extensions start here, with a block of 1000
/// values reserved for each extension number.
const EXTENSION_ENUM_BASE: i64 = 1_000_000_000;
const EXTENSION_ENUM_BLOCK: i64 = 1000;

const API_CONSTANTS: &str = "API Constants";

pub(crate) fn resolve(
    raw: RawRegistry,
    api: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<VulkanObject, FatalError> {
    let mut resolver = Resolver {
        api,
        obj: VulkanObject {
            api: String::from(api),
            header_version: header_version(&raw.types, api)?,
            ..VulkanObject::default()
        },
        aliases: HashMap::new(),
        removed: Vec::new(),
        diagnostics,
    };

    for platform in raw.platforms {
        resolver.obj.platforms.insert(platform.name.clone(), platform);
    }
    resolver.obj.vendor_tags = raw.tags;

    resolver.types(&raw.types, &raw.enums);
    resolver.commands(&raw.commands);
    for feature in raw.features.iter() {
        resolver.feature(feature);
    }
    for extension in raw.extensions.iter() {
        resolver.extension(extension);
    }
    resolver.remove();
    resolver.prune();
    resolver.link();

    Ok(resolver.obj)
}

fn supports(list: Option<&str>, api: &str) -> bool {
    list.map_or(true, |list| list.split(',').any(|a| a.trim() == api))
}

//--------------------------------------------------------------------------------------------------
fn header_version(types: &[RawType], api: &str) -> Result<HeaderVersion, FatalError> {
    let define = |name: &str| {
        types
            .iter()
            .find(|t| {
                t.category.as_deref() == Some("define")
                    && t.name == name
                    && supports(t.api.as_deref(), api)
            })
            .map(|t| t.code.as_str())
    };

    let patch = define("VK_HEADER_VERSION")
        .and_then(|code| captures(r"VK_HEADER_VERSION\s+(\d+)", code))
        .and_then(|c| c[0].parse::<u32>().ok())
        .ok_or(FatalError::MissingHeaderVersion("VK_HEADER_VERSION"))?;

    let complete = define("VK_HEADER_VERSION_COMPLETE")
        .ok_or(FatalError::MissingHeaderVersion("VK_HEADER_VERSION_COMPLETE"))?;

    let version = if let Some(c) = captures(
        r"VK_MAKE_API_VERSION\s*\(\s*(\w+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,",
        complete,
    ) {
        let variant = match c[0].as_str() {
            "VKSC_API_VARIANT" => Some(1),
            other => other.parse::<u32>().ok(),
        };
        variant.zip(c[1].parse().ok()).zip(c[2].parse().ok())
    } else if let Some(c) = captures(r"VK_MAKE_VERSION\s*\(\s*(\d+)\s*,\s*(\d+)\s*,", complete) {
        Some(0).zip(c[0].parse().ok()).zip(c[1].parse().ok())
    } else {
        None
    };

    match version {
        Some(((variant, major), minor)) => Ok(HeaderVersion {
            variant,
            major,
            minor,
            patch,
        }),
        None => Err(FatalError::MissingHeaderVersion("VK_HEADER_VERSION_COMPLETE")),
    }
}

fn captures(pattern: &str, text: &str) -> Option<Vec<String>> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map_or_else(String::new, |m| String::from(m.as_str())))
            .collect(),
    )
}

//--------------------------------------------------------------------------------------------------
fn normalize(code: &str) -> String {
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn array_dimensions(tail: &str) -> Vec<String> {
    tail.split('[')
        .skip(1)
        .filter_map(|s| s.split(']').next())
        .map(|s| String::from(s.trim()))
        .collect()
}

fn build_param(m: &RawMember) -> Param {
    let d = &m.decl;
    let suffix = d.suffix.trim();

    let len_parts: Vec<&str> = m
        .len
        .as_deref()
        .map(|l| l.split(',').collect())
        .unwrap_or_default();
    let null_terminated = len_parts.contains(&"null-terminated");
    let length = match &m.altlen {
        Some(altlen) => Some(altlen.clone()),
        None => {
            let length = len_parts
                .iter()
                .filter(|p| **p != "null-terminated")
                .copied()
                .collect::<Vec<_>>()
                .join(",");
            Some(length).filter(|l| !l.is_empty())
        }
    };

    let optional: Vec<&str> = m
        .optional
        .as_deref()
        .map(|o| o.split(',').collect())
        .unwrap_or_default();

    Param {
        name: d.name.clone(),
        type_name: d.type_name.clone(),
        full_type: normalize(&format!("{}{}{}", d.prefix, d.type_name, d.suffix)),
        is_const: d.prefix.contains("const"),
        pointer: suffix.contains('*'),
        length,
        null_terminated,
        fixed_size_array: array_dimensions(&d.tail),
        optional: optional.first() == Some(&"true"),
        optional_pointer: optional.get(1) == Some(&"true"),
        extern_sync: m.externsync.as_deref().map_or(false, |v| v != "false"),
        no_auto_validity: m.noautovalidity,
        c_declaration: normalize(&format!(
            "{}{}{}{}{}",
            d.prefix, d.type_name, d.suffix, d.name, d.tail
        )),
    }
}

fn build_member(m: &RawMember) -> Member {
    Member {
        param: build_param(m),
        limit_type: m.limittype.clone(),
        selector: m.selector.clone(),
        selection: m.selection.as_deref().map(split_list).unwrap_or_default(),
        bit_field_width: m
            .decl
            .tail
            .trim()
            .strip_prefix(':')
            .and_then(|w| w.trim().parse().ok()),
        values: m.values.clone(),
    }
}

fn c_prototype(return_type: &str, name: &str, params: &[Param]) -> String {
    let params = params
        .iter()
        .map(|p| p.c_declaration.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("VKAPI_ATTR {} VKAPI_CALL {}({});", return_type, name, params)
}

/// Value of an `<enum>`, either given directly or computed from `bitpos` or
/// from an extension `offset`.
fn enum_value(e: &RawEnum, extnumber: Option<i64>) -> Option<i64> {
    if let Some(offset) = e.offset {
        let extnumber = e.extnumber.or(extnumber)?;
        // out of range extension numbers or offsets have no value
        let value = extnumber
            .checked_sub(1)?
            .checked_mul(EXTENSION_ENUM_BLOCK)?
            .checked_add(EXTENSION_ENUM_BASE)?
            .checked_add(offset)?;
        if e.negative {
            value.checked_neg()
        } else {
            Some(value)
        }
    } else if let Some(bitpos) = e.bitpos {
        1u64.checked_shl(u32::try_from(bitpos).ok()?).map(|v| v as i64)
    } else {
        e.value.as_deref().and_then(integer_value)
    }
}

fn missing_alias(group: &str, item: &RawEnum) -> Diagnostic {
    Diagnostic::SchemaViolation {
        xpath: format!("/registry/enums[@name='{}']/enum[@name='{}']", group, item.name),
        desc: format!("Alias target '{}' not found.", item.alias.as_deref().unwrap_or_default()),
    }
}

fn new_flag(name: &str, value: i64, protect: Option<String>) -> Flag {
    let bits = value as u64;
    Flag {
        name: String::from(name),
        value: bits,
        multi_bit: bits.count_ones() > 1,
        zero: bits == 0,
        protect,
        ..Flag::default()
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(String::from(value));
    }
}

//--------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Handle,
    Struct,
    Enum,
    Bitmask,
    Flags,
}

/// The feature or extension a `<require>` block belongs to.
struct Requirer<'a> {
    version: Option<&'a str>,
    extension: Option<&'a str>,
    protect: Option<&'a str>,
}

impl<'a> Requirer<'a> {
    fn tag(
        &self,
        version: &mut Option<String>,
        extensions: &mut Vec<String>,
        protect: &mut Option<String>,
    ) {
        if let Some(v) = self.version {
            if version.is_none() {
                *version = Some(String::from(v));
            }
        }
        if let Some(x) = self.extension {
            push_unique(extensions, x);
            // core items are never platform specific
            if version.is_none() && protect.is_none() {
                *protect = self.protect.map(String::from);
            }
        }
    }

    fn extensions(&self) -> Vec<String> {
        self.extension.map(String::from).into_iter().collect()
    }
}

struct Resolver<'a> {
    api: &'a str,
    obj: VulkanObject,
    /// Type alias name to the name it aliases.
    aliases: HashMap<String, String>,
    removed: Vec<String>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    fn types(&mut self, types: &[RawType], enums: &[RawEnums]) {
        let api = self.api;
        let groups: HashMap<&str, &RawEnums> = enums
            .iter()
            .filter_map(|g| g.name.as_deref().map(|name| (name, g)))
            .collect();
        let mut aliases = Vec::new();

        for t in types.iter().filter(|t| supports(t.api.as_deref(), api)) {
            let category = match t.category.as_deref() {
                Some(category) => category,
                None => continue,
            };
            if let Some(alias) = &t.alias {
                aliases.push((t.name.clone(), alias.clone()));
                continue;
            }

            match category {
                "handle" => {
                    let handle = Handle {
                        name: t.name.clone(),
                        object_type: t.objtypeenum.clone().unwrap_or_default(),
                        parent: t.parent.clone(),
                        dispatchable: t.type_refs.first().map_or(false, |r| r == "VK_DEFINE_HANDLE"),
                        ..Handle::default()
                    };
                    self.obj.handles.insert(t.name.clone(), handle);
                }
                "struct" | "union" => {
                    let members: Vec<Member> = t
                        .members
                        .iter()
                        .filter(|m| supports(m.api.as_deref(), api))
                        .map(build_member)
                        .collect();
                    let s_type = members
                        .iter()
                        .find(|m| m.name == "sType")
                        .and_then(|m| m.values.clone());
                    let s = Struct {
                        name: t.name.clone(),
                        members,
                        union: category == "union",
                        returned_only: t.returned_only,
                        s_type,
                        allow_duplicate: t.allow_duplicate,
                        extends: t.struct_extends.clone(),
                        ..Struct::default()
                    };
                    self.obj.structs.insert(t.name.clone(), s);
                }
                "enum" => {
                    let group = groups.get(t.name.as_str()).copied();
                    let is_bitmask = match group.and_then(|g| g.kind.as_deref()) {
                        Some(kind) => kind == "bitmask",
                        None => t.name.contains("FlagBits"),
                    };
                    if is_bitmask {
                        let bitmask = self.bitmask(&t.name, group);
                        self.obj.bitmasks.insert(t.name.clone(), bitmask);
                    } else {
                        let e = self.enumeration(&t.name, group);
                        self.obj.enums.insert(t.name.clone(), e);
                    }
                }
                "bitmask" => {
                    let base = t.type_refs.first().cloned().unwrap_or_default();
                    let flags = Flags {
                        name: t.name.clone(),
                        bitmask_name: t.requires.clone().or_else(|| t.bitvalues.clone()),
                        bit_width: if base == "VkFlags64" { 64 } else { 32 },
                        base_flags_type: base,
                        ..Flags::default()
                    };
                    self.obj.flags.insert(t.name.clone(), flags);
                }
                _ => {}
            }
        }

        for (alias, target) in aliases {
            self.add_type_alias(alias, target);
        }

        if let Some(group) = groups.get(API_CONSTANTS) {
            self.constants(group);
        }
    }

    fn add_type_alias(&mut self, alias: String, target: String) {
        let obj = &mut self.obj;
        let aliases = if let Some(v) = obj.handles.get_mut(&target) {
            &mut v.aliases
        } else if let Some(v) = obj.structs.get_mut(&target) {
            &mut v.aliases
        } else if let Some(v) = obj.enums.get_mut(&target) {
            &mut v.aliases
        } else if let Some(v) = obj.bitmasks.get_mut(&target) {
            &mut v.aliases
        } else if let Some(v) = obj.flags.get_mut(&target) {
            &mut v.aliases
        } else {
            return;
        };
        aliases.push(alias.clone());
        self.aliases.insert(alias, target);
    }

    fn enumeration(&mut self, name: &str, group: Option<&RawEnums>) -> Enum {
        let api = self.api;
        let mut e = Enum {
            name: String::from(name),
            bit_width: 32,
            ..Enum::default()
        };
        let group = match group {
            Some(group) => group,
            None => return e,
        };
        e.bit_width = group.bitwidth.unwrap_or(32);

        for item in group.children.iter().filter(|v| supports(v.api.as_deref(), api)) {
            if let Some(target) = &item.alias {
                match e.fields.iter_mut().find(|f| f.name == *target) {
                    Some(field) => push_unique(&mut field.aliases, &item.name),
                    None => self.missing_alias(name, item),
                }
                continue;
            }
            match enum_value(item, None) {
                Some(value) => e.fields.push(EnumField {
                    name: item.name.clone(),
                    value,
                    negative: value < 0,
                    protect: item.protect.clone(),
                    ..EnumField::default()
                }),
                None => self.bad_value(name, item),
            }
        }
        e
    }

    fn bitmask(&mut self, name: &str, group: Option<&RawEnums>) -> Bitmask {
        let api = self.api;
        let mut b = Bitmask {
            name: String::from(name),
            flag_name: name.replace("FlagBits", "Flags"),
            bit_width: 32,
            ..Bitmask::default()
        };
        let group = match group {
            Some(group) => group,
            None => return b,
        };
        b.bit_width = group.bitwidth.unwrap_or(32);

        for item in group.children.iter().filter(|v| supports(v.api.as_deref(), api)) {
            if let Some(target) = &item.alias {
                match b.flags.iter_mut().find(|f| f.name == *target) {
                    Some(flag) => push_unique(&mut flag.aliases, &item.name),
                    None => self.missing_alias(name, item),
                }
                continue;
            }
            match enum_value(item, None) {
                Some(value) => b.flags.push(new_flag(&item.name, value, item.protect.clone())),
                None => self.bad_value(name, item),
            }
        }
        b
    }

    fn constants(&mut self, group: &RawEnums) {
        let api = self.api;
        for item in group.children.iter().filter(|v| supports(v.api.as_deref(), api)) {
            if let Some(target) = &item.alias {
                if let Some(c) = self.obj.constants.get_mut(target) {
                    push_unique(&mut c.aliases, &item.name);
                }
                continue;
            }
            let constant = Constant {
                name: item.name.clone(),
                type_name: item.type_name.clone().unwrap_or_default(),
                value: item.value.clone().unwrap_or_default(),
                ..Constant::default()
            };
            self.obj.constants.insert(item.name.clone(), constant);
        }
    }

    fn bad_value(&mut self, group: &str, item: &RawEnum) {
        self.diagnostics.push(Diagnostic::SchemaViolation {
            xpath: format!("/registry/enums[@name='{}']/enum[@name='{}']", group, item.name),
            desc: String::from("Unable to determine value of enum."),
        });
    }

    fn missing_alias(&mut self, group: &str, item: &RawEnum) {
        self.diagnostics.push(missing_alias(group, item));
    }

    fn commands(&mut self, commands: &[RawCommand]) {
        let api = self.api;
        let mut aliases = Vec::new();

        for c in commands.iter().filter(|c| supports(c.api.as_deref(), api)) {
            if let Some(target) = &c.alias {
                aliases.push((c.name.clone(), target.clone()));
                continue;
            }

            let proto = &c.proto;
            let return_type = normalize(&format!("{}{}{}", proto.prefix, proto.type_name, proto.suffix));
            let params: Vec<Param> = c
                .params
                .iter()
                .filter(|p| supports(p.api.as_deref(), api))
                .map(build_param)
                .collect();

            let command = Command {
                name: c.name.clone(),
                c_prototype: c_prototype(&return_type, &c.name, &params),
                return_type,
                params,
                queues: c.queues.clone(),
                tasks: c.tasks.clone(),
                allow_no_queues: c.allow_no_queues,
                success_codes: c.successcodes.clone(),
                error_codes: c.errorcodes.clone(),
                primary: c.cmdbufferlevel.iter().any(|l| l == "primary"),
                secondary: c.cmdbufferlevel.iter().any(|l| l == "secondary"),
                render_pass: c.renderpass.as_deref().and_then(|v| v.parse().ok()),
                video_coding: c.videocoding.as_deref().and_then(|v| v.parse().ok()),
                implicit_extern_sync_params: c.implicit_extern_sync_params.clone(),
                ..Command::default()
            };
            self.obj.commands.insert(c.name.clone(), command);
        }

        for (name, target) in aliases {
            let mut command = match self.obj.commands.get(&target) {
                Some(command) => command.clone(),
                None => continue,
            };
            command.c_prototype = c_prototype(&command.return_type, &name, &command.params);
            command.name = name.clone();
            command.alias = Some(target);
            self.obj.commands.insert(name, command);
        }
    }

    //----------------------------------------------------------------------------------------------
    fn require_type(&mut self, name: &str, by: &Requirer) -> Option<(Kind, String)> {
        let name = self.aliases.get(name).map_or(name, String::as_str).to_string();
        let obj = &mut self.obj;

        if let Some(v) = obj.handles.get_mut(&name) {
            by.tag(&mut v.version, &mut v.extensions, &mut v.protect);
            return Some((Kind::Handle, name));
        }
        if let Some(v) = obj.structs.get_mut(&name) {
            by.tag(&mut v.version, &mut v.extensions, &mut v.protect);
            return Some((Kind::Struct, name));
        }
        if let Some(v) = obj.enums.get_mut(&name) {
            by.tag(&mut v.version, &mut v.extensions, &mut v.protect);
            return Some((Kind::Enum, name));
        }
        if let Some(v) = obj.bitmasks.get_mut(&name) {
            by.tag(&mut v.version, &mut v.extensions, &mut v.protect);
            return Some((Kind::Bitmask, name));
        }
        if let Some(v) = obj.flags.get_mut(&name) {
            by.tag(&mut v.version, &mut v.extensions, &mut v.protect);
            return Some((Kind::Flags, name));
        }
        None
    }

    fn require_command(&mut self, name: &str, by: &Requirer) -> bool {
        match self.obj.commands.get_mut(name) {
            Some(v) => {
                by.tag(&mut v.version, &mut v.extensions, &mut v.protect);
                true
            }
            None => false,
        }
    }

    /// Adds the value of an `<enum extends="...">` to the enum or bitmask it
    /// extends. Returns the kind and name of the extended type.
    fn require_enum(&mut self, e: &RawEnum, extnumber: Option<i64>, by: &Requirer) -> Option<(Kind, String)> {
        let target = e.extends.as_deref()?;
        let target = self.aliases.get(target).map_or(target, String::as_str).to_string();
        let protect = e.protect.clone().or_else(|| by.protect.map(String::from));

        if self.obj.enums.contains_key(&target) {
            let value = match &e.alias {
                Some(_) => None,
                None => Some(enum_value(e, extnumber)),
            };
            if value == Some(None) {
                self.bad_value(&target, e);
                return None;
            }
            let fields = &mut self.obj.enums.get_mut(&target)?.fields;

            if let Some(alias_of) = &e.alias {
                match fields.iter_mut().find(|f| f.name == *alias_of) {
                    Some(field) => push_unique(&mut field.aliases, &e.name),
                    None => {
                        self.diagnostics.push(missing_alias(&target, e));
                        return None;
                    }
                }
            } else if let Some(field) = fields.iter_mut().find(|f| f.name == e.name) {
                if let Some(x) = by.extension {
                    push_unique(&mut field.extensions, x);
                }
            } else if let Some(Some(value)) = value {
                fields.push(EnumField {
                    name: e.name.clone(),
                    value,
                    negative: value < 0,
                    protect,
                    extensions: by.extensions(),
                    ..EnumField::default()
                });
            }
            return Some((Kind::Enum, target));
        }

        if self.obj.bitmasks.contains_key(&target) {
            let value = match &e.alias {
                Some(_) => None,
                None => Some(enum_value(e, extnumber)),
            };
            if value == Some(None) {
                self.bad_value(&target, e);
                return None;
            }
            let flags = &mut self.obj.bitmasks.get_mut(&target)?.flags;

            if let Some(alias_of) = &e.alias {
                match flags.iter_mut().find(|f| f.name == *alias_of) {
                    Some(flag) => push_unique(&mut flag.aliases, &e.name),
                    None => {
                        self.diagnostics.push(missing_alias(&target, e));
                        return None;
                    }
                }
            } else if let Some(flag) = flags.iter_mut().find(|f| f.name == e.name) {
                if let Some(x) = by.extension {
                    push_unique(&mut flag.extensions, x);
                }
            } else if let Some(Some(value)) = value {
                let mut flag = new_flag(&e.name, value, protect);
                flag.extensions = by.extensions();
                flags.push(flag);
            }
            return Some((Kind::Bitmask, target));
        }

        None
    }

    fn feature(&mut self, f: &RawFeature) {
        let api = self.api;
        if !f.api.iter().any(|a| a == api) {
            return;
        }

        let version = Version {
            name: f.name.clone(),
            name_api: f.name.replacen("_VERSION_", "_API_VERSION_", 1),
            number: f.number.clone(),
        };
        self.obj.versions.insert(f.name.clone(), version);

        let by = Requirer {
            version: Some(f.name.as_str()),
            extension: None,
            protect: None,
        };
        for require in f.requires.iter().filter(|r| supports(r.api.as_deref(), api)) {
            for item in require.items.iter() {
                match item {
                    RawRequireItem::Type(name) => {
                        self.require_type(name, &by);
                    }
                    RawRequireItem::Command(name) => {
                        self.require_command(name, &by);
                    }
                    RawRequireItem::Enum(e) => {
                        if e.extends.is_some() {
                            self.require_enum(e, None, &by);
                        }
                    }
                }
            }
        }
        self.collect_removed(&f.removes);
    }

    fn extension(&mut self, x: &RawExtension) {
        let api = self.api;
        if !x.supported.iter().any(|a| a == api) {
            return;
        }

        let protect = x
            .platform
            .as_ref()
            .and_then(|p| self.obj.platforms.get(p))
            .map(|p| p.protect.clone());
        let vendor_tag = x
            .name
            .split('_')
            .nth(1)
            .filter(|tag| self.obj.vendor_tags.iter().any(|v| v.as_str() == *tag))
            .map(String::from);

        let mut ext = Extension {
            name: x.name.clone(),
            number: u32::try_from(x.number).unwrap_or_default(),
            kind: match x.kind.as_deref() {
                Some("device") => ExtensionKind::Device,
                _ => ExtensionKind::Instance,
            },
            depends: x.depends.clone(),
            vendor_tag,
            platform: x.platform.clone(),
            protect: protect.clone(),
            provisional: x.provisional,
            ratified: x.ratified.iter().any(|a| a == api),
            promoted_to: x.promotedto.clone(),
            deprecated_by: x.deprecatedby.clone(),
            obsoleted_by: x.obsoletedby.clone(),
            special_use: x.specialuse.clone(),
            ..Extension::default()
        };

        let by = Requirer {
            version: None,
            extension: Some(x.name.as_str()),
            protect: protect.as_deref(),
        };
        for require in x.requires.iter().filter(|r| supports(r.api.as_deref(), api)) {
            for item in require.items.iter() {
                match item {
                    RawRequireItem::Type(name) => {
                        if let Some((kind, name)) = self.require_type(name, &by) {
                            let list = match kind {
                                Kind::Handle => &mut ext.handles,
                                Kind::Struct => &mut ext.structs,
                                Kind::Enum => &mut ext.enums,
                                Kind::Bitmask => &mut ext.bitmasks,
                                Kind::Flags => &mut ext.flags,
                            };
                            push_unique(list, &name);
                        }
                    }
                    RawRequireItem::Command(name) => {
                        if self.require_command(name, &by) {
                            push_unique(&mut ext.commands, name);
                        }
                    }
                    RawRequireItem::Enum(e) if e.extends.is_some() => {
                        let added = self.require_enum(e, Some(x.number), &by);
                        if let (Some((kind, target)), None) = (added, &e.alias) {
                            let added_to = match kind {
                                Kind::Bitmask => &mut ext.flag_bits,
                                _ => &mut ext.enum_fields,
                            };
                            push_unique(added_to.entry(target).or_default(), &e.name);
                        }
                    }
                    RawRequireItem::Enum(e) => {
                        if e.name.ends_with("_SPEC_VERSION") {
                            ext.spec_version = e
                                .value
                                .as_deref()
                                .and_then(integer_value)
                                .and_then(|v| u32::try_from(v).ok())
                                .unwrap_or_default();
                        } else if e.name.ends_with("_EXTENSION_NAME") {
                            if let Some(value) = &e.value {
                                ext.name_string = String::from(value.trim_matches('"'));
                            }
                        }
                    }
                }
            }
        }
        self.collect_removed(&x.removes);

        self.obj.extensions.insert(x.name.clone(), ext);
    }

    fn collect_removed(&mut self, removes: &[RawRequire]) {
        let api = self.api;
        for remove in removes.iter().filter(|r| supports(r.api.as_deref(), api)) {
            for item in remove.items.iter() {
                match item {
                    RawRequireItem::Type(name) | RawRequireItem::Command(name) => {
                        self.removed.push(name.clone())
                    }
                    RawRequireItem::Enum(_) => {}
                }
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    fn remove(&mut self) {
        let obj = &mut self.obj;
        for name in self.removed.iter() {
            obj.handles.shift_remove(name);
            obj.structs.shift_remove(name);
            obj.enums.shift_remove(name);
            obj.bitmasks.shift_remove(name);
            obj.flags.shift_remove(name);
            obj.commands.shift_remove(name);
        }
    }

    /// Drops everything no kept feature or extension asked for.
    fn prune(&mut self) {
        macro_rules! retain_required {
            ($($map:ident),+) => {
                $(
                    self.obj.$map.retain(|_, v| v.version.is_some() || !v.extensions.is_empty());
                )+
            };
        }
        retain_required!(handles, structs, enums, bitmasks, flags, commands);
    }

    /// Fills in fields derived from relations between items.
    fn link(&mut self) {
        let obj = &mut self.obj;

        let mut extended_by: IndexMap<String, Vec<String>> = IndexMap::new();
        for s in obj.structs.values() {
            for target in s.extends.iter() {
                extended_by.entry(target.clone()).or_default().push(s.name.clone());
            }
        }
        for (target, sources) in extended_by {
            if let Some(s) = obj.structs.get_mut(&target) {
                s.extended_by = sources;
            }
        }

        let levels: Vec<(bool, bool)> = obj
            .handles
            .keys()
            .map(|name| handle_level(&obj.handles, name))
            .collect();
        for (handle, (instance, device)) in obj.handles.values_mut().zip(levels) {
            handle.instance = instance;
            handle.device = device;
        }

        let levels: Vec<(bool, bool)> = obj
            .commands
            .values()
            .map(|c| match c.params.first() {
                Some(p) if obj.handles.contains_key(&p.type_name) => handle_level(&obj.handles, &p.type_name),
                _ => (false, false),
            })
            .collect();
        for (command, (instance, device)) in obj.commands.values_mut().zip(levels) {
            command.instance = instance;
            command.device = device;
        }
    }
}

/// Walks the parent chain of a handle. Returns `(instance, device)`.
fn handle_level(handles: &IndexMap<String, Handle>, name: &str) -> (bool, bool) {
    let mut current = name;
    for _ in 0..=handles.len() {
        match current {
            "VkDevice" => return (false, true),
            "VkInstance" => return (true, false),
            _ => {}
        }
        match handles.get(current).and_then(|h| h.parent.as_deref()) {
            Some(parent) => current = parent.split(',').next().unwrap_or(parent),
            None => break,
        }
    }
    (false, false)
}
