//! Streaming pass over `vk.xml`. Produces the registry close to its XML
//! shape; interpretation happens in `resolve`.

use std::io::Read;
use xml::reader::XmlEvent;

use crate::error::FatalError;
use crate::types::{Diagnostic, Platform};
use crate::util::*;

//--------------------------------------------------------------------------------------------------
#[derive(Debug, Default)]
pub(crate) struct RawRegistry {
    pub platforms: Vec<Platform>,
    pub tags: Vec<String>,
    pub types: Vec<RawType>,
    pub enums: Vec<RawEnums>,
    pub commands: Vec<RawCommand>,
    pub features: Vec<RawFeature>,
    pub extensions: Vec<RawExtension>,
}

#[derive(Debug, Default)]
pub(crate) struct RawType {
    pub api: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub alias: Option<String>,
    pub requires: Option<String>,
    pub bitvalues: Option<String>,
    pub parent: Option<String>,
    pub objtypeenum: Option<String>,
    pub returned_only: bool,
    pub struct_extends: Vec<String>,
    pub allow_duplicate: bool,
    /// Character data of the element with markup stripped.
    pub code: String,
    /// Contents of `<type>` children, e.g. `VK_DEFINE_HANDLE` or `VkFlags`.
    pub type_refs: Vec<String>,
    pub members: Vec<RawMember>,
}

/// A C declaration split around its `<type>` and `<name>` markup:
/// `{prefix}{type_name}{suffix}{name}{tail}`.
#[derive(Debug, Default, Clone)]
pub(crate) struct RawDecl {
    pub prefix: String,
    pub type_name: String,
    pub suffix: String,
    pub name: String,
    pub tail: String,
}

/// A struct `<member>` or command `<param>`.
#[derive(Debug, Default, Clone)]
pub(crate) struct RawMember {
    pub api: Option<String>,
    pub len: Option<String>,
    pub altlen: Option<String>,
    pub optional: Option<String>,
    pub externsync: Option<String>,
    pub noautovalidity: bool,
    pub values: Option<String>,
    pub limittype: Option<String>,
    pub selector: Option<String>,
    pub selection: Option<String>,
    pub decl: RawDecl,
}

#[derive(Debug, Default)]
pub(crate) struct RawEnums {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub bitwidth: Option<u32>,
    pub children: Vec<RawEnum>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct RawEnum {
    pub api: Option<String>,
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<String>,
    pub bitpos: Option<i64>,
    pub offset: Option<i64>,
    pub extnumber: Option<i64>,
    pub negative: bool,
    pub extends: Option<String>,
    pub alias: Option<String>,
    pub protect: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct RawCommand {
    pub api: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub proto: RawDecl,
    pub params: Vec<RawMember>,
    pub queues: Vec<String>,
    pub tasks: Vec<String>,
    pub allow_no_queues: bool,
    pub successcodes: Vec<String>,
    pub errorcodes: Vec<String>,
    pub renderpass: Option<String>,
    pub videocoding: Option<String>,
    pub cmdbufferlevel: Vec<String>,
    pub implicit_extern_sync_params: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum RawRequireItem {
    Type(String),
    Command(String),
    Enum(RawEnum),
}

#[derive(Debug, Default)]
pub(crate) struct RawRequire {
    pub api: Option<String>,
    pub items: Vec<RawRequireItem>,
}

#[derive(Debug, Default)]
pub(crate) struct RawFeature {
    pub api: Vec<String>,
    pub name: String,
    pub number: String,
    pub requires: Vec<RawRequire>,
    pub removes: Vec<RawRequire>,
}

#[derive(Debug, Default)]
pub(crate) struct RawExtension {
    pub name: String,
    pub number: i64,
    pub kind: Option<String>,
    pub supported: Vec<String>,
    pub ratified: Vec<String>,
    pub depends: Option<String>,
    pub platform: Option<String>,
    pub provisional: bool,
    pub promotedto: Option<String>,
    pub deprecatedby: Option<String>,
    pub obsoletedby: Option<String>,
    pub specialuse: Vec<String>,
    pub requires: Vec<RawRequire>,
    pub removes: Vec<RawRequire>,
}

//--------------------------------------------------------------------------------------------------
/// Parses registry XML from a stream. Recoverable problems are returned next
/// to the registry instead of aborting the parse.
pub(crate) fn parse_stream<T: Read>(stream: T) -> Result<(RawRegistry, Vec<Diagnostic>), FatalError> {
    let parser = xml::reader::ParserConfig::new().create_reader(stream);
    parse_xml(parser.into_iter())
}

fn parse_xml<R: Read>(events: XmlEvents<R>) -> Result<(RawRegistry, Vec<Diagnostic>), FatalError> {
    let mut ctx = ParseCtx::new(events);
    let mut result = None;

    {
        let ctx = &mut ctx;
        match_elements! {ctx, attributes,
            "registry" => result = Some(parse_registry(ctx))
        }
    }

    if let Some(e) = ctx.fatal {
        return Err(FatalError::Xml(e));
    }
    match result {
        Some(registry) => Ok((registry, ctx.diagnostics)),
        None => Err(FatalError::MissingRegistryElement),
    }
}

fn parse_registry<R: Read>(ctx: &mut ParseCtx<R>) -> RawRegistry {
    let mut registry = RawRegistry::default();

    match_elements! {ctx, attributes,
        "platforms" => {
            match_elements!{ctx, attributes,
                "platform" => if let Some(v) = parse_platform(ctx, attributes) {
                    registry.platforms.push(v);
                }
            }
        },
        "tags" => {
            match_elements!{ctx, attributes,
                "tag" => if let Some(v) = parse_tag(ctx, attributes) {
                    registry.tags.push(v);
                }
            }
        },
        "types" => {
            match_elements!{ctx, attributes,
                "type" => if let Some(v) = parse_type(ctx, attributes) {
                    registry.types.push(v);
                },
                "comment" => consume_current_element(ctx)
            }
        },
        "enums" => registry.enums.push(parse_enums(ctx, attributes)),
        "commands" => {
            match_elements!{ctx, attributes,
                "command" => if let Some(v) = parse_command(ctx, attributes) {
                    registry.commands.push(v);
                }
            }
        },
        "feature" => if let Some(v) = parse_feature(ctx, attributes) {
            registry.features.push(v);
        },
        "extensions" => {
            match_elements!{ctx, attributes,
                "extension" => if let Some(v) = parse_extension(ctx, attributes) {
                    registry.extensions.push(v);
                }
            }
        },
        "comment" | "vendorids" | "formats" | "spirvextensions" | "spirvcapabilities" | "sync"
            | "videocodecs" => consume_current_element(ctx)
    }

    registry
}

fn parse_platform<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Platform> {
    let mut name = None;
    let mut protect = None;

    match_attributes! {ctx, a in attributes,
        "name"    => name    = Some(a.value),
        "protect" => protect = Some(a.value),
        "comment" => ()
    }

    unwrap_attribute!(ctx, name);
    unwrap_attribute!(ctx, protect);
    consume_current_element(ctx);

    Some(Platform { name, protect })
}

fn parse_tag<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<String> {
    let mut name = None;

    match_attributes! {ctx, a in attributes,
        "name" => name = Some(a.value),
        "author" | "contact" => ()
    }

    unwrap_attribute!(ctx, name);
    consume_current_element(ctx);

    Some(name)
}

fn parse_type<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<RawType> {
    let mut t = RawType::default();
    let mut name = None;

    match_attributes! {ctx, a in attributes,
        "api"            => t.api            = Some(a.value),
        "name"           => name             = Some(a.value),
        "category"       => t.category       = Some(a.value),
        "alias"          => t.alias          = Some(a.value),
        "requires"       => t.requires       = Some(a.value),
        "bitvalues"      => t.bitvalues      = Some(a.value),
        "parent"         => t.parent         = Some(a.value),
        "objtypeenum"    => t.objtypeenum    = Some(a.value),
        "structextends"  => t.struct_extends = split_list(&a.value),
        "returnedonly"   => t.returned_only  = parse_bool(ctx, "returnedonly", a.value),
        "allowduplicate" => t.allow_duplicate = parse_bool(ctx, "allowduplicate", a.value),
        "comment" | "deprecated" => ()
    }

    let mut code = String::new();
    match_elements_combine_text! {ctx, attributes, code,
        "name" => {
            let text = parse_text_element(ctx);
            code.push_str(&text);
            name = Some(text);
        },
        "type" => {
            let text = parse_text_element(ctx);
            code.push_str(&text);
            t.type_refs.push(text);
        },
        "apientry" => {
            let text = parse_text_element(ctx);
            code.push_str(&text);
        },
        "member" => if let Some(v) = parse_member(ctx, attributes) {
            t.members.push(v);
        },
        "comment" | "proto" | "param" => consume_current_element(ctx)
    }
    t.code = code;

    match name {
        Some(name) => t.name = name,
        None => {
            ctx.diagnostics.push(Diagnostic::MissingElement {
                xpath: ctx.xpath.clone(),
                name: String::from("name"),
            });
            return None;
        }
    }

    Some(t)
}

fn parse_member<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<RawMember> {
    let mut m = RawMember::default();

    match_attributes! {ctx, a in attributes,
        "api"            => m.api            = Some(a.value),
        "len"            => m.len            = Some(a.value),
        "altlen"         => m.altlen         = Some(a.value),
        "optional"       => m.optional       = Some(a.value),
        "externsync"     => m.externsync     = Some(a.value),
        "noautovalidity" => m.noautovalidity = parse_bool(ctx, "noautovalidity", a.value),
        "values"         => m.values         = Some(a.value),
        "limittype"      => m.limittype      = Some(a.value),
        "selector"       => m.selector       = Some(a.value),
        "selection"      => m.selection      = Some(a.value),
        "comment" | "deprecated" | "objecttype" | "featurelink" | "validstructs" | "stride" => ()
    }

    m.decl = parse_declaration(ctx)?;
    Some(m)
}

/// Reads the contents of `<proto>`, `<param>` or `<member>` up to and
/// including its end tag.
fn parse_declaration<R: Read>(ctx: &mut ParseCtx<R>) -> Option<RawDecl> {
    let mut decl = RawDecl::default();
    let mut seen_type = false;
    let mut seen_name = false;

    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                let segment = if seen_name {
                    &mut decl.tail
                } else if seen_type {
                    &mut decl.suffix
                } else {
                    &mut decl.prefix
                };
                segment.push_str(&text);
            }
            XmlEvent::StartElement { name, .. } => {
                let name = name.local_name.as_str();
                ctx.push_element(name);
                match name {
                    "type" => {
                        decl.type_name = parse_text_element(ctx);
                        seen_type = true;
                    }
                    "name" => {
                        decl.name = parse_text_element(ctx);
                        seen_name = true;
                    }
                    // array sizes given by API constants, e.g. [<enum>VK_UUID_SIZE</enum>]
                    "enum" => {
                        let text = parse_text_element(ctx);
                        decl.tail.push_str(&text);
                    }
                    "comment" => consume_current_element(ctx),
                    _ => {
                        ctx.diagnostics.push(Diagnostic::UnexpectedElement {
                            xpath: ctx.xpath.clone(),
                            name: String::from(name),
                        });
                        consume_current_element(ctx);
                    }
                }
            }
            XmlEvent::EndElement { .. } => {
                ctx.pop_element();
                break;
            }
            _ => {}
        }
    }

    if !seen_name {
        ctx.diagnostics.push(Diagnostic::MissingElement {
            xpath: ctx.xpath.clone(),
            name: String::from("name"),
        });
        return None;
    }

    Some(decl)
}

fn parse_enums<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> RawEnums {
    let mut enums = RawEnums::default();

    match_attributes! {ctx, a in attributes,
        "name"     => enums.name = Some(a.value),
        "type"     => enums.kind = Some(a.value),
        "bitwidth" => enums.bitwidth = parse_bit_width(ctx, &a.value),
        "start" | "end" | "vendor" | "comment" => ()
    }

    match_elements! {ctx, attributes,
        "enum" => if let Some(v) = parse_enum(ctx, attributes) {
            enums.children.push(v);
        },
        "unused" | "comment" => consume_current_element(ctx)
    }

    enums
}

fn parse_enum<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<RawEnum> {
    let mut e = RawEnum::default();
    let mut name = None;
    let mut bitpos = None;
    let mut offset = None;
    let mut extnumber = None;

    match_attributes! {ctx, a in attributes,
        "name"      => name        = Some(a.value),
        "api"       => e.api       = Some(a.value),
        "type"      => e.type_name = Some(a.value),
        "value"     => e.value     = Some(a.value),
        "bitpos"    => bitpos      = Some(a.value),
        "offset"    => offset      = Some(a.value),
        "extnumber" => extnumber   = Some(a.value),
        "extends"   => e.extends   = Some(a.value),
        "alias"     => e.alias     = Some(a.value),
        "protect"   => e.protect   = Some(a.value),
        "dir" => {
            if a.value.as_str() == "-" {
                e.negative = true;
            } else {
                ctx.diagnostics.push(Diagnostic::UnexpectedAttributeValue {
                    xpath: ctx.xpath.clone(),
                    name: String::from("dir"),
                    value: a.value,
                });
            }
        },
        "comment" | "deprecated" => ()
    }

    unwrap_attribute!(ctx, name);
    e.name = name;

    let specs = [
        offset.is_some(),
        bitpos.is_some(),
        e.value.is_some(),
        e.alias.is_some(),
    ];
    if specs.iter().filter(|v| **v).count() > 1 {
        ctx.schema_violation(format!(
            "Unable to determine correct specification of enum: offset={:?}, bitpos={:?}, value={:?}, alias={:?}",
            offset, bitpos, e.value, e.alias
        ));
        consume_current_element(ctx);
        return None;
    }

    e.bitpos = bitpos.and_then(|v| parse_integer(ctx, &v));
    e.offset = offset.and_then(|v| parse_integer(ctx, &v));
    e.extnumber = extnumber.and_then(|v| parse_integer(ctx, &v));

    consume_current_element(ctx);
    Some(e)
}

fn parse_command<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<RawCommand> {
    let mut c = RawCommand::default();
    let mut name = None;

    match_attributes! {ctx, a in attributes,
        "name"           => name             = Some(a.value),
        "alias"          => c.alias          = Some(a.value),
        "api"            => c.api            = Some(a.value),
        "queues"         => c.queues         = split_list(&a.value),
        "tasks"          => c.tasks          = split_list(&a.value),
        "successcodes"   => c.successcodes   = split_list(&a.value),
        "errorcodes"     => c.errorcodes     = split_list(&a.value),
        "renderpass"     => c.renderpass     = Some(a.value),
        "videocoding"    => c.videocoding    = Some(a.value),
        "cmdbufferlevel" => c.cmdbufferlevel = split_list(&a.value),
        "allownoqueues"  => c.allow_no_queues = parse_bool(ctx, "allownoqueues", a.value),
        "comment" | "export" | "conditionalrendering" => ()
    }

    if c.alias.is_some() {
        unwrap_attribute!(ctx, name);
        consume_current_element(ctx);
        c.name = name;
        return Some(c);
    }

    let mut proto = None;
    match_elements! {ctx, attributes,
        "proto" => proto = parse_declaration(ctx),
        "param" => if let Some(v) = parse_member(ctx, attributes) {
            c.params.push(v);
        },
        "implicitexternsyncparams" => {
            match_elements!{ctx, attributes,
                "param" => c.implicit_extern_sync_params.push(parse_text_element(ctx))
            }
        },
        "description" | "alias" => consume_current_element(ctx)
    }

    match proto {
        Some(proto) => {
            c.name = proto.name.clone();
            c.proto = proto;
            Some(c)
        }
        None => {
            ctx.diagnostics.push(Diagnostic::MissingElement {
                xpath: ctx.xpath.clone(),
                name: String::from("proto"),
            });
            None
        }
    }
}

fn parse_feature<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<RawFeature> {
    let mut f = RawFeature::default();
    let mut api = None;
    let mut name = None;
    let mut number = None;

    match_attributes! {ctx, a in attributes,
        "api"    => api    = Some(a.value),
        "name"   => name   = Some(a.value),
        "number" => number = Some(a.value),
        "comment" | "depends" | "sortorder" | "apitype" | "protect" => ()
    }

    unwrap_attribute!(ctx, api);
    unwrap_attribute!(ctx, name);
    unwrap_attribute!(ctx, number);
    f.api = split_list(&api);
    f.name = name;
    f.number = number;

    match_elements! {ctx, attributes,
        "require" => f.requires.push(parse_require(ctx, attributes)),
        "remove"  => f.removes.push(parse_require(ctx, attributes)),
        "deprecate" => consume_current_element(ctx)
    }

    Some(f)
}

fn parse_extension<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<RawExtension> {
    let mut x = RawExtension::default();
    let mut name = None;
    let mut number = None;

    match_attributes! {ctx, a in attributes,
        "name"         => name           = Some(a.value),
        "number"       => number         = Some(a.value),
        "type"         => x.kind         = Some(a.value),
        "supported"    => x.supported    = split_list(&a.value),
        "ratified"     => x.ratified     = split_list(&a.value),
        "depends"      => x.depends      = Some(a.value),
        "requires"     => x.depends      = Some(a.value),
        "platform"     => x.platform     = Some(a.value),
        "provisional"  => x.provisional  = parse_bool(ctx, "provisional", a.value),
        "promotedto"   => x.promotedto   = Some(a.value),
        "deprecatedby" => x.deprecatedby = Some(a.value),
        "obsoletedby"  => x.obsoletedby  = Some(a.value),
        "specialuse"   => x.specialuse   = split_list(&a.value),
        "comment" | "author" | "contact" | "sortorder" | "nofeatures" | "requiresCore" => ()
    }

    unwrap_attribute!(ctx, name);
    x.name = name;
    x.number = number.and_then(|v| parse_integer(ctx, &v)).unwrap_or(0);

    match_elements! {ctx, attributes,
        "require" => x.requires.push(parse_require(ctx, attributes)),
        "remove"  => x.removes.push(parse_require(ctx, attributes)),
        "deprecate" => consume_current_element(ctx)
    }

    Some(x)
}

fn parse_require<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> RawRequire {
    let mut require = RawRequire::default();

    match_attributes! {ctx, a in attributes,
        "api" => require.api = Some(a.value),
        "comment" | "depends" | "extension" | "feature" | "profile" | "reasonlink" => ()
    }

    match_elements! {ctx, attributes,
        "type" => if let Some(v) = parse_named_ref(ctx, attributes) {
            require.items.push(RawRequireItem::Type(v));
        },
        "command" => if let Some(v) = parse_named_ref(ctx, attributes) {
            require.items.push(RawRequireItem::Command(v));
        },
        "enum" => if let Some(v) = parse_enum(ctx, attributes) {
            require.items.push(RawRequireItem::Enum(v));
        },
        "comment" | "feature" => consume_current_element(ctx)
    }

    require
}

fn parse_named_ref<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<String> {
    let mut name = None;

    match_attributes! {ctx, a in attributes,
        "name" => name = Some(a.value),
        "comment" => ()
    }

    unwrap_attribute!(ctx, name);
    consume_current_element(ctx);
    Some(name)
}
