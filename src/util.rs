use std::io::Read;
use xml::reader::XmlEvent;

use crate::types::Diagnostic;

pub type XmlEvents<R> = xml::reader::Events<R>;
pub type XmlAttribute = xml::attribute::OwnedAttribute;

//--------------------------------------------------------------------------------------------------
macro_rules! unwrap_attribute (
    ($ctx:expr, $attribute:ident) => {
        let $attribute = match $attribute {
            Some(val) => val,
            None => {
                $ctx.diagnostics.push(Diagnostic::MissingAttribute {
                    xpath: $ctx.xpath.clone(),
                    name: String::from(stringify!($attribute)),
                });
                consume_current_element($ctx);
                return None;
            }
        };
    };
);

macro_rules! match_attributes {
    ($ctx:expr, $a:ident in $attributes:expr, $($p:pat => $e:expr),+) => {
        for $a in $attributes {
            let n = $a.name.local_name.as_str();
            match n {
                $(
                    $p => $e,
                )+
                _ => $ctx.diagnostics.push(Diagnostic::UnexpectedAttribute {
                    xpath: $ctx.xpath.clone(),
                    name: String::from(n),
                })
            }
        }
    };
}

macro_rules! match_elements {
    ($ctx:expr, $attributes:ident, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::StartElement { name, $attributes, .. } => {
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => {
                            let _ = $attributes;
                            $ctx.diagnostics.push(Diagnostic::UnexpectedElement {
                                xpath: $ctx.xpath.clone(),
                                name: String::from(name),
                            });
                            consume_current_element($ctx);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    $ctx.pop_element();
                    break;
                }
                _ => {}
            }
        }
    };
}

/// Like `match_elements!`, but also collects character data of the current
/// element into `$buffer`, which is how C declarations embedded in the
/// registry are reassembled.
macro_rules! match_elements_combine_text {
    ($ctx:expr, $attributes:ident, $buffer:ident, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::Characters(text) => $buffer.push_str(&text),
                XmlEvent::Whitespace(text) => $buffer.push_str(&text),
                XmlEvent::StartElement { name, $attributes, .. } => {
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => {
                            let _ = $attributes;
                            $ctx.diagnostics.push(Diagnostic::UnexpectedElement {
                                xpath: $ctx.xpath.clone(),
                                name: String::from(name),
                            });
                            consume_current_element($ctx);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    $ctx.pop_element();
                    break;
                }
                _ => {}
            }
        }
    };
}

//--------------------------------------------------------------------------------------------------
pub struct ParseCtx<R: Read> {
    events: XmlEvents<R>,
    pub xpath: String,
    pub diagnostics: Vec<Diagnostic>,
    /// First error reported by the XML reader. Once set, no further events
    /// are produced.
    pub fatal: Option<xml::reader::Error>,
}

impl<R: Read> ParseCtx<R> {
    pub fn new(events: XmlEvents<R>) -> ParseCtx<R> {
        ParseCtx {
            events,
            xpath: String::new(),
            diagnostics: Vec::new(),
            fatal: None,
        }
    }

    pub fn next_event(&mut self) -> Option<XmlEvent> {
        if self.fatal.is_some() {
            return None;
        }
        match self.events.next()? {
            Ok(e) => Some(e),
            Err(e) => {
                self.fatal = Some(e);
                None
            }
        }
    }

    pub fn push_element(&mut self, name: &str) {
        self.xpath.push('/');
        self.xpath.push_str(name);
    }

    pub fn pop_element(&mut self) {
        if let Some(separator_pos) = self.xpath.rfind('/') {
            self.xpath.truncate(separator_pos);
        } else {
            self.diagnostics.push(Diagnostic::Internal {
                xpath: self.xpath.clone(),
                desc: "push_element/pop_element mismatch",
            });
        }
    }

    pub fn schema_violation(&mut self, desc: String) {
        self.diagnostics.push(Diagnostic::SchemaViolation {
            xpath: self.xpath.clone(),
            desc,
        });
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer, with optional
/// leading minus sign.
pub fn integer_value(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

pub fn parse_integer<R: Read>(ctx: &mut ParseCtx<R>, text: &str) -> Option<i64> {
    let value = integer_value(text);
    if value.is_none() {
        ctx.schema_violation(format!(
            "Value '{}' is not valid base 10 or 16 integer.",
            text
        ));
    }
    value
}

/// Like `parse_integer`, but values that do not fit a `u32` are reported and
/// dropped instead of truncated.
pub fn parse_bit_width<R: Read>(ctx: &mut ParseCtx<R>, text: &str) -> Option<u32> {
    let value = parse_integer(ctx, text)?;
    match u32::try_from(value) {
        Ok(width) => Some(width),
        Err(_) => {
            ctx.schema_violation(format!("Bit width '{}' is out of range.", text));
            None
        }
    }
}

/// Interprets `"true"`/`"false"` attributes; anything else is reported and
/// treated as false.
pub fn parse_bool<R: Read>(ctx: &mut ParseCtx<R>, name: &str, value: String) -> bool {
    match value.as_str() {
        "true" => true,
        "false" => false,
        _ => {
            ctx.diagnostics.push(Diagnostic::UnexpectedAttributeValue {
                xpath: ctx.xpath.clone(),
                name: String::from(name),
                value,
            });
            false
        }
    }
}

/// Splits a comma-separated attribute such as `queues="graphics,compute"`.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

pub fn consume_current_element<R: Read>(ctx: &mut ParseCtx<R>) {
    let mut depth = 1;
    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::StartElement { name, .. } => {
                ctx.push_element(name.local_name.as_str());
                depth += 1;
            }
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                ctx.pop_element();
                if depth == 0 {
                    break;
                }
            }
            _ => (),
        }
    }
}

pub fn parse_text_element<R: Read>(ctx: &mut ParseCtx<R>) -> String {
    let mut result = String::new();
    let mut depth = 1;
    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::StartElement { name, .. } => {
                ctx.push_element(name.local_name.as_str());
                depth += 1;
            }
            XmlEvent::Characters(text) => result.push_str(&text),
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                ctx.pop_element();
                if depth == 0 {
                    break;
                }
            }
            _ => (),
        }
    }
    result
}
