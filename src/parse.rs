use std::io::Read;
use xml::reader::XmlEvent;

use crate::types::*;

type XmlEvents<R> = xml::reader::Events<R>;
type XmlAttribute = xml::attribute::OwnedAttribute;

//--------------------------------------------------------------------------------------------------
struct ParseCtx<R: Read> {
    events: XmlEvents<R>,
    xpath: String,
    errors: Vec<Error>,
    xml_error: Option<xml::reader::Error>,
}

impl<R: Read> ParseCtx<R> {
    /// Next event of the stream. A malformed document ends the stream and the
    /// error is kept for `parse_xml` to report.
    fn next_event(&mut self) -> Option<XmlEvent> {
        match self.events.next()? {
            Ok(e) => Some(e),
            Err(e) => {
                if self.xml_error.is_none() {
                    self.xml_error = Some(e);
                }
                None
            }
        }
    }

    fn push_element(&mut self, name: &str) {
        self.xpath.push('/');
        self.xpath.push_str(name);
    }

    fn pop_element(&mut self) {
        if let Some(separator_pos) = self.xpath.rfind('/') {
            self.xpath.truncate(separator_pos);
        } else {
            self.errors.push(Error::Internal {
                desc: "ParseCtx push_element/pop_element mismatch.",
            });
        }
    }
}

//--------------------------------------------------------------------------------------------------
macro_rules! unwrap_attribute (
    ($ctx:expr, $element:ident, $attribute:ident) => {
        let $attribute = match $attribute {
            Some(val) => val,
            None => {
                $ctx.errors.push(Error::MissingAttribute {
                    xpath: $ctx.xpath.clone(),
                    name: String::from(stringify!($attribute)),
                });
                return None;
            }
        };
    };
);

// Attributes not listed are ignored, the registry schema is not validated.
macro_rules! match_attributes {
    ($a:ident in $attributes:expr, $($p:pat => $e:expr),+) => {
        for $a in $attributes {
            let n = $a.name.local_name.as_str();
            match n {
                $(
                    $p => $e,
                )+
                _ => {}
            }
        }
    };
}

macro_rules! match_elements {
    ($ctx:expr, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::StartElement { name, .. } => {
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => consume_current_element($ctx),
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
                        _ => consume_current_element($ctx),
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
/// Parses the Vulkan XML file into a `Registry`.
pub fn parse_file(path: &std::path::Path) -> Result<(Registry, Vec<Error>), FatalError> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    let parser = xml::reader::ParserConfig::new().create_reader(file);
    parse_xml(parser.into_iter())
}

/// Parses the Vulkan XML file from stream into a `Registry`.
pub fn parse_stream<T: std::io::Read>(stream: T) -> Result<(Registry, Vec<Error>), FatalError> {
    let parser = xml::reader::ParserConfig::new().create_reader(stream);
    parse_xml(parser.into_iter())
}

fn parse_xml<R: Read>(events: XmlEvents<R>) -> Result<(Registry, Vec<Error>), FatalError> {
    let mut ctx = ParseCtx {
        events,
        xpath: String::from(""),
        errors: Vec::new(),
        xml_error: None,
    };

    let mut result = Err(FatalError::MissingRegistryElement);

    {
        let ctx = &mut ctx;
        while let Some(e) = ctx.next_event() {
            if let XmlEvent::StartElement { name, .. } = e {
                let name = name.local_name;
                ctx.push_element(&name);
                result = if name == "registry" {
                    Ok(parse_registry(ctx))
                } else {
                    Err(FatalError::UnexpectedRoot(name))
                };
                break;
            }
        }
    }

    if let Some(e) = ctx.xml_error {
        return Err(FatalError::Xml(e));
    }

    result.map(|r| (r, ctx.errors))
}

fn parse_registry<R: Read>(ctx: &mut ParseCtx<R>) -> Registry {
    let mut registry = Registry::default();

    match_elements! {ctx, attributes,
        "types" => {
            let types = registry.types.get_or_insert_with(Vec::new);
            match_elements!{ctx, attributes,
                "type" => if let Some(v) = parse_type(ctx, attributes) {
                    types.push(v);
                }
            }
        },
        "commands" => {
            let commands = registry.commands.get_or_insert_with(Vec::new);
            match_elements!{ctx, attributes,
                "command" => if let Some(v) = parse_command(ctx, attributes) {
                    commands.push(v);
                }
            }
        },
        "feature" => if let Some(v) = parse_feature(ctx, attributes) {
            registry.features.push(v);
        }
    }

    registry
}

/// Only defines are kept; they carry the header version markers.
fn parse_type<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<TypeDefine> {
    let mut api = None;
    let mut category = None;

    match_attributes! {a in attributes,
        "api"      => api      = Some(a.value),
        "category" => category = Some(a.value)
    }

    if category.as_deref() != Some("define") {
        consume_current_element(ctx);
        return None;
    }

    let mut markup = Vec::new();
    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                if let Some(DefineMarkup::Text(prev)) = markup.last_mut() {
                    prev.push_str(&text);
                } else {
                    markup.push(DefineMarkup::Text(text));
                }
            }
            XmlEvent::StartElement { name, .. } => {
                let name = name.local_name;
                ctx.push_element(&name);
                let text = parse_text_element(ctx);
                match name.as_str() {
                    "name" => markup.push(DefineMarkup::Name(text)),
                    "type" => markup.push(DefineMarkup::Type(text)),
                    _ => {}
                }
            }
            XmlEvent::EndElement { .. } => {
                ctx.pop_element();
                break;
            }
            _ => {}
        }
    }

    Some(TypeDefine { api, markup })
}

fn parse_command<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Command> {
    let mut name = None;
    let mut alias = None;
    let mut api = None;

    match_attributes! {a in attributes,
        "name"  => name  = Some(a.value),
        "alias" => alias = Some(a.value),
        "api"   => api   = Some(a.value)
    }

    if let Some(alias) = alias {
        consume_current_element(ctx);
        unwrap_attribute!(ctx, command, name);
        return Some(Command::Alias { name, alias, api });
    }

    let mut proto = None;
    let mut params = Vec::new();

    match_elements! {ctx, attributes,
        "proto" => proto = parse_name_with_type(ctx),
        "param" => {
            let mut api = None;
            match_attributes!{a in attributes,
                "api" => api = Some(a.value)
            }
            if let Some(definition) = parse_name_with_type(ctx) {
                params.push(CommandParam { api, definition });
            }
        }
    }

    let proto = if let Some(v) = proto {
        v
    } else {
        ctx.errors.push(Error::MissingElement {
            xpath: ctx.xpath.clone(),
            name: String::from("proto"),
        });
        return None;
    };

    Some(Command::Definition(CommandDefinition { api, proto, params }))
}

/// Parses `<proto>` and `<param>` contents. Text after `<name>` (array
/// declarators) is not part of the type.
fn parse_name_with_type<R: Read>(ctx: &mut ParseCtx<R>) -> Option<NameWithType> {
    let mut type_name = String::new();
    let mut name = None;

    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                if name.is_none() {
                    type_name.push_str(&text);
                }
            }
            XmlEvent::StartElement { name: element, .. } => {
                let element = element.local_name;
                ctx.push_element(&element);
                let text = parse_text_element(ctx);
                match element.as_str() {
                    "type" => type_name.push_str(&text),
                    "name" => name = Some(text),
                    _ => {}
                }
            }
            XmlEvent::EndElement { .. } => {
                ctx.pop_element();
                break;
            }
            _ => {}
        }
    }

    let name = if let Some(v) = name {
        v.trim().to_owned()
    } else {
        ctx.errors.push(Error::MissingElement {
            xpath: ctx.xpath.clone(),
            name: String::from("name"),
        });
        return None;
    };

    Some(NameWithType {
        type_name: type_name.trim().to_owned(),
        name,
    })
}

fn parse_feature<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Feature> {
    let mut api = None;
    let mut name = None;
    let mut commands = Vec::new();

    match_attributes! {a in attributes,
        "api"  => api  = Some(a.value),
        "name" => name = Some(a.value)
    }

    match_elements! {ctx,
        "require" => {
            match_elements!{ctx, attributes,
                "command" => {
                    let mut name = None;
                    match_attributes!{a in attributes,
                        "name" => name = Some(a.value)
                    }
                    consume_current_element(ctx);
                    if let Some(name) = name {
                        commands.push(name);
                    }
                }
            }
        }
    }

    unwrap_attribute!(ctx, feature, name);

    Some(Feature {
        name,
        api,
        commands,
    })
}

fn consume_current_element<R: Read>(ctx: &mut ParseCtx<R>) {
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

fn parse_text_element<R: Read>(ctx: &mut ParseCtx<R>) -> String {
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
