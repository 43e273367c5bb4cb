//! Build an element tree from quick-xml events

use std::collections::HashMap;

use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::node::{Attribute, Element, Node};
use super::TeiDocument;
use crate::error::TeiError;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix bindings, one frame per open element.
#[derive(Debug, Default)]
struct NamespaceScopes {
    frames: Vec<Vec<(String, String)>>,
}

impl NamespaceScopes {
    fn push(&mut self, bindings: Vec<(String, String)>) {
        self.frames.push(bindings);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    /// Resolve a prefix (`""` for the default namespace). An empty URI unbinds.
    fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

pub(super) fn parse_document(xml: &str) -> Result<TeiDocument, TeiError> {
    let mut reader = Reader::from_str(xml);
    let mut scopes = NamespaceScopes::default();
    let mut open: Vec<Element> = Vec::new();
    let mut tree = TreeBuilder::default();
    let mut entities = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                open.push(open_element(&start, &mut scopes, &entities)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start, &mut scopes, &entities)?;
                scopes.pop();
                tree.attach(&mut open, Node::Element(element))?;
            }
            Event::End(_) => {
                // quick-xml has already checked the end name against the start
                let element = open
                    .pop()
                    .ok_or_else(|| TeiError::Unbalanced("unexpected end tag".to_string()))?;
                scopes.pop();
                tree.attach(&mut open, Node::Element(element))?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape_with(|name| entities.get(name).map(String::as_str))?
                    .into_owned();
                tree.attach(&mut open, Node::Text(text))?;
            }
            Event::CData(data) => {
                let data = std::str::from_utf8(&data)?.to_string();
                tree.attach(&mut open, Node::CData(data))?;
            }
            Event::Comment(comment) => {
                let body = std::str::from_utf8(&comment)?.to_string();
                tree.attach(&mut open, Node::Comment(body))?;
            }
            Event::PI(pi) => {
                let body = std::str::from_utf8(&pi)?.to_string();
                tree.attach(&mut open, Node::ProcessingInstruction(body))?;
            }
            Event::DocType(doctype) => {
                let body = std::str::from_utf8(&doctype)?.to_string();
                entities = declared_entities(&body);
                tree.attach(&mut open, Node::DocType(body))?;
            }
            Event::Decl(_) => tree.has_declaration = true,
            Event::Eof => break,
        }
    }

    if let Some(element) = open.last() {
        return Err(TeiError::Unbalanced(format!(
            "element <{}> is never closed",
            element.name()
        )));
    }
    tree.finish()
}

#[derive(Debug, Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    has_declaration: bool,
}

impl TreeBuilder {
    fn attach(&mut self, open: &mut [Element], node: Node) -> Result<(), TeiError> {
        if let Some(parent) = open.last_mut() {
            parent.push_node(node);
            return Ok(());
        }
        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(TeiError::Unbalanced(format!(
                        "second root element <{}>",
                        element.name()
                    )));
                }
                self.root = Some(element);
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<TeiDocument, TeiError> {
        let root = self.root.ok_or(TeiError::NoRoot)?;
        Ok(TeiDocument {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
            has_declaration: self.has_declaration,
        })
    }
}

/// General entities declared in a DOCTYPE internal subset.
///
/// Replacement text may refer to character references and to entities
/// declared earlier. The first declaration of a name wins; parameter and
/// external entities are ignored.
fn declared_entities(doctype: &str) -> HashMap<String, String> {
    let mut entities: HashMap<String, String> = HashMap::new();
    let mut rest = doctype;

    while let Some(at) = rest.find("<!ENTITY") {
        rest = rest[at + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(len) = rest[1..].find(quote) else {
            break;
        };
        let literal = &rest[1..1 + len];
        rest = &rest[len + 2..];

        if name.is_empty() || entities.contains_key(name) {
            continue;
        }
        let expanded = unescape_with(literal, |n| entities.get(n).map(String::as_str))
            .map(|value| value.into_owned());
        if let Ok(value) = expanded {
            entities.insert(name.to_string(), value);
        }
    }
    entities
}

/// Attribute-value normalization: each literal tab, newline or CR (a CRLF
/// pair counting once) becomes a space. Character references are expanded
/// afterwards, so `&#10;` survives as a newline.
fn normalize_attribute_whitespace(raw: &str) -> String {
    raw.replace("\r\n", " ").replace(['\t', '\n', '\r'], " ")
}

fn open_element(
    start: &BytesStart<'_>,
    scopes: &mut NamespaceScopes,
    entities: &HashMap<String, String>,
) -> Result<Element, TeiError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();

    let mut attributes = Vec::new();
    let mut bindings = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let raw = normalize_attribute_whitespace(std::str::from_utf8(&attr.value)?);
        let value = unescape_with(&raw, |name| entities.get(name).map(String::as_str))
            .map_err(quick_xml::Error::from)?
            .into_owned();

        if key == "xmlns" {
            bindings.push((String::new(), value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((prefix.to_string(), value.clone()));
        }
        attributes.push(Attribute { name: key, value });
    }
    scopes.push(bindings);

    let prefix = name.split_once(':').map_or("", |(prefix, _)| prefix);
    let namespace = scopes.resolve(prefix).map(str::to_string);

    Ok(Element::with_attributes(name, namespace, attributes))
}
