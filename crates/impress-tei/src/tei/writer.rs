//! Serialize an element tree with quick-xml

use std::borrow::Cow;
use std::io::Write;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::node::{Element, Node};
use super::TeiDocument;
use crate::error::TeiError;

pub(super) fn write_document<W: Write>(doc: &TeiDocument, sink: W) -> Result<(), TeiError> {
    let mut writer = Writer::new(sink);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    if !doc.has_declaration {
        // The source had no declaration, so nothing in the prolog separates it from the root
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    }

    for node in &doc.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &doc.root)?;
    for node in &doc.epilog {
        write_node(&mut writer, node)?;
    }
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<(), TeiError> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?
        }
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        Node::Comment(body) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(body.as_str())))?
        }
        Node::ProcessingInstruction(body) => {
            writer.write_event(Event::PI(BytesText::from_escaped(body.as_str())))?
        }
        Node::DocType(body) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(body.as_str())))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), TeiError> {
    let mut start = BytesStart::new(element.name());
    for attr in element.attributes() {
        let value = escape_attribute(&attr.value);
        start.push_attribute((attr.name.as_bytes(), value.as_bytes()));
    }

    if element.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in element.children() {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name())))?;
    Ok(())
}

/// Escape markup characters; tab, newline and CR become character references.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\t', '\n', '\r']) {
        return escaped;
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for ch in escaped.chars() {
        match ch {
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
