//! A minimal XML element tree and its serializer.
//!
//! Response documents are assembled as [`XmlElement`] trees and written out
//! with `quick-xml`. Text and attribute values are escaped on output; metadata
//! fragments are written verbatim since they were validated on construction.

use crate::error::{OaiError, OaiResult};
use crate::record::MetadataFragment;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// Child content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Fragment(MetadataFragment),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element holding a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(XmlNode::Text(text.into()));
        element
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set an attribute, replacing an existing value of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Append a child element, with text content if given, and return it.
    pub fn add_child(&mut self, name: impl Into<String>, text: Option<&str>) -> &mut XmlElement {
        let child = match text {
            Some(text) => XmlElement::with_text(name, text),
            None => XmlElement::new(name),
        };
        self.push_element(child)
    }

    /// Append an already built element and return it.
    pub fn push_element(&mut self, element: XmlElement) -> &mut XmlElement {
        self.children.push(XmlNode::Element(element));
        match self.children.last_mut() {
            Some(XmlNode::Element(element)) => element,
            _ => unreachable!("an element was just pushed"),
        }
    }

    /// Splice a metadata fragment in as the next child, unaltered.
    pub fn add_fragment(&mut self, fragment: MetadataFragment) {
        self.children.push(XmlNode::Fragment(fragment));
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Serialize this element and its subtree.
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> OaiResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return write_event(writer, Event::Empty(start));
        }

        write_event(writer, Event::Start(start))?;
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_to(writer)?,
                XmlNode::Text(text) => write_event(writer, Event::Text(BytesText::new(text)))?,
                XmlNode::Fragment(fragment) => write_event(
                    writer,
                    Event::Text(BytesText::from_escaped(fragment.as_str())),
                )?,
            }
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

pub(crate) fn write_event<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> OaiResult<()> {
    writer
        .write_event(event)
        .map_err(|e| OaiError::xml(format!("failed to write response: {e}")))
}
