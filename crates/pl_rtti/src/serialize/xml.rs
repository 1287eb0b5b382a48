//! A small XML element tree for attribute persistence and plugin descriptors.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Name of the XML attribute that carries the class of an object element.
pub const XML_CLASS_ATTRIBUTE: &str = "Class";

/// Element name used when an object is written as XML.
pub const XML_OBJECT_ELEMENT: &str = "Object";

// -----------------------------------------------------------------------------
// XmlError

/// An error that occurs while parsing XML.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum XmlError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("XML document has no root element")]
    NoRoot,

    #[error("Unclosed XML element `{0}`")]
    Unclosed(String),
}

// -----------------------------------------------------------------------------
// XmlElement

/// An XML element with attributes, text and child elements.
///
/// Attribute order is preserved. Setting an existing attribute replaces its
/// value in place.
///
/// # Examples
///
/// ```
/// use pl_rtti::serialize::XmlElement;
///
/// let mut element = XmlElement::new("Object");
/// element.set_attribute("Name", "a \"b\"");
/// assert_eq!(element.to_string(), r#"<Object Name="a &quot;b&quot;"/>"#);
///
/// let parsed = XmlElement::parse(&element.to_string()).unwrap();
/// assert_eq!(parsed.attribute("Name"), Some("a \"b\""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ----- Attributes

    /// Returns the value of the attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every attribute in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Sets the attribute `name`, replacing an existing value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes the attribute `name` and returns its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    // ----- Content

    /// Returns the text content, trimmed.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[inline]
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Returns the first child element named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns the text of the first child element named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::text)
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    // ----- Parsing

    /// Parses the root element of a document.
    ///
    /// Declarations, comments and processing instructions are skipped.
    /// Text is unescaped and trimmed, text split by child elements is joined
    /// with a single space.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|err| XmlError::Syntax {
                position: reader.error_position(),
                message: err.to_string(),
            })?;
            match event {
                Event::Start(start) => stack.push(element_from_start(&start)),
                Event::Empty(start) => {
                    let element = element_from_start(&start);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        continue;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().unwrap_or(Cow::Borrowed(""));
                    if let Some(element) = stack.last_mut() {
                        append_text(&mut element.text, &text);
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(data.as_ref()).into_owned();
                    if let Some(element) = stack.last_mut() {
                        append_text(&mut element.text, &text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        match stack.into_iter().next() {
            Some(element) => Err(XmlError::Unclosed(element.name)),
            None => Err(XmlError::NoRoot),
        }
    }

    // ----- Writing

    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{}\"", escape(value.as_str()))?;
        }
        if self.text.is_empty() && self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        f.write_str(&escape(self.text.as_str()))?;
        for child in &self.children {
            child.write(f)?;
        }
        write!(f, "</{}>", self.name)
    }
}

impl fmt::Display for XmlElement {
    /// Writes the element without a declaration and without indentation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> XmlElement {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes().filter_map(Result::ok) {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        element.attributes.push((key, value));
    }
    element
}

fn append_text(target: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::{XmlElement, XmlError};

    #[test]
    fn parse_nested_document() {
        let doc = r#"<?xml version="1.0"?>
            <!-- descriptor -->
            <Plugin Version="1">
                <Active>1</Active>
                <Name>Demo &amp; Co</Name>
                <Empty/>
            </Plugin>"#;
        let root = XmlElement::parse(doc).unwrap();

        assert_eq!(root.name(), "Plugin");
        assert_eq!(root.attribute("Version"), Some("1"));
        assert_eq!(root.child_text("Active"), Some("1"));
        assert_eq!(root.child_text("Name"), Some("Demo & Co"));
        assert_eq!(root.child_text("Empty"), Some(""));
        assert_eq!(root.child("Missing"), None);
        assert_eq!(root.children().len(), 3);
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut element = XmlElement::new("Object");
        element.set_attribute("A", "1");
        element.set_attribute("B", "2");
        element.set_attribute("A", "3");
        let attributes: Vec<_> = element.attributes().collect();
        assert_eq!(attributes, [("A", "3"), ("B", "2")]);

        assert_eq!(element.remove_attribute("A"), Some(String::from("3")));
        assert_eq!(element.attribute("A"), None);
    }

    #[test]
    fn write_escapes_and_nests() {
        let mut child = XmlElement::new("Child");
        child.set_text("a < b");
        let mut root = XmlElement::new("Root");
        root.set_attribute("Quote", "it's");
        root.push_child(child);

        let written = root.to_string();
        assert_eq!(
            written,
            r#"<Root Quote="it&apos;s"><Child>a &lt; b</Child></Root>"#
        );
        assert_eq!(XmlElement::parse(&written).unwrap(), root);
    }

    #[test]
    fn malformed_input() {
        assert_eq!(XmlElement::parse(""), Err(XmlError::NoRoot));
        assert!(XmlElement::parse("<Open><Inner/>").is_err());
        assert!(matches!(
            XmlElement::parse("<A></B>"),
            Err(XmlError::Syntax { .. })
        ));
    }
}
