//! Minimal XML document model for emitted taxonomy documents
//!
//! Elements and attributes carry namespace URIs rather than prefixes; prefixes
//! are resolved against the owning document's declarations when serializing.

use crate::xbrl::XML_NS;
use crate::{Error, Result};
use compact_str::CompactString;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub namespace: Option<CompactString>,
    pub local: CompactString,
}

impl Name {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: Some(CompactString::from(namespace)),
            local: CompactString::from(local),
        }
    }

    /// Unqualified name, used for plain attributes such as `order` or `id`.
    pub fn local(local: &str) -> Self {
        Self {
            namespace: None,
            local: CompactString::from(local),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }
}

/// Ordered attribute list. Appends keep duplicates; `set` replaces in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(Name, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Name, value: impl Into<String>) {
        self.entries.push((name, value.into()));
    }

    pub fn set(&mut self, name: Name, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &Name) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &str)> {
        self.entries.iter().map(|(n, v)| (n, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: Name,
    pub attributes: Attributes,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            name: Name::new(namespace, local),
            attributes: Attributes::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: Name, value: impl Into<String>) -> Self {
        self.attributes.push(name, value);
        self
    }

    /// Shorthand for an unqualified attribute.
    pub fn plain_attr(self, local: &str, value: impl Into<String>) -> Self {
        self.attr(Name::local(local), value)
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        for (name, value) in attributes.iter() {
            self.attributes.push(name.clone(), value);
        }
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends `child` and returns a handle to it.
    pub fn add_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Inserts `child` before the sibling at `index`, or appends when the
    /// index is past the end.
    pub fn insert_before(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    pub fn get_attr(&self, name: &Name) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name.is(namespace, local))
    }

    pub fn child_mut(&mut self, namespace: &str, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name.is(namespace, local))
    }

    pub fn position(&self, namespace: &str, local: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name.is(namespace, local))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Schema,
    Linkbase,
}

/// One document of the working set.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub uri: String,
    pub kind: DocumentKind,
    pub default_namespace: Option<String>,
    /// Prefixed namespace declarations written on the root, in order.
    pub namespaces: Vec<(CompactString, String)>,
    pub root: Element,
}

impl XmlDocument {
    pub fn new(uri: impl Into<String>, kind: DocumentKind, root: Element) -> Self {
        Self {
            uri: uri.into(),
            kind,
            default_namespace: None,
            namespaces: Vec::new(),
            root,
        }
    }

    pub fn with_default_namespace(mut self, namespace: &str) -> Self {
        self.default_namespace = Some(namespace.to_string());
        self
    }

    /// Declares `prefix`. A prefix declared twice keeps its first binding.
    pub fn declare(&mut self, prefix: &str, namespace: &str) {
        if !self.namespaces.iter().any(|(p, _)| p.as_str() == prefix) {
            self.namespaces
                .push((CompactString::from(prefix), namespace.to_string()));
        }
    }

    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return self.default_namespace.as_deref();
        }
        self.namespaces
            .iter()
            .find(|(p, _)| p.as_str() == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    fn prefix_for(&self, namespace: &str) -> Option<&str> {
        if namespace == XML_NS {
            return Some("xml");
        }
        self.namespaces
            .iter()
            .find(|(_, ns)| ns == namespace)
            .map(|(p, _)| p.as_str())
    }

    fn element_name(&self, name: &Name) -> Result<String> {
        match name.namespace.as_deref() {
            None => Ok(name.local.to_string()),
            Some(ns) if self.default_namespace.as_deref() == Some(ns) => Ok(name.local.to_string()),
            Some(ns) => self
                .prefix_for(ns)
                .map(|p| format!("{}:{}", p, name.local))
                .ok_or_else(|| Error::Xml(format!("Namespace {} is not declared in {}", ns, self.uri))),
        }
    }

    fn attribute_name(&self, name: &Name) -> Result<String> {
        match name.namespace.as_deref() {
            None => Ok(name.local.to_string()),
            Some(ns) => self
                .prefix_for(ns)
                .map(|p| format!("{}:{}", p, name.local))
                .ok_or_else(|| Error::Xml(format!("Namespace {} is not declared in {}", ns, self.uri))),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Xml(format!("Invalid UTF-8 in XML output: {}", e)))
    }

    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| Error::Xml(format!("Failed to write XML declaration: {}", e)))?;
        self.write_element(&mut writer, &self.root, true)
    }

    fn write_element<W: Write>(&self, writer: &mut Writer<W>, element: &Element, is_root: bool) -> Result<()> {
        let name = self.element_name(&element.name)?;
        let mut start = BytesStart::new(name.as_str());

        if is_root {
            if let Some(ns) = &self.default_namespace {
                start.push_attribute(("xmlns", ns.as_str()));
            }
            for (prefix, ns) in &self.namespaces {
                let decl = format!("xmlns:{}", prefix);
                start.push_attribute((decl.as_str(), ns.as_str()));
            }
        }
        for (attr_name, value) in element.attributes.iter() {
            let key = self.attribute_name(attr_name)?;
            start.push_attribute((key.as_str(), value));
        }

        if element.children.is_empty() && element.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| Error::Xml(format!("Failed to write element {}: {}", name, e)));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::Xml(format!("Failed to write element {}: {}", name, e)))?;
        if let Some(text) = &element.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| Error::Xml(format!("Failed to write text of {}: {}", name, e)))?;
        }
        for child in &element.children {
            self.write_element(writer, child, false)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(name.as_str())))
            .map_err(|e| Error::Xml(format!("Failed to close element {}: {}", name, e)))?;
        Ok(())
    }
}
