//! Working document set of a compiled taxonomy
//!
//! Holds the emitted documents by uri in creation order, plus what discovery
//! learned from them (and from imported schemas found on disk): concepts keyed
//! by expanded name, and role types keyed by role URI.

use crate::diagnostics::Diagnostics;
use crate::xbrl::{LINKBASE_ARCROLE, LINK_NS, XBRLDT_NS, XLINK_NS, XSD_NS};
use crate::xml::{DocumentKind, Element, Name, XmlDocument};
use crate::{Error, Result};
use ahash::AHashMap;
use compact_str::CompactString;
use indexmap::IndexMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub namespace: String,
    pub local: CompactString,
}

impl ExpandedName {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            local: CompactString::from(local),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub name: ExpandedName,
    pub substitution_group: Option<ExpandedName>,
    /// Uri of the schema declaring the concept.
    pub document: String,
}

impl Concept {
    pub fn is_hypercube_item(&self) -> bool {
        self.substitution_group
            .as_ref()
            .is_some_and(|sg| sg.namespace == XBRLDT_NS && sg.local == "hypercubeItem")
    }

    pub fn is_dimension_item(&self) -> bool {
        self.substitution_group
            .as_ref()
            .is_some_and(|sg| sg.namespace == XBRLDT_NS && sg.local == "dimensionItem")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleType {
    pub role_uri: String,
    pub id: String,
    pub definition: Option<String>,
    pub document: String,
}

impl RoleType {
    /// Fragment reference used by `link:roleRef`.
    pub fn href(&self) -> String {
        format!("{}#{}", self.document, self.id)
    }
}

/// What schema discovery extracts from one schema document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaInfo {
    pub uri: String,
    pub target_namespace: String,
    pub concepts: Vec<Concept>,
    pub role_types: Vec<RoleType>,
}

impl SchemaInfo {
    /// Reads top-level element declarations and appinfo role types.
    pub fn from_document(doc: &XmlDocument) -> Self {
        let root = &doc.root;
        let target_namespace = root
            .get_attr(&Name::local("targetNamespace"))
            .unwrap_or_default()
            .to_string();

        let concepts = root
            .children_named(XSD_NS, "element")
            .filter_map(|element| {
                let name = element.get_attr(&Name::local("name"))?;
                let substitution_group = element
                    .get_attr(&Name::local("substitutionGroup"))
                    .and_then(|qname| resolve_qname(qname, |prefix| doc.namespace_for_prefix(prefix)));
                Some(Concept {
                    name: ExpandedName::new(&target_namespace, name),
                    substitution_group,
                    document: doc.uri.clone(),
                })
            })
            .collect();

        let role_types = root
            .children_named(XSD_NS, "annotation")
            .flat_map(|annotation| annotation.children_named(XSD_NS, "appinfo"))
            .flat_map(|appinfo| appinfo.children_named(LINK_NS, "roleType"))
            .filter_map(|role_type| {
                Some(RoleType {
                    role_uri: role_type.get_attr(&Name::local("roleURI"))?.to_string(),
                    id: role_type.get_attr(&Name::local("id")).unwrap_or_default().to_string(),
                    definition: role_type
                        .children_named(LINK_NS, "definition")
                        .next()
                        .and_then(|d| d.text.clone()),
                    document: doc.uri.clone(),
                })
            })
            .collect();

        Self {
            uri: doc.uri.clone(),
            target_namespace,
            concepts,
            role_types,
        }
    }
}

/// Expands `prefix:local` with `lookup`; unprefixed names are not resolved.
pub fn resolve_qname<'a>(qname: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> Option<ExpandedName> {
    let (prefix, local) = qname.split_once(':')?;
    lookup(prefix).map(|ns| ExpandedName::new(ns, local))
}

/// The compiled extension taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    documents: IndexMap<String, XmlDocument>,
    entry: String,
    concepts: AHashMap<ExpandedName, Concept>,
    role_types: IndexMap<String, RoleType>,
    diagnostics: Diagnostics,
}

impl Taxonomy {
    /// Starts a document set from its entry schema, discovering it.
    pub fn new(entry: XmlDocument) -> Self {
        let mut taxonomy = Self {
            documents: IndexMap::new(),
            entry: entry.uri.clone(),
            concepts: AHashMap::new(),
            role_types: IndexMap::new(),
            diagnostics: Diagnostics::new(),
        };
        taxonomy.discover_schema(entry);
        taxonomy
    }

    pub fn discover_schema(&mut self, doc: XmlDocument) {
        let info = SchemaInfo::from_document(&doc);
        self.documents.insert(doc.uri.clone(), doc);
        self.register(info);
    }

    /// Registers concepts and role types of a schema that is not part of
    /// the written output, such as an imported schema read from disk.
    pub fn register(&mut self, info: SchemaInfo) {
        debug!(
            uri = %info.uri,
            concepts = info.concepts.len(),
            role_types = info.role_types.len(),
            "Discovered schema"
        );
        for concept in info.concepts {
            self.concepts.entry(concept.name.clone()).or_insert(concept);
        }
        for role_type in info.role_types {
            self.role_types.entry(role_type.role_uri.clone()).or_insert(role_type);
        }
    }

    pub fn discover_linkbase(&mut self, doc: XmlDocument) {
        let extended_links = doc
            .root
            .children
            .iter()
            .filter(|c| c.get_attr(&Name::new(XLINK_NS, "type")) == Some("extended"))
            .count();
        info!(uri = %doc.uri, extended_links, "Emitted linkbase");
        self.documents.insert(doc.uri.clone(), doc);
    }

    /// Adds a `link:linkbaseRef` for `doc` to the entry schema and discovers it.
    pub fn attach_linkbase(&mut self, linkbase_type: &str, doc: XmlDocument) -> Result<()> {
        let entry = self.entry.clone();
        let schema = self
            .documents
            .get_mut(&entry)
            .ok_or_else(|| Error::Xml(format!("Entry schema {} is missing", entry)))?;
        let appinfo = schema
            .root
            .child_mut(XSD_NS, "annotation")
            .and_then(|annotation| annotation.child_mut(XSD_NS, "appinfo"))
            .ok_or_else(|| Error::Xml(format!("Entry schema {} has no appinfo", entry)))?;
        appinfo.add_child(
            Element::new(LINK_NS, "linkbaseRef")
                .attr(Name::new(XLINK_NS, "type"), "simple")
                .attr(Name::new(XLINK_NS, "href"), doc.uri.as_str())
                .attr(Name::new(XLINK_NS, "role"), crate::xbrl::linkbase_ref_role(linkbase_type))
                .attr(Name::new(XLINK_NS, "arcrole"), LINKBASE_ARCROLE),
        );
        self.discover_linkbase(doc);
        Ok(())
    }

    pub fn entry_uri(&self) -> &str {
        &self.entry
    }

    pub fn entry_schema(&self) -> Option<&XmlDocument> {
        self.documents.get(&self.entry)
    }

    pub fn document(&self, uri: &str) -> Option<&XmlDocument> {
        self.documents.get(uri)
    }

    pub fn documents(&self) -> impl Iterator<Item = &XmlDocument> {
        self.documents.values()
    }

    pub fn linkbases(&self) -> impl Iterator<Item = &XmlDocument> {
        self.documents.values().filter(|d| d.kind == DocumentKind::Linkbase)
    }

    /// Hrefs of the entry schema's linkbase references, in order.
    pub fn linkbase_refs(&self) -> Vec<&str> {
        let Some(schema) = self.entry_schema() else {
            return Vec::new();
        };
        schema
            .root
            .children_named(XSD_NS, "annotation")
            .flat_map(|annotation| annotation.children_named(XSD_NS, "appinfo"))
            .flat_map(|appinfo| appinfo.children_named(LINK_NS, "linkbaseRef"))
            .filter_map(|r| r.get_attr(&Name::new(XLINK_NS, "href")))
            .collect()
    }

    pub fn concept(&self, name: &ExpandedName) -> Option<&Concept> {
        self.concepts.get(name)
    }

    /// Resolves `prefix` against the entry schema's namespace declarations.
    pub fn resolve_prefixed(&self, prefix: &str, local: &str) -> Option<&Concept> {
        let ns = self.entry_schema()?.namespace_for_prefix(prefix)?;
        self.concepts.get(&ExpandedName::new(ns, local))
    }

    pub fn is_hypercube_item(&self, prefix: &str, local: &str) -> bool {
        self.resolve_prefixed(prefix, local).is_some_and(Concept::is_hypercube_item)
    }

    pub fn is_dimension_item(&self, prefix: &str, local: &str) -> bool {
        self.resolve_prefixed(prefix, local).is_some_and(Concept::is_dimension_item)
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn role_type(&self, role_uri: &str) -> Option<&RoleType> {
        self.role_types.get(role_uri)
    }

    /// Role types in discovery order.
    pub fn role_types(&self) -> impl Iterator<Item = &RoleType> {
        self.role_types.values()
    }

    /// First role type whose definition equals `definition`.
    pub fn find_role_by_definition(&self, definition: &str) -> Option<&RoleType> {
        self.role_types
            .values()
            .find(|r| r.definition.as_deref() == Some(definition))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn set_diagnostics(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
    }

    /// Writes the entry schema and every linkbase it references below
    /// `out_dir`, creating directories as needed. Absolute uris are written
    /// where they point.
    pub fn save<P: AsRef<Path>>(&self, out_dir: P) -> Result<Vec<PathBuf>> {
        let out_dir = out_dir.as_ref();
        let mut uris = vec![self.entry.as_str()];
        uris.extend(self.linkbase_refs());

        let mut written = Vec::with_capacity(uris.len());
        for uri in uris {
            let doc = self
                .documents
                .get(uri)
                .ok_or_else(|| Error::Xml(format!("Referenced document {} was never emitted", uri)))?;
            let path = out_dir.join(uri);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(&path)?);
            doc.write_to(&mut out)?;
            out.flush()?;
            debug!(path = %path.display(), "Saved document");
            written.push(path);
        }
        info!(documents = written.len(), dir = %out_dir.display(), "Saved taxonomy");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xbrl::{XBRLI_NS, XBRLDT_NS};
    use pretty_assertions::assert_eq;

    fn schema() -> XmlDocument {
        let mut root = Element::new(XSD_NS, "schema").plain_attr("targetNamespace", "http://x/ext");
        let appinfo = root
            .add_child(Element::new(XSD_NS, "annotation"))
            .add_child(Element::new(XSD_NS, "appinfo"));
        appinfo
            .add_child(
                Element::new(LINK_NS, "roleType")
                    .plain_attr("roleURI", "http://x/role/BS")
                    .plain_attr("id", "roleType_BS"),
            )
            .add_child(Element::new(LINK_NS, "definition").with_text("Balance Sheet"));
        root.add_child(
            Element::new(XSD_NS, "element")
                .plain_attr("name", "Table")
                .plain_attr("substitutionGroup", "xbrldt:hypercubeItem"),
        );
        root.add_child(
            Element::new(XSD_NS, "element")
                .plain_attr("name", "Axis")
                .plain_attr("substitutionGroup", "xbrldt:dimensionItem"),
        );
        root.add_child(
            Element::new(XSD_NS, "element")
                .plain_attr("name", "Cash")
                .plain_attr("substitutionGroup", "xbrli:item"),
        );

        let mut doc = XmlDocument::new("ext.xsd", DocumentKind::Schema, root).with_default_namespace(XSD_NS);
        doc.declare("ext", "http://x/ext");
        doc.declare("xbrli", XBRLI_NS);
        doc.declare("xbrldt", XBRLDT_NS);
        doc.declare("link", LINK_NS);
        doc.declare("xlink", XLINK_NS);
        doc
    }

    #[test]
    fn test_schema_discovery() {
        let taxonomy = Taxonomy::new(schema());

        assert_eq!(taxonomy.concept_count(), 3);
        assert!(taxonomy.is_hypercube_item("ext", "Table"));
        assert!(taxonomy.is_dimension_item("ext", "Axis"));
        assert!(!taxonomy.is_dimension_item("ext", "Cash"));
        assert!(taxonomy.resolve_prefixed("nope", "Cash").is_none());

        let role = taxonomy.role_type("http://x/role/BS").unwrap();
        assert_eq!(role.href(), "ext.xsd#roleType_BS");
        assert_eq!(
            taxonomy.find_role_by_definition("Balance Sheet").map(|r| r.role_uri.as_str()),
            Some("http://x/role/BS")
        );
    }

    #[test]
    fn test_registered_schemas_do_not_override_first_discovery() {
        let mut taxonomy = Taxonomy::new(schema());
        taxonomy.register(SchemaInfo {
            uri: "other.xsd".into(),
            target_namespace: "http://x/ext".into(),
            concepts: vec![Concept {
                name: ExpandedName::new("http://x/ext", "Table"),
                substitution_group: None,
                document: "other.xsd".into(),
            }],
            role_types: Vec::new(),
        });
        assert!(taxonomy.is_hypercube_item("ext", "Table"));
        assert!(taxonomy.document("other.xsd").is_none());
    }

    #[test]
    fn test_attach_and_save() {
        let mut taxonomy = Taxonomy::new(schema());
        let mut lb = XmlDocument::new("sub/ext-pre.xml", DocumentKind::Linkbase, Element::new(LINK_NS, "linkbase"));
        lb.declare("link", LINK_NS);
        taxonomy.attach_linkbase("presentation", lb).unwrap();

        assert_eq!(taxonomy.linkbase_refs(), vec!["sub/ext-pre.xml"]);
        assert_eq!(taxonomy.linkbases().count(), 1);

        let dir = tempfile::tempdir().unwrap();
        let written = taxonomy.save(dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("ext.xsd"), dir.path().join("sub/ext-pre.xml")]);

        let schema = std::fs::read_to_string(&written[0]).unwrap();
        assert!(schema.contains("xlink:role=\"http://www.xbrl.org/2003/role/presentationLinkbaseRef\""));
        assert!(schema.contains("xlink:href=\"sub/ext-pre.xml\""));
    }
}
