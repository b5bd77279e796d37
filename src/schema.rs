// Extension schema emission and local schema loading
use crate::compiler::Compilation;
use crate::model::{Imports, LinkbaseKind};
use crate::taxonomy::{resolve_qname, Concept, ExpandedName, RoleType, SchemaInfo};
use crate::xbrl::{LINK_NS, NONNUM_NS, XBRLDT_NS, XBRLI_NS, XLINK_NS, XSD_NS};
use crate::xml::{DocumentKind, Element, XmlDocument};
use crate::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct SchemaEmitter;

impl SchemaEmitter {
    /// Renders the entry schema. Linkbase references are appended to its
    /// appinfo later, as each linkbase is emitted.
    pub fn emit(compilation: &Compilation) -> XmlDocument {
        let ext = &compilation.extension;
        let directives = &compilation.directives;

        let mut root = Element::new(XSD_NS, "schema")
            .plain_attr("targetNamespace", ext.namespace.as_str())
            .plain_attr("attributeFormDefault", "unqualified")
            .plain_attr("elementFormDefault", "qualified");

        let appinfo = root
            .add_child(Element::new(XSD_NS, "annotation"))
            .add_child(Element::new(XSD_NS, "appinfo"));
        for (role_uri, definition) in &directives.roles {
            let role_type = appinfo.add_child(
                Element::new(LINK_NS, "roleType")
                    .plain_attr("roleURI", role_uri.as_str())
                    .plain_attr("id", role_type_id(role_uri)),
            );
            if !definition.is_empty() {
                role_type.add_child(Element::new(LINK_NS, "definition").with_text(definition.as_str()));
            }
            for kind in LinkbaseKind::ALL {
                if directives.linkbases.contains(kind.flag()) {
                    role_type.add_child(
                        Element::new(LINK_NS, "usedOn").with_text(format!("link:{}", kind.link_name())),
                    );
                }
            }
        }

        for import in directives.imports.sorted() {
            root.add_child(
                Element::new(XSD_NS, "import")
                    .plain_attr("namespace", import.namespace.as_str())
                    .plain_attr("schemaLocation", import.schema_location.as_str()),
            );
        }

        for element in compilation.elements.values() {
            root.add_child(Element::new(XSD_NS, "element").with_attributes(element.attributes.clone()));
        }

        let mut doc = XmlDocument::new(ext.filename.as_str(), DocumentKind::Schema, root)
            .with_default_namespace(XSD_NS);
        doc.declare("xsd", XSD_NS);
        doc.declare(&ext.prefix, &ext.namespace);
        for (prefix, namespace) in &directives.import_namespaces {
            doc.declare(prefix, namespace);
        }
        doc.declare("nonnum", NONNUM_NS);
        doc.declare("link", LINK_NS);
        doc.declare("xbrli", XBRLI_NS);
        doc.declare("xlink", XLINK_NS);
        doc.declare("xbrldt", XBRLDT_NS);

        info!(
            uri = %doc.uri,
            elements = compilation.elements.len(),
            role_types = directives.roles.len(),
            imports = directives.imports.len(),
            "Emitted extension schema"
        );
        doc
    }
}

/// `roleType_` followed by the last path segment of the role URI.
pub fn role_type_id(role_uri: &str) -> String {
    let last = role_uri.rsplit_once('/').map_or(role_uri, |(_, last)| last);
    format!("roleType_{}", last)
}

/// Reads imported schemas that are available as local files.
pub struct SchemaLoader {
    base_dir: PathBuf,
}

impl SchemaLoader {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Loads every import whose schema location is a relative or absolute
    /// file path that exists. Unreadable files are logged and skipped.
    pub fn load_imports(&self, imports: &Imports) -> Vec<SchemaInfo> {
        let mut loaded = Vec::new();
        for (prefix, import) in imports.iter() {
            let location = import.schema_location.as_str();
            if location.is_empty() || location.contains("://") {
                continue;
            }
            let path = self.base_dir.join(location);
            if !path.is_file() {
                debug!(prefix, path = %path.display(), "Imported schema not found locally");
                continue;
            }
            match self.load_file(&path, location) {
                Ok(info) => loaded.push(info),
                Err(e) => warn!(prefix, path = %path.display(), "Skipping imported schema: {}", e),
            }
        }
        loaded
    }

    pub fn load_file(&self, path: &Path, uri: &str) -> Result<SchemaInfo> {
        let content = std::fs::read(path)?;
        Self::parse_bytes(uri, &content)
    }

    pub fn parse_bytes(uri: &str, data: &[u8]) -> Result<SchemaInfo> {
        let mut reader = Reader::from_reader(data);
        reader.config_mut().trim_text(true);

        let mut scan = SchemaScan {
            info: SchemaInfo {
                uri: uri.to_string(),
                ..SchemaInfo::default()
            },
            ..SchemaScan::default()
        };
        let mut buf = Vec::new();
        let mut depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    scan.start(e, depth)?;
                    depth += 1;
                }
                Ok(Event::Empty(ref e)) => {
                    scan.start(e, depth)?;
                    scan.end(e.local_name().as_ref());
                }
                Ok(Event::Text(ref t)) if scan.in_definition => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Parse(format!("Schema parse error in {}: {}", uri, e)))?;
                    if let Some(role) = scan.role.as_mut() {
                        role.definition = Some(text.into_owned());
                    }
                }
                Ok(Event::End(ref e)) => {
                    depth = depth.saturating_sub(1);
                    scan.end(e.local_name().as_ref());
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Parse(format!("Schema parse error in {}: {}", uri, e))),
                _ => {}
            }
            buf.clear();
        }

        debug!(
            uri,
            concepts = scan.info.concepts.len(),
            role_types = scan.info.role_types.len(),
            "Loaded schema"
        );
        Ok(scan.info)
    }
}

#[derive(Default)]
struct SchemaScan {
    info: SchemaInfo,
    prefixes: Vec<(String, String)>,
    role: Option<RoleType>,
    in_definition: bool,
}

impl SchemaScan {
    fn start(&mut self, e: &BytesStart, depth: usize) -> Result<()> {
        let local_name = e.local_name();
        let local = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
        let attrs = attributes(e)?;
        let attr = |key: &str| attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

        match (local, depth) {
            ("schema", 0) => {
                self.info.target_namespace = attr("targetNamespace").unwrap_or_default().to_string();
                for (key, value) in &attrs {
                    if let Some(prefix) = key.strip_prefix("xmlns:") {
                        self.prefixes.push((prefix.to_string(), value.clone()));
                    }
                }
            }
            ("element", 1) => {
                if let Some(name) = attr("name") {
                    let substitution_group = attr("substitutionGroup").and_then(|qname| {
                        resolve_qname(qname, |prefix| {
                            self.prefixes
                                .iter()
                                .find(|(p, _)| p == prefix)
                                .map(|(_, ns)| ns.as_str())
                        })
                    });
                    self.info.concepts.push(Concept {
                        name: ExpandedName::new(&self.info.target_namespace, name),
                        substitution_group,
                        document: self.info.uri.clone(),
                    });
                }
            }
            ("roleType", _) => {
                if let Some(role_uri) = attr("roleURI") {
                    self.role = Some(RoleType {
                        role_uri: role_uri.to_string(),
                        id: attr("id").unwrap_or_default().to_string(),
                        definition: None,
                        document: self.info.uri.clone(),
                    });
                }
            }
            ("definition", _) => self.in_definition = self.role.is_some(),
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"definition" => self.in_definition = false,
            b"roleType" => {
                if let Some(role) = self.role.take() {
                    self.info.role_types.push(role);
                }
            }
            _ => {}
        }
    }
}

fn attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("").to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(format!("Bad attribute value for {}: {}", key, e)))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}
