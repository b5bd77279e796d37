// Linkbase emission for XBRL
use crate::compiler::Compilation;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::forest::{Forest, NodeId, NodeKind, Relation};
use crate::model::LinkbaseKind;
use crate::taxonomy::Taxonomy;
use crate::xbrl::{
    format_decimal, ALL, DEFAULT_LINK_ROLE, DIMENSIONAL_ARCROLES, DIMENSION_DOMAIN, DOMAIN_MEMBER,
    HYPERCUBE_DIMENSION, LINKBASE_SCHEMA_LOCATION, LINK_NS, PARENT_CHILD, SUMMATION_ITEM, UNSPECIFIED_ROLE,
    XBRLDT_SCHEMA_LOCATION, XBRLI_NS, XLINK_NS, XSI_NS,
};
use crate::xml::{DocumentKind, Element, Name, XmlDocument};
use crate::Result;
use ahash::AHashSet;
use std::collections::BTreeSet;
use tracing::debug;

/// Empty `link:linkbase` document with the standard declarations.
pub fn linkbase_document(uri: &str) -> XmlDocument {
    let root = Element::new(LINK_NS, "linkbase").attr(
        Name::new(XSI_NS, "schemaLocation"),
        format!("{} {}", LINK_NS, LINKBASE_SCHEMA_LOCATION),
    );
    let mut doc = XmlDocument::new(uri, DocumentKind::Linkbase, root);
    doc.declare("xsi", XSI_NS);
    doc.declare("link", LINK_NS);
    doc.declare("xlink", XLINK_NS);
    doc.declare("xbrli", XBRLI_NS);
    doc
}

/// `<schema>#<prefix>_<name>` for a concept of the extension schema or of
/// an imported schema.
pub fn concept_href(compilation: &Compilation, prefix: &str, name: &str) -> Option<String> {
    let schema = if prefix == compilation.extension.prefix {
        compilation.extension.filename.as_str()
    } else {
        compilation.directives.imports.get(prefix)?.schema_location.as_str()
    };
    Some(format!("{}#{}_{}", schema, prefix, name))
}

pub fn locator(href: &str, label: &str) -> Element {
    Element::new(LINK_NS, "loc")
        .attr(Name::new(XLINK_NS, "type"), "locator")
        .attr(Name::new(XLINK_NS, "href"), href)
        .attr(Name::new(XLINK_NS, "label"), label)
}

/// roleRef sorts before arcroleRef.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Reference {
    Role { uri: String, href: String },
    Arcrole { uri: String, href: String },
}

impl Reference {
    fn element(&self) -> Element {
        let (local, uri_attr, uri, href) = match self {
            Reference::Role { uri, href } => ("roleRef", "roleURI", uri, href),
            Reference::Arcrole { uri, href } => ("arcroleRef", "arcroleURI", uri, href),
        };
        Element::new(LINK_NS, local)
            .plain_attr(uri_attr, uri.as_str())
            .attr(Name::new(XLINK_NS, "type"), "simple")
            .attr(Name::new(XLINK_NS, "href"), href.as_str())
    }
}

/// State of one walk: references found so far plus skipped-concept warnings.
#[derive(Default)]
struct Walk {
    references: BTreeSet<Reference>,
    arcs: usize,
    diagnostics: Vec<Diagnostic>,
}

/// Renders one relationship forest as a presentation, definition or
/// calculation linkbase.
pub struct LinkbaseTreeWalker<'a> {
    kind: LinkbaseKind,
    compilation: &'a Compilation,
    taxonomy: &'a Taxonomy,
}

impl<'a> LinkbaseTreeWalker<'a> {
    pub fn new(kind: LinkbaseKind, compilation: &'a Compilation, taxonomy: &'a Taxonomy) -> Self {
        Self {
            kind,
            compilation,
            taxonomy,
        }
    }

    pub fn emit(&self, uri: &str, diagnostics: &mut Diagnostics) -> XmlDocument {
        let forest = self.compilation.forests.get(self.kind);
        let mut doc = linkbase_document(uri);
        let mut walk = Walk::default();

        if self.kind == LinkbaseKind::Definition {
            for (arcrole, anchor) in DIMENSIONAL_ARCROLES {
                walk.references.insert(Reference::Arcrole {
                    uri: arcrole.to_string(),
                    href: format!("{}#{}", XBRLDT_SCHEMA_LOCATION, anchor),
                });
            }
        }

        for frame in forest.frames() {
            self.frame(forest, *frame, &mut doc.root, &mut walk);
        }

        // References go ahead of the first extended link.
        for (index, reference) in walk.references.iter().enumerate() {
            doc.root.insert_before(index, reference.element());
        }

        debug!(
            uri,
            kind = self.kind.as_str(),
            extended_links = forest.frames().len(),
            arcs = walk.arcs,
            references = walk.references.len(),
            "Walked linkbase tree"
        );
        for diagnostic in walk.diagnostics {
            diagnostics.push(diagnostic);
        }
        doc
    }

    fn role_for(&self, role_uri: Option<&str>, title: Option<&str>) -> String {
        if let Some(uri) = role_uri {
            return uri.to_string();
        }
        title
            .and_then(|t| self.taxonomy.find_role_by_definition(t))
            .map(|r| r.role_uri.clone())
            .unwrap_or_else(|| UNSPECIFIED_ROLE.to_string())
    }

    fn frame(&self, forest: &Forest, id: NodeId, root: &mut Element, walk: &mut Walk) {
        let NodeKind::Frame { role_uri, title } = &forest.node(id).kind else {
            return;
        };
        let role = self.role_for(role_uri.as_deref(), title.as_deref());
        if role != DEFAULT_LINK_ROLE {
            if let Some(role_type) = self.taxonomy.role_type(&role) {
                walk.references.insert(Reference::Role {
                    uri: role.clone(),
                    href: role_type.href(),
                });
            }
        }

        let link = root.add_child(
            Element::new(LINK_NS, &self.kind.link_name())
                .attr(Name::new(XLINK_NS, "type"), "extended")
                .attr(Name::new(XLINK_NS, "role"), role),
        );
        let mut locators = AHashSet::new();
        self.descend(forest, forest.children(id), None, link, &mut locators, walk);
    }

    fn descend(
        &self,
        forest: &Forest,
        ids: &[NodeId],
        from: Option<(&str, &str)>,
        link: &mut Element,
        locators: &mut AHashSet<String>,
        walk: &mut Walk,
    ) {
        let mut order = 1.0;
        for &id in ids {
            let NodeKind::Concept { prefix, name, relation } = &forest.node(id).kind else {
                continue;
            };
            let Some(href) = concept_href(self.compilation, prefix, name) else {
                walk.diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::UnresolvedHref,
                    format!(
                        "{}:{} in the {} linkbase has no schema to locate it, subtree skipped",
                        prefix,
                        name,
                        self.kind.as_str()
                    ),
                ));
                continue;
            };
            let label = format!("{}_{}", prefix, name);
            if locators.insert(href.clone()) {
                link.add_child(locator(&href, &label));
            }

            if let Some((from_prefix, from_name)) = from.filter(|_| *relation != Relation::Root) {
                let arcrole = match relation {
                    Relation::SummationItem(_) => SUMMATION_ITEM,
                    Relation::PendingDimension => {
                        self.dimensional_arcrole((from_prefix, from_name), (prefix.as_str(), name.as_str()))
                    }
                    Relation::ParentChild | Relation::Root => PARENT_CHILD,
                };
                let mut arc = Element::new(LINK_NS, &self.kind.arc_name())
                    .attr(Name::new(XLINK_NS, "type"), "arc")
                    .attr(Name::new(XLINK_NS, "arcrole"), arcrole)
                    .attr(Name::new(XLINK_NS, "from"), format!("{}_{}", from_prefix, from_name))
                    .attr(Name::new(XLINK_NS, "to"), label.as_str())
                    .plain_attr("order", format_decimal(order));
                if let Relation::SummationItem(weight) = relation {
                    arc = arc.plain_attr("weight", format_decimal(*weight));
                }
                link.add_child(arc);
                walk.arcs += 1;
                order += 1.0;
            }

            // Summation items are leaves of their calculation tree.
            if self.kind != LinkbaseKind::Calculation || *relation == Relation::Root {
                let from = Some((prefix.as_str(), name.as_str()));
                self.descend(forest, forest.children(id), from, link, locators, walk);
            }
        }
    }

    fn dimensional_arcrole(&self, from: (&str, &str), to: (&str, &str)) -> &'static str {
        if self.taxonomy.is_hypercube_item(to.0, to.1) {
            ALL
        } else if self.taxonomy.is_dimension_item(to.0, to.1) {
            HYPERCUBE_DIMENSION
        } else if self.taxonomy.is_dimension_item(from.0, from.1) {
            DIMENSION_DOMAIN
        } else {
            DOMAIN_MEMBER
        }
    }
}

/// Emits the presentation, definition and calculation linkbases whose flag
/// is set, each into the file of the first linkbase directive of its type.
pub fn emit_structural_linkbases(
    compilation: &Compilation,
    taxonomy: &mut Taxonomy,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    for kind in LinkbaseKind::ALL {
        if !compilation.directives.linkbases.contains(kind.flag()) {
            continue;
        }
        let Some(linkbase_ref) = compilation
            .directives
            .linkbase_refs
            .iter()
            .find(|r| r.linkbase_type == kind.as_str())
        else {
            continue;
        };
        let doc = LinkbaseTreeWalker::new(kind, compilation, taxonomy).emit(&linkbase_ref.filename, diagnostics);
        taxonomy.attach_linkbase(kind.as_str(), doc)?;
    }
    Ok(())
}
