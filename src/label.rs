//! Label linkbase emission
//!
//! One linkbase per declared language, each with a single `link:labelLink`
//! in the default link role.

use crate::compiler::Compilation;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::linkbase::{concept_href, linkbase_document, locator};
use crate::taxonomy::Taxonomy;
use crate::xbrl::{format_decimal, CONCEPT_LABEL, DEFAULT_LINK_ROLE, LINK_NS, XLINK_NS, XML_NS};
use crate::xml::{Element, Name, XmlDocument};
use crate::Result;
use ahash::AHashSet;
use tracing::debug;

pub struct LabelLinkbaseEmitter<'a> {
    compilation: &'a Compilation,
}

impl<'a> LabelLinkbaseEmitter<'a> {
    pub fn new(compilation: &'a Compilation) -> Self {
        Self { compilation }
    }

    pub fn emit(&self, lang: &str, uri: &str, diagnostics: &mut Diagnostics) -> XmlDocument {
        let mut doc = linkbase_document(uri);
        let link = doc.root.add_child(
            Element::new(LINK_NS, "labelLink")
                .attr(Name::new(XLINK_NS, "type"), "extended")
                .attr(Name::new(XLINK_NS, "role"), DEFAULT_LINK_ROLE),
        );

        let mut locators = AHashSet::new();
        let mut resources = 0usize;
        for ((prefix, name), entries) in self.compilation.labels.by_concept(lang) {
            let Some(href) = concept_href(self.compilation, prefix, name) else {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::UnresolvedHref,
                    format!("{}:{} has labels but no schema to locate it", prefix, name),
                ));
                continue;
            };
            let loc_label = format!("{}_{}", prefix, name);
            let resource_label = format!("label_{}", loc_label);
            if locators.insert(loc_label.clone()) {
                link.add_child(locator(&href, &loc_label));
            }

            for (key, texts) in entries {
                for text in texts {
                    link.add_child(
                        Element::new(LINK_NS, "label")
                            .attr(Name::new(XLINK_NS, "type"), "resource")
                            .attr(Name::new(XLINK_NS, "label"), resource_label.as_str())
                            .attr(Name::new(XLINK_NS, "role"), key.role.as_str())
                            .attr(Name::new(XML_NS, "lang"), lang)
                            .with_text(text.as_str()),
                    );
                    link.add_child(
                        Element::new(LINK_NS, "labelArc")
                            .attr(Name::new(XLINK_NS, "type"), "arc")
                            .attr(Name::new(XLINK_NS, "arcrole"), CONCEPT_LABEL)
                            .attr(Name::new(XLINK_NS, "from"), loc_label.as_str())
                            .attr(Name::new(XLINK_NS, "to"), resource_label.as_str())
                            .plain_attr("order", format_decimal(1.0)),
                    );
                    resources += 1;
                }
            }
        }

        debug!(uri, lang, locators = locators.len(), resources, "Built label linkbase");
        doc
    }
}

/// Emits one label linkbase per distinct declared language. A language
/// declared again keeps its first file.
pub fn emit_label_linkbases(
    compilation: &Compilation,
    taxonomy: &mut Taxonomy,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let emitter = LabelLinkbaseEmitter::new(compilation);
    let mut languages = AHashSet::new();
    for decl in &compilation.directives.label_linkbases {
        if !languages.insert(decl.lang.as_str()) {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::DuplicateLabelLanguage,
                format!(
                    "label linkbase {} repeats language '{}', keeping the first declaration",
                    decl.filename, decl.lang
                ),
            ));
            continue;
        }
        let doc = emitter.emit(&decl.lang, &decl.filename, diagnostics);
        taxonomy.attach_linkbase("label", doc)?;
    }
    Ok(())
}
