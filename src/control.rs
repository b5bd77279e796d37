//! Control sheet directives
//!
//! Columns: action, filetype, prefix, filename, namespace URI. The first row
//! is a header and is skipped, as are rows whose first cell is empty.

use crate::diagnostics::{Diagnostics, RowError, RowOutcome, SheetKind};
use crate::model::{
    ExtensionSchema, Imports, LabelLinkbaseDecl, LinkbaseKind, LinkbaseKinds, LinkbaseRef,
};
use crate::sheet::{cell, Cell, Sheet};
use compact_str::CompactString;
use indexmap::IndexMap;
use tracing::{debug, info};

/// Everything the control sheet declares.
#[derive(Debug, Clone, Default)]
pub struct ControlDirectives {
    pub imports: Imports,
    /// Prefix → namespace of explicit import directives, in directive order.
    pub import_namespaces: IndexMap<CompactString, String>,
    pub extension: Option<ExtensionSchema>,
    pub linkbases: LinkbaseKinds,
    pub linkbase_refs: Vec<LinkbaseRef>,
    pub label_linkbases: Vec<LabelLinkbaseDecl>,
    /// Role URI → definition text.
    pub roles: IndexMap<String, String>,
}

struct Directive {
    action: String,
    filetype: String,
    prefix: String,
    filename: String,
    namespace: String,
}

impl Directive {
    fn read(row: &[Cell]) -> Result<Self, RowError> {
        let text = |col: usize| -> Result<String, RowError> {
            cell(row, col).text().map(|s| s.trim().to_string())
        };
        Ok(Self {
            action: text(0)?,
            filetype: text(1)?,
            prefix: text(2)?,
            filename: text(3)?,
            namespace: text(4)?,
        })
    }
}

pub struct ControlDirectiveParser;

impl ControlDirectiveParser {
    pub fn parse(sheet: &Sheet, diagnostics: &mut Diagnostics) -> ControlDirectives {
        let mut directives = ControlDirectives::default();

        for (index, row) in sheet.rows().enumerate().skip(1) {
            if cell(row, 0).is_empty() {
                continue;
            }
            let result = Directive::read(row).and_then(|d| directives.apply(d));
            diagnostics.record(SheetKind::Control, index, result);
        }

        info!(
            imports = directives.imports.len(),
            linkbase_refs = directives.linkbase_refs.len(),
            roles = directives.roles.len(),
            "Parsed control sheet"
        );
        directives
    }
}

impl ControlDirectives {
    fn apply(&mut self, d: Directive) -> Result<RowOutcome, RowError> {
        match (d.action.as_str(), d.filetype.as_str()) {
            ("import", _) => {
                if d.prefix.is_empty() {
                    return Err(RowError("import directive has no prefix".to_string()));
                }
                self.imports.insert(&d.prefix, &d.namespace, &d.filename);
                self.import_namespaces
                    .insert(CompactString::from(d.prefix.as_str()), d.namespace);
            }
            ("extension", "schema") => {
                if d.prefix.is_empty() || d.filename.is_empty() || d.namespace.is_empty() {
                    return Err(RowError(
                        "extension schema directive needs a prefix, a filename and a namespace".to_string(),
                    ));
                }
                self.extension = Some(ExtensionSchema {
                    prefix: CompactString::from(d.prefix.as_str()),
                    filename: d.filename,
                    namespace: d.namespace,
                });
            }
            ("extension", "linkbase") => {
                let mut tokens = d.prefix.split_whitespace();
                let linkbase_type = tokens.next().unwrap_or("unknown");
                let lang = tokens.next().unwrap_or("en");

                if linkbase_type == "label" {
                    self.label_linkbases.push(LabelLinkbaseDecl {
                        lang: CompactString::from(lang),
                        filename: d.filename.clone(),
                    });
                } else if let Some(kind) = LinkbaseKind::from_type(linkbase_type) {
                    self.linkbases |= kind.flag();
                }
                self.linkbase_refs.push(LinkbaseRef {
                    linkbase_type: CompactString::from(linkbase_type),
                    filename: d.filename,
                });
            }
            ("extension", "role") if !d.namespace.is_empty() => {
                // The filename column carries the role definition text.
                self.roles.insert(d.namespace, d.filename);
            }
            (action, filetype) => {
                debug!(action, filetype, "Ignoring control directive");
            }
        }
        Ok(RowOutcome::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn control(rows: &[&[&str]]) -> (ControlDirectives, Diagnostics) {
        let mut all: Vec<&[&str]> = vec![&["action", "filetype", "prefix", "filename", "namespaceURI"]];
        all.extend_from_slice(rows);
        let sheet = Sheet::from_strings("control", &all);
        let mut diagnostics = Diagnostics::new();
        let directives = ControlDirectiveParser::parse(&sheet, &mut diagnostics);
        (directives, diagnostics)
    }

    #[test]
    fn test_imports_and_schema_identity() {
        let (d, diagnostics) = control(&[
            &["import", "schema", "jppfs", "jppfs_cor.xsd", "http://jppfs/cor"],
            &["extension", "schema", "ext", "ext.xsd", "http://x/ext"],
            &["extension", "schema", "ext2", "ext2.xsd", "http://x/ext2"],
        ]);

        assert!(diagnostics.is_empty());
        assert_eq!(d.imports.get("jppfs").unwrap().schema_location, "jppfs_cor.xsd");
        assert_eq!(d.import_namespaces.get("jppfs").map(String::as_str), Some("http://jppfs/cor"));
        let ext = d.extension.unwrap();
        assert_eq!(ext.prefix, "ext2");
        assert_eq!(ext.filename, "ext2.xsd");
        assert_eq!(ext.namespace, "http://x/ext2");
    }

    #[test]
    fn test_linkbase_directives() {
        let (d, _) = control(&[
            &["extension", "linkbase", "presentation", "ext-pre.xml", ""],
            &["extension", "linkbase", "label ja", "ext-lab-ja.xml", ""],
            &["extension", "linkbase", "label", "ext-lab.xml", ""],
            &["extension", "linkbase", "", "mystery.xml", ""],
            &["extension", "linkbase", "calculation", "ext-cal.xml", ""],
        ]);

        assert_eq!(d.linkbases, LinkbaseKinds::PRESENTATION | LinkbaseKinds::CALCULATION);
        assert_eq!(
            d.label_linkbases,
            vec![
                LabelLinkbaseDecl { lang: "ja".into(), filename: "ext-lab-ja.xml".into() },
                LabelLinkbaseDecl { lang: "en".into(), filename: "ext-lab.xml".into() },
            ]
        );
        let types: Vec<_> = d.linkbase_refs.iter().map(|r| r.linkbase_type.as_str()).collect();
        assert_eq!(types, vec!["presentation", "label", "label", "unknown", "calculation"]);
    }

    #[test]
    fn test_role_directive_uses_filename_as_definition() {
        let (d, _) = control(&[
            &["extension", "role", "", "Balance Sheet", "http://x/role/BS"],
            &["extension", "role", "", "No URI", ""],
        ]);
        assert_eq!(d.roles.len(), 1);
        assert_eq!(d.roles.get("http://x/role/BS").map(String::as_str), Some("Balance Sheet"));
    }

    #[test]
    fn test_bad_row_is_reported_and_skipped() {
        let sheet = Sheet::from_rows(
            "control",
            vec![
                vec![Cell::from("action")],
                vec![Cell::from("import"), Cell::from("schema"), Cell::Error("Ref".into())],
                vec![Cell::Empty, Cell::from("ignored")],
                vec![
                    Cell::from("extension"),
                    Cell::from("schema"),
                    Cell::from("ext"),
                    Cell::from("ext.xsd"),
                    Cell::from("http://x/ext"),
                ],
            ],
        );
        let mut diagnostics = Diagnostics::new();
        let d = ControlDirectiveParser::parse(&sheet, &mut diagnostics);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].row, Some(1));
        assert!(d.extension.is_some());
        assert_eq!(d.imports.len(), 1);
    }
}
