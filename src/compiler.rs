//! Data sheet compilation
//!
//! One pass over the data sheet. Each row is classified as a header row, a
//! section row (the row right above a header row) or a data row, and data
//! rows are read into a [`DataRow`] before anything is written, so a row that
//! fails to read leaves the accumulators untouched.

use crate::control::{ControlDirectiveParser, ControlDirectives};
use crate::diagnostics::{DiagnosticCode, Diagnostics, RowError, RowOutcome, SheetKind};
use crate::forest::{Forests, Relation};
use crate::header::{ColumnRole, HeaderDetector, HeaderMap, LabelColumn, LabelKind};
use crate::model::{
    split_qname, ExtensionElement, ExtensionSchema, Imports, LabelKey, Labels, LinkbaseKind, LinkbaseKinds,
};
use crate::sheet::{cell, Cell, Sheet, Workbook, CONTROL_SHEET, DATA_SHEET};
use crate::xbrl::XBRLI_NS;
use crate::xml::{Attributes, Name};
use crate::{Error, Result};
use compact_str::CompactString;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Localized "item list" suffix trimmed from section titles.
const ITEM_LIST_SUFFIX: &str = "\u{3000}科目一覧";

/// Current extended link role, set by section rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElrContext {
    pub role_uri: Option<String>,
    pub title: Option<String>,
}

/// Cross-row state of the data sheet pass.
#[derive(Debug, Clone, Default)]
pub struct CompilerState {
    pub header: Option<HeaderMap>,
    pub elr: ElrContext,
    pub imports: Imports,
    /// Element declarations by name; the first row naming an element wins.
    pub elements: BTreeMap<CompactString, ExtensionElement>,
    pub labels: Labels,
    pub forests: Forests,
}

impl CompilerState {
    pub fn new(imports: Imports) -> Self {
        Self {
            imports,
            ..Self::default()
        }
    }
}

/// Output of the compile passes, ready for emission.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub directives: ControlDirectives,
    pub extension: ExtensionSchema,
    pub elements: BTreeMap<CompactString, ExtensionElement>,
    pub labels: Labels,
    pub forests: Forests,
    pub diagnostics: Diagnostics,
}

/// Runs the control, header and data passes over `workbook`.
pub fn compile_workbook(workbook: &Workbook) -> Result<Compilation> {
    let control = workbook.sheet(CONTROL_SHEET)?;
    let data = workbook.sheet(DATA_SHEET)?;
    compile_sheets(control, data)
}

pub fn compile_sheets(control: &Sheet, data: &Sheet) -> Result<Compilation> {
    let mut diagnostics = Diagnostics::new();
    let mut directives = ControlDirectiveParser::parse(control, &mut diagnostics);
    let extension = directives.extension.clone().ok_or(Error::MissingExtensionSchema)?;

    let header_rows = HeaderDetector::detect(data);
    let compiler = RowCompiler::new(&header_rows, &extension, directives.linkbases);
    let state = compiler.compile(
        data,
        CompilerState::new(directives.imports.clone()),
        &mut diagnostics,
    );

    info!(
        elements = state.elements.len(),
        labels = state.labels.resource_count(),
        presentation_nodes = state.forests.presentation.concept_count(),
        definition_nodes = state.forests.definition.concept_count(),
        calculation_nodes = state.forests.calculation.concept_count(),
        diagnostics = diagnostics.len(),
        "Compiled data sheet"
    );

    directives.imports = state.imports;
    Ok(Compilation {
        directives,
        extension,
        elements: state.elements,
        labels: state.labels,
        forests: state.forests,
        diagnostics,
    })
}

#[derive(Debug, Default)]
struct ElementCells {
    element_type: String,
    substitution_group: String,
    abstract_: String,
    nillable: String,
    balance: String,
    period_type: String,
}

struct Calculation {
    parent_prefix: String,
    parent_name: String,
    weight: f64,
}

/// Everything a data row contributes, read before any state is touched.
struct DataRow {
    prefix: String,
    name: String,
    depth: Option<usize>,
    element: ElementCells,
    calculation: Option<Calculation>,
    labels: Vec<(LabelColumn, Vec<String>)>,
}

impl DataRow {
    fn read(row: &[Cell], header: &HeaderMap) -> std::result::Result<Self, RowError> {
        let column = |role: ColumnRole| header.get(role).map(|col| cell(row, col));
        let text = |role: ColumnRole| -> std::result::Result<String, RowError> {
            match column(role) {
                Some(c) => c.text().map(|s| s.trim().to_string()),
                None => Ok(String::new()),
            }
        };

        let depth = column(ColumnRole::Depth)
            .and_then(Cell::as_integer)
            .and_then(|d| usize::try_from(d).ok());

        let element = ElementCells {
            element_type: text(ColumnRole::Type)?,
            substitution_group: text(ColumnRole::SubstitutionGroup)?,
            abstract_: text(ColumnRole::Abstract)?,
            nillable: text(ColumnRole::Nillable)?,
            balance: text(ColumnRole::Balance)?,
            period_type: text(ColumnRole::PeriodType)?,
        };

        let parent = text(ColumnRole::CalculationParent)?;
        let weight_text = text(ColumnRole::CalculationWeight)?;
        let weight = column(ColumnRole::CalculationWeight).and_then(Cell::as_number);
        if weight.is_none() && !weight_text.is_empty() && !parent.is_empty() {
            return Err(RowError(format!(
                "calculation weight '{}' is not a finite number",
                weight_text
            )));
        }
        let calculation = match (split_qname(&parent), weight) {
            (Some((parent_prefix, parent_name)), Some(weight)) => Some(Calculation {
                parent_prefix: parent_prefix.to_string(),
                parent_name: parent_name.to_string(),
                weight,
            }),
            (None, Some(_)) if !parent.is_empty() => {
                debug!(parent = %parent, "Calculation parent is not a prefixed name");
                None
            }
            _ => None,
        };

        let mut labels = Vec::new();
        for (label, col) in header.label_columns() {
            let c = cell(row, col);
            if c.is_empty() {
                continue;
            }
            let value = c.text()?;
            let texts: Vec<String> = match label.kind {
                LabelKind::Single => vec![value.trim().to_string()],
                LabelKind::Multi => value.lines().map(|line| line.trim().to_string()).collect(),
            };
            let texts: Vec<String> = texts.into_iter().filter(|t| !t.is_empty()).collect();
            if !texts.is_empty() {
                labels.push((label, texts));
            }
        }

        Ok(Self {
            prefix: text(ColumnRole::Prefix)?,
            name: text(ColumnRole::Name)?,
            depth,
            element,
            calculation,
            labels,
        })
    }
}

pub struct RowCompiler<'a> {
    header_rows: &'a BTreeSet<usize>,
    extension: &'a ExtensionSchema,
    linkbases: LinkbaseKinds,
}

impl<'a> RowCompiler<'a> {
    pub fn new(header_rows: &'a BTreeSet<usize>, extension: &'a ExtensionSchema, linkbases: LinkbaseKinds) -> Self {
        Self {
            header_rows,
            extension,
            linkbases,
        }
    }

    pub fn compile(&self, sheet: &Sheet, mut state: CompilerState, diagnostics: &mut Diagnostics) -> CompilerState {
        for (index, row) in sheet.rows().enumerate() {
            let result = self.compile_row(&mut state, index, row);
            diagnostics.record(SheetKind::Data, index, result);
        }
        state
    }

    pub fn compile_row(
        &self,
        state: &mut CompilerState,
        index: usize,
        row: &[Cell],
    ) -> std::result::Result<RowOutcome, RowError> {
        if self.header_rows.contains(&index) {
            let header = HeaderMap::from_row(row);
            debug!(row = index, columns = header.len(), "Header row");
            state.header = Some(header);
            return Ok(RowOutcome::default());
        }
        if self.header_rows.contains(&(index + 1)) {
            self.section_row(state, row);
            return Ok(RowOutcome::default());
        }
        let Some(header) = state.header.as_ref() else {
            return Ok(RowOutcome::default());
        };
        let data = DataRow::read(row, header)?;
        Ok(self.commit(state, data))
    }

    fn section_row(&self, state: &mut CompilerState, row: &[Cell]) {
        state.elr = ElrContext::default();
        for value in row.iter().filter_map(Cell::as_str).map(str::trim) {
            if value.starts_with("http://") || value.starts_with("https://") {
                state.elr.role_uri = Some(value.to_string());
            } else if state.elr.title.is_none() && !value.is_empty() {
                let title = value.strip_suffix(ITEM_LIST_SUFFIX).unwrap_or(value);
                state.elr.title = Some(title.to_string());
            }
        }

        if state.elr.role_uri.is_none() && state.elr.title.is_none() {
            return;
        }
        debug!(role = ?state.elr.role_uri, title = ?state.elr.title, "Section row");
        for kind in LinkbaseKind::ALL {
            if self.linkbases.contains(kind.flag()) {
                state
                    .forests
                    .get_mut(kind)
                    .push_frame(state.elr.role_uri.clone(), state.elr.title.clone());
            }
        }
    }

    fn commit(&self, state: &mut CompilerState, row: DataRow) -> RowOutcome {
        let mut outcome = RowOutcome::default();
        if row.name.is_empty() {
            return outcome;
        }

        if row.prefix == self.extension.prefix && !state.elements.contains_key(row.name.as_str()) {
            let element = self.element(&mut state.imports, &row, &mut outcome);
            state.elements.insert(element.name.clone(), element);
        }

        if let Some(depth) = row.depth {
            for kind in [LinkbaseKind::Presentation, LinkbaseKind::Definition] {
                if !self.linkbases.contains(kind.flag()) {
                    continue;
                }
                let relation = match (kind, depth) {
                    (_, 0) => Relation::Root,
                    (LinkbaseKind::Definition, _) => Relation::PendingDimension,
                    _ => Relation::ParentChild,
                };
                if let Err(err) = state
                    .forests
                    .get_mut(kind)
                    .insert_at_depth(depth, &row.prefix, &row.name, relation)
                {
                    outcome.warn(
                        DiagnosticCode::MissingAncestor,
                        format!("{}:{} dropped from the {} linkbase: {}", row.prefix, row.name, kind.as_str(), err),
                    );
                }
            }
        }

        if let Some(calc) = &row.calculation {
            if self.linkbases.contains(LinkbaseKinds::CALCULATION) {
                let forest = &mut state.forests.calculation;
                let inserted = forest
                    .insert_at_depth(0, &calc.parent_prefix, &calc.parent_name, Relation::Root)
                    .and_then(|_| {
                        forest.insert_at_depth(1, &row.prefix, &row.name, Relation::SummationItem(calc.weight))
                    });
                if let Err(err) = inserted {
                    outcome.warn(
                        DiagnosticCode::MissingAncestor,
                        format!("{}:{} dropped from the calculation linkbase: {}", row.prefix, row.name, err),
                    );
                }
            }
        }

        for (label, texts) in row.labels {
            state.labels.set(
                LabelKey {
                    prefix: CompactString::from(row.prefix.as_str()),
                    name: CompactString::from(row.name.as_str()),
                    lang: CompactString::from(label.lang),
                    role: CompactString::from(label.role),
                },
                texts,
            );
        }

        outcome
    }

    fn element(&self, imports: &mut Imports, row: &DataRow, outcome: &mut RowOutcome) -> ExtensionElement {
        let cells = &row.element;
        let mut attributes = Attributes::new();
        attributes.push(Name::local("name"), row.name.as_str());
        attributes.push(Name::local("id"), format!("{}_{}", row.prefix, row.name));
        if !cells.element_type.is_empty() {
            attributes.push(Name::local("type"), cells.element_type.as_str());
            self.check_import(imports, &cells.element_type, outcome);
        }
        if !cells.substitution_group.is_empty() {
            attributes.push(Name::local("substitutionGroup"), cells.substitution_group.as_str());
            self.check_import(imports, &cells.substitution_group, outcome);
        }
        if !cells.abstract_.is_empty() {
            attributes.push(Name::local("abstract"), cells.abstract_.as_str());
        }
        if !cells.nillable.is_empty() {
            attributes.push(Name::local("nillable"), cells.nillable.as_str());
        }
        if !cells.balance.is_empty() {
            attributes.push(Name::new(XBRLI_NS, "balance"), cells.balance.as_str());
        }
        if !cells.period_type.is_empty() {
            attributes.push(Name::new(XBRLI_NS, "periodType"), cells.period_type.as_str());
        }
        ExtensionElement {
            name: CompactString::from(row.name.as_str()),
            attributes,
        }
    }

    fn check_import(&self, imports: &mut Imports, qname: &str, outcome: &mut RowOutcome) {
        let Some((prefix, _)) = split_qname(qname) else {
            return;
        };
        if prefix == self.extension.prefix || imports.ensure_builtin(prefix) {
            return;
        }
        outcome.warn(
            DiagnosticCode::MissingImport,
            format!("prefix schema file is not imported for: {}", qname),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::forest::{Forest, NodeKind};
    use crate::xbrl::{STANDARD_LABEL, XBRLDT_NS};
    use pretty_assertions::assert_eq;

    fn control(linkbases: &[&str]) -> Sheet {
        let mut rows: Vec<Vec<Cell>> = vec![
            vec![Cell::from("action")],
            ["extension", "schema", "ext", "ext.xsd", "http://x/ext"]
                .iter()
                .map(|s| Cell::from(*s))
                .collect(),
        ];
        for kind in linkbases {
            rows.push(
                ["extension", "linkbase", kind, &format!("ext-{}.xml", kind), ""]
                    .iter()
                    .map(|s| Cell::from(*s))
                    .collect(),
            );
        }
        Sheet::from_rows("control", rows)
    }

    fn compile(linkbases: &[&str], data: &[&[&str]]) -> Compilation {
        compile_sheets(&control(linkbases), &Sheet::from_strings("data", data)).unwrap()
    }

    fn concept_names(forest: &Forest, ids: &[crate::forest::NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| match &forest.node(*id).kind {
                NodeKind::Concept { name, .. } => name.to_string(),
                NodeKind::Frame { .. } => "<frame>".to_string(),
            })
            .collect()
    }

    const HEADER: &[&str] = &["prefix", "name", "type", "depth", "calculation parent", "calculation weight", "label"];

    #[test]
    fn test_presentation_tree_from_depths() {
        let c = compile(
            &["presentation"],
            &[
                &["http://x/role/BS"],
                HEADER,
                &["ext", "A", "", "0"],
                &["ext", "B", "", "1"],
                &["ext", "C", "", "2"],
                &["ext", "D", "", "1"],
            ],
        );
        let forest = &c.forests.presentation;
        let frame = forest.frames()[0];
        assert_eq!(
            forest.node(frame).kind,
            NodeKind::Frame { role_uri: Some("http://x/role/BS".into()), title: None }
        );
        let a = forest.children(frame)[0];
        assert_eq!(concept_names(forest, forest.children(a)), vec!["B", "D"]);
        let b = forest.children(a)[0];
        assert_eq!(concept_names(forest, forest.children(b)), vec!["C"]);
        assert!(c.forests.definition.is_empty());
        assert!(c.diagnostics.is_empty());
    }

    #[test]
    fn test_section_title_suffix_is_stripped() {
        let c = compile(
            &["presentation", "definition"],
            &[&["", "貸借対照表\u{3000}科目一覧", "other"], HEADER],
        );
        for forest in [&c.forests.presentation, &c.forests.definition] {
            let frame = forest.frames()[0];
            assert_eq!(
                forest.node(frame).kind,
                NodeKind::Frame { role_uri: None, title: Some("貸借対照表".into()) }
            );
        }
        assert!(c.forests.calculation.frames().is_empty());
    }

    #[test]
    fn test_relation_markers() {
        let c = compile(
            &["presentation", "definition"],
            &[&["http://x/role/D"], HEADER, &["ext", "Table", "", "0"], &["ext", "Axis", "", "1"]],
        );
        let relation = |forest: &Forest| {
            let root = forest.children(forest.frames()[0])[0];
            let child = forest.children(root)[0];
            match (&forest.node(root).kind, &forest.node(child).kind) {
                (NodeKind::Concept { relation: r, .. }, NodeKind::Concept { relation: c, .. }) => (*r, *c),
                _ => unreachable!(),
            }
        };
        assert_eq!(relation(&c.forests.presentation), (Relation::Root, Relation::ParentChild));
        assert_eq!(relation(&c.forests.definition), (Relation::Root, Relation::PendingDimension));
    }

    #[test]
    fn test_duplicate_elements_first_wins() {
        let c = compile(
            &[],
            &[
                HEADER,
                &["ext", "Cash", "xbrli:monetaryItemType", "0"],
                &["ext", "Cash", "xbrli:stringItemType", "0"],
                &["other", "Foreign", "xbrli:stringItemType", "0"],
            ],
        );
        assert_eq!(c.elements.len(), 1);
        let cash = &c.elements["Cash"];
        assert_eq!(cash.attributes.get(&Name::local("type")), Some("xbrli:monetaryItemType"));
        assert_eq!(cash.attributes.get(&Name::local("id")), Some("ext_Cash"));
    }

    #[test]
    fn test_element_attributes_in_order() {
        let c = compile(
            &[],
            &[
                &["prefix", "name", "type", "substitutionGroup", "abstract", "nillable", "balance", "periodType", "depth"],
                &["ext", "Cash", "xbrli:monetaryItemType", "xbrli:item", "false", "true", "debit", "instant", ""],
            ],
        );
        let names: Vec<_> = c.elements["Cash"]
            .attributes
            .iter()
            .map(|(n, _)| (n.namespace.as_ref().map(|s| s.to_string()), n.local.to_string()))
            .collect();
        assert_eq!(
            names,
            vec![
                (None, "name".to_string()),
                (None, "id".to_string()),
                (None, "type".to_string()),
                (None, "substitutionGroup".to_string()),
                (None, "abstract".to_string()),
                (None, "nillable".to_string()),
                (Some(XBRLI_NS.to_string()), "balance".to_string()),
                (Some(XBRLI_NS.to_string()), "periodType".to_string()),
            ]
        );
    }

    #[test]
    fn test_import_checks() {
        let c = compile(
            &[],
            &[
                &["prefix", "name", "type", "substitutionGroup", "depth"],
                &["ext", "Table", "xbrli:stringItemType", "xbrldt:hypercubeItem", ""],
                &["ext", "Text", "nonnum:textBlockItemType", "xbrli:item", ""],
                &["ext", "Custom", "ext:myType", "xbrli:item", ""],
                &["ext", "Foreign", "jppfs:thingType", "xbrli:item", ""],
            ],
        );
        assert_eq!(c.directives.imports.get("xbrldt").unwrap().namespace, XBRLDT_NS);
        assert!(c.directives.imports.contains("nonnum"));
        let warnings: Vec<_> = c.diagnostics.iter().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, DiagnosticCode::MissingImport);
        assert_eq!(warnings[0].row, Some(4));
        assert!(warnings[0].message.ends_with("jppfs:thingType"));
    }

    #[test]
    fn test_calculation_requires_parent_and_weight() {
        let c = compile(
            &["calculation"],
            &[
                &["http://x/role/BS"],
                HEADER,
                &["ext", "Cash", "", "", "ext:CurrentAssets", "1"],
                &["ext", "Receivables", "", "", "ext:CurrentAssets", ""],
                &["ext", "Inventory", "", "", "", "1"],
                &["ext", "Allowance", "", "1", "ext:CurrentAssets", "-1"],
            ],
        );
        let forest = &c.forests.calculation;
        let roots = forest.children(forest.frames()[0]);
        assert_eq!(roots.len(), 2);
        assert_eq!(concept_names(forest, roots), vec!["CurrentAssets", "CurrentAssets"]);
        let second = forest.children(roots[1]);
        assert_eq!(
            forest.node(second[0]).kind,
            NodeKind::Concept {
                prefix: "ext".into(),
                name: "Allowance".into(),
                relation: Relation::SummationItem(-1.0),
            }
        );
        assert_eq!(forest.concept_count(), 4);
    }

    #[test]
    fn test_missing_ancestor_warns_and_drops() {
        let c = compile(
            &["presentation"],
            &[&["http://x/role/BS"], HEADER, &["ext", "Orphan", "", "2"], &["ext", "Root", "", "0"]],
        );
        assert_eq!(c.forests.presentation.concept_count(), 1);
        let diagnostics = c.diagnostics.as_slice();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::MissingAncestor);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].row, Some(2));
    }

    #[test]
    fn test_labels_single_and_multi() {
        let multi = "用途区分、財務諸表区分及び業種区分のラベル（英語）";
        let c = compile(
            &[],
            &[
                &["prefix", "name", "type", "depth", "label", multi],
                &["ext", "Cash", "", "", "Cash", "Cash and deposits\nCash\n"],
                &["ext", "Debt", "", "", "", ""],
            ],
        );
        let key = LabelKey {
            prefix: "ext".into(),
            name: "Cash".into(),
            lang: "en".into(),
            role: STANDARD_LABEL.into(),
        };
        // Both columns map to the standard English label, the later column wins.
        assert_eq!(
            c.labels.get(&key).unwrap().to_vec(),
            vec!["Cash and deposits".to_string(), "Cash".to_string()]
        );
        assert_eq!(c.labels.len(), 1);
    }

    #[test]
    fn test_header_rows_rebuild_the_map() {
        let c = compile(
            &[],
            &[
                &["prefix", "name", "type", "depth"],
                &["ext", "First", "xbrli:stringItemType", ""],
                &["section"],
                &["name", "prefix", "depth", "type"],
                &["Second", "ext", "", "xbrli:stringItemType"],
            ],
        );
        let names: Vec<_> = c.elements.keys().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_bad_row_leaves_state_untouched() {
        let control = control(&["presentation"]);
        let data = Sheet::from_rows(
            "data",
            vec![
                vec![Cell::from("http://x/role/BS")],
                ["prefix", "name", "type", "depth"].iter().map(|s| Cell::from(*s)).collect(),
                vec![Cell::from("ext"), Cell::from("Broken"), Cell::Error("Ref".into()), Cell::Int(0)],
                vec![Cell::from("ext"), Cell::from("Fine"), Cell::from("xbrli:item"), Cell::Float(0.0)],
            ],
        );
        let c = compile_sheets(&control, &data).unwrap();

        assert_eq!(c.diagnostics.error_count(), 1);
        assert_eq!(c.diagnostics.as_slice()[0].code, DiagnosticCode::DataRow);
        assert_eq!(c.elements.keys().map(|k| k.as_str()).collect::<Vec<_>>(), vec!["Fine"]);
        assert_eq!(c.forests.presentation.concept_count(), 1);
    }

    #[test]
    fn test_non_finite_weights_are_row_errors() {
        let c = compile(
            &["calculation"],
            &[
                &["http://x/role/BS"],
                HEADER,
                &["ext", "Cash", "", "", "ext:CurrentAssets", "NaN"],
                &["ext", "Deposits", "", "", "ext:CurrentAssets", "inf"],
                &["ext", "Receivables", "", "", "ext:CurrentAssets", "1"],
            ],
        );
        let errors: Vec<_> = c.diagnostics.iter().filter(|d| d.severity == Severity::Error).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, DiagnosticCode::DataRow);
        assert_eq!(errors[0].row, Some(2));
        assert!(errors[0].message.contains("'NaN'"));
        assert_eq!(errors[1].row, Some(3));
        assert_eq!(c.forests.calculation.concept_count(), 2);
    }

    #[test]
    fn test_fractional_depth_truncates() {
        let data = Sheet::from_rows(
            "data",
            vec![
                vec![Cell::from("http://x/role/BS")],
                ["prefix", "name", "type", "depth"].iter().map(|s| Cell::from(*s)).collect(),
                vec![Cell::from("ext"), Cell::from("Assets"), Cell::Empty, Cell::Float(0.0)],
                vec![Cell::from("ext"), Cell::from("Cash"), Cell::Empty, Cell::Float(1.5)],
            ],
        );
        let c = compile_sheets(&control(&["presentation"]), &data).unwrap();

        assert!(c.diagnostics.is_empty());
        let forest = &c.forests.presentation;
        let roots = forest.children(forest.frames()[0]);
        assert_eq!(concept_names(forest, roots), vec!["Assets"]);
        assert_eq!(concept_names(forest, forest.children(roots[0])), vec!["Cash"]);
    }

    #[test]
    fn test_calculation_without_section_warns() {
        let c = compile(
            &["calculation"],
            &[HEADER, &["ext", "Cash", "", "", "ext:CurrentAssets", "1"]],
        );
        assert_eq!(c.forests.calculation.concept_count(), 0);
        let diagnostics = c.diagnostics.as_slice();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::MissingAncestor);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].row, Some(1));
        assert!(diagnostics[0].message.contains("calculation"));
        assert!(c.elements.contains_key("Cash"));
    }

    #[test]
    fn test_missing_extension_schema_is_fatal() {
        let control = Sheet::from_strings("control", &[&["action"], &["import", "schema", "x", "x.xsd", "urn:x"]]);
        let data = Sheet::from_strings("data", &[HEADER]);
        assert!(matches!(compile_sheets(&control, &data), Err(Error::MissingExtensionSchema)));
    }
}
