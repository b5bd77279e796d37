//! Column header recognition for the data sheet

use crate::sheet::{Cell, Sheet};
use crate::xbrl::{STANDARD_LABEL, VERBOSE_LABEL};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// The whole cell is one label.
    Single,
    /// Every line of the cell is a label.
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelColumn {
    pub kind: LabelKind,
    pub role: &'static str,
    pub lang: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Prefix,
    Name,
    Type,
    SubstitutionGroup,
    PeriodType,
    Balance,
    Abstract,
    Nillable,
    Depth,
    CalculationParent,
    CalculationWeight,
    Label(LabelColumn),
}

const fn label(kind: LabelKind, role: &'static str, lang: &'static str) -> ColumnRole {
    ColumnRole::Label(LabelColumn { kind, role, lang })
}

static SYNONYMS: [(&str, ColumnRole); 21] = [
    ("名前空間プレフィックス", ColumnRole::Prefix),
    ("prefix", ColumnRole::Prefix),
    ("要素名", ColumnRole::Name),
    ("name", ColumnRole::Name),
    ("type", ColumnRole::Type),
    ("substitutionGroup", ColumnRole::SubstitutionGroup),
    ("periodType", ColumnRole::PeriodType),
    ("balance", ColumnRole::Balance),
    ("abstract", ColumnRole::Abstract),
    ("nillable", ColumnRole::Nillable),
    ("depth", ColumnRole::Depth),
    ("calculation parent", ColumnRole::CalculationParent),
    ("calculation weight", ColumnRole::CalculationWeight),
    ("標準ラベル（日本語）", label(LabelKind::Single, STANDARD_LABEL, "ja")),
    ("冗長ラベル（日本語）", label(LabelKind::Single, VERBOSE_LABEL, "ja")),
    ("標準ラベル（英語）", label(LabelKind::Single, STANDARD_LABEL, "en")),
    ("冗長ラベル（英語）", label(LabelKind::Single, VERBOSE_LABEL, "en")),
    ("用途区分、財務諸表区分及び業種区分のラベル（日本語）", label(LabelKind::Multi, STANDARD_LABEL, "ja")),
    ("用途区分、財務諸表区分及び業種区分のラベル（英語）", label(LabelKind::Multi, STANDARD_LABEL, "en")),
    ("label", label(LabelKind::Single, STANDARD_LABEL, "en")),
    ("label, verbose", label(LabelKind::Single, VERBOSE_LABEL, "en")),
];

/// Column role for a header cell text.
pub fn column_role(text: &str) -> Option<ColumnRole> {
    SYNONYMS.iter().find(|(synonym, _)| *synonym == text).map(|(_, role)| *role)
}

/// Column role → column index for one header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    columns: IndexMap<ColumnRole, usize>,
}

impl HeaderMap {
    pub fn from_row(row: &[Cell]) -> Self {
        let mut columns = IndexMap::new();
        for (col, cell) in row.iter().enumerate() {
            if let Some(role) = cell.as_str().and_then(column_role) {
                columns.insert(role, col);
            }
        }
        Self { columns }
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    /// A header row must locate at least name, type and depth.
    pub fn is_header(&self) -> bool {
        [ColumnRole::Name, ColumnRole::Type, ColumnRole::Depth]
            .iter()
            .all(|role| self.contains(*role))
    }

    pub fn roles(&self) -> impl Iterator<Item = ColumnRole> + '_ {
        self.columns.keys().copied()
    }

    pub fn label_columns(&self) -> impl Iterator<Item = (LabelColumn, usize)> + '_ {
        self.columns.iter().filter_map(|(role, col)| match role {
            ColumnRole::Label(label) => Some((*label, *col)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub struct HeaderDetector;

impl HeaderDetector {
    /// Indices of the rows of `sheet` that qualify as header rows.
    pub fn detect(sheet: &Sheet) -> BTreeSet<usize> {
        let rows: BTreeSet<usize> = sheet
            .rows()
            .enumerate()
            .filter(|(_, row)| HeaderMap::from_row(row).is_header())
            .map(|(index, _)| index)
            .collect();
        debug!(header_rows = ?rows, "Detected header rows");
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::from(*s)).collect()
    }

    #[test]
    fn test_header_map_contains_recognized_roles_only() {
        let map = HeaderMap::from_row(&row(&[
            "prefix", "name", "notes", "type", "depth", "label", "冗長ラベル（日本語）",
        ]));

        assert!(map.is_header());
        let roles: Vec<_> = map.roles().collect();
        assert_eq!(
            roles,
            vec![
                ColumnRole::Prefix,
                ColumnRole::Name,
                ColumnRole::Type,
                ColumnRole::Depth,
                label(LabelKind::Single, STANDARD_LABEL, "en"),
                label(LabelKind::Single, VERBOSE_LABEL, "ja"),
            ]
        );
        assert_eq!(map.get(ColumnRole::Type), Some(3));
        assert_eq!(map.get(ColumnRole::Balance), None);
        let labels: Vec<_> = map.label_columns().map(|(l, col)| (l.lang, col)).collect();
        assert_eq!(labels, vec![("en", 5), ("ja", 6)]);
    }

    #[test]
    fn test_japanese_synonyms() {
        let map = HeaderMap::from_row(&row(&["名前空間プレフィックス", "要素名", "type", "depth"]));
        assert_eq!(map.get(ColumnRole::Prefix), Some(0));
        assert_eq!(map.get(ColumnRole::Name), Some(1));
        assert!(map.is_header());
    }

    #[test]
    fn test_detect_requires_name_type_depth() {
        let sheet = Sheet::from_strings(
            "data",
            &[
                &["http://x/role/BS", "Balance sheet"],
                &["prefix", "name", "type", "depth"],
                &["ext", "Cash", "xbrli:monetaryItemType", "1"],
                &["name", "type"],
                &["depth"],
                &["name", "", "depth", "type", "calculation parent"],
            ],
        );
        let rows: Vec<_> = HeaderDetector::detect(&sheet).into_iter().collect();
        assert_eq!(rows, vec![1, 5]);
    }

    #[test]
    fn test_multi_label_columns() {
        let role = column_role("用途区分、財務諸表区分及び業種区分のラベル（英語）").unwrap();
        assert_eq!(role, label(LabelKind::Multi, STANDARD_LABEL, "en"));
        assert_eq!(column_role("Label"), None);
    }
}
