use crate::xbrl::{
    NONNUM_NS, NONNUM_SCHEMA_LOCATION, XBRLDT_NS, XBRLDT_SCHEMA_LOCATION, XBRLI_NS, XBRLI_SCHEMA_LOCATION,
};
use crate::xml::Attributes;
use bitflags::bitflags;
use compact_str::CompactString;
use indexmap::IndexMap;
use std::collections::BTreeMap;

// ============================================================================
// Taxonomy extension data collected from the workbook
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImportEntry {
    pub namespace: String,
    pub schema_location: String,
}

/// Schema imports keyed by prefix. `xbrli` is always present.
#[derive(Debug, Clone)]
pub struct Imports {
    entries: BTreeMap<CompactString, ImportEntry>,
}

impl Default for Imports {
    fn default() -> Self {
        Self::new()
    }
}

impl Imports {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            CompactString::from("xbrli"),
            ImportEntry {
                namespace: XBRLI_NS.to_string(),
                schema_location: XBRLI_SCHEMA_LOCATION.to_string(),
            },
        );
        Self { entries }
    }

    pub fn insert(&mut self, prefix: &str, namespace: &str, schema_location: &str) {
        self.entries.insert(
            CompactString::from(prefix),
            ImportEntry {
                namespace: namespace.to_string(),
                schema_location: schema_location.to_string(),
            },
        );
    }

    pub fn get(&self, prefix: &str) -> Option<&ImportEntry> {
        self.entries.get(prefix)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    /// Registers the built-in import for `xbrldt` or `nonnum` if it is not
    /// imported yet. Returns false for any other unknown prefix.
    pub fn ensure_builtin(&mut self, prefix: &str) -> bool {
        if self.contains(prefix) {
            return true;
        }
        match prefix {
            "xbrldt" => self.insert(prefix, XBRLDT_NS, XBRLDT_SCHEMA_LOCATION),
            "nonnum" => self.insert(prefix, NONNUM_NS, NONNUM_SCHEMA_LOCATION),
            _ => return false,
        }
        true
    }

    /// Entries in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImportEntry)> {
        self.entries.iter().map(|(p, e)| (p.as_str(), e))
    }

    /// Entries sorted by namespace then schema location, the order in which
    /// `xsd:import` elements are written.
    pub fn sorted(&self) -> Vec<&ImportEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identity of the extension schema being compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSchema {
    pub prefix: CompactString,
    pub filename: String,
    pub namespace: String,
}

/// An element declaration of the extension schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionElement {
    pub name: CompactString,
    pub attributes: Attributes,
}

bitflags! {
    /// Structural linkbases declared on the control sheet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LinkbaseKinds: u8 {
        const PRESENTATION = 0b001;
        const DEFINITION = 0b010;
        const CALCULATION = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkbaseKind {
    Presentation,
    Definition,
    Calculation,
}

impl LinkbaseKind {
    pub const ALL: [LinkbaseKind; 3] = [
        LinkbaseKind::Presentation,
        LinkbaseKind::Definition,
        LinkbaseKind::Calculation,
    ];

    pub fn from_type(linkbase_type: &str) -> Option<Self> {
        match linkbase_type {
            "presentation" => Some(LinkbaseKind::Presentation),
            "definition" => Some(LinkbaseKind::Definition),
            "calculation" => Some(LinkbaseKind::Calculation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkbaseKind::Presentation => "presentation",
            LinkbaseKind::Definition => "definition",
            LinkbaseKind::Calculation => "calculation",
        }
    }

    pub fn flag(self) -> LinkbaseKinds {
        match self {
            LinkbaseKind::Presentation => LinkbaseKinds::PRESENTATION,
            LinkbaseKind::Definition => LinkbaseKinds::DEFINITION,
            LinkbaseKind::Calculation => LinkbaseKinds::CALCULATION,
        }
    }

    /// Local name of the extended link element, e.g. `presentationLink`.
    pub fn link_name(self) -> String {
        format!("{}Link", self.as_str())
    }

    /// Local name of the arc element, e.g. `presentationArc`.
    pub fn arc_name(self) -> String {
        format!("{}Arc", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkbaseRef {
    pub linkbase_type: CompactString,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLinkbaseDecl {
    pub lang: CompactString,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelKey {
    pub prefix: CompactString,
    pub name: CompactString,
    pub lang: CompactString,
    pub role: CompactString,
}

/// Label texts keyed by (prefix, name, language, role), in first-write order.
///
/// Writing a key replaces whatever an earlier row wrote under it; the lines
/// of one multi-label cell are written together and all kept.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    entries: IndexMap<LabelKey, Vec<String>>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: LabelKey, texts: Vec<String>) {
        if texts.is_empty() {
            return;
        }
        self.entries.insert(key, texts);
    }

    pub fn get(&self, key: &LabelKey) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LabelKey, &[String])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Concepts with labels in `lang`, in first-seen order, each with its
    /// entries for that language.
    pub fn by_concept(&self, lang: &str) -> IndexMap<(&str, &str), Vec<(&LabelKey, &[String])>> {
        let mut grouped: IndexMap<(&str, &str), Vec<(&LabelKey, &[String])>> = IndexMap::new();
        for (key, texts) in self.iter().filter(|(k, _)| k.lang == lang) {
            grouped
                .entry((key.prefix.as_str(), key.name.as_str()))
                .or_default()
                .push((key, texts));
        }
        grouped
    }

    /// Number of label resources the entries expand to.
    pub fn resource_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits `prefix:local`; both parts must be non-empty.
pub fn split_qname(qname: &str) -> Option<(&str, &str)> {
    match qname.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Some((prefix, local)),
        _ => None,
    }
}
