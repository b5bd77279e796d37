//! Namespaces, roles and arcroles used by emitted taxonomy documents.

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const LINK_NS: &str = "http://www.xbrl.org/2003/linkbase";
pub const XBRLI_NS: &str = "http://www.xbrl.org/2003/instance";
pub const XBRLDT_NS: &str = "http://xbrl.org/2005/xbrldt";
pub const NONNUM_NS: &str = "http://www.xbrl.org/dtr/type/non-numeric";

pub const XBRLI_SCHEMA_LOCATION: &str = "http://www.xbrl.org/2003/xbrl-instance-2003-12-31.xsd";
pub const XBRLDT_SCHEMA_LOCATION: &str = "http://www.xbrl.org/2005/xbrldt-2005.xsd";
pub const NONNUM_SCHEMA_LOCATION: &str = "http://www.xbrl.org/dtr/type/nonNumeric-2009-12-16.xsd";
pub const LINKBASE_SCHEMA_LOCATION: &str = "http://www.xbrl.org/2003/xbrl-linkbase-2003-12-31.xsd";

pub const DEFAULT_LINK_ROLE: &str = "http://www.xbrl.org/2003/role/link";
pub const STANDARD_LABEL: &str = "http://www.xbrl.org/2003/role/label";
pub const VERBOSE_LABEL: &str = "http://www.xbrl.org/2003/role/verboseLabel";

/// Role used for an ELR frame that names neither a URI nor a known title.
pub const UNSPECIFIED_ROLE: &str = "unspecified";

pub const PARENT_CHILD: &str = "http://www.xbrl.org/2003/arcrole/parent-child";
pub const SUMMATION_ITEM: &str = "http://www.xbrl.org/2003/arcrole/summation-item";
pub const CONCEPT_LABEL: &str = "http://www.xbrl.org/2003/arcrole/concept-label";
pub const LINKBASE_ARCROLE: &str = "http://www.w3.org/1999/xlink/properties/linkbase";

pub const ALL: &str = "http://xbrl.org/int/dim/arcrole/all";
pub const HYPERCUBE_DIMENSION: &str = "http://xbrl.org/int/dim/arcrole/hypercube-dimension";
pub const DIMENSION_DOMAIN: &str = "http://xbrl.org/int/dim/arcrole/dimension-domain";
pub const DOMAIN_MEMBER: &str = "http://xbrl.org/int/dim/arcrole/domain-member";
pub const DIMENSION_DEFAULT: &str = "http://xbrl.org/int/dim/arcrole/dimension-default";

/// Arcroles every definition linkbase declares, with their xbrldt anchors.
pub const DIMENSIONAL_ARCROLES: [(&str, &str); 5] = [
    (ALL, "all"),
    (DIMENSION_DEFAULT, "dimension-default"),
    (DIMENSION_DOMAIN, "dimension-domain"),
    (DOMAIN_MEMBER, "domain-member"),
    (HYPERCUBE_DIMENSION, "hypercube-dimension"),
];

/// `xlink:role` of a `linkbaseRef` pointing at a linkbase of the given type.
pub fn linkbase_ref_role(linkbase_type: &str) -> String {
    format!("http://www.xbrl.org/2003/role/{}LinkbaseRef", linkbase_type)
}

/// Formats order and weight values the way XBRL processors print decimals.
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(1.0), "1.0");
        assert_eq!(format_decimal(-1.0), "-1.0");
        assert_eq!(format_decimal(0.5), "0.5");
        assert_eq!(format_decimal(12.0), "12.0");
    }

    #[test]
    fn test_linkbase_ref_role() {
        assert_eq!(
            linkbase_ref_role("presentation"),
            "http://www.xbrl.org/2003/role/presentationLinkbaseRef"
        );
    }
}
