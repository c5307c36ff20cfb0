use serde::ser::{Serialize, SerializeMap, Serializer};

/// Family placeholder for a query gene that has no family assignment.
pub const NONE_QUERY: &str = "none-query";
/// Family placeholder stored literally as "none".
pub const NONE: &str = "none";
/// Description shown for [`NONE_QUERY`] regardless of the stored description.
pub const QUERY_WITHOUT_FAMILY: &str = "Query without family";

/// Parsed Pfam-like and InterPro-like family ids with their descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FamilyValues {
    pub family: Vec<String>,
    pub ipro_family: Vec<String>,
    pub family_desc: Vec<String>,
    pub ipro_family_desc: Vec<String>,
}

impl FamilyValues {
    pub fn parse(
        family_str: &str,
        ipro_family_str: &str,
        family_desc_str: &str,
        ipro_family_desc_str: &str,
    ) -> Self {
        let (family, family_desc) = parse_family(family_str, family_desc_str);
        let (ipro_family, ipro_family_desc) = parse_family(ipro_family_str, ipro_family_desc_str);
        Self {
            family,
            ipro_family,
            family_desc,
            ipro_family_desc,
        }
    }
}

fn parse_family(raw_family: &str, raw_desc: &str) -> (Vec<String>, Vec<String>) {
    let family = match raw_family {
        "" => vec![NONE_QUERY.to_string()],
        NONE => vec![NONE.to_string()],
        other => split(other, '-'),
    };
    let desc = if family.len() == 1 && family[0] == NONE_QUERY {
        vec![QUERY_WITHOUT_FAMILY.to_string()]
    } else {
        split_description(raw_desc)
    };
    (family, desc)
}

/// Descriptions are ";"-separated; a single token falls back to "-".
fn split_description(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return vec![String::new()];
    }
    let parts = split(raw, ';');
    if parts.len() == 1 {
        split(raw, '-')
    } else {
        parts
    }
}

fn split(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep).map(str::to_string).collect()
}

/// The front end reads both the raw names and the `pfam`/`interpro` aliases.
impl Serialize for FamilyValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("family", &self.family)?;
        map.serialize_entry("ipro_family", &self.ipro_family)?;
        map.serialize_entry("family_desc", &self.family_desc)?;
        map.serialize_entry("ipro_family_desc", &self.ipro_family_desc)?;
        map.serialize_entry("pfam", &self.family)?;
        map.serialize_entry("interpro", &self.ipro_family)?;
        map.serialize_entry("pfam_desc", &self.family_desc)?;
        map.serialize_entry("interpro_desc", &self.ipro_family_desc)?;
        map.end()
    }
}
