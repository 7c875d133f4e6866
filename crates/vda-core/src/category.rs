//! Category tag extraction and lookup-table remapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display label for raw tags with no mapping entry.
pub const FALLBACK_LABEL: &str = "Altro";

/// Extracts the tag between the first matching pair of square brackets.
///
/// `"[TS] Soccorso"` → `Some("TS")`. Labels without brackets yield `None`,
/// which is not an error: [`CategoryMap::resolve`] then looks up the whole
/// label instead.
#[must_use]
pub fn extract_tag(raw: &str) -> Option<&str> {
    let open = raw.find('[')?;
    let rest = &raw[open + 1..];
    let close = rest.find(']')?;
    Some(&rest[..close])
}

/// Mapping from raw category tags to display labels.
///
/// Lookups are case-sensitive exact matches. Unmapped tags resolve to the
/// fallback label, never to `None` and never to an error, so no record is
/// ever dropped for carrying an unknown category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    #[serde(default)]
    map: BTreeMap<String, String>,
    #[serde(default = "default_fallback")]
    fallback: String,
}

fn default_fallback() -> String {
    FALLBACK_LABEL.to_string()
}

impl Default for CategoryMap {
    /// The source organization's tag vocabulary.
    fn default() -> Self {
        let map = [
            ("ORDINARIO", "Ordinari"),
            ("TS", "Soccorso ECHO"),
            ("TSS", "Trasporti semplici"),
            ("EMG", "Emergenza 118"),
            ("POLI", "Poliambulatorio"),
            ("DIA", "Dialisi"),
        ]
        .into_iter()
        .map(|(tag, label)| (tag.to_string(), label.to_string()))
        .collect();
        Self {
            map,
            fallback: default_fallback(),
        }
    }
}

impl CategoryMap {
    /// Builds a map from explicit entries and a fallback label.
    #[must_use]
    pub const fn new(map: BTreeMap<String, String>, fallback: String) -> Self {
        Self { map, fallback }
    }

    /// The label unmapped tags resolve to.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Resolves a raw label to its display category.
    ///
    /// The bracket tag is extracted first; labels without brackets are looked
    /// up whole (trimmed).
    #[must_use]
    pub fn resolve(&self, raw_label: &str) -> String {
        let key = extract_tag(raw_label).unwrap_or_else(|| raw_label.trim());
        self.map
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bracket_tag() {
        assert_eq!(extract_tag("[TS] Soccorso"), Some("TS"));
        assert_eq!(extract_tag("Servizio [ORDINARIO] mattina"), Some("ORDINARIO"));
    }

    #[test]
    fn first_bracket_pair_wins() {
        assert_eq!(extract_tag("[A] poi [B]"), Some("A"));
    }

    #[test]
    fn no_brackets_is_none_not_error() {
        assert_eq!(extract_tag("NoTagHere"), None);
        assert_eq!(extract_tag(""), None);
    }

    #[test]
    fn unclosed_bracket_is_none() {
        assert_eq!(extract_tag("[TS Soccorso"), None);
    }

    #[test]
    fn empty_brackets_extract_empty_tag() {
        assert_eq!(extract_tag("[] vuoto"), Some(""));
    }

    #[test]
    fn mapped_tag_resolves_to_display_label() {
        let map = CategoryMap::default();
        assert_eq!(map.resolve("[TS] Soccorso"), "Soccorso ECHO");
        assert_eq!(map.resolve("[ORDINARIO] Trasporto"), "Ordinari");
    }

    #[test]
    fn unmapped_tag_falls_back() {
        let map = CategoryMap::default();
        assert_eq!(map.resolve("[XYZ] Sconosciuto"), FALLBACK_LABEL);
        assert_eq!(map.resolve("NoTagHere"), FALLBACK_LABEL);
    }

    #[test]
    fn bare_label_is_looked_up_whole() {
        let map = CategoryMap::default();
        assert_eq!(map.resolve("TS"), "Soccorso ECHO");
        assert_eq!(map.resolve("  TS  "), "Soccorso ECHO");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let map = CategoryMap::default();
        assert_eq!(map.resolve("[ts] Soccorso"), FALLBACK_LABEL);
    }

    #[test]
    fn custom_fallback_label() {
        let map = CategoryMap::new(BTreeMap::new(), "Other".to_string());
        assert_eq!(map.resolve("[TS] Soccorso"), "Other");
        assert_eq!(map.fallback(), "Other");
    }
}
