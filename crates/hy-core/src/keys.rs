//! Model-selector key normalization.
//!
//! Every named selector (nozzle model, layer model, radiative source,
//! probit, overpressure correlation) goes through the same boundary rule:
//! normalize once, match against known aliases, fail closed on no match.
//! The match itself lives with each selector enum.

/// Lower-case a selector string and strip everything non-alphanumeric.
///
/// "Yuceil-Otugen", "yuceil_otugen", and "YuceilOtugen" all normalize to
/// "yuceilotugen".
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_case() {
        assert_eq!(normalize_key("Yuceil-Otugen"), "yuceilotugen");
        assert_eq!(normalize_key("yuceil_otugen"), "yuceilotugen");
        assert_eq!(normalize_key("BIRCH 2"), "birch2");
    }

    #[test]
    fn empty_and_symbol_only_normalize_to_empty() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("--__--"), "");
    }
}
