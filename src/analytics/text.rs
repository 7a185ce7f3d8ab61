//! Store-name folding.
//!
//! ERP exports and the hand-maintained directory disagree on accents and
//! spacing, so all name matching goes through `normalize_name`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// NFKD-decompose, strip combining marks, trim, lowercase, collapse runs
/// of whitespace to a single space.
pub fn normalize_name(raw: &str) -> String {
    let stripped: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize_name("TIENDA PEQUEÑA"), "tienda pequena");
        assert_eq!(normalize_name("Bogotá Único"), "bogota unico");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_name("  TIENDA   UNO  "), "tienda uno");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }
}
