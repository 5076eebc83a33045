//! Rice Selection Validator
//!
//! Matches a free-text rice name against the catalog. Matching is done on a
//! normalized form (lowercase, no diacritics, no punctuation, no leading
//! article) in three passes:
//!
//! ```text
//! 1. exact      "arroz de señoret"   → arroz_senoret
//!               (display name, key or alias)
//! 2. prefix     "señoret"            → arroz_senoret
//!               ("arroz de" / "paella" stripped on both sides)
//! 3. tokens     "carrillada boletus" → every dish whose name contains all
//!               content words; one hit is a match, several are ambiguous
//! ```
//!
//! Anything else is rejected with the full catalog list.

use booking_agent_config::RiceCatalog;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use unicode_segmentation::UnicodeSegmentation;

/// Leading articles dropped before matching
static ARTICLES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["el", "la", "los", "las", "un", "una", "unos", "unas"].into_iter().collect());

/// Words that carry no dish identity
static FILLER_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "de", "del", "la", "el", "los", "las", "y", "e", "con", "a", "al", "en", "un", "una",
        "para", "arroz", "arroces", "paella", "paellas",
    ]
    .into_iter()
    .collect()
});

/// Generic prefixes, longest first
const GENERIC_PREFIXES: [&str; 5] = ["arroz del ", "arroz de ", "arroz ", "paella de ", "paella "];

/// Outcome of matching one rice name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiceMatch {
    /// Catalog key
    Matched(String),
    /// Display names of the dishes the name could mean
    Ambiguous(Vec<String>),
    /// Not a catalog dish; carries every display name
    Rejected(Vec<String>),
}

#[derive(Debug, Clone)]
struct IndexedDish {
    key: String,
    display_name: String,
    /// Normalized display name, key and aliases
    names: Vec<String>,
    /// `names` with the generic prefix removed
    stripped: Vec<String>,
    /// Content words of the display name
    tokens: HashSet<String>,
}

/// Validates rice names against a catalog
#[derive(Debug, Clone)]
pub struct RiceValidator {
    dishes: Vec<IndexedDish>,
}

impl RiceValidator {
    pub fn new(catalog: &RiceCatalog) -> Self {
        let dishes = catalog
            .dishes
            .iter()
            .map(|dish| {
                let mut names = vec![normalize(&dish.display_name), normalize(&dish.key.replace('_', " "))];
                names.extend(dish.aliases.iter().map(|a| normalize(a)));
                names.retain(|n| !n.is_empty());
                names.dedup();

                let stripped = names
                    .iter()
                    .map(|n| strip_generic_prefix(n).to_string())
                    .filter(|n| !n.is_empty())
                    .collect();

                IndexedDish {
                    key: dish.key.clone(),
                    display_name: dish.display_name.clone(),
                    tokens: content_tokens(&normalize(&dish.display_name)),
                    names,
                    stripped,
                }
            })
            .collect();

        Self { dishes }
    }

    /// Match a user-supplied rice name
    pub fn validate(&self, candidate: &str) -> RiceMatch {
        let normalized = normalize(candidate);
        if normalized.is_empty() {
            return RiceMatch::Rejected(self.all_names());
        }

        let exact = self.collect(|d| d.names.iter().any(|n| *n == normalized));
        if let Some(result) = self.decide(exact) {
            return result;
        }

        let stripped = strip_generic_prefix(&normalized);
        if !stripped.is_empty() {
            let prefixed = self.collect(|d| d.stripped.iter().any(|n| n == stripped));
            if let Some(result) = self.decide(prefixed) {
                return result;
            }
        }

        let tokens = content_tokens(&normalized);
        if !tokens.is_empty() {
            let contained = self.collect(|d| tokens.is_subset(&d.tokens));
            if let Some(result) = self.decide(contained) {
                return result;
            }
        }

        tracing::debug!(candidate = candidate, "Rice name not in catalog");
        RiceMatch::Rejected(self.all_names())
    }

    /// Every display name, in catalog order
    pub fn all_names(&self) -> Vec<String> {
        self.dishes.iter().map(|d| d.display_name.clone()).collect()
    }

    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.dishes
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.display_name.as_str())
            .unwrap_or(key)
    }

    fn collect<F>(&self, predicate: F) -> Vec<&IndexedDish>
    where
        F: Fn(&IndexedDish) -> bool,
    {
        self.dishes.iter().filter(|d| predicate(d)).collect()
    }

    fn decide(&self, hits: Vec<&IndexedDish>) -> Option<RiceMatch> {
        match hits.len() {
            0 => None,
            1 => Some(RiceMatch::Matched(hits[0].key.clone())),
            _ => Some(RiceMatch::Ambiguous(
                hits.iter().map(|d| d.display_name.clone()).collect(),
            )),
        }
    }
}

/// Lowercase, strip diacritics and punctuation, drop leading articles
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let words: Vec<&str> = folded.unicode_words().collect();
    let start = words
        .iter()
        .position(|w| !ARTICLES.contains(w))
        .unwrap_or(words.len());

    words[start..].join(" ")
}

fn strip_generic_prefix(normalized: &str) -> &str {
    GENERIC_PREFIXES
        .iter()
        .find_map(|prefix| normalized.strip_prefix(prefix))
        .unwrap_or(normalized)
        .trim()
}

fn content_tokens(normalized: &str) -> HashSet<String> {
    normalized
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> RiceValidator {
        let catalog: RiceCatalog = serde_yaml::from_str(
            r#"
dishes:
  - key: arroz_negro
    display_name: "Arroz negro"
  - key: arroz_senoret
    display_name: "Arroz de señoret"
    aliases: ["senyoret"]
  - key: arroz_chorizo
    display_name: "Arroz de chorizo"
  - key: arroz_meloso_pulpo_gambones
    display_name: "Arroz meloso de pulpo y gambones"
  - key: arroz_carrillada_boletus
    display_name: "Arroz de carrillada ibérica y boletus"
  - key: arroz_meloso_carrillada_boletus
    display_name: "Arroz meloso de carrillada y boletus"
  - key: paella_valenciana
    display_name: "Paella valenciana"
    aliases: ["paella"]
"#,
        )
        .unwrap();
        RiceValidator::new(&catalog)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  El Arroz de Señoret!! "), "arroz de senoret");
        assert_eq!(normalize("Ñoquis, ¿sí?"), "noquis si");
        assert_eq!(normalize("la"), "");
    }

    #[test]
    fn test_exact_and_case_insensitive() {
        let v = validator();
        assert_eq!(v.validate("Arroz negro"), RiceMatch::Matched("arroz_negro".into()));
        assert_eq!(v.validate("ARROZ DE SEÑORET"), RiceMatch::Matched("arroz_senoret".into()));
        assert_eq!(v.validate("arroz de senoret"), RiceMatch::Matched("arroz_senoret".into()));
        assert_eq!(v.validate("un arroz negro"), RiceMatch::Matched("arroz_negro".into()));
    }

    #[test]
    fn test_alias_and_prefix() {
        let v = validator();
        assert_eq!(v.validate("senyoret"), RiceMatch::Matched("arroz_senoret".into()));
        assert_eq!(v.validate("señoret"), RiceMatch::Matched("arroz_senoret".into()));
        assert_eq!(v.validate("paella"), RiceMatch::Matched("paella_valenciana".into()));
        assert_eq!(v.validate("chorizo"), RiceMatch::Matched("arroz_chorizo".into()));
    }

    #[test]
    fn test_token_containment() {
        let v = validator();
        assert_eq!(
            v.validate("meloso de pulpo"),
            RiceMatch::Matched("arroz_meloso_pulpo_gambones".into())
        );
    }

    #[test]
    fn test_ambiguous_partial_match() {
        let v = validator();
        match v.validate("carrillada con boletus") {
            RiceMatch::Ambiguous(options) => {
                assert_eq!(options.len(), 2);
                assert!(options.contains(&"Arroz meloso de carrillada y boletus".to_string()));
            },
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dishes_rejected_with_full_list() {
        let v = validator();
        for name in [
            "arroz con pollo",
            "arroz de pollo",
            "unicornio",
            "tres delicias",
            "paella mixta",
            "arroz de bogavante",
            "arroz",
            "",
        ] {
            match v.validate(name) {
                RiceMatch::Rejected(options) => assert_eq!(options.len(), 7, "{}", name),
                other => panic!("{} should be rejected, got {:?}", name, other),
            }
        }
    }
}
