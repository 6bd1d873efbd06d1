//! Language-aware string ordering for task titles.
//!
//! Strings are compared in tiers: base letters first, then accents, then
//! case, then raw code points so distinct strings never tie.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Fr,
}

impl Language {
    /// Accepts `en`, `fr`, `fr-CA`, `en_US`, ...
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "en" => Some(Language::En),
            "fr" => Some(Language::Fr),
            _ => None,
        }
    }

    fn backwards_accents(&self) -> bool {
        *self == Language::Fr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Punctuation,
    Digit,
    Letter,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if c.is_numeric() {
        CharClass::Digit
    } else if c.is_alphabetic() {
        CharClass::Letter
    } else {
        CharClass::Punctuation
    }
}

fn expand_ligature(c: char) -> Option<&'static str> {
    match c {
        'œ' => Some("oe"),
        'Œ' => Some("OE"),
        'æ' => Some("ae"),
        'Æ' => Some("AE"),
        'ß' => Some("ss"),
        _ => None,
    }
}

struct CollationKey {
    primary: Vec<(CharClass, char)>,
    accents: Vec<Vec<char>>,
    uppercase: Vec<bool>,
}

impl CollationKey {
    fn new(s: &str) -> Self {
        let mut key = CollationKey {
            primary: vec![],
            accents: vec![],
            uppercase: vec![],
        };

        for c in s.nfd() {
            if is_combining_mark(c) {
                if let Some(marks) = key.accents.last_mut() {
                    marks.push(c);
                }
                continue;
            }

            match expand_ligature(c) {
                Some(expansion) => expansion.chars().for_each(|e| key.push_base(e)),
                None => key.push_base(c),
            }
        }

        key
    }

    fn push_base(&mut self, c: char) {
        let folded = c.to_lowercase().next().unwrap_or(c);
        self.primary.push((classify(c), folded));
        self.accents.push(vec![]);
        self.uppercase.push(c.is_uppercase());
    }
}

fn compare_accents(a: &[Vec<char>], b: &[Vec<char>], language: Language) -> Ordering {
    if language.backwards_accents() {
        a.iter().rev().cmp(b.iter().rev())
    } else {
        a.cmp(b)
    }
}

pub fn compare(a: &str, b: &str, language: Language) -> Ordering {
    let key_a = CollationKey::new(a);
    let key_b = CollationKey::new(b);

    key_a
        .primary
        .cmp(&key_b.primary)
        .then_with(|| compare_accents(&key_a.accents, &key_b.accents, language))
        .then_with(|| key_a.uppercase.cmp(&key_b.uppercase))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(words: &[&str], language: Language) -> Vec<String> {
        let mut words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        words.sort_by(|a, b| compare(a, b, language));
        words
    }

    #[test]
    fn test_accents_sort_with_base_letter() {
        assert_eq!(
            sorted(&["zèbre", "éclair", "eau", "fromage"], Language::Fr),
            vec!["eau", "éclair", "fromage", "zèbre"]
        );
    }

    #[test]
    fn test_case_is_tertiary() {
        assert_eq!(
            sorted(&["Banane", "apple", "banane"], Language::En),
            vec!["apple", "banane", "Banane"]
        );
    }

    #[test]
    fn test_french_compares_accents_from_the_end() {
        let words = ["côté", "coté", "côte", "cote"];
        assert_eq!(
            sorted(&words, Language::En),
            vec!["cote", "coté", "côte", "côté"]
        );
        assert_eq!(
            sorted(&words, Language::Fr),
            vec!["cote", "côte", "coté", "côté"]
        );
    }

    #[test]
    fn test_ligatures_expand() {
        assert_eq!(compare("œuvre", "oeuvre", Language::Fr), Ordering::Greater);
        assert_eq!(compare("œuvre", "ofrir", Language::Fr), Ordering::Less);
    }

    #[test]
    fn test_punctuation_and_digits_before_letters() {
        assert_eq!(
            sorted(&["a", "1", "-", " "], Language::En),
            vec![" ", "-", "1", "a"]
        );
    }

    #[test]
    fn test_distinct_strings_never_tie() {
        assert_ne!(compare("e\u{301}", "é", Language::Fr), Ordering::Equal);
        assert_eq!(compare("same", "same", Language::Fr), Ordering::Equal);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("fr-CA"), Some(Language::Fr));
        assert_eq!(Language::from_code("EN_us"), Some(Language::En));
        assert_eq!(Language::from_code("de"), None);
    }
}
