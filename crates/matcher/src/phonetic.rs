//! Metaphone phonetic keys.
//!
//! Each whitespace-separated word is encoded on its own and the word codes
//! are joined with single spaces, so multi-word descriptions keep their word
//! boundaries. Codes are not length-capped.

use rphonetic::{Encoder, Metaphone};

/// Phonetic key of a description.
pub fn metaphone(text: &str) -> String {
    let encoder = Metaphone::new(usize::MAX);
    text.split_whitespace()
        .map(ascii_letters)
        .filter(|word| !word.is_empty())
        .map(|word| encoder.encode(&word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Letters of a word folded to ASCII. The encoder indexes by byte, so
/// anything else is dropped before it gets there.
fn ascii_letters(word: &str) -> String {
    word.chars()
        .filter_map(|c| {
            let c = c.to_lowercase().next().unwrap_or(c);
            let folded = match c {
                'a'..='z' => c,
                'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
                'ç' => 'c',
                'è' | 'é' | 'ê' | 'ë' => 'e',
                'ì' | 'í' | 'î' | 'ï' => 'i',
                'ñ' => 'n',
                'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
                'ù' | 'ú' | 'û' | 'ü' => 'u',
                'ý' | 'ÿ' => 'y',
                'ß' => 's',
                _ => return None,
            };
            Some(folded)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling_variants_share_a_key() {
        assert_eq!(metaphone("Smith"), "SM0");
        assert_eq!(metaphone("Smyth"), "SM0");
        assert_eq!(metaphone("Phone"), metaphone("Fone"));
        assert_eq!(metaphone("Catherine"), "K0RN");
        assert_eq!(metaphone("Kathryn"), "K0RN");
    }

    #[test]
    fn initial_exceptions() {
        assert_eq!(metaphone("Knight"), "NT");
        assert_eq!(metaphone("Wright"), "RT");
        assert_eq!(metaphone("Gnome"), "NM");
        assert_eq!(metaphone("Xerox"), "SRKS");
        assert_eq!(metaphone("Whale"), "WL");
        assert_eq!(metaphone("Aeon"), "EN");
    }

    #[test]
    fn words_joined_by_single_space() {
        assert_eq!(metaphone("Blue Pen"), "BL PN");
        assert_eq!(metaphone("  Red   Pen "), "RT PN");
        assert_eq!(metaphone("Pen 500"), "PN");
    }

    #[test]
    fn long_words_are_not_truncated() {
        assert_eq!(metaphone("Highlighter"), "HLTR");
        assert_eq!(metaphone("Correspondence"), "KRSPNTNS");
    }

    #[test]
    fn silent_and_doubled_letters() {
        assert_eq!(metaphone("Lamb"), "LM");
        assert_eq!(metaphone("Bell"), "BL");
        assert_eq!(metaphone("Edge"), "EJ");
        assert_eq!(metaphone("Science"), "SNS");
        assert_eq!(metaphone("Match"), "MX");
    }

    #[test]
    fn case_and_accents_ignored() {
        assert_eq!(metaphone("CAFÉ"), metaphone("cafe"));
        assert_eq!(metaphone("Crème"), metaphone("Creme"));
        assert_eq!(metaphone("blue pen"), metaphone("BLUE PEN"));
    }

    #[test]
    fn empty_and_symbol_only() {
        assert_eq!(metaphone(""), "");
        assert_eq!(metaphone("123 - 456"), "");
    }
}
