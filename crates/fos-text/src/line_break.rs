//! Line-break opportunities
//!
//! `is_breakable(text, pos)` answers whether a line may end before
//! `text[pos]`. Latin-1 text breaks at spaces and newlines. Hangul Jamo and
//! the CJK blocks break between any two characters except where Japanese
//! kinsoku rules forbid it: never before closing or other punctuation,
//! never after opening punctuation, and never around the characters in the
//! two tables below. Other scripts break at whitespace.

use unicode_categories::UnicodeCategories;

/// U+00AD, rendered only when a line ends on it
pub const SOFT_HYPHEN: char = '\u{00AD}';

/// Zero width space
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Characters a line must not start with that are not closing punctuation
const NO_BREAK_BEFORE: [u16; 53] = [
    0x3005, // ideographic iteration mark
    0x3009, // right angle bracket
    0x300b, // right double angle bracket
    0x300d, // right corner bracket
    0x300f, // right white corner bracket
    0x3011, // right black lenticular bracket
    0x3015, // right tortoise shell bracket
    0x3041, // small a hiragana
    0x3043, // small i hiragana
    0x3045, // small u hiragana
    0x3047, // small e hiragana
    0x3049, // small o hiragana
    0x3063, // small tsu hiragana
    0x3083, // small ya hiragana
    0x3085, // small yu hiragana
    0x3087, // small yo hiragana
    0x308E, // small wa hiragana
    0x309B, // jap voiced sound mark
    0x309C, // jap semi-voiced sound mark
    0x309D, // jap iteration mark hiragana
    0x309E, // jap voiced iteration mark hiragana
    0x30A1, // small a katakana
    0x30A3, // small i katakana
    0x30A5, // small u katakana
    0x30A7, // small e katakana
    0x30A9, // small o katakana
    0x30C3, // small tsu katakana
    0x30E3, // small ya katakana
    0x30E5, // small yu katakana
    0x30E7, // small yo katakana
    0x30EE, // small wa katakana
    0x30F5, // small ka katakana
    0x30F6, // small ke katakana
    0x30FC, // prolonged sound mark
    0x30FD, // jap iteration mark katakana
    0x30FE, // jap voiced iteration mark katakana
    0xFF01, // fullwidth exclamation mark
    0xFF09, // fullwidth right parenthesis
    0xFF0D, // fullwidth hyphen
    0xFF1F, // fullwidth question mark
    0xFF3D, // fullwidth right square bracket
    0xFF5D, // fullwidth right curly bracket
    0xFF63, // halfwidth right corner bracket
    0xFF67, // halfwidth katakana small a
    0xFF68, // halfwidth katakana small i
    0xFF69, // halfwidth katakana small u
    0xFF6a, // halfwidth katakana small e
    0xFF6b, // halfwidth katakana small o
    0xFF6c, // halfwidth katakana small ya
    0xFF6d, // halfwidth katakana small yu
    0xFF6e, // halfwidth katakana small yo
    0xFF6f, // halfwidth katakana small tu
    0xFF70, // halfwidth prolonged sound mark
];

/// Characters a line must not end with that are not opening punctuation
const NO_BREAK_AFTER: [u16; 6] = [
    0x3012, // postal mark
    0xFF03, // fullwidth number sign
    0xFF04, // fullwidth dollar sign
    0xFF20, // fullwidth commercial at
    0xFFE1, // fullwidth pound sign
    0xFFE5, // fullwidth yen sign
];

fn in_table(table: &[u16], c: char) -> bool {
    u16::try_from(u32::from(c))
        .map(|unit| table.binary_search(&unit).is_ok())
        .unwrap_or(false)
}

/// Scripts broken per character with kinsoku rules
fn is_ideographic(c: char) -> bool {
    matches!(u32::from(c), 0x1100..=0x11FF | 0x2E00..=0xFAFF | 0x20000..=0x3FFFF)
}

/// Whether a line may break before `text[pos]`
pub fn is_breakable(text: &[char], pos: usize) -> bool {
    let Some(&c) = text.get(pos) else {
        return false;
    };

    if u32::from(c) <= 0xFF {
        return c == ' ' || c == '\n';
    }

    // Thai and Lao need dictionary segmentation
    if matches!(u32::from(c), 0x0E00..=0x0EFF) {
        return false;
    }

    if is_ideographic(c) {
        if pos == 0 {
            return false;
        }
        let prev = text[pos - 1];
        if c.is_punctuation_close() || c.is_punctuation_other() || prev.is_punctuation_open() {
            return false;
        }
        return !in_table(&NO_BREAK_BEFORE, c) && !in_table(&NO_BREAK_AFTER, prev);
    }

    c.is_whitespace()
}

/// Characters that receive extra space under `text-align: justify`
pub fn is_justification_space(c: char) -> bool {
    c == '\n' || c.is_separator_space()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_latin_breaks_at_spaces() {
        let text = chars("ab cd\nef");
        assert!(!is_breakable(&text, 1));
        assert!(is_breakable(&text, 2));
        assert!(is_breakable(&text, 5));
        assert!(!is_breakable(&text, 8));
        // U+00A0 is in Latin-1 but not a break opportunity
        assert!(!is_breakable(&chars("a\u{a0}b"), 1));
    }

    #[test]
    fn test_cjk_breaks_between_ideographs() {
        let text = chars("漢字仮名");
        assert!(!is_breakable(&text, 0));
        assert!(is_breakable(&text, 1));
        assert!(is_breakable(&text, 3));
    }

    #[test]
    fn test_kinsoku() {
        // no break before ideographic full stop (Po) or small kana
        assert!(!is_breakable(&chars("漢。"), 1));
        assert!(!is_breakable(&chars("カッ"), 1));
        // no break after opening bracket
        assert!(!is_breakable(&chars("「漢"), 1));
        // no break after the postal mark
        assert!(!is_breakable(&chars("〒漢"), 1));
    }

    #[test]
    fn test_other_scripts() {
        let text = chars("Привет мир");
        assert!(!is_breakable(&text, 3));
        assert!(is_breakable(&text, 6));
        assert!(!is_breakable(&chars("สวัสดี"), 2));
    }

    #[test]
    fn test_tables_sorted() {
        assert!(NO_BREAK_BEFORE.windows(2).all(|w| w[0] < w[1]));
        assert!(NO_BREAK_AFTER.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_justification_space() {
        assert!(is_justification_space(' '));
        assert!(is_justification_space('\n'));
        assert!(is_justification_space('\u{3000}'));
        assert!(!is_justification_space('\t'));
        assert!(!is_justification_space('a'));
    }
}
