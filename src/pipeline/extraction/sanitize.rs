/// Punctuation and symbols that carry meaning in lab reports
/// (units, ranges, ratios, flags) and survive cleanup.
const KEPT_SYMBOLS: &[char] = &[
    '.', ',', ';', ':', '-', '/', '(', ')', '[', ']', '+', '=', '%', '#', '@', '&', '\'', '"',
    '!', '?', '<', '>', '*', '_', '°', '²', '³', 'µ', 'μ', '±', '≤', '≥',
    '\u{2013}', // en-dash, common in printed ranges
    '\u{2014}',
];

fn is_kept_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || c == '\t' || c == '\n' || KEPT_SYMBOLS.contains(&c)
}

/// Clean text coming out of the PDF library before anything reads it.
/// Drops control and stray glyph characters, trims every line and removes
/// empty ones. Page breaks from the library (form feeds) become newlines.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.replace(['\u{000C}', '\r'], "\n")
        .chars()
        .filter(|c| is_kept_char(*c))
        .collect::<String>()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters() {
        let clean = sanitize_extracted_text("Sodium\x00: 131\x07 mmol/L");
        assert_eq!(clean, "Sodium: 131 mmol/L");
    }

    #[test]
    fn keeps_units_and_ranges() {
        let raw = "Vitamin B12: 150 pg/mL (200\u{2013}900)\nHbA1c: 7.2 % ≥6.5";
        let clean = sanitize_extracted_text(raw);
        assert!(clean.contains("150 pg/mL (200\u{2013}900)"));
        assert!(clean.contains("7.2 % ≥6.5"));
    }

    #[test]
    fn page_breaks_become_line_breaks() {
        let clean = sanitize_extracted_text("page one\u{000C}page two\r\nend");
        assert_eq!(clean, "page one\npage two\nend");
    }

    #[test]
    fn drops_blank_lines_and_edges() {
        let clean = sanitize_extracted_text("\n\n   Name: Ravi   \n\n\n  Age: 40 \n");
        assert_eq!(clean, "Name: Ravi\nAge: 40");
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        assert_eq!(sanitize_extracted_text(" \n\t\n \u{000C} "), "");
    }
}
