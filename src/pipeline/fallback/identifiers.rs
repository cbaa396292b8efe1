use std::sync::LazyLock;

use regex::Regex;

use crate::models::{PatientDetails, NOT_SPECIFIED};

/// Reads one identifier from report text, or `None` if nothing plausible is found.
pub type Extractor = fn(&str) -> Option<String>;

/// Try each extractor in order; the first plausible value wins.
pub fn first_match(text: &str, extractors: &[Extractor]) -> Option<String> {
    extractors.iter().find_map(|extract| extract(text))
}

/// Label-anchored patterns come first, positional ones after.
pub static NAME_EXTRACTORS: &[Extractor] = &[name_from_label, name_from_title];
pub static AGE_EXTRACTORS: &[Extractor] = &[
    age_from_label,
    age_from_age_sex_pair,
    age_from_years,
    age_from_short_pair,
];
pub static GENDER_EXTRACTORS: &[Extractor] = &[
    gender_from_label,
    gender_from_age_sex_pair,
    gender_from_short_pair,
];
pub static PHONE_EXTRACTORS: &[Extractor] = &[phone_from_label, phone_from_digit_run];

/// Identifiers printed on the report. Anything not found is "Not specified".
pub fn extract_patient_details(text: &str) -> PatientDetails {
    let or_placeholder = |value: Option<String>| value.unwrap_or_else(|| NOT_SPECIFIED.into());
    PatientDetails {
        name: or_placeholder(first_match(text, NAME_EXTRACTORS)),
        age: or_placeholder(first_match(text, AGE_EXTRACTORS)),
        gender: or_placeholder(first_match(text, GENDER_EXTRACTORS)),
        phone_number: or_placeholder(first_match(text, PHONE_EXTRACTORS)),
    }
}

const MAX_AGE: u32 = 120;
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_NAME_LEN: usize = 60;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid identifier regex pattern")
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ── Name ──────────────────────────────────────────────────

static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?im)^[ \t]*(?:patient(?:'s)?[ \t]+name|name(?:[ \t]+of[ \t]+(?:the[ \t]+)?patient)?)[ \t]*[:\-][ \t]*(.+)$")
});

static NAME_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?m)^[ \t]*((?i:mr|mrs|ms|miss|dr|master|baby)\.?[ \t]+[A-Za-z][A-Za-z .'\-]{1,50})")
});

/// Where a name field runs into the next field on the same line.
static NAME_STOP: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(?:age|sex|gender|dob|d\.o\.b|uhid|mrn|id|phone|mobile|date|ref(?:erred)?)\b|\s{2,}|\t|\|")
});

fn name_from_label(text: &str) -> Option<String> {
    clean_name(first_capture(&NAME_LABEL, text)?)
}

fn name_from_title(text: &str) -> Option<String> {
    clean_name(first_capture(&NAME_TITLE, text)?)
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, ' ' | '.' | '\'' | '-')
}

/// Keeps the leading run of name characters, so trailing "(F)" or
/// ", 45 Yrs" on the same line is dropped.
fn clean_name(raw: &str) -> Option<String> {
    let cut = NAME_STOP.find(raw).map_or(raw, |m| &raw[..m.start()]);
    let end = cut.find(|c: char| !is_name_char(c)).unwrap_or(cut.len());
    let name = cut[..end].trim().trim_end_matches(['-', '.']).trim();

    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    let plausible = letters >= 2 && name.len() <= MAX_NAME_LEN;
    plausible.then(|| name.to_string())
}

// ── Age ───────────────────────────────────────────────────

static AGE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\bage\s*[:\-]?\s*(\d{1,3})\b"));

static AGE_SEX_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\bage\s*/\s*(?:sex|gender)\s*[:\-]?\s*(\d{1,3})\s*(?:y(?:ears?|rs?)?)?\s*/\s*(male|female|other|m|f|o)\b")
});

static AGE_YEARS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\b(\d{1,3})\s*(?:years?|yrs?)\b"));

static AGE_SHORT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\b(\d{1,3})\s*y\s*/\s*(male|female|other|m|f|o)\b"));

fn plausible_age(raw: &str) -> Option<String> {
    raw.parse::<u32>()
        .ok()
        .filter(|age| *age <= MAX_AGE)
        .map(|age| age.to_string())
}

fn age_from_label(text: &str) -> Option<String> {
    plausible_age(first_capture(&AGE_LABEL, text)?)
}

fn age_from_age_sex_pair(text: &str) -> Option<String> {
    plausible_age(first_capture(&AGE_SEX_PAIR, text)?)
}

fn age_from_years(text: &str) -> Option<String> {
    plausible_age(first_capture(&AGE_YEARS, text)?)
}

fn age_from_short_pair(text: &str) -> Option<String> {
    plausible_age(first_capture(&AGE_SHORT_PAIR, text)?)
}

// ── Gender ────────────────────────────────────────────────

static GENDER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(?:sex|gender)\s*[:\-]?\s*(male|female|other|m|f|o)\b")
});

/// Full capitalized word from a leading-letter match.
fn normalize_gender(raw: &str) -> Option<String> {
    match raw.chars().next()?.to_ascii_lowercase() {
        'm' => Some("Male".into()),
        'f' => Some("Female".into()),
        'o' => Some("Other".into()),
        _ => None,
    }
}

fn gender_from_label(text: &str) -> Option<String> {
    normalize_gender(first_capture(&GENDER_LABEL, text)?)
}

fn gender_from_age_sex_pair(text: &str) -> Option<String> {
    let caps = AGE_SEX_PAIR.captures(text)?;
    normalize_gender(caps.get(2)?.as_str())
}

fn gender_from_short_pair(text: &str) -> Option<String> {
    let caps = AGE_SHORT_PAIR.captures(text)?;
    normalize_gender(caps.get(2)?.as_str())
}

// ── Phone ─────────────────────────────────────────────────

static PHONE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\b(?:phone|mobile|mob|contact|tel|ph)(?:[ \t]*(?:no\.?|number|#))?[ \t]*[:\-.]?[ \t]*(\+?\d[\d \-()]{8,18}\d)")
});

static PHONE_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?:^|\s)(\+?\d{10,13})\b"));

/// Digits only, keeping a leading `+`. Needs at least ten digits.
///
/// Digit groups are taken until ten digits are reached, so a number that
/// runs into an unrelated value ("9876543210 45") keeps only the phone.
fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits = String::new();
    for group in raw.split(|c: char| !c.is_ascii_digit()).filter(|g| !g.is_empty()) {
        if digits.len() >= MIN_PHONE_DIGITS {
            break;
        }
        digits.push_str(group);
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return None;
    }
    if raw.trim_start().starts_with('+') {
        Some(format!("+{digits}"))
    } else {
        Some(digits)
    }
}

fn phone_from_label(text: &str) -> Option<String> {
    normalize_phone(first_capture(&PHONE_LABEL, text)?)
}

fn phone_from_digit_run(text: &str) -> Option<String> {
    normalize_phone(first_capture(&PHONE_DIGIT_RUN, text)?)
}
