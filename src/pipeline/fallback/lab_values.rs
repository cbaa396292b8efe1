use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::{AbnormalValue, Severity};

/// Raw parameter/value matches examined per document.
pub const MAX_CANDIDATES: usize = 8;
/// Abnormal values reported per document, earliest first.
pub const MAX_REPORTED: usize = 6;

pub const UNCODED_RANGE: &str = "Consult reference ranges";

/// Coded cut-offs for one parameter. `critical` checks run before `low`/`high`.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub critical_below: Option<f64>,
    pub critical_above: Option<f64>,
    pub low_below: Option<f64>,
    pub high_above: Option<f64>,
    pub normal_range: &'static str,
}

impl Thresholds {
    const NONE: Thresholds = Thresholds {
        critical_below: None,
        critical_above: None,
        low_below: None,
        high_above: None,
        normal_range: "",
    };

    /// `None` when the value is inside the band.
    pub fn classify(&self, value: f64) -> Option<Severity> {
        let below = |limit: Option<f64>| limit.is_some_and(|t| value < t);
        let above = |limit: Option<f64>| limit.is_some_and(|t| value > t);

        if below(self.critical_below) || above(self.critical_above) {
            Some(Severity::Critical)
        } else if below(self.low_below) {
            Some(Severity::Low)
        } else if above(self.high_above) {
            Some(Severity::High)
        } else {
            None
        }
    }
}

/// How a matched parameter is judged.
#[derive(Debug, Clone, Copy)]
pub enum ParameterRule {
    Coded(Thresholds),
    /// Judged against a printed range when there is one.
    Uncoded,
    /// Recognised so its name and value are consumed, never reported.
    Ignored,
}

/// One entry of the scanning vocabulary.
pub struct LabParameter {
    /// Capture group name in the combined pattern.
    key: &'static str,
    pub name: &'static str,
    aliases: &'static str,
    pub rule: ParameterRule,
}

/// Order matters where aliases overlap: HbA1c before hemoglobin,
/// HDL/LDL before total cholesterol, iron-binding tests before iron.
pub static LAB_PARAMETERS: &[LabParameter] = &[
    LabParameter {
        key: "hba1c",
        name: "HbA1c",
        aliases: r"hba1c|a1c\b|ha?emoglobin\s*a1c\b|glyc(?:osyl)?ated\s+ha?emoglobin(?:\s*\(\s*hba1c\s*\))?",
        rule: ParameterRule::Coded(Thresholds {
            high_above: Some(6.4),
            normal_range: "4.0-5.6 %",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "glucose",
        name: "Glucose",
        aliases: r"(?:fasting\s+|random\s+|post[\s-]?prandial\s+)?(?:blood\s+|plasma\s+)?(?:glucose|sugar)",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(70.0),
            high_above: Some(126.0),
            normal_range: "70-126 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "hdl",
        name: "HDL Cholesterol",
        aliases: r"hdl\b(?:[\s-]*cholesterol)?",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(40.0),
            normal_range: ">40 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "ldl",
        name: "LDL Cholesterol",
        aliases: r"ldl\b(?:[\s-]*cholesterol)?",
        rule: ParameterRule::Coded(Thresholds {
            critical_above: Some(190.0),
            high_above: Some(130.0),
            normal_range: "<130 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "total_cholesterol",
        name: "Total Cholesterol",
        aliases: r"(?:total\s+|serum\s+)?cholesterol(?:\s*,?\s*total)?",
        rule: ParameterRule::Coded(Thresholds {
            high_above: Some(200.0),
            normal_range: "<200 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "triglycerides",
        name: "Triglycerides",
        aliases: r"triglycerides?",
        rule: ParameterRule::Coded(Thresholds {
            critical_above: Some(500.0),
            high_above: Some(150.0),
            normal_range: "<150 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "hemoglobin",
        name: "Hemoglobin",
        aliases: r"ha?emoglobin|hgb\b|hb\b",
        rule: ParameterRule::Coded(Thresholds {
            critical_below: Some(10.0),
            low_below: Some(12.0),
            high_above: Some(18.0),
            normal_range: "12-18 g/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "iron_binding",
        name: "Iron Binding Capacity",
        aliases: r"t?ibc\b|uibc\b|(?:total|unsaturated)\s+iron\s+binding\s+capacity",
        rule: ParameterRule::Ignored,
    },
    LabParameter {
        key: "transferrin_saturation",
        name: "Transferrin Saturation",
        aliases: r"(?:transferrin|iron)\s+saturation|tsat\b",
        rule: ParameterRule::Ignored,
    },
    LabParameter {
        key: "iron",
        name: "Iron",
        aliases: r"(?:serum\s+)?iron\b",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(60.0),
            high_above: Some(170.0),
            normal_range: "60-170 mcg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "vitamin_d",
        name: "Vitamin D",
        aliases: r"vitamin\s*d[23]?(?:\s*[,(]?\s*25\s*[-\s]?\s*(?:oh|hydroxy)\s*\)?)?",
        rule: ParameterRule::Coded(Thresholds {
            critical_below: Some(10.0),
            low_below: Some(30.0),
            high_above: Some(100.0),
            normal_range: "30-100 ng/mL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "vitamin_b12",
        name: "Vitamin B12",
        aliases: r"vitamin\s*b[\s-]?12|b12\b",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(200.0),
            high_above: Some(900.0),
            normal_range: "200-900 pg/mL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "creatinine",
        name: "Creatinine",
        aliases: r"(?:serum\s+)?creatinine",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(0.6),
            high_above: Some(1.3),
            normal_range: "0.6-1.3 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "urea",
        name: "Urea",
        aliases: r"(?:blood\s+)?urea(?:\s+nitrogen)?|bun\b",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(15.0),
            high_above: Some(45.0),
            normal_range: "15-45 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "bilirubin",
        name: "Bilirubin",
        aliases: r"(?:total\s+|serum\s+)?bilirubin",
        rule: ParameterRule::Coded(Thresholds {
            high_above: Some(1.2),
            normal_range: "0.1-1.2 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "calcium",
        name: "Calcium",
        aliases: r"(?:total\s+|serum\s+)?calcium",
        rule: ParameterRule::Coded(Thresholds {
            low_below: Some(8.5),
            high_above: Some(10.5),
            normal_range: "8.5-10.5 mg/dL",
            ..Thresholds::NONE
        }),
    },
    LabParameter {
        key: "sodium",
        name: "Sodium",
        aliases: r"(?:serum\s+)?sodium",
        rule: ParameterRule::Coded(Thresholds {
            critical_below: Some(120.0),
            critical_above: Some(160.0),
            low_below: Some(135.0),
            high_above: Some(145.0),
            normal_range: "135-145 mmol/L",
        }),
    },
    LabParameter {
        key: "potassium",
        name: "Potassium",
        aliases: r"(?:serum\s+)?potassium",
        rule: ParameterRule::Coded(Thresholds {
            critical_below: Some(2.5),
            critical_above: Some(6.5),
            low_below: Some(3.5),
            high_above: Some(5.0),
            normal_range: "3.5-5.0 mmol/L",
        }),
    },
    LabParameter {
        key: "tsh",
        name: "TSH",
        aliases: r"tsh\b|thyroid\s+stimulating\s+hormone",
        rule: ParameterRule::Uncoded,
    },
    LabParameter {
        key: "platelets",
        name: "Platelets",
        aliases: r"platelets?(?:\s+count)?|plt\b",
        rule: ParameterRule::Uncoded,
    },
    LabParameter {
        key: "wbc",
        name: "WBC",
        aliases: r"wbc\b|white\s+blood\s+cells?(?:\s+count)?|total\s+leu[ck]ocyte\s+count|tlc\b",
        rule: ParameterRule::Uncoded,
    },
    LabParameter {
        key: "esr",
        name: "ESR",
        aliases: r"esr\b|erythrocyte\s+sedimentation\s+rate",
        rule: ParameterRule::Uncoded,
    },
    LabParameter {
        key: "uric_acid",
        name: "Uric Acid",
        aliases: r"(?:serum\s+)?uric\s+acid",
        rule: ParameterRule::Uncoded,
    },
];

/// Plain decimals and comma-grouped counts ("7,800", "2,50,000").
const NUMBER: &str = r"\d{1,3}(?:,\d{2,3})+(?:\.\d+)?|\d+(?:\.\d+)?";

const UNIT: &str = r"(?:(?:mg|gm|g|ng|pg|µg|μg|ug|mcg|mmol|µmol|μmol|umol|meq|miu|µiu|μiu|uiu|iu|u)(?:/(?:dl|l|ml|µl|μl|ul))?\b|%|mm/hr?\b|(?:cells\s*)?/\s*(?:cumm|cu\.?\s*mm|mm3|µl|μl|ul|hpf)\b|lakhs?(?:\s*/\s*cumm)?\b)";

/// Between a name and its value. Empty, or ending on a non-letter, so a
/// digit inside a name ("A1c", "25-OH") is never taken as the value.
const NAME_GAP: &str = r"(?:[^\d\n]{0,29}?[^\d\n\p{L}])?";

/// Text allowed between a value and a printed reference range.
const RANGE_LEAD: &str =
    r"[^\d\n\p{L}]{0,6}(?:(?:ref(?:erence)?|normal|range|bio\.?\s*ref\.?(?:\s*interval)?)[^\d\n]{0,16}?)?";

/// One pattern for the whole vocabulary, so overlapping names like
/// "HDL Cholesterol" are consumed once, in document order.
static LAB_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    let names = LAB_PARAMETERS
        .iter()
        .map(|p| format!("(?P<{}>{})", p.key, p.aliases))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"(?i)\b(?:{names}){NAME_GAP}(?P<value>{NUMBER})(?:\s*(?P<unit>{UNIT})|\b)(?:{RANGE_LEAD}(?P<low>{NUMBER})\s*(?:-|–|to)\s*(?P<high>{NUMBER}))?"
    );
    Regex::new(&pattern).expect("Invalid lab value regex pattern")
});

/// Scan report text for out-of-range lab values.
///
/// At most [`MAX_CANDIDATES`] matches are examined and at most
/// [`MAX_REPORTED`] abnormal ones are returned, in document order.
pub fn find_abnormal_values(text: &str) -> Vec<AbnormalValue> {
    LAB_VALUE
        .captures_iter(text)
        .take(MAX_CANDIDATES)
        .filter_map(|caps| judge_candidate(&caps))
        .take(MAX_REPORTED)
        .collect()
}

struct PrintedRange {
    low: f64,
    high: f64,
    text: String,
}

fn printed_range(caps: &Captures<'_>, unit: Option<&str>) -> Option<PrintedRange> {
    let low_text = caps.name("low")?.as_str();
    let high_text = caps.name("high")?.as_str();
    let low = parse_number(low_text)?;
    let high = parse_number(high_text)?;
    if low > high {
        return None;
    }
    let text = match unit {
        Some(unit) => format!("{low_text}-{high_text} {unit}"),
        None => format!("{low_text}-{high_text}"),
    };
    Some(PrintedRange { low, high, text })
}

/// Printed numbers may carry digit-group commas.
fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', "").parse::<f64>().ok()
}

fn judge_candidate(caps: &Captures<'_>) -> Option<AbnormalValue> {
    let parameter = LAB_PARAMETERS
        .iter()
        .find(|p| caps.name(p.key).is_some())?;
    let value_text = caps.name("value")?.as_str();
    let value = parse_number(value_text)?;
    let unit = caps.name("unit").map(|m| m.as_str());
    let range = printed_range(caps, unit);

    let (severity, normal_range) = match (parameter.rule, range) {
        (ParameterRule::Ignored, _) => return None,
        (ParameterRule::Coded(rule), range) => (
            rule.classify(value)?,
            range.map_or_else(|| rule.normal_range.to_string(), |r| r.text),
        ),
        (ParameterRule::Uncoded, Some(range)) => {
            let severity = if value < range.low {
                Severity::Low
            } else if value > range.high {
                Severity::High
            } else {
                return None;
            };
            (severity, range.text)
        }
        (ParameterRule::Uncoded, None) => (Severity::Low, UNCODED_RANGE.to_string()),
    };

    let value = match unit {
        Some(unit) => format!("{value_text} {unit}"),
        None => value_text.to_string(),
    };

    Some(AbnormalValue {
        parameter: parameter.name.to_string(),
        value,
        normal_range,
        severity,
    })
}
