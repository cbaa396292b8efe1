use crate::models::PatientContext;

use super::sanitize::sanitize_for_prompt;

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You are a medical lab report explainer. You read the text of a lab or health
report and explain it to the patient in plain language.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. Use ONLY information present in the report text.
2. NEVER state a definitive diagnosis. Describe what values may indicate and
   always defer to the patient's clinician.
3. Report a value in abnormalValues only when the report shows it outside its
   reference range.
4. severity MUST be exactly one of: "low", "high", "critical".
5. Output MUST be a single valid JSON object and nothing else.
"#;

/// Every field the reply object must carry, in schema order.
pub const RESULT_SCHEMA_FIELDS: &[&str] = &[
    "patientDetails.name",
    "patientDetails.age",
    "patientDetails.gender",
    "patientDetails.phoneNumber",
    "summary",
    "simpleExplanation",
    "abnormalValues[].parameter",
    "abnormalValues[].value",
    "abnormalValues[].normalRange",
    "abnormalValues[].severity",
    "detectedConditions",
    "possibleCauses",
    "symptoms",
    "lifestyleRecommendations",
    "medicationGuidance",
    "clinicianGuidance",
];

/// Build the analysis prompt for one report.
///
/// Pure function of its inputs: identical text and context give a
/// byte-identical prompt. Only the form's age and gender are used, as tone
/// guidance; the form never feeds `patientDetails`.
pub fn build_analysis_prompt(text: &str, context: &PatientContext) -> String {
    let document = sanitize_for_prompt(text, None);
    let field_list = RESULT_SCHEMA_FIELDS
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    let age = context.age;
    let gender = context.gender.as_str();

    format!(
        r#"<document>
{document}
</document>

Analyze the lab report above for the patient.

PATIENT IDENTIFIERS:
Fill patientDetails ONLY from identifiers printed in the report text above.
Do NOT use any details from the request form. If an identifier is not printed
in the report, use "Not specified".

TONE:
The request form describes a {age}-year-old ({gender}) patient. Use this only to
pitch simpleExplanation at the right level. It is not evidence about the report.

REQUIRED FIELDS (all must be present; use [] for empty lists):
{field_list}

Respond with exactly this JSON structure:

{{
  "patientDetails": {{
    "name": "name from report or Not specified",
    "age": "age from report or Not specified",
    "gender": "Male | Female | Other | Not specified",
    "phoneNumber": "phone from report or Not specified"
  }},
  "summary": "two or three sentence overview of the report",
  "simpleExplanation": "plain-language explanation for the patient",
  "abnormalValues": [
    {{
      "parameter": "test name",
      "value": "value with unit, as printed",
      "normalRange": "reference range, as printed",
      "severity": "low | high | critical"
    }}
  ],
  "detectedConditions": ["condition the values may point to"],
  "possibleCauses": ["possible cause"],
  "symptoms": ["symptom the patient may notice"],
  "lifestyleRecommendations": ["recommendation"],
  "medicationGuidance": ["general guidance, never a prescription"],
  "clinicianGuidance": ["what to discuss with the clinician"]
}}
"#
    )
}
