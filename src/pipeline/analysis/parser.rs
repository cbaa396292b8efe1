use serde_json::{Map, Value};

use crate::models::{AbnormalValue, AnalysisResult, PatientDetails, Severity, NOT_SPECIFIED};

use super::AnalysisError;

pub const SUMMARY_PLACEHOLDER: &str = "Summary not available.";
pub const EXPLANATION_PLACEHOLDER: &str = "Explanation not available.";
const VALUE_PLACEHOLDER: &str = "Not specified";
const RANGE_PLACEHOLDER: &str = "Consult reference ranges";

/// Parse the model's reply into an [`AnalysisResult`].
///
/// The reply may be wrapped in prose or code fences; only the span from the
/// first `{` to the last `}` is decoded. Missing or mis-shaped fields are
/// normalized to empty lists or placeholders. No medical validation happens
/// here.
pub fn parse_analysis_response(response: &str) -> Result<AnalysisResult, AnalysisError> {
    let json_str = extract_json_object(response)?;

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| AnalysisError::MalformedResponse(format!("invalid JSON: {e}")))?;
    let object = value.as_object().ok_or_else(|| {
        AnalysisError::MalformedResponse("top-level JSON value is not an object".into())
    })?;

    Ok(normalize(object))
}

/// Slice out the outermost `{ ... }` span.
fn extract_json_object(response: &str) -> Result<&str, AnalysisError> {
    let start = response
        .find('{')
        .ok_or_else(|| AnalysisError::MalformedResponse("No JSON object found".into()))?;
    let end = response
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| AnalysisError::MalformedResponse("Unclosed JSON object".into()))?;
    Ok(&response[start..=end])
}

fn normalize(object: &Map<String, Value>) -> AnalysisResult {
    AnalysisResult {
        patient_details: parse_patient_details(object.get("patientDetails")),
        summary: string_or(object.get("summary"), SUMMARY_PLACEHOLDER),
        simple_explanation: string_or(object.get("simpleExplanation"), EXPLANATION_PLACEHOLDER),
        abnormal_values: parse_abnormal_values(object.get("abnormalValues")),
        detected_conditions: string_list(object.get("detectedConditions")),
        possible_causes: string_list(object.get("possibleCauses")),
        symptoms: string_list(object.get("symptoms")),
        lifestyle_recommendations: string_list(object.get("lifestyleRecommendations")),
        medication_guidance: string_list(object.get("medicationGuidance")),
        clinician_guidance: string_list(object.get("clinicianGuidance")),
    }
}

/// A non-blank string, or a number rendered as text.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or(value: Option<&Value>, placeholder: &str) -> String {
    scalar_text(value).unwrap_or_else(|| placeholder.to_string())
}

/// Keep the string items of an array, in order. Anything else is empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => vec![],
    }
}

fn parse_patient_details(value: Option<&Value>) -> PatientDetails {
    let Some(Value::Object(details)) = value else {
        return PatientDetails::default();
    };
    PatientDetails {
        name: string_or(details.get("name"), NOT_SPECIFIED),
        age: string_or(details.get("age"), NOT_SPECIFIED),
        gender: string_or(details.get("gender"), NOT_SPECIFIED),
        phone_number: string_or(details.get("phoneNumber"), NOT_SPECIFIED),
    }
}

/// Lenient: items that are not objects or lack a parameter name are skipped.
fn parse_abnormal_values(value: Option<&Value>) -> Vec<AbnormalValue> {
    let Some(Value::Array(items)) = value else {
        return vec![];
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let parameter = scalar_text(item.get("parameter"))?;
            Some(AbnormalValue {
                parameter,
                value: string_or(item.get("value"), VALUE_PLACEHOLDER),
                normal_range: string_or(item.get("normalRange"), RANGE_PLACEHOLDER),
                severity: item
                    .get("severity")
                    .and_then(Value::as_str)
                    .map(Severity::from_label)
                    .unwrap_or(Severity::Low),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_reply() -> &'static str {
        r#"Here is the analysis you asked for:

```json
{
  "patientDetails": {"name": "Meera Iyer", "age": 45, "gender": "Female", "phoneNumber": "9876543210"},
  "summary": "Blood sugar is above the usual range.",
  "simpleExplanation": "Your fasting glucose is higher than typical.",
  "abnormalValues": [
    {"parameter": "Glucose", "value": "140 mg/dL", "normalRange": "70-100 mg/dL", "severity": "high"},
    {"parameter": "Hemoglobin", "value": 9.1, "normalRange": "12-16 g/dL", "severity": "CRITICAL_LOW"}
  ],
  "detectedConditions": ["Possible impaired glucose regulation"],
  "possibleCauses": ["Diet", 42, "Insufficient activity"],
  "symptoms": ["Fatigue"],
  "lifestyleRecommendations": ["Walk daily"],
  "medicationGuidance": ["Do not start medication without advice"],
  "clinicianGuidance": ["Ask about an HbA1c test"]
}
```
Let me know if you need anything else."#
    }

    #[test]
    fn parses_reply_wrapped_in_prose() {
        let result = parse_analysis_response(full_reply()).unwrap();
        assert_eq!(result.patient_details.name, "Meera Iyer");
        assert_eq!(result.patient_details.age, "45");
        assert_eq!(result.abnormal_values.len(), 2);
        assert_eq!(result.abnormal_values[0].severity, Severity::High);
        assert_eq!(result.abnormal_values[1].value, "9.1");
        assert_eq!(result.abnormal_values[1].severity, Severity::Critical);
        assert_eq!(result.possible_causes, vec!["Diet", "Insufficient activity"]);
    }

    #[test]
    fn decodes_minimal_object_between_noise() {
        let result =
            parse_analysis_response(r#"noise {"summary":"ok","abnormalValues":[]} trailing"#)
                .unwrap();
        assert_eq!(result.summary, "ok");
        assert!(result.abnormal_values.is_empty());
        assert_eq!(result.simple_explanation, EXPLANATION_PLACEHOLDER);
        assert_eq!(result.patient_details, PatientDetails::default());
        assert!(result.detected_conditions.is_empty());
        assert!(result.clinician_guidance.is_empty());
    }

    #[test]
    fn non_json_text_is_malformed() {
        let result = parse_analysis_response("I'm sorry, I cannot help with that.");
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }

    #[test]
    fn broken_json_is_malformed() {
        let result = parse_analysis_response("{\"summary\": \"cut off\", ");
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
        let result = parse_analysis_response("{summary: unquoted}");
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }

    #[test]
    fn closing_brace_before_opening_is_malformed() {
        let result = parse_analysis_response("} nothing {");
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }

    #[test]
    fn non_array_fields_become_empty_lists() {
        let result = parse_analysis_response(
            r#"{"symptoms": "fatigue", "abnormalValues": {"parameter": "x"}, "possibleCauses": null}"#,
        )
        .unwrap();
        assert!(result.symptoms.is_empty());
        assert!(result.abnormal_values.is_empty());
        assert!(result.possible_causes.is_empty());
        assert_eq!(result.summary, SUMMARY_PLACEHOLDER);
    }

    #[test]
    fn abnormal_items_without_parameter_are_skipped() {
        let result = parse_analysis_response(
            r#"{"abnormalValues": [{"value": "5"}, "Iron low", {"parameter": "Iron", "severity": "purple"}]}"#,
        )
        .unwrap();
        assert_eq!(result.abnormal_values.len(), 1);
        let iron = &result.abnormal_values[0];
        assert_eq!(iron.parameter, "Iron");
        assert_eq!(iron.value, VALUE_PLACEHOLDER);
        assert_eq!(iron.normal_range, RANGE_PLACEHOLDER);
        assert_eq!(iron.severity, Severity::Low);
    }

    #[test]
    fn blank_identifiers_use_placeholder() {
        let result = parse_analysis_response(
            r#"{"patientDetails": {"name": "  ", "age": null, "gender": "Male"}}"#,
        )
        .unwrap();
        assert_eq!(result.patient_details.name, NOT_SPECIFIED);
        assert_eq!(result.patient_details.age, NOT_SPECIFIED);
        assert_eq!(result.patient_details.gender, "Male");
        assert_eq!(result.patient_details.phone_number, NOT_SPECIFIED);
    }
}
