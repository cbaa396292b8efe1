use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Form data supplied by the caller alongside the uploaded report.
///
/// Used for record linkage only. Identifiers shown in the analysis always come
/// from the document itself, so a stale form never overrides the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub phone_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_form() {
        let json = r#"{"name":"Asha Rao","age":52,"gender":"female","phoneNumber":"9876543210"}"#;
        let ctx: PatientContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.age, 52);
        assert_eq!(ctx.gender, Gender::Female);
        assert_eq!(ctx.phone_number, "9876543210");
    }

    #[test]
    fn rejects_gender_outside_enum() {
        let json = r#"{"name":"X","age":1,"gender":"robot","phoneNumber":"1"}"#;
        assert!(serde_json::from_str::<PatientContext>(json).is_err());
    }
}
