/// Fixed patient-facing text for results built without the AI model.
///
/// Conservative and non-diagnostic: every entry defers to a clinician.
pub struct Narrative {
    pub simple_explanation: &'static str,
    pub detected_conditions: &'static [&'static str],
    pub possible_causes: &'static [&'static str],
    pub symptoms: &'static [&'static str],
    pub lifestyle_recommendations: &'static [&'static str],
    pub medication_guidance: &'static [&'static str],
    pub clinician_guidance: &'static [&'static str],
}

pub static READABLE_NARRATIVE: Narrative = Narrative {
    simple_explanation: "This is a basic automated review of your report. It compares the \
        numbers it can recognise with common reference ranges. It cannot see the full picture \
        of your health, so please go through the results with your doctor.",
    detected_conditions: &[],
    possible_causes: &[
        "Lab values can shift with recent meals, hydration, medication and time of day.",
        "Reference ranges differ between laboratories and patient groups.",
    ],
    symptoms: &[
        "Many out-of-range values cause no symptoms at all.",
        "Note any tiredness, dizziness or other changes you have noticed and mention them to your doctor.",
    ],
    lifestyle_recommendations: &[
        "Keep a balanced diet with plenty of vegetables, fruit and whole grains.",
        "Stay physically active as your doctor advises.",
        "Drink enough water and get regular sleep.",
    ],
    medication_guidance: &[
        "Do not start, stop or change any medication based on this review.",
        "Continue your current prescriptions unless your doctor tells you otherwise.",
    ],
    clinician_guidance: &[
        "Share this report with your doctor for a full interpretation.",
        "Ask whether any flagged value needs a repeat test or follow-up.",
    ],
};

pub static UNREADABLE_NARRATIVE: Narrative = Narrative {
    simple_explanation: "We could not read the text in this document. It may be a scanned \
        image or a protected file. Please ask your doctor or the laboratory to go through the \
        results with you.",
    detected_conditions: &[],
    possible_causes: &[],
    symptoms: &[],
    lifestyle_recommendations: &[
        "Keep to your usual healthy routine until your results have been reviewed.",
    ],
    medication_guidance: &[
        "Do not change any medication until a clinician has reviewed your report.",
    ],
    clinician_guidance: &[
        "Share the original report with your doctor or the issuing laboratory.",
        "Ask the laboratory for a digital copy of the report if one is available.",
    ],
};

pub const UNREADABLE_SUMMARY: &str =
    "The report could not be read, so no lab values were analysed.";

/// Summary line for a readable report with `flagged` abnormal values.
pub fn readable_summary(flagged: usize) -> String {
    match flagged {
        0 => "An automated review did not flag any recognised values outside typical \
              reference ranges."
            .to_string(),
        1 => "An automated review flagged 1 value outside typical reference ranges.".to_string(),
        n => format!("An automated review flagged {n} values outside typical reference ranges."),
    }
}

pub fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
