use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde wire name.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(Severity {
    Low => "low",
    High => "high",
    Critical => "critical",
});

str_enum!(AnalysisOutcome {
    AiSucceeded => "aiSucceeded",
    ExtractFailedFallback => "extractFailedFallback",
    InvokeFailedFallback => "invokeFailedFallback",
    ParseFailedFallback => "parseFailedFallback",
});

impl Severity {
    /// Fold a free-form severity label (as written by a model or a lab) into
    /// the closed set. Unknown labels become `Low`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.contains("critical") || lower.contains("panic") {
            Severity::Critical
        } else if lower.contains("high") || lower.contains("elevated") || lower.contains("above") {
            Severity::High
        } else {
            Severity::Low
        }
    }
}

impl AnalysisOutcome {
    pub fn used_fallback(&self) -> bool {
        !matches!(self, AnalysisOutcome::AiSucceeded)
    }
}
