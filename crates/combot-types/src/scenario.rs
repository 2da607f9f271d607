use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Error returned when a label does not match any known variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Brand persona the bot speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Brand {
    #[default]
    Basic,
    Lulu,
}

impl Brand {
    pub const ALL: [Brand; 2] = [Brand::Basic, Brand::Lulu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Basic => "Basic",
            Brand::Lulu => "Lulu",
        }
    }
}

/// Complaint category produced by the classifier
///
/// A: defective product, B: delayed delivery, C: rude employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, ToSchema)]
pub enum ProblemType {
    #[default]
    A,
    B,
    C,
    Other,
}

impl ProblemType {
    pub const ALL: [ProblemType; 4] = [ProblemType::A, ProblemType::B, ProblemType::C, ProblemType::Other];

    /// Categories that have a canned question bank
    pub const ON_TOPIC: [ProblemType; 3] = [ProblemType::A, ProblemType::B, ProblemType::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::A => "A",
            ProblemType::B => "B",
            ProblemType::C => "C",
            ProblemType::Other => "Other",
        }
    }

    pub fn is_on_topic(&self) -> bool {
        !matches!(self, ProblemType::Other)
    }
}

/// High/Low manipulation used for both the "think" and "feel" axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Level {
    #[default]
    High,
    Low,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::High, Level::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Low => "Low",
        }
    }
}

/// Which family of endpoints a session was routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    #[default]
    General,
    Lulu,
}

impl EndpointType {
    pub const ALL: [EndpointType; 2] = [EndpointType::General, EndpointType::Lulu];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::General => "general",
            EndpointType::Lulu => "lulu",
        }
    }

    /// Public chat path for this endpoint family
    pub fn chat_path(&self) -> &'static str {
        match self {
            EndpointType::General => "/api/chatbot/",
            EndpointType::Lulu => "/api/lulu/",
        }
    }
}

macro_rules! impl_label {
    ($ty:ty, $kind:literal, [$($label:literal => $variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

impl_label!(Brand, "brand", ["Basic" => Brand::Basic, "Lulu" => Brand::Lulu]);
impl_label!(ProblemType, "problem type", [
    "A" => ProblemType::A,
    "B" => ProblemType::B,
    "C" => ProblemType::C,
    "Other" => ProblemType::Other,
]);
impl_label!(Level, "level", ["High" => Level::High, "Low" => Level::Low]);
impl_label!(EndpointType, "endpoint type", ["general" => EndpointType::General, "lulu" => EndpointType::Lulu]);

/// Experimental condition assigned to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct Scenario {
    pub brand: Brand,
    pub problem_type: ProblemType,
    pub think_level: Level,
    pub feel_level: Level,
}

impl Scenario {
    pub fn new(brand: Brand, problem_type: ProblemType, think_level: Level, feel_level: Level) -> Self {
        Self {
            brand,
            problem_type,
            think_level,
            feel_level,
        }
    }

    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brand = brand;
        self
    }

    /// Overlay the fields present in `patch`
    pub fn apply(mut self, patch: &ScenarioPatch) -> Self {
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(problem_type) = patch.problem_type {
            self.problem_type = problem_type;
        }
        if let Some(think_level) = patch.think_level {
            self.think_level = think_level;
        }
        if let Some(feel_level) = patch.feel_level {
            self.feel_level = feel_level;
        }
        self
    }
}

/// Partial scenario as sent by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ScenarioPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<ProblemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub think_level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feel_level: Option<Level>,
}

impl ScenarioPatch {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.problem_type.is_none()
            && self.think_level.is_none()
            && self.feel_level.is_none()
    }
}

impl From<Scenario> for ScenarioPatch {
    fn from(scenario: Scenario) -> Self {
        Self {
            brand: Some(scenario.brand),
            problem_type: Some(scenario.problem_type),
            think_level: Some(scenario.think_level),
            feel_level: Some(scenario.feel_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.brand, Brand::Basic);
        assert_eq!(scenario.problem_type, ProblemType::A);
        assert_eq!(scenario.think_level, Level::High);
        assert_eq!(scenario.feel_level, Level::High);
    }

    #[test]
    fn test_wire_labels() {
        let scenario = Scenario::new(Brand::Lulu, ProblemType::Other, Level::Low, Level::High);
        let json = serde_json::to_value(scenario).unwrap();
        assert_eq!(json["brand"], "Lulu");
        assert_eq!(json["problem_type"], "Other");
        assert_eq!(json["think_level"], "Low");
        assert_eq!(serde_json::to_value(EndpointType::Lulu).unwrap(), "lulu");
    }

    #[test]
    fn test_apply_patch_keeps_missing_fields() {
        let patch: ScenarioPatch = serde_json::from_str(r#"{"brand": "Lulu", "feel_level": "Low"}"#).unwrap();
        let scenario = Scenario::default().apply(&patch);
        assert_eq!(scenario.brand, Brand::Lulu);
        assert_eq!(scenario.feel_level, Level::Low);
        assert_eq!(scenario.think_level, Level::High);
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        let err = "D".parse::<ProblemType>().unwrap_err();
        assert_eq!(err.kind, "problem type");
        assert!("Nike".parse::<Brand>().is_err());
        assert_eq!("Other".parse::<ProblemType>().unwrap(), ProblemType::Other);
    }
}
