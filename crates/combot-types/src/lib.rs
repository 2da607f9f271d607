pub mod chat;
pub mod classification;
pub mod scenario;

pub use chat::{flow, ChatLogEntry, MessageTypeEntry, ResponseKind, BOT_SENDER};
pub use classification::{Classification, LabelScore};
pub use scenario::{Brand, EndpointType, Level, ParseEnumError, ProblemType, Scenario, ScenarioPatch};
