pub mod answer;
pub mod question;
pub mod sets;

// Re-export the main types for convenience
pub use answer::Answer;
pub use question::Question;
pub use sets::{HistoryDisplay, QuestionSetDefinition, QuestionSetId};
