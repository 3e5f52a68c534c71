pub mod batch;
pub mod correction;
pub mod recognizer;
pub mod utterance;

pub use batch::*;
pub use correction::*;
pub use recognizer::*;
pub use utterance::*;
