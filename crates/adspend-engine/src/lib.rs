//! Generates spend records for a campaign over a period, day by day, without
//! exceeding the daily or monthly limits derived from its budget history.

pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod synthesizer;

pub use error::GenerationError;
pub use memory::MemoryStore;
pub use orchestrator::{DayOutcome, GenerationOrchestrator, GenerationReport};
pub use synthesizer::{DayState, DaySynthesis, DayWindow, EventSynthesizer, SynthesisSettings};
