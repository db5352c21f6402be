//! Text-generation service integration
//!
//! The pipeline only ever sees the [`TextGenerator`] trait; concrete
//! providers translate a [`GenerationRequest`] into one HTTP call.

mod generator;
mod providers;

pub use generator::{GenerationRequest, TextGenerator};
pub use providers::create_generator;

#[cfg(test)]
pub use generator::GenerationResponse;
