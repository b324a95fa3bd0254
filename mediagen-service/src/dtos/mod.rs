pub mod generation;

pub use generation::{ImageGenerationRequest, VideoGenerationRequest};
