//! HTTP handlers for mediagen-service.

pub mod generate;
pub mod health;
pub mod metrics;
pub mod root;

pub use generate::{generate_image, generate_video};
pub use health::health_check;
pub use self::metrics::metrics;
pub use root::index;
