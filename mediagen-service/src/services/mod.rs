pub mod metrics;
pub mod providers;

pub use providers::{
    CallContext, HuggingFaceProvider, ImageParams, ImageProvider, MediaKind, MediaNormalizer,
    MockProvider, ProviderError, ProviderOutput, VideoProvider,
};
