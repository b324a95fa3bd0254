//! service-core: configuration, error contract, HTTP middleware and
//! observability shared by the mediagen services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
