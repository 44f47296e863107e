//! service-core: shared infrastructure for the hotel booking services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
