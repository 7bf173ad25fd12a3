//! HTTP handlers. Each module exposes a `*_routes()` builder that `lib.rs`
//! nests under `/api`; business rules live in [`crate::services`].

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod beams;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod deliveries;
pub mod design_presets;
pub mod machines;
pub mod reports;
pub mod workshops;

pub use crate::AppState;
