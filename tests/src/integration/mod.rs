//! Cross-crate integration tests exercising full alert flows.

pub mod flows;
pub mod lifecycle;
