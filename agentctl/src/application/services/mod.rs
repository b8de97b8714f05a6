//! Application services: use-case orchestration.
//!
//! Each service module composes domain logic with port trait calls. Services
//! import only from `crate::domain` and `crate::application::ports`.

pub mod installer;
pub mod lifecycle;
pub mod rule_repository;
