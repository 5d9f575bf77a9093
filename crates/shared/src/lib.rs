//! Shared utilities for the Fleet Presence backend.
//!
//! This crate provides common functionality used across the other crates:
//! - Page-numbered pagination for listing endpoints
//! - Common request validation logic

pub mod pagination;
pub mod validation;
