//! Domain layer for the Fleet Presence backend.
//!
//! This crate contains:
//! - Domain models (Device, LockEvent) and request/response DTOs
//! - The record store contract shared by all write paths
//! - An in-memory store used by tests and local development

pub mod models;
pub mod store;
