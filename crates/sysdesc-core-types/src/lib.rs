//! Core types shared across sysdesc facilities
//!
//! This crate provides the canonical field keys and event names used by
//! the logging facility and by every crate that emits structured events.

pub mod schema;
