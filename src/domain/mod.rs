//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `reflection` - Phase table, lexical features, completion policy, and progression

pub mod foundation;
pub mod reflection;
