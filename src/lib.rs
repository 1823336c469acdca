//! BeAligned - Guided co-parent reflection engine
//!
//! This crate walks a parent through a fixed seven-phase reflection,
//! deciding after every utterance whether to probe deeper, restate the
//! prompt, or advance. Phase prompts are rendered verbatim; a text
//! generator supplies the warm acknowledgement around them.
//!
//! Layout follows ports and adapters:
//! - `domain` - phases, lexical features, completion evaluation, progression
//! - `ports` - text generation and storage traits
//! - `application` - command and query handlers
//! - `adapters` - OpenAI, PostgreSQL, in-memory and HTTP implementations
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
