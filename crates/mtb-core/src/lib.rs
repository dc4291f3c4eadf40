//! Core domain and application logic for the Meshtastic Discord bot.
//!
//! This crate is framework-agnostic. Discord and GitHub live behind ports
//! (traits) implemented in adapter crates.

pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod faq;
pub mod logging;
pub mod messaging;
pub mod modal;
pub mod ports;

pub use errors::{Error, Result};
