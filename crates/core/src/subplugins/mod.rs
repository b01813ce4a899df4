//! Trigger and step subplugins.
//!
//! This module provides:
//! - [`Trigger`] and [`Step`]: the capabilities the engine dispatches to
//! - Built-in triggers ([`triggers`]) and steps ([`steps`])

pub mod base;
pub mod steps;
pub mod triggers;

pub use base::{
    insert_field, merge_input, parse_settings, take_message, Step, StepContext, SubpluginError,
    Trigger, TriggerContext, MESSAGE_KEY,
};
