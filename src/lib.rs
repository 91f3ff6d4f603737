#![doc(test(attr(deny(warnings))))]

//! Property Core provides the property and booking records, stay pricing, and
//! the multi-step form engine used to create and edit them, plus a command
//! shell that drives those forms.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod forms;
pub mod pricing;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Property Core tracing initialized.");
    });
}
