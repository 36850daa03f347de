//! Core infrastructure module for the decision forest.
//!
//! - [`types`]: fundamental aliases and the [`Class`](types::Class) enum
//! - [`constants`]: search grid sizes and training defaults
//! - [`error`]: the crate error type
//! - [`traits`]: feature-row and classifier seams

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{ForestError, Result};
pub use traits::*;
pub use types::*;

use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

/// Initialize logging for the library.
///
/// Safe to call any number of times; only the first call installs the
/// `env_logger` backend (controlled by `RUST_LOG`).
pub fn initialize_core() -> Result<()> {
    LOGGER_INIT.call_once(|| {
        // Another logger may already be installed by the host application.
        let _ = env_logger::try_init();
        log::debug!("decision-forest {} initialized", DECISION_FOREST_VERSION);
    });
    Ok(())
}

/// Check if [`initialize_core`] has run.
pub fn is_core_initialized() -> bool {
    LOGGER_INIT.is_completed()
}
