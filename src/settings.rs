//! Internal settings for Rangetree.
//!
//! This module initializes the logging configuration for Rangetree at startup.
//! The logging behavior is controlled by the `DEBUG_RANGETREE` environment variable.
//! If `DEBUG_RANGETREE` is not set or is set to a falsy value ("0", "false", or empty),
//! logging will remain disabled. Otherwise, logging is enabled with a maximum level of DEBUG.

use ctor::ctor;
use tracing::Level;

#[ctor]
fn set_debug_level() {
    // If DEBUG_RANGETREE is not set or set to a falsy value, disable logging.
    // Otherwise, initialize a debug-level subscriber.
    if std::env::var("DEBUG_RANGETREE").map_or(true, |v| v == "0" || v == "false" || v.is_empty())
    {
        // Logging macros stay silent without a subscriber.
    } else {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .init();
    }
}
