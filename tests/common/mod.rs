#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)] // Not every test binary uses every helper

use std::sync::Once;

use textcore::{LogLevel, TextBuffer, TextOptions, set_log_callback};
use tracing::Level;

/// Install a test-writer subscriber and route library logs into it.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_test_writer()
            .try_init();
        set_log_callback(|level, msg| match level {
            LogLevel::Debug => tracing::debug!(target: "textcore", "{msg}"),
            LogLevel::Info => tracing::info!(target: "textcore", "{msg}"),
            LogLevel::Warn => tracing::warn!(target: "textcore", "{msg}"),
            LogLevel::Error => tracing::error!(target: "textcore", "{msg}"),
        });
    });
}

/// Buffer with default options.
pub fn buffer(text: &str) -> TextBuffer {
    TextBuffer::from_text(text, TextOptions::default())
}

/// Lines of the buffer as owned strings.
pub fn lines(buffer: &TextBuffer) -> Vec<String> {
    buffer.lines().map(|l| l.data().to_string()).collect()
}
