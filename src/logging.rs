/// Conditional logging module for development builds
///
/// The `debug_log!` macro provides informational debug logging that is compiled
/// out in production (release) builds by default. Warnings about recoverable
/// geometry problems should continue using `log::warn!` directly.
///
/// Logging is enabled when either:
/// - Building in debug mode (`cfg(debug_assertions)`)
/// - The `console_logging` feature is explicitly enabled
///
/// The library never installs a logger; the host picks one.
///
/// # Examples
///
/// ```rust
/// use metro_map::debug_log;
///
/// debug_log!("Placed station {} at {:?}", "Central", (20.0, 50.0));
/// ```
/// Conditionally log in development builds
///
/// This macro expands to `log::debug!()` in debug builds or when the
/// `console_logging` feature is enabled. In production release builds,
/// it compiles to nothing.
#[macro_export]
macro_rules! debug_log {
    ($($arg:expr),+ $(,)?) => {
        #[cfg(any(debug_assertions, feature = "console_logging"))]
        {
            $crate::logging::log_crate::debug!($($arg),+);
        }
    };
}

#[doc(hidden)]
pub use ::log as log_crate;

pub use debug_log;

/// Logger for tests that records warnings per thread
#[cfg(test)]
pub(crate) mod capture {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Warn
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;
    static INIT: Once = Once::new();

    /// Install the logger once and clear this thread's warnings
    pub(crate) fn start() {
        INIT.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Warn);
            }
        });
        WARNINGS.with(|w| w.borrow_mut().clear());
    }

    pub(crate) fn warnings() -> Vec<String> {
        WARNINGS.with(|w| w.borrow().clone())
    }
}
