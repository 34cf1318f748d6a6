use crate::qemu_trace;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// `log::Log` backend writing to QEMU's debug console.
pub struct QemuLogger {
    max_level: LevelFilter,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Install this logger as the global `log` backend.
    ///
    /// Call once during early init, before anything logs.
    ///
    /// # Errors
    /// [`SetLoggerError`] when a global logger was already installed.
    #[allow(static_mut_refs, clippy::missing_panics_doc)]
    pub fn init(self) -> Result<(), SetLoggerError> {
        // log::set_logger wants &'static dyn Log and there is no allocator
        // this early, so the instance moves into a static.
        static mut LOGGER: Option<QemuLogger> = None;

        let max_level = self.max_level;
        unsafe {
            LOGGER = Some(self);
            log::set_logger(LOGGER.as_ref().unwrap() as &'static dyn Log)?;
        }
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // "[LEVEL] target: message", formatted straight into the sink.
        qemu_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        // the debug console is unbuffered
    }
}
