use std::ffi::CString;

use log::{LevelFilter, Log, Metadata, Record};

pub trait AsCString {
    fn as_c_string(&self) -> CString;
}

impl AsCString for String {
    fn as_c_string(&self) -> CString {
        CString::new(self.clone()).unwrap_or_default()
    }
}

impl AsCString for &str {
    fn as_c_string(&self) -> CString {
        self.to_string().as_c_string()
    }
}

#[cfg(windows)]
pub fn print_debug_string(s: &str) {
    use windows::{core::PCSTR, Win32::System::Diagnostics::Debug::OutputDebugStringA};

    let message = s.as_c_string();
    unsafe {
        OutputDebugStringA(PCSTR(message.as_ptr() as _));
    }
}

#[cfg(not(windows))]
pub fn print_debug_string(s: &str) {
    eprint!("{s}");
}

/// `log` backend for GUI-subsystem binaries, which have no console to write to.
///
/// Lines go to the debugger output on Windows and to stderr everywhere else.
pub struct DebugStringLogger {
    level: LevelFilter,
}

impl DebugStringLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

impl Log for DebugStringLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            print_debug_string(&format_record(record));
        }
    }

    fn flush(&self) {}
}

pub fn format_record(record: &Record) -> String {
    format!("[{} {}] {}\n", record.level(), record.target(), record.args())
}

pub const fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

static LOGGER: DebugStringLogger = DebugStringLogger::new(default_level());

/// Installs [`DebugStringLogger`] as the global logger. Later calls do nothing.
pub fn init_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LOGGER.level());
    }
}
