use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{}", label)
    }
}

type Logger = Box<dyn Fn(LogLevel, &str) + Send + Sync + 'static>;

static MAX_LEVEL: AtomicU8 = AtomicU8::new(2);

fn default_logger(level: LogLevel, message: &str) {
    eprintln!("[{}] {}", level, message);
}

fn logger_cell() -> &'static Mutex<Logger> {
    static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();
    LOGGER.get_or_init(|| Mutex::new(Box::new(default_logger)))
}

pub fn set_logger(logger: impl Fn(LogLevel, &str) + Send + Sync + 'static) {
    let mut guard = match logger_cell().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Box::new(logger);
}

/// Messages above `level` are dropped before reaching the sink.
pub fn set_max_level(level: LogLevel) {
    MAX_LEVEL.store(level.as_u8(), Ordering::Relaxed);
}

/// Lets per-tick callers skip formatting when the message would be dropped.
pub fn enabled(level: LogLevel) -> bool {
    level.as_u8() <= MAX_LEVEL.load(Ordering::Relaxed)
}

pub fn log(level: LogLevel, message: impl AsRef<str>) {
    if !enabled(level) {
        return;
    }
    let guard = match logger_cell().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    (guard)(level, message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    log(LogLevel::Error, message);
}

pub fn warn(message: impl AsRef<str>) {
    log(LogLevel::Warn, message);
}

pub fn info(message: impl AsRef<str>) {
    log(LogLevel::Info, message);
}

pub fn debug(message: impl AsRef<str>) {
    log(LogLevel::Debug, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        assert_eq!(LogLevel::parse("Warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("trace"), None);
    }

    #[test]
    fn levels_order_by_verbosity() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::Info.to_string(), "info");
    }
}
