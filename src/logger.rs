use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn path() -> PathBuf {
    exe_dir().join("noctis.log")
}

fn open() -> Option<File> {
    OpenOptions::new().create(true).append(true).open(path()).ok()
}

pub fn init() {
    if let Some(mut f) = open() {
        let _ = writeln!(f, "===== Noctis start =====");
        if let Ok(mut guard) = LOG_FILE.lock() {
            *guard = Some(f);
        }
    }
}

fn ts() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

fn line(level: Level, msg: &str) -> String {
    format!("[{}] {} {}", ts(), level.as_str(), msg)
}

pub fn log(level: Level, msg: &str) {
    let line = line(level, msg);
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(f) = guard.as_mut() {
            let _ = writeln!(f, "{line}");
            let _ = f.flush();
            return;
        }
    }
    // init() not called yet: append without caching the handle
    if let Some(mut f) = open() {
        let _ = writeln!(f, "{line}");
        let _ = f.flush();
    }
}

pub fn debug(msg: &str) {
    log(Level::Debug, msg);
}

pub fn info(msg: &str) {
    log(Level::Info, msg);
}

pub fn warn(msg: &str) {
    log(Level::Warn, msg);
}

pub fn error(msg: &str) {
    log(Level::Error, msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format_has_timestamp_level_and_message() {
        let l = line(Level::Warn, "gateway slow");
        assert!(l.starts_with('['));
        assert!(l.ends_with("] WARN gateway slow"));
    }

    #[test]
    fn log_file_lives_next_to_the_executable() {
        assert_eq!(path().file_name().and_then(|n| n.to_str()), Some("noctis.log"));
    }
}
