//! Drawing-session log.
//!
//! One file per launch, truncated when the window opens:
//!   Windows:  `%APPDATA%\DiaryDraw\diary_draw.log`
//!   Linux:    `$XDG_DATA_HOME/DiaryDraw/diary_draw.log` (or `~/.local/share/...`)
//!   macOS:    `~/Library/Application Support/DiaryDraw/diary_draw.log`
//!
//! Crate code logs through `log_info!` / `log_warn!` / `log_err!`.  Until a
//! sink is opened (unit tests, the headless CLI) those macros do nothing.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::{Local, NaiveTime};

static SINK: OnceLock<Mutex<File>> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Append one stamped line.  I/O errors are swallowed so a full disk never
/// interrupts drawing.
pub fn log(level: Level, args: fmt::Arguments<'_>) {
    let Some(sink) = SINK.get() else { return };
    if let Ok(mut file) = sink.lock() {
        let _ = writeln!(file, "{}", format_line(Local::now().time(), level, args));
    }
}

fn format_line(time: NaiveTime, level: Level, args: fmt::Arguments<'_>) -> String {
    format!("[{}] [{}] {}", time.format("%H:%M:%S"), level.tag(), args)
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, format_args!($($arg)*))
    };
}

/// Open the session log in the platform data directory and mirror panics
/// into it.  Returns the log path.
pub fn init() -> std::io::Result<PathBuf> {
    let path = data_dir().join("DiaryDraw").join("diary_draw.log");
    open_sink(&path)?;

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log(Level::Error, format_args!("panic: {}", info));
        prev(info);
    }));
    Ok(path)
}

/// Truncate `path` and make it the log sink.  Only the first successful
/// call takes effect.
fn open_sink(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    if SINK.set(Mutex::new(file)).is_ok() {
        log(
            Level::Info,
            format_args!("Diary Draw session, {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        );
    }
    Ok(())
}

/// Platform data directory (without the app sub-folder).
pub(crate) fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata);
    }
    #[cfg(target_os = "macos")]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join("Library").join("Application Support");
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".local").join("share")))
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_local_clock_and_level() {
        let time = NaiveTime::from_hms_opt(9, 5, 3).unwrap();
        assert_eq!(format_line(time, Level::Warn, format_args!("layer {}", 2)), "[09:05:03] [WARN] layer 2");
        assert_eq!(format_line(time, Level::Error, format_args!("x")), "[09:05:03] [ERROR] x");
    }

    #[test]
    fn sink_receives_macro_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("diary_draw.log");
        open_sink(&path).unwrap();
        log_info!("opened {}x{}", 600, 400);

        // another test may have opened the sink first; only check our own file
        let text = std::fs::read_to_string(&path).unwrap();
        if !text.is_empty() {
            assert!(text.contains("Diary Draw session"));
            assert!(text.contains("[INFO] opened 600x400"));
        }
    }
}
