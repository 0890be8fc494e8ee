//! Category logging for the overlay subsystem.
//!
//! Overlay code runs on the render thread once per frame and once per input
//! event, so logging has to cost nothing when it is switched off and must not
//! flood the output when a key is held down.
//!
//! # Architecture
//!
//! - **LogConfig**: process-wide levels, one atomic per category plus a global fallback
//! - **LogLevel**: Off < Error < Warn < Info < Debug < Trace
//! - **LogCategory**: Menu, Pointer, Blit, Input, Config
//! - **log()**: lazily formats the message, applies the per-category rate limit and
//!   writes to stderr or to a background file writer
//!
//! # Usage
//!
//! ```rust
//! use overlay_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Menu, LogLevel::Debug, || {
//!     format!("menu: selected row {}", 3)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Overlay component a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Menu visibility, navigation and configuration changes
    Menu,
    /// Virtual pointer state and button forwarding
    Pointer,
    /// Surface compositing decisions
    Blit,
    /// Raw key event routing
    Input,
    /// Settings loading and key binding resolution
    Config,
}

const CATEGORY_COUNT: usize = 5;

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Menu,
        LogCategory::Pointer,
        LogCategory::Blit,
        LogCategory::Input,
        LogCategory::Config,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            LogCategory::Menu => 0,
            LogCategory::Pointer => 1,
            LogCategory::Blit => 2,
            LogCategory::Input => 3,
            LogCategory::Config => 4,
        }
    }

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| format!("{:?}", c).eq_ignore_ascii_case(s))
    }
}

/// Sliding one-second window per category
struct RateWindow {
    stamps: VecDeque<Instant>,
    dropped: usize,
    last_report: Option<Instant>,
}

impl RateWindow {
    const fn new() -> Self {
        Self {
            stamps: VecDeque::new(),
            dropped: 0,
            last_report: None,
        }
    }
}

struct RateLimiter {
    max_per_second: AtomicUsize,
    windows: Mutex<[RateWindow; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_per_second: usize) -> Self {
        Self {
            max_per_second: AtomicUsize::new(max_per_second),
            windows: Mutex::new([
                RateWindow::new(),
                RateWindow::new(),
                RateWindow::new(),
                RateWindow::new(),
                RateWindow::new(),
            ]),
        }
    }

    fn windows(&self) -> MutexGuard<'_, [RateWindow; CATEGORY_COUNT]> {
        // A panic while holding the lock leaves the windows usable
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns whether the message may be written and, when due, how many
    /// messages were dropped since the last report.
    fn admit(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let window_len = Duration::from_secs(1);
        let max = self.max_per_second.load(Ordering::Relaxed);

        let mut windows = self.windows();
        let w = &mut windows[category.index()];
        while w
            .stamps
            .front()
            .is_some_and(|&t| now.duration_since(t) > window_len)
        {
            w.stamps.pop_front();
        }

        if w.stamps.len() < max {
            w.stamps.push_back(now);
            if w.dropped > 0 {
                let dropped = std::mem::take(&mut w.dropped);
                w.last_report = Some(now);
                return (true, Some(dropped));
            }
            return (true, None);
        }

        w.dropped += 1;
        let due = w
            .last_report
            .map_or(true, |last| now.duration_since(last) >= window_len);
        if due {
            w.last_report = Some(now);
            (false, Some(std::mem::take(&mut w.dropped)))
        } else {
            (false, None)
        }
    }
}

/// Process-wide logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    levels: [AtomicU8; CATEGORY_COUNT],
    file_sender: Mutex<Option<Sender<String>>>,
    file_enabled: AtomicBool,
    limiter: RateLimiter,
}

impl LogConfig {
    /// Everything off, 60 messages per second per category
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            levels: [
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
            ],
            file_sender: Mutex::new(None),
            file_enabled: AtomicBool::new(false),
            limiter: RateLimiter::new(60),
        }
    }

    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category-specific level wins when set; otherwise the global level applies.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        match self.get_level(category) {
            LogLevel::Off => level <= self.get_global_level(),
            specific => level <= specific,
        }
    }

    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    pub fn set_rate_limit(&self, max_per_second: usize) {
        self.limiter
            .max_per_second
            .store(max_per_second, Ordering::Relaxed);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.limiter.max_per_second.load(Ordering::Relaxed)
    }

    fn sender(&self) -> MutexGuard<'_, Option<Sender<String>>> {
        self.file_sender.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append log output to `path` from a background writer thread.
    ///
    /// Replaces any previous log file; the old writer exits once its channel closes.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("overlay-log-writer".to_string())
            .spawn(move || {
                for message in receiver {
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        *self.sender() = Some(sender);
        self.file_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop writing to the log file and go back to stderr
    pub fn clear_log_file(&self) {
        *self.sender() = None;
        self.file_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, message: String) {
        if self.file_enabled.load(Ordering::Relaxed) {
            if let Some(sender) = self.sender().as_ref() {
                match sender.send(message) {
                    Ok(()) => return,
                    Err(failed) => {
                        eprintln!("{}", failed.0);
                        return;
                    }
                }
            }
        }
        eprintln!("{}", message);
    }
}

/// Log a lazily-built message under `category` at `level`.
///
/// The closure only runs when the category is enabled at that level and the
/// category is under its rate limit. Dropped messages are summarized once per
/// second.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.limiter.admit(category);
    if let Some(count) = dropped.filter(|&n| n > 0) {
        config.write_message(format!(
            "[{:?}] rate limit exceeded, {} message(s) dropped",
            category, count
        ));
    }
    if allowed {
        config.write_message(format!("[{:?}] {}", category, message_fn()));
    }
}
