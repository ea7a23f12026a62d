use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{AdForgeError, Result};

static CAMPAIGN_LOGGER: Lazy<CampaignLogger> = Lazy::new(CampaignLogger::new);

pub fn init() -> Result<()> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<()> {
    let max_level = config.min_level.to_level_filter();
    CAMPAIGN_LOGGER.configure(config)?;

    log::set_logger(&*CAMPAIGN_LOGGER)
        .map_err(|e| AdForgeError::ConfigError(format!("failed to set logger: {}", e)))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }

    /// Parses `RUST_LOG`-style names; unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One emitted line, serialisable for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub target: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub uptime_ms: u64,
}

impl LogEntry {
    fn from_record(record: &Record, started: Instant) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().into(),
            message: record.args().to_string(),
            target: record.target().to_string(),
            file: record.file().map(str::to_string),
            line: record.line(),
            uptime_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_target: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
    /// Only records whose target starts with one of these prefixes are kept.
    /// Empty keeps everything.
    pub target_prefixes: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_target: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
            target_prefixes: vec!["adforge".to_string()],
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn with_target_prefix(mut self, prefix: &str) -> Self {
        self.target_prefixes.push(prefix.to_string());
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_file_path: Some("adforge.log".to_string()),
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }

    fn accepts_target(&self, target: &str) -> bool {
        self.target_prefixes.is_empty()
            || self
                .target_prefixes
                .iter()
                .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

pub struct CampaignLogger {
    config: Mutex<LoggerConfig>,
    sink: Mutex<Option<File>>,
    started: Instant,
}

impl CampaignLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            sink: Mutex::new(None),
            started: Instant::now(),
        }
    }

    fn config(&self) -> MutexGuard<'_, LoggerConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> MutexGuard<'_, Option<File>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn configure(&self, config: LoggerConfig) -> Result<()> {
        let file = match &config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        AdForgeError::ConfigError(format!("cannot open log file {}: {}", path, e))
                    })?,
            ),
            None => None,
        };
        *self.sink() = file;
        *self.config() = config;
        Ok(())
    }
}

fn paint(text: &str, enabled: bool, style: impl Fn(&str) -> ColoredString) -> String {
    if enabled {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
    let colors = config.show_colors;
    let mut parts = vec![paint(
        &entry.timestamp.format(&config.timestamp_format).to_string(),
        colors,
        |s| s.bright_black(),
    )];

    let level = if config.show_emojis {
        format!("{} {}", entry.level.emoji(), entry.level.as_str())
    } else {
        entry.level.as_str().to_string()
    };
    let color = entry.level.color();
    parts.push(format!("[{}]", paint(&level, colors, |s| s.color(color).bold())));

    let mut message = String::new();
    if config.show_target {
        message.push_str(&paint(&entry.target, colors, |s| s.bright_blue()));
        message.push_str(": ");
    }
    message.push_str(&entry.message);
    parts.push(message);

    if config.show_file_location {
        if let (Some(file), Some(line)) = (&entry.file, entry.line) {
            let location = format!("({}:{})", file, line);
            parts.push(paint(&location, colors, |s| s.bright_black()));
        }
    }

    parts.join(" ")
}

impl log::Log for CampaignLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let config = self.config();
        LogLevel::from(metadata.level()) >= config.min_level
            && config.accepts_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record, self.started);
        let config = self.config().clone();

        let line = if config.output_json {
            serde_json::to_string(&entry).unwrap_or_default()
        } else {
            format_line(&entry, &config)
        };
        println!("{}", line);

        if let Some(file) = self.sink().as_mut() {
            let plain = if config.output_json {
                line
            } else {
                format_line(&entry, &LoggerConfig { show_colors: false, ..config })
            };
            let _ = writeln!(file, "{}", plain);
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Some(file) = self.sink().as_mut() {
            let _ = file.flush();
        }
    }
}

/// Logs how long a named operation took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  {} started", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  {} finished in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

/// Logs the effective configuration without leaking credentials.
pub fn log_config_info(config: &crate::config::Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   API URL: {}", config.api_url());
    log::info!("   Timeout: {}s", config.timeout_secs());
    if let Some(bedrock) = &config.bedrock {
        log::info!("   Bedrock region: {}", bedrock.region());
        log::info!("   Text model: {}", bedrock.text_model());
        log::info!("   Image model: {}", bedrock.image_model());
        log::info!(
            "   Static credentials: {}",
            if bedrock.access_key.is_some() && bedrock.secret_key.is_some() {
                "✅"
            } else {
                "❌ (default chain)"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: LogLevel) -> LogEntry {
        LogEntry {
            id: "id".into(),
            timestamp: Utc::now(),
            level,
            message: "campaign ready".into(),
            target: "adforge::session".into(),
            file: Some("src/session.rs".into()),
            line: Some(42),
            uptime_ms: 3,
        }
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Error.emoji(), "❌");
        assert_eq!(LogLevel::Debug.color(), Color::Blue);
        assert_eq!(LogLevel::from_name("WARNING"), Some(LogLevel::Warn));
        assert!(LogLevel::Warn > LogLevel::Info);
    }

    #[test]
    fn test_logger_config_presets() {
        let config = LoggerConfig::development();
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.show_colors);

        let prod_config = LoggerConfig::production();
        assert!(!prod_config.show_colors);
        assert!(prod_config.output_json);
        assert!(prod_config.log_file_path.is_some());
    }

    #[test]
    fn plain_line_has_level_target_and_location() {
        let config = LoggerConfig::development()
            .with_colors(false)
            .with_level(LogLevel::Trace);
        let config = LoggerConfig {
            show_emojis: false,
            ..config
        };
        let line = format_line(&entry(LogLevel::Warn), &config);
        assert!(line.contains("[WARN]"));
        assert!(line.contains("adforge::session: campaign ready"));
        assert!(line.ends_with("(src/session.rs:42)"));
    }

    #[test]
    fn target_filter_keeps_own_crate() {
        let config = LoggerConfig::default();
        assert!(config.accepts_target("adforge::refinement"));
        assert!(!config.accepts_target("hyper::proto"));
        let open = LoggerConfig {
            target_prefixes: Vec::new(),
            ..LoggerConfig::default()
        };
        assert!(open.accepts_target("hyper::proto"));
    }

    #[test]
    fn test_logger_initialization() {
        let config = LoggerConfig::development();
        assert!(init_with_config(config).is_ok());
    }
}
