use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::coordination::{CoordinationOptions, MeetingConfig, ReminderPolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub coordination: CoordinationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::parse(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;

        let roster_path = env::var("APP_ROSTER_PATH")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        let reminder_offsets_hours = parse_offsets(
            &env::var("APP_REMINDER_OFFSETS_HOURS").unwrap_or_else(|_| "48,24,1".to_string()),
        )?;
        let follow_up_hours = env::var("APP_FOLLOW_UP_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|hours| *hours <= MAX_REMINDER_HOURS)
            .ok_or(ConfigError::InvalidFollowUpHours)?;

        let defaults = MeetingConfig::default();
        let video_platform =
            env::var("APP_VIDEO_PLATFORM").unwrap_or(defaults.video_platform);
        let meeting_base_url =
            env::var("APP_MEETING_BASE_URL").unwrap_or(defaults.meeting_base_url);
        if !(meeting_base_url.starts_with("https://") || meeting_base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidMeetingBaseUrl(meeting_base_url));
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            coordination: CoordinationConfig {
                roster_path,
                reminder_offsets_hours,
                follow_up_hours,
                video_platform,
                meeting_base_url,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Roster source, reminder cadence and meeting-link settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationConfig {
    pub roster_path: Option<PathBuf>,
    pub reminder_offsets_hours: Vec<u32>,
    pub follow_up_hours: u32,
    pub video_platform: String,
    pub meeting_base_url: String,
}

impl CoordinationConfig {
    pub fn options(&self) -> CoordinationOptions {
        CoordinationOptions {
            reminders: ReminderPolicy {
                pre_interview_hours: self.reminder_offsets_hours.clone(),
                follow_up_hours: self.follow_up_hours,
            },
            meeting: MeetingConfig {
                video_platform: self.video_platform.clone(),
                meeting_base_url: self.meeting_base_url.clone(),
            },
            ..CoordinationOptions::default()
        }
    }
}

/// One year; reminders further out than this are configuration mistakes.
const MAX_REMINDER_HOURS: u32 = 24 * 366;

fn parse_offsets(raw: &str) -> Result<Vec<u32>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<u32>() {
            Ok(hours) if (1..=MAX_REMINDER_HOURS).contains(&hours) => Ok(hours),
            _ => Err(ConfigError::InvalidReminderOffset(part.to_string())),
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidReminderOffset(String),
    InvalidFollowUpHours,
    InvalidMeetingBaseUrl(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidReminderOffset(value) => write!(
                f,
                "APP_REMINDER_OFFSETS_HOURS entries must be between 1 and {MAX_REMINDER_HOURS} hours, got '{value}'"
            ),
            ConfigError::InvalidFollowUpHours => {
                write!(f, "APP_FOLLOW_UP_HOURS must be at most {MAX_REMINDER_HOURS} hours")
            }
            ConfigError::InvalidMeetingBaseUrl(value) => {
                write!(f, "APP_MEETING_BASE_URL must be an http(s) URL, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "APP_ROSTER_PATH",
            "APP_REMINDER_OFFSETS_HOURS",
            "APP_FOLLOW_UP_HOURS",
            "APP_VIDEO_PLATFORM",
            "APP_MEETING_BASE_URL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.coordination.roster_path, None);
        assert_eq!(config.coordination.reminder_offsets_hours, vec![48, 24, 1]);

        let options = config.coordination.options();
        assert_eq!(options.reminders, ReminderPolicy::default());
        assert_eq!(options.meeting, MeetingConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn coordination_settings_flow_into_options() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_LOG_FORMAT", "JSON");
        env::set_var("APP_ROSTER_PATH", "fixtures/roster.csv");
        env::set_var("APP_REMINDER_OFFSETS_HOURS", "72, 2");
        env::set_var("APP_FOLLOW_UP_HOURS", "12");
        env::set_var("APP_VIDEO_PLATFORM", "Teams");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(
            config.coordination.roster_path,
            Some(PathBuf::from("fixtures/roster.csv"))
        );
        let options = config.coordination.options();
        assert_eq!(options.reminders.pre_interview_hours, vec![72, 2]);
        assert_eq!(options.reminders.follow_up_hours, 12);
        assert_eq!(options.meeting.video_platform, "Teams");
    }

    #[test]
    fn rejects_invalid_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");

        reset_env();
        env::set_var("APP_REMINDER_OFFSETS_HOURS", "48,soon");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidReminderOffset(value)) if value == "soon"
        ));

        reset_env();
        env::set_var("APP_REMINDER_OFFSETS_HOURS", "48,4294967295");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidReminderOffset(value)) if value == "4294967295"
        ));

        reset_env();
        env::set_var("APP_FOLLOW_UP_HOURS", "9000");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFollowUpHours)
        ));

        reset_env();
        env::set_var("APP_LOG_FORMAT", "pretty");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        reset_env();
        env::set_var("APP_MEETING_BASE_URL", "meet.example.edu");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidMeetingBaseUrl(_))
        ));
        reset_env();
    }
}
