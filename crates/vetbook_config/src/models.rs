use serde::{Deserialize, Serialize};

// --- Remote API ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String, // e.g. http://localhost:8080, no trailing slash needed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

// --- Booking form and slot rules ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingRules {
    /// Exact number of digits a contact phone must have.
    #[serde(default = "default_phone_digits")]
    pub phone_digits: usize,
    /// Upper bound for a slot published by a doctor.
    #[serde(default = "default_max_slot_minutes")]
    pub max_slot_minutes: u32,
    #[serde(default = "default_slot_minutes")]
    pub default_slot_minutes: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            phone_digits: default_phone_digits(),
            max_slot_minutes: default_max_slot_minutes(),
            default_slot_minutes: default_slot_minutes(),
        }
    }
}

fn default_phone_digits() -> usize {
    10
}

fn default_max_slot_minutes() -> u32 {
    480
}

fn default_slot_minutes() -> u32 {
    30
}

// --- Logging ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// --- Session ---
// Token is a secret: set it with VETBOOK_SECRET_SESSION_TOKEN, or put the
// "secret_from_env" marker in the config file.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionConfig {
    pub token: Option<String>,
    pub role: Option<String>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub booking: BookingRules,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}
