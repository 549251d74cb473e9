use std::time::Duration;
use tracing::warn;

/// Rule constants for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesConfig {
    /// Tricks a team needs to take the round.
    pub round_trick_threshold: u32,
    /// Round points a team needs to take the match.
    pub match_target: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            round_trick_threshold: 2,
            match_target: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    pub reconnect_grace: Duration,
    pub deal_card_delay: Duration,
    pub deal_batch_delay: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(30),
            deal_card_delay: Duration::from_millis(250),
            deal_batch_delay: Duration::from_millis(1000),
        }
    }
}

impl TimingConfig {
    /// No pacing delays, with the given grace period.
    pub fn immediate(reconnect_grace: Duration) -> Self {
        Self {
            reconnect_grace,
            deal_card_delay: Duration::ZERO,
            deal_batch_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub rules: RulesConfig,
    pub timing: TimingConfig,
    /// Let any new connection heal a seat left in any room.
    pub cross_room_replacement: bool,
    pub allow_guests: bool,
    pub jwt_secret: String,
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            rules: RulesConfig::default(),
            timing: TimingConfig::default(),
            cross_room_replacement: true,
            allow_guests: true,
            jwt_secret: "your-secret-key-change-in-production".to_string(),
            database_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to defaults
    /// for missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rules = RulesConfig {
            round_trick_threshold: parse_or(
                &lookup,
                "HOKM_ROUND_TRICK_THRESHOLD",
                defaults.rules.round_trick_threshold,
            )
            .clamp(1, 7),
            match_target: parse_or(&lookup, "HOKM_MATCH_TARGET", defaults.rules.match_target)
                .max(1),
        };

        let timing = TimingConfig {
            reconnect_grace: Duration::from_secs(parse_or(
                &lookup,
                "HOKM_RECONNECT_GRACE_SECS",
                defaults.timing.reconnect_grace.as_secs(),
            )),
            deal_card_delay: Duration::from_millis(parse_or(
                &lookup,
                "HOKM_DEAL_CARD_DELAY_MS",
                defaults.timing.deal_card_delay.as_millis() as u64,
            )),
            deal_batch_delay: Duration::from_millis(parse_or(
                &lookup,
                "HOKM_DEAL_BATCH_DELAY_MS",
                defaults.timing.deal_batch_delay.as_millis() as u64,
            )),
        };

        Self {
            listen_addr: lookup("HOKM_LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            rules,
            timing,
            cross_room_replacement: parse_or(
                &lookup,
                "HOKM_CROSS_ROOM_REPLACEMENT",
                defaults.cross_room_replacement,
            ),
            allow_guests: parse_or(&lookup, "HOKM_ALLOW_GUESTS", defaults.allow_guests),
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Ignoring malformed config value, using default");
                default
            }
        },
    }
}
