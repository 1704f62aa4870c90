use serde::Deserialize;
use std::env;

/// Runtime tuning for the integrity monitor and grader. Loaded from an
/// optional `config/{APP_ENV}.toml` with `EXAMGUARD_*` environment
/// overrides; every field falls back to a built-in default.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Score at which the session is force-terminated.
    pub termination_threshold: u32,
    /// Destination handed to the termination collaborator.
    pub termination_destination: String,
    /// Every n-th paste offense inside the window escalates.
    pub paste_escalation_every: u32,
    /// Rolling window for per-signal offense counters, seconds.
    pub offense_window_seconds: i64,
    /// Free-text similarity threshold when a question sets none.
    pub default_similarity_threshold: f64,
    /// Outer-vs-inner window delta treated as a devtools hint, pixels.
    pub devtools_pixel_margin: u32,
    /// Motion verdicts below this confidence warn instead of scoring.
    pub motion_confidence_floor: f64,
    /// Rolling window for pointer samples, seconds.
    pub motion_window_seconds: i64,
    /// Minimum pointer samples before a motion verdict is produced.
    pub motion_min_samples: usize,
    /// Time allowed to answer a liveness challenge, seconds.
    pub liveness_response_seconds: i64,
    /// Transient warning banners auto-dismiss after this delay, seconds.
    pub warning_dismiss_seconds: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            termination_threshold: 10,
            termination_destination: "/login".to_string(),
            paste_escalation_every: 3,
            offense_window_seconds: 60,
            default_similarity_threshold: 0.9,
            devtools_pixel_margin: 160,
            motion_confidence_floor: 0.4,
            motion_window_seconds: 10,
            motion_min_samples: 8,
            liveness_response_seconds: 15,
            warning_dismiss_seconds: 3,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to defaults
            )
            .add_source(
                config::Environment::with_prefix("EXAMGUARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let defaults = Config::default();

        Ok(Config {
            termination_threshold: settings
                .get_int("integrity.termination_threshold")
                .map(|v| v as u32)
                .unwrap_or(defaults.termination_threshold),
            termination_destination: settings
                .get_string("integrity.termination_destination")
                .unwrap_or(defaults.termination_destination),
            paste_escalation_every: settings
                .get_int("integrity.paste_escalation_every")
                .map(|v| v as u32)
                .unwrap_or(defaults.paste_escalation_every),
            offense_window_seconds: settings
                .get_int("integrity.offense_window_seconds")
                .unwrap_or(defaults.offense_window_seconds),
            default_similarity_threshold: settings
                .get_float("grading.default_similarity_threshold")
                .unwrap_or(defaults.default_similarity_threshold),
            devtools_pixel_margin: settings
                .get_int("detectors.devtools_pixel_margin")
                .map(|v| v as u32)
                .unwrap_or(defaults.devtools_pixel_margin),
            motion_confidence_floor: settings
                .get_float("detectors.motion_confidence_floor")
                .unwrap_or(defaults.motion_confidence_floor),
            motion_window_seconds: settings
                .get_int("detectors.motion_window_seconds")
                .unwrap_or(defaults.motion_window_seconds),
            motion_min_samples: settings
                .get_int("detectors.motion_min_samples")
                .map(|v| v as usize)
                .unwrap_or(defaults.motion_min_samples),
            liveness_response_seconds: settings
                .get_int("detectors.liveness_response_seconds")
                .unwrap_or(defaults.liveness_response_seconds),
            warning_dismiss_seconds: settings
                .get_int("warnings.dismiss_seconds")
                .unwrap_or(defaults.warning_dismiss_seconds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn load_falls_back_to_defaults() {
        std::env::remove_var("EXAMGUARD_INTEGRITY__TERMINATION_THRESHOLD");
        let config = Config::load().unwrap();
        assert_eq!(config.termination_threshold, 10);
        assert_eq!(config.default_similarity_threshold, 0.9);
        assert_eq!(config.warning_dismiss_seconds, 3);
    }

    #[test]
    #[serial]
    fn env_overrides_take_precedence() {
        std::env::set_var("EXAMGUARD_INTEGRITY__TERMINATION_THRESHOLD", "6");
        std::env::set_var("EXAMGUARD_GRADING__DEFAULT_SIMILARITY_THRESHOLD", "0.8");

        let config = Config::load().unwrap();
        assert_eq!(config.termination_threshold, 6);
        assert_eq!(config.default_similarity_threshold, 0.8);

        std::env::remove_var("EXAMGUARD_INTEGRITY__TERMINATION_THRESHOLD");
        std::env::remove_var("EXAMGUARD_GRADING__DEFAULT_SIMILARITY_THRESHOLD");
    }
}
