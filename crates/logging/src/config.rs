//! crates/logging/src/config.rs
//! Verbosity configuration mapped onto `tracing` levels.

use tracing::Level;

/// Verbosity configuration derived from a `-v` count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Number of `-v` flags, clamped to `0..=3`.
    pub verbose: u8,
    /// Suppress everything below errors regardless of `verbose`.
    pub quiet: bool,
}

impl Default for VerbosityConfig {
    fn default() -> Self {
        Self::from_verbose_level(0)
    }
}

impl VerbosityConfig {
    /// Create a new configuration from a verbose level (0-3).
    pub fn from_verbose_level(level: u8) -> Self {
        Self {
            verbose: level.min(3),
            quiet: false,
        }
    }

    /// Returns a configuration that only reports errors.
    pub fn quiet() -> Self {
        Self {
            verbose: 0,
            quiet: true,
        }
    }

    /// Most detailed `tracing` level that passes this configuration.
    pub fn max_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        self.max_level().to_string().to_ascii_lowercase()
    }
}
