//! Kernel configuration from environment and CLI
//!
//! Environment variables override nothing the CLI set explicitly; both
//! fall back to defaults. A malformed value is a hard configuration error
//! (exit 64), never a silent default.

use std::path::PathBuf;

use cynic_core::constants::defaults;
use cynic_core::{Error, Result};

/// Process exit codes (sysexits convention)
pub mod exit_codes {
    /// Normal shutdown
    pub const OK: u8 = 0;
    /// Bad configuration
    pub const CONFIG: u8 = 64;
    /// HTTP port already in use
    pub const PORT_IN_USE: u8 = 69;
    /// Store unavailable in strict mode
    pub const STORE_UNAVAILABLE: u8 = 74;
}

/// Resolved kernel configuration
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Loopback HTTP port (`CYNIC_KERNEL_PORT`)
    pub port: u16,
    /// Database URL; defaults to `file:<home>/cynic.db`
    pub db_url: String,
    /// Max facts injected into the session banner (`CYNIC_FACT_INJECTION_LIMIT`)
    pub fact_injection_limit: usize,
    /// Confidence floor for fact injection (`CYNIC_FACT_MIN_CONFIDENCE`)
    pub fact_min_confidence: f64,
    /// Verbose logging (`CYNIC_DEBUG`)
    pub debug: bool,
    /// Propagated session tag (`CYNIC_SESSION_ID`)
    pub session_id: Option<String>,
    /// Refuse to start without a reachable store
    pub strict: bool,
    /// Kernel home directory (`~/.cynic`): guidance, handoff, detection files
    pub home_dir: PathBuf,
    /// Default user the kernel learns for
    pub user_id: String,
}

impl KernelConfig {
    /// Build from environment with optional CLI overrides
    pub fn from_env(
        port_override: Option<u16>,
        db_override: Option<String>,
        strict: bool,
    ) -> Result<Self> {
        let home_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cynic");

        let port = match port_override {
            Some(port) => port,
            None => parse_env("CYNIC_KERNEL_PORT", defaults::KERNEL_PORT)?,
        };
        let fact_injection_limit =
            parse_env("CYNIC_FACT_INJECTION_LIMIT", defaults::FACT_LIMITS[0])?;
        let fact_min_confidence =
            parse_env("CYNIC_FACT_MIN_CONFIDENCE", defaults::FACT_MIN_CONFIDENCE)?;
        if !(0.0..=1.0).contains(&fact_min_confidence) {
            return Err(Error::Validation(format!(
                "CYNIC_FACT_MIN_CONFIDENCE must be in [0,1], got {fact_min_confidence}"
            )));
        }

        let db_url = db_override
            .or_else(|| std::env::var("CYNIC_DB_URL").ok())
            .unwrap_or_else(|| format!("file:{}", home_dir.join("cynic.db").display()));

        Ok(Self {
            port,
            db_url,
            fact_injection_limit,
            fact_min_confidence,
            debug: std::env::var("CYNIC_DEBUG").is_ok_and(|v| v != "0" && !v.is_empty()),
            session_id: std::env::var("CYNIC_SESSION_ID").ok().filter(|s| !s.is_empty()),
            strict,
            home_dir,
            user_id: std::env::var("USER").unwrap_or_else(|_| "local".to_string()),
        })
    }

    /// Path of the guidance side channel
    pub fn guidance_path(&self) -> PathBuf {
        self.home_dir.join("guidance.json")
    }

    /// Path of the session handoff file
    pub fn handoff_path(&self) -> PathBuf {
        self.home_dir.join("last-session.json")
    }

    /// Path of the local-model probe artifact
    pub fn llm_detection_path(&self) -> PathBuf {
        self.home_dir.join("llm-detection.json")
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Validation(format!("{name} has invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cynic_core::constants::phi;

    #[test]
    fn test_defaults_without_env() {
        // No env manipulation: overrides exercise the same paths
        let config = KernelConfig::from_env(Some(9000), Some(":memory:".into()), false)
            .expect("config builds");
        assert_eq!(config.port, 9000);
        assert_eq!(config.db_url, ":memory:");
        assert!(!config.strict);
        assert!(config.guidance_path().ends_with(".cynic/guidance.json"));
    }

    #[test]
    fn test_fact_floor_defaults_to_phi_squared() {
        let config = KernelConfig::from_env(Some(9000), Some(":memory:".into()), false)
            .expect("config builds");
        assert!((config.fact_min_confidence - phi::INV_PHI_SQ).abs() < 1e-9);
    }
}
