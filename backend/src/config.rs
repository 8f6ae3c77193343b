use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub jobs: JobSettings,
}

/// Background job intervals and retention windows
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// How often to scan tasks for approaching deadlines (hours)
    pub deadline_scan_interval_hours: u32,
    /// Tasks due within this many days fire a deadline_approaching event
    pub deadline_warning_days: i64,
    /// How often to run retention cleanup (hours)
    pub cleanup_interval_hours: u32,
    pub audit_log_retention_days: i64,
    pub bulk_operation_retention_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jobs: JobSettings {
                deadline_scan_interval_hours: env::var("DEADLINE_SCAN_INTERVAL_HOURS")
                    .unwrap_or_else(|_| "6".to_string())
                    .parse()
                    .unwrap_or(6),
                deadline_warning_days: env::var("DEADLINE_WARNING_DAYS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                cleanup_interval_hours: env::var("CLEANUP_INTERVAL_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
                audit_log_retention_days: env::var("AUDIT_LOG_RETENTION_DAYS")
                    .unwrap_or_else(|_| "365".to_string())
                    .parse()
                    .unwrap_or(365),
                bulk_operation_retention_days: env::var("BULK_OPERATION_RETENTION_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .unwrap_or(7),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // set_var/remove_var are unsafe as of the 2024 edition; the #[serial]
    // guard keeps these tests from racing each other over the process env.

    fn clear_env() {
        for key in [
            "SERVER_ADDR",
            "DEADLINE_SCAN_INTERVAL_HOURS",
            "DEADLINE_WARNING_DAYS",
            "CLEANUP_INTERVAL_HOURS",
            "AUDIT_LOG_RETENTION_DAYS",
            "BULK_OPERATION_RETENTION_DAYS",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.jobs.deadline_warning_days, 2);
        assert_eq!(config.jobs.audit_log_retention_days, 365);
        assert_eq!(config.jobs.bulk_operation_retention_days, 7);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            env::set_var("SERVER_ADDR", "127.0.0.1:3000");
            env::set_var("AUDIT_LOG_RETENTION_DAYS", "30");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:3000");
        assert_eq!(config.jobs.audit_log_retention_days, 30);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back() {
        clear_env();
        unsafe { env::set_var("DEADLINE_WARNING_DAYS", "not-a-number") };

        let config = Config::from_env().unwrap();
        assert_eq!(config.jobs.deadline_warning_days, 2);

        clear_env();
    }
}
