#[cfg(test)]
mod tests {
    use crate::{load_config, Args};
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Tests in this module read and write process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // Helper function to clear all environment variables that might affect tests
    fn clear_env_vars() {
        env::remove_var("REDIRECT_MARKER_PARAM");
        env::remove_var("REDIRECT_WATCH_GET_ONLY");
        env::remove_var("REDIRECT_CARRY_MARKER");
        env::remove_var("REDIRECT_SUPPRESSED_REFERERS");
        env::remove_var("REDIRECT_SEEN_TTL_MS");
        env::remove_var("REDIRECT_SEEN_MAX_ENTRIES");
    }

    fn base_args() -> Args {
        Args {
            input: "-".to_string(),
            config: None,
            dev: false,
            log_level: "info".to_string(),
            marker_param: None,
            seen_ttl_ms: None,
        }
    }

    #[test]
    fn test_load_config_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let config = load_config(&base_args()).unwrap();

        assert_eq!(config.watch.marker_param, "themeRefresh");
        assert_eq!(config.watch.marker_value, "1");
        assert!(config.watch.get_only);
        assert_eq!(config.seen.ttl_ms, 60_000);
        assert_eq!(config.seen.max_entries, 4096);
    }

    #[test]
    fn test_load_config_from_cli() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let args = Args {
            marker_param: Some("refresh".to_string()),
            seen_ttl_ms: Some(250),
            ..base_args()
        };

        let config = load_config(&args).unwrap();
        assert_eq!(config.watch.marker_param, "refresh");
        assert_eq!(config.seen.ttl_ms, 250);
    }

    #[test]
    fn test_load_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        env::set_var("REDIRECT_CARRY_MARKER", "false");
        env::set_var("REDIRECT_SUPPRESSED_REFERERS", "/embed,/shorts");

        let config = load_config(&base_args()).unwrap();
        assert!(!config.player.carry_marker);
        assert_eq!(config.player.suppressed_referer_prefixes, vec!["/embed", "/shorts"]);

        clear_env_vars();
    }

    #[test]
    fn test_load_config_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "watch": {{ "get_only": false }}, "seen": {{ "max_entries": 32 }} }}"#
        )
        .unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..base_args()
        };

        let config = load_config(&args).unwrap();
        assert!(!config.watch.get_only);
        assert_eq!(config.seen.max_entries, 32);
        assert_eq!(config.watch.marker_param, "themeRefresh");
    }

    #[test]
    fn test_load_config_precedence() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "watch": {{ "marker_param": "fromFile" }}, "seen": {{ "ttl_ms": 10 }} }}"#
        )
        .unwrap();

        env::set_var("REDIRECT_MARKER_PARAM", "fromEnv");
        env::set_var("REDIRECT_SEEN_TTL_MS", "20");

        let args = Args {
            config: Some(file.path().to_path_buf()),
            seen_ttl_ms: Some(30),
            ..base_args()
        };

        let config = load_config(&args).unwrap();
        // Env beats file, CLI beats env
        assert_eq!(config.watch.marker_param, "fromEnv");
        assert_eq!(config.seen.ttl_ms, 30);

        clear_env_vars();
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env_vars();

        let args = Args {
            seen_ttl_ms: Some(0),
            ..base_args()
        };
        assert!(load_config(&args).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..base_args()
        };
        assert!(load_config(&args).is_err());

        let args = Args {
            config: Some("/nonexistent/redirect.json".into()),
            ..base_args()
        };
        assert!(load_config(&args).is_err());
    }
}
