#[cfg(test)]
mod tests {
    use eisen::api::rest::RemoteConfig;
    use eisen::libs::app::AppOptions;
    use eisen::libs::config::{Config, SyncConfig, UiConfig, API_KEY_ENV, API_URL_ENV, CONFIG_FILE_NAME};
    use eisen::libs::data_storage::HOME_ENV;
    use std::time::Duration;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    /// Points the data directory at a fresh temporary directory.
    struct ConfigTestContext {
        temp_dir: TempDir,
        api_url: String,
        api_key: String,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var(HOME_ENV, temp_dir.path());
            std::env::remove_var(API_URL_ENV);
            std::env::remove_var(API_KEY_ENV);
            ConfigTestContext {
                temp_dir,
                api_url: "https://api.example.com".to_string(),
                api_key: "public-key".to_string(),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.remote.is_none());
        assert!(config.remote().is_none());
        assert_eq!(config.sync, SyncConfig { timeout_secs: 10 });
        assert_eq!(config.ui.undo_window(), Duration::from_secs(4));
        assert!(!config.ui.compact_mode);
    }

    #[test]
    fn test_timeout_has_a_floor() {
        let sync = SyncConfig { timeout_secs: 0 };
        assert_eq!(sync.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_app_options_follow_config() {
        let config = Config {
            remote: None,
            sync: SyncConfig { timeout_secs: 3 },
            ui: UiConfig {
                compact_mode: true,
                undo_window_secs: 9,
            },
        };
        let options = AppOptions::from(&config);
        assert!(options.compact_mode);
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.undo_window, Duration::from_secs(9));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"ui":{"compact_mode":true,"undo_window_secs":2}}"#).unwrap();
        assert!(config.remote.is_none());
        assert_eq!(config.sync.timeout_secs, 10);
        assert!(config.ui.compact_mode);
    }

    #[test]
    fn test_blank_remote_is_ignored() {
        let config = Config {
            remote: Some(RemoteConfig {
                api_url: "  ".to_string(),
                api_key: "k".to_string(),
            }),
            ..Config::default()
        };
        assert!(config.remote().is_none());
    }

    // The only test in this file that touches the environment, so parallel
    // tests never race on it.
    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_read_and_env_override(ctx: &mut ConfigTestContext) {
        assert_eq!(Config::read().unwrap(), Config::default());

        let config = Config {
            remote: Some(RemoteConfig {
                api_url: ctx.api_url.clone(),
                api_key: ctx.api_key.clone(),
            }),
            sync: SyncConfig { timeout_secs: 5 },
            ui: UiConfig {
                compact_mode: true,
                undo_window_secs: 6,
            },
        };
        config.save().unwrap();
        assert!(ctx.temp_dir.path().join(CONFIG_FILE_NAME).exists());
        assert_eq!(Config::read().unwrap(), config);

        std::env::set_var(API_URL_ENV, "https://override.example.com");
        std::env::set_var(API_KEY_ENV, "override-key");
        let overridden = Config::read().unwrap();
        std::env::remove_var(API_URL_ENV);
        std::env::remove_var(API_KEY_ENV);

        let remote = overridden.remote().unwrap();
        assert_eq!(remote.api_url, "https://override.example.com");
        assert_eq!(remote.api_key, "override-key");
        assert_eq!(overridden.sync.timeout_secs, 5);
    }
}
