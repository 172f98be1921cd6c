#[cfg(test)]
mod tests {
    use eisen::api::rest::RemoteConfig;
    use eisen::api::{AuthProvider, Identity, RemoteSource, RestClient};
    use eisen::libs::data_storage::HOME_ENV;
    use std::fs;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    struct SessionTestContext {
        temp_dir: TempDir,
        config: RemoteConfig,
    }

    impl AsyncTestContext for SessionTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var(HOME_ENV, temp_dir.path());
            SessionTestContext {
                temp_dir,
                // Nothing listens on the discard port, so every request fails fast.
                config: RemoteConfig {
                    api_url: "http://127.0.0.1:9".to_string(),
                    api_key: "public-key".to_string(),
                },
            }
        }

        async fn teardown(self) {}
    }

    // Single test: the data directory comes from the environment.
    #[test_context(SessionTestContext)]
    #[tokio::test]
    async fn test_session_lifecycle(ctx: &mut SessionTestContext) {
        let session_file = ctx.temp_dir.path().join(".session");

        // no cached session
        let client = RestClient::new(&ctx.config).unwrap();
        assert!(client.subscribe().borrow().is_none());
        assert!(client.fetch_tasks().await.is_err());

        // unreadable cache is ignored
        fs::write(&session_file, "not json").unwrap();
        let client = RestClient::new(&ctx.config).unwrap();
        assert!(client.subscribe().borrow().is_none());

        // cached session starts signed in
        fs::write(
            &session_file,
            r#"{"accessToken":"token-1","user":{"id":"user-1","email":"me@example.com"}}"#,
        )
        .unwrap();
        let client = RestClient::new(&ctx.config).unwrap();
        let restored = client.subscribe().borrow().clone();
        assert_eq!(restored, Some(Identity::new("user-1", Some("me@example.com"))));

        // sign out drops the session even when the backend is unreachable
        let mut identities = client.subscribe();
        assert!(client.sign_out().await.is_err());
        assert!(!session_file.exists());
        assert!(identities.has_changed().unwrap());
        assert!(identities.borrow_and_update().is_none());
    }
}
