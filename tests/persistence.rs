#[cfg(test)]
mod tests {
    use eisen::api::{MemoryAuth, MemoryRemote};
    use eisen::db::state::SqliteStorage;
    use eisen::libs::app::{App, AppOptions};
    use eisen::libs::persistence::{MemoryStorage, Persistence, StateStorage, STATE_KEY};
    use eisen::libs::quadrant::Quadrant;
    use eisen::libs::store::{AddTaskOptions, TaskStore, ViewMode};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    struct StorageTestContext {
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl StorageTestContext {
        fn storage(&self) -> Arc<dyn StateStorage> {
            Arc::new(SqliteStorage::open(&self.db_path).unwrap())
        }

        async fn start(&self) -> App {
            App::start(
                AppOptions::default(),
                self.storage(),
                Arc::new(MemoryRemote::new()),
                Arc::new(MemoryAuth::new()),
            )
            .await
        }
    }

    impl AsyncTestContext for StorageTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db_path = temp_dir.path().join("state.db");
            StorageTestContext {
                _temp_dir: temp_dir,
                db_path,
            }
        }

        async fn teardown(self) {}
    }

    #[test_context(StorageTestContext)]
    #[tokio::test]
    async fn test_sqlite_set_get_remove(ctx: &mut StorageTestContext) {
        let storage = ctx.storage();
        assert!(storage.get("missing").await.unwrap().is_none());

        assert!(storage.set("k", "one", 1).await.unwrap());
        assert!(storage.set("k", "two", 2).await.unwrap());
        let stored = storage.get("k").await.unwrap().unwrap();
        assert_eq!((stored.value.as_str(), stored.revision), ("two", 2));

        storage.remove("k").await.unwrap();
        assert!(storage.get("k").await.unwrap().is_none());
    }

    #[test_context(StorageTestContext)]
    #[tokio::test]
    async fn test_sqlite_refuses_stale_revision(ctx: &mut StorageTestContext) {
        let storage = ctx.storage();
        assert!(storage.set(STATE_KEY, "newer", 7).await.unwrap());
        assert!(!storage.set(STATE_KEY, "older", 6).await.unwrap());
        assert_eq!(storage.get(STATE_KEY).await.unwrap().unwrap().value, "newer");

        // rewriting the same revision is allowed
        assert!(storage.set(STATE_KEY, "again", 7).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_storage_refuses_stale_revision() {
        let storage = MemoryStorage::new();
        assert!(storage.set(STATE_KEY, "newer", 3).await.unwrap());
        assert!(!storage.set(STATE_KEY, "older", 2).await.unwrap());
        assert_eq!(storage.get(STATE_KEY).await.unwrap().unwrap().value, "newer");
    }

    #[test_context(StorageTestContext)]
    #[tokio::test]
    async fn test_round_trip_excludes_identity_and_undo(ctx: &mut StorageTestContext) {
        let persistence = Persistence::new(ctx.storage());
        let mut store = TaskStore::new(false);
        store.add_task("Keep", AddTaskOptions::quadrant(Quadrant::Important));
        let kept = store.snapshot().tasks[0].id.clone();
        store.add_task("Drop", AddTaskOptions::default());
        let dropped = store.snapshot().tasks[0].id.clone();
        store.delete_task(&dropped);
        store.set_view_mode(ViewMode::Matrix);
        store.set_filter_urgent(true);
        store.set_identity(Some(eisen::api::Identity::new("user-1", Some("me@example.com"))));

        assert!(persistence.write(&store.snapshot(), store.revision()).await.unwrap());

        let loaded = persistence.load().await.unwrap().unwrap();
        assert_eq!(loaded.revision, store.revision());
        let mut restored = TaskStore::new(false);
        restored.restore(loaded.state, loaded.revision);

        let state = restored.snapshot();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].id, kept);
        assert_eq!(state.view_mode, ViewMode::Matrix);
        assert!(state.filter_urgent);
        assert!(!state.filter_important);
        assert!(state.identity.is_none());
        assert!(state.last_deleted.is_empty());
        assert_eq!(restored.revision(), store.revision());
    }

    #[test_context(StorageTestContext)]
    #[tokio::test]
    async fn test_load_on_first_run_is_empty(ctx: &mut StorageTestContext) {
        let persistence = Persistence::new(ctx.storage());
        assert!(persistence.load().await.unwrap().is_none());
    }

    #[test_context(StorageTestContext)]
    #[tokio::test]
    async fn test_app_restart_restores_state(ctx: &mut StorageTestContext) {
        {
            let app = ctx.start().await;
            let commit = app.add_project("Garden", Some("🌱"));
            commit.settle().await.unwrap();
            let garden = app.snapshot().projects.last().unwrap().id.clone();
            app.set_selected_project(&garden).settle().await.unwrap();
            app.add_task("Plant tulips", AddTaskOptions::quadrant(Quadrant::Important))
                .settle()
                .await
                .unwrap();
            app.set_compact_mode(true).settle().await.unwrap();
        }

        let app = ctx.start().await;
        let state = app.snapshot();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].title, "Plant tulips");
        assert_eq!(state.selected_project().unwrap().name, "Garden");
        assert!(state.compact_mode);

        // writes after a restart continue from the saved revision
        app.add_task("Water", AddTaskOptions::default()).settle().await.unwrap();
        drop(app);
        let app = ctx.start().await;
        assert_eq!(app.snapshot().tasks.len(), 2);
    }

    #[test_context(StorageTestContext)]
    #[tokio::test]
    async fn test_clear_local_forgets_state(ctx: &mut StorageTestContext) {
        let app = ctx.start().await;
        app.add_task("Temporary", AddTaskOptions::default()).settle().await.unwrap();
        app.clear_local().await.unwrap();
        drop(app);

        let app = ctx.start().await;
        assert!(app.snapshot().tasks.is_empty());
    }
}
