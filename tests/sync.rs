#[cfg(test)]
mod tests {
    use eisen::api::{Identity, MemoryAuth, MemoryRemote};
    use eisen::libs::app::{App, AppOptions};
    use eisen::libs::persistence::{MemoryStorage, Persistence};
    use eisen::libs::quadrant::Quadrant;
    use eisen::libs::store::{AddTaskOptions, ViewMode};
    use eisen::libs::sync::{AuthState, SyncError};
    use eisen::libs::task::{Project, Task, INBOX_PROJECT_ID};
    use std::sync::Arc;
    use std::time::Duration;
    use test_context::{test_context, AsyncTestContext};

    struct SyncTestContext {
        storage: Arc<MemoryStorage>,
        identity: Identity,
    }

    impl SyncTestContext {
        async fn launch(&self, remote: &Arc<MemoryRemote>, auth: &Arc<MemoryAuth>, options: AppOptions) -> App {
            App::start(options, self.storage.clone(), remote.clone(), auth.clone()).await
        }

        async fn signed_in(&self, remote: &Arc<MemoryRemote>) -> App {
            let auth = Arc::new(MemoryAuth::signed_in(self.identity.clone()));
            self.launch(remote, &auth, AppOptions::default()).await
        }

        fn persisted(&self) -> Persistence {
            Persistence::new(self.storage.clone())
        }
    }

    impl AsyncTestContext for SyncTestContext {
        async fn setup() -> Self {
            SyncTestContext {
                storage: Arc::new(MemoryStorage::new()),
                identity: Identity::new("user-1", Some("me@example.com")),
            }
        }

        async fn teardown(self) {}
    }

    fn remote_task(id: &str, title: &str, quadrant: Quadrant, project_id: &str) -> Task {
        let mut task = Task::new(title, quadrant, project_id);
        task.id = id.to_string();
        task
    }

    /// Calls other than the initial reload.
    fn writes(remote: &MemoryRemote) -> Vec<String> {
        remote.calls().into_iter().filter(|c| !c.starts_with("fetch_")).collect()
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_sign_up_replaces_local_tasks(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let auth = Arc::new(MemoryAuth::new());
        let app = ctx.launch(&remote, &auth, AppOptions::default()).await;
        for title in ["one", "two", "three"] {
            let commit = app.add_task(title, AddTaskOptions::default());
            assert!(!commit.has_remote());
            commit.settle().await.unwrap();
        }
        assert_eq!(app.snapshot().tasks.len(), 3);

        let work = Project::new("Work", None);
        let tasks = (1..=5)
            .map(|n| remote_task(&format!("r{}", n), &format!("remote {}", n), Quadrant::Important, &work.id))
            .collect();
        remote.seed(vec![work.clone()], tasks);

        app.sign_up("me@example.com", "secret").await.unwrap();

        let state = app.snapshot();
        assert!(app.auth_state().is_authenticated());
        assert_eq!(state.tasks.len(), 5);
        assert!(state.tasks.iter().all(|t| t.project_id == work.id));
        assert!(state.project(&work.id).is_some());
        assert!(state.project(INBOX_PROJECT_ID).is_some());
        assert_eq!(state.identity.as_ref().and_then(|i| i.email.as_deref()), Some("me@example.com"));

        let saved = ctx.persisted().load().await.unwrap().unwrap();
        assert_eq!(saved.state.tasks.len(), 5);
        assert!(writes(&remote).is_empty());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_backend_ids_replace_local_ids(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::assigning_ids());
        let app = ctx.signed_in(&remote).await;

        let commit = app.add_task("Book dentist", AddTaskOptions::quadrant(Quadrant::Important));
        let local_id = commit.snapshot.tasks[0].id.clone();
        assert!(commit.has_remote());
        commit.settle().await.unwrap();

        let state = app.snapshot();
        assert!(state.task(&local_id).is_none());
        let task = state.task("srv-1").unwrap();
        assert_eq!(task.title, "Book dentist");
        assert!(task.important);

        let saved = ctx.persisted().load().await.unwrap().unwrap();
        assert_eq!(saved.state.tasks[0].id, "srv-1");

        // later edits address the backend id
        app.toggle_done("srv-1").settle().await.unwrap();
        assert!(remote.tasks()[0].done);
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_late_confirmation_does_not_resurrect_deleted_task(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::assigning_ids().with_latency(Duration::from_millis(50)));
        let app = ctx.signed_in(&remote).await;

        let created = app.add_task("Short lived", AddTaskOptions::default());
        let local_id = created.snapshot.tasks[0].id.clone();
        let deleted = app.delete_task(&local_id);
        assert!(deleted.applied());

        assert!(!deleted.has_remote());

        created.settle().await.unwrap();
        deleted.settle().await.unwrap();

        let state = app.snapshot();
        assert!(state.tasks.is_empty());
        assert!(state.task("srv-1").is_none());

        // the backend copy went away with the confirmation
        assert!(remote.tasks().is_empty());
        assert_eq!(writes(&remote), vec!["create_task", "delete_task"]);
        app.reload().await.unwrap();
        assert!(app.snapshot().tasks.is_empty());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_edit_during_pending_create_survives(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::assigning_ids().with_latency(Duration::from_millis(50)));
        let app = ctx.signed_in(&remote).await;

        let created = app.add_task("Call plumber", AddTaskOptions::default());
        let local_id = created.snapshot.tasks[0].id.clone();
        let toggled = app.toggle_done(&local_id);
        let moved = app.move_to_quadrant(&local_id, "u");
        assert!(toggled.applied() && moved.applied());

        created.settle().await.unwrap();
        toggled.settle().await.unwrap();
        moved.settle().await.unwrap();

        let state = app.snapshot();
        let task = state.task("srv-1").unwrap();
        assert!(task.done);
        assert_eq!(task.quadrant(), Quadrant::Urgent);

        let stored = remote.tasks();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "srv-1");
        assert!(stored[0].done);
        assert_eq!(stored[0].quadrant(), Quadrant::Urgent);
        assert_eq!(writes(&remote), vec!["create_task", "update_task"]);

        let saved = ctx.persisted().load().await.unwrap().unwrap();
        assert!(saved.state.tasks[0].done);
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_undo_during_pending_create_keeps_task(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::assigning_ids().with_latency(Duration::from_millis(50)));
        let app = ctx.signed_in(&remote).await;

        let created = app.add_task("Second thoughts", AddTaskOptions::default());
        let local_id = created.snapshot.tasks[0].id.clone();
        app.delete_task(&local_id).settle().await.unwrap();
        app.undo_delete().settle().await.unwrap();
        created.settle().await.unwrap();

        assert!(app.snapshot().task("srv-1").is_some());
        assert_eq!(remote.tasks().len(), 1);
        assert_eq!(writes(&remote), vec!["create_task"]);
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_offline_write_keeps_local_change(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let app = ctx.signed_in(&remote).await;
        remote.set_offline(true);

        let commit = app.add_task("Written offline", AddTaskOptions::default());
        let local_id = commit.snapshot.tasks[0].id.clone();
        let result = commit.settle().await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert!(app.snapshot().task(&local_id).is_some());
        assert!(remote.tasks().is_empty());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_failed_reload_keeps_cache(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let auth = Arc::new(MemoryAuth::new());
        let app = ctx.launch(&remote, &auth, AppOptions::default()).await;
        app.add_task("cached a", AddTaskOptions::default()).settle().await.unwrap();
        app.add_task("cached b", AddTaskOptions::default()).settle().await.unwrap();
        remote.seed(Vec::new(), vec![remote_task("r1", "remote", Quadrant::Neither, INBOX_PROJECT_ID)]);
        remote.set_offline(true);

        app.sign_up("me@example.com", "secret").await.unwrap();

        assert!(app.auth_state().is_authenticated());
        let titles: Vec<String> = app.snapshot().visible_tasks().into_iter().map(|t| t.title).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"cached a".to_string()));

        let saved = ctx.persisted().load().await.unwrap().unwrap();
        assert_eq!(saved.state.tasks.len(), 2);
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_sign_out_keeps_cache(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(
            Vec::new(),
            vec![
                remote_task("r1", "first", Quadrant::Urgent, INBOX_PROJECT_ID),
                remote_task("r2", "second", Quadrant::Neither, INBOX_PROJECT_ID),
            ],
        );
        let app = ctx.signed_in(&remote).await;
        assert_eq!(app.snapshot().tasks.len(), 2);

        app.sign_out().await.unwrap();

        assert_eq!(app.auth_state(), AuthState::Unauthenticated);
        let state = app.snapshot();
        assert!(state.identity.is_none());
        assert_eq!(state.tasks.len(), 2);

        let commit = app.add_task("after sign out", AddTaskOptions::default());
        assert!(!commit.has_remote());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_slow_backend_times_out(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new().with_latency(Duration::from_millis(200)));
        let auth = Arc::new(MemoryAuth::signed_in(ctx.identity.clone()));
        let options = AppOptions {
            timeout: Duration::from_millis(50),
            ..AppOptions::default()
        };
        let app = ctx.launch(&remote, &auth, options).await;
        assert!(app.auth_state().is_authenticated());

        let commit = app.add_task("Slow", AddTaskOptions::default());
        let local_id = commit.snapshot.tasks[0].id.clone();
        let result = commit.settle().await;

        assert!(matches!(result, Err(SyncError::Timeout(50))));
        assert!(app.snapshot().task(&local_id).is_some());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_signed_out_mutations_stay_local(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let auth = Arc::new(MemoryAuth::new());
        let app = ctx.launch(&remote, &auth, AppOptions::default()).await;

        let created = app.add_task("Local", AddTaskOptions::default());
        let id = created.snapshot.tasks[0].id.clone();
        created.settle().await.unwrap();
        app.toggle_done(&id).settle().await.unwrap();
        app.add_project("Side", None).settle().await.unwrap();
        app.delete_task(&id).settle().await.unwrap();

        assert!(remote.calls().is_empty());
        assert!(matches!(app.reload().await, Err(SyncError::NotAuthenticated)));
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_preferences_are_not_sent(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let app = ctx.signed_in(&remote).await;

        for commit in [
            app.set_view_mode(ViewMode::Matrix),
            app.set_filter_important(true),
            app.set_filter_urgent(true),
            app.set_compact_mode(true),
            app.set_selected_project(INBOX_PROJECT_ID),
        ] {
            assert!(commit.applied());
            assert!(!commit.has_remote());
            commit.settle().await.unwrap();
        }
        assert!(writes(&remote).is_empty());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_project_delete_reassigns_remotely(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let app = ctx.signed_in(&remote).await;

        let created = app.add_project("Work", Some("💼"));
        let work = created.snapshot.projects.last().unwrap().id.clone();
        created.settle().await.unwrap();
        let task = app.add_task("Report", AddTaskOptions::default().in_project(&work));
        let task_id = task.snapshot.tasks[0].id.clone();
        task.settle().await.unwrap();

        app.delete_project(&work).settle().await.unwrap();

        assert_eq!(
            writes(&remote),
            vec!["create_project", "create_task", "update_task", "delete_project"]
        );
        assert!(remote.projects().is_empty());
        assert_eq!(remote.tasks()[0].project_id, INBOX_PROJECT_ID);
        assert_eq!(app.snapshot().task(&task_id).unwrap().project_id, INBOX_PROJECT_ID);
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_undo_is_not_sent(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let app = ctx.signed_in(&remote).await;

        let created = app.add_task("Oops", AddTaskOptions::default());
        let id = created.snapshot.tasks[0].id.clone();
        created.settle().await.unwrap();
        app.delete_task(&id).settle().await.unwrap();

        let undo = app.undo_delete();
        assert!(undo.applied());
        assert!(!undo.has_remote());
        undo.settle().await.unwrap();

        assert!(app.snapshot().task(&id).is_some());
        assert!(remote.tasks().is_empty());
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_watcher_follows_identity_changes(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        remote.seed(Vec::new(), vec![remote_task("r1", "from backend", Quadrant::ImportantUrgent, INBOX_PROJECT_ID)]);
        let auth = Arc::new(MemoryAuth::new());
        let app = ctx.launch(&remote, &auth, AppOptions::default()).await;
        assert_eq!(app.auth_state(), AuthState::Unauthenticated);

        let mut states = app.auth_states();
        auth.emit(Some(ctx.identity.clone()));
        tokio::time::timeout(Duration::from_secs(1), states.wait_for(|s| s.is_authenticated()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(app.snapshot().tasks[0].id, "r1");

        auth.emit(None);
        tokio::time::timeout(Duration::from_secs(1), states.wait_for(|s| *s == AuthState::Unauthenticated))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(app.snapshot().tasks.len(), 1);
    }

    #[test_context(SyncTestContext)]
    #[tokio::test]
    async fn test_manual_reload(ctx: &mut SyncTestContext) {
        let remote = Arc::new(MemoryRemote::new());
        let app = ctx.signed_in(&remote).await;
        assert!(app.snapshot().tasks.is_empty());

        remote.seed(Vec::new(), vec![remote_task("r1", "new elsewhere", Quadrant::Urgent, INBOX_PROJECT_ID)]);
        let (projects, tasks) = app.reload().await.unwrap();

        assert_eq!((projects, tasks), (0, 1));
        assert_eq!(app.snapshot().tasks[0].title, "new elsewhere");
    }
}
