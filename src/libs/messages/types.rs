/// Every user-facing message in eisen.
///
/// Text lives in `display.rs`; call sites only pick a variant and pass its
/// parameters, usually through one of the `msg_*` macros.
#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskAdded(String),
    TaskUpdated(String),
    TaskCompleted(String),
    TaskReopened(String),
    TaskDeleted(String),
    TaskRestored(String),
    TaskMovedToQuadrant(String, String), // title, quadrant label
    TaskMovedToProject(String, String),  // title, project name
    TaskReordered(String),
    TaskNotFound(String),
    TaskNotMoved(String),
    TasksEmpty,
    EmptyTitle,
    InvalidQuadrant(String),
    NothingToUndo,
    UndoAvailable(String, u64), // title, seconds
    UndoExpired,

    // === PROJECT MESSAGES ===
    ProjectAdded(String),
    ProjectRenamed(String),
    ProjectDeleted(String),
    ProjectProtected(String),
    ProjectNotFound(String),
    ProjectSelected(String),
    ProjectsHeader,

    // === PREFERENCE MESSAGES ===
    ViewModeSet(String),
    FiltersSet(bool, bool), // important, urgent
    CompactModeSet(bool),
    Progress(usize, usize, u8), // done, total, percent

    // === AUTH MESSAGES ===
    SignedIn(String),
    SignedUp(String),
    SignedOut,
    NotSignedIn,
    SignInFailed(String),
    SignOutFailed(String),
    RemoteNotConfigured,
    SessionReadFailed(String),
    AuthStateChanged(String),

    // === SYNC MESSAGES ===
    ReloadStarted(String),
    ReloadCompleted(usize, usize), // projects, tasks
    ReloadFailed(String),
    RemoteWriteFailed(String, String), // operation, error
    IdReconciled(String, String),      // local id, server id
    ConfirmationDropped(String),
    RemoteWriteDeferred(String, String), // operation, local id
    CreateRevoked(String, String),       // local id, server id
    AuthWatcherStopped,

    // === PERSISTENCE MESSAGES ===
    StateLoaded(usize),
    StateLoadFailed(String),
    StateSaveFailed(String),
    StaleWriteSkipped(u64),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleRemote,
    ConfigModuleSync,
    ConfigModuleUi,
    PromptSelectModules,
    PromptApiUrl,
    PromptApiKey,
    PromptSyncTimeout,
    PromptUndoWindow,
    PromptCompactMode,
    PromptEmail,
    PromptPassword,

    // === SHELL MESSAGES ===
    ShellWelcome,
    ShellPrompt,
    ShellHelp,
    ShellUnknownCommand(String),
    ShellUsage(String),
    ShellBye,
}
