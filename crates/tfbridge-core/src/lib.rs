//! Core of tfbridge: workspace and path model, workspace-aware batching and
//! the cancellable operation framework shared by the tool runner and REST
//! adapters.
#![deny(unused_crate_dependencies)]

pub mod batch;
pub mod domain;
pub mod error;
pub mod operation;
pub mod paths;
pub mod ports;
pub mod settings;
pub mod translate;

// Re-export commonly used types for convenience
pub use batch::{BatchResult, process_by_workspaces, process_by_workspaces_void};
pub use domain::{
    AuthenticationInfo, Mapping, SERVER_ROOT, ServerContext, ServerContextStore, ServerKind, Workspace,
    is_server_item, normalize_local,
};
pub use error::{OperationError, OperationResult, StreamKind, ToolError};
pub use operation::{
    AuthRetryCoordinator, ChannelListener, EMPTY_INPUTS, EmptyInputs, ListenerId, ListenerSet,
    Operation, OperationEvent, OperationListener, OperationResults, OperationWork, ResultSink,
};
pub use paths::{
    PathError, data_root, env_file_path, load_settings, load_workspaces, save_settings,
    save_workspaces, settings_path, workspaces_path,
};
pub use ports::{
    CredentialRefresher, NoopRefresher, RefreshOutcome, VoidWorkspaceDelegate, WorkspaceDelegate,
    WorkspaceRegistry, Workstation,
};
pub use settings::{
    DEFAULT_API_VERSION, DEFAULT_COMMAND_TIMEOUT_SECS, Settings, SettingsError, SettingsUpdate,
    validate_settings,
};
pub use translate::{Translation, local_to_server, server_to_local};
