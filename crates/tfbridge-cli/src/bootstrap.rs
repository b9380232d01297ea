//! CLI bootstrap - the composition root.
//!
//! Settings, the workspace registry, the shared server context and the
//! credential refresher are all built here. Handlers only receive the
//! composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tfbridge_core::{
    AuthenticationInfo, CredentialRefresher, ServerContext, ServerContextStore, ServerKind,
    Settings, Workstation, env_file_path, load_settings, load_workspaces, settings_path,
    validate_settings, workspaces_path,
};
use tfbridge_rest::{RestClient, RestClientConfig};
use tfbridge_runtime::{CommandRunner, locate_tool};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;
use crate::refresher::{DEFAULT_TOKEN_USER, EnvTokenRefresher};

/// Hosts of the hosted service; anything else is treated as on-premises.
const HOSTED_SUFFIXES: &[&str] = &["dev.azure.com", ".visualstudio.com"];

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub workstation: Arc<Workstation>,
    pub server: Arc<ServerContextStore>,
    pub refresher: Arc<dyn CredentialRefresher>,
    tool_override: Option<String>,
}

impl CliContext {
    /// Runner for typed tool commands. Fails when the tool can't be found.
    pub fn command_runner(&self) -> Result<CommandRunner, CliError> {
        let tool = locate_tool(self.tool_path())?;
        Ok(CommandRunner::new(tool).with_timeout(Duration::from_secs(
            self.settings.effective_command_timeout_secs(),
        )))
    }

    /// Explicitly configured tool path, if any.
    pub fn tool_path(&self) -> Option<&str> {
        self.tool_override.as_deref().or(self.settings.tool_path.as_deref())
    }

    /// REST client configured from settings.
    pub fn rest_client(&self) -> Result<RestClient, CliError> {
        let config = RestClientConfig::new().with_api_version(self.settings.effective_api_version());
        RestClient::new(config).map_err(|e| CliError::Config(e.to_string()))
    }

    /// The collection URL, required by commands that talk to a server.
    pub fn require_collection(&self) -> Result<String, CliError> {
        let url = self.server.snapshot().collection_url;
        if url.trim().is_empty() {
            return Err(CliError::Config(
                "no collection URL; pass --collection or set collection_url in settings".to_string(),
            ));
        }
        Ok(url)
    }
}

/// Whether `url` points at the hosted service.
pub fn server_kind_for(url: &str) -> ServerKind {
    let host = url
        .split("://")
        .nth(1)
        .and_then(|rest| rest.split(['/', ':']).next())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if HOSTED_SUFFIXES.iter().any(|suffix| host.ends_with(suffix)) {
        ServerKind::Hosted
    } else {
        ServerKind::OnPremises
    }
}

/// Build the server context from settings and command-line overrides.
pub fn server_context(settings: &Settings, cli: &Cli) -> ServerContext {
    let url = cli
        .collection
        .clone()
        .or_else(|| settings.collection_url.clone())
        .unwrap_or_default();
    let mut context = ServerContext::new(url.trim()).with_kind(server_kind_for(&url));

    if let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) {
        let user = cli
            .username
            .clone()
            .or_else(|| settings.username.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_USER.to_string());
        context = context.with_authentication(AuthenticationInfo::new(user, token, url.trim()));
    }
    context
}

/// Bootstrap the CLI application.
pub fn bootstrap(cli: &Cli) -> Result<CliContext> {
    let settings_file = settings_path()?;
    let settings = load_settings(&settings_file)
        .with_context(|| format!("loading {}", settings_file.display()))?;
    validate_settings(&settings).map_err(CliError::from)?;

    let workspaces_file = settings
        .workspaces_file
        .as_ref()
        .map_or_else(workspaces_path, |f| Ok(PathBuf::from(f)))?;
    let workspaces = if workspaces_file.exists() {
        load_workspaces(&workspaces_file)
            .with_context(|| format!("loading {}", workspaces_file.display()))?
    } else {
        Vec::new()
    };
    debug!(
        settings = %settings_file.display(),
        workspaces = workspaces.len(),
        "Loaded configuration"
    );

    let context = server_context(&settings, cli);
    let user_name = context
        .authentication
        .as_ref()
        .map_or_else(|| DEFAULT_TOKEN_USER.to_string(), |a| a.user_name.clone());
    let server = Arc::new(ServerContextStore::new(context));
    let refresher =
        EnvTokenRefresher::new(Arc::clone(&server), user_name).with_env_file(env_file_path()?);

    Ok(CliContext {
        settings,
        workstation: Arc::new(Workstation::new(workspaces)),
        server,
        refresher: Arc::new(refresher),
        tool_override: cli.tool.clone(),
    })
}
