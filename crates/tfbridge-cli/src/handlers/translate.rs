//! `translate`: map a path between its local and server forms.

use std::path::{Path, PathBuf};

use tfbridge_core::{
    Translation, WorkspaceRegistry, Workstation, is_server_item, local_to_server,
    server_to_local,
};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// One translation line: workspace name and the translated path.
#[derive(Debug, PartialEq, Eq)]
pub struct Translated {
    pub workspace: String,
    pub outcome: Translation<String>,
}

/// Translate `path` against every relevant workspace.
///
/// A server path is tried in every workspace; a local path only in the
/// workspace that owns it.
pub fn translate(workstation: &Workstation, path: &str) -> Vec<Translated> {
    if is_server_item(path) {
        return workstation
            .workspaces()
            .iter()
            .map(|ws| Translated {
                workspace: ws.name.clone(),
                outcome: to_display(server_to_local(path, &ws.mappings)),
            })
            .filter(|t| t.outcome != Translation::Unmapped)
            .collect();
    }

    let local = Path::new(path);
    workstation
        .find_workspace(local)
        .map(|ws| Translated {
            workspace: ws.name.clone(),
            outcome: local_to_server(local, &ws.mappings),
        })
        .into_iter()
        .collect()
}

fn to_display(translation: Translation<PathBuf>) -> Translation<String> {
    match translation {
        Translation::Mapped(p) => Translation::Mapped(p.display().to_string()),
        Translation::Cloaked => Translation::Cloaked,
        Translation::Unmapped => Translation::Unmapped,
    }
}

/// Execute the translate command.
pub fn execute(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    let translations = translate(&ctx.workstation, path);
    if translations.is_empty() {
        return Err(CliError::Arguments(format!("no workspace maps '{path}'")));
    }
    for t in translations {
        match t.outcome {
            Translation::Mapped(p) => println!("{}\t{p}", t.workspace),
            Translation::Cloaked => println!("{}\t(cloaked)", t.workspace),
            Translation::Unmapped => println!("{}\t(unmapped)", t.workspace),
        }
    }
    Ok(())
}
