//! Best-effort process launches. Nothing here waits on or monitors the child;
//! callers get the spawn result and decide how loudly to report it.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{BrowseError, Result};

/// Hand `path` to the platform's default application (ShellExecute on
/// Windows, `open` on macOS, `xdg-open` elsewhere).
pub fn open_externally(path: &Path) -> Result<()> {
    open::that_detached(path).map_err(|source| BrowseError::Launch {
        what: path.display().to_string(),
        source,
    })?;
    log::info!("Opened {} externally", path.display());
    Ok(())
}

/// A companion program started from a fixed working directory.
#[derive(Debug, Clone)]
pub struct Companion {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Companion {
    pub fn new(command: &[String], cwd: PathBuf) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd,
        })
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Spawn detached. The child handle is dropped immediately.
    pub fn launch(&self) -> Result<u32> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| BrowseError::Launch {
                what: self.describe(),
                source,
            })?;
        let pid = child.id();
        log::info!("Launched `{}` in {} (pid {})", self.describe(), self.cwd.display(), pid);
        Ok(pid)
    }
}
