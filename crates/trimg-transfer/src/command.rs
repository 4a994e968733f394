//! Running external `docker` and `aws` commands

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::CommandError;

/// Run `program` with `args`, optionally feeding `stdin`, and return trimmed stdout
///
/// # Errors
/// - `CommandError::Spawn` if the program cannot be started or its pipes fail
/// - `CommandError::Failed` if it exits unsuccessfully
pub(crate) async fn run(program: &str, args: &[&str], stdin: Option<&str>) -> Result<String, CommandError> {
    tracing::debug!(program, ?args, "running command");

    let spawn_error = |source| CommandError::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_error)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes()).await.map_err(spawn_error)?;
        // Close stdin so the program sees EOF.
        drop(pipe);
    }

    let output = child.wait_with_output().await.map_err(spawn_error)?;
    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}


/// Shell scripts standing in for `docker` and `aws`
#[cfg(all(test, unix))]
pub(crate) mod stub {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Write an executable `name` into `dir` that records its arguments, then runs `body`
    pub(crate) fn program(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        let script = format!("#!/bin/sh\nprintf '%s\\n' \"$*\" >> \"$0.calls\"\n{body}\n");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Argument lines recorded by `program`, oldest first
    pub(crate) fn calls(program: &str) -> Vec<String> {
        std::fs::read_to_string(format!("{program}.calls"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
