//! Process helpers shared by the command-line kernel backends.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::services::backends::BackendError;

/// Run `bin args...` and return stdout, failing on spawn errors or a non-zero
/// exit status.
pub(crate) fn run_tool<I, S>(
    backend: &str,
    bin: &Path,
    args: I,
    envs: &[(&str, &OsStr)],
) -> Result<String, BackendError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(bin);
    command.args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command
        .output()
        .map_err(|e| BackendError::failed(backend, format!("failed to spawn {}: {e}", bin.display())))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().last().unwrap_or("").trim();
        let message = if detail.is_empty() {
            format!("{} exited with {}", bin.display(), output.status)
        } else {
            format!("{} exited with {}: {detail}", bin.display(), output.status)
        };
        return Err(BackendError::failed(backend, message));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// First non-empty line of `bin <flag>`.
pub(crate) fn tool_version(bin: &Path, flag: &str) -> Result<String, String> {
    let output = Command::new(bin)
        .arg(flag)
        .output()
        .map_err(|e| format!("failed to spawn {}: {e}", bin.display()))?;
    if !output.status.success() {
        return Err(format!("{} {flag} exited with {}", bin.display(), output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("{} {flag} produced no output", bin.display()))
}

/// Read a test fixture named by `var`, if the variable is set.
pub(crate) fn fake_output(backend: &str, var: &str) -> Result<Option<String>, BackendError> {
    match std::env::var_os(var) {
        Some(path) => std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| BackendError::failed(backend, format!("failed to read {var}: {e}"))),
        None => Ok(None),
    }
}

/// Locate an executable by name on PATH.
pub(crate) fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{name}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
