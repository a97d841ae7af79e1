//! winhttp DLL override via wine regedit
//!
//! Writes a one-key .reg file and imports it into the game's prefix with
//! `wine regedit /S`. Output pipes are drained on reader threads started
//! right after spawn: waiting first and reading afterwards deadlocks once
//! the child fills the OS pipe buffer.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::HookError;
use crate::logging::log_info;

/// Hard upper bound on the regedit run; the child is killed on expiry.
pub const REGEDIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Registry payload: winhttp resolves native (the loader DLL in the game
/// directory) before Wine's builtin.
const WINHTTP_OVERRIDE_REG: &str = "Windows Registry Editor Version 5.00\r\n\
    \r\n\
    [HKEY_CURRENT_USER\\Software\\Wine\\DllOverrides]\r\n\
    \"winhttp\"=\"native,builtin\"\r\n";

static REG_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Outcome of one regedit invocation. Never persisted.
#[derive(Debug)]
pub struct OverrideResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl OverrideResult {
    /// Success means the process exited on its own, in time, with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Set the winhttp override inside a Wine prefix.
///
/// The temporary .reg file is removed best-effort whatever happens.
pub fn apply_winhttp_override(
    wine_binary: &Path,
    prefix: &Path,
) -> Result<OverrideResult, HookError> {
    let reg_path = std::env::temp_dir().join(format!(
        "winhttp_override_{}_{}.reg",
        std::process::id(),
        REG_FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    apply_override_with_reg_file(wine_binary, prefix, &reg_path)
}

pub(crate) fn apply_override_with_reg_file(
    wine_binary: &Path,
    prefix: &Path,
    reg_path: &Path,
) -> Result<OverrideResult, HookError> {
    if !wine_binary.exists() {
        return Err(HookError::WineNotFound);
    }

    fs::write(reg_path, WINHTTP_OVERRIDE_REG).map_err(|e| HookError::Process {
        context: "Writing registry override file".to_string(),
        reason: e.to_string(),
    })?;

    let result = run_regedit(wine_binary, prefix, reg_path);

    // Best-effort cleanup, success or not
    let _ = fs::remove_file(reg_path);

    result
}

fn run_regedit(
    wine_binary: &Path,
    prefix: &Path,
    reg_path: &Path,
) -> Result<OverrideResult, HookError> {
    log_info(&format!(
        "Importing registry override: {} regedit /S {}",
        wine_binary.display(),
        reg_path.display()
    ));

    let mut child = Command::new(wine_binary)
        .arg("regedit")
        .arg("/S")
        .arg(reg_path)
        .current_dir(wine_binary.parent().unwrap_or_else(|| Path::new("/")))
        .env("WINEPREFIX", prefix)
        .env("WINEDLLOVERRIDES", "mscoree,mshtml=") // no Gecko/Mono prompts
        .env("WINEARCH", "win64")
        .env("WINEDEBUG", "-all")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| HookError::Process {
            context: format!("Spawning {}", wine_binary.display()),
            reason: e.to_string(),
        })?;

    // Drain both pipes concurrently with the wait
    let stdout_reader = drain_pipe(child.stdout.take());
    let stderr_reader = drain_pipe(child.stderr.take());

    let status = child
        .wait_timeout(REGEDIT_TIMEOUT)
        .map_err(|e| HookError::Process {
            context: "Waiting for wine regedit".to_string(),
            reason: e.to_string(),
        })?;

    let timed_out = status.is_none();
    if timed_out {
        let _ = child.kill();
        let _ = child.wait(); // reap, and unblock the readers
    }

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(OverrideResult {
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
        timed_out,
    })
}

/// Read a child pipe to the end on its own thread. Returns whatever was
/// captured even if the read is cut short by a kill.
fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;

    /// Write an executable shell script standing in for the wine binary.
    fn fake_wine(tag: &str, script_body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "protonhook_registry_test_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let script = dir.join("wine");
        fs::write(&script, format!("#!/bin/sh\n{}\n", script_body)).unwrap();
        let mut perms = fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).unwrap();
        script
    }

    fn reg_file_for(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "protonhook_regfile_test_{}_{}.reg",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn test_missing_binary_fails_fast() {
        let err = apply_winhttp_override(
            Path::new("/nonexistent/wine"),
            Path::new("/tmp"),
        )
        .unwrap_err();
        assert_eq!(err, HookError::WineNotFound);
    }

    #[test]
    fn test_successful_run_captures_output() {
        let wine = fake_wine("ok", "echo imported; exit 0");
        let reg = reg_file_for("ok");

        let result =
            apply_override_with_reg_file(&wine, Path::new("/tmp"), &reg).unwrap();
        assert!(result.success());
        assert_eq!(result.exit_code, Some(0));
        assert!(!result.timed_out);
        assert_eq!(result.stdout.trim(), "imported");
        assert!(!reg.exists(), "temp reg file must be deleted");
    }

    #[test]
    fn test_nonzero_exit_is_failure_not_timeout() {
        let wine = fake_wine("fail", "echo broken >&2; exit 3");
        let reg = reg_file_for("fail");

        let result =
            apply_override_with_reg_file(&wine, Path::new("/tmp"), &reg).unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.timed_out);
        assert_eq!(result.stderr.trim(), "broken");
        assert!(!reg.exists());
    }

    #[test]
    fn test_hung_process_is_killed_and_reported_as_timeout() {
        let wine = fake_wine("hang", "echo started; exec sleep 600");
        let reg = reg_file_for("hang");

        let start = Instant::now();
        let result =
            apply_override_with_reg_file(&wine, Path::new("/tmp"), &reg).unwrap();
        let elapsed = start.elapsed();

        assert!(result.timed_out);
        assert!(!result.success());
        // 5s timeout plus scheduling slack
        assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);
        assert!(!reg.exists(), "temp reg file must be deleted after timeout");
    }

    #[test]
    fn test_large_output_does_not_deadlock() {
        // Well past the 64KB pipe buffer
        let wine = fake_wine("bigout", "head -c 262144 /dev/zero | tr '\\0' 'a'");
        let reg = reg_file_for("bigout");

        let result =
            apply_override_with_reg_file(&wine, Path::new("/tmp"), &reg).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.len(), 262144);
    }
}
