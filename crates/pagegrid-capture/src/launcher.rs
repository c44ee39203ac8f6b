//! Browser executable resolution and headless process launch.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, info, warn};

use crate::error::CaptureError;

/// Environment variable holding an absolute-path executable override.
pub const BROWSER_PATH_ENV: &str = "PAGEGRID_CHROME";

/// Grace period between asking the browser to exit and killing it.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

#[cfg(target_os = "macos")]
const KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "linux")]
const KNOWN_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "windows")]
const KNOWN_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const KNOWN_PATHS: &[&str] = &[];

/// Binary names probed on `PATH` when no well-known install is present.
const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Resolve the browser executable to launch.
///
/// An explicit override wins and must be an absolute path; otherwise
/// well-known install locations are checked, then `PATH`. Failing all of
/// those is fatal before any process is spawned.
pub fn resolve_executable(override_path: Option<&Path>) -> Result<PathBuf, CaptureError> {
    if let Some(path) = override_path {
        if !path.is_absolute() {
            return Err(CaptureError::OverrideNotAbsolute {
                path: path.display().to_string(),
            });
        }
        return Ok(path.to_path_buf());
    }

    for candidate in KNOWN_PATHS {
        let path = PathBuf::from(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }

    if let Some(search) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&search) {
            for name in PATH_NAMES {
                let path = dir.join(name);
                if path.is_file() {
                    return Ok(path);
                }
            }
        }
    }

    Err(CaptureError::ExecutableNotFound)
}

/// A launched headless browser. One per capture, never reused.
pub(crate) struct BrowserProcess {
    child: Child,
}

impl BrowserProcess {
    /// Spawn the browser headless with an ephemeral debugging port and its
    /// diagnostic output piped for endpoint discovery.
    pub(crate) fn launch(
        executable: &Path,
        width: u32,
        height: u32,
    ) -> Result<Self, CaptureError> {
        let mut cmd = Command::new(executable);
        cmd.arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--remote-debugging-port=0")
            .arg(format!("--window-size={width},{height}"))
            .arg("--hide-scrollbars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            CaptureError::LaunchFailed(format!("{}: {e}", executable.display()))
        })?;

        info!(pid = ?child.id(), "launched headless browser");
        Ok(Self { child })
    }

    /// Take the piped stderr for endpoint discovery. Yields once.
    pub(crate) fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Wait for the process to exit. Used inside `select!` so any pending
    /// step observes an unexpected exit instead of hanging.
    pub(crate) async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Graceful termination, escalating to a kill after the grace period.
    pub(crate) async fn shutdown(mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }

        match tokio::time::timeout(TERMINATE_GRACE, self.child.wait()).await {
            Ok(status) => debug!(?status, "browser exited"),
            Err(_) => {
                warn!("browser did not exit within grace period, killing");
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "failed to kill browser process");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
