//! Opening permalinks in the user's default browser.

use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::error::{DashError, Result};

/// Anything that can hand a URL to the outside world.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Launches the platform's default URL handler as a detached child process.
pub struct SystemBrowser {
    os: &'static str,
}

impl SystemBrowser {
    pub fn new() -> Self {
        Self {
            os: std::env::consts::OS,
        }
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

/// The command that opens `url` on `os` (as named by
/// [`std::env::consts::OS`]).
pub fn launch_command(os: &str, url: &str) -> Result<Command> {
    let mut cmd = match os {
        "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Command::new("xdg-open"),
        "windows" => {
            let mut cmd = Command::new("rundll32");
            cmd.arg("url.dll,FileProtocolHandler");
            cmd
        }
        "macos" => Command::new("open"),
        other => return Err(DashError::UnsupportedPlatform(other.to_string())),
    };
    cmd.arg(url);
    Ok(cmd)
}

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let mut child = launch_command(self.os, url)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(DashError::BrowserLaunch)?;

        debug!(url, pid = child.id(), "launched browser");
        // Reap the handler so it doesn't linger as a zombie.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(cmd: &Command) -> (String, Vec<String>) {
        (
            cmd.get_program().to_string_lossy().into_owned(),
            cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect(),
        )
    }

    #[test]
    fn linux_uses_xdg_open() {
        let cmd = launch_command("linux", "https://example.com").unwrap();
        assert_eq!(argv(&cmd), ("xdg-open".into(), vec!["https://example.com".into()]));
    }

    #[test]
    fn windows_uses_url_dll() {
        let cmd = launch_command("windows", "https://example.com").unwrap();
        assert_eq!(
            argv(&cmd),
            (
                "rundll32".into(),
                vec![
                    "url.dll,FileProtocolHandler".into(),
                    "https://example.com".into()
                ]
            )
        );
    }

    #[test]
    fn macos_uses_open() {
        let cmd = launch_command("macos", "https://example.com").unwrap();
        assert_eq!(argv(&cmd).0, "open");
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let err = launch_command("plan9", "https://example.com").unwrap_err();
        assert!(matches!(err, DashError::UnsupportedPlatform(os) if os == "plan9"));
    }
}
