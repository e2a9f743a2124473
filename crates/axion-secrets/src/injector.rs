//! Process injector
//!
//! Spawns a child with secrets merged into its environment, inherits
//! stdio, forwards {SIGINT, SIGTERM, SIGHUP} while the child is alive,
//! and propagates the exit status. A signalled death maps to the
//! conventional `128 + signal` codes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::process::Command;
use tracing::debug;

use axion_core::error::{Error, Result};

/// Spawn options for [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Extra environment; wins over the parent environment on collisions.
    pub env: HashMap<String, String>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Run the command line through `sh -c`.
    pub shell: bool,
}

/// Exit code for a child that died from a signal.
const EXIT_SIGINT: i32 = 130;
const EXIT_SIGTERM: i32 = 143;
const EXIT_SIGHUP: i32 = 129;
const EXIT_OTHER_SIGNAL: i32 = 128;

/// Run a command to completion and return its exit code.
pub async fn run(command: &str, args: &[String], opts: RunOptions) -> Result<i32> {
    let mut cmd = if opts.shell {
        let mut line = command.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    } else {
        let mut cmd = Command::new(command);
        cmd.args(args);
        cmd
    };

    cmd.envs(&opts.env);
    if let Some(cwd) = &opts.cwd {
        cmd.current_dir(cwd);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::spawn_failed(command, e))?;
    debug!(command, pid = child.id(), "child spawned");

    let status = wait_forwarding_signals(&mut child).await?;
    Ok(exit_code(status))
}

#[cfg(unix)]
async fn wait_forwarding_signals(child: &mut tokio::process::Child) -> Result<ExitStatus> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let pid = child.id();

    // Streams drop when this returns, uninstalling the handlers.
    loop {
        tokio::select! {
            status = child.wait() => return Ok(status?),
            _ = sigint.recv() => forward(pid, libc::SIGINT),
            _ = sigterm.recv() => forward(pid, libc::SIGTERM),
            _ = sighup.recv() => forward(pid, libc::SIGHUP),
        }
    }
}

#[cfg(unix)]
fn forward(pid: Option<u32>, signal: i32) {
    if let Some(pid) = pid {
        debug!(pid, signal, "forwarding signal to child");
        unsafe {
            libc::kill(pid as libc::pid_t, signal);
        }
    }
}

#[cfg(not(unix))]
async fn wait_forwarding_signals(child: &mut tokio::process::Child) -> Result<ExitStatus> {
    Ok(child.wait().await?)
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        return match status.signal() {
            Some(libc::SIGINT) => EXIT_SIGINT,
            Some(libc::SIGTERM) => EXIT_SIGTERM,
            Some(libc::SIGHUP) => EXIT_SIGHUP,
            Some(_) | None => EXIT_OTHER_SIGNAL,
        };
    }

    #[cfg(not(unix))]
    EXIT_OTHER_SIGNAL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> (String, Vec<String>) {
        (
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
        )
    }

    #[tokio::test]
    async fn test_exit_code_propagated() {
        let (cmd, args) = shell("exit 42");
        let code = run(&cmd, &args, RunOptions::default()).await.unwrap();
        assert_eq!(code, 42);
    }

    #[tokio::test]
    async fn test_success_is_zero() {
        let (cmd, args) = shell("true");
        assert_eq!(run(&cmd, &args, RunOptions::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_injected_env_reaches_child() {
        let (cmd, args) = shell(r#"test "$INJECTED_X" = "Y""#);
        let opts = RunOptions {
            env: HashMap::from([("INJECTED_X".to_string(), "Y".to_string())]),
            ..Default::default()
        };
        assert_eq!(run(&cmd, &args, opts).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_injected_env_wins_over_parent() {
        std::env::set_var("INJECTOR_COLLIDING", "parent");
        let (cmd, args) = shell(r#"test "$INJECTOR_COLLIDING" = "child""#);
        let opts = RunOptions {
            env: HashMap::from([("INJECTOR_COLLIDING".to_string(), "child".to_string())]),
            ..Default::default()
        };
        let code = run(&cmd, &args, opts).await.unwrap();
        std::env::remove_var("INJECTOR_COLLIDING");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_parent_env_inherited() {
        std::env::set_var("INJECTOR_INHERITED", "present");
        let (cmd, args) = shell(r#"test "$INJECTOR_INHERITED" = "present""#);
        let code = run(&cmd, &args, RunOptions::default()).await.unwrap();
        std::env::remove_var("INJECTOR_INHERITED");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_cwd_applies() {
        let tmp = tempfile::TempDir::new().unwrap();
        let canonical = tmp.path().canonicalize().unwrap();
        let (cmd, args) = shell(&format!(r#"test "$(pwd)" = "{}""#, canonical.display()));
        let opts = RunOptions {
            cwd: Some(canonical),
            ..Default::default()
        };
        assert_eq!(run(&cmd, &args, opts).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let result = run(
            "definitely-not-a-real-binary-a7f3",
            &[],
            RunOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::SpawnFailed { command, .. })
            if command == "definitely-not-a-real-binary-a7f3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signalled_death_maps_to_128_plus_signal() {
        // The child terminates itself; the mapping is what's under test.
        let (cmd, args) = shell("kill -TERM $$");
        assert_eq!(run(&cmd, &args, RunOptions::default()).await.unwrap(), 143);

        let (cmd, args) = shell("kill -HUP $$");
        assert_eq!(run(&cmd, &args, RunOptions::default()).await.unwrap(), 129);

        let (cmd, args) = shell("kill -INT $$");
        assert_eq!(run(&cmd, &args, RunOptions::default()).await.unwrap(), 130);

        let (cmd, args) = shell("kill -USR1 $$");
        assert_eq!(run(&cmd, &args, RunOptions::default()).await.unwrap(), 128);
    }

    #[tokio::test]
    async fn test_shell_mode_joins_arguments() {
        let opts = RunOptions {
            shell: true,
            ..Default::default()
        };
        let code = run("exit", &["7".to_string()], opts).await.unwrap();
        assert_eq!(code, 7);
    }
}
