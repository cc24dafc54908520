//! Helper-process transport

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use super::{HelperConfig, HelperTransport, TransportError};
use crate::protocol::{HelperReply, HelperRequest};

/// Runs the privileged helper once per request.
///
/// The request is written to the helper's stdin as a single JSON line and
/// stdin is closed; the helper answers on stdout and exits. Whatever the
/// helper logs on stderr is relayed into this process's tracing output.
///
/// On unix the helper leads its own process group. A helper that overruns
/// `timeout_secs` is killed together with everything it started, and the
/// call returns only after the group has released its pipes.
pub struct ProcessTransport {
    config: HelperConfig,
}

impl ProcessTransport {
    pub fn new(config: HelperConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.path);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

/// Kill the helper and every process in its group, then drain both pipes
/// until the last holder is gone.
async fn terminate(child: &mut Child, stdout: &mut ChildStdout, stderr: &mut ChildStderr) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: killpg has no memory-safety preconditions; the group id is
        // the pid of a child we spawned as group leader and have not reaped.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "Helper already gone");
    }

    let mut sink = Vec::new();
    let _ = stdout.read_to_end(&mut sink).await;
    let _ = stderr.read_to_end(&mut sink).await;
}

fn pipe_missing(name: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("helper {} was not captured", name),
    )
}

async fn write_request(stdin: &mut ChildStdin, payload: &[u8]) -> std::io::Result<()> {
    stdin.write_all(payload).await?;
    stdin.shutdown().await
}

#[async_trait]
impl HelperTransport for ProcessTransport {
    async fn call(&self, request: HelperRequest) -> Result<HelperReply, TransportError> {
        let mut payload = serde_json::to_vec(&request)?;
        payload.push(b'\n');

        tracing::debug!(
            helper = %self.config.path.display(),
            method = request.method(),
            request_id = %request.id,
            "Invoking privileged helper"
        );

        let mut child = self.command().spawn().map_err(|e| TransportError::Spawn {
            path: self.config.path.display().to_string(),
            reason: e.to_string(),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A helper that dies before reading is diagnosed by its exit status
            if let Err(e) = write_request(&mut stdin, &payload).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let mut stdout = child.stdout.take().ok_or_else(|| pipe_missing("stdout"))?;
        let mut stderr = child.stderr.take().ok_or_else(|| pipe_missing("stderr"))?;
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let finished = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), async {
            tokio::try_join!(
                child.wait(),
                stdout.read_to_end(&mut stdout_buf),
                stderr.read_to_end(&mut stderr_buf),
            )
        })
        .await;

        let status = match finished {
            Ok(result) => result?.0,
            Err(_) => {
                tracing::warn!(
                    helper = %self.config.path.display(),
                    request_id = %request.id,
                    timeout_secs = self.config.timeout_secs,
                    "Helper timed out, killing its process group"
                );
                terminate(&mut child, &mut stdout, &mut stderr).await;
                return Err(TransportError::Timeout(self.config.timeout_secs));
            }
        };

        let stderr = String::from_utf8_lossy(&stderr_buf);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "bdev_admin", "{}", line);
        }

        if !status.success() {
            return Err(TransportError::HelperExited {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let reply: HelperReply = serde_json::from_slice(&stdout_buf)?;
        if reply.id != request.id {
            return Err(TransportError::ReplyMismatch {
                expected: request.id.to_string(),
                got: reply.id.to_string(),
            });
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HelperCall;

    #[tokio::test]
    async fn test_missing_helper_is_spawn_error() {
        let transport = ProcessTransport::new(HelperConfig {
            path: "/nonexistent/bdev-admin".into(),
            ..Default::default()
        });

        let err = transport
            .call(HelperRequest::new(HelperCall::Scan))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_reported_with_stderr() {
        let transport = ProcessTransport::new(HelperConfig {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), "cat >/dev/null; echo 'permission denied' >&2; exit 3".into()],
            ..Default::default()
        });

        let err = transport
            .call(HelperRequest::new(HelperCall::Scan))
            .await
            .unwrap_err();
        match err {
            TransportError::HelperExited { stderr, .. } => {
                assert_eq!(stderr, "permission denied")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_garbage_output_is_codec_error() {
        let transport = ProcessTransport::new(HelperConfig {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), "cat >/dev/null; echo not-json".into()],
            ..Default::default()
        });

        let err = transport
            .call(HelperRequest::new(HelperCall::Scan))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Codec(_)), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_foreign_reply_id_is_rejected() {
        let reply = r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","outcome":{"status":"updated"}}"#;
        let transport = ProcessTransport::new(HelperConfig {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), format!("cat >/dev/null; echo '{}'", reply)],
            ..Default::default()
        });

        let err = transport
            .call(HelperRequest::new(HelperCall::Scan))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ReplyMismatch { .. }), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_helper_times_out() {
        let transport = ProcessTransport::new(HelperConfig {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), "sleep 5".into()],
            timeout_secs: 1,
        });

        let err = transport
            .call(HelperRequest::new(HelperCall::Scan))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(1)), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_helper_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!(
            "cat >/dev/null; sh -c 'sleep 2; echo flashing-still > {}'",
            marker.display()
        );
        let transport = ProcessTransport::new(HelperConfig {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), script],
            timeout_secs: 1,
        });

        let err = transport
            .call(HelperRequest::new(HelperCall::Scan))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(1)), "{err}");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "helper descendant outlived the timeout");
    }
}
