//! Control socket: server (during `bgu serve`) and client (`bgu start`, `bgu cancel`,
//! `bgu stop-all`).
//! Protocol: one line per command, "start <json>", "cancel <id>" or "stop-all";
//! one reply line per command, "ok ..." or "err ...".

use anyhow::{bail, Context, Result};
use bgu_core::job::JobSpec;
use bgu_core::Uploader;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

#[derive(Debug)]
pub enum ControlCommand {
    Start(Box<JobSpec>),
    Cancel(String),
    StopAll,
}

pub fn parse_command(line: &str) -> Result<ControlCommand, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match verb {
        "start" => serde_json::from_str::<JobSpec>(rest)
            .map(|spec| ControlCommand::Start(Box::new(spec)))
            .map_err(|e| format!("bad job: {}", e)),
        "cancel" if !rest.is_empty() => Ok(ControlCommand::Cancel(rest.to_string())),
        "cancel" => Err("cancel needs an id".to_string()),
        "stop-all" => Ok(ControlCommand::StopAll),
        _ => Err(format!("unknown command '{}'", verb)),
    }
}

/// Apply one command and produce its reply line.
pub fn execute(uploader: &Uploader, command: ControlCommand) -> String {
    match command {
        ControlCommand::Start(spec) => match uploader.start(*spec) {
            Ok(id) => format!("ok {}", id),
            Err(e) => format!("err {}", e),
        },
        ControlCommand::Cancel(id) => {
            if uploader.cancel(&id) {
                format!("ok cancelled {}", id)
            } else {
                format!("err no such job {}", id)
            }
        }
        ControlCommand::StopAll => {
            uploader.cancel_all();
            "ok".to_string()
        }
    }
}

/// Binds `path` (replacing a stale socket) and serves commands until the task is aborted.
pub fn spawn_control_listener(
    uploader: Uploader,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("bind control socket {}", path.display()))?;
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let uploader = uploader.clone();
                    tokio::spawn(async move {
                        let (read, mut write) = stream.into_split();
                        let mut lines = BufReader::new(read).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if line.trim().is_empty() {
                                continue;
                            }
                            let reply = match parse_command(&line) {
                                Ok(cmd) => execute(&uploader, cmd),
                                Err(e) => format!("err {}", e),
                            };
                            tracing::debug!(command = %line.trim(), %reply, "control command");
                            if write.write_all(format!("{}\n", reply).as_bytes()).await.is_err() {
                                break;
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends one command line and returns the reply. An `err` reply is an error.
pub async fn send_command(socket_path: &Path, line: &str) -> Result<String> {
    if !socket_path.exists() {
        bail!(
            "no control socket at {} (is `bgu serve` running?)",
            socket_path.display()
        );
    }
    let stream = UnixStream::connect(socket_path).await?;
    let (read, mut write) = stream.into_split();
    write.write_all(format!("{}\n", line).as_bytes()).await?;
    let reply = BufReader::new(read)
        .lines()
        .next_line()
        .await?
        .context("control socket closed without a reply")?;
    match reply.strip_prefix("err") {
        Some(msg) => bail!("{}", msg.trim()),
        None => Ok(reply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgu_core::config::UploaderConfig;
    use bgu_core::job::JobState;
    use bgu_core::network::{NetworkMonitor, NetworkResolver};
    use bgu_core::transport::CurlTransport;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn parse_commands() {
        match parse_command(r#"start {"url":"https://e.com/u","path":"/tmp/x"}"#).unwrap() {
            ControlCommand::Start(spec) => assert_eq!(spec.url.as_deref(), Some("https://e.com/u")),
            other => panic!("expected Start, got {:?}", other),
        }
        assert!(matches!(parse_command("cancel  j1 "), Ok(ControlCommand::Cancel(id)) if id == "j1"));
        assert!(matches!(parse_command("stop-all"), Ok(ControlCommand::StopAll)));
        assert!(parse_command("cancel").is_err());
        assert!(parse_command("start {not json").is_err());
        assert!(parse_command("pause 3").is_err());
    }

    /// No networks are visible, so started jobs stay deferred and never touch the wire.
    fn offline_uploader() -> Uploader {
        let cfg = UploaderConfig::default();
        let monitor = NetworkMonitor::new();
        let resolver = Arc::new(NetworkResolver::spawn(monitor.subscribe(), Duration::from_millis(10)));
        Uploader::builder(cfg, Arc::new(CurlTransport::default()), resolver).build()
    }

    #[tokio::test]
    async fn socket_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let sock = tmp.path().join("control.sock");
        let uploader = offline_uploader();
        let listener = spawn_control_listener(uploader.clone(), &sock).unwrap();

        let reply = send_command(
            &sock,
            r#"start {"id":"j1","url":"https://e.com/u","path":"/tmp/x"}"#,
        )
        .await
        .unwrap();
        assert_eq!(reply, "ok j1");
        assert!(uploader.status("j1").is_some_and(|s| s.state == JobState::Deferred
            || s.state == JobState::Queued));

        let err = send_command(&sock, r#"start {"id":"j2","path":"/tmp/x"}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("url"), "{}", err);

        assert_eq!(send_command(&sock, "cancel j1").await.unwrap(), "ok cancelled j1");
        assert!(uploader.status("j1").is_none());
        assert!(send_command(&sock, "cancel j1").await.is_err());
        assert_eq!(send_command(&sock, "stop-all").await.unwrap(), "ok");

        listener.abort();
    }

    #[tokio::test]
    async fn missing_socket_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = send_command(&tmp.path().join("none.sock"), "stop-all")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bgu serve"));
    }
}
