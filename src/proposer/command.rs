//! Proposer backed by an external command
//!
//! The request is written as JSON to the command's stdin; whatever the
//! command prints on stdout is decoded as the proposal. A non-zero exit
//! status is a transport failure.
//!
//! Stdin is fed from a separate task while stdout and stderr are drained,
//! so a command that answers before it has read the whole request cannot
//! stall on a full pipe.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{FixProposer, FixRequest, ProposalError, parse_proposal};
use crate::domain::Module;

/// Runs `program args...` once per proposal
#[derive(Debug, Clone)]
pub struct CommandProposer {
    program: String,
    args: Vec<String>,
}

impl CommandProposer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a configured argv; `None` when the argv is empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

#[async_trait]
impl FixProposer for CommandProposer {
    async fn propose(&self, request: &FixRequest) -> Result<Module, ProposalError> {
        let payload =
            serde_json::to_vec(request).map_err(|e| ProposalError::Transport(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProposalError::Transport(format!("cannot run {}: {e}", self.program)))?;

        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                // Closing stdin signals the end of the request
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProposalError::Transport(e.to_string()))?;

        if !output.status.success() {
            writer.abort();
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProposalError::Transport(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        match writer.await {
            Ok(Ok(())) => {}
            // The command answered without reading the whole request
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::debug!(module = %request.module_name, "proposer closed stdin early");
            }
            Ok(Err(e)) => {
                return Err(ProposalError::Transport(format!("cannot write request: {e}")));
            }
            Err(e) => return Err(ProposalError::Transport(e.to_string())),
        }

        tracing::debug!(
            module = %request.module_name,
            bytes = output.stdout.len(),
            "received proposal"
        );
        parse_proposal(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request() -> FixRequest {
        FixRequest {
            module_name: "A".to_string(),
            issues: vec!["missing key_apis".to_string()],
            current: Module::new("A"),
            related: Vec::new(),
        }
    }

    fn shell(script: &str) -> CommandProposer {
        CommandProposer::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_command_proposal() {
        let proposer = shell(
            r#"cat > /dev/null; printf '```json\n{"module_name":"A","responsibilities":["r"],"key_apis":["k"],"data_inputs":[],"data_outputs":[],"depends_on":[],"target_path":"src/a.rs"}\n```\n'"#,
        );

        let module = proposer.propose(&request()).await.unwrap();
        assert_eq!(module.key_apis, vec!["k"]);
    }

    #[tokio::test]
    async fn test_command_receives_request_on_stdin() {
        // The echoed request is an object without the module fields
        let proposer = shell("cat");
        let err = proposer.propose(&request()).await.unwrap_err();
        assert!(matches!(err, ProposalError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_command_failure_is_transport_error() {
        let proposer = shell("cat > /dev/null; echo boom >&2; exit 3");
        let err = proposer.propose(&request()).await.unwrap_err();
        match err {
            ProposalError::Transport(message) => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_large_request_while_command_streams_output() {
        // Both the request and the answer overflow a pipe buffer, and the
        // command writes its answer before reading anything
        let proposer = shell(
            r#"printf '{"module_name":"A","responsibilities":["'
head -c 100000 /dev/zero | tr '\0' x
printf '"],"key_apis":["k"],"data_inputs":[],"data_outputs":[],"depends_on":[],"target_path":"src/a.rs"}'
cat > /dev/null"#,
        );
        let mut request = request();
        request.issues = vec!["x".repeat(200_000)];

        let module = proposer.propose(&request).await.unwrap();
        assert_eq!(module.responsibilities[0].len(), 100_000);
    }

    #[tokio::test]
    async fn test_early_exit_reports_status_and_stderr() {
        let proposer = shell("echo 'model unavailable' >&2; exit 3");
        let mut request = request();
        request.issues = vec!["x".repeat(200_000)];

        match proposer.propose(&request).await.unwrap_err() {
            ProposalError::Transport(message) => {
                assert!(message.contains("model unavailable"), "{message}");
                assert!(!message.contains("cannot write request"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let proposer = CommandProposer::new("archfix-no-such-program", Vec::new());
        assert!(matches!(
            proposer.propose(&request()).await,
            Err(ProposalError::Transport(_))
        ));
    }

    #[test]
    fn test_from_argv() {
        assert!(CommandProposer::from_argv(&[]).is_none());
        let proposer = CommandProposer::from_argv(&["fixer".to_string(), "--json".to_string()]).unwrap();
        assert_eq!(proposer.program, "fixer");
        assert_eq!(proposer.args, vec!["--json"]);
    }
}
