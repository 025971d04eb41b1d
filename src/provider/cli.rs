// src/provider/cli.rs — Subprocess backends (copilot, codex, gemini CLIs)
//
// Each call runs in a fresh temporary directory so the agent cannot read
// unrelated files from the working tree.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{CallFailure, ModelBackend, ModelConfig};

/// Prepended to every prompt sent to an agentic CLI.
const SYSTEM_NOTE: &str = "Provide a direct final answer only. Do not list options. \
                           Do not claim to edit files; you are in a read-only sandbox.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliKind {
    Copilot,
    Codex,
    Gemini,
}

impl CliKind {
    pub fn binary(&self) -> &'static str {
        match self {
            CliKind::Copilot => "copilot",
            CliKind::Codex => "codex",
            CliKind::Gemini => "gemini",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            CliKind::Copilot => "Copilot CLI",
            CliKind::Codex => "Codex CLI",
            CliKind::Gemini => "Gemini CLI",
        }
    }

    fn install_hint(&self) -> &'static str {
        match self {
            CliKind::Copilot => "Install with: npm install -g @github/copilot",
            CliKind::Codex => "Install Codex CLI and sign in with ChatGPT",
            CliKind::Gemini => "Install with: npm install -g @google/gemini-cli",
        }
    }

    /// Arguments (after the binary) for one prompt.
    pub fn args(&self, prompt: &str, model: &str) -> Vec<String> {
        let full_prompt = format!("{}\n\n{}", SYSTEM_NOTE, prompt);
        match self {
            CliKind::Copilot => vec![
                "-p".into(),
                full_prompt,
                "--model".into(),
                model.into(),
                "--silent".into(),
                "--allow-all-tools".into(),
                "--deny-tool".into(),
                "write".into(),
            ],
            CliKind::Codex => vec![
                "exec".into(),
                "--sandbox".into(),
                "read-only".into(),
                "--model".into(),
                model.into(),
                full_prompt,
            ],
            CliKind::Gemini => vec![
                "--model".into(),
                model.into(),
                "--prompt".into(),
                full_prompt,
            ],
        }
    }
}

pub struct CliBackend {
    kind: CliKind,
}

impl CliBackend {
    pub fn new(kind: CliKind) -> Self {
        Self { kind }
    }
}

/// Map a finished process to the call result.
fn interpret_output(
    kind: CliKind,
    status: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<String, CallFailure> {
    let stdout = stdout.trim();
    let stderr = stderr.trim();

    if status != Some(0) {
        let rc = status.map(|c| c.to_string()).unwrap_or_else(|| "signal".into());
        let detail = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            "Unknown error"
        };
        return Err(CallFailure::new(format!(
            "{} failed (rc={}): {}",
            kind.display_name(),
            rc,
            detail
        ))
        .with("returncode", rc)
        .with("stderr", stderr)
        .with("stdout", stdout));
    }

    if stdout.is_empty() {
        return Err(CallFailure::new(format!(
            "{} returned no output",
            kind.display_name()
        ))
        .with("stderr", stderr));
    }

    Ok(stdout.to_string())
}

#[async_trait]
impl ModelBackend for CliBackend {
    fn id(&self) -> &str {
        self.kind.binary()
    }

    async fn call(&self, prompt: &str, config: &ModelConfig) -> Result<String, CallFailure> {
        let workdir = tempfile::tempdir().map_err(|e| {
            CallFailure::new(format!(
                "{} error: cannot create sandbox dir",
                self.kind.display_name()
            ))
            .with("error", e)
        })?;

        let mut cmd = Command::new(self.kind.binary());
        cmd.args(self.kind.args(prompt, &config.model_name))
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            backend = self.kind.binary(),
            model = %config.model_name,
            "Spawning CLI in {:?}",
            workdir.path()
        );

        let output = match tokio::time::timeout(config.timeout, cmd.output()).await {
            Err(_) => return Err(CallFailure::timeout(self.kind.display_name(), config.timeout)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(
                    CallFailure::new(format!("{} not found", self.kind.display_name()))
                        .with("hint", self.kind.install_hint()),
                );
            }
            Ok(Err(e)) => {
                return Err(
                    CallFailure::new(format!("{} error", self.kind.display_name()))
                        .with("error", e),
                );
            }
            Ok(Ok(output)) => output,
        };

        interpret_output(
            self.kind,
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }

    async fn is_available(&self, _config: &ModelConfig) -> bool {
        if which::which(self.kind.binary()).is_err() {
            return false;
        }
        let version_check = Command::new(self.kind.binary())
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();
        matches!(
            tokio::time::timeout(Duration::from_secs(10), version_check).await,
            Ok(Ok(status)) if status.success()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── args ───────────────────────────────────────────────────

    #[test]
    fn test_codex_args_read_only() {
        let args = CliKind::Codex.args("write a parser", "gpt-5");
        assert_eq!(&args[..5], ["exec", "--sandbox", "read-only", "--model", "gpt-5"]);
        assert!(args[5].starts_with("Provide a direct final answer only."));
        assert!(args[5].ends_with("write a parser"));
    }

    #[test]
    fn test_gemini_args() {
        let args = CliKind::Gemini.args("p", "gemini-2.5-pro");
        assert_eq!(args[0], "--model");
        assert_eq!(args[1], "gemini-2.5-pro");
        assert_eq!(args[2], "--prompt");
    }

    #[test]
    fn test_copilot_denies_writes() {
        let args = CliKind::Copilot.args("p", "claude-sonnet-4");
        let deny = args.iter().position(|a| a == "--deny-tool").unwrap();
        assert_eq!(args[deny + 1], "write");
    }

    // ─── interpret_output ───────────────────────────────────────

    #[test]
    fn test_interpret_success_trims() {
        let out = interpret_output(CliKind::Codex, Some(0), "  def f(): pass\n", "").unwrap();
        assert_eq!(out, "def f(): pass");
    }

    #[test]
    fn test_interpret_nonzero_prefers_stderr() {
        let err = interpret_output(CliKind::Gemini, Some(2), "partial", "auth required").unwrap_err();
        assert_eq!(err.message, "Gemini CLI failed (rc=2): auth required");
        assert_eq!(err.context.get("returncode").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_interpret_nonzero_without_output() {
        let err = interpret_output(CliKind::Copilot, None, "", "").unwrap_err();
        assert_eq!(err.message, "Copilot CLI failed (rc=signal): Unknown error");
    }

    #[test]
    fn test_interpret_empty_stdout_is_failure() {
        let err = interpret_output(CliKind::Codex, Some(0), "   ", "").unwrap_err();
        assert_eq!(err.message, "Codex CLI returned no output");
    }

    // ─── process ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_missing_binary_unavailable() {
        let backend = CliBackend::new(CliKind::Gemini);
        let config = ModelConfig::new(crate::provider::ProviderKind::Gemini, "x");
        if which::which("gemini").is_err() {
            assert!(!backend.is_available(&config).await);
            let err = backend.call("hi", &config).await.unwrap_err();
            assert_eq!(err.message, "Gemini CLI not found");
        }
    }
}
