//! Analyzers backed by an external command-line checker.

use async_trait::async_trait;
use critic_core::AnalyzeResult;
use critic_core::config::AnalyzersConfig;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::analyzer::Analyzer;
use crate::decoder::OutputDecoder;
use crate::kind::AnalyzerKind;

/// An analyzer that writes the file to disk and runs a checker against it.
#[derive(Clone, Debug)]
pub struct ToolAnalyzer {
    kind: AnalyzerKind,
    program: String,
    args: &'static [&'static str],
    decoder: OutputDecoder,
    timeout: Duration,
}

impl ToolAnalyzer {
    pub fn new(
        kind: AnalyzerKind,
        program: impl Into<String>,
        args: &'static [&'static str],
        decoder: OutputDecoder,
        timeout: Duration,
    ) -> Self {
        Self {
            kind,
            program: program.into(),
            args,
            decoder,
            timeout,
        }
    }

    /// `cppcheck --enable=all --xml <file>`
    pub fn cppcheck(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            AnalyzerKind::Cpp,
            program,
            &["--enable=all", "--xml"],
            OutputDecoder::CppcheckXml,
            timeout,
        )
    }

    /// `checkstyle -f plain <file>`
    pub fn checkstyle(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            AnalyzerKind::Java,
            program,
            &["-f", "plain"],
            OutputDecoder::ColonDelimited,
            timeout,
        )
    }

    /// `eslint --format json <file>`
    pub fn eslint(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            AnalyzerKind::JavaScript,
            program,
            &["--format", "json"],
            OutputDecoder::EslintJson,
            timeout,
        )
    }

    /// `flake8 --format=json <file>`
    pub fn flake8(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            AnalyzerKind::Python,
            program,
            &["--format=json"],
            OutputDecoder::Flake8Json,
            timeout,
        )
    }

    /// All tool-backed analyzers with paths and timeout from configuration.
    pub fn all_from_config(config: &AnalyzersConfig) -> Vec<Self> {
        let timeout = config.timeout();
        vec![
            Self::cppcheck(&config.cppcheck_path, timeout),
            Self::checkstyle(&config.checkstyle_path, timeout),
            Self::eslint(&config.eslint_path, timeout),
            Self::flake8(&config.flake8_path, timeout),
        ]
    }
}

#[async_trait]
impl Analyzer for ToolAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    #[instrument(skip(self, content), fields(kind = %self.kind, bytes = content.len()))]
    async fn analyze_file(&self, path: &str, content: &str) -> AnalyzeResult {
        if !self.kind.accepts(path) {
            return AnalyzeResult::with_summary(path, self.kind.mismatch_summary());
        }

        // Removed when `scratch` drops, on every return path below.
        let scratch = match write_scratch_file(path, content).await {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "failed to stage file for analysis");
                return AnalyzeResult::with_summary(
                    path,
                    format!("Error: failed to create temp file: {e}"),
                );
            }
        };

        let output = match run_tool(&self.program, self.args, scratch.path(), self.timeout).await
        {
            ToolOutcome::Completed { success, output } => {
                if output.trim().is_empty() {
                    debug!(success, "tool produced no output");
                    return AnalyzeResult::ok(path);
                }
                output
            }
            ToolOutcome::TimedOut => {
                warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "analysis timed out"
                );
                return AnalyzeResult::with_summary(
                    path,
                    format!("Analysis timed out after {}s", self.timeout.as_secs()),
                );
            }
            ToolOutcome::SpawnFailed(e) => {
                warn!(program = %self.program, error = %e, "failed to start analyzer tool");
                return AnalyzeResult::ok(path);
            }
        };

        let mut result = AnalyzeResult::ok(path);
        match self.decoder.decode(&output) {
            Ok(comments) => {
                for comment in comments {
                    result.push(comment.line, comment.comment);
                }
            }
            Err(e) => {
                debug!(
                    decoder = ?self.decoder,
                    error = %e,
                    "tool output not decodable, reporting clean"
                );
            }
        }
        result
    }
}

/// Write `content` to a uniquely named temporary file that keeps the
/// original file name as its suffix, so tools that dispatch on extension
/// still recognize it.
///
/// The returned handle owns the file and deletes it on drop.
async fn write_scratch_file(path: &str, content: &str) -> std::io::Result<NamedTempFile> {
    let basename = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("input");
    let suffix = format!("_{basename}");

    let file = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix("analyze_")
            .suffix(&suffix)
            .tempfile()
    })
    .await
    .map_err(std::io::Error::other)??;

    tokio::fs::write(file.path(), content).await?;
    Ok(file)
}

#[derive(Debug)]
enum ToolOutcome {
    Completed { success: bool, output: String },
    TimedOut,
    SpawnFailed(std::io::Error),
}

/// Run `program args.. target`, capturing stdout followed by stderr.
///
/// The child is killed if the timeout elapses.
async fn run_tool(
    program: &str,
    args: &[&str],
    target: &Path,
    timeout: Duration,
) -> ToolOutcome {
    let child = Command::new(program)
        .args(args)
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => return ToolOutcome::SpawnFailed(e),
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Err(_) => ToolOutcome::TimedOut,
        Ok(Err(e)) => ToolOutcome::SpawnFailed(e),
        Ok(Ok(out)) => {
            let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
            output.push_str(&String::from_utf8_lossy(&out.stderr));
            ToolOutcome::Completed {
                success: out.status.success(),
                output,
            }
        }
    }
}
