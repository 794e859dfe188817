use boardwatch_core::AnalysisConfig;
use feed_client::Notifier;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to start analysis program {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for analysis program: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Analysis exited with status {code:?}")]
    Exit { code: Option<i32> },
}

pub type AnalysisOutcome = Result<(), AnalysisError>;

/// Runs the downstream analysis script on a written checkpoint.
#[derive(Clone)]
pub struct AnalysisLauncher {
    program: String,
    script: PathBuf,
    notifier: Arc<dyn Notifier>,
}

impl AnalysisLauncher {
    pub fn new(config: &AnalysisConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            program: config.program.clone(),
            script: config.script.clone(),
            notifier,
        }
    }

    /// Start `<program> <script> <path> [post]` and return at once. The
    /// outcome arrives on the returned channel; failures are also sent to
    /// the notifier.
    pub fn launch(&self, path: &Path, publish: bool) -> oneshot::Receiver<AnalysisOutcome> {
        let (tx, rx) = oneshot::channel();

        let mut command = Command::new(&self.program);
        command
            .arg(&self.script)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if publish {
            command.arg("post");
        }

        let notifier = Arc::clone(&self.notifier);
        let label = path.display().to_string();

        let child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = AnalysisError::Spawn {
                    program: self.program.clone(),
                    source,
                };
                error!(path = %label, "{}", err);
                let text = format!("Analysis for {} failed: {}", label, err);
                tokio::spawn(async move {
                    if let Err(e) = notifier.notify(&text).await {
                        warn!("Failed to deliver notification: {}", e);
                    }
                    let _ = tx.send(Err(err));
                });
                return rx;
            }
        };

        info!(path = %label, publish, "Analysis started");
        tokio::spawn(async move {
            let outcome = match child.wait_with_output().await {
                Ok(output) => {
                    for line in String::from_utf8_lossy(&output.stdout).lines() {
                        info!(target: "analysis", "{}", line);
                    }
                    for line in String::from_utf8_lossy(&output.stderr).lines() {
                        warn!(target: "analysis", "{}", line);
                    }
                    if output.status.success() {
                        Ok(())
                    } else {
                        Err(AnalysisError::Exit {
                            code: output.status.code(),
                        })
                    }
                }
                Err(e) => Err(AnalysisError::Wait(e)),
            };

            match &outcome {
                Ok(()) => info!(path = %label, "Analysis finished"),
                Err(e) => {
                    error!(path = %label, "{}", e);
                    let text = format!("Analysis for {} failed: {}", label, e);
                    if let Err(e) = notifier.notify(&text).await {
                        warn!("Failed to deliver notification: {}", e);
                    }
                }
            }

            // the receiver may have been dropped; nobody is waiting then
            let _ = tx.send(outcome);
        });

        rx
    }
}
