//! Interactive operator menu
//!
//! Reads one choice per line. Input and output are generic so the loop can
//! be driven from stdin/stdout by the binary and from byte buffers in tests.

use crate::error::Result;
use crate::runner::TaskRunner;
use crate::scheduler::Scheduler;
use crate::targets::TargetList;
use crate::types::UnitOutcome;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const MENU: &str = "\n\
PageSpeed Monitor\n\
  1) Run a cycle now\n\
  2) Add a target\n\
  3) List targets\n\
  4) Start automation\n\
  5) Exit\n\
> ";

/// One parsed menu choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    RunOnce,
    AddTarget,
    ListTargets,
    StartAutomation,
    Exit,
    Invalid(String),
}

impl MenuAction {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "1" | "run" => Self::RunOnce,
            "2" | "add" => Self::AddTarget,
            "3" | "list" => Self::ListTargets,
            "4" | "start" => Self::StartAutomation,
            "5" | "exit" | "quit" | "q" => Self::Exit,
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Menu over a runner, its target list and a scheduler
pub struct Menu {
    runner: Arc<TaskRunner>,
    targets: TargetList,
    scheduler: Scheduler,
}

impl Menu {
    pub fn new(runner: Arc<TaskRunner>, targets: TargetList, scheduler: Scheduler) -> Self {
        Self {
            runner,
            targets,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run until the operator exits or input ends
    ///
    /// Failed cycles and invalid input are reported and the loop continues;
    /// only I/O errors on the terminal end it early. Automation is stopped
    /// on the way out.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        loop {
            write(&mut output, MENU).await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match MenuAction::parse(&line) {
                MenuAction::RunOnce => self.run_once(&mut output).await?,
                MenuAction::AddTarget => {
                    write(&mut output, "URL: ").await?;
                    let Some(url) = lines.next_line().await? else {
                        break;
                    };
                    let message = match self.targets.add(&url).await {
                        Ok(url) => format!("Added {}\n", url),
                        Err(e) => format!("Not added: {}\n", e),
                    };
                    write(&mut output, &message).await?;
                }
                MenuAction::ListTargets => self.list_targets(&mut output).await?,
                MenuAction::StartAutomation => {
                    let message = if self.scheduler.is_running().await {
                        "Automation is already running\n".to_string()
                    } else {
                        self.scheduler.start().await;
                        format!(
                            "Automation started, every {}s\n",
                            self.scheduler.config().interval.as_secs()
                        )
                    };
                    write(&mut output, &message).await?;
                }
                MenuAction::Exit => break,
                MenuAction::Invalid(choice) => {
                    write(&mut output, &format!("Unknown choice '{}'\n", choice)).await?;
                }
            }
        }

        self.scheduler.stop().await;
        write(&mut output, "Bye\n").await?;
        Ok(())
    }

    async fn run_once<W: AsyncWrite + Unpin>(&self, output: &mut W) -> Result<()> {
        if self.targets.is_empty().await {
            return write(output, "No targets configured\n").await;
        }

        let handle = self.runner.run_cycle(&self.targets).await;
        write(
            output,
            &format!(
                "Cycle {} dispatched ({} units)\n",
                handle.cycle_id(),
                handle.dispatched()
            ),
        )
        .await?;

        let summary = handle.wait().await;
        let mut message = format!(
            "Cycle finished: {} completed, {} failed\n",
            summary.completed, summary.failed
        );
        for report in &summary.failures {
            if let UnitOutcome::Failed(failure) = &report.outcome {
                message.push_str(&format!(
                    "  {} [{}] {}: {}\n",
                    report.target,
                    report.strategy.label(),
                    failure.stage,
                    failure.reason
                ));
            }
        }
        write(output, &message).await
    }

    async fn list_targets<W: AsyncWrite + Unpin>(&self, output: &mut W) -> Result<()> {
        let targets = self.targets.snapshot().await;
        if targets.is_empty() {
            return write(output, "No targets configured\n").await;
        }

        let mut message = String::new();
        for (i, url) in targets.iter().enumerate() {
            message.push_str(&format!("{:>3}. {}\n", i + 1, url));
        }
        write(output, &message).await
    }
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
