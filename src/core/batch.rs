// batch.rs - Parallel per-unit processing and the external command executor

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Outcome of one independent work unit
#[derive(Debug)]
pub struct UnitOutcome<U, R, E> {
    pub unit: U,
    pub result: Result<R, E>,
}

/// Summary of a batch: successes and per-unit failures, in input order
#[derive(Debug)]
pub struct BatchReport<U, R, E> {
    pub outcomes: Vec<UnitOutcome<U, R, E>>,
}

impl<U, R, E> BatchReport<U, R, E> {
    pub fn succeeded(&self) -> impl Iterator<Item = (&U, &R)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (&o.unit, r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&U, &E)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.unit, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Run `work` over independent units on the rayon pool. Units share nothing mutable;
/// a failing unit is recorded and the rest of the batch continues.
pub fn process_units<U, R, E, F>(units: Vec<U>, label: &str, work: F) -> BatchReport<U, R, E>
where
    U: Send + Sync,
    R: Send,
    E: Send + std::fmt::Display,
    F: Fn(&U) -> Result<R, E> + Send + Sync,
{
    let total = units.len();
    let pb = progress_bar(total);
    let update_interval = std::cmp::max(1, total / 100);
    let completed = AtomicUsize::new(0);
    let start = Instant::now();

    let outcomes: Vec<UnitOutcome<U, R, E>> = units
        .into_par_iter()
        .map(|unit| {
            let result = work(&unit);
            let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if count % update_interval == 0 {
                pb.set_position(count as u64);
            }
            UnitOutcome { unit, result }
        })
        .collect();

    pb.finish_and_clear();
    let report = BatchReport { outcomes };
    let failures = report.failure_count();
    if failures > 0 {
        log::warn!("{}: {} of {} units failed", label, failures, total);
    }
    log::info!(
        "{}: {} units in {:.2}s",
        label,
        total,
        start.elapsed().as_secs_f64()
    );
    report
}

/// Result of one external command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

/// Runs independent shell-level commands to completion with a fixed concurrency degree
pub trait BatchExecutor: Send + Sync {
    fn run_all(&self, commands: &[String], jobs: usize) -> Vec<CommandOutcome>;
}

/// Executes each command with `bash -c` on a dedicated thread pool
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    pub shell: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
        }
    }
}

impl ShellExecutor {
    fn run_one(&self, command: &str) -> CommandOutcome {
        match Command::new(&self.shell).arg("-c").arg(command).output() {
            Ok(output) => CommandOutcome {
                command: command.to_string(),
                success: output.status.success(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => CommandOutcome {
                command: command.to_string(),
                success: false,
                exit_code: None,
                stderr: format!("failed to spawn {}: {}", self.shell, e),
            },
        }
    }
}

impl BatchExecutor for ShellExecutor {
    fn run_all(&self, commands: &[String], jobs: usize) -> Vec<CommandOutcome> {
        let run = || {
            let pb = progress_bar(commands.len());
            let outcomes: Vec<CommandOutcome> = commands
                .par_iter()
                .map(|command| {
                    let outcome = self.run_one(command);
                    if !outcome.success {
                        log::warn!("command failed ({:?}): {}", outcome.exit_code, command);
                    }
                    pb.inc(1);
                    outcome
                })
                .collect();
            pb.finish_and_clear();
            outcomes
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!("could not build a {}-thread pool ({}), using the global pool", jobs, e);
                run()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_units_keeps_order_and_failures() {
        let units: Vec<u32> = (0..20).collect();
        let report = process_units(units, "test", |n| {
            if n % 5 == 0 {
                Err(format!("unit {} failed", n))
            } else {
                Ok(n * 2)
            }
        });
        assert_eq!(report.len(), 20);
        assert_eq!(report.failure_count(), 4);
        assert_eq!(report.outcomes[3].unit, 3);
        assert_eq!(report.outcomes[3].result.as_ref().unwrap(), &6);
        let ok: Vec<u32> = report.succeeded().map(|(_, r)| *r).collect();
        assert_eq!(ok.len(), 16);
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_executor_reports_each_command() {
        let executor = ShellExecutor::default();
        let commands = vec![
            "true".to_string(),
            "echo oops >&2; exit 3".to_string(),
        ];
        let outcomes = executor.run_all(&commands, 2);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].exit_code, Some(3));
        assert!(outcomes[1].stderr.contains("oops"));
    }
}
