//! 定时任务调度器
//!
//! 每个注册的 job 在 [`BackgroundTasks`] 上占用一个后台任务：
//! 按 [`Schedule`] 睡眠 → 触发 → 再次计算下一次触发时间。
//!
//! - 同一个 job 任何时刻最多只有一次执行在进行；上一次未结束时到来的 tick
//!   直接跳过 (计入 `skipped`)，不排队。
//! - job 返回错误只记录日志 (计入 `failures`)，下一个 tick 照常执行。
//! - shutdown 只停止调度循环；正在执行的那次会跑完。

pub mod schedule;

pub use schedule::Schedule;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::tasks::panic_message;
use crate::core::BackgroundTasks;
use crate::utils::{AppResult, Clock};

/// A unit of scheduled work
#[async_trait]
pub trait Job: Send + Sync {
    /// Execute once. `now` comes from the scheduler's clock.
    async fn run(&self, now: DateTime<Utc>) -> AppResult<()>;
}

/// Snapshot of a job's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    /// Executions started
    pub runs: u64,
    /// Ticks dropped because the previous run was still in flight
    pub skipped: u64,
    /// Executions that returned an error or panicked
    pub failures: u64,
}

#[derive(Debug, Default)]
struct JobCounters {
    running: AtomicBool,
    runs: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
}

/// Handle to a registered job, for inspection
#[derive(Debug, Clone)]
pub struct JobHandle {
    name: &'static str,
    counters: Arc<JobCounters>,
}

impl JobHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stats(&self) -> JobStats {
        JobStats {
            runs: self.counters.runs.load(Ordering::Acquire),
            skipped: self.counters.skipped.load(Ordering::Acquire),
            failures: self.counters.failures.load(Ordering::Acquire),
        }
    }

    /// Whether an execution is in flight right now
    pub fn is_running(&self) -> bool {
        self.counters.running.load(Ordering::Acquire)
    }
}

struct JobEntry {
    name: &'static str,
    schedule: Schedule,
    job: Arc<dyn Job>,
    counters: Arc<JobCounters>,
}

/// Named-job scheduler
pub struct JobScheduler {
    clock: Arc<dyn Clock>,
    tz: Tz,
    jobs: Vec<JobEntry>,
}

impl JobScheduler {
    pub fn new(clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self {
            clock,
            tz,
            jobs: Vec::new(),
        }
    }

    /// Register a job. Nothing runs until [`JobScheduler::start`].
    pub fn register(
        &mut self,
        name: &'static str,
        schedule: Schedule,
        job: Arc<dyn Job>,
    ) -> JobHandle {
        let counters = Arc::new(JobCounters::default());
        tracing::info!(job = %name, schedule = %schedule, "Job registered");
        self.jobs.push(JobEntry {
            name,
            schedule,
            job,
            counters: counters.clone(),
        });
        JobHandle { name, counters }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn one periodic task per job on `tasks`
    pub fn start(self, tasks: &mut BackgroundTasks) {
        for entry in self.jobs {
            let shutdown = tasks.shutdown_token();
            let runner = JobRunner {
                entry,
                clock: self.clock.clone(),
                tz: self.tz,
                shutdown,
            };
            tasks.spawn(runner.entry.name, runner.run());
        }
    }
}

struct JobRunner {
    entry: JobEntry,
    clock: Arc<dyn Clock>,
    tz: Tz,
    shutdown: CancellationToken,
}

impl JobRunner {
    async fn run(self) {
        let name = self.entry.name;
        tracing::info!(job = %name, "Job loop started");

        let mut in_flight: Option<JoinHandle<()>> = None;
        let mut last_fire: Option<DateTime<Utc>> = None;

        loop {
            let now = self.clock.now();
            let (fire_at, delay) = match self.entry.schedule.next_tick(now, last_fire, self.tz) {
                Ok(tick) => tick,
                Err(e) => {
                    tracing::error!(job = %name, error = %e, "Cannot compute next tick, job stopped");
                    break;
                }
            };
            tracing::debug!(job = %name, delay_ms = delay.as_millis() as u64, "Next tick scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!(job = %name, "Job loop received shutdown signal");
                    break;
                }
            }
            last_fire = Some(fire_at);

            let counters = &self.entry.counters;
            if counters.running.swap(true, Ordering::AcqRel) {
                counters.skipped.fetch_add(1, Ordering::AcqRel);
                tracing::warn!(job = %name, "Previous run still in progress, tick skipped");
                continue;
            }
            counters.runs.fetch_add(1, Ordering::AcqRel);

            in_flight = Some(tokio::spawn(execute(
                name,
                self.entry.job.clone(),
                counters.clone(),
                self.clock.now(),
            )));
        }

        // 正在执行的那次跑完再退出
        if let Some(handle) = in_flight
            && !handle.is_finished()
        {
            tracing::info!(job = %name, "Waiting for in-flight run to finish");
            let _ = handle.await;
        }
        tracing::info!(job = %name, "Job loop stopped");
    }
}

async fn execute(name: &'static str, job: Arc<dyn Job>, counters: Arc<JobCounters>, now: DateTime<Utc>) {
    let started = tokio::time::Instant::now();
    match AssertUnwindSafe(job.run(now)).catch_unwind().await {
        Ok(Ok(())) => {
            tracing::debug!(job = %name, elapsed_ms = started.elapsed().as_millis() as u64, "Job run finished");
        }
        Ok(Err(e)) => {
            counters.failures.fetch_add(1, Ordering::AcqRel);
            tracing::error!(job = %name, code = %e.code, error = %e, "Job run failed, will retry next tick");
        }
        Err(panic_info) => {
            counters.failures.fetch_add(1, Ordering::AcqRel);
            tracing::error!(job = %name, panic = %panic_message(panic_info.as_ref()), "Job run panicked");
        }
    }
    counters.running.store(false, Ordering::Release);
}
