//! Periodic background job infrastructure.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A periodic background job.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Time between executions.
    fn period(&self) -> Duration;

    /// Run one execution. Errors are logged by the runner; they never stop
    /// the schedule.
    async fn run(&self) -> Result<(), String>;
}

/// Runs registered jobs on their own periods until shutdown.
pub struct JobRunner {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobRunner {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawn one task per registered job.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "starting background jobs");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_rx.clone();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let mut ticker = tokio::time::interval(job.period());
                // The first tick completes immediately; skip it so the job
                // first runs one full period after startup.
                ticker.tick().await;

                debug!(job = name, period_secs = job.period().as_secs(), "job scheduled");

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let started = std::time::Instant::now();
                            match job.run().await {
                                Ok(()) => debug!(
                                    job = name,
                                    elapsed_ms = started.elapsed().as_millis() as u64,
                                    "job run finished"
                                ),
                                Err(e) => error!(
                                    job = name,
                                    elapsed_ms = started.elapsed().as_millis() as u64,
                                    error = %e,
                                    "job run failed"
                                ),
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!(job = name, "job shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Signal all jobs to stop. Returns immediately.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all job tasks to finish, up to a timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let drain = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "job task panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(()) => info!("all background jobs stopped"),
            Err(_) => warn!(timeout_secs = timeout.as_secs(), "job shutdown timed out"),
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
