//! Long-polling task dispatcher.
//!
//! The processor:
//! 1. Long-polls `fetchAndLock` for each registered handler's topics
//! 2. Spawns every locked task on its handler, bounded per handler
//! 3. Logs handler failures and leaves those tasks locked for redelivery
//! 4. Drains in-flight tasks on shutdown

use crate::client::ExternalTaskApi;
use crate::error::{EngineError, HandlerError};
use crate::task::{CompleteRequest, FetchAndLockRequest, FetchTopic, LockedTask};
use crate::variable::{Variable, VariableBag};
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Handles tasks for one or more topics.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Processes a locked task. Completing the task is the handler's job.
    async fn handle(&self, ctx: TaskContext) -> Result<(), HandlerError>;
}

/// A locked task together with the capability to complete it.
#[derive(Clone)]
pub struct TaskContext {
    task: LockedTask,
    worker_id: String,
    api: Arc<dyn ExternalTaskApi>,
}

impl TaskContext {
    /// Creates a context for a task locked by `worker_id`.
    #[must_use]
    pub fn new(task: LockedTask, worker_id: impl Into<String>, api: Arc<dyn ExternalTaskApi>) -> Self {
        Self {
            task,
            worker_id: worker_id.into(),
            api,
        }
    }

    /// The locked task.
    #[must_use]
    pub fn task(&self) -> &LockedTask {
        &self.task
    }

    /// Looks up one of the task's variables.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.task.variables.get(name)
    }

    /// Returns a copy of the task's variables for the handler to extend.
    #[must_use]
    pub fn variables(&self) -> VariableBag {
        self.task.variables.clone()
    }

    /// Completes the task with the given variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the completion.
    pub async fn complete(&self, variables: VariableBag) -> Result<(), Report<EngineError>> {
        let request = CompleteRequest {
            worker_id: self.worker_id.clone(),
            variables,
            local_variables: None,
        };
        self.api.complete(&self.task.id, &request).await
    }
}

/// Tuning for the processor.
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub worker_id: String,
    pub lock_duration: Duration,
    /// Tasks fetched per poll.
    pub max_tasks: u32,
    /// Concurrent executions allowed per handler.
    pub max_parallel_tasks_per_handler: usize,
    /// How long the engine may hold a fetch open.
    pub async_response_timeout: Duration,
    /// Wait after a failed fetch before polling again.
    pub poll_backoff: Duration,
    pub use_priority: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            worker_id: "GreenHouseHandler".to_string(),
            lock_duration: Duration::from_secs(20),
            max_tasks: 10,
            max_parallel_tasks_per_handler: 100,
            async_response_timeout: Duration::from_secs(5),
            poll_backoff: Duration::from_secs(5),
            use_priority: true,
        }
    }
}

struct Registration {
    topics: Vec<String>,
    handler: Arc<dyn TaskHandler>,
    permits: Arc<Semaphore>,
}

/// Dispatches locked tasks to registered handlers.
pub struct Processor {
    api: Arc<dyn ExternalTaskApi>,
    options: ProcessorOptions,
    registrations: Vec<Arc<Registration>>,
}

impl Processor {
    /// Creates a processor with no handlers.
    #[must_use]
    pub fn new(api: Arc<dyn ExternalTaskApi>, options: ProcessorOptions) -> Self {
        Self {
            api,
            options,
            registrations: Vec::new(),
        }
    }

    /// Registers a handler for the given topics.
    pub fn add_handler<I, S>(&mut self, topics: I, handler: Arc<dyn TaskHandler>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        info!(?topics, "registered handler");
        self.registrations.push(Arc::new(Registration {
            topics,
            handler,
            permits: Arc::new(Semaphore::new(self.options.max_parallel_tasks_per_handler)),
        }));
    }

    /// Every registered topic, in registration order.
    #[must_use]
    pub fn topics(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .flat_map(|r| r.topics.iter().map(String::as_str))
            .collect()
    }

    /// Polls until `shutdown` turns true, then waits for in-flight tasks.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        let processor = Arc::new(self);
        let loops = processor.registrations.iter().map(|registration| {
            let processor = Arc::clone(&processor);
            let registration = Arc::clone(registration);
            let shutdown = shutdown.clone();
            async move { processor.poll_loop(registration, shutdown).await }
        });

        futures::future::join_all(loops).await;
        info!("processor stopped");
    }

    async fn poll_loop(&self, registration: Arc<Registration>, mut shutdown: watch::Receiver<bool>) {
        let mut in_flight = JoinSet::new();

        while !*shutdown.borrow() {
            let failed = tokio::select! {
                changed = shutdown.changed() => match changed {
                    Ok(()) => continue,
                    Err(_) => break,
                },
                result = self.poll_once(&registration, &mut in_flight) => match result {
                    Ok(_) => false,
                    Err(e) => {
                        warn!(topics = ?registration.topics, error = %e, "fetch and lock failed");
                        true
                    }
                },
            };

            while let Some(finished) = in_flight.try_join_next() {
                log_join(finished);
            }

            if failed {
                tokio::select! {
                    _ = shutdown.changed() => {}
                    () = tokio::time::sleep(self.options.poll_backoff) => {}
                }
            } else {
                tokio::task::yield_now().await;
            }
        }

        if !in_flight.is_empty() {
            info!(count = in_flight.len(), "waiting for in-flight tasks");
        }
        while let Some(finished) = in_flight.join_next().await {
            log_join(finished);
        }
    }

    fn fetch_request(&self, registration: &Registration) -> FetchAndLockRequest {
        let lock_duration = self.options.lock_duration.as_millis() as u64;
        FetchAndLockRequest {
            worker_id: self.options.worker_id.clone(),
            max_tasks: self.options.max_tasks,
            use_priority: self.options.use_priority,
            async_response_timeout: Some(self.options.async_response_timeout.as_millis() as u64),
            topics: registration
                .topics
                .iter()
                .map(|topic_name| FetchTopic {
                    topic_name: topic_name.clone(),
                    lock_duration,
                })
                .collect(),
        }
    }

    /// Runs one fetch for a registration and spawns whatever comes back.
    async fn poll_once(
        &self,
        registration: &Registration,
        in_flight: &mut JoinSet<()>,
    ) -> Result<usize, Report<EngineError>> {
        let tasks = self
            .api
            .fetch_and_lock(&self.fetch_request(registration))
            .await?;
        let count = tasks.len();

        for task in tasks {
            let Ok(permit) = Arc::clone(&registration.permits).acquire_owned().await else {
                break;
            };
            let handler = Arc::clone(&registration.handler);
            let ctx = TaskContext::new(task, self.options.worker_id.clone(), Arc::clone(&self.api));

            in_flight.spawn(async move {
                let _permit = permit;
                let task_id = ctx.task().id.clone();
                let topic = ctx.task().topic_name.clone();

                match handler.handle(ctx).await {
                    Ok(()) => debug!(%task_id, %topic, "task handled"),
                    Err(e) => error!(%task_id, %topic, error = %e, "handler failed, task left locked"),
                }
            });
        }

        Ok(count)
    }
}

/// Handler errors are logged inside the task; only panics surface here.
fn log_join(finished: Result<(), JoinError>) {
    if let Err(e) = finished {
        error!(error = %e, "handler task panicked");
    }
}
