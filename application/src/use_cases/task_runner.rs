//! Task runner
//!
//! Serialises task submissions onto one worker. Queries are run strictly in
//! arrival order, one at a time, each with a fresh execution history.
//!
//! ```text
//! submit() ──▶ mpsc queue ──▶ worker ──▶ RunTaskUseCase ──▶ oneshot ──▶ PendingTask::wait()
//! ```

use crate::ports::model_backend::ModelBackend;
use crate::ports::progress::ProgressObserver;
use crate::ports::tool_invoker::ToolInvokerPort;
use crate::use_cases::run_task::{RunTaskUseCase, TaskReport};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Errors from the task runner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Task runner is shut down")]
    Closed,

    #[error("Task was dropped before it finished")]
    Dropped,
}

struct Submission {
    query: String,
    observer: Arc<dyn ProgressObserver>,
    reply: oneshot::Sender<TaskReport>,
}

/// Handle to a submitted task
pub struct PendingTask {
    rx: oneshot::Receiver<TaskReport>,
}

impl PendingTask {
    /// Wait for the task to reach a terminal outcome.
    pub async fn wait(self) -> Result<TaskReport, RunnerError> {
        self.rx.await.map_err(|_| RunnerError::Dropped)
    }
}

/// Single-consumer queue in front of a [`RunTaskUseCase`]
pub struct TaskRunner {
    tx: Option<mpsc::UnboundedSender<Submission>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskRunner {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn spawn<M, T>(use_case: RunTaskUseCase<M, T>) -> Self
    where
        M: ModelBackend + 'static,
        T: ToolInvokerPort + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Submission>();
        let worker = tokio::spawn(async move {
            while let Some(submission) = rx.recv().await {
                let report = use_case
                    .execute_with_progress(&submission.query, submission.observer.as_ref())
                    .await;
                if submission.reply.send(report).is_err() {
                    debug!("Task result discarded: submitter went away");
                }
            }
            debug!("Task runner queue closed");
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Queue a query. Tasks run in submission order.
    pub fn submit(
        &self,
        query: impl Into<String>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<PendingTask, RunnerError> {
        let tx = self.tx.as_ref().ok_or(RunnerError::Closed)?;
        let (reply, rx) = oneshot::channel();
        tx.send(Submission {
            query: query.into(),
            observer,
            reply,
        })
        .map_err(|_| RunnerError::Closed)?;
        Ok(PendingTask { rx })
    }

    /// Stop accepting work, let queued tasks finish, and join the worker.
    pub async fn shutdown(mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && let Err(e) = worker.await
        {
            warn!("Task runner worker ended abnormally: {}", e);
        }
    }
}
