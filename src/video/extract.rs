use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};

use super::tool::{ScreenshotRequest, ScreenshotTool};
use crate::error::{PipelineError, Result};
use crate::state::store::SCREENSHOT_DIR_NAME;

/// Messages an extraction task sends back to the controller.
/// For one task, `FilenamesReady` always precedes `Finished`.
#[derive(Debug)]
pub enum TaskSignal {
    FilenamesReady {
        index: usize,
        screenshots: Vec<String>,
    },
    Finished {
        index: usize,
        outcome: Result<()>,
    },
}

/// Catalog-relative path of a generated screenshot ("/boris/3-1.png")
pub fn screenshot_path(file_name: &str) -> String {
    format!("/{}/{}", SCREENSHOT_DIR_NAME, file_name)
}

/// One media tool invocation for one catalog slot.
///
/// The task never touches the catalog itself: it reports its slot's
/// screenshot list and its outcome through `signals`, tagged with its index.
pub struct ExtractionTask {
    request: ScreenshotRequest,
    tool: Arc<dyn ScreenshotTool>,
    limiter: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
    signals: mpsc::UnboundedSender<TaskSignal>,
}

impl ExtractionTask {
    pub fn new(
        request: ScreenshotRequest,
        tool: Arc<dyn ScreenshotTool>,
        signals: mpsc::UnboundedSender<TaskSignal>,
    ) -> Self {
        Self {
            request,
            tool,
            limiter: None,
            timeout: None,
            signals,
        }
    }

    /// Share a concurrency limit with the other tasks of the batch
    pub fn with_limiter(mut self, limiter: Option<Arc<Semaphore>>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Give up on the tool after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Spawn onto the runtime inside the caller's span, so log lines keep its fields
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run().in_current_span())
    }

    pub async fn run(self) {
        let index = self.request.index;

        // Waits here while the batch is at its concurrency limit
        let _permit = match &self.limiter {
            Some(limiter) => match limiter.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    let outcome = Err(PipelineError::ExternalTool {
                        video: self.request.video.clone(),
                        reason: "extraction limiter closed".to_string(),
                    });
                    let _ = self.signals.send(TaskSignal::Finished { index, outcome });
                    return;
                }
            },
            None => None,
        };

        let screenshots = self
            .tool
            .filenames(&self.request)
            .iter()
            .map(|name| screenshot_path(name))
            .collect();
        // A closed channel means nobody is waiting on this batch any more
        let _ = self.signals.send(TaskSignal::FilenamesReady { index, screenshots });

        debug!(index, video = %self.request.video.display(), "Extracting screenshots");
        let outcome = self.invoke().await;
        if let Err(e) = &outcome {
            warn!(index, error = %e, "Extraction failed");
        }

        let _ = self.signals.send(TaskSignal::Finished { index, outcome });
    }

    async fn invoke(&self) -> Result<()> {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, self.tool.run(&self.request))
                .await
                .map_err(|_| PipelineError::Timeout {
                    video: self.request.video.clone(),
                    after,
                })?,
            None => self.tool.run(&self.request).await,
        }
    }
}
