//! Scripted stand-in for the media tool, used by tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::tool::{ScreenshotRequest, ScreenshotTool};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy)]
pub enum Script {
    Succeed { delay_ms: u64 },
    Fail,
    Hang,
}

pub struct ScriptedTool {
    default: Script,
    scripts: HashMap<usize, Script>,
    pub calls: AtomicUsize,
    running: AtomicUsize,
    pub peak: AtomicUsize,
}

impl ScriptedTool {
    pub fn new(default: Script) -> Self {
        Self {
            default,
            scripts: HashMap::new(),
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Override the behavior for one catalog index
    pub fn with(mut self, index: usize, script: Script) -> Self {
        self.scripts.insert(index, script);
        self
    }
}

#[async_trait]
impl ScreenshotTool for ScriptedTool {
    async fn run(&self, request: &ScreenshotRequest) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&request.index)
            .copied()
            .unwrap_or(self.default);
        let result = match script {
            Script::Succeed { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(())
            }
            Script::Fail => Err(PipelineError::ExternalTool {
                video: request.video.clone(),
                reason: "scripted failure".to_string(),
            }),
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
