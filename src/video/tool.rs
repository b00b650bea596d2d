/// External media tool
///
/// The pipeline treats screenshot extraction as a black box: given a video
/// and a list of relative timestamps, produce one image per timestamp.
/// `FfmpegTool` is the real implementation; tests substitute their own.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Relative positions in the video, as fractions of its duration
pub const SCREENSHOT_TIMESTAMPS: [f64; 5] = [0.10, 0.30, 0.50, 0.70, 0.90];

/// Everything the tool needs for one video
#[derive(Debug, Clone)]
pub struct ScreenshotRequest {
    pub video: PathBuf,
    pub index: usize,
    pub output_folder: PathBuf,
    pub timestamps: Vec<f64>,
    pub height: u32,
}

impl ScreenshotRequest {
    /// Filenames follow the `<index>-<n>.png` pattern, `n` starting at 1
    pub fn file_names(&self) -> Vec<String> {
        (1..=self.timestamps.len())
            .map(|n| format!("{}-{}.png", self.index, n))
            .collect()
    }
}

#[async_trait]
pub trait ScreenshotTool: Send + Sync {
    /// Names of the images `run` will produce, in the order it produces them
    fn filenames(&self, request: &ScreenshotRequest) -> Vec<String> {
        request.file_names()
    }

    /// Produce every screenshot; returning is the end-of-task signal
    async fn run(&self, request: &ScreenshotRequest) -> Result<()>;
}

/// Screenshot extraction through the ffmpeg/ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTool {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Read the container duration in seconds
    async fn probe_duration(&self, video: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(video)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| tool_error(video, format!("could not start ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(tool_error(video, stderr_tail(&output.stderr)));
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| tool_error(video, "ffprobe reported no duration".to_string()))
    }

    /// Grab one frame at `seconds` into `target`
    async fn grab_frame(&self, video: &Path, seconds: f64, height: u32, target: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .arg("-ss")
            .arg(format!("{:.3}", seconds))
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1"])
            .arg("-vf")
            .arg(format!("scale=-2:{}", height))
            .arg(target)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| tool_error(video, format!("could not start ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(tool_error(video, stderr_tail(&output.stderr)));
        }
        Ok(())
    }
}

#[async_trait]
impl ScreenshotTool for FfmpegTool {
    async fn run(&self, request: &ScreenshotRequest) -> Result<()> {
        let duration = self.probe_duration(&request.video).await?;
        debug!(index = request.index, duration, "Probed video");

        for (name, fraction) in request.file_names().iter().zip(&request.timestamps) {
            let target = request.output_folder.join(name);
            self.grab_frame(&request.video, duration * fraction, request.height, &target)
                .await?;
        }
        Ok(())
    }
}

fn tool_error(video: &Path, reason: String) -> PipelineError {
    PipelineError::ExternalTool {
        video: video.to_path_buf(),
        reason,
    }
}

/// Parse ffprobe's bare duration output ("12.345000\n")
fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Last non-empty stderr line, which is where ffmpeg puts the actual error
fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("exited with an error")
        .to_string()
}
