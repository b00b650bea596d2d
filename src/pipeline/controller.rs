use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::open::open_path;
use super::progress::{ProgressAggregator, Tally};
use crate::error::{PipelineError, Result};
use crate::state::data::{Catalog, PersistedRecord};
use crate::state::settings::Settings;
use crate::state::store::CatalogStore;
use crate::video::discovery::discover;
use crate::video::extract::{ExtractionTask, TaskSignal};
use crate::video::tool::{ScreenshotRequest, ScreenshotTool, SCREENSHOT_TIMESTAMPS};

/// Events delivered to the presentation layer during an import run.
///
/// Every run ends with exactly one terminal event: `Completed` or `Failed`.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Discovery finished; `total` extraction tasks are about to start
    Discovered { total: usize },
    /// One more video finished (see `ProgressAggregator` for the numbering)
    Progress { completed: usize, total: usize },
    /// A video's extraction failed; it stays in the catalog without screenshots
    ExtractionFailed {
        index: usize,
        file_name: String,
        error: Arc<PipelineError>,
    },
    /// The catalog was written; this is the final record
    Completed(PersistedRecord),
    /// Discovery or persistence failed; no record was written
    Failed(Arc<PipelineError>),
}

#[cfg(test)]
impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Completed(_) | PipelineEvent::Failed(_))
    }
}

/// Receiving end of one running import
pub struct ImportHandle {
    pub run_id: Uuid,
    events: mpsc::UnboundedReceiver<PipelineEvent>,
}

impl ImportHandle {
    /// Next event, or `None` once the run has ended
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// Drain every event until the run ends
    #[cfg(test)]
    pub async fn collect(mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }
}

/// Clears the controller's busy flag when a run is dropped
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Top-level coordinator behind the boundary operations.
///
/// Holds configuration and the current output folder. Each `start_import`
/// builds a fresh `ImportRun` that owns its catalog and counters, so no
/// state leaks from one run into the next. Only one run is active at a time.
pub struct PipelineController {
    settings: Settings,
    settings_path: Option<PathBuf>,
    tool: Arc<dyn ScreenshotTool>,
    output_dir: RwLock<Option<PathBuf>>,
    busy: Arc<AtomicBool>,
}

impl PipelineController {
    pub fn new(settings: Settings, tool: Arc<dyn ScreenshotTool>) -> Self {
        let output_dir = RwLock::new(settings.output_dir.clone());
        Self {
            settings,
            settings_path: None,
            tool,
            output_dir,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Remember the chosen output folder in this settings file
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output_dir
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn set_output_dir(&self, dir: &Path) {
        *self
            .output_dir
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(dir.to_path_buf());

        let Some(path) = self.settings_path.clone() else {
            return;
        };
        let mut settings = self.settings.clone();
        settings.output_dir = Some(dir.to_path_buf());
        let saved = tokio::task::spawn_blocking(move || settings.save(&path)).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Could not remember output folder"),
            Err(join) => warn!(error = %join, "Could not remember output folder"),
        }
    }

    /// Use `dir` as the output folder, creating its screenshot sub-folder
    pub async fn choose_output(&self, dir: PathBuf) -> Result<PathBuf> {
        CatalogStore::new(&dir).ensure_screenshot_dir().await?;
        info!(path = %dir.display(), "Output folder chosen");
        self.set_output_dir(&dir).await;
        Ok(dir)
    }

    /// Read a saved catalog without scanning or extracting anything.
    /// The folder holding the catalog becomes the output folder.
    pub async fn reload(&self, path: &Path) -> Result<PersistedRecord> {
        let record = CatalogStore::load(path).await?;
        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        let folder = if is_dir { Some(path) } else { path.parent() };
        if let Some(folder) = folder {
            self.set_output_dir(folder).await;
        }
        Ok(record)
    }

    pub fn open_file(&self, path: &Path) -> Result<()> {
        open_path(path)
    }

    /// Start importing every video under `root`.
    ///
    /// Returns as soon as the run is spawned; progress and the final
    /// record arrive through the returned handle. Must be called from
    /// inside a tokio runtime. Fails with `ImportInProgress` while an
    /// earlier run is still going.
    pub fn start_import(&self, root: PathBuf) -> Result<ImportHandle> {
        let output_dir = self.output_dir().ok_or(PipelineError::NoOutputFolder)?;
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(root = %root.display(), "Import rejected, another run is active");
            return Err(PipelineError::ImportInProgress);
        }
        let guard = RunGuard(self.busy.clone());
        let run_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let run = ImportRun {
            _guard: guard,
            root,
            store: CatalogStore::new(output_dir),
            tool: self.tool.clone(),
            limiter: self
                .settings
                .concurrency_limit()
                .map(|permits| Arc::new(Semaphore::new(permits))),
            timeout: self.settings.extraction_timeout(),
            height: self.settings.thumbnail_height,
            events: tx,
        };
        let span = info_span!("import", run_id = %run_id);
        tokio::spawn(run.drive().instrument(span));

        Ok(ImportHandle { run_id, events: rx })
    }
}

/// State of a single import run, from discovery to the written record
struct ImportRun {
    // Dropped first, so the busy flag is clear before the event channel closes
    _guard: RunGuard,
    root: PathBuf,
    store: CatalogStore,
    tool: Arc<dyn ScreenshotTool>,
    limiter: Option<Arc<Semaphore>>,
    timeout: Option<std::time::Duration>,
    height: u32,
    events: mpsc::UnboundedSender<PipelineEvent>,
}

impl ImportRun {
    fn emit(&self, event: PipelineEvent) {
        // The receiver may have been dropped; the run still finishes and persists
        let _ = self.events.send(event);
    }

    fn fail(&self, error: PipelineError) {
        warn!(error = %error, "Import failed");
        self.emit(PipelineEvent::Failed(Arc::new(error)));
    }

    async fn drive(self) {
        info!(root = %self.root.display(), output = %self.store.output_dir().display(), "Import started");

        let root = self.root.clone();
        let span = Span::current();
        let discovered = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            discover(&root)
        })
        .await;
        let mut catalog = match discovered {
            Ok(Ok(catalog)) => catalog,
            Ok(Err(e)) => return self.fail(e),
            Err(join) => {
                let source = std::io::Error::new(std::io::ErrorKind::Other, join.to_string());
                return self.fail(PipelineError::io(&self.root, source));
            }
        };

        let screenshot_dir = match self.store.ensure_screenshot_dir().await {
            Ok(dir) => dir,
            Err(e) => return self.fail(e),
        };

        let mut aggregator = ProgressAggregator::new(catalog.len());
        self.emit(PipelineEvent::Discovered {
            total: aggregator.total(),
        });

        if aggregator.is_complete() {
            return self.finish(catalog).await;
        }

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        for entry in &catalog {
            let request = ScreenshotRequest {
                video: entry.source_path(&self.root),
                index: entry.index,
                output_folder: screenshot_dir.clone(),
                timestamps: SCREENSHOT_TIMESTAMPS.to_vec(),
                height: self.height,
            };
            ExtractionTask::new(request, self.tool.clone(), signal_tx.clone())
                .with_limiter(self.limiter.clone())
                .with_timeout(self.timeout)
                .spawn();
        }
        drop(signal_tx);
        info!(tasks = catalog.len(), "Extraction tasks launched");

        while let Some(signal) = signal_rx.recv().await {
            match signal {
                TaskSignal::FilenamesReady { index, screenshots } => {
                    if let Some(entry) = catalog.get_mut(index) {
                        entry.screenshots = screenshots;
                    }
                }
                TaskSignal::Finished { index, outcome } => {
                    if let Err(e) = outcome {
                        let file_name = match catalog.get_mut(index) {
                            Some(entry) => {
                                entry.screenshots.clear();
                                entry.file_name.clone()
                            }
                            None => String::new(),
                        };
                        self.emit(PipelineEvent::ExtractionFailed {
                            index,
                            file_name,
                            error: Arc::new(e),
                        });
                    }

                    match aggregator.record_completion() {
                        Tally::Progress { completed, total } => {
                            info!(completed, total, "Processed video");
                            self.emit(PipelineEvent::Progress { completed, total });
                        }
                        Tally::Complete => return self.finish(catalog).await,
                        Tally::AlreadyComplete => {
                            warn!(index, "Completion reported after the batch finished");
                        }
                    }
                }
            }
        }

        // Every task sender is gone but the count never closed out
        self.fail(PipelineError::ExternalTool {
            video: self.root.clone(),
            reason: "extraction tasks ended without reporting completion".to_string(),
        });
    }

    async fn finish(&self, catalog: Catalog) {
        let record = PersistedRecord {
            input_dir: self.root.clone(),
            output_dir: self.store.output_dir().to_path_buf(),
            images: catalog,
        };
        match self.store.persist(&record).await {
            Ok(_) => {
                info!(videos = record.images.len(), "Import complete");
                self.emit(PipelineEvent::Completed(record));
            }
            Err(e) => self.fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::state::store::{CATALOG_FILE_NAME, SCREENSHOT_DIR_NAME};
    use crate::video::fakes::{Script, ScriptedTool};
    use std::fs;
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    /// Shared in-memory sink for formatted log lines
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct Scratch {
        root: PathBuf,
        input: PathBuf,
        output: PathBuf,
    }

    impl Scratch {
        fn new(files: &[&str]) -> Self {
            let root = std::env::temp_dir().join(format!("video-hub-pipeline-{}", Uuid::new_v4()));
            let input = root.join("input");
            let output = root.join("output");
            fs::create_dir_all(&input).unwrap();
            fs::create_dir_all(&output).unwrap();
            for file in files {
                let path = input.join(file);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, b"").unwrap();
            }
            Self { root, input, output }
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    fn settings(limit: usize, timeout_secs: u64) -> Settings {
        Settings {
            max_concurrent_extractions: limit,
            extraction_timeout_secs: timeout_secs,
            ..Settings::default()
        }
    }

    fn completed_record(events: &[PipelineEvent]) -> &PersistedRecord {
        match events.last() {
            Some(PipelineEvent::Completed(record)) => record,
            other => panic!("expected Completed as last event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_import_two_videos_end_to_end() {
        let scratch = Scratch::new(&["a/movie_one.mp4", "b/clip.avi", "notes.txt"]);
        let tool = Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 1 }));
        let controller = PipelineController::new(settings(4, 0), tool.clone());
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.input.clone())
            .unwrap()
            .collect()
            .await;

        assert!(matches!(events[0], PipelineEvent::Discovered { total: 2 }));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

        let record = completed_record(&events);
        assert_eq!(record.input_dir, scratch.input);
        assert_eq!(record.output_dir, scratch.output);
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images[0].display_name, "movie one");
        assert_eq!(record.images[0].index, 0);
        assert_eq!(record.images[1].display_name, "clip");
        assert_eq!(record.images[1].index, 1);
        assert_eq!(record.images[1].screenshots[0], "/boris/1-1.png");
        assert!(record.images.iter().all(|e| e.screenshots.len() == 5));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);

        let on_disk = CatalogStore::load(&scratch.output.join(CATALOG_FILE_NAME))
            .await
            .unwrap();
        assert_eq!(&on_disk, record);
    }

    #[tokio::test]
    async fn test_reverse_completion_order_waits_for_every_task() {
        let files: Vec<String> = (0..8).map(|i| format!("v{}.mp4", i)).collect();
        let names: Vec<&str> = files.iter().map(String::as_str).collect();
        let scratch = Scratch::new(&names);

        // Lower indices take longer, so tasks finish in reverse order
        let mut tool = ScriptedTool::new(Script::Succeed { delay_ms: 0 });
        for i in 0..8 {
            tool = tool.with(i, Script::Succeed { delay_ms: (8 - i as u64) * 15 });
        }
        let controller = PipelineController::new(settings(0, 0), Arc::new(tool));
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.input.clone())
            .unwrap()
            .collect()
            .await;

        let progress: Vec<(usize, usize)> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Progress { completed, total } => Some((*completed, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(progress, (2..=8).map(|c| (c, 8)).collect::<Vec<_>>());

        let record = completed_record(&events);
        assert!(record.images.iter().all(|e| e.screenshots.len() == 5));
    }

    #[tokio::test]
    async fn test_failed_video_is_accounted_for() {
        let scratch = Scratch::new(&["a.mp4", "b.mp4", "c.mp4"]);
        let tool = ScriptedTool::new(Script::Succeed { delay_ms: 1 }).with(1, Script::Fail);
        let controller = PipelineController::new(settings(2, 0), Arc::new(tool));
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.input.clone())
            .unwrap()
            .collect()
            .await;

        let failures: Vec<&PipelineEvent> = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::ExtractionFailed { .. }))
            .collect();
        assert_eq!(failures.len(), 1);
        match failures[0] {
            PipelineEvent::ExtractionFailed { index, file_name, error } => {
                assert_eq!(*index, 1);
                assert_eq!(file_name, "b.mp4");
                assert_eq!(error.kind(), ErrorKind::ExternalTool);
            }
            _ => unreachable!(),
        }

        let record = completed_record(&events);
        assert_eq!(record.images.len(), 3);
        assert!(record.images[1].screenshots.is_empty());
        assert_eq!(record.images[0].screenshots.len(), 5);
        assert_eq!(record.images[2].screenshots.len(), 5);
    }

    #[tokio::test]
    async fn test_stalled_video_times_out_and_batch_completes() {
        let scratch = Scratch::new(&["fine.mp4", "stuck.mp4"]);
        let tool = ScriptedTool::new(Script::Succeed { delay_ms: 1 }).with(1, Script::Hang);
        let controller = PipelineController::new(settings(0, 1), Arc::new(tool));
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.input.clone())
            .unwrap()
            .collect()
            .await;

        assert!(events.iter().any(|e| matches!(
            e,
            PipelineEvent::ExtractionFailed { index: 1, error, .. }
                if matches!(**error, PipelineError::Timeout { .. })
        )));
        let record = completed_record(&events);
        assert!(record.images[1].screenshots.is_empty());
    }

    #[tokio::test]
    async fn test_empty_folder_completes_immediately() {
        let scratch = Scratch::new(&["readme.txt"]);
        let tool = Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 }));
        let controller = PipelineController::new(settings(4, 0), tool.clone());
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.input.clone())
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(completed_record(&events).images.is_empty());
        assert!(scratch.output.join(CATALOG_FILE_NAME).exists());
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discovery_failure_is_terminal() {
        let scratch = Scratch::new(&[]);
        let controller = PipelineController::new(
            settings(4, 0),
            Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 })),
        );
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.root.join("missing"))
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            PipelineEvent::Failed(error) => assert_eq!(error.kind(), ErrorKind::Io),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(!scratch.output.join(CATALOG_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_import_requires_output_folder() {
        let controller = PipelineController::new(
            settings(4, 0),
            Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 })),
        );
        let err = controller.start_import(PathBuf::from("/videos")).err().unwrap();
        assert!(matches!(err, PipelineError::NoOutputFolder));
    }

    #[tokio::test]
    async fn test_choose_output_creates_screenshot_folder() {
        let scratch = Scratch::new(&[]);
        let controller = PipelineController::new(
            settings(4, 0),
            Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 })),
        );
        assert!(!scratch.output.join(SCREENSHOT_DIR_NAME).exists());

        let chosen = controller.choose_output(scratch.output.clone()).await.unwrap();

        assert_eq!(chosen, scratch.output);
        assert!(scratch.output.join(SCREENSHOT_DIR_NAME).is_dir());
        assert_eq!(controller.output_dir(), Some(scratch.output.clone()));
    }

    #[tokio::test]
    async fn test_reload_skips_extraction() {
        let scratch = Scratch::new(&[]);
        let catalog_path = scratch.output.join(CATALOG_FILE_NAME);
        fs::write(
            &catalog_path,
            r#"{"inputDir":"/videos","outputDir":"/elsewhere","images":[
                ["/a","movie_one.mp4","movie one",["/boris/0-1.png","/boris/0-2.png"]],
                ["/b","clip.avi","clip"],
                ["","top.m4v","top",[]]
            ]}"#,
        )
        .unwrap();

        let tool = Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 }));
        let controller = PipelineController::new(settings(4, 0), tool.clone());

        let record = controller.reload(&catalog_path).await.unwrap();

        assert_eq!(record.images.len(), 3);
        assert_eq!(record.images[2].index, 2);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.output_dir(), Some(scratch.output.clone()));
    }

    #[tokio::test]
    async fn test_reload_remembers_folder_in_settings() {
        let scratch = Scratch::new(&[]);
        let settings_path = scratch.root.join("settings.json");
        let store = CatalogStore::new(&scratch.output);
        store
            .persist(&PersistedRecord {
                input_dir: scratch.input.clone(),
                output_dir: scratch.output.clone(),
                images: Vec::new(),
            })
            .await
            .unwrap();

        let controller = PipelineController::new(
            settings(4, 0),
            Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 })),
        )
        .with_settings_path(settings_path.clone());
        controller.reload(&scratch.output).await.unwrap();

        let saved = Settings::load(&settings_path).unwrap();
        assert_eq!(saved.output_dir, Some(scratch.output.clone()));
    }

    #[tokio::test]
    async fn test_choose_output_remembers_folder_in_settings() {
        let scratch = Scratch::new(&[]);
        let settings_path = scratch.root.join("config").join("settings.json");
        let controller = PipelineController::new(
            settings(4, 0),
            Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 })),
        )
        .with_settings_path(settings_path.clone());

        controller.choose_output(scratch.output.clone()).await.unwrap();

        let saved = Settings::load(&settings_path).unwrap();
        assert_eq!(saved.output_dir, Some(scratch.output.clone()));
        assert_eq!(saved.max_concurrent_extractions, 4);
    }

    #[tokio::test]
    async fn test_failure_log_carries_run_id() {
        let scratch = Scratch::new(&["a.mp4", "b.mp4"]);
        let tool = ScriptedTool::new(Script::Succeed { delay_ms: 0 }).with(1, Script::Fail);
        let controller = PipelineController::new(settings(2, 0), Arc::new(tool));
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let handle = controller.start_import(scratch.input.clone()).unwrap();
        let run_id = handle.run_id;
        let events = handle.collect().await;
        completed_record(&events);

        let output = logs.contents();
        let failure = output
            .lines()
            .find(|line| line.contains("Extraction failed"))
            .unwrap_or_else(|| panic!("no failure line in:\n{}", output));
        assert!(failure.contains(&format!("run_id={}", run_id)), "{}", failure);
        assert!(failure.contains("index=1"), "{}", failure);
    }

    #[tokio::test]
    async fn test_oversized_concurrency_limit_is_capped() {
        let scratch = Scratch::new(&["a.mp4", "b.mp4"]);
        let tool = Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 }));
        let controller = PipelineController::new(settings(usize::MAX, 0), tool.clone());
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let events = controller
            .start_import(scratch.input.clone())
            .unwrap()
            .collect()
            .await;

        assert_eq!(completed_record(&events).images.len(), 2);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_import_rejected_while_first_runs() {
        let scratch = Scratch::new(&["stuck.mp4"]);
        let tool = ScriptedTool::new(Script::Hang);
        let controller = PipelineController::new(settings(0, 0), Arc::new(tool));
        controller.choose_output(scratch.output.clone()).await.unwrap();

        let first = controller.start_import(scratch.input.clone()).unwrap();
        let err = controller.start_import(scratch.input.clone()).err().unwrap();
        assert!(matches!(err, PipelineError::ImportInProgress));
        assert_eq!(err.kind(), ErrorKind::Config);
        drop(first);
    }

    #[tokio::test]
    async fn test_import_allowed_again_after_completion() {
        let scratch = Scratch::new(&["a.mp4"]);
        let tool = Arc::new(ScriptedTool::new(Script::Succeed { delay_ms: 0 }));
        let controller = PipelineController::new(settings(4, 0), tool.clone());
        controller.choose_output(scratch.output.clone()).await.unwrap();

        for _ in 0..2 {
            let events = controller
                .start_import(scratch.input.clone())
                .unwrap()
                .collect()
                .await;
            assert_eq!(completed_record(&events).images.len(), 1);
        }
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    }
}
