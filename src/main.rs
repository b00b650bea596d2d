use iced::futures::stream::{self, BoxStream, StreamExt};
use iced::widget::{button, column, container, image, progress_bar, row, scrollable, text, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod error;
mod logging;
mod pipeline;
mod state;
mod video;

use error::{ErrorKind, PipelineError};
use pipeline::{PipelineController, PipelineEvent};
use state::data::{CatalogEntry, PersistedRecord};
use state::settings::Settings;
use video::tool::FfmpegTool;

/// Main application state
struct VideoHub {
    /// Runs imports and owns the output folder
    controller: Arc<PipelineController>,
    /// Status message to display to the user
    status: String,
    /// Latest (completed, total) from the running import
    progress: Option<(usize, usize)>,
    /// Videos the media tool could not handle in the current run
    failures: usize,
    /// Catalog shown in the list (finished import or loaded file)
    record: Option<PersistedRecord>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Import Folder" button
    ImportFolder,
    /// User clicked the "Choose Output Folder" button
    ChooseOutput,
    /// User clicked the "Load Catalog" button
    LoadCatalog,
    /// Output folder is ready (screenshot sub-folder exists)
    OutputChosen(Result<PathBuf, Arc<PipelineError>>),
    /// A saved catalog was read
    CatalogLoaded(Result<PersistedRecord, Arc<PipelineError>>),
    /// Progress or result from the running import
    Pipeline(PipelineEvent),
    /// Open a video with the system player
    OpenFile(PathBuf),
}

impl VideoHub {
    /// Create a new instance of the application
    fn new(settings: Settings, settings_path: PathBuf) -> (Self, Task<Message>) {
        let tool = FfmpegTool::new(settings.ffmpeg_path.clone(), settings.ffprobe_path.clone());
        let controller = PipelineController::new(settings, Arc::new(tool))
            .with_settings_path(settings_path);

        let status = match controller.output_dir() {
            Some(dir) => format!("Ready. Output folder: {}", dir.display()),
            None => "Ready. Choose an output folder before importing.".to_string(),
        };
        info!(
            max_concurrent = controller.settings().max_concurrent_extractions,
            "Video Hub initialized"
        );

        (
            VideoHub {
                controller: Arc::new(controller),
                status,
                progress: None,
                failures: 0,
                record: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ImportFolder => {
                let Some(root) = FileDialog::new()
                    .set_title("Select Folder with Videos")
                    .pick_folder()
                else {
                    return Task::none();
                };

                self.status = format!("Importing from {}...", root.display());
                self.progress = None;
                self.failures = 0;

                Task::run(import_events(self.controller.clone(), root), Message::Pipeline)
            }
            Message::ChooseOutput => {
                let Some(dir) = FileDialog::new()
                    .set_title("Select Output Folder")
                    .pick_folder()
                else {
                    return Task::none();
                };

                let controller = self.controller.clone();
                Task::perform(
                    async move { controller.choose_output(dir).await.map_err(Arc::new) },
                    Message::OutputChosen,
                )
            }
            Message::LoadCatalog => {
                let Some(path) = FileDialog::new()
                    .set_title("Select images.json")
                    .add_filter("Catalog", &["json"])
                    .pick_file()
                else {
                    return Task::none();
                };

                let controller = self.controller.clone();
                Task::perform(
                    async move { controller.reload(&path).await.map_err(Arc::new) },
                    Message::CatalogLoaded,
                )
            }
            Message::OutputChosen(Ok(dir)) => {
                self.status = format!("Output folder: {}", dir.display());
                Task::none()
            }
            Message::OutputChosen(Err(e)) => {
                self.status = format!("Could not use output folder: {}", e);
                Task::none()
            }
            Message::CatalogLoaded(Ok(record)) => {
                self.status = format!("Loaded {} videos.", record.images.len());
                self.progress = None;
                self.record = Some(record);
                Task::none()
            }
            Message::CatalogLoaded(Err(e)) => {
                self.status = match e.kind() {
                    ErrorKind::Parse => format!("Catalog file is corrupt: {}", e),
                    _ => format!("Could not read catalog: {}", e),
                };
                Task::none()
            }
            Message::Pipeline(event) => {
                self.apply(event);
                Task::none()
            }
            Message::OpenFile(path) => {
                if let Err(e) = self.controller.open_file(&path) {
                    self.status = format!("Could not open file: {}", e);
                }
                Task::none()
            }
        }
    }

    fn apply(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Discovered { total } => {
                self.status = format!("Found {} videos. Extracting screenshots...", total);
                self.progress = Some((0, total));
            }
            PipelineEvent::Progress { completed, total } => {
                self.progress = Some((completed, total));
            }
            PipelineEvent::ExtractionFailed { file_name, error, .. } => {
                warn!(file = %file_name, error = %error, "Video skipped");
                self.failures += 1;
            }
            PipelineEvent::Completed(record) => {
                self.status = format!(
                    "✅ Import complete! {} videos cataloged in {}.",
                    record.images.len(),
                    record.output_dir.display()
                );
                self.progress = None;
                self.record = Some(record);
            }
            PipelineEvent::Failed(error) => {
                self.status = format!("Import failed: {}", error);
                self.progress = None;
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let controls = row![
            button("Import Folder")
                .on_press(Message::ImportFolder)
                .padding(10),
            button("Choose Output Folder")
                .on_press(Message::ChooseOutput)
                .padding(10),
            button("Load Catalog")
                .on_press(Message::LoadCatalog)
                .padding(10),
        ]
        .spacing(10);

        let mut content: Column<Message> = column![
            text("Video Hub").size(48),
            controls,
            text(&self.status).size(16),
        ]
        .spacing(20)
        .padding(40)
        .align_x(Alignment::Center);

        if let Some((completed, total)) = self.progress {
            content = content
                .push(progress_bar(0.0..=total.max(1) as f32, completed as f32).width(400))
                .push(text(format!("{} / {}", completed, total)).size(14));
        }

        if self.failures > 0 {
            content = content.push(
                text(format!("⚠️ {} videos could not be processed", self.failures)).size(14),
            );
        }

        if let Some(record) = &self.record {
            let list = record
                .images
                .iter()
                .fold(Column::new().spacing(8), |list, entry| {
                    list.push(entry_row(record, entry))
                });
            content = content.push(scrollable(list).height(Length::Fill));
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// One catalog line: first screenshot, display name, open button
fn entry_row<'a>(record: &'a PersistedRecord, entry: &'a CatalogEntry) -> Element<'a, Message> {
    let thumbnail: Element<Message> = match entry.screenshots.first() {
        Some(shot) => image(record.output_dir.join(shot.trim_start_matches('/')))
            .height(60)
            .into(),
        None => text("no preview").size(12).into(),
    };

    row![
        thumbnail,
        text(&entry.display_name).size(16).width(Length::Fill),
        button("Open").on_press(Message::OpenFile(entry.source_path(&record.input_dir))),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}

/// Start an import and turn its handle into a stream of events for iced
fn import_events(
    controller: Arc<PipelineController>,
    root: PathBuf,
) -> BoxStream<'static, PipelineEvent> {
    stream::once(async move { controller.start_import(root) })
        .flat_map(|started| match started {
            Ok(handle) => {
                info!(run_id = %handle.run_id, "Import run started");
                stream::unfold(handle, |mut handle| async move {
                    handle.next_event().await.map(|event| (event, handle))
                })
                .boxed()
            }
            Err(e) => stream::iter([PipelineEvent::Failed(Arc::new(e))]).boxed(),
        })
        .boxed()
}

fn main() -> iced::Result {
    let settings_path = Settings::default_path();
    let loaded = Settings::load(&settings_path);

    let level = loaded
        .as_ref()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let log_dir = logging::default_log_dir()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());
    logging::init_logging(log_dir.as_deref(), &level);

    let settings = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default settings");
        Settings::default()
    });

    iced::application("Video Hub", VideoHub::update, VideoHub::view)
        .theme(VideoHub::theme)
        .centered()
        .run_with(move || VideoHub::new(settings, settings_path))
}
