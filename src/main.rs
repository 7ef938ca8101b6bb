use futures::SinkExt;
use iced::widget::image::Handle;
use iced::widget::scrollable;
use iced::{event, keyboard, window, Element, Event, Size, Subscription, Task, Theme};
use std::collections::HashMap;
use std::path::PathBuf;

use photo_gallery::config::ViewerConfig;
use photo_gallery::error::{GalleryError, GalleryResult};
use photo_gallery::export::{self, Archive, ExportEvent};
use photo_gallery::grid::{
    AttemptReport, GridController, GridSettings, LoadTicket, LoadedImage, RetryTicket, Scheduler,
    TileId, TileState, Viewport,
};
use photo_gallery::state::access::Gate;
use photo_gallery::state::data::PhotoRef;
use photo_gallery::state::library::{self, Library};
use photo_gallery::state::lightbox::{Lightbox, PendingSwap, Swap};
use photo_gallery::state::session::ViewingSession;
use photo_gallery::store::{self, SharedStore};

mod ui;

/// Padding around the masonry grid inside its scrollable
pub const GRID_PADDING: f32 = 16.0;

const INITIAL_WINDOW: Size = Size::new(1280.0, 800.0);

/// Which page is on screen
#[derive(Debug, Clone, PartialEq)]
enum Screen {
    Catalog,
    /// Passcode prompt for a locked collection
    Gate(Gate),
    Gallery,
}

/// Progress of the "Download All" export
#[derive(Debug, Clone, Default)]
struct ExportState {
    running: bool,
    progress: f32,
}

/// Main application state
struct PhotoGallery {
    config: ViewerConfig,
    store: SharedStore,
    scheduler: Scheduler,
    library: Library,
    /// Cover images of the catalog page, by collection name
    covers: HashMap<String, Handle>,
    screen: Screen,
    /// Status message to display to the user
    status: String,
    /// Bumped whenever a gallery is entered or left
    view_generation: u64,
    session: ViewingSession,
    grid: Option<GridController>,
    thumbnails: HashMap<TileId, Handle>,
    container_width: f32,
    viewport: Viewport,
    lightbox: Lightbox,
    lightbox_handles: HashMap<String, Handle>,
    lightbox_error: Option<String>,
    export: ExportState,
    /// Download link shown after it was copied
    link_notice: Option<String>,
    confirm_leave: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    CatalogLoaded(GalleryResult<Library>),
    CoverLoaded(String, GalleryResult<LoadedImage>),
    OpenCollection(String),
    PasscodeChanged(String),
    SubmitPasscode,
    CancelGate,
    PhotosLoaded(u64, GalleryResult<Vec<String>>),
    Scrolled(scrollable::Viewport),
    Resized(Size),
    Attempted(Option<AttemptReport>),
    RetryDue(Option<RetryTicket>),
    OpenLightbox(TileId),
    Next,
    Previous,
    Escape,
    LightboxSettled(PendingSwap),
    LightboxLoaded(u64, GalleryResult<LoadedImage>),
    Prefetched(GalleryResult<LoadedImage>),
    CloseLightbox,
    SavePhoto,
    PhotoSaved(Result<Option<PathBuf>, String>),
    ExportAll,
    Export(ExportEvent),
    ArchiveSaved(Result<Option<PathBuf>, String>),
    CopyDownloadLink,
    RequestLeave,
    ConfirmLeave,
    StayInGallery,
}

impl PhotoGallery {
    /// Create a new instance of the application and start loading the catalog
    fn new(config: ViewerConfig, store: SharedStore) -> (Self, Task<Message>) {
        let scheduler = Scheduler::new(store.clone(), GridSettings::from_config(&config).policy);
        let lightbox = Lightbox::new(config.debounce());

        let load = {
            let store = store.clone();
            let catalog_path = config.catalog_path.clone();
            let secrets_path = config.secrets_path.clone();
            async move { Library::load(store.as_ref(), &catalog_path, &secrets_path).await }
        };

        let app = PhotoGallery {
            status: format!("Loading catalog from {}...", store.resolve(&config.catalog_path)),
            config,
            store,
            scheduler,
            library: Library::default(),
            covers: HashMap::new(),
            screen: Screen::Catalog,
            view_generation: 0,
            session: ViewingSession::default(),
            grid: None,
            thumbnails: HashMap::new(),
            container_width: INITIAL_WINDOW.width - 2.0 * GRID_PADDING,
            viewport: Viewport::new(0.0, INITIAL_WINDOW.height),
            lightbox,
            lightbox_handles: HashMap::new(),
            lightbox_error: None,
            export: ExportState::default(),
            link_notice: None,
            confirm_leave: false,
        };

        (app, Task::perform(load, Message::CatalogLoaded))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::CatalogLoaded(Ok(library)) => {
                self.status = format!("{} collections", library.len());
                self.library = library;

                let covers = self.library.collections().iter().filter_map(|collection| {
                    if collection.cover_photo.is_empty() {
                        return None;
                    }
                    let name = collection.name.clone();
                    let photo = PhotoRef::new(collection, &collection.cover_photo);
                    Some(Task::perform(self.scheduler.load(photo), move |result| {
                        Message::CoverLoaded(name.clone(), result)
                    }))
                });
                Task::batch(covers.collect::<Vec<_>>())
            }
            Message::CatalogLoaded(Err(e)) => {
                log::error!("❌ {}", e);
                self.status = format!("❌ {}", e);
                Task::none()
            }
            Message::CoverLoaded(name, Ok(image)) => {
                self.covers.insert(name, Handle::from_bytes(image.bytes.to_vec()));
                Task::none()
            }
            Message::CoverLoaded(name, Err(e)) => {
                log::warn!("⚠️  No cover for {}: {}", name, e);
                Task::none()
            }
            Message::OpenCollection(name) => match self.library.get(&name).map(|c| c.is_open()) {
                None => {
                    self.status = GalleryError::UnknownCollection(name).to_string();
                    Task::none()
                }
                Some(true) => self.enter_gallery(&name),
                Some(false) => {
                    self.screen = Screen::Gate(Gate::new(&name));
                    Task::none()
                }
            },
            Message::PasscodeChanged(input) => {
                if let Screen::Gate(gate) = &mut self.screen {
                    gate.input = input;
                }
                Task::none()
            }
            Message::SubmitPasscode => {
                let Screen::Gate(gate) = &mut self.screen else {
                    return Task::none();
                };
                if gate.submit(&self.library) {
                    let name = gate.collection.clone();
                    return self.enter_gallery(&name);
                }
                Task::none()
            }
            Message::CancelGate => {
                self.screen = Screen::Catalog;
                Task::none()
            }
            Message::PhotosLoaded(generation, result) => {
                if generation != self.view_generation || self.screen != Screen::Gallery {
                    return Task::none();
                }
                match result {
                    Ok(filenames) => self.open_grid(generation, &filenames),
                    Err(e) => {
                        log::error!("❌ {}", e);
                        self.status = format!("❌ {}", e);
                        Task::none()
                    }
                }
            }
            Message::Scrolled(scrolled) => {
                let bounds = scrolled.bounds();
                self.viewport = Viewport::new(
                    scrolled.absolute_offset().y - GRID_PADDING,
                    bounds.height,
                );
                let width = bounds.width - 2.0 * GRID_PADDING;

                let Some(grid) = self.grid.as_mut() else {
                    return Task::none();
                };
                let mut tickets = grid.set_viewport(self.viewport);
                if (width - self.container_width).abs() >= 1.0 {
                    self.container_width = width;
                    tickets.extend(grid.resize(width));
                }
                self.dispatch(tickets)
            }
            Message::Resized(size) => {
                self.container_width = size.width - 2.0 * GRID_PADDING;
                let Some(grid) = self.grid.as_mut() else {
                    return Task::none();
                };
                let tickets = grid.resize(self.container_width);
                self.dispatch(tickets)
            }
            Message::Attempted(Some(report)) => self.apply_report(report),
            Message::Attempted(None) => Task::none(),
            Message::RetryDue(Some(ticket)) => {
                let Some(grid) = self.grid.as_mut() else {
                    return Task::none();
                };
                let tickets: Vec<LoadTicket> = grid.retry(&ticket).into_iter().collect();
                self.dispatch(tickets)
            }
            Message::RetryDue(None) => Task::none(),
            Message::OpenLightbox(index) => {
                self.lightbox_error = None;
                match self.lightbox.open(&mut self.session, index) {
                    Some(swap) => self.show(swap),
                    None => Task::none(),
                }
            }
            Message::Next => self.navigate(Lightbox::next),
            Message::Previous => self.navigate(Lightbox::previous),
            Message::LightboxSettled(pending) => {
                match self.lightbox.settle(&self.session, pending) {
                    Some(swap) => self.show(swap),
                    None => Task::none(),
                }
            }
            Message::LightboxLoaded(generation, result) => {
                if !self.lightbox.is_current(generation) {
                    return Task::none();
                }
                match result {
                    Ok(image) => self.keep_lightbox_image(image),
                    Err(e) => {
                        log::warn!("⚠️  {}", e);
                        self.lightbox_error = Some(e.to_string());
                    }
                }
                Task::none()
            }
            Message::Prefetched(Ok(image)) => {
                if self.lightbox.is_open() {
                    self.keep_lightbox_image(image);
                }
                Task::none()
            }
            Message::Prefetched(Err(e)) => {
                log::debug!("Prefetch failed: {}", e);
                Task::none()
            }
            Message::Escape => {
                if self.lightbox.is_open() {
                    return self.close_lightbox();
                } else if matches!(self.screen, Screen::Gate(_)) {
                    self.screen = Screen::Catalog;
                } else if self.screen == Screen::Gallery {
                    self.confirm_leave = !self.confirm_leave;
                }
                Task::none()
            }
            Message::CloseLightbox => self.close_lightbox(),
            Message::SavePhoto => {
                // Save what is on screen, not a photo still waiting for its swap
                let Some((_, photo)) = self.lightbox.shown() else {
                    return Task::none();
                };
                let photo = photo.clone();
                Task::perform(save_photo(self.store.clone(), photo), Message::PhotoSaved)
            }
            Message::PhotoSaved(result) | Message::ArchiveSaved(result) => {
                self.status = match result {
                    Ok(Some(path)) => format!("✅ Saved {}", path.display()),
                    Ok(None) => "Save cancelled".to_string(),
                    Err(e) => format!("❌ Save failed: {}", e),
                };
                Task::none()
            }
            Message::ExportAll => {
                let Some(collection) = self.session.collection() else {
                    return Task::none();
                };
                if self.export.running || self.session.is_empty() {
                    return Task::none();
                }
                self.export = ExportState {
                    running: true,
                    progress: 0.0,
                };
                self.status = format!("Preparing {}.zip...", collection.name);

                let stream = export_stream(
                    self.store.clone(),
                    collection.name.clone(),
                    self.session.ordered_photo_uris(),
                    self.config.export_concurrency,
                );
                Task::run(stream, Message::Export)
            }
            Message::Export(ExportEvent::Progress(progress)) => {
                self.export.progress = progress;
                Task::none()
            }
            Message::Export(ExportEvent::Finished(result)) => {
                self.export.running = false;
                match result {
                    Ok(archive) => {
                        self.export.progress = 1.0;
                        self.status = format!("{} ready ({} photos)", archive.file_name, archive.entries);
                        Task::perform(save_archive(archive), Message::ArchiveSaved)
                    }
                    Err(e) => {
                        self.export.progress = 0.0;
                        self.status = format!("❌ Download failed: {}", e);
                        Task::none()
                    }
                }
            }
            Message::CopyDownloadLink => {
                let Some(link) = self
                    .session
                    .collection()
                    .and_then(|c| c.download_link.clone())
                else {
                    return Task::none();
                };
                self.link_notice = Some(link.clone());
                iced::clipboard::write(link)
            }
            Message::RequestLeave => {
                self.confirm_leave = true;
                Task::none()
            }
            Message::StayInGallery => {
                self.confirm_leave = false;
                Task::none()
            }
            Message::ConfirmLeave => {
                self.leave_gallery();
                Task::none()
            }
        }
    }

    /// Start a new view of `name`: fetch its photo list
    fn enter_gallery(&mut self, name: &str) -> Task<Message> {
        let Some(collection) = self.library.get(name).cloned() else {
            return Task::none();
        };

        self.view_generation += 1;
        let generation = self.view_generation;
        self.screen = Screen::Gallery;
        self.status = format!("Opening {}...", collection.display_title());
        self.session = ViewingSession::start(collection.clone(), &[]);
        self.viewport.top = 0.0;
        self.link_notice = None;
        self.confirm_leave = false;

        let store = self.store.clone();
        Task::perform(
            async move { library::load_collection_photos(store.as_ref(), &collection).await },
            move |result| Message::PhotosLoaded(generation, result),
        )
    }

    fn open_grid(&mut self, generation: u64, filenames: &[String]) -> Task<Message> {
        let Some(collection) = self.session.collection().cloned() else {
            return Task::none();
        };
        self.session = ViewingSession::start(collection, filenames);
        self.status = format!("{} photos", self.session.len());
        self.thumbnails.clear();

        let mut grid = GridController::new(
            generation,
            self.session.photos().to_vec(),
            GridSettings::from_config(&self.config),
            self.container_width,
        );
        // Scroll position of a previous view does not carry over
        self.viewport = Viewport::new(0.0, self.viewport.height);
        let tickets = grid.open(self.viewport.height);
        self.grid = Some(grid);
        self.dispatch(tickets)
    }

    fn dispatch(&self, tickets: Vec<LoadTicket>) -> Task<Message> {
        Task::batch(
            tickets
                .into_iter()
                .map(|ticket| Task::perform(self.scheduler.attempt(ticket), Message::Attempted))
                .collect::<Vec<_>>(),
        )
    }

    fn apply_report(&mut self, report: AttemptReport) -> Task<Message> {
        let Some(grid) = self.grid.as_mut() else {
            return Task::none();
        };

        let retry = grid.apply(&report);
        if let Ok(image) = &report.result {
            let loaded = grid
                .tile(report.tile)
                .is_some_and(|tile| tile.state == TileState::Loaded);
            if loaded && grid.generation() == report.generation {
                self.thumbnails
                    .insert(report.tile, Handle::from_bytes(image.bytes.to_vec()));
            }
        }

        // A repack can pull more placeholders into the margin
        let tickets = grid.set_viewport(self.viewport);
        let wait = match retry {
            Some(ticket) => Task::perform(self.scheduler.wait(ticket), Message::RetryDue),
            None => Task::none(),
        };
        Task::batch([wait, self.dispatch(tickets)])
    }

    fn navigate(
        &mut self,
        step: fn(&mut Lightbox, &mut ViewingSession) -> Option<PendingSwap>,
    ) -> Task<Message> {
        match step(&mut self.lightbox, &mut self.session) {
            Some(pending) => Task::perform(self.lightbox.debounced(pending), Message::LightboxSettled),
            None => Task::none(),
        }
    }

    /// Display a settled swap and fetch its neighbours ahead
    fn show(&mut self, swap: Swap) -> Task<Message> {
        let lightbox = &self.lightbox;
        self.lightbox_handles
            .retain(|uri, _| lightbox.cached(uri).is_some());
        self.lightbox_error = None;

        let mut tasks = Vec::with_capacity(3);
        if !self.has_image(swap.index, &swap.photo) {
            let generation = swap.generation;
            tasks.push(Task::perform(
                self.scheduler.load(swap.photo.clone()),
                move |result| Message::LightboxLoaded(generation, result),
            ));
        }
        for photo in swap.prefetch {
            let index = self.session.photos().iter().position(|p| *p == photo);
            if index.is_some_and(|i| self.has_image(i, &photo)) {
                continue;
            }
            tasks.push(Task::perform(self.scheduler.load(photo), Message::Prefetched));
        }

        Task::batch(tasks)
    }

    /// Is a decoded image for `photo` already at hand?
    fn has_image(&self, index: usize, photo: &PhotoRef) -> bool {
        self.thumbnails.contains_key(&index) || self.lightbox_handles.contains_key(&photo.uri)
    }

    fn keep_lightbox_image(&mut self, image: LoadedImage) {
        self.lightbox_handles
            .insert(image.uri.clone(), Handle::from_bytes(image.bytes.to_vec()));
        self.lightbox.store(image);
    }

    /// Back to the grid at the offset it had before the lightbox opened
    fn close_lightbox(&mut self) -> Task<Message> {
        self.lightbox.close();
        self.lightbox_handles.clear();
        self.lightbox_error = None;

        let offset = scrollable::AbsoluteOffset {
            x: 0.0,
            y: (self.viewport.top + GRID_PADDING).max(0.0),
        };
        scrollable::scroll_to(ui::gallery::scroll_id(), offset)
    }

    /// Tear the view down. In-flight work is cancelled and the passcode has
    /// to be entered again.
    fn leave_gallery(&mut self) {
        self.scheduler.cancel_all();
        if let Some(mut grid) = self.grid.take() {
            grid.close();
        }
        self.lightbox.close();
        self.lightbox_handles.clear();
        self.lightbox_error = None;
        self.thumbnails.clear();
        self.session.reset();
        self.viewport.top = 0.0;
        self.view_generation += 1;
        self.confirm_leave = false;
        self.link_notice = None;
        self.screen = Screen::Catalog;
        self.status = format!("{} collections", self.library.len());
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match &self.screen {
            Screen::Catalog => ui::catalog::view(&self.library, &self.covers, &self.status),
            Screen::Gate(gate) => {
                let title = self
                    .library
                    .get(&gate.collection)
                    .map(|c| c.display_title())
                    .unwrap_or_else(|| gate.collection.clone());
                ui::catalog::gate(gate, title)
            }
            Screen::Gallery if self.lightbox.is_open() => {
                let shown = self.lightbox.shown();
                let image = shown.and_then(|(index, photo)| {
                    self.lightbox_handles
                        .get(&photo.uri)
                        .or_else(|| self.thumbnails.get(&index))
                });
                ui::lightbox::view(ui::lightbox::LightboxView {
                    photo: shown.map(|(_, photo)| photo),
                    position: shown.map_or(0, |(index, _)| index + 1),
                    total: self.session.len(),
                    image,
                    error: self.lightbox_error.as_deref(),
                })
            }
            Screen::Gallery => ui::gallery::view(ui::gallery::GalleryView {
                collection: self.session.collection(),
                grid: self.grid.as_ref(),
                thumbnails: &self.thumbnails,
                status: &self.status,
                export_running: self.export.running,
                export_progress: self.export.progress,
                link_notice: self.link_notice.as_deref(),
                confirm_leave: self.confirm_leave,
            }),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::on_key_press(|key, _modifiers| match key.as_ref() {
            keyboard::Key::Named(keyboard::key::Named::ArrowRight) => Some(Message::Next),
            keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => Some(Message::Previous),
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::Escape),
            _ => None,
        });

        let resizes = event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::Resized(size)) => Some(Message::Resized(size)),
            _ => None,
        });

        Subscription::batch([keys, resizes])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Ask where to save a photo, then fetch and write its bytes
async fn save_photo(store: SharedStore, photo: PhotoRef) -> Result<Option<PathBuf>, String> {
    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_title("Save photo")
        .set_file_name(&photo.filename)
        .save_file()
        .await
    else {
        return Ok(None);
    };

    let bytes = store.fetch(&photo.uri).await.map_err(|e| e.to_string())?;
    tokio::fs::write(handle.path(), bytes)
        .await
        .map_err(|e| e.to_string())?;

    log::info!("💾 Saved {} to {}", photo.uri, handle.path().display());
    Ok(Some(handle.path().to_path_buf()))
}

async fn save_archive(archive: Archive) -> Result<Option<PathBuf>, String> {
    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_title("Save collection")
        .set_file_name(&archive.file_name)
        .add_filter("Zip archive", &["zip"])
        .save_file()
        .await
    else {
        return Ok(None);
    };

    tokio::fs::write(handle.path(), archive.bytes.as_slice())
        .await
        .map_err(|e| e.to_string())?;

    log::info!("💾 Saved {} to {}", archive.file_name, handle.path().display());
    Ok(Some(handle.path().to_path_buf()))
}

/// Run an export, forwarding progress to the UI
fn export_stream(
    store: SharedStore,
    collection: String,
    uris: Vec<String>,
    concurrency: usize,
) -> impl futures::Stream<Item = ExportEvent> {
    iced::stream::channel(100, move |mut output| async move {
        let result = export::export_all(store.as_ref(), &collection, &uris, concurrency, |p| {
            // Progress ticks may be dropped when the UI lags behind
            let _ = output.try_send(ExportEvent::Progress(p));
        })
        .await;

        let _ = output.send(ExportEvent::Finished(result)).await;
    })
}

fn main() -> iced::Result {
    photo_gallery::logger::init();

    let config = ViewerConfig::load();
    let store = match store::open(&config.source) {
        Ok(store) => store,
        Err(e) => {
            log::error!("❌ Cannot open store {}: {}", config.source, e);
            std::process::exit(1);
        }
    };
    log::info!("🎨 Photo gallery reading from {}", store.resolve(""));

    iced::application("Photo Gallery", PhotoGallery::update, PhotoGallery::view)
        .subscription(PhotoGallery::subscription)
        .theme(PhotoGallery::theme)
        .window_size(INITIAL_WINDOW)
        .centered()
        .run_with(move || PhotoGallery::new(config, store))
}
