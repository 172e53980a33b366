use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use pkgcat_core::catalog::PAGE_SIZE_OPTIONS;
use pkgcat_core::{
    CatalogApi, FetchError, PackageDetail, PackageSummary, Ticket, Title, UploadFile, UploadForm,
    UploadResult, ViewState,
};
use pkgcat_engine::{
    CatalogStore, DeletionState, DeletionWorkflow, DetailResolver, UploadCompletion,
    UploadPipeline,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Completions reported back by spawned request tasks
#[derive(Debug)]
pub enum Message {
    CatalogLoaded {
        ticket: Ticket,
        result: Result<Vec<PackageSummary>, FetchError>,
    },
    DetailLoaded {
        generation: u64,
        ticket: Ticket,
        result: Result<PackageDetail, FetchError>,
    },
    Deleted {
        generation: u64,
        ticket: Ticket,
        result: Result<(), FetchError>,
    },
    Uploaded {
        generation: u64,
        ticket: Ticket,
        result: UploadResult,
    },
    IdentifierTypes {
        generation: u64,
        ticket: Ticket,
        result: Result<Vec<String>, FetchError>,
    },
}

pub enum Screen {
    Catalog,
    Detail(Box<DetailScreen>),
}

pub struct DetailScreen {
    /// Distinguishes this screen from earlier ones for in-flight responses
    pub generation: u64,
    pub resolver: DetailResolver,
    pub deletion: DeletionWorkflow,
    pub titles_expanded: bool,
    pub selected_title: usize,
}

impl DetailScreen {
    pub fn selected_title(&self) -> Option<&Title> {
        self.resolver
            .visible_titles()
            .get(self.selected_title)
            .copied()
    }

    fn clamp_title_selection(&mut self) {
        let count = self.resolver.visible_titles().len();
        self.selected_title = self.selected_title.min(count.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadField {
    FilePath,
    PackageId,
    PackageName,
    IdentifierType,
    IdentifierValue,
}

impl UploadField {
    const ORDER: [UploadField; 5] = [
        UploadField::FilePath,
        UploadField::PackageId,
        UploadField::PackageName,
        UploadField::IdentifierType,
        UploadField::IdentifierValue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FilePath => "File (.tsv/.csv)",
            Self::PackageId => "Package ID",
            Self::PackageName => "Package Name",
            Self::IdentifierType => "Identifier Type",
            Self::IdentifierValue => "Identifier Value",
        }
    }

    /// Fields shown for a form; the id is fixed in edit mode
    pub fn visible(edit: bool) -> Vec<UploadField> {
        Self::ORDER
            .into_iter()
            .filter(|f| !(edit && *f == Self::PackageId))
            .collect()
    }

    fn step(self, edit: bool, forward: bool) -> Self {
        let fields = Self::visible(edit);
        let pos = fields.iter().position(|f| *f == self).unwrap_or(0);
        let len = fields.len();
        let next = if forward {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        fields[next]
    }
}

pub struct UploadScreen {
    pub generation: u64,
    pub pipeline: UploadPipeline,
    pub field: UploadField,
    pub file_path: String,
    /// Client-side problem found before submitting
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Searching,
    FilteringTitles,
    Uploading,
    ConfirmDelete,
    ShowingHelp,
}

pub struct App {
    api: Arc<dyn CatalogApi>,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    pending: usize,
    next_generation: u64,
    pub catalog: CatalogStore,
    /// Row within the current page
    pub selected: usize,
    pub screen: Screen,
    pub upload: Option<UploadScreen>,
    pub input_mode: InputMode,
    /// Mode to return to when help is closed
    previous_mode: InputMode,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(api: Arc<dyn CatalogApi>, view: ViewState) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            tx,
            rx,
            pending: 0,
            next_generation: 0,
            catalog: CatalogStore::new(view),
            selected: 0,
            screen: Screen::Catalog,
            upload: None,
            input_mode: InputMode::Normal,
            previous_mode: InputMode::Normal,
            status_message: None,
        }
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        self.pending += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver only goes away when the app shuts down
            let _ = tx.send(request.await);
        });
    }

    fn generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Apply every completion that has already arrived
    pub fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
        }
    }

    /// Wait until every spawned request has reported back
    pub async fn settle(&mut self) {
        while self.pending > 0 {
            match self.rx.recv().await {
                Some(message) => self.apply(message),
                None => break,
            }
        }
    }

    pub fn apply(&mut self, message: Message) {
        self.pending = self.pending.saturating_sub(1);
        match message {
            Message::CatalogLoaded { ticket, result } => {
                if self.catalog.complete_load(ticket, result) {
                    self.clamp_selection();
                }
            }
            Message::DetailLoaded {
                generation,
                ticket,
                result,
            } => {
                if let Some(detail) = self.detail_screen_mut(generation) {
                    detail.resolver.complete_fetch(ticket, result);
                    detail.clamp_title_selection();
                }
            }
            Message::Deleted {
                generation,
                ticket,
                result,
            } => self.apply_delete(generation, ticket, result),
            Message::Uploaded {
                generation,
                ticket,
                result,
            } => self.apply_upload(generation, ticket, result),
            Message::IdentifierTypes {
                generation,
                ticket,
                result,
            } => {
                if let Some(upload) = self.upload.as_mut().filter(|u| u.generation == generation) {
                    upload.pipeline.complete_identifier_types(ticket, result);
                }
            }
        }
    }

    fn detail_screen_mut(&mut self, generation: u64) -> Option<&mut DetailScreen> {
        match &mut self.screen {
            Screen::Detail(detail) if detail.generation == generation => Some(detail),
            _ => None,
        }
    }

    pub fn detail_screen(&self) -> Option<&DetailScreen> {
        match &self.screen {
            Screen::Detail(detail) => Some(detail),
            Screen::Catalog => None,
        }
    }

    // Catalog

    pub fn reload_catalog(&mut self) {
        let ticket = self.catalog.begin_load();
        self.selected = 0;
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.list_packages().await;
            Message::CatalogLoaded { ticket, result }
        });
    }

    fn clamp_selection(&mut self) {
        let count = self.catalog.visible().items.len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    pub fn next(&mut self) {
        let count = self.catalog.visible().items.len();
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn previous(&mut self) {
        let count = self.catalog.visible().items.len();
        if count > 0 {
            self.selected = if self.selected == 0 {
                count - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn next_page(&mut self) {
        if self.catalog.next_page() {
            self.selected = 0;
        }
    }

    pub fn previous_page(&mut self) {
        if self.catalog.previous_page() {
            self.selected = 0;
        }
    }

    pub fn cycle_sort(&mut self) {
        let key = self.catalog.view_state().sort_key.next();
        self.catalog.set_sort_key(key);
        self.status_message = Some(format!("Sorted by {}", key.label()));
    }

    pub fn cycle_page_size(&mut self) {
        let current = self.catalog.view_state().page_size;
        let next = PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .find(|size| *size > current)
            .unwrap_or(PAGE_SIZE_OPTIONS[0]);
        match self.catalog.set_page_size(next) {
            Ok(()) => {
                self.selected = 0;
                self.status_message = Some(format!("{next} per page"));
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Searching;
    }

    pub fn search_input(&mut self, c: char) {
        let mut term = self.catalog.view_state().search_term.clone();
        term.push(c);
        self.catalog.set_search_term(term);
        self.selected = 0;
    }

    pub fn search_backspace(&mut self) {
        let mut term = self.catalog.view_state().search_term.clone();
        term.pop();
        self.catalog.set_search_term(term);
        self.selected = 0;
    }

    pub fn selected_summary(&self) -> Option<&PackageSummary> {
        self.catalog.visible().items.get(self.selected).copied()
    }

    pub fn open_selected(&mut self) {
        let Some(summary) = self.selected_summary().cloned() else {
            return;
        };
        let generation = self.generation();
        debug!(identifier = %summary.identifier, "opening package");
        let mut resolver = DetailResolver::new(summary.clone());
        let ticket = resolver.begin_fetch();
        self.screen = Screen::Detail(Box::new(DetailScreen {
            generation,
            resolver,
            deletion: DeletionWorkflow::new(summary.identifier.clone()),
            titles_expanded: false,
            selected_title: 0,
        }));
        self.status_message = None;
        if let Some(ticket) = ticket {
            self.spawn_detail_fetch(generation, ticket, summary.identifier);
        }
    }

    // Detail

    fn spawn_detail_fetch(&mut self, generation: u64, ticket: Ticket, identifier: String) {
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.package_detail(&identifier).await;
            Message::DetailLoaded {
                generation,
                ticket,
                result,
            }
        });
    }

    pub fn back_to_catalog(&mut self) {
        self.screen = Screen::Catalog;
        self.input_mode = InputMode::Normal;
    }

    pub fn refresh_detail(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        let generation = detail.generation;
        let identifier = detail.resolver.identifier().to_string();
        if let Some(ticket) = detail.resolver.refresh() {
            self.spawn_detail_fetch(generation, ticket, identifier);
        }
    }

    pub fn toggle_titles(&mut self) {
        if let Screen::Detail(detail) = &mut self.screen {
            detail.titles_expanded = !detail.titles_expanded;
        }
    }

    pub fn next_title(&mut self) {
        if let Screen::Detail(detail) = &mut self.screen {
            let count = detail.resolver.visible_titles().len();
            if detail.titles_expanded && count > 0 {
                detail.selected_title = (detail.selected_title + 1) % count;
            }
        }
    }

    pub fn previous_title(&mut self) {
        if let Screen::Detail(detail) = &mut self.screen {
            let count = detail.resolver.visible_titles().len();
            if detail.titles_expanded && count > 0 {
                detail.selected_title = if detail.selected_title == 0 {
                    count - 1
                } else {
                    detail.selected_title - 1
                };
            }
        }
    }

    pub fn start_title_filter(&mut self) {
        if let Screen::Detail(detail) = &mut self.screen {
            detail.titles_expanded = true;
            self.input_mode = InputMode::FilteringTitles;
        }
    }

    pub fn title_filter_input(&mut self, c: char) {
        if let Screen::Detail(detail) = &mut self.screen {
            let mut filter = detail.resolver.title_filter().to_string();
            filter.push(c);
            detail.resolver.set_title_filter(filter);
            detail.selected_title = 0;
        }
    }

    pub fn title_filter_backspace(&mut self) {
        if let Screen::Detail(detail) = &mut self.screen {
            let mut filter = detail.resolver.title_filter().to_string();
            filter.pop();
            detail.resolver.set_title_filter(filter);
            detail.selected_title = 0;
        }
    }

    /// Copy the first link of the selected title whose label starts with `source`
    pub fn copy_title_link(&mut self, source: &str) {
        let Some(detail) = self.detail_screen() else {
            return;
        };
        if !detail.titles_expanded {
            return;
        }
        let Some(title) = detail.selected_title() else {
            return;
        };
        let Some(link) = title
            .links()
            .into_iter()
            .find(|link| link.label.starts_with(source))
        else {
            self.status_message = Some(format!("No ISSN for '{}'", title.title));
            return;
        };
        if copy_to_clipboard(&link.url) {
            self.status_message = Some(format!("Copied {} link", link.label));
        }
    }

    pub fn start_delete(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        match detail.deletion.request_delete() {
            Ok(()) => self.input_mode = InputMode::ConfirmDelete,
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn cancel_delete(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        // Ignored while the request is in flight
        if detail.deletion.cancel().is_ok() {
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn confirm_delete(&mut self) {
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        let ticket = match detail.deletion.confirm() {
            Ok(ticket) => ticket,
            Err(e) => {
                self.status_message = Some(e.to_string());
                return;
            }
        };
        let generation = detail.generation;
        let identifier = detail.deletion.identifier().to_string();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.delete_package(&identifier).await;
            Message::Deleted {
                generation,
                ticket,
                result,
            }
        });
    }

    fn apply_delete(&mut self, generation: u64, ticket: Ticket, result: Result<(), FetchError>) {
        let Some(detail) = self.detail_screen_mut(generation) else {
            return;
        };
        if !detail.deletion.complete(ticket, result) {
            return;
        }
        let identifier = detail.deletion.identifier().to_string();
        if detail.deletion.state() == &DeletionState::Deleted {
            self.back_to_catalog();
            self.status_message = Some(format!("Package {identifier} deleted"));
            self.reload_catalog();
        } else {
            self.input_mode = InputMode::Normal;
        }
    }

    // Upload

    pub fn start_upload(&mut self) {
        let form = match &self.screen {
            Screen::Catalog => UploadForm::create(),
            Screen::Detail(detail) => UploadForm::edit(
                detail.resolver.identifier(),
                detail.resolver.display_name(),
            ),
        };
        self.open_upload(form);
    }

    fn open_upload(&mut self, form: UploadForm) {
        let generation = self.generation();
        let mut pipeline = UploadPipeline::new(form);
        let ticket = pipeline.begin_identifier_types();
        self.upload = Some(UploadScreen {
            generation,
            pipeline,
            field: UploadField::FilePath,
            file_path: String::new(),
            error: None,
        });
        self.input_mode = InputMode::Uploading;

        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.identifier_types().await;
            Message::IdentifierTypes {
                generation,
                ticket,
                result,
            }
        });
    }

    pub fn close_upload(&mut self) {
        self.upload = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn upload_next_field(&mut self) {
        if let Some(upload) = &mut self.upload {
            let edit = upload.pipeline.form().is_edit();
            upload.field = upload.field.step(edit, true);
        }
    }

    pub fn upload_previous_field(&mut self) {
        if let Some(upload) = &mut self.upload {
            let edit = upload.pipeline.form().is_edit();
            upload.field = upload.field.step(edit, false);
        }
    }

    pub fn upload_cycle_type(&mut self) {
        if let Some(upload) = &mut self.upload {
            upload.pipeline.cycle_identifier_type();
        }
    }

    pub fn upload_input(&mut self, c: char) {
        if let Some(upload) = &mut self.upload {
            if let Some(text) = upload.field_text_mut() {
                text.push(c);
            }
        }
    }

    pub fn upload_backspace(&mut self) {
        if let Some(upload) = &mut self.upload {
            if let Some(text) = upload.field_text_mut() {
                text.pop();
            }
        }
    }

    pub fn submit_upload(&mut self) {
        let Some(upload) = &mut self.upload else {
            return;
        };
        if upload.pipeline.is_submitting() {
            return;
        }
        upload.error = None;

        let path = upload.file_path.trim().to_string();
        upload.pipeline.form_mut().file = if path.is_empty() {
            None
        } else {
            match UploadFile::from_path(Path::new(&path)) {
                Ok(file) => Some(file),
                Err(e) => {
                    upload.error = Some(format!("Could not read {path}: {e}"));
                    return;
                }
            }
        };

        let (ticket, submission) = match upload.pipeline.begin_submit() {
            Ok(started) => started,
            Err(e) => {
                upload.error = Some(e.to_string());
                return;
            }
        };
        let generation = upload.generation;
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.upload(&submission).await;
            Message::Uploaded {
                generation,
                ticket,
                result,
            }
        });
    }

    fn apply_upload(&mut self, generation: u64, ticket: Ticket, result: UploadResult) {
        let Some(upload) = self.upload.as_mut().filter(|u| u.generation == generation) else {
            return;
        };
        if upload.pipeline.complete_submit(ticket, result) != UploadCompletion::Refresh {
            return;
        }
        if upload.pipeline.form().is_edit() {
            self.refresh_detail();
        } else {
            self.reload_catalog();
        }
    }

    // Help

    pub fn toggle_help(&mut self) {
        if self.input_mode == InputMode::ShowingHelp {
            self.input_mode = self.previous_mode;
        } else {
            self.previous_mode = self.input_mode;
            self.input_mode = InputMode::ShowingHelp;
        }
    }
}

impl UploadScreen {
    fn field_text_mut(&mut self) -> Option<&mut String> {
        let form = self.pipeline.form_mut();
        match self.field {
            UploadField::FilePath => Some(&mut self.file_path),
            UploadField::PackageId if !form.is_edit() => Some(&mut form.package_id),
            UploadField::PackageName => Some(&mut form.package_name),
            UploadField::IdentifierValue => Some(&mut form.identifier_value),
            _ => None,
        }
    }
}

/// Failures are logged only
fn copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string())) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "clipboard copy failed");
            false
        }
    }
}
