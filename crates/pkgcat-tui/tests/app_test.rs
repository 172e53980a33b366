use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pkgcat_core::{
    CatalogApi, ContentRefs, FetchError, PackageDetail, PackageSummary, RowIssue, Title,
    UploadResult, UploadSubmission, ViewState,
};
use pkgcat_engine::{DetailState, UploadState};
use pkgcat_tui::{App, InputMode, Screen, draw, handle_key};
use ratatui::{Terminal, backend::TestBackend};

struct FakeApi {
    packages: Vec<PackageSummary>,
    delete_status: Option<u16>,
    upload_warnings: Vec<RowIssue>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl FakeApi {
    fn new(n: usize) -> Self {
        let packages = (1..=n)
            .map(|i| {
                PackageSummary::new(i.to_string(), format!("Package {i:02}")).with_content(
                    ContentRefs {
                        json: Some(format!("https://cdn.example.org/{i}.json")),
                        ..ContentRefs::default()
                    },
                )
            })
            .collect();
        Self {
            packages,
            delete_status: None,
            upload_warnings: Vec::new(),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeApi {
    async fn list_packages(&self) -> Result<Vec<PackageSummary>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.packages.clone())
    }

    async fn package_detail(&self, identifier: &str) -> Result<PackageDetail, FetchError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PackageDetail {
            identifier: identifier.to_string(),
            name: Some(format!("Package {identifier} (full)")),
            term_start: None,
            term_end: None,
            related_orgs: Vec::new(),
            titles: vec![
                Title::new("Nature"),
                Title::new("Cell"),
                Title::new("Natural Hazards"),
            ],
        })
    }

    async fn delete_package(&self, identifier: &str) -> Result<(), FetchError> {
        match self.delete_status {
            Some(status) => Err(FetchError::Status {
                endpoint: format!("DELETE /package/{identifier}"),
                status,
            }),
            None => Ok(()),
        }
    }

    async fn upload(&self, submission: &UploadSubmission) -> UploadResult {
        UploadResult::Accepted {
            message: format!("Package {} saved", submission.package_name),
            warnings: self.upload_warnings.clone(),
        }
    }

    async fn identifier_types(&self) -> Result<Vec<String>, FetchError> {
        Ok(vec!["jisc_id".to_string()])
    }
}

fn press(app: &mut App, code: KeyCode) -> bool {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

async fn loaded_app(api: Arc<FakeApi>) -> App {
    let mut app = App::new(api, ViewState::default());
    app.reload_catalog();
    app.settle().await;
    app
}

#[tokio::test]
async fn test_catalog_paging_and_search() {
    let mut app = loaded_app(Arc::new(FakeApi::new(23))).await;
    assert_eq!(app.catalog.total_pages(), 3);

    press(&mut app, KeyCode::Char('l'));
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.catalog.view_state().page, 2);
    assert_eq!(app.selected_summary().unwrap().identifier, "12");

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.input_mode, InputMode::Searching);
    type_text(&mut app, "package 2");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.catalog.view_state().page, 1);
    // "Package 20" through "Package 23"
    assert_eq!(app.catalog.filtered_count(), 4);
    assert_eq!(app.selected, 0);
}

#[tokio::test]
async fn test_page_size_and_sort_cycling() {
    let mut app = loaded_app(Arc::new(FakeApi::new(23))).await;
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.catalog.view_state().page_size, 25);
    assert_eq!(app.catalog.total_pages(), 1);

    press(&mut app, KeyCode::Char('s'));
    assert_eq!(
        app.catalog.view_state().sort_key,
        pkgcat_core::SortKey::LastUpdated
    );
}

#[tokio::test]
async fn test_open_detail_and_filter_titles() {
    let api = Arc::new(FakeApi::new(3));
    let mut app = loaded_app(api.clone()).await;

    press(&mut app, KeyCode::Enter);
    app.settle().await;
    let detail = app.detail_screen().unwrap();
    assert!(matches!(detail.resolver.state(), DetailState::Loaded(_)));
    assert_eq!(detail.resolver.display_name(), "Package 1 (full)");
    assert_eq!(api.detail_calls.load(Ordering::SeqCst), 1);

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "nat");
    press(&mut app, KeyCode::Enter);
    let detail = app.detail_screen().unwrap();
    assert!(detail.titles_expanded);
    assert_eq!(detail.resolver.visible_titles().len(), 2);

    press(&mut app, KeyCode::Char('j'));
    assert_eq!(
        app.detail_screen().unwrap().selected_title().unwrap().title,
        "Natural Hazards"
    );

    press(&mut app, KeyCode::Esc);
    assert!(matches!(app.screen, Screen::Catalog));
}

#[tokio::test]
async fn test_failed_delete_stays_on_detail() {
    let mut api = FakeApi::new(3);
    api.delete_status = Some(500);
    let mut app = loaded_app(Arc::new(api)).await;

    press(&mut app, KeyCode::Enter);
    app.settle().await;
    press(&mut app, KeyCode::Char('D'));
    assert_eq!(app.input_mode, InputMode::ConfirmDelete);
    press(&mut app, KeyCode::Char('y'));
    app.settle().await;

    assert_eq!(app.input_mode, InputMode::Normal);
    let detail = app.detail_screen().unwrap();
    assert!(detail.deletion.error().unwrap().contains("500"));
}

#[tokio::test]
async fn test_cancel_delete_sends_nothing() {
    let mut app = loaded_app(Arc::new(FakeApi::new(3))).await;
    press(&mut app, KeyCode::Enter);
    app.settle().await;

    press(&mut app, KeyCode::Char('D'));
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.input_mode, InputMode::Normal);
    assert!(app.detail_screen().is_some());
}

#[tokio::test]
async fn test_successful_delete_returns_to_reloaded_catalog() {
    let api = Arc::new(FakeApi::new(3));
    let mut app = loaded_app(api.clone()).await;

    press(&mut app, KeyCode::Enter);
    app.settle().await;
    press(&mut app, KeyCode::Char('D'));
    press(&mut app, KeyCode::Char('y'));
    app.settle().await;

    assert!(matches!(app.screen, Screen::Catalog));
    assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
    assert_eq!(app.status_message.as_deref(), Some("Package 1 deleted"));
}

#[tokio::test]
async fn test_create_upload_reloads_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("titles.tsv");
    std::fs::write(&file, "Title\tISSN\n").unwrap();

    let api = Arc::new(FakeApi::new(2));
    let mut app = loaded_app(api.clone()).await;

    press(&mut app, KeyCode::Char('u'));
    assert_eq!(app.input_mode, InputMode::Uploading);
    app.settle().await;

    type_text(&mut app, &file.display().to_string());
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "99");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "New");
    press(&mut app, KeyCode::Enter);
    app.settle().await;

    let upload = app.upload.as_ref().unwrap();
    match upload.pipeline.state() {
        UploadState::Done(result) => assert_eq!(result.message(), "Package New saved"),
        _ => panic!("upload did not complete"),
    }
    assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);

    press(&mut app, KeyCode::Esc);
    assert!(app.upload.is_none());
}

fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal.draw(|f| draw(f, app)).unwrap();
    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_upload_warnings_show_row_data() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("titles.tsv");
    std::fs::write(&file, "Title\tISSN\n").unwrap();

    let mut api = FakeApi::new(1);
    api.upload_warnings = vec![RowIssue {
        row: Some(4),
        text: "missing ISSN".to_string(),
        raw_data: "Journal of Things".to_string(),
    }];
    let mut app = loaded_app(Arc::new(api)).await;

    press(&mut app, KeyCode::Char('u'));
    app.settle().await;
    type_text(&mut app, &file.display().to_string());
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "7");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Things");
    press(&mut app, KeyCode::Enter);
    app.settle().await;

    let screen = render(&app);
    assert!(screen.contains("Row 4: missing ISSN (Data: Journal of Things)"));
}

#[tokio::test]
async fn test_upload_validation_shown_inline() {
    let mut app = loaded_app(Arc::new(FakeApi::new(1))).await;
    press(&mut app, KeyCode::Char('u'));
    app.settle().await;

    press(&mut app, KeyCode::Enter);
    let upload = app.upload.as_ref().unwrap();
    assert_eq!(upload.error.as_deref(), Some("A package file is required"));
    assert_eq!(upload.pipeline.state(), &UploadState::Idle);
}

#[tokio::test]
async fn test_edit_upload_refreshes_detail() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("update.csv");
    std::fs::write(&file, "Title,ISSN\n").unwrap();

    let api = Arc::new(FakeApi::new(2));
    let mut app = loaded_app(api.clone()).await;
    press(&mut app, KeyCode::Enter);
    app.settle().await;

    press(&mut app, KeyCode::Char('u'));
    app.settle().await;
    assert!(app.upload.as_ref().unwrap().pipeline.form().is_edit());
    type_text(&mut app, &file.display().to_string());
    press(&mut app, KeyCode::Enter);
    app.settle().await;

    assert_eq!(api.detail_calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_quit_and_help() {
    let mut app = loaded_app(Arc::new(FakeApi::new(1))).await;
    press(&mut app, KeyCode::Char('?'));
    assert_eq!(app.input_mode, InputMode::ShowingHelp);
    assert!(!press(&mut app, KeyCode::Char('q')));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert!(press(&mut app, KeyCode::Char('q')));
}
