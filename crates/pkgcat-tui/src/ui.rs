use crate::app::{App, DetailScreen, InputMode, Screen, UploadField, UploadScreen};
use pkgcat_core::package::format_date;
use pkgcat_core::{Severity, UploadResult};
use pkgcat_engine::{DeletionState, UploadState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match &app.screen {
        Screen::Catalog => draw_catalog(f, app, chunks[1]),
        Screen::Detail(detail) => draw_detail(f, app, detail, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    if let Some(upload) = &app.upload {
        draw_upload(f, upload);
    }
    if app.input_mode == InputMode::ConfirmDelete {
        if let Screen::Detail(detail) = &app.screen {
            draw_confirm_delete(f, detail);
        }
    }
    if app.input_mode == InputMode::ShowingHelp {
        draw_help(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let view = app.catalog.view_state();
    let search = if app.input_mode == InputMode::Searching {
        format!("Search: {}_", view.search_term)
    } else if view.search_term.is_empty() {
        "Search: (press / to filter)".to_string()
    } else {
        format!("Search: {}", view.search_term)
    };
    let line = Line::from(vec![
        Span::styled(
            "pkgcat",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(search),
    ]);
    let title = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn draw_catalog(f: &mut Frame, app: &App, area: Rect) {
    let view = app.catalog.visible();
    let title = format!(
        " Packages ({} of {}) ",
        view.filtered_count, view.total_count
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    if let Some(notice) = app.catalog.notice() {
        let paragraph = Paragraph::new(notice)
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = view
        .items
        .iter()
        .enumerate()
        .map(|(i, pkg)| {
            let line = format!(
                "{:>8}  {:<50}  {}",
                pkg.display_identifier(),
                pkg.display_name(),
                format_date(pkg.last_updated)
            );
            let style = if i == app.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn draw_detail(f: &mut Frame, app: &App, detail: &DetailScreen, area: Rect) {
    let resolver = &detail.resolver;
    let summary = resolver.summary();
    let label = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::from(Span::styled(
            resolver.display_name().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("ID:            ", label),
            Span::raw(summary.display_identifier().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Last updated:  ", label),
            Span::raw(format_date(summary.last_updated)),
        ]),
    ];

    let links = summary.content.links();
    if !links.is_empty() {
        lines.push(Line::from(Span::styled("Downloads:", label)));
        for (kind, url) in links {
            lines.push(Line::from(format!("  {kind:<6} {url}")));
        }
    }

    if let Some(error) = detail.deletion.error() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::default());
    match resolver.notice() {
        Some(notice) => lines.push(Line::from(notice)),
        None => push_detail_body(&mut lines, app, detail),
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Package "))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn push_detail_body(lines: &mut Vec<Line<'static>>, app: &App, detail: &DetailScreen) {
    let Some(record) = detail.resolver.detail() else {
        return;
    };
    let label = Style::default().fg(Color::DarkGray);

    lines.push(Line::from(vec![
        Span::styled("Term:          ", label),
        Span::raw(format!(
            "{} to {}",
            format_date(record.term_start),
            format_date(record.term_end)
        )),
    ]));
    if !record.related_orgs.is_empty() {
        lines.push(Line::from(Span::styled("Related organisations:", label)));
        for org in &record.related_orgs {
            lines.push(Line::from(format!("  {}: {}", org.role, org.name)));
        }
    }

    let titles = detail.resolver.visible_titles();
    let marker = if detail.titles_expanded { "▾" } else { "▸" };
    let filter = detail.resolver.title_filter();
    let heading = if filter.is_empty() && app.input_mode != InputMode::FilteringTitles {
        format!("{marker} Titles ({})", record.titles.len())
    } else {
        let cursor = if app.input_mode == InputMode::FilteringTitles {
            "_"
        } else {
            ""
        };
        format!(
            "{marker} Titles ({} of {}) filter: {filter}{cursor}",
            titles.len(),
            record.titles.len()
        )
    };
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        heading,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if !detail.titles_expanded {
        return;
    }

    for (i, title) in titles.iter().enumerate() {
        let ids = format!(
            "online {} / print {}",
            title.online_identifier().unwrap_or("N/A"),
            title.print_identifier().unwrap_or("N/A")
        );
        let kind = title.publication_type.as_deref().unwrap_or("Unknown");
        let style = if i == detail.selected_title {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", title.title), style),
            Span::styled(format!("  [{kind}] {ids}"), label),
        ]));
    }
}

fn draw_upload(f: &mut Frame, upload: &UploadScreen) {
    let area = centered_rect(70, 70, f.area());
    let form = upload.pipeline.form();
    let title = if form.is_edit() {
        " Update Package "
    } else {
        " Upload New Package "
    };

    let mut lines = Vec::new();
    for field in UploadField::visible(form.is_edit()) {
        let value = match field {
            UploadField::FilePath => upload.file_path.clone(),
            UploadField::PackageId => form.package_id.clone(),
            UploadField::PackageName => form.package_name.clone(),
            UploadField::IdentifierType => match upload.pipeline.identifier_types().options() {
                [] => "(none available)".to_string(),
                _ => format!("< {} >", form.identifier_type.as_deref().unwrap_or("")),
            },
            UploadField::IdentifierValue => form.identifier_value.clone(),
        };
        let focused = field == upload.field;
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let cursor = if focused && field != UploadField::IdentifierType {
            "_"
        } else {
            ""
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<18}", field.label()), style),
            Span::raw(format!("{value}{cursor}")),
        ]));
    }
    if form.is_edit() {
        lines.push(Line::from(Span::styled(
            format!("Package ID is fixed: {}", form.effective_package_id()),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::default());

    if let Some(error) = &upload.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    match upload.pipeline.state() {
        UploadState::Idle => {}
        UploadState::Submitting => lines.push(Line::from("Uploading...")),
        UploadState::Done(result) => push_upload_result(&mut lines, result),
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "tab: next field  ←/→: identifier type  enter: upload  esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn push_upload_result(lines: &mut Vec<Line<'static>>, result: &UploadResult) {
    let color = match result.severity() {
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    lines.push(Line::from(Span::styled(
        result.message().to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));
    if let UploadResult::TransportFailure { reason } = result {
        lines.push(Line::from(Span::styled(
            reason.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    for error in result.errors() {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    if !result.warnings().is_empty() {
        lines.push(Line::from(format!("Warnings ({}):", result.warnings().len())));
        for warning in result.warnings() {
            lines.push(Line::from(Span::styled(
                format!("  {}", warning),
                Style::default().fg(Color::Yellow),
            )));
        }
    }
}

fn draw_confirm_delete(f: &mut Frame, detail: &DetailScreen) {
    let area = centered_rect(50, 25, f.area());
    let body = match detail.deletion.state() {
        DeletionState::Deleting => "Deleting...".to_string(),
        _ => format!(
            "Delete package '{}' ({})?\n\nThis cannot be undone.\n\ny: delete   n/esc: cancel",
            detail.resolver.display_name(),
            detail.deletion.identifier()
        ),
    };
    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm Delete ")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());
    let text = "Catalog\n  j/k      move\n  h/l      previous/next page\n  enter    open package\n  /        search\n  s        cycle sort\n  n        cycle page size\n  u        upload new package\n  r        reload\n\nPackage\n  esc      back to catalog\n  t        expand/collapse titles\n  /        filter titles\n  j/k      select title\n  o        copy OpenAlex link\n  c        copy Crossref link\n  u        upload new version\n  D        delete package\n  r        refresh\n\n  q        quit   ?  close help";
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let view = app.catalog.view_state();
    let status = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        "Ready".to_string()
    };

    let mut spans = vec![Span::raw(status), Span::raw(" | ")];
    if let Screen::Catalog = app.screen {
        spans.push(Span::raw(format!(
            "Page {} of {} | Sort: {} | {} per page | ",
            view.page,
            app.catalog.total_pages(),
            view.sort_key.label(),
            view.page_size
        )));
    }
    spans.extend([
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(":quit "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(":help"),
    ]);

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
