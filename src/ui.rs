use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use subscription_forecast::{format_currency, AnalysisReport, CadenceType, SubscriptionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Subscriptions,
    YearlyRevenue,
    Forecast,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Subscriptions => Page::YearlyRevenue,
            Page::YearlyRevenue => Page::Forecast,
            Page::Forecast => Page::Subscriptions,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Subscriptions => Page::Forecast,
            Page::YearlyRevenue => Page::Subscriptions,
            Page::Forecast => Page::YearlyRevenue,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Subscriptions => "Subscriptions",
            Page::YearlyRevenue => "Yearly Revenue",
            Page::Forecast => "Rankings & Forecast",
        }
    }
}

pub struct App {
    pub report: AnalysisReport,
    pub filtered: Vec<SubscriptionSummary>,
    pub cadence_filter: Option<CadenceType>,
    pub current_page: Page,
    pub subscriptions_state: TableState,
    pub revenue_state: TableState,
}

impl App {
    pub fn new(report: AnalysisReport) -> Self {
        let filtered = report.subscriptions.clone();

        let mut subscriptions_state = TableState::default();
        if !filtered.is_empty() {
            subscriptions_state.select(Some(0));
        }

        let mut revenue_state = TableState::default();
        revenue_state.select(Some(0));

        Self {
            report,
            filtered,
            cadence_filter: None,
            current_page: Page::Subscriptions,
            subscriptions_state,
            revenue_state,
        }
    }

    pub fn apply_filter(&mut self, cadence: Option<CadenceType>) {
        self.cadence_filter = cadence;
        self.filtered = self
            .report
            .subscriptions
            .iter()
            .filter(|s| cadence.map_or(true, |c| s.cadence == c))
            .cloned()
            .collect();

        // Reset selection to first item
        if self.filtered.is_empty() {
            self.subscriptions_state.select(None);
        } else {
            self.subscriptions_state.select(Some(0));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Rows and table state of the page currently shown
    fn active_table(&mut self) -> Option<(usize, &mut TableState)> {
        match self.current_page {
            Page::Subscriptions => Some((self.filtered.len(), &mut self.subscriptions_state)),
            Page::YearlyRevenue => Some((self.report.deltas.len(), &mut self.revenue_state)),
            Page::Forecast => None,
        }
    }

    pub fn move_selection(&mut self, step: isize) {
        let Some((len, state)) = self.active_table() else {
            return;
        };
        if len == 0 {
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len as isize);
        state.select(Some(next as usize));
    }

    pub fn jump(&mut self, step: isize) {
        let Some((len, state)) = self.active_table() else {
            return;
        };
        if len == 0 {
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + step).clamp(0, len as isize - 1);
        state.select(Some(next as usize));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('0') => app.apply_filter(None),
                KeyCode::Char('1') => app.apply_filter(Some(CadenceType::OneOff)),
                KeyCode::Char('2') => app.apply_filter(Some(CadenceType::Daily)),
                KeyCode::Char('3') => app.apply_filter(Some(CadenceType::Monthly)),
                KeyCode::Char('4') => app.apply_filter(Some(CadenceType::Yearly)),
                KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
                KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
                KeyCode::PageDown => app.jump(20),
                KeyCode::PageUp => app.jump(-20),
                KeyCode::Home => app.jump(isize::MIN / 2),
                KeyCode::End => app.jump(isize::MAX / 2),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Subscriptions => render_subscriptions(f, chunks[1], app),
        Page::YearlyRevenue => render_revenue(f, chunks[1], app),
        Page::Forecast => render_forecast(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn cadence_color(cadence: CadenceType) -> Color {
    match cadence {
        CadenceType::OneOff => Color::DarkGray,
        CadenceType::Daily => Color::Cyan,
        CadenceType::Monthly => Color::Green,
        CadenceType::Yearly => Color::Yellow,
    }
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Subscriptions, Page::YearlyRevenue, Page::Forecast];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Txs: {}", app.report.transaction_count),
        Style::default().fg(Color::White),
    ));
    for cadence in CadenceType::RECURRING {
        tab_spans.push(Span::raw("  "));
        tab_spans.push(Span::styled(
            format!("{} {}", cadence.code(), app.report.classification.count_of(cadence)),
            Style::default().fg(cadence_color(cadence)),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_subscriptions(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.filtered.iter().map(|sub| {
        let color = cadence_color(sub.cadence);
        Row::new(vec![
            Cell::from(sub.id.to_string()),
            Cell::from(sub.cadence.name().to_string()).style(Style::default().fg(color)),
            Cell::from(sub.duration.clone()),
            Cell::from(sub.transaction_count.to_string()),
            Cell::from(format_currency(sub.unit_price)),
        ])
        .height(1)
    });

    let title = match app.cadence_filter {
        Some(c) => format!(" Subscriptions - {} ", c.name()),
        None => " Subscriptions ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(34),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["ID", "Cadence", "Duration", "Transactions", "Unit Price"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.subscriptions_state);
}

fn render_revenue(f: &mut Frame, area: Rect, app: &mut App) {
    let totals = app.report.yearly_totals();

    let rows = totals.iter().zip(app.report.deltas.iter()).map(|(total, delta)| {
        let color = if delta.delta < 0 {
            Color::Red
        } else if delta.delta > 0 {
            Color::Green
        } else {
            Color::White
        };

        let marker = if app.report.growth_years.contains(&total.year) {
            "▲"
        } else if app.report.loss_years.contains(&total.year) {
            "▼"
        } else {
            ""
        };

        Row::new(vec![
            Cell::from(total.year.to_string()),
            Cell::from(format_currency(total.total as f64)),
            Cell::from(format_currency(delta.delta as f64)).style(Style::default().fg(color)),
            Cell::from(marker).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(4),
        ],
    )
    .header(header_row(&["Year", "Revenue", "Growth/Loss", ""]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Yearly Revenue "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.revenue_state);
}

fn render_forecast(f: &mut Frame, area: Rect, app: &App) {
    let report = &app.report;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let mut ranking_lines = vec![Line::from(Span::styled(
        format!("  Top {} growth", report.growth_years.len()),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    for year in &report.growth_years {
        ranking_lines.push(Line::from(format!(
            "    {}  {}",
            year,
            format_currency(report.delta_of(*year).unwrap_or_default() as f64)
        )));
    }
    ranking_lines.push(Line::from(""));
    ranking_lines.push(Line::from(Span::styled(
        format!("  Top {} loss", report.loss_years.len()),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
    for year in &report.loss_years {
        ranking_lines.push(Line::from(format!(
            "    {}  {}",
            year,
            format_currency(report.delta_of(*year).unwrap_or_default() as f64)
        )));
    }

    let rankings = Paragraph::new(ranking_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Rankings "),
    );
    f.render_widget(rankings, columns[0]);

    let mut forecast_lines = vec![Line::from("")];
    for cadence in &report.forecast.by_cadence {
        forecast_lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<8}", cadence.cadence.code()),
                Style::default().fg(cadence_color(cadence.cadence)),
            ),
            Span::raw(format!(
                " returning {:>4} → {}   new {:>3} → {}",
                cadence.predicted_returning,
                format_currency(cadence.returning_revenue),
                cadence.predicted_new,
                format_currency(cadence.new_revenue)
            )),
        ]));
    }
    for error in &report.forecast.errors {
        forecast_lines.push(Line::from(Span::styled(
            format!("  {:<8} skipped: {}", error.id, error.message),
            Style::default().fg(Color::DarkGray),
        )));
    }
    forecast_lines.push(Line::from(""));
    forecast_lines.push(Line::from(vec![
        Span::raw(format!("  Expected total revenue for {}: ", report.forecast.year)),
        Span::styled(
            format_currency(report.forecast_total()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]));
    forecast_lines.push(Line::from(""));
    forecast_lines.push(Line::from(Span::styled(
        format!("  {}", report.quality.summary()),
        Style::default().fg(Color::DarkGray),
    )));

    let forecast = Paragraph::new(forecast_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Forecast "),
    );
    f.render_widget(forecast, columns[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Subscriptions => (app.subscriptions_state.selected(), app.filtered.len()),
        Page::YearlyRevenue => (app.revenue_state.selected(), app.report.deltas.len()),
        Page::Forecast => (None, 0),
    };

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected.map(|i| i + 1).unwrap_or(0), total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(cadence) = app.cadence_filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", cadence.code()),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("0", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("1-4", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Cadence | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
