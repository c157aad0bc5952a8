use crate::directory::{
    BankCard, DirectorySession, DirectorySource, DirectoryState, Dispatch, FeatureExclusions,
    FilterEntry, LocationScope,
};
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Results,
    Filters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Results => Page::Filters,
            Page::Filters => Page::Results,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Results => "Banks",
            Page::Filters => "Filters",
        }
    }
}

pub struct App<S: DirectorySource> {
    pub source: S,
    pub session: DirectorySession,
    pub exclusions: FeatureExclusions,
    pub cards: Vec<BankCard>,
    pub state: TableState,
    pub filter_cursor: TableState,
    pub current_page: Page,
    pub input_mode: InputMode,
    pub show_detail: bool,
}

impl<S: DirectorySource> App<S> {
    pub fn new(source: S, session: DirectorySession, exclusions: FeatureExclusions) -> Self {
        let mut filter_cursor = TableState::default();
        filter_cursor.select(Some(0));

        let mut app = Self {
            source,
            session,
            exclusions,
            cards: Vec::new(),
            state: TableState::default(),
            filter_cursor,
            current_page: Page::Results,
            input_mode: InputMode::Normal,
            show_detail: false,
        };
        let dispatch = app.session.dispatch();
        app.apply(dispatch);
        app
    }

    /// Complete a dispatch against the source and refresh the cards
    fn apply(&mut self, dispatch: Dispatch) {
        self.session.complete(dispatch, &self.source);
        self.cards = self.session.cards(&self.exclusions);

        if self.cards.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn query(&self) -> &str {
        &self.session.request().query
    }

    pub fn push_query_char(&mut self, c: char) {
        let mut query = self.query().to_string();
        query.push(c);
        let dispatch = self.session.set_query(query);
        self.apply(dispatch);
    }

    pub fn pop_query_char(&mut self) {
        let mut query = self.query().to_string();
        if query.pop().is_some() {
            let dispatch = self.session.set_query(query);
            self.apply(dispatch);
        }
    }

    pub fn clear_query(&mut self) {
        let dispatch = self.session.set_query(String::new());
        self.apply(dispatch);
    }

    pub fn set_location(&mut self, location: LocationScope) {
        let dispatch = self.session.set_location(location);
        self.apply(dispatch);
    }

    pub fn filter_entries(&self) -> Vec<FilterEntry> {
        self.session.request().filters.entries()
    }

    pub fn toggle_selected_filter(&mut self) {
        let Some(entry) = self
            .filter_cursor
            .selected()
            .and_then(|i| self.filter_entries().get(i).cloned())
        else {
            return;
        };

        let dispatch = self.session.update_filters(|filters| {
            if let Err(e) = filters.toggle_entry(&entry) {
                tracing::warn!(error = %e, "filter toggle rejected");
            }
        });
        self.apply(dispatch);
    }

    pub fn clear_filters(&mut self) {
        if self.session.request().filters.is_dirty() {
            let dispatch = self.session.update_filters(|filters| filters.reset());
            self.apply(dispatch);
        }
    }

    pub fn retry(&mut self) {
        let dispatch = self.session.retry();
        self.apply(dispatch);
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn selected_card(&self) -> Option<&BankCard> {
        self.state.selected().and_then(|i| self.cards.get(i))
    }

    fn cursor(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Results => (&mut self.state, self.cards.len()),
            Page::Filters => {
                let len = self.filter_entries().len();
                (&mut self.filter_cursor, len)
            }
        }
    }

    pub fn next(&mut self) {
        let (state, len) = self.cursor();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.cursor();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }
}

pub fn run_ui<S: DirectorySource>(app: &mut App<S>) -> Result<()> {
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

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend, S: DirectorySource>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if app.input_mode == InputMode::Search {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => app.input_mode = InputMode::Normal,
                KeyCode::Backspace => app.pop_query_char(),
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.clear_query()
                }
                KeyCode::Char(c) => app.push_query_char(c),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('/') => {
                app.input_mode = InputMode::Search;
                app.current_page = Page::Results;
            }
            KeyCode::Tab => app.next_page(),
            KeyCode::Enter | KeyCode::Char(' ') if app.current_page == Page::Filters => {
                app.toggle_selected_filter()
            }
            KeyCode::Enter => app.toggle_detail(),
            KeyCode::Char('c') => app.clear_filters(),
            KeyCode::Char('r') => app.retry(),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            _ => {}
        }
    }
}

fn ui<S: DirectorySource>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);

    match app.current_page {
        Page::Results if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(60), // Bank list
                    Constraint::Percentage(40), // Detail panel
                ])
                .split(chunks[2]);

            render_results(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Results => render_results(f, chunks[2], app),
        Page::Filters => render_filters(f, chunks[2], app),
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header<S: DirectorySource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Results, Page::Filters].iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let location = &app.session.request().location;
    let place = match (&location.country, &location.state) {
        (Some(country), Some(state)) if location.requires_state() => format!("{}-{}", country, state),
        (Some(country), _) => country.clone(),
        (None, _) => "no location".to_string(),
    };

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(place, Style::default().fg(Color::White)));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} banks", app.cards.len()),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_search<S: DirectorySource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let border = if app.input_mode == InputMode::Search {
        Color::Yellow
    } else {
        Color::White
    };

    let text = if app.query().is_empty() && app.input_mode == InputMode::Normal {
        Line::from(Span::styled(
            "Press / to search by bank name",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(app.query().to_string())
    };

    let search = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Search "),
    );

    f.render_widget(search, area);
}

fn render_results<S: DirectorySource>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let message = match app.session.state() {
        DirectoryState::Loaded { .. } => None,
        DirectoryState::Idle => Some(("Choose a location to see banks".to_string(), Color::DarkGray)),
        DirectoryState::Loading { .. } => Some(("Loading...".to_string(), Color::Yellow)),
        DirectoryState::Error { message } => {
            Some((format!("{} (press r to retry)", message), Color::Red))
        }
        DirectoryState::Empty => Some(("No banks match your search".to_string(), Color::DarkGray)),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Banks ");

    if let Some((text, color)) = message {
        let paragraph = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let header_cells = ["Bank", "Rating", "Interest", "Protected"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.cards.iter().map(|card| {
        let name = if card.top_pick {
            format!("★ {}", card.name)
        } else {
            card.name.clone()
        };

        let cells = vec![
            Cell::from(truncate(&name, 34)),
            Cell::from(card.rating.as_str()).style(Style::default().fg(rating_color(card))),
            Cell::from(card.interest_rate.clone()),
            Cell::from(card.deposit_protection.clone()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(36),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn rating_color(card: &BankCard) -> Color {
    match card.rating.as_str() {
        "great" => Color::Green,
        "good" => Color::Cyan,
        "ok" => Color::Yellow,
        "bad" | "worst" => Color::Red,
        _ => Color::DarkGray,
    }
}

fn render_filters<S: DirectorySource>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let header_cells = ["", "Category", "Filter"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .filter_entries()
        .into_iter()
        .map(|entry| {
            let (mark, color) = if entry.enabled {
                ("[x]", Color::Green)
            } else {
                ("[ ]", Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(mark).style(Style::default().fg(color)),
                Cell::from(entry.category.label()),
                Cell::from(entry.label),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(20),
            Constraint::Length(28),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Filters - Space/Enter to toggle "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.filter_cursor);
}

fn render_status_bar<S: DirectorySource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.cards.len()),
        Style::default().fg(Color::Cyan),
    )];

    let active = app.session.request().filters.active_specs();
    if !active.is_empty() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filters: {}", active.len()),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    for (key, label) in [("/", " Search | "), ("Tab", " Page | "), ("Enter", " Details | ")] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel<S: DirectorySource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Bank Details ");

    let Some(card) = app.selected_card() else {
        f.render_widget(Paragraph::new("No bank selected").block(block), area);
        return;
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![label("  Name: "), Span::raw(card.name.as_str())]),
        Line::from(vec![
            label("  Website: "),
            Span::raw(card.website.as_deref().unwrap_or("-")),
        ]),
        Line::from(vec![label("  Rating: "), Span::raw(card.rating.as_str())]),
        Line::from(vec![label("  Interest: "), Span::raw(card.interest_rate.as_str())]),
        Line::from(vec![
            label("  Deposit protection: "),
            Span::raw(card.deposit_protection.as_str()),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
    ];

    for group in &card.features {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            format!("  {}", group.label.to_uppercase()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        for feature in &group.features {
            content.push(Line::from(format!("    • {}", feature)));
        }
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
