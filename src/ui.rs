use anyhow::Result;
use bmi_tracker::engine::color_for;
use bmi_tracker::history::{History, TREND_FALLBACK};
use bmi_tracker::shell::{calculate, show_history, Calculation, CalculationForm, Notice};
use bmi_tracker::RecordStore;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
        TableState, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    User,
    Weight,
    Height,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::User => Focus::Weight,
            Focus::Weight => Focus::Height,
            Focus::Height => Focus::User,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::User => Focus::Height,
            Focus::Weight => Focus::User,
            Focus::Height => Focus::Weight,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Focus::User => "Username:",
            Focus::Weight => "Weight (kg):",
            Focus::Height => "Height (cm):",
        }
    }
}

/// Display state for the terminal UI. All computation goes through `shell`.
pub struct App {
    store: RecordStore,
    pub form: CalculationForm,
    pub focus: Focus,
    pub result: Option<Calculation>,
    pub history: Option<History>,
    pub history_state: TableState,
    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            form: CalculationForm::default(),
            focus: Focus::User,
            result: None,
            history: None,
            history_state: TableState::default(),
            notice: None,
            should_quit: false,
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Focus::User => &mut self.form.user,
            Focus::Weight => &mut self.form.weight,
            Focus::Height => &mut self.form.height,
        }
    }

    pub fn input(&self, focus: Focus) -> &str {
        match focus {
            Focus::User => &self.form.user,
            Focus::Weight => &self.form.weight,
            Focus::Height => &self.form.height,
        }
    }

    /// "Calculate BMI" button.
    pub fn submit(&mut self) {
        match calculate(&self.store, &self.form) {
            Ok(calculation) => self.result = Some(calculation),
            Err(err) => self.notice = Some(Notice::from(&err)),
        }
    }

    /// "Show History & Trends" button.
    pub fn open_history(&mut self) {
        match show_history(&self.store, &self.form.user) {
            Ok(history) => {
                self.history_state = TableState::default();
                self.history_state.select(Some(history.len() - 1));
                self.history = Some(history);
            }
            Err(err) => self.notice = Some(Notice::from(&err)),
        }
    }

    pub fn close_history(&mut self) {
        self.history = None;
    }

    fn scroll_history(&mut self, down: bool) {
        let len = match &self.history {
            Some(history) if !history.is_empty() => history.len(),
            _ => return,
        };
        let i = match self.history_state.selected() {
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // A notice blocks everything else until dismissed
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return;
        }

        if self.history.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::F(2) => self.close_history(),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_history(true),
                KeyCode::Up | KeyCode::Char('k') => self.scroll_history(false),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::F(2) => self.open_history(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.previous(),
            KeyCode::Backspace => {
                self.focused_input().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_input().push(c);
            }
            _ => {}
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!("terminal UI started");

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("terminal UI closed");

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(5), // Form
            Constraint::Length(3), // Result
            Constraint::Min(0),    // Info
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    render_header(f, chunks[0]);
    render_form(f, chunks[1], app);
    render_result(f, chunks[2], app);
    render_info(f, chunks[3]);
    render_status_bar(f, chunks[4], app);

    if app.history.is_some() {
        render_history(f, centered_rect(90, 90, area), app);
    }

    if let Some(notice) = &app.notice {
        render_notice(f, centered_rect(60, 30, area), notice);
    }
}

fn render_header(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(Span::styled(
        "🌟 BMI Calculator 🌟",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(title, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = [Focus::User, Focus::Weight, Focus::Height]
        .iter()
        .map(|field| {
            let focused = *field == app.focus;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let cursor = if focused { "▏" } else { "" };

            Line::from(vec![
                Span::styled(format!("{:>13} ", field.label()), label_style),
                Span::styled(
                    format!("{}{}", app.input(*field), cursor),
                    Style::default().fg(Color::White),
                ),
            ])
        })
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Measurement "),
    );

    f.render_widget(form, area);
}

fn rgb(hint: bmi_tracker::ColorHint) -> Color {
    let (r, g, b) = hint.rgb();
    Color::Rgb(r, g, b)
}

fn render_result(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.result {
        Some(calc) => {
            let style = Style::default().fg(rgb(calc.color)).add_modifier(Modifier::BOLD);
            Line::from(vec![
                Span::styled(format!("BMI: {:.2}", calc.record.bmi), style),
                Span::raw("    "),
                Span::styled(format!("Category: {}", calc.record.category), style),
            ])
        }
        None => Line::from(vec![
            Span::styled("BMI: --", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::raw("Category: --"),
        ]),
    };

    let result = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Result "));

    f.render_widget(result, area);
}

fn render_info(f: &mut Frame, area: Rect) {
    let info = Paragraph::new(vec![
        Line::from(""),
        Line::from("• Input your weight and height to calculate BMI."),
        Line::from("• View your historical data and trends."),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(info, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let hints: &[(&str, &str)] = if app.history.is_some() {
        &[("↑/↓", " Scroll | "), ("Esc", " Close")]
    } else {
        &[
            ("Tab", " Next field | "),
            ("Enter", " Calculate | "),
            ("F2", " History & Trends | "),
            ("Esc", " Quit"),
        ]
    };

    let mut status_spans = vec![Span::raw(" ")];
    for (key, action) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*action));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_history(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(history) = app.history.as_ref() else {
        return;
    };

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" BMI History for {} ", history.user));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(inner);

    let header_cells = ["Date", "BMI", "Category"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = history.rows().into_iter().map(|row| {
        let color = rgb(color_for(row.category));
        Row::new(vec![
            Cell::from(row.date),
            Cell::from(format!("{:.2}", row.bmi)),
            Cell::from(row.category.to_string()).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(21),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::BOTTOM))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    let trend = history.trend();
    f.render_stateful_widget(table, chunks[0], &mut app.history_state);

    if trend.is_empty() {
        let fallback = Paragraph::new(vec![Line::from(""), Line::from(TREND_FALLBACK)])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(fallback, chunks[1]);
        return;
    }

    let points: Vec<(f64, f64)> = trend.iter().map(|p| p.as_xy()).collect();

    let (mut x_min, mut x_max) = (points[0].0, points[points.len() - 1].0);
    if x_max <= x_min {
        // Every entry in the same second
        x_min -= 1.0;
        x_max += 1.0;
    }
    let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min).floor() - 1.0;
    let y_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max).ceil() + 1.0;

    let first_date = trend[0].timestamp.format("%Y-%m-%d").to_string();
    let last_date = trend[trend.len() - 1].timestamp.format("%Y-%m-%d").to_string();

    let datasets = vec![Dataset::default()
        .name("BMI")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(Block::default().title(" BMI Trend "))
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![Span::raw(first_date), Span::raw(last_date)]),
        )
        .y_axis(
            Axis::default()
                .title("BMI")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        );

    f.render_widget(chart, chunks[1]);
}

fn render_notice(f: &mut Frame, area: Rect, notice: &Notice) {
    f.render_widget(Clear, area);

    let border = if notice.title == "No Data" {
        Color::Yellow
    } else {
        Color::Red
    };

    let body = Paragraph::new(vec![
        Line::from(""),
        Line::from(notice.message.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", notice.title)),
    );

    f.render_widget(body, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
