use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use cartola_terminal::annotate::annotate_lineup;
use cartola_terminal::backtest_chart::{BacktestChart, SeriesKind};
use cartola_terminal::config::AppConfig;
use cartola_terminal::labels::format_fixed;
use cartola_terminal::model::BacktestPoint;
use cartola_terminal::scale::Viewport;
use cartola_terminal::source::source_from_config;
use cartola_terminal::state::{AppState, Delta, ProviderCommand, Screen, apply_delta};
use cartola_terminal::views::{self, BACKTEST_COLUMNS, CAPTAIN_BADGE, CardView};
use cartola_terminal::window::trailing_window;
use cartola_terminal::{logging, provider};

const CARD_WIDTH: u16 = 28;
const CARD_HEIGHT: u16 = 5;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(config: &AppConfig, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        let mut state = AppState::new(config);
        state.push_log(format!("[INFO] Source: {}", config.source_label()));
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.state.screen = self.state.screen.toggle(),
            KeyCode::Char('1') => self.state.screen = Screen::Squad,
            KeyCode::Char('2') => self.state.screen = Screen::Backtest,
            KeyCode::Char('f') => self.state.cycle_formation(true),
            KeyCode::Char('F') => self.state.cycle_formation(false),
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.adjust_budget(1),
            KeyCode::Char('-') => self.state.adjust_budget(-1),
            KeyCode::Char('g') => {
                let cmd = self.state.request_lineup();
                self.dispatch(cmd);
            }
            KeyCode::Char('b') => {
                let cmd = self.state.request_backtest();
                self.dispatch(cmd);
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll(true),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll(false),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn dispatch(&mut self, cmd: Option<ProviderCommand>) {
        let Some(cmd) = cmd else {
            return;
        };
        if let Err(mpsc::SendError(cmd)) = self.cmd_tx.send(cmd) {
            let error = "provider unavailable".to_string();
            let delta = match cmd {
                ProviderCommand::FetchLineup { seq, .. } => Delta::LineupFailed { seq, error },
                ProviderCommand::FetchBacktest { seq, .. } => Delta::BacktestFailed { seq, error },
            };
            apply_delta(&mut self.state, delta);
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    let _log_guard = logging::init_logging(&config)?;
    tracing::info!(source = ?config.source, api_base = %config.api_base, "starting");

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    provider::spawn_provider(tx, cmd_rx, source_from_config(&config))?;

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("failed to open terminal")?;

    let mut app = App::new(&config, cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(%err, "terminal loop failed");
        eprintln!("error: {err}");
    }
    tracing::info!("shutting down");
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Squad => render_squad(frame, chunks[1], &app.state),
        Screen::Backtest => render_backtest(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = format!(
        "CARTOLA {} | Budget C$ {} | {} ({}) | {}",
        state.screen.title().to_uppercase(),
        state.budget,
        state.formation,
        state.formation.composition_label(),
        state.source_label
    );
    let line2 = format!(
        "Lineup: {} | Backtest: {}",
        state.lineup.status_label(),
        state.backtest.status_label()
    );
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Squad => {
            "Tab/2 Backtest | g Generate | f/F Formation | +/- Budget | j/k Scroll | ? Help | q Quit"
                .to_string()
        }
        Screen::Backtest => {
            "Tab/1 Squad | b Run backtest | f/F Formation | +/- Budget | j/k Scroll | ? Help | q Quit"
                .to_string()
        }
    }
}

fn notice_line(error: Option<&str>) -> Option<Line<'static>> {
    error.map(|err| {
        Line::from(Span::styled(
            format!("Could not complete request: {err}"),
            Style::default().fg(Color::Red),
        ))
    })
}

fn render_squad(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(lineup) = state.lineup.current() else {
        let mut lines = vec![Line::from(if state.lineup.is_loading() {
            "Generating lineup..."
        } else {
            "No lineup yet. Press g to generate one."
        })];
        lines.extend(notice_line(state.lineup.error()));
        let empty =
            Paragraph::new(lines).block(Block::default().title("Squad").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Min(CARD_HEIGHT + 2),
            Constraint::Length(CARD_HEIGHT + 2),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(sections[0]);

    let totals: Vec<Line> = views::summary_rows(lineup)
        .into_iter()
        .map(|(label, value)| Line::from(format!("{label:<20} {value:>10}")))
        .collect();
    let summary =
        Paragraph::new(totals).block(Block::default().title("Summary").borders(Borders::ALL));
    frame.render_widget(summary, top[0]);

    let mut roles = vec![
        Line::from(views::captain_line(lineup)),
        Line::from(views::luxury_line(lineup)),
    ];
    if let Some(formation) = lineup.formation.as_deref() {
        roles.push(Line::from(format!("Formation: {formation}")));
    }
    if state.lineup.is_loading() {
        roles.push(Line::from(Span::styled(
            "Refreshing...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    roles.extend(notice_line(state.lineup.error()));
    let roles = Paragraph::new(roles)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Roles").borders(Borders::ALL));
    frame.render_widget(roles, top[1]);

    let annotated = annotate_lineup(lineup);
    let starters: Vec<CardView> = annotated.starters.iter().map(views::roster_card).collect();
    let bench: Vec<CardView> = annotated.bench.iter().map(views::roster_card).collect();
    render_cards(
        frame,
        sections[1],
        &format!("Starters ({})", starters.len()),
        &starters,
        state.squad_scroll,
    );
    render_cards(frame, sections[2], "Bench", &bench, 0);
}

fn render_cards(frame: &mut Frame, area: Rect, title: &str, cards: &[CardView], scroll: u16) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let per_row = (inner.width / CARD_WIDTH).max(1) as usize;
    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let total_rows = cards.len().div_ceil(per_row);
    let first_row = (scroll as usize).min(total_rows.saturating_sub(visible_rows));

    for (slot, card) in cards
        .iter()
        .skip(first_row * per_row)
        .take(visible_rows * per_row)
        .enumerate()
    {
        let row = (slot / per_row) as u16;
        let col = (slot % per_row) as u16;
        let rect = Rect {
            x: inner.x + col * CARD_WIDTH,
            y: inner.y + row * CARD_HEIGHT,
            width: CARD_WIDTH.min(inner.width),
            height: CARD_HEIGHT.min(inner.height.saturating_sub(row * CARD_HEIGHT)),
        };
        if rect.height == 0 {
            break;
        }
        frame.render_widget(card_widget(card), rect);
    }
}

fn card_widget(card: &CardView) -> Paragraph<'static> {
    let mut title = vec![Span::styled(
        card.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for badge in &card.badges {
        let color = if *badge == CAPTAIN_BADGE {
            Color::Yellow
        } else {
            Color::Magenta
        };
        title.push(Span::raw(" "));
        title.push(Span::styled(
            format!("[{badge}]"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    let mut lines = vec![Line::from(title)];
    lines.extend(card.lines.iter().cloned().map(Line::from));
    let border = if card.badges.is_empty() {
        Style::default()
    } else {
        Style::default().fg(Color::Yellow)
    };
    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT | Borders::BOTTOM)
            .border_style(border),
    )
}

fn render_backtest(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(result) = state.backtest.current() else {
        let mut lines = vec![Line::from(if state.backtest.is_loading() {
            "Running backtest, this can take a few minutes..."
        } else {
            "No backtest yet. Press b to run one."
        })];
        lines.extend(notice_line(state.backtest.error()));
        let empty =
            Paragraph::new(lines).block(Block::default().title("Backtest").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let window = trailing_window(&result.series, state.chart_window);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Min(4),
        ])
        .split(area);

    let mut config_lines = vec![Line::from(views::config_line(result))];
    if state.backtest.is_loading() {
        config_lines.push(Line::from(Span::styled(
            "Refreshing...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    config_lines.extend(notice_line(state.backtest.error()));
    let config = Paragraph::new(config_lines)
        .block(Block::default().title("Run config").borders(Borders::ALL));
    frame.render_widget(config, sections[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(sections[1]);

    let metrics: Vec<Line> = views::metrics_rows(&result.metrics)
        .into_iter()
        .map(|(label, value)| Line::from(format!("{label:<20} {value:>9}")))
        .collect();
    let metrics =
        Paragraph::new(metrics).block(Block::default().title("Metrics").borders(Borders::ALL));
    frame.render_widget(metrics, middle[0]);

    render_chart(
        frame,
        middle[1],
        BacktestChart::build(window, Viewport::BACKTEST).as_ref(),
        window.len(),
    );

    render_backtest_table(frame, sections[2], window, state.backtest_scroll);
}

fn series_color(kind: SeriesKind) -> Color {
    match kind {
        SeriesKind::Actual => Color::Cyan,
        SeriesKind::Predicted => Color::Yellow,
        SeriesKind::Baseline => Color::DarkGray,
    }
}

fn render_chart(frame: &mut Frame, area: Rect, chart: Option<&BacktestChart>, rounds: usize) {
    let title = format!("Last {rounds} rounds");
    let Some(chart) = chart else {
        let empty = Paragraph::new("No rounds to plot")
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let vp = chart.viewport;
    // Viewport y grows downwards, canvas y grows upwards.
    let flip = move |y: f64| vp.height - y;
    let (vmin, vmax) = chart.value_range();
    // Height of one braille dot in viewport units.
    let dot = vp.height / f64::from(area.height.saturating_sub(2).max(1) * 4);

    let canvas = Canvas::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, vp.width])
        .y_bounds([0.0, vp.height])
        .paint(move |ctx| {
            for axis in chart.axes() {
                ctx.draw(&CanvasLine {
                    x1: axis.from.x,
                    y1: flip(axis.from.y),
                    x2: axis.to.x,
                    y2: flip(axis.to.y),
                    color: Color::Gray,
                });
            }
            for series in &chart.series {
                let color = series_color(series.kind);
                let passes = series.stroke.width.round().max(1.0) as usize;
                for seg in series.visible_segments() {
                    for pass in 0..passes {
                        let offset = dot * pass as f64;
                        ctx.draw(&CanvasLine {
                            x1: seg.from.x,
                            y1: flip(seg.from.y) - offset,
                            x2: seg.to.x,
                            y2: flip(seg.to.y) - offset,
                            color,
                        });
                    }
                }
            }
            ctx.print(0.0, flip(vp.top()), format_fixed(vmax));
            ctx.print(0.0, flip(vp.bottom()), format_fixed(vmin));

            let mut legend_x = vp.left() + 10.0;
            for kind in SeriesKind::ALL {
                ctx.print(
                    legend_x,
                    vp.height,
                    Span::styled(kind.label(), Style::default().fg(series_color(kind))),
                );
                legend_x += 120.0;
            }
        });
    frame.render_widget(canvas, area);
}

fn render_backtest_table(
    frame: &mut Frame,
    area: Rect,
    window: &[BacktestPoint],
    scroll: u16,
) {
    let header = Row::new(BACKTEST_COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let skip = (scroll as usize).min(window.len().saturating_sub(1));
    let rows: Vec<Row> = window
        .iter()
        .skip(skip)
        .map(|p| {
            let style = if p.luxury_used {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default()
            };
            Row::new(views::backtest_row(p)).style(style)
        })
        .collect();
    let widths = [
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Min(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title("Rounds").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Cartola Terminal - Help",
        "",
        "Global:",
        "  Tab / 1 / 2  Switch screen",
        "  f / F        Next / previous formation",
        "  + / -        Budget up / down by 5",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Squad:",
        "  g            Generate lineup",
        "  j/k or ↑/↓   Scroll starters",
        "",
        "Backtest:",
        "  b            Run backtest",
        "  j/k or ↑/↓   Scroll rounds",
        "",
        "Badges: [C x1.5] captain, [LUX] luxury reserve",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
