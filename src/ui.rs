use crate::{
    board::{
        BoardView,
        SpaceCell,
    },
    client::AppView,
    command::CommandForm,
    layout::{
        GridPos,
        GridSpan,
        Track,
    },
    log_view::LogView,
    roster::RosterEntry,
    snapshot::SpaceKind,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::{
    Stdout,
    stdout,
};
use tokio::sync::mpsc;
use unicode_width::{
    UnicodeWidthChar,
    UnicodeWidthStr,
};

const CORNER_WIDTH: u16 = 14;
const CORNER_HEIGHT: u16 = 4;
const LOG_PAGE: usize = 10;

pub enum UserEvent {
    Quit,
    Submit,
    ScrollLog(LogScroll),
    Redraw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogScroll {
    Up(usize),
    Down(usize),
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Focus {
    #[default]
    Player,
    Message,
    Log,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Player => Focus::Message,
            Focus::Message => Focus::Log,
            Focus::Log => Focus::Player,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Player => Focus::Log,
            Focus::Message => Focus::Player,
            Focus::Log => Focus::Message,
        }
    }
}

pub struct UiState {
    focus: Focus,
    form: CommandForm,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    log_height: usize,
}

impl UiState {
    pub fn new(player_name: Option<String>) -> Self {
        let focus = if player_name.is_some() {
            Focus::Message
        } else {
            Focus::Player
        };
        UiState {
            focus,
            form: CommandForm::new(player_name.unwrap_or_default()),
            terminal: None,
            log_height: LOG_PAGE,
        }
    }

    pub fn form(&self) -> &CommandForm {
        &self.form
    }

    pub fn clear_message(&mut self) {
        self.form.clear_message();
    }

    /// Rows of log visible in the last drawn frame.
    pub fn log_height(&self) -> usize {
        self.log_height
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, view: &AppView) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let mut log_height = state.log_height;
        let res = term
            .draw(|f| log_height = ui(f, state, view))
            .map(|_| ());
        state.terminal = Some(term);
        res?;
        state.log_height = log_height;
    }
    Ok(())
}

pub type InputEventReceiver = mpsc::UnboundedReceiver<std::io::Result<Event>>;

/// Reads terminal events on a dedicated thread so the async loop never
/// blocks on input.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let ev = event::read();
            let failed = ev.is_err();
            if tx.send(ev).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.recv().await {
        Some(ev) => Ok(ev?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) => key,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return Some(UserEvent::Quit),
        KeyCode::Char('c') if ctrl => return Some(UserEvent::Quit),
        KeyCode::Tab => {
            state.focus = state.focus.next();
            return Some(UserEvent::Redraw);
        }
        KeyCode::BackTab => {
            state.focus = state.focus.prev();
            return Some(UserEvent::Redraw);
        }
        KeyCode::Enter => return Some(UserEvent::Submit),
        KeyCode::PageUp => return Some(UserEvent::ScrollLog(LogScroll::Up(LOG_PAGE))),
        KeyCode::PageDown => {
            return Some(UserEvent::ScrollLog(LogScroll::Down(LOG_PAGE)));
        }
        KeyCode::End => return Some(UserEvent::ScrollLog(LogScroll::End)),
        _ => {}
    }
    if ctrl {
        return None;
    }
    match state.focus {
        Focus::Player => edit_field(&mut state.form.player_name, key.code),
        Focus::Message => edit_field(&mut state.form.message, key.code),
        Focus::Log => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(UserEvent::ScrollLog(LogScroll::Up(1))),
            KeyCode::Down | KeyCode::Char('j') => {
                Some(UserEvent::ScrollLog(LogScroll::Down(1)))
            }
            KeyCode::Char('q') => Some(UserEvent::Quit),
            _ => None,
        },
    }
}

fn edit_field(field: &mut String, code: KeyCode) -> Option<UserEvent> {
    match code {
        KeyCode::Char(c) => field.push(c),
        KeyCode::Backspace => {
            field.pop();
        }
        _ => return None,
    }
    Some(UserEvent::Redraw)
}

fn ui(f: &mut Frame, state: &UiState, view: &AppView) -> usize {
    f.render_widget(Clear, f.area());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),   // board + side panels
            Constraint::Length(3), // command form
            Constraint::Length(3), // status
            Constraint::Length(1), // help
        ])
        .split(f.area());
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main[1]);

    draw_board(f, main[0], view.board);
    draw_roster(f, side[0], view.roster);
    let log_height = draw_log(f, side[1], view.log, state.focus == Focus::Log);
    draw_form(f, rows[1], state);
    draw_status(f, rows[2], view);
    draw_help(f, rows[3]);
    log_height
}

fn draw_board(f: &mut Frame, area: Rect, board: &BoardView) {
    let block = Block::default().borders(Borders::ALL).title("Board");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if board.is_empty() {
        let waiting = Paragraph::new(Line::styled(
            "Waiting for game state...",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(waiting, inner);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(track_constraints(board.tracks(), CORNER_HEIGHT))
        .split(inner);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(track_constraints(board.tracks(), CORNER_WIDTH))
        .split(inner);

    if let Some(center) = board.center() {
        draw_center(f, span_rect(&rows, &cols, center.span), &center.title);
    }
    for cell in board.cells() {
        draw_cell(f, cell_rect(&rows, &cols, cell.pos), cell);
    }
}

fn track_constraints(tracks: &[Track], corner: u16) -> Vec<Constraint> {
    tracks
        .iter()
        .map(|track| match track {
            Track::Corner => Constraint::Length(corner),
            Track::Stretch => Constraint::Fill(1),
        })
        .collect()
}

fn cell_rect(rows: &[Rect], cols: &[Rect], pos: GridPos) -> Rect {
    let row = rows[pos.row - 1];
    let col = cols[pos.col - 1];
    Rect::new(col.x, row.y, col.width, row.height)
}

fn span_rect(rows: &[Rect], cols: &[Rect], span: GridSpan) -> Rect {
    let top_left = cell_rect(rows, cols, span.top_left);
    let bottom_right = cell_rect(
        rows,
        cols,
        GridPos::new(
            span.top_left.row + span.rows - 1,
            span.top_left.col + span.cols - 1,
        ),
    );
    Rect::new(
        top_left.x,
        top_left.y,
        bottom_right.right().saturating_sub(top_left.x),
        bottom_right.bottom().saturating_sub(top_left.y),
    )
}

fn draw_center(f: &mut Frame, area: Rect, title: &str) {
    let mut lines = vec![Line::from(""); usize::from(area.height / 2)];
    lines.push(Line::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_cell(f: &mut Frame, area: Rect, cell: &SpaceCell) {
    let title = fit_width(&cell.name, usize::from(area.width.saturating_sub(2)));
    // Terminals cannot show the background image; a double border marks
    // spaces that have one.
    let border_type = if cell.image_url.is_some() {
        BorderType::Double
    } else {
        BorderType::Plain
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(kind_color(cell.kind)))
        .title(title);

    let mut lines = Vec::new();
    if let Some(annotation) = &cell.owner {
        lines.push(Line::styled(
            format!("Owner: {}", annotation.owner),
            Style::default().fg(Color::Gray),
        ));
    }
    if !cell.markers.is_empty() {
        let spans: Vec<Span> = cell
            .markers
            .iter()
            .flat_map(|marker| {
                let initial = marker.label.chars().next().unwrap_or('?');
                [
                    Span::styled(
                        initial.to_string(),
                        Style::default().fg(Color::Black).bg(marker.color),
                    ),
                    Span::raw(" "),
                ]
            })
            .collect();
        lines.push(Line::from(spans));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn kind_color(kind: SpaceKind) -> Color {
    match kind {
        SpaceKind::Property => Color::White,
        SpaceKind::Chance => Color::Magenta,
        SpaceKind::Tax => Color::Red,
        SpaceKind::Go => Color::Green,
        SpaceKind::Jail => Color::DarkGray,
        SpaceKind::FreeParking => Color::Cyan,
        SpaceKind::GoToJail => Color::LightRed,
        SpaceKind::Unknown => Color::Gray,
    }
}

fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    if width > 0 {
        out.push('…');
    }
    out
}

fn draw_roster(f: &mut Frame, area: Rect, roster: &[RosterEntry]) {
    let block = Block::default().borders(Borders::ALL).title("Players");
    if roster.is_empty() {
        let empty = Paragraph::new(Line::styled(
            "No players yet",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(empty, area);
        return;
    }
    let items: Vec<ListItem> = roster
        .iter()
        .map(|entry| {
            let mut name_style = Style::default().add_modifier(Modifier::BOLD);
            if entry.is_current {
                name_style = name_style.fg(Color::Yellow);
            }
            let mut head = vec![
                Span::styled("■ ", Style::default().fg(entry.color)),
                Span::styled(entry.name.clone(), name_style),
                Span::raw(format!(": ${}", entry.money)),
            ];
            if entry.is_current {
                head.push(Span::styled(" ◀ turn", Style::default().fg(Color::Yellow)));
            }
            let properties = Line::styled(
                format!("  Properties: {}", entry.properties),
                Style::default().fg(Color::DarkGray),
            );
            ListItem::new(vec![Line::from(head), properties])
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn draw_log(f: &mut Frame, area: Rect, log: &LogView, focused: bool) -> usize {
    let title = if log.is_following() {
        "Log"
    } else {
        "Log (scrolled, End to follow)"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused))
        .title(title);
    let height = usize::from(block.inner(area).height);
    let top = u16::try_from(log.top_line(height)).unwrap_or(u16::MAX);
    let lines: Vec<Line> = log
        .lines()
        .iter()
        .map(|line| Line::from(line.as_str()))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block).scroll((top, 0)), area);
    height
}

fn draw_form(f: &mut Frame, area: Rect, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);
    draw_field(
        f,
        cols[0],
        "Player Name",
        &state.form.player_name,
        state.focus == Focus::Player,
    );
    draw_field(
        f,
        cols[1],
        "Command (e.g. !join, !roll, !buy)",
        &state.form.message,
        state.focus == Focus::Message,
    );
}

fn draw_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let text = if focused {
        format!("{value}▏")
    } else {
        value.to_string()
    };
    let widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(focused))
            .title(title.to_string()),
    );
    f.render_widget(widget, area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn draw_status(f: &mut Frame, area: Rect, view: &AppView) {
    let synced = match view.last_sync {
        Some(at) => format!(" | last sync {}", at.format("%H:%M:%S")),
        None => String::new(),
    };
    let widget = match view.errors.last() {
        Some(error) => Paragraph::new(format!("{error}{synced}"))
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red)),
        None => {
            let status = if view.status.trim().is_empty() {
                "Ready"
            } else {
                view.status
            };
            Paragraph::new(format!("{status}{synced}"))
                .block(Block::default().borders(Borders::ALL).title("Status"))
                .style(Style::default().fg(Color::Green))
        }
    };
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "Tab focus | Enter send | PgUp/PgDn scroll log | ↑/↓ scroll (log focused) | End follow | Esc quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, area);
}
