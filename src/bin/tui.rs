use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{application::todo_service::{CreateOutcome, TodoService, TodoServiceImpl}, config::AppConfig, domain::{repository::TodoRepository, todo::{format_due, StoredTodo, Todo, TodoStatus}}, infrastructure::sqlite_repo::{prepare_sqlite_file, SqliteTodoRepository}};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;
    prepare_sqlite_file(&config.database_url)?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, config.database_url).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create }

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { Text, When }

struct App<S: TodoService> {
    service: S,
    items: Vec<StoredTodo>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    field: ActiveField,
    draft_text: String,
    draft_when: String,
    notice: Option<String>,
}

impl<S: TodoService> App<S> {
    async fn load(&mut self) -> Result<()> {
        self.items = self.service.list().await?;
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
        Ok(())
    }

    async fn submit(&mut self) -> Result<()> {
        let todo = Todo::from_input(self.draft_text.trim(), &self.draft_when);
        self.notice = Some(match self.service.create(todo).await? {
            CreateOutcome::Created(stored) => format!("saved {} ({})", stored.todo.id, status_label(stored.todo.status)),
            CreateOutcome::Rejected(rejection) => format!("{}: need text and a due date (YYYY-MM-DD [HH:MM:SS] or RFC 3339)", rejection.error.message),
        });
        Ok(())
    }

    fn clear_draft(&mut self) {
        self.mode = Mode::View;
        self.field = ActiveField::Text;
        self.draft_text.clear();
        self.draft_when.clear();
    }

    fn draft_mut(&mut self) -> &mut String {
        match self.field { ActiveField::Text => &mut self.draft_text, ActiveField::When => &mut self.draft_when }
    }
}

fn status_label(status: Option<TodoStatus>) -> &'static str {
    status.map(TodoStatus::as_str).unwrap_or("-")
}

async fn run_app<S: TodoService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: S, database_url: String) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, items: vec![], selected: 0, last_tick: Instant::now(), mode: Mode::View, list_state: ListState::default(), field: ActiveField::Text, draft_text: String::new(), draft_when: String::new(), notice: None };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Todos (n: new, r: reload, q: quit)  |  New: Tab switches text/due, Enter to save, Esc to cancel")
                .block(Block::default().borders(Borders::ALL).title("todo-tui"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.items.iter().map(|e| {
                let style = match e.todo.status { Some(TodoStatus::Late) => Style::default().fg(Color::Red), _ => Style::default() };
                ListItem::new(format!("[{:<7}] {}", status_label(e.todo.status), e.todo.text)).style(style)
            }).collect();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("items [{}]", app.items.len())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = app.items.get(app.selected).map(|e| {
                let due = e.todo.when.map(format_due).unwrap_or_else(|| "(none)".to_string());
                let meta = serde_json::to_string_pretty(&e.meta).unwrap_or_default();
                format!("Text:\n{}\n\nDue: {}\nStatus: {}\nId: {}\n\nMeta:\n{}", e.todo.text, due, status_label(e.todo.status), e.todo.id, meta)
            }).unwrap_or_default();
            let details = Paragraph::new(detail)
                .block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let footer_text = match app.mode {
                Mode::View => match &app.notice {
                    Some(notice) => notice.clone(),
                    None => format!("DATABASE_URL={database_url}"),
                },
                Mode::Create => format!("Create — {}: {}_", match app.field { ActiveField::Text => "Text", ActiveField::When => "Due" }, match app.field { ActiveField::Text => &app.draft_text, ActiveField::When => &app.draft_when }),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Down => { if app.selected + 1 < app.items.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Char('n') => { app.clear_draft(); app.mode = Mode::Create; app.notice = None; }
                        KeyCode::Char('r') => { app.notice = None; app.load().await?; }
                        _ => {}
                    },
                    Mode::Create => match key.code {
                        KeyCode::Esc => app.clear_draft(),
                        KeyCode::Enter => {
                            app.submit().await?;
                            app.clear_draft();
                            app.load().await?;
                        }
                        KeyCode::Backspace => { app.draft_mut().pop(); }
                        KeyCode::Char(c) => app.draft_mut().push(c),
                        KeyCode::Tab => { app.field = match app.field { ActiveField::Text => ActiveField::When, ActiveField::When => ActiveField::Text }; }
                        _ => {}
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
