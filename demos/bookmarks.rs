use std::path::PathBuf;

use crossterm::event::{Event, KeyCode, MouseEventKind};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Scrollbar, ScrollbarOrientation};
use ratatui::Terminal;
use tui_bookmark_tree::settings::{self, Settings};
use tui_bookmark_tree::{Filter, Kind, LoadResult, NodeId, Row, Store, Tree, TreeItem, TreeState};

enum Mode {
    Menu,
    Search { query: String, rows: Row },
}

struct App {
    store: Store,
    show_subtrees_of_matches: bool,
    mode: Mode,
    state: TreeState,
    confirm_delete: Option<NodeId>,
    status: String,
}

/// The items currently shown. Borrows only the store and the mode so the state stays mutable.
fn items<'a>(store: &'a Store, mode: &'a Mode) -> Vec<TreeItem<'a>> {
    match mode {
        Mode::Menu => TreeItem::menu(store.root()),
        Mode::Search { rows, .. } => TreeItem::from_row(rows)
            .map(|root| root.children().to_vec())
            .unwrap_or_default(),
    }
}

impl App {
    fn new(store: Store, settings: &Settings, status: String) -> Self {
        Self {
            store,
            show_subtrees_of_matches: settings.filter.show_subtrees_of_matches,
            mode: Mode::Menu,
            state: TreeState::default(),
            confirm_delete: None,
            status,
        }
    }

    fn title(&self) -> String {
        match &self.mode {
            Mode::Menu => format!("{} (/ search, d delete, q quit)", self.store.root().text()),
            Mode::Search { query, .. } => {
                let subtrees = if self.show_subtrees_of_matches { "on" } else { "off" };
                format!("Search: {query}_ (Tab subtrees {subtrees}, Esc back)")
            }
        }
    }

    fn start_search(&mut self) {
        self.mode = Mode::Search {
            query: String::new(),
            rows: self.store.full_hierarchy(),
        };
        self.state = TreeState::default();
        self.refilter();
    }

    fn edit_query<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut String),
    {
        if let Mode::Search { query, .. } = &mut self.mode {
            edit(query);
        }
        self.refilter();
    }

    /// Apply the query and drop state of items which are gone.
    fn refilter(&mut self) {
        if let Mode::Search { query, rows } = &mut self.mode {
            Filter::new(query)
                .show_subtrees_of_matches(self.show_subtrees_of_matches)
                .apply(rows);
        }
        let items = items(&self.store, &self.mode);
        if matches!(self.mode, Mode::Search { .. }) {
            self.state.open_all(&items);
        }
        self.state.retain_existing(&items);
    }

    fn activate(&mut self) {
        let Some(id) = self.state.selected_id() else {
            return;
        };
        let mut opened = None;
        if self.store.activate(id, |action| opened = Some(action.to_owned())) {
            self.status = format!("Opening {}", opened.unwrap_or_default());
        } else if self.store.find(id).is_some_and(|node| node.kind() == Kind::Group) {
            self.state.toggle_selected();
        }
    }

    fn ask_delete(&mut self) {
        let Some(id) = self.state.selected_id() else {
            return;
        };
        let Some(node) = self.store.find(id) else {
            return;
        };
        self.status = match node.kind() {
            Kind::Separator => "Delete separator? (y/n)".to_owned(),
            Kind::Link | Kind::Group => format!("Delete {}? (y/n)", node.text()),
        };
        self.confirm_delete = Some(id);
    }

    fn delete(&mut self, id: NodeId) {
        if !self.store.delete(id) {
            self.status = format!("{id} does not exist anymore");
            return;
        }
        self.status = match self.store.save() {
            Ok(()) => "Deleted".to_owned(),
            Err(err) => format!("Deleted, but saving failed: {err}"),
        };
        if let Mode::Search { rows, .. } = &mut self.mode {
            *rows = self.store.full_hierarchy();
        }
        self.refilter();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fallback = std::env::current_dir()?;
    let config_dir = settings::config_dir(&fallback);
    let settings = Settings::load(&config_dir)?;
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| settings.resolve(&config_dir).file_path, PathBuf::from);
    if !path.exists() {
        std::fs::write(&path, "")?;
    }

    let (store, result) = Store::open(&path)?;
    let status = match result {
        LoadResult::Created => format!("Created a new bookmark file at {}", path.display()),
        LoadResult::Loaded => format!("Loaded {}", path.display()),
    };
    let app = App::new(store, &settings, status);

    // Terminal initialization
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_app(&mut terminal, app);

    // restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> std::io::Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.size();
            let widget = Tree::new(items(&app.store, &app.mode))
                .block(
                    Block::bordered()
                        .title(app.title())
                        .title_bottom(app.status.as_str()),
                )
                .experimental_scrollbar(Some(
                    Scrollbar::new(ScrollbarOrientation::VerticalRight)
                        .begin_symbol(None)
                        .track_symbol(None)
                        .end_symbol(None),
                ))
                .highlight_style(
                    Style::new()
                        .fg(Color::Black)
                        .bg(Color::LightGreen)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol(">> ");
            frame.render_stateful_widget(widget, area, &mut app.state);
        })?;

        match crossterm::event::read()? {
            Event::Key(key) => {
                if let Some(id) = app.confirm_delete.take() {
                    if key.code == KeyCode::Char('y') {
                        app.delete(id);
                    } else {
                        app.status = "Kept".to_owned();
                    }
                } else if on_key(&mut app, key.code) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => {
                    app.state.scroll_down(1);
                }
                MouseEventKind::ScrollUp => {
                    app.state.scroll_up(1);
                }
                _ => {}
            },
            _ => {}
        }
    }
}

/// Returns `true` when the app should quit.
fn on_key(app: &mut App, code: KeyCode) -> bool {
    let searching = matches!(app.mode, Mode::Search { .. });
    match code {
        KeyCode::Char('q') if !searching => return true,
        KeyCode::Char('/') if !searching => app.start_search(),
        KeyCode::Char('d') if !searching => app.ask_delete(),
        KeyCode::Delete => app.ask_delete(),
        KeyCode::Char(' ') if !searching => {
            app.state.toggle_selected();
        }
        KeyCode::Esc if searching => {
            app.mode = Mode::Menu;
            app.state = TreeState::default();
        }
        KeyCode::Tab if searching => {
            app.show_subtrees_of_matches = !app.show_subtrees_of_matches;
            app.refilter();
        }
        KeyCode::Char(c) if searching => app.edit_query(|query| query.push(c)),
        KeyCode::Backspace if searching => app.edit_query(|query| {
            query.pop();
        }),
        KeyCode::Enter => app.activate(),
        KeyCode::Left => {
            app.state.key_left();
        }
        KeyCode::Right => {
            app.state.key_right();
        }
        KeyCode::Down => {
            app.state.key_down(&items(&app.store, &app.mode));
        }
        KeyCode::Up => {
            app.state.key_up(&items(&app.store, &app.mode));
        }
        KeyCode::Home => {
            app.state.select_first(&items(&app.store, &app.mode));
        }
        KeyCode::End => {
            app.state.select_last(&items(&app.store, &app.mode));
        }
        KeyCode::PageDown => {
            app.state.scroll_down(3);
        }
        KeyCode::PageUp => {
            app.state.scroll_up(3);
        }
        _ => {}
    }
    false
}
