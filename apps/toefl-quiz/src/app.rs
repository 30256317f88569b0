//! Application state and key handling.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::history::{ExportError, HistoryStore};
use crate::memory::MemoryStore;
use crate::models::RankFilter;
use crate::random::{RandomSource, SystemRandom};
use crate::session::{Phase, Quiz, QuizError, Step};
use crate::speech::{CommandSpeaker, Speaker};
use crate::storage::{MemoryKv, SharedStore, SqliteStore};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::Path;
use std::rc::Rc;

pub struct App {
    pub config: Config,
    pub quiz: Quiz,
    pub speaker: Box<dyn Speaker>,
    pub view: View,
    /// Index into [`RankFilter::choices`] on the home screen.
    pub selected_rank: usize,
    /// Highlighted answer option.
    pub selected_option: usize,
    /// Filter of the word list view.
    pub list_filter: RankFilter,
    pub list_offset: usize,
    /// Set when the configured word list could not be loaded.
    pub catalog_error: Option<String>,
    pub message: Option<(String, MessageType)>,
    pub show_help: bool,
    pub confirm_dialog: Option<ConfirmDialog>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Rank selection.
    Home,
    Quiz,
    /// Final score and review list.
    Results,
    Stats,
    History,
    WordList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    QuitSession,
    ClearHistory,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let (catalog, catalog_error) = match &config.catalog.path {
            Some(path) => match Catalog::from_json_file(path) {
                Ok(catalog) => (catalog, None),
                Err(err) => {
                    tracing::error!(path = %path.display(), error = %err, "word list unavailable");
                    (Catalog::default(), Some(err.to_string()))
                }
            },
            None => (Catalog::bundled(), None),
        };

        let db_path = config.db_path();
        let store = open_store(&db_path);
        let speaker = CommandSpeaker::from_config(&config.speech);
        tracing::debug!(enabled = speaker.is_enabled(), "speech configured");

        let mut app = Self::with_parts(config, catalog, store, Box::new(SystemRandom::new()), Box::new(speaker));
        app.catalog_error = catalog_error;
        tracing::info!(
            words = app.quiz.catalog().len(),
            remembered = app.quiz.memory().len(),
            sessions = app.quiz.history().all().len(),
            db = %db_path.display(),
            "app started"
        );
        Ok(app)
    }

    /// Assemble an app from explicit collaborators.
    pub fn with_parts(
        config: Config,
        catalog: Catalog,
        store: SharedStore,
        rng: Box<dyn RandomSource>,
        speaker: Box<dyn Speaker>,
    ) -> Self {
        let memory = MemoryStore::load(store.clone());
        let history = HistoryStore::load(store);

        Self {
            config,
            quiz: Quiz::new(catalog, memory, history, rng),
            speaker,
            view: View::Home,
            selected_rank: 0,
            selected_option: 0,
            list_filter: RankFilter::All,
            list_offset: 0,
            catalog_error: None,
            message: None,
            show_help: false,
            confirm_dialog: None,
        }
    }

    /// Whether a bare `q` may exit the program.
    pub fn can_quit(&self) -> bool {
        self.confirm_dialog.is_none() && self.view != View::Quiz
    }

    pub fn selected_filter(&self) -> RankFilter {
        RankFilter::choices()
            .get(self.selected_rank)
            .copied()
            .unwrap_or(RankFilter::All)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;

        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.confirm_dialog.is_some() {
            self.handle_confirm_key(key);
            return;
        }

        if key.code == KeyCode::Char('?') {
            self.show_help = true;
            return;
        }
        if key.code == KeyCode::Tab {
            self.next_tab();
            return;
        }

        match self.view {
            View::Home => self.handle_home_key(key),
            View::Quiz => self.handle_quiz_key(key),
            View::Results => self.handle_results_key(key),
            View::Stats => self.handle_back_key(key),
            View::History => self.handle_history_key(key),
            View::WordList => self.handle_word_list_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(dialog) = self.confirm_dialog.take() {
                    self.execute_action(dialog.action);
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.confirm_dialog = None,
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        let count = RankFilter::choices().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_rank = (self.selected_rank + 1).min(count - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_rank = self.selected_rank.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.start_session(self.selected_filter()),
            KeyCode::Char('l') => self.show_word_list(self.selected_filter()),
            KeyCode::Char('s') => self.view = View::Stats,
            KeyCode::Char('h') => self.view = View::History,
            _ => {}
        }
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        match self.quiz.phase() {
            Phase::Presenting => {
                let count = self.quiz.current_question().map_or(0, |q| q.options.len());
                match key.code {
                    KeyCode::Char(c @ '1'..='9') => {
                        let index = c as usize - '1' as usize;
                        self.answer(index);
                    }
                    KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                        self.selected_option = (self.selected_option + 1).min(count - 1);
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.selected_option = self.selected_option.saturating_sub(1);
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => self.answer(self.selected_option),
                    KeyCode::Char('p') => self.speak(),
                    KeyCode::Esc | KeyCode::Char('x') => self.confirm_quit(),
                    _ => {}
                }
            }
            Phase::AwaitingNext => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') => self.advance(),
                KeyCode::Char('p') => self.speak(),
                KeyCode::Esc | KeyCode::Char('x') => self.confirm_quit(),
                _ => {}
            },
            Phase::Finished => self.view = View::Results,
            Phase::Idle => self.view = View::Home,
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => {
                if let Some(filter) = self.quiz.session().map(|s| s.rank_filter()) {
                    self.start_session(filter);
                }
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('b') => self.back_to_home(),
            _ => {}
        }
    }

    fn handle_back_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('b')) {
            self.back_to_home();
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') => {
                if self.quiz.history().is_empty() {
                    self.set_message("History is already empty", MessageType::Info);
                } else {
                    self.confirm_dialog = Some(ConfirmDialog {
                        title: "Clear History".to_string(),
                        message: "Are you sure you want to clear all history? (y/n)".to_string(),
                        action: ConfirmAction::ClearHistory,
                    });
                }
            }
            KeyCode::Char('e') => self.export_history(),
            _ => self.handle_back_key(key),
        }
    }

    fn handle_word_list_key(&mut self, key: KeyEvent) {
        let count = self.quiz.catalog().filter(self.list_filter).len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.list_offset = (self.list_offset + 1).min(count.saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.list_offset = self.list_offset.saturating_sub(1);
            }
            _ => self.handle_back_key(key),
        }
    }

    fn execute_action(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::QuitSession => {
                self.quiz.quit();
                self.view = View::Home;
            }
            ConfirmAction::ClearHistory => match self.quiz.history_mut().clear() {
                Ok(()) => self.set_message("History cleared", MessageType::Success),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to clear history");
                    self.set_message(format!("Failed to clear history: {}", err), MessageType::Error);
                }
            },
        }
    }

    /// Cycle Quiz -> Stats -> History. The quiz tab shows home when no session runs.
    fn next_tab(&mut self) {
        self.view = match self.view {
            View::Home | View::Quiz | View::Results | View::WordList => View::Stats,
            View::Stats => View::History,
            View::History if self.quiz.is_active() => View::Quiz,
            View::History => View::Home,
        };
    }

    pub fn start_session(&mut self, filter: RankFilter) {
        match self.quiz.start(filter) {
            Ok(()) => {
                self.selected_option = 0;
                self.view = View::Quiz;
            }
            Err(err @ QuizError::CatalogUnavailable) => {
                let detail = self.catalog_error.as_deref().unwrap_or("no words loaded");
                self.set_message(format!("{}: {}", err, detail), MessageType::Error);
                self.view = View::Home;
            }
            Err(err @ QuizError::NoWordsAvailable(_)) => {
                self.set_message(format!("{}!", err), MessageType::Warning);
                self.view = View::Home;
            }
        }
    }

    pub fn answer(&mut self, index: usize) {
        if self.quiz.submit_option(index).is_some() {
            self.selected_option = index;
        }
    }

    pub fn advance(&mut self) {
        match self.quiz.advance() {
            Some(Step::Question) => self.selected_option = 0,
            Some(Step::Finished(_)) => self.view = View::Results,
            None => {}
        }
    }

    fn confirm_quit(&mut self) {
        self.confirm_dialog = Some(ConfirmDialog {
            title: "Quit Session".to_string(),
            message: "Quit this session? Progress will not be saved. (y/n)".to_string(),
            action: ConfirmAction::QuitSession,
        });
    }

    fn back_to_home(&mut self) {
        if self.quiz.phase() == Phase::Finished {
            self.quiz.quit();
        }
        self.view = View::Home;
    }

    pub fn show_word_list(&mut self, filter: RankFilter) {
        self.list_filter = filter;
        self.list_offset = 0;
        self.view = View::WordList;
    }

    pub fn export_history(&mut self) {
        let dir = self.config.export_dir();
        match self.quiz.history().export_csv(&dir) {
            Ok(path) => self.set_message(format!("Exported to {}", path.display()), MessageType::Success),
            Err(ExportError::NothingToExport) => self.set_message("No history to export!", MessageType::Warning),
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                self.set_message(format!("Export failed: {}", err), MessageType::Error);
            }
        }
    }

    fn speak(&self) {
        if let Some(question) = self.quiz.current_question() {
            self.speaker.speak(&question.entry.word);
        }
    }

    fn set_message(&mut self, text: impl Into<String>, kind: MessageType) {
        self.message = Some((text.into(), kind));
    }
}

/// Open the database, falling back to an in-memory store so a broken file never stops the app.
fn open_store(path: &Path) -> SharedStore {
    let opened = match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent).map_err(anyhow::Error::from),
        None => Ok(()),
    }
    .and_then(|()| SqliteStore::open(path).map_err(anyhow::Error::from));

    match opened {
        Ok(store) => Rc::new(store),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "database unavailable, progress will not be saved");
            Rc::new(MemoryKv::new())
        }
    }
}
