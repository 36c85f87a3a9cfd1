mod line_editor;
mod note_editor;

pub use line_editor::FieldEditor;
pub use note_editor::NoteEditor;

use crate::domain::{ChatMode, JournalNote, Session, ThreadSet, trimmed_nonempty};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] crate::infra::NoteStoreError),
}

pub const LOGIN_SUCCESS: &str = "Login successful!";
pub const REGISTER_SUCCESS: &str = "Registration successful! You are now logged in.";
pub const FEDERATED_SUCCESS: &str = "Signed in with Google successfully!";
pub const RESET_SENT: &str = "Password reset email sent! Check your inbox.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoginMode {
    SignIn,
    Register,
    Reset,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoginField {
    Name,
    Email,
    Password,
}

#[derive(Clone, Debug)]
pub struct LoginView {
    pub mode: LoginMode,
    pub name: FieldEditor,
    pub email: FieldEditor,
    pub password: FieldEditor,
    pub focus: LoginField,
    pub error: Option<String>,
    pub success: Option<String>,
    /// One auth attempt at a time; submits are ignored while set.
    pub in_flight: bool,
    /// Overlay for pasting an OAuth ID token (federated sign-in).
    pub token_prompt: Option<FieldEditor>,
}

impl LoginView {
    pub fn new() -> Self {
        Self {
            mode: LoginMode::SignIn,
            name: FieldEditor::new(),
            email: FieldEditor::new(),
            password: FieldEditor::new(),
            focus: LoginField::Email,
            error: None,
            success: None,
            in_flight: false,
            token_prompt: None,
        }
    }

    fn set_mode(&mut self, mode: LoginMode) {
        self.mode = mode;
        // Switching form type clears any prior banner.
        self.error = None;
        self.success = None;
        self.focus = match mode {
            LoginMode::Register => LoginField::Name,
            _ => LoginField::Email,
        };
    }

    fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::SignIn => &[LoginField::Email, LoginField::Password],
            LoginMode::Register => &[LoginField::Name, LoginField::Email, LoginField::Password],
            LoginMode::Reset => &[LoginField::Email],
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let fields = self.fields();
        let pos = fields.iter().position(|field| *field == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    fn focused_editor(&mut self) -> &mut FieldEditor {
        match self.focus {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JournalFocus {
    Composer,
    List,
}

#[derive(Clone, Debug)]
pub struct NoteEditState {
    pub id: String,
    pub editor: NoteEditor,
}

#[derive(Clone, Debug)]
pub struct JournalView {
    pub composer: NoteEditor,
    /// Replaced wholesale on every live-query snapshot; never mutated
    /// in place.
    pub notes: Vec<JournalNote>,
    pub selected: usize,
    pub focus: JournalFocus,
    pub edit: Option<NoteEditState>,
}

impl JournalView {
    pub fn new() -> Self {
        Self {
            composer: NoteEditor::new(),
            notes: Vec::new(),
            selected: 0,
            focus: JournalFocus::Composer,
            edit: None,
        }
    }

    fn selected_note(&self) -> Option<&JournalNote> {
        self.notes.get(self.selected)
    }
}

#[derive(Clone, Debug)]
pub struct ChatView {
    pub input: FieldEditor,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            input: FieldEditor::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum View {
    Login(LoginView),
    Journal(JournalView),
    Chat(ChatView),
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub session: Option<Session>,
    pub view: View,
    pub threads: ThreadSet,
    pub chat_mode: ChatMode,
    /// In-flight guards: at most one outstanding create, and at most one
    /// outstanding mutation per note id.
    pub create_in_flight: bool,
    pub note_writes_in_flight: BTreeSet<String>,
    pub notice: Option<String>,
    pub terminal_size: (u16, u16),
}

impl AppModel {
    pub fn new() -> Self {
        Self {
            session: None,
            view: View::Login(LoginView::new()),
            threads: ThreadSet::new(),
            chat_mode: ChatMode::Friend,
            create_in_flight: false,
            note_writes_in_flight: BTreeSet::new(),
            notice: None,
            terminal_size: (0, 0),
        }
    }

    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_size = (width, height);
        self
    }

    /// Navigation gate: without a session every view collapses to login;
    /// with one, the login view redirects to the journal.
    pub fn apply_session(&mut self, session: Option<Session>) {
        self.session = session;
        match (&self.session, &self.view) {
            (None, View::Login(_)) => {}
            (None, _) => self.view = View::Login(LoginView::new()),
            (Some(_), View::Login(_)) => self.view = View::Journal(JournalView::new()),
            (Some(_), _) => {}
        }
    }

    pub fn apply_auth_signal(&mut self, signal: AuthSignal) {
        match signal {
            AuthSignal::SignedIn { session, notice } => {
                if let View::Login(login) = &mut self.view {
                    login.in_flight = false;
                }
                self.notice = Some(notice.to_string());
                self.apply_session(Some(session));
            }
            AuthSignal::ResetSent => {
                if let View::Login(login) = &mut self.view {
                    login.in_flight = false;
                    login.set_mode(LoginMode::SignIn);
                    login.success = Some(RESET_SENT.to_string());
                    login.email.clear();
                }
            }
            AuthSignal::Failed { message } => {
                if let View::Login(login) = &mut self.view {
                    login.in_flight = false;
                    login.error = Some(message);
                    login.success = None;
                }
            }
        }
    }

    /// A full-list snapshot from the live query replaces the displayed list.
    pub fn apply_notes_snapshot(&mut self, notes: Vec<JournalNote>) {
        if let View::Journal(journal) = &mut self.view {
            journal.notes = notes;
            if journal.selected >= journal.notes.len() {
                journal.selected = journal.notes.len().saturating_sub(1);
            }
        }
    }

    pub fn apply_note_write(&mut self, target: NoteWriteTarget, result: Result<(), String>) {
        match target {
            NoteWriteTarget::Create => self.create_in_flight = false,
            NoteWriteTarget::Existing(id) => {
                self.note_writes_in_flight.remove(&id);
            }
        }
        if let Err(message) = result {
            self.notice = Some(message);
        }
    }

    pub fn apply_chat_reply(&mut self, thread_id: u64, result: Result<String, String>) {
        self.threads.append_reply(thread_id, result);
    }

    fn chat_username(&self) -> String {
        self.session
            .as_ref()
            .map(|session| session.chat_username().to_string())
            .unwrap_or_else(|| crate::domain::FALLBACK_USERNAME.to_string())
    }
}

/// Session-change and worker outcomes applied between key events.
#[derive(Clone, Debug)]
pub enum AuthSignal {
    SignedIn {
        session: Session,
        notice: &'static str,
    },
    ResetSent,
    Failed {
        message: String,
    },
}

#[derive(Clone, Debug)]
pub enum NoteWriteTarget {
    Create,
    Existing(String),
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
}

/// Side effects requested by `update`; executed by the main loop on worker
/// threads.
#[derive(Clone, Debug, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    SignIn {
        email: String,
        password: String,
    },
    Register {
        name: String,
        email: String,
        password: String,
    },
    SignInFederated {
        id_token: String,
    },
    SendPasswordReset {
        email: String,
    },
    SaveNote {
        text: String,
    },
    EditNote {
        id: String,
        text: String,
    },
    DeleteNote {
        id: String,
    },
    SendChat {
        thread_id: u64,
        text: String,
        mode: ChatMode,
        username: String,
    },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
    }
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    model.notice = None;

    let command_modifier = key.modifiers.contains(KeyModifiers::CONTROL)
        || key.modifiers.contains(KeyModifiers::SUPER)
        || key.modifiers.contains(KeyModifiers::META);

    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return (model, AppCommand::Quit);
    }

    if model.session.is_some() {
        if command_modifier && matches!(key.code, KeyCode::Char('1')) {
            if !matches!(model.view, View::Journal(_)) {
                model.view = View::Journal(JournalView::new());
            }
            return (model, AppCommand::None);
        }
        if command_modifier && matches!(key.code, KeyCode::Char('2')) {
            if !matches!(model.view, View::Chat(_)) {
                model.view = View::Chat(ChatView::new());
            }
            return (model, AppCommand::None);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o') {
            model.apply_session(None);
            return (model, AppCommand::None);
        }
    }

    let view = std::mem::replace(&mut model.view, View::Login(LoginView::new()));
    match view {
        View::Login(login) => update_login_key(model, login, key),
        View::Journal(journal) => update_journal_key(model, journal, key),
        View::Chat(chat) => update_chat_key(model, chat, key),
    }
}

fn update_on_paste(mut model: AppModel, text: String) -> (AppModel, AppCommand) {
    match &mut model.view {
        View::Login(login) => {
            if let Some(prompt) = &mut login.token_prompt {
                prompt.insert_str(&text);
            } else {
                login.focused_editor().insert_str(&text);
            }
        }
        View::Journal(journal) => match &mut journal.edit {
            Some(edit) => edit.editor.insert_str(&text),
            None => journal.composer.insert_str(&text),
        },
        View::Chat(chat) => chat.input.insert_str(&text),
    }
    (model, AppCommand::None)
}

fn update_login_key(
    mut model: AppModel,
    mut login: LoginView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    // Token paste overlay takes every key while open.
    if let Some(prompt) = &mut login.token_prompt {
        match key.code {
            KeyCode::Esc => login.token_prompt = None,
            KeyCode::Enter => {
                let token = prompt.text().trim().to_string();
                login.token_prompt = None;
                if !token.is_empty() && !login.in_flight {
                    login.in_flight = true;
                    login.error = None;
                    login.success = None;
                    model.view = View::Login(login);
                    return (model, AppCommand::SignInFederated { id_token: token });
                }
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Left => prompt.move_left(),
            KeyCode::Right => prompt.move_right(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.insert_char(ch)
            }
            _ => {}
        }
        model.view = View::Login(login);
        return (model, AppCommand::None);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('r') => {
                let next = match login.mode {
                    LoginMode::Register => LoginMode::SignIn,
                    _ => LoginMode::Register,
                };
                login.set_mode(next);
                model.view = View::Login(login);
                return (model, AppCommand::None);
            }
            KeyCode::Char('f') => {
                let next = match login.mode {
                    LoginMode::Reset => LoginMode::SignIn,
                    _ => LoginMode::Reset,
                };
                login.set_mode(next);
                model.view = View::Login(login);
                return (model, AppCommand::None);
            }
            KeyCode::Char('g') => {
                login.token_prompt = Some(FieldEditor::new());
                model.view = View::Login(login);
                return (model, AppCommand::None);
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Esc => login.set_mode(LoginMode::SignIn),
        KeyCode::Tab | KeyCode::Down => login.cycle_focus(true),
        KeyCode::BackTab | KeyCode::Up => login.cycle_focus(false),
        KeyCode::Enter => {
            let command = submit_login(&mut login);
            model.view = View::Login(login);
            return (model, command);
        }
        KeyCode::Backspace => login.focused_editor().backspace(),
        KeyCode::Delete => login.focused_editor().delete_forward(),
        KeyCode::Left => login.focused_editor().move_left(),
        KeyCode::Right => login.focused_editor().move_right(),
        KeyCode::Home => login.focused_editor().move_home(),
        KeyCode::End => login.focused_editor().move_end(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            login.focused_editor().insert_char(ch)
        }
        _ => {}
    }

    model.view = View::Login(login);
    (model, AppCommand::None)
}

fn submit_login(login: &mut LoginView) -> AppCommand {
    if login.in_flight {
        return AppCommand::None;
    }

    let email = login.email.text().trim().to_string();
    let password = login.password.text();
    let name = login.name.text().trim().to_string();

    // Empty required fields are a silent no-op, like an unmet `required`
    // attribute on the source form.
    let command = match login.mode {
        LoginMode::SignIn => {
            if email.is_empty() || password.is_empty() {
                return AppCommand::None;
            }
            AppCommand::SignIn { email, password }
        }
        LoginMode::Register => {
            if name.is_empty() || email.is_empty() || password.is_empty() {
                return AppCommand::None;
            }
            AppCommand::Register {
                name,
                email,
                password,
            }
        }
        LoginMode::Reset => {
            if email.is_empty() {
                return AppCommand::None;
            }
            AppCommand::SendPasswordReset { email }
        }
    };

    login.in_flight = true;
    login.error = None;
    login.success = None;
    command
}

fn update_journal_key(
    mut model: AppModel,
    mut journal: JournalView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    let save_combo = matches!(key.code, KeyCode::Enter)
        && key.modifiers.contains(KeyModifiers::CONTROL)
        || matches!(key.code, KeyCode::Char('s')) && key.modifiers.contains(KeyModifiers::CONTROL);

    // Inline edit overlay.
    if let Some(edit) = &mut journal.edit {
        if save_combo {
            let id = edit.id.clone();
            let text = edit.editor.text();
            journal.edit = None;
            if model.note_writes_in_flight.contains(&id) {
                model.notice = Some("A change to this note is still saving.".to_string());
                model.view = View::Journal(journal);
                return (model, AppCommand::None);
            }
            model.note_writes_in_flight.insert(id.clone());
            model.view = View::Journal(journal);
            return (model, AppCommand::EditNote { id, text });
        }
        match key.code {
            KeyCode::Esc => journal.edit = None,
            KeyCode::Enter => edit.editor.insert_newline(),
            KeyCode::Backspace => edit.editor.backspace(),
            KeyCode::Delete => edit.editor.delete_forward(),
            KeyCode::Left => edit.editor.move_left(),
            KeyCode::Right => edit.editor.move_right(),
            KeyCode::Up => edit.editor.move_up(),
            KeyCode::Down => edit.editor.move_down(),
            KeyCode::Home => edit.editor.move_home(),
            KeyCode::End => edit.editor.move_end(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                edit.editor.insert_char(ch)
            }
            _ => {}
        }
        model.view = View::Journal(journal);
        return (model, AppCommand::None);
    }

    if key.code == KeyCode::Tab {
        journal.focus = match journal.focus {
            JournalFocus::Composer => JournalFocus::List,
            JournalFocus::List => JournalFocus::Composer,
        };
        model.view = View::Journal(journal);
        return (model, AppCommand::None);
    }

    match journal.focus {
        JournalFocus::Composer => {
            if save_combo {
                let Some(text) = trimmed_nonempty(&journal.composer.text()).map(str::to_string)
                else {
                    model.view = View::Journal(journal);
                    return (model, AppCommand::None);
                };
                if model.create_in_flight {
                    model.notice = Some("The previous entry is still saving.".to_string());
                    model.view = View::Journal(journal);
                    return (model, AppCommand::None);
                }
                // Input clears on issuance; the list catches up when the
                // store pushes the next snapshot.
                journal.composer.clear();
                model.create_in_flight = true;
                model.view = View::Journal(journal);
                return (model, AppCommand::SaveNote { text });
            }
            match key.code {
                KeyCode::Enter => journal.composer.insert_newline(),
                KeyCode::Backspace => journal.composer.backspace(),
                KeyCode::Delete => journal.composer.delete_forward(),
                KeyCode::Left => journal.composer.move_left(),
                KeyCode::Right => journal.composer.move_right(),
                KeyCode::Up => journal.composer.move_up(),
                KeyCode::Down => journal.composer.move_down(),
                KeyCode::Home => journal.composer.move_home(),
                KeyCode::End => journal.composer.move_end(),
                KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    journal.composer.insert_char(ch)
                }
                _ => {}
            }
        }
        JournalFocus::List => match key.code {
            KeyCode::Up => journal.selected = journal.selected.saturating_sub(1),
            KeyCode::Down => {
                if journal.selected + 1 < journal.notes.len() {
                    journal.selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(note) = journal.selected_note() {
                    journal.edit = Some(NoteEditState {
                        id: note.id.clone(),
                        editor: NoteEditor::from_text(&note.text),
                    });
                }
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                if let Some(note) = journal.selected_note() {
                    let id = note.id.clone();
                    if model.note_writes_in_flight.contains(&id) {
                        model.notice = Some("A change to this note is still saving.".to_string());
                        model.view = View::Journal(journal);
                        return (model, AppCommand::None);
                    }
                    model.note_writes_in_flight.insert(id.clone());
                    model.view = View::Journal(journal);
                    return (model, AppCommand::DeleteNote { id });
                }
            }
            _ => {}
        },
    }

    model.view = View::Journal(journal);
    (model, AppCommand::None)
}

fn update_chat_key(
    mut model: AppModel,
    mut chat: ChatView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('t') => {
                model.threads.create_thread();
                model.view = View::Chat(chat);
                return (model, AppCommand::None);
            }
            KeyCode::Up => {
                model.threads.switch_relative(-1);
                model.view = View::Chat(chat);
                return (model, AppCommand::None);
            }
            KeyCode::Down => {
                model.threads.switch_relative(1);
                model.view = View::Chat(chat);
                return (model, AppCommand::None);
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Tab => model.chat_mode = model.chat_mode.toggle(),
        KeyCode::Enter => {
            let Some(text) = trimmed_nonempty(&chat.input.text()).map(str::to_string) else {
                model.view = View::Chat(chat);
                return (model, AppCommand::None);
            };
            let thread_id = model.threads.active_id();
            if model.threads.active().awaiting_reply {
                model.notice = Some("Still waiting for the current reply.".to_string());
                model.view = View::Chat(chat);
                return (model, AppCommand::None);
            }
            // The user's message is visible immediately, before any network
            // round-trip.
            model.threads.append_user(thread_id, text.clone());
            chat.input.clear();
            let username = model.chat_username();
            let mode = model.chat_mode;
            model.view = View::Chat(chat);
            return (
                model,
                AppCommand::SendChat {
                    thread_id,
                    text,
                    mode,
                    username,
                },
            );
        }
        KeyCode::Backspace => chat.input.backspace(),
        KeyCode::Delete => chat.input.delete_forward(),
        KeyCode::Left => chat.input.move_left(),
        KeyCode::Right => chat.input.move_right(),
        KeyCode::Home => chat.input.move_home(),
        KeyCode::End => chat.input.move_end(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            chat.input.insert_char(ch)
        }
        _ => {}
    }

    model.view = View::Chat(chat);
    (model, AppCommand::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{REPLY_FAILURE_TEXT, Role};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::CONTROL))
    }

    fn signed_in_model() -> AppModel {
        let mut model = AppModel::new();
        model.apply_session(Some(Session {
            uid: "u1".to_string(),
            email: Some("a@x.com".to_string()),
        }));
        model
    }

    fn type_text(mut model: AppModel, text: &str) -> AppModel {
        for ch in text.chars() {
            let (next, _) = update(model, key(KeyCode::Char(ch)));
            model = next;
        }
        model
    }

    #[test]
    fn no_session_stays_on_login() {
        let mut model = AppModel::new();
        model.view = View::Journal(JournalView::new());
        model.apply_session(None);
        assert!(matches!(model.view, View::Login(_)));
    }

    #[test]
    fn session_redirects_login_to_journal() {
        let model = signed_in_model();
        assert!(matches!(model.view, View::Journal(_)));
    }

    #[test]
    fn session_loss_collapses_any_view_to_login() {
        let mut model = signed_in_model();
        model.view = View::Chat(ChatView::new());
        model.apply_session(None);
        assert!(matches!(model.view, View::Login(_)));
    }

    #[test]
    fn login_submit_builds_sign_in_command() {
        let mut model = AppModel::new();
        model = type_text(model, "a@x.com");
        let (mut model, _) = update(model, key(KeyCode::Tab));
        model = type_text(model, "secret");
        let (model, command) = update(model, key(KeyCode::Enter));

        assert_eq!(
            command,
            AppCommand::SignIn {
                email: "a@x.com".to_string(),
                password: "secret".to_string(),
            }
        );
        let View::Login(login) = &model.view else {
            panic!("expected login view");
        };
        assert!(login.in_flight);
    }

    #[test]
    fn login_submit_with_empty_fields_is_a_no_op() {
        let model = AppModel::new();
        let (model, command) = update(model, key(KeyCode::Enter));
        assert_eq!(command, AppCommand::None);
        let View::Login(login) = &model.view else {
            panic!("expected login view");
        };
        assert!(!login.in_flight);
    }

    #[test]
    fn second_login_submit_is_ignored_while_in_flight() {
        let mut model = AppModel::new();
        model = type_text(model, "a@x.com");
        let (mut model, _) = update(model, key(KeyCode::Tab));
        model = type_text(model, "secret");
        let (model, first) = update(model, key(KeyCode::Enter));
        assert!(matches!(first, AppCommand::SignIn { .. }));

        // Field contents are retained, so a second Enter would resubmit if
        // the guard were missing.
        let mut model = model;
        if let View::Login(login) = &mut model.view {
            login.email.insert_str("a@x.com");
            login.password.insert_str("secret");
        }
        let (_, second) = update(model, key(KeyCode::Enter));
        assert_eq!(second, AppCommand::None);
    }

    #[test]
    fn auth_failure_surfaces_provider_message_verbatim() {
        let mut model = AppModel::new();
        model.apply_auth_signal(AuthSignal::Failed {
            message: "EMAIL_NOT_FOUND".to_string(),
        });
        let View::Login(login) = &model.view else {
            panic!("expected login view");
        };
        assert_eq!(login.error.as_deref(), Some("EMAIL_NOT_FOUND"));
        assert!(!login.in_flight);
    }

    #[test]
    fn whitespace_journal_entry_saves_nothing() {
        let mut model = signed_in_model();
        model = type_text(model, "   ");
        let (model, command) = update(model, ctrl(KeyCode::Char('s')));
        assert_eq!(command, AppCommand::None);
        assert!(!model.create_in_flight);
    }

    #[test]
    fn journal_save_clears_composer_and_issues_create() {
        let mut model = signed_in_model();
        model = type_text(model, "dear diary");
        let (model, command) = update(model, ctrl(KeyCode::Char('s')));

        assert_eq!(
            command,
            AppCommand::SaveNote {
                text: "dear diary".to_string()
            }
        );
        assert!(model.create_in_flight);
        let View::Journal(journal) = &model.view else {
            panic!("expected journal view");
        };
        assert!(journal.composer.is_empty());
    }

    #[test]
    fn second_save_while_create_in_flight_is_rejected() {
        let mut model = signed_in_model();
        model = type_text(model, "one");
        let (mut model, _) = update(model, ctrl(KeyCode::Char('s')));
        model = type_text(model, "two");
        let (model, command) = update(model, ctrl(KeyCode::Char('s')));
        assert_eq!(command, AppCommand::None);
        assert!(model.notice.is_some());
    }

    fn journal_with_note(model: &mut AppModel, id: &str, text: &str) {
        model.apply_notes_snapshot(vec![JournalNote {
            id: id.to_string(),
            uid: "u1".to_string(),
            text: text.to_string(),
            created_at: None,
            updated_at: None,
        }]);
    }

    #[test]
    fn delete_is_rejected_while_note_mutation_in_flight() {
        let mut model = signed_in_model();
        journal_with_note(&mut model, "n1", "hello");
        model.note_writes_in_flight.insert("n1".to_string());

        let (model, _) = update(model, key(KeyCode::Tab));
        let (model, command) = update(model, key(KeyCode::Char('d')));
        assert_eq!(command, AppCommand::None);
        assert!(model.notice.is_some());
    }

    #[test]
    fn delete_issues_command_and_marks_note_in_flight() {
        let mut model = signed_in_model();
        journal_with_note(&mut model, "n1", "hello");

        let (model, _) = update(model, key(KeyCode::Tab));
        let (model, command) = update(model, key(KeyCode::Char('d')));
        assert_eq!(
            command,
            AppCommand::DeleteNote {
                id: "n1".to_string()
            }
        );
        assert!(model.note_writes_in_flight.contains("n1"));
    }

    #[test]
    fn edit_overlay_saves_without_validating_empty_text() {
        let mut model = signed_in_model();
        journal_with_note(&mut model, "n1", "hello");

        let (model, _) = update(model, key(KeyCode::Tab));
        let (mut model, _) = update(model, key(KeyCode::Char('e')));
        // Wipe the text entirely; the edit still goes through.
        for _ in 0..5 {
            let (next, _) = update(model, key(KeyCode::Backspace));
            model = next;
        }
        let (_, command) = update(model, ctrl(KeyCode::Char('s')));
        assert_eq!(
            command,
            AppCommand::EditNote {
                id: "n1".to_string(),
                text: String::new(),
            }
        );
    }

    #[test]
    fn note_write_settlement_clears_guard_and_surfaces_errors() {
        let mut model = signed_in_model();
        model.create_in_flight = true;
        model.apply_note_write(NoteWriteTarget::Create, Ok(()));
        assert!(!model.create_in_flight);

        model.note_writes_in_flight.insert("n1".to_string());
        model.apply_note_write(
            NoteWriteTarget::Existing("n1".to_string()),
            Err("disk I/O error".to_string()),
        );
        assert!(!model.note_writes_in_flight.contains("n1"));
        assert_eq!(model.notice.as_deref(), Some("disk I/O error"));
    }

    fn chat_model() -> AppModel {
        let mut model = signed_in_model();
        model.view = View::Chat(ChatView::new());
        model
    }

    #[test]
    fn chat_send_appends_user_message_before_any_network() {
        let mut model = chat_model();
        model = type_text(model, "hello");
        let (model, command) = update(model, key(KeyCode::Enter));

        assert_eq!(
            command,
            AppCommand::SendChat {
                thread_id: 1,
                text: "hello".to_string(),
                mode: ChatMode::Friend,
                username: "a@x.com".to_string(),
            }
        );
        let messages = &model.threads.active().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "hello");
        assert!(model.threads.active().awaiting_reply);
    }

    #[test]
    fn whitespace_chat_message_sends_nothing() {
        let mut model = chat_model();
        model = type_text(model, "   ");
        let (model, command) = update(model, key(KeyCode::Enter));
        assert_eq!(command, AppCommand::None);
        assert!(model.threads.active().messages.is_empty());
    }

    #[test]
    fn second_send_is_rejected_while_awaiting_reply() {
        let mut model = chat_model();
        model = type_text(model, "first");
        let (mut model, _) = update(model, key(KeyCode::Enter));

        model = type_text(model, "second");
        let (model, command) = update(model, key(KeyCode::Enter));
        assert_eq!(command, AppCommand::None);
        assert_eq!(model.threads.active().messages.len(), 1);
    }

    #[test]
    fn failed_reply_becomes_one_fixed_assistant_message() {
        let mut model = chat_model();
        model = type_text(model, "hello");
        let (mut model, _) = update(model, key(KeyCode::Enter));

        model.apply_chat_reply(1, Err("connection refused".to_string()));

        let messages = &model.threads.active().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, REPLY_FAILURE_TEXT);
        assert!(!model.threads.active().awaiting_reply);

        // The thread remains usable afterwards.
        model = type_text(model, "again");
        let (_, command) = update(model, key(KeyCode::Enter));
        assert!(matches!(command, AppCommand::SendChat { .. }));
    }

    #[test]
    fn mode_toggle_flips_between_friend_and_therapist() {
        let model = chat_model();
        assert_eq!(model.chat_mode, ChatMode::Friend);
        let (model, _) = update(model, key(KeyCode::Tab));
        assert_eq!(model.chat_mode, ChatMode::Therapist);
    }

    #[test]
    fn new_thread_key_creates_and_activates_fresh_thread() {
        let mut model = chat_model();
        model = type_text(model, "hi");
        let (model, _) = update(model, key(KeyCode::Enter));

        let (model, _) = update(model, ctrl(KeyCode::Char('t')));
        assert_eq!(model.threads.active_id(), 2);
        assert!(model.threads.active().messages.is_empty());
    }

    #[test]
    fn nav_keys_switch_views_only_with_session() {
        let model = AppModel::new();
        let (model, _) = update(model, ctrl(KeyCode::Char('2')));
        assert!(matches!(model.view, View::Login(_)));

        let model = signed_in_model();
        let (model, _) = update(model, ctrl(KeyCode::Char('2')));
        assert!(matches!(model.view, View::Chat(_)));
        let (model, _) = update(model, ctrl(KeyCode::Char('1')));
        assert!(matches!(model.view, View::Journal(_)));
    }

    #[test]
    fn sign_out_key_clears_session_and_returns_to_login() {
        let model = signed_in_model();
        let (model, _) = update(model, ctrl(KeyCode::Char('o')));
        assert!(model.session.is_none());
        assert!(matches!(model.view, View::Login(_)));
    }

    #[test]
    fn snapshot_replaces_list_wholesale() {
        let mut model = signed_in_model();
        journal_with_note(&mut model, "n1", "old");
        model.apply_notes_snapshot(Vec::new());
        let View::Journal(journal) = &model.view else {
            panic!("expected journal view");
        };
        assert!(journal.notes.is_empty());
        assert_eq!(journal.selected, 0);
    }
}
