mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{
    AppCommand, AppEvent, AppModel, AuthSignal, FEDERATED_SUCCESS, LOGIN_SUCCESS, NoteWriteTarget,
    REGISTER_SUCCESS,
};
use crate::cli::CliInvocation;
use crate::infra::{
    AuthConfig, AuthConfigError, ChatClient, IdentityClient, NoteStore, NotesSignal,
    NotesSubscription, subscribe_notes,
};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),
}

#[derive(Clone, Debug)]
enum NoteWriteSignal {
    Settled {
        target: NoteWriteTarget,
        result: Result<(), String>,
    },
}

#[derive(Clone, Debug)]
enum ChatSignal {
    Reply {
        thread_id: u64,
        result: Result<String, String>,
    },
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui => Ok(run_tui()?),
    }
}

fn print_help() {
    let text = format!(
        "{name} - journal and supportive-chat companion\n\nUSAGE:\n  {name}                Start the TUI\n  {name} --help | --version\n\nENV:\n  SOLACE_STATE_DIR      Override the state dir (default: ~/.solace)\n  SOLACE_NOTES_DB       Override the notes DB path (default: <state dir>/notes.db)\n  SOLACE_CHAT_URL       Chat completion endpoint (default: http://localhost:8080/get)\n  SOLACE_AUTH_URL       Identity provider base URL (default: https://identitytoolkit.googleapis.com/v1)\n  SOLACE_AUTH_API_KEY   Identity provider API key (required to sign in)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui() -> Result<(), crate::app::AppError> {
    let store = NoteStore::open_default()?;
    let identity = AuthConfig::from_env().map(IdentityClient::new);
    let chat_client = ChatClient::from_env();

    let mut model = AppModel::new();
    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, &mut model, &store, &identity, &chat_client);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let keyboard_flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    let _ = stdout.execute(PushKeyboardEnhancementFlags(keyboard_flags));
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        PopKeyboardEnhancementFlags
    );
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    store: &NoteStore,
    identity: &Result<IdentityClient, AuthConfigError>,
    chat_client: &ChatClient,
) -> Result<(), app::AppError> {
    let (auth_tx, auth_rx) = channel::<AuthSignal>();
    let (note_tx, note_rx) = channel::<NoteWriteSignal>();
    let (chat_tx, chat_rx) = channel::<ChatSignal>();

    let mut notes_subscription: Option<NotesSubscription> = None;
    let mut subscribe_failed_for: Option<String> = None;

    loop {
        while let Ok(signal) = auth_rx.try_recv() {
            model.apply_auth_signal(signal);
        }

        while let Ok(signal) = note_rx.try_recv() {
            match signal {
                NoteWriteSignal::Settled { target, result } => {
                    model.apply_note_write(target, result);
                }
            }
        }

        while let Ok(signal) = chat_rx.try_recv() {
            match signal {
                ChatSignal::Reply { thread_id, result } => {
                    model.apply_chat_reply(thread_id, result);
                }
            }
        }

        ensure_notes_subscription(
            model,
            store,
            &mut notes_subscription,
            &mut subscribe_failed_for,
        );

        if let Some(subscription) = &notes_subscription {
            while let Some(signal) = subscription.try_recv() {
                match signal {
                    NotesSignal::Snapshot(notes) => model.apply_notes_snapshot(notes),
                    NotesSignal::Error(message) => {
                        model.notice = Some(format!("Notes refresh failed: {message}"));
                    }
                }
            }
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if event::poll(Duration::from_millis(200))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let (next, command) = app::update(model.clone(), AppEvent::Key(key));
                    *model = next;
                    match command {
                        AppCommand::None => {}
                        AppCommand::Quit => return Ok(()),
                        AppCommand::SignIn { email, password } => {
                            spawn_auth(identity, &auth_tx, move |client| {
                                match client.sign_in_password(&email, &password) {
                                    Ok(session) => AuthSignal::SignedIn {
                                        session,
                                        notice: LOGIN_SUCCESS,
                                    },
                                    Err(error) => AuthSignal::Failed {
                                        message: error.to_string(),
                                    },
                                }
                            });
                        }
                        AppCommand::Register {
                            name,
                            email,
                            password,
                        } => {
                            let store = store.clone();
                            spawn_auth(identity, &auth_tx, move |client| {
                                let session = match client.register_password(&email, &password) {
                                    Ok(session) => session,
                                    Err(error) => {
                                        return AuthSignal::Failed {
                                            message: error.to_string(),
                                        };
                                    }
                                };
                                if let Err(error) = store.write_profile(&session.uid, &name, &email)
                                {
                                    return AuthSignal::Failed {
                                        message: error.to_string(),
                                    };
                                }
                                AuthSignal::SignedIn {
                                    session,
                                    notice: REGISTER_SUCCESS,
                                }
                            });
                        }
                        AppCommand::SignInFederated { id_token } => {
                            spawn_auth(identity, &auth_tx, move |client| {
                                match client.sign_in_federated(&id_token) {
                                    Ok(session) => AuthSignal::SignedIn {
                                        session,
                                        notice: FEDERATED_SUCCESS,
                                    },
                                    Err(error) => AuthSignal::Failed {
                                        message: error.to_string(),
                                    },
                                }
                            });
                        }
                        AppCommand::SendPasswordReset { email } => {
                            spawn_auth(identity, &auth_tx, move |client| {
                                match client.send_password_reset(&email) {
                                    Ok(()) => AuthSignal::ResetSent,
                                    Err(error) => AuthSignal::Failed {
                                        message: error.to_string(),
                                    },
                                }
                            });
                        }
                        AppCommand::SaveNote { text } => {
                            match model.session.as_ref().map(|session| session.uid.clone()) {
                                Some(uid) => {
                                    let store = store.clone();
                                    let tx = note_tx.clone();
                                    std::thread::spawn(move || {
                                        let result = store
                                            .create_note(&uid, &text)
                                            .map(|_| ())
                                            .map_err(|error| error.to_string());
                                        let _ = tx.send(NoteWriteSignal::Settled {
                                            target: NoteWriteTarget::Create,
                                            result,
                                        });
                                    });
                                }
                                None => {
                                    model
                                        .apply_note_write(NoteWriteTarget::Create, Ok(()));
                                }
                            }
                        }
                        AppCommand::EditNote { id, text } => {
                            let store = store.clone();
                            let tx = note_tx.clone();
                            std::thread::spawn(move || {
                                let result = store
                                    .update_note(&id, &text)
                                    .map(|_| ())
                                    .map_err(|error| error.to_string());
                                let _ = tx.send(NoteWriteSignal::Settled {
                                    target: NoteWriteTarget::Existing(id),
                                    result,
                                });
                            });
                        }
                        AppCommand::DeleteNote { id } => {
                            let store = store.clone();
                            let tx = note_tx.clone();
                            std::thread::spawn(move || {
                                let result = store
                                    .delete_note(&id)
                                    .map(|_| ())
                                    .map_err(|error| error.to_string());
                                let _ = tx.send(NoteWriteSignal::Settled {
                                    target: NoteWriteTarget::Existing(id),
                                    result,
                                });
                            });
                        }
                        AppCommand::SendChat {
                            thread_id,
                            text,
                            mode,
                            username,
                        } => {
                            let client = chat_client.clone();
                            let tx = chat_tx.clone();
                            std::thread::spawn(move || {
                                let result = client
                                    .request_reply(&text, &username, mode)
                                    .map_err(|error| error.to_string());
                                let _ = tx.send(ChatSignal::Reply { thread_id, result });
                            });
                        }
                    }
                }
                Event::Paste(text) => {
                    let (next, _) = app::update(model.clone(), AppEvent::Paste(text));
                    *model = next;
                }
                Event::Resize(width, height) => {
                    model.terminal_size = (width, height);
                }
                _ => {}
            }
        }
    }
}

/// The subscription exists exactly while the journal is on screen with a
/// signed-in user, and always matches that user.
fn ensure_notes_subscription(
    model: &mut AppModel,
    store: &NoteStore,
    subscription: &mut Option<NotesSubscription>,
    failed_for: &mut Option<String>,
) {
    let desired_uid = match (&model.session, &model.view) {
        (Some(session), crate::app::View::Journal(_)) => Some(session.uid.clone()),
        _ => None,
    };

    let Some(uid) = desired_uid else {
        *subscription = None;
        *failed_for = None;
        return;
    };

    if subscription
        .as_ref()
        .is_some_and(|active| active.uid() == uid)
    {
        return;
    }
    if failed_for.as_deref() == Some(uid.as_str()) {
        return;
    }

    // Drop any stale subscription before opening the new one.
    *subscription = None;
    match subscribe_notes(store.clone(), uid.clone()) {
        Ok(active) => {
            *subscription = Some(active);
            *failed_for = None;
        }
        Err(error) => {
            model.notice = Some(format!("Live note updates disabled: {error}"));
            *failed_for = Some(uid);
        }
    }
}

fn spawn_auth<F>(
    identity: &Result<IdentityClient, AuthConfigError>,
    auth_tx: &Sender<AuthSignal>,
    task: F,
) where
    F: FnOnce(&IdentityClient) -> AuthSignal + Send + 'static,
{
    match identity {
        Ok(client) => {
            let client = client.clone();
            let tx = auth_tx.clone();
            std::thread::spawn(move || {
                let _ = tx.send(task(&client));
            });
        }
        Err(error) => {
            let _ = auth_tx.send(AuthSignal::Failed {
                message: error.to_string(),
            });
        }
    }
}
