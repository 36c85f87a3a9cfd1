pub mod theme;

use crate::app::{
    AppModel, ChatView, JournalFocus, JournalView, LoginField, LoginMode, LoginView, View,
};
use crate::domain::{Role, format_last_edited};
use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, model: &AppModel) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG)),
        full_area,
    );

    // The navigation bar exists only while signed in.
    let content_area = if model.session.is_some() && full_area.height > 1 {
        render_nav_bar(frame, full_area, model);
        Rect {
            x: full_area.x,
            y: full_area.y.saturating_add(1),
            width: full_area.width,
            height: full_area.height.saturating_sub(1),
        }
    } else {
        full_area
    };

    match &model.view {
        View::Login(login) => render_login(frame, content_area, login),
        View::Journal(journal) => render_journal(frame, content_area, model, journal),
        View::Chat(chat) => render_chat(frame, content_area, model, chat),
    }
}

fn render_nav_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let bar_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1,
    };

    let base_style = Style::default().fg(theme::FG).bg(theme::BAR_BG);
    let active_style = Style::default()
        .fg(Color::Black)
        .bg(theme::ACCENT)
        .add_modifier(Modifier::BOLD);
    let inactive_style = Style::default().fg(theme::MUTED).bg(theme::BAR_BG);

    let (journal_style, chat_style) = match &model.view {
        View::Journal(_) => (active_style, inactive_style),
        View::Chat(_) => (inactive_style, active_style),
        View::Login(_) => (inactive_style, inactive_style),
    };

    let email = model
        .session
        .as_ref()
        .and_then(|session| session.email.clone())
        .unwrap_or_default();
    let right = format!("{email}  Ctrl+O logout ");

    let mut spans = vec![
        Span::styled(" solace ", base_style.add_modifier(Modifier::BOLD)),
        Span::styled(" Journal (^1) ", journal_style),
        Span::styled(" ", base_style),
        Span::styled(" Chat (^2) ", chat_style),
    ];

    let used: usize = spans.iter().map(|span| span.content.width()).sum();
    let remaining = (bar_area.width as usize)
        .saturating_sub(used)
        .saturating_sub(right.width());
    spans.push(Span::styled(" ".repeat(remaining), base_style));
    spans.push(Span::styled(
        right,
        Style::default().fg(theme::DIM).bg(theme::BAR_BG),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base_style), bar_area);
}

fn render_login(frame: &mut Frame, area: Rect, login: &LoginView) {
    let box_width = area.width.clamp(20, 52);
    let box_height = 16.min(area.height);
    let form_area = centered_rect(area, box_width, box_height);

    let title = match login.mode {
        LoginMode::SignIn => "Welcome Back",
        LoginMode::Register => "Create Account",
        LoginMode::Reset => "Reset Password",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(2))
        .title(title)
        .title_style(Style::default().fg(theme::FG).add_modifier(Modifier::BOLD));
    let inner = block.inner(form_area);
    frame.render_widget(Clear, form_area);
    frame.render_widget(block, form_area);

    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = &login.error {
        lines.push(Line::from(Span::styled(
            truncate_end(error, inner.width as usize),
            Style::default().fg(theme::ERROR),
        )));
        lines.push(Line::from(""));
    } else if let Some(success) = &login.success {
        lines.push(Line::from(Span::styled(
            truncate_end(success, inner.width as usize),
            Style::default().fg(theme::SUCCESS),
        )));
        lines.push(Line::from(""));
    }

    let mut cursor: Option<(u16, u16)> = None;
    let field_rows: &[(LoginField, &str)] = match login.mode {
        LoginMode::SignIn => &[(LoginField::Email, "Email"), (LoginField::Password, "Password")],
        LoginMode::Register => &[
            (LoginField::Name, "Name"),
            (LoginField::Email, "Email"),
            (LoginField::Password, "Password"),
        ],
        LoginMode::Reset => &[(LoginField::Email, "Email")],
    };

    for (field, label) in field_rows {
        let editor = match field {
            LoginField::Name => &login.name,
            LoginField::Email => &login.email,
            LoginField::Password => &login.password,
        };
        let shown = if matches!(field, LoginField::Password) {
            "•".repeat(editor.text().chars().count())
        } else {
            editor.text()
        };
        let focused = login.focus == *field && login.token_prompt.is_none();
        let label_style = if focused {
            Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::MUTED)
        };
        if focused {
            let y = inner.y + lines.len() as u16;
            let prefix = format!("{label}: ");
            let before: u16 = shown
                .chars()
                .take(editor.cursor())
                .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0) as u16)
                .sum();
            cursor = Some((inner.x + prefix.width() as u16 + before, y));
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::styled(shown, Style::default().fg(theme::FG)),
        ]));
        lines.push(Line::from(""));
    }

    let action = match login.mode {
        LoginMode::SignIn => "Enter = login",
        LoginMode::Register => "Enter = register",
        LoginMode::Reset => "Enter = send reset email",
    };
    lines.push(Line::from(Span::styled(
        if login.in_flight { "Working…" } else { action },
        Style::default().fg(theme::DIM),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Ctrl+R register  Ctrl+F reset  Ctrl+G Google  Esc back",
        Style::default().fg(theme::DIM),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if let Some(prompt) = &login.token_prompt {
        let overlay = centered_rect(area, area.width.clamp(20, 60), 5);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT))
            .padding(Padding::horizontal(1))
            .title("Paste Google ID token");
        let inner = block.inner(overlay);
        frame.render_widget(Clear, overlay);
        frame.render_widget(block, overlay);
        let text = prompt.text();
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(truncate_start(&text, inner.width as usize)),
                Line::from(Span::styled(
                    "Enter = sign in  Esc = cancel",
                    Style::default().fg(theme::DIM),
                )),
            ]),
            inner,
        );
    } else if let Some((x, y)) = cursor {
        frame.set_cursor_position(Position { x, y });
    }
}

fn render_journal(frame: &mut Frame, area: Rect, model: &AppModel, journal: &JournalView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_composer(frame, chunks[0], journal);
    render_note_list(frame, chunks[1], journal);

    let footer = match journal.focus {
        JournalFocus::Composer => {
            "Type your entry  Ctrl+S/Ctrl+Enter=save  Tab=entries  Ctrl+Q=quit"
        }
        JournalFocus::List => "Up/Down=select  e/Enter=edit  d=delete  Tab=write  Ctrl+Q=quit",
    };
    render_footer(frame, chunks[2], model, footer);

    if let Some(edit) = &journal.edit {
        let overlay = centered_rect(area, area.width.clamp(20, 64), 10.min(area.height));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT))
            .padding(Padding::horizontal(1))
            .title("Edit entry (Ctrl+S save, Esc cancel)");
        let inner = block.inner(overlay);
        frame.render_widget(Clear, overlay);
        frame.render_widget(block, overlay);
        render_multiline_editor(frame, inner, &edit.editor, true);
    }
}

fn render_composer(frame: &mut Frame, area: Rect, journal: &JournalView) {
    let focused = journal.focus == JournalFocus::Composer && journal.edit.is_none();
    let border = if focused { theme::ACCENT } else { theme::BORDER };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .padding(Padding::horizontal(1))
        .title("My Diary");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if journal.composer.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Dear Diary, today I...",
                Style::default().fg(theme::DIM),
            )),
            inner,
        );
        if focused && inner.width > 0 && inner.height > 0 {
            frame.set_cursor_position(Position {
                x: inner.x,
                y: inner.y,
            });
        }
        return;
    }

    render_multiline_editor(frame, inner, &journal.composer, focused);
}

fn render_multiline_editor(
    frame: &mut Frame,
    area: Rect,
    editor: &crate::app::NoteEditor,
    show_cursor: bool,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let all_lines = editor.line_strings();
    let (cursor_row, cursor_col) = editor.cursor();
    let visible_height = area.height as usize;
    let scroll_row = cursor_row.saturating_sub(visible_height.saturating_sub(1));

    let mut lines = Vec::new();
    for offset in 0..visible_height {
        match all_lines.get(scroll_row + offset) {
            Some(line) => lines.push(Line::from(line.clone())),
            None => lines.push(Line::from("")),
        }
    }
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(theme::FG)),
        area,
    );

    if show_cursor {
        let cursor_line = all_lines.get(cursor_row).map(String::as_str).unwrap_or("");
        let x_offset: u16 = cursor_line
            .chars()
            .take(cursor_col)
            .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0) as u16)
            .sum();
        let x = area
            .x
            .saturating_add(x_offset)
            .min(area.x.saturating_add(area.width.saturating_sub(1)));
        let y = area
            .y
            .saturating_add(cursor_row.saturating_sub(scroll_row) as u16);
        frame.set_cursor_position(Position { x, y });
    }
}

fn render_note_list(frame: &mut Frame, area: Rect, journal: &JournalView) {
    let focused = journal.focus == JournalFocus::List && journal.edit.is_none();
    let border = if focused { theme::ACCENT } else { theme::BORDER };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .padding(Padding::horizontal(1))
        .title(format!("Entries ({})", journal.notes.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if journal.notes.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No notes yet. Start writing your first diary entry!",
                Style::default().fg(theme::DIM),
            ))
            .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    // Each entry takes a text line, a timestamp line and a blank spacer.
    let rows_per_note = 3usize;
    let visible = (inner.height as usize / rows_per_note).max(1);
    let first = journal
        .selected
        .saturating_sub(visible.saturating_sub(1))
        .min(journal.notes.len().saturating_sub(1));

    let mut lines: Vec<Line> = Vec::new();
    for (index, note) in journal.notes.iter().enumerate().skip(first).take(visible) {
        let selected = index == journal.selected && focused;
        let text_style = if selected {
            Style::default()
                .fg(theme::FG)
                .bg(theme::SURFACE)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::FG)
        };
        let first_line = note.text.lines().next().unwrap_or("");
        let marker = if selected { "▸ " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!(
                "{marker}{}",
                truncate_end(first_line, (inner.width as usize).saturating_sub(2))
            ),
            text_style,
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", format_last_edited(note.updated_at)),
            Style::default().fg(theme::MUTED),
        )));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_chat(frame: &mut Frame, area: Rect, model: &AppModel, chat: &ChatView) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(area);

    render_thread_sidebar(frame, columns[0], model);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(columns[1]);

    // Mode bar, mirrors the "Advice as:" toggle.
    let mode = model.chat_mode;
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Advice as: ", Style::default().fg(theme::MUTED)),
            Span::styled(
                format!(" {} ", mode.label()),
                Style::default()
                    .fg(Color::Black)
                    .bg(match mode {
                        crate::domain::ChatMode::Friend => theme::ACCENT,
                        crate::domain::ChatMode::Therapist => theme::ACCENT_ALT,
                    })
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  (Tab to switch)", Style::default().fg(theme::DIM)),
        ]))
        .alignment(Alignment::Right),
        main[0],
    );

    render_messages(frame, main[1], model);
    render_chat_input(frame, main[2], model, chat);
    render_footer(
        frame,
        main[3],
        model,
        "Enter=send  Tab=mode  Ctrl+T=new chat  Ctrl+Up/Down=switch chat  Ctrl+Q=quit",
    );
}

fn render_thread_sidebar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1))
        .title("Conversations");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for thread in model.threads.threads() {
        let active = thread.id == model.threads.active_id();
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::MUTED)
        };
        let suffix = if thread.awaiting_reply { " …" } else { "" };
        lines.push(Line::from(Span::styled(
            truncate_end(
                &format!(" {}{suffix} ", thread.name),
                inner.width as usize,
            ),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "+ New Chat (Ctrl+T)",
        Style::default().fg(theme::ACCENT),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_messages(frame: &mut Frame, area: Rect, model: &AppModel) {
    let thread = model.threads.active();

    if thread.messages.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Start a conversation about your mental health…",
                Style::default().fg(theme::DIM),
            ))
            .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let width = (area.width as usize).saturating_sub(2);
    let mut lines: Vec<Line> = Vec::new();
    for message in &thread.messages {
        let (prefix, style, alignment) = match message.role {
            Role::User => (
                "You: ",
                Style::default().fg(theme::ACCENT),
                Alignment::Right,
            ),
            Role::Assistant => ("", Style::default().fg(theme::FG), Alignment::Left),
        };
        for (index, wrapped) in wrap_text(&message.text, width.saturating_sub(prefix.len()))
            .into_iter()
            .enumerate()
        {
            let text = if index == 0 {
                format!("{prefix}{wrapped}")
            } else {
                wrapped
            };
            lines.push(Line::from(Span::styled(text, style)).alignment(alignment));
        }
        lines.push(Line::from(""));
    }
    if thread.awaiting_reply {
        lines.push(Line::from(Span::styled(
            "…",
            Style::default().fg(theme::DIM),
        )));
    }

    // Pin the latest messages to the bottom.
    let height = area.height as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    frame.render_widget(Paragraph::new(visible), area);
}

fn render_chat_input(frame: &mut Frame, area: Rect, model: &AppModel, chat: &ChatView) {
    let awaiting = model.threads.active().awaiting_reply;
    let border = if awaiting { theme::DIM } else { theme::ACCENT };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = chat.input.text();
    if text.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Type your message…",
                Style::default().fg(theme::DIM),
            )),
            inner,
        );
    } else {
        frame.render_widget(
            Paragraph::new(truncate_start(&text, inner.width as usize))
                .style(Style::default().fg(theme::FG)),
            inner,
        );
    }

    if inner.width > 0 && inner.height > 0 {
        let before: u16 = text
            .chars()
            .take(chat.input.cursor())
            .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0) as u16)
            .sum();
        let x = inner
            .x
            .saturating_add(before)
            .min(inner.x.saturating_add(inner.width.saturating_sub(1)));
        frame.set_cursor_position(Position { x, y: inner.y });
    }
}

fn render_footer(frame: &mut Frame, area: Rect, model: &AppModel, keys: &str) {
    let mut spans: Vec<Span<'static>> = vec![Span::styled(
        keys.to_string(),
        Style::default().fg(theme::DIM),
    )];
    if let Some(notice) = model.notice.as_deref() {
        if !notice.trim().is_empty() {
            spans.push(Span::styled(
                format!("  ·  {notice}"),
                Style::default().fg(theme::MUTED),
            ));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn truncate_end(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn truncate_start(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut used = 1;
    let mut start = chars.len();
    while start > 0 {
        let w = UnicodeWidthChar::width(chars[start - 1]).unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        start -= 1;
    }
    let mut out = String::from("…");
    out.extend(&chars[start..]);
    out
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for source_line in text.lines() {
        if source_line.is_empty() {
            out.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_width = 0;
        for word in source_line.split_whitespace() {
            let word_width = word.width();
            if current_width > 0 && current_width + 1 + word_width > width {
                out.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
        }
        if !current.is_empty() || out.is_empty() {
            out.push(current);
        }
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_end_appends_ellipsis() {
        assert_eq!(truncate_end("hello", 10), "hello");
        assert_eq!(truncate_end("hello world", 6), "hello…");
    }

    #[test]
    fn truncate_start_keeps_the_tail() {
        assert_eq!(truncate_start("hello", 10), "hello");
        assert_eq!(truncate_start("hello world", 6), "…world");
    }

    #[test]
    fn wrap_text_respects_width_and_blank_lines() {
        let wrapped = wrap_text("one two three", 7);
        assert_eq!(wrapped, vec!["one two", "three"]);

        let with_blank = wrap_text("a\n\nb", 10);
        assert_eq!(with_blank, vec!["a", "", "b"]);
    }
}
