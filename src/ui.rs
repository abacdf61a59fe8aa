use apex_chat::render::{self, Align, Body, Border, Bubble, OfferCard, Tone};
use apex_chat::Role;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, InputMode};

const EMPTY_HINT: &str = "Start the conversation by typing a message below.";
const PLACEHOLDER: &str = "Ask me anything...";

/// Wrap text to fit within a given width, returning multiple lines.
/// Breaks on word boundaries; a word longer than the width gets its own line.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" APEX-GPT ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "The First AI Agent Integrated with APEX-402 ",
            Style::default().fg(Color::Gray),
        ),
        Span::styled(" demo ", Style::default().bg(Color::Blue).fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    let lines = chat_lines(app, inner.width as usize);

    app.chat_height = inner.height;
    app.total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    app.scroll = if app.follow {
        app.max_scroll()
    } else {
        app.scroll.min(app.max_scroll())
    };

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.scroll, 0));
    frame.render_widget(chat, area);
}

/// Every line of the message list, already wrapped to `width`
fn chat_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let messages = app.conversation.messages();
    let pending = app.conversation.is_pending();

    if messages.is_empty() && !pending {
        return vec![Line::from(Span::styled(
            EMPTY_HINT,
            Style::default().fg(Color::DarkGray),
        ))];
    }

    // Bubbles take at most 80% of the row
    let bubble_width = (width * 4 / 5).max(10);
    let mut lines = Vec::new();

    for (idx, message) in messages.iter().enumerate() {
        let focused = app.focused_card.filter(|(m, _)| *m == idx).map(|(_, c)| c);
        push_bubble(&mut lines, &render::bubble(message), message.role(), bubble_width, focused);
        lines.push(Line::default());
    }

    if pending {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(app.animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("AI is thinking{dots}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_bubble(
    lines: &mut Vec<Line<'static>>,
    bubble: &Bubble,
    role: Role,
    width: usize,
    focused_card: Option<usize>,
) {
    let alignment = match bubble.align {
        Align::Left => Alignment::Left,
        Align::Right => Alignment::Right,
    };
    let (label, label_color) = match role {
        Role::User => ("You", Color::Cyan),
        Role::Assistant => ("APEX-GPT", Color::Yellow),
    };
    let text_style = match bubble.tone {
        Tone::Outlined => Style::default().fg(Color::Cyan),
        Tone::Filled => Style::default(),
    };

    lines.push(
        Line::from(Span::styled(
            label,
            Style::default().fg(label_color).add_modifier(Modifier::BOLD),
        ))
        .alignment(alignment),
    );

    match &bubble.body {
        Body::Text(text) => {
            for raw in text.lines() {
                for wrapped in wrap_text_to_width(raw, width) {
                    lines.push(Line::styled(wrapped, text_style).alignment(alignment));
                }
            }
        }
        Body::Offers { heading, cards } => {
            for raw in heading {
                for wrapped in wrap_text_to_width(raw, width) {
                    lines.push(Line::styled(wrapped, Style::default().bold()));
                }
            }
            for (i, card) in cards.iter().enumerate() {
                lines.push(Line::default());
                push_card(lines, card, width, focused_card == Some(i));
            }
        }
    }
}

fn push_card(lines: &mut Vec<Line<'static>>, card: &OfferCard, width: usize, focused: bool) {
    let mut edge = match card.border {
        Border::Highlight => Style::default().fg(Color::Yellow),
        Border::Plain => Style::default().fg(Color::DarkGray),
    };
    if focused {
        edge = edge.fg(Color::Cyan).add_modifier(Modifier::BOLD);
    }
    let inner = width.saturating_sub(2).max(1);

    let mut top = vec![
        Span::styled("╭─ ", edge),
        Span::styled(card.title.clone(), Style::default().bold()),
    ];
    if let Some(badge) = card.badge {
        top.push(Span::raw(" "));
        top.push(Span::styled(
            format!(" {badge} "),
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ));
    }
    lines.push(Line::from(top));

    if let Some(note) = card.note {
        for wrapped in wrap_text_to_width(note, inner) {
            lines.push(Line::from(vec![
                Span::styled("│ ", edge),
                Span::styled(wrapped, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            ]));
        }
    }

    for (label, value) in &card.details {
        for (n, wrapped) in wrap_text_to_width(&format!("{label}: {value}"), inner)
            .into_iter()
            .enumerate()
        {
            let spans = match wrapped.strip_prefix(&format!("{label}:")) {
                Some(rest) if n == 0 => vec![
                    Span::styled("│ ", edge),
                    Span::styled(format!("{label}:"), Style::default().bold()),
                    Span::raw(rest.to_string()),
                ],
                _ => vec![Span::styled("│ ", edge), Span::raw(wrapped)],
            };
            lines.push(Line::from(spans));
        }
    }

    let link_hint = if focused { "  (Enter to open)" } else { "" };
    lines.push(Line::from(vec![
        Span::styled("╰─ ", edge),
        Span::styled(
            format!("↗ {}", card.link.href),
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        ),
        Span::styled(link_hint, Style::default().fg(Color::DarkGray)),
    ]));
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = match (editing, app.can_send()) {
        (true, true) => Color::Yellow,
        (true, false) => Color::Gray,
        (false, _) => Color::DarkGray,
    };

    let title = if app.conversation.is_pending() {
        " Waiting for reply… "
    } else {
        " Message "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling to keep the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible, cursor_col) = input_window(&app.input, app.cursor, inner_width);

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(block), area);

    if editing {
        let cursor_x = u16::try_from(cursor_col).unwrap_or(0);
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// The slice of `input` that fits in `width` terminal columns with the
/// cursor (a char index) in view, and the cursor's column within it.
/// Columns are display widths, so wide characters take two.
fn input_window(input: &str, cursor: usize, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }

    let chars: Vec<(char, usize)> = input
        .chars()
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(0)))
        .collect();
    let cursor = cursor.min(chars.len());

    // Drop leading chars until the cursor cell fits
    let mut start = 0;
    let mut cursor_col: usize = chars[..cursor].iter().map(|(_, w)| w).sum();
    while cursor_col >= width && start < cursor {
        cursor_col -= chars[start].1;
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for &(c, w) in &chars[start..] {
        if used + w > width {
            break;
        }
        visible.push(c);
        used += w;
    }

    (visible, cursor_col)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let mut hints = vec![Span::styled(mode, mode_style), Span::raw(" ")];
    let pairs: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " browse "), (" Ctrl-C ", " quit ")],
        InputMode::Normal => &[
            (" j/k ", " scroll "),
            (" Tab ", " next offer "),
            (" Enter ", " open "),
            (" i ", " type "),
            (" q ", " quit "),
        ],
    };
    for (key, label) in pairs {
        hints.push(Span::styled(*key, key_style));
        hints.push(Span::styled(*label, label_style));
    }

    if app.input_mode == InputMode::Editing && !app.can_send() {
        hints.push(Span::styled(
            " send disabled ",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_chat::ScriptedReply;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_wrap_text_to_width() {
        assert_eq!(wrap_text_to_width("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap_text_to_width("", 4), vec![""]);
        assert_eq!(wrap_text_to_width("toolongword x", 4), vec!["toolongword", "x"]);
    }

    #[test]
    fn test_empty_conversation_shows_hint() {
        let mut app = App::new(Arc::new(ScriptedReply::default()));
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Start the conversation"));
        assert!(text.contains("send disabled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_offers_render_with_one_sponsored_badge() {
        let generator = ScriptedReply::default().with_delay(Duration::from_millis(10));
        let mut app = App::new(Arc::new(generator));
        app.input = "Find me a flight London to Dubai".to_string();
        app.submit_input();

        let mut terminal = Terminal::new(TestBackend::new(100, 60)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(screen_text(&terminal).contains("AI is thinking"));

        let outcome = app.next_reply().await;
        app.finish_reply(outcome);
        terminal.draw(|f| render(&mut app, f)).unwrap();

        let text = screen_text(&terminal);
        assert_eq!(text.matches("Sponsored").count(), 1);
        assert!(text.contains("Recommended for top-tier comfort"));
        assert!(text.contains("Qatar Airways – QR 012"));
        assert!(!text.contains("AI is thinking"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_messages_scroll_chat_to_bottom() {
        let generator = ScriptedReply::default().with_delay(Duration::from_millis(10));
        let mut app = App::new(Arc::new(generator));
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();

        app.input = "first trip".to_string();
        app.submit_input();
        let outcome = app.next_reply().await;
        app.finish_reply(outcome);
        app.sync();
        terminal.draw(|f| render(&mut app, f)).unwrap();

        // Reader scrolls back to the start
        app.scroll_to_top();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert_eq!(app.scroll, 0);
        assert!(screen_text(&terminal).contains("first trip"));

        app.input = "second trip".to_string();
        app.submit_input();
        app.sync();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(app.follow);
        assert!(screen_text(&terminal).contains("AI is thinking"));

        let outcome = app.next_reply().await;
        app.finish_reply(outcome);
        app.sync();
        terminal.draw(|f| render(&mut app, f)).unwrap();

        let text = screen_text(&terminal);
        assert!(app.max_scroll() > 0);
        assert_eq!(app.scroll, app.max_scroll());
        assert!(text.contains("https://www.qatarairways.com/"));
        assert!(!text.contains("first trip"));
        assert!(!text.contains("AI is thinking"));
    }

    #[test]
    fn test_input_window_fits_ascii() {
        assert_eq!(input_window("hello", 5, 10), ("hello".to_string(), 5));
        assert_eq!(input_window("hello world", 11, 5), ("orld".to_string(), 4));
        assert_eq!(input_window("hello world", 0, 5), ("hello".to_string(), 0));
        assert_eq!(input_window("abc", 3, 0), (String::new(), 0));
    }

    #[test]
    fn test_input_window_counts_wide_chars_as_two_columns() {
        assert_eq!(input_window("日本語", 3, 10), ("日本語".to_string(), 6));
        assert_eq!(input_window("日本語", 1, 10), ("日本語".to_string(), 2));

        // Cursor after the third wide char needs 7 columns, so the first scrolls off
        assert_eq!(input_window("日本語", 3, 5), ("本語".to_string(), 4));

        // A wide char that would straddle the edge is left out
        assert_eq!(input_window("ab👋cd", 0, 3), ("ab".to_string(), 0));
        assert_eq!(input_window("hi 👋", 4, 10), ("hi 👋".to_string(), 5));
    }
}
