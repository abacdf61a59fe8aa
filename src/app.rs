use std::sync::Arc;

use apex_chat::conversation::{Conversation, PendingReply};
use apex_chat::render::{self, Link};
use apex_chat::reply::{ReplyGenerator, ReplyTask};
use apex_chat::{Content, ConversationState, ReplyError};
use ratatui::layout::Rect;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Position of an offer card: (message index, card index within the message)
pub type CardRef = (usize, usize);

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input line
    pub input: String,
    pub cursor: usize,

    // Conversation
    pub conversation: Conversation,
    pub updates: watch::Receiver<ConversationState>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub reply: Option<(PendingReply, ReplyTask)>,

    // Chat viewport
    pub scroll: u16,
    pub follow: bool,
    pub chat_height: u16,
    pub total_lines: u16,
    pub chat_area: Option<Rect>,

    // Offer card focus
    pub focused_card: Option<CardRef>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(generator: Arc<dyn ReplyGenerator>) -> Self {
        let conversation = Conversation::new();
        let updates = conversation.subscribe();

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            conversation,
            updates,
            generator,
            reply: None,

            scroll: 0,
            follow: true,
            chat_height: 0,
            total_lines: 0,
            chat_area: None,

            focused_card: None,

            animation_frame: 0,
        }
    }

    pub fn can_send(&self) -> bool {
        self.conversation.can_submit(&self.input)
    }

    /// Submit the input line and start the reply task
    pub fn submit_input(&mut self) -> bool {
        let Some(ticket) = self.conversation.submit(&self.input) else {
            return false;
        };

        self.input.clear();
        self.cursor = 0;
        let task = ReplyTask::spawn(self.generator.clone(), ticket.prompt().to_string());
        self.reply = Some((ticket, task));
        true
    }

    /// Wait for the outstanding reply. Never completes when there is none.
    pub async fn next_reply(&mut self) -> Result<Content, ReplyError> {
        match self.reply.as_mut() {
            Some((_, task)) => task.await,
            None => std::future::pending().await,
        }
    }

    pub fn finish_reply(&mut self, outcome: Result<Content, ReplyError>) {
        if let Some((ticket, _)) = self.reply.take() {
            self.conversation.resolve(ticket, outcome);
        }
    }

    /// Follow the newest message whenever the conversation changed
    pub fn sync(&mut self) {
        if self.updates.has_changed().unwrap_or(false) {
            let snapshot = self.updates.borrow_and_update();
            debug!(messages = snapshot.messages.len(), pending = snapshot.pending, "conversation changed");
            self.follow = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
        self.follow = self.scroll >= self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.follow = true;
    }

    fn all_cards(&self) -> Vec<CardRef> {
        self.conversation
            .messages()
            .iter()
            .enumerate()
            .flat_map(|(m, msg)| (0..render::cards_in(msg)).map(move |c| (m, c)))
            .collect()
    }

    /// Move card focus forward (or back), wrapping around
    pub fn cycle_card(&mut self, forward: bool) {
        let cards = self.all_cards();
        if cards.is_empty() {
            self.focused_card = None;
            return;
        }

        let current = self
            .focused_card
            .and_then(|f| cards.iter().position(|c| *c == f));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => cards.len() - 1,
            (Some(i), true) => (i + 1) % cards.len(),
            (Some(i), false) => (i + cards.len() - 1) % cards.len(),
        };
        self.focused_card = Some(cards[next]);
    }

    pub fn focused_link(&self) -> Option<Link> {
        let (m, c) = self.focused_card?;
        self.conversation
            .messages()
            .get(m)
            .and_then(|msg| render::card_link(msg, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_chat::ScriptedReply;
    use std::time::Duration;

    fn app() -> App {
        let generator = ScriptedReply::default().with_delay(Duration::from_millis(10));
        App::new(Arc::new(generator))
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_clears_input_and_resolves() {
        let mut app = app();
        app.input = "  London to Dubai ".to_string();
        app.cursor = app.input.chars().count();

        assert!(app.submit_input());
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.conversation.is_pending());

        let outcome = app.next_reply().await;
        app.finish_reply(outcome);
        assert!(!app.conversation.is_pending());
        assert!(app.reply.is_none());
        assert_eq!(app.conversation.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_input_is_kept_and_not_sent() {
        let mut app = app();
        app.input = "   ".to_string();
        assert!(!app.can_send());
        assert!(!app.submit_input());
        assert_eq!(app.input, "   ");
        assert!(app.reply.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_turns_follow_back_on() {
        let mut app = app();
        app.follow = false;
        app.sync();
        assert!(!app.follow);

        app.input = "hi".to_string();
        app.submit_input();
        app.sync();
        assert!(app.follow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_card_focus_cycles_and_wraps() {
        let mut app = app();
        app.cycle_card(true);
        assert_eq!(app.focused_card, None);

        app.input = "hi".to_string();
        app.submit_input();
        let outcome = app.next_reply().await;
        app.finish_reply(outcome);

        app.cycle_card(true);
        assert_eq!(app.focused_card, Some((1, 0)));
        app.cycle_card(false);
        assert_eq!(app.focused_card, Some((1, 2)));
        assert_eq!(
            app.focused_link().map(|l| l.href),
            Some("https://www.qatarairways.com/".to_string())
        );
        app.cycle_card(true);
        assert_eq!(app.focused_card, Some((1, 0)));
    }

    #[test]
    fn test_scroll_clamps_to_content() {
        let mut app = App::new(Arc::new(ScriptedReply::default()));
        app.total_lines = 30;
        app.chat_height = 10;
        app.scroll_down(50);
        assert_eq!(app.scroll, 20);
        assert!(app.follow);
        app.scroll_up(5);
        assert_eq!(app.scroll, 15);
        assert!(!app.follow);
    }
}
