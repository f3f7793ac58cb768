use crate::chat::{ChatSession, StateDelta};
use crate::composer::Composer;
use crate::status_indicator::StatusIndicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Chat,
    QuitConfirm,
}

pub struct App {
    pub screen: AppScreen,
    pub session: ChatSession,
    pub composer: Composer,
    pub status_indicator: StatusIndicator,
    /// Scroll offset into the message list; only meaningful while not
    /// following the tail.
    pub chat_scroll: u16,
    /// While true the view tracks the latest line on every change.
    pub follow: bool,
    /// Max scroll computed during the last draw, for paging math.
    pub last_max_scroll: u16,
    pub tick: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: ChatSession) -> App {
        App {
            screen: AppScreen::Chat,
            session,
            composer: Composer::new(),
            status_indicator: StatusIndicator::new(),
            chat_scroll: 0,
            follow: true,
            last_max_scroll: 0,
            tick: 0,
            should_quit: false,
        }
    }

    /// The welcome screen shows when there is nothing to display:
    /// no history and no in-flight draft.
    pub fn on_welcome(&self) -> bool {
        self.session.messages.is_empty() && self.session.draft.is_empty()
    }

    pub fn scroll_up(&mut self) {
        if self.follow {
            self.follow = false;
            self.chat_scroll = self.last_max_scroll;
        }
        self.chat_scroll = self.chat_scroll.saturating_sub(3);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(3);
        if self.chat_scroll >= self.last_max_scroll {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    pub fn update_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.status_indicator.update_spinner();
    }

    pub async fn on_delta(&mut self, delta: StateDelta) {
        let finished = delta == StateDelta::StreamFinished;

        self.session.apply(delta).await;

        if finished {
            self.status_indicator.set_streaming(false);
            self.status_indicator.clear_status();
        }

        // New content always snaps the view to the latest element.
        self.scroll_to_bottom();
    }
}
