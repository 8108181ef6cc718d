use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crossterm::event::{KeyCode, KeyEvent};
use voxchat_core::{ChatState, UiCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Chat,
    Logs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    None,
    Quit,
    Command(UiCommand),
}

pub struct App {
    pub tab: Tab,
    pub state: ChatState,
    pub should_quit: bool,
    pub logs: Arc<Mutex<VecDeque<String>>>,
    pub scroll: usize,
    pub auto_scroll: bool,
}

impl App {
    pub fn new(logs: Arc<Mutex<VecDeque<String>>>) -> Self {
        Self {
            tab: Tab::Chat,
            state: ChatState::default(),
            should_quit: false,
            logs,
            scroll: 0,
            auto_scroll: true,
        }
    }

    pub fn update_state(&mut self, new_state: ChatState) {
        self.state = new_state;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        // Global keys
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return AppAction::Quit;
            }
            KeyCode::Char('1') => {
                self.tab = Tab::Chat;
                return AppAction::None;
            }
            KeyCode::Char('2') => {
                self.tab = Tab::Logs;
                return AppAction::None;
            }
            _ => {}
        }

        match self.tab {
            Tab::Chat => self.handle_chat_key(key),
            Tab::Logs => self.handle_scroll_key(key),
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char(' ') => {
                // No new recording while a reply is in flight
                if self.state.is_processing {
                    AppAction::None
                } else {
                    AppAction::Command(UiCommand::ToggleRecording)
                }
            }
            KeyCode::Char('m') => AppAction::Command(UiCommand::ToggleMute),
            _ => self.handle_scroll_key(key),
        }
    }

    fn handle_scroll_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_add(1);
                self.auto_scroll = false;
                AppAction::None
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_sub(1);
                if self.scroll == 0 {
                    self.auto_scroll = true;
                }
                AppAction::None
            }
            KeyCode::Char('G') => {
                self.scroll = 0;
                self.auto_scroll = true;
                AppAction::None
            }
            _ => AppAction::None,
        }
    }
}
