use crate::app::{App, AppScreen};
use crate::chat_view::SUGGESTIONS;
use crate::composer::ComposerAction;
use crate::config;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub async fn handle_key(app: &mut App, key: KeyEvent) {
    match app.screen {
        AppScreen::QuitConfirm => handle_quit_confirm_input(key, app),
        AppScreen::Chat => handle_chat_input(key, app).await,
    }
}

async fn handle_chat_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc => {
            app.screen = AppScreen::QuitConfirm;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.screen = AppScreen::QuitConfirm;
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up();
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down();
            return;
        }
        // Welcome-screen suggestion chips: a bare digit picks one while
        // nothing has been typed yet.
        KeyCode::Char(c @ '1'..='4')
            if app.on_welcome()
                && app.composer.is_empty()
                && !key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            let suggestion = SUGGESTIONS[c as usize - '1' as usize];
            submit(app, suggestion.to_string(), Vec::new());
            return;
        }
        // Plain Enter while a response is streaming: keep the typed
        // text instead of letting the composer consume it. Slash
        // commands fall through; attach/detach/clear stay usable
        // mid-stream, and actual submits are still rejected by the
        // session's in-flight guard.
        KeyCode::Enter
            if app.session.loading
                && !key.modifiers.contains(KeyModifiers::SHIFT)
                && app.composer.can_submit()
                && !app.composer.input().trim_start().starts_with('/') =>
        {
            app.status_indicator
                .set_status("Cortex is still responding, hang on");
            return;
        }
        _ => {}
    }

    if let Some(action) = app.composer.handle_key(key) {
        match action {
            ComposerAction::Submit { text, files } => submit(app, text, files),
            ComposerAction::ClearChat => {
                app.session.clear().await;
                app.status_indicator.set_status("Conversation cleared");
                app.scroll_to_bottom();
            }
        }
    }

    if let Some(note) = app.composer.take_note() {
        app.status_indicator.set_status(note);
    }
}

fn submit(app: &mut App, text: String, files: Vec<crate::models::AttachedFile>) {
    let sender = config::get_config().sender;
    if app.session.submit(text, files, &sender) {
        app.status_indicator.set_streaming(true);
        app.status_indicator.clear_status();
        app.scroll_to_bottom();
    }
}

fn handle_quit_confirm_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            app.should_quit = true;
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            app.screen = AppScreen::Chat;
        }
        _ => {}
    }
}
