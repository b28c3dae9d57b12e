use super::screen::Screen;
use super::Action;
use crate::adapter::PostListAdapter;
use crossterm::event::{KeyCode, KeyModifiers};

pub(super) fn handle_input(
    screen: &mut Screen,
    adapter: &mut PostListAdapter,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    let rows = adapter.row_count();
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => return Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Action::Quit,
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => screen.select_next(rows),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => screen.select_prev(),
        (KeyCode::PageDown, _) | (KeyCode::Char(' '), _) => screen.page_down(rows),
        (KeyCode::PageUp, _) => screen.page_up(),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => screen.select_first(),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => screen.select_last(rows),
        (KeyCode::Char('r'), _) => {
            adapter.refresh();
            screen.set_status("Refreshing feed...");
        }
        _ => return Action::Continue,
    }
    screen.needs_redraw = true;
    Action::Continue
}
