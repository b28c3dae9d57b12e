use super::screen::{Screen, ROW_HEIGHT};
use super::text::fit_line;
use crate::adapter::PostListAdapter;
use crate::image::ImageSlot;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

const KEY_HINTS: &str = "j/k: move  PgUp/PgDn: page  r: refresh  q: quit";

/// Split the frame into the list and the one-line status bar.
pub(super) fn layout(area: Rect) -> (Rect, Rect) {
    let [list, status] =
        Layout::vertical([Constraint::Min(ROW_HEIGHT + 2), Constraint::Length(1)]).areas(area);
    (list, status)
}

pub(super) fn render(f: &mut Frame, screen: &Screen, adapter: &PostListAdapter) {
    let (list_area, status_area) = layout(f.area());
    render_list(f, screen, adapter, list_area);
    render_status(f, screen, status_area);
}

fn render_list(f: &mut Frame, screen: &Screen, adapter: &PostListAdapter, area: Rect) {
    let width = area.width.saturating_sub(4) as usize;
    let rows = adapter.row_count();

    let items: Vec<ListItem> = if rows == 0 {
        let msg = if screen.loaded { "No posts" } else { "Loading feed..." };
        vec![ListItem::new(Span::styled(msg, Style::default().fg(Color::DarkGray)))]
    } else {
        screen
            .bound()
            .iter()
            .filter_map(|(row, id)| adapter.view(*id).map(|view| (*row, view)))
            .map(|(row, view)| {
                let title_style = if row == screen.selected {
                    Style::default()
                        .bg(Color::DarkGray)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };

                let image = match view.image() {
                    ImageSlot::Loading => {
                        Span::styled("  ◌ loading image", Style::default().fg(Color::DarkGray))
                    }
                    ImageSlot::Loaded(bitmap) => Span::styled(
                        format!("  ▣ {} image, {} bytes", bitmap.format.name(), bitmap.bytes.len()),
                        Style::default().fg(Color::Green),
                    ),
                    ImageSlot::Fallback => {
                        Span::styled("  ✕ image unavailable", Style::default().fg(Color::Red))
                    }
                };

                ListItem::new(vec![
                    Line::from(Span::styled(fit_line(view.title(), width), title_style)),
                    Line::from(Span::styled(
                        format!("  {}", fit_line(view.description(), width.saturating_sub(2))),
                        Style::default().fg(Color::Gray),
                    )),
                    Line::from(image),
                ])
            })
            .collect()
    };

    let title = if rows == 0 {
        "Posts".to_string()
    } else {
        format!("Posts ({}/{})", screen.selected + 1, rows)
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    f.render_widget(list, area);
}

fn render_status(f: &mut Frame, screen: &Screen, area: Rect) {
    let line = match screen.status() {
        Some(msg) => Span::styled(
            fit_line(msg, area.width as usize).into_owned(),
            Style::default().fg(Color::Yellow),
        ),
        None => Span::styled(KEY_HINTS, Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(Paragraph::new(Line::from(line)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_reserves_status_line() {
        let (list, status) = layout(Rect::new(0, 0, 80, 24));
        assert_eq!(status.height, 1);
        assert_eq!(status.y, 23);
        assert_eq!(list.height, 23);
    }
}
