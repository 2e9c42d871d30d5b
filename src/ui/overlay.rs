// Pause popup drawn in the middle of the board

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::game::tick::Overlay;

/// Popup rectangle for `overlay`, centred on `board`.
///
/// Two text rows inside a border: the banner and, while counting down, the number.
pub fn overlay_area(overlay: &Overlay, board: Rect) -> Rect {
    let width = (overlay.banner.text().len() as u16 + 4).min(board.width);
    let height = 4u16.min(board.height);

    Rect {
        x: board.x + board.width.saturating_sub(width) / 2,
        y: board.y + board.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

pub fn render_overlay(frame: &mut Frame, overlay: &Overlay, board: Rect, border: Color) {
    let area = overlay_area(overlay, board);

    // Clear the board cells behind the popup
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(overlay.banner.text())];
    if let Some(remaining) = overlay.remaining {
        lines.push(Line::from(remaining.to_string()));
    }

    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}
