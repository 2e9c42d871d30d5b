use std::io;

use ratatui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use super::overlay::render_overlay;
use crate::config::DisplayConfig;
use crate::game::tick::{Overlay, RenderSink};
use crate::game::{Board, Side, Snapshot};

const BALL: char = '#';
const PADDLE: char = '#';
const CENTER_LINE: char = '|';

/// Resolved colours for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub ball: Color,
    pub paddle: Color,
    pub score: Color,
    pub center_line: Color,
    pub border: Color,
}

impl From<&DisplayConfig> for Palette {
    fn from(display: &DisplayConfig) -> Self {
        let rgb = |[r, g, b]: [u8; 3]| Color::Rgb(r, g, b);
        Self {
            ball: rgb(display.ball_color),
            paddle: rgb(display.paddle_color),
            score: rgb(display.score_color),
            center_line: rgb(display.center_line_color),
            border: rgb(display.border_color),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

/// Render sink backed by a ratatui terminal.
pub struct TerminalSink<B: Backend> {
    terminal: Terminal<B>,
    board: Board,
    palette: Palette,
}

impl<B: Backend> TerminalSink<B> {
    pub fn new(terminal: Terminal<B>, board: Board, palette: Palette) -> Self {
        Self {
            terminal,
            board,
            palette,
        }
    }
}

impl<B: Backend> RenderSink for TerminalSink<B> {
    fn render(&mut self, snapshot: &Snapshot, overlay: Option<&Overlay>) -> io::Result<()> {
        let Self {
            terminal,
            board,
            palette,
        } = self;
        terminal.draw(|f| render(f, board, palette, snapshot, overlay))?;
        Ok(())
    }
}

/// Where the board sits on screen: centred, cropped if the terminal is too small.
pub fn board_area(board: &Board, area: Rect) -> Rect {
    let width = (board.width as u16).min(area.width);
    let height = (board.height as u16).min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

pub fn render(
    frame: &mut Frame,
    board: &Board,
    palette: &Palette,
    snapshot: &Snapshot,
    overlay: Option<&Overlay>,
) {
    let area = board_area(board, frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = playfield_lines(board, palette, snapshot);
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some(overlay) = overlay {
        render_overlay(frame, overlay, area, palette.border);
    }
}

/// The board interior, row by row. Row 0 here is board row 1 (inside the border).
fn playfield_lines(board: &Board, palette: &Palette, snapshot: &Snapshot) -> Vec<Line<'static>> {
    let rows = (board.height - 2).max(0) as usize;
    let cols = (board.width - 2).max(0) as usize;
    let mut cells = vec![vec![(' ', Style::default()); cols]; rows];

    let mut put = |x: i32, y: i32, ch: char, color: Color| {
        if x < 1 || y < 1 || x > cols as i32 || y > rows as i32 {
            return;
        }
        cells[(y - 1) as usize][(x - 1) as usize] = (ch, Style::default().fg(color));
    };

    // Dotted centre line on odd rows
    for y in (1..board.height - 1).step_by(2) {
        put(board.center_x(), y, CENTER_LINE, palette.center_line);
    }

    // Two-digit scores either side of the centre line
    let scores = [
        (board.center_x() - 3, snapshot.score_left),
        (board.center_x() + 1, snapshot.score_right),
    ];
    for (x, score) in scores {
        for (offset, ch) in format!("{:2}", score).chars().enumerate() {
            put(x + offset as i32, 1, ch, palette.score);
        }
    }

    put(snapshot.ball_x, snapshot.ball_y, BALL, palette.ball);

    for (side, pad_y) in [
        (Side::Left, snapshot.pad_left_y),
        (Side::Right, snapshot.pad_right_y),
    ] {
        let x = board.paddle_x(side);
        for y in 1..board.height - 1 {
            if (y - pad_y).abs() <= board.paddle_reach {
                put(x, y, PADDLE, palette.paddle);
            }
        }
    }

    cells
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|(ch, style)| Span::styled(ch.to_string(), style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tick::Banner;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn sink() -> TerminalSink<TestBackend> {
        let board = Board::standard();
        let terminal = Terminal::new(TestBackend::new(43, 21)).unwrap();
        TerminalSink::new(terminal, board, Palette::default())
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            ball_x: 30,
            ball_y: 5,
            pad_left_y: 10,
            pad_right_y: 4,
            score_left: 3,
            score_right: 12,
        }
    }

    fn symbol(buffer: &Buffer, x: u16, y: u16) -> &str {
        buffer.content[buffer.index_of(x, y)].symbol()
    }

    fn row_text(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| symbol(buffer, x, y))
            .collect()
    }

    #[test]
    fn test_board_contents() {
        let mut sink = sink();
        sink.render(&snapshot(), None).unwrap();
        let buffer = sink.terminal.backend().buffer().clone();

        // Border
        assert_eq!(symbol(&buffer, 0, 0), "┌");
        assert_eq!(symbol(&buffer, 42, 20), "┘");

        // Ball
        assert_eq!(symbol(&buffer, 30, 5), "#");

        // Left paddle rows 8..=12, right paddle rows 2..=6
        for y in 8..=12 {
            assert_eq!(symbol(&buffer, 1, y), "#");
        }
        assert_eq!(symbol(&buffer, 1, 7), " ");
        assert_eq!(symbol(&buffer, 1, 13), " ");
        for y in 2..=6 {
            assert_eq!(symbol(&buffer, 41, y), "#");
        }
        assert_eq!(symbol(&buffer, 41, 7), " ");

        // Centre line on odd rows only
        assert_eq!(symbol(&buffer, 21, 3), "|");
        assert_eq!(symbol(&buffer, 21, 4), " ");

        // Scores on the first interior row
        assert_eq!(symbol(&buffer, 18, 1), " ");
        assert_eq!(symbol(&buffer, 19, 1), "3");
        assert_eq!(symbol(&buffer, 22, 1), "1");
        assert_eq!(symbol(&buffer, 23, 1), "2");
    }

    #[test]
    fn test_countdown_overlay_shows_banner_and_count() {
        let mut sink = sink();
        let overlay = Overlay {
            banner: Banner::Scored(Side::Right),
            remaining: Some(2),
        };
        sink.render(&snapshot(), Some(&overlay)).unwrap();
        let buffer = sink.terminal.backend().buffer().clone();

        let rows: Vec<String> = (0..21).map(|y| row_text(&buffer, y)).collect();
        assert!(rows.iter().any(|row| row.contains("SCORE -->")));
        assert!(rows[10].contains('2'));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut first = sink();
        let mut second = sink();
        first.render(&snapshot(), None).unwrap();
        second.render(&snapshot(), None).unwrap();

        assert_eq!(
            first.terminal.backend().buffer(),
            second.terminal.backend().buffer()
        );
    }
}
