//! Drawing of the playfield and its side panels.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};

use crate::{
    dto::{game::GameSnapshot, phase::VisibleGamePhase},
    input::{Action, keyboard::KeyBindings},
    state::tetromino::{Shape, TETROMINO_SIZE},
    tui::theme::Theme,
};

/// Characters per board column; terminal cells are about twice as tall as wide.
const CELL_WIDTH: u16 = 2;
const SIDE_PANEL_WIDTH: u16 = 22;

/// Render a full frame.
pub fn draw(frame: &mut Frame, snapshot: &GameSnapshot, keys: &KeyBindings) {
    let area = frame.area();
    let board_width = snapshot.width as u16 * CELL_WIDTH + 2;
    let board_height = snapshot.height as u16 + 2;

    let [left, centre, right] = Layout::horizontal([
        Constraint::Length(SIDE_PANEL_WIDTH),
        Constraint::Length(board_width),
        Constraint::Length(SIDE_PANEL_WIDTH),
    ])
    .flex(Flex::Center)
    .areas(area);

    let [centre] = Layout::vertical([Constraint::Length(board_height)])
        .flex(Flex::Center)
        .areas(centre);

    draw_left_panel(frame, left, snapshot, keys);
    frame.render_widget(BoardView { snapshot }, centre);
    draw_right_panel(frame, right, snapshot);

    match snapshot.phase {
        VisibleGamePhase::Playing => {}
        VisibleGamePhase::Paused => draw_overlay(
            frame,
            centre,
            "PAUSED",
            &format!("{} to resume", key_hint(keys, Action::Pause)),
        ),
        VisibleGamePhase::GameOver => draw_overlay(
            frame,
            centre,
            "GAME OVER",
            &format!("{} to play again", key_hint(keys, Action::HardDrop)),
        ),
    }
}

fn draw_left_panel(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot, keys: &KeyBindings) {
    let [title, gauge, help] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(10),
        Constraint::Min(0),
    ])
    .areas(area);

    let heading = Paragraph::new(Line::from(Span::styled(
        "FRUITRIS",
        Style::default()
            .fg(Theme::TITLE)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::bordered().border_style(Style::default().fg(Theme::BORDER)));
    frame.render_widget(heading, title);

    let block = Block::bordered()
        .title(format!(" Level {} ", snapshot.level))
        .border_style(Style::default().fg(Theme::BORDER));
    let inner = block.inner(gauge);
    frame.render_widget(block, gauge);
    let [glass, caption] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
    frame.render_widget(DrinkGauge::new(snapshot.level_progress), glass);
    frame.render_widget(
        Paragraph::new(format!("{}/{} lines", snapshot.lines, snapshot.lines_for_level))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Theme::MUTED)),
        caption,
    );

    let lines: Vec<Line> = Action::ALL
        .iter()
        .map(|action| {
            Line::from(vec![
                Span::styled(format!("{:<10}", action.label()), Style::default().fg(Theme::TEXT)),
                Span::styled(key_hint(keys, *action), Style::default().fg(Theme::MUTED)),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::bordered()
                .title(" Controls ")
                .border_style(Style::default().fg(Theme::BORDER)),
        ),
        help,
    );
}

fn draw_right_panel(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot) {
    let [next, scores, face] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(3),
    ])
    .areas(area);

    let block = Block::bordered()
        .title(" Next ")
        .border_style(Style::default().fg(Theme::BORDER));
    let inner = block.inner(next);
    frame.render_widget(block, next);
    frame.render_widget(NextPiece { shape: snapshot.next }, inner);

    let label = Style::default().fg(Theme::MUTED);
    let value = Style::default().fg(Theme::TEXT).add_modifier(Modifier::BOLD);
    let score_lines = vec![
        Line::from(Span::styled("High", label)),
        Line::from(Span::styled(snapshot.high_score.to_string(), value)),
        Line::from(Span::styled("Score", label)),
        Line::from(Span::styled(snapshot.score.to_string(), value)),
    ];
    frame.render_widget(
        Paragraph::new(score_lines)
            .alignment(Alignment::Right)
            .block(Block::bordered().border_style(Style::default().fg(Theme::BORDER))),
        scores,
    );

    let (glyph, colour) = Theme::face(snapshot.mood);
    frame.render_widget(
        Paragraph::new(Span::styled(glyph, Style::default().fg(colour)))
            .alignment(Alignment::Center)
            .block(Block::bordered().border_style(Style::default().fg(Theme::BORDER))),
        face,
    );
}

fn draw_overlay(frame: &mut Frame, board: Rect, title: &str, hint: &str) {
    let [row] = Layout::vertical([Constraint::Length(4)])
        .flex(Flex::Center)
        .areas(board);
    frame.render_widget(Clear, row);
    let text = vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Theme::OVERLAY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(Theme::TEXT))),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::bordered().border_style(Style::default().fg(Theme::OVERLAY))),
        row,
    );
}

fn key_hint(keys: &KeyBindings, action: Action) -> String {
    let names = keys.keys_for(action);
    if names.is_empty() {
        "unbound".into()
    } else {
        names.join("/")
    }
}

/// The well with locked tiles and the falling piece.
struct BoardView<'a> {
    snapshot: &'a GameSnapshot,
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().border_style(Style::default().fg(Theme::BORDER));
        let inner = block.inner(area);
        block.render(area, buf);

        for (y, row) in self.snapshot.cells.iter().enumerate() {
            let cy = inner.y + y as u16;
            if cy >= inner.bottom() {
                break;
            }
            for (x, cell) in row.iter().enumerate() {
                let cx = inner.x + x as u16 * CELL_WIDTH;
                if cx + CELL_WIDTH > inner.right() {
                    break;
                }
                match cell {
                    Some(tile) => {
                        buf.set_string(cx, cy, "██", Style::default().fg(Theme::tile(*tile)))
                    }
                    None => buf.set_string(cx, cy, " ·", Style::default().fg(Theme::EMPTY)),
                };
            }
        }
    }
}

/// Preview of the upcoming shape.
struct NextPiece {
    shape: Shape,
}

impl Widget for NextPiece {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mask = self.shape.mask();
        let style = Style::default().fg(Theme::tile(self.shape.tile()));
        let offset_x = area.x + area.width.saturating_sub(TETROMINO_SIZE as u16 * CELL_WIDTH) / 2;

        for (y, row) in mask.iter().enumerate() {
            let cy = area.y + y as u16;
            if cy >= area.bottom() {
                break;
            }
            for (x, filled) in row.iter().enumerate() {
                let cx = offset_x + x as u16 * CELL_WIDTH;
                if *filled && cx + CELL_WIDTH <= area.right() {
                    buf.set_string(cx, cy, "██", style);
                }
            }
        }
    }
}

/// A glass that fills up as the level nears completion.
struct DrinkGauge {
    value: f32,
}

impl DrinkGauge {
    fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
        }
    }
}

impl Widget for DrinkGauge {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 || area.height == 0 {
            return;
        }

        let glass_width = area.width.min(8);
        let left = area.x + (area.width - glass_width) / 2;
        let right = left + glass_width - 1;
        let depth = area.height;
        let filled = ((self.value * depth as f32).round() as u16).min(depth);

        let wall = Style::default().fg(Theme::BORDER);
        let drink = Style::default().fg(Theme::DRINK);
        for row in 0..depth {
            let y = area.y + row;
            buf.set_string(left, y, "│", wall);
            buf.set_string(right, y, "│", wall);
            let level_from_bottom = depth - row;
            if level_from_bottom <= filled {
                for x in left + 1..right {
                    buf.set_string(x, y, "▓", drink);
                }
            }
        }
    }
}
