use std::fmt::Write;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use shakmaty::{Board, Color, File, Piece, Rank, Role, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    Slow,
    Fast,
}

/// Animation duration, either a named preset or milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationSpeed {
    Preset(SpeedPreset),
    Millis(u64),
}

impl AnimationSpeed {
    pub fn millis(&self) -> u64 {
        match self {
            AnimationSpeed::Preset(SpeedPreset::Slow) => 600,
            AnimationSpeed::Preset(SpeedPreset::Fast) => 200,
            AnimationSpeed::Millis(ms) => *ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    pub show_notation: bool,
    pub draggable: bool,
    /// "start" or a FEN
    pub position: String,
    pub move_speed: AnimationSpeed,
    pub snap_back_speed: AnimationSpeed,
    pub snap_speed: AnimationSpeed,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            show_notation: true,
            draggable: true,
            position: "start".to_string(),
            move_speed: AnimationSpeed::Preset(SpeedPreset::Fast),
            snap_back_speed: AnimationSpeed::Millis(500),
            snap_speed: AnimationSpeed::Millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    /// return the piece to its origin square
    Snapback,
    Keep,
}

/// Callbacks the board invokes while the user drags pieces around.
pub trait DragHandler {
    fn on_drag_start(&self, square: Square, piece: Piece) -> bool;

    fn on_drop(&mut self, from: Square, to: Square) -> DropAction;

    fn on_snap_end(&mut self);
}

/// What is displayed. Kept in sync with the rules engine by the controller.
pub trait BoardWidget {
    /// Show `fen` ("start" or a FEN, only the placement field is used).
    fn set_position(&mut self, fen: &str) -> Result<()>;

    /// Placement field of the displayed position.
    fn position(&self) -> String;

    fn start(&mut self);

    fn flip(&mut self);

    fn orientation(&self) -> Color;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn config(&self) -> &BoardConfig;

    fn render(&self) -> String;
}

pub struct TerminalBoard {
    config: BoardConfig,
    board: Board,
    orientation: Color,
}

impl TerminalBoard {
    pub fn new(config: BoardConfig) -> Result<TerminalBoard> {
        let mut widget = TerminalBoard {
            board: Board::new(),
            orientation: Color::White,
            config,
        };
        let initial = widget.config.position.clone();
        widget
            .set_position(&initial)
            .context("invalid initial board position")?;
        debug!(
            "board ready (move {}ms, snapback {}ms, snap {}ms)",
            widget.config.move_speed.millis(),
            widget.config.snap_back_speed.millis(),
            widget.config.snap_speed.millis()
        );
        Ok(widget)
    }

    fn files(&self) -> Vec<File> {
        let files: Vec<File> = (0..8).map(File::new).collect();
        match self.orientation {
            Color::White => files,
            Color::Black => files.into_iter().rev().collect(),
        }
    }

    fn ranks(&self) -> Vec<Rank> {
        let ranks: Vec<Rank> = (0..8).rev().map(Rank::new).collect();
        match self.orientation {
            Color::White => ranks,
            Color::Black => ranks.into_iter().rev().collect(),
        }
    }
}

impl BoardWidget for TerminalBoard {
    fn set_position(&mut self, fen: &str) -> Result<()> {
        let fen = fen.trim();
        if fen == "start" {
            self.start();
            return Ok(());
        }
        let Some(placement) = fen.split_whitespace().next() else {
            bail!("empty board position");
        };
        self.board = placement
            .parse::<Board>()
            .map_err(|e| anyhow::anyhow!("invalid board placement '{placement}': {e}"))?;
        Ok(())
    }

    fn position(&self) -> String {
        self.board.to_string()
    }

    fn start(&mut self) {
        self.board = Board::new();
    }

    fn flip(&mut self) {
        self.orientation = !self.orientation;
    }

    fn orientation(&self) -> Color {
        self.orientation
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }

    fn config(&self) -> &BoardConfig {
        &self.config
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for rank in self.ranks() {
            if self.config.show_notation {
                let _ = write!(out, "{} ", rank.char());
            }
            let row: Vec<String> = self
                .files()
                .into_iter()
                .map(|file| {
                    self.board
                        .piece_at(Square::from_coords(file, rank))
                        .map_or('.', |p| p.char())
                        .to_string()
                })
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        if self.config.show_notation {
            let labels: Vec<String> = self
                .files()
                .into_iter()
                .map(|f| f.char().to_string())
                .collect();
            let _ = writeln!(out, "  {}", labels.join(" "));
        }
        out
    }
}

/// "wP", "bK", ... as board widgets name pieces.
pub fn piece_code(piece: Piece) -> String {
    let color = match piece.color {
        Color::White => 'w',
        Color::Black => 'b',
    };
    format!("{color}{}", piece.role.upper_char())
}

pub fn parse_piece_code(code: &str) -> Option<Piece> {
    let mut chars = code.chars();
    let color = match chars.next()? {
        'w' => Color::White,
        'b' => Color::Black,
        _ => return None,
    };
    let role = Role::from_char(chars.next()?.to_ascii_lowercase())?;
    if chars.next().is_some() {
        return None;
    }
    Some(Piece { color, role })
}
