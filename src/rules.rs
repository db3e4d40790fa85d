use anyhow::{Result, anyhow};
use log::debug;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Move, Piece, Position, Role, Square, fen::Fen,
    san::SanPlus, uci::UciMove,
};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move as the player asked for it: origin, destination and the promotion piece to use
/// if (and only if) the move turns out to be a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

/// A move the rules engine accepted (or would accept). `from`/`to` are the squares the king
/// actually travels for castling, the way a board widget shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
    pub role: Role,
    pub color: Color,
    pub san: String,
}

impl MoveDescriptor {
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl GameEnd {
    pub fn message(&self) -> String {
        match self {
            GameEnd::Checkmate { winner } => {
                format!("Checkmate! {} wins.", capitalized(*winner))
            }
            GameEnd::Stalemate => "Stalemate! The game is drawn.".to_string(),
            GameEnd::InsufficientMaterial => {
                "Draw by insufficient material.".to_string()
            }
            GameEnd::FiftyMoveRule => "Draw by the fifty-move rule.".to_string(),
            GameEnd::ThreefoldRepetition => "Draw by threefold repetition.".to_string(),
        }
    }
}

fn capitalized(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Authoritative game state. Everything the controller knows about legality goes through here.
pub trait RulesEngine {
    fn reset(&mut self);

    /// Replace the position with `fen`. On error the previous position is kept.
    fn load(&mut self, fen: &str) -> Result<()>;

    fn current_fen(&self) -> String;

    fn legal_moves(&self) -> Vec<MoveDescriptor>;

    /// Play `request` if it is legal, `None` otherwise (position untouched).
    fn apply_move(&mut self, request: MoveRequest) -> Option<MoveDescriptor>;

    fn game_end(&self) -> Option<GameEnd>;

    fn is_game_over(&self) -> bool {
        self.game_end().is_some()
    }

    fn piece_at(&self, square: Square) -> Option<Piece>;
}

pub struct ShakmatyRules {
    game: Chess,
    // position keys since the last reset/load, for repetition detection
    seen: Vec<String>,
}

impl Default for ShakmatyRules {
    fn default() -> Self {
        Self::new()
    }
}

impl ShakmatyRules {
    pub fn new() -> ShakmatyRules {
        let game = Chess::default();
        let seen = vec![position_key(&fen_of(&game))];
        ShakmatyRules { game, seen }
    }

    fn find_move(&self, request: MoveRequest) -> Option<Move> {
        let mut candidates = vec![request.promotion];
        // a promotion piece on a move that doesn't promote is simply ignored
        if request.promotion.is_some() {
            candidates.push(None);
        }

        candidates.into_iter().find_map(|promotion| {
            let uci = UciMove::Normal {
                from: request.from,
                to: request.to,
                promotion,
            };
            uci.to_move(&self.game)
                .ok()
                // king-takes-rook castling is not a drop the board can make
                .filter(|m| endpoints(*m) == (request.from, request.to))
        })
    }

    fn repetitions(&self) -> usize {
        let Some(current) = self.seen.last() else {
            return 0;
        };
        self.seen.iter().filter(|key| *key == current).count()
    }
}

impl RulesEngine for ShakmatyRules {
    fn reset(&mut self) {
        *self = ShakmatyRules::new();
    }

    fn load(&mut self, fen: &str) -> Result<()> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| anyhow!("could not parse FEN '{fen}': {e}"))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| anyhow!("FEN '{fen}' is not a legal position: {e}"))?;

        self.game = position;
        self.seen = vec![position_key(&fen_of(&self.game))];
        debug!("loaded position {}", self.current_fen());
        Ok(())
    }

    fn current_fen(&self) -> String {
        fen_of(&self.game)
    }

    fn legal_moves(&self) -> Vec<MoveDescriptor> {
        self.game
            .legal_moves()
            .into_iter()
            .map(|m| describe(&self.game, m))
            .collect()
    }

    fn apply_move(&mut self, request: MoveRequest) -> Option<MoveDescriptor> {
        let chosen = self.find_move(request)?;
        let descriptor = describe(&self.game, chosen);

        self.game.play_unchecked(chosen);
        self.seen.push(position_key(&fen_of(&self.game)));

        Some(descriptor)
    }

    fn game_end(&self) -> Option<GameEnd> {
        let game = &self.game;
        if game.is_checkmate() {
            Some(GameEnd::Checkmate {
                winner: !game.turn(),
            })
        } else if game.is_stalemate() {
            Some(GameEnd::Stalemate)
        } else if game.is_insufficient_material() {
            Some(GameEnd::InsufficientMaterial)
        } else if game.halfmoves() >= 100 {
            Some(GameEnd::FiftyMoveRule)
        } else if self.repetitions() >= 3 {
            Some(GameEnd::ThreefoldRepetition)
        } else {
            None
        }
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.game.board().piece_at(square)
    }
}

fn fen_of(game: &Chess) -> String {
    Fen::from_position(game, EnPassantMode::Legal).to_string()
}

/// placement, side to move, castling rights and en passant square
fn position_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Squares the moving piece leaves and lands on; for castling those of the king.
fn endpoints(m: Move) -> (Square, Square) {
    match m.to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, .. } => (from, to),
        _ => (m.from().unwrap_or(m.to()), m.to()),
    }
}

fn describe(game: &Chess, m: Move) -> MoveDescriptor {
    let color = game.turn();
    let (from, to) = endpoints(m);

    let mut after = game.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut after, m);

    MoveDescriptor {
        from,
        to,
        promotion: m.promotion(),
        role: m.role(),
        color,
        san: san.to_string(),
    }
}
