use std::time::Duration;

use log::{debug, info, warn};
use shakmaty::{Color, Piece, Role, Square};
use tokio::sync::mpsc::UnboundedSender;

use crate::board::{BoardWidget, DragHandler, DropAction};
use crate::engine::Engine;
use crate::history::MoveHistory;
use crate::rules::{GameEnd, MoveDescriptor, MoveRequest, RulesEngine};

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(250);

/// Events posted back into the UI loop by timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ComputerMove,
}

pub trait Scheduler {
    /// Deliver `event` to the UI loop once `delay` has elapsed. Fire and forget.
    fn schedule(&self, delay: Duration, event: UiEvent);
}

/// One-shot tokio timers feeding the event loop's channel.
pub struct TokioScheduler {
    events: UnboundedSender<UiEvent>,
}

impl TokioScheduler {
    pub fn new(events: UnboundedSender<UiEvent>) -> TokioScheduler {
        TokioScheduler { events }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, event: UiEvent) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(event).is_err() {
                debug!("event loop gone, dropping {event:?}");
            }
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResult {
    Rejected,
    Accepted(MoveDescriptor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputerMove {
    Played(MoveDescriptor),
    GameOver(GameEnd),
    /// nothing to move even though no end was detected
    NoMove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Cancelled,
    Loaded,
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    /// number of the next ply, starting at 1
    pub ply_count: u32,
    pub human_color: Color,
    pub history: MoveHistory,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            ply_count: 1,
            human_color: Color::White,
            history: MoveHistory::new(),
        }
    }
}

impl Session {
    fn restart(&mut self) {
        *self = Session::default();
    }

    fn record(&mut self, played: &MoveDescriptor) {
        self.history.record_move(&played.san, self.ply_count);
        self.ply_count += 1;
    }
}

pub struct GameController<R, B, S> {
    rules: R,
    board: B,
    scheduler: S,
    engine: Box<dyn Engine>,
    session: Session,
    reply_delay: Duration,
}

impl<R: RulesEngine, B: BoardWidget, S: Scheduler> GameController<R, B, S> {
    pub fn new(rules: R, board: B, scheduler: S, engine: Box<dyn Engine>) -> Self {
        GameController {
            rules,
            board,
            scheduler,
            engine,
            session: Session::default(),
            reply_delay: DEFAULT_REPLY_DELAY,
        }
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn can_drag(&self, _square: Square, piece: Piece) -> bool {
        !self.rules.is_game_over() && piece.color == self.session.human_color
    }

    /// Play the human's drop. Promotions always become queens.
    pub fn attempt_human_move(&mut self, from: Square, to: Square) -> MoveResult {
        let request = MoveRequest {
            from,
            to,
            promotion: Some(Role::Queen),
        };
        let Some(played) = self.rules.apply_move(request) else {
            debug!("rejected {from}{to}");
            return MoveResult::Rejected;
        };

        info!("human played {} (ply {})", played.san, self.session.ply_count);
        self.sync_board();
        self.session.record(&played);
        self.scheduler.schedule(self.reply_delay, UiEvent::ComputerMove);

        MoveResult::Accepted(played)
    }

    pub fn make_computer_move(&mut self) -> ComputerMove {
        if let Some(end) = self.rules.game_end() {
            info!("game over: {end:?}");
            return ComputerMove::GameOver(end);
        }

        let Some(chosen) = self.engine.search(self.rules.legal_moves()) else {
            warn!("no legal move for the computer in {}", self.rules.current_fen());
            return ComputerMove::NoMove;
        };
        let Some(played) = self.rules.apply_move(chosen.request()) else {
            warn!("engine picked an unplayable move {}", chosen.san);
            return ComputerMove::NoMove;
        };

        info!("computer played {} (ply {})", played.san, self.session.ply_count);
        self.sync_board();
        self.session.record(&played);

        ComputerMove::Played(played)
    }

    pub fn on_snap_animation_complete(&mut self) {
        self.sync_board();
    }

    /// Play Again.
    pub fn reset(&mut self) {
        self.rules.reset();
        self.board.start();
        self.session.restart();
        info!("new game");
    }

    /// Set Position. `None` or blank input leaves everything as it is.
    pub fn load_position(&mut self, fen: Option<&str>) -> LoadOutcome {
        let Some(fen) = fen.map(str::trim).filter(|f| !f.is_empty()) else {
            return LoadOutcome::Cancelled;
        };

        if let Err(e) = self.rules.load(fen) {
            info!("refused position: {e:#}");
            return LoadOutcome::Invalid(format!("{e:#}"));
        }
        if let Err(e) = self.board.set_position(fen) {
            warn!("board refused accepted position: {e:#}");
            self.sync_board();
        }
        self.session.restart();
        info!("position set to {}", self.rules.current_fen());

        LoadOutcome::Loaded
    }

    /// Flip Board. The computer moves right away, whoever is to move.
    pub fn flip_board(&mut self) -> ComputerMove {
        self.board.flip();
        let reply = self.make_computer_move();
        self.session.human_color = !self.session.human_color;
        debug!("human now plays {:?}", self.session.human_color);

        reply
    }

    fn sync_board(&mut self) {
        let fen = self.rules.current_fen();
        if let Err(e) = self.board.set_position(&fen) {
            warn!("could not show {fen}: {e:#}");
        }
    }
}

impl<R: RulesEngine, B: BoardWidget, S: Scheduler> DragHandler for GameController<R, B, S> {
    fn on_drag_start(&self, square: Square, piece: Piece) -> bool {
        self.can_drag(square, piece)
    }

    fn on_drop(&mut self, from: Square, to: Square) -> DropAction {
        match self.attempt_human_move(from, to) {
            MoveResult::Rejected => DropAction::Snapback,
            MoveResult::Accepted(_) => DropAction::Keep,
        }
    }

    fn on_snap_end(&mut self) {
        self.on_snap_animation_complete();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::board::{BoardConfig, TerminalBoard};
    use crate::engine::RandomEngine;
    use crate::rules::{STARTING_FEN, ShakmatyRules};

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(Duration, UiEvent)>>>);

    impl Scheduler for Recorder {
        fn schedule(&self, delay: Duration, event: UiEvent) {
            self.0.borrow_mut().push((delay, event));
        }
    }

    fn controller() -> (GameController<ShakmatyRules, TerminalBoard, Recorder>, Recorder) {
        let recorder = Recorder::default();
        let board = TerminalBoard::new(BoardConfig::default()).unwrap();
        let controller = GameController::new(
            ShakmatyRules::new(),
            board,
            recorder.clone(),
            Box::new(RandomEngine::seeded(3)),
        );
        (controller, recorder)
    }

    fn white(role: Role) -> Piece {
        Piece {
            color: Color::White,
            role,
        }
    }

    fn black(role: Role) -> Piece {
        Piece {
            color: Color::Black,
            role,
        }
    }

    #[test]
    fn accepted_move_updates_everything_and_schedules_reply() {
        let (mut game, recorder) = controller();
        let result = game.attempt_human_move(Square::E2, Square::E4);
        let MoveResult::Accepted(played) = result else {
            panic!("e2e4 should be legal");
        };
        assert_eq!(played.san, "e4");
        assert_eq!(game.session().ply_count, 2);
        assert_eq!(game.session().history.text(), "1. e4 ");
        assert_eq!(
            game.board().position(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR"
        );
        assert_eq!(
            *recorder.0.borrow(),
            vec![(DEFAULT_REPLY_DELAY, UiEvent::ComputerMove)]
        );
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let (mut game, recorder) = controller();
        assert_eq!(
            game.attempt_human_move(Square::E2, Square::E5),
            MoveResult::Rejected
        );
        assert_eq!(game.rules().current_fen(), STARTING_FEN);
        assert_eq!(game.session().ply_count, 1);
        assert_eq!(game.session().history.text(), "");
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn drop_handler_maps_results() {
        let (mut game, _) = controller();
        assert_eq!(game.on_drop(Square::G1, Square::G3), DropAction::Snapback);
        assert_eq!(game.on_drop(Square::G1, Square::F3), DropAction::Keep);
    }

    #[test]
    fn drag_only_own_pieces() {
        let (game, _) = controller();
        assert!(game.on_drag_start(Square::E2, white(Role::Pawn)));
        assert!(!game.on_drag_start(Square::E7, black(Role::Pawn)));
    }

    #[test]
    fn no_drag_after_game_over() {
        let (mut game, _) = controller();
        assert_eq!(
            game.load_position(Some("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")),
            LoadOutcome::Loaded
        );
        assert!(!game.can_drag(Square::F7, white(Role::Queen)));
        assert!(!game.can_drag(Square::H8, black(Role::King)));
    }

    #[test]
    fn computer_reply_follows_human_move() {
        let (mut game, _) = controller();
        game.attempt_human_move(Square::D2, Square::D4);
        let ComputerMove::Played(reply) = game.make_computer_move() else {
            panic!("black has moves");
        };
        assert_eq!(reply.color, Color::Black);
        assert_eq!(game.session().ply_count, 3);
        assert_eq!(
            game.session().history.text(),
            format!("1. d4 {} - ", reply.san)
        );
    }

    #[test]
    fn computer_reports_the_end_instead_of_moving() {
        let (mut game, _) = controller();
        game.load_position(Some("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"));
        let fen = game.rules().current_fen();
        assert_eq!(
            game.make_computer_move(),
            ComputerMove::GameOver(GameEnd::Stalemate)
        );
        assert_eq!(game.rules().current_fen(), fen);
        assert_eq!(game.session().ply_count, 1);
    }

    #[test]
    fn snap_end_resyncs_a_drifted_board() {
        let (mut game, _) = controller();
        game.board.set_position("8/8/8/8/8/8/8/8").unwrap();
        game.on_snap_end();
        assert_eq!(
            game.board().position(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
    }

    #[test]
    fn blank_position_input_is_a_no_op() {
        let (mut game, _) = controller();
        game.attempt_human_move(Square::E2, Square::E4);
        assert_eq!(game.load_position(None), LoadOutcome::Cancelled);
        assert_eq!(game.load_position(Some("   ")), LoadOutcome::Cancelled);
        assert_eq!(game.session().ply_count, 2);
        assert_eq!(game.session().history.text(), "1. e4 ");
    }

    #[test]
    fn flip_moves_for_the_side_to_move_and_swaps_colors() {
        let (mut game, _) = controller();
        let ComputerMove::Played(reply) = game.flip_board() else {
            panic!("white has moves");
        };
        assert_eq!(reply.color, Color::White);
        assert_eq!(game.session().human_color, Color::Black);
        assert_eq!(game.board().orientation(), Color::Black);
        assert!(game.can_drag(Square::E7, black(Role::Pawn)));
        assert!(!game.can_drag(Square::E2, white(Role::Pawn)));
    }
}
