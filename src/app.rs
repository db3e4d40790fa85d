use anyhow::{Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use shakmaty::{Color, Square};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::board::{BoardWidget, DragHandler, DropAction, TerminalBoard, piece_code};
use crate::config::Config;
use crate::controller::{ComputerMove, GameController, LoadOutcome, TokioScheduler, UiEvent};
use crate::engine::Engine;
use crate::rules::ShakmatyRules;
use crate::util::{Command, parse_command};

pub const INVALID_FEN_MESSAGE: &str = "Invalid FEN notation. Please try again.";
pub const FEN_PROMPT: &str = "Enter the FEN notation for the desired position!";

const HELP: &str = "\
Commands:
  e2e4 | e2 e4 | e2-e4   drag a piece (promotions become queens)
  play                   Play Again
  setpos [fen]           Set Position
  flip                   Flip Board (the computer moves next)
  board                  redraw
  quit";

/// The user-facing surface: a line of input at a time, text output and modal dialogs.
#[async_trait]
pub trait Frontend: Send {
    /// `None` once the user is gone.
    async fn next_line(&mut self) -> Result<Option<String>>;

    async fn show(&mut self, text: &str) -> Result<()>;

    async fn alert(&mut self, message: &str) -> Result<()>;

    /// Ask for a line of text. `None` when cancelled.
    async fn prompt(&mut self, question: &str) -> Result<Option<String>>;
}

pub struct TerminalFrontend<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> TerminalFrontend<R, W> {
    pub fn new(input: R, out: W) -> Self {
        TerminalFrontend {
            lines: input.lines(),
            out,
        }
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> Frontend for TerminalFrontend<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    async fn show(&mut self, text: &str) -> Result<()> {
        self.write(&format!("{text}\n")).await
    }

    async fn alert(&mut self, message: &str) -> Result<()> {
        self.write(&format!("[!] {message}\n")).await
    }

    async fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        self.write(&format!("{question}\n> ")).await?;
        self.next_line().await
    }
}

pub type Controller = GameController<ShakmatyRules, TerminalBoard, TokioScheduler>;

/// The single UI loop. Input lines and timer events are handled one at a time, never
/// concurrently.
pub struct App<F> {
    frontend: F,
    controller: Controller,
    events: UnboundedReceiver<UiEvent>,
    history_width: usize,
    history_rows: usize,
}

impl<F: Frontend> App<F> {
    pub fn new(frontend: F, config: &Config, engine: Box<dyn Engine>) -> Result<App<F>> {
        let (tx, events) = mpsc::unbounded_channel();
        let board = TerminalBoard::new(config.board.clone())?;
        let mut controller =
            GameController::new(ShakmatyRules::new(), board, TokioScheduler::new(tx), engine)
                .with_reply_delay(config.reply_delay());

        if config.board.position.trim() != "start" {
            if let LoadOutcome::Invalid(e) = controller.load_position(Some(&config.board.position))
            {
                bail!("configured start position rejected: {e}");
            }
        }

        Ok(App {
            frontend,
            controller,
            events,
            history_width: config.history_width,
            history_rows: config.history_rows,
        })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("event loop started");
        self.show_screen().await?;

        loop {
            // due timer events go before queued input
            tokio::select! {
                biased;
                Some(event) = self.events.recv() => {
                    self.handle_event(event).await?;
                }
                line = self.frontend.next_line() => {
                    let Some(line) = line? else {
                        debug!("input closed");
                        break;
                    };
                    if !self.handle_line(&line).await? {
                        break;
                    }
                }
            }
        }

        info!("event loop stopped");
        Ok(())
    }

    /// `false` when the user asked to leave.
    async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                self.frontend
                    .show(&format!("{e}. Type 'help' for commands."))
                    .await?;
                return Ok(true);
            }
        };
        debug!("command {command:?}");

        match command {
            Command::Drag { from, to } => self.drag(from, to).await?,
            Command::PlayAgain => {
                self.controller.reset();
                self.show_screen().await?;
            }
            Command::SetPosition(fen) => {
                let fen = match fen {
                    Some(fen) => Some(fen),
                    None => self.frontend.prompt(FEN_PROMPT).await?,
                };
                match self.controller.load_position(fen.as_deref()) {
                    LoadOutcome::Cancelled => {}
                    LoadOutcome::Invalid(_) => self.frontend.alert(INVALID_FEN_MESSAGE).await?,
                    LoadOutcome::Loaded => self.show_screen().await?,
                }
            }
            Command::Flip => {
                let reply = self.controller.flip_board();
                self.report(reply).await?;
                self.show_screen().await?;
            }
            Command::Show => self.show_screen().await?,
            Command::Help => self.frontend.show(HELP).await?,
            Command::Quit => return Ok(false),
        }

        Ok(true)
    }

    async fn drag(&mut self, from: Square, to: Square) -> Result<()> {
        if !self.controller.board().config().draggable {
            return self.frontend.show("Dragging is disabled.").await;
        }
        let Some(piece) = self.controller.board().piece_at(from) else {
            return self.frontend.show(&format!("No piece on {from}.")).await;
        };
        if !self.controller.on_drag_start(from, piece) {
            return self
                .frontend
                .show(&format!("You can't pick up {} on {from}.", piece_code(piece)))
                .await;
        }

        match self.controller.on_drop(from, to) {
            DropAction::Snapback => {
                self.frontend
                    .show(&format!("{from}{to} is not legal, the piece snaps back to {from}."))
                    .await
            }
            DropAction::Keep => {
                self.controller.on_snap_end();
                self.show_screen().await
            }
        }
    }

    async fn handle_event(&mut self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::ComputerMove => {
                let reply = self.controller.make_computer_move();
                let played = matches!(reply, ComputerMove::Played(_));
                self.report(reply).await?;
                if played {
                    self.show_screen().await?;
                }
            }
        }
        Ok(())
    }

    async fn report(&mut self, reply: ComputerMove) -> Result<()> {
        match reply {
            ComputerMove::Played(played) => {
                debug!("computer reply {}{} ({})", played.from, played.to, played.san);
                Ok(())
            }
            ComputerMove::GameOver(end) => self.frontend.alert(&end.message()).await,
            ComputerMove::NoMove => Ok(()),
        }
    }

    fn screen(&self) -> String {
        let session = self.controller.session();
        let mut screen = self.controller.board().render();
        screen.push('\n');
        for line in session
            .history
            .visible_lines(self.history_width, self.history_rows)
        {
            screen.push_str(&line);
            screen.push('\n');
        }
        let side = match session.human_color {
            Color::White => "White",
            Color::Black => "Black",
        };
        screen.push_str(&format!("You play {side}."));
        screen
    }

    async fn show_screen(&mut self) -> Result<()> {
        let screen = self.screen();
        self.frontend.show(&screen).await
    }
}
