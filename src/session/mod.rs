use chess::Piece;
use log::{debug, error, info, warn};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::rc::Rc;

use crate::api::MoveService;
use crate::config::SessionConfig;
use crate::error::MoveError;
use crate::game::piece::{parse_square, piece_letter, PieceCode};
use crate::game::promotion::promotion_choice;
use crate::game::rules::{AppliedMove, RulesModel};
use crate::game::utils::status_text;
use crate::models::{MoveRequest, MoveResult};
use crate::ui::countdown::{RedirectCountdown, TurnCountdown};
use crate::ui::view::PageView;
use crate::ui::widget::BoardWidget;

/// Where the session is in the move exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the user to drop a piece
    Idle,
    LocalValidation,
    /// A move is with the server; drags and drops are refused
    AwaitingServer,
    GameEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapbackReason {
    SameSquare,
    GameEnded,
    Busy,
    /// The piece is not the player's, or the player's side is not to move
    NotYourTurn,
    IllegalMove,
    /// The widget reported a square or piece code that does not exist
    InvalidInput,
}

/// How a drop was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The piece went back to its source without contacting the server
    Snapback(SnapbackReason),
    /// The server refused the move; board and rules model were reverted
    Rejected { info: Option<String> },
    Accepted {
        opponent_move: Option<AppliedMove>,
        game_ended: bool,
    },
}

/// One game as seen by the hosting page.
///
/// Owns the rules model, the board widget, both countdowns and the phase of
/// the move exchange. Timers run as local tasks, so the session lives on an
/// actix system.
pub struct GameSession<S: MoveService> {
    rules: Box<dyn RulesModel>,
    widget: Box<dyn BoardWidget>,
    view: Rc<dyn PageView>,
    service: S,
    config: SessionConfig,
    countdown: TurnCountdown,
    redirect: RedirectCountdown,
    phase: Phase,
}

impl<S: MoveService> GameSession<S> {
    pub fn new(
        rules: Box<dyn RulesModel>,
        widget: Box<dyn BoardWidget>,
        view: Rc<dyn PageView>,
        service: S,
        config: SessionConfig,
    ) -> Self {
        let countdown = TurnCountdown::new(config.countdown, Rc::clone(&view));
        let redirect = RedirectCountdown::new(config.countdown.tick, Rc::clone(&view));
        GameSession {
            rules,
            widget,
            view,
            service,
            config,
            countdown,
            redirect,
            phase: Phase::Idle,
        }
    }

    /// Sync the widget, show the status line and start the first turn
    pub fn start(&mut self) {
        self.resync_widget();
        self.view.set_status(&status_text(self.rules.as_ref()));
        if self.rules.is_game_over() {
            self.phase = Phase::GameEnded;
            return;
        }
        self.countdown.start();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &dyn RulesModel {
        self.rules.as_ref()
    }

    pub fn widget(&self) -> &dyn BoardWidget {
        self.widget.as_ref()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn countdown(&self) -> &TurnCountdown {
        &self.countdown
    }

    pub fn redirect(&self) -> &RedirectCountdown {
        &self.redirect
    }

    /// Whether the widget may pick up `piece` from `source`
    pub fn on_drag_start(&self, source: &str, piece: &str) -> bool {
        if self.phase != Phase::Idle || self.rules.is_game_over() {
            return false;
        }

        let code: PieceCode = match piece.parse() {
            Ok(code) => code,
            Err(_) => return false,
        };
        let orientation = self.widget.orientation();
        if code.color != orientation || self.rules.side_to_move() != orientation {
            return false;
        }

        parse_square(source)
            .ok()
            .and_then(|square| self.rules.piece_at(square))
            .is_some_and(|(kind, color)| kind == code.piece && color == code.color)
    }

    /// Run one move exchange for a piece dropped from `source` on `target`.
    ///
    /// Errors are transport failures; the move has already been reverted when
    /// one is returned. Dropping the future before it resolves leaves the
    /// session in `AwaitingServer` until `cancel_submission` is called.
    pub async fn on_drop(&mut self, source: &str, target: &str, piece: &str) -> Result<Settlement, MoveError> {
        if source == target {
            return Ok(self.snapback(SnapbackReason::SameSquare));
        }
        match self.phase {
            Phase::Idle => {}
            Phase::GameEnded => return Ok(self.snapback(SnapbackReason::GameEnded)),
            Phase::LocalValidation | Phase::AwaitingServer => return Ok(self.snapback(SnapbackReason::Busy)),
        }

        let (from, to, code) = match (parse_square(source), parse_square(target), piece.parse::<PieceCode>()) {
            (Ok(from), Ok(to), Ok(code)) => (from, to, code),
            _ => {
                debug!("Unreadable drop {} -> {} ({})", source, target, piece);
                return Ok(self.snapback(SnapbackReason::InvalidInput));
            }
        };

        let orientation = self.widget.orientation();
        if code.color != orientation || self.rules.side_to_move() != orientation {
            debug!("Refusing {} {}{}: not {:?}'s move", piece, source, target, orientation);
            return Ok(self.snapback(SnapbackReason::NotYourTurn));
        }

        self.phase = Phase::LocalValidation;
        let promotion = promotion_choice(self.config.promotion, self.rules.as_ref(), from, to, code);
        let old_fen = self.rules.fen();
        if self.rules.try_move(from, to, Some(Piece::Queen)).is_none() {
            self.phase = Phase::Idle;
            return Ok(self.snapback(SnapbackReason::IllegalMove));
        }
        self.resync_widget();

        let request = MoveRequest {
            source: source.to_string(),
            target: target.to_string(),
            piece: piece.to_string(),
            new_fen: self.rules.fen(),
            old_fen,
            promotion: promotion.map(|p| piece_letter(p).to_ascii_lowercase().to_string()),
        };

        self.phase = Phase::AwaitingServer;
        let token = self.service.session_token();
        debug!("Submitting {}{} for session {:?}", source, target, token);

        let delivered = self.service.submit_move(&token, &request).await;
        let result = match delivered {
            Ok(result) => result,
            Err(e) => {
                error!("Move {}{} could not be delivered: {}", source, target, e);
                self.revert();
                return Err(e.into());
            }
        };

        if result.is_error() {
            warn!(
                "Move {}{} rejected: {}",
                source,
                target,
                result.info.as_deref().unwrap_or("no reason given")
            );
            self.revert();
            return Ok(Settlement::Rejected { info: result.info });
        }

        let opponent_move = result
            .reply
            .as_ref()
            .and_then(|(from, to)| self.apply_reply(from, to));
        self.resync_widget();
        self.view.set_status(&status_text(self.rules.as_ref()));

        if result.is_game_end() {
            self.end_game(&result);
            return Ok(Settlement::Accepted {
                opponent_move,
                game_ended: true,
            });
        }

        self.countdown.start();
        self.phase = Phase::Idle;
        Ok(Settlement::Accepted {
            opponent_move,
            game_ended: false,
        })
    }

    /// Revert a submission whose future was dropped before the server answered
    pub fn cancel_submission(&mut self) -> bool {
        if self.phase != Phase::AwaitingServer {
            return false;
        }
        info!("Abandoning in-flight move");
        self.revert();
        true
    }

    /// The widget finished its snap animation; show what the rules model says
    pub fn on_snap_end(&mut self) {
        self.resync_widget();
    }

    fn apply_reply(&mut self, from: &str, to: &str) -> Option<AppliedMove> {
        let (from_sq, to_sq) = match (parse_square(from), parse_square(to)) {
            (Ok(from_sq), Ok(to_sq)) => (from_sq, to_sq),
            _ => {
                warn!("Ignoring unreadable opponent move {}{}", from, to);
                return None;
            }
        };

        match self.rules.try_move(from_sq, to_sq, Some(Piece::Queen)) {
            Some(applied) => {
                self.widget.move_piece(from_sq, to_sq, true);
                Some(applied)
            }
            None => {
                warn!("Opponent move {}{} is illegal here: {}", from, to, self.rules.fen());
                None
            }
        }
    }

    fn end_game(&mut self, result: &MoveResult) {
        self.phase = Phase::GameEnded;
        self.countdown.stop();
        self.view.hide_countdown();

        let url = match result.redirect_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => with_query(url, &result.continuation()),
            None => {
                warn!("Game ended without a redirect target");
                self.view.show_redirect_error();
                return;
            }
        };

        self.view.grey_out_board();
        if self.config.navigate_immediately && !result.continuation().is_empty() {
            info!("Continuing at {}", url);
            self.view.navigate(&url);
            return;
        }

        let seconds = self.config.redirect_seconds;
        self.view.show_redirect_hint(&url, i64::from(seconds));
        self.redirect.start(url, seconds);
    }

    fn snapback(&mut self, reason: SnapbackReason) -> Settlement {
        self.resync_widget();
        Settlement::Snapback(reason)
    }

    // Undo the pending move in both the rules model and the widget
    fn revert(&mut self) {
        if self.rules.undo().is_none() {
            warn!("Nothing to undo at {}", self.rules.fen());
        }
        self.resync_widget();
        self.phase = Phase::Idle;
    }

    fn resync_widget(&mut self) {
        let fen = self.rules.fen();
        self.widget.set_position(&fen);
    }
}

/// Append `params` to `url` as a query string
pub fn with_query(url: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, NON_ALPHANUMERIC)))
        .collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query.join("&"))
}
