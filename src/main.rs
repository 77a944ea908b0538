use anyhow::Context;
use log::{info, warn};
use std::rc::Rc;
use std::time::Duration;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use chess_game_client::api::{Api, CookieJar};
use chess_game_client::game::parse_square;
use chess_game_client::game::rules::ChessRules;
use chess_game_client::ui::{BoardWidget, ConsoleView, TextBoard};
use chess_game_client::{ClientConfig, GameSession, Phase, Settlement, SnapbackReason};

fn draw(session: &GameSession<Api>) {
    println!("{}", session.widget().render());
}

/// Split `e2e4` or `e2 e4` into its two squares
fn parse_input(line: &str) -> Option<(String, String)> {
    let compact: String = line.split_whitespace().collect();
    if compact.len() != 4 {
        return None;
    }
    let (source, target) = compact.split_at(2);
    Some((source.to_lowercase(), target.to_lowercase()))
}

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ClientConfig::from_env();
    let mut api = Api::new(&config.server_url)?.with_token_cookie(config.token_cookie.clone());
    if let Some(raw) = &config.cookie {
        api = api.with_cookies(CookieJar::parse(raw));
    }

    let game = api
        .fetch_game(&config.game_path)
        .await
        .with_context(|| format!("could not load {}{}", config.server_url, config.game_path))?;
    info!("Playing game {} as {:?}", game.game_id, config.session.player_color);

    let rules = ChessRules::from_fen(&game.fen)?;
    let board = TextBoard::new(config.session.player_color, &game.fen);
    let view = Rc::new(ConsoleView::new());
    let mut session = GameSession::new(Box::new(rules), Box::new(board), view.clone(), api, config.session.clone());

    session.start();
    draw(&session);
    println!("Enter moves like e2e4, or quit.");

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") {
            break;
        }

        let Some((source, target)) = parse_input(line) else {
            println!("Could not read {:?}", line);
            continue;
        };
        let piece = match parse_square(&source).ok().and_then(|square| session.widget().piece_at(square)) {
            Some(piece) => piece.to_string(),
            None => {
                println!("No piece on {}", source);
                continue;
            }
        };
        if !session.on_drag_start(&source, &piece) {
            println!("That piece cannot move now.");
            continue;
        }

        match session.on_drop(&source, &target, &piece).await {
            Ok(Settlement::Snapback(SnapbackReason::IllegalMove)) => println!("Illegal move."),
            Ok(Settlement::Snapback(reason)) => info!("Move returned to {}: {:?}", source, reason),
            Ok(Settlement::Rejected { info }) => {
                println!("The server refused the move: {}", info.unwrap_or_default())
            }
            Ok(Settlement::Accepted { .. }) => {}
            Err(e) => warn!("{:#}", anyhow::Error::from(e)),
        }
        session.on_snap_end();
        draw(&session);

        if session.phase() == Phase::GameEnded {
            break;
        }
    }

    while session.redirect().is_running() {
        actix_rt::time::sleep(Duration::from_millis(200)).await;
    }
    if let Some(url) = view.navigated_to() {
        println!("Continue at {}{}", session.service().base_url().as_str().trim_end_matches('/'), url);
    }

    Ok(())
}
