use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chess::{Piece, Square};
use log::{info, warn};
use serde_json::{json, Value};

use crate::error::ServerError;
use crate::game::opponent::choose_reply;
use crate::game::piece::{parse_square, piece_from_letter};
use crate::game::rules::RulesModel;
use crate::models::app_state::{lock, AppState};
use crate::models::game_state::{GameState, PLAYER_COLOR};
use crate::models::messages::{GameInfo, MoveRequest, MoveResult, RequestEnvelope};

/// Create a game and send the browser to its page
pub async fn new_game(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServerError> {
    let (user_id, user_elo) = path.into_inner();
    let elo: u32 = user_elo.parse().map_err(|_| ServerError::InvalidElo(user_elo.clone()))?;

    let token = state.create_game(&user_id, elo);
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/game/{}", token)))
        .finish())
}

/// Game bootstrap data; also hands the token to the client as a cookie
pub async fn game_page(state: web::Data<AppState>, token: web::Path<String>) -> Result<HttpResponse, ServerError> {
    let token = token.into_inner();
    let games = lock(&state.games);
    let game = games
        .get(&token)
        .ok_or_else(|| ServerError::UnknownToken(token.clone()))?;

    let info = GameInfo {
        token: token.clone(),
        game_id: game.game_id,
        fen: game.rules.fen(),
    };
    Ok(HttpResponse::Ok()
        .cookie(Cookie::build("token", token).path("/").finish())
        .json(info))
}

/// Apply the player's move, answer with the service's reply and report the
/// end of the game when it comes
pub async fn submit_move(
    state: web::Data<AppState>,
    token: web::Path<String>,
    body: web::Json<RequestEnvelope<MoveRequest>>,
) -> Result<HttpResponse, ServerError> {
    let token = token.into_inner();
    let request = body.into_inner().data.ok_or(ServerError::MissingData)?;
    let max_game_time = state.config.max_game_time();

    let mut games = lock(&state.games);
    let game = games
        .get_mut(&token)
        .ok_or_else(|| ServerError::UnknownToken(token.clone()))?;

    info!("Game {}: {}{} ({})", game.game_id, request.source, request.target, request.piece);

    if game.check_end(max_game_time) {
        let result = end_of_game(&state, game, None);
        drop(games);
        state.finish_game(&token);
        return Ok(HttpResponse::Ok().json(result));
    }

    if !apply_player_move(game, &request) {
        warn!("Game {}: illegal move {}{}", game.game_id, request.source, request.target);
        return Ok(HttpResponse::Ok().json(MoveResult::rejected("Illegal move!")));
    }

    let mut reply = None;
    if !game.check_end(max_game_time) {
        if let Some(chess_move) = choose_reply(game.rules.board()) {
            let old_fen = game.rules.fen();
            if let Some(applied) =
                game.rules
                    .try_move(chess_move.get_source(), chess_move.get_dest(), chess_move.get_promotion())
            {
                game.record(&applied, old_fen);
                reply = Some((applied.from.to_string(), applied.to.to_string()));
            }
        }
        game.check_end(max_game_time);
    }

    if game.is_over() {
        let result = end_of_game(&state, game, reply);
        drop(games);
        state.finish_game(&token);
        return Ok(HttpResponse::Ok().json(result));
    }

    Ok(HttpResponse::Ok().json(MoveResult {
        reply,
        game_end: Some(Value::Bool(false)),
        ..Default::default()
    }))
}

/// Summary of a finished game
pub async fn game_result(state: web::Data<AppState>, game_id: web::Path<u64>) -> Result<HttpResponse, ServerError> {
    let game_id = game_id.into_inner();
    let finished = lock(&state.finished);
    let summary = finished.get(&game_id).ok_or(ServerError::UnknownGame(game_id))?;
    Ok(HttpResponse::Ok().json(summary))
}

fn apply_player_move(game: &mut GameState, request: &MoveRequest) -> bool {
    let (from, to) = match (parse_square(&request.source), parse_square(&request.target)) {
        (Ok(from), Ok(to)) => (from, to),
        _ => return false,
    };
    if !player_owns(game, from) {
        return false;
    }

    let promotion = request
        .promotion
        .as_deref()
        .and_then(|letter| letter.chars().next())
        .and_then(piece_from_letter)
        .or(Some(Piece::Queen));

    let old_fen = game.rules.fen();
    match game.rules.try_move(from, to, promotion) {
        Some(applied) => {
            game.record(&applied, old_fen);
            true
        }
        None => false,
    }
}

fn player_owns(game: &GameState, square: Square) -> bool {
    game.rules.side_to_move() == PLAYER_COLOR && game.rules.piece_at(square).is_some_and(|(_, color)| color == PLAYER_COLOR)
}

fn end_of_game(state: &AppState, game: &GameState, reply: Option<(String, String)>) -> MoveResult {
    MoveResult {
        reply,
        game_end: Some(Value::Bool(true)),
        redirect_url: Some(format!("{}/{}", state.config.redirect_base, game.game_id)),
        new_game_number: Some(json!(game.game_number + 1)),
        user_id: Some(json!(game.user_id)),
        user_elo: Some(json!(game.user_elo)),
        game_id: Some(json!(game.game_id)),
        ..Default::default()
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/new/{user_id}/{user_elo}").route(web::get().to(new_game)))
        .service(web::resource("/game/{token}").route(web::get().to(game_page)))
        .service(web::resource("/move/{token}").route(web::put().to(submit_move)))
        .service(web::resource("/result/{game_id}").route(web::get().to(game_result)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::game::rules::DEFAULT_FEN;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(ServerConfig::default()))
    }

    fn move_body(source: &str, target: &str, piece: &str) -> Value {
        json!({"data": {
            "source": source,
            "target": target,
            "piece": piece,
            "old_fen": "",
            "new_fen": "",
            "promotion": null
        }})
    }

    #[actix_web::test]
    async fn new_game_redirects_to_its_page() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/new/example/1285").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("/game/"));
        assert_eq!(state.games_started("example"), 1);
    }

    #[actix_web::test]
    async fn game_page_sets_the_token_cookie() {
        let state = state();
        let token = state.create_game("example", 1285);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri(&format!("/game/{}", token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let cookie = resp.response().cookies().find(|c| c.name() == "token").unwrap();
        assert_eq!(cookie.value(), token);

        let info: GameInfo = test::read_body_json(resp).await;
        assert_eq!(info.fen, DEFAULT_FEN);
    }

    #[actix_web::test]
    async fn illegal_move_is_refused() {
        let state = state();
        let token = state.create_game("example", 1285);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::put()
            .uri(&format!("/move/{}", token))
            .set_json(move_body("e2", "e5", "wP"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"error": true, "info": "Illegal move!"}));
        assert_eq!(lock(&state.games)[&token].rules.fen(), DEFAULT_FEN);
    }

    #[actix_web::test]
    async fn legal_move_gets_a_reply() {
        let state = state();
        let token = state.create_game("example", 1285);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::put()
            .uri(&format!("/move/{}", token))
            .set_json(move_body("e2", "e4", "wP"))
            .to_request();
        let result: MoveResult = test::call_and_read_body_json(&app, req).await;

        assert!(!result.is_error());
        assert!(!result.is_game_end());
        assert!(result.reply.is_some());
        assert_eq!(lock(&state.games)[&token].moves.len(), 2);
    }

    #[actix_web::test]
    async fn unknown_token_is_not_found() {
        let app = test::init_service(App::new().app_data(state()).configure(configure_routes)).await;
        let req = test::TestRequest::put()
            .uri("/move/nope")
            .set_json(move_body("e2", "e4", "wP"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn missing_data_is_a_server_error() {
        let state = state();
        let token = state.create_game("example", 1285);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::put()
            .uri(&format!("/move/{}", token))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": true, "info": "Missing data!"}));
    }

    #[actix_web::test]
    async fn mating_move_ends_the_game_with_redirect_data() {
        let state = state();
        let token = state.create_game("example", 1285);
        let game_id = {
            let mut games = lock(&state.games);
            let game = games.get_mut(&token).unwrap();
            // Scholar's mate setup, white to play Qxf7#
            game.rules
                .load_fen("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
                .unwrap();
            game.game_id
        };
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::put()
            .uri(&format!("/move/{}", token))
            .set_json(move_body("h5", "f7", "wQ"))
            .to_request();
        let result: MoveResult = test::call_and_read_body_json(&app, req).await;

        assert!(result.is_game_end());
        assert_eq!(result.reply, None);
        assert_eq!(result.redirect_url, Some(format!("/result/{}", game_id)));
        assert_eq!(result.new_game_number, Some(json!(2)));
        assert_eq!(result.user_id, Some(json!("example")));

        let req = test::TestRequest::get().uri(&format!("/result/{}", game_id)).to_request();
        let summary: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["end_reason"], "checkmate");
        assert_eq!(summary["winner"], "white");
        assert_eq!(summary["user_move_count"], 1);
        assert_eq!(summary["moves"][0]["move_number"], 1);
        assert_eq!(summary["moves"][0]["overdrawn"], false);

        let req = test::TestRequest::get().uri(&format!("/game/{}", token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
