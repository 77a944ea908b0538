use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Move descriptor sent from client to server for a single drop
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub source: String,
    pub target: String,
    pub piece: String,
    pub new_fen: String,
    pub old_fen: String,
    pub promotion: Option<String>,
}

/// Wire envelope: write-style requests carry their payload under `data`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RequestEnvelope<T> {
    pub data: Option<T>,
}

/// Server verdict for a submitted move
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MoveResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_end: Option<Value>,
    #[serde(alias = "redirect_to", default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    // Continuation fields come straight from the server's records, so their
    // JSON types vary; they are only ever echoed back in a query string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_game_number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_elo: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Value>,
}

impl MoveResult {
    pub fn rejected(info: impl Into<String>) -> Self {
        MoveResult {
            error: Some(Value::Bool(true)),
            info: Some(info.into()),
            ..Default::default()
        }
    }

    /// The server flagged the move as an application-level error
    pub fn is_error(&self) -> bool {
        self.error.as_ref().is_some_and(truthy)
    }

    pub fn is_game_end(&self) -> bool {
        self.game_end.as_ref().is_some_and(truthy)
    }

    /// Continuation parameters for the next game, in query-string order
    pub fn continuation(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(number) = self.new_game_number.as_ref().and_then(scalar_text) {
            params.push(("new_game_number", number));
            let rest = [
                ("user_id", &self.user_id),
                ("user_elo", &self.user_elo),
                ("game_id", &self.game_id),
            ];
            for (key, value) in rest {
                if let Some(text) = value.as_ref().and_then(scalar_text) {
                    params.push((key, text));
                }
            }
        }
        params
    }
}

/// Game bootstrap information returned by `GET /game/{token}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GameInfo {
    pub token: String,
    pub game_id: u64,
    pub fen: String,
}

/// One entry of a finished game's move log
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub source: String,
    pub target: String,
    pub piece: String,
    pub color: String,
    pub old_fen: String,
    pub new_fen: String,
    pub castling: String,
    pub promotion: Option<String>,
    /// Milliseconds since the game started
    pub timestamp_ms: u64,
}

/// A logged move with its timing, as reported after the game
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimedMove {
    #[serde(flatten)]
    pub record: MoveRecord,
    /// One-based position in the move log
    pub move_number: u32,
    /// Seconds since the previous move, or since the start for the first one
    pub draw_time: f64,
    /// The move took longer than the per-move limit
    pub overdrawn: bool,
}

/// Post-game summary returned by `GET /result/{game_id}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GameSummary {
    pub game_id: u64,
    pub user_id: String,
    pub end_reason: Option<String>,
    pub winner: Option<String>,
    pub moves: Vec<TimedMove>,
    /// Moves made by the player
    pub user_move_count: usize,
    /// Mean draw time of the player's moves, in seconds
    pub avg_move_duration: f64,
}

// Query-string rendition of a scalar; null means absent
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Flags arrive as booleans, numbers or strings depending on the server
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_opponent_reply() {
        let result: MoveResult =
            serde_json::from_value(json!({"game_end": false, "move": ["e7", "e5"]})).unwrap();
        assert!(!result.is_error());
        assert!(!result.is_game_end());
        assert_eq!(result.reply, Some(("e7".to_string(), "e5".to_string())));
    }

    #[test]
    fn error_and_game_end_flags_are_truthy() {
        let result: MoveResult =
            serde_json::from_value(json!({"error": true, "info": "not your turn"})).unwrap();
        assert!(result.is_error());
        assert_eq!(result.info.as_deref(), Some("not your turn"));

        let result: MoveResult = serde_json::from_value(json!({"game_end": 1})).unwrap();
        assert!(result.is_game_end());

        let result: MoveResult = serde_json::from_value(json!({"error": false})).unwrap();
        assert!(!result.is_error());
    }

    #[test]
    fn accepts_redirect_to_alias() {
        let result: MoveResult =
            serde_json::from_value(json!({"game_end": true, "redirect_to": "/done"})).unwrap();
        assert_eq!(result.redirect_url.as_deref(), Some("/done"));
    }

    #[test]
    fn continuation_requires_new_game_number() {
        let result: MoveResult =
            serde_json::from_value(json!({"user_id": "example", "user_elo": 1285})).unwrap();
        assert!(result.continuation().is_empty());

        let result: MoveResult = serde_json::from_value(json!({
            "new_game_number": 2,
            "user_id": "example",
            "user_elo": 1285,
            "game_id": 7
        }))
        .unwrap();
        let keys: Vec<&str> = result.continuation().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["new_game_number", "user_id", "user_elo", "game_id"]);
    }

    #[test]
    fn continuation_fields_accept_any_scalar() {
        let result: MoveResult = serde_json::from_value(json!({
            "game_end": true,
            "redirect_url": "/result/42",
            "user_id": 7,
            "new_game_number": "2",
            "user_elo": null,
            "game_id": 42
        }))
        .unwrap();
        assert_eq!(
            result.continuation(),
            vec![
                ("new_game_number", "2".to_string()),
                ("user_id", "7".to_string()),
                ("game_id", "42".to_string()),
            ]
        );
    }

    #[test]
    fn request_serializes_missing_promotion_as_null() {
        let request = MoveRequest {
            source: "e2".into(),
            target: "e4".into(),
            piece: "wP".into(),
            new_fen: "new".into(),
            old_fen: "old".into(),
            promotion: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["promotion"], Value::Null);
    }
}
