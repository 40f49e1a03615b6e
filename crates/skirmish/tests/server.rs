//! Integration tests for the full server: real sockets, both channels,
//! two clients matched and playing.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use skirmish::prelude::*;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

// =========================================================================
// Mock authenticator and deck provider
// =========================================================================

/// Accepts any numeric token as a PlayerId.
struct TestAuth;

impl Authenticator for TestAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        let id: u64 = token
            .parse()
            .map_err(|_| AuthError::Failed("not a number".into()))?;
        Ok(PlayerId(id))
    }
}

/// Decodes ownership and score from the deck id itself:
/// `deck_id = owner * 1000 + score`.
struct TestDecks;

impl DeckProvider for TestDecks {
    async fn deck(
        &self,
        player: PlayerId,
        deck: DeckId,
    ) -> Result<DeckSummary, QueueError> {
        if deck.0 / 1000 != player.0 {
            return Err(QueueError::DeckNotFound);
        }
        let unit = |kind, x, y| DeckUnit {
            kind,
            health: 5,
            attack: 3,
            speed: 2,
            x,
            y,
        };
        Ok(DeckSummary {
            id: deck,
            score: (deck.0 % 1000) as i32,
            units: vec![
                unit(UnitKind::King, 5, 1),
                unit(UnitKind::Wizard, 4, 1),
                unit(UnitKind::Warrior, 3, 2),
            ],
        })
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns its address.
async fn start_server() -> String {
    let server = ServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(TestAuth, TestDecks)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// Connects a client at `path`, authenticating with `token`.
async fn connect(addr: &str, path: &str, token: &str) -> ClientWs {
    let mut req = format!("ws://{addr}{path}")
        .into_client_request()
        .expect("valid request");
    req.headers_mut()
        .insert("Authorization", token.parse().expect("valid header"));
    let (ws, _) = tokio_tungstenite::connect_async(req)
        .await
        .expect("should connect");
    ws
}

async fn send_text(ws: &mut ClientWs, text: &str) {
    ws.send(Message::text(text.to_string()))
        .await
        .expect("send should succeed");
}

/// Receives the next text frame and parses it as JSON.
async fn next_json(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended unexpectedly")
        .expect("websocket error");
    serde_json::from_str(msg.to_text().expect("text frame"))
        .expect("frame should be JSON")
}

/// Queues a player and returns after the "added to queue" reply.
async fn join_queue(ws: &mut ClientWs, deck_id: u64) -> Value {
    send_text(ws, &format!(r#"{{"type":"connect","deck_id":{deck_id}}}"#))
        .await;
    let added = next_json(ws).await;
    assert_eq!(added["type"], "INFO", "unexpected reply: {added}");
    assert!(
        added["message"]
            .as_str()
            .unwrap()
            .starts_with("added to queue with score"),
        "unexpected message: {added}"
    );
    added
}

/// Runs the full matchmaking handshake for two players and returns the
/// room slug both were pointed at, plus the still-open queue sockets.
async fn match_two_players(addr: &str) -> (String, ClientWs, ClientWs) {
    let mut q1 = connect(addr, "/queue", "1").await;
    let mut q2 = connect(addr, "/queue", "2").await;

    join_queue(&mut q1, 1100).await;
    let waiting = next_json(&mut q1).await;
    assert_eq!(waiting["message"], "no user found, awaiting in queue");

    join_queue(&mut q2, 2103).await;
    let found2 = next_json(&mut q2).await;
    assert_eq!(found2["message"], "user found");
    let slug = found2["room"].as_str().expect("room slug").to_string();

    let found1 = next_json(&mut q1).await;
    assert_eq!(found1["message"], "user found");
    assert_eq!(found1["room"].as_str().unwrap(), slug, "both sides get the same room");

    (slug, q1, q2)
}

// =========================================================================
// Authentication
// =========================================================================

#[tokio::test]
async fn test_invalid_token_is_rejected_and_closed() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "/queue", "not-a-number").await;

    let err = next_json(&mut ws).await;
    assert_eq!(err["type"], "ERROR");
    assert_eq!(err["message"], "token is incorrect or expired");

    // The server closes the connection after notifying.
    let end = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            }
        }
    })
    .await;
    assert!(end.is_ok(), "connection should be closed by the server");
}

// =========================================================================
// Queue channel validation
// =========================================================================

#[tokio::test]
async fn test_queue_rejects_malformed_frames() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "/queue", "1").await;

    send_text(&mut ws, "this is not json").await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["message"], "data is not JSON serializable");

    send_text(&mut ws, r#"{"deck_id":3}"#).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["message"], "incorrect data typing");

    send_text(&mut ws, r#"{"type":"connect"}"#).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["message"], "deck id is not provided");

    send_text(&mut ws, r#"{"type":"connect","deck_id":"abc"}"#).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["message"], "deck id is incorrect");
}

#[tokio::test]
async fn test_queue_rejects_foreign_deck() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "/queue", "1").await;

    // Deck 2103 belongs to player 2.
    send_text(&mut ws, r#"{"type":"connect","deck_id":2103}"#).await;
    let err = next_json(&mut ws).await;
    assert_eq!(err["type"], "ERROR");
    assert_eq!(err["message"], "such deck doesn't exist");
}

#[tokio::test]
async fn test_queue_reports_waiting_when_alone() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "/queue", "1").await;

    let added = join_queue(&mut ws, 1100).await;
    assert_eq!(added["message"], "added to queue with score 100");

    let waiting = next_json(&mut ws).await;
    assert_eq!(waiting["type"], "INFO");
    assert_eq!(waiting["message"], "no user found, awaiting in queue");
}

#[tokio::test]
async fn test_out_of_window_scores_do_not_match() {
    let addr = start_server().await;
    let mut q1 = connect(&addr, "/queue", "1").await;
    let mut q2 = connect(&addr, "/queue", "2").await;

    join_queue(&mut q1, 1100).await; // score 100
    let waiting = next_json(&mut q1).await;
    assert_eq!(waiting["message"], "no user found, awaiting in queue");

    join_queue(&mut q2, 2200).await; // score 200, far outside ±5%
    let waiting = next_json(&mut q2).await;
    assert_eq!(waiting["message"], "no user found, awaiting in queue");
}

// =========================================================================
// Matchmaking → room
// =========================================================================

#[tokio::test]
async fn test_players_with_close_scores_get_matched() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;
    assert_eq!(slug.len(), 16);
    assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_room_attach_pushes_snapshot_and_assigns_one_first() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    let mut r1 = connect(&addr, &format!("/room/{slug}"), "1").await;
    let snap1 = next_json(&mut r1).await;
    assert_eq!(snap1["type"], "INFO");
    assert_eq!(snap1["opponent_score"], 103);
    assert_eq!(snap1["opponent_deck"], 2103);
    assert_eq!(snap1["opponent_online"], false);
    assert_eq!(snap1["state"], "Game started");
    assert_eq!(snap1["round"], 0);

    let mut r2 = connect(&addr, &format!("/room/{slug}"), "2").await;
    let snap2 = next_json(&mut r2).await;
    assert_eq!(snap2["opponent_score"], 100);
    assert_eq!(snap2["opponent_online"], true);

    // Exactly one seat moves first.
    let first1 = snap1["first"].as_bool().unwrap();
    let first2 = snap2["first"].as_bool().unwrap();
    assert!(first1 ^ first2, "exactly one seat must be first");

    // Player 1 is told player 2 came online.
    let presence = next_json(&mut r1).await;
    assert_eq!(presence["type"], "connection_info");
    assert_eq!(presence["online"], true);
}

#[tokio::test]
async fn test_room_rejects_outsider_and_unknown_slug() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    // Player 3 holds no seat in this room.
    let mut intruder = connect(&addr, &format!("/room/{slug}"), "3").await;
    let err = next_json(&mut intruder).await;
    assert_eq!(err["type"], "ERROR");
    assert_eq!(err["message"], "you are not a player of this room");

    let mut lost = connect(&addr, "/room/doesnotexist0000", "1").await;
    let err = next_json(&mut lost).await;
    assert_eq!(err["message"], "no such room");
}

#[tokio::test]
async fn test_start_relays_readiness_to_opponent() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    let mut r1 = connect(&addr, &format!("/room/{slug}"), "1").await;
    let _snap1 = next_json(&mut r1).await;
    let mut r2 = connect(&addr, &format!("/room/{slug}"), "2").await;
    let _snap2 = next_json(&mut r2).await;
    let _presence = next_json(&mut r1).await;

    send_text(&mut r1, r#"{"type":"start"}"#).await;
    let relayed = next_json(&mut r2).await;
    assert_eq!(relayed["type"], "start");
}

#[tokio::test]
async fn test_start_fails_while_opponent_offline() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    let mut r1 = connect(&addr, &format!("/room/{slug}"), "1").await;
    let _snap = next_json(&mut r1).await;

    send_text(&mut r1, r#"{"type":"start"}"#).await;
    let err = next_json(&mut r1).await;
    assert_eq!(err["type"], "ERROR");
    assert_eq!(err["message"], "opponent is offline");
}

#[tokio::test]
async fn test_legal_move_is_broadcast_to_both_seats() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    let mut r1 = connect(&addr, &format!("/room/{slug}"), "1").await;
    let snap1 = next_json(&mut r1).await;
    let mut r2 = connect(&addr, &format!("/room/{slug}"), "2").await;
    let _snap2 = next_json(&mut r2).await;
    let _presence = next_json(&mut r1).await;

    // The first seat's warrior sits at (3,2) advancing up; the other
    // seat's is mirrored to (3,7) advancing down.
    let (mover, watcher, from_y, to_y, mover_id) =
        if snap1["first"].as_bool().unwrap() {
            (&mut r1, &mut r2, 2, 3, 1)
        } else {
            (&mut r2, &mut r1, 7, 6, 2)
        };

    send_text(
        &mut *mover,
        &format!(
            r#"{{"type":"move","from_x":3,"from_y":{from_y},"to_x":3,"to_y":{to_y}}}"#
        ),
    )
    .await;

    for ws in [mover, watcher] {
        let broadcast = next_json(ws).await;
        assert_eq!(broadcast["type"], "move", "got: {broadcast}");
        assert_eq!(broadcast["player"], mover_id);
        assert_eq!(broadcast["from_x"], 3);
        assert_eq!(broadcast["to_y"], to_y);
        assert_eq!(broadcast["captured"], false);
        assert_eq!(broadcast["round"], 1);
        assert_eq!(broadcast["ended"], false);
    }
}

#[tokio::test]
async fn test_illegal_move_errors_only_the_mover() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    let mut r1 = connect(&addr, &format!("/room/{slug}"), "1").await;
    let _snap1 = next_json(&mut r1).await;
    let mut r2 = connect(&addr, &format!("/room/{slug}"), "2").await;
    let _snap2 = next_json(&mut r2).await;
    let _presence = next_json(&mut r1).await;

    // A king sliding two columns, from either seat's starting square.
    send_text(
        &mut r1,
        r#"{"type":"move","from_x":5,"from_y":1,"to_x":7,"to_y":1}"#,
    )
    .await;
    let err = next_json(&mut r1).await;
    assert_eq!(err["type"], "ERROR");
    // Which rule fires depends on who is first (the mirrored king sits
    // on row 8), but it must be a rejection either way.
    assert!(
        err["message"] == "illegal move for this unit"
            || err["message"] == "no unit at source cell",
        "got: {err}"
    );
}

#[tokio::test]
async fn test_disconnect_notifies_remaining_seat() {
    let addr = start_server().await;
    let (slug, _q1, _q2) = match_two_players(&addr).await;

    let mut r1 = connect(&addr, &format!("/room/{slug}"), "1").await;
    let _snap1 = next_json(&mut r1).await;
    let mut r2 = connect(&addr, &format!("/room/{slug}"), "2").await;
    let _snap2 = next_json(&mut r2).await;
    let presence = next_json(&mut r1).await;
    assert_eq!(presence["online"], true);

    drop(r2);

    let presence = next_json(&mut r1).await;
    assert_eq!(presence["type"], "connection_info");
    assert_eq!(presence["online"], false);
}
