//! Per-connection handlers: auth, channel routing, and the two actor
//! loops.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!
//!   1. Authenticate the `Authorization` header captured at upgrade
//!   2. Route on the request path: `/queue` or `/room/<slug>`
//!   3. Run the channel's actor loop: `select!` over the socket and the
//!      actor's event channel, inbound frames processed strictly in
//!      arrival order
//!
//! Every rule/validation failure is caught here and turned into a typed
//! `ERROR` message for the offending client; nothing below this layer
//! talks to a socket.

use std::sync::Arc;

use skirmish_protocol::{
    Codec, DeckId, PlayerId, QueueMessage, QueueRequest, RoomMessage,
    RoomRequest, RoomSlug,
};
use skirmish_queue::{DeckProvider, QueueEvent, QueueSender};
use skirmish_room::{MatchedPlayer, RoomEvent, SeatSender, create_room, game};
use skirmish_session::{Authenticator, ClientSession};
use skirmish_transport::WsConnection;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::SkirmishError;
use crate::server::ServerState;

/// Wire text for a rejected credential; the real failure reason stays in
/// the server logs.
const BAD_TOKEN: &str = "token is incorrect or expired";

/// Which channel the upgrade path selects.
enum Route {
    Queue,
    Room(RoomSlug),
    Unknown,
}

fn route(path: &str) -> Route {
    let path = path.trim_end_matches('/');
    if path == "/queue" {
        return Route::Queue;
    }
    match path.strip_prefix("/room/") {
        Some(slug) if !slug.is_empty() && !slug.contains('/') => {
            Route::Room(RoomSlug::new(slug))
        }
        _ => Route::Unknown,
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, D, C>(
    conn: WsConnection,
    state: Arc<ServerState<A, D, C>>,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    let conn_id = conn.id();
    let request = conn.request().clone();

    // --- Step 1: identity ---
    let token = request.authorization.as_deref().unwrap_or_default();
    let player_id = match state.auth.authenticate(token).await {
        Ok(pid) => pid,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "authentication rejected");
            let text = state.codec.encode(&QueueMessage::error(BAD_TOKEN))?;
            let _ = conn.send(&text).await;
            let _ = conn.close().await;
            return Ok(());
        }
    };
    let session = ClientSession::new(player_id);
    tracing::info!(%conn_id, %player_id, path = %request.path, "player connected");

    // --- Step 2: channel routing ---
    match route(&request.path) {
        Route::Queue => queue_channel(&conn, &state, &session).await,
        Route::Room(slug) => {
            room_channel(&conn, &state, &session, slug).await
        }
        Route::Unknown => {
            let text = state
                .codec
                .encode(&QueueMessage::error("no such channel"))?;
            let _ = conn.send(&text).await;
            let _ = conn.close().await;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Queue channel
// ---------------------------------------------------------------------------

/// The queue-channel actor: processes `connect` requests and relays
/// match notifications. Always removes the player's queue entry on the
/// way out — disconnecting is the cancellation signal.
async fn queue_channel<A, D, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, D, C>>,
    session: &ClientSession,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    let player_id = session.player_id;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = queue_loop(conn, state, player_id, &tx, &mut rx).await;

    state.queue.lock().await.leave(player_id);
    result
}

async fn queue_loop<A, D, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, D, C>>,
    player_id: PlayerId,
    tx: &QueueSender,
    rx: &mut UnboundedReceiver<QueueEvent>,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    loop {
        tokio::select! {
            event = rx.recv() => {
                // The opponent's actor paired us and created the room.
                if let Some(QueueEvent::Matched { room }) = event {
                    send(conn, state, &QueueMessage::matched(room)).await?;
                }
            }
            inbound = conn.recv() => match inbound {
                Ok(Some(text)) => match QueueRequest::parse(&text) {
                    Ok(Some(QueueRequest::Connect { deck_id })) => {
                        queue_connect(conn, state, player_id, deck_id, tx)
                            .await?;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        send(conn, state, &QueueMessage::error(e)).await?;
                    }
                },
                Ok(None) => return Ok(()),
                Err(e) => return Err(SkirmishError::Transport(e)),
            }
        }
    }
}

/// Handles one `connect` request: deck lookup, queue upsert, and the
/// score-window search.
async fn queue_connect<A, D, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, D, C>>,
    player_id: PlayerId,
    deck_id: DeckId,
    tx: &QueueSender,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    let deck = match state.decks.deck(player_id, deck_id).await {
        Ok(deck) => deck,
        Err(e) => {
            tracing::debug!(%player_id, %deck_id, error = %e, "deck lookup failed");
            return send(conn, state, &QueueMessage::error(e)).await;
        }
    };

    // Join and search under one queue lock: claiming both entries here
    // is what keeps a third player from matching a half-committed pair.
    let (score, claimed) = {
        let mut queue = state.queue.lock().await;
        let score = queue.join(player_id, deck, tx.clone());
        let claimed = queue
            .find_match(player_id, score)
            .and_then(|candidate| queue.take_pair(player_id, candidate));
        (score, claimed)
    };

    send(
        conn,
        state,
        &QueueMessage::info(format!("added to queue with score {score}")),
    )
    .await?;

    match claimed {
        None => {
            send(
                conn,
                state,
                &QueueMessage::info("no user found, awaiting in queue"),
            )
            .await
        }
        Some((mine, theirs)) => {
            let slug = {
                let mut registry = state.registry.lock().await;
                create_room(
                    &mut registry,
                    &mut rand::rng(),
                    MatchedPlayer {
                        player_id: mine.player_id,
                        deck: mine.deck,
                    },
                    MatchedPlayer {
                        player_id: theirs.player_id,
                        deck: theirs.deck,
                    },
                )
            };
            // Tell the opponent's actor; if it died, its entry is gone
            // from the queue already and the room just waits.
            let _ = theirs.sender.send(QueueEvent::Matched {
                room: slug.clone(),
            });
            send(conn, state, &QueueMessage::matched(slug)).await
        }
    }
}

// ---------------------------------------------------------------------------
// Room channel
// ---------------------------------------------------------------------------

/// The room-channel actor: attaches to a seat, relays room events, and
/// feeds requests to the game state machine.
async fn room_channel<A, D, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, D, C>>,
    session: &ClientSession,
    slug: RoomSlug,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    let player_id = session.player_id;
    let (tx, mut rx) = mpsc::unbounded_channel();
    // Kept to recognize our own attachment at cleanup time.
    let probe: SeatSender = tx.clone();

    let attached = {
        let mut registry = state.registry.lock().await;
        game::connect(&mut registry, &slug, player_id, tx)
    };
    let snapshot = match attached {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::debug!(%player_id, %slug, error = %e, "room attach rejected");
            send(conn, state, &RoomMessage::error(e)).await?;
            let _ = conn.close().await;
            return Ok(());
        }
    };

    send(
        conn,
        state,
        &RoomMessage::Attached {
            opponent_score: snapshot.opponent_score,
            opponent_deck: snapshot.opponent_deck,
            opponent_online: snapshot.opponent_online,
            first: snapshot.first,
            state: snapshot.state,
            round: snapshot.round,
        },
    )
    .await?;

    let result = room_loop(conn, state, player_id, &slug, &mut rx).await;

    // Detach only if this connection still owns the seat — a newer
    // connection for the same player may have replaced the sender.
    {
        let mut registry = state.registry.lock().await;
        let still_ours = registry
            .seat_of(&slug, player_id)
            .is_ok_and(|seat| seat.is_attached_via(&probe));
        if still_ours {
            game::disconnect(&mut registry, &slug, player_id);
        }
    }
    result
}

async fn room_loop<A, D, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, D, C>>,
    player_id: PlayerId,
    slug: &RoomSlug,
    rx: &mut UnboundedReceiver<RoomEvent>,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
{
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(RoomEvent::Presence { online }) => {
                    send(conn, state, &RoomMessage::ConnectionInfo { online })
                        .await?;
                }
                Some(RoomEvent::Ready) => {
                    send(conn, state, &RoomMessage::Start).await?;
                }
                Some(RoomEvent::Moved(rec)) => {
                    send(conn, state, &RoomMessage::Move {
                        player: rec.player,
                        from_x: rec.from_x,
                        from_y: rec.from_y,
                        to_x: rec.to_x,
                        to_y: rec.to_y,
                        captured: rec.captured,
                        round: rec.round,
                        ended: rec.ended,
                    })
                    .await?;
                }
                // Sender gone: a newer connection took over this seat.
                None => return Ok(()),
            },
            inbound = conn.recv() => match inbound {
                Ok(Some(text)) => match RoomRequest::parse(&text) {
                    Ok(Some(RoomRequest::Start)) => {
                        let outcome = {
                            let registry = state.registry.lock().await;
                            game::request_start(&registry, slug, player_id)
                        };
                        if let Err(e) = outcome {
                            send(conn, state, &RoomMessage::error(e)).await?;
                        }
                    }
                    Ok(Some(RoomRequest::Move(cmd))) => {
                        let outcome = {
                            let mut registry = state.registry.lock().await;
                            game::apply_move(
                                &mut registry,
                                slug,
                                player_id,
                                cmd,
                            )
                        };
                        // Success needs no direct reply — the broadcast
                        // arrives through this actor's own event channel.
                        if let Err(e) = outcome {
                            send(conn, state, &RoomMessage::error(e)).await?;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        send(conn, state, &RoomMessage::error(e)).await?;
                    }
                },
                Ok(None) => return Ok(()),
                Err(e) => return Err(SkirmishError::Transport(e)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Encodes and sends one outbound message.
async fn send<A, D, C, T>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, D, C>>,
    message: &T,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    D: DeckProvider,
    C: Codec,
    T: serde::Serialize,
{
    let text = state.codec.encode(message)?;
    conn.send(&text).await.map_err(SkirmishError::Transport)
}
