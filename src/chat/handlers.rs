use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures_util::stream::Stream;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{error, info, instrument, warn};

use crate::{
    ai::GenerateRequest,
    auth::services::AuthUser,
    plans::prompts,
    profile,
    state::AppState,
};

use super::dto::SendMessageRequest;
use super::session::{ChatMessage, ChatSession};

/// Shown in place of a reply when the assistant call fails.
const CHAT_ERROR: &str = "Desculpe, ocorreu um erro. Por favor, tente novamente.";

pub fn router() -> Router<AppState> {
    Router::new().route("/chat/messages", post(send_message).get(get_messages))
}

/// One assistant turn over SSE: a `user_message` event echoing the stored
/// user entry, `chunk` events with text deltas, then `done` with the full
/// reply (or `error` with the localized failure text).
#[instrument(skip(state, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    let instruction = prompts::chat_system_instruction(
        &record.profile.name,
        &record.profile.biometrics,
        record.data.current_plan.as_ref(),
    );

    // A session built around an outdated profile or plan is replaced before
    // the new turn goes in.
    let (user_msg, contents) = {
        let mut sessions = state.chat_sessions.write().await;
        let session = sessions
            .entry(user_id)
            .or_insert_with(|| ChatSession::new(instruction.clone()));
        if session.is_stale(&instruction) {
            info!(user_id = %user_id, "chat session stale, recreating");
            *session = ChatSession::new(instruction.clone());
        }
        let user_msg = ChatMessage::user(payload.message);
        session.push(user_msg.clone());
        (user_msg, session.contents())
    };

    let req = GenerateRequest::from_contents(contents).with_system(instruction);
    let stream_result = state.ai.generate_stream(req).await;
    let sessions = state.chat_sessions.clone();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .data(json!({"type": "user_message", "message": user_msg}).to_string()));

        let mut upstream = match stream_result {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, user_id = %user_id, "chat generation failed");
                yield Ok(Event::default()
                    .data(json!({"type": "error", "message": CHAT_ERROR}).to_string()));
                return;
            }
        };

        let mut full_reply = String::new();
        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(delta) => {
                    full_reply.push_str(&delta);
                    yield Ok(Event::default()
                        .data(json!({"type": "chunk", "delta": delta}).to_string()));
                }
                Err(e) => {
                    warn!(error = %e, user_id = %user_id, "chat stream interrupted");
                    yield Ok(Event::default()
                        .data(json!({"type": "error", "message": CHAT_ERROR}).to_string()));
                    return;
                }
            }
        }

        let reply = ChatMessage::model(full_reply);
        {
            // The session can be gone by now if the user signed out
            // mid-stream; the reply is still delivered, just not kept.
            let mut sessions = sessions.write().await;
            if let Some(session) = sessions.get_mut(&user_id) {
                session.push(reply.clone());
            }
        }
        yield Ok(Event::default()
            .data(json!({"type": "done", "message": reply}).to_string()));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Transcript of the live session; a missing or stale session reads as
/// empty rather than resurrecting old context.
#[instrument(skip(state))]
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ChatMessage>>, (StatusCode, String)> {
    let record = profile::repo::fetch_record(&state.db, user_id)
        .await
        .map_err(internal)?;
    let instruction = prompts::chat_system_instruction(
        &record.profile.name,
        &record.profile.biometrics,
        record.data.current_plan.as_ref(),
    );

    let sessions = state.chat_sessions.read().await;
    let messages = sessions
        .get(&user_id)
        .filter(|session| !session.is_stale(&instruction))
        .map(|session| session.messages().to_vec())
        .unwrap_or_default();
    Ok(Json(messages))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "chat storage error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
