//! Live report WebSocket endpoint.
//!
//! On connect the session receives the current snapshot as a
//! `relatorio_diario_inicial` message, then one `relatorio_diario` message
//! per published change. A session that falls behind only ever sees the
//! latest snapshot, never a backlog.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::AppState;
use crate::report::{LiveDailyReport, PushMessage};

pub async fn ws_relatorio_diario(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| ws_session(socket, state))
}

async fn ws_session(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(%conn_id, "sessao websocket conectada");

    let mut updates = state.publisher.subscribe();
    let (mut sink, mut stream) = socket.split();

    let initial = updates.borrow_and_update().clone();
    if send_report(&mut sink, PushMessage::inicial(initial.as_ref().clone()))
        .await
        .is_err()
    {
        info!(%conn_id, "sessao websocket encerrada no envio inicial");
        return;
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    // Publisher dropped, server is shutting down.
                    break;
                }
                let snapshot: LiveDailyReport = updates.borrow_and_update().as_ref().clone();
                if send_report(&mut sink, PushMessage::atualizacao(snapshot)).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Ping(_))) => {
                        // Axum answers pings itself; nothing to do.
                    }
                    Some(Ok(other)) => {
                        debug!(%conn_id, ?other, "mensagem de cliente ignorada");
                    }
                }
            }
        }
    }

    info!(%conn_id, "sessao websocket desconectada");
}

async fn send_report(
    sink: &mut SplitSink<WebSocket, Message>,
    message: PushMessage,
) -> Result<(), ()> {
    let json = serde_json::to_string(&message).map_err(|_| ())?;
    sink.send(Message::Text(json)).await.map_err(|_| ())
}
