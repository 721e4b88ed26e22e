use std::{net::SocketAddr, sync::Arc, time::Instant};

use {
    axum::extract::ws::{Message, WebSocket},
    futures::{SinkExt, stream::StreamExt},
    tokio::sync::mpsc,
    tracing::{debug, error, info, warn},
};

use {
    carbot_history::Exchange,
    carbot_protocol::{ExchangeFrame, InboundMessage, MAX_PAYLOAD_BYTES, OutboundFrame},
};

use crate::{
    server::GatewayServices,
    state::{ConnectedChannel, GatewayState},
};

const PROCESSING_ERROR: &str = "There was an error processing your request.";

fn encode(frame: &OutboundFrame) -> String {
    serde_json::to_string(frame).unwrap_or_default()
}

/// Handle a single WebSocket channel through its full lifecycle:
/// greeting → message loop → cleanup.
pub async fn handle_connection(
    socket: WebSocket,
    state: Arc<GatewayState>,
    services: Arc<GatewayServices>,
    remote_addr: SocketAddr,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, remote_ip = %remote_addr.ip(), "ws: new channel");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<String>();

    // Write loop: forwards serialized frames from client_tx to the socket.
    let write_conn_id = conn_id.clone();
    let write_handle = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                debug!(conn_id = %write_conn_id, "ws: write loop closed");
                break;
            }
        }
    });

    let _ = client_tx.send(encode(&OutboundFrame::greeting()));

    state
        .register_channel(ConnectedChannel {
            conn_id: conn_id.clone(),
            sender: client_tx.clone(),
            connected_at: Instant::now(),
        })
        .await;

    // One worker per channel, fed by an ordered queue. The read loop never
    // awaits resolution, so a slow dependency delays only this channel and
    // responses leave in arrival order.
    let (work_tx, mut work_rx) = mpsc::unbounded_channel::<InboundMessage>();
    let worker_conn_id = conn_id.clone();
    let worker_tx = client_tx.clone();
    let worker_services = Arc::clone(&services);
    let worker = tokio::spawn(async move {
        while let Some(inbound) = work_rx.recv().await {
            let frame = process_message(&worker_services, &worker_conn_id, inbound).await;
            if worker_tx.send(encode(&frame)).is_err() {
                // Channel gone; the result is discarded.
                break;
            }
        }
    });

    // ── Message loop ─────────────────────────────────────────────────────
    // Decode and enqueue only.

    while let Some(msg) = ws_rx.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t.to_string(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "ws: read error");
                break;
            },
        };

        if text.len() > MAX_PAYLOAD_BYTES {
            warn!(conn_id = %conn_id, size = text.len(), "ws: payload too large");
            let _ = client_tx.send(encode(&OutboundFrame::error(
                PROCESSING_ERROR,
                "payload too large",
            )));
            continue;
        }

        let inbound: InboundMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "ws: invalid frame");
                let _ = client_tx.send(encode(&OutboundFrame::error(
                    PROCESSING_ERROR,
                    "invalid frame",
                )));
                continue;
            },
        };

        if work_tx.send(inbound).is_err() {
            break;
        }
    }

    // ── Cleanup ──────────────────────────────────────────────────────────
    // Aborting the write loop makes any in-flight worker emit fail, which
    // lets the worker notice the disconnect and exit.

    state.remove_channel(&conn_id).await;
    drop(work_tx);
    drop(client_tx);
    write_handle.abort();
    drop(worker);

    info!(conn_id = %conn_id, "ws: channel closed");
}

/// Run one message through verify → resolve → persist. Always yields a
/// frame for the originating channel.
async fn process_message(
    services: &GatewayServices,
    conn_id: &str,
    inbound: InboundMessage,
) -> OutboundFrame {
    let identity = match services.verifier.verify(&inbound.token) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(conn_id = %conn_id, error = %e, "ws: credential rejected");
            return OutboundFrame::error(PROCESSING_ERROR, e.to_string());
        },
    };

    let output = services.engine.resolve(&inbound.text).await;

    // Availability over durability: a failed write is logged and the
    // resolved answer still goes out.
    let exchange = Exchange::new(&identity.user_id, &inbound.text, &output);
    if let Err(e) = services.store.record(&exchange).await {
        error!(conn_id = %conn_id, error = %e, "ws: exchange persistence failed");
    }

    OutboundFrame::Exchange(ExchangeFrame {
        id: exchange.id,
        input_text: exchange.input_text,
        output_text: exchange.output_text,
        created_at: exchange.created_at,
    })
}
