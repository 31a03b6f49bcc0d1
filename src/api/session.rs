//! Per-connection session loop
//!
//! Each socket gets three tasks: a reader that queues inbound text frames,
//! a worker that hands them to the relay one at a time, and a writer that
//! forwards replies. Closing the socket cancels whatever the worker is
//! waiting on.

use crate::relay::{Delivery, Reply, SessionRelay};
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Inbound frames buffered while a message is being processed
const INBOUND_QUEUE: usize = 32;
const REPLY_QUEUE: usize = 8;

pub async fn handle_socket(socket: WebSocket, relay: Arc<SessionRelay>) {
    let session_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("session", id = %session_id);

    async move {
        tracing::info!("Session opened");

        let (mut sink, mut stream) = socket.split();
        let cancel = CancellationToken::new();
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(INBOUND_QUEUE);
        let (reply_tx, mut reply_rx) = mpsc::channel::<Reply>(REPLY_QUEUE);

        let writer_cancel = cancel.clone();
        let writer = tokio::spawn(
            async move {
                while let Some(reply) = reply_rx.recv().await {
                    if let Err(e) = sink.send(Message::Text(reply.into_text())).await {
                        tracing::debug!(error = %e, "Write failed, closing session");
                        writer_cancel.cancel();
                        break;
                    }
                }
                let _ = sink.close().await;
            }
            .in_current_span(),
        );

        let reader_cancel = cancel.clone();
        let reader = tokio::spawn(
            async move {
                while let Some(frame) = stream.next().await {
                    let text = match frame {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
                        Ok(Message::Ping(_) | Message::Pong(_)) => continue,
                        Ok(Message::Close(_)) => break,
                        Err(e) => {
                            tracing::debug!(error = %e, "Read failed");
                            break;
                        }
                    };
                    if inbound_tx.send(text).await.is_err() {
                        break;
                    }
                }
                reader_cancel.cancel();
            }
            .in_current_span(),
        );

        run_session(&relay, inbound_rx, &reply_tx, &cancel).await;

        drop(reply_tx);
        cancel.cancel();
        reader.abort();
        let _ = writer.await;
        tracing::info!("Session closed");
    }
    .instrument(span)
    .await;
}

/// Process inbound messages strictly in arrival order until the inbound
/// side ends or the connection goes away.
pub async fn run_session(
    relay: &SessionRelay,
    mut inbound: mpsc::Receiver<String>,
    replies: &mpsc::Sender<Reply>,
    cancel: &CancellationToken,
) {
    loop {
        let raw = tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            next = inbound.recv() => match next {
                Some(raw) => raw,
                None => break,
            },
        };

        if relay.handle_message(&raw, replies, cancel).await == Delivery::Abandoned {
            break;
        }
    }
}
