//! Actor for one admin dashboard connection
//!
//! The session registers an unbounded sender with the [`ConnectionManager`]
//! and drains the matching receiver as an actor stream, so broadcasts issued
//! from request handlers end up as text frames on this socket.

use super::{ConnectionManager, WebSocketMessage};
use crate::metrics;
use actix::prelude::*;
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(45);

pub struct AdminSession {
    admin_id: Uuid,
    manager: ConnectionManager,
    connection_id: Option<Uuid>,
    last_heartbeat: Instant,
}

impl AdminSession {
    pub fn new(admin_id: Uuid, manager: ConnectionManager) -> Self {
        Self {
            admin_id,
            manager,
            connection_id: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_frame(ctx: &mut ws::WebsocketContext<Self>, message: &WebSocketMessage) {
        match message.to_json() {
            Ok(json) => ctx.text(json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize websocket frame"),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                tracing::debug!(admin_id = %act.admin_id, "websocket heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for AdminSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(admin_id = %self.admin_id, "admin websocket session started");
        self.start_heartbeat(ctx);

        let (tx, rx) = mpsc::unbounded_channel::<WebSocketMessage>();
        ctx.add_stream(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        }));

        let manager = self.manager.clone();
        let admin_id = self.admin_id;
        ctx.wait(
            async move {
                let id = manager.subscribe(admin_id, tx).await;
                metrics::set_websocket_connections(manager.total_connections().await);
                id
            }
            .into_actor(self)
            .map(|connection_id, act, ctx| {
                act.connection_id = Some(connection_id);
                Self::send_frame(ctx, &WebSocketMessage::connected(connection_id));
            }),
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!(admin_id = %self.admin_id, "admin websocket session stopped");

        if let Some(connection_id) = self.connection_id.take() {
            let manager = self.manager.clone();
            let admin_id = self.admin_id;
            actix_rt::spawn(async move {
                manager.unsubscribe(admin_id, connection_id).await;
                metrics::set_websocket_connections(manager.total_connections().await);
            });
        }
    }
}

/// Frames queued by the connection manager
impl StreamHandler<WebSocketMessage> for AdminSession {
    fn handle(&mut self, msg: WebSocketMessage, ctx: &mut Self::Context) {
        Self::send_frame(ctx, &msg);
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // Sender dropped by the manager: nothing left to forward
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for AdminSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(bytes)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&bytes);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match WebSocketMessage::from_json(&text) {
                    Ok(WebSocketMessage::Ping { timestamp }) => {
                        Self::send_frame(ctx, &WebSocketMessage::pong(timestamp));
                    }
                    Ok(WebSocketMessage::Pong { .. }) => {}
                    Ok(_) | Err(_) => {
                        Self::send_frame(
                            ctx,
                            &WebSocketMessage::error(
                                "UNSUPPORTED_FRAME",
                                "Admin sessions only accept Ping and Pong frames",
                            ),
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::debug!(admin_id = %self.admin_id, "ignoring binary frame");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                tracing::warn!(admin_id = %self.admin_id, error = %e, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}
