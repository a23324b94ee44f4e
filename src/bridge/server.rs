//! WebSocket endpoint for the driving simulator
//!
//! Every connection gets its own task and its own `SessionState`; the
//! planner and its map are shared read-only.

use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;

use super::protocol::{decode, encode_control, Inbound, MANUAL_FRAME};
use crate::mission_planning::SessionState;
use crate::planner::HighwayPlanner;

pub struct Server;

impl Server {
    pub async fn run(planner: Arc<HighwayPlanner>, host: &str, port: u16) -> Result<(), std::io::Error> {
        let state = web::Data::from(planner);
        log::info!("listening on {}:{}", host, port);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .app_data(state.clone())
                .default_service(web::to(connect))
        })
        .workers(1)
        .bind((host, port))?
        .run()
        .await
    }
}

async fn connect(planner: web::Data<HighwayPlanner>, body: web::Payload, req: HttpRequest) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, socket, stream)) => {
            actix_web::rt::spawn(bridge(planner.into_inner(), socket, stream));
            response
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// Serve one vehicle until it disconnects
async fn bridge(planner: Arc<HighwayPlanner>, mut socket: actix_ws::Session, mut stream: actix_ws::MessageStream) {
    use futures::StreamExt;
    let mut session = planner.new_session();
    log::info!("vehicle connected ({})", session);
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(actix_ws::Message::Text(text)) => {
                if let Some(reply) = respond(&planner, &mut session, &text) {
                    if socket.text(reply).await.is_err() {
                        break;
                    }
                }
            }
            Ok(actix_ws::Message::Ping(bytes)) => {
                if socket.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Ok(actix_ws::Message::Close(reason)) => {
                log::info!("vehicle disconnected after {} cycles ({})", session.cycles, session);
                let _ = socket.close(reason).await;
                return;
            }
            Ok(_) => continue,
            Err(e) => {
                log::warn!("websocket error: {}", e);
                break;
            }
        }
    }
    log::info!("vehicle connection lost after {} cycles ({})", session.cycles, session);
    let _ = socket.close(None).await;
}

/// Reply to one inbound frame, if any reply is due
pub fn respond(planner: &HighwayPlanner, session: &mut SessionState, frame: &str) -> Option<String> {
    match decode(frame) {
        Inbound::Telemetry(telemetry) => match planner.plan_cycle(session, &telemetry) {
            Ok(outcome) => Some(encode_control(&outcome.path)),
            Err(e) => {
                log::warn!("cycle {} skipped: {}", session.cycles, e);
                None
            }
        },
        Inbound::Manual => Some(MANUAL_FRAME.to_string()),
        Inbound::Ignored => None,
    }
}
