//! Simulator frame codec
//!
//! The simulator speaks Socket.IO over a WebSocket. Event frames are text
//! frames starting with `42`, followed by a JSON array `["<event>", payload]`.
//! Only `telemetry` events are planned on; an event frame whose payload is
//! missing or cannot be read as telemetry asks for manual driving.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{EgoState, NeighborObservation, Path2D, PlannerError, PlannerResult};
use crate::planner::Telemetry;

const EVENT_PREFIX: &str = "42";
const TELEMETRY_EVENT: &str = "telemetry";

/// Reply to an event frame without usable telemetry
pub const MANUAL_FRAME: &str = "42[\"manual\",{}]";

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Telemetry(Telemetry),
    /// Event frame without usable data
    Manual,
    /// Not an event, or an event the planner does not handle
    Ignored,
}

/// Telemetry payload as sent by the simulator
#[derive(Debug, Deserialize)]
struct TelemetryPayload {
    x: f64,
    y: f64,
    s: f64,
    d: f64,
    /// [deg]
    yaw: f64,
    speed: f64,
    previous_path_x: Vec<f64>,
    previous_path_y: Vec<f64>,
    end_path_s: f64,
    end_path_d: f64,
    /// `[id, x, y, vx, vy, s, d]` per vehicle
    sensor_fusion: Vec<[f64; 7]>,
}

impl TryFrom<TelemetryPayload> for Telemetry {
    type Error = PlannerError;

    fn try_from(payload: TelemetryPayload) -> PlannerResult<Self> {
        if payload.previous_path_x.len() != payload.previous_path_y.len() {
            return Err(PlannerError::ProtocolError(format!(
                "previous path has {} x and {} y values",
                payload.previous_path_x.len(),
                payload.previous_path_y.len()
            )));
        }
        let ego = EgoState::new(
            payload.x,
            payload.y,
            payload.s,
            payload.d,
            payload.yaw.to_radians(),
            payload.speed,
        );
        let neighbors = payload
            .sensor_fusion
            .iter()
            .map(|[id, x, y, vx, vy, s, d]| NeighborObservation::new(*id as i64, *x, *y, *vx, *vy, *s, *d))
            .collect();
        Ok(Telemetry {
            ego,
            previous_path: Path2D::from_xy(&payload.previous_path_x, &payload.previous_path_y),
            end_path_s: payload.end_path_s,
            end_path_d: payload.end_path_d,
            neighbors,
        })
    }
}

/// Decode one text frame
pub fn decode(frame: &str) -> Inbound {
    let body = match frame.strip_prefix(EVENT_PREFIX) {
        Some(body) if !body.is_empty() => body,
        _ => return Inbound::Ignored,
    };
    match decode_event(body) {
        Ok(inbound) => inbound,
        Err(e) => {
            log::warn!("unreadable event frame, falling back to manual: {}", e);
            Inbound::Manual
        }
    }
}

fn decode_event(body: &str) -> PlannerResult<Inbound> {
    let (start, end) = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Ok(Inbound::Manual),
    };
    let message: Value = serde_json::from_str(&body[start..=end])?;
    let (event, payload) = match message.as_array().map(|a| a.as_slice()) {
        Some([Value::String(event), payload, ..]) => (event.as_str(), payload),
        Some([Value::String(_)]) => return Ok(Inbound::Manual),
        _ => {
            return Err(PlannerError::ProtocolError(
                "event frame is not [name, payload]".to_string(),
            ))
        }
    };
    if payload.is_null() {
        return Ok(Inbound::Manual);
    }
    if event != TELEMETRY_EVENT {
        return Ok(Inbound::Ignored);
    }
    let payload = TelemetryPayload::deserialize(payload)?;
    Ok(Inbound::Telemetry(Telemetry::try_from(payload)?))
}

/// Encode a path as a `control` event
pub fn encode_control(path: &Path2D) -> String {
    let body = json!({
        "next_x": path.x_coords(),
        "next_y": path.y_coords(),
    });
    format!("42[\"control\",{}]", body)
}
