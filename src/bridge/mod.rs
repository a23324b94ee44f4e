// Transport: simulator frame codec and the WebSocket server

pub mod protocol;
pub mod server;

pub use protocol::{decode, encode_control, Inbound, MANUAL_FRAME};
pub use server::{respond, Server};
