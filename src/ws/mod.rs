/*!
 * Notification channel (STOMP over WebSocket)
 *
 * Responsibility:
 * - frame codec, per-connection session, handshake gate, frame dispatch
 * - broker registry fanning SEND out to subscribers as MESSAGE
 * - the axum upgrade handler mounted at /ws (origin check included)
 *
 * Public API:
 * - HandshakeGate / HandshakeError
 * - ChannelSession / Broker / ChannelOrigins
 * - Frame / Command
 * - process_message / process_frame / ws_handler
 */

pub mod broker;
pub mod dispatch;
pub mod frame;
pub mod handler;
pub mod handshake;
pub mod origin;
pub mod session;

pub use broker::{Broker, ClientConnection, OUTBOX_CAPACITY};
pub use dispatch::{Step, process_frame, process_message};
pub use frame::{Command, Frame, FrameError};
pub use handler::ws_handler;
pub use handshake::{AUTHORIZATION_HEADER, HandshakeError, HandshakeGate};
pub use origin::ChannelOrigins;
pub use session::ChannelSession;
