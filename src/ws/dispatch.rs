//! Per-frame processing for one channel: handshake first, then the bound
//! identity drives every later frame.

use tracing::{debug, warn};

use crate::ws::broker::{APPLICATION_PREFIX, Broker, is_broker_destination};
use crate::ws::frame::{Command, Frame};
use crate::ws::handshake::HandshakeGate;
use crate::ws::session::ChannelSession;

pub const STOMP_VERSION: &str = "1.2";

/// Frames to send back, and whether to close the socket afterwards.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Step {
    pub replies: Vec<Frame>,
    pub close: bool,
}

impl Step {
    fn reply(frame: Option<Frame>) -> Self {
        Self {
            replies: frame.into_iter().collect(),
            close: false,
        }
    }

    fn close_with(frame: Frame) -> Self {
        Self {
            replies: vec![frame],
            close: true,
        }
    }
}

fn connected(session: &ChannelSession) -> Frame {
    let frame = Frame::new(Command::Connected)
        .with_header("version", STOMP_VERSION)
        .with_header("heart-beat", "0,0")
        .with_header("session", session.id().to_string());

    match session.identity() {
        Some(identity) => frame.with_header("user-name", identity.subject.clone()),
        None => frame,
    }
}

/// Runs every frame packed into one WebSocket message, in order, stopping at
/// the first one that closes the channel. A blank message is a heart-beat.
pub fn process_message(
    gate: &HandshakeGate,
    broker: &Broker,
    session: &ChannelSession,
    text: &str,
) -> Step {
    let mut out = Step::default();
    let mut rest = text;

    while !rest.trim_start_matches(['\r', '\n']).is_empty() {
        let step = match Frame::parse_prefix(rest) {
            Ok((frame, tail)) => {
                rest = tail;
                process_frame(gate, broker, session, frame)
            }
            Err(e) => Step::close_with(Frame::error(e.to_string())),
        };

        out.replies.extend(step.replies);
        if step.close {
            out.close = true;
            break;
        }
    }

    out
}

pub fn process_frame(
    gate: &HandshakeGate,
    broker: &Broker,
    session: &ChannelSession,
    frame: Frame,
) -> Step {
    if let Err(err) = gate.inspect(&frame, session) {
        return Step::close_with(Frame::error(err.to_string()));
    }

    if frame.command.is_connect() {
        if let Some(identity) = session.identity() {
            broker.register(session.id(), &identity.subject, session.outbox());
        }
        return Step::reply(Some(connected(session)));
    }

    // Nothing reaches the application before the handshake succeeded.
    let (Some(identity), Some(conn)) = (session.identity(), broker.get(session.id())) else {
        warn!(session = %session.id(), command = %frame.command, "frame before handshake");
        return Step::close_with(Frame::error("Handshake required"));
    };

    match &frame.command {
        Command::Subscribe => {
            let (Some(id), Some(destination)) = (frame.header("id"), frame.header("destination"))
            else {
                return Step::close_with(Frame::error("SUBSCRIBE requires id and destination"));
            };
            if !conn.subscribe(id, destination) {
                return Step::close_with(Frame::error(format!("Duplicate subscription id {id}")));
            }
            debug!(session = %session.id(), subject = %identity.subject, destination, "subscribed");
            Step::reply(frame.receipt())
        }
        Command::Unsubscribe => {
            let Some(id) = frame.header("id") else {
                return Step::close_with(Frame::error("UNSUBSCRIBE requires id"));
            };
            if conn.unsubscribe(id).is_none() {
                debug!(session = %session.id(), id, "unsubscribe for unknown id");
            }
            Step::reply(frame.receipt())
        }
        Command::Send => {
            let Some(destination) = frame.header("destination") else {
                return Step::close_with(Frame::error("SEND requires destination"));
            };

            if is_broker_destination(destination) {
                let delivered = broker.publish(destination, &frame);
                debug!(
                    session = %session.id(),
                    subject = %identity.subject,
                    destination,
                    delivered,
                    "message published"
                );
            } else {
                // no in-process handlers are mounted under /app
                debug!(
                    session = %session.id(),
                    subject = %identity.subject,
                    destination,
                    application = destination.starts_with(APPLICATION_PREFIX),
                    bytes = frame.body.len(),
                    "message not routed"
                );
            }
            Step::reply(frame.receipt())
        }
        Command::Disconnect => Step {
            replies: frame.receipt().into_iter().collect(),
            close: true,
        },
        other => Step::close_with(Frame::error(format!("Unsupported command {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::services::auth::{TokenCodec, UserRole};
    use crate::ws::handshake::AUTHORIZATION_HEADER;

    const SECRET: &[u8] = b"test-secret-key-for-signing-tokens-0123";

    struct Fixture {
        gate: HandshakeGate,
        broker: Broker,
        tokens: Arc<TokenCodec>,
    }

    impl Fixture {
        fn new() -> Self {
            let tokens = Arc::new(TokenCodec::new(SECRET, 3600).unwrap());
            Self {
                gate: HandshakeGate::new(tokens.clone()),
                broker: Broker::new(),
                tokens,
            }
        }

        fn connect_frame(&self, subject: &str) -> Frame {
            let token = self.tokens.issue(subject, UserRole::Student).unwrap();
            Frame::new(Command::Connect).with_header(AUTHORIZATION_HEADER, format!("Bearer {token}"))
        }

        fn process(&self, session: &ChannelSession, frame: Frame) -> Step {
            process_frame(&self.gate, &self.broker, session, frame)
        }

        fn open(&self, subject: &str) -> (ChannelSession, mpsc::Receiver<Frame>) {
            let (tx, rx) = mpsc::channel(8);
            let session = ChannelSession::new(tx);
            let step = self.process(&session, self.connect_frame(subject));
            assert!(!step.close);
            (session, rx)
        }

        fn subscription_count(&self, session: &ChannelSession) -> usize {
            self.broker
                .get(session.id())
                .map_or(0, |conn| conn.subscription_count())
        }
    }

    fn parse(text: &str) -> Frame {
        Frame::parse(text).unwrap()
    }

    fn unopened() -> ChannelSession {
        let (tx, _) = mpsc::channel(1);
        ChannelSession::new(tx)
    }

    #[test]
    fn connect_is_acknowledged_with_user_name() {
        let f = Fixture::new();
        let session = unopened();

        let step = f.process(&session, f.connect_frame("ada@campus.edu"));

        assert!(!step.close);
        let reply = &step.replies[0];
        assert_eq!(reply.command, Command::Connected);
        assert_eq!(reply.header("version"), Some(STOMP_VERSION));
        assert_eq!(reply.header("user-name"), Some("ada@campus.edu"));
        assert!(f.broker.get(session.id()).is_some());
    }

    #[test]
    fn rejected_handshake_closes_with_error() {
        let f = Fixture::new();
        let session = unopened();

        let step = f.process(&session, Frame::new(Command::Connect));

        assert!(step.close);
        assert_eq!(step.replies[0].command, Command::Error);
        assert_eq!(
            step.replies[0].header("message"),
            Some("Missing Authorization header")
        );
        assert_eq!(f.broker.count(), 0);
    }

    #[test]
    fn frames_before_handshake_never_reach_dispatch() {
        let f = Fixture::new();
        let session = unopened();

        let step = f.process(
            &session,
            parse("SUBSCRIBE\nid:0\ndestination:/user/queue/notifications\n\n\0"),
        );

        assert!(step.close);
        assert_eq!(step.replies[0].command, Command::Error);
        assert_eq!(f.subscription_count(&session), 0);
    }

    #[test]
    fn established_channel_reuses_identity_for_later_frames() {
        let f = Fixture::new();
        let (session, _rx) = f.open("ada@campus.edu");

        let step = f.process(
            &session,
            parse("SUBSCRIBE\nid:sub-0\ndestination:/user/queue/notifications\nreceipt:r1\n\n\0"),
        );
        assert_eq!(
            step,
            Step::reply(Some(Frame::new(Command::Receipt).with_header("receipt-id", "r1")))
        );
        let conn = f.broker.get(session.id()).unwrap();
        assert_eq!(conn.destination("sub-0").as_deref(), Some("/user/queue/notifications"));

        let step = f.process(&session, parse("SEND\ndestination:/app/chat\n\nhi\0"));
        assert_eq!(step, Step::default());

        let step = f.process(&session, parse("UNSUBSCRIBE\nid:sub-0\n\n\0"));
        assert!(!step.close);
        assert_eq!(f.subscription_count(&session), 0);
    }

    #[test]
    fn duplicate_subscription_id_is_a_protocol_error() {
        let f = Fixture::new();
        let (session, _rx) = f.open("ada@campus.edu");
        let subscribe = "SUBSCRIBE\nid:0\ndestination:/topic/a\n\n\0";

        assert!(!f.process(&session, parse(subscribe)).close);
        assert!(f.process(&session, parse(subscribe)).close);
    }

    #[test]
    fn disconnect_closes_after_receipt() {
        let f = Fixture::new();
        let (session, _rx) = f.open("ada@campus.edu");

        let step = f.process(&session, parse("DISCONNECT\nreceipt:bye\n\n\0"));

        assert!(step.close);
        assert_eq!(step.replies[0].header("receipt-id"), Some("bye"));
    }

    #[test]
    fn server_side_commands_from_client_are_refused() {
        let f = Fixture::new();
        let (session, _rx) = f.open("ada@campus.edu");

        let step = f.process(&session, parse("MESSAGE\n\n\0"));
        assert!(step.close);
        assert_eq!(step.replies[0].command, Command::Error);
    }

    #[tokio::test]
    async fn send_is_delivered_to_other_subscribers() {
        let f = Fixture::new();
        let (alice, mut alice_rx) = f.open("a@campus.edu");
        let (bob, mut bob_rx) = f.open("b@campus.edu");

        f.process(&alice, parse("SUBSCRIBE\nid:0\ndestination:/topic/project/1\n\n\0"));
        let step = f.process(
            &bob,
            parse("SEND\ndestination:/topic/project/1\ncontent-type:application/json\nreceipt:s1\n\n{\"type\":\"TASK_UPDATED\"}\0"),
        );
        assert_eq!(step.replies[0].header("receipt-id"), Some("s1"));

        let message = alice_rx.recv().await.unwrap();
        assert_eq!(message.command, Command::Message);
        assert_eq!(message.header("subscription"), Some("0"));
        assert_eq!(message.header("destination"), Some("/topic/project/1"));
        assert!(message.header("message-id").is_some());
        assert_eq!(message.body, "{\"type\":\"TASK_UPDATED\"}");
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn application_destinations_are_not_fanned_out() {
        let f = Fixture::new();
        let (alice, mut alice_rx) = f.open("a@campus.edu");

        f.process(&alice, parse("SUBSCRIBE\nid:0\ndestination:/app/chat\n\n\0"));
        let step = f.process(&alice, parse("SEND\ndestination:/app/chat\n\nhi\0"));

        assert!(!step.close);
        assert!(alice_rx.try_recv().is_err());
    }

    #[test]
    fn send_before_handshake_publishes_nothing() {
        let f = Fixture::new();
        let (alice, mut alice_rx) = f.open("a@campus.edu");
        f.process(&alice, parse("SUBSCRIBE\nid:0\ndestination:/topic/t\n\n\0"));

        let stranger = unopened();
        let step = f.process(&stranger, parse("SEND\ndestination:/topic/t\n\nspoof\0"));

        assert!(step.close);
        assert!(alice_rx.try_recv().is_err());
    }

    #[test]
    fn batched_frames_are_all_processed() {
        let f = Fixture::new();
        let session = unopened();
        let token = f.tokens.issue("ada@campus.edu", UserRole::Student).unwrap();
        let wire = format!(
            "CONNECT\nAuthorization:Bearer {token}\n\n\0SUBSCRIBE\nid:0\ndestination:/topic/project/1\nreceipt:r1\n\n\0"
        );

        let step = process_message(&f.gate, &f.broker, &session, &wire);

        assert!(!step.close);
        assert_eq!(step.replies.len(), 2);
        assert_eq!(step.replies[0].command, Command::Connected);
        assert_eq!(step.replies[1].header("receipt-id"), Some("r1"));
        assert_eq!(f.subscription_count(&session), 1);
    }

    #[test]
    fn batch_stops_at_the_first_closing_frame() {
        let f = Fixture::new();
        let session = unopened();

        let step = process_message(
            &f.gate,
            &f.broker,
            &session,
            "CONNECT\n\n\0SUBSCRIBE\nid:0\ndestination:/topic/t\nreceipt:r1\n\n\0",
        );

        assert!(step.close);
        assert_eq!(step.replies.len(), 1);
        assert_eq!(step.replies[0].command, Command::Error);
    }

    #[test]
    fn heart_beat_message_produces_nothing() {
        let f = Fixture::new();
        let (session, _rx) = f.open("ada@campus.edu");

        assert_eq!(process_message(&f.gate, &f.broker, &session, "\n"), Step::default());
        assert_eq!(process_message(&f.gate, &f.broker, &session, "\r\n\r\n"), Step::default());
    }
}
