use crate::protocol;
use crate::store::SampleStore;
use crate::types::{Acknowledgment, ImuSample};
use crate::{ImuError, Result};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};
use tungstenite::{Message, WebSocket};

/// Upper bound on the opening HTTP upgrade exchange.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest slice of a rejected payload echoed into the log.
const RAW_PREVIEW_LEN: usize = 256;

/// Lifecycle of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// TCP accepted, WebSocket handshake not finished.
    Connecting,
    /// Receive loop running.
    Open,
    /// Loop finished and the socket released.
    Closed,
}

/// Receive loop for a single client.
///
/// Every text or binary frame is decoded as one sample. Good samples go to
/// the shared store and are acknowledged; bad ones are logged and dropped
/// without a reply, and the connection stays open. Peer closure ends the
/// loop quietly; any other fault ends it with an error.
pub struct ConnectionHandler {
    peer: SocketAddr,
    store: SampleStore,
    /// Reference instant for acknowledgment timestamps, shared by all
    /// connections of one server.
    epoch: Instant,
    idle_timeout: Option<Duration>,
    state: ConnectionState,
}

impl ConnectionHandler {
    pub fn new(
        peer: SocketAddr,
        store: SampleStore,
        epoch: Instant,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            peer,
            store,
            epoch,
            idle_timeout,
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Complete the handshake and process messages until the connection ends.
    ///
    /// Returns `Ok` for a peer disconnect or idle timeout, `Err` for a failed
    /// handshake or an unexpected processing fault. Every outcome is logged
    /// and leaves the handler [`ConnectionState::Closed`].
    pub fn run(&mut self, stream: TcpStream) -> Result<()> {
        let outcome = self.handshake(stream).and_then(|mut ws| {
            self.state = ConnectionState::Open;
            log::info!("Client connected: {}", self.peer);

            let outcome = self.receive_loop(&mut ws);
            if let Err(ImuError::IdleTimeout(_)) = outcome {
                let _ = ws.close(None);
                let _ = ws.flush();
            }
            outcome
        });
        self.state = ConnectionState::Closed;

        match outcome {
            Err(ImuError::ConnectionClosed) => {
                log::info!("Client disconnected: {}", self.peer);
                Ok(())
            }
            Err(ImuError::IdleTimeout(after)) => {
                log::info!("Closed idle client {} (silent for {:?})", self.peer, after);
                Ok(())
            }
            Err(e @ ImuError::Handshake(_)) => {
                log::warn!("Rejected connection from {}: {}", self.peer, e);
                Err(e)
            }
            Err(e) => {
                log::error!("Error handling client {}: {}", self.peer, e);
                Err(e)
            }
            Ok(()) => Ok(()),
        }
    }

    fn handshake(&self, stream: TcpStream) -> Result<WebSocket<TcpStream>> {
        stream.set_nodelay(true).ok();
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

        let ws = tungstenite::accept(stream)
            .map_err(|e| ImuError::Handshake(e.to_string()))?;
        ws.get_ref().set_read_timeout(self.idle_timeout)?;
        Ok(ws)
    }

    /// Runs until a non-recoverable error; peer closure arrives as
    /// [`ImuError::ConnectionClosed`].
    fn receive_loop(&mut self, ws: &mut WebSocket<TcpStream>) -> Result<()> {
        loop {
            let message = self.read_message(ws)?;

            match self.process(&message) {
                Ok(Some(ack)) => {
                    let reply = protocol::encode_ack(&ack);
                    ws.send(Message::Text(reply))?;
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    log::warn!(
                        "Dropping message from {}: {} (raw: {})",
                        self.peer,
                        e,
                        raw_preview(&message)
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn read_message(&self, ws: &mut WebSocket<TcpStream>) -> Result<Message> {
        match ws.read() {
            Ok(message) => Ok(message),
            Err(tungstenite::Error::Io(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) && self.idle_timeout.is_some() =>
            {
                Err(ImuError::IdleTimeout(self.idle_timeout.unwrap_or_default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Decode one frame and store it.
    ///
    /// Returns the acknowledgment to send, or `None` for control frames.
    pub fn process(&self, message: &Message) -> Result<Option<Acknowledgment>> {
        let sample = match message {
            Message::Text(text) => protocol::decode(text)?,
            Message::Binary(bytes) => protocol::decode_bytes(bytes)?,
            // Pings are answered by tungstenite; a Close frame is followed by
            // ConnectionClosed on the next read.
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => {
                return Ok(None)
            }
        };

        self.log_sample(&sample);
        self.store.push(sample)?;

        Ok(Some(Acknowledgment::received(
            self.epoch.elapsed().as_secs_f64(),
        )))
    }

    fn log_sample(&self, sample: &ImuSample) {
        let [gx, gy, gz] = sample.gyroscope();
        let [ax, ay, az] = sample.accelerometer();
        log::debug!(
            "Sample from {}: gyro=({:.3}, {:.3}, {:.3}) acc=({:.3}, {:.3}, {:.3})",
            self.peer,
            gx,
            gy,
            gz,
            ax,
            ay,
            az
        );
    }
}

fn raw_preview(message: &Message) -> String {
    let text = match message {
        Message::Text(text) => text.clone(),
        Message::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => format!("{:?}", other),
    };
    if text.len() <= RAW_PREVIEW_LEN {
        return text;
    }
    let mut end = RAW_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(store: &SampleStore) -> ConnectionHandler {
        ConnectionHandler::new(
            "127.0.0.1:40000".parse().unwrap(),
            store.clone(),
            Instant::now(),
            None,
        )
    }

    #[test]
    fn test_new_handler_is_connecting() {
        let store = SampleStore::spawn(10).unwrap();
        assert_eq!(handler(&store).state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_valid_text_is_stored_and_acknowledged() {
        let store = SampleStore::spawn(10).unwrap();
        let h = handler(&store);

        let msg = Message::Text(r#"{"gyro_x":1.0}"#.to_string());
        let ack = h.process(&msg).unwrap().unwrap();

        assert_eq!(ack.status, "received");
        assert!(ack.timestamp.parse::<f64>().unwrap() >= 0.0);
        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.gyro_x, 1.0);
        assert_eq!(latest.acc_z, 9.81);
    }

    #[test]
    fn test_binary_frame_is_decoded() {
        let store = SampleStore::spawn(10).unwrap();
        let msg = Message::Binary(br#"{"acc_x":2.5}"#.to_vec());
        assert!(handler(&store).process(&msg).unwrap().is_some());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_bad_messages_leave_store_untouched() {
        let store = SampleStore::spawn(10).unwrap();
        let h = handler(&store);

        let unknown = Message::Text(r#"{"gyro_x":1.0,"foo":2.0}"#.to_string());
        assert!(matches!(h.process(&unknown), Err(ImuError::Field(_))));

        let malformed = Message::Text("{\"gyro_x\": 1.0,".to_string());
        assert!(matches!(h.process(&malformed), Err(ImuError::Decode(_))));

        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_control_frames_get_no_ack() {
        let store = SampleStore::spawn(10).unwrap();
        let h = handler(&store);
        assert!(h.process(&Message::Ping(vec![1, 2])).unwrap().is_none());
        assert!(h.process(&Message::Close(None)).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_failed_handshake_ends_closed() {
        use std::io::Write;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        client.write_all(b"HELLO SERVER\r\n\r\n").unwrap();
        client.shutdown(std::net::Shutdown::Write).unwrap();

        let (stream, peer) = listener.accept().unwrap();
        let store = SampleStore::spawn(10).unwrap();
        let mut h = ConnectionHandler::new(peer, store.clone(), Instant::now(), None);

        assert!(matches!(h.run(stream), Err(ImuError::Handshake(_))));
        assert_eq!(h.state(), ConnectionState::Closed);
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_raw_preview_truncates() {
        let long = Message::Text("x".repeat(1000));
        let preview = raw_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), RAW_PREVIEW_LEN + 3);
    }
}
