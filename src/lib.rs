//! # imu-relay - WebSocket ingest for streaming IMU samples
//!
//! Clients push JSON samples (gyroscope + accelerometer) over a WebSocket.
//! The server:
//! - decodes and validates each message (unknown keys rejected, missing keys defaulted)
//! - keeps the last 100 samples from all clients in one shared FIFO buffer
//! - answers every accepted sample with `{"status":"received","timestamp":"..."}`
//! - drops malformed messages silently, keeping the connection open
//!
//! ## Quick Start
//! ```no_run
//! use imu_relay::{Server, ServerConfig};
//!
//! let server = Server::bind(ServerConfig::default()).unwrap();
//! let store = server.store();
//! std::thread::spawn(move || server.serve());
//!
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! println!("retained: {}", store.len().unwrap());
//! ```

pub mod error;
pub mod types;
pub mod protocol;
pub mod buffer;
pub mod store;
pub mod config;
pub mod handler;
pub mod server;

pub use error::ImuError;
pub use types::*;
pub use buffer::RetentionBuffer;
pub use config::ServerConfig;
pub use handler::{ConnectionHandler, ConnectionState};
pub use server::{serve, Server};
pub use store::SampleStore;

/// Result type alias for imu-relay operations.
pub type Result<T> = std::result::Result<T, ImuError>;
