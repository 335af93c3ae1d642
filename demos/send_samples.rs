//! Stream a short burst of synthetic IMU samples to a running server and
//! print each acknowledgment.
//!
//! Usage:
//!   cargo run --example send_samples [ws://localhost:8765]

use imu_relay::{protocol, Acknowledgment, ImuSample};
use std::time::Duration;
use tungstenite::Message;

fn main() {
    env_logger::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("ws://{}:{}", protocol::DEFAULT_HOST, protocol::DEFAULT_PORT));

    let (mut ws, _) = match tungstenite::connect(url.as_str()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    println!("Connected to {}", url);

    for i in 0..20 {
        let t = i as f64 * 0.05;
        let sample = ImuSample {
            gyro_z: 0.3 * t.sin(),
            acc_x: 0.2 * t.cos(),
            ..ImuSample::default()
        };

        if let Err(e) = ws.send(Message::Text(protocol::encode(&sample))) {
            eprintln!("Send failed: {}", e);
            break;
        }

        match ws.read() {
            Ok(Message::Text(text)) => match serde_json::from_str::<Acknowledgment>(&text) {
                Ok(ack) => println!("[{:>2}] {} at {}", i, ack.status, ack.timestamp),
                Err(e) => eprintln!("Unexpected reply {:?}: {}", text, e),
            },
            Ok(other) => eprintln!("Unexpected frame: {:?}", other),
            Err(e) => {
                eprintln!("Read failed: {}", e);
                break;
            }
        }

        std::thread::sleep(Duration::from_millis(50));
    }

    let _ = ws.close(None);
}
