//! imu-relay server binary.
//!
//! Usage:
//!   cargo run --release
//!   IMU_SERVER_HOST=0.0.0.0 IMU_SERVER_PORT=9000 cargo run --release
//!
//! Set `RUST_LOG=debug` to log every received sample.

use imu_relay::{Server, ServerConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Starting IMU server on ws://{}", config.addr());

    let server = match Server::bind(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.serve() {
        eprintln!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
