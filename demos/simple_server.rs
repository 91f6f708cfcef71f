//! Simple MJPEG streaming server example
//!
//!   cargo run --example simple_server                    # binds to 0.0.0.0:8080
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:8080
//!   cargo run --example simple_server 127.0.0.1:8081     # binds to 127.0.0.1:8081
//!
//! The server feeds viewers from a synthetic source that emits small text
//! payloads instead of JPEG images, so everything can be exercised without
//! camera hardware:
//!
//!   Browser: http://localhost:8080/        (stream page + settings form)
//!   curl:    curl -s http://localhost:8080/stream | head -c 400
//!   Settings: curl -d 'fps=5&width=640' http://localhost:8080/settings
//!
//! Swap in your own [`VideoSource`] implementation to stream real video.

use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use mjpeg_rs::{MjpegServer, PipelineConfig, ServerConfig, SyntheticSource};

/// Turn the address argument into a `SocketAddr`.
///
/// A bare IP gets the default port appended, and "localhost" is shorthand
/// for 127.0.0.1, with or without a port.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let target = arg.replace("localhost", "127.0.0.1");

    target
        .parse::<SocketAddr>()
        .or_else(|_| {
            target
                .parse::<IpAddr>()
                .map(|ip| SocketAddr::new(ip, DEFAULT_PORT))
        })
        .map_err(|_| {
            format!(
                "invalid bind address '{}' (expected IP, IP:PORT, or 'localhost')",
                arg
            )
        })
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("  BIND_ADDR  IP, IP:PORT, or 'localhost' (default 0.0.0.0:8080)");
    eprintln!();
    eprintln!("  e.g.  simple_server localhost:8081");
    eprintln!("        simple_server 0.0.0.0:9000");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let arg = std::env::args().nth(1);

    if matches!(arg.as_deref(), Some("-h" | "--help")) {
        print_usage();
        return Ok(());
    }

    let bind_addr = match arg.as_deref() {
        Some(raw) => match parse_bind_addr(raw) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => ServerConfig::default().bind_addr,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mjpeg_rs=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::with_addr(bind_addr);

    println!("Starting MJPEG server on {}", config.bind_addr);
    println!();
    println!("=== Watch ===");
    println!("Browser: http://localhost:{}/", config.bind_addr.port());
    println!(
        "curl:    curl -s http://localhost:{}/stream | head -c 400",
        config.bind_addr.port()
    );
    println!();
    println!("=== Change settings ===");
    println!(
        "curl -d 'fps=5&width=640' http://localhost:{}/settings",
        config.bind_addr.port()
    );
    println!();
    println!("Frames are synthetic text payloads; wire a real capture source for video.");
    println!();

    // Stand-in for a camera/encoder backend
    let source = SyntheticSource::new(|index, config| {
        Bytes::from(format!(
            "synthetic frame {} ({}x{} q{} @{}fps)\n",
            index, config.width, config.height, config.quality, config.fps
        ))
    });

    let server = MjpegServer::new(config, PipelineConfig::default(), source);

    // Run until Ctrl+C, then stop the pipeline before exiting
    server
        .run_until(async {
            tokio::signal::ctrl_c().await.ok();
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
