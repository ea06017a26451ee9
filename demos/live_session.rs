//! Live squat analysis from the default camera
//!
//! Reads the service address from `FIXFIT_API_URL` and prints the overlay
//! whenever the displayed state changes. Build with `--features native-camera`
//! for a real camera; otherwise the demo opts into the synthetic test pattern.
//!
//! Usage: cargo run --example live_session -- [seconds]

use anyhow::Context;
use fixfit::{FeedbackOverlay, GlobalConfig, SessionBuilder, SessionEvent};
use std::time::Duration;

#[cfg(not(feature = "native-camera"))]
fn camera(builder: SessionBuilder) -> SessionBuilder {
    println!("Built without native-camera; streaming the synthetic test pattern");
    builder.backend(std::sync::Arc::new(fixfit::SyntheticBackend::new()))
}

#[cfg(feature = "native-camera")]
fn camera(builder: SessionBuilder) -> SessionBuilder {
    builder
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let seconds: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("duration must be a whole number of seconds")?,
        None => 10,
    };

    let mut config = GlobalConfig::from_env();
    config.debug_logging = true;
    let base_url = config.client.base_url.clone();

    let mut session = camera(SessionBuilder::with_config(config)).build().await?;

    if session.check_health().await {
        println!("Analysis service at {} is up", base_url);
    } else {
        println!("Analysis service at {} is not responding", base_url);
    }

    if let Some(resolution) = session.camera_resolution() {
        println!("Camera open at {}", resolution);
    }

    let mut events = session.subscribe();
    session.start()?;
    println!("{}\n", FeedbackOverlay::from(&session));

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => match event {
                Some(SessionEvent::ResponseDiscarded { seq, reason }) => {
                    println!("(discarded response #{}: {:?})\n", seq, reason);
                }
                Some(_) => println!("{}\n", session.overlay()),
                None => break,
            },
        }
    }

    session.shutdown();

    let stats = session.stats();
    let latency = session.latency();
    println!(
        "{} ticks, {} frames sent, {} skipped, {} encode failures",
        stats.ticks, stats.frames_encoded, stats.frames_skipped, stats.encode_failures
    );
    println!("{}", latency.to_json());

    Ok(())
}
