//! Demo uplink: streams a synthetic test pattern and the game-state cycle to
//! the configured server and logs the overlay status line.
//!
//! Usage: `framecast [config.yaml]`

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::{info, warn};

use framecast::{
    CaptureSources, FrameSample, FrameSource, Framecast, GameStateSequencer, TriggerMode,
    UplinkConfig,
};

/// Scrolling colour bars standing in for the headset camera
struct TestPattern {
    width: u32,
    height: u32,
    started: Instant,
}

impl TestPattern {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, started: Instant::now() }
    }
}

impl FrameSource for TestPattern {
    fn frame_dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn read_frame(&mut self, sample: &mut FrameSample) -> framecast::Result<()> {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let offset = (elapsed_ms / 10) as u32;
        let width = sample.width.max(1);

        for (i, pixel) in sample.pixels.chunks_exact_mut(3).enumerate() {
            let x = (i as u32 % width + offset) % width;
            let y = i as u32 / width;
            let bar = x * 8 / width;
            pixel[0] = if bar & 1 != 0 { 255 } else { 0 };
            pixel[1] = if bar & 2 != 0 { 255 } else { 0 };
            pixel[2] = if bar & 4 != 0 { 255 } else { (y % 256) as u8 };
        }
        sample.timestamp_ms = elapsed_ms;
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => UplinkConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => UplinkConfig::default(),
    };
    let (host, port) = (config.server.host.clone(), config.server.port);
    let mode = config.capture.mode;
    let cooldown = config.trigger_cooldown();

    info!("Framecast starting");
    info!("  Server: {}", config.frame_url());
    info!("  Mode: {:?}", mode);
    info!("  JPEG quality: {}", config.capture.jpeg_quality);

    let sources = CaptureSources::new()
        .with_frames(TestPattern::new(640, 480))
        .with_game_state(GameStateSequencer::default());
    let connection = Framecast::start(config, sources).context("Failed to start uplink")?;

    // Log every status change as overlay text
    let mut updates = connection.status_updates();
    tokio::spawn(async move {
        while let Some(status) = updates.next().await {
            info!("{}", status.overlay_text(&host, port));
        }
    });

    // In discrete mode, stand in for the host's trigger events
    let mut triggers = tokio::time::interval(cooldown.max(Duration::from_millis(100)));
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for ctrl-c: {}", e);
                }
                break;
            }
            _ = triggers.tick(), if mode == TriggerMode::Discrete => {
                connection.trigger();
            }
        }
    }

    info!("Shutting down ({})", connection.status().message);
    connection.shutdown();
    Ok(())
}
