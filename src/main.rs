use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use voiceover::server::create_router;
use voiceover::utils::{ffmpeg::check_command_in_path, logger::init_logger};
use voiceover::{Pipeline, VoiceoverConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let config = VoiceoverConfig::from_env().context("Failed to load configuration")?;
    info!("Starting voiceover v{}", env!("CARGO_PKG_VERSION"));
    check_tools(&config);

    let port = config.port;
    let pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;
    match pipeline.videos() {
        Ok(videos) if videos.is_empty() => {
            warn!("No video files found in {}", pipeline.config().media_dir.display())
        }
        Ok(videos) => info!("{} video file(s) available", videos.len()),
        Err(e) => warn!("Cannot list media directory: {}", e),
    }

    let app = create_router(Arc::new(pipeline));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Missing tools are not fatal at startup; requests that need them will fail.
fn check_tools(config: &VoiceoverConfig) {
    for tool in [&config.espeak_bin, &config.ffmpeg_bin, &config.ffprobe_bin] {
        match check_command_in_path(tool) {
            Ok(path) => info!("Found {} at {}", tool, path.display()),
            Err(_) => warn!("{} not found in PATH", tool),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
