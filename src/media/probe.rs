//! Открытие медиафайлов и чтение длительности через ffprobe

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::CompositionError;
use crate::utils::ffmpeg::run_ffprobe_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn stream_type(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Разбор вывода `ffprobe -of json`: нужен поток вида `kind` и положительная длительность
pub fn parse_probe_output(json: &str, kind: MediaKind) -> Result<f64, CompositionError> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| CompositionError(format!("Failed to parse ffprobe output: {}", e)))?;

    let has_stream = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some(kind.stream_type()));
    if !has_stream {
        return Err(CompositionError(format!(
            "No {} stream found",
            kind.stream_type()
        )));
    }

    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| CompositionError("Media duration is unknown".to_string()))?;
    let duration = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CompositionError(format!("Failed to parse media duration: {}", raw)))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(CompositionError(format!("Invalid media duration: {}", raw)));
    }
    Ok(duration)
}

/// Открытый входной файл; дескриптор держится до освобождения клипа
#[derive(Debug)]
pub struct MediaClip {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub duration: f64,
    _handle: File,
}

impl MediaClip {
    pub async fn open(path: &Path, kind: MediaKind, ffprobe: &str) -> Result<Self, CompositionError> {
        let handle = tokio::fs::File::open(path)
            .await
            .map_err(|e| {
                CompositionError(format!(
                    "Cannot open {} file {}: {}",
                    kind.stream_type(),
                    path.display(),
                    e
                ))
            })?
            .into_std()
            .await;

        let path_arg = path.to_string_lossy().to_string();
        let json = run_ffprobe_command(
            ffprobe,
            &[
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=codec_type",
                "-of",
                "json",
                &path_arg,
            ],
        )
        .await?;
        let duration = parse_probe_output(&json, kind)
            .map_err(|e| CompositionError(format!("{}: {}", path.display(), e.0)))?;

        debug!("Opened {} {} ({:.3}s)", kind.stream_type(), path.display(), duration);
        Ok(Self {
            path: path.to_path_buf(),
            kind,
            duration,
            _handle: handle,
        })
    }
}

impl Drop for MediaClip {
    fn drop(&mut self) {
        debug!("Released {} {}", self.kind.stream_type(), self.path.display());
    }
}
