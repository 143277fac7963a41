//! Модуль конфигурации библиотеки voiceover
//!
//! Все значения имеют разумные значения по умолчанию и могут быть
//! переопределены переменными окружения.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, VoiceoverError};

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceoverConfig {
    /// Порт HTTP сервера
    pub port: u16,
    /// Каталог с входными видео
    pub media_dir: PathBuf,
    /// Корень для временных директорий запросов
    pub work_dir: PathBuf,
    pub espeak_bin: String,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    /// Адрес сетевого сервиса TTS
    pub tts_url: String,
    /// Видеокодек итогового файла
    pub video_codec: String,
    /// Аудиокодек итогового файла
    pub audio_codec: String,
    /// Таймаут HTTP запросов к сетевому TTS, в секундах
    pub http_timeout_secs: u64,
}

impl Default for VoiceoverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            media_dir: PathBuf::from("."),
            work_dir: std::env::temp_dir(),
            espeak_bin: "espeak-ng".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            tts_url: DEFAULT_TTS_URL.to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl VoiceoverConfig {
    /// Загрузить конфигурацию из переменных окружения процесса
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// То же, что [`from_env`](Self::from_env), но с подставляемым источником значений
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            config.port = port.trim().parse().map_err(|_| {
                VoiceoverError::Configuration(format!("PORT is not a valid port number: {}", port))
            })?;
        }
        if let Some(dir) = get("VOICEOVER_MEDIA_DIR") {
            config.media_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("VOICEOVER_WORK_DIR") {
            config.work_dir = PathBuf::from(dir);
        }
        if let Some(bin) = get("ESPEAK_BIN") {
            config.espeak_bin = bin;
        }
        if let Some(bin) = get("FFMPEG_BIN") {
            config.ffmpeg_bin = bin;
        }
        if let Some(bin) = get("FFPROBE_BIN") {
            config.ffprobe_bin = bin;
        }
        if let Some(url) = get("VOICEOVER_TTS_URL") {
            config.tts_url = url;
        }
        if let Some(codec) = get("VOICEOVER_VIDEO_CODEC") {
            config.video_codec = codec;
        }
        if let Some(codec) = get("VOICEOVER_AUDIO_CODEC") {
            config.audio_codec = codec;
        }
        if let Some(secs) = get("VOICEOVER_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = secs.trim().parse().map_err(|_| {
                VoiceoverError::Configuration(format!(
                    "VOICEOVER_HTTP_TIMEOUT_SECS must be a whole number of seconds: {}",
                    secs
                ))
            })?;
        }

        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
