//! Модуль для синтеза речи
//!
//! Два взаимозаменяемых движка: локальный (голоса, установленные в системе)
//! и сетевой (веб-сервис TTS). Выбор делается по языку запроса.

pub mod espeak;
pub mod google;
pub mod voices;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::error::SynthesisError;
use crate::models::{AudioArtifact, AudioFormat, Language, SynthesisRequest, Voice};
use crate::utils::temp::ArtifactScope;

pub use google::GoogleTts;
pub use voices::{resolve_voices, VoiceSelection};

/// Языки локального движка; все остальные уходят в сетевой
pub const LOCAL_LANGUAGES: [Language; 5] = [
    Language::En,
    Language::Es,
    Language::Fr,
    Language::De,
    Language::It,
];

/// Имя файла синтезированного аудио (без расширения)
pub const AUDIO_STEM: &str = "generated_audio";

/// Офлайн-движок на голосах, установленных в системе
#[async_trait]
pub trait LocalEngine: Send + Sync {
    /// Имя движка для логов и сообщений об ошибках
    fn name(&self) -> &str;

    /// Все голоса движка в порядке, в котором их отдает система
    async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError>;

    /// Скорость речи по умолчанию, слов в минуту
    fn default_rate(&self) -> u32;

    /// Записать `text` в WAV-файл `output`; возвращается после завершения записи
    async fn render(
        &self,
        text: &str,
        voice: &Voice,
        rate: u32,
        output: &Path,
    ) -> Result<(), SynthesisError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Network,
}

impl Backend {
    pub fn for_language(language: Language) -> Self {
        if LOCAL_LANGUAGES.contains(&language) {
            Backend::Local
        } else {
            Backend::Network
        }
    }

    pub fn format(&self) -> AudioFormat {
        match self {
            Backend::Local => AudioFormat::Wav,
            Backend::Network => AudioFormat::Mp3,
        }
    }
}

/// Результат синтеза
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub audio: AudioArtifact,
    /// Голос локального движка, `None` для сетевого
    pub voice: Option<Voice>,
    /// Предупреждение для пользователя, не прерывающее обработку
    pub warning: Option<String>,
}

/// Итоговая скорость речи: высота тона приближается масштабированием скорости
pub fn effective_rate(default_rate: u32, pitch_factor: f32) -> u32 {
    ((default_rate as f64) * (pitch_factor as f64)).round().max(1.0) as u32
}

pub struct Synthesizer {
    local: Arc<dyn LocalEngine>,
    network: GoogleTts,
}

impl Synthesizer {
    pub fn new(local: Arc<dyn LocalEngine>, network: GoogleTts) -> Self {
        Self { local, network }
    }

    pub fn local_engine(&self) -> &dyn LocalEngine {
        self.local.as_ref()
    }

    /// Синтезировать речь в файл внутри `scope`
    pub async fn synthesize(
        &self,
        request: &SynthesisRequest,
        scope: &mut ArtifactScope,
    ) -> Result<Synthesis, SynthesisError> {
        let backend = Backend::for_language(request.language);
        let path = scope.artifact_path(AUDIO_STEM, backend.format().extension());

        match backend {
            Backend::Local => self.synthesize_local(request, &path).await,
            Backend::Network => {
                info!(
                    "Language '{}' is not handled locally, using network TTS",
                    request.language
                );
                self.network
                    .synthesize(&request.text, request.language, &path)
                    .await?;
                Ok(Synthesis {
                    audio: AudioArtifact {
                        path,
                        format: AudioFormat::Mp3,
                    },
                    voice: None,
                    warning: None,
                })
            }
        }
    }

    async fn synthesize_local(
        &self,
        request: &SynthesisRequest,
        path: &Path,
    ) -> Result<Synthesis, SynthesisError> {
        let selection = resolve_voices(self.local.as_ref(), request.gender).await?;

        let (index, warning) = if selection.fallback {
            let message = format!(
                "No {} voices available. Falling back to default voice.",
                request.gender
            );
            warn!("{}", message);
            (1, Some(message))
        } else {
            (request.voice_index, None)
        };

        let voice = selection.select(index)?.clone();
        let rate = effective_rate(self.local.default_rate(), request.pitch_factor);
        info!(
            "Rendering {} characters with {} voice '{}' at rate {}",
            request.text.chars().count(),
            self.local.name(),
            voice.name,
            rate
        );

        self.local.render(&request.text, &voice, rate, path).await?;
        let duration = check_waveform(path).map_err(|e| SynthesisError::backend("local TTS", e))?;
        info!("Synthesized {:.2}s of audio to {}", duration, path.display());

        Ok(Synthesis {
            audio: AudioArtifact {
                path: path.to_path_buf(),
                format: AudioFormat::Wav,
            },
            voice: Some(voice),
            warning,
        })
    }
}

/// Проверка, что движок записал читаемый непустой WAV; возвращает длительность в секундах
pub fn check_waveform(path: &Path) -> Result<f64, String> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| format!("unreadable waveform {}: {}", path.display(), e))?;
    let spec = reader.spec();
    let frames = reader.duration();
    if frames == 0 || spec.sample_rate == 0 {
        return Err(format!("engine produced an empty waveform: {}", path.display()));
    }
    Ok(frames as f64 / spec.sample_rate as f64)
}
