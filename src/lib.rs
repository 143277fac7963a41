//! Основной файл библиотеки voiceover
//!
//! Озвучивание видео: текст синтезируется в речь (локальный espeak-ng или
//! сетевой TTS), после чего речь накладывается на выбранное видео через
//! ffmpeg. Видео обрезается до длительности более короткого из файлов.

pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod tts;
pub mod utils;

pub use config::VoiceoverConfig;
pub use error::{CompositionError, Result, SynthesisError, VoiceoverError};
pub use models::{
    AudioArtifact, AudioFormat, CompositeResult, Deliverable, Gender, Language, PipelineOutput,
    PipelineParams, SynthesisRequest, VideoArtifact, Voice,
};
pub use pipeline::{Pipeline, PipelineStage, StageObserver};

/// Публичный API для удобного использования: конфигурация из окружения, один запуск
pub async fn generate_voiceover(params: PipelineParams) -> Result<PipelineOutput> {
    let config = VoiceoverConfig::from_env()?;
    let pipeline = Pipeline::new(config)?;
    pipeline.run(params).await
}
