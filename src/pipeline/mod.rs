//! Конвейер обработки запроса
//!
//! Проверка ввода → синтез речи → наложение на видео → выдача файлов →
//! очистка. Очистка выполняется всегда, при любом исходе.

pub mod stage;

use std::path::PathBuf;
use std::sync::Arc;

use log::info;

use crate::config::VoiceoverConfig;
use crate::error::{Result, VoiceoverError};
use crate::media::compositor::VIDEO_STEM;
use crate::media::{self, Compositor, FfmpegCompositor};
use crate::models::{
    CompositeResult, Deliverable, Gender, PipelineOutput, PipelineParams, SynthesisRequest,
};
use crate::tts::espeak::EspeakEngine;
use crate::tts::{resolve_voices, GoogleTts, Synthesis, Synthesizer, VoiceSelection, AUDIO_STEM};
use crate::utils::temp::ArtifactScope;

pub use stage::{LogStageObserver, PipelineStage, StageObserver};

pub const MIN_PITCH: f32 = 0.5;
pub const MAX_PITCH: f32 = 2.0;

/// Основная структура для работы с библиотекой
pub struct Pipeline {
    config: VoiceoverConfig,
    synthesizer: Synthesizer,
    compositor: Arc<dyn Compositor>,
    observer: Arc<dyn StageObserver>,
}

impl Pipeline {
    /// espeak-ng локально, Google Translate TTS по сети, ffmpeg для сборки видео
    pub fn new(config: VoiceoverConfig) -> Result<Self> {
        let local = Arc::new(EspeakEngine::new(config.espeak_bin.clone()));
        let network = GoogleTts::new(config.tts_url.clone(), config.http_timeout())?;
        let compositor = Arc::new(FfmpegCompositor::new(&config));
        Ok(Self::with_components(
            config,
            Synthesizer::new(local, network),
            compositor,
        ))
    }

    pub fn with_components(
        config: VoiceoverConfig,
        synthesizer: Synthesizer,
        compositor: Arc<dyn Compositor>,
    ) -> Self {
        Self {
            config,
            synthesizer,
            compositor,
            observer: Arc::new(LogStageObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &VoiceoverConfig {
        &self.config
    }

    /// Видео, доступные в медиа-каталоге
    pub fn videos(&self) -> Result<Vec<String>> {
        media::list_videos(&self.config.media_dir)
    }

    /// Актуальный список локальных голосов для `gender`
    pub async fn voices(&self, gender: Gender) -> Result<VoiceSelection> {
        Ok(resolve_voices(self.synthesizer.local_engine(), gender).await?)
    }

    /// Обработать один запрос: от проверки ввода до очистки
    pub async fn run(&self, params: PipelineParams) -> Result<PipelineOutput> {
        self.notify(PipelineStage::Idle, Some("request received"));
        self.notify(PipelineStage::ValidatingInputs, None);
        let (request, video_path) = match self.validate(&params) {
            Ok(validated) => validated,
            Err(e) => return Err(self.fail(e)),
        };

        let mut scope = match ArtifactScope::new(&self.config.work_dir) {
            Ok(scope) => scope,
            Err(e) => return Err(self.fail(e)),
        };
        info!("Request {} started", scope.request_id());

        let outcome = self.process(&request, video_path, &mut scope).await;
        if let Err(e) = &outcome {
            self.notify(PipelineStage::Errored, Some(&e.to_string()));
        }

        self.notify(PipelineStage::CleaningUp, None);
        scope.close();

        if outcome.is_ok() {
            self.notify(PipelineStage::Done, None);
        }
        outcome
    }

    /// Проверка ввода; до синтеза ничего не создается на диске
    fn validate(&self, params: &PipelineParams) -> Result<(SynthesisRequest, PathBuf)> {
        if params.text.trim().is_empty() {
            return Err(VoiceoverError::Validation(
                "Please enter some text for TTS.".to_string(),
            ));
        }

        let video = match params.video.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(VoiceoverError::Validation(
                    "Please select a video file.".to_string(),
                ))
            }
        };

        let voice_index = params.voice_index.ok_or_else(|| {
            VoiceoverError::Validation("Please select a valid voice.".to_string())
        })?;

        if !(MIN_PITCH..=MAX_PITCH).contains(&params.pitch) {
            return Err(VoiceoverError::Validation(format!(
                "Pitch must be between {} and {}, got {}",
                MIN_PITCH, MAX_PITCH, params.pitch
            )));
        }

        let video_path = media::resolve_video(&self.config.media_dir, video)?;

        Ok((
            SynthesisRequest {
                text: params.text.clone(),
                language: params.language,
                gender: params.gender,
                voice_index,
                pitch_factor: params.pitch,
            },
            video_path,
        ))
    }

    async fn process(
        &self,
        request: &SynthesisRequest,
        video_path: PathBuf,
        scope: &mut ArtifactScope,
    ) -> Result<PipelineOutput> {
        self.notify(PipelineStage::Synthesizing, Some(request.language.code()));
        let synthesis = self.synthesizer.synthesize(request, scope).await?;

        self.notify(PipelineStage::Compositing, None);
        let output_path = scope.artifact_path(VIDEO_STEM, "mp4");
        let composite = self
            .compositor
            .composite(&video_path, &synthesis.audio.path, &output_path)
            .await?;
        info!(
            "Composite is {:.2}s (source video {:.2}s)",
            composite.duration, composite.source.duration
        );

        self.notify(PipelineStage::Delivering, None);
        self.deliver(&synthesis, &composite).await
    }

    async fn deliver(
        &self,
        synthesis: &Synthesis,
        composite: &CompositeResult,
    ) -> Result<PipelineOutput> {
        let video = Deliverable {
            file_name: format!("{}.mp4", VIDEO_STEM),
            mime_type: CompositeResult::MIME_TYPE.to_string(),
            bytes: read_artifact(&composite.path).await?,
        };

        let format = synthesis.audio.format;
        let audio = Deliverable {
            file_name: format!("{}.{}", AUDIO_STEM, format.extension()),
            mime_type: format.mime_type().to_string(),
            bytes: read_artifact(&synthesis.audio.path).await?,
        };

        Ok(PipelineOutput {
            video,
            audio,
            warnings: synthesis.warning.iter().cloned().collect(),
        })
    }

    fn fail(&self, error: VoiceoverError) -> VoiceoverError {
        self.notify(PipelineStage::Errored, Some(&error.to_string()));
        // временных файлов еще нет, очищать нечего
        self.notify(PipelineStage::CleaningUp, None);
        error
    }

    fn notify(&self, stage: PipelineStage, details: Option<&str>) {
        self.observer.on_stage(stage, details);
    }
}

async fn read_artifact(path: &std::path::Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        VoiceoverError::Delivery(format!("{}: {}", path.display(), e))
    })
}
