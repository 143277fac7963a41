//! Стадии конвейера и наблюдатели за переходами между ними
//!
//! Реализация паттерна Observer: конвейер сообщает о каждой смене стадии,
//! наблюдатель решает, что с этим делать (лог, UI, тесты).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Стадия обработки запроса
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    ValidatingInputs,
    Synthesizing,
    Compositing,
    Delivering,
    CleaningUp,
    Done,
    Errored,
}

impl PipelineStage {
    /// Сообщение для пользователя
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting for input",
            Self::ValidatingInputs => "Checking inputs...",
            Self::Synthesizing => "Generating audio...",
            Self::Compositing => "Overlaying audio on video...",
            Self::Delivering => "Preparing downloads...",
            Self::CleaningUp => "Removing temporary files...",
            Self::Done => "Video generated successfully!",
            Self::Errored => "An error occurred",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Наблюдатель, получающий уведомления о смене стадии
pub trait StageObserver: Send + Sync {
    fn on_stage(&self, stage: PipelineStage, details: Option<&str>);
}

/// Пишет переходы в лог
#[derive(Debug, Default)]
pub struct LogStageObserver;

impl StageObserver for LogStageObserver {
    fn on_stage(&self, stage: PipelineStage, details: Option<&str>) {
        match (stage, details) {
            (PipelineStage::Errored, Some(details)) => log::error!("{}: {}", stage, details),
            (_, Some(details)) => log::info!("[{:?}] {}", stage, details),
            (_, None) => log::info!("[{:?}] {}", stage, stage),
        }
    }
}
