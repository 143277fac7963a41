//! Модуль обработки ошибок библиотеки voiceover
//!
//! Ошибки разделены по стадиям конвейера: проверка ввода, синтез речи,
//! сборка видео и выдача результата.

use thiserror::Error;

/// Ошибки синтеза речи
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Индекс голоса вне диапазона `[1, available]`
    #[error("Invalid voice index {index}: available voices: {available}")]
    InvalidVoiceIndex { index: u32, available: usize },

    /// Движок не предоставил ни одного голоса
    #[error("No voices are installed for the local speech engine")]
    NoVoices,

    /// Ошибка движка (локального или сетевого)
    #[error("Error generating audio with {backend}: {message}")]
    Backend { backend: &'static str, message: String },

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthesisError {
    pub(crate) fn backend(backend: &'static str, message: impl ToString) -> Self {
        SynthesisError::Backend {
            backend,
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        SynthesisError::backend("network TTS", err)
    }
}

/// Ошибка наложения аудио на видео
#[derive(Debug, Error)]
#[error("Error overlaying audio on video: {0}")]
pub struct CompositionError(pub String);

impl From<std::io::Error> for CompositionError {
    fn from(err: std::io::Error) -> Self {
        CompositionError(err.to_string())
    }
}

/// Ошибки библиотеки voiceover
#[derive(Debug, Error)]
pub enum VoiceoverError {
    /// Неверный или отсутствующий пользовательский ввод
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    /// Артефакт исчез до того, как его удалось прочитать
    #[error("Failed to deliver {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceoverError {
    /// Ошибка вызвана вводом пользователя, а не сбоем конвейера
    pub fn is_validation(&self) -> bool {
        matches!(self, VoiceoverError::Validation(_))
    }
}

/// Тип Result для библиотеки voiceover
pub type Result<T> = std::result::Result<T, VoiceoverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_cause() {
        let err = SynthesisError::InvalidVoiceIndex {
            index: 99,
            available: 3,
        };
        assert_eq!(err.to_string(), "Invalid voice index 99: available voices: 3");

        let err: VoiceoverError = SynthesisError::backend("espeak-ng", "voice not found").into();
        assert_eq!(
            err.to_string(),
            "Error generating audio with espeak-ng: voice not found"
        );
        assert!(!err.is_validation());

        let err: VoiceoverError = CompositionError("moov atom not found".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Error overlaying audio on video: moov atom not found"
        );
    }

    #[test]
    fn test_validation_is_displayed_verbatim() {
        let err = VoiceoverError::Validation("Please enter some text for TTS.".to_string());
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Please enter some text for TTS.");
    }
}
