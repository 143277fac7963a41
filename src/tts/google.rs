//! Модуль для интеграции с Google Translate TTS
//!
//! Сервис принимает не более ~100 символов за запрос, поэтому текст режется
//! на фрагменты по границам слов, а полученные MP3 склеиваются подряд.

use std::path::Path;
use std::time::Duration;

use log::{debug, error, info};
use reqwest::Client;

use crate::error::SynthesisError;
use crate::models::Language;

/// Максимум символов в одном запросе к сервису
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) voiceover";

#[derive(Clone)]
pub struct GoogleTts {
    client: Client,
    url: String,
}

impl GoogleTts {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Синтезировать `text` и сохранить MP3 в `output`
    pub async fn synthesize(
        &self,
        text: &str,
        language: Language,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::backend("network TTS", "nothing to synthesize"));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!("Requesting TTS chunk {}/{} ({})", idx + 1, chunks.len(), language);
            let idx_param = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .client
                .get(self.url.as_str())
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", language.code()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx_param.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
                error!("TTS service error for chunk {} (status {}): {}", idx, status, error_text);
                return Err(SynthesisError::backend(
                    "network TTS",
                    format!("service returned status {} for chunk {}", status, idx + 1),
                ));
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(SynthesisError::backend(
                    "network TTS",
                    format!("received empty audio for chunk {}", idx + 1),
                ));
            }
            audio.extend_from_slice(&bytes);
        }

        tokio::fs::write(output, &audio).await?;
        info!(
            "Saved {} bytes of network TTS audio to {}",
            audio.len(),
            output.display()
        );
        Ok(())
    }
}

/// Разбить текст на фрагменты не длиннее `max_chars` символов по границам слов.
/// Слово длиннее лимита режется на куски фиксированной длины.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
