//! Локальный движок TTS на базе espeak-ng
//!
//! Список голосов берется из `espeak-ng --voices`, речь пишется в WAV
//! через `-w`. Текст передается через stdin.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::LocalEngine;
use crate::error::SynthesisError;
use crate::models::Voice;
use crate::utils::ffmpeg::last_stderr_line;

/// Скорость речи espeak-ng по умолчанию, слов в минуту
pub const ESPEAK_DEFAULT_RATE: u32 = 175;

// Pty Language Age/Gender VoiceName File Other Languages
static VOICE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\s+(\S+)\s+(\S*)/(\S+)\s+(\S+)\s+(\S+)").expect("valid voice line regex")
});

pub struct EspeakEngine {
    binary: String,
}

impl EspeakEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn error(&self, message: impl ToString) -> SynthesisError {
        SynthesisError::backend("espeak-ng", message)
    }
}

/// Разбор таблицы, которую печатает `espeak-ng --voices`.
///
/// Пол дописывается в отображаемое имя, например `English (Great Britain) (male)`,
/// чтобы каталог голосов мог по нему фильтровать.
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| VOICE_LINE.captures(line))
        .map(|caps| {
            let language = &caps[1];
            let gender = match caps[3].trim_end_matches('?') {
                "M" => " (male)",
                "F" => " (female)",
                _ => "",
            };
            let name = format!("{}{}", caps[4].replace('_', " "), gender);
            Voice::new(name, language)
        })
        .collect()
}

#[async_trait]
impl LocalEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        let output = Command::new(&self.binary)
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.error(format!("failed to start {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(self.error(format!(
                "voice listing failed with status {}: {}",
                output.status,
                last_stderr_line(&output.stderr)
            )));
        }

        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!("espeak-ng reported {} voices", voices.len());
        Ok(voices)
    }

    fn default_rate(&self) -> u32 {
        ESPEAK_DEFAULT_RATE
    }

    async fn render(
        &self,
        text: &str,
        voice: &Voice,
        rate: u32,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        let output_arg = output.to_string_lossy().to_string();
        let rate_arg = rate.to_string();
        let mut child = Command::new(&self.binary)
            .args([
                "-v",
                voice.id.as_str(),
                "-s",
                rate_arg.as_str(),
                "-w",
                output_arg.as_str(),
                "--stdin",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.error(format!("failed to start {}: {}", self.binary, e)))?;

        // espeak-ng может завершиться, не дочитав stdin; причина тогда в stderr
        let sent = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(text.as_bytes()).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            return Err(self.error(format!(
                "synthesis failed with status {}: {}",
                result.status,
                last_stderr_line(&result.stderr)
            )));
        }
        if let Err(e) = sent {
            return Err(self.error(format!("failed to send text to {}: {}", self.binary, e)));
        }

        Ok(())
    }
}
