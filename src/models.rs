//! Data types shared by the synthesizer, the compositor and the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Languages offered to the user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    It,
    Ur,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Ur,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Ur => "ur",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unsupported language: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("Unsupported voice gender: {}", other)),
        }
    }
}

/// Gender guessed from a voice's display name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferredGender {
    Male,
    Female,
    Unknown,
}

impl InferredGender {
    /// "female" is checked first since every female name also contains "male".
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("female") {
            InferredGender::Female
        } else if name.contains("male") {
            InferredGender::Male
        } else {
            InferredGender::Unknown
        }
    }

    pub fn matches(&self, gender: Gender) -> bool {
        matches!(
            (self, gender),
            (InferredGender::Male, Gender::Male) | (InferredGender::Female, Gender::Female)
        )
    }
}

/// A voice installed on the host speech engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voice {
    /// Display name
    pub name: String,
    /// Backend identifier passed back to the engine when rendering
    pub id: String,
    pub inferred_gender: InferredGender,
}

impl Voice {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        let name = name.into();
        let inferred_gender = InferredGender::from_name(&name);
        Self {
            name,
            id: id.into(),
            inferred_gender,
        }
    }
}

/// Validated input for one synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: Language,
    pub gender: Gender,
    /// 1-based index into the voices matching `gender`
    pub voice_index: u32,
    /// Scales the speaking rate, 0.5 - 2.0
    pub pitch_factor: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }
}

/// Synthesized speech on disk
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub format: AudioFormat,
}

/// Input video, never modified
#[derive(Debug, Clone, PartialEq)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub duration: f64,
}

/// Output video with the new audio track, always mp4
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    pub path: PathBuf,
    pub duration: f64,
    /// The input the composite was cut from
    pub source: VideoArtifact,
}

impl CompositeResult {
    pub const MIME_TYPE: &'static str = "video/mp4";
}

/// Parameters as they arrive from the presentation layer, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineParams {
    pub text: String,
    pub language: Language,
    pub gender: Gender,
    #[serde(default)]
    pub voice_index: Option<u32>,
    #[serde(default = "default_pitch")]
    pub pitch: f32,
    #[serde(default)]
    pub video: Option<String>,
}

fn default_pitch() -> f32 {
    1.0
}

/// An artifact read into memory, ready to hand out as a download
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Deliverable {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub video: Deliverable,
    pub audio: Deliverable,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inferred_gender() {
        assert_eq!(InferredGender::from_name("English (Male)"), InferredGender::Male);
        assert_eq!(InferredGender::from_name("Zira FEMALE"), InferredGender::Female);
        assert_eq!(InferredGender::from_name("Alex"), InferredGender::Unknown);
        assert!(!InferredGender::Female.matches(Gender::Male));
        assert!(InferredGender::Male.matches(Gender::Male));
    }

    #[test]
    fn test_language_codes() {
        assert_eq!("UR".parse::<Language>().unwrap(), Language::Ur);
        assert_eq!(Language::De.to_string(), "de");
        assert!("pt".parse::<Language>().is_err());
    }

    #[test]
    fn test_params_from_json() {
        let params: PipelineParams = serde_json::from_str(
            r#"{"text":"Hello","language":"en","gender":"male","voice_index":1,"video":"clip.mp4"}"#,
        )
        .unwrap();
        assert_eq!(params.language, Language::En);
        assert_eq!(params.gender, Gender::Male);
        assert_eq!(params.voice_index, Some(1));
        assert_eq!(params.pitch, 1.0);
        assert_eq!(params.video.as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn test_audio_mime_types() {
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
        assert_eq!(AudioFormat::Wav.extension(), "wav");
    }
}
