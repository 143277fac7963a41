//! Voice catalog: a fresh snapshot of the host engine's voices, filtered by gender.

use log::debug;
use serde::Serialize;

use super::LocalEngine;
use crate::error::SynthesisError;
use crate::models::{Gender, Voice};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoiceSelection {
    pub voices: Vec<Voice>,
    /// No voice matched the requested gender and `voices` is the full set
    pub fallback: bool,
}

impl VoiceSelection {
    /// Keep the voices whose name marks them as `gender`, in host order.
    pub fn filter(all: Vec<Voice>, gender: Gender) -> Self {
        let matching: Vec<Voice> = all
            .iter()
            .filter(|voice| voice.inferred_gender.matches(gender))
            .cloned()
            .collect();

        if matching.is_empty() {
            Self {
                voices: all,
                fallback: true,
            }
        } else {
            Self {
                voices: matching,
                fallback: false,
            }
        }
    }

    /// Pick a voice by its 1-based position
    pub fn select(&self, index: u32) -> Result<&Voice, SynthesisError> {
        let available = self.voices.len();
        if index == 0 || index as usize > available {
            return Err(SynthesisError::InvalidVoiceIndex { index, available });
        }
        Ok(&self.voices[index as usize - 1])
    }
}

/// Enumerate the engine's voices and narrow them to `gender`.
pub async fn resolve_voices(
    engine: &dyn LocalEngine,
    gender: Gender,
) -> Result<VoiceSelection, SynthesisError> {
    let all = engine.list_voices().await?;
    if all.is_empty() {
        return Err(SynthesisError::NoVoices);
    }

    let selection = VoiceSelection::filter(all, gender);
    debug!(
        "{} voice(s) for gender {} (fallback: {})",
        selection.voices.len(),
        gender,
        selection.fallback
    );
    Ok(selection)
}
