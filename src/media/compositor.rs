//! Наложение синтезированного аудио на видео
//!
//! Видео обрезается до длительности более короткого из двух файлов,
//! исходная аудиодорожка заменяется целиком.

use std::path::Path;

use async_trait::async_trait;
use log::info;

use super::probe::{MediaClip, MediaKind};
use crate::config::VoiceoverConfig;
use crate::error::CompositionError;
use crate::models::{CompositeResult, VideoArtifact};
use crate::utils::ffmpeg::run_ffmpeg_command;

/// Имя итогового видеофайла (без расширения)
pub const VIDEO_STEM: &str = "final_video";

#[async_trait]
pub trait Compositor: Send + Sync {
    /// Наложить `audio` на `video` и записать mp4 в `output`
    async fn composite(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<CompositeResult, CompositionError>;
}

/// Длительность результата: ни зацикливания, ни дополнения тишиной
pub fn overlay_duration(video: f64, audio: f64) -> f64 {
    video.min(audio)
}

pub struct FfmpegCompositor {
    ffmpeg: String,
    ffprobe: String,
    video_codec: String,
    audio_codec: String,
}

impl FfmpegCompositor {
    pub fn new(config: &VoiceoverConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_bin.clone(),
            ffprobe: config.ffprobe_bin.clone(),
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
        }
    }

    /// Аргументы ffmpeg для замены аудиодорожки с обрезкой
    pub fn build_args(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        duration: f64,
    ) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(), // видео из первого входа
            "-map".to_string(),
            "1:a:0".to_string(), // аудио из второго
            "-t".to_string(),
            format!("{:.6}", duration),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn composite(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<CompositeResult, CompositionError> {
        // дескрипторы обоих файлов освобождаются при любом выходе
        let video_clip = MediaClip::open(video, MediaKind::Video, &self.ffprobe).await?;
        let audio_clip = MediaClip::open(audio, MediaKind::Audio, &self.ffprobe).await?;

        let duration = overlay_duration(video_clip.duration, audio_clip.duration);
        info!(
            "Overlaying {:.2}s audio on {:.2}s video, output {:.2}s",
            audio_clip.duration, video_clip.duration, duration
        );

        let args = self.build_args(&video_clip.path, &audio_clip.path, output, duration);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_ffmpeg_command(&self.ffmpeg, &args).await?;

        if !output.exists() {
            return Err(CompositionError(format!(
                "FFmpeg reported success but {} was not written",
                output.display()
            )));
        }

        info!("Composite video written to {}", output.display());
        Ok(CompositeResult {
            path: output.to_path_buf(),
            duration,
            source: VideoArtifact {
                path: video_clip.path.clone(),
                duration: video_clip.duration,
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Поддельный компоновщик с фиксированной длительностью видео

    use super::*;
    use std::sync::Mutex;

    pub struct FakeCompositor {
        pub video_duration: f64,
        pub fail_with: Option<String>,
        pub calls: Mutex<Vec<(std::path::PathBuf, std::path::PathBuf)>>,
    }

    impl FakeCompositor {
        pub fn new(video_duration: f64) -> Self {
            Self {
                video_duration,
                fail_with: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Compositor for FakeCompositor {
        async fn composite(
            &self,
            video: &Path,
            audio: &Path,
            output: &Path,
        ) -> Result<CompositeResult, CompositionError> {
            self.calls
                .lock()
                .unwrap()
                .push((video.to_path_buf(), audio.to_path_buf()));
            if let Some(message) = &self.fail_with {
                return Err(CompositionError(message.clone()));
            }
            let audio_duration = match crate::tts::check_waveform(audio) {
                Ok(seconds) => seconds,
                // сетевой MP3 не читается как WAV, считаем его длинным
                Err(_) => f64::MAX,
            };
            std::fs::write(output, b"mp4 bytes")?;
            Ok(CompositeResult {
                path: output.to_path_buf(),
                duration: overlay_duration(self.video_duration, audio_duration),
                source: VideoArtifact {
                    path: video.to_path_buf(),
                    duration: self.video_duration,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_duration_is_minimum() {
        assert_eq!(overlay_duration(10.0, 2.5), 2.5);
        assert_eq!(overlay_duration(3.0, 7.25), 3.0);
        assert_eq!(overlay_duration(4.0, 4.0), 4.0);
    }

    #[test]
    fn test_build_args() {
        let compositor = FfmpegCompositor::new(&VoiceoverConfig::default());
        let args = compositor.build_args(
            Path::new("clip.mov"),
            Path::new("/tmp/generated_audio.wav"),
            Path::new("/tmp/final_video.mp4"),
            2.5,
        );
        let joined = args.join(" ");
        assert!(joined.contains("-i clip.mov -i /tmp/generated_audio.wav"));
        assert!(joined.contains("-map 0:v:0 -map 1:a:0"));
        assert!(joined.contains("-t 2.500000"));
        assert!(joined.contains("-c:v libx264 -c:a aac"));
        assert_eq!(args.last().unwrap(), "/tmp/final_video.mp4");
    }

    #[tokio::test]
    async fn test_unreadable_video_is_composition_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("generated_audio.wav");
        crate::tts::testing::write_wav(&audio, 1.0);

        let compositor = FfmpegCompositor::new(&VoiceoverConfig::default());
        let err = compositor
            .composite(
                &dir.path().join("missing.mp4"),
                &audio,
                &dir.path().join("final_video.mp4"),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Error overlaying audio on video: Cannot open video file"));
        assert!(!dir.path().join("final_video.mp4").exists());
    }

    #[cfg(unix)]
    mod with_tools {
        use super::*;
        use crate::utils::ffmpeg::testing::write_script;
        use std::path::PathBuf;

        // длительность берется из файла `<input>.duration` рядом с входом
        const FFPROBE: &str = r#"for last; do :; done
printf '{"streams":[{"codec_type":"video"},{"codec_type":"audio"}],"format":{"duration":"%s"}}' "$(cat "$last.duration")""#;

        const FFMPEG: &str = r#"printf '%s\n' "$@" > "$(dirname "$0")/ffmpeg.args"
for last; do :; done
printf 'mp4' > "$last""#;

        fn compositor(dir: &Path, ffmpeg_body: &str) -> FfmpegCompositor {
            let ffmpeg = write_script(dir, "ffmpeg", ffmpeg_body);
            let ffprobe = write_script(dir, "ffprobe", FFPROBE);
            FfmpegCompositor::new(&VoiceoverConfig {
                ffmpeg_bin: ffmpeg.to_string_lossy().to_string(),
                ffprobe_bin: ffprobe.to_string_lossy().to_string(),
                ..VoiceoverConfig::default()
            })
        }

        fn input(dir: &Path, name: &str, seconds: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, b"media").unwrap();
            std::fs::write(dir.join(format!("{}.duration", name)), seconds).unwrap();
            path
        }

        fn trim_arg(dir: &Path) -> String {
            let args = std::fs::read_to_string(dir.join("ffmpeg.args")).unwrap();
            let args: Vec<&str> = args.lines().collect();
            let at = args.iter().position(|a| *a == "-t").unwrap();
            args[at + 1].to_string()
        }

        #[tokio::test]
        async fn test_output_is_trimmed_to_shorter_input() {
            for (video_len, audio_len, expected) in [
                ("6.0", "2.5", 2.5),
                ("3.0", "7.25", 3.0),
                ("4.0", "4.0", 4.0),
            ] {
                let dir = tempfile::tempdir().unwrap();
                let compositor = compositor(dir.path(), FFMPEG);
                let video = input(dir.path(), "clip.mp4", video_len);
                let audio = input(dir.path(), "generated_audio.wav", audio_len);
                let output = dir.path().join("final_video.mp4");

                let result = compositor.composite(&video, &audio, &output).await.unwrap();

                assert_eq!(result.duration, expected);
                assert_eq!(result.source.duration, video_len.parse::<f64>().unwrap());
                assert_eq!(result.path, output);
                assert_eq!(trim_arg(dir.path()), format!("{:.6}", expected));
                assert_eq!(std::fs::read(&output).unwrap(), b"mp4");
            }
        }

        #[tokio::test]
        async fn test_ffmpeg_failure_keeps_stderr_cause() {
            let dir = tempfile::tempdir().unwrap();
            let compositor = compositor(
                dir.path(),
                "echo 'ffmpeg version 6.0' >&2\necho 'Unknown encoder libx264' >&2\nexit 1",
            );
            let video = input(dir.path(), "clip.mp4", "5.0");
            let audio = input(dir.path(), "generated_audio.wav", "2.0");
            let output = dir.path().join("final_video.mp4");

            let err = compositor.composite(&video, &audio, &output).await.unwrap_err();

            let message = err.to_string();
            assert!(message.starts_with("Error overlaying audio on video: FFmpeg command failed"));
            assert!(message.ends_with("Unknown encoder libx264"));
            assert!(!output.exists());
        }

        #[tokio::test]
        async fn test_silent_success_without_output_is_error() {
            let dir = tempfile::tempdir().unwrap();
            let compositor = compositor(dir.path(), "exit 0");
            let video = input(dir.path(), "clip.mp4", "5.0");
            let audio = input(dir.path(), "generated_audio.wav", "2.0");

            let err = compositor
                .composite(&video, &audio, &dir.path().join("final_video.mp4"))
                .await
                .unwrap_err();
            assert!(err.0.contains("was not written"));
        }
    }
}
