//! Модуль для работы с медиафайлами
//!
//! Поиск входных видео, чтение длительностей и сборка итогового mp4.

pub mod compositor;
pub mod library;
pub mod probe;

pub use compositor::{overlay_duration, Compositor, FfmpegCompositor};
pub use library::{list_videos, resolve_video};
pub use probe::{MediaClip, MediaKind};
