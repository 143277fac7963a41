//! Вспомогательные модули: ffmpeg, временные файлы, логирование

pub mod ffmpeg;
pub mod logger;
pub mod temp;
