//! Модуль для работы с FFmpeg
//!
//! Запуск ffmpeg/ffprobe и поиск внешних инструментов в PATH.

use std::path::PathBuf;
use std::process::Stdio;

use log::debug;
use tokio::process::Command;

use crate::error::CompositionError;

/// Поиск внешнего инструмента по явному пути или в PATH
pub fn check_command_in_path(command: &str) -> Result<PathBuf, which::Error> {
    which::which(command)
}

/// Запуск команды FFmpeg
pub async fn run_ffmpeg_command(ffmpeg: &str, args: &[&str]) -> Result<(), CompositionError> {
    debug!("Running {} {}", ffmpeg, args.join(" "));
    let output = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CompositionError(format!("Failed to start {}: {}", ffmpeg, e)))?;

    if !output.status.success() {
        return Err(CompositionError(format!(
            "FFmpeg command failed with status {}: {}",
            output.status,
            last_stderr_line(&output.stderr)
        )));
    }

    Ok(())
}

/// Запуск команды FFprobe, возвращает stdout
pub async fn run_ffprobe_command(ffprobe: &str, args: &[&str]) -> Result<String, CompositionError> {
    let output = Command::new(ffprobe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CompositionError(format!("Failed to start {}: {}", ffprobe, e)))?;

    if !output.status.success() {
        return Err(CompositionError(format!(
            "FFprobe command failed with status {}: {}",
            output.status,
            last_stderr_line(&output.stderr)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Последняя непустая строка stderr, в ней и есть ошибка
pub(crate) fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("no error output")
        .to_string()
}

#[cfg(all(test, unix))]
pub(crate) mod testing {
    //! Shell-скрипты вместо ffmpeg, ffprobe и espeak-ng в тестах

    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Записать исполняемый `/bin/sh` скрипт `name` в `dir`
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut permissions = std::fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).unwrap();
        path
    }
}
