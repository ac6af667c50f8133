//! Модуль пакетной обработки
//!
//! Обход каталога масок, генерация нескольких стохастических вариантов
//! на маску и построение имён выходных файлов

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{So2Error, So2Generator};

/// Поддерживаемые расширения входных файлов (без учёта регистра)
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Конфигурация пакетной обработки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Каталог входных масок
    pub input_dir: PathBuf,
    /// Каталог выходных карт SO2
    pub output_signal_dir: PathBuf,
    /// Каталог выходных меток; None отключает сохранение меток
    pub output_label_dir: Option<PathBuf>,
    /// Количество стохастических вариантов на маску
    pub count_per_image: u32,
}

impl BatchConfig {
    /// Конфигурация с одним вариантом на маску и без меток
    pub fn new(input_dir: impl Into<PathBuf>, output_signal_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_signal_dir: output_signal_dir.into(),
            output_label_dir: None,
            count_per_image: 1,
        }
    }
}

/// Итог пакетной обработки
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Найдено входных файлов
    pub found: usize,
    /// Сгенерировано выходных пар (карта, метки)
    pub generated: usize,
    /// Пропущено нечитаемых входов
    pub skipped: usize,
    /// Файлов с ошибками записи
    pub failed: usize,
}

/// Пакетный обработчик масок
pub struct BatchProcessor {
    config: BatchConfig,
    generator: So2Generator,
}

impl BatchProcessor {
    /// Создание обработчика с генератором по умолчанию
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            generator: So2Generator::new(),
        }
    }

    /// Создание обработчика с настроенным генератором
    pub fn with_generator(config: BatchConfig, generator: So2Generator) -> Self {
        Self { config, generator }
    }

    /// Обход каталога и генерация.
    ///
    /// Нечитаемая маска пропускается с предупреждением, ошибка записи
    /// прерывает текущий файл; обработка продолжается со следующего.
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<BatchSummary, So2Error> {
        let files = list_image_files(&self.config.input_dir)?;
        log::info!(
            "Found {} mask files in {:?}",
            files.len(),
            self.config.input_dir
        );

        let mut summary = BatchSummary {
            found: files.len(),
            ..Default::default()
        };

        for path in &files {
            let base = match path.file_stem().and_then(|s| s.to_str()) {
                Some(s) => s.to_string(),
                None => {
                    log::warn!("Skipping file with non-UTF8 name: {:?}", path);
                    summary.skipped += 1;
                    continue;
                }
            };

            for variant in 0..self.config.count_per_image.max(1) {
                let suffix = if self.config.count_per_image > 1 {
                    format!("_sim_{:02}", variant + 1)
                } else {
                    String::new()
                };

                let signal_path = self
                    .config
                    .output_signal_dir
                    .join(format!("{}{}.png", base, suffix));
                let label_path = self
                    .config
                    .output_label_dir
                    .as_ref()
                    .map(|dir| dir.join(format!("{}{}_label.png", base, suffix)));

                match self
                    .generator
                    .generate_file(path, &signal_path, label_path.as_deref(), rng)
                {
                    Ok(report) => {
                        log::debug!(
                            "Generated {:?}: {} lesions",
                            signal_path,
                            report.lesions.len()
                        );
                        summary.generated += 1;
                    }
                    Err(So2Error::UnreadableInput(e)) => {
                        log::warn!("Skipping unreadable mask {:?}: {}", path, e);
                        summary.skipped += 1;
                        break;
                    }
                    Err(So2Error::WriteFailure(e)) => {
                        log::error!("Write failure for {:?}: {}", path, e);
                        summary.failed += 1;
                        break;
                    }
                }
            }
        }

        log::info!(
            "Batch done: {} generated, {} skipped, {} failed",
            summary.generated,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }
}

/// Список файлов изображений в каталоге, отсортированный по имени
pub(crate) fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>, So2Error> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| So2Error::UnreadableInput(format!("{}: {}", dir.display(), e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| has_image_extension(p))
        .collect();
    files.sort();

    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter() {
        assert!(has_image_extension(Path::new("mask_0001.png")));
        assert!(has_image_extension(Path::new("mask_0001.PNG")));
        assert!(has_image_extension(Path::new("scan.Jpeg")));
        assert!(has_image_extension(Path::new("photo.jpg")));

        assert!(!has_image_extension(Path::new("volume.tiff")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("noextension")));
    }

    #[test]
    fn test_missing_input_dir_is_error() {
        let result = list_image_files(Path::new("/nonexistent/so2_masks"));
        assert!(matches!(result, Err(So2Error::UnreadableInput(_))));
    }
}
