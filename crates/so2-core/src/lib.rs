//! SO2 Core - Модуль синтеза обучающих данных SO2
//!
//! Библиотека для генерации симулированных карт сатурации кислорода (SO2)
//! по сосудистым маскам, с поддержкой:
//! - Бинаризации маски и выбора точек посадки очагов
//! - Стохастического размещения нескольких очагов с минимальным расстоянием
//! - Радиальных полей расстояний и регионов ядро/полутень/норма
//! - Градиентного синтеза значений и детерминированного композитинга
//! - Пакетной обработки каталогов масок

pub mod batch;
pub mod compositing;
pub mod distance;
pub mod masking;
pub mod placement;
pub mod preprocess;
pub mod synthesis;

pub use batch::{BatchConfig, BatchProcessor, BatchSummary};
pub use distance::{distance_field, RegionMasks};
pub use masking::{MaskConfig, MaskProcessor, VesselMask};
pub use placement::{LesionPlacer, Placement, PlacerConfig};
pub use synthesis::{
    Lesion, So2Synthesizer, SynthesisConfig, LABEL_BACKGROUND, LABEL_CORE, LABEL_NORMAL,
    LABEL_PENUMBRA,
};

use image::GrayImage;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Основные ошибки модуля
#[derive(Error, Debug)]
pub enum So2Error {
    #[error("Unreadable input image: {0}")]
    UnreadableInput(String),

    #[error("Failed to write output: {0}")]
    WriteFailure(String),
}

/// Результат генерации для одной маски
#[derive(Debug, Clone)]
pub struct GeneratedSample {
    /// Синтезированная карта SO2 (0-255)
    pub signal: GrayImage,
    /// Растр меток сегментации {0, 1, 2, 3}
    pub label: GrayImage,
    /// Реализованные параметры симуляции
    pub report: SimulationReport,
}

/// Параметры, реализованные при генерации одного изображения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Принятые очаги
    pub lesions: Vec<Lesion>,
    /// Базовый уровень SO2 нормальной ткани
    pub base_normal: f32,
}

/// Главный генератор симулированных карт SO2
pub struct So2Generator {
    mask: MaskProcessor,
    placer: LesionPlacer,
    synthesizer: So2Synthesizer,
}

impl Default for So2Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl So2Generator {
    /// Создание генератора с настройками по умолчанию
    pub fn new() -> Self {
        Self::with_config(
            MaskConfig::default(),
            PlacerConfig::default(),
            SynthesisConfig::default(),
        )
    }

    /// Создание генератора с пользовательскими настройками
    pub fn with_config(mask: MaskConfig, placer: PlacerConfig, synthesis: SynthesisConfig) -> Self {
        Self {
            mask: MaskProcessor::new(mask),
            placer: LesionPlacer::new(placer),
            synthesizer: So2Synthesizer::new(synthesis),
        }
    }

    /// Генерация карты SO2 и меток по загруженной маске
    pub fn generate_image<R: Rng>(&self, mask_img: &GrayImage, rng: &mut R) -> GeneratedSample {
        log::info!("Starting generation, mask size: {:?}", mask_img.dimensions());

        // Бинаризация маски
        let vessel = self.mask.extract(mask_img);
        log::debug!("Vessel seed pixels: {}", vessel.seeds().len());

        // Размещение очагов
        let centers = self.placer.place(rng, &vessel);
        log::info!("Placed {} lesion centers", centers.len());

        // Розыгрыш параметров: базовый уровень один на изображение
        let base_normal = self.synthesizer.sample_base_normal(rng);
        let lesions: Vec<Lesion> = centers
            .into_iter()
            .map(|c| self.synthesizer.sample_lesion(rng, c, vessel.min_dim()))
            .collect();

        self.render(&vessel, &lesions, base_normal, rng)
    }

    /// Генерация с явно заданными очагами и базовым уровнем.
    ///
    /// При нулевых сигмах шума результат полностью детерминирован.
    pub fn generate_with_lesions<R: Rng>(
        &self,
        mask_img: &GrayImage,
        lesions: &[Lesion],
        base_normal: f32,
        rng: &mut R,
    ) -> GeneratedSample {
        let vessel = self.mask.extract(mask_img);
        self.render(&vessel, lesions, base_normal, rng)
    }

    fn render<R: Rng>(
        &self,
        vessel: &VesselMask,
        lesions: &[Lesion],
        base_normal: f32,
        rng: &mut R,
    ) -> GeneratedSample {
        let (width, height) = vessel.dimensions();

        // Базовое поле нормальной ткани
        let baseline = self.synthesizer.baseline(rng, width, height, base_normal);

        // Кандидатные поля очагов
        let fields: Vec<_> = lesions
            .iter()
            .map(|l| self.synthesizer.lesion_field(rng, width, height, l, base_normal))
            .collect();

        // Композитинг и гейтирование по маске
        let (signal, labels) = compositing::composite(&baseline, &fields);
        let (signal_img, label_img) = compositing::finalize(&signal, &labels, vessel);

        GeneratedSample {
            signal: signal_img,
            label: label_img,
            report: SimulationReport {
                lesions: lesions.to_vec(),
                base_normal,
            },
        }
    }

    /// Генерация из файла маски с записью результатов на диск
    pub fn generate_file<R: Rng>(
        &self,
        mask_path: &Path,
        signal_path: &Path,
        label_path: Option<&Path>,
        rng: &mut R,
    ) -> Result<SimulationReport, So2Error> {
        let img = image::open(mask_path)
            .map_err(|e| So2Error::UnreadableInput(format!("{}: {}", mask_path.display(), e)))?
            .to_luma8();

        let sample = self.generate_image(&img, rng);

        write_gray(&sample.signal, signal_path)?;
        if let Some(path) = label_path {
            write_gray(&sample.label, path)?;
        }

        Ok(sample.report)
    }
}

/// Запись растра с созданием родительских каталогов
fn write_gray(img: &GrayImage, path: &Path) -> Result<(), So2Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| So2Error::WriteFailure(format!("{}: {}", parent.display(), e)))?;
        }
    }
    img.save(path)
        .map_err(|e| So2Error::WriteFailure(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generator_creation() {
        let _generator = So2Generator::new();
    }

    #[test]
    fn test_output_dimensions_match_input() {
        let generator = So2Generator::new();
        let mask = GrayImage::from_pixel(48, 64, Luma([255]));
        let mut rng = StdRng::seed_from_u64(7);

        let sample = generator.generate_image(&mask, &mut rng);

        assert_eq!(sample.signal.dimensions(), (48, 64));
        assert_eq!(sample.label.dimensions(), (48, 64));
        assert!(!sample.report.lesions.is_empty());
    }

    #[test]
    fn test_blank_mask_produces_zero_outputs() {
        let generator = So2Generator::new();
        // Полностью чёрная маска: сосудов нет, оба растра нулевые
        let mask = GrayImage::from_pixel(32, 32, Luma([0]));
        let mut rng = StdRng::seed_from_u64(3);

        let sample = generator.generate_image(&mask, &mut rng);

        assert!(sample.signal.pixels().all(|p| p.0[0] == 0));
        assert!(sample.label.pixels().all(|p| p.0[0] == 0));
    }
}
