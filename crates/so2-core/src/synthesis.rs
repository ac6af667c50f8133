//! Модуль синтеза значений SO2
//!
//! Назначение значений сигнала и меток по регионам очага:
//! - Ядро: константное низкое значение
//! - Полутень: линейный градиент от уровня ядра к норме с гауссовым шумом
//! - Базовое поле нормальной ткани с небольшим шумом

use nalgebra::Point2;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::distance::{distance_field, RegionMasks};

/// Значение-заглушка для пикселей, не назначенных очагом.
/// Композитинг берёт поэлементный минимум, поэтому заглушка никогда
/// не попадает в итоговый растр: базовое поле определено всюду.
pub(crate) const UNSET: f32 = f32::MAX;

/// Метка фона (вне сосудов)
pub const LABEL_BACKGROUND: u8 = 0;
/// Метка нормальной ткани
pub const LABEL_NORMAL: u8 = 1;
/// Метка полутени
pub const LABEL_PENUMBRA: u8 = 2;
/// Метка ядра инфаркта
pub const LABEL_CORE: u8 = 3;

/// Конфигурация синтеза значений
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Радиус ядра как доля min(h, w)
    pub core_radius_frac: (f32, f32),
    /// Ширина полутени как доля min(h, w)
    pub penumbra_width_frac: (f32, f32),
    /// Диапазон SO2 нормальной ткани
    pub normal_value: (f32, f32),
    /// Справочный диапазон SO2 полутени; в формуле не участвует,
    /// полутень рассчитывается градиентом от ядра к норме
    pub penumbra_value: (f32, f32),
    /// Диапазон SO2 ядра инфаркта
    pub core_value: (f32, f32),
    /// Сигма шума базового поля (0 отключает шум)
    pub baseline_noise_sigma: f32,
    /// Сигма шума полутени (0 отключает шум)
    pub penumbra_noise_sigma: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            core_radius_frac: (1.0 / 20.0, 1.0 / 12.0),
            penumbra_width_frac: (1.0 / 10.0, 1.0 / 6.0),
            normal_value: (210.0, 255.0),
            penumbra_value: (110.0, 160.0),
            core_value: (30.0, 60.0),
            baseline_noise_sigma: 3.0,
            penumbra_noise_sigma: 5.0,
        }
    }
}

/// Один очаг поражения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesion {
    /// Центр очага (x, y) в пиксельных координатах
    pub center: Point2<f32>,
    /// Радиус ядра инфаркта
    pub core_radius: f32,
    /// Ширина полутени
    pub penumbra_width: f32,
    /// Значение SO2 в ядре
    pub core_value: f32,
}

/// Кандидатное поле одного очага
#[derive(Debug, Clone)]
pub struct LesionField {
    /// Значения сигнала; UNSET вне ядра и полутени
    pub values: Vec<f32>,
    /// Кандидатные метки; 0 вне ядра и полутени
    pub labels: Vec<u8>,
}

/// Синтезатор значений SO2
pub struct So2Synthesizer {
    config: SynthesisConfig,
}

impl So2Synthesizer {
    /// Создание синтезатора
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Однократный розыгрыш базового уровня нормальной ткани.
    /// Уровень общий для всех очагов одного изображения.
    pub fn sample_base_normal<R: Rng>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = self.config.normal_value;
        rng.gen_range(lo..=hi)
    }

    /// Розыгрыш параметров очага для заданного центра
    pub fn sample_lesion<R: Rng>(
        &self,
        rng: &mut R,
        center: Point2<f32>,
        min_dim: u32,
    ) -> Lesion {
        let m = min_dim as f32;
        let (r_lo, r_hi) = self.config.core_radius_frac;
        let (w_lo, w_hi) = self.config.penumbra_width_frac;
        let (c_lo, c_hi) = self.config.core_value;

        Lesion {
            center,
            core_radius: rng.gen_range(m * r_lo..=m * r_hi),
            penumbra_width: rng.gen_range(m * w_lo..=m * w_hi),
            core_value: rng.gen_range(c_lo..=c_hi),
        }
    }

    /// Базовое поле: уровень нормы с небольшим шумом в каждом пикселе
    pub fn baseline<R: Rng>(
        &self,
        rng: &mut R,
        width: u32,
        height: u32,
        base_normal: f32,
    ) -> Vec<f32> {
        let len = (width * height) as usize;
        let sigma = self.config.baseline_noise_sigma;

        let noise = match noise_dist(sigma) {
            Some(n) => n,
            None => return vec![base_normal; len],
        };

        (0..len).map(|_| base_normal + noise.sample(rng)).collect()
    }

    /// Кандидатное поле одного очага, ограниченное его регионами.
    ///
    /// Вне ядра и полутени значение остаётся UNSET, чтобы очаг не влиял
    /// на чужие области при композитинге.
    pub fn lesion_field<R: Rng>(
        &self,
        rng: &mut R,
        width: u32,
        height: u32,
        lesion: &Lesion,
        base_normal: f32,
    ) -> LesionField {
        let field = distance_field(width, height, lesion.center);
        let regions =
            RegionMasks::from_distance_field(&field, lesion.core_radius, lesion.penumbra_width);

        let mut values = vec![UNSET; field.len()];
        let mut labels = vec![LABEL_BACKGROUND; field.len()];

        let noise = noise_dist(self.config.penumbra_noise_sigma);

        // Шум не выводит полутень за уровни ядра и нормы
        let clamp_lo = lesion.core_value.min(base_normal);
        let clamp_hi = lesion.core_value.max(base_normal);

        for i in 0..field.len() {
            if regions.core[i] {
                values[i] = lesion.core_value;
                labels[i] = LABEL_CORE;
            } else if regions.penumbra[i] {
                // Нормированное радиальное расстояние 0..1
                let t = (field[i] - lesion.core_radius) / lesion.penumbra_width;
                let mut v = lesion.core_value + t * (base_normal - lesion.core_value);
                if let Some(n) = &noise {
                    v += n.sample(rng);
                }
                values[i] = v.clamp(clamp_lo, clamp_hi);
                labels[i] = LABEL_PENUMBRA;
            }
        }

        LesionField { values, labels }
    }
}

/// Гауссово распределение шума; None при неположительной сигме
fn noise_dist(sigma: f32) -> Option<Normal<f32>> {
    if sigma > 0.0 {
        Normal::new(0.0, sigma).ok()
    } else {
        None
    }
}
