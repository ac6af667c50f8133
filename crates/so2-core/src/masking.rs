//! Модуль обработки сосудистых масок
//!
//! Подготовка входной маски к симуляции:
//! - Бинаризация (порог присутствия сосуда)
//! - Выделение координат вероятных сосудистых пикселей для посадки очагов

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Конфигурация обработки маски
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskConfig {
    /// Порог бинаризации: пиксель ярче порога считается сосудом
    pub binary_threshold: u8,
    /// Порог выбора точек посадки очагов (строже порога бинаризации)
    pub seed_threshold: u8,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 10,
            seed_threshold: 20,
        }
    }
}

/// Бинаризованная сосудистая маска
#[derive(Debug, Clone)]
pub struct VesselMask {
    width: u32,
    height: u32,
    /// 0 или 1 на пиксель, row-major
    binary: Vec<u8>,
    /// Координаты (x, y) пикселей ярче seed_threshold
    seeds: Vec<(u32, u32)>,
}

impl VesselMask {
    /// Размеры маски (ширина, высота)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Меньшая из сторон маски
    pub fn min_dim(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Принадлежит ли пиксель сосуду
    pub fn is_vessel(&self, x: u32, y: u32) -> bool {
        self.binary[(y * self.width + x) as usize] == 1
    }

    /// Точки посадки очагов
    pub fn seeds(&self) -> &[(u32, u32)] {
        &self.seeds
    }
}

/// Процессор сосудистых масок
pub struct MaskProcessor {
    config: MaskConfig,
}

impl MaskProcessor {
    /// Создание процессора с конфигурацией
    pub fn new(config: MaskConfig) -> Self {
        Self { config }
    }

    /// Бинаризация маски и сбор точек посадки
    pub fn extract(&self, img: &GrayImage) -> VesselMask {
        let (width, height) = img.dimensions();
        let mut binary = Vec::with_capacity((width * height) as usize);
        let mut seeds = Vec::new();

        for (x, y, p) in img.enumerate_pixels() {
            let value = p.0[0];
            binary.push(if value > self.config.binary_threshold { 1 } else { 0 });
            if value > self.config.seed_threshold {
                seeds.push((x, y));
            }
        }

        VesselMask {
            width,
            height,
            binary,
            seeds,
        }
    }
}
