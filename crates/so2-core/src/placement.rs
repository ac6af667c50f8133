//! Модуль размещения очагов поражения
//!
//! Выбор количества и центров очагов с ограничением минимального
//! попарного расстояния, с приоритетом сосудистых пикселей

use nalgebra::Point2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::masking::VesselMask;

/// Конфигурация размещения очагов
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Диапазон количества очагов (включительно)
    pub num_lesions: (u32, u32),
    /// Минимальное расстояние между центрами; None = min(h, w) / 6
    pub min_distance: Option<f32>,
    /// Делитель отступа от краёв при посадке вне сосудов
    pub margin_divisor: u32,
    /// Максимум попыток rejection sampling для одного центра
    pub max_attempts: u32,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            num_lesions: (1, 3),
            min_distance: None,
            margin_divisor: 5,
            max_attempts: 50,
        }
    }
}

/// Результат одной попытки посадки центра
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Центр успешно размещён
    Placed(Point2<f32>),
    /// Допустимая точка не найдена, очаг пропускается
    GaveUp,
}

/// Размещатель очагов
pub struct LesionPlacer {
    config: PlacerConfig,
}

impl LesionPlacer {
    /// Создание размещателя
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Эффективное минимальное расстояние для маски данного размера
    pub fn min_distance(&self, mask: &VesselMask) -> f32 {
        self.config
            .min_distance
            .unwrap_or(mask.min_dim() as f32 / 6.0)
    }

    /// Выбор центров очагов.
    ///
    /// Возвращает от 1 до k центров; часть центров может быть отброшена,
    /// если допустимой точки не нашлось (деградация, а не ошибка).
    /// Все попарные расстояния в результате не меньше минимального.
    pub fn place<R: Rng>(&self, rng: &mut R, mask: &VesselMask) -> Vec<Point2<f32>> {
        let (lo, hi) = self.config.num_lesions;
        let k = rng.gen_range(lo..=hi.max(lo));
        let min_dist = self.min_distance(mask);

        let mut centers: Vec<Point2<f32>> = Vec::with_capacity(k as usize);

        for i in 0..k {
            let placement = if i == 0 {
                self.place_first(rng, mask)
            } else {
                self.place_next(rng, mask, &centers, min_dist)
            };

            match placement {
                Placement::Placed(p) => centers.push(p),
                Placement::GaveUp => {
                    log::debug!(
                        "Lesion {}/{} dropped: no point at distance >= {}",
                        i + 1,
                        k,
                        min_dist
                    );
                }
            }
        }

        centers
    }

    /// Первый центр: случайный сосудистый пиксель, иначе точка внутри отступа
    fn place_first<R: Rng>(&self, rng: &mut R, mask: &VesselMask) -> Placement {
        let seeds = mask.seeds();
        if seeds.is_empty() {
            return Placement::Placed(self.random_inset_point(rng, mask));
        }

        let (x, y) = seeds[rng.gen_range(0..seeds.len())];
        Placement::Placed(Point2::new(x as f32, y as f32))
    }

    /// Последующие центры: сначала сосудистые кандидаты с ограничением
    /// расстояния, затем ограниченное число случайных попыток
    fn place_next<R: Rng>(
        &self,
        rng: &mut R,
        mask: &VesselMask,
        placed: &[Point2<f32>],
        min_dist: f32,
    ) -> Placement {
        // 1. Кандидаты среди сосудистых пикселей
        let candidates: Vec<Point2<f32>> = mask
            .seeds()
            .iter()
            .map(|&(x, y)| Point2::new(x as f32, y as f32))
            .filter(|p| nearest_distance(p, placed) >= min_dist)
            .collect();

        if !candidates.is_empty() {
            return Placement::Placed(candidates[rng.gen_range(0..candidates.len())]);
        }

        // 2. Rejection sampling по области с отступом
        for _ in 0..self.config.max_attempts {
            let p = self.random_inset_point(rng, mask);
            if nearest_distance(&p, placed) >= min_dist {
                return Placement::Placed(p);
            }
        }

        Placement::GaveUp
    }

    /// Случайная точка с отступом от краёв растра
    fn random_inset_point<R: Rng>(&self, rng: &mut R, mask: &VesselMask) -> Point2<f32> {
        let (width, height) = mask.dimensions();
        let margin = mask.min_dim() / self.config.margin_divisor.max(1);

        let x = if width > 2 * margin {
            rng.gen_range(margin..=width - margin)
        } else {
            rng.gen_range(0..width)
        };
        let y = if height > 2 * margin {
            rng.gen_range(margin..=height - margin)
        } else {
            rng.gen_range(0..height)
        };

        Point2::new(x as f32, y as f32)
    }
}

/// Расстояние от точки до ближайшего из размещённых центров
fn nearest_distance(p: &Point2<f32>, placed: &[Point2<f32>]) -> f32 {
    placed
        .iter()
        .map(|c| nalgebra::distance(p, c))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::{MaskConfig, MaskProcessor};
    use image::{GrayImage, Luma};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn all_vessel_mask(size: u32) -> VesselMask {
        let img = GrayImage::from_pixel(size, size, Luma([255]));
        MaskProcessor::new(MaskConfig::default()).extract(&img)
    }

    #[test]
    fn test_pairwise_distance_invariant() {
        let mask = all_vessel_mask(120);
        let placer = LesionPlacer::new(PlacerConfig {
            num_lesions: (3, 3),
            min_distance: Some(25.0),
            ..Default::default()
        });

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let centers = placer.place(&mut rng, &mask);

            assert!(!centers.is_empty());
            for i in 0..centers.len() {
                for j in (i + 1)..centers.len() {
                    let d = nalgebra::distance(&centers[i], &centers[j]);
                    assert!(d >= 25.0, "centers {} and {} too close: {}", i, j, d);
                }
            }
        }
    }

    #[test]
    fn test_first_center_prefers_vessels() {
        // Единственный сосудистый пиксель: первый центр всегда на нём
        let mut img = GrayImage::from_pixel(50, 50, Luma([0]));
        img.put_pixel(17, 31, Luma([255]));
        let mask = MaskProcessor::new(MaskConfig::default()).extract(&img);

        let placer = LesionPlacer::new(PlacerConfig {
            num_lesions: (1, 1),
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(1);

        let centers = placer.place(&mut rng, &mask);
        assert_eq!(centers, vec![Point2::new(17.0, 31.0)]);
    }

    #[test]
    fn test_infeasible_separation_degrades() {
        // Расстояние больше диагонали: разместить можно только один очаг
        let mask = all_vessel_mask(40);
        let placer = LesionPlacer::new(PlacerConfig {
            num_lesions: (3, 3),
            min_distance: Some(1000.0),
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(5);

        let centers = placer.place(&mut rng, &mask);
        assert_eq!(centers.len(), 1);
    }

    #[test]
    fn test_placement_without_vessels_uses_inset() {
        // Без сосудов точки берутся из области с отступом от краёв
        let img = GrayImage::from_pixel(100, 100, Luma([0]));
        let mask = MaskProcessor::new(MaskConfig::default()).extract(&img);

        let placer = LesionPlacer::new(PlacerConfig {
            num_lesions: (1, 1),
            ..Default::default()
        });

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let centers = placer.place(&mut rng, &mask);
            assert_eq!(centers.len(), 1);

            let p = centers[0];
            assert!(p.x >= 20.0 && p.x <= 80.0);
            assert!(p.y >= 20.0 && p.y <= 80.0);
        }
    }
}
