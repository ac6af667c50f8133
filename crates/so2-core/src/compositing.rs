//! Модуль композитинга очагов
//!
//! Сведение кандидатных полей всех очагов и базового поля в итоговые
//! растры сигнала и меток:
//! - Сигнал: поэлементный минимум (чем тяжелее ишемия, тем ниже значение)
//! - Метки: поэлементный максимум (побеждает более тяжёлый класс)
//!
//! Асимметрия правил намеренная: пиксель с меткой ядра всегда несёт
//! значение уровня ядра хотя бы одного очага, даже при перекрытиях.

use image::{GrayImage, Luma};

use crate::masking::VesselMask;
use crate::synthesis::{LesionField, LABEL_NORMAL};

/// Сведение базового поля и кандидатных полей очагов
pub fn composite(baseline: &[f32], lesion_fields: &[LesionField]) -> (Vec<f32>, Vec<u8>) {
    let mut signal = baseline.to_vec();
    let mut labels = vec![LABEL_NORMAL; baseline.len()];

    for field in lesion_fields {
        for i in 0..signal.len() {
            signal[i] = signal[i].min(field.values[i]);
            labels[i] = labels[i].max(field.labels[i]);
        }
    }

    (signal, labels)
}

/// Финализация: ограничение диапазона, гейтирование по маске сосудов,
/// приведение сигнала к 8-битному растру. Вне сосудов оба растра равны 0.
pub fn finalize(signal: &[f32], labels: &[u8], mask: &VesselMask) -> (GrayImage, GrayImage) {
    let (width, height) = mask.dimensions();
    let mut signal_img = GrayImage::new(width, height);
    let mut label_img = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            if !mask.is_vessel(x, y) {
                continue;
            }
            let i = (y * width + x) as usize;
            let value = signal[i].clamp(0.0, 255.0) as u8;
            signal_img.put_pixel(x, y, Luma([value]));
            label_img.put_pixel(x, y, Luma([labels[i]]));
        }
    }

    (signal_img, label_img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::{MaskConfig, MaskProcessor};
    use crate::synthesis::{Lesion, So2Synthesizer, SynthesisConfig, LABEL_CORE, LABEL_PENUMBRA};
    use nalgebra::Point2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn synthesizer_without_noise() -> So2Synthesizer {
        So2Synthesizer::new(SynthesisConfig {
            baseline_noise_sigma: 0.0,
            penumbra_noise_sigma: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_overlap_takes_min_signal_and_max_label() {
        let synthesizer = synthesizer_without_noise();
        let mut rng = StdRng::seed_from_u64(4);
        let base_normal = 250.0;

        // Два перекрывающихся очага с разными уровнями ядра
        let a = Lesion {
            center: Point2::new(30.0, 32.0),
            core_radius: 6.0,
            penumbra_width: 6.0,
            core_value: 35.0,
        };
        let b = Lesion {
            center: Point2::new(38.0, 32.0),
            core_radius: 6.0,
            penumbra_width: 6.0,
            core_value: 55.0,
        };

        let fields = vec![
            synthesizer.lesion_field(&mut rng, 64, 64, &a, base_normal),
            synthesizer.lesion_field(&mut rng, 64, 64, &b, base_normal),
        ];
        let baseline = vec![base_normal; 64 * 64];

        let (signal, labels) = composite(&baseline, &fields);

        // Точка (34, 32) лежит в обоих ядрах
        let i = 32 * 64 + 34;
        assert_eq!(signal[i], 35.0);
        assert_eq!(labels[i], LABEL_CORE);

        // Точка в полутени очага A и ядре очага B: метка ядра побеждает
        let j = 32 * 64 + 40;
        assert_eq!(labels[j], LABEL_CORE);
        assert_eq!(signal[j], 55.0_f32.min(fields[0].values[j]));
    }

    #[test]
    fn test_baseline_survives_outside_lesions() {
        let synthesizer = synthesizer_without_noise();
        let mut rng = StdRng::seed_from_u64(6);

        let lesion = Lesion {
            center: Point2::new(10.0, 10.0),
            core_radius: 3.0,
            penumbra_width: 3.0,
            core_value: 40.0,
        };
        let fields = vec![synthesizer.lesion_field(&mut rng, 48, 48, &lesion, 240.0)];
        let baseline = vec![240.0; 48 * 48];

        let (signal, labels) = composite(&baseline, &fields);

        // Дальний угол не затронут очагом
        let i = 47 * 48 + 47;
        assert_eq!(signal[i], 240.0);
        assert_eq!(labels[i], LABEL_NORMAL);
    }

    #[test]
    fn test_finalize_gates_by_vessel_mask() {
        let mut img = image::GrayImage::from_pixel(4, 1, Luma([0]));
        img.put_pixel(1, 0, Luma([255]));
        let mask = MaskProcessor::new(MaskConfig::default()).extract(&img);

        let signal = vec![300.0, 200.0, -5.0, 100.0];
        let labels = vec![LABEL_CORE, LABEL_PENUMBRA, LABEL_NORMAL, LABEL_CORE];

        let (signal_img, label_img) = finalize(&signal, &labels, &mask);

        // Сосудистый пиксель сохраняет значение и метку
        assert_eq!(signal_img.get_pixel(1, 0).0[0], 200);
        assert_eq!(label_img.get_pixel(1, 0).0[0], LABEL_PENUMBRA);

        // Вне сосудов всё обнулено независимо от кандидатов
        for x in [0, 2, 3] {
            assert_eq!(signal_img.get_pixel(x, 0).0[0], 0);
            assert_eq!(label_img.get_pixel(x, 0).0[0], 0);
        }
    }

    #[test]
    fn test_finalize_clamps_signal() {
        let img = image::GrayImage::from_pixel(2, 1, Luma([255]));
        let mask = MaskProcessor::new(MaskConfig::default()).extract(&img);

        let signal = vec![400.0, -20.0];
        let labels = vec![LABEL_NORMAL, LABEL_NORMAL];

        let (signal_img, _) = finalize(&signal, &labels, &mask);

        assert_eq!(signal_img.get_pixel(0, 0).0[0], 255);
        assert_eq!(signal_img.get_pixel(1, 0).0[0], 0);
    }
}
