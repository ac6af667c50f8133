//! Модуль подготовки датасета
//!
//! Утилиты предобработки исходных масок перед симуляцией:
//! - Пакетное масштабирование с дополнением чёрным до исходного размера
//! - Переименование по префиксу с четырёхзначным индексом
//! - Аугментация поворотами и зеркалированием

use image::imageops::{self, FilterType};
use image::GrayImage;
use std::path::Path;

use crate::batch::list_image_files;

/// Масштабирование изображений с сохранением размера холста.
///
/// Каждое изображение уменьшается в scale_factor раз и размещается по
/// центру чёрного холста исходного размера. Обрабатываются файлы с
/// индексами start_idx..=end_idx в отсортированном списке каталога.
/// Выходные файлы именуются как `{базовое имя}_{индекс+1:04}.png`.
pub fn rescale(
    from_dir: &Path,
    to_dir: &Path,
    scale_factor: f32,
    start_idx: usize,
    end_idx: usize,
) -> anyhow::Result<usize> {
    std::fs::create_dir_all(to_dir)?;
    let files = list_image_files(from_dir)?;

    let end = end_idx.min(files.len().saturating_sub(1));
    let mut written = 0;

    for i in start_idx..=end {
        let Some(path) = files.get(i) else { break };

        let img = match image::open(path) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                log::warn!("Skipping unreadable image {:?}: {}", path, e);
                continue;
            }
        };

        let (w, h) = img.dimensions();
        let new_w = ((w as f32 * scale_factor) as u32).max(1);
        let new_h = ((h as f32 * scale_factor) as u32).max(1);
        let resized = imageops::resize(&img, new_w, new_h, FilterType::Triangle);

        // Чёрный холст исходного размера, уменьшенная маска по центру
        let mut canvas = GrayImage::new(w, h);
        let off_x = (w.saturating_sub(new_w) / 2) as i64;
        let off_y = (h.saturating_sub(new_h) / 2) as i64;
        imageops::overlay(&mut canvas, &resized, off_x, off_y);

        let base = file_base(path);
        canvas.save(to_dir.join(format!("{}_{:04}.png", base, i + 1)))?;
        written += 1;
    }

    Ok(written)
}

/// Переименование изображений каталога в формат `{prefix}_0001.png`
/// в порядке сортировки имён.
pub fn rename(from_dir: &Path, to_dir: &Path, prefix: &str) -> anyhow::Result<usize> {
    std::fs::create_dir_all(to_dir)?;
    let files = list_image_files(from_dir)?;

    let mut written = 0;
    for (i, path) in files.iter().enumerate() {
        let img = match image::open(path) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                log::warn!("Skipping unreadable image {:?}: {}", path, e);
                continue;
            }
        };

        img.save(to_dir.join(format!("{}_{:04}.png", prefix, i + 1)))?;
        written += 1;
    }

    Ok(written)
}

/// Аугментация поворотами на 0/90/180/270 градусов и горизонтальным
/// зеркалированием. Из одной маски получается 8 вариантов с суффиксами
/// `_rot{угол}` и `_rot{угол}_mirrored`.
pub fn mirror_and_rotate(from_dir: &Path, to_dir: &Path) -> anyhow::Result<usize> {
    std::fs::create_dir_all(to_dir)?;
    let files = list_image_files(from_dir)?;

    let mut written = 0;
    for path in &files {
        let img = match image::open(path) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                log::warn!("Skipping unreadable image {:?}: {}", path, e);
                continue;
            }
        };
        let base = file_base(path);

        for angle in [0u32, 90, 180, 270] {
            let rotated = match angle {
                90 => imageops::rotate90(&img),
                180 => imageops::rotate180(&img),
                270 => imageops::rotate270(&img),
                _ => img.clone(),
            };
            rotated.save(to_dir.join(format!("{}_rot{}.png", base, angle)))?;

            let mirrored = imageops::flip_horizontal(&rotated);
            mirrored.save(to_dir.join(format!("{}_rot{}_mirrored.png", base, angle)))?;

            written += 2;
        }
    }

    Ok(written)
}

fn file_base(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_base() {
        assert_eq!(file_base(Path::new("data/Mask_0001.png")), "Mask_0001");
        assert_eq!(file_base(Path::new("scan.final.jpg")), "scan.final");
    }
}
