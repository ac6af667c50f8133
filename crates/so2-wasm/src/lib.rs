//! WASM bindings для генератора SO2
//!
//! Предоставляет JavaScript API для генерации симулированных карт SO2
//! и меток сегментации по сосудистой маске

use image::GrayImage;
use serde::Serialize;
use so2_core::{
    MaskConfig, PlacerConfig, SimulationReport, So2Generator, SynthesisConfig,
};
use wasm_bindgen::prelude::*;

/// Инициализация panic hook для отладки
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("SO2 generator WASM module initialized");
}

/// Результат генерации, передаваемый в JavaScript
#[derive(Serialize)]
struct WasmSample {
    /// PNG-кодированная карта SO2
    signal_png: Vec<u8>,
    /// PNG-кодированный растр меток
    label_png: Vec<u8>,
    /// Реализованные параметры симуляции
    report: SimulationReport,
}

/// JavaScript-доступный генератор SO2
#[wasm_bindgen]
pub struct WasmSo2Generator {
    generator: So2Generator,
}

#[wasm_bindgen]
impl WasmSo2Generator {
    /// Создание генератора с настройками по умолчанию
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            generator: So2Generator::new(),
        }
    }

    /// Создание генератора с пользовательскими настройками
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(
        binary_threshold: u8,
        seed_threshold: u8,
        min_lesions: u32,
        max_lesions: u32,
        baseline_noise_sigma: f32,
        penumbra_noise_sigma: f32,
    ) -> Self {
        let mask = MaskConfig {
            binary_threshold,
            seed_threshold,
        };
        let placer = PlacerConfig {
            num_lesions: (min_lesions, max_lesions),
            ..Default::default()
        };
        let synthesis = SynthesisConfig {
            baseline_noise_sigma,
            penumbra_noise_sigma,
            ..Default::default()
        };

        Self {
            generator: So2Generator::with_config(mask, placer, synthesis),
        }
    }

    /// Генерация по байтам изображения маски (PNG, JPEG)
    ///
    /// @param mask_data - Uint8Array с данными изображения
    /// @returns Object с PNG-кодированными картой SO2 и метками
    #[wasm_bindgen(js_name = generateImage)]
    pub fn generate_image(&self, mask_data: &[u8]) -> Result<JsValue, JsError> {
        let img = image::load_from_memory(mask_data)
            .map_err(|e| JsError::new(&e.to_string()))?
            .to_luma8();

        self.generate_from_gray(&img)
    }

    /// Генерация по ImageData из Canvas
    ///
    /// @param data - Uint8ClampedArray из canvas.getImageData()
    /// @param width - Ширина изображения
    /// @param height - Высота изображения
    #[wasm_bindgen(js_name = generateImageData)]
    pub fn generate_image_data(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<JsValue, JsError> {
        // Конвертируем RGBA в Grayscale
        let gray = rgba_to_gray(data, width, height);

        let img = match GrayImage::from_raw(width, height, gray) {
            Some(img) => img,
            None => return Err(JsError::new("Failed to create image from data")),
        };

        self.generate_from_gray(&img)
    }

    fn generate_from_gray(&self, img: &GrayImage) -> Result<JsValue, JsError> {
        let mut rng = rand::thread_rng();
        let sample = self.generator.generate_image(img, &mut rng);

        let result = WasmSample {
            signal_png: encode_png(&sample.signal)?,
            label_png: encode_png(&sample.label)?,
            report: sample.report,
        };

        serde_wasm_bindgen::to_value(&result).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmSo2Generator {
    fn default() -> Self {
        Self::new()
    }
}

/// Удобная функция для быстрой генерации с настройками по умолчанию
#[wasm_bindgen(js_name = quickGenerate)]
pub fn quick_generate(mask_data: &[u8]) -> Result<JsValue, JsError> {
    let generator = WasmSo2Generator::new();
    generator.generate_image(mask_data)
}

/// Информация о версии
#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// PNG-кодирование растра
fn encode_png(img: &GrayImage) -> Result<Vec<u8>, JsError> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(buf.into_inner())
}

/// Конвертация RGBA в Grayscale
fn rgba_to_gray(rgba: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut gray = Vec::with_capacity(pixel_count);

    for i in 0..pixel_count {
        let offset = i * 4;
        if offset + 2 < rgba.len() {
            let r = rgba[offset] as f32;
            let g = rgba[offset + 1] as f32;
            let b = rgba[offset + 2] as f32;
            // ITU-R BT.601 luma formula
            let luma = (0.299 * r + 0.587 * g + 0.114 * b) as u8;
            gray.push(luma);
        }
    }

    gray
}
