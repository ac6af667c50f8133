use nalgebra::Point2;

/// Euclidean distance raster from a fixed center.
/// Row-major, pixel-index coordinates, no anisotropic scaling.
pub fn distance_field(width: u32, height: u32, center: Point2<f32>) -> Vec<f32> {
    let mut field = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - center.x;
            let dy = y as f32 - center.y;
            field.push((dx * dx + dy * dy).sqrt());
        }
    }

    field
}

/// Concentric region rasters derived from one lesion's distance field.
/// For every pixel exactly one of the three masks is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMasks {
    /// distance <= core_radius
    pub core: Vec<bool>,
    /// core_radius < distance <= core_radius + penumbra_width
    pub penumbra: Vec<bool>,
    /// distance beyond the penumbra
    pub normal: Vec<bool>,
}

impl RegionMasks {
    /// Classify every pixel by its distance to the lesion center.
    pub fn from_distance_field(field: &[f32], core_radius: f32, penumbra_width: f32) -> Self {
        let outer = core_radius + penumbra_width;
        let mut core = vec![false; field.len()];
        let mut penumbra = vec![false; field.len()];
        let mut normal = vec![false; field.len()];

        for (i, &d) in field.iter().enumerate() {
            if d <= core_radius {
                core[i] = true;
            } else if d <= outer {
                penumbra[i] = true;
            } else {
                normal[i] = true;
            }
        }

        Self {
            core,
            penumbra,
            normal,
        }
    }

    /// Number of core pixels.
    pub fn core_area(&self) -> usize {
        self.core.iter().filter(|&&b| b).count()
    }
}
