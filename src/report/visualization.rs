use std::path::Path;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use ndarray::Array2;

use crate::{
    HybridAnalysis,
    detection::fusion::ScoreBreakdown,
    error::{ForensicsError, Result},
    image_utils::field_to_gray,
};

#[derive(Debug, Clone, Copy)]
pub enum ColorScheme {
    HeatMap,
    Grayscale,
}

#[derive(Debug, Clone)]
pub struct VisualizationConfig {
    pub color_scheme: ColorScheme,
    pub bar_width: u32,
    pub bar_gap: u32,
    pub chart_height: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::HeatMap,
            bar_width: 40,
            bar_gap: 16,
            chart_height: 220,
        }
    }
}

/// Bar colours, in `ScoreBreakdown::entries` order.
const BAR_COLORS: [Rgb<u8>; 6] = [
    Rgb([231, 76, 60]),
    Rgb([52, 152, 219]),
    Rgb([46, 204, 113]),
    Rgb([241, 196, 15]),
    Rgb([155, 89, 182]),
    Rgb([149, 165, 166]),
];

const CHART_BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);
const GRID_COLOR: Rgb<u8> = Rgb([70, 70, 70]);

pub struct Visualizer {
    config: VisualizationConfig,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            config: VisualizationConfig::default(),
        }
    }

    pub fn with_config(config: VisualizationConfig) -> Self {
        Self { config }
    }

    pub fn create_heatmap(&self, gray: &GrayImage) -> RgbImage {
        let (width, height) = gray.dimensions();
        let mut heatmap = RgbImage::new(width, height);

        for (x, y, pixel) in gray.enumerate_pixels() {
            let intensity = pixel[0] as f32 / 255.0;
            heatmap.put_pixel(x, y, self.intensity_to_color(intensity));
        }

        heatmap
    }

    /// Heatmap of a residual or error field, stretched to its own range.
    pub fn field_heatmap(&self, field: &Array2<f64>) -> RgbImage {
        self.create_heatmap(&field_to_gray(field))
    }

    fn intensity_to_color(&self, intensity: f32) -> Rgb<u8> {
        let intensity = intensity.clamp(0.0, 1.0);

        let (r, g, b) = match self.config.color_scheme {
            ColorScheme::HeatMap => {
                if intensity < 0.25 {
                    (0.0, intensity / 0.25, 1.0)
                } else if intensity < 0.5 {
                    (0.0, 1.0, 1.0 - (intensity - 0.25) / 0.25)
                } else if intensity < 0.75 {
                    ((intensity - 0.5) / 0.25, 1.0, 0.0)
                } else {
                    (1.0, 1.0 - (intensity - 0.75) / 0.25, 0.0)
                }
            }
            ColorScheme::Grayscale => (intensity, intensity, intensity),
        };

        Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
    }

    /// One bar per breakdown component, height proportional to 0..100.
    pub fn breakdown_chart(&self, breakdown: &ScoreBreakdown) -> RgbImage {
        let entries = breakdown.entries();
        let VisualizationConfig {
            bar_width,
            bar_gap,
            chart_height,
            ..
        } = self.config;

        let margin = bar_gap;
        let width = entries.len() as u32 * (bar_width + bar_gap) + bar_gap + margin;
        let height = chart_height + 2 * margin;
        let baseline = margin + chart_height;

        let mut chart = RgbImage::from_pixel(width, height, CHART_BACKGROUND);

        for step in 0..=4u32 {
            let y = baseline - chart_height * step / 4;
            draw_filled_rect_mut(
                &mut chart,
                Rect::at(margin as i32, y as i32).of_size(width - 2 * margin, 1),
                GRID_COLOR,
            );
        }

        for (i, ((_, value), color)) in entries.iter().zip(BAR_COLORS).enumerate() {
            let bar_height = ((value.clamp(0.0, 100.0) / 100.0) * chart_height as f64).round() as u32;
            if bar_height == 0 {
                continue;
            }

            let x = margin + bar_gap / 2 + i as u32 * (bar_width + bar_gap);
            draw_filled_rect_mut(
                &mut chart,
                Rect::at(x as i32, (baseline - bar_height) as i32).of_size(bar_width, bar_height),
                color,
            );
        }

        chart
    }

    pub fn create_comparison(&self, images: &[&RgbImage]) -> RgbImage {
        if images.is_empty() {
            return RgbImage::new(1, 1);
        }

        let padding = 10u32;
        let max_height = images.iter().map(|img| img.height()).max().unwrap_or(0);
        let total_width =
            images.iter().map(|img| img.width()).sum::<u32>() + padding * (images.len() as u32 + 1);
        let total_height = max_height + padding * 2;

        let mut result = RgbImage::from_pixel(total_width, total_height, Rgb([40, 40, 40]));

        let mut x_offset = padding;
        for img in images {
            image::imageops::replace(&mut result, *img, x_offset as i64, padding as i64);
            x_offset += img.width() + padding;
        }

        result
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AnalysisVisualization {
    pub residual: RgbImage,
    pub recompression_error: RgbImage,
    pub breakdown: RgbImage,
    /// Residual and recompression heatmaps side by side.
    pub overview: RgbImage,
}

impl AnalysisVisualization {
    pub fn render(analysis: &HybridAnalysis, visualizer: &Visualizer) -> Self {
        let residual = visualizer.field_heatmap(&analysis.local.residual_map);
        let recompression_error = visualizer.field_heatmap(&analysis.local.error_map);
        let overview = visualizer.create_comparison(&[&residual, &recompression_error]);

        Self {
            residual,
            recompression_error,
            breakdown: visualizer.breakdown_chart(&analysis.result.breakdown),
            overview,
        }
    }

    pub fn save_all<P: AsRef<Path>>(&self, directory: P) -> Result<()> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory)?;

        let outputs = [
            ("residual.png", &self.residual),
            ("recompression_error.png", &self.recompression_error),
            ("breakdown.png", &self.breakdown),
            ("overview.png", &self.overview),
        ];

        for (name, image) in outputs {
            image
                .save(directory.join(name))
                .map_err(ForensicsError::Write)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(values: [f64; 6]) -> ScoreBreakdown {
        ScoreBreakdown {
            sightengine: values[0],
            frequency: values[1],
            noise: values[2],
            compression: values[3],
            color: values[4],
            metadata: values[5],
        }
    }

    #[test]
    fn full_bar_reaches_top_of_chart() {
        let visualizer = Visualizer::new();
        let chart = visualizer.breakdown_chart(&breakdown([100.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        let cfg = VisualizationConfig::default();

        let x = cfg.bar_gap + cfg.bar_gap / 2 + cfg.bar_width / 2;
        let top = cfg.bar_gap + 1;
        assert_eq!(*chart.get_pixel(x, top), BAR_COLORS[0]);
    }

    #[test]
    fn empty_bar_leaves_background() {
        let visualizer = Visualizer::new();
        let chart = visualizer.breakdown_chart(&breakdown([0.0; 6]));
        let cfg = VisualizationConfig::default();

        let x = cfg.bar_gap + cfg.bar_gap / 2 + cfg.bar_width / 2;
        let y = cfg.bar_gap + cfg.chart_height / 2 + 3;
        assert_eq!(*chart.get_pixel(x, y), CHART_BACKGROUND);
    }

    #[test]
    fn heatmap_keeps_field_shape() {
        let field = Array2::from_shape_fn((12, 20), |(y, x)| (x + y) as f64);
        let heatmap = Visualizer::new().field_heatmap(&field);
        assert_eq!(heatmap.dimensions(), (20, 12));
    }

    #[test]
    fn grayscale_scheme_is_neutral() {
        let visualizer = Visualizer::with_config(VisualizationConfig {
            color_scheme: ColorScheme::Grayscale,
            ..VisualizationConfig::default()
        });
        let c = visualizer.intensity_to_color(0.5);
        assert_eq!(c[0], c[1]);
        assert_eq!(c[1], c[2]);
    }

    #[test]
    fn comparison_stacks_side_by_side() {
        let a = RgbImage::new(10, 8);
        let b = RgbImage::new(6, 12);
        let combined = Visualizer::new().create_comparison(&[&a, &b]);
        assert_eq!(combined.dimensions(), (10 + 6 + 30, 12 + 20));
    }

    fn rendered() -> AnalysisVisualization {
        let visualizer = Visualizer::new();
        let field = Array2::from_shape_fn((16, 24), |(y, x)| (x * y) as f64);
        let residual = visualizer.field_heatmap(&field);
        let recompression_error = visualizer.field_heatmap(&field);
        let overview = visualizer.create_comparison(&[&residual, &recompression_error]);

        AnalysisVisualization {
            residual,
            recompression_error,
            breakdown: visualizer.breakdown_chart(&breakdown([0.0, 40.0, 60.0, 20.0, 80.0, 10.0])),
            overview,
        }
    }

    #[test]
    fn save_all_writes_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        rendered().save_all(dir.path()).unwrap();

        for name in ["residual.png", "recompression_error.png", "breakdown.png", "overview.png"] {
            assert!(dir.path().join(name).is_file(), "{name} missing");
        }
    }

    #[test]
    fn unwritable_chart_path_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("residual.png")).unwrap();

        let err = rendered().save_all(dir.path()).unwrap_err();

        assert!(matches!(err, ForensicsError::Write(_)));
        assert!(!err.is_decode_failure());
    }
}
