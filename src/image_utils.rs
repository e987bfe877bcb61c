use image::{DynamicImage, GenericImageView, GrayImage, Luma, RgbImage, imageops::FilterType};
use imageproc::filter::gaussian_blur_f32;
use ndarray::Array2;

use crate::error::{ForensicsError, Result};

pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Discrete Laplacian: centre 8, the eight neighbours -1.
pub const LAPLACIAN_KERNEL: [[f64; 3]; 3] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 8.0, -1.0],
    [-1.0, -1.0, -1.0],
];

const RESIZE_FILTER: FilterType = FilterType::Triangle;

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes).map_err(ForensicsError::Decode)?;
    let (width, height) = image.dimensions();

    if width == 0 || height == 0 {
        return Err(ForensicsError::EmptyImage { width, height });
    }

    Ok(image)
}

/// Size that fits inside `max_dimension` x `max_dimension` with the aspect
/// ratio kept. Never larger than the input.
pub fn working_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let scale = max_dimension as f64 / width.max(height) as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
    (w, h)
}

/// Interleaved 8-bit RGB pixels at working resolution. Alpha is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImageBuffer {
    image: RgbImage,
}

impl RawImageBuffer {
    pub fn from_bytes(bytes: &[u8], max_dimension: u32) -> Result<Self> {
        let decoded = decode_image(bytes)?;
        Self::from_image(&decoded, max_dimension)
    }

    pub fn from_image(image: &DynamicImage, max_dimension: u32) -> Result<Self> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ForensicsError::EmptyImage { width, height });
        }

        let (target_w, target_h) = working_dimensions(width, height, max_dimension);
        Ok(Self::aligned(image, target_w, target_h))
    }

    /// Brings any image to exactly `width` x `height` RGB.
    pub fn aligned(image: &DynamicImage, width: u32, height: u32) -> Self {
        let rgb = if image.dimensions() == (width, height) {
            image.to_rgb8()
        } else {
            image.resize_exact(width, height, RESIZE_FILTER).to_rgb8()
        };

        Self { image: rgb }
    }

    pub fn from_rgb(image: RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ForensicsError::EmptyImage { width, height });
        }

        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn luma(&self) -> Array2<f64> {
        rgb_to_luma(&self.image)
    }

    /// R, G and B planes as separate sample vectors, row-major.
    pub fn channels(&self) -> [Vec<f64>; 3] {
        let len = self.width() as usize * self.height() as usize;
        let mut planes = [
            Vec::with_capacity(len),
            Vec::with_capacity(len),
            Vec::with_capacity(len),
        ];

        for pixel in self.image.as_raw().chunks_exact(3) {
            for (plane, &value) in planes.iter_mut().zip(pixel) {
                plane.push(value as f64);
            }
        }

        planes
    }

    pub fn blurred(&self, sigma: f32) -> Self {
        Self {
            image: gaussian_blur_f32(&self.image, sigma),
        }
    }

    pub fn high_pass_luma(&self) -> Array2<f64> {
        convolve3x3(&self.luma(), &LAPLACIAN_KERNEL)
    }
}

pub fn rgb_to_luma(image: &RgbImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut luma = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        luma[[y as usize, x as usize]] = LUMA_WEIGHTS[0] * pixel[0] as f64
            + LUMA_WEIGHTS[1] * pixel[1] as f64
            + LUMA_WEIGHTS[2] * pixel[2] as f64;
    }

    luma
}

/// 3x3 convolution with edge samples replicated past the border.
pub fn convolve3x3(field: &Array2<f64>, kernel: &[[f64; 3]; 3]) -> Array2<f64> {
    let (height, width) = field.dim();
    let mut result = Array2::zeros((height, width));

    if height == 0 || width == 0 {
        return result;
    }

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;

            for (ky, row) in kernel.iter().enumerate() {
                let sy = (y + ky).saturating_sub(1).min(height - 1);
                for (kx, weight) in row.iter().enumerate() {
                    let sx = (x + kx).saturating_sub(1).min(width - 1);
                    sum += field[[sy, sx]] * weight;
                }
            }

            result[[y, x]] = sum;
        }
    }

    result
}

/// Min-max stretch of a field into an 8-bit image; flat fields map to black.
pub fn field_to_gray(field: &Array2<f64>) -> GrayImage {
    let (height, width) = field.dim();
    let min = field.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = field.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let mut image = GrayImage::new(width as u32, height as u32);

    if !(range > 1e-10) {
        return image;
    }

    for ((y, x), &value) in field.indexed_iter() {
        let scaled = ((value - min) / range * 255.0).clamp(0.0, 255.0) as u8;
        image.put_pixel(x as u32, y as u32, Luma([scaled]));
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    #[test]
    fn working_dimensions_keep_aspect_ratio() {
        assert_eq!(working_dimensions(1024, 512, 256), (256, 128));
        assert_eq!(working_dimensions(300, 900, 256), (85, 256));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        assert_eq!(working_dimensions(40, 30, 256), (40, 30));
        assert_eq!(working_dimensions(256, 256, 256), (256, 256));
    }

    #[test]
    fn normalization_caps_resolution_and_drops_alpha() {
        let rgba = RgbaImage::from_pixel(600, 300, Rgba([10, 20, 30, 0]));
        let buffer = RawImageBuffer::from_image(&DynamicImage::ImageRgba8(rgba), 256).unwrap();

        assert_eq!(buffer.dimensions(), (256, 128));
        assert_eq!(buffer.as_raw().len(), 256 * 128 * 3);
        assert_eq!(&buffer.as_raw()[..3], &[10, 20, 30]);
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let empty = DynamicImage::new_rgb8(0, 0);
        let err = RawImageBuffer::from_image(&empty, 256).unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = RawImageBuffer::from_bytes(b"definitely not an image", 256).unwrap_err();
        assert!(matches!(err, ForensicsError::Decode(_)));
    }

    #[test]
    fn luma_uses_fixed_weights() {
        let img = RgbImage::from_pixel(2, 1, Rgb([100, 200, 50]));
        let luma = rgb_to_luma(&img);
        let expected = 0.299 * 100.0 + 0.587 * 200.0 + 0.114 * 50.0;
        assert_eq!(luma.dim(), (1, 2));
        assert!((luma[[0, 1]] - expected).abs() < 1e-12);
    }

    #[test]
    fn channel_planes_match_pixels() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([1, 2, 3]));
        img.put_pixel(1, 0, Rgb([4, 5, 6]));
        let [r, g, b] = RawImageBuffer::from_rgb(img).unwrap().channels();
        assert_eq!(r, vec![1.0, 4.0]);
        assert_eq!(g, vec![2.0, 5.0]);
        assert_eq!(b, vec![3.0, 6.0]);
    }

    #[test]
    fn channel_planes_are_sized_to_pixel_count() {
        let img = RgbImage::from_fn(300, 7, |x, y| Rgb([x as u8, y as u8, 9]));
        let planes = RawImageBuffer::from_rgb(img).unwrap().channels();
        for plane in &planes {
            assert_eq!(plane.len(), 300 * 7);
        }
    }

    #[test]
    fn laplacian_of_flat_field_is_zero() {
        let field = Array2::from_elem((6, 9), 77.0);
        let lap = convolve3x3(&field, &LAPLACIAN_KERNEL);
        assert!(lap.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn laplacian_responds_to_isolated_peak() {
        let mut field = Array2::<f64>::zeros((5, 5));
        field[[2, 2]] = 1.0;
        let lap = convolve3x3(&field, &LAPLACIAN_KERNEL);
        assert_eq!(lap[[2, 2]], 8.0);
        assert_eq!(lap[[1, 1]], -1.0);
        assert_eq!(lap[[0, 0]], 0.0);
    }

    #[test]
    fn flat_field_maps_to_black() {
        let gray = field_to_gray(&Array2::from_elem((3, 3), 5.0));
        assert!(gray.pixels().all(|p| p[0] == 0));
    }
}
