use std::{collections::BTreeMap, io::Cursor};

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataResult {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub software: Option<String>,
    pub date_time: Option<String>,
    pub all_tags: BTreeMap<String, String>,
}

impl MetadataResult {
    pub fn has_metadata(&self) -> bool {
        !self.all_tags.is_empty()
    }
}

pub struct ExifExtractor;

impl ExifExtractor {
    /// Reads EXIF from any supported container. Unreadable or absent EXIF
    /// yields an empty result rather than an error.
    pub fn extract(bytes: &[u8]) -> MetadataResult {
        let mut reader = Cursor::new(bytes);

        match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif_data) => Self::parse_exif(&exif_data),
            Err(e) => {
                log::debug!("no readable EXIF: {e}");
                MetadataResult::default()
            }
        }
    }

    fn parse_exif(exif: &exif::Exif) -> MetadataResult {
        let all_tags = exif
            .fields()
            .map(|field| (field.tag.to_string(), field.display_value().to_string()))
            .collect();

        let primary = |tag| {
            exif.get_field(tag, exif::In::PRIMARY)
                .map(|f| f.display_value().to_string())
        };

        MetadataResult {
            camera_make: primary(exif::Tag::Make),
            camera_model: primary(exif::Tag::Model),
            software: primary(exif::Tag::Software),
            date_time: primary(exif::Tag::DateTime),
            all_tags,
        }
    }
}

pub fn has_embedded_metadata(bytes: &[u8]) -> bool {
    ExifExtractor::extract(bytes).has_metadata()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    #[test]
    fn garbage_has_no_metadata() {
        assert!(!has_embedded_metadata(b"not an image at all"));
        assert!(!has_embedded_metadata(&[]));
    }

    #[test]
    fn freshly_encoded_png_has_no_metadata() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let result = ExifExtractor::extract(&bytes);
        assert!(!result.has_metadata());
        assert!(result.camera_make.is_none());
    }
}
