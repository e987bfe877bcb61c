pub mod exif;

pub use self::exif::{ExifExtractor, MetadataResult, has_embedded_metadata};
