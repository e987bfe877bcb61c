pub mod color;
pub mod combiner;
pub mod compression;
pub mod noise;
pub mod spectrum;
