//! Image intake for uploads and batch classification.
//!
//! - **validate**: size limit and magic-byte sniffing before decode
//! - **decode**: format detection and decoding under a timeout
//! - **discovery**: find image files in directories
//! - **processor**: validate, decode and classify one image

pub mod decode;
pub mod discovery;
pub mod processor;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{discover, DiscoveredFile};
pub use processor::ImageProcessor;
pub use validate::Validator;
