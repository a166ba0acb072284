//! Media relay backed by Cloudinary's upload API.
//!
//! Implements [`photoshare_core::relay::MediaRelay`] by forwarding the file
//! as a signed multipart upload and returning the asset's `secure_url`.

mod cloudinary;

pub mod error;

pub use cloudinary::{CloudinaryConfig, CloudinaryRelay, SignatureAlgorithm, sign};
pub use error::{Error, Result};
