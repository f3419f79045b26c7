//! PNG previews of rendered labels.
//!
//! A preview is the undithered surface (grayscale anti-aliasing intact) with
//! the cut guides drawn, encoded as PNG. [`Preview::data_uri`] gives the
//! `data:` URI form a web front-end can drop straight into an `<img>`.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};

use crate::error::Result;

/// An encoded preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Preview {
    /// Encode `image` as PNG.
    pub fn encode(image: &RgbaImage) -> Result<Self> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png,
        })
    }

    /// `data:image/png;base64,...`
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BLACK, WHITE};

    #[test]
    fn test_encode_produces_png() {
        let preview = Preview::encode(&RgbaImage::from_pixel(384, 20, WHITE)).unwrap();
        assert_eq!(&preview.png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!((preview.width, preview.height), (384, 20));
    }

    #[test]
    fn test_data_uri_prefix() {
        let preview = Preview::encode(&RgbaImage::from_pixel(4, 4, BLACK)).unwrap();
        let uri = preview.data_uri();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_png_decodes_back() {
        let mut img = RgbaImage::from_pixel(6, 3, WHITE);
        img.put_pixel(2, 1, BLACK);
        let preview = Preview::encode(&img).unwrap();
        let decoded = image::load_from_memory(&preview.png).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }
}
