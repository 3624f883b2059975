//! Image encoding: raw bytes → base64 payload wrapped in [`EncodedImage`].
//!
//! The Gemini API takes inline images as a bare base64 string plus a
//! separate `mimeType` field. Some gateways echo a full data URI back in
//! that field, so [`strip_data_uri_prefix`] removes the `data:…;base64,`
//! header whenever one is present.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A user-supplied image ready for transmission.
///
/// Built once per upload and never mutated; a new upload replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Standard base64, no media-type prefix.
    pub payload: String,
    /// Declared MIME type, e.g. `image/png`.
    pub media_type: String,
    /// Original file name; only used to name the downloaded result.
    pub display_name: String,
}

impl EncodedImage {
    /// `data:<media_type>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.payload)
    }
}

/// Encode an in-memory image buffer.
pub fn encode_bytes(
    bytes: &[u8],
    media_type: impl Into<String>,
    display_name: impl Into<String>,
) -> EncodedImage {
    let payload = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", payload.len());

    EncodedImage {
        payload,
        media_type: media_type.into(),
        display_name: display_name.into(),
    }
}

/// Drop a leading `data:<type>;base64,` header, if any.
pub fn strip_data_uri_prefix(text: &str) -> &str {
    match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload).unwrap_or(text),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn encode_small_png_round_trips() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("png encode");

        let data = encode_bytes(&buf, "image/png", "red.png");
        assert_eq!(data.media_type, "image/png");
        assert_eq!(data.display_name, "red.png");
        let decoded = STANDARD.decode(&data.payload).expect("valid base64");
        assert_eq!(decoded, buf);
    }

    #[test]
    fn strips_transport_prefix() {
        assert_eq!(strip_data_uri_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_uri_prefix("data:broken"), "data:broken");
    }

    #[test]
    fn data_uri_has_no_double_prefix() {
        let data = encode_bytes(b"hi", "image/webp", "a.webp");
        assert_eq!(data.to_data_uri(), "data:image/webp;base64,aGk=");
    }
}
