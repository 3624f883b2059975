//! Pipeline stages for a single enhancement.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ (prompts) ──▶ remote
//! (file)    (base64)   (instruction)  (generateContent)
//! ```
//!
//! 1. [`input`]: read the user's file and declare its media type
//! 2. [`encode`]: base64-wrap the bytes into an [`encode::EncodedImage`]
//! 3. [`remote`]: one request to the image model, extract the first inline
//!    image; the only stage with network I/O

pub mod encode;
pub mod input;
pub mod remote;
