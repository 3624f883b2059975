//! Shared fixtures for integration tests.

#![allow(dead_code)]

use aethercanvas::{EncodedImage, EnhanceError, EnhancedImage, ImageEnhancer};
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub type Reply = Result<EnhancedImage, EnhanceError>;

/// Enhancer whose replies are fed by the test through a channel.
///
/// `enhance` blocks until the test sends the next reply, which lets a test
/// reset or re-upload while a call is "in flight". Replies are handed out in
/// call order.
pub struct ScriptedEnhancer {
    calls: AtomicUsize,
    instructions: Mutex<Vec<String>>,
    replies: tokio::sync::Mutex<mpsc::UnboundedReceiver<Reply>>,
}

impl ScriptedEnhancer {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<Reply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let enhancer = Arc::new(Self {
            calls: AtomicUsize::new(0),
            instructions: Mutex::new(Vec::new()),
            replies: tokio::sync::Mutex::new(rx),
        });
        (enhancer, tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEnhancer for ScriptedEnhancer {
    async fn enhance(&self, _image: &EncodedImage, instruction: &str) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        let mut replies = self.replies.lock().await;
        replies
            .recv()
            .await
            .unwrap_or_else(|| Err(EnhanceError::Internal("reply channel closed".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Write a solid-colour PNG of the given size and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([30, 120, 200, 255]),
    ));
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("write png fixture");
    path
}
