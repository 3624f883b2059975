//! # aethercanvas
//!
//! Enhance and upscale images with a generative image model.
//!
//! A user picks an image, an instruction, an upscale factor (2/4/8/16) and a
//! creativity level (0–100). The library sends the image plus a composed
//! instruction to Gemini's image model in a single request and keeps the
//! returned image ready for a before/after view or download.
//!
//! ## Workflow Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input    read the file, declare its media type
//!  ├─ 2. Encode   bytes → base64 EncodedImage
//!  ├─ 3. Prompt   instruction + factor + creativity → instruction text
//!  ├─ 4. Remote   one generateContent call, first inline image wins
//!  └─ 5. Output   data-URI preview, derived download name
//! ```
//!
//! [`Workflow`] owns the state and sequences the steps. It guards against a
//! slow response landing after the user has already reset or re-uploaded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aethercanvas::{EnhanceConfig, UpscaleFactor, Workflow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from API_KEY or GEMINI_API_KEY
//!     let workflow = Workflow::from_config(&EnhanceConfig::from_env())?;
//!     workflow.upload("photo.jpg").await.ok();
//!     workflow.set_upscale_factor(UpscaleFactor::X8);
//!     workflow.submit().await;
//!
//!     let state = workflow.state();
//!     if let Some(err) = state.last_error {
//!         eprintln!("{err}");
//!     } else {
//!         let path = workflow.save_result(".")?;
//!         println!("saved {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `aethercanvas` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{resolve_enhancer, EnhanceConfig, EnhanceConfigBuilder};
pub use error::{EnhanceError, ErrorKind};
pub use output::{result_file_name, EnhancedImage, PreviewHandle};
pub use params::{CreativityLevel, TransformParameters, UpscaleFactor};
pub use pipeline::encode::EncodedImage;
pub use pipeline::input::read_image_file;
pub use pipeline::remote::{GeminiClient, ImageEnhancer};
pub use progress::{NoopObserver, Observer, WorkflowObserver};
pub use prompts::compose_instruction;
pub use workflow::{Phase, SubmitOutcome, Workflow, WorkflowState};
