//! Instruction text sent to the image model.
//!
//! Everything the model is told lives here so prompt wording can be changed
//! and tested without touching the HTTP client. [`compose_instruction`] is
//! pure: the same three inputs always yield the same string.

use crate::params::{CreativityLevel, UpscaleFactor};

/// Seed instruction shown in the prompt box before the user edits it.
pub const DEFAULT_INSTRUCTION: &str =
    "Make this image breathtakingly beautiful, cinematic, and hyper-realistic.";

/// Build the full instruction for one enhancement request.
///
/// The user's text is embedded verbatim between double quotes under the
/// `User's Request:` label. It is not escaped or truncated.
pub fn compose_instruction(
    user_instruction: &str,
    upscale_factor: UpscaleFactor,
    creativity_level: CreativityLevel,
) -> String {
    format!(
        "Task: Enhance and transform the provided image.\n\
         Upscale Factor: Upscale the image to {factor}x its original size, adding plausible details to maintain quality at the new resolution.\n\
         Creativity Level: {level}/100. A higher level means more artistic interpretation and 'hallucinated' details. A lower level means staying more faithful to the original image.\n\
         User's Request: \"{user_instruction}\"\n\
         \n\
         Carefully analyze the image and the user's request. Apply the upscaling and creative transformation as instructed.",
        factor = upscale_factor.factor(),
        level = creativity_level.value(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_names_factor_level_and_request() {
        let text = compose_instruction(
            "turn it into a watercolour",
            UpscaleFactor::X8,
            CreativityLevel::new(30).unwrap(),
        );
        assert!(text.contains("8x its original size"), "got: {text}");
        assert!(text.contains("Creativity Level: 30/100."));
        assert!(text.contains("User's Request: \"turn it into a watercolour\""));
        assert!(text.contains("more faithful to the original image"));
    }

    #[test]
    fn composition_is_deterministic() {
        let level = CreativityLevel::new(0).unwrap();
        let a = compose_instruction("x", UpscaleFactor::X16, level);
        let b = compose_instruction("x", UpscaleFactor::X16, level);
        assert_eq!(a, b);
    }

    #[test]
    fn user_text_is_not_escaped() {
        let raw = "say \"hi\"\n{braces} and 100%";
        let text = compose_instruction(raw, UpscaleFactor::X2, CreativityLevel::default());
        assert!(text.contains(raw));
    }

    #[test]
    fn empty_request_is_accepted() {
        let text = compose_instruction("", UpscaleFactor::X4, CreativityLevel::default());
        assert!(text.contains("User's Request: \"\""));
    }
}
