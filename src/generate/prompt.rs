//! Prompt wording for headshot generation.

use crate::style::StyleOptions;

const BASE: &str = "Transform the person in this photo into a professional corporate headshot. \
Keep their face, identity, expression and hairstyle exactly as they are. \
Frame head and shoulders, facing the camera, with soft, flattering studio lighting.";

const ENHANCE: &str = "Apply subtle professional retouching: even out skin tone, reduce blemishes \
and under-eye shadows, and sharpen the eyes, while keeping the result natural.";

const NO_FACE: &str = "If the photo does not contain a clearly visible human face, do not produce an image.";

/// Builds the text prompt sent alongside the photo.
pub fn build_prompt(style: &StyleOptions) -> String {
    let mut prompt = format!(
        "{BASE} Dress them in {}. Place them in front of {}.",
        style.attire.description(),
        style.background.description()
    );
    if style.enhanced {
        prompt.push(' ');
        prompt.push_str(ENHANCE);
    }
    prompt.push(' ');
    prompt.push_str(NO_FACE);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Attire, Background};

    #[test]
    fn test_prompt_mentions_style() {
        let prompt = build_prompt(&StyleOptions::new(Attire::Turtleneck, Background::Bookshelf));
        assert!(prompt.contains("turtleneck"));
        assert!(prompt.contains("bookshelf"));
        assert!(!prompt.contains("retouching"));
    }

    #[test]
    fn test_enhanced_adds_retouching() {
        let prompt = build_prompt(&StyleOptions::default().with_enhanced(true));
        assert!(prompt.contains("retouching"));
        assert!(prompt.ends_with(NO_FACE));
    }
}
