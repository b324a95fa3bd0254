//! Request bodies for the generation endpoints.
//!
//! Bounds are checked here only. Providers are free to ignore fields they do
//! not support.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

/// Hugging Face repo id: optional `org/` then a name. Both parts start with
/// an ASCII alphanumeric, so `.` and `..` can never form a path segment.
pub static MODEL_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9][A-Za-z0-9_.-]*/)?[A-Za-z0-9][A-Za-z0-9_.-]*$")
        .expect("Failed to compile model id pattern")
});

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageGenerationRequest {
    #[validate(length(min = 1, message = "Prompt cannot be empty"))]
    pub prompt: String,

    #[serde(default = "default_width")]
    #[validate(range(min = 256, max = 2048, message = "Width must be between 256 and 2048"))]
    pub width: u32,

    /// Defaults to a 16:9 frame.
    #[serde(default = "default_height")]
    #[validate(range(min = 256, max = 2048, message = "Height must be between 256 and 2048"))]
    pub height: u32,

    #[serde(default = "default_guidance_scale")]
    #[validate(range(
        min = 1.0,
        max = 20.0,
        message = "Guidance scale must be between 1.0 and 20.0"
    ))]
    pub guidance_scale: f64,

    #[serde(default = "default_num_inference_steps")]
    #[validate(range(
        min = 1,
        max = 50,
        message = "Number of inference steps must be between 1 and 50"
    ))]
    pub num_inference_steps: u32,
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    576
}

fn default_guidance_scale() -> f64 {
    7.5
}

fn default_num_inference_steps() -> u32 {
    4
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoGenerationRequest {
    #[validate(length(min = 1, message = "Prompt cannot be empty"))]
    pub prompt: String,

    /// Falls back to the configured `HF_VIDEO_MODEL` when omitted.
    #[serde(default)]
    #[validate(regex(
        path = *MODEL_ID_RE,
        message = "Model must be a Hugging Face repo id such as org/name"
    ))]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image(width: u32, height: u32, guidance_scale: f64, steps: u32) -> ImageGenerationRequest {
        ImageGenerationRequest {
            prompt: "Astronaut riding a horse on Mars".to_string(),
            width,
            height,
            guidance_scale,
            num_inference_steps: steps,
        }
    }

    fn failed_fields(req: &ImageGenerationRequest) -> Vec<String> {
        let mut fields: Vec<String> = req
            .validate()
            .unwrap_err()
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        fields
    }

    #[test]
    fn defaults_apply_when_only_prompt_given() {
        let req: ImageGenerationRequest =
            serde_json::from_value(json!({ "prompt": "a cat" })).unwrap();

        assert_eq!(req.width, 1024);
        assert_eq!(req.height, 576);
        assert_eq!(req.guidance_scale, 7.5);
        assert_eq!(req.num_inference_steps, 4);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        for (w, h, g, s) in [(256, 256, 1.0, 1), (2048, 2048, 20.0, 50), (1024, 576, 7.5, 4)] {
            assert!(image(w, h, g, s).validate().is_ok(), "{w}x{h} g={g} s={s}");
        }
    }

    #[test]
    fn out_of_range_fields_are_named() {
        assert_eq!(failed_fields(&image(255, 576, 7.5, 4)), vec!["width"]);
        assert_eq!(failed_fields(&image(1024, 2049, 7.5, 4)), vec!["height"]);
        assert_eq!(failed_fields(&image(1024, 576, 0.5, 4)), vec!["guidance_scale"]);
        assert_eq!(failed_fields(&image(1024, 576, 20.5, 0)), vec![
            "guidance_scale",
            "num_inference_steps"
        ]);
        assert_eq!(failed_fields(&image(1024, 576, 7.5, 51)), vec!["num_inference_steps"]);
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let mut req = image(1024, 576, 7.5, 4);
        req.prompt = String::new();
        assert_eq!(failed_fields(&req), vec!["prompt"]);
    }

    fn video(model: Option<&str>) -> VideoGenerationRequest {
        VideoGenerationRequest {
            prompt: "A young man walking on the street".to_string(),
            model: model.map(str::to_string),
        }
    }

    #[test]
    fn video_model_is_optional() {
        let req: VideoGenerationRequest =
            serde_json::from_value(json!({ "prompt": "A young man walking on the street" }))
                .unwrap();

        assert_eq!(req.model, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn repo_ids_are_accepted() {
        for model in ["Wan-AI/Wan2.2-T2V-A14B", "black-forest-labs/FLUX.1-schnell", "gpt2"] {
            assert!(video(Some(model)).validate().is_ok(), "{model}");
        }
    }

    #[test]
    fn model_outside_repo_id_shape_is_rejected() {
        for model in ["", "../../x", "org/..", "a?b", "org/name/extra", "/org/name", "org/.hidden"] {
            let errors = video(Some(model)).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("model"), "{model}");
        }
    }

    #[test]
    fn video_empty_prompt_is_rejected() {
        let req = VideoGenerationRequest {
            prompt: String::new(),
            model: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("prompt"));
    }
}
