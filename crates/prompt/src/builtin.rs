//! Prompt definitions compiled into the binary.

use crate::types::PromptDefinition;
use cue_core::{AppError, AppResult};

/// Prompt used by the AI enhancement pass of the detector.
pub const ENHANCE_PROMPT_ID: &str = "detect.enhance";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    ENHANCE_PROMPT_ID,
    include_str!("../prompts/detect.enhance.yml"),
)];

/// Look up and parse a built-in prompt definition.
///
/// Returns `Ok(None)` when no built-in prompt carries this ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<Option<PromptDefinition>> {
    let Some((_, source)) = BUILTIN_PROMPTS.iter().find(|(id, _)| *id == prompt_id) else {
        return Ok(None);
    };

    let definition: PromptDefinition = serde_yaml::from_str(source).map_err(|e| {
        AppError::Prompt(format!(
            "Built-in prompt '{}' is malformed: {}",
            prompt_id, e
        ))
    })?;

    Ok(Some(definition))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_prompt_parses() {
        let def = builtin_prompt(ENHANCE_PROMPT_ID).unwrap().unwrap();
        assert_eq!(def.id, ENHANCE_PROMPT_ID);
        assert_eq!(def.output.format, "json");
        assert!(def.system.is_some());
        assert!(def.template.contains("{{#each candidates}}"));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("nope").unwrap().is_none());
    }
}
