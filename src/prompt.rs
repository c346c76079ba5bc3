//! Prompt construction for regional history requests.

use crate::config::ConfigError;

/// Placeholder replaced by the requested region.
pub const REGION_PLACEHOLDER: &str = "{region}";

/// Asks for a ~500 character Korean summary of the region's history, result text only.
pub const DEFAULT_TEMPLATE: &str =
    "{region}의 역사적 내용에 대해 한국어로 500자로 요약해서 알려줘. 결과만 출력해줘.";

/// A prompt template known to contain the region placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        if !template.contains(REGION_PLACEHOLDER) {
            return Err(ConfigError::InvalidPrompt);
        }
        Ok(Self(template.to_string()))
    }

    /// Insert the region verbatim. No validation is applied to it.
    pub fn render(&self, region: &str) -> String {
        self.0.replace(REGION_PLACEHOLDER, region)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_embeds_region() {
        let prompt = PromptTemplate::default().render("경주");
        assert_eq!(
            prompt,
            "경주의 역사적 내용에 대해 한국어로 500자로 요약해서 알려줘. 결과만 출력해줘."
        );
    }

    #[test]
    fn region_is_inserted_verbatim() {
        let region = "  Île-de-France {region} \"quoted\"\n";
        let prompt = PromptTemplate::default().render(region);
        assert!(prompt.starts_with(region));
    }

    #[test]
    fn empty_region_is_allowed() {
        let prompt = PromptTemplate::default().render("");
        assert!(prompt.starts_with("의 역사적"));
    }

    #[test]
    fn custom_template_requires_placeholder() {
        assert!(PromptTemplate::new("Summarise the history of {region}.").is_ok());
        assert!(matches!(
            PromptTemplate::new("Summarise something."),
            Err(ConfigError::InvalidPrompt)
        ));
    }
}
