use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AiError, CompletionProvider, CompletionRequest};
use crate::database::models::BrandContext;

/// Page content beyond this many characters is not sent to the model
const MAX_PAGE_CONTENT_CHARS: usize = 8_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMetadata {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "keywords_or_empty")]
    pub keywords: Vec<String>,
}

/// Inputs of the workflow description prompt
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDetails {
    pub workflow_name: String,
    pub brand_name: Option<String>,
    pub template_name: Option<String>,
    pub step_names: Option<Vec<String>>,
    pub brand_country: Option<String>,
    pub brand_language: Option<String>,
}

/// Prompt builders and response parsers for each copywriting tool
#[derive(Clone)]
pub struct Generators {
    provider: Arc<dyn CompletionProvider>,
}

impl Generators {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn alt_text(&self, image_url: &str, language: &str, country: &str) -> Result<String, AiError> {
        let system = format!(
            "You are an accessibility expert writing image alt text. Write in language '{}' for an audience in {}. \
             Describe the image concisely (under 125 characters), without starting with 'Image of' or 'Picture of'. \
             Respond with the alt text only.",
            language, country
        );
        let request = CompletionRequest::new(system, "Write alt text for this image.", 150).with_image(image_url);
        let text = self.provider.complete(request).await?;
        Ok(strip_quotes(&text).to_string())
    }

    pub async fn metadata(
        &self,
        url: &str,
        language: &str,
        country: &str,
        page_content: &str,
    ) -> Result<GeneratedMetadata, AiError> {
        let system = format!(
            "You are an SEO specialist. Write page metadata in language '{language}' for the {country} market. \
             Respond with a JSON object with keys metaTitle (50-60 characters), metaDescription \
             (150-160 characters) and keywords (an array of 5-10 strings)."
        );
        let content: String = page_content.chars().take(MAX_PAGE_CONTENT_CHARS).collect();
        let user = if content.trim().is_empty() {
            format!("Generate metadata for the page at {url}. Its content could not be retrieved; infer from the URL.")
        } else {
            format!("Generate metadata for the page at {url}.\n\nPage content:\n{content}")
        };

        let raw = self.provider.complete(CompletionRequest::new(system, user, 500).json()).await?;
        parse_json_object::<GeneratedMetadata>(&raw)
    }

    pub async fn article_titles(&self, topic: &str, brand: Option<&BrandContext>) -> Result<Vec<String>, AiError> {
        let mut system = String::from(
            "You are a content strategist. Suggest 5 engaging article titles for the given topic. \
             Respond with a JSON object with a single key \"suggestions\" holding an array of strings.",
        );
        if let Some(brand) = brand {
            system.push_str(&format!(" Write for the brand \"{}\".", brand.name));
            if let (Some(language), Some(country)) = (&brand.language, &brand.country) {
                system.push_str(&format!(" Use language '{language}' for the {country} market."));
            }
            if let Some(identity) = brand.brand_identity.as_deref().filter(|s| !s.is_empty()) {
                system.push_str(&format!(" Brand identity: {identity}."));
            }
            if let Some(tone) = brand.tone_of_voice.as_deref().filter(|s| !s.is_empty()) {
                system.push_str(&format!(" Tone of voice: {tone}."));
            }
        }

        let raw = self
            .provider
            .complete(CompletionRequest::new(system, format!("Topic: {topic}"), 400).json())
            .await?;
        parse_suggestions(&raw)
    }

    pub async fn workflow_description(&self, details: &WorkflowDetails) -> Result<String, AiError> {
        let system = "You are an expert marketing copywriter. Your task is to generate a concise and engaging \
                      marketing description for a content workflow.";
        let request = CompletionRequest::new(system, workflow_prompt(details), 150);
        Ok(self.provider.complete(request).await?.trim().to_string())
    }

    pub async fn template_description(
        &self,
        template_name: &str,
        input_fields: &[String],
        output_fields: &[String],
    ) -> Result<String, AiError> {
        let system = "You write short, helpful descriptions of content templates for a marketing team. \
                      Respond with one or two sentences and nothing else.";
        let mut user = format!("Describe the content template \"{template_name}\".");
        if !input_fields.is_empty() {
            user.push_str(&format!(" It asks for: {}.", input_fields.join(", ")));
        }
        if !output_fields.is_empty() {
            user.push_str(&format!(" It produces: {}.", output_fields.join(", ")));
        }
        let text = self.provider.complete(CompletionRequest::new(system, user, 120)).await?;
        Ok(strip_quotes(&text).to_string())
    }
}

fn workflow_prompt(details: &WorkflowDetails) -> String {
    let mut prompt = format!(
        "Generate a concise and engaging marketing description for a workflow named \"{}\".",
        details.workflow_name
    );
    if let Some(brand) = &details.brand_name {
        prompt.push_str(&format!(" This workflow is specifically designed for the brand \"{brand}\"."));
    }
    if let (Some(country), Some(language)) = (&details.brand_country, &details.brand_language) {
        prompt.push_str(&format!(" It targets the {country} market and uses the {language} language."));
    }
    if let Some(template) = &details.template_name {
        prompt.push_str(&format!(" It often utilizes the \"{template}\" content template."));
    }
    match details.step_names.as_deref() {
        Some(steps) if !steps.is_empty() => {
            prompt.push_str(&format!(
                " The workflow involves the following key stages or steps: {}.",
                steps.join(", ")
            ));
        }
        _ => prompt.push_str(" It is a flexible workflow, and specific steps can be defined as needed."),
    }
    prompt.push_str(
        " Highlight its primary purpose and benefits in streamlining content creation and approval processes. \
         The description should be suitable for a dashboard overview and be around 2-3 sentences long.",
    );
    prompt
}

/// Drop a Markdown code fence the model may wrap JSON in
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
}

fn parse_json_object<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, AiError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| AiError::InvalidResponse(e.to_string()))
}

/// Accepts `{"suggestions": [...]}`, a bare array, or one title per line
fn parse_suggestions(raw: &str) -> Result<Vec<String>, AiError> {
    let body = strip_code_fence(raw);
    let titles = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("suggestions")
            .or_else(|| map.get("titles"))
            .and_then(Value::as_array)
            .map(|items| string_items(items))
            .ok_or_else(|| AiError::InvalidResponse("missing suggestions array".into()))?,
        Ok(Value::Array(items)) => string_items(&items),
        _ => body
            .lines()
            .map(|line| line.trim().trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == ')'))
            .map(|line| strip_quotes(line).to_string())
            .filter(|line| !line.is_empty())
            .collect(),
    };

    if titles.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(titles)
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn keywords_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => string_items(&items),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_metadata_and_tolerates_bad_keywords() {
        let raw = "```json\n{\"metaTitle\":\"T\",\"metaDescription\":\"D\",\"keywords\":\"a, b\"}\n```";
        let meta: GeneratedMetadata = parse_json_object(raw).unwrap();
        assert_eq!(meta.meta_title.as_deref(), Some("T"));
        assert!(meta.keywords.is_empty());
    }

    #[test]
    fn suggestions_accept_object_array_and_lines() {
        assert_eq!(parse_suggestions(r#"{"suggestions":["A","B"]}"#).unwrap(), vec!["A", "B"]);
        assert_eq!(parse_suggestions(r#"["A"]"#).unwrap(), vec!["A"]);
        assert_eq!(parse_suggestions("1. First\n2. \"Second\"\n").unwrap(), vec!["First", "Second"]);
        assert!(matches!(parse_suggestions(r#"{"suggestions":[]}"#), Err(AiError::EmptyResponse)));
        assert!(parse_suggestions(r#"{"other":1}"#).is_err());
    }

    #[test]
    fn workflow_prompt_mentions_only_supplied_details() {
        let details = WorkflowDetails {
            workflow_name: "Launch".into(),
            brand_country: Some("GB".into()),
            ..Default::default()
        };
        let prompt = workflow_prompt(&details);
        assert!(prompt.contains("\"Launch\""));
        assert!(!prompt.contains("targets the"));
        assert!(prompt.contains("flexible workflow"));

        let details = WorkflowDetails {
            workflow_name: "Launch".into(),
            step_names: Some(vec!["Draft".into(), "Legal".into()]),
            brand_country: Some("GB".into()),
            brand_language: Some("en".into()),
            ..Default::default()
        };
        let prompt = workflow_prompt(&details);
        assert!(prompt.contains("targets the GB market and uses the en language"));
        assert!(prompt.contains("Draft, Legal"));
    }

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(strip_quotes("  \"A red bicycle\" "), "A red bicycle");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
