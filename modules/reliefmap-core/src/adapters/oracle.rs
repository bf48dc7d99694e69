use anyhow::Result;
use async_trait::async_trait;
use gemini_client::{parse_yes_no, Gemini};
use tracing::debug;

use reliefmap_common::{EventDescriptor, Evidence, HelpOffer};

use crate::traits::{EventOracle, HelpOracle};

/// Event and help oracle backed by Gemini text generation.
#[derive(Clone)]
pub struct GeminiOracle {
    gemini: Gemini,
}

impl GeminiOracle {
    pub fn new(gemini: Gemini) -> Self {
        Self { gemini }
    }
}

// =============================================================================
// Prompts
// =============================================================================

fn match_prompt(report: &EventDescriptor, existing: &EventDescriptor) -> Result<String> {
    Ok(format!(
        "Are these two disaster reports about the same real-world event?\n\
         Event 1: {}\n\
         Event 2: {}\n\
         Answer only 'yes' or 'no'.",
        serde_json::to_string(report)?,
        serde_json::to_string(existing)?,
    ))
}

fn plausibility_prompt(report: &EventDescriptor, evidence: &Evidence) -> String {
    let mut prompt = format!(
        "Is this a real disaster event?\n\
         Type: {}\n\
         Location: {}, {}, {}\n\
         Description: {}\n\
         Social media: {}",
        report.disaster_type,
        report.location,
        report.state,
        report.country,
        report.description,
        evidence.tweets_summary,
    );
    if let Some(prefix) = &evidence.image_prefix {
        prompt.push_str(&format!("\nImage (base64): {prefix}..."));
    }
    prompt.push_str("\nAnswer only 'yes' or 'no'.");
    prompt
}

fn offers_prompt(query: &str, offers: &[HelpOffer]) -> Result<String> {
    Ok(format!(
        "Given the following help offers, which are relevant for someone searching for help in '{query}'?\n\
         Help offers: {}\n\
         Return only a JSON array of the relevant offers, copied unchanged including their \"id\".",
        serde_json::to_string(offers)?,
    ))
}

fn helpline_prompt(query: &str) -> String {
    format!(
        "What are the official government disaster helpline numbers and emergency contacts for '{query}'? \
         Reply only in JSON format: {{\"helplines\": [{{\"agency\": string, \"number\": string, \"description\": string}}]}}"
    )
}

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl EventOracle for GeminiOracle {
    async fn judge_match(
        &self,
        report: &EventDescriptor,
        existing: &EventDescriptor,
    ) -> Result<bool> {
        let answer = self.gemini.complete(&match_prompt(report, existing)?).await?;
        debug!(answer = %answer, "gemini: match judgment");
        Ok(parse_yes_no(&answer))
    }

    async fn judge_plausible(&self, report: &EventDescriptor, evidence: &Evidence) -> Result<bool> {
        let answer = self
            .gemini
            .complete(&plausibility_prompt(report, evidence))
            .await?;
        debug!(answer = %answer, "gemini: plausibility judgment");
        Ok(parse_yes_no(&answer))
    }
}

#[async_trait]
impl HelpOracle for GeminiOracle {
    async fn filter_offers(&self, query: &str, offers: &[HelpOffer]) -> Result<String> {
        Ok(self.gemini.complete(&offers_prompt(query, offers)?).await?)
    }

    async fn helplines(&self, query: &str) -> Result<String> {
        Ok(self.gemini.complete(&helpline_prompt(query)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> EventDescriptor {
        EventDescriptor {
            name: "Ravi".into(),
            disaster_type: "flood".into(),
            country: "India".into(),
            state: "TN".into(),
            location: "Chennai".into(),
            description: "Heavy flooding downtown".into(),
        }
    }

    #[test]
    fn match_prompt_embeds_both_descriptors() {
        let mut other = descriptor();
        other.location = "Velachery".into();
        let prompt = match_prompt(&descriptor(), &other).unwrap();
        assert!(prompt.contains(r#""location":"Chennai""#));
        assert!(prompt.contains(r#""location":"Velachery""#));
        assert!(prompt.contains(r#""type":"flood""#));
    }

    #[test]
    fn plausibility_prompt_includes_evidence() {
        let prompt = plausibility_prompt(
            &descriptor(),
            &Evidence {
                tweets_summary: "Found 3 recent tweets about this event.".into(),
                image_prefix: Some("data:image/png;base64,iVBOR".into()),
            },
        );
        assert!(prompt.contains("Location: Chennai, TN, India"));
        assert!(prompt.contains("Found 3 recent tweets"));
        assert!(prompt.contains("Image (base64): data:image/png;base64,iVBOR..."));
    }

    #[test]
    fn plausibility_prompt_without_image() {
        let prompt = plausibility_prompt(
            &descriptor(),
            &Evidence {
                tweets_summary: "No recent tweets found.".into(),
                image_prefix: None,
            },
        );
        assert!(!prompt.contains("Image"));
    }

    #[test]
    fn helpline_prompt_requests_json_shape() {
        let prompt = helpline_prompt("Chennai");
        assert!(prompt.contains("'Chennai'"));
        assert!(prompt.contains(r#"{"helplines": [{"agency""#));
    }
}
