// src/gemini_client.rs
//! Thin Gemini API wrapper used for quote-graphic design suggestions.
//! The graphic itself is rendered locally; Gemini only proposes a palette.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Palette proposed for one quote graphic. Hex color strings.
#[derive(Debug, Clone, Deserialize)]
pub struct DesignSuggestion {
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Ask Gemini for a palette suited to the quote. Any failure (network,
    /// HTTP status, unparseable reply) surfaces as Err; the caller
    /// substitutes the default palette.
    pub async fn suggest_palette(&self, quote: &str) -> Result<DesignSuggestion, String> {
        let prompt = format!(
            "Propose a color palette for a square social-media quote graphic.\n\
             The quote reads: \"{}\"\n\n\
             Respond with only a JSON object containing these keys:\n\
             - background_color: hex color for the background\n\
             - text_color: hex color for the quote text\n\
             - accent_color: hex color for the attribution line\n",
            quote
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!(
            "{}/models/gemini-2.0-flash:generateContent?key={}",
            self.base_url, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Gemini request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Gemini API error: {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Gemini response: {}", e))?;

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| "Gemini response contained no text part".to_string())?;

        parse_palette(text)
    }
}

/// Extract the JSON palette from the model reply, tolerating markdown
/// code fences around it.
fn parse_palette(text: &str) -> Result<DesignSuggestion, String> {
    let trimmed = text.trim();
    let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => return Err("no JSON object in Gemini reply".to_string()),
    };

    serde_json::from_str(json_str).map_err(|e| format!("invalid palette JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_palette_plain_json() {
        let suggestion = parse_palette(
            r##"{"background_color": "#102030", "text_color": "#FFFFFF", "accent_color": "#AABBCC"}"##,
        )
        .unwrap();
        assert_eq!(suggestion.background_color, "#102030");
        assert_eq!(suggestion.accent_color, "#AABBCC");
    }

    #[test]
    fn test_parse_palette_strips_code_fence() {
        let reply = "```json\n{\"background_color\": \"#000000\", \"text_color\": \"#FFFFFF\", \"accent_color\": \"#FF0000\"}\n```";
        let suggestion = parse_palette(reply).unwrap();
        assert_eq!(suggestion.background_color, "#000000");
    }

    #[test]
    fn test_parse_palette_rejects_prose() {
        assert!(parse_palette("I would suggest a calm blue tone.").is_err());
    }
}
