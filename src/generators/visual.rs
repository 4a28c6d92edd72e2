// src/generators/visual.rs
//! Quote graphic generation. Renders a self-contained 1080x1080 SVG and
//! returns it as a data URL, so the reference is always usable without a
//! hosting provider. Palette comes from a Gemini design suggestion when
//! the client is configured; any failure there substitutes the default
//! palette.

use base64::prelude::*;

use crate::gemini_client::{DesignSuggestion, GeminiClient};
use crate::pipeline::FailurePolicy;

/// Target characters per display line before wrapping.
pub const LINE_BUDGET: usize = 38;
/// A quote never renders as more than this many lines.
pub const MAX_LINES: usize = 3;

const CANVAS: u32 = 1080;

pub struct QuoteGraphicGenerator {
    gemini: Option<GeminiClient>,
}

impl QuoteGraphicGenerator {
    pub const FAILURE_POLICY: FailurePolicy = FailurePolicy::Degrade;

    pub fn new(gemini: Option<GeminiClient>) -> Self {
        Self { gemini }
    }

    /// Produce a graphic reference for the quote. Always returns a usable
    /// data URL; never fails.
    pub async fn quote_graphic(&self, quote: &str, attribution: &str) -> String {
        let palette = match &self.gemini {
            Some(client) => match client.suggest_palette(quote).await {
                Ok(suggestion) => suggestion,
                Err(e) => {
                    tracing::warn!("Design suggestion failed, using default palette: {}", e);
                    default_palette()
                }
            },
            None => default_palette(),
        };

        let lines = wrap_quote(quote);
        let svg = render_svg(&lines, attribution, &palette);
        format!("data:image/svg+xml;base64,{}", BASE64_STANDARD.encode(svg))
    }
}

fn default_palette() -> DesignSuggestion {
    DesignSuggestion {
        background_color: "#3B82F6".to_string(),
        text_color: "#FFFFFF".to_string(),
        accent_color: "#DBEAFE".to_string(),
    }
}

/// Greedy word wrap to at most MAX_LINES lines of ~LINE_BUDGET chars.
/// Quotes longer than the total budget are truncated with an ellipsis
/// before wrapping.
pub fn wrap_quote(quote: &str) -> Vec<String> {
    let total_budget = LINE_BUDGET * MAX_LINES;
    let quote = quote.trim();
    let truncated: String = if quote.chars().count() > total_budget {
        let mut cut: String = quote.chars().take(total_budget - 1).collect();
        cut = cut.trim_end().to_string();
        cut.push('…');
        cut
    } else {
        quote.to_string()
    };

    let words: Vec<&str> = truncated.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in words {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= LINE_BUDGET {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_LINES {
        lines.truncate(MAX_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }

    lines
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn render_svg(lines: &[String], attribution: &str, palette: &DesignSuggestion) -> String {
    let mut text_elements = String::new();

    // Vertically center the block of quote lines.
    let line_height = 72;
    let first_y = (CANVAS as i32) / 2 - ((lines.len() as i32 - 1) * line_height) / 2;
    for (i, line) in lines.iter().enumerate() {
        text_elements.push_str(&format!(
            "<text x=\"540\" y=\"{}\" fill=\"{}\" font-size=\"48\" font-family=\"Arial, sans-serif\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
            first_y + (i as i32) * line_height,
            xml_escape(&palette.text_color),
            xml_escape(line),
        ));
    }

    format!(
        "<svg width=\"{c}\" height=\"{c}\" viewBox=\"0 0 {c} {c}\" xmlns=\"http://www.w3.org/2000/svg\">\
         <rect width=\"{c}\" height=\"{c}\" fill=\"{bg}\"/>\
         {text}\
         <text x=\"540\" y=\"880\" fill=\"{accent}\" font-size=\"32\" font-family=\"Arial, sans-serif\" text-anchor=\"middle\">- {attribution}</text>\
         </svg>",
        c = CANVAS,
        bg = xml_escape(&palette.background_color),
        text = text_elements,
        accent = xml_escape(&palette.accent_color),
        attribution = xml_escape(attribution),
    )
}
