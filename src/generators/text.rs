// src/generators/text.rs
//! Text asset generation: blog post, LinkedIn posts, tweets.
//! Pure functions of the ingested video data. None of them ever fails;
//! empty inputs engage templated fallbacks so every returned string is
//! non-empty.

use lazy_static::lazy_static;
use regex::Regex;

use crate::pipeline::FailurePolicy;

pub const FAILURE_POLICY: FailurePolicy = FailurePolicy::Degrade;

/// Hard ceiling for tweet bodies before hashtag formatting is appended.
pub const TWEET_CHAR_CEILING: usize = 240;

const LINKEDIN_POST_COUNT: usize = 3;
const POST_CHAR_LIMIT: usize = 1300;
const MAX_TWEETS: usize = 5;
const MAX_KEY_POINTS: usize = 5;

const SIGNAL_WORDS: [&str; 8] = [
    "important", "key", "remember", "crucial", "must", "should", "always", "never",
];

lazy_static! {
    static ref SENTENCE_BOUNDARY: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

fn sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(|s| s.trim().trim_end_matches(|c| c == '.' || c == '!' || c == '?').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentences containing a signal word, capped; falls back to the first
/// non-trivial sentences when nothing matches.
fn key_point_sentences(transcript: &str, cap: usize) -> Vec<String> {
    let all = sentences(transcript);

    let mut points: Vec<String> = all
        .iter()
        .filter(|s| {
            let lowered = s.to_lowercase();
            SIGNAL_WORDS.iter().any(|w| lowered.contains(w))
        })
        .take(cap)
        .cloned()
        .collect();

    if points.is_empty() {
        points = all.into_iter().filter(|s| s.len() > 20).take(cap).collect();
    }

    points
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

fn heading_for(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() <= 8 {
        sentence.to_string()
    } else {
        format!("{}...", words[..8].join(" "))
    }
}

/// Generate a markdown blog post: overview, derived key-point
/// subsections, conclusion. Never fails; a minimal templated post is
/// produced even for empty inputs.
pub fn blog(title: &str, description: &str, transcript: &str, duration_seconds: i64) -> String {
    let title = if title.trim().is_empty() { "Untitled Video" } else { title };

    let transcript_sentences = sentences(transcript);

    let mut overview: String = transcript_sentences
        .iter()
        .take(3)
        .map(|s| format!("{}.", s))
        .collect::<Vec<_>>()
        .join(" ");
    if overview.is_empty() {
        overview = sentences(description)
            .iter()
            .take(3)
            .map(|s| format!("{}.", s))
            .collect::<Vec<_>>()
            .join(" ");
    }
    if overview.is_empty() {
        overview = "This video covers practical insights and actionable takeaways.".to_string();
    }
    if duration_seconds > 60 {
        overview.push_str(&format!(
            " The full video runs about {} minutes.",
            duration_seconds / 60
        ));
    }

    let mut post = format!("# {}\n\n## Overview\n\n{}\n\n## Key Takeaways\n\n", title, overview);

    let mut points = key_point_sentences(transcript, MAX_KEY_POINTS);
    if points.is_empty() {
        points.push("Key insight from the video content".to_string());
    }
    for (i, point) in points.iter().enumerate() {
        post.push_str(&format!("### {}. {}\n\n", i + 1, heading_for(point)));
        post.push_str(&format!("{}.\n\n", point));
    }

    let conclusion: String = if transcript_sentences.len() >= 2 {
        transcript_sentences[transcript_sentences.len() - 2..]
            .iter()
            .map(|s| format!("{}.", s))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        "This content provides valuable insights and actionable takeaways for viewers.".to_string()
    };
    post.push_str(&format!("## Conclusion\n\n{}\n", conclusion));

    post
}

/// Generate three LinkedIn posts framing the same material as an
/// insight, a question, and a tip list. Each post is independently
/// bounded in length.
pub fn linkedin_posts(title: &str, description: &str, transcript: &str) -> Vec<String> {
    let posts = vec![
        insight_post(title, description, transcript),
        question_post(transcript),
        tips_post(transcript),
    ];

    debug_assert_eq!(posts.len(), LINKEDIN_POST_COUNT);
    posts
        .into_iter()
        .map(|p| truncate_chars(&p, POST_CHAR_LIMIT))
        .collect()
}

fn insight_post(title: &str, description: &str, transcript: &str) -> String {
    let source = if !transcript.trim().is_empty() { transcript } else { description };
    let mut extract = truncate_chars(source.trim(), 200);
    if extract.is_empty() {
        extract = "Sharing lessons learned from my latest video.".to_string();
    }

    let topic = if title.trim().is_empty() { "my latest content" } else { title };

    format!(
        "💡 Key insight from {}:\n\n{}\n\nThis really resonated with me.\n\nWhat's your take on this? Share your thoughts below! 👇\n\n#ContentCreation #Insights #Learning #Growth",
        topic, extract
    )
}

fn question_post(transcript: &str) -> String {
    let question = transcript
        .split(". ")
        .find_map(|segment| {
            segment
                .find('?')
                .map(|idx| segment[..=idx].trim().to_string())
        })
        .unwrap_or_else(|| "What's the most important lesson you've learned recently?".to_string());

    format!(
        "🤔 Here's a thought-provoking question:\n\n{}\n\nI explored this in my recent content, and the answers might surprise you.\n\nWhat would your answer be? Let's discuss in the comments!\n\n#Discussion #Learning #Community #Growth",
        question
    )
}

fn tips_post(transcript: &str) -> String {
    let mut post = String::from("🚀 Quick tips from my latest content:\n\n");

    let tips = key_point_sentences(transcript, 3);
    if tips.is_empty() {
        post.push_str("✅ Focus on what your audience actually needs\n");
        post.push_str("✅ Keep learning and iterating\n");
        post.push_str("✅ Consistency beats intensity\n");
    } else {
        for tip in tips {
            post.push_str(&format!("✅ {}\n", truncate_chars(&tip, 160)));
        }
    }

    post.push_str("\nWhich tip resonates most with you?\n\nSave this post for later and let me know your thoughts! 💭\n\n#Tips #Productivity #Success #ContentCreation");
    post
}

/// Generate up to five tweets mixing quote-based, sentence-based, and one
/// engagement item. Quote bodies respect the character ceiling before
/// formatting is appended.
pub fn tweets(title: &str, quotes: &[String], transcript: &str) -> Vec<String> {
    let mut tweets = Vec::new();

    for quote in quotes.iter().take(3) {
        if quote.chars().count() <= TWEET_CHAR_CEILING {
            tweets.push(format!("\"{}\"\n\n#Wisdom #Insights #Content", quote));
        }
    }

    for sentence in sentences(transcript).iter().take(2) {
        if sentence.chars().count() <= 200 {
            tweets.push(format!("💡 {}.\n\n#Tips #Learning", sentence));
        }
    }

    let topic = if title.trim().is_empty() { "my latest content" } else { title };
    tweets.push(format!(
        "🧵 Just dropped some valuable insights in {}.\n\nWhat's the most important lesson you've learned recently?\n\n#Thread #Learning #Community",
        truncate_chars(topic, 120)
    ));

    tweets.truncate(MAX_TWEETS);
    tweets
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "Welcome to the channel. Today we talk about shipping software. \
        It is important to always test your changes before release. \
        You should never deploy on a Friday afternoon without a rollback plan. \
        Remember that user feedback is the key to a better product. \
        Have you ever wondered why releases fail? \
        Thanks for watching and see you next time.";

    #[test]
    fn test_blog_has_expected_structure() {
        let post = blog("Shipping Software", "A talk about releases.", TRANSCRIPT, 1800);
        assert!(post.starts_with("# Shipping Software"));
        assert!(post.contains("## Overview"));
        assert!(post.contains("## Key Takeaways"));
        assert!(post.contains("### 1."));
        assert!(post.contains("## Conclusion"));
        assert!(post.contains("30 minutes"));
    }

    #[test]
    fn test_blog_key_points_prefer_signal_sentences() {
        let post = blog("T", "", TRANSCRIPT, 0);
        assert!(post.contains("important to always test"));
    }

    #[test]
    fn test_blog_never_empty_on_empty_inputs() {
        let post = blog("", "", "", 0);
        assert!(!post.is_empty());
        assert!(post.contains("# Untitled Video"));
        assert!(post.contains("## Conclusion"));
    }

    #[test]
    fn test_linkedin_posts_fixed_count_and_nonempty() {
        let posts = linkedin_posts("Title", "Description.", TRANSCRIPT);
        assert_eq!(posts.len(), 3);
        for post in &posts {
            assert!(!post.is_empty());
            assert!(post.chars().count() <= 1300);
        }
        // Distinct framings.
        assert!(posts[0].contains("Key insight"));
        assert!(posts[1].contains("question"));
        assert!(posts[2].contains("Quick tips"));
    }

    #[test]
    fn test_linkedin_question_post_reuses_transcript_question() {
        let posts = linkedin_posts("T", "", TRANSCRIPT);
        assert!(posts[1].contains("Have you ever wondered why releases fail?"));
    }

    #[test]
    fn test_linkedin_posts_survive_empty_transcript() {
        let posts = linkedin_posts("", "", "");
        assert_eq!(posts.len(), 3);
        for post in &posts {
            assert!(!post.is_empty());
        }
    }

    #[test]
    fn test_tweets_capped_and_nonempty() {
        let quotes = vec![
            "Short quote one.".to_string(),
            "Short quote two.".to_string(),
            "Short quote three.".to_string(),
        ];
        let tweets = tweets("Title", &quotes, TRANSCRIPT);
        assert!(!tweets.is_empty());
        assert!(tweets.len() <= 5);
    }

    #[test]
    fn test_over_ceiling_quotes_are_skipped() {
        let long_quote = "x".repeat(300);
        let tweets = tweets("Title", &[long_quote], "");
        // Only the engagement tweet survives.
        assert_eq!(tweets.len(), 1);
        assert!(tweets[0].contains("#Thread"));
    }

    #[test]
    fn test_tweets_from_empty_inputs_still_yield_one() {
        let tweets = tweets("", &[], "");
        assert_eq!(tweets.len(), 1);
        assert!(!tweets[0].is_empty());
    }

    #[test]
    fn test_sentence_splitting() {
        let split = sentences("One sentence. Another one! A third? ");
        assert_eq!(split, vec!["One sentence", "Another one", "A third"]);
    }
}
