//! Content generators, one per target platform.
//!
//! All generators are pure text transforms over the transcript. Pacing
//! estimates assume spoken delivery at 3 words per second and reading at
//! 200 words per minute.

use serde::Deserialize;
use serde_json::{json, Value};
use voxpost_core::models::ExportFormat;

const WORDS_PER_SECOND: usize = 3;
const READ_WORDS_PER_MINUTE: usize = 200;
const TIKTOK_SEGMENT_SECONDS: usize = 15;
const TIKTOK_WORDS_PER_SEGMENT: usize = WORDS_PER_SECOND * TIKTOK_SEGMENT_SECONDS;

/// Per-format generation options supplied by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportOptions {
    /// Twitter: maximum post length (default 140).
    pub max_length: Option<usize>,
    /// Twitter: append hashtags (default true).
    pub include_hashtags: Option<bool>,
    /// YouTube: open with a hook line (default true).
    pub include_hook: Option<bool>,
    /// YouTube: close with a call to action (default true).
    pub include_outro: Option<bool>,
    /// Blog: post title (default "Generated Blog Post").
    pub title: Option<String>,
}

/// Generated content plus format-specific metadata.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub content: String,
    pub metadata: Value,
}

pub fn generate(format: ExportFormat, text: &str, options: &ExportOptions) -> GeneratedContent {
    match format {
        ExportFormat::Twitter => twitter(text, options),
        ExportFormat::Twitlonger => twitlonger(text),
        ExportFormat::Youtube => youtube(text, options),
        ExportFormat::Tiktok => tiktok(text),
        ExportFormat::Blog => blog(text, options),
    }
}

/// Truncate on a char boundary, appending an ellipsis when text was cut.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn twitter(text: &str, options: &ExportOptions) -> GeneratedContent {
    let max_length = options.max_length.unwrap_or(140);
    let include_hashtags = options.include_hashtags.unwrap_or(true);

    let hashtags = ["#VoxPost", "#AI", "#Content"];
    let mut content = truncate_chars(text, max_length);

    if include_hashtags {
        content.push(' ');
        content.push_str(&hashtags.join(" "));
    }

    GeneratedContent {
        metadata: json!({
            "character_count": content.chars().count(),
            "hashtags": if include_hashtags { hashtags.to_vec() } else { vec![] },
        }),
        content,
    }
}

fn twitlonger(text: &str) -> GeneratedContent {
    GeneratedContent {
        content: text.to_string(),
        metadata: json!({
            "character_count": text.chars().count(),
            "word_count": word_count(text),
        }),
    }
}

fn youtube(text: &str, options: &ExportOptions) -> GeneratedContent {
    let include_hook = options.include_hook.unwrap_or(true);
    let include_outro = options.include_outro.unwrap_or(true);
    let outro = "Thanks for watching! Don't forget to like and subscribe for more content like this!";

    let hook = truncate_chars(text, 103);

    let mut content = String::new();
    if include_hook {
        content.push_str(&format!("🎬 HOOK: {hook}\n\n"));
    }
    content.push_str(&format!("📝 MAIN CONTENT:\n{text}\n\n"));
    if include_outro {
        content.push_str(&format!("🎯 OUTRO: {outro}"));
    }

    GeneratedContent {
        content,
        metadata: json!({
            "hook": include_hook.then_some(hook),
            "outro": include_outro.then_some(outro),
            "estimated_duration": word_count(text).div_ceil(WORDS_PER_SECOND),
        }),
    }
}

fn tiktok(text: &str) -> GeneratedContent {
    let words: Vec<&str> = text.split_whitespace().collect();
    let segments: Vec<String> = words
        .chunks(TIKTOK_WORDS_PER_SEGMENT)
        .map(|chunk| chunk.join(" "))
        .collect();

    let content = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            format!(
                "🎬 Segment {} (0:{}-0:{}):\n{}",
                i + 1,
                i * TIKTOK_SEGMENT_SECONDS,
                (i + 1) * TIKTOK_SEGMENT_SECONDS,
                segment
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let shot_list: Vec<Value> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            json!({
                "timestamp": format!("{}s-{}s", i * TIKTOK_SEGMENT_SECONDS, (i + 1) * TIKTOK_SEGMENT_SECONDS),
                "description": truncate_chars(segment, 53),
                "duration": TIKTOK_SEGMENT_SECONDS,
            })
        })
        .collect();

    GeneratedContent {
        content,
        metadata: json!({
            "shot_list": shot_list,
            "total_segments": segments.len(),
            "estimated_duration": segments.len() * TIKTOK_SEGMENT_SECONDS,
        }),
    }
}

fn blog(text: &str, options: &ExportOptions) -> GeneratedContent {
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| "Generated Blog Post".to_string());

    let intro = truncate_chars(text, 203);
    let conclusion: String = {
        let chars: Vec<char> = text.chars().collect();
        let start = chars.len().saturating_sub(200);
        let tail: String = chars[start..].iter().collect();
        if start > 0 {
            format!("{tail}...")
        } else {
            tail
        }
    };

    let content = format!(
        "# {title}\n\n\
         ## Introduction\n{intro}\n\n\
         ## Main Content\n{text}\n\n\
         ## Conclusion\n{conclusion}\n\n\
         ---\n\n\
         *This blog post was generated from a voice recording with VoxPost.*"
    );

    GeneratedContent {
        content,
        metadata: json!({
            "title": title,
            "image_placeholders": [
                { "position": "header", "description": "Hero image related to the topic" },
                { "position": "middle", "description": "Supporting image or infographic" },
                { "position": "footer", "description": "Call-to-action image" },
            ],
            "estimated_read_time": word_count(text).div_ceil(READ_WORDS_PER_MINUTE),
            "word_count": word_count(text),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Today I want to talk about building small products. \
        Start with one painful problem and solve only that. Ship early, listen \
        to the people who actually use it, and resist adding features nobody \
        asked for. Momentum beats perfection every single time.";

    #[test]
    fn test_twitter_truncates_and_tags() {
        let out = generate(ExportFormat::Twitter, SAMPLE, &ExportOptions::default());
        let body = out.content.trim_end_matches(" #VoxPost #AI #Content");
        assert!(body.chars().count() <= 140);
        assert!(body.ends_with("..."));
        assert_eq!(out.metadata["hashtags"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_twitter_short_text_untouched() {
        let opts = ExportOptions {
            include_hashtags: Some(false),
            ..Default::default()
        };
        let out = generate(ExportFormat::Twitter, "short note", &opts);
        assert_eq!(out.content, "short note");
        assert!(out.metadata["hashtags"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_twitlonger_keeps_full_text() {
        let out = generate(ExportFormat::Twitlonger, SAMPLE, &ExportOptions::default());
        assert_eq!(out.content, SAMPLE);
        assert_eq!(
            out.metadata["word_count"].as_u64().unwrap() as usize,
            SAMPLE.split_whitespace().count()
        );
    }

    #[test]
    fn test_youtube_structure() {
        let out = generate(ExportFormat::Youtube, SAMPLE, &ExportOptions::default());
        assert!(out.content.starts_with("🎬 HOOK:"));
        assert!(out.content.contains("📝 MAIN CONTENT:"));
        assert!(out.content.contains("🎯 OUTRO:"));

        let words = SAMPLE.split_whitespace().count();
        assert_eq!(
            out.metadata["estimated_duration"].as_u64().unwrap() as usize,
            words.div_ceil(3)
        );
    }

    #[test]
    fn test_youtube_without_hook_and_outro() {
        let opts = ExportOptions {
            include_hook: Some(false),
            include_outro: Some(false),
            ..Default::default()
        };
        let out = generate(ExportFormat::Youtube, SAMPLE, &opts);
        assert!(!out.content.contains("HOOK"));
        assert!(!out.content.contains("OUTRO"));
        assert!(out.metadata["hook"].is_null());
    }

    #[test]
    fn test_tiktok_segments() {
        // 100 words → three 45-word segments.
        let text = (0..100).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let out = generate(ExportFormat::Tiktok, &text, &ExportOptions::default());

        assert_eq!(out.metadata["total_segments"].as_u64().unwrap(), 3);
        assert_eq!(out.metadata["estimated_duration"].as_u64().unwrap(), 45);
        assert!(out.content.contains("🎬 Segment 1 (0:0-0:15):"));
        assert!(out.content.contains("🎬 Segment 3 (0:30-0:45):"));
        assert_eq!(out.metadata["shot_list"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_blog_structure() {
        let opts = ExportOptions {
            title: Some("My Post".to_string()),
            ..Default::default()
        };
        let out = generate(ExportFormat::Blog, SAMPLE, &opts);
        assert!(out.content.starts_with("# My Post"));
        assert!(out.content.contains("## Introduction"));
        assert!(out.content.contains("## Main Content"));
        assert!(out.content.contains("## Conclusion"));
        assert_eq!(out.metadata["title"], "My Post");
        assert!(out.metadata["estimated_read_time"].as_u64().unwrap() >= 1);
    }
}
