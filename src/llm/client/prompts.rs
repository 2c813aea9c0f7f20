//! Default LLM prompts for sentiment analysis.
//!
//! Placeholders: `{text}`, `{sentiment}`, `{keywords}`, `{texts}`. Every prompt
//! asks for a single JSON object so responses can be parsed without scraping.

/// Stage 1: classify sentiment with a confidence score.
pub const DEFAULT_CLASSIFY_PROMPT: &str = r#"Determine the sentiment of the following text. Classify the sentiment as positive, negative, or neutral. Provide a confidence score between 0 and 1 representing the certainty of your classification.

Text: {text}

Respond with ONLY a JSON object of the form {"sentiment": "positive" | "negative" | "neutral", "confidence": <number between 0 and 1>}."#;

/// Stage 2: extract the phrases driving an already-classified sentiment.
pub const DEFAULT_DRIVERS_PROMPT: &str = r#"Identify the key phrases and words in the following text that drive its {sentiment} sentiment. Return these phrases and words as a list, most influential first.

Text: {text}

Respond with ONLY a JSON object of the form {"drivers": ["phrase", ...]}."#;

/// Stage 3: explain the sentiment in terms of the extracted drivers.
pub const DEFAULT_EXPLAIN_PROMPT: &str = r#"You are an expert sentiment analyst. You are explaining the sentiment score of a given text.

The text is:
{text}

The keywords that drive the sentiment are:
{keywords}

Explain why the text received its sentiment score, highlighting key portions of the text that contribute to the sentiment. Be concise and to the point.

Respond with ONLY a JSON object of the form {"explanation": "..."}."#;

/// Single-shot analysis: everything in one call.
pub const DEFAULT_ANALYZE_PROMPT: &str = r#"You are a sentiment analysis expert. Perform a comprehensive sentiment analysis of the text below.

Your analysis must include:
1. Sentiment: classify as "positive", "negative", or "neutral".
2. Confidence: a score from 0 to 1 indicating your certainty.
3. Drivers: a list of key words or phrases that most influenced the classification.
4. Explanation: a brief, clear explanation of the sentiment, referencing the drivers.

Text: {text}

Respond with ONLY a JSON object of the form {"sentiment": "...", "confidence": <number>, "drivers": ["..."], "explanation": "..."}."#;

/// Batch analysis of one chunk of texts.
pub const DEFAULT_BATCH_PROMPT: &str = r#"You are a sentiment analysis expert. For each text provided below, perform a comprehensive sentiment analysis.

Your analysis for each text must include:
1. sentiment: classify as "positive", "negative", or "neutral".
2. confidence: a score from 0 to 1 indicating your certainty.
3. drivers: a list of key words or phrases that most influenced the classification.
4. explanation: a brief, clear explanation of the sentiment, referencing the drivers.
5. original_index: the number N from the TEXT_N label of the text you analyzed.

Analyze the following texts:
{texts}

Respond with ONLY a JSON object containing a "results" array with exactly one entry per text: {"results": [{"sentiment": "...", "confidence": <number>, "drivers": ["..."], "explanation": "...", "original_index": <N>}, ...]}."#;

/// Render the numbered text block for the batch prompt.
///
/// Texts are embedded as JSON string literals so quotes and newlines inside a
/// text cannot bleed into the surrounding structure.
pub fn render_text_list(texts: &[String]) -> String {
    let mut out = String::new();
    for (i, text) in texts.iter().enumerate() {
        let quoted = serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text));
        out.push_str(&format!("---\nTEXT_{}: {}\n---\n", i, quoted));
    }
    out
}

/// Render the keyword bullet list for the explain prompt.
pub fn render_keywords(keywords: &[String]) -> String {
    if keywords.is_empty() {
        return "(none identified)".to_string();
    }
    keywords
        .iter()
        .map(|k| format!("- {}", k))
        .collect::<Vec<_>>()
        .join("\n")
}
