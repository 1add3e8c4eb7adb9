//! Prompt template for grounded answers.

use crate::types::chunk::SearchResult;

/// Answer prompt. `{sources}` and `{question}` are substituted.
pub const ANSWER_PROMPT: &str = r#"Answer the user's question using the website content below. The content includes text read from images on the site.

Website content:
{sources}

Question: {question}

Instructions:
1. Answer only from the website content above.
2. If the content does not contain the answer, say so plainly.
3. Cite the sources you used by their number, e.g. (Source 2).
4. Keep the answer concise and helpful.
5. When quoting a specific fact, name the source it came from."#;

/// Label and body of each retrieved chunk, numbered from 1.
pub fn format_sources(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Source {} (from {}):\n{}", i + 1, r.metadata.title, r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Substitute `{name}` placeholders in one pass over `template`.
///
/// Substituted values are never scanned again, so placeholder-like text
/// inside scraped content stays as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find_map(|(name, value)| {
            let after = tail.strip_prefix('{')?.strip_prefix(name)?.strip_prefix('}')?;
            Some((after, value))
        });
        match hit {
            Some((after, value)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Format the answer prompt.
pub fn format_answer_prompt(question: &str, results: &[SearchResult]) -> String {
    let sources = format_sources(results);
    fill(
        ANSWER_PROMPT,
        &[("sources", sources.as_str()), ("question", question.trim())],
    )
}
