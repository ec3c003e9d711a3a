//! Context assembly: turns ranked chunks plus chat history into the message
//! array sent to the generator, with a parallel source-attribution list.

use std::fmt::Write;

use crate::models::{ChatTurn, RetrievalResult, SourceRef};

const SYSTEM_PROMPT: &str = "You are an expert technical documentation assistant for a \
multi-repository codebase (PHP/Symfony backend, Vue/Nuxt frontend, and a CMS).\n\
Rules:\n\
1. Never say \"based on the context\" or \"according to the documentation\" - answer naturally.\n\
2. If the provided documentation contains the answer, use it precisely but conversationally.\n\
3. If it does not but the question is general programming knowledge, answer from expertise.\n\
4. If you don't know something specific to this codebase, say so honestly.\n\
5. Cite file names naturally when referring to specific implementations.\n\
6. Use markdown for code, lists, and emphasis when helpful.";

/// Everything the generation step needs, plus attribution for the caller.
#[derive(Debug)]
pub struct AssembledContext {
    pub messages: Vec<ChatTurn>,
    /// Exactly the chunks whose blocks made it into the prompt after
    /// truncation, in prompt order.
    pub sources: Vec<SourceRef>,
    /// True iff at least one retrieved block actually made it into the
    /// prompt. Stricter than "results were non-empty after threshold
    /// filtering": when even the first block exceeds `max_context_chars`
    /// the prompt carries no documentation, so this is false and
    /// generation takes the fallback prompt. `sources` agrees with it.
    pub used_context: bool,
}

/// Render ranked results and history into the final message array.
///
/// Blocks are emitted in re-ranker order and dropped from the tail (lowest
/// priority first) once the total would exceed `max_context_chars`. History
/// is bounded to the most recent `max_history_turns` turns, oldest first
/// out; only user/assistant roles are kept.
pub fn assemble(
    results: &[RetrievalResult],
    chat_history: &[ChatTurn],
    question: &str,
    max_context_chars: usize,
    max_history_turns: usize,
) -> AssembledContext {
    let (context_block, sources) = build_context(results, max_context_chars);
    let used_context = !sources.is_empty();

    let mut messages = Vec::with_capacity(max_history_turns + 2);
    messages.push(ChatTurn::system(SYSTEM_PROMPT));
    messages.extend(bound_history(chat_history, max_history_turns));

    let user_content = if used_context {
        format!(
            "Question: {question}\n\n\
             Here is relevant documentation to help answer:\n{context_block}\n\
             Answer the question based on the documentation above. If it doesn't \
             contain the answer, use your general knowledge."
        )
    } else {
        format!(
            "Question: {question}\n\n\
             No specific documentation was found for this question. Answer from \
             general knowledge, and state that no specific source was found in \
             the codebase docs."
        )
    };
    messages.push(ChatTurn::user(user_content));

    AssembledContext {
        messages,
        sources,
        used_context,
    }
}

/// Render each result as a labeled block and concatenate until the budget is
/// spent. Returns the context string and the sources actually included.
pub fn build_context(
    results: &[RetrievalResult],
    max_context_chars: usize,
) -> (String, Vec<SourceRef>) {
    let mut context = String::new();
    let mut sources = Vec::new();

    for (i, result) in results.iter().enumerate() {
        let mut block = String::new();
        write!(
            block,
            "[{n}] File: {file}\nPath: {path}\nCategory: {category}\nRelevance: {score:.3}\n{text}\n",
            n = i + 1,
            file = result.chunk.file_name,
            path = result.chunk.source_path,
            category = category_label(result),
            score = result.relevance_score,
            text = result.chunk.text,
        )
        .expect("writing to String cannot fail");

        let separator = if context.is_empty() { 0 } else { SEPARATOR.len() };
        if context.len() + separator + block.len() > max_context_chars {
            // Budget exhausted: this and every lower-ranked block is dropped.
            break;
        }
        if !context.is_empty() {
            context.push_str(SEPARATOR);
        }
        context.push_str(&block);

        sources.push(SourceRef {
            file: result.chunk.file_name.clone(),
            path: result.chunk.source_path.clone(),
            category: result.chunk.category,
            relevance_score: round3(result.relevance_score),
        });
    }

    (context, sources)
}

const SEPARATOR: &str = "\n---\n";

fn category_label(result: &RetrievalResult) -> &'static str {
    match result.chunk.category {
        crate::models::Category::Backend => "backend",
        crate::models::Category::Frontend => "frontend",
        crate::models::Category::Other => "other",
    }
}

fn bound_history(history: &[ChatTurn], max_turns: usize) -> Vec<ChatTurn> {
    let kept: Vec<ChatTurn> = history
        .iter()
        .filter(|t| t.role == "user" || t.role == "assistant")
        .cloned()
        .collect();
    let skip = kept.len().saturating_sub(max_turns);
    kept.into_iter().skip(skip).collect()
}

fn round3(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}
