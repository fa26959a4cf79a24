//! Turning ranked chunks into an answer.
//!
//! Only the offline extractive synthesizer ships here. `build_context` and
//! `grounded_prompt` render what an external model would need, so a caller
//! can plug in its own `Synthesizer`.

use docqa_core::config::CitationMode;
use docqa_core::types::Chunk;
use docqa_core::Result;
use docqa_text::{PunctuationSplitter, SentenceSplitter};
use docqa_vector::RetrievalResult;

pub const NOTHING_FOUND: &str = "I couldn't find anything relevant in the index.";

/// Word budget of one gist line.
pub const WORDS_PER_LINE: usize = 12;

pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    fn synthesize(&self, question: &str, results: &[RetrievalResult<'_>]) -> Result<String>;
}

/// Outcome of [`crate::Pipeline::answer`]. Ranked chunks are returned
/// separately and never depend on which variant this is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    Answer(String),
    Unavailable(String),
}

impl Synthesis {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Answer(text) => Some(text),
            Self::Unavailable(_) => None,
        }
    }
}

/// Echoes the leading lines of every retrieved chunk under a summary header.
///
/// Chunk text has its line breaks collapsed, so a "line" is a sentence, and
/// the whole gist is held to `lines_per_chunk * WORDS_PER_LINE` words.
#[derive(Debug, Clone)]
pub struct ExtractiveSynthesizer {
    citations: CitationMode,
    lines_per_chunk: usize,
}

impl ExtractiveSynthesizer {
    pub fn new(citations: CitationMode) -> Self {
        Self { citations, lines_per_chunk: 2 }
    }

    pub fn with_lines_per_chunk(mut self, n: usize) -> Self {
        self.lines_per_chunk = n.max(1);
        self
    }
}

impl Default for ExtractiveSynthesizer {
    fn default() -> Self {
        Self::new(CitationMode::default())
    }
}

impl Synthesizer for ExtractiveSynthesizer {
    fn name(&self) -> &str {
        "extractive"
    }

    fn synthesize(&self, question: &str, results: &[RetrievalResult<'_>]) -> Result<String> {
        if results.is_empty() {
            return Ok(NOTHING_FOUND.to_string());
        }
        let mut lines = vec![format!("Offline summary for: {question}")];
        for r in results {
            let gist = gist(r.chunk, self.lines_per_chunk);
            lines.push(match self.citations {
                CitationMode::Inline => {
                    format!("• [chunk:{} score:{:.3}] {gist}", r.chunk.ordinal, r.score)
                }
                CitationMode::Refs | CitationMode::None => format!("• {gist}"),
            });
        }
        if self.citations == CitationMode::Refs {
            lines.push(String::new());
            lines.push("Sources:".to_string());
            for r in results {
                lines.push(format!("- [chunk:{}] score {:.3}", r.chunk.ordinal, r.score));
            }
        }
        Ok(lines.join("\n"))
    }
}

fn gist(chunk: &Chunk, lines: usize) -> String {
    let text = &chunk.text;
    let splitter = PunctuationSplitter::for_language(chunk.language);
    let leading = match splitter.detect_sentences(text).into_iter().take(lines).last() {
        Some(last) => &text[..last.end],
        None => text.as_str(),
    };
    let budget = lines * WORDS_PER_LINE;
    let words: Vec<&str> = leading.split_whitespace().collect();
    if words.len() > budget {
        format!("{}…", words[..budget].join(" "))
    } else {
        words.join(" ")
    }
}

/// Retrieved chunks as `[chunk:ID]`-labelled blocks, in rank order.
pub fn build_context(results: &[RetrievalResult<'_>]) -> String {
    results
        .iter()
        .map(|r| format!("[chunk:{}]\n{}\n", r.chunk.ordinal, r.chunk.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instruction prompt asking a model to answer only from `context`, citing
/// sources as `citations` dictates.
pub fn grounded_prompt(question: &str, context: &str, citations: CitationMode) -> String {
    let cite_clause = match citations {
        CitationMode::Inline => "Cite sources inline using the labels like [chunk:ID] when making factual claims.",
        CitationMode::Refs => {
            "Do NOT include [chunk:ID] inline. After the answer, add a 'Sources:' list that names the chunk IDs you used."
        }
        CitationMode::None => "Do NOT include any [chunk:ID] tags or source IDs in the final answer.",
    };
    format!(
        "You are answering a question using ONLY the provided context.\n\
         If the answer is not contained in the context, say you don't know.\n\
         Be concise and clear. {cite_clause}\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer:"
    )
}
