#[cfg(test)]
mod tests;

use std::fmt;

use tracing::debug;

use crate::llm::GeminiClient;
use crate::retriever::{DEFAULT_TOP_K, Retriever};

/// Shown when retrieval produces no context; the model is never invoked
pub const NO_CONTEXT_MESSAGE: &str =
    "I couldn't find any relevant information in the database to answer your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Insertion-ordered conversation history, held only for the lifetime of one
/// interactive session and never persisted
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push_user(&mut self, content: &str) {
        self.turns.push(Turn {
            role: Role::User,
            content: content.to_string(),
        });
    }

    #[inline]
    pub fn push_assistant(&mut self, content: &str) {
        self.turns.push(Turn {
            role: Role::Assistant,
            content: content.to_string(),
        });
    }

    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Wires one user question through retrieval and generation, recording both
/// sides of the exchange in the transcript
pub struct ChatSession {
    retriever: Retriever,
    llm: GeminiClient,
    transcript: Transcript,
    top_k: usize,
}

impl ChatSession {
    #[inline]
    pub fn new(retriever: Retriever, llm: GeminiClient) -> Self {
        Self {
            retriever,
            llm,
            transcript: Transcript::new(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Answer one question from indexed context.
    ///
    /// When retrieval yields nothing the fixed no-context message is returned
    /// without calling the model. Never fails: generation errors surface as
    /// degraded answer text.
    #[inline]
    pub async fn ask(&mut self, question: &str) -> String {
        self.transcript.push_user(question);

        let context = self.retriever.query(question, self.top_k).await;
        debug!("Retrieved {} context chunks", context.len());

        let answer = if context.is_empty() {
            NO_CONTEXT_MESSAGE.to_string()
        } else {
            let llm = self.llm.clone();
            let query = question.to_string();
            tokio::task::spawn_blocking(move || llm.generate_answer(&query, &context))
                .await
                .unwrap_or_else(|e| format!("I don't know (Error: {e})"))
        };

        self.transcript.push_assistant(&answer);
        answer
    }

    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[inline]
    pub fn retriever(&mut self) -> &mut Retriever {
        &mut self.retriever
    }
}
