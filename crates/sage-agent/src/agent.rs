use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use sage_core::{ConversationLog, ConversationTurn};
use sage_llm::{GenerationError, Generator};
use sage_retrieval::{RetrievalError, Retriever};

use crate::prompt::build_prompt;

/// Orchestration errors, one variant per external collaborator
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Composes retrieval, conversation history, and generation into a single
/// per-query operation.
pub struct RagAgent {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    max_history_turns: usize,
}

impl RagAgent {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        max_history_turns: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            max_history_turns,
        }
    }

    /// Answer `query` in the context of `log`.
    ///
    /// Requires at least one retrieval match; an answer generated without
    /// context would be misleading, so an empty result set is an error
    /// rather than a fallback. The log is mutated only after generation
    /// succeeds: a user turn stamped at query receipt, then an assistant
    /// turn stamped at completion receipt carrying the generated answer.
    pub async fn answer(
        &self,
        log: &mut ConversationLog,
        query: &str,
    ) -> Result<String, AgentError> {
        let received_at = Utc::now();

        let results = self.retriever.query(query).await?;
        let best = results
            .into_iter()
            .next()
            .ok_or(RetrievalError::NoMatch)?;
        debug!(score = best.score, "selected top retrieval match");

        let history = log.render(self.max_history_turns);
        let prompt = build_prompt(&best.text, &history, query);

        let answer = self.generator.complete(&prompt).await?;
        let completed_at = Utc::now();

        log.push(ConversationTurn::user(query, received_at));
        log.push(ConversationTurn::assistant(answer.clone(), completed_at));

        Ok(answer)
    }
}
