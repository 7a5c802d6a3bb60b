/// Persona and style instructions prefixed to every generation prompt.
const PERSONA: &str = "You are a friendly assistant answering questions on behalf of the site \
owner. Answer using only the provided context. Be concise and conversational. \
If the context does not cover the question, say so instead of guessing.";

/// Compose the generation prompt from the retrieved passage, the rendered
/// conversation history, and the new query.
pub fn build_prompt(passage: &str, history: &str, query: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(PERSONA);
    prompt.push_str("\n\nContext:\n");
    prompt.push_str(passage);
    if !history.is_empty() {
        prompt.push_str("\n\nConversation so far:\n");
        prompt.push_str(history);
    }
    prompt.push_str("\n\nQuestion: ");
    prompt.push_str(query);
    prompt.push_str("\nAnswer:");
    prompt
}
