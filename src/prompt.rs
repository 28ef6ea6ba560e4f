//! The instruction template sent to the answer model.
use thiserror::Error;

/// Placeholder replaced with the retrieved chunk texts.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";
/// Placeholder replaced with the user's question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Answer only from context, format with bullets and bold, admit ignorance
/// with a fixed sentence, never make things up.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Answer the question as detailed as possible from the provided context.

- Use **bullet points** for lists.
- Separate different sections into **clear paragraphs**.
- Use *bold text* for important details.
- If the answer is not in the context, say 'Apologies! There is no information available regarding your query.'
- Do **not** provide incorrect answers.

Context:
{context}

Question:
{question}

Answer:
";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// A validated template containing both placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder(placeholder));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fills the template. Chunks are separated by blank lines.
    ///
    /// Substitution is single-pass: placeholder text that appears inside a
    /// chunk or the question is left alone.
    pub fn render<S: AsRef<str>>(&self, chunks: &[S], question: &str) -> String {
        let context = chunks
            .iter()
            .map(|chunk| chunk.as_ref())
            .collect::<Vec<&str>>()
            .join("\n\n");

        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        loop {
            let next = [
                (rest.find(CONTEXT_PLACEHOLDER), CONTEXT_PLACEHOLDER, context.as_str()),
                (rest.find(QUESTION_PLACEHOLDER), QUESTION_PLACEHOLDER, question),
            ]
            .into_iter()
            .filter_map(|(pos, placeholder, value)| pos.map(|p| (p, placeholder, value)))
            .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}
