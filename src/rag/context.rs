// Prompt assembly from fused recipe results
use serde_json::Value;

use crate::errors::{BakeError, Result};
use crate::rag::reranking::FusedResult;

/// Answer the model must give when no recipe fits
pub const NO_RECIPE_FALLBACK: &str = "I don’t have a recipe for that.";

/// Separator between rendered recipe blocks
pub const CONTEXT_SEPARATOR: &str = ";;";

/// Payload fields every rendered recipe needs, in display order
pub const RECIPE_FIELDS: [&str; 6] = [
    "name",
    "difficult",
    "total_cooking_min",
    "kcal",
    "ingredients",
    "steps",
];

/// Default generation prompt. Placeholders: `{user_query}`,
/// `{number_of_results}`, `{context_block}`.
pub const RECIPE_PROMPT_TEMPLATE: &str = r#"
You are a helpful baking assistant. A client has asked the following question:

Client question:
{user_query}

Here are the top {number_of_results} potentially relevant recipes retrieved from the knowledge base:
{context_block}

Task:
- Choose the single most relevant document that best answers the client's question.
- Return the recipe from that document only.
- Do NOT combine multiple recipes together.
- Provide the recipe in natural human-readable format, including all of the following information:
    - Recipe name / title
    - Difficulty level
    - Ingredients list
    - Step-by-step instructions
    - Total cooking time in minutes
    - Calories (kcal)
- If none of the documents are relevant, respond: "{fallback}"

Provide your answer as a step-by-step baking recipe.
"#;

/// Renders fused recipes and the user query into one generation prompt
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: String,
}

impl PromptAssembler {
    /// Assembler with the built-in recipe prompt
    pub fn new() -> Self {
        Self::with_template(RECIPE_PROMPT_TEMPLATE)
    }

    /// Assembler with a custom template using the same placeholders
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render one block per result; a missing or null field is an error
    pub fn render_blocks(&self, results: &[FusedResult]) -> Result<Vec<String>> {
        results.iter().map(render_recipe_block).collect()
    }

    /// Build the final, trimmed prompt
    pub fn assemble(&self, query: &str, results: &[FusedResult]) -> Result<String> {
        let blocks = self.render_blocks(results)?;
        let context = blocks.join(CONTEXT_SEPARATOR);
        let count = blocks.len().to_string();

        let prompt = fill_placeholders(
            &self.template,
            &[
                ("user_query", query),
                ("number_of_results", &count),
                ("context_block", &context),
                ("fallback", NO_RECIPE_FALLBACK),
            ],
        );

        Ok(prompt.trim().to_string())
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn render_recipe_block(result: &FusedResult) -> Result<String> {
    let mut lines = Vec::with_capacity(RECIPE_FIELDS.len());

    for field in RECIPE_FIELDS {
        let value = match result.payload.get(field) {
            Some(Value::Null) | None => {
                return Err(BakeError::MissingField {
                    id: result.id.clone(),
                    field: field.to_string(),
                })
            }
            Some(value) => render_value(value),
        };
        lines.push(format!("{:<20}:   {}", format!("\"{}\"", field), value));
    }

    Ok(lines.join(",\n").trim().to_string())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Single pass substitution of `{name}` placeholders; substituted text is
/// never scanned again, unknown placeholders stay as they are.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let replaced = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
