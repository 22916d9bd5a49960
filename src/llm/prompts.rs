//! Deterministic prompt templates for expense extraction. The category
//! vocabulary is enumerated verbatim to steer the model toward the closed
//! set, but the validator, not the prompt, remains the enforcement point.

use crate::category::Category;

/// Field contract shared by both templates. Each field is nullable and the
/// model is told to return `[]` when nothing is extractable, so an empty
/// array is a well-formed "no expenses" answer rather than an error.
const FIELD_CONTRACT: &str = r#"- "amount": number (float or integer)
- "category": a relevant category word or phrase
- "description": optional brief description or null
- "date": optional date string in ISO format (YYYY-MM-DD), or null if not specified"#;

pub fn text_extraction_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text which may contain multiple expense entries. Extract each expense with the following details:
{contract}

Return ONLY a JSON array of objects, each with keys: "amount", "category", "description", "date".
Valid categories include: {categories}.
If the category is not recognized, use "Other".
If you cannot extract any expenses, return an empty JSON array [].

Text to analyze: "{text}"

JSON Output:"#,
        contract = FIELD_CONTRACT,
        categories = Category::prompt_list(),
        text = text,
    )
}

pub fn image_extraction_prompt() -> String {
    format!(
        r#"Analyze the attached image, which may contain multiple expense entries (e.g., a photo of a receipt). Extract each expense with the following details:
{contract}

Return ONLY a JSON array of objects, each with keys: "amount", "category", "description", "date".
Valid categories include: {categories}.
If the category is not recognized, use "Other".
If you cannot extract any expenses, return an empty JSON array [].

JSON Output:"#,
        contract = FIELD_CONTRACT,
        categories = Category::prompt_list(),
    )
}
