//! Letter counting tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{HandlerResult, ParamSpec, ParamType, ToolHandler, ToolSchema};

/// Counts case-insensitive occurrences of a letter in a word
pub struct LetterCounterTool;

#[derive(Deserialize)]
struct LetterCounterArgs {
    word: String,
    letter: String,
}

#[async_trait]
impl ToolHandler for LetterCounterTool {
    fn name(&self) -> &str {
        "letter_counter"
    }

    fn description(&self) -> &str {
        "Count occurrences of a specific letter in a word."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .param(ParamSpec::required(
                "word",
                ParamType::String,
                "The input word to search in",
            ))
            .param(ParamSpec::required(
                "letter",
                ParamType::String,
                "The specific letter to count",
            ))
    }

    async fn call(&self, input: &Map<String, Value>) -> HandlerResult {
        let args: LetterCounterArgs = serde_json::from_value(Value::Object(input.clone()))?;

        if args.letter.chars().count() != 1 {
            return Err("The 'letter' parameter must be a single character".into());
        }

        let needle = args.letter.to_lowercase();
        let count = args.word.to_lowercase().matches(needle.as_str()).count();
        Ok(json!(count))
    }
}
