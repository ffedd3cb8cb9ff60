// nugs/src/cli/prompt.rs
use dialoguer::{Input, Select};

use nugs_common::error::{NugsError, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum FrameworkChoice {
    NoneDeclared,
    Only(String),
    Ask,
}

pub fn choose_framework(frameworks: &[String]) -> FrameworkChoice {
    match frameworks {
        [] => FrameworkChoice::NoneDeclared,
        [only] => FrameworkChoice::Only(only.clone()),
        _ => FrameworkChoice::Ask,
    }
}

/// Asks for a line of text; the answer is trimmed and may be empty.
pub fn ask(prompt: &str) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| NugsError::IoError(format!("Failed to read input: {e}")))?;
    Ok(answer.trim().to_string())
}

/// Interactive framework menu. `None` when the user backs out.
pub fn select_framework(frameworks: &[String]) -> Result<Option<String>> {
    let selection = Select::new()
        .with_prompt("Select the target framework")
        .items(frameworks)
        .default(0)
        .interact_opt()
        .map_err(|e| NugsError::IoError(format!("Failed to read selection: {e}")))?;
    Ok(selection.and_then(|index| frameworks.get(index).cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_framework_is_auto_selected() {
        assert_eq!(choose_framework(&[]), FrameworkChoice::NoneDeclared);
        assert_eq!(
            choose_framework(&["net8.0".to_string()]),
            FrameworkChoice::Only("net8.0".to_string())
        );
        assert_eq!(
            choose_framework(&["net6.0".to_string(), "net8.0".to_string()]),
            FrameworkChoice::Ask
        );
    }
}
