//! Translate key strings into Input domain events

use crate::session::keys;

/// A key the Input domain needs dispatched as keyDown/keyUp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDefinition {
    pub key: &'static str,
    pub code: &'static str,
    pub virtual_key_code: u32,
}

const fn key(key: &'static str, virtual_key_code: u32) -> KeyDefinition {
    KeyDefinition {
        key,
        code: key,
        virtual_key_code,
    }
}

/// Definition for a special key code, `None` for text and unknown codes
pub fn key_definition(c: char) -> Option<KeyDefinition> {
    Some(match c {
        keys::BACKSPACE => key("Backspace", 8),
        keys::TAB | '\t' => key("Tab", 9),
        keys::ENTER | '\n' | '\r' => key("Enter", 13),
        keys::ESCAPE => key("Escape", 27),
        keys::END => key("End", 35),
        keys::HOME => key("Home", 36),
        keys::ARROW_LEFT => key("ArrowLeft", 37),
        keys::ARROW_RIGHT => key("ArrowRight", 39),
        keys::DELETE => key("Delete", 46),
        _ => return None,
    })
}

/// One Input domain step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    /// Inserted with `Input.insertText`
    Text(String),
    /// Dispatched with `Input.dispatchKeyEvent`
    Key(KeyDefinition),
}

/// Split `input` into text runs and key presses. Control characters and
/// unknown key codes have no text to insert and are dropped.
pub fn plan(input: &str) -> Vec<Keystroke> {
    let mut steps = Vec::new();
    let mut text = String::new();
    for c in input.chars() {
        if let Some(def) = key_definition(c) {
            if !text.is_empty() {
                steps.push(Keystroke::Text(std::mem::take(&mut text)));
            }
            steps.push(Keystroke::Key(def));
        } else if !c.is_control() && !keys::is_special(c) {
            text.push(c);
        }
    }
    if !text.is_empty() {
        steps.push(Keystroke::Text(text));
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_groups_text_between_keys() {
        let input = format!("ab{}{}c\u{1b}d", keys::ARROW_RIGHT, keys::BACKSPACE);
        assert_eq!(
            plan(&input),
            vec![
                Keystroke::Text("ab".into()),
                Keystroke::Key(key("ArrowRight", 39)),
                Keystroke::Key(key("Backspace", 8)),
                Keystroke::Text("cd".into()),
            ]
        );
    }

    #[test]
    fn test_newline_presses_enter() {
        assert_eq!(plan("\n"), vec![Keystroke::Key(key("Enter", 13))]);
        assert!(plan("\u{E0FF}").is_empty());
    }
}
