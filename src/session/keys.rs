//! Special keys, encoded the WebDriver way as private-use code points

pub const TAB: char = '\u{E004}';
pub const ENTER: char = '\u{E007}';
pub const ESCAPE: char = '\u{E00C}';
pub const BACKSPACE: char = '\u{E003}';
pub const END: char = '\u{E010}';
pub const HOME: char = '\u{E011}';
pub const ARROW_LEFT: char = '\u{E012}';
pub const ARROW_RIGHT: char = '\u{E014}';
pub const DELETE: char = '\u{E017}';

/// True for key codes that are keystrokes rather than text
pub fn is_special(c: char) -> bool {
    ('\u{E000}'..='\u{F8FF}').contains(&c)
}

/// Keystrokes that clear a field holding `current`: move to the end, then
/// delete one character per displayed character.
pub fn clear_sequence(current: &str) -> String {
    let len = current.chars().count();
    let mut keys = String::with_capacity(len * 2 * ARROW_RIGHT.len_utf8());
    keys.extend(std::iter::repeat(ARROW_RIGHT).take(len));
    keys.extend(std::iter::repeat(BACKSPACE).take(len));
    keys
}
