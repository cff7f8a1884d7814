//! Scripts run against a resolved element bound to `arguments[0]`

/// Fire a blur on the element
pub const BLUR_SCRIPT: &str = "arguments[0].blur();";

/// Scroll the element into view, aligning its top edge with the top of the
/// viewport or its bottom edge with the bottom
pub fn scroll_into_view(align_to_top: bool) -> String {
    format!("arguments[0].scrollIntoView({});", align_to_top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_into_view() {
        assert_eq!(scroll_into_view(true), "arguments[0].scrollIntoView(true);");
        assert_eq!(scroll_into_view(false), "arguments[0].scrollIntoView(false);");
    }
}
