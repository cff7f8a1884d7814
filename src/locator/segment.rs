//! Single locator segments

use std::fmt;

/// Strategy used to interpret a selector string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Id,
    Css,
    XPath,
    TagName,
    ClassName,
    Name,
    LinkText,
    PartialLinkText,
}

impl Strategy {
    /// Label used in chain renderings and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
            Strategy::TagName => "tag",
            Strategy::ClassName => "class",
            Strategy::Name => "name",
            Strategy::LinkText => "link",
            Strategy::PartialLinkText => "partial-link",
        }
    }

    /// Whether a segment of this strategy can be written as a CSS selector
    pub fn renders_as_css(&self) -> bool {
        !matches!(
            self,
            Strategy::XPath | Strategy::LinkText | Strategy::PartialLinkText
        )
    }

    /// Whether a segment of this strategy can be written as an XPath step
    pub fn renders_as_xpath(&self) -> bool {
        !matches!(self, Strategy::Css)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a DOM query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    selector: String,
}

impl Locator {
    /// Segment with an explicit strategy
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, selector)
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Strategy::Id, id)
    }

    /// Match by element name, e.g. `input`
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(Strategy::TagName, tag)
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, class)
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Strategy::Name, name)
    }

    /// Anchor whose normalized text equals `text`
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, text)
    }

    /// Anchor whose normalized text contains `text`
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::PartialLinkText, text)
    }

    /// How the selector is interpreted
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Raw selector text
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// CSS rendering of this segment, if its strategy has one
    pub fn css_fragment(&self) -> Option<String> {
        let value = &self.selector;
        match self.strategy {
            Strategy::Id => Some(format!("[id=\"{}\"]", value)),
            Strategy::ClassName => Some(format!(".{}", value)),
            Strategy::Name => Some(format!("[name=\"{}\"]", value)),
            Strategy::Css | Strategy::TagName => Some(value.clone()),
            Strategy::XPath | Strategy::LinkText | Strategy::PartialLinkText => None,
        }
    }

    /// XPath rendering of this segment, if its strategy has one
    pub fn xpath_fragment(&self) -> Option<String> {
        let value = &self.selector;
        match self.strategy {
            Strategy::Id => Some(format!("//*[@id=\"{}\"]", value)),
            Strategy::ClassName => Some(format!(
                "//*[contains(concat(\" \", normalize-space(@class), \" \"),\"{}\")]",
                value
            )),
            Strategy::Name => Some(format!("//*[@name=\"{}\"]", value)),
            Strategy::LinkText => Some(format!("//a[normalize-space()=\"{}\"]", value)),
            Strategy::PartialLinkText => {
                Some(format!("//a[contains(normalize-space(),\"{}\")]", value))
            }
            Strategy::TagName => Some(format!("//{}", value)),
            Strategy::XPath => Some(value.clone()),
            Strategy::Css => None,
        }
    }

    /// Make an absolute XPath usable as a search from an element scope.
    ///
    /// Other strategies are already scoped by the protocol.
    pub fn relative_to_scope(&self) -> Locator {
        if self.strategy == Strategy::XPath && self.selector.starts_with('/') {
            Locator::xpath(format!(".{}", self.selector))
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_fragments() {
        assert_eq!(Locator::id("app").css_fragment().unwrap(), "[id=\"app\"]");
        assert_eq!(Locator::class_name("ia_button").css_fragment().unwrap(), ".ia_button");
        assert_eq!(Locator::name("user").css_fragment().unwrap(), "[name=\"user\"]");
        assert_eq!(Locator::tag("input").css_fragment().unwrap(), "input");
        assert!(Locator::xpath("//div").css_fragment().is_none());
        assert!(Locator::link_text("Home").css_fragment().is_none());
    }

    #[test]
    fn test_xpath_fragments() {
        assert_eq!(Locator::id("app").xpath_fragment().unwrap(), "//*[@id=\"app\"]");
        assert_eq!(Locator::tag("input").xpath_fragment().unwrap(), "//input");
        assert_eq!(
            Locator::link_text("Home").xpath_fragment().unwrap(),
            "//a[normalize-space()=\"Home\"]"
        );
        assert!(Locator::css("div.app").xpath_fragment().is_none());
    }

    #[test]
    fn test_relative_to_scope() {
        assert_eq!(
            Locator::xpath("//span").relative_to_scope(),
            Locator::xpath(".//span")
        );
        assert_eq!(
            Locator::xpath("./span").relative_to_scope(),
            Locator::xpath("./span")
        );
        assert_eq!(Locator::css("span").relative_to_scope(), Locator::css("span"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::css("button.submit").to_string(), "css=button.submit");
    }
}
