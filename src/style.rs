//! Style Registry
//!
//! Named text styles (color plus attribute flags) with built-in entries for
//! the standard color names and the `b`/`i`/`u`/`r` shorthands. Styles are
//! parsed from format strings like `"bold color=#e80 on navy"` and can be
//! redefined at any time for theming.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::color::{html_color_names, Color};

bitflags! {
    /// Text attribute flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attrs: u8 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const REVERSE = 1 << 3;
    }
}

/// A text style: optional colors plus attribute changes
///
/// Attributes are tracked as explicit on/off sets so that a nested
/// `bold=off` can cancel an enclosing bold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub set: Attrs,
    pub unset: Attrs,
}

impl Style {
    /// Style with no effect
    pub fn plain() -> Self {
        Self::default()
    }

    /// Style with only a foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    /// Style with only an attribute set
    pub fn attr(attrs: Attrs) -> Self {
        Self {
            set: attrs,
            ..Self::default()
        }
    }

    /// Apply `other` on top of this style
    pub fn merge(self, other: Style) -> Style {
        Style {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            set: (self.set - other.unset) | other.set,
            unset: (self.unset - other.set) | other.unset,
        }
    }

    /// The attributes active under this style
    pub fn attrs(&self) -> Attrs {
        self.set
    }

    /// Swap foreground into background, used by the `on <style>` prefix
    fn as_background(self) -> Style {
        Style {
            fg: None,
            bg: self.fg.or(self.bg),
            set: Attrs::empty(),
            unset: Attrs::empty(),
        }
    }
}

/// Mapping from style name to definition, with mutable redefinition
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: HashMap<String, Style>,
}

impl StyleRegistry {
    /// Create a registry seeded with the built-in styles
    ///
    /// Built-ins: `b`/`bold`, `i`/`italic`, `u`/`underline`, `r`/`reverse`,
    /// every HTML/ANSI color name as a foreground style, and the internal
    /// `hint`, `bracematch`, and `error` styles used by the renderer.
    pub fn new() -> Self {
        let mut styles = HashMap::new();

        for (name, attrs) in [
            ("b", Attrs::BOLD),
            ("bold", Attrs::BOLD),
            ("i", Attrs::ITALIC),
            ("italic", Attrs::ITALIC),
            ("u", Attrs::UNDERLINE),
            ("underline", Attrs::UNDERLINE),
            ("r", Attrs::REVERSE),
            ("reverse", Attrs::REVERSE),
        ] {
            styles.insert(name.to_string(), Style::attr(attrs));
        }

        for (name, color) in html_color_names() {
            styles.insert(name.to_string(), Style::fg(color));
        }

        styles.insert("hint".to_string(), Style::fg(Color::Ansi(8)));
        styles.insert(
            "bracematch".to_string(),
            Style {
                fg: Some(Color::Ansi(14)),
                bg: None,
                set: Attrs::BOLD,
                unset: Attrs::empty(),
            },
        );
        styles.insert(
            "error".to_string(),
            Style {
                fg: Some(Color::Ansi(9)),
                bg: None,
                set: Attrs::BOLD | Attrs::UNDERLINE,
                unset: Attrs::empty(),
            },
        );

        Self { styles }
    }

    /// Register or overwrite a named style from a format string
    pub fn define(&mut self, name: &str, fmt: &str) {
        let style = self.parse(fmt);
        self.styles.insert(name.to_string(), style);
    }

    /// Look up a style by name
    pub fn get(&self, name: &str) -> Option<Style> {
        self.styles.get(name).copied().or_else(|| {
            // Color names double as standalone styles even when shadowed out
            // of the registry by a redefinition of an unrelated entry.
            Color::parse(name).map(Style::fg)
        })
    }

    /// Parse a style format string into a style
    ///
    /// Tokens are separated by whitespace: `color=<spec>`, `bgcolor=<spec>`,
    /// `bold|italic|underline|reverse[=on|off]`, bare style names, and the
    /// `on <style>` prefix which applies the following style as background.
    /// Unknown tokens are ignored rather than failing the whole string.
    pub fn parse(&self, fmt: &str) -> Style {
        let mut style = Style::plain();
        let mut background_next = false;

        for token in fmt.split_whitespace() {
            if token.eq_ignore_ascii_case("on") {
                background_next = true;
                continue;
            }

            let parsed = self.parse_token(token);
            match parsed {
                Some(s) => {
                    let s = if background_next { s.as_background() } else { s };
                    style = style.merge(s);
                }
                None => log::debug!("ignoring unknown style token {:?}", token),
            }
            background_next = false;
        }

        style
    }

    fn parse_token(&self, token: &str) -> Option<Style> {
        if let Some((key, value)) = token.split_once('=') {
            return match key.to_lowercase().as_str() {
                "color" | "fg" => Color::parse(value).map(Style::fg),
                "bgcolor" | "bg" => Color::parse(value).map(|c| Style {
                    bg: Some(c),
                    ..Style::default()
                }),
                "bold" => Some(attr_toggle(Attrs::BOLD, value)),
                "italic" => Some(attr_toggle(Attrs::ITALIC, value)),
                "underline" => Some(attr_toggle(Attrs::UNDERLINE, value)),
                "reverse" => Some(attr_toggle(Attrs::REVERSE, value)),
                _ => None,
            };
        }
        self.get(&token.to_lowercase())
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn attr_toggle(attr: Attrs, value: &str) -> Style {
    if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("false") {
        Style {
            unset: attr,
            ..Style::default()
        }
    } else {
        Style::attr(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shorthands() {
        let registry = StyleRegistry::new();
        assert_eq!(registry.get("b").unwrap().attrs(), Attrs::BOLD);
        assert_eq!(registry.get("u").unwrap().attrs(), Attrs::UNDERLINE);
        assert!(registry.get("red").unwrap().fg.is_some());
    }

    #[test]
    fn test_parse_format_string() {
        let registry = StyleRegistry::new();
        let style = registry.parse("bold color=#ff0000 on navy");
        assert!(style.attrs().contains(Attrs::BOLD));
        assert_eq!(style.fg, Some(Color::Rgb(0xff, 0, 0)));
        assert_eq!(style.bg, Some(Color::Rgb(0, 0, 0x80)));
    }

    #[test]
    fn test_attr_off_cancels_enclosing() {
        let registry = StyleRegistry::new();
        let outer = registry.parse("bold italic");
        let inner = registry.parse("bold=off");
        let merged = outer.merge(inner);
        assert!(!merged.attrs().contains(Attrs::BOLD));
        assert!(merged.attrs().contains(Attrs::ITALIC));
    }

    #[test]
    fn test_define_and_redefine() {
        let mut registry = StyleRegistry::new();
        registry.define("keyword", "bold color=ansi-blue");
        assert!(registry.get("keyword").unwrap().attrs().contains(Attrs::BOLD));

        registry.define("keyword", "underline");
        let redefined = registry.get("keyword").unwrap();
        assert!(!redefined.attrs().contains(Attrs::BOLD));
        assert!(redefined.attrs().contains(Attrs::UNDERLINE));
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let registry = StyleRegistry::new();
        let style = registry.parse("frobnicate bold color=bogus");
        assert_eq!(style.attrs(), Attrs::BOLD);
        assert_eq!(style.fg, None);
    }
}
