//! Color Parsing and Capability Handling
//!
//! Parses color specifications (`#RRGGBB`, `#RGB`, HTML names, `ansi-<name>`,
//! `ansi256-<n>`), detects what the terminal can display, and downsamples
//! richer colors to the nearest supported palette entry.

use serde::{Deserialize, Serialize};

/// A resolved color value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// The terminal's default foreground/background
    Default,
    /// An entry of the 256-color palette (0-15 are the classic ANSI colors)
    Ansi(u8),
    /// A 24-bit color
    Rgb(u8, u8, u8),
}

/// What the terminal is able to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColorCapability {
    Monochrome,
    Ansi16,
    Ansi256,
    TrueColor,
}

/// HTML color names accepted in color specs and as standalone style names
const HTML_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0x00, 0x00, 0x00)),
    ("white", (0xff, 0xff, 0xff)),
    ("red", (0xff, 0x00, 0x00)),
    ("green", (0x00, 0x80, 0x00)),
    ("blue", (0x00, 0x00, 0xff)),
    ("yellow", (0xff, 0xff, 0x00)),
    ("cyan", (0x00, 0xff, 0xff)),
    ("magenta", (0xff, 0x00, 0xff)),
    ("gray", (0x80, 0x80, 0x80)),
    ("grey", (0x80, 0x80, 0x80)),
    ("silver", (0xc0, 0xc0, 0xc0)),
    ("maroon", (0x80, 0x00, 0x00)),
    ("olive", (0x80, 0x80, 0x00)),
    ("lime", (0x00, 0xff, 0x00)),
    ("aqua", (0x00, 0xff, 0xff)),
    ("teal", (0x00, 0x80, 0x80)),
    ("navy", (0x00, 0x00, 0x80)),
    ("fuchsia", (0xff, 0x00, 0xff)),
    ("purple", (0x80, 0x00, 0x80)),
    ("orange", (0xff, 0xa5, 0x00)),
    ("gold", (0xff, 0xd7, 0x00)),
    ("pink", (0xff, 0xc0, 0xcb)),
    ("brown", (0xa5, 0x2a, 0x2a)),
    ("coral", (0xff, 0x7f, 0x50)),
    ("crimson", (0xdc, 0x14, 0x3c)),
    ("darkblue", (0x00, 0x00, 0x8b)),
    ("darkgreen", (0x00, 0x64, 0x00)),
    ("darkred", (0x8b, 0x00, 0x00)),
    ("darkgray", (0xa9, 0xa9, 0xa9)),
    ("darkgrey", (0xa9, 0xa9, 0xa9)),
    ("dimgray", (0x69, 0x69, 0x69)),
    ("indigo", (0x4b, 0x00, 0x82)),
    ("ivory", (0xff, 0xff, 0xf0)),
    ("khaki", (0xf0, 0xe6, 0x8c)),
    ("lavender", (0xe6, 0xe6, 0xfa)),
    ("lightblue", (0xad, 0xd8, 0xe6)),
    ("lightgray", (0xd3, 0xd3, 0xd3)),
    ("lightgreen", (0x90, 0xee, 0x90)),
    ("lightyellow", (0xff, 0xff, 0xe0)),
    ("plum", (0xdd, 0xa0, 0xdd)),
    ("salmon", (0xfa, 0x80, 0x72)),
    ("skyblue", (0x87, 0xce, 0xeb)),
    ("slateblue", (0x6a, 0x5a, 0xcd)),
    ("tan", (0xd2, 0xb4, 0x8c)),
    ("tomato", (0xff, 0x63, 0x47)),
    ("turquoise", (0x40, 0xe0, 0xd0)),
    ("violet", (0xee, 0x82, 0xee)),
];

/// Names of the 16 classic ANSI palette entries, in palette order
const ANSI_NAMES: &[&str] = &[
    "black",
    "red",
    "green",
    "yellow",
    "blue",
    "magenta",
    "cyan",
    "white",
    "bright-black",
    "bright-red",
    "bright-green",
    "bright-yellow",
    "bright-blue",
    "bright-magenta",
    "bright-cyan",
    "bright-white",
];

/// RGB values of the 16 classic ANSI palette entries, used for downsampling
const ANSI16_RGB: &[(u8, u8, u8)] = &[
    (0x00, 0x00, 0x00),
    (0xcd, 0x00, 0x00),
    (0x00, 0xcd, 0x00),
    (0xcd, 0xcd, 0x00),
    (0x00, 0x00, 0xee),
    (0xcd, 0x00, 0xcd),
    (0x00, 0xcd, 0xcd),
    (0xe5, 0xe5, 0xe5),
    (0x7f, 0x7f, 0x7f),
    (0xff, 0x00, 0x00),
    (0x00, 0xff, 0x00),
    (0xff, 0xff, 0x00),
    (0x5c, 0x5c, 0xff),
    (0xff, 0x00, 0xff),
    (0x00, 0xff, 0xff),
    (0xff, 0xff, 0xff),
];

impl Color {
    /// Parse a color specification
    ///
    /// Accepts `#RRGGBB`, `#RGB`, an HTML color name, `ansi-<name>`, or
    /// `ansi256-<index>`. Returns `None` for anything else.
    pub fn parse(spec: &str) -> Option<Color> {
        let spec = spec.trim().to_lowercase();

        if let Some(hex) = spec.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(name) = spec.strip_prefix("ansi-") {
            let index = ANSI_NAMES.iter().position(|n| *n == name)?;
            return Some(Color::Ansi(index as u8));
        }
        if let Some(index) = spec.strip_prefix("ansi256-") {
            return index.parse::<u8>().ok().map(Color::Ansi);
        }
        if spec == "default" {
            return Some(Color::Default);
        }
        HTML_COLORS
            .iter()
            .find(|(name, _)| *name == spec)
            .map(|(_, (r, g, b))| Color::Rgb(*r, *g, *b))
    }

    /// Reduce the color to what the given capability can display
    pub fn quantize(self, capability: ColorCapability) -> Color {
        match (self, capability) {
            (Color::Default, _) => Color::Default,
            (_, ColorCapability::Monochrome) => Color::Default,
            (c, ColorCapability::TrueColor) => c,
            (Color::Ansi(n), ColorCapability::Ansi256) => Color::Ansi(n),
            (Color::Rgb(r, g, b), ColorCapability::Ansi256) => Color::Ansi(rgb_to_256(r, g, b)),
            (Color::Ansi(n), ColorCapability::Ansi16) if n < 16 => Color::Ansi(n),
            (Color::Ansi(n), ColorCapability::Ansi16) => {
                let (r, g, b) = palette256_rgb(n);
                Color::Ansi(nearest_ansi16(r, g, b))
            }
            (Color::Rgb(r, g, b), ColorCapability::Ansi16) => Color::Ansi(nearest_ansi16(r, g, b)),
        }
    }

    /// Convert to the crossterm color type for output
    pub fn to_crossterm(self) -> crossterm::style::Color {
        match self {
            Color::Default => crossterm::style::Color::Reset,
            Color::Ansi(n) => crossterm::style::Color::AnsiValue(n),
            Color::Rgb(r, g, b) => crossterm::style::Color::Rgb { r, g, b },
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u32> = hex.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    match digits.len() {
        3 => Some(Color::Rgb(
            (digits[0] * 17) as u8,
            (digits[1] * 17) as u8,
            (digits[2] * 17) as u8,
        )),
        6 => Some(Color::Rgb(
            (digits[0] * 16 + digits[1]) as u8,
            (digits[2] * 16 + digits[3]) as u8,
            (digits[4] * 16 + digits[5]) as u8,
        )),
        _ => None,
    }
}

/// Map an RGB value onto the 256-color palette (6x6x6 cube plus gray ramp)
fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    // Prefer the gray ramp for near-gray colors
    let (r, g, b) = (r as i32, g as i32, b as i32);
    if (r - g).abs() < 12 && (g - b).abs() < 12 && (r - b).abs() < 12 {
        let gray = (r + g + b) / 3;
        if gray < 4 {
            return 16;
        }
        if gray > 246 {
            return 231;
        }
        return 232 + ((gray - 8) / 10).clamp(0, 23) as u8;
    }
    let scale = |v: i32| ((v.max(35) - 35) / 40).clamp(0, 5) as u8;
    16 + 36 * scale(r) + 6 * scale(g) + scale(b)
}

/// RGB value of a 256-color palette entry
fn palette256_rgb(n: u8) -> (u8, u8, u8) {
    if n < 16 {
        return ANSI16_RGB[n as usize];
    }
    if n >= 232 {
        let gray = 8 + 10 * (n - 232);
        return (gray, gray, gray);
    }
    let n = n - 16;
    let level = |v: u8| if v == 0 { 0 } else { 55 + 40 * v };
    (level(n / 36), level((n / 6) % 6), level(n % 6))
}

fn nearest_ansi16(r: u8, g: u8, b: u8) -> u8 {
    let dist = |(pr, pg, pb): (u8, u8, u8)| {
        let dr = pr as i32 - r as i32;
        let dg = pg as i32 - g as i32;
        let db = pb as i32 - b as i32;
        dr * dr + dg * dg + db * db
    };
    ANSI16_RGB
        .iter()
        .enumerate()
        .min_by_key(|(_, rgb)| dist(**rgb))
        .map(|(i, _)| i as u8)
        .unwrap_or(7)
}

/// Detect color capability from the environment
///
/// `NO_COLOR` and `TERM=dumb` disable color entirely; `COLORTERM` advertises
/// true color; a `256color` TERM suffix selects the 256-color palette.
pub fn detect_color_capability() -> ColorCapability {
    let term = std::env::var("TERM").unwrap_or_default();
    if std::env::var_os("NO_COLOR").is_some() || term == "dumb" || term.is_empty() {
        log::debug!("color disabled (TERM={:?})", term);
        return ColorCapability::Monochrome;
    }
    let colorterm = std::env::var("COLORTERM").unwrap_or_default();
    let capability = if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        ColorCapability::TrueColor
    } else if term.contains("256color") {
        ColorCapability::Ansi256
    } else {
        ColorCapability::Ansi16
    };
    log::debug!("detected color capability {:?} (TERM={})", capability, term);
    capability
}

/// HTML color names, used by the style registry to seed built-in styles
pub(crate) fn html_color_names() -> impl Iterator<Item = (&'static str, Color)> {
    HTML_COLORS
        .iter()
        .map(|(name, (r, g, b))| (*name, Color::Rgb(*r, *g, *b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(Color::parse("#ff8000"), Some(Color::Rgb(0xff, 0x80, 0x00)));
        assert_eq!(Color::parse("#f80"), Some(Color::Rgb(0xff, 0x88, 0x00)));
        assert_eq!(Color::parse("#xyz"), None);
        assert_eq!(Color::parse("#ff80"), None);
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(Color::parse("red"), Some(Color::Rgb(0xff, 0, 0)));
        assert_eq!(Color::parse("Teal"), Some(Color::Rgb(0, 0x80, 0x80)));
        assert_eq!(Color::parse("ansi-red"), Some(Color::Ansi(1)));
        assert_eq!(Color::parse("ansi-bright-blue"), Some(Color::Ansi(12)));
        assert_eq!(Color::parse("ansi256-208"), Some(Color::Ansi(208)));
        assert_eq!(Color::parse("no-such-color"), None);
    }

    #[test]
    fn test_quantize_to_monochrome() {
        assert_eq!(
            Color::Rgb(10, 20, 30).quantize(ColorCapability::Monochrome),
            Color::Default
        );
    }

    #[test]
    fn test_quantize_rgb_to_256() {
        // Pure red lands in the color cube, not the gray ramp
        let c = Color::Rgb(0xff, 0x00, 0x00).quantize(ColorCapability::Ansi256);
        assert_eq!(c, Color::Ansi(196));

        // Mid gray lands on the gray ramp
        match Color::Rgb(0x80, 0x80, 0x80).quantize(ColorCapability::Ansi256) {
            Color::Ansi(n) => assert!((232..=255).contains(&n)),
            other => panic!("expected gray ramp entry, got {:?}", other),
        }
    }

    #[test]
    fn test_quantize_to_16() {
        assert_eq!(
            Color::Rgb(0xff, 0x00, 0x00).quantize(ColorCapability::Ansi16),
            Color::Ansi(9)
        );
        // Low palette indexes pass through untouched
        assert_eq!(
            Color::Ansi(4).quantize(ColorCapability::Ansi16),
            Color::Ansi(4)
        );
    }

    #[test]
    fn test_true_color_passthrough() {
        let c = Color::Rgb(1, 2, 3);
        assert_eq!(c.quantize(ColorCapability::TrueColor), c);
    }
}
