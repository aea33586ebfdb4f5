//! Color palettes offered by the UI and hex parsing for colors coming in as
//! strings.

use egui::Color32;
use palette::Srgb;

use crate::error::{ComposerError, Result};
use crate::face::Background;

/// Default face color.
pub const YELLOW: Color32 = Color32::from_rgb(0xFF, 0xD9, 0x3B);

/// Fill colors shown in the color picker.
pub const FILL_COLORS: &[(&str, Color32)] = &[
    ("yellow", YELLOW),
    ("orange", Color32::from_rgb(0xFF, 0x9F, 0x1C)),
    ("red", Color32::from_rgb(0xE6, 0x39, 0x46)),
    ("pink", Color32::from_rgb(0xFF, 0x8F, 0xAB)),
    ("purple", Color32::from_rgb(0x9B, 0x5D, 0xE5)),
    ("blue", Color32::from_rgb(0x3A, 0x86, 0xFF)),
    ("green", Color32::from_rgb(0x2E, 0xC4, 0x6D)),
    ("white", Color32::WHITE),
];

/// Solid backgrounds shown next to the "transparent" option.
pub const BACKGROUND_COLORS: &[(&str, Color32)] = &[
    ("white", Color32::WHITE),
    ("sky", Color32::from_rgb(0xA2, 0xD2, 0xFF)),
    ("mint", Color32::from_rgb(0xB9, 0xFB, 0xC0)),
    ("peach", Color32::from_rgb(0xFF, 0xD6, 0xA5)),
    ("lavender", Color32::from_rgb(0xCD, 0xB4, 0xDB)),
    ("black", Color32::BLACK),
];

/// Looks up a fill color by its palette name.
pub fn fill_color(name: &str) -> Option<Color32> {
    FILL_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, color)| *color)
}

/// Parses `#rrggbb` or `#rgb` (the `#` is optional).
pub fn parse_hex(input: &str) -> Result<Color32> {
    let rgb = input
        .trim()
        .parse::<Srgb<u8>>()
        .map_err(|err| ComposerError::InvalidColor {
            input: input.to_string(),
            reason: err.to_string(),
        })?;
    Ok(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

/// Parses a background value: either the literal `transparent` or a hex color.
pub fn parse_background(input: &str) -> Result<Background> {
    if input.trim().eq_ignore_ascii_case("transparent") {
        return Ok(Background::Transparent);
    }
    parse_hex(input).map(Background::Color)
}

/// Formats a color the way [`parse_hex`] reads it back.
pub fn to_hex(color: Color32) -> String {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff0000").unwrap(), Color32::from_rgb(255, 0, 0));
        assert_eq!(parse_hex("00ff00").unwrap(), Color32::from_rgb(0, 255, 0));
        assert_eq!(parse_hex("#fff").unwrap(), Color32::WHITE);
        assert!(matches!(
            parse_hex("#nothex"),
            Err(ComposerError::InvalidColor { .. })
        ));
    }

    #[test]
    fn test_parse_background() {
        assert_eq!(parse_background("transparent").unwrap(), Background::Transparent);
        assert_eq!(
            parse_background("#000000").unwrap(),
            Background::Color(Color32::BLACK)
        );
    }

    #[test]
    fn test_hex_round_trip_for_palette() {
        for (name, color) in FILL_COLORS {
            assert_eq!(parse_hex(&to_hex(*color)).unwrap(), *color, "{name}");
        }
        assert_eq!(fill_color("yellow"), Some(YELLOW));
        assert_eq!(fill_color("chartreuse"), None);
    }
}
