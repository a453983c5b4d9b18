//! `DisplayColor` parsing: a known colour name or a hex number.

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

const NAMED_COLORS: &[(&str, u32)] = &[
    ("AliceBlue", 0xF0F8FF),
    ("Aqua", 0x00FFFF),
    ("Aquamarine", 0x7FFFD4),
    ("Beige", 0xF5F5DC),
    ("Black", 0x000000),
    ("Blue", 0x0000FF),
    ("BlueViolet", 0x8A2BE2),
    ("Brown", 0xA52A2A),
    ("CadetBlue", 0x5F9EA0),
    ("Chartreuse", 0x7FFF00),
    ("Chocolate", 0xD2691E),
    ("Coral", 0xFF7F50),
    ("CornflowerBlue", 0x6495ED),
    ("Crimson", 0xDC143C),
    ("Cyan", 0x00FFFF),
    ("DarkBlue", 0x00008B),
    ("DarkCyan", 0x008B8B),
    ("DarkGoldenrod", 0xB8860B),
    ("DarkGray", 0xA9A9A9),
    ("DarkGreen", 0x006400),
    ("DarkMagenta", 0x8B008B),
    ("DarkOrange", 0xFF8C00),
    ("DarkRed", 0x8B0000),
    ("DarkViolet", 0x9400D3),
    ("DeepPink", 0xFF1493),
    ("DeepSkyBlue", 0x00BFFF),
    ("DodgerBlue", 0x1E90FF),
    ("ForestGreen", 0x228B22),
    ("Fuchsia", 0xFF00FF),
    ("Gold", 0xFFD700),
    ("Goldenrod", 0xDAA520),
    ("Gray", 0x808080),
    ("Green", 0x008000),
    ("GreenYellow", 0xADFF2F),
    ("HotPink", 0xFF69B4),
    ("IndianRed", 0xCD5C5C),
    ("Indigo", 0x4B0082),
    ("Khaki", 0xF0E68C),
    ("Lavender", 0xE6E6FA),
    ("LawnGreen", 0x7CFC00),
    ("LightBlue", 0xADD8E6),
    ("LightGray", 0xD3D3D3),
    ("LightGreen", 0x90EE90),
    ("LightPink", 0xFFB6C1),
    ("LightYellow", 0xFFFFE0),
    ("Lime", 0x00FF00),
    ("LimeGreen", 0x32CD32),
    ("Magenta", 0xFF00FF),
    ("Maroon", 0x800000),
    ("MediumBlue", 0x0000CD),
    ("MediumPurple", 0x9370DB),
    ("Navy", 0x000080),
    ("Olive", 0x808000),
    ("Orange", 0xFFA500),
    ("OrangeRed", 0xFF4500),
    ("Orchid", 0xDA70D6),
    ("PaleGreen", 0x98FB98),
    ("Pink", 0xFFC0CB),
    ("Plum", 0xDDA0DD),
    ("Purple", 0x800080),
    ("Red", 0xFF0000),
    ("RoyalBlue", 0x4169E1),
    ("Salmon", 0xFA8072),
    ("SeaGreen", 0x2E8B57),
    ("Sienna", 0xA0522D),
    ("Silver", 0xC0C0C0),
    ("SkyBlue", 0x87CEEB),
    ("SlateGray", 0x708090),
    ("SpringGreen", 0x00FF7F),
    ("SteelBlue", 0x4682B4),
    ("Tan", 0xD2B48C),
    ("Teal", 0x008080),
    ("Tomato", 0xFF6347),
    ("Turquoise", 0x40E0D0),
    ("Violet", 0xEE82EE),
    ("Wheat", 0xF5DEB3),
    ("White", 0xFFFFFF),
    ("Yellow", 0xFFFF00),
    ("YellowGreen", 0x9ACD32),
];

/// Resolves a colour string to RGBA.
///
/// Names match exactly. Hex values of up to six digits are opaque RGB;
/// longer values carry alpha in the top byte. Anything else is white.
pub fn parse_display_color(value: &str) -> [f32; 4] {
    let value = value.trim();
    if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
        return argb_to_rgba(0xFF00_0000 | rgb);
    }

    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .or_else(|| value.strip_prefix('#'))
        .unwrap_or(value);
    if digits.is_empty() || digits.len() > 8 {
        return WHITE;
    }
    match u32::from_str_radix(digits, 16) {
        Ok(rgb) if digits.len() <= 6 => argb_to_rgba(0xFF00_0000 | rgb),
        Ok(argb) => argb_to_rgba(argb),
        Err(_) => WHITE,
    }
}

/// Parses a settings colour written as `#RRGGBB` or `#AARRGGBB`.
pub fn parse_hex_color(value: &str) -> Option<[f32; 4]> {
    let digits = value.trim().strip_prefix('#')?;
    let raw = u32::from_str_radix(digits, 16).ok()?;
    match digits.len() {
        6 => Some(argb_to_rgba(0xFF00_0000 | raw)),
        8 => Some(argb_to_rgba(raw)),
        _ => None,
    }
}

fn argb_to_rgba(argb: u32) -> [f32; 4] {
    let channel = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), channel(24)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_colors_resolve() {
        assert_eq!(parse_display_color("Red"), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(parse_display_color("Blue"), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn short_hex_is_opaque_rgb() {
        assert_eq!(parse_display_color("00FF00"), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(parse_display_color("0xFF"), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn eight_digit_hex_carries_alpha() {
        let color = parse_display_color("80FF0000");
        assert_eq!(&color[..3], &[1.0, 0.0, 0.0]);
        assert!((color[3] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn garbage_is_white() {
        assert_eq!(parse_display_color("not a colour"), WHITE);
        assert_eq!(parse_display_color(""), WHITE);
        assert_eq!(parse_display_color("123456789"), WHITE);
    }

    #[test]
    fn settings_colors_need_a_hash() {
        assert_eq!(parse_hex_color("#FFFFFF"), Some(WHITE));
        assert_eq!(parse_hex_color("FFFFFF"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
    }
}
