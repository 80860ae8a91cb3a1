//! Fill colour heuristics
//!
//! Colours arrive as hex strings in `AARRGGBB` or `RRGGBB` form.

/// Blue channel ceiling for a fill to still count as yellow
const YELLOW_MAX_BLUE: u8 = 0x4F;

/// Fill used for zebra striping
const ZEBRA_GRAY: &str = "FFF5F5F5";

/// Fills that mean "no colour"
const DEFAULT_FILLS: &[&str] = &["00000000", "FFFFFFFF"];

/// Split a colour into its red, green and blue channels
fn rgb_channels(argb: &str) -> Option<(u8, u8, u8)> {
    let hex = argb.trim();
    let rgb = match hex.len() {
        8 => hex.get(2..)?,
        6 => hex,
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(rgb.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Saturated red and green with little blue marks a special-vehicle driver
pub fn is_driver_yellow(argb: &str) -> bool {
    matches!(rgb_channels(argb), Some((0xFF, 0xFF, b)) if b <= YELLOW_MAX_BLUE)
}

/// Light gray used for alternating row shading
pub fn is_zebra_gray(argb: &str) -> bool {
    argb.trim().eq_ignore_ascii_case(ZEBRA_GRAY)
}

/// Keep a duty-cell colour as a presentation tag unless it is a default fill
pub fn duty_fill_tag(argb: &str) -> Option<String> {
    let upper = argb.trim().to_ascii_uppercase();
    if upper.is_empty() || DEFAULT_FILLS.contains(&upper.as_str()) {
        None
    } else {
        Some(upper)
    }
}
