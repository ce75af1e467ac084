// Colour helpers: additive tint, and mapping RGB to what the terminal can show

use ratatui::style::Color;
use std::sync::OnceLock;
use term_color_support::ColorSupport;

/// An 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Additive colour translation, channels in `-1.0..=1.0` of full scale
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Tint {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Tint { r, g, b }
    }
}

fn shift(c: u8, t: f32) -> u8 {
    let v = c as f32 / 255.0 + t;
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Rgb {
    pub fn tinted(self, tint: Tint) -> Rgb {
        Rgb(shift(self.0, tint.r), shift(self.1, tint.g), shift(self.2, tint.b))
    }
}

/// Level of colour the terminal supports, detected once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    TrueColor,
    Indexed256,
    Basic,
}

static DEPTH: OnceLock<ColorDepth> = OnceLock::new();

pub fn color_depth() -> ColorDepth {
    *DEPTH.get_or_init(|| {
        let support = ColorSupport::stdout();
        let depth = if support.has_16m {
            ColorDepth::TrueColor
        } else if support.has_256 {
            ColorDepth::Indexed256
        } else {
            ColorDepth::Basic
        };
        log::debug!("Terminal colour depth: {:?}", depth);
        depth
    })
}

// Windows Terminal "Campbell" values for the 16 ANSI colours
const BASIC: [(Color, Rgb); 16] = [
    (Color::Black, Rgb(12, 12, 12)),
    (Color::Red, Rgb(197, 15, 31)),
    (Color::Green, Rgb(19, 161, 14)),
    (Color::Yellow, Rgb(193, 156, 0)),
    (Color::Blue, Rgb(0, 55, 218)),
    (Color::Magenta, Rgb(136, 23, 152)),
    (Color::Cyan, Rgb(58, 150, 221)),
    (Color::Gray, Rgb(204, 204, 204)),
    (Color::DarkGray, Rgb(118, 118, 118)),
    (Color::LightRed, Rgb(231, 72, 86)),
    (Color::LightGreen, Rgb(22, 198, 12)),
    (Color::LightYellow, Rgb(249, 241, 165)),
    (Color::LightBlue, Rgb(59, 120, 255)),
    (Color::LightMagenta, Rgb(180, 0, 158)),
    (Color::LightCyan, Rgb(97, 214, 214)),
    (Color::White, Rgb(242, 242, 242)),
];

fn dist2(a: Rgb, b: Rgb) -> u32 {
    let d = |x: u8, y: u8| (x as i32 - y as i32).pow(2) as u32;
    d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
}

/// Nearest of the 16 ANSI colours
pub fn nearest_basic(c: Rgb) -> Color {
    BASIC
        .iter()
        .min_by_key(|(_, rgb)| dist2(c, *rgb))
        .map(|(color, _)| *color)
        .unwrap_or(Color::Reset)
}

/// Nearest xterm 256-colour index, from the 6x6x6 cube or the grey ramp
pub fn nearest_indexed(c: Rgb) -> u8 {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let level = |v: u8| {
        LEVELS
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| (v as i32 - **l as i32).abs())
            .map(|(i, _)| i as u8)
            .unwrap_or(0)
    };
    let (ri, gi, bi) = (level(c.0), level(c.1), level(c.2));
    let cube = Rgb(LEVELS[ri as usize], LEVELS[gi as usize], LEVELS[bi as usize]);
    let cube_index = 16 + 36 * ri + 6 * gi + bi;

    let avg = (c.0 as u32 + c.1 as u32 + c.2 as u32) / 3;
    let grey_step = (avg.saturating_sub(3) / 10).min(23) as u8;
    let grey_value = 8 + 10 * grey_step;
    let grey = Rgb(grey_value, grey_value, grey_value);

    if dist2(c, grey) < dist2(c, cube) {
        232 + grey_step
    } else {
        cube_index
    }
}

/// Maps an RGB colour to the closest thing the terminal can display
pub trait TermMatch {
    fn term_match(self) -> Color;
}

impl TermMatch for Rgb {
    fn term_match(self) -> Color {
        match color_depth() {
            ColorDepth::TrueColor => Color::Rgb(self.0, self.1, self.2),
            ColorDepth::Indexed256 => Color::Indexed(nearest_indexed(self)),
            ColorDepth::Basic => nearest_basic(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_clamps_each_channel() {
        let c = Rgb(250, 5, 128).tinted(Tint::new(0.1, -0.1, 0.0));
        assert_eq!(c, Rgb(255, 0, 128));
    }

    #[test]
    fn darken_lowers_grey() {
        let c = Rgb(180, 180, 180).tinted(Tint::new(-0.1, -0.1, -0.1));
        assert!(c.0 < 180 && c.0 == c.1 && c.1 == c.2);
    }

    #[test]
    fn basic_match_picks_closest_ansi() {
        assert_eq!(nearest_basic(Rgb(200, 20, 30)), Color::Red);
        assert_eq!(nearest_basic(Rgb(0, 0, 0)), Color::Black);
        assert_eq!(nearest_basic(Rgb(180, 180, 180)), Color::Gray);
    }

    #[test]
    fn indexed_match_uses_cube_and_ramp() {
        assert_eq!(nearest_indexed(Rgb(255, 0, 0)), 196);
        assert_eq!(nearest_indexed(Rgb(0, 0, 0)), 16);
        // mid grey lands on the ramp
        assert_eq!(nearest_indexed(Rgb(128, 128, 128)), 244);
    }
}
