use derive_more::{Deref, From, Into};
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgb;
use palette::rgb::FromHexError;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// An 8-bit sRGB color with a `#rrggbb` string form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr, Deref, From, Into,
)]
pub struct HexColor(Srgb<u8>);

impl FromStr for HexColor {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            self.0.red, self.0.green, self.0.blue
        )
    }
}

const DEFAULT_PALETTE: [&str; 21] = [
    "#ffb56b", "#fdaf69", "#f89d63", "#f59761", "#ef865e", "#ec805d", "#df685c", "#d5585c",
    "#d1525c", "#c5415d", "#c03b5d", "#b22c5e", "#ac265e", "#9c155f", "#950f5f", "#830060",
    "#7c0060", "#680060", "#60005f", "#48005f", "#3d005e",
];

/// The stock orange-to-violet trail palette.
pub fn default_palette() -> Vec<HexColor> {
    DEFAULT_PALETTE
        .iter()
        .map(|s| s.parse().expect("built-in palette literal is valid hex"))
        .collect()
}

/// Expands the gradient stops into one color per marker.
///
/// The output is split into `colors.len() - 1` equal bands of
/// `count / segments` markers each (integer division); within a band the
/// channels are interpolated linearly between the band's endpoint stops.
/// Whatever the truncation leaves short of `count` is filled by repeating the
/// final stop, so the result always has exactly `count` entries for any
/// non-empty input. A single stop simply repeats `count` times.
pub fn generate_gradient(colors: &[HexColor], count: usize) -> Vec<Srgb<u8>> {
    let mut gradient = Vec::with_capacity(count);

    if colors.len() > 1 {
        let segments = colors.len() - 1;
        let per_segment = count / segments;

        for pair in colors.windows(2) {
            let (start, end) = (pair[0].0, pair[1].0);
            for j in 0..per_segment {
                let ratio = j as f64 / per_segment as f64;
                gradient.push(Srgb::new(
                    lerp_channel(start.red, end.red, ratio),
                    lerp_channel(start.green, end.green, ratio),
                    lerp_channel(start.blue, end.blue, ratio),
                ));
            }
        }
    }

    if let Some(last) = colors.last() {
        while gradient.len() < count {
            gradient.push(last.0);
        }
    }

    gradient
}

fn lerp_channel(start: u8, end: u8, ratio: f64) -> u8 {
    (start as f64 + (end as f64 - start as f64) * ratio).round() as u8
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
.comet-window, .comet-drawing-area {
    background: none;
    background-color: transparent;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(hex: &[&str]) -> Vec<HexColor> {
        hex.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_hex_color_round_trip() {
        let color: HexColor = "#ffb56b".parse().unwrap();
        assert_eq!(*color, Srgb::new(0xff, 0xb5, 0x6b));
        assert_eq!(color.to_string(), "#ffb56b");

        assert!("not-a-color".parse::<HexColor>().is_err());
        assert!("#12345z".parse::<HexColor>().is_err());
    }

    #[test]
    fn test_default_palette_has_21_stops() {
        let palette = default_palette();
        assert_eq!(palette.len(), 21);
        assert_eq!(palette[0].to_string(), "#ffb56b");
        assert_eq!(palette[20].to_string(), "#3d005e");
    }

    #[test]
    fn test_gradient_length_matches_count() {
        for count in [1, 4, 10, 25, 100] {
            assert_eq!(generate_gradient(&default_palette(), count).len(), count);
            assert_eq!(
                generate_gradient(&stops(&["#000000", "#ffffff"]), count).len(),
                count
            );
        }
        assert!(generate_gradient(&default_palette(), 0).is_empty());
    }

    #[test]
    fn test_gradient_endpoints() {
        let colors = stops(&["#102030", "#405060", "#708090"]);
        let gradient = generate_gradient(&colors, 25);

        // ratio 0 at the first segment start reproduces the first stop
        assert_eq!(gradient[0], *colors[0]);

        // 25 / 2 segments truncates to 12 per band; the last entry is backfill
        assert_eq!(gradient.len(), 25);
        assert_eq!(gradient[24], *colors[2]);
    }

    #[test]
    fn test_gradient_known_values() {
        let gradient = generate_gradient(&stops(&["#000000", "#ffffff"]), 4);
        let expected = [
            Srgb::new(0u8, 0, 0),
            Srgb::new(64u8, 64, 64),
            Srgb::new(128u8, 128, 128),
            Srgb::new(191u8, 191, 191),
        ];
        assert_eq!(gradient, expected);
    }

    #[test]
    fn test_gradient_channels_monotonic() {
        let gradient = generate_gradient(&stops(&["#000000", "#ffffff"]), 10);
        for pair in gradient.windows(2) {
            assert!(pair[1].red >= pair[0].red);
            assert!(pair[1].green >= pair[0].green);
            assert!(pair[1].blue >= pair[0].blue);
        }
    }

    #[test]
    fn test_single_stop_repeats() {
        let gradient = generate_gradient(&stops(&["#c03b5d"]), 5);
        assert_eq!(gradient, vec![Srgb::new(0xc0, 0x3b, 0x5d); 5]);
    }

    #[test]
    fn test_more_stops_than_markers_backfills_with_last() {
        // 3 markers over 20 segments: zero per band, all backfill
        let gradient = generate_gradient(&default_palette(), 3);
        assert_eq!(gradient, vec![Srgb::new(0x3d, 0x00, 0x5e); 3]);
    }
}
