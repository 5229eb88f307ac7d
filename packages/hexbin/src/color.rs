//! Intensity-to-color mapping over a discrete palette.
//!
//! Palette entries are CSS-style strings in one of three forms (`#rrggbb`,
//! `rgb(r,g,b)`, `rgba(r,g,b,a)`). They are parsed once into [`ColorForm`]
//! when the [`Palette`] is built. Anything else becomes
//! [`ColorForm::Unknown`] and renders as the no-data color instead of
//! failing the scene.

use std::sync::LazyLock;

use regex::Regex;
use ride_map_hexbin_models::{PaletteName, Rgba};

/// Fill used for cells with no matching rides, and as the fallback for
/// unparseable palette entries.
pub const NO_DATA_COLOR: Rgba = Rgba::new(200, 200, 200, 0.1);

/// Fill opacity used by the dashboard for populated cells.
pub const DEFAULT_FILL_ALPHA: f64 = 0.4;

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgb\( *([0-9]{1,3}) *, *([0-9]{1,3}) *, *([0-9]{1,3}) *\)$")
        .unwrap_or_else(|_| unreachable!())
});

static RGBA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba\( *([0-9]{1,3}) *, *([0-9]{1,3}) *, *([0-9]{1,3}) *, *([0-9]*\.?[0-9]+) *\)$",
    )
    .unwrap_or_else(|_| unreachable!())
});

/// A parsed palette entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorForm {
    /// `#rrggbb`
    Hex([u8; 3]),
    /// `rgb(r,g,b)`
    Rgb([u8; 3]),
    /// `rgba(r,g,b,a)`; keeps its own alpha.
    Rgba(Rgba),
    /// Anything else, kept verbatim for diagnostics.
    Unknown(String),
}

impl ColorForm {
    /// Parses a color string. Never fails; unrecognized input yields
    /// [`ColorForm::Unknown`].
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let s = input.trim();

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).map_or_else(|| Self::Unknown(input.to_string()), Self::Hex);
        }

        if let Some(caps) = RGBA_RE.captures(s) {
            let channels = channels(&caps[1], &caps[2], &caps[3]);
            let alpha = caps[4].parse::<f64>().ok().filter(|a| (0.0..=1.0).contains(a));
            return match (channels, alpha) {
                (Some([r, g, b]), Some(a)) => Self::Rgba(Rgba::new(r, g, b, a)),
                _ => Self::Unknown(input.to_string()),
            };
        }

        if let Some(caps) = RGB_RE.captures(s) {
            return channels(&caps[1], &caps[2], &caps[3])
                .map_or_else(|| Self::Unknown(input.to_string()), Self::Rgb);
        }

        Self::Unknown(input.to_string())
    }

    /// Converts to a concrete fill.
    ///
    /// Hex and `rgb(...)` entries take `alpha`; `rgba(...)` entries keep the
    /// alpha they were written with; unknown entries give [`NO_DATA_COLOR`].
    #[must_use]
    pub const fn to_rgba(&self, alpha: f64) -> Rgba {
        match self {
            Self::Hex([r, g, b]) | Self::Rgb([r, g, b]) => Rgba::new(*r, *g, *b, alpha),
            Self::Rgba(rgba) => *rgba,
            Self::Unknown(_) => NO_DATA_COLOR,
        }
    }

    /// Returns `true` for [`ColorForm::Unknown`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some([
        u8::from_str_radix(&hex[0..2], 16).ok()?,
        u8::from_str_radix(&hex[2..4], 16).ok()?,
        u8::from_str_radix(&hex[4..6], 16).ok()?,
    ])
}

fn channels(r: &str, g: &str, b: &str) -> Option<[u8; 3]> {
    Some([r.parse().ok()?, g.parse().ok()?, b.parse().ok()?])
}

/// An ordered color ramp, lowest density first.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<ColorForm>,
}

impl Palette {
    /// Parses each entry of a custom ramp.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<ColorForm> = entries
            .into_iter()
            .map(|entry| ColorForm::parse(entry.as_ref()))
            .collect();

        for entry in &entries {
            if let ColorForm::Unknown(raw) = entry {
                log::warn!("Unrecognized palette color '{raw}', using the no-data color");
            }
        }

        Self { entries }
    }

    /// Number of colors in the ramp.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the ramp has no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The parsed entries.
    #[must_use]
    pub fn entries(&self) -> &[ColorForm] {
        &self.entries
    }
}

impl From<PaletteName> for Palette {
    fn from(name: PaletteName) -> Self {
        Self::from_entries(name.entries())
    }
}

impl Default for Palette {
    fn default() -> Self {
        PaletteName::default().into()
    }
}

/// Picks fill colors for cell intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapper {
    palette: Palette,
    no_data: Rgba,
}

impl ColorMapper {
    /// Creates a mapper over `palette` with the standard no-data color.
    #[must_use]
    pub const fn new(palette: Palette) -> Self {
        Self {
            palette,
            no_data: NO_DATA_COLOR,
        }
    }

    /// Overrides the no-data color.
    #[must_use]
    pub fn with_no_data_color(mut self, color: Rgba) -> Self {
        self.no_data = color;
        self
    }

    /// The color used for cells without data.
    #[must_use]
    pub const fn no_data_color(&self) -> Rgba {
        self.no_data
    }

    /// Palette slot for intensity `t`: `floor(t * (len - 1))`.
    ///
    /// `t` is clamped to `[0, 1]` first. Returns `None` for an empty
    /// palette.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn index_for(&self, t: f64) -> Option<usize> {
        let last = self.palette.len().checked_sub(1)?;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Some(((t * last as f64).floor() as usize).min(last))
    }

    /// Fill for an intensity; `None` means the cell has no data.
    #[must_use]
    pub fn color_for(&self, intensity: Option<f64>, alpha: f64) -> Rgba {
        let Some(t) = intensity else {
            return self.no_data;
        };

        match self.index_for(t).map(|i| &self.palette.entries[i]) {
            Some(ColorForm::Unknown(_)) | None => self.no_data,
            Some(form) => form.to_rgba(alpha),
        }
    }
}

impl Default for ColorMapper {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}
