//! Lighting effect presets for product photos

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// A named lighting style with its generation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightingEffect {
    GoldenHour,
    Moonlight,
    CandleLight,
    StudioLight,
    NeonLight,
    Backlight,
    DuskLight,
    SunsetLight,
    Spotlight,
    OverheadLight,
}

impl LightingEffect {
    pub const ALL: [Self; 10] = [
        Self::GoldenHour,
        Self::Moonlight,
        Self::CandleLight,
        Self::StudioLight,
        Self::NeonLight,
        Self::Backlight,
        Self::DuskLight,
        Self::SunsetLight,
        Self::Spotlight,
        Self::OverheadLight,
    ];

    /// Human-readable name
    pub fn label(self) -> &'static str {
        match self {
            Self::GoldenHour => "Golden hour",
            Self::Moonlight => "Moonlight",
            Self::CandleLight => "Candle Light",
            Self::StudioLight => "Studio Light",
            Self::NeonLight => "Neon Light",
            Self::Backlight => "Backlight (Silhouette)",
            Self::DuskLight => "Dusk Light",
            Self::SunsetLight => "Sunset Light",
            Self::Spotlight => "Spotlight",
            Self::OverheadLight => "Overhead Light",
        }
    }

    /// Short name for command lines
    pub fn slug(self) -> &'static str {
        match self {
            Self::GoldenHour => "golden-hour",
            Self::Moonlight => "moonlight",
            Self::CandleLight => "candle-light",
            Self::StudioLight => "studio-light",
            Self::NeonLight => "neon-light",
            Self::Backlight => "backlight",
            Self::DuskLight => "dusk-light",
            Self::SunsetLight => "sunset-light",
            Self::Spotlight => "spotlight",
            Self::OverheadLight => "overhead-light",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Self::GoldenHour => {
                "Golden hour lighting, soft warm glow, product photoshoot, high detail, 4k"
            }
            Self::Moonlight => {
                "Moonlight ambiance, cool silver tone, product photoshoot, high detail, 4k"
            }
            Self::CandleLight => {
                "Soft candlelight glow, warm and intimate lighting, product photoshoot, 4k"
            }
            Self::StudioLight => {
                "Bright studio lighting, clear shadows, product photoshoot, high detail, 4k"
            }
            Self::NeonLight => {
                "Vibrant neon lighting, colorful highlights, product photoshoot, high detail, 4k"
            }
            Self::Backlight => {
                "Backlit product with glowing edges, soft shadows, product photoshoot, high detail, 4k"
            }
            Self::DuskLight => {
                "Soft twilight lighting, moody ambiance, product photoshoot, high detail, 4k"
            }
            Self::SunsetLight => {
                "Warm sunset lighting, rich orange tones, product photoshoot, high detail, 4k"
            }
            Self::Spotlight => "Focused spotlight on product, high contrast, product photoshoot, 4k",
            Self::OverheadLight => {
                "Soft overhead lighting, minimal shadow, product photoshoot, high detail, 4k"
            }
        }
    }
}

impl fmt::Display for LightingEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the slug or the label, case-insensitively
impl FromStr for LightingEffect {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.slug().eq_ignore_ascii_case(wanted) || e.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClientError::InvalidRequest(format!("unknown lighting effect {:?}", s)))
    }
}
