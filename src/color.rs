//! Hex color handling and the descriptive text shown next to a color.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn parse(value: &str) -> Result<Self> {
        let hex = normalize_hex(value)?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| AppError::InvalidColor(format!("{}: {}", value, e)))
        };
        Ok(Rgb {
            r: channel(1)?,
            g: channel(3)?,
            b: channel(5)?,
        })
    }

    /// (hue in degrees, saturation, lightness)
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;

        if (max - min).abs() < f64::EPSILON {
            return (0.0, 0.0, lightness);
        }

        let delta = max - min;
        let saturation = if lightness <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };

        let hue = if (max - r).abs() < f64::EPSILON {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        (hue * 60.0, saturation, lightness)
    }
}

/// Accepts `#rgb`, `rgb`, `#rrggbb` or `rrggbb`; returns lowercase `#rrggbb`.
pub fn normalize_hex(value: &str) -> Result<String> {
    let digits = value.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidColor(value.to_string()));
    }
    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        6 => Ok(format!("#{}", digits)),
        3 => Ok(digits.chars().fold(String::from("#"), |mut out, c| {
            out.push(c);
            out.push(c);
            out
        })),
        _ => Err(AppError::InvalidColor(value.to_string())),
    }
}

/// Six uniformly random hex digits.
pub fn random_hex<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut hex = String::from("#");
    for _ in 0..6 {
        let digit: u32 = rng.random_range(0..16);
        hex.push(char::from_digit(digit, 16).unwrap_or('0'));
    }
    hex
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HueFamily {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Violet,
    Magenta,
    Neutral,
}

impl HueFamily {
    fn classify(hue: f64, saturation: f64) -> Self {
        if saturation < 0.1 {
            return HueFamily::Neutral;
        }
        match hue {
            h if !(15.0..345.0).contains(&h) => HueFamily::Red,
            h if h < 45.0 => HueFamily::Orange,
            h if h < 70.0 => HueFamily::Yellow,
            h if h < 165.0 => HueFamily::Green,
            h if h < 195.0 => HueFamily::Cyan,
            h if h < 255.0 => HueFamily::Blue,
            h if h < 290.0 => HueFamily::Violet,
            _ => HueFamily::Magenta,
        }
    }

    fn name(self, lightness: f64) -> &'static str {
        match self {
            HueFamily::Red => "red",
            HueFamily::Orange => "orange",
            HueFamily::Yellow => "yellow",
            HueFamily::Green => "green",
            HueFamily::Cyan => "cyan",
            HueFamily::Blue => "blue",
            HueFamily::Violet => "violet",
            HueFamily::Magenta => "magenta",
            HueFamily::Neutral if lightness < 0.1 => "black",
            HueFamily::Neutral if lightness > 0.9 => "white",
            HueFamily::Neutral => "gray",
        }
    }

    fn temperature(self) -> &'static str {
        match self {
            HueFamily::Red | HueFamily::Orange | HueFamily::Yellow | HueFamily::Magenta => "warm",
            HueFamily::Green | HueFamily::Cyan | HueFamily::Blue | HueFamily::Violet => "cool",
            HueFamily::Neutral => "neutral",
        }
    }

    fn meanings(self) -> &'static [&'static str] {
        match self {
            HueFamily::Red => &["passion", "energy", "danger", "love"],
            HueFamily::Orange => &["enthusiasm", "warmth", "creativity"],
            HueFamily::Yellow => &["joy", "optimism", "caution"],
            HueFamily::Green => &["nature", "growth", "renewal", "balance"],
            HueFamily::Cyan => &["clarity", "calm", "freshness"],
            HueFamily::Blue => &["trust", "depth", "stability", "serenity"],
            HueFamily::Violet => &["mystery", "imagination", "royalty"],
            HueFamily::Magenta => &["playfulness", "compassion", "romance"],
            HueFamily::Neutral => &["neutrality", "balance", "restraint"],
        }
    }
}

fn lightness_word(lightness: f64) -> &'static str {
    match lightness {
        l if l < 0.15 => "very dark",
        l if l < 0.35 => "dark",
        l if l < 0.65 => "medium",
        l if l < 0.85 => "light",
        _ => "very light",
    }
}

fn saturation_word(saturation: f64) -> Option<&'static str> {
    match saturation {
        s if s < 0.1 => None,
        s if s < 0.35 => Some("muted"),
        s if s < 0.7 => Some("moderate"),
        s if s < 0.9 => Some("strong"),
        _ => Some("vivid"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorDescription {
    pub description: Vec<String>,
    pub descriptive_list: Vec<String>,
    pub meanings: Vec<String>,
}

impl ColorDescription {
    pub fn new(hex: &str) -> Result<Self> {
        let (hue, saturation, lightness) = Rgb::parse(hex)?.to_hsl();
        let family = HueFamily::classify(hue, saturation);
        let base = family.name(lightness);
        let light = lightness_word(lightness);
        let chroma = saturation_word(saturation);

        let mut description = Vec::new();
        match (family, chroma) {
            (HueFamily::Neutral, _) if base != "gray" => description.push(base.to_string()),
            (_, Some(chroma)) => {
                description.push(format!("{} {} {}", chroma, light, base));
                description.push(format!("{} {}", light, base));
            }
            (_, None) => description.push(format!("{} {}", light, base)),
        }

        let mut descriptive_list = vec![light.to_string()];
        descriptive_list.extend(chroma.map(str::to_string));
        descriptive_list.push(family.temperature().to_string());
        descriptive_list.push(base.to_string());

        Ok(ColorDescription {
            description,
            descriptive_list,
            meanings: family.meanings().iter().map(|m| m.to_string()).collect(),
        })
    }

    pub fn primary(&self) -> String {
        self.description.first().cloned().unwrap_or_default()
    }
}
