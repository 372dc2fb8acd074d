//! Cylindrical CIE colour (HCL) to sRGB conversion.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// D50 reference white
const XN: f64 = 0.96422;
const YN: f64 = 1.0;
const ZN: f64 = 0.82521;
const T0: f64 = 4.0 / 29.0;
const T1: f64 = 6.0 / 29.0;
const T2: f64 = 3.0 * T1 * T1;

/// An 8-bit sRGB colour, written as `#rrggbb`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert floating channels, rounding half up and clamping to [0, 255].
    /// NaN channels become 0.
    pub fn from_channels(r: f64, g: f64, b: f64) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

#[inline]
fn clamp_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v + 0.5).floor().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Error returned when a string is not a `#rgb` or `#rrggbb` colour
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex colour {0:?}")]
pub struct ParseColorError(pub String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| err());

        match hex.len() {
            6 => Ok(Self::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(err()),
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// CIELAB colour relative to D50
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn to_rgb(self) -> Rgb {
        let y = (self.l + 16.0) / 116.0;
        let x = y + self.a / 500.0;
        let z = y - self.b / 200.0;

        let x = XN * lab_to_xyz(x);
        let y = YN * lab_to_xyz(y);
        let z = ZN * lab_to_xyz(z);

        Rgb::from_channels(
            linear_to_srgb(3.1338561 * x - 1.6168667 * y - 0.4906146 * z),
            linear_to_srgb(-0.9787684 * x + 1.9161415 * y + 0.0334540 * z),
            linear_to_srgb(0.0719453 * x - 0.2289914 * y + 1.4052427 * z),
        )
    }
}

#[inline]
fn lab_to_xyz(t: f64) -> f64 {
    if t > T1 {
        t * t * t
    } else {
        T2 * (t - T0)
    }
}

#[inline]
fn linear_to_srgb(x: f64) -> f64 {
    255.0
        * if x <= 0.0031308 {
            12.92 * x
        } else {
            1.055 * x.powf(1.0 / 2.4) - 0.055
        }
}

/// Hue (degrees), chroma, luminance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hcl {
    pub h: f64,
    pub c: f64,
    pub l: f64,
}

impl Hcl {
    pub fn new(h: f64, c: f64, l: f64) -> Self {
        Self { h, c, l }
    }

    /// An undefined hue is treated as achromatic
    pub fn to_lab(self) -> Lab {
        if self.h.is_nan() {
            return Lab { l: self.l, a: 0.0, b: 0.0 };
        }
        let (sin_h, cos_h) = self.h.to_radians().sin_cos();
        Lab {
            l: self.l,
            a: cos_h * self.c,
            b: sin_h * self.c,
        }
    }

    pub fn to_rgb(self) -> Rgb {
        self.to_lab().to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hcl_reference_values() {
        assert_eq!(Hcl::new(0.0, 50.0, 80.0).to_rgb().to_hex(), "#ff9fc9");
        assert_eq!(Hcl::new(120.0, 50.0, 80.0).to_rgb().to_hex(), "#acd372");
        assert_eq!(Hcl::new(240.0, 50.0, 80.0).to_rgb().to_hex(), "#3bd6ff");
    }

    #[test]
    fn test_achromatic_extremes() {
        assert_eq!(Hcl::new(0.0, 0.0, 100.0).to_rgb(), Rgb::new(255, 255, 255));
        assert_eq!(Hcl::new(0.0, 0.0, 0.0).to_rgb(), Rgb::new(0, 0, 0));
        assert_eq!(Hcl::new(f64::NAN, 80.0, 100.0).to_rgb(), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_channel_clamping() {
        assert_eq!(Rgb::from_channels(-20.0, 300.0, f64::NAN), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_channels(0.5, 1.49, 254.5), Rgb::new(1, 1, 255));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!("#0a0B0c".parse::<Rgb>(), Ok(Rgb::new(10, 11, 12)));
        assert_eq!("#ccc".parse::<Rgb>(), Ok(Rgb::new(204, 204, 204)));
        assert!("0a0b0c".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Rgb::new(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(255, 0, 16));
    }
}
