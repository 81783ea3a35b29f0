use std::str::FromStr;

#[derive(Clone, Copy, Eq, PartialEq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl Color {
    pub const TRANSPARENT: Self = Self::from_rgba(0x00000000);
    pub const WHITE: Self = Self::from_rgb(0xffffff);
    pub const BLACK: Self = Self::from_rgb(0x000000);

    pub const RED: Self = Self::from_rgb(0xff0000);
    pub const DARK_RED: Self = Self::from_rgb(0x8b0000);
    pub const ORANGE: Self = Self::from_rgb(0xffa500);
    pub const YELLOW: Self = Self::from_rgb(0xffff00);
    pub const KHAKI: Self = Self::from_rgb(0xf0e68c);
    pub const GREEN: Self = Self::from_rgb(0x00ff00);
    pub const DARK_GREEN: Self = Self::from_rgb(0x006400);
    pub const BLUE: Self = Self::from_rgb(0x0000ff);
    pub const LIGHT_BLUE: Self = Self::from_rgb(0xadd8e6);
    pub const GRAY: Self = Self::from_rgb(0xa0a0a0);

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    // Without alpha use 0xRRGGBB
    #[inline]
    pub const fn from_rgb(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
            a: 255,
        }
    }

    /// 0xRRGGBBAA
    #[inline]
    pub const fn from_rgba(rgba: u32) -> Self {
        Self {
            r: ((rgba >> 24) & 0xff) as u8,
            g: ((rgba >> 16) & 0xff) as u8,
            b: ((rgba >> 8) & 0xff) as u8,
            a: (rgba & 0xff) as u8,
        }
    }

    /// The color as 0xRRGGBB, the form styles store it in.
    #[inline]
    pub const fn rgb(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        (self.a as f32) / 255.0
    }

    /// Scales rgb by `alpha` and packs the result so its little endian bytes read `r g b a`.
    pub fn premultiplied(&self, alpha: f32) -> u32 {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha >= 1.0 {
            return u32::from_le_bytes([self.r, self.g, self.b, 255]);
        }
        if alpha <= 0.0 {
            return 0;
        }

        let scale = |channel: u8| ((channel as f32) * alpha + 0.5) as u8;
        u32::from_le_bytes([
            scale(self.r),
            scale(self.g),
            scale(self.b),
            (alpha * 255.0) as u8,
        ])
    }
}

/// Packs a 0xRRGGBB color with `alpha` into the premultiplied per-vertex form.
#[inline]
pub fn premultiply_rgb(rgb: u32, alpha: f32) -> u32 {
    Color::from_rgb(rgb).premultiplied(alpha)
}

impl From<u32> for Color {
    fn from(color: u32) -> Self {
        Self::from_rgba(color)
    }
}

impl From<[u8; 4]> for Color {
    fn from(color: [u8; 4]) -> Self {
        Self {
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
        }
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from(color: (u8, u8, u8, u8)) -> Self {
        Self {
            r: color.0,
            g: color.1,
            b: color.2,
            a: color.3,
        }
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b, color.a]
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        ((color.r as u32) << 24) | ((color.g as u32) << 16) | ((color.b as u32) << 8) | (color.a as u32)
    }
}

impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "color({:#010x})", u32::from(*self))
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl TryFrom<&'_ str> for Color {
    type Error = anyhow::Error;

    fn try_from(hex: &'_ str) -> Result<Self, Self::Error> {
        let hex = hex.trim();
        const RGB: usize = 3;
        const RGBA: usize = 4;
        const RRGGBB: usize = 6;
        const RRGGBBAA: usize = 8;

        const fn dup(value: u8) -> u8 {
            (value << 4) | value
        }

        if let Some(hex) = hex.strip_prefix('#') {
            return match hex.len() {
                format @ (RGB | RGBA) => {
                    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16);
                    let alpha = if format == RGBA { digit(3)? } else { 0xf };
                    Ok(Color {
                        r: dup(digit(0)?),
                        g: dup(digit(1)?),
                        b: dup(digit(2)?),
                        a: dup(alpha),
                    })
                }
                format @ (RRGGBB | RRGGBBAA) => {
                    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                    let a = if format == RRGGBBAA { byte(6)? } else { 0xff };
                    Ok(Color {
                        r: byte(0)?,
                        g: byte(2)?,
                        b: byte(4)?,
                        a,
                    })
                }
                _ => anyhow::bail!(
                    "invalid hex color format: '{}' expected #rgb, #rgba, #rrggbb or #rrggbbaa",
                    hex
                ),
            };
        }

        // rgb(r, g, b) | rgba(r, g, b, a)
        if let Some(inner) = hex
            .strip_prefix("rgba(")
            .or_else(|| hex.strip_prefix("rgb("))
            .and_then(|s| s.strip_suffix(')'))
        {
            let is_rgba = hex.starts_with("rgba(");
            let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
            if parts.len() != if is_rgba { 4 } else { 3 } {
                anyhow::bail!("invalid functional color format: '{}'", hex);
            }
            let a = if is_rgba {
                (parts[3].parse::<f32>()?.clamp(0.0, 1.0) * 255.0).round() as u8
            } else {
                255
            };
            return Ok(Color {
                r: parts[0].parse()?,
                g: parts[1].parse()?,
                b: parts[2].parse()?,
                a,
            });
        }

        anyhow::bail!(
            "invalid color format: '{}'. Expected #rgb, #rgba, #rrggbb, #rrggbbaa, rgb(r, g, b), or rgba(r, g, b, a)",
            hex
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_and_functional() {
        assert_eq!("#f00".parse::<Color>().unwrap(), Color::RED);
        assert_eq!("#00ff0080".parse::<Color>().unwrap().a, 0x80);
        assert_eq!(
            "rgba(0, 0, 255, 0.5)".parse::<Color>().unwrap(),
            Color::from((0, 0, 255, 128))
        );
        assert!("#12345".parse::<Color>().is_err());
        assert!("hsl(0, 0, 0)".parse::<Color>().is_err());
    }

    #[test]
    fn premultiplied_packs_rgba_little_endian() {
        let opaque = premultiply_rgb(0xff8000, 1.0);
        assert_eq!(opaque.to_le_bytes(), [0xff, 0x80, 0x00, 0xff]);

        let half = premultiply_rgb(0xff8000, 0.5);
        assert_eq!(half.to_le_bytes(), [128, 64, 0, 127]);

        assert_eq!(premultiply_rgb(0xffffff, 0.0), 0);
    }

    #[test]
    fn rgb_drops_alpha() {
        assert_eq!(Color::from_rgba(0x11223344).rgb(), 0x112233);
    }
}
