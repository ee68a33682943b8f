//! Colour type and HSL conversion shared by all patterns.

use palette::{FromColor, Hsla, Srgba};

/// sRGB-encoded RGBA colour, every component in 0.0-1.0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl From<Srgba> for Rgba {
    fn from(color: Srgba) -> Self {
        let (r, g, b, a) = color.into_components();
        Self::rgba(r, g, b, a)
    }
}

/// Wraps any hue (degrees, possibly negative or > 360) into [0, 360).
pub fn wrap_hue(hue: f32) -> f32 {
    if !hue.is_finite() {
        return 0.0;
    }
    let h = hue % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Convert hue (degrees), saturation (0-1), lightness (0-1) and alpha to RGBA.
///
/// Out-of-range inputs are clamped and a non-finite hue reads as 0.
pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Rgba {
    let hsl = Hsla::new_srgb(
        wrap_hue(hue),
        saturation.clamp(0.0, 1.0),
        lightness.clamp(0.0, 1.0),
        alpha.clamp(0.0, 1.0),
    );
    let rgb: Srgba = Srgba::from_color(hsl);
    rgb.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_primary_hues() {
        assert!(close(hsla(0.0, 1.0, 0.5, 1.0), Rgba::rgb(1.0, 0.0, 0.0)));
        assert!(close(hsla(120.0, 1.0, 0.5, 1.0), Rgba::rgb(0.0, 1.0, 0.0)));
        assert!(close(hsla(240.0, 1.0, 0.5, 1.0), Rgba::rgb(0.0, 0.0, 1.0)));
        assert!(close(hsla(60.0, 1.0, 0.25, 1.0), Rgba::rgb(0.5, 0.5, 0.0)));
    }

    #[test]
    fn test_hue_wraps() {
        assert!(close(hsla(360.0 + 120.0, 1.0, 0.5, 1.0), hsla(120.0, 1.0, 0.5, 1.0)));
        assert!(close(hsla(-120.0, 1.0, 0.5, 1.0), hsla(240.0, 1.0, 0.5, 1.0)));
        assert!(close(hsla(f32::NAN, 1.0, 0.5, 1.0), hsla(0.0, 1.0, 0.5, 1.0)));
        assert_eq!(wrap_hue(f32::NAN), 0.0);
    }

    #[test]
    fn test_lightness_extremes_and_clamping() {
        assert!(close(hsla(200.0, 1.0, 0.0, 1.0), Rgba::BLACK));
        assert!(close(hsla(200.0, 1.0, 1.0, 1.0), Rgba::WHITE));
        assert!(close(hsla(200.0, 1.0, 7.0, 1.0), Rgba::WHITE));
        assert!(close(hsla(30.0, 0.0, 0.5, 1.0), Rgba::rgb(0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_alpha_passes_through_clamped() {
        assert_eq!(hsla(10.0, 0.5, 0.5, 0.25).a, 0.25);
        assert_eq!(hsla(10.0, 0.5, 0.5, -3.0).a, 0.0);
        assert_eq!(hsla(10.0, 0.5, 0.5, 9.0).a, 1.0);
    }
}
