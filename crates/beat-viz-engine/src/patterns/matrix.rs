//! Falling glyph columns.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ranges::{uniform, Checks};
use super::{FrameContext, Generator};
use crate::canvas::Canvas;
use crate::color::hsla;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixParams {
    /// Glyph cell height in pixels; also the column width
    pub font_size: f32,
    pub glyphs_per_column: usize,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Chance per column per frame that one glyph changes, at full treble
    pub mutation_chance: f64,
}

impl Default for MatrixParams {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            glyphs_per_column: 20,
            speed_min: 2.0,
            speed_max: 6.0,
            mutation_chance: 0.5,
        }
    }
}

impl MatrixParams {
    pub fn validate(&self) -> Result<()> {
        let checks = Checks::new("matrix");
        checks.positive(&[("font_size", self.font_size as f64)])?;
        checks.range("speed", self.speed_min as f64, self.speed_max as f64, 0.0)?;
        checks.probability(&[("mutation_chance", self.mutation_chance)])
    }

    pub fn column_count(&self, width: f32) -> usize {
        (width.max(0.0) / self.font_size.max(1.0)).floor() as usize
    }
}

#[derive(Clone, Debug)]
pub struct MatrixColumn {
    /// Y of the leading glyph
    pub offset: f32,
    pub speed: f32,
    pub glyphs: Vec<char>,
}

#[derive(Default)]
pub struct Matrix {
    columns: Vec<MatrixColumn>,
    bounds: Vec2,
}

impl Matrix {
    pub fn columns(&self) -> &[MatrixColumn] {
        &self.columns
    }
}

fn random_glyph(rng: &mut SmallRng) -> char {
    // Half-width katakana plus digits
    if rng.random_bool(0.2) {
        char::from(b'0' + rng.random_range(0..10u8))
    } else {
        char::from_u32(rng.random_range(0xFF66..=0xFF9D)).unwrap_or('0')
    }
}

fn new_column(bounds: Vec2, params: &MatrixParams, rng: &mut SmallRng) -> MatrixColumn {
    MatrixColumn {
        offset: -rng.random_range(0.0..bounds.y.max(1.0)),
        speed: uniform(rng, params.speed_min, params.speed_max),
        glyphs: (0..params.glyphs_per_column).map(|_| random_glyph(rng)).collect(),
    }
}

impl Generator for Matrix {
    type Params = MatrixParams;

    fn reset(&mut self, size: Vec2, params: &MatrixParams, rng: &mut SmallRng) {
        self.bounds = size;
        self.columns = (0..params.column_count(size.x))
            .map(|_| new_column(size, params, rng))
            .collect();
    }

    fn render(
        &mut self,
        canvas: &mut Canvas,
        ctx: &FrameContext,
        params: &MatrixParams,
        rng: &mut SmallRng,
    ) {
        let m = ctx.metrics;
        let font = params.font_size.max(1.0);
        let mutate = (params.mutation_chance * m.treble as f64).clamp(0.0, 1.0);

        for (i, column) in self.columns.iter_mut().enumerate() {
            column.offset += column.speed * (1.0 + m.bass);
            let tail = column.glyphs.len() as f32 * font;
            if column.offset - tail > self.bounds.y {
                *column = new_column(self.bounds, params, rng);
            }
            if !column.glyphs.is_empty() && rng.random_bool(mutate) {
                let k = rng.random_range(0..column.glyphs.len());
                column.glyphs[k] = random_glyph(rng);
            }

            let x = i as f32 * font;
            let n = column.glyphs.len().max(1) as f32;
            for (k, &glyph) in column.glyphs.iter().enumerate() {
                let y = column.offset - k as f32 * font;
                if y < -font || y > self.bounds.y {
                    continue;
                }
                let color = if k == 0 {
                    hsla(ctx.hue_base + 120.0, 0.4, 0.9, 1.0)
                } else {
                    let fade = 1.0 - k as f32 / n;
                    hsla(ctx.hue_base + 120.0, 0.9, 0.35 + m.mid * 0.2, fade)
                };
                canvas.fill_glyph(glyph, Vec2::new(x + font * 0.15, y), font * 0.9, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyMetrics;
    use rand::SeedableRng;

    #[test]
    fn test_column_count_follows_width() {
        let params = MatrixParams::default();
        let mut matrix = Matrix::default();
        let mut rng = SmallRng::seed_from_u64(1);
        matrix.reset(Vec2::new(140.0, 80.0), &params, &mut rng);
        assert_eq!(matrix.columns().len(), 10);
        assert!(matrix.columns().iter().all(|c| c.glyphs.len() == 20));

        matrix.reset(Vec2::new(13.0, 80.0), &params, &mut rng);
        assert!(matrix.columns().is_empty());
    }

    #[test]
    fn test_columns_fall_and_wrap() {
        let params = MatrixParams::default();
        let mut matrix = Matrix::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut canvas = Canvas::new(70, 50).unwrap();
        matrix.reset(canvas.size(), &params, &mut rng);

        let ctx = FrameContext {
            metrics: FrequencyMetrics {
                bass: 1.0,
                ..FrequencyMetrics::SILENT
            },
            ..FrameContext::default()
        };
        for _ in 0..500 {
            matrix.render(&mut canvas, &ctx, &params, &mut rng);
            for column in matrix.columns() {
                let tail = column.glyphs.len() as f32 * params.font_size;
                assert!(column.offset - tail <= 50.0 + params.speed_max * 2.0);
            }
        }
        assert_eq!(matrix.columns().len(), 5);
    }
}
