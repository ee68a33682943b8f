//! The closed set of visual patterns and their fixed tour order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Fractal,
    Rays,
    Tunnel,
    Bubbles,
    Voronoi,
    Waves,
    Swarm,
    Mandala,
    Dna,
    Plasma,
    Galaxy,
    Matrix,
    Lightning,
    Aurora,
    Fireworks,
    Lissajous,
    Rings,
    Starfield,
    Fluid,
    Hexgrid,
    Spirograph,
    Constellation,
}

/// Deterministic tour visited by the scheduler, independent of audio content.
pub const SEQUENCE: [Pattern; 22] = [
    Pattern::Fractal,
    Pattern::Rays,
    Pattern::Tunnel,
    Pattern::Bubbles,
    Pattern::Voronoi,
    Pattern::Waves,
    Pattern::Swarm,
    Pattern::Mandala,
    Pattern::Dna,
    Pattern::Plasma,
    Pattern::Galaxy,
    Pattern::Matrix,
    Pattern::Lightning,
    Pattern::Aurora,
    Pattern::Fireworks,
    Pattern::Lissajous,
    Pattern::Rings,
    Pattern::Starfield,
    Pattern::Fluid,
    Pattern::Hexgrid,
    Pattern::Spirograph,
    Pattern::Constellation,
];

impl Pattern {
    pub fn name(self) -> &'static str {
        match self {
            Pattern::Fractal => "fractal",
            Pattern::Rays => "rays",
            Pattern::Tunnel => "tunnel",
            Pattern::Bubbles => "bubbles",
            Pattern::Voronoi => "voronoi",
            Pattern::Waves => "waves",
            Pattern::Swarm => "swarm",
            Pattern::Mandala => "mandala",
            Pattern::Dna => "dna",
            Pattern::Plasma => "plasma",
            Pattern::Galaxy => "galaxy",
            Pattern::Matrix => "matrix",
            Pattern::Lightning => "lightning",
            Pattern::Aurora => "aurora",
            Pattern::Fireworks => "fireworks",
            Pattern::Lissajous => "lissajous",
            Pattern::Rings => "rings",
            Pattern::Starfield => "starfield",
            Pattern::Fluid => "fluid",
            Pattern::Hexgrid => "hexgrid",
            Pattern::Spirograph => "spirograph",
            Pattern::Constellation => "constellation",
        }
    }

    /// Position of this pattern in [`SEQUENCE`].
    pub fn index(self) -> usize {
        SEQUENCE.iter().position(|p| *p == self).unwrap_or(0)
    }

    /// Patterns that leave motion trails get the stronger per-frame fade.
    pub fn leaves_trails(self) -> bool {
        matches!(
            self,
            Pattern::Swarm | Pattern::Fireworks | Pattern::Starfield | Pattern::Constellation
        )
    }

    pub fn next(self) -> Pattern {
        SEQUENCE[(self.index() + 1) % SEQUENCE.len()]
    }

    pub fn previous(self) -> Pattern {
        SEQUENCE[(self.index() + SEQUENCE.len() - 1) % SEQUENCE.len()]
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pattern {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SEQUENCE
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| EngineError::config(format!("unknown pattern `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequence_covers_every_pattern_once() {
        let unique: HashSet<_> = SEQUENCE.iter().collect();
        assert_eq!(unique.len(), 22);
        for (i, p) in SEQUENCE.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn test_names_round_trip() {
        for p in SEQUENCE {
            assert_eq!(p.name().parse::<Pattern>().unwrap(), p);
        }
        assert!("kaleidoscope".parse::<Pattern>().is_err());
    }

    #[test]
    fn test_next_and_previous_wrap() {
        assert_eq!(Pattern::Constellation.next(), Pattern::Fractal);
        assert_eq!(Pattern::Fractal.previous(), Pattern::Constellation);
        assert_eq!(Pattern::Fractal.next(), Pattern::Rays);
    }
}
