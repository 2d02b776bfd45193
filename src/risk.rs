use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub const MIN_FACTOR: u8 = 1;
pub const MAX_FACTOR: u8 = 5;
pub const MAX_RATING: u8 = MAX_FACTOR * MAX_FACTOR;

pub type Rgb = [u8; 3];

/// Clamp a likelihood or severity score into 1..=5.
pub fn clamp_factor(value: u8) -> u8 {
    value.clamp(MIN_FACTOR, MAX_FACTOR)
}

/// Classification of a numeric rating, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskBand {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskBand {
    pub const ALL: [RiskBand; 4] = [
        RiskBand::Low,
        RiskBand::Medium,
        RiskBand::High,
        RiskBand::VeryHigh,
    ];

    /// Total over every integer: values outside 1..=25 are clamped first.
    pub fn from_rating(rating: i64) -> Self {
        match rating.clamp(1, MAX_RATING as i64) {
            1..=4 => RiskBand::Low,
            5..=9 => RiskBand::Medium,
            10..=16 => RiskBand::High,
            _ => RiskBand::VeryHigh,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
            RiskBand::VeryHigh => "Very High",
        }
    }

    pub fn range(self) -> RangeInclusive<u8> {
        match self {
            RiskBand::Low => 1..=4,
            RiskBand::Medium => 5..=9,
            RiskBand::High => 10..=16,
            RiskBand::VeryHigh => 17..=25,
        }
    }

    /// Cell shading used in the matrix and the detailed table.
    pub fn color(self) -> Rgb {
        match self {
            RiskBand::Low => [0x4c, 0xaf, 0x50],
            RiskBand::Medium => [0xff, 0xc1, 0x07],
            RiskBand::High => [0xff, 0x98, 0x00],
            RiskBand::VeryHigh => [0xe5, 0x39, 0x35],
        }
    }

    /// Text color that stays readable on top of `color()`.
    pub fn text_color(self) -> Rgb {
        match self {
            RiskBand::Low | RiskBand::VeryHigh => [0xff, 0xff, 0xff],
            RiskBand::Medium | RiskBand::High => [0x21, 0x21, 0x21],
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// likelihood × severity, always within 1..=25.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RiskRating(u8);

impl RiskRating {
    pub fn new(likelihood: u8, severity: u8) -> Self {
        let product = clamp_factor(likelihood) as u16 * clamp_factor(severity) as u16;
        RiskRating(product.min(MAX_RATING as u16) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> RiskBand {
        RiskBand::from_rating(self.0 as i64)
    }
}

impl fmt::Display for RiskRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal risk level attached to a method step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            RiskLevel::Low => RiskBand::Low.color(),
            RiskLevel::Medium => RiskBand::Medium.color(),
            RiskLevel::High => RiskBand::VeryHigh.color(),
        }
    }

    pub fn text_color(self) -> Rgb {
        match self {
            RiskLevel::Low => RiskBand::Low.text_color(),
            RiskLevel::Medium => RiskBand::Medium.text_color(),
            RiskLevel::High => RiskBand::VeryHigh.text_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(RiskBand::from_rating(1), RiskBand::Low);
        assert_eq!(RiskBand::from_rating(4), RiskBand::Low);
        assert_eq!(RiskBand::from_rating(5), RiskBand::Medium);
        assert_eq!(RiskBand::from_rating(9), RiskBand::Medium);
        assert_eq!(RiskBand::from_rating(10), RiskBand::High);
        assert_eq!(RiskBand::from_rating(16), RiskBand::High);
        assert_eq!(RiskBand::from_rating(17), RiskBand::VeryHigh);
        assert_eq!(RiskBand::from_rating(25), RiskBand::VeryHigh);
    }

    #[test]
    fn out_of_range_ratings_clamp() {
        assert_eq!(RiskBand::from_rating(0), RiskBand::Low);
        assert_eq!(RiskBand::from_rating(-40), RiskBand::Low);
        assert_eq!(RiskBand::from_rating(26), RiskBand::VeryHigh);
        assert_eq!(RiskBand::from_rating(i64::MAX), RiskBand::VeryHigh);
    }

    #[test]
    fn ranges_cover_every_rating_once() {
        for r in 1..=MAX_RATING {
            let owners: Vec<RiskBand> = RiskBand::ALL
                .into_iter()
                .filter(|b| b.range().contains(&r))
                .collect();
            assert_eq!(owners, vec![RiskBand::from_rating(r as i64)]);
        }
    }

    #[test]
    fn rating_clamps_factors() {
        assert_eq!(RiskRating::new(4, 5).value(), 20);
        assert_eq!(RiskRating::new(0, 3).value(), 3);
        assert_eq!(RiskRating::new(9, 9).value(), 25);
    }

    #[test]
    fn step_levels_are_ordinal() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }
}
