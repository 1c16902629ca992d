//! Core types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Time code in seconds (f64 precision).
///
/// Used for the presentation timestamp carried alongside each source frame.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeCode(pub f64);

impl TimeCode {
    pub const ZERO: Self = Self(0.0);

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    pub fn as_millis(self) -> f64 {
        self.0 * 1000.0
    }
}

impl Add for TimeCode {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeCode {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// Rational number for frame rates (e.g., 90/1 for a 90 Hz headset).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const FPS_60: Self = Self { num: 60, den: 1 };
    pub const FPS_72: Self = Self { num: 72, den: 1 };
    pub const FPS_90: Self = Self { num: 90, den: 1 };
    pub const FPS_120: Self = Self { num: 120, den: 1 };

    pub fn new(num: u32, den: u32) -> Self {
        assert!(den > 0, "Rational denominator must be > 0");
        Self { num, den }
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Video/image resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Per-eye panel resolution of a typical standalone headset.
    pub const EYE_2K: Self = Self {
        width: 2064,
        height: 2208,
    };
    pub const HD: Self = Self {
        width: 1920,
        height: 1080,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_display() {
        assert_eq!(Rational::FPS_90.to_string(), "90");
        assert_eq!(Rational::new(30000, 1001).to_string(), "30000/1001");
    }

    #[test]
    #[should_panic(expected = "Rational denominator must be > 0")]
    fn rational_zero_den_panics() {
        let _r = Rational::new(90, 0);
    }

    #[test]
    fn resolution_pixel_count() {
        assert_eq!(Resolution::HD.pixel_count(), 1920 * 1080);
        assert_eq!(Resolution::new(0, 100).pixel_count(), 0);
    }

    #[test]
    fn timecode_arithmetic() {
        let a = TimeCode::from_secs(1.5);
        let b = TimeCode::from_secs(0.5);
        assert!(((a + b).as_secs() - 2.0).abs() < 1e-9);
        assert!(((a - b).as_secs() - 1.0).abs() < 1e-9);
        assert!((a.as_millis() - 1500.0).abs() < 1e-9);
    }
}
