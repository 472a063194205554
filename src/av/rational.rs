use std::fmt;

/// An exact rational number, used for time bases and audio sample rates.
///
/// NUT declares both as integer numerator/denominator pairs and the
/// demuxer keeps them that way: converting to floating point would throw
/// away precision the container intentionally preserves (a caller that
/// wants an approximation can ask for one explicitly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// Numerator
    pub num: i64,
    /// Denominator
    pub den: i64,
}

impl Rational {
    /// Creates a rational from a numerator and denominator.
    ///
    /// The value is stored exactly as given; no reduction is performed,
    /// and a zero denominator is representable so that callers can decide
    /// how to treat it.
    pub const fn new(num: i64, den: i64) -> Self {
        Rational { num, den }
    }

    /// Returns true when the denominator is zero, i.e. the value does not
    /// denote a number.
    pub const fn is_undefined(&self) -> bool {
        self.den == 0
    }

    /// Lossy conversion to floating point.
    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Rescales an integer tick count by this rational, truncating toward
    /// zero. Useful for turning a pts in stream ticks into another unit.
    pub fn scale(&self, ticks: i64) -> i64 {
        ticks * self.num / self.den
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
