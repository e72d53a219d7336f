use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use num_bigint::BigUint;
use num_traits::Zero;

/// Non-negative arbitrary-precision integer with a sentinel maximum value.
///
/// `Int::max_value()` compares greater than every finite value and absorbs
/// addition, subtraction and scaling. It is the initial flow of a path
/// search and the conventional "unconstrained" requested amount.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Int(Magnitude);

// Variant order makes every finite value compare below Max.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
enum Magnitude {
    Finite(BigUint),
    Max,
}

impl Default for Magnitude {
    fn default() -> Self {
        Magnitude::Finite(BigUint::default())
    }
}

impl Int {
    pub fn zero() -> Int {
        Int::default()
    }

    pub fn max_value() -> Int {
        Int(Magnitude::Max)
    }

    pub fn is_zero(&self) -> bool {
        match &self.0 {
            Magnitude::Finite(value) => value.is_zero(),
            Magnitude::Max => false,
        }
    }

    pub fn is_max(&self) -> bool {
        matches!(self.0, Magnitude::Max)
    }

    /// Minimal big-endian byte encoding; empty for zero.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        match &self.0 {
            Magnitude::Finite(value) if value.is_zero() => vec![],
            Magnitude::Finite(value) => value.to_bytes_be(),
            Magnitude::Max => panic!("the maximum value has no byte encoding"),
        }
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Int {
        Int(Magnitude::Finite(BigUint::from_bytes_be(bytes)))
    }
}

impl From<BigUint> for Int {
    fn from(item: BigUint) -> Self {
        Int(Magnitude::Finite(item))
    }
}

impl From<u64> for Int {
    fn from(item: u64) -> Self {
        Int(Magnitude::Finite(BigUint::from(item)))
    }
}

impl From<u128> for Int {
    fn from(item: u128) -> Self {
        Int(Magnitude::Finite(BigUint::from(item)))
    }
}

impl From<&str> for Int {
    fn from(item: &str) -> Self {
        let parsed = if let Some(hex) = item.strip_prefix("0x") {
            BigUint::parse_bytes(hex.as_bytes(), 16)
        } else {
            BigUint::parse_bytes(item.as_bytes(), 10)
        };
        match parsed {
            Some(value) => Int(Magnitude::Finite(value)),
            None => panic!("invalid integer literal: {item}"),
        }
    }
}

impl Add for Int {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        match (self.0, rhs.0) {
            (Magnitude::Finite(a), Magnitude::Finite(b)) => Int(Magnitude::Finite(a + b)),
            _ => Int(Magnitude::Max),
        }
    }
}

impl AddAssign for Int {
    fn add_assign(&mut self, rhs: Int) {
        *self = std::mem::take(self) + rhs;
    }
}

impl Sub for Int {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        match (self.0, rhs.0) {
            (Magnitude::Finite(a), Magnitude::Finite(b)) => {
                assert!(a >= b, "Int subtraction below zero");
                Int(Magnitude::Finite(a - b))
            }
            (Magnitude::Max, Magnitude::Finite(_)) => Int(Magnitude::Max),
            (_, Magnitude::Max) => panic!("cannot subtract the maximum value"),
        }
    }
}

impl SubAssign for Int {
    fn sub_assign(&mut self, rhs: Int) {
        *self = std::mem::take(self) - rhs;
    }
}

impl Mul<u32> for Int {
    type Output = Self;
    fn mul(self, rhs: u32) -> Self {
        match self.0 {
            Magnitude::Finite(value) => Int(Magnitude::Finite(value * rhs)),
            Magnitude::Max => Int(Magnitude::Max),
        }
    }
}

impl Div<u32> for Int {
    type Output = Self;
    fn div(self, rhs: u32) -> Self {
        match self.0 {
            Magnitude::Finite(value) => Int(Magnitude::Finite(value / rhs)),
            Magnitude::Max => Int(Magnitude::Max),
        }
    }
}

impl Display for Int {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.0 {
            Magnitude::Finite(value) => write!(f, "{value}"),
            Magnitude::Max => write!(f, "max"),
        }
    }
}
