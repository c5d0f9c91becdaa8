use qora_core::Scalar;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

/// A fixed-length integer vector treated as a single attribute reading
/// (spec.md §4.C1). Supports elementwise arithmetic, a Manhattan (`L1`)
/// length, and a total order used for map keys and tie-breaks throughout
/// the workspace.
///
/// Widths must match for binary operations; mismatched widths are a
/// programming error and panic, matching the teacher's convention of
/// trusting internally-constructed invariants (e.g. `rbp-cards::Hand`
/// bitwise ops never check operand compatibility either).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AttributeValue(Vec<Scalar>);

impl AttributeValue {
    /// A zero vector of the given width.
    pub fn zero(width: usize) -> Self {
        Self(vec![0; width])
    }

    /// Construct directly from a list of elements.
    pub fn from_values(values: impl Into<Vec<Scalar>>) -> Self {
        Self(values.into())
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Scalar {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, value: Scalar) {
        self.0[index] = value;
    }

    /// Manhattan (`L1`) norm: sum of absolute values of every element.
    pub fn length(&self) -> i64 {
        self.0.iter().map(|&v| (v as i64).abs()).sum()
    }

    fn assert_same_width(&self, other: &Self) {
        assert_eq!(
            self.width(),
            other.width(),
            "attribute value width mismatch: {} vs {}",
            self.width(),
            other.width()
        );
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

impl Add for AttributeValue {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}
impl AddAssign for AttributeValue {
    fn add_assign(&mut self, rhs: Self) {
        self.assert_same_width(&rhs);
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a = a.wrapping_add(*b);
        }
    }
}
impl Sub for AttributeValue {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}
impl SubAssign for AttributeValue {
    fn sub_assign(&mut self, rhs: Self) {
        self.assert_same_width(&rhs);
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a = a.wrapping_sub(*b);
        }
    }
}
impl Mul<Scalar> for AttributeValue {
    type Output = Self;
    fn mul(mut self, rhs: Scalar) -> Self {
        self *= rhs;
        self
    }
}
impl MulAssign<Scalar> for AttributeValue {
    fn mul_assign(&mut self, rhs: Scalar) {
        for a in self.0.iter_mut() {
            *a = a.wrapping_mul(rhs);
        }
    }
}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for AttributeValue {
    /// Total order: first by length (number of elements), then
    /// lexicographic (spec.md §3).
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}
