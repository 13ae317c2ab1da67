use num::traits::{Float, Num, NumCast, real::Real};
use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 3D vector generic over any numeric type.
///
/// Positions use a local tangent frame: `x` east, `y` north, `z` up (meters).
/// Bearings derived from it are measured clockwise from north, in radians.
///
/// # Type Parameters
/// * `T` - The functionality for the vector depends on traits implemented by `T`.
#[derive(Debug, PartialEq, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec3D<T> {
    /// The east component.
    x: T,
    /// The north component.
    y: T,
    /// The up component.
    z: T,
}

impl<T: Copy> Vec3D<T> {
    /// Creates a new vector with the given components.
    ///
    /// # Arguments
    /// * `x` - The east component.
    /// * `y` - The north component.
    /// * `z` - The up component.
    pub const fn new(x: T, y: T, z: T) -> Self { Self { x, y, z } }

    pub const fn x(&self) -> T { self.x }
    pub const fn y(&self) -> T { self.y }
    pub const fn z(&self) -> T { self.z }
}

impl<T: Num + Copy> Vec3D<T> {
    /// Creates a zero vector.
    pub fn zero() -> Self { Self::new(T::zero(), T::zero(), T::zero()) }

    /// Computes the dot product of the current vector with another vector.
    pub fn dot(self, other: Self) -> T { self.x * other.x + self.y * other.y + self.z * other.z }

    /// Returns the vector pointing from `self` to `other`.
    pub fn to(&self, other: &Self) -> Self {
        Self::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }
}

impl<T: Real> Vec3D<T> {
    /// Computes the magnitude of the vector.
    pub fn abs(&self) -> T { self.dot(*self).sqrt() }

    /// Computes the magnitude of the horizontal (east/north) projection.
    pub fn horizontal_abs(&self) -> T { (self.x.powi(2) + self.y.powi(2)).sqrt() }

    /// Normalizes the vector to have a magnitude of 1.
    /// If the magnitude is zero, the original vector is returned unmodified.
    pub fn normalize(self) -> Self {
        let magnitude = self.abs();
        if magnitude.is_zero() { self } else { self / magnitude }
    }

    /// Computes the Euclidean distance between `self` and `other`.
    pub fn euclid_distance(&self, other: &Self) -> T { self.to(other).abs() }

    /// Horizontal bearing from `self` towards `other`, clockwise from north in `(-pi, pi]`.
    pub fn bearing_to(&self, other: &Self) -> T {
        let d = self.to(other);
        d.x.atan2(d.y)
    }
}

impl<T: Float> Vec3D<T> {
    /// Returns `true` if every component is finite.
    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() && self.z.is_finite() }
}

impl<T: Num + Copy> Add for Vec3D<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output { Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z) }
}

impl<T: Num + Copy> Sub for Vec3D<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output { Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z) }
}

impl<T: Num + Copy + Neg<Output = T>> Neg for Vec3D<T> {
    type Output = Self;

    fn neg(self) -> Self::Output { Self::new(-self.x, -self.y, -self.z) }
}

impl<T, TMul> Mul<TMul> for Vec3D<T>
where
    T: Num + NumCast + Copy,
    TMul: Num + NumCast + Copy,
{
    type Output = Vec3D<T>;

    /// Implements the `*` operator for a `Vec3D` and a scalar.
    ///
    /// # Panics
    /// Panics if `rhs` is not representable as `T`.
    fn mul(self, rhs: TMul) -> Self::Output {
        let k = T::from(rhs).unwrap();
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl<T, TDiv> Div<TDiv> for Vec3D<T>
where
    T: Num + NumCast + Copy,
    TDiv: Num + NumCast + Copy,
{
    type Output = Vec3D<T>;

    /// Implements the `/` operator for a `Vec3D` and a scalar.
    ///
    /// # Panics
    /// Panics if `rhs` is not representable as `T`.
    fn div(self, rhs: TDiv) -> Self::Output {
        let k = T::from(rhs).unwrap();
        Self::new(self.x / k, self.y / k, self.z / k)
    }
}

impl<T: Copy> From<[T; 3]> for Vec3D<T> {
    fn from(arr: [T; 3]) -> Self { Self::new(arr[0], arr[1], arr[2]) }
}

impl<T: Copy> From<Vec3D<T>> for [T; 3] {
    fn from(v: Vec3D<T>) -> Self { [v.x, v.y, v.z] }
}

impl<T: Display> Display for Vec3D<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}
