use std::ops::*;
use std::fmt;
use num;
use super::super::numeric::Float;

pub type Point2f = Point2<Float>;

/// A 2D Point, used for pupil-plane coordinates.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[repr(C)]
pub struct Point2<T> {
    pub x: T,
    pub y: T
}

impl<T> Point2<T> {
    #[inline]
    pub fn new(x: T, y: T) -> Point2<T> {
        Point2::<T>{x, y}
    }

    /// Create a new Point2 with both components 0.
    pub fn zero() -> Point2<T>
    where
    T: num::Zero
    {
        Point2::<T>{x: T::zero(), y: T::zero()}
    }

    /// Calculate the squared distance between two Point2.
    #[inline]
    pub fn distance_squared(&self, o: &Point2<T>) -> T
    where
    T: Copy + Sub<T, Output = T> + Mul<T, Output = T> + Add<T, Output = T>
    {
        let dx = self.x - o.x;
        let dy = self.y - o.y;
        dx * dx + dy * dy
    }

    /// Calculate the distance between two Point2.
    #[inline]
    pub fn distance(&self, o: &Point2<T>) -> T
    where
    T: num::Float
    {
        self.distance_squared(o).sqrt()
    }

    /// Distance from the origin.
    #[inline]
    pub fn norm(&self) -> T
    where
    T: num::Float
    {
        self.x.hypot(self.y)
    }

    /// True when both coordinates are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool
    where
    T: num::Float
    {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<T> Mul<T> for Point2<T>
where
T: Copy + Mul<T, Output = T>
{
    type Output = Point2<T>;

    fn mul(self, s: T) -> Point2<T> {
        Point2::<T>{x: self.x * s, y: self.y * s}
    }
}

impl<T> fmt::Display for Point2<T>
where
T: fmt::Display
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {} ]", self.x, self.y)
    }
}
