use std::ops::*;
use std::fmt;
use num;
use super::super::numeric::Float;
use super::{Vector3, Point2};

pub type Point3f = Point3<Float>;

/// A 3D Point.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[repr(C)]
pub struct Point3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

impl<T> Point3<T> {
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Point3<T> {
        Point3::<T>{x, y, z}
    }

    /// Create a new Point3 with all components 0.
    pub fn zero() -> Point3<T>
    where
    T: num::Zero
    {
        Point3::<T>{x: T::zero(), y: T::zero(), z: T::zero()}
    }

    /// Squared distance from the optical (z) axis.
    #[inline]
    pub fn radial_squared(&self) -> T
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T>
    {
        self.x * self.x + self.y * self.y
    }

    /// Calculate the distance between two Point3.
    #[inline]
    pub fn distance(&self, o: &Point3<T>) -> T
    where
    T: num::Float
    {
        (*self - *o).length()
    }

    /// Drop the axial component.
    #[inline]
    pub fn xy(&self) -> Point2<T>
    where
    T: Copy
    {
        Point2::<T>::new(self.x, self.y)
    }
}

impl<T> From<Point3<T>> for Vector3<T> {
    fn from(p: Point3<T>) -> Vector3<T> {
        Vector3::<T>::new(p.x, p.y, p.z)
    }
}

impl<T> Add<Vector3<T>> for Point3<T>
where
T: Add<T, Output = T>
{
    type Output = Point3<T>;

    fn add(self, v: Vector3<T>) -> Point3<T> {
        Point3::<T>{x: self.x + v.x, y: self.y + v.y, z: self.z + v.z}
    }
}

impl<T> Sub<Point3<T>> for Point3<T>
where
T: Sub<T, Output = T>
{
    type Output = Vector3<T>;

    fn sub(self, p: Point3<T>) -> Vector3<T> {
        Vector3::<T>::new(self.x - p.x, self.y - p.y, self.z - p.z)
    }
}

impl<T> Sub<Vector3<T>> for Point3<T>
where
T: Sub<T, Output = T>
{
    type Output = Point3<T>;

    fn sub(self, v: Vector3<T>) -> Point3<T> {
        Point3::<T>{x: self.x - v.x, y: self.y - v.y, z: self.z - v.z}
    }
}

impl<T> fmt::Display for Point3<T>
where
T: fmt::Display
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}
