use std::ops::*;
use std::fmt;
use num;
use super::super::numeric::Float;

pub type Vector3f = Vector3<Float>;

/// Representation of a 3D Vector.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[repr(C)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

impl<T> Vector3<T> {
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Vector3<T> {
        Vector3::<T>{x, y, z}
    }

    #[inline]
    pub fn zero() -> Vector3<T>
    where
    T: num::Zero
    {
        Vector3::<T>{x: T::zero(), y: T::zero(), z: T::zero()}
    }

    /// Unit vector along the optical axis.
    #[inline]
    pub fn axis() -> Vector3<T>
    where
    T: num::Zero + num::One
    {
        Vector3::<T>{x: T::zero(), y: T::zero(), z: T::one()}
    }

    /// Calculate the squared length of the Vector3.
    #[inline]
    pub fn length_squared(&self) -> T
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T>
    {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Calculate the length of the Vector3.
    #[inline]
    pub fn length(&self) -> T
    where
    T: num::Float
    {
        self.length_squared().sqrt()
    }

    /// Calculate the dot product of two Vector3.
    #[inline]
    pub fn dot(&self, o: &Vector3<T>) -> T
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T>
    {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Returns the Vector3 normalized to unit length.
    #[inline]
    pub fn normalize(&self) -> Vector3<T>
    where
    T: num::Float
    {
        *self / self.length()
    }
}

impl<T> Neg for Vector3<T>
where
T: Neg<Output = T>
{
    type Output = Self;

    fn neg(self) -> Vector3<T> {
        Vector3::<T>{x: -self.x, y: -self.y, z: -self.z}
    }
}

impl<T> Add for Vector3<T>
where
T: Add<T, Output = T>
{
    type Output = Self;

    fn add(self, other: Vector3<T>) -> Vector3<T> {
        Vector3::<T>{x: self.x + other.x, y: self.y + other.y, z: self.z + other.z}
    }
}

impl<T> AddAssign for Vector3<T>
where
T: AddAssign
{
    fn add_assign(&mut self, other: Vector3<T>) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl<T> Sub for Vector3<T>
where
T: Sub<T, Output = T>
{
    type Output = Self;

    fn sub(self, other: Vector3<T>) -> Vector3<T> {
        Vector3::<T>{x: self.x - other.x, y: self.y - other.y, z: self.z - other.z}
    }
}

impl<T> Mul<T> for Vector3<T>
where
T: Copy + Mul<T, Output = T>
{
    type Output = Self;

    fn mul(self, s: T) -> Vector3<T> {
        Vector3::<T>{x: self.x * s, y: self.y * s, z: self.z * s}
    }
}

impl Mul<Vector3<Float>> for Float {
    type Output = Vector3<Float>;

    fn mul(self, v: Vector3<Float>) -> Vector3<Float> {
        v * self
    }
}

impl<T> Div<T> for Vector3<T>
where
T: Copy + Div<T, Output = T>
{
    type Output = Self;

    fn div(self, s: T) -> Vector3<T> {
        Vector3::<T>{x: self.x / s, y: self.y / s, z: self.z / s}
    }
}

impl<T> fmt::Display for Vector3<T>
where
T: fmt::Display
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}
