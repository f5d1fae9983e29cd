use std::ops::Mul;

use glam::{DMat3, DVec3};

//
// ──────────────────────────────────────────────────────────────
//   Quaternion (w + xi + yj + zk), double precision
//
//   Composition follows the Hamilton product: in `a * b` the
//   rotation `b` is applied first, then `a`.
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion
{
  pub w: f64,
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

impl Quaternion
{
  pub const IDENTITY: Self = Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

  pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self
  {
    Self { w, x, y, z }
  }

  /// Rotation of `angle` radians about `axis`.
  ///
  /// `axis` must already be unit length; a zero axis yields a
  /// quaternion that does not represent a rotation.
  pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self
  {
    let (sin_half, cos_half) = (angle * 0.5).sin_cos();

    Self { w: cos_half, x: axis.x * sin_half, y: axis.y * sin_half, z: axis.z * sin_half }
  }

  /// Pure quaternion `(0, v)`.
  pub fn from_vector(v: DVec3) -> Self
  {
    Self { w: 0.0, x: v.x, y: v.y, z: v.z }
  }

  pub fn conjugate(self) -> Self
  {
    Self { w: self.w, x: -self.x, y: -self.y, z: -self.z }
  }

  pub fn vector(self) -> DVec3
  {
    DVec3::new(self.x, self.y, self.z)
  }

  pub fn norm(self) -> f64
  {
    (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
  }

  pub fn normalized(self) -> Self
  {
    let n = self.norm();
    if n == 0.0
    {
      return Self::IDENTITY;
    }

    Self { w: self.w / n, x: self.x / n, y: self.y / n, z: self.z / n }
  }

  /// Rotate `v` by conjugation: the vector part of `q * (0, v) * q̄`.
  pub fn rotate(self, v: DVec3) -> DVec3
  {
    (self * Self::from_vector(v) * self.conjugate()).vector()
  }

  /// Column-major rotation matrix equivalent to [`Quaternion::rotate`].
  pub fn to_mat3(self) -> DMat3
  {
    let (w, x, y, z) = (self.w, self.x, self.y, self.z);

    let xx = x * x;
    let yy = y * y;
    let zz = z * z;
    let xy = x * y;
    let xz = x * z;
    let yz = y * z;
    let wx = w * x;
    let wy = w * y;
    let wz = w * z;

    DMat3::from_cols(
      DVec3::new(1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy)),
      DVec3::new(2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx)),
      DVec3::new(2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy)),
    )
  }
}

impl Default for Quaternion
{
  fn default() -> Self
  {
    Self::IDENTITY
  }
}

impl Mul for Quaternion
{
  type Output = Quaternion;

  fn mul(self, o: Quaternion) -> Quaternion
  {
    Quaternion {
      w: self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
      x: self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
      y: self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
      z: self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
    }
  }
}
