use nalgebra::{Matrix4, Point3, Vector3};

pub type Point = Point3<f32>;
pub type Vec3 = Vector3<f32>;
pub type Mat4 = Matrix4<f32>;
