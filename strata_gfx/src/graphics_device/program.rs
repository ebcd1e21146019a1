/// Shader program handle, program descriptor and uniform values

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Opaque handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Location of a uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Descriptor for creating a shader program
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    /// Debug name
    pub name: &'static str,
    /// Vertex stage source
    pub vertex_source: &'static str,
    /// Fragment stage source
    pub fragment_source: &'static str,
}

/// Value written to a single uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}
