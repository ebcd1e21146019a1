/// Name -> location cache for one program's loose uniforms

use rustc_hash::FxHashMap;

use crate::graphics_device::{GraphicsDevice, ProgramId, UniformLocation, UniformValue};

/// Uniform locations of a program, resolved on first use
///
/// Names the program does not use resolve to `None` and their writes are
/// dropped, matching what drivers do for optimized-out uniforms.
#[derive(Debug)]
pub(crate) struct UniformTable {
    program: ProgramId,
    locations: FxHashMap<&'static str, Option<UniformLocation>>,
}

impl UniformTable {
    pub(crate) fn new(program: ProgramId) -> Self {
        Self {
            program,
            locations: FxHashMap::default(),
        }
    }

    fn location(&mut self, device: &mut dyn GraphicsDevice, name: &'static str) -> Option<UniformLocation> {
        let program = self.program;
        *self
            .locations
            .entry(name)
            .or_insert_with(|| device.uniform_location(program, name))
    }

    /// Write a uniform of the current program; returns true if it was written
    pub(crate) fn set(&mut self, device: &mut dyn GraphicsDevice, name: &'static str, value: UniformValue) -> bool {
        match self.location(device, name) {
            Some(location) => {
                device.set_uniform(location, value);
                true
            }
            None => false,
        }
    }

    /// Point each sampler uniform at its texture unit
    ///
    /// Binds the program, leaving it current.
    pub(crate) fn bind_samplers(&mut self, device: &mut dyn GraphicsDevice, samplers: &[(&'static str, u32)]) {
        device.use_program(Some(self.program));
        for &(name, unit) in samplers {
            self.set(device, name, UniformValue::Int(unit as i32));
        }
    }
}
