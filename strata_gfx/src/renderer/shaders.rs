/// Built-in GLSL programs

use crate::graphics_device::ProgramDesc;

pub const UI_PROGRAM: ProgramDesc = ProgramDesc {
    name: "ui",
    vertex_source: include_str!("../../shaders/ui.vert.glsl"),
    fragment_source: include_str!("../../shaders/ui.frag.glsl"),
};

pub const TERRAIN_PROGRAM: ProgramDesc = ProgramDesc {
    name: "terrain",
    vertex_source: include_str!("../../shaders/terrain.vert.glsl"),
    fragment_source: include_str!("../../shaders/terrain.frag.glsl"),
};

pub const SHADOW_PROGRAM: ProgramDesc = ProgramDesc {
    name: "shadow",
    vertex_source: include_str!("../../shaders/shadow.vert.glsl"),
    fragment_source: include_str!("../../shaders/shadow.frag.glsl"),
};
