use bytemuck::NoUninit;

pub const DEFAULT_SIMULATION_WIDTH: u32 = 1024;
pub const DEFAULT_SIMULATION_HEIGHT: u32 = 1024;
pub const SIMULATION_WORK_GROUP_SIZE: u32 = 8;

/// Height of the status strip at the top of the window, in pixels.
pub const HEADER_HEIGHT: u32 = 28;

/// MUST exactly match the definition in swe.wgsl
#[repr(C)]
#[derive(NoUninit, Copy, Clone, Debug)]
pub struct SimParams {
    pub dx: f32,
    pub delta_time: f32,
    pub g: f32,
    pub epsilon: f32,
    pub alpha: f32,
    pub beta: f32,
    pub base_height: f32,
    pub tex_size_x: u32,
    pub tex_size_y: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_params_layout_matches_shader() {
        // Nine 4-byte fields, no implicit padding anywhere the shader wouldn't
        // expect it.
        assert_eq!(size_of::<SimParams>(), 36);
        assert_eq!(std::mem::offset_of!(SimParams, dx), 0);
        assert_eq!(std::mem::offset_of!(SimParams, base_height), 24);
        assert_eq!(std::mem::offset_of!(SimParams, tex_size_x), 28);
        assert_eq!(std::mem::offset_of!(SimParams, tex_size_y), 32);
    }
}
