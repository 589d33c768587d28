use app::types::Mat4;

/// Fixed increment of the `time` uniform per dispatch.
pub const TIME_STEP: f32 = 0.01;

/// Per-frame uniform block, rewritten on every dispatch.
///
/// Matches the std140 layout of the shader's `Frame` block: mat4 at offset
/// 0, vec2 at 64, int at 72, float at 76.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FrameUniform {
    pub inverse_projection_view: Mat4,
    pub resolution: [f32; 2],
    pub frame: i32,
    pub time: f32,
}

/// Single light, uploaded once at startup.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub direction: [f32; 4],
    pub radius: f32,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
    pub kind: i32,
    padding: [f32; 3],
}

impl LightUniform {
    pub fn point(position: [f32; 4], color: [f32; 4], radius: f32, attenuation: [f32; 3]) -> Self {
        Self {
            position,
            color,
            direction: [0.0; 4],
            radius,
            constant_attenuation: attenuation[0],
            linear_attenuation: attenuation[1],
            quadratic_attenuation: attenuation[2],
            kind: 0,
            padding: [0.0; 3],
        }
    }
}

/// Analytic plane. `surface` packs reflection, emission, decay and fresnel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: [f32; 4],
    pub position: [f32; 4],
    pub albedo: [f32; 4],
    pub specular: [f32; 4],
    pub surface: [f32; 4],
}

/// Analytic sphere; the radius rides in `position.w`. `surface` packs
/// reflection, emission, decay and fresnel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: [f32; 4],
    pub albedo: [f32; 4],
    pub specular: [f32; 4],
    pub surface: [f32; 4],
}

/// Accumulation frame counter.
///
/// Yields 0 on any step where the camera changed and previous + 1
/// otherwise. The very first step also yields 0, so the shader blends
/// against the cleared chain rather than trusting stale image contents.
#[derive(Debug, Default)]
pub struct FrameCounter {
    next: i32,
}

impl FrameCounter {
    pub fn advance(&mut self, camera_changed: bool) -> i32 {
        let frame = if camera_changed { 0 } else { self.next };
        self.next = frame + 1;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn uniform_blocks_match_std140_sizes() {
        assert_eq!(size_of::<FrameUniform>(), 80);
        assert_eq!(size_of::<LightUniform>(), 80);
        assert_eq!(size_of::<Plane>(), 80);
        assert_eq!(size_of::<Sphere>(), 64);
    }

    #[test]
    fn static_camera_counts_up_from_zero() {
        let mut frames = FrameCounter::default();
        let sequence: Vec<_> = (0..3).map(|_| frames.advance(false)).collect();
        assert_eq!(sequence, [0, 1, 2]);
    }

    #[test]
    fn camera_change_resets_the_count() {
        let mut frames = FrameCounter::default();
        for _ in 0..5 {
            frames.advance(false);
        }

        assert_eq!(frames.advance(true), 0);
        assert_eq!(frames.advance(false), 1);
        assert_eq!(frames.advance(false), 2);
    }

    #[test]
    fn consecutive_changes_stay_at_zero() {
        let mut frames = FrameCounter::default();
        assert_eq!(frames.advance(true), 0);
        assert_eq!(frames.advance(true), 0);
        assert_eq!(frames.advance(false), 1);
    }
}
