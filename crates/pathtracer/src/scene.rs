//! The fixed scene: a walled box of analytic planes with four spheres and a
//! single point light. Built once, uploaded once, immutable for the process
//! lifetime.

use crate::uniforms::{LightUniform, Plane, Sphere};

pub const PLANE_COUNT: usize = 6;
pub const SPHERE_COUNT: usize = 4;

pub fn light() -> LightUniform {
    LightUniform::point(
        [0.0, 1.0, 1.0, 0.0],
        [0.5, 0.5, 0.5, 0.5],
        4.0,
        [0.0, 0.2, 3.0],
    )
}

pub fn planes() -> [Plane; PLANE_COUNT] {
    let floor = Plane {
        position: [0.0, -0.5, 0.0, 1.0],
        normal: [0.0, 1.0, 0.0, 0.0],
        albedo: [0.2, 1.0, 0.2, 1.0],
        specular: [0.0, 0.0, 0.0, 0.0],
        surface: [0.4, 0.0, 0.0, 0.025],
    };

    let ceiling = Plane {
        position: [0.0, 1.5, 0.0, 1.0],
        normal: [0.0, -1.0, 0.0, 0.0],
        albedo: [0.2, 0.2, 1.0, 1.0],
        specular: [0.0, 0.0, 0.0, 0.0],
        surface: [0.95, 0.0, 0.0, 0.025],
    };

    let mirror = Plane {
        position: [0.0, 0.0, -1.0, 1.0],
        normal: [0.0, 0.0, 1.0, 0.0],
        albedo: [0.0, 0.0, 0.0, 1.0],
        specular: [0.0, 0.0, 0.0, 1.0],
        surface: [0.05, 0.0, 0.0, 0.025],
    };

    let left_wall = Plane {
        position: [-1.5, 0.0, 0.0, 1.0],
        normal: [1.0, 0.0, 0.0, 0.0],
        albedo: [0.0, 0.0, 0.0, 0.0],
        specular: [0.0, 0.0, 0.0, 0.0],
        surface: [0.3, 0.0, 0.0, 0.025],
    };

    let right_wall = Plane {
        position: [2.0, 0.0, 0.0, 1.0],
        normal: [-1.0, 0.0, 0.0, 0.0],
        albedo: [1.0, 0.2, 0.2, 1.0],
        specular: [1.0, 0.1, 0.1, 0.0],
        surface: [0.95, 0.0, 0.0, 0.025],
    };

    let back_wall = Plane {
        position: [0.0, 0.0, 4.0, 1.0],
        normal: [0.0, 0.0, -1.0, 0.0],
        albedo: [1.0, 1.0, 1.0, 1.0],
        specular: [0.0, 0.0, 0.0, 0.0],
        surface: [0.99, 0.0, 0.0, 0.025],
    };

    [floor, ceiling, mirror, left_wall, right_wall, back_wall]
}

pub fn spheres() -> [Sphere; SPHERE_COUNT] {
    let chrome = Sphere {
        position: [0.0, 0.25, -0.5, 0.4],
        albedo: [0.0, 0.0, 0.0, 1.0],
        specular: [15.0, 15.0, 15.0, 1.0],
        surface: [0.0, 0.0, 0.0, 0.025],
    };

    let green = Sphere {
        position: [1.1, 0.2, 0.3, 0.4],
        albedo: [0.0, 1.0, 0.0, 1.0],
        specular: [0.0, 0.0, 0.0, 0.0],
        surface: [1.0, 0.0, 0.0, 0.025],
    };

    let red = Sphere {
        position: [0.5, 0.0, 1.0, 0.4],
        albedo: [0.9, 0.0, 0.0, 0.0],
        specular: [3.0, 3.0, 3.0, 0.0],
        surface: [0.2, 0.0, 0.0, 0.025],
    };

    let white = Sphere {
        position: [0.5, 0.0, 3.3, 0.4],
        albedo: [1.0, 1.0, 1.0, 1.0],
        specular: [3.0, 3.0, 3.0, 0.0],
        surface: [0.2, 0.0, 0.0, 0.025],
    };

    [chrome, green, red, white]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_has_its_fixed_primitive_counts() {
        assert_eq!(planes().len(), PLANE_COUNT);
        assert_eq!(spheres().len(), SPHERE_COUNT);
    }

    #[test]
    fn walls_face_into_the_box() {
        for plane in planes() {
            let normal = plane.normal;
            let position = plane.position;
            // each wall normal points back toward the origin
            let dot: f32 = (0..3).map(|i| normal[i] * -position[i]).sum();
            assert!(dot >= 0.0, "normal {normal:?} faces away from the scene");
        }
    }

    #[test]
    fn spheres_store_their_radius_in_w() {
        for sphere in spheres() {
            assert!(sphere.position[3] > 0.0);
        }
    }

    #[test]
    fn light_sits_inside_the_box() {
        let light = light();
        assert_eq!(light.kind, 0);
        assert!(light.position[1] > -0.5 && light.position[1] < 1.5);
        assert!(light.radius > 0.0);
    }
}
