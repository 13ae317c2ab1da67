mod math;
mod sync;
mod vec3d;

pub use math::{clamp_abs, clamp_unit, interpolate, wrap_angle};
pub use sync::{read_lock, write_lock};
pub use vec3d::Vec3D;

#[cfg(test)]
mod tests;
