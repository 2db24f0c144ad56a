//! Surface materials, combined per contact pair by the narrow phase.

/// Restitution (bounciness) and friction, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub restitution: f64,
    pub friction: f64,
}

impl Material {
    pub const DEFAULT: Material = Material::new(0.5, 0.3);
    pub const BOUNCY: Material = Material::new(0.9, 0.1);
    pub const HEAVY: Material = Material::new(0.1, 0.8);
    pub const LIGHT: Material = Material::new(0.7, 0.2);
    pub const FRICTIONLESS: Material = Material::new(0.5, 0.0);

    pub const fn new(restitution: f64, friction: f64) -> Self {
        Self {
            restitution,
            friction,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}
