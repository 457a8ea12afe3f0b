use serde::{Deserialize, Serialize};

/// Axis-aligned 3D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min_x: min[0],
            min_y: min[1],
            min_z: min[2],
            max_x: max[0],
            max_y: max[1],
            max_z: max[2],
        }
    }

    pub fn volume(&self) -> f64 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y) * (self.max_z - self.min_z)
    }

    /// Per-axis midpoint.
    pub fn center(&self) -> (f64, f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_product_of_extents() {
        let bbox = BoundingBox::new([0.0, 0.0, 0.0], [2.0, 3.0, 4.0]);
        assert_eq!(bbox.volume(), 24.0);
    }

    #[test]
    fn center_uses_midpoint_on_every_axis() {
        let bbox = BoundingBox::new([0.0, -2.0, 10.0], [4.0, 2.0, 20.0]);
        assert_eq!(bbox.center(), (2.0, 0.0, 15.0));
    }
}
