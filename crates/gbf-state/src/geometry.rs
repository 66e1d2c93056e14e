use gbf_data::Offset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen coordinates in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Offset) -> Self {
        Self::new(self.x + by.dx, self.y + by.dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_distance() {
        let p = Point::new(500, 900).offset(Offset::new(-400, 0));
        assert_eq!(p, Point::new(100, 900));
        assert_eq!(Point::new(0, 0).distance(Point::new(3, 4)), 5.0);
    }
}
