//! Component placement transforms.

use schsvg_svg::format_number;

/// The orientation matrix of a placed component together with its position.
///
/// A library point `(px, py)` lands on the sheet at
/// `(x + a*px + b*py, y + c*px + d*py)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
    pub x: i32,
    pub y: i32,
}

impl Placement {
    /// Unrotated placement at `(x, y)`; library y points up, sheet y down.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            a: 1,
            b: 0,
            c: 0,
            d: -1,
            x,
            y,
        }
    }

    /// The equivalent SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!(
            "matrix({} {} {} {} {} {})",
            self.a, self.c, self.b, self.d, self.x, self.y
        )
    }
}

/// Rotation of text about its anchor for a vertical orientation.
pub fn rotate_about(degrees: f64, x: i32, y: i32) -> String {
    format!("rotate({} {x} {y})", format_number(degrees))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_placement_flips_y() {
        let placement = Placement::at(1000, 2000);
        assert_eq!(placement.to_svg(), "matrix(1 0 0 -1 1000 2000)");
    }

    #[test]
    fn test_rotated_placement_matches_svg_matrix() {
        let placement = Placement {
            a: 0,
            b: 1,
            c: 1,
            d: 0,
            x: 10,
            y: 20,
        };
        // matrix(A B C D E F) maps (px, py) to (A*px + C*py + E, B*px + D*py + F)
        assert_eq!(placement.to_svg(), "matrix(0 1 1 0 10 20)");
    }

    #[test]
    fn test_extreme_placement_is_written_verbatim() {
        let placement = Placement::at(i32::MAX, i32::MIN);
        assert_eq!(
            placement.to_svg(),
            "matrix(1 0 0 -1 2147483647 -2147483648)"
        );
    }

    #[test]
    fn test_rotate_about() {
        assert_eq!(rotate_about(-90.0, 5, 6), "rotate(-90 5 6)");
    }
}
