//! Outer boundaries of binary masks and their shape measures

use crate::imgproc::mask_to_image;
use depthify_core::Mask;
use imageproc::contours::{find_contours, BorderType};
use itertools::Itertools;

/// A closed boundary polyline through pixel centres
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<(i64, i64)>,
}

impl Contour {
    /// Length of the closed polyline
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points
            .iter()
            .circular_tuple_windows::<(_, _)>()
            .map(|(a, b)| {
                let dx = (b.0 - a.0) as f64;
                let dy = (b.1 - a.1) as f64;
                (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }

    /// Unsigned polygon area (shoelace formula)
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: i64 = self
            .points
            .iter()
            .circular_tuple_windows::<(_, _)>()
            .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
            .sum();
        (twice as f64).abs() / 2.0
    }

    /// Perimeter over the square root of area, zero for degenerate contours
    pub fn complexity(&self) -> f64 {
        let area = self.area();
        if area > 0.0 {
            self.perimeter() / area.sqrt()
        } else {
            0.0
        }
    }
}

/// Outer boundaries of the top-level 8-connected components.
///
/// Components sitting inside a hole of another component are skipped.
pub fn external_contours(mask: &Mask) -> Vec<Contour> {
    if mask.is_empty() {
        return Vec::new();
    }
    find_contours::<i32>(&mask_to_image(mask))
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
        .map(|contour| Contour {
            points: contour.points.iter().map(|p| (p.x as i64, p.y as i64)).collect(),
        })
        .collect()
}

/// The external contour enclosing the largest area
pub fn largest_contour(mask: &Mask) -> Option<Contour> {
    external_contours(mask)
        .into_iter()
        .fold(None, |best: Option<(f64, Contour)>, contour| {
            let area = contour.area();
            match best {
                Some((best_area, _)) if best_area >= area => best,
                _ => Some((area, contour)),
            }
        })
        .map(|(_, contour)| contour)
}
