//! Square bounding boxes, arena bounds and spatial queries.
//!
//! Every body in the arena is an axis-aligned square. Containment is
//! inclusive, overlap is strict: two squares that only share an edge do not
//! collide.

use serde::{Deserialize, Serialize};

use crate::components::{Entity, EntityId};
use crate::math::{Fixed, Vec2Fixed};

/// Axis-aligned square described by its center and edge length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareBox {
    /// Center of the square.
    pub center: Vec2Fixed,
    /// Edge length.
    pub size: Fixed,
}

impl SquareBox {
    /// Create a square.
    #[must_use]
    pub const fn new(center: Vec2Fixed, size: Fixed) -> Self {
        Self { center, size }
    }

    /// Half of the edge length.
    #[must_use]
    pub fn half(&self) -> Fixed {
        self.size / Fixed::from_num(2)
    }

    /// Top-left corner (smallest coordinates).
    #[must_use]
    pub fn min(&self) -> Vec2Fixed {
        let half = self.half();
        Vec2Fixed::new(self.center.x - half, self.center.y - half)
    }

    /// Bottom-right corner (largest coordinates).
    #[must_use]
    pub fn max(&self) -> Vec2Fixed {
        let half = self.half();
        Vec2Fixed::new(self.center.x + half, self.center.y + half)
    }
}

/// True iff `point` lies within the square, edges included.
#[must_use]
pub fn is_under_point(square: &SquareBox, point: Vec2Fixed) -> bool {
    let min = square.min();
    let max = square.max();
    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

/// True iff the two squares intersect. Touching edges do not count.
#[must_use]
pub fn boxes_overlap(a: &SquareBox, b: &SquareBox) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
}

/// True iff the square strictly overlaps the rectangle spanned by two corners
/// given in any order (a drag-selection box).
#[must_use]
pub fn overlaps_rect(square: &SquareBox, corner_a: Vec2Fixed, corner_b: Vec2Fixed) -> bool {
    let rect_min = Vec2Fixed::new(corner_a.x.min(corner_b.x), corner_a.y.min(corner_b.y));
    let rect_max = Vec2Fixed::new(corner_a.x.max(corner_b.x), corner_a.y.max(corner_b.y));
    let (min, max) = (square.min(), square.max());
    min.x < rect_max.x && max.x > rect_min.x && min.y < rect_max.y && max.y > rect_min.y
}

/// Find the closest live enemy of `seeker` whose edge-to-edge distance is
/// within `range`.
///
/// Distance is compared squared. On equal distances the candidate that
/// appears first in `population` wins.
#[must_use]
pub fn find_nearest_enemy_in_range(
    seeker: &Entity,
    range: Fixed,
    population: &[Entity],
) -> Option<EntityId> {
    let seeker_half = seeker.half_size();
    let mut best: Option<(EntityId, Fixed)> = None;

    for candidate in population {
        if !candidate.is_alive() || candidate.owner == seeker.owner {
            continue;
        }

        let reach = range + seeker_half + candidate.half_size();
        let dist_sq = seeker.position.distance_squared(candidate.position);
        if dist_sq > reach.saturating_mul(reach) {
            continue;
        }

        if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
            best = Some((candidate.id, dist_sq));
        }
    }

    best.map(|(id, _)| id)
}

/// Rectangular playfield. Bodies must stay fully inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaBounds {
    /// Smallest coordinates (top-left corner).
    pub min: Vec2Fixed,
    /// Largest coordinates (bottom-right corner).
    pub max: Vec2Fixed,
}

impl ArenaBounds {
    /// Arena with its top-left corner at the origin.
    #[must_use]
    pub fn from_size(width: i32, height: i32) -> Self {
        Self {
            min: Vec2Fixed::ZERO,
            max: Vec2Fixed::from_ints(width, height),
        }
    }

    /// Arena of the given size centered on the origin.
    #[must_use]
    pub fn centered(width: i32, height: i32) -> Self {
        let half_w = Fixed::from_num(width) / Fixed::from_num(2);
        let half_h = Fixed::from_num(height) / Fixed::from_num(2);
        Self {
            min: Vec2Fixed::new(-half_w, -half_h),
            max: Vec2Fixed::new(half_w, half_h),
        }
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> Fixed {
        self.max.x.saturating_sub(self.min.x)
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> Fixed {
        self.max.y.saturating_sub(self.min.y)
    }

    /// Center of the arena.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        let two = Fixed::from_num(2);
        Vec2Fixed::new(
            self.min.x + self.width() / two,
            self.min.y + self.height() / two,
        )
    }

    /// Clamp a center so a square with half-edge `half` stays inside.
    ///
    /// If the square is wider than the arena the lower bound wins.
    #[must_use]
    pub fn clamp(&self, position: Vec2Fixed, half: Fixed) -> Vec2Fixed {
        Vec2Fixed::new(
            position.x.min(self.max.x - half).max(self.min.x + half),
            position.y.min(self.max.y - half).max(self.min.y + half),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::PlayerId;
    use crate::config::UnitStats;

    fn square(x: i32, y: i32, size: i32) -> SquareBox {
        SquareBox::new(Vec2Fixed::from_ints(x, y), Fixed::from_num(size))
    }

    fn unit(id: EntityId, owner: PlayerId, x: i32, y: i32) -> Entity {
        Entity::unit(id, owner, Vec2Fixed::from_ints(x, y), &UnitStats::default())
    }

    #[test]
    fn test_point_on_edge_is_inside() {
        let s = square(0, 0, 30);
        assert!(is_under_point(&s, Vec2Fixed::from_ints(15, 15)));
        assert!(is_under_point(&s, Vec2Fixed::from_ints(-15, 0)));
        assert!(!is_under_point(&s, Vec2Fixed::from_ints(16, 0)));
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = square(0, 0, 30);
        assert!(!boxes_overlap(&a, &square(30, 0, 30)));
        assert!(boxes_overlap(&a, &square(29, 0, 30)));
        assert!(boxes_overlap(&a, &square(10, 10, 30)));
    }

    #[test]
    fn test_rect_corners_in_any_order() {
        let s = square(50, 50, 10);
        let a = Vec2Fixed::from_ints(100, 100);
        let b = Vec2Fixed::from_ints(40, 40);
        assert!(overlaps_rect(&s, a, b));
        assert!(overlaps_rect(&s, b, a));
        assert!(!overlaps_rect(&s, Vec2Fixed::from_ints(56, 0), Vec2Fixed::from_ints(90, 90)));
    }

    #[test]
    fn test_nearest_enemy_prefers_closest() {
        let seeker = unit(1, PlayerId::ONE, 0, 0);
        let population = vec![
            seeker.clone(),
            unit(2, PlayerId::TWO, 120, 0),
            unit(3, PlayerId::THREE, 60, 0),
            unit(4, PlayerId::ONE, 10, 0),
        ];

        let found = find_nearest_enemy_in_range(&seeker, Fixed::from_num(150), &population);
        assert_eq!(found, Some(3));
    }

    #[test]
    fn test_nearest_enemy_uses_edge_distance() {
        let seeker = unit(1, PlayerId::ONE, 0, 0);
        // Centers 180 apart, edges 150 apart.
        let population = vec![seeker.clone(), unit(2, PlayerId::TWO, 180, 0)];

        assert_eq!(
            find_nearest_enemy_in_range(&seeker, Fixed::from_num(150), &population),
            Some(2)
        );
        assert_eq!(
            find_nearest_enemy_in_range(&seeker, Fixed::from_num(149), &population),
            None
        );
    }

    #[test]
    fn test_nearest_enemy_tie_goes_to_first() {
        let seeker = unit(1, PlayerId::ONE, 0, 0);
        let population = vec![
            unit(5, PlayerId::TWO, 0, 50),
            unit(2, PlayerId::THREE, 50, 0),
            seeker.clone(),
        ];

        assert_eq!(
            find_nearest_enemy_in_range(&seeker, Fixed::from_num(100), &population),
            Some(5)
        );
    }

    #[test]
    fn test_nearest_enemy_ignores_dead() {
        let seeker = unit(1, PlayerId::ONE, 0, 0);
        let mut dead = unit(2, PlayerId::TWO, 40, 0);
        dead.take_damage(1_000);
        let population = vec![seeker.clone(), dead];

        assert_eq!(
            find_nearest_enemy_in_range(&seeker, Fixed::from_num(100), &population),
            None
        );
    }

    #[test]
    fn test_clamp_keeps_square_inside() {
        let arena = ArenaBounds::from_size(1000, 700);
        let half = Fixed::from_num(15);

        assert_eq!(arena.clamp(Vec2Fixed::from_ints(-50, 10), half), Vec2Fixed::from_ints(15, 15));
        assert_eq!(
            arena.clamp(Vec2Fixed::from_ints(2000, 900), half),
            Vec2Fixed::from_ints(985, 685)
        );
        assert_eq!(arena.clamp(Vec2Fixed::from_ints(500, 350), half), Vec2Fixed::from_ints(500, 350));
    }

    #[test]
    fn test_centered_arena() {
        let arena = ArenaBounds::centered(200, 100);
        assert_eq!(arena.min, Vec2Fixed::from_ints(-100, -50));
        assert_eq!(arena.max, Vec2Fixed::from_ints(100, 50));
        assert_eq!(arena.center(), Vec2Fixed::ZERO);
        assert_eq!(ArenaBounds::from_size(1000, 700).center(), Vec2Fixed::from_ints(500, 350));
    }
}
