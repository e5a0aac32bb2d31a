//! Pairwise overlap resolution.
//!
//! After all per-entity updates, every overlapping pair (except two
//! bunkers) is pushed apart along the line between their centers. The pass
//! is sequential in population order: later pairs see positions already
//! adjusted by earlier ones.
//!
//! Each side takes a share of the overlap equal to the other side's push
//! weight over the pair's total weight. Bunkers never move; they only
//! shrink the share taken by the unit pressed against them.

use rand::Rng;

use crate::components::{Entity, EntityKind};
use crate::config::CollisionTuning;
use crate::geometry::{boxes_overlap, ArenaBounds};
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};

/// Separation used when two centers still coincide after jitter.
const MIN_SEPARATION: Fixed = Fixed::from_bits(0x1999_9999); // ~0.1

/// Push weight of an entity.
#[must_use]
pub fn push_weight(entity: &Entity, tuning: &CollisionTuning) -> Fixed {
    match entity.kind {
        EntityKind::Unit(_) => tuning.unit_weight,
        EntityKind::Bunker(_) => tuning.bunker_weight,
    }
}

/// Penetration depth along the center line: sum of half-sizes minus
/// center distance, floored at zero.
#[must_use]
pub fn overlap_depth(a: &Entity, b: &Entity) -> Fixed {
    let depth = a.half_size() + b.half_size() - a.position.distance(b.position);
    depth.max(Fixed::ZERO)
}

/// Resolve all overlaps. Returns the number of pairs that were pushed.
pub fn resolve_collisions<R: Rng>(
    population: &mut [Entity],
    tuning: &CollisionTuning,
    rng: &mut R,
) -> usize {
    let mut resolved = 0;

    for i in 0..population.len() {
        for j in (i + 1)..population.len() {
            if resolve_pair(population, i, j, tuning, rng) {
                resolved += 1;
            }
        }
    }

    resolved
}

fn resolve_pair<R: Rng>(
    population: &mut [Entity],
    i: usize,
    j: usize,
    tuning: &CollisionTuning,
    rng: &mut R,
) -> bool {
    let (a, b) = (&population[i], &population[j]);
    if !a.is_alive() || !b.is_alive() || (a.is_bunker() && b.is_bunker()) {
        return false;
    }
    if !boxes_overlap(&a.bounding_box(), &b.bounding_box()) {
        return false;
    }

    if a.position == b.position {
        for index in [i, j] {
            if population[index].is_unit() {
                let nudge = jitter(rng, tuning.jitter);
                population[index].position += nudge;
            }
        }
    }

    let (a, b) = (&population[i], &population[j]);
    let delta = a.position - b.position;
    let mut distance = fixed_sqrt(delta.dot(delta));
    let direction = if distance == Fixed::ZERO {
        distance = MIN_SEPARATION;
        Vec2Fixed::new(Fixed::ONE, Fixed::ZERO)
    } else {
        Vec2Fixed::new(delta.x / distance, delta.y / distance)
    };

    let overlap = a.half_size() + b.half_size() - distance;
    if overlap <= Fixed::ZERO {
        return false;
    }

    let weight_a = push_weight(a, tuning);
    let weight_b = push_weight(b, tuning);
    let total = weight_a + weight_b;
    let share_a = overlap * weight_b / total;
    let share_b = overlap * weight_a / total;

    // Direction points from b to a.
    if population[i].is_unit() {
        population[i].position += direction.scale(share_a);
    }
    if population[j].is_unit() {
        population[j].position -= direction.scale(share_b);
    }

    true
}

fn jitter<R: Rng>(rng: &mut R, amplitude: Fixed) -> Vec2Fixed {
    let bits = amplitude.to_bits().max(0);
    Vec2Fixed::new(
        Fixed::from_bits(rng.gen_range(-bits..=bits)),
        Fixed::from_bits(rng.gen_range(-bits..=bits)),
    )
}

/// Pull every live unit back inside the arena.
pub fn clamp_units(population: &mut [Entity], bounds: &ArenaBounds) {
    for entity in population.iter_mut().filter(|entity| entity.is_unit()) {
        entity.position = bounds.clamp(entity.position, entity.half_size());
    }
}
