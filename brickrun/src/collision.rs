//! Axis-separated box collision against static geometry.
//!
//! A moving [`Body`] is displaced and resolved one axis at a time: all
//! horizontal overlaps are settled before the vertical displacement is
//! applied, so a corner hit always resolves horizontally first. Solids are
//! visited in registration order and the first one touched wins.

use crate::entities::{Body, MysteryBlock, Platform, PlatformKind};
use crate::math::Rect;

/// Capability of a solid that reacts to being struck from underneath.
pub trait HittableFromBelow {
    /// React to a hit. Returns `true` if this hit released something.
    fn hit_from_below(&mut self) -> bool;
}

impl HittableFromBelow for MysteryBlock {
    fn hit_from_below(&mut self) -> bool {
        self.take_item()
    }
}

/// Static geometry a body can collide with.
pub trait Solid {
    fn bounds(&self) -> Rect;

    /// The hit-from-below capability, if this solid has one.
    fn as_hittable(&mut self) -> Option<&mut dyn HittableFromBelow> {
        None
    }
}

impl Solid for Platform {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn as_hittable(&mut self) -> Option<&mut dyn HittableFromBelow> {
        match &mut self.kind {
            PlatformKind::Mystery(block) => Some(block),
            PlatformKind::Ground | PlatformKind::Brick => None,
        }
    }
}

impl Solid for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

/// A solid that was struck from below during vertical resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bump {
    /// Index of the solid in the slice passed to the resolver.
    pub index: usize,
    /// Whether the hit released the solid's item.
    pub released: bool,
}

/// Clamp `body` out of every solid it overlaps along the x axis.
///
/// Only position changes; velocity is left for the next frame's input.
pub fn resolve_horizontal<S: Solid>(body: &mut Body, solids: &[S]) {
    for solid in solids {
        let other = solid.bounds();
        if !body.bounds.intersects(&other) {
            continue;
        }
        if body.velocity.x > 0.0 {
            body.bounds.set_right(other.left());
        } else if body.velocity.x < 0.0 {
            body.bounds.set_left(other.right());
        }
    }
}

/// Clamp `body` out of every solid it overlaps along the y axis.
///
/// Landing zeroes vertical speed and marks the body grounded. Rising into a
/// solid zeroes vertical speed and strikes the solid from below.
pub fn resolve_vertical<S: Solid>(body: &mut Body, solids: &mut [S]) -> Vec<Bump> {
    let mut bumps = Vec::new();
    for (index, solid) in solids.iter_mut().enumerate() {
        let other = solid.bounds();
        if !body.bounds.intersects(&other) {
            continue;
        }
        if body.velocity.y > 0.0 {
            body.bounds.set_bottom(other.top());
            body.velocity.y = 0.0;
            body.on_ground = true;
        } else if body.velocity.y < 0.0 {
            body.bounds.set_top(other.bottom());
            body.velocity.y = 0.0;
            if let Some(hittable) = solid.as_hittable() {
                let released = hittable.hit_from_below();
                bumps.push(Bump { index, released });
            }
        }
    }
    bumps
}

/// Downward-only resolution used by enemies: they land on solids but never
/// strike them from below.
pub fn resolve_landing<S: Solid>(body: &mut Body, solids: &[S]) {
    for solid in solids {
        let other = solid.bounds();
        if body.velocity.y > 0.0 && body.bounds.intersects(&other) {
            body.bounds.set_bottom(other.top());
            body.velocity.y = 0.0;
            body.on_ground = true;
        }
    }
}

/// Apply this frame's velocity to `body` in two passes, resolving each axis
/// against `solids` in turn.
pub fn move_and_collide<S: Solid>(body: &mut Body, solids: &mut [S]) -> Vec<Bump> {
    body.bounds.x += body.velocity.x;
    resolve_horizontal(body, solids);

    body.bounds.y += body.velocity.y;
    body.on_ground = false;
    resolve_vertical(body, solids)
}
