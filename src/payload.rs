//! Engine-agnostic payloads handed over by the host for each event category.
//!
//! The registry never looks inside these; they only travel from the host to the
//! registered callbacks.

use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Pointer state for enter/exit, click and drag events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerEventData {
    pub pointer_id: i32,
    pub button: PointerButton,
    pub position: Vec2,
    pub delta: Vec2,
    pub press_position: Vec2,
    pub click_count: u32,
    pub dragging: bool,
}

impl PointerEventData {
    pub fn at(position: Vec2) -> Self {
        Self { position, press_position: position, ..Self::default() }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Moves the pointer, accumulating the delta since the last position.
    pub fn moved_to(mut self, position: Vec2) -> Self {
        self.delta = position - self.position;
        self.position = position;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactPoint {
    pub point: Vec3,
    pub normal: Vec3,
    pub separation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactPoint2D {
    pub point: Vec2,
    pub normal: Vec2,
    pub separation: f32,
}

/// A 3D contact between the listening owner and `other`.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub other: Entity,
    pub relative_velocity: Vec3,
    pub impulse: Vec3,
    pub contacts: SmallVec<[ContactPoint; 4]>,
}

impl Collision {
    pub fn new(other: Entity) -> Self {
        Self { other, relative_velocity: Vec3::ZERO, impulse: Vec3::ZERO, contacts: SmallVec::new() }
    }

    pub fn with_contact(mut self, contact: ContactPoint) -> Self {
        self.contacts.push(contact);
        self
    }
}

/// A 2D contact between the listening owner and `other`.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision2D {
    pub other: Entity,
    pub relative_velocity: Vec2,
    pub contacts: SmallVec<[ContactPoint2D; 2]>,
}

impl Collision2D {
    pub fn new(other: Entity) -> Self {
        Self { other, relative_velocity: Vec2::ZERO, contacts: SmallVec::new() }
    }

    pub fn with_contact(mut self, contact: ContactPoint2D) -> Self {
        self.contacts.push(contact);
        self
    }

    /// The same contact seen from `other`'s side.
    pub fn mirrored(&self, owner: Entity) -> Self {
        Self {
            other: owner,
            relative_velocity: -self.relative_velocity,
            contacts: self
                .contacts
                .iter()
                .map(|c| ContactPoint2D { point: c.point, normal: -c.normal, separation: c.separation })
                .collect(),
        }
    }
}

/// The other collider of a 3D trigger overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub entity: Entity,
    pub center: Vec3,
    pub half_extents: Vec3,
    pub is_trigger: bool,
}

impl Collider {
    pub fn new(entity: Entity) -> Self {
        Self { entity, center: Vec3::ZERO, half_extents: Vec3::splat(0.5), is_trigger: false }
    }
}

/// The other collider of a 2D trigger overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider2D {
    pub entity: Entity,
    pub offset: Vec2,
    pub size: Vec2,
    pub is_trigger: bool,
}

impl Collider2D {
    pub fn new(entity: Entity) -> Self {
        Self { entity, offset: Vec2::ZERO, size: Vec2::ONE, is_trigger: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_move_tracks_delta() {
        let data = PointerEventData::at(Vec2::new(10.0, 10.0)).moved_to(Vec2::new(13.0, 6.0));
        assert_eq!(data.delta, Vec2::new(3.0, -4.0));
        assert_eq!(data.press_position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn mirrored_collision_points_back_at_owner() {
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let mut hit = Collision2D::new(b)
            .with_contact(ContactPoint2D { point: Vec2::ONE, normal: Vec2::X, separation: -0.1 });
        hit.relative_velocity = Vec2::new(2.0, 0.0);
        let mirrored = hit.mirrored(a);
        assert_eq!(mirrored.other, a);
        assert_eq!(mirrored.relative_velocity, Vec2::new(-2.0, 0.0));
        assert_eq!(mirrored.contacts[0].normal, -Vec2::X);
    }
}
