//! Physics backend interface and a simple explicit-Euler implementation

use super::components::BodyId;
use glam::{Quat, Vec3};
use tracing::{debug, trace};

/// The simulation collaborator the scene graph synchronizes with
pub trait PhysicsBackend {
    /// Current world pose of a body, or `None` for unknown or unset ids
    fn body_pose(&self, body: BodyId) -> Option<(Vec3, Quat)>;

    /// Seed or reseed a body's world pose
    fn set_body_pose(&mut self, body: BodyId, position: Vec3, rotation: Quat);

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Whether the body takes part in the simulation
    fn is_active(&self, body: BodyId) -> bool;
}

/// Rigid body state for [`SimplePhysicsWorld`]
#[derive(Debug, Clone)]
pub struct SimpleBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub use_gravity: bool,
    /// Kinematic bodies only move when their pose is set
    pub is_kinematic: bool,
    pub active: bool,
}

impl Default for SimpleBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.0,
            use_gravity: true,
            is_kinematic: false,
            active: true,
        }
    }
}

impl SimpleBody {
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn kinematic() -> Self {
        Self {
            is_kinematic: true,
            use_gravity: false,
            ..Default::default()
        }
    }
}

/// Minimal rigid body integrator with gravity and an optional floor plane
#[derive(Debug, Clone)]
pub struct SimplePhysicsWorld {
    bodies: Vec<SimpleBody>,
    pub gravity: Vec3,
    /// Bodies are clamped to stay at or above this height
    pub floor_height: Option<f32>,
}

impl Default for SimplePhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl SimplePhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            bodies: Vec::new(),
            gravity,
            floor_height: None,
        }
    }

    pub fn with_floor(mut self, height: f32) -> Self {
        self.floor_height = Some(height);
        self
    }

    pub fn add_body(&mut self, body: SimpleBody) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        debug!(body = ?id, "Added simple physics body");
        self.bodies.push(body);
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&SimpleBody> {
        if !id.is_set() {
            return None;
        }
        self.bodies.get(id.0 as usize)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut SimpleBody> {
        if !id.is_set() {
            return None;
        }
        self.bodies.get_mut(id.0 as usize)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsBackend for SimplePhysicsWorld {
    fn body_pose(&self, body: BodyId) -> Option<(Vec3, Quat)> {
        self.body(body).map(|b| (b.position, b.rotation))
    }

    fn set_body_pose(&mut self, body: BodyId, position: Vec3, rotation: Quat) {
        if let Some(b) = self.body_mut(body) {
            b.position = position;
            b.rotation = rotation;
        }
    }

    fn step(&mut self, dt: f32) {
        let gravity = self.gravity;
        let floor = self.floor_height;

        for body in self.bodies.iter_mut().filter(|b| b.active && !b.is_kinematic) {
            if body.use_gravity {
                body.linear_velocity += gravity * dt;
            }
            body.linear_velocity *= (1.0 - body.linear_damping).powf(dt);
            body.angular_velocity *= (1.0 - body.angular_damping).powf(dt);

            if body.linear_velocity.length_squared() > 1e-12 {
                body.position += body.linear_velocity * dt;
            }
            if body.angular_velocity.length_squared() > 1e-12 {
                let angle = body.angular_velocity.length() * dt;
                let spin = Quat::from_axis_angle(body.angular_velocity.normalize(), angle);
                body.rotation = (spin * body.rotation).normalize();
            }

            if let Some(floor) = floor {
                if body.position.y < floor {
                    body.position.y = floor;
                    body.linear_velocity.y = body.linear_velocity.y.max(0.0);
                }
            }
        }
        trace!(dt, bodies = self.bodies.len(), "Simple physics step");
    }

    fn is_active(&self, body: BodyId) -> bool {
        self.body(body).map(|b| b.active).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_integration() {
        let mut world = SimplePhysicsWorld::default();
        let id = world.add_body(SimpleBody {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..SimpleBody::dynamic()
        });

        world.step(0.1);
        let (position, _) = world.body_pose(id).unwrap();
        assert!(position.y < 10.0);
        assert!(world.body(id).unwrap().linear_velocity.y < 0.0);
    }

    #[test]
    fn test_kinematic_body_does_not_fall() {
        let mut world = SimplePhysicsWorld::default();
        let id = world.add_body(SimpleBody::kinematic());
        world.step(1.0);
        assert_eq!(world.body_pose(id).unwrap().0, Vec3::ZERO);
    }

    #[test]
    fn test_floor_stops_body() {
        let mut world = SimplePhysicsWorld::default().with_floor(0.0);
        let id = world.add_body(SimpleBody {
            position: Vec3::new(0.0, 0.05, 0.0),
            ..SimpleBody::dynamic()
        });
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.body_pose(id).unwrap().0.y, 0.0);
        assert_eq!(world.body(id).unwrap().linear_velocity.y, 0.0);
    }

    #[test]
    fn test_unset_id_is_ignored() {
        let mut world = SimplePhysicsWorld::default();
        world.add_body(SimpleBody::dynamic());
        assert!(world.body_pose(BodyId::UNSET).is_none());
        assert!(!world.is_active(BodyId::UNSET));
        world.set_body_pose(BodyId::UNSET, Vec3::ONE, Quat::IDENTITY);
        assert_eq!(world.body_pose(BodyId(0)).unwrap().0, Vec3::ZERO);
    }
}
