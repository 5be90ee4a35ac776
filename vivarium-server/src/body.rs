use glam::DVec3;
use log::{debug, warn};

use vivarium_core::entity_location::EntityLocation;
use vivarium_core::scenegraph::{Axis, Color, Entity, Primitive, SceneGraph, Shape, Transform};
use vivarium_core::species::Species;
use vivarium_core::{BodyId, Settings, VivariumError};

use crate::environment::{Animation, EnvironmentMember, TickContext};
use crate::gait::Gait;
use crate::linkage::{self, Linkage, Placement};
use crate::physics::{bounce_off, reflect_off_walls, renormalize, BoundingSphere, Tank};

pub const PREDATOR_COLOR: Color = glam::const_vec3!([1.0, 0.5, 0.0]);
pub const PREY_COLOR: Color = glam::const_vec3!([0.3, 0.6, 1.0]);
pub const FOOD_COLOR: Color = glam::const_vec3!([0.4, 0.9, 0.2]);
pub const INERT_COLOR: Color = glam::const_vec3!([0.5, 0.5, 0.5]);

/// Nominal link length of a creature skeleton.
pub const CREATURE_SCALE: f64 = 0.1;

pub fn default_color(species: Species) -> Color {
    match species {
        Species::Food => FOOD_COLOR,
        Species::Prey => PREY_COLOR,
        Species::Predator => PREDATOR_COLOR,
        Species::Inert => INERT_COLOR,
    }
}

/// One member of the vivarium: a skeleton in the scene graph plus the
/// steering state that moves its root around the tank.
#[derive(Debug)]
pub struct Body {
    id: BodyId,
    species: Species,
    linkage: Linkage,
    gait: Gait,
    location: EntityLocation,
    velocity: DVec3,
    sphere: BoundingSphere,
    speed: f64,
    removal_pending: bool,
}

impl Body {
    /// Build the skeleton for `species` under `placement.parent` with its
    /// root at `placement.position`, facing along `heading` if it has one.
    pub fn build(
        id: BodyId,
        species: Species,
        scene: &mut SceneGraph,
        placement: Placement,
        settings: &Settings,
        heading: DVec3,
    ) -> Result<Body, VivariumError> {
        let mut location = EntityLocation::new(placement.position);
        // stationary bodies keep the default facing
        if heading != DVec3::ZERO {
            location.face(heading)?;
        }

        let root = scene
            .builder()
            .with(Transform::from_entity_location(&location))
            .attach(placement.parent)
            .build();
        let local = placement.under(root, DVec3::ZERO);

        let (linkage, gait, radius, speed) = match species {
            Species::Predator => {
                let (linkage, gait) = assemble_predator(scene, local)?;
                (linkage, gait, settings.creature_radius, settings.predator_speed)
            }
            Species::Prey => {
                let (linkage, gait) = assemble_prey(scene, local)?;
                (linkage, gait, settings.creature_radius, settings.prey_speed)
            }
            Species::Food => {
                scene.insert(root, solid_sphere(local, settings.food_radius));
                let linkage = Linkage {
                    root,
                    joints: Vec::new(),
                };
                (linkage, Gait::default(), settings.food_radius, settings.food_fall_speed)
            }
            Species::Inert => {
                scene.insert(root, solid_sphere(local, settings.creature_radius));
                let linkage = Linkage {
                    root,
                    joints: Vec::new(),
                };
                (linkage, Gait::default(), settings.creature_radius, 0.0)
            }
        };

        let velocity = match species {
            Species::Prey => location.unit_steer_direction * speed,
            _ => DVec3::ZERO,
        };

        Ok(Body {
            id,
            species,
            linkage,
            gait,
            location,
            velocity,
            sphere: BoundingSphere::new(DVec3::ZERO, radius)?,
            speed,
            removal_pending: false,
        })
    }

    /// Scene entity every part of this body hangs from.
    pub fn root(&self) -> Entity {
        self.linkage.root
    }

    pub fn joints(&self) -> &[Entity] {
        &self.linkage.joints
    }

    pub fn location(&self) -> &EntityLocation {
        &self.location
    }

    pub fn radius(&self) -> f64 {
        self.sphere.radius
    }

    pub fn set_velocity(&mut self, velocity: DVec3) {
        self.velocity = velocity;
    }

    pub(crate) fn mark_removal_pending(&mut self) {
        self.removal_pending = true;
    }

    fn sync_pose(&self, scene: &mut SceneGraph) {
        if let Some(transform) = scene.get_mut::<Transform>(self.linkage.root) {
            *transform = Transform::from_entity_location(&self.location);
        }
    }

    /// Settle on a speed, take the step and turn to face it.
    fn move_along(&mut self, velocity: DVec3, tank: &Tank, scene: &mut SceneGraph) {
        let velocity = renormalize(velocity, self.speed, self.location.unit_steer_direction);
        let velocity = reflect_off_walls(self.location.position, velocity, self.sphere.radius, tank);

        self.velocity = velocity;
        self.location.position += velocity;
        if let Err(err) = self.location.face(velocity) {
            warn!("body {} kept its old heading: {}", self.id, err);
        }
        self.sync_pose(scene);
    }

    fn steer_predator(&mut self, ctx: &mut TickContext<'_>) {
        let tank = ctx.env.tank();
        let me = self.bounds();
        let position = self.location.position;
        let mut velocity = reflect_off_walls(position, self.velocity, self.sphere.radius, tank);

        let mut nearest_prey: Option<(f64, DVec3)> = None;
        for other in ctx.env.live_neighbors() {
            let offset = other.position() - position;
            let touching = me.is_colliding(&other.bounds());
            match other.species() {
                Species::Predator => {
                    if touching {
                        velocity = bounce_off(velocity, offset);
                    }
                }
                Species::Prey => {
                    if touching {
                        debug!("predator {} caught prey {}", self.id, other.id());
                        ctx.consume(other.id());
                        return;
                    }
                    let distance = offset.length();
                    if nearest_prey.map_or(true, |(best, _)| distance < best) {
                        nearest_prey = Some((distance, offset));
                    }
                }
                Species::Food | Species::Inert => {}
            }
        }

        if let Some((_, pursuit)) = nearest_prey {
            velocity += pursuit;
        }
        self.move_along(velocity, tank, ctx.scene);
    }

    fn steer_prey(&mut self, ctx: &mut TickContext<'_>) {
        let tank = ctx.env.tank();
        let rules = *ctx.rules;
        let me = self.bounds();
        let position = self.location.position;
        let mut velocity = reflect_off_walls(position, self.velocity, self.sphere.radius, tank);

        let mut flock_center = DVec3::ZERO;
        let mut flock_heading = DVec3::ZERO;
        let mut flock_size = 0;
        for other in ctx.env.live_neighbors() {
            let offset = other.position() - position;
            let distance = offset.length();
            match other.species() {
                Species::Prey => {
                    if me.is_colliding(&other.bounds()) {
                        velocity = bounce_off(velocity, offset);
                    }
                    if rules.prey_flocking && distance <= rules.perception_radius {
                        flock_center += other.position();
                        flock_heading += other.velocity();
                        flock_size += 1;
                    }
                }
                Species::Predator => {
                    if distance <= rules.perception_radius && distance > 0.0 {
                        velocity -= offset / distance * rules.prey_evasion_weight;
                    }
                }
                Species::Food | Species::Inert => {}
            }
        }

        if flock_size > 0 {
            let n = flock_size as f64;
            velocity += (flock_center / n - position) * rules.cohesion_weight;
            velocity += (flock_heading / n - velocity) * rules.alignment_weight;
        }
        self.move_along(velocity, tank, ctx.scene);
    }

    fn settle(&mut self, ctx: &mut TickContext<'_>) {
        let me = self.bounds();
        let eaten = ctx
            .env
            .live_neighbors()
            .any(|other| other.species().is_creature() && me.is_colliding(&other.bounds()));
        if eaten {
            debug!("food {} eaten", self.id);
            self.removal_pending = true;
            return;
        }

        let floor = ctx.env.tank().floor(self.sphere.radius);
        let y = (self.location.position.y - self.speed).max(floor);
        self.velocity = DVec3::new(0.0, y - self.location.position.y, 0.0);
        self.location.position.y = y;
        self.sync_pose(ctx.scene);
    }
}

impl Animation for Body {
    fn advance(&mut self, ctx: &mut TickContext<'_>) {
        match self.species {
            Species::Predator => {
                self.gait.cycle(ctx.scene, &self.linkage.joints);
                self.steer_predator(ctx);
            }
            Species::Prey => {
                self.gait.cycle(ctx.scene, &self.linkage.joints);
                self.steer_prey(ctx);
            }
            Species::Food => self.settle(ctx),
            Species::Inert => {}
        }
    }
}

impl EnvironmentMember for Body {
    fn id(&self) -> BodyId {
        self.id
    }

    fn species(&self) -> Species {
        self.species
    }

    fn position(&self) -> DVec3 {
        self.location.position
    }

    fn velocity(&self) -> DVec3 {
        self.velocity
    }

    fn bounds(&self) -> BoundingSphere {
        self.sphere.placed(self.location.position)
    }

    fn is_removal_pending(&self) -> bool {
        self.removal_pending
    }
}

fn solid_sphere(placement: Placement, radius: f64) -> Shape {
    Shape::new(placement.context, Primitive::Sphere { radius }, placement.color)
}

// Three tentacles fanned out at 0, 120 and 240 degrees, curling on u.
fn assemble_predator(
    scene: &mut SceneGraph,
    placement: Placement,
) -> Result<(Linkage, Gait), VivariumError> {
    let mut joints = Vec::new();
    for fan in [0.0, 120.0, 240.0] {
        let tentacle = linkage::tentacle(scene, placement)?;
        tentacle.set_default_angle(scene, Axis::V, fan);
        tentacle.limit_joints(scene, Axis::U, 0.0, 35.0)?;
        tentacle.limit_joints(scene, Axis::V, -45.0, 45.0)?;
        tentacle.limit_joints(scene, Axis::W, -45.0, 45.0)?;
        joints.extend(tentacle.joints);
    }

    let gait = Gait::uniform(joints.len(), DVec3::new(1.0, 0.0, 0.0));
    let linkage = Linkage {
        root: placement.parent,
        joints,
    };
    Ok((linkage, gait))
}

// Torso turned side-on, arms on the top body (left one mirrored) and legs
// on the torso root.
fn assemble_prey(
    scene: &mut SceneGraph,
    placement: Placement,
) -> Result<(Linkage, Gait), VivariumError> {
    let l = placement.scale;
    let body = linkage::body(scene, placement)?;
    body.set_default_angle(scene, Axis::V, 90.0);
    let top = body.joints[0];

    let arm_offset = DVec3::new(1.3 * l, 0.5 * l, -0.05 * l);
    let right_arm = linkage::arm(scene, placement.under(top, arm_offset * DVec3::new(-1.0, 1.0, 1.0)))?;
    let left_arm = linkage::arm(scene, placement.under(top, arm_offset))?;
    left_arm.mirror(scene, Axis::W);

    let right_leg = linkage::leg(scene, placement.under(body.root, DVec3::new(-0.5 * l, -l, 0.0)))?;
    let left_leg = linkage::leg(scene, placement.under(body.root, DVec3::new(0.3 * l, -l, 0.0)))?;

    let mut gait = Gait::new(vec![DVec3::new(0.0, 0.5, 0.0), DVec3::new(0.0, 1.0, 0.0)]);
    let arm_steps = vec![
        DVec3::new(1.5, 0.0, 0.0),
        DVec3::new(0.0, 0.0, -1.5),
        DVec3::new(1.0, 0.0, 0.0),
    ];
    gait.extend(Gait::new(arm_steps.clone()));
    gait.extend(Gait::new(arm_steps));
    gait.extend(Gait::new(vec![DVec3::new(2.0, 0.0, 0.0)]));
    gait.extend(Gait::new(vec![DVec3::new(-2.0, 0.0, 0.0)]));

    let joints = [body, right_arm, left_arm, left_leg, right_leg]
        .into_iter()
        .flat_map(|limb| limb.joints)
        .collect();
    let linkage = Linkage {
        root: placement.parent,
        joints,
    };
    Ok((linkage, gait))
}
