use std::fmt;

use glam::DVec3;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vivarium_core::scenegraph::{
    Color, Entity, Primitive, RenderBackend, RenderContext, SceneGraph, Shape, Transform,
};
use vivarium_core::species::Species;
use vivarium_core::vector::{VecExt, DEFAULT_HEADING};
use vivarium_core::{BodyId, Settings, VivariumError};

use crate::body::{default_color, Body, CREATURE_SCALE};
use crate::environment::{Animation, EnvironmentMember, EnvironmentView, InteractionRules, TickContext};
use crate::linkage::Placement;
use crate::physics::Tank;

const TANK_COLOR: Color = glam::const_vec3!([0.2, 0.4, 0.8]);

/// Head count per species.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Census {
    pub food: usize,
    pub prey: usize,
    pub predators: usize,
    pub inert: usize,
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} predators, {} prey, {} food, {} inert",
            self.predators, self.prey, self.food, self.inert
        )
    }
}

/// Owns the scene, the tank and every body in it, and is the only thing
/// allowed to add or drop members.
///
/// Members advance in reverse registration order. A member sees the state
/// earlier members reached in the same tick. A body that becomes
/// removal-pending mid-tick is not advanced again and is dropped at the
/// start of its slot on the following tick.
pub struct Vivarium {
    settings: Settings,
    rules: InteractionRules,
    tank: Tank,
    scene: SceneGraph,
    tank_entity: Entity,
    context: RenderContext,
    members: Vec<Body>,
    creatures: Vec<BodyId>,
    next_id: BodyId,
    rng: StdRng,
}

impl Vivarium {
    pub fn new(settings: Settings, context: RenderContext) -> Result<Vivarium, VivariumError> {
        settings.validate()?;
        let tank = Tank::new(DVec3::new(
            settings.tank_half_width,
            settings.tank_half_height,
            settings.tank_half_depth,
        ))?;

        let mut scene = SceneGraph::new();
        let root = scene.root();
        let tank_entity = scene
            .builder()
            .with(Transform::default())
            .with(Shape::new(
                context,
                Primitive::Tank {
                    half_extents: tank.half_extents(),
                },
                TANK_COLOR,
            ))
            .attach(root)
            .build();

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Vivarium {
            rules: InteractionRules::from(&settings),
            settings,
            tank,
            scene,
            tank_entity,
            context,
            members: Vec::new(),
            creatures: Vec::new(),
            next_id: 0,
            rng,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn tank_entity(&self) -> Entity {
        self.tank_entity
    }

    pub fn members(&self) -> &[Body] {
        &self.members
    }

    pub fn member(&self, id: BodyId) -> Option<&Body> {
        self.members.iter().find(|body| body.id() == id)
    }

    /// Ids of the members a population reset discards.
    pub fn creatures(&self) -> &[BodyId] {
        &self.creatures
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for body in &self.members {
            match body.species() {
                Species::Food => census.food += 1,
                Species::Prey => census.prey += 1,
                Species::Predator => census.predators += 1,
                Species::Inert => census.inert += 1,
            }
        }
        census
    }

    fn radius_of(&self, species: Species) -> f64 {
        match species {
            Species::Food => self.settings.food_radius,
            Species::Prey | Species::Predator | Species::Inert => self.settings.creature_radius,
        }
    }

    fn index_of(&self, id: BodyId) -> Result<usize, VivariumError> {
        self.members
            .iter()
            .position(|body| body.id() == id)
            .ok_or(VivariumError::UnknownBody(id))
    }

    fn random_heading(&mut self) -> DVec3 {
        let heading = DVec3::new(
            self.rng.gen::<f64>() - 0.5,
            self.rng.gen::<f64>() - 0.5,
            self.rng.gen::<f64>() - 0.5,
        );
        heading.normalize_checked().unwrap_or(DEFAULT_HEADING)
    }

    fn random_coordinate(&mut self, bound: f64) -> f64 {
        if bound > 0.0 {
            self.rng.gen_range(-bound..=bound)
        } else {
            0.0
        }
    }

    /// Build a body of `species` at `position` and register it.
    pub fn spawn_creature(
        &mut self,
        species: Species,
        position: DVec3,
        color: Color,
    ) -> Result<BodyId, VivariumError> {
        if !position.is_finite() || !self.tank.contains(position) {
            return Err(VivariumError::OutsideTank(position));
        }

        let heading = match species {
            Species::Prey => self.random_heading(),
            Species::Food | Species::Predator | Species::Inert => DVec3::ZERO,
        };
        let placement = Placement {
            context: self.context,
            parent: self.tank_entity,
            position,
            scale: CREATURE_SCALE,
            color,
        };

        let id = self.next_id;
        let body = Body::build(id, species, &mut self.scene, placement, &self.settings, heading)?;
        self.next_id += 1;

        if species.is_tracked() {
            self.creatures.push(id);
        }
        self.members.push(body);
        debug!("spawned {} {} at {}", species, id, position);
        Ok(id)
    }

    /// Spawn at a uniformly random spot that keeps the body inside the tank.
    pub fn spawn_random(&mut self, species: Species) -> Result<BodyId, VivariumError> {
        let bound = self.tank.interior(self.radius_of(species));
        let position = DVec3::new(
            self.random_coordinate(bound.x),
            self.random_coordinate(bound.y),
            self.random_coordinate(bound.z),
        );
        self.spawn_creature(species, position, default_color(species))
    }

    /// Drop a pellet of food in at a random spot just under the lid.
    pub fn spawn_food(&mut self) -> Result<BodyId, VivariumError> {
        let radius = self.settings.food_radius;
        let bound = self.tank.interior(radius);
        let position = DVec3::new(
            self.random_coordinate(bound.x),
            self.tank.ceiling(radius),
            self.random_coordinate(bound.z),
        );
        self.spawn_food_at(position)
    }

    pub fn spawn_food_at(&mut self, position: DVec3) -> Result<BodyId, VivariumError> {
        self.spawn_creature(Species::Food, position, default_color(Species::Food))
    }

    /// Discard every tracked member (food included) and respawn the default
    /// population. Inert bodies stay.
    pub fn reset_population(&mut self) -> Result<(), VivariumError> {
        for id in self.creatures.clone() {
            self.remove(id)?;
        }

        for _ in 0..self.settings.default_predators {
            self.spawn_random(Species::Predator)?;
        }
        for _ in 0..self.settings.default_prey {
            self.spawn_random(Species::Prey)?;
        }
        info!("population reset: {}", self.census());
        Ok(())
    }

    pub fn mark_for_removal(&mut self, id: BodyId) -> Result<(), VivariumError> {
        let index = self.index_of(id)?;
        self.members[index].mark_removal_pending();
        Ok(())
    }

    /// Drop a member and its whole skeleton right away.
    pub fn remove(&mut self, id: BodyId) -> Result<(), VivariumError> {
        let index = self.index_of(id)?;
        self.detach(index);
        Ok(())
    }

    /// Override a member's velocity; it is renormalized on its next advance.
    pub fn steer(&mut self, id: BodyId, velocity: DVec3) -> Result<(), VivariumError> {
        let index = self.index_of(id)?;
        self.members[index].set_velocity(velocity);
        Ok(())
    }

    fn detach(&mut self, index: usize) {
        let body = self.members.remove(index);
        self.creatures.retain(|&id| id != body.id());
        self.scene.despawn_recursive(body.root());
        debug!("removed {} {}", body.species(), body.id());
    }

    fn is_removable(&self, species: Species) -> bool {
        match species {
            Species::Food | Species::Prey => true,
            Species::Predator => self.settings.remove_consumed_predators,
            Species::Inert => false,
        }
    }

    pub fn tick(&mut self) {
        let pending_at_start: Vec<bool> = self
            .members
            .iter()
            .map(|body| body.is_removal_pending())
            .collect();

        // removing slot i only shifts slots above i, which are already done
        for index in (0..self.members.len()).rev() {
            let body = &self.members[index];
            if body.is_removal_pending() && self.is_removable(body.species()) {
                if pending_at_start[index] {
                    self.detach(index);
                }
                continue;
            }
            if body.species() == Species::Inert {
                continue;
            }
            self.advance(index);
        }
    }

    fn advance(&mut self, index: usize) {
        let consumed = {
            let (before, rest) = self.members.split_at_mut(index);
            let (body, after) = match rest.split_first_mut() {
                Some(split) => split,
                None => return,
            };
            let env = EnvironmentView::new(&self.tank, before, after);
            let mut ctx = TickContext::new(&mut self.scene, env, &self.rules);
            body.advance(&mut ctx);
            ctx.into_consumed()
        };

        for id in consumed {
            if let Some(prey) = self.members.iter_mut().find(|body| body.id() == id) {
                prey.mark_removal_pending();
            }
        }
    }

    pub fn initialize(&mut self, backend: &mut dyn RenderBackend) {
        self.scene.initialize(backend);
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        self.scene.draw(self.scene.root(), backend);
    }
}

#[cfg(test)]
mod tests {
    use glam::DMat4;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use vivarium_core::scenegraph::DrawHandle;

    use super::*;

    fn settings() -> Settings {
        Settings {
            seed: Some(7),
            ..Settings::default()
        }
    }

    fn vivarium() -> Vivarium {
        Vivarium::new(settings(), RenderContext::default()).unwrap()
    }

    fn species(vivarium: &Vivarium) -> Vec<Species> {
        let mut species: Vec<Species> = vivarium.members().iter().map(|b| b.species()).collect();
        species.sort_by_key(|s| s.tag());
        species
    }

    #[test]
    fn predator_eats_prey_registered_before_it() {
        let mut vivarium = vivarium();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::new(0.3, 0.0, 0.0), PREY)
            .unwrap();
        vivarium
            .spawn_creature(Species::Predator, DVec3::ZERO, PREDATOR)
            .unwrap();

        // the predator is advanced first and catches the prey in this tick
        vivarium.tick();
        assert!(vivarium.member(prey).unwrap().is_removal_pending());

        vivarium.tick();
        assert!(vivarium.member(prey).is_none());
        assert_eq!(vivarium.creatures().len(), 1);
    }

    #[test]
    fn predator_eats_prey_registered_after_it() {
        let mut vivarium = vivarium();
        vivarium
            .spawn_creature(Species::Predator, DVec3::ZERO, PREDATOR)
            .unwrap();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::new(0.3, 0.0, 0.0), PREY)
            .unwrap();

        vivarium.tick();
        assert!(vivarium.member(prey).unwrap().is_removal_pending());

        vivarium.tick();
        assert!(vivarium.member(prey).is_none());
        assert_eq!(vivarium.census().prey, 0);
        assert_eq!(vivarium.census().predators, 1);
    }

    const PREY: Color = crate::body::PREY_COLOR;
    const PREDATOR: Color = crate::body::PREDATOR_COLOR;

    #[test]
    fn consumed_prey_stops_moving_and_predator_waits() {
        let mut vivarium = vivarium();
        let predator = vivarium
            .spawn_creature(Species::Predator, DVec3::ZERO, PREDATOR)
            .unwrap();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::new(0.0, 0.0, 0.5), PREY)
            .unwrap();
        let prey_start = vivarium.member(prey).unwrap().position();

        // prey moves first (reverse order), then the predator eats it
        vivarium.tick();
        let prey_after = vivarium.member(prey).unwrap().position();
        assert!(prey_start.distance(prey_after) > 0.0);
        assert_eq!(vivarium.member(predator).unwrap().position(), DVec3::ZERO);

        vivarium.tick();
        assert!(vivarium.member(prey).is_none());
    }

    #[test]
    fn later_members_see_earlier_updates_in_the_same_tick() {
        let mut vivarium = vivarium();
        // the prey sits just out of reach and is advanced first; its step
        // carries it into contact before the predator looks
        let predator = vivarium
            .spawn_creature(Species::Predator, DVec3::ZERO, PREDATOR)
            .unwrap();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::new(0.805, 0.0, 0.0), PREY)
            .unwrap();
        vivarium.steer(prey, DVec3::new(-1.0, 0.0, 0.0)).unwrap();

        vivarium.tick();
        let prey_body = vivarium.member(prey).unwrap();
        assert!(prey_body.position().x < 0.8);
        assert!(prey_body.is_removal_pending());
        assert_eq!(vivarium.member(predator).unwrap().position(), DVec3::ZERO);
    }

    #[test]
    fn body_spawned_against_a_wall_turns_back_inside() {
        let mut vivarium = vivarium();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::new(1.8, 0.0, 0.0), PREY)
            .unwrap();
        vivarium.steer(prey, DVec3::new(0.01, 0.0, 0.0)).unwrap();

        let mut last_x = 1.8;
        for _ in 0..100 {
            vivarium.tick();
            let x = vivarium.member(prey).unwrap().position().x;
            assert!(x < last_x, "prey kept pushing into the wall at x = {}", x);
            last_x = x;
        }
        assert!(last_x <= 1.6);
    }

    #[test]
    fn predators_bounce_apart() {
        let mut vivarium = vivarium();
        let left = vivarium
            .spawn_creature(Species::Predator, DVec3::new(-0.35, 0.0, 0.0), PREDATOR)
            .unwrap();
        let right = vivarium
            .spawn_creature(Species::Predator, DVec3::new(0.35, 0.0, 0.0), PREDATOR)
            .unwrap();
        vivarium.steer(left, DVec3::new(0.01, 0.0, 0.0)).unwrap();
        vivarium.steer(right, DVec3::new(-0.01, 0.0, 0.0)).unwrap();

        vivarium.tick();
        assert!(vivarium.member(left).unwrap().velocity().x < 0.0);
        assert!(vivarium.member(right).unwrap().velocity().x > 0.0);
        assert!(vivarium.member(left).unwrap().position().x < -0.35);
        assert!(vivarium.member(right).unwrap().position().x > 0.35);
    }

    #[test]
    fn food_falls_and_rests_on_the_floor() {
        let mut vivarium = vivarium();
        let food = vivarium.spawn_food().unwrap();
        let top = vivarium.member(food).unwrap().position();
        assert!((top.y - 1.95).abs() < 1e-12);

        vivarium.tick();
        let fallen = vivarium.member(food).unwrap().position();
        assert!((fallen.y - (1.95 - 0.004)).abs() < 1e-12);
        assert_eq!((fallen.x, fallen.z), (top.x, top.z));

        for _ in 0..2000 {
            vivarium.tick();
        }
        assert!((vivarium.member(food).unwrap().position().y + 1.95).abs() < 1e-12);
        assert!(!vivarium.member(food).unwrap().is_removal_pending());
    }

    #[test]
    fn food_disappears_when_touched() {
        let mut vivarium = vivarium();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::ZERO, PREY)
            .unwrap();
        let food = vivarium.spawn_food_at(DVec3::new(0.0, 0.3, 0.0)).unwrap();

        vivarium.tick();
        assert!(vivarium.member(food).unwrap().is_removal_pending());
        vivarium.tick();
        assert!(vivarium.member(food).is_none());
        assert!(vivarium.member(prey).is_some());
    }

    #[test]
    fn prey_flees_a_nearby_predator() {
        let mut vivarium = Vivarium::new(
            Settings {
                prey_evasion_weight: 1.0,
                ..settings()
            },
            RenderContext::default(),
        )
        .unwrap();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::ZERO, PREY)
            .unwrap();
        vivarium
            .spawn_creature(Species::Predator, DVec3::new(0.9, 0.0, 0.0), PREDATOR)
            .unwrap();
        vivarium.steer(prey, DVec3::new(0.01, 0.0, 0.0)).unwrap();

        // predator is advanced first and moves to x = 0.89
        vivarium.tick();
        assert!(vivarium.member(prey).unwrap().velocity().x < 0.0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut vivarium = vivarium();
        vivarium.spawn_food().unwrap();
        vivarium
            .spawn_creature(Species::Inert, DVec3::new(0.0, -1.5, 0.0), Color::ONE)
            .unwrap();

        vivarium.reset_population().unwrap();
        let first = (vivarium.census(), species(&vivarium), vivarium.scene().entity_count());
        vivarium.tick();
        vivarium.reset_population().unwrap();
        let second = (vivarium.census(), species(&vivarium), vivarium.scene().entity_count());

        assert_eq!(first, second);
        assert_eq!(
            second.0,
            Census {
                food: 0,
                prey: 2,
                predators: 1,
                inert: 1,
            }
        );
        assert_eq!(vivarium.creatures().len(), 3);
    }

    #[test]
    fn inert_bodies_never_move() {
        let mut vivarium = vivarium();
        let rock = vivarium
            .spawn_creature(Species::Inert, DVec3::new(0.0, 0.1, 0.0), Color::ONE)
            .unwrap();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::new(0.5, 0.0, 0.0), PREY)
            .unwrap();
        vivarium.steer(prey, DVec3::new(-0.01, 0.0, 0.0)).unwrap();

        for _ in 0..20 {
            vivarium.tick();
        }
        assert_eq!(vivarium.member(rock).unwrap().position(), DVec3::new(0.0, 0.1, 0.0));
        assert!(!vivarium.creatures().contains(&rock));
        // rocks are not obstacles
        assert!(vivarium.member(prey).unwrap().position().x < 0.35);
    }

    #[test]
    fn membership_errors_leave_the_list_intact() {
        let mut vivarium = vivarium();
        let prey = vivarium
            .spawn_creature(Species::Prey, DVec3::ZERO, PREY)
            .unwrap();

        assert_eq!(vivarium.remove(99), Err(VivariumError::UnknownBody(99)));
        assert_eq!(
            vivarium.spawn_creature(Species::Prey, DVec3::new(0.0, 2.5, 0.0), PREY),
            Err(VivariumError::OutsideTank(DVec3::new(0.0, 2.5, 0.0)))
        );

        vivarium.remove(prey).unwrap();
        assert_eq!(vivarium.remove(prey), Err(VivariumError::UnknownBody(prey)));
        assert!(vivarium.members().is_empty());
        // scene root and tank
        assert_eq!(vivarium.scene().entity_count(), 2);
    }

    #[test]
    fn predators_are_kept_unless_configured() {
        for remove in [false, true] {
            let mut vivarium = Vivarium::new(
                Settings {
                    remove_consumed_predators: remove,
                    ..settings()
                },
                RenderContext::default(),
            )
            .unwrap();
            let predator = vivarium
                .spawn_creature(Species::Predator, DVec3::ZERO, PREDATOR)
                .unwrap();
            vivarium.mark_for_removal(predator).unwrap();
            vivarium.tick();
            assert_eq!(vivarium.member(predator).is_none(), remove);
        }
    }

    #[test]
    fn random_spawns_stay_finite_and_inside() {
        for seed in 0..8 {
            let mut vivarium = Vivarium::new(
                Settings {
                    seed: Some(seed),
                    default_predators: 3,
                    default_prey: 6,
                    prey_flocking: seed % 2 == 0,
                    ..Settings::default()
                },
                RenderContext::default(),
            )
            .unwrap();
            vivarium.reset_population().unwrap();

            let mut rng = StdRng::seed_from_u64(seed);
            for tick in 0..400 {
                if rng.gen_ratio(1, 20) {
                    vivarium.spawn_food().unwrap();
                }
                vivarium.tick();

                let half = vivarium.tank().half_extents();
                for body in vivarium.members() {
                    let position = body.position();
                    assert!(position.is_finite(), "seed {} tick {}", seed, tick);
                    assert!(body.velocity().is_finite(), "seed {} tick {}", seed, tick);
                    assert!(
                        position.abs().cmple(half).all(),
                        "seed {} tick {}: {} left the tank",
                        seed,
                        tick,
                        position
                    );
                    let pose = vivarium.scene().world_pose(body.root());
                    assert!(pose.is_finite());
                }
            }
        }
    }

    #[derive(Default)]
    struct CountingBackend {
        allocated: usize,
        drawn: usize,
    }

    impl RenderBackend for CountingBackend {
        fn allocate(&mut self, _context: RenderContext, _primitive: &Primitive) -> DrawHandle {
            self.allocated += 1;
            self.allocated as DrawHandle
        }

        fn draw(&mut self, _handle: DrawHandle, _model: &DMat4, _color: Color, _highlighted: bool) {
            self.drawn += 1;
        }
    }

    #[test]
    fn every_shape_is_drawn_once_per_frame() {
        let mut vivarium = vivarium();
        vivarium.reset_population().unwrap();
        let mut backend = CountingBackend::default();
        vivarium.initialize(&mut backend);
        vivarium.draw(&mut backend);
        assert_eq!(backend.drawn, backend.allocated);
        assert!(backend.drawn > 1);
    }
}
