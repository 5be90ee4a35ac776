//! What a body can see of the world while it advances.
//!
//! The container lends each body a read-only view of every other member for
//! the duration of its own update. Anything a body wants to do to another
//! member (eating it) is recorded in the `TickContext` and applied by the
//! container afterwards, so the membership list has a single writer.

use glam::DVec3;

use vivarium_core::scenegraph::SceneGraph;
use vivarium_core::species::Species;
use vivarium_core::{BodyId, Settings};

use crate::body::Body;
use crate::physics::{BoundingSphere, Tank};

pub trait EnvironmentMember {
    fn id(&self) -> BodyId;
    fn species(&self) -> Species;
    fn position(&self) -> DVec3;
    fn velocity(&self) -> DVec3;
    /// World-space collision sphere.
    fn bounds(&self) -> BoundingSphere;
    fn is_removal_pending(&self) -> bool;
}

pub trait Animation {
    /// Called exactly once per tick.
    fn advance(&mut self, ctx: &mut TickContext<'_>);
}

/// Steering parameters shared by every body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionRules {
    pub perception_radius: f64,
    pub prey_evasion_weight: f64,
    pub prey_flocking: bool,
    pub cohesion_weight: f64,
    pub alignment_weight: f64,
}

impl From<&Settings> for InteractionRules {
    fn from(settings: &Settings) -> Self {
        InteractionRules {
            perception_radius: settings.perception_radius,
            prey_evasion_weight: settings.prey_evasion_weight,
            prey_flocking: settings.prey_flocking,
            cohesion_weight: settings.cohesion_weight,
            alignment_weight: settings.alignment_weight,
        }
    }
}

/// Every member except the one being advanced, split around its slot.
#[derive(Clone, Copy)]
pub struct EnvironmentView<'a> {
    tank: &'a Tank,
    before: &'a [Body],
    after: &'a [Body],
}

impl<'a> EnvironmentView<'a> {
    pub fn new(tank: &'a Tank, before: &'a [Body], after: &'a [Body]) -> EnvironmentView<'a> {
        EnvironmentView {
            tank,
            before,
            after,
        }
    }

    pub fn tank(&self) -> &'a Tank {
        self.tank
    }

    pub fn neighbors(&self) -> impl Iterator<Item = &'a dyn EnvironmentMember> + 'a {
        let (before, after) = (self.before, self.after);
        before
            .iter()
            .chain(after.iter())
            .map(|body| -> &'a dyn EnvironmentMember { body })
    }

    /// Neighbors not yet eaten or otherwise on their way out.
    pub fn live_neighbors(&self) -> impl Iterator<Item = &'a dyn EnvironmentMember> + 'a {
        self.neighbors().filter(|member| !member.is_removal_pending())
    }
}

pub struct TickContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub env: EnvironmentView<'a>,
    pub rules: &'a InteractionRules,
    consumed: Vec<BodyId>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        scene: &'a mut SceneGraph,
        env: EnvironmentView<'a>,
        rules: &'a InteractionRules,
    ) -> TickContext<'a> {
        TickContext {
            scene,
            env,
            rules,
            consumed: Vec::new(),
        }
    }

    /// Ask the container to mark `id` removal-pending once this body is done.
    pub fn consume(&mut self, id: BodyId) {
        if !self.consumed.contains(&id) {
            self.consumed.push(id);
        }
    }

    pub fn into_consumed(self) -> Vec<BodyId> {
        self.consumed
    }
}
