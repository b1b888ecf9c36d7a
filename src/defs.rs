use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::behavior::BehaviorNode;
use crate::entity::Motion;

/// Mob definition as the entity store hands it out: stats fields, hitbox,
/// texture reference and an optional behavior-tree id.
#[derive(Clone, Debug)]
pub struct MobDef {
    pub name: String,
    pub max_hp: f32,
    pub regen_hp: f32,
    pub max_mana: f32,
    pub regen_mana: f32,
    pub max_stamina: f32,
    pub regen_stamina: f32,
    pub damage: f32,
    pub critical: f32,
    pub defense: f32,
    pub speed: f32,
    pub accel: f32,
    pub sizex: i32,
    pub sizey: i32,
    pub texture: u32,
    pub behavior: Option<u32>,
}

impl MobDef {
    fn placeholder() -> Self {
        Self {
            name: "unknown".to_string(),
            max_hp: 0.0,
            regen_hp: 0.0,
            max_mana: 0.0,
            regen_mana: 0.0,
            max_stamina: 0.0,
            regen_stamina: 0.0,
            damage: 0.0,
            critical: 0.0,
            defense: 0.0,
            speed: 0.0,
            accel: 0.0,
            sizex: 0,
            sizey: 0,
            texture: 0,
            behavior: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProjectileDef {
    pub speed: f32,
    pub damage: f32,
    pub penetration: i32,
    pub sizex: i32,
    pub sizey: i32,
    pub lifetime_ticks: i32,
    pub motion: Motion,
    pub texture: u32,
}

impl ProjectileDef {
    fn placeholder() -> Self {
        Self {
            speed: 0.0,
            damage: 0.0,
            penetration: 0,
            sizex: 0,
            sizey: 0,
            lifetime_ticks: 0,
            motion: Motion::Linear,
            texture: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BreakableDef {
    pub sizex: i32,
    pub sizey: i32,
    pub durability: f32,
    pub texture: u32,
}

impl BreakableDef {
    fn placeholder() -> Self {
        Self {
            sizex: 0,
            sizey: 0,
            durability: 0.0,
            texture: 0,
        }
    }
}

/// In-memory definition stores. Unknown ids degrade to zero-valued
/// placeholders with a logged warning instead of aborting the tick.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    mobs: HashMap<u32, MobDef>,
    projectiles: HashMap<u32, ProjectileDef>,
    breakables: HashMap<u32, BreakableDef>,
    behaviors: HashMap<u32, Arc<BehaviorNode>>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_mob(&mut self, id: u32, def: MobDef) {
        self.mobs.insert(id, def);
    }

    pub fn insert_projectile(&mut self, id: u32, def: ProjectileDef) {
        self.projectiles.insert(id, def);
    }

    pub fn insert_breakable(&mut self, id: u32, def: BreakableDef) {
        self.breakables.insert(id, def);
    }

    pub fn insert_behavior(&mut self, id: u32, tree: Arc<BehaviorNode>) {
        self.behaviors.insert(id, tree);
    }

    pub fn mob(&self, id: u32) -> MobDef {
        match self.mobs.get(&id) {
            Some(def) => def.clone(),
            None => {
                warn!(def_id = id, "unknown mob definition, using placeholder");
                MobDef::placeholder()
            }
        }
    }

    pub fn projectile(&self, id: u32) -> ProjectileDef {
        match self.projectiles.get(&id) {
            Some(def) => def.clone(),
            None => {
                warn!(def_id = id, "unknown projectile definition, using placeholder");
                ProjectileDef::placeholder()
            }
        }
    }

    pub fn breakable(&self, id: u32) -> BreakableDef {
        match self.breakables.get(&id) {
            Some(def) => def.clone(),
            None => {
                warn!(def_id = id, "unknown breakable definition, using placeholder");
                BreakableDef::placeholder()
            }
        }
    }

    /// Absent behavior id means the mob simply has no AI.
    pub fn behavior(&self, id: u32) -> Option<Arc<BehaviorNode>> {
        let tree = self.behaviors.get(&id).cloned();
        if tree.is_none() {
            warn!(behavior_id = id, "unknown behavior tree, mob will idle");
        }
        tree
    }
}
