use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::behavior::BehaviorNode;
use crate::constants::{ABYSS_DAMAGE_RATIO, DASH_COOLDOWN_MS, TICK_SECS, TRAP_DAMAGE_PER_SEC};
use crate::defs::Definitions;
use crate::entity::{AiState, Body, Breakable, ItemEntity, Mob, Player, Projectile, Stats};
use crate::map::TileMap;
use crate::rng::Rng;
use crate::types::{
    BreakableView, EntityId, EntityKind, ItemView, MobView, MoveDir, PlayerView, ProjectileView,
    Rect, RuntimeEvent, Snapshot,
};

mod ai_actions;
mod ai_conditions;
mod event_system;
mod projectile_system;

pub use event_system::{
    EventAction, EventCondition, GameEvent, Raid, RaidController, RaidSpec, WallRegion,
};

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Clone, Debug)]
pub struct WorldOptions {
    pub seed: u32,
    pub started_at_ms: Option<u64>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            started_at_ms: None,
        }
    }
}

/// The whole simulation: map, definitions, every live collection, the event
/// and raid sequencers and the runtime-event stream. Advanced one tick at a
/// time by `step(dt_ms)`; wall-clock time only enters through the dt
/// accumulation so tests control it exactly.
#[derive(Clone, Debug)]
pub struct GameWorld {
    pub map: TileMap,
    pub defs: Definitions,
    pub started_at_ms: u64,

    pub mobs: Vec<Mob>,
    pub players: Vec<Player>,
    pub projectiles: Vec<Projectile>,
    pub breakables: Vec<Breakable>,
    pub items: Vec<ItemEntity>,
    pub events: Vec<GameEvent>,
    pub raid: RaidController,

    rng: Rng,
    runtime_events: Vec<RuntimeEvent>,
    next_id_counter: u64,
    elapsed_ms: u64,
    tick_counter: u64,
}

impl GameWorld {
    pub fn new(map: TileMap, defs: Definitions, options: WorldOptions) -> Self {
        Self {
            map,
            defs,
            started_at_ms: options.started_at_ms.unwrap_or_else(wall_clock_ms),
            mobs: Vec::new(),
            players: Vec::new(),
            projectiles: Vec::new(),
            breakables: Vec::new(),
            items: Vec::new(),
            events: Vec::new(),
            raid: RaidController::default(),
            rng: Rng::new(options.seed),
            runtime_events: Vec::new(),
            next_id_counter: 1,
            elapsed_ms: 0,
            tick_counter: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.elapsed_ms)
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id_counter);
        self.next_id_counter += 1;
        id
    }

    pub(super) fn push_event(&mut self, event: RuntimeEvent) {
        self.runtime_events.push(event);
    }

    /// One tick, in the fixed collection order: mobs, players, events,
    /// raids, projectiles, breakables, items. Projectiles spawned by mob AI
    /// this tick are moved and collision-checked by the projectile pass of
    /// the same tick.
    pub fn step(&mut self, dt_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.tick_counter += 1;
        let now_ms = self.now_ms();

        self.tick_mobs(now_ms);
        self.tick_players(now_ms);
        self.run_events(now_ms);
        self.run_raids();
        self.tick_projectiles();
        self.tick_breakables();
        self.tick_items();
    }

    pub fn spawn_mob(&mut self, def_id: u32, x: i32, y: i32) -> EntityId {
        let def = self.defs.mob(def_id);
        let behavior = def.behavior.and_then(|bid| self.defs.behavior(bid));
        let id = self.alloc_id();
        let stats = Stats::new(
            def.max_hp,
            def.regen_hp,
            def.max_mana,
            def.regen_mana,
            def.max_stamina,
            def.regen_stamina,
            def.damage,
            def.critical,
            def.defense,
            def.speed,
            def.accel,
        );
        self.mobs.push(Mob {
            body: Body::new(id, EntityKind::Mob, x, y, def.sizex, def.sizey),
            def_id,
            name: def.name,
            stats,
            behavior,
            ai: AiState::default(),
            attacking_until_ms: 0,
        });
        self.push_event(RuntimeEvent::MobSpawned { id, def_id });
        id
    }

    pub fn spawn_player(&mut self, x: i32, y: i32, stats: Stats) -> EntityId {
        let id = self.alloc_id();
        self.players.push(Player::new(id, x, y, stats));
        id
    }

    pub fn spawn_breakable(&mut self, def_id: u32, x: i32, y: i32) -> EntityId {
        let def = self.defs.breakable(def_id);
        let id = self.alloc_id();
        self.breakables.push(Breakable {
            body: Body::new(id, EntityKind::Breakable, x, y, def.sizex, def.sizey),
            def_id,
            durability: def.durability,
        });
        id
    }

    pub fn spawn_item(&mut self, item_id: u32, x: i32, y: i32) -> EntityId {
        let id = self.alloc_id();
        self.items.push(ItemEntity {
            body: Body::new(id, EntityKind::Item, x, y, 16, 16),
            item_id,
        });
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spawn_projectile(
        &mut self,
        def_id: u32,
        owner_id: EntityId,
        owner_kind: EntityKind,
        x: i32,
        y: i32,
        dirx: f32,
        diry: f32,
        damage: f32,
    ) -> EntityId {
        let def = self.defs.projectile(def_id);
        let id = self.alloc_id();
        self.projectiles.push(Projectile {
            body: Body::new(id, EntityKind::Projectile, x, y, def.sizex, def.sizey),
            def_id,
            owner_id,
            owner_kind,
            dirx,
            diry,
            speed: def.speed,
            damage,
            penetration: def.penetration,
            lifetime_ticks: def.lifetime_ticks,
            motion: def.motion,
            base_x: x as f32,
            base_y: y as f32,
            phase: 0.0,
            radius: 0.0,
            already_hit: Vec::new(),
        });
        id
    }

    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        self.mobs.iter().find(|mob| mob.body.id == id)
    }

    pub fn mob_mut(&mut self, id: EntityId) -> Option<&mut Mob> {
        self.mobs.iter_mut().find(|mob| mob.body.id == id)
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players.iter().find(|player| player.body.id == id)
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.body.id == id)
    }

    pub fn set_player_intent(&mut self, id: EntityId, intent: Option<MoveDir>) {
        if let Some(player) = self.player_mut(id) {
            player.walk_intent = intent;
        }
    }

    pub fn player_dash(&mut self, id: EntityId) {
        let now_ms = self.now_ms();
        if let Some(player) = self.player_mut(id) {
            player.dash(now_ms);
        }
    }

    /// Removal by id is idempotent: a second kill in the same tick finds
    /// nothing and does nothing.
    pub fn damage_mob(&mut self, id: EntityId, amount: f32) {
        let Some(mob) = self.mob_mut(id) else {
            return;
        };
        mob.stats.hp = (mob.stats.hp - amount).clamp(0.0, mob.stats.max_hp.max(0.0));
        mob.body.start_flash();
        if mob.stats.hp <= 0.0 {
            self.mobs.retain(|mob| mob.body.id != id);
            self.push_event(RuntimeEvent::MobDied { id });
        }
    }

    pub fn damage_player(&mut self, id: EntityId, amount: f32) {
        let Some(player) = self.player_mut(id) else {
            return;
        };
        if player.dashing {
            return;
        }
        player.stats.hp = (player.stats.hp - amount).clamp(0.0, player.stats.max_hp.max(0.0));
        player.body.start_flash();
        if player.stats.hp <= 0.0 {
            self.players.retain(|player| player.body.id != id);
            self.push_event(RuntimeEvent::PlayerDied { id });
        }
    }

    pub fn damage_breakable(&mut self, id: EntityId, amount: f32) {
        let Some(breakable) = self.breakables.iter_mut().find(|b| b.body.id == id) else {
            return;
        };
        breakable.durability -= amount;
        breakable.body.start_flash();
        if breakable.durability <= 0.0 {
            self.breakables.retain(|b| b.body.id != id);
            self.push_event(RuntimeEvent::BreakableDestroyed { id });
        }
    }

    pub(super) fn remove_breakable(&mut self, id: EntityId) {
        self.breakables.retain(|b| b.body.id != id);
    }

    pub(super) fn remove_projectile(&mut self, id: EntityId) {
        self.projectiles.retain(|p| p.body.id != id);
    }

    pub(super) fn breakable_rects(&self) -> Vec<Rect> {
        self.breakables.iter().map(|b| b.body.rect()).collect()
    }

    fn tick_mobs(&mut self, now_ms: u64) {
        let ids: Vec<EntityId> = self.mobs.iter().map(|mob| mob.body.id).collect();
        for id in ids {
            let Some(mob) = self.mobs.iter_mut().find(|mob| mob.body.id == id) else {
                continue;
            };
            mob.body.decay_flash();
            let (abyss, trap) = mob.body.foot_hazard(&self.map);
            let mut damage = None;
            if !abyss && !trap {
                mob.body.remember_valid_position();
            } else if abyss {
                mob.body.rollback_to_valid();
                damage = Some((mob.stats.max_hp * ABYSS_DAMAGE_RATIO).ceil().max(1.0));
            } else {
                damage = Some(TRAP_DAMAGE_PER_SEC * TICK_SECS);
            }
            if let Some(amount) = damage {
                self.damage_mob(id, amount);
            }

            let tree: Option<Arc<BehaviorNode>> = match self.mob(id) {
                Some(mob) => mob.behavior.clone(),
                None => continue,
            };
            if let Some(tree) = tree {
                self.run_behavior(id, &tree, now_ms);
            }
        }
    }

    fn tick_players(&mut self, now_ms: u64) {
        let ids: Vec<EntityId> = self.players.iter().map(|player| player.body.id).collect();
        for id in ids {
            let obstacles = self.breakable_rects();
            let Some(player) = self.players.iter_mut().find(|player| player.body.id == id) else {
                continue;
            };
            player.stats.update_effects();
            player.dashing = player.last_dash_ms != 0
                && now_ms.saturating_sub(player.last_dash_ms) < DASH_COOLDOWN_MS;
            player.body.decay_flash();
            player.walk(&self.map, &obstacles);

            let (abyss, trap) = player.body.foot_hazard(&self.map);
            let dashing = player.dashing;
            let mut damage = None;
            if !abyss && !trap {
                player.body.remember_valid_position();
            } else if dashing {
                // Dash grants hazard immunity; the last safe spot stays put.
            } else if abyss {
                player.body.rollback_to_valid();
                damage = Some((player.stats.max_hp * ABYSS_DAMAGE_RATIO).ceil().max(1.0));
            } else {
                damage = Some(TRAP_DAMAGE_PER_SEC * TICK_SECS);
            }
            if let Some(amount) = damage {
                self.damage_player(id, amount);
            }
            self.check_player_projectiles(id);
        }
    }

    fn tick_breakables(&mut self) {
        for breakable in &mut self.breakables {
            breakable.body.decay_flash();
        }
    }

    fn tick_items(&mut self) {
        for item in &mut self.items {
            item.body.decay_flash();
        }
    }

    /// Short-circuit tree walk: Sequence fails on the first failing child,
    /// Selector succeeds on the first succeeding child, Actions always
    /// succeed.
    fn run_behavior(&mut self, mob_id: EntityId, node: &BehaviorNode, now_ms: u64) -> bool {
        match node {
            BehaviorNode::Sequence(children) => {
                for child in children {
                    if !self.run_behavior(mob_id, child, now_ms) {
                        return false;
                    }
                }
                true
            }
            BehaviorNode::Selector(children) => {
                for child in children {
                    if self.run_behavior(mob_id, child, now_ms) {
                        return true;
                    }
                }
                false
            }
            BehaviorNode::Condition(kind) => self.eval_condition(mob_id, *kind, now_ms),
            BehaviorNode::Action(kind) => {
                self.perform_action(mob_id, *kind, now_ms);
                true
            }
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.runtime_events)
        } else {
            Vec::new()
        };
        Snapshot {
            tick: self.tick_counter,
            now_ms: self.now_ms(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.body.id,
                    x: p.body.posx,
                    y: p.body.posy,
                    facing: p.body.facing,
                    anim: p.body.anim,
                    hp: p.stats.hp,
                    max_hp: p.stats.max_hp,
                    dashing: p.dashing,
                    moving: p.moving,
                    flashing: p.body.flash_visible(),
                })
                .collect(),
            mobs: self
                .mobs
                .iter()
                .map(|m| MobView {
                    id: m.body.id,
                    name: m.name.clone(),
                    x: m.body.posx,
                    y: m.body.posy,
                    facing: m.body.facing,
                    anim: m.body.anim,
                    hp: m.stats.hp,
                    max_hp: m.stats.max_hp,
                    flashing: m.body.flash_visible(),
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.body.id,
                    x: p.body.posx,
                    y: p.body.posy,
                    def_id: p.def_id,
                })
                .collect(),
            breakables: self
                .breakables
                .iter()
                .map(|b| BreakableView {
                    id: b.body.id,
                    x: b.body.posx,
                    y: b.body.posy,
                    durability: b.durability,
                })
                .collect(),
            items: self
                .items
                .iter()
                .map(|i| ItemView {
                    id: i.body.id,
                    x: i.body.posx,
                    y: i.body.posy,
                    item_id: i.item_id,
                })
                .collect(),
            events,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::behavior::tree_from_json;
    use crate::defs::{BreakableDef, MobDef, ProjectileDef};
    use crate::entity::Motion;

    pub const DEF_RAT: u32 = 1;
    pub const DEF_BOSS: u32 = 2;
    pub const DEF_STATIC: u32 = 3;
    pub const PRJ_BITE: u32 = 1;
    pub const PRJ_NOTE: u32 = 2;
    pub const PRJ_LASER: u32 = 3;
    pub const PRJ_RING: u32 = 4;
    pub const BRK_WALL: u32 = 1;
    pub const BHV_WANDER: u32 = 1;

    pub fn sample_defs() -> Definitions {
        let mut defs = Definitions::new();
        defs.insert_mob(
            DEF_RAT,
            MobDef {
                name: "rat".to_string(),
                max_hp: 20.0,
                regen_hp: 0.0,
                max_mana: 0.0,
                regen_mana: 0.0,
                max_stamina: 0.0,
                regen_stamina: 0.0,
                damage: 2.0,
                critical: 0.0,
                defense: 0.0,
                speed: 2.0,
                accel: 0.4,
                sizex: 32,
                sizey: 32,
                texture: 1,
                behavior: None,
            },
        );
        defs.insert_mob(
            DEF_BOSS,
            MobDef {
                name: "bard".to_string(),
                max_hp: 300.0,
                regen_hp: 0.0,
                max_mana: 0.0,
                regen_mana: 0.0,
                max_stamina: 0.0,
                regen_stamina: 0.0,
                damage: 5.0,
                critical: 0.0,
                defense: 0.0,
                speed: 1.5,
                accel: 0.3,
                sizex: 32,
                sizey: 32,
                texture: 2,
                behavior: None,
            },
        );
        defs.insert_mob(
            DEF_STATIC,
            MobDef {
                name: "dummy".to_string(),
                max_hp: 100.0,
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
                sizex: 32,
                sizey: 32,
                texture: 3,
                behavior: None,
            },
        );
        defs.insert_projectile(
            PRJ_BITE,
            ProjectileDef {
                speed: 4.0,
                damage: 1.5,
                penetration: 1,
                sizex: 16,
                sizey: 16,
                lifetime_ticks: 20,
                motion: Motion::Linear,
                texture: 4,
            },
        );
        defs.insert_projectile(
            PRJ_NOTE,
            ProjectileDef {
                speed: 3.0,
                damage: 1.0,
                penetration: 2,
                sizex: 16,
                sizey: 16,
                lifetime_ticks: 60,
                motion: Motion::Wave {
                    amplitude: 12.0,
                    frequency: 0.25,
                },
                texture: 5,
            },
        );
        defs.insert_projectile(
            PRJ_LASER,
            ProjectileDef {
                speed: 8.0,
                damage: 2.0,
                penetration: 1,
                sizex: 8,
                sizey: 8,
                lifetime_ticks: 40,
                motion: Motion::Linear,
                texture: 7,
            },
        );
        defs.insert_projectile(
            PRJ_RING,
            ProjectileDef {
                speed: 1.5,
                damage: 1.0,
                penetration: 1,
                sizex: 12,
                sizey: 12,
                lifetime_ticks: 90,
                motion: Motion::Spiral {
                    growth: 0.5,
                    rotation: 0.3,
                },
                texture: 8,
            },
        );
        defs.insert_breakable(
            BRK_WALL,
            BreakableDef {
                sizex: 32,
                sizey: 32,
                durability: 10.0,
                texture: 6,
            },
        );
        defs.insert_behavior(BHV_WANDER, tree_from_json(r#"[["action","wander"]]"#).unwrap());
        defs
    }

    pub fn open_map(cols: usize, rows: usize) -> TileMap {
        let row = ".".repeat(cols);
        let rows: Vec<&str> = std::iter::repeat(row.as_str()).take(rows).collect();
        TileMap::from_rows(&rows)
    }

    pub fn test_world(map: TileMap) -> GameWorld {
        GameWorld::new(
            map,
            sample_defs(),
            WorldOptions {
                seed: 11,
                started_at_ms: Some(1_000),
            },
        )
    }

    pub fn player_stats() -> Stats {
        Stats::new(100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 4.0, 1.0)
    }
}
