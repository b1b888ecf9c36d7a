use tracing::debug;

use super::GameWorld;
use crate::constants::{spawn_grid_offset, TILE_SIZE};
use crate::types::{EntityId, RuntimeEvent};

/// Predicate over world state, sampled once per tick while the event is
/// registered.
#[derive(Clone, Debug)]
pub enum EventCondition {
    Always,
    PlayerNear { x: i32, y: i32, radius_px: f32 },
    MobCountAtMost(usize),
}

impl EventCondition {
    fn check(&self, world: &GameWorld) -> bool {
        match self {
            EventCondition::Always => true,
            EventCondition::PlayerNear { x, y, radius_px } => world
                .nearest_player((*x as f32, *y as f32))
                .is_some_and(|(_, _, dist)| dist <= *radius_px),
            EventCondition::MobCountAtMost(limit) => world.mobs.len() <= *limit,
        }
    }
}

/// Rectangular wall-of-breakables region, in tile units from a pixel anchor.
#[derive(Clone, Debug)]
pub struct WallRegion {
    pub x: i32,
    pub y: i32,
    pub cols: u32,
    pub rows: u32,
    pub def_id: u32,
}

/// One wave of a scripted encounter: anchor point, mob type and head count.
#[derive(Clone, Debug)]
pub struct RaidSpec {
    pub x: i32,
    pub y: i32,
    pub mob_def: u32,
    pub count: u32,
}

#[derive(Clone, Debug)]
pub enum EventAction {
    SpawnMobs {
        def_id: u32,
        count: u32,
        x: i32,
        y: i32,
    },
    SpawnBreakables {
        def_id: u32,
        count: u32,
        x: i32,
        y: i32,
    },
    Chat {
        message: String,
    },
    LockRoomRaid {
        walls: Vec<WallRegion>,
        raids: Vec<RaidSpec>,
    },
}

impl EventAction {
    fn apply(self, world: &mut GameWorld) {
        match self {
            EventAction::SpawnMobs {
                def_id,
                count,
                x,
                y,
            } => {
                for i in 0..count {
                    let (ox, oy) = spawn_grid_offset(i);
                    world.spawn_mob(def_id, x + ox, y + oy);
                }
            }
            EventAction::SpawnBreakables {
                def_id,
                count,
                x,
                y,
            } => {
                for i in 0..count {
                    let (ox, oy) = spawn_grid_offset(i);
                    world.spawn_breakable(def_id, x + ox, y + oy);
                }
            }
            EventAction::Chat { message } => {
                world.push_event(RuntimeEvent::Chat { message });
            }
            EventAction::LockRoomRaid { walls, raids } => {
                // Sticky once-per-session guard, even from a looping event.
                if world.raid.activated_once {
                    return;
                }
                world.raid.activated_once = true;
                for region in walls {
                    for row in 0..region.rows {
                        for col in 0..region.cols {
                            let id = world.spawn_breakable(
                                region.def_id,
                                region.x + col as i32 * TILE_SIZE,
                                region.y + row as i32 * TILE_SIZE,
                            );
                            world.raid.lock_walls.push(id);
                        }
                    }
                }
                world.start_raids(raids);
            }
        }
    }
}

/// Cooldown-gated world event. The first `run` after registration only
/// records the activation baseline; nothing fires until the cooldown has
/// elapsed from that point with the condition holding.
#[derive(Clone, Debug)]
pub struct GameEvent {
    pub name: String,
    pub condition: EventCondition,
    pub action: EventAction,
    pub cooldown_ms: u64,
    pub is_loop: bool,
    last_activation_ms: u64,
    fired: bool,
}

impl GameEvent {
    pub fn new(
        name: impl Into<String>,
        condition: EventCondition,
        action: EventAction,
        cooldown_ms: u64,
        is_loop: bool,
    ) -> Self {
        Self {
            name: name.into(),
            condition,
            action,
            cooldown_ms,
            is_loop,
            last_activation_ms: 0,
            fired: false,
        }
    }

    fn run(&mut self, world: &mut GameWorld, now_ms: u64) {
        if self.last_activation_ms == 0 {
            self.last_activation_ms = now_ms;
            return;
        }
        if !self.is_loop && self.fired {
            return;
        }
        if now_ms.saturating_sub(self.last_activation_ms) < self.cooldown_ms {
            return;
        }
        if !self.condition.check(world) {
            return;
        }
        self.fired = true;
        self.last_activation_ms = now_ms;
        debug!(name = %self.name, "event fired");
        world.push_event(RuntimeEvent::EventFired {
            name: self.name.clone(),
        });
        self.action.clone().apply(world);
    }
}

/// One wave plus the ids it spawned; the controller waits on those ids.
#[derive(Clone, Debug)]
pub struct Raid {
    pub spec: RaidSpec,
    pub spawned: Vec<EntityId>,
}

#[derive(Clone, Debug, Default)]
pub struct RaidController {
    pub raids: Vec<Raid>,
    pub cursor: usize,
    pub active: bool,
    pub activated_once: bool,
    pub lock_walls: Vec<EntityId>,
}

impl GameWorld {
    /// Resets the wave cursor and spawns the first wave immediately.
    pub fn start_raids(&mut self, specs: Vec<RaidSpec>) {
        self.raid.raids = specs
            .into_iter()
            .map(|spec| Raid {
                spec,
                spawned: Vec::new(),
            })
            .collect();
        self.raid.cursor = 0;
        self.raid.active = !self.raid.raids.is_empty();
        if self.raid.active {
            self.spawn_current_raid();
        }
    }

    fn spawn_current_raid(&mut self) {
        let cursor = self.raid.cursor;
        let spec = self.raid.raids[cursor].spec.clone();
        let mut spawned = Vec::with_capacity(spec.count as usize);
        for i in 0..spec.count {
            let (ox, oy) = spawn_grid_offset(i);
            spawned.push(self.spawn_mob(spec.mob_def, spec.x + ox, spec.y + oy));
        }
        self.raid.raids[cursor].spawned = spawned;
        debug!(wave = cursor, "raid wave spawned");
        self.push_event(RuntimeEvent::RaidWaveStarted { index: cursor });
    }

    /// Advances only when every id the current wave spawned is gone from the
    /// live mob collection; exhausting the list tears down the lock walls.
    pub(super) fn run_raids(&mut self) {
        if !self.raid.active {
            return;
        }
        let cursor = self.raid.cursor;
        let cleared = self.raid.raids[cursor]
            .spawned
            .iter()
            .all(|id| self.mob(*id).is_none());
        if !cleared {
            return;
        }
        if cursor + 1 < self.raid.raids.len() {
            self.raid.cursor += 1;
            self.spawn_current_raid();
        } else {
            self.raid.active = false;
            let walls = std::mem::take(&mut self.raid.lock_walls);
            for id in walls {
                self.remove_breakable(id);
            }
            debug!("raid sequence finished");
            self.push_event(RuntimeEvent::RaidFinished);
        }
    }

    pub(super) fn run_events(&mut self, now_ms: u64) {
        let mut events = std::mem::take(&mut self.events);
        for event in &mut events {
            event.run(self, now_ms);
        }
        // Keep anything an action registered mid-pass.
        events.append(&mut self.events);
        self.events = events;
    }
}
