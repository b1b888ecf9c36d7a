use std::collections::HashMap;
use std::sync::Arc;

use crate::behavior::BehaviorNode;
use crate::constants::{
    DASH_COOLDOWN_MS, DASH_EFFECT_TICKS, DASH_SPEED_MULTIPLIER, DIAGONAL_FACTOR,
    FLASH_BLINK_INTERVAL_SECS, FLASH_DURATION_SECS, FLASH_MAX_BLINKS, IDLE_AXIS_DAMPING,
    TICK_SECS,
};
use crate::map::TileMap;
use crate::types::{CollisionClass, EntityId, EntityKind, Facing, MoveDir, Rect};

/// Kinematic core shared by every simulated body: integer position with
/// fractional accumulators, facing, damage flash, and the last position that
/// passed the hazard scan (abyss rollback target).
#[derive(Clone, Debug)]
pub struct Body {
    pub id: EntityId,
    pub kind: EntityKind,
    pub posx: i32,
    pub posy: i32,
    pub sizex: i32,
    pub sizey: i32,
    pub velx: f32,
    pub vely: f32,
    pub dec_posx: f32,
    pub dec_posy: f32,
    pub facing: Facing,
    pub anim: u8,
    pub flash_timer: f32,
    pub prev_posx: i32,
    pub prev_posy: i32,
}

impl Body {
    pub fn new(id: EntityId, kind: EntityKind, x: i32, y: i32, sizex: i32, sizey: i32) -> Self {
        Self {
            id,
            kind,
            posx: x,
            posy: y,
            sizex,
            sizey,
            velx: 0.0,
            vely: 0.0,
            dec_posx: 0.0,
            dec_posy: 0.0,
            facing: Facing::Down,
            anim: 0,
            flash_timer: 0.0,
            prev_posx: x,
            prev_posy: y,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.posx,
            y: self.posy,
            w: self.sizex,
            h: self.sizey,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.posx as f32 + self.sizex as f32 / 2.0,
            self.posy as f32 + self.sizey as f32 / 2.0,
        )
    }

    /// All-or-nothing integer step. Accepted only when no foot-row pixel of
    /// the translated hitbox touches a Wall on either layer and the moved
    /// box overlaps no obstacle.
    pub fn try_move(&mut self, dx: i32, dy: i32, map: &TileMap, obstacles: &[Rect]) -> bool {
        let foot_y = self.posy + dy + self.sizey - 1;
        for col in 0..self.sizex {
            let px = self.posx + dx + col;
            if map.check_col(px, foot_y, 0) == Some(CollisionClass::Wall)
                || map.check_col(px, foot_y, 1) == Some(CollisionClass::Wall)
            {
                return false;
            }
        }
        let moved = Rect {
            x: self.posx + dx,
            y: self.posy + dy,
            w: self.sizex,
            h: self.sizey,
        };
        if obstacles.iter().any(|obstacle| moved.overlaps(obstacle)) {
            return false;
        }
        self.posx += dx;
        self.posy += dy;
        true
    }

    /// Foot-row hazard scan: `(all_abyss, all_trap)`. A pixel counts toward
    /// a hazard when either layer classifies it so; the hazard triggers only
    /// when every foot-row pixel agrees.
    pub fn foot_hazard(&self, map: &TileMap) -> (bool, bool) {
        if self.sizex <= 0 {
            return (false, false);
        }
        let foot_y = self.posy + self.sizey - 1;
        let mut abyss = true;
        let mut trap = true;
        for col in 0..self.sizex {
            let px = self.posx + col;
            let ground = map.check_col(px, foot_y, 0);
            let overlay = map.check_col(px, foot_y, 1);
            if ground != Some(CollisionClass::Abyss) && overlay != Some(CollisionClass::Abyss) {
                abyss = false;
            }
            if ground != Some(CollisionClass::Trap) && overlay != Some(CollisionClass::Trap) {
                trap = false;
            }
            if !abyss && !trap {
                break;
            }
        }
        (abyss, trap)
    }

    pub fn remember_valid_position(&mut self) {
        self.prev_posx = self.posx;
        self.prev_posy = self.posy;
    }

    pub fn rollback_to_valid(&mut self) {
        self.posx = self.prev_posx;
        self.posy = self.prev_posy;
    }

    pub fn start_flash(&mut self) {
        self.flash_timer = FLASH_DURATION_SECS;
    }

    pub fn decay_flash(&mut self) {
        if self.flash_timer > 0.0 {
            self.flash_timer = (self.flash_timer - TICK_SECS).max(0.0);
        }
    }

    /// Rendering hint, computed on demand: alternating blink cycles over the
    /// flash window, tinted on even cycles.
    pub fn flash_visible(&self) -> bool {
        if self.flash_timer <= 0.0 {
            return false;
        }
        let elapsed = FLASH_DURATION_SECS - self.flash_timer;
        let cycle = (elapsed / FLASH_BLINK_INTERVAL_SECS) as u32;
        cycle < FLASH_MAX_BLINKS && cycle % 2 == 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatKind {
    Speed,
    Damage,
    Defense,
    Accel,
}

/// Timed stat delta: applied when added, reverted when the tick countdown
/// expires.
#[derive(Clone, Debug)]
pub struct Effect {
    pub stat: StatKind,
    pub value: f32,
    pub remaining: u32,
}

impl Effect {
    pub fn new(stat: StatKind, value: f32, duration_ticks: u32) -> Self {
        Self {
            stat,
            value,
            remaining: duration_ticks,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Stats {
    pub hp: f32,
    pub max_hp: f32,
    pub regen_hp: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub regen_mana: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub regen_stamina: f32,
    pub damage: f32,
    pub critical: f32,
    pub defense: f32,
    pub speed: f32,
    pub accel: f32,
    pub effects: Vec<Effect>,
}

impl Stats {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        max_hp: f32,
        regen_hp: f32,
        max_mana: f32,
        regen_mana: f32,
        max_stamina: f32,
        regen_stamina: f32,
        damage: f32,
        critical: f32,
        defense: f32,
        speed: f32,
        accel: f32,
    ) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            regen_hp,
            mana: max_mana,
            max_mana,
            regen_mana,
            stamina: max_stamina,
            max_stamina,
            regen_stamina,
            damage,
            critical,
            defense,
            speed,
            accel,
            effects: Vec::new(),
        }
    }

    /// Placeholder for unknown definition ids: keeps the tick loop alive
    /// with an inert zero-valued block.
    pub fn zeroed() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    fn stat_mut(&mut self, kind: StatKind) -> &mut f32 {
        match kind {
            StatKind::Speed => &mut self.speed,
            StatKind::Damage => &mut self.damage,
            StatKind::Defense => &mut self.defense,
            StatKind::Accel => &mut self.accel,
        }
    }

    pub fn add_effect(&mut self, effect: Effect) {
        *self.stat_mut(effect.stat) += effect.value;
        self.effects.push(effect);
    }

    pub fn update_effects(&mut self) {
        let mut expired: Vec<(StatKind, f32)> = Vec::new();
        self.effects.retain_mut(|effect| {
            effect.remaining = effect.remaining.saturating_sub(1);
            if effect.remaining == 0 {
                expired.push((effect.stat, effect.value));
                false
            } else {
                true
            }
        });
        for (stat, value) in expired {
            *self.stat_mut(stat) -= value;
        }
    }

    /// `hp / maxHp * 100 <= percent`, compared by cross-multiplication so
    /// exact boundaries hold (hp 30 of 100 satisfies the 30% threshold).
    /// Undefined (None) when `maxHp <= 0`.
    pub fn hp_at_most_percent(&self, percent: u32) -> Option<bool> {
        if self.max_hp <= 0.0 {
            return None;
        }
        Some(self.hp * 100.0 <= percent as f32 * self.max_hp)
    }

    pub fn hp_at_least_percent(&self, percent: u32) -> Option<bool> {
        if self.max_hp <= 0.0 {
            return None;
        }
        Some(self.hp * 100.0 >= percent as f32 * self.max_hp)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WanderLeg {
    pub dx: i32,
    pub dy: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct ScurryLeg {
    pub dir: Facing,
    pub remaining: f32,
}

#[derive(Clone, Debug)]
pub struct AggroState {
    pub target: EntityId,
    pub last_known: (i32, i32),
    pub path: Vec<(i32, i32)>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelState {
    pub channeling: bool,
    pub shots_fired: u32,
    pub next_fire_ms: u64,
    pub cooldown_until_ms: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RingState {
    pub in_sequence: bool,
    pub pulses_fired: u32,
    pub next_pulse_ms: u64,
    pub cooldown_until_ms: u64,
}

/// Mutable AI side of a behavior tree. Owned by the mob it belongs to and
/// dropped with it; the tree shape stays shared and immutable.
#[derive(Clone, Debug, Default)]
pub struct AiState {
    pub wander: Option<WanderLeg>,
    pub scurry: Option<ScurryLeg>,
    pub aggro: Option<AggroState>,
    pub timers: HashMap<u64, u64>,
    pub laser: ChannelState,
    pub ring: RingState,
    pub last_pos: Option<(i32, i32)>,
    pub stall_frames: u32,
}

#[derive(Clone, Debug)]
pub struct Mob {
    pub body: Body,
    pub def_id: u32,
    pub name: String,
    pub stats: Stats,
    pub behavior: Option<Arc<BehaviorNode>>,
    pub ai: AiState,
    pub attacking_until_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub stats: Stats,
    pub walk_intent: Option<MoveDir>,
    pub moving: bool,
    pub dashing: bool,
    pub last_dash_ms: u64,
}

impl Player {
    pub fn new(id: EntityId, x: i32, y: i32, stats: Stats) -> Self {
        Self {
            body: Body::new(id, EntityKind::Player, x, y, 32, 32),
            stats,
            walk_intent: None,
            moving: false,
            dashing: false,
            last_dash_ms: 0,
        }
    }

    /// One tick of walk integration: accelerate toward the speed cap on the
    /// driven axes, damp idle axes, scale diagonals, then apply the rounded
    /// whole-pixel remainder through `try_move`.
    pub fn walk(&mut self, map: &TileMap, obstacles: &[Rect]) {
        let accel = self.stats.accel;
        let cap = self.stats.speed;
        let diag = accel * DIAGONAL_FACTOR;
        let (ax, ay) = match self.walk_intent {
            Some(MoveDir::Right) => (accel, 0.0),
            Some(MoveDir::Left) => (-accel, 0.0),
            Some(MoveDir::Down) => (0.0, accel),
            Some(MoveDir::Up) => (0.0, -accel),
            Some(MoveDir::UpRight) => (diag, -diag),
            Some(MoveDir::UpLeft) => (-diag, -diag),
            Some(MoveDir::DownRight) => (diag, diag),
            Some(MoveDir::DownLeft) => (-diag, diag),
            None => (0.0, 0.0),
        };

        self.body.velx = if ax != 0.0 {
            (self.body.velx + ax).clamp(-cap, cap)
        } else {
            self.body.velx * IDLE_AXIS_DAMPING
        };
        self.body.vely = if ay != 0.0 {
            (self.body.vely + ay).clamp(-cap, cap)
        } else {
            self.body.vely * IDLE_AXIS_DAMPING
        };

        self.body.dec_posx += self.body.velx;
        self.body.dec_posy += self.body.vely;
        let step_x = self.body.dec_posx.round();
        let step_y = self.body.dec_posy.round();
        self.body.dec_posx -= step_x;
        self.body.dec_posy -= step_y;
        self.body
            .try_move(step_x as i32, step_y as i32, map, obstacles);

        if let Some(dir) = self.walk_intent {
            self.body.facing = dir.facing();
            self.moving = true;
        } else {
            self.moving = false;
        }
    }

    pub fn dash_ready(&self, now_ms: u64) -> bool {
        self.last_dash_ms == 0 || now_ms.saturating_sub(self.last_dash_ms) >= DASH_COOLDOWN_MS
    }

    /// Dash only triggers while moving and off cooldown; the dashing window
    /// itself lasts the whole cooldown and grants hazard/damage immunity.
    pub fn dash(&mut self, now_ms: u64) {
        if self.dash_ready(now_ms) && self.moving {
            self.stats.add_effect(Effect::new(
                StatKind::Speed,
                self.stats.speed * DASH_SPEED_MULTIPLIER,
                DASH_EFFECT_TICKS,
            ));
            self.last_dash_ms = now_ms;
            self.dashing = true;
        }
    }
}

#[derive(Clone, Debug)]
pub struct Breakable {
    pub body: Body,
    pub def_id: u32,
    pub durability: f32,
}

#[derive(Clone, Debug)]
pub struct ItemEntity {
    pub body: Body,
    pub item_id: u32,
}

/// Motion behavior tag, selected by the projectile definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Linear,
    Wave { amplitude: f32, frequency: f32 },
    Spiral { growth: f32, rotation: f32 },
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub body: Body,
    pub def_id: u32,
    pub owner_id: EntityId,
    pub owner_kind: EntityKind,
    pub dirx: f32,
    pub diry: f32,
    pub speed: f32,
    pub damage: f32,
    pub penetration: i32,
    pub lifetime_ticks: i32,
    pub motion: Motion,
    // Precise base position; the body keeps the truncated pixel position.
    pub base_x: f32,
    pub base_y: f32,
    pub phase: f32,
    pub radius: f32,
    pub already_hit: Vec<EntityId>,
}
