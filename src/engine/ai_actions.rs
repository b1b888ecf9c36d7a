use super::GameWorld;
use crate::behavior::ActionKind;
use crate::constants::{
    AGGRO_CLOSE_PX, AGGRO_DOMINANT_AXIS_RATIO, AGGRO_MINOR_AXIS_SCALE, AGGRO_RADIUS_PX,
    AGGRO_STALL_FRAMES, ATTACK_ANIM_MS, IDLE_AXIS_DAMPING, LASER_COOLDOWN_MS, LASER_TOTAL_SHOTS,
    LASER_WINDOW_MS, PATH_WAYPOINT_TOLERANCE_PX, PRJ_DEF_BITE, PRJ_DEF_LASER, PRJ_DEF_NOTE,
    PRJ_DEF_RING, RING_DIRECTIONS, RING_DIRECTION_STRIDE, RING_PULSES, RING_PULSE_GAP_MS,
    RING_SEQUENCE_COOLDOWN_MS, SCURRY_LEG_PX, TILE_SIZE, WANDER_LEG_PX,
};
use crate::entity::{AggroState, ScurryLeg, WanderLeg};
use crate::map::TileMap;
use crate::pathfind::find_path;
use crate::types::{CollisionClass, EntityId, EntityKind, Facing, Rect};

fn normalize(dx: f32, dy: f32) -> (f32, f32) {
    let mag = (dx * dx + dy * dy).sqrt();
    if mag == 0.0 {
        (0.0, 0.0)
    } else {
        (dx / mag, dy / mag)
    }
}

fn box_blocked(map: &TileMap, obstacles: &[Rect], x: i32, y: i32, sizex: i32, sizey: i32) -> bool {
    let foot_y = y + sizey - 1;
    for col in 0..sizex {
        let px = x + col;
        if map.check_col(px, foot_y, 0) == Some(CollisionClass::Wall)
            || map.check_col(px, foot_y, 1) == Some(CollisionClass::Wall)
        {
            return true;
        }
    }
    let placed = Rect {
        x,
        y,
        w: sizex,
        h: sizey,
    };
    obstacles.iter().any(|obstacle| placed.overlaps(obstacle))
}

/// Swept-box walk along the straight line between two footprint origins,
/// sampled at half-tile steps so no wall column fits between samples.
fn line_clear(
    map: &TileMap,
    obstacles: &[Rect],
    from: (i32, i32),
    to: (i32, i32),
    sizex: i32,
    sizey: i32,
) -> bool {
    let dx = (to.0 - from.0) as f32;
    let dy = (to.1 - from.1) as f32;
    let steps = ((dx.abs().max(dy.abs()) / (TILE_SIZE as f32 / 2.0)).ceil() as i32).max(1);
    for n in 0..=steps {
        let t = n as f32 / steps as f32;
        let x = from.0 + (dx * t).round() as i32;
        let y = from.1 + (dy * t).round() as i32;
        if box_blocked(map, obstacles, x, y, sizex, sizey) {
            return false;
        }
    }
    true
}

fn facing_from_vector(dx: f32, dy: f32) -> Facing {
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            Facing::Right
        } else {
            Facing::Left
        }
    } else if dy > 0.0 {
        Facing::Down
    } else {
        Facing::Up
    }
}

impl GameWorld {
    pub(super) fn perform_action(&mut self, mob_id: EntityId, kind: ActionKind, now_ms: u64) {
        match kind {
            ActionKind::Wander => self.act_wander(mob_id),
            ActionKind::Scurry => self.act_scurry(mob_id),
            ActionKind::Pursue => self.act_pursue(mob_id),
            ActionKind::Bite => self.act_shot(mob_id, PRJ_DEF_BITE, now_ms),
            ActionKind::MusicNote => self.act_shot(mob_id, PRJ_DEF_NOTE, now_ms),
            ActionKind::LaserBurst => self.act_laser(mob_id, now_ms),
            ActionKind::RingBurst => self.act_ring(mob_id, now_ms),
            ActionKind::FaceAnim => self.act_face_anim(mob_id),
        }
    }

    /// 32px cardinal legs, one pixel per tick. The leg keeps counting down
    /// even when a wall eats the step, so a blocked mob re-rolls after the
    /// leg runs out instead of grinding forever.
    fn act_wander(&mut self, mob_id: EntityId) {
        let obstacles = self.breakable_rects();
        let Some(mob) = self.mobs.iter_mut().find(|mob| mob.body.id == mob_id) else {
            return;
        };
        let exhausted = mob
            .ai
            .wander
            .map_or(true, |leg| leg.dx == 0 && leg.dy == 0);
        if exhausted {
            let legs = [
                (WANDER_LEG_PX, 0),
                (-WANDER_LEG_PX, 0),
                (0, WANDER_LEG_PX),
                (0, -WANDER_LEG_PX),
            ];
            let (dx, dy) = legs[self.rng.pick_index(legs.len())];
            mob.ai.wander = Some(WanderLeg { dx, dy });
        }
        let Some(leg) = mob.ai.wander.as_mut() else {
            return;
        };
        if leg.dx != 0 {
            let step = leg.dx.signum();
            leg.dx -= step;
            mob.body.try_move(step, 0, &self.map, &obstacles);
            mob.body.facing = if step > 0 { Facing::Right } else { Facing::Left };
        } else if leg.dy != 0 {
            let step = leg.dy.signum();
            leg.dy -= step;
            mob.body.try_move(0, step, &self.map, &obstacles);
            mob.body.facing = if step > 0 { Facing::Down } else { Facing::Up };
        }
    }

    /// Accelerated random legs. Directions whose leg destination would park
    /// the whole foot row on Abyss/Trap are excluded from the roll.
    fn act_scurry(&mut self, mob_id: EntityId) {
        let obstacles = self.breakable_rects();
        let Some(mob) = self.mobs.iter_mut().find(|mob| mob.body.id == mob_id) else {
            return;
        };
        let exhausted = mob.ai.scurry.map_or(true, |leg| leg.remaining <= 0.0);
        if exhausted {
            let mut safe = Vec::with_capacity(4);
            for dir in [Facing::Up, Facing::Down, Facing::Left, Facing::Right] {
                let (sx, sy) = dir.step();
                let mut probe = mob.body.clone();
                probe.posx += sx * SCURRY_LEG_PX as i32;
                probe.posy += sy * SCURRY_LEG_PX as i32;
                let (abyss, trap) = probe.foot_hazard(&self.map);
                if !abyss && !trap {
                    safe.push(dir);
                }
            }
            if safe.is_empty() {
                return;
            }
            let dir = safe[self.rng.pick_index(safe.len())];
            mob.ai.scurry = Some(ScurryLeg {
                dir,
                remaining: SCURRY_LEG_PX,
            });
        }
        let Some(leg) = mob.ai.scurry else {
            return;
        };
        let (ux, uy) = leg.dir.unit();
        let cap = mob.stats.speed;
        let accel = mob.stats.accel;
        mob.body.velx = if ux != 0.0 {
            (mob.body.velx + ux * accel).clamp(-cap, cap)
        } else {
            mob.body.velx * IDLE_AXIS_DAMPING
        };
        mob.body.vely = if uy != 0.0 {
            (mob.body.vely + uy * accel).clamp(-cap, cap)
        } else {
            mob.body.vely * IDLE_AXIS_DAMPING
        };
        mob.body.dec_posx += mob.body.velx;
        mob.body.dec_posy += mob.body.vely;
        let step_x = mob.body.dec_posx.round();
        let step_y = mob.body.dec_posy.round();
        mob.body.dec_posx -= step_x;
        mob.body.dec_posy -= step_y;
        mob.body
            .try_move(step_x as i32, step_y as i32, &self.map, &obstacles);
        mob.body.facing = leg.dir;
        if let Some(leg) = mob.ai.scurry.as_mut() {
            leg.remaining -= step_x.abs() + step_y.abs();
        }
    }

    /// Nearest-player pursuit: direct steering with diagonal shaping inside
    /// the aggro radius; after stalling against geometry, fall back to an
    /// A* path consumed waypoint by waypoint.
    fn act_pursue(&mut self, mob_id: EntityId) {
        let Some(i) = self.mobs.iter().position(|mob| mob.body.id == mob_id) else {
            return;
        };
        let center = self.mobs[i].body.center();
        let Some((target_id, target_center, dist)) = self.nearest_player(center) else {
            self.mobs[i].ai.aggro = None;
            return;
        };
        if dist > AGGRO_RADIUS_PX {
            self.mobs[i].ai.aggro = None;
            return;
        }
        if dist <= AGGRO_CLOSE_PX {
            if let Some(aggro) = self.mobs[i].ai.aggro.as_mut() {
                aggro.path.clear();
            }
            return;
        }

        let pos = (self.mobs[i].body.posx, self.mobs[i].body.posy);
        let target_px = (target_center.0 as i32, target_center.1 as i32);
        {
            let ai = &mut self.mobs[i].ai;
            if ai.last_pos == Some(pos) {
                ai.stall_frames += 1;
            } else {
                ai.stall_frames = 0;
                ai.last_pos = Some(pos);
            }
            match ai.aggro.as_mut() {
                Some(aggro) => {
                    aggro.target = target_id;
                    aggro.last_known = target_px;
                }
                None => {
                    ai.aggro = Some(AggroState {
                        target: target_id,
                        last_known: target_px,
                        path: Vec::new(),
                    });
                }
            }
        }

        let stalled = self.mobs[i].ai.stall_frames > AGGRO_STALL_FRAMES;
        let path_empty = self.mobs[i]
            .ai
            .aggro
            .as_ref()
            .is_none_or(|aggro| aggro.path.is_empty());
        if stalled && path_empty {
            let (sizex, sizey) = (self.mobs[i].body.sizex, self.mobs[i].body.sizey);
            if let Some(path) = find_path(&self.map, pos, target_px, sizex, sizey) {
                if let Some(aggro) = self.mobs[i].ai.aggro.as_mut() {
                    aggro.path = path;
                }
                self.mobs[i].ai.stall_frames = 0;
            }
        }

        // A detour is only followed while the straight line to the player
        // stays blocked; once it reopens the path is dropped.
        let has_path = self.mobs[i]
            .ai
            .aggro
            .as_ref()
            .is_some_and(|aggro| !aggro.path.is_empty());
        if has_path {
            let (sizex, sizey) = (self.mobs[i].body.sizex, self.mobs[i].body.sizey);
            let obstacles = self.breakable_rects();
            let goal = (target_px.0 - sizex / 2, target_px.1 - sizey / 2);
            if line_clear(&self.map, &obstacles, pos, goal, sizex, sizey) {
                if let Some(aggro) = self.mobs[i].ai.aggro.as_mut() {
                    aggro.path.clear();
                }
            }
        }

        let waypoint = self.mobs[i]
            .ai
            .aggro
            .as_ref()
            .and_then(|aggro| aggro.path.first().copied());
        let (nx, ny) = match waypoint {
            Some(wp) => {
                let dx = (wp.0 - pos.0) as f32;
                let dy = (wp.1 - pos.1) as f32;
                let tol = PATH_WAYPOINT_TOLERANCE_PX as f32;
                if dx.abs() <= tol && dy.abs() <= tol {
                    if let Some(aggro) = self.mobs[i].ai.aggro.as_mut() {
                        aggro.path.remove(0);
                    }
                    return;
                }
                normalize(dx, dy)
            }
            None => {
                let dx = target_center.0 - center.0;
                let dy = target_center.1 - center.1;
                let (mut sx, mut sy) = (dx, dy);
                if dx.abs() > AGGRO_DOMINANT_AXIS_RATIO * dy.abs() {
                    sy *= AGGRO_MINOR_AXIS_SCALE;
                } else if dy.abs() > AGGRO_DOMINANT_AXIS_RATIO * dx.abs() {
                    sx *= AGGRO_MINOR_AXIS_SCALE;
                }
                normalize(sx, sy)
            }
        };

        let obstacles = self.breakable_rects();
        let mob = &mut self.mobs[i];
        let speed = mob.stats.speed;
        mob.body.velx = nx * speed;
        mob.body.vely = ny * speed;
        mob.body.dec_posx += mob.body.velx;
        mob.body.dec_posy += mob.body.vely;
        let step_x = mob.body.dec_posx.round();
        let step_y = mob.body.dec_posy.round();
        mob.body.dec_posx -= step_x;
        mob.body.dec_posy -= step_y;
        // Per-axis steps so one blocked axis cannot pin the other against a
        // wall corner.
        mob.body.try_move(step_x as i32, 0, &self.map, &obstacles);
        mob.body.try_move(0, step_y as i32, &self.map, &obstacles);
        mob.body.facing = facing_from_vector(nx, ny);
    }

    /// Unit direction toward the nearest player inside the aggro radius,
    /// or the mob's facing when nobody is close enough.
    fn aim_dir(&self, i: usize) -> (f32, f32) {
        let center = self.mobs[i].body.center();
        match self.nearest_player(center) {
            Some((_, target, dist)) if dist <= AGGRO_RADIUS_PX => {
                normalize(target.0 - center.0, target.1 - center.1)
            }
            _ => self.mobs[i].body.facing.unit(),
        }
    }

    fn fire_projectile_from(&mut self, i: usize, def_id: u32, dir: (f32, f32), now_ms: u64) {
        let def = self.defs.projectile(def_id);
        let (cx, cy) = self.mobs[i].body.center();
        let damage = self.mobs[i].stats.damage * def.damage;
        let owner_id = self.mobs[i].body.id;
        let x = cx as i32 - def.sizex / 2;
        let y = cy as i32 - def.sizey / 2;
        self.spawn_projectile(def_id, owner_id, EntityKind::Mob, x, y, dir.0, dir.1, damage);
        self.mobs[i].attacking_until_ms = now_ms + ATTACK_ANIM_MS;
    }

    fn act_shot(&mut self, mob_id: EntityId, def_id: u32, now_ms: u64) {
        let Some(i) = self.mobs.iter().position(|mob| mob.body.id == mob_id) else {
            return;
        };
        let dir = self.aim_dir(i);
        self.fire_projectile_from(i, def_id, dir, now_ms);
    }

    /// Channeled burst: shots at `window / totalShots` intervals, then a
    /// restart cooldown. Partial progress persists across ticks.
    fn act_laser(&mut self, mob_id: EntityId, now_ms: u64) {
        let Some(i) = self.mobs.iter().position(|mob| mob.body.id == mob_id) else {
            return;
        };
        if !self.mobs[i].ai.laser.channeling {
            if now_ms < self.mobs[i].ai.laser.cooldown_until_ms {
                return;
            }
            let state = &mut self.mobs[i].ai.laser;
            state.channeling = true;
            state.shots_fired = 0;
            state.next_fire_ms = now_ms;
        }
        let interval = LASER_WINDOW_MS / LASER_TOTAL_SHOTS as u64;
        if now_ms >= self.mobs[i].ai.laser.next_fire_ms
            && self.mobs[i].ai.laser.shots_fired < LASER_TOTAL_SHOTS
        {
            let dir = self.aim_dir(i);
            self.fire_projectile_from(i, PRJ_DEF_LASER, dir, now_ms);
            let state = &mut self.mobs[i].ai.laser;
            state.shots_fired += 1;
            state.next_fire_ms += interval;
        }
        let state = &mut self.mobs[i].ai.laser;
        if state.shots_fired >= LASER_TOTAL_SHOTS {
            state.channeling = false;
            state.cooldown_until_ms = now_ms + LASER_COOLDOWN_MS;
        }
    }

    /// Three pulses two seconds apart, every 3rd of 36 directions with a
    /// per-pulse phase offset, then a 30s cooldown around the sequence.
    fn act_ring(&mut self, mob_id: EntityId, now_ms: u64) {
        let Some(i) = self.mobs.iter().position(|mob| mob.body.id == mob_id) else {
            return;
        };
        if !self.mobs[i].ai.ring.in_sequence {
            if now_ms < self.mobs[i].ai.ring.cooldown_until_ms {
                return;
            }
            let state = &mut self.mobs[i].ai.ring;
            state.in_sequence = true;
            state.pulses_fired = 0;
            state.next_pulse_ms = now_ms;
        }
        if now_ms >= self.mobs[i].ai.ring.next_pulse_ms
            && self.mobs[i].ai.ring.pulses_fired < RING_PULSES
        {
            let pulse = self.mobs[i].ai.ring.pulses_fired;
            for k in (0..RING_DIRECTIONS).step_by(RING_DIRECTION_STRIDE as usize) {
                let index = (k + pulse) % RING_DIRECTIONS;
                let angle = index as f32 * std::f32::consts::TAU / RING_DIRECTIONS as f32;
                self.fire_projectile_from(i, PRJ_DEF_RING, (angle.cos(), angle.sin()), now_ms);
            }
            let state = &mut self.mobs[i].ai.ring;
            state.pulses_fired += 1;
            state.next_pulse_ms += RING_PULSE_GAP_MS;
        }
        let state = &mut self.mobs[i].ai.ring;
        if state.pulses_fired >= RING_PULSES {
            state.in_sequence = false;
            state.cooldown_until_ms = now_ms + RING_SEQUENCE_COOLDOWN_MS;
        }
    }

    fn act_face_anim(&mut self, mob_id: EntityId) {
        if let Some(mob) = self.mob_mut(mob_id) {
            match mob.body.facing {
                Facing::Left => mob.body.anim = 1,
                Facing::Right => mob.body.anim = 0,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::constants::TICK_MS;
    use crate::map::TileMap;

    fn spawned_since(world: &mut GameWorld, marker: EntityId) -> u64 {
        let probe = world.spawn_item(0, 0, 0);
        probe.0 - marker.0 - 1
    }

    #[test]
    fn wander_walks_one_full_cardinal_leg() {
        let mut world = test_world(open_map(20, 20));
        let id = world.spawn_mob(DEF_STATIC, 320, 320);
        for _ in 0..WANDER_LEG_PX {
            world.perform_action(id, crate::behavior::ActionKind::Wander, world.now_ms());
        }
        let mob = world.mob(id).unwrap();
        let dx = (mob.body.posx - 320).abs();
        let dy = (mob.body.posy - 320).abs();
        assert_eq!(dx + dy, WANDER_LEG_PX);
        assert!(dx == 0 || dy == 0, "leg must stay cardinal");
    }

    #[test]
    fn wander_reuses_leg_until_exhausted() {
        let mut world = test_world(open_map(20, 20));
        let id = world.spawn_mob(DEF_STATIC, 320, 320);
        world.perform_action(id, crate::behavior::ActionKind::Wander, world.now_ms());
        let leg = world.mob(id).unwrap().ai.wander.unwrap();
        assert_eq!((leg.dx.abs() + leg.dy.abs()), WANDER_LEG_PX - 1);
    }

    #[test]
    fn scurry_avoids_legs_ending_on_hazards() {
        let mut map = open_map(6, 6);
        // Only the rightward leg destination stays safe.
        map.set_tile(0, 2, 1, '~');
        map.set_tile(0, 2, 3, '~');
        map.set_tile(0, 1, 2, '~');
        let mut world = test_world(map);
        let id = world.spawn_mob(DEF_RAT, 64, 64);
        for _ in 0..16 {
            world.perform_action(id, crate::behavior::ActionKind::Scurry, world.now_ms());
        }
        let mob = world.mob(id).unwrap();
        assert!(mob.body.posx > 64, "only safe leg goes right");
        assert_eq!(mob.body.facing, Facing::Right);
    }

    #[test]
    fn scurry_accelerates_toward_speed_cap() {
        let mut world = test_world(open_map(20, 20));
        let id = world.spawn_mob(DEF_RAT, 320, 320);
        world.perform_action(id, crate::behavior::ActionKind::Scurry, world.now_ms());
        let after_one = world
            .mob(id)
            .unwrap()
            .body
            .velx
            .abs()
            .max(world.mob(id).unwrap().body.vely.abs());
        assert_eq!(after_one, 0.4);
        for _ in 0..10 {
            world.perform_action(id, crate::behavior::ActionKind::Scurry, world.now_ms());
        }
        let mob = world.mob(id).unwrap();
        let speed = mob.body.velx.abs().max(mob.body.vely.abs());
        assert!(speed <= mob.stats.speed + f32::EPSILON);
    }

    #[test]
    fn pursue_closes_on_player_and_stops_at_contact_range() {
        let mut world = test_world(open_map(20, 20));
        let mob = world.spawn_mob(DEF_RAT, 96, 96);
        world.spawn_player(256, 96, player_stats());
        for _ in 0..200 {
            world.perform_action(mob, crate::behavior::ActionKind::Pursue, world.now_ms());
        }
        let mob = world.mob(mob).unwrap();
        let (mx, my) = mob.body.center();
        let dist = ((mx - 272.0).powi(2) + (my - 112.0).powi(2)).sqrt();
        assert!(dist <= AGGRO_CLOSE_PX + 2.0, "distance was {dist}");
    }

    #[test]
    fn pursue_drops_aggro_outside_radius() {
        let mut world = test_world(open_map(40, 40));
        let mob = world.spawn_mob(DEF_RAT, 32, 32);
        world.spawn_player(1_000, 1_000, player_stats());
        world.perform_action(mob, crate::behavior::ActionKind::Pursue, world.now_ms());
        let mob = world.mob(mob).unwrap();
        assert!(mob.ai.aggro.is_none());
        assert_eq!((mob.body.posx, mob.body.posy), (32, 32));
    }

    #[test]
    fn pursue_falls_back_to_pathfinding_after_stalling() {
        let map = TileMap::from_rows(&[
            ".......", //
            "...#...", //
            "...#...", //
            "...#...", //
            ".......",
        ]);
        let mut world = test_world(map);
        let mob = world.spawn_mob(DEF_RAT, 32, 64);
        world.spawn_player(160, 64, player_stats());
        let mut detoured = false;
        for _ in 0..400 {
            world.perform_action(mob, crate::behavior::ActionKind::Pursue, world.now_ms());
            if let Some(m) = world.mob(mob) {
                if m.body.posy != 64 {
                    detoured = true;
                }
            }
        }
        assert!(detoured, "mob never left the blocked row");
        let mob = world.mob(mob).unwrap();
        let (mx, my) = mob.body.center();
        let dist = ((mx - 176.0).powi(2) + (my - 80.0).powi(2)).sqrt();
        assert!(dist <= AGGRO_CLOSE_PX + 2.0, "distance was {dist}");
    }

    #[test]
    fn pursue_drops_a_stale_path_once_the_direct_line_reopens() {
        let mut world = test_world(open_map(20, 20));
        let mob = world.spawn_mob(DEF_RAT, 96, 96);
        world.spawn_player(256, 96, player_stats());
        world.perform_action(mob, crate::behavior::ActionKind::Pursue, world.now_ms());
        // Plant a leftover detour pointing the wrong way on an open map.
        world.mob_mut(mob).unwrap().ai.aggro.as_mut().unwrap().path = vec![(96, 256), (256, 96)];
        world.perform_action(mob, crate::behavior::ActionKind::Pursue, world.now_ms());
        let mob = world.mob(mob).unwrap();
        assert!(mob.ai.aggro.as_ref().unwrap().path.is_empty());
        // Direct steering resumed toward the player instead of the detour.
        assert!(mob.body.posx > 96);
        assert_eq!(mob.body.posy, 96);
    }

    #[test]
    fn shot_actions_scale_damage_by_attacker() {
        let mut world = test_world(open_map(20, 20));
        let mob = world.spawn_mob(DEF_RAT, 96, 96);
        world.spawn_player(200, 96, player_stats());
        world.perform_action(mob, crate::behavior::ActionKind::Bite, world.now_ms());
        assert_eq!(world.projectiles.len(), 1);
        let projectile = &world.projectiles[0];
        // rat damage 2.0 x bite base 1.5
        assert_eq!(projectile.damage, 3.0);
        assert_eq!(projectile.owner_id, world.mobs[0].body.id);
        assert!(projectile.dirx > 0.99);
        assert!(world.mobs[0].attacking_until_ms > 0);
    }

    #[test]
    fn laser_fires_all_shots_at_uniform_intervals_then_cools_down() {
        let mut world = test_world(open_map(20, 20));
        let mob = world.spawn_mob(DEF_BOSS, 96, 96);
        world.spawn_player(300, 96, player_stats());
        let marker = world.spawn_item(0, 0, 0);
        let start = world.now_ms();
        let mut fired_at: Vec<u64> = Vec::new();
        let mut elapsed = 0u64;
        let mut last_count = 0;
        while elapsed <= LASER_WINDOW_MS + 200 {
            world.perform_action(mob, crate::behavior::ActionKind::LaserBurst, start + elapsed);
            let count = world.projectiles.len();
            if count > last_count {
                fired_at.push(elapsed);
                last_count = count;
            }
            elapsed += TICK_MS;
        }
        assert_eq!(fired_at.len() as u32, LASER_TOTAL_SHOTS);
        assert!(world.projectiles.iter().all(|p| p.def_id == PRJ_LASER));
        let interval = LASER_WINDOW_MS / LASER_TOTAL_SHOTS as u64;
        for (n, at) in fired_at.iter().enumerate() {
            let expected = n as u64 * interval;
            assert!(at.abs_diff(expected) < TICK_MS * 2, "shot {n} at {at}");
        }
        let state = world.mob(mob).unwrap().ai.laser;
        assert!(!state.channeling);
        assert!(state.cooldown_until_ms > start + LASER_WINDOW_MS);
        // Cooldown blocks an immediate restart.
        world.perform_action(mob, crate::behavior::ActionKind::LaserBurst, start + elapsed);
        assert_eq!(spawned_since(&mut world, marker) as u32, LASER_TOTAL_SHOTS);
    }

    #[test]
    fn ring_covers_all_directions_over_three_pulses() {
        let mut world = test_world(open_map(20, 20));
        let mob = world.spawn_mob(DEF_BOSS, 320, 320);
        let start = world.now_ms();
        world.perform_action(mob, crate::behavior::ActionKind::RingBurst, start);
        let per_pulse = (RING_DIRECTIONS / RING_DIRECTION_STRIDE) as usize;
        assert_eq!(world.projectiles.len(), per_pulse);
        assert_eq!(world.projectiles[0].def_id, PRJ_RING);
        // Second pulse only after the gap.
        world.perform_action(mob, crate::behavior::ActionKind::RingBurst, start + 100);
        assert_eq!(world.projectiles.len(), per_pulse);
        world.perform_action(
            mob,
            crate::behavior::ActionKind::RingBurst,
            start + RING_PULSE_GAP_MS,
        );
        assert_eq!(world.projectiles.len(), per_pulse * 2);
        world.perform_action(
            mob,
            crate::behavior::ActionKind::RingBurst,
            start + 2 * RING_PULSE_GAP_MS,
        );
        assert_eq!(world.projectiles.len(), per_pulse * 3);
        let state = world.mob(mob).unwrap().ai.ring;
        assert!(!state.in_sequence);
        assert_eq!(
            state.cooldown_until_ms,
            start + 2 * RING_PULSE_GAP_MS + RING_SEQUENCE_COOLDOWN_MS
        );
        // Pulses are phase-offset: first directions of pulse 0 and 1 differ.
        let first = &world.projectiles[0];
        let second = &world.projectiles[per_pulse];
        assert!(first.dirx != second.dirx || first.diry != second.diry);
    }

    #[test]
    fn face_anim_tracks_horizontal_facing() {
        let mut world = test_world(open_map(6, 6));
        let id = world.spawn_mob(DEF_STATIC, 32, 32);
        world.mob_mut(id).unwrap().body.facing = Facing::Left;
        world.perform_action(id, crate::behavior::ActionKind::FaceAnim, world.now_ms());
        assert_eq!(world.mob(id).unwrap().body.anim, 1);
        world.mob_mut(id).unwrap().body.facing = Facing::Right;
        world.perform_action(id, crate::behavior::ActionKind::FaceAnim, world.now_ms());
        assert_eq!(world.mob(id).unwrap().body.anim, 0);
    }
}
