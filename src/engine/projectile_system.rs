use super::GameWorld;
use crate::entity::Motion;
use crate::types::{EntityId, EntityKind, RuntimeEvent};

impl GameWorld {
    /// Moves every projectile by its motion behavior, burns lifetime, then
    /// runs the mob-side collision scan. Projectiles spawned by AI earlier
    /// in the same tick are included: they move and can hit on their spawn
    /// tick.
    pub(super) fn tick_projectiles(&mut self) {
        let ids: Vec<EntityId> = self.projectiles.iter().map(|p| p.body.id).collect();
        for id in ids {
            let Some(prj) = self.projectiles.iter_mut().find(|p| p.body.id == id) else {
                continue;
            };
            prj.base_x += prj.dirx * prj.speed;
            prj.base_y += prj.diry * prj.speed;
            match prj.motion {
                Motion::Linear => {
                    prj.body.posx = prj.base_x as i32;
                    prj.body.posy = prj.base_y as i32;
                }
                Motion::Wave {
                    amplitude,
                    frequency,
                } => {
                    prj.phase += frequency;
                    let offset = prj.phase.sin() * amplitude;
                    // Offset runs perpendicular to the travel direction.
                    prj.body.posx = (prj.base_x - prj.diry * offset) as i32;
                    prj.body.posy = (prj.base_y + prj.dirx * offset) as i32;
                }
                Motion::Spiral { growth, rotation } => {
                    prj.radius += growth;
                    prj.phase += rotation;
                    prj.body.posx = (prj.base_x + prj.phase.cos() * prj.radius) as i32;
                    prj.body.posy = (prj.base_y + prj.phase.sin() * prj.radius) as i32;
                }
            }
            prj.lifetime_ticks -= 1;
            if prj.lifetime_ticks <= 0 {
                self.remove_projectile(id);
                self.push_event(RuntimeEvent::ProjectileFizzled { id });
                continue;
            }
            self.collide_with_mobs(id);
        }
    }

    /// AABB scan against live mobs in collection order. The owning mob is
    /// immune by identity+kind; already-hit targets are skipped, so a
    /// projectile with penetration left hits distinct mobs but never the
    /// same one twice.
    fn collide_with_mobs(&mut self, id: EntityId) {
        let Some(prj) = self.projectiles.iter().find(|p| p.body.id == id) else {
            return;
        };
        let rect = prj.body.rect();
        let owner_id = prj.owner_id;
        let owner_kind = prj.owner_kind;
        let hits: Vec<EntityId> = self
            .mobs
            .iter()
            .filter(|mob| !(owner_kind == EntityKind::Mob && mob.body.id == owner_id))
            .filter(|mob| !prj.already_hit.contains(&mob.body.id))
            .filter(|mob| rect.overlaps(&mob.body.rect()))
            .map(|mob| mob.body.id)
            .collect();

        for mob_id in hits {
            let Some(prj) = self.projectiles.iter_mut().find(|p| p.body.id == id) else {
                return;
            };
            if prj.penetration <= 0 {
                return;
            }
            prj.already_hit.push(mob_id);
            prj.penetration -= 1;
            let damage = prj.damage;
            let spent = prj.penetration <= 0;
            self.damage_mob(mob_id, damage);
            if spent {
                self.remove_projectile(id);
                return;
            }
        }
    }

    /// Player-side scan, run from the player pass. Dashing suppresses hits
    /// entirely; only mob-owned projectiles threaten players, and a hit on a
    /// player consumes the projectile outright, remaining penetration or not.
    pub(super) fn check_player_projectiles(&mut self, player_id: EntityId) {
        let Some(player) = self.player(player_id) else {
            return;
        };
        if player.dashing {
            return;
        }
        let rect = player.body.rect();
        let hits: Vec<(EntityId, f32)> = self
            .projectiles
            .iter()
            .filter(|p| p.owner_kind != EntityKind::Player)
            .filter(|p| p.body.rect().overlaps(&rect))
            .map(|p| (p.body.id, p.damage))
            .collect();

        for (prj_id, damage) in hits {
            self.damage_player(player_id, damage);
            self.remove_projectile(prj_id);
        }
    }
}
