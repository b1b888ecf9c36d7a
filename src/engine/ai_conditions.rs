use super::GameWorld;
use crate::behavior::ConditionKind;
use crate::types::EntityId;

impl GameWorld {
    pub(super) fn eval_condition(
        &mut self,
        mob_id: EntityId,
        kind: ConditionKind,
        now_ms: u64,
    ) -> bool {
        match kind {
            ConditionKind::Always => true,
            ConditionKind::Timer { millis } => self.check_timer(mob_id, millis, now_ms),
            ConditionKind::HpBelow { percent } => self
                .mob(mob_id)
                .and_then(|mob| mob.stats.hp_at_most_percent(percent))
                .unwrap_or(false),
            ConditionKind::HpAbove { percent } => self
                .mob(mob_id)
                .and_then(|mob| mob.stats.hp_at_least_percent(percent))
                .unwrap_or(false),
            ConditionKind::PlayerWithin { radius_px } => {
                let Some(mob) = self.mob(mob_id) else {
                    return false;
                };
                self.nearest_player(mob.body.center())
                    .is_some_and(|(_, _, dist)| dist <= radius_px as f32)
            }
        }
    }

    /// Monostable per-entity timer: fires once, stamps, and stays false
    /// until the threshold elapses again. A never-stamped timer fires on
    /// its first check.
    fn check_timer(&mut self, mob_id: EntityId, millis: u64, now_ms: u64) -> bool {
        let Some(mob) = self.mob_mut(mob_id) else {
            return false;
        };
        let last = mob.ai.timers.entry(millis).or_insert(0);
        if *last == 0 || now_ms.saturating_sub(*last) >= millis {
            *last = now_ms;
            return true;
        }
        false
    }

    pub(super) fn nearest_player(&self, from: (f32, f32)) -> Option<(EntityId, (f32, f32), f32)> {
        let mut best: Option<(EntityId, (f32, f32), f32)> = None;
        for player in &self.players {
            let center = player.body.center();
            let dist = ((center.0 - from.0).powi(2) + (center.1 - from.1).powi(2)).sqrt();
            if best.as_ref().is_none_or(|(_, _, d)| dist < *d) {
                best = Some((player.body.id, center, dist));
            }
        }
        best
    }
}
