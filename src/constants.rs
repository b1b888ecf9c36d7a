pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;
pub const TICK_SECS: f32 = 1.0 / TICK_RATE as f32;

pub const TILE_SIZE: i32 = 32;

pub const ABYSS_DAMAGE_RATIO: f32 = 0.1;
pub const TRAP_DAMAGE_PER_SEC: f32 = 10.0;

pub const FLASH_DURATION_SECS: f32 = 0.8;
pub const FLASH_BLINK_INTERVAL_SECS: f32 = 0.2;
pub const FLASH_MAX_BLINKS: u32 = 4;

pub const DASH_COOLDOWN_MS: u64 = 1_000;
pub const DASH_SPEED_MULTIPLIER: f32 = 2.0;
pub const DASH_EFFECT_TICKS: u32 = 30;
pub const DIAGONAL_FACTOR: f32 = 0.7071;
pub const IDLE_AXIS_DAMPING: f32 = 0.75;

pub const WANDER_LEG_PX: i32 = 32;
pub const SCURRY_LEG_PX: f32 = 32.0;

pub const AGGRO_RADIUS_PX: f32 = 300.0;
pub const AGGRO_CLOSE_PX: f32 = 24.0;
pub const AGGRO_STALL_FRAMES: u32 = 15;
pub const AGGRO_DOMINANT_AXIS_RATIO: f32 = 2.0;
pub const AGGRO_MINOR_AXIS_SCALE: f32 = 0.5;

pub const PATH_CELL_PX: i32 = 32;
pub const PATH_ITERATION_CAP: u32 = 2_000;
pub const PATH_WAYPOINT_TOLERANCE_PX: i32 = PATH_CELL_PX / 2;

pub const ATTACK_ANIM_MS: u64 = 300;

// Well-known projectile definition ids the attack actions reference.
pub const PRJ_DEF_BITE: u32 = 1;
pub const PRJ_DEF_NOTE: u32 = 2;
pub const PRJ_DEF_LASER: u32 = 3;
pub const PRJ_DEF_RING: u32 = 4;

pub const LASER_WINDOW_MS: u64 = 3_000;
pub const LASER_TOTAL_SHOTS: u32 = 10;
pub const LASER_COOLDOWN_MS: u64 = 5_000;

pub const RING_PULSES: u32 = 3;
pub const RING_PULSE_GAP_MS: u64 = 2_000;
pub const RING_DIRECTIONS: u32 = 36;
pub const RING_DIRECTION_STRIDE: u32 = 3;
pub const RING_SEQUENCE_COOLDOWN_MS: u64 = 30_000;

pub const SPAWN_GRID_COLUMNS: u32 = 3;
pub const SPAWN_GRID_STEP_PX: i32 = 32;

pub const HP_THRESHOLD_STEPS: [u32; 6] = [10, 25, 30, 50, 75, 90];
pub const TIMER_CONDITION_SECS: [u64; 4] = [2, 4, 5, 30];

pub fn spawn_grid_offset(index: u32) -> (i32, i32) {
    let col = (index % SPAWN_GRID_COLUMNS) as i32;
    let row = (index / SPAWN_GRID_COLUMNS) as i32;
    (col * SPAWN_GRID_STEP_PX, row * SPAWN_GRID_STEP_PX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_grid_wraps_after_three_columns() {
        assert_eq!(spawn_grid_offset(0), (0, 0));
        assert_eq!(spawn_grid_offset(2), (64, 0));
        assert_eq!(spawn_grid_offset(3), (0, 32));
        assert_eq!(spawn_grid_offset(7), (32, 64));
    }
}
