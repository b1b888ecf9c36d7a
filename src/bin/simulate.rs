use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tilerpg_sim_server::behavior::tree_from_json;
use tilerpg_sim_server::constants::{
    PRJ_DEF_BITE, PRJ_DEF_LASER, PRJ_DEF_NOTE, PRJ_DEF_RING, TICK_MS,
};
use tilerpg_sim_server::defs::{BreakableDef, Definitions, MobDef, ProjectileDef};
use tilerpg_sim_server::engine::{
    EventAction, EventCondition, GameEvent, GameWorld, RaidSpec, WallRegion, WorldOptions,
};
use tilerpg_sim_server::entity::{Motion, Stats};
use tilerpg_sim_server::map::TileMap;
use tilerpg_sim_server::types::{MoveDir, RuntimeEvent, Snapshot};
use tracing_subscriber::EnvFilter;

const MOB_RAT: u32 = 1;
const MOB_BAT: u32 = 2;
const MOB_BARD: u32 = 3;
const BRK_GATE: u32 = 1;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Run only the named scenario instead of the full sweep.
    #[arg(long)]
    scenario: Option<String>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ScenarioKind {
    WanderField,
    BossBard,
    RaidGate,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    kind: ScenarioKind,
    ticks: u64,
    seed: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    #[serde(rename = "ticksRun")]
    ticks_run: u64,
    #[serde(rename = "mobsSpawned")]
    mobs_spawned: i32,
    #[serde(rename = "mobsDied")]
    mobs_died: i32,
    #[serde(rename = "playersDied")]
    players_died: i32,
    #[serde(rename = "projectilesFizzled")]
    projectiles_fizzled: i32,
    #[serde(rename = "raidWaves")]
    raid_waves: i32,
    #[serde(rename = "raidsFinished")]
    raids_finished: i32,
    #[serde(rename = "eventsFired")]
    events_fired: i32,
    chats: i32,
    #[serde(rename = "finalMobCount")]
    final_mob_count: usize,
    #[serde(rename = "finalPlayerHp")]
    final_player_hp: Option<f32>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "totalMobsDied")]
    total_mobs_died: i32,
    #[serde(rename = "mobsDiedByScenario")]
    mobs_died_by_scenario: BTreeMap<String, i32>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut mobs_died_by_scenario: BTreeMap<String, i32> = BTreeMap::new();
    let mut total_mobs_died = 0;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "kind": scenario.kind,
                "ticks": scenario.ticks,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_mobs_died += scenario_run.result.mobs_died;
        mobs_died_by_scenario.insert(scenario.name.clone(), scenario_run.result.mobs_died);

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "mobsDied": scenario_run.result.mobs_died,
                "raidWaves": scenario_run.result.raid_waves,
                "finalPlayerHp": scenario_run.result.final_player_hp,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        mobs_died_by_scenario,
        total_mobs_died,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "totalMobsDied": summary.total_mobs_died,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut world = build_world(scenario);
    let player = world.spawn_player(64, 64, demo_player_stats());

    let mut mobs_spawned = 0;
    let mut mobs_died = 0;
    let mut players_died = 0;
    let mut projectiles_fizzled = 0;
    let mut raid_waves = 0;
    let mut raids_finished = 0;
    let mut events_fired = 0;
    let mut chats = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;

    for tick in 0..scenario.ticks {
        world.set_player_intent(player, Some(scripted_intent(tick)));
        if tick % 300 == 150 {
            world.player_dash(player);
        }
        world.step(TICK_MS);
        let snapshot = world.build_snapshot(true);
        last_tick = snapshot.tick;

        for message in collect_snapshot_anomalies(&snapshot, &world.map) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::MobSpawned { .. } => mobs_spawned += 1,
                RuntimeEvent::MobDied { .. } => mobs_died += 1,
                RuntimeEvent::PlayerDied { .. } => players_died += 1,
                RuntimeEvent::ProjectileFizzled { .. } => projectiles_fizzled += 1,
                RuntimeEvent::RaidWaveStarted { .. } => raid_waves += 1,
                RuntimeEvent::RaidFinished => raids_finished += 1,
                RuntimeEvent::EventFired { .. } => events_fired += 1,
                RuntimeEvent::Chat { .. } => chats += 1,
                _ => {}
            }
        }

        if snapshot.players.is_empty() {
            break;
        }
    }

    let final_player_hp = world.player(player).map(|p| p.stats.hp);
    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            ticks_run: last_tick,
            mobs_spawned,
            mobs_died,
            players_died,
            projectiles_fizzled,
            raid_waves,
            raids_finished,
            events_fired,
            chats,
            final_mob_count: world.mobs.len(),
            final_player_hp,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, map: &TileMap) -> Vec<String> {
    let mut anomalies = Vec::new();
    let width_px = map.width_px();
    let height_px = map.height_px();

    for player in &snapshot.players {
        if player.hp < 0.0 || player.hp > player.max_hp {
            anomalies.push(format!(
                "player hp out of range: {:?} {}/{}",
                player.id, player.hp, player.max_hp
            ));
        }
    }

    for mob in &snapshot.mobs {
        if mob.max_hp > 0.0 && (mob.hp < 0.0 || mob.hp > mob.max_hp) {
            anomalies.push(format!(
                "mob hp out of range: {:?} {}/{}",
                mob.id, mob.hp, mob.max_hp
            ));
        }
        // Foot-row collision tolerates a head poking past the top edge.
        if mob.x < -32 || mob.x > width_px + 32 || mob.y < -32 || mob.y > height_px + 32 {
            anomalies.push(format!("mob escaped the map: {:?} ({}, {})", mob.id, mob.x, mob.y));
        }
    }

    if snapshot.projectiles.len() > 512 {
        anomalies.push(format!(
            "projectile runaway: {} live",
            snapshot.projectiles.len()
        ));
    }
    if snapshot.mobs.len() > 256 {
        anomalies.push(format!("mob runaway: {} live", snapshot.mobs.len()));
    }
    anomalies
}

/// Four-leg patrol square, one leg per 90 ticks.
fn scripted_intent(tick: u64) -> MoveDir {
    match (tick / 90) % 4 {
        0 => MoveDir::Right,
        1 => MoveDir::Down,
        2 => MoveDir::Left,
        _ => MoveDir::Up,
    }
}

fn demo_player_stats() -> Stats {
    Stats::new(100.0, 0.0, 50.0, 0.0, 50.0, 0.0, 5.0, 0.0, 1.0, 4.0, 1.0)
}

fn rat_tree_json() -> &'static str {
    concat!(
        r#"[["structure","selector"],"#,
        r#"["structure","sequence"],["condition","player-within-300"],"#,
        r#"["block_start"],["action","pursue"],["action","bite"],["block_end"],"#,
        r#"["block_start"],["action","wander"],["block_end"]]"#,
    )
}

fn bat_tree_json() -> &'static str {
    r#"[["action","scurry"]]"#
}

fn bard_tree_json() -> &'static str {
    concat!(
        r#"[["structure","selector"],"#,
        r#"["structure","sequence"],["condition","hp-lower-50"],"#,
        r#"["block_start"],["action","ring-burst"],["block_end"],"#,
        r#"["block_start"],"#,
        r#"["structure","sequence"],["condition","player-within-300"],"#,
        r#"["block_start"],["action","laser-burst"],["block_end"],"#,
        r#"["action","music-note"],["block_end"]]"#,
    )
}

fn demo_defs() -> Definitions {
    let mut defs = Definitions::new();
    defs.insert_mob(
        MOB_RAT,
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
            behavior: Some(MOB_RAT),
        },
    );
    defs.insert_mob(
        MOB_BAT,
        MobDef {
            name: "bat".to_string(),
            max_hp: 14.0,
            regen_hp: 0.0,
            max_mana: 0.0,
            regen_mana: 0.0,
            max_stamina: 0.0,
            regen_stamina: 0.0,
            damage: 1.0,
            critical: 0.0,
            defense: 0.0,
            speed: 2.5,
            accel: 0.5,
            sizex: 32,
            sizey: 32,
            texture: 2,
            behavior: Some(MOB_BAT),
        },
    );
    defs.insert_mob(
        MOB_BARD,
        MobDef {
            name: "bard".to_string(),
            max_hp: 300.0,
            regen_hp: 0.0,
            max_mana: 100.0,
            regen_mana: 0.0,
            max_stamina: 0.0,
            regen_stamina: 0.0,
            damage: 5.0,
            critical: 0.0,
            defense: 2.0,
            speed: 1.2,
            accel: 0.3,
            sizex: 32,
            sizey: 32,
            texture: 3,
            behavior: Some(MOB_BARD),
        },
    );
    defs.insert_projectile(
        PRJ_DEF_BITE,
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
        PRJ_DEF_NOTE,
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
        PRJ_DEF_LASER,
        ProjectileDef {
            speed: 8.0,
            damage: 2.0,
            penetration: 1,
            sizex: 8,
            sizey: 8,
            lifetime_ticks: 40,
            motion: Motion::Linear,
            texture: 6,
        },
    );
    defs.insert_projectile(
        PRJ_DEF_RING,
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
            texture: 7,
        },
    );
    defs.insert_breakable(
        BRK_GATE,
        BreakableDef {
            sizex: 32,
            sizey: 32,
            durability: 20.0,
            texture: 8,
        },
    );
    defs.insert_behavior(
        MOB_RAT,
        tree_from_json(rat_tree_json()).expect("rat behavior should build"),
    );
    defs.insert_behavior(
        MOB_BAT,
        tree_from_json(bat_tree_json()).expect("bat behavior should build"),
    );
    defs.insert_behavior(
        MOB_BARD,
        tree_from_json(bard_tree_json()).expect("bard behavior should build"),
    );
    defs
}

fn demo_map(kind: ScenarioKind) -> TileMap {
    match kind {
        ScenarioKind::WanderField => TileMap::from_rows(&[
            "####################",
            "#..................#",
            "#..................#",
            "#...~~.............#",
            "#...~~.............#",
            "#..........^^......#",
            "#..........^^......#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "####################",
        ]),
        ScenarioKind::BossBard => TileMap::from_rows(&[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#.......##.........#",
            "#.......##.........#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "####################",
        ]),
        ScenarioKind::RaidGate => TileMap::from_rows(&[
            "####################",
            "#........#.........#",
            "#........#.........#",
            "#..................#",
            "#........#.........#",
            "#........#.........#",
            "#........#.........#",
            "#........#.........#",
            "#........#.........#",
            "#........#.........#",
            "#........#.........#",
            "####################",
        ]),
    }
}

fn build_world(scenario: &Scenario) -> GameWorld {
    let mut world = GameWorld::new(
        demo_map(scenario.kind),
        demo_defs(),
        WorldOptions {
            seed: scenario.seed,
            started_at_ms: None,
        },
    );

    match scenario.kind {
        ScenarioKind::WanderField => {
            for i in 0..6 {
                world.spawn_mob(MOB_RAT, 224 + (i % 3) * 64, 96 + (i / 3) * 96);
            }
            world.spawn_mob(MOB_BAT, 480, 160);
            world.spawn_mob(MOB_BAT, 480, 256);
            world.events.push(GameEvent::new(
                "village-crier",
                EventCondition::Always,
                EventAction::Chat {
                    message: "stay clear of the chasm".to_string(),
                },
                10_000,
                true,
            ));
            world.events.push(GameEvent::new(
                "repopulate",
                EventCondition::MobCountAtMost(2),
                EventAction::SpawnMobs {
                    def_id: MOB_RAT,
                    count: 3,
                    x: 352,
                    y: 128,
                },
                5_000,
                true,
            ));
        }
        ScenarioKind::BossBard => {
            world.spawn_mob(MOB_BARD, 448, 160);
            for i in 0..3 {
                world.spawn_mob(MOB_RAT, 320 + i * 64, 288);
            }
        }
        ScenarioKind::RaidGate => {
            world.events.push(GameEvent::new(
                "gatekeeper",
                EventCondition::PlayerNear {
                    x: 288,
                    y: 96,
                    radius_px: 128.0,
                },
                EventAction::LockRoomRaid {
                    walls: vec![WallRegion {
                        x: 288,
                        y: 96,
                        cols: 1,
                        rows: 1,
                        def_id: BRK_GATE,
                    }],
                    raids: vec![
                        RaidSpec {
                            x: 416,
                            y: 128,
                            mob_def: MOB_RAT,
                            count: 2,
                        },
                        RaidSpec {
                            x: 416,
                            y: 224,
                            mob_def: MOB_RAT,
                            count: 3,
                        },
                        RaidSpec {
                            x: 448,
                            y: 160,
                            mob_def: MOB_BARD,
                            count: 1,
                        },
                    ],
                },
                1_000,
                false,
            ));
        }
    }
    world
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let ticks = cli.ticks.unwrap_or(3_600).clamp(60, 60 * 60 * 10);
    let all = [
        ("wander-field", ScenarioKind::WanderField),
        ("boss-bard", ScenarioKind::BossBard),
        ("raid-gate", ScenarioKind::RaidGate),
    ];

    if let Some(name) = cli.scenario.as_deref() {
        let kind = all
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, kind)| *kind)
            .unwrap_or(ScenarioKind::WanderField);
        return vec![Scenario {
            name: name.to_string(),
            kind,
            ticks,
            seed,
        }];
    }

    all.iter()
        .enumerate()
        .map(|(offset, (name, kind))| Scenario {
            name: name.to_string(),
            kind: *kind,
            ticks,
            seed: normalize_seed(seed as u64 + offset as u64),
        })
        .collect()
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

#[allow(clippy::too_many_arguments)]
fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    mobs_died_by_scenario: BTreeMap<String, i32>,
    total_mobs_died: i32,
    anomaly_count: usize,
) -> RunSummary {
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count: scenarios.len(),
        anomaly_count,
        total_mobs_died,
        mobs_died_by_scenario,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_scenario_result(name: &str, mobs_died: i32) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: name.to_string(),
            seed: 42,
            ticks_run: 600,
            mobs_spawned: 8,
            mobs_died,
            players_died: 0,
            projectiles_fizzled: 3,
            raid_waves: 0,
            raids_finished: 0,
            events_fired: 1,
            chats: 1,
            final_mob_count: 5,
            final_player_hp: Some(88.0),
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_totals_scenarios() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result("wander-field", 3),
                make_scenario_result("boss-bard", 4),
            ],
            BTreeMap::from([
                ("wander-field".to_string(), 3),
                ("boss-bard".to_string(), 4),
            ]),
            7,
            1,
        );
        assert_eq!(summary.scenario_count, 2);
        assert_eq!(summary.total_mobs_died, 7);
        assert_eq!(summary.mobs_died_by_scenario["boss-bard"], 4);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("tilerpg-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result("wander-field", 0)],
            BTreeMap::new(),
            0,
            0,
        );
        let result = write_summary(&target, &summary);
        assert!(result.is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn scripted_intent_walks_a_square() {
        assert_eq!(scripted_intent(0), MoveDir::Right);
        assert_eq!(scripted_intent(90), MoveDir::Down);
        assert_eq!(scripted_intent(180), MoveDir::Left);
        assert_eq!(scripted_intent(270), MoveDir::Up);
        assert_eq!(scripted_intent(360), MoveDir::Right);
    }

    #[test]
    fn demo_behaviors_build_from_their_token_lists() {
        let defs = demo_defs();
        assert!(defs.behavior(MOB_RAT).is_some());
        assert!(defs.behavior(MOB_BAT).is_some());
        assert!(defs.behavior(MOB_BARD).is_some());
    }

    #[test]
    fn every_scenario_world_builds_and_steps() {
        for (name, kind) in [
            ("wander-field", ScenarioKind::WanderField),
            ("boss-bard", ScenarioKind::BossBard),
            ("raid-gate", ScenarioKind::RaidGate),
        ] {
            let scenario = Scenario {
                name: name.to_string(),
                kind,
                ticks: 30,
                seed: 7,
            };
            let run = run_scenario(&scenario);
            assert!(run.result.anomalies.is_empty(), "{name}: {:?}", run.result.anomalies);
        }
    }
}
