use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::constants::{PATH_CELL_PX, PATH_ITERATION_CAP};
use crate::map::TileMap;
use crate::types::CollisionClass;

/// A cell admits an entity only when every pixel of its footprint, anchored
/// at the cell's pixel origin, is free of Wall/Abyss/Trap on both layers.
fn cell_walkable(map: &TileMap, cell: (i32, i32), sizex: i32, sizey: i32) -> bool {
    if cell.0 < 0 || cell.1 < 0 || cell.0 >= map.width_tiles() || cell.1 >= map.height_tiles() {
        return false;
    }
    let origin_x = cell.0 * PATH_CELL_PX;
    let origin_y = cell.1 * PATH_CELL_PX;
    for dy in 0..sizey {
        for dx in 0..sizex {
            for layer in 0..2 {
                match map.check_col(origin_x + dx, origin_y + dy, layer) {
                    Some(CollisionClass::Wall)
                    | Some(CollisionClass::Abyss)
                    | Some(CollisionClass::Trap) => return false,
                    _ => {}
                }
            }
        }
    }
    true
}

fn manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// Bounded A* over the quantized tile grid. 4-way, unit cost, Manhattan
/// heuristic, ties broken FIFO via an insertion counter in the heap key.
/// Returns pixel waypoints (cell centers adjusted for half-size), excluding
/// the start cell, or `None` when the goal is unreachable or the iteration
/// cap trips.
pub fn find_path(
    map: &TileMap,
    from_px: (i32, i32),
    to_px: (i32, i32),
    sizex: i32,
    sizey: i32,
) -> Option<Vec<(i32, i32)>> {
    let start = (from_px.0 / PATH_CELL_PX, from_px.1 / PATH_CELL_PX);
    let goal = (to_px.0 / PATH_CELL_PX, to_px.1 / PATH_CELL_PX);
    if !cell_walkable(map, goal, sizex, sizey) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut heap: BinaryHeap<Reverse<(i32, u32, (i32, i32))>> = BinaryHeap::new();
    let mut g_score: HashMap<(i32, i32), i32> = HashMap::new();
    let mut came_from: HashMap<(i32, i32), (i32, i32)> = HashMap::new();
    let mut counter: u32 = 0;

    g_score.insert(start, 0);
    heap.push(Reverse((manhattan(start, goal), counter, start)));

    let mut iterations: u32 = 0;
    while let Some(Reverse((_, _, cell))) = heap.pop() {
        iterations += 1;
        if iterations > PATH_ITERATION_CAP {
            return None;
        }
        if cell == goal {
            return Some(reconstruct(&came_from, cell, start, sizex, sizey));
        }
        let g = g_score[&cell];
        let neighbors = [
            (cell.0, cell.1 - 1),
            (cell.0, cell.1 + 1),
            (cell.0 - 1, cell.1),
            (cell.0 + 1, cell.1),
        ];
        for next in neighbors {
            if !cell_walkable(map, next, sizex, sizey) {
                continue;
            }
            let tentative = g + 1;
            if g_score.get(&next).is_none_or(|&best| tentative < best) {
                g_score.insert(next, tentative);
                came_from.insert(next, cell);
                counter += 1;
                heap.push(Reverse((tentative + manhattan(next, goal), counter, next)));
            }
        }
    }
    None
}

fn reconstruct(
    came_from: &HashMap<(i32, i32), (i32, i32)>,
    goal: (i32, i32),
    start: (i32, i32),
    sizex: i32,
    sizey: i32,
) -> Vec<(i32, i32)> {
    let mut cells = vec![goal];
    let mut cursor = goal;
    while let Some(&prev) = came_from.get(&cursor) {
        if prev == start {
            break;
        }
        cells.push(prev);
        cursor = prev;
    }
    cells.reverse();
    cells
        .into_iter()
        .map(|(cx, cy)| {
            (
                cx * PATH_CELL_PX + PATH_CELL_PX / 2 - sizex / 2,
                cy * PATH_CELL_PX + PATH_CELL_PX / 2 - sizey / 2,
            )
        })
        .collect()
}
