use serde::Serialize;

/// Stable opaque handle. Assigned monotonically per world, never reused and
/// never renumbered when an entity is removed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Mob,
    Projectile,
    Breakable,
    Item,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    pub fn step(self) -> (i32, i32) {
        match self {
            Facing::Up => (0, -1),
            Facing::Down => (0, 1),
            Facing::Left => (-1, 0),
            Facing::Right => (1, 0),
        }
    }

    pub fn unit(self) -> (f32, f32) {
        let (dx, dy) = self.step();
        (dx as f32, dy as f32)
    }
}

/// Eight-way walk input. Facing resolves to the vertical component on
/// diagonals.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl MoveDir {
    pub fn facing(self) -> Facing {
        match self {
            MoveDir::Up | MoveDir::UpLeft | MoveDir::UpRight => Facing::Up,
            MoveDir::Down | MoveDir::DownLeft | MoveDir::DownRight => Facing::Down,
            MoveDir::Left => Facing::Left,
            MoveDir::Right => Facing::Right,
        }
    }
}

/// Per-pixel, per-layer collision classification from the tile map.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CollisionClass {
    Walkable,
    Wall,
    Abyss,
    Trap,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x + self.w > other.x
            && self.x < other.x + other.w
            && self.y + self.h > other.y
            && self.y < other.y + other.h
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuntimeEvent {
    Chat {
        message: String,
    },
    MobSpawned {
        id: EntityId,
        #[serde(rename = "defId")]
        def_id: u32,
    },
    MobDied {
        id: EntityId,
    },
    PlayerDied {
        id: EntityId,
    },
    BreakableDestroyed {
        id: EntityId,
    },
    ProjectileFizzled {
        id: EntityId,
    },
    RaidWaveStarted {
        index: usize,
    },
    RaidFinished,
    EventFired {
        name: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct MobView {
    pub id: EntityId,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
    pub anim: u8,
    pub hp: f32,
    #[serde(rename = "maxHp")]
    pub max_hp: f32,
    pub flashing: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: EntityId,
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
    pub anim: u8,
    pub hp: f32,
    #[serde(rename = "maxHp")]
    pub max_hp: f32,
    pub dashing: bool,
    pub moving: bool,
    pub flashing: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "defId")]
    pub def_id: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct BreakableView {
    pub id: EntityId,
    pub x: i32,
    pub y: i32,
    pub durability: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemView {
    pub id: EntityId,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "itemId")]
    pub item_id: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub players: Vec<PlayerView>,
    pub mobs: Vec<MobView>,
    pub projectiles: Vec<ProjectileView>,
    pub breakables: Vec<BreakableView>,
    pub items: Vec<ItemView>,
    pub events: Vec<RuntimeEvent>,
}
