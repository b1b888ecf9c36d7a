use std::sync::Arc;

use thiserror::Error;

use crate::constants::{HP_THRESHOLD_STEPS, TIMER_CONDITION_SECS};

/// Immutable tree shape. Shared between every entity spawned from the same
/// definition via `Arc`; the mutable per-entity side lives in `AiState`.
#[derive(Clone, Debug)]
pub enum BehaviorNode {
    Sequence(Vec<BehaviorNode>),
    Selector(Vec<BehaviorNode>),
    Condition(ConditionKind),
    Action(ActionKind),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConditionKind {
    Always,
    Timer { millis: u64 },
    HpBelow { percent: u32 },
    HpAbove { percent: u32 },
    PlayerWithin { radius_px: u32 },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    Wander,
    Scurry,
    Pursue,
    Bite,
    MusicNote,
    LaserBurst,
    RingBurst,
    FaceAnim,
}

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("unknown condition name `{0}`")]
    UnknownCondition(String),
    #[error("unknown action name `{0}`")]
    UnknownAction(String),
    #[error("unknown structure name `{0}`")]
    UnknownStructure(String),
    #[error("block marker without an open structure")]
    Unbalanced,
    #[error("malformed tree: expected exactly one root node, found {0}")]
    Malformed(usize),
    #[error("behavior definition is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BehaviorToken {
    Structure(String),
    Condition(String),
    Action(String),
    BlockStart,
    BlockEnd,
}

pub fn condition_by_name(name: &str) -> Option<ConditionKind> {
    if name == "always" {
        return Some(ConditionKind::Always);
    }
    if let Some(rest) = name.strip_prefix("timer-") {
        let secs: u64 = rest.strip_suffix('s')?.parse().ok()?;
        if TIMER_CONDITION_SECS.contains(&secs) {
            return Some(ConditionKind::Timer { millis: secs * 1_000 });
        }
        return None;
    }
    if let Some(rest) = name.strip_prefix("hp-lower-") {
        let percent: u32 = rest.parse().ok()?;
        if HP_THRESHOLD_STEPS.contains(&percent) {
            return Some(ConditionKind::HpBelow { percent });
        }
        return None;
    }
    if let Some(rest) = name.strip_prefix("hp-higher-") {
        let percent: u32 = rest.parse().ok()?;
        if HP_THRESHOLD_STEPS.contains(&percent) {
            return Some(ConditionKind::HpAbove { percent });
        }
        return None;
    }
    if let Some(rest) = name.strip_prefix("player-within-") {
        let radius_px: u32 = rest.parse().ok()?;
        return Some(ConditionKind::PlayerWithin { radius_px });
    }
    None
}

pub fn action_by_name(name: &str) -> Option<ActionKind> {
    match name {
        "wander" => Some(ActionKind::Wander),
        "scurry" => Some(ActionKind::Scurry),
        "pursue" => Some(ActionKind::Pursue),
        "bite" => Some(ActionKind::Bite),
        "music-note" => Some(ActionKind::MusicNote),
        "laser-burst" => Some(ActionKind::LaserBurst),
        "ring-burst" => Some(ActionKind::RingBurst),
        "face-anim" => Some(ActionKind::FaceAnim),
        _ => None,
    }
}

/// Token list as stored in behavior definitions: `[["structure","sequence"],
/// ["condition","timer-2s"], ["block_start"], ...]`. Single-element entries
/// are the block markers.
pub fn tokens_from_json(raw: &str) -> Result<Vec<BehaviorToken>, BehaviorError> {
    let entries: Vec<Vec<String>> = serde_json::from_str(raw)?;
    let mut tokens = Vec::with_capacity(entries.len());
    for entry in entries {
        let key = entry.first().map(String::as_str).unwrap_or_default();
        let value = entry.get(1).cloned().unwrap_or_default();
        tokens.push(match key {
            "structure" => BehaviorToken::Structure(value),
            "condition" => BehaviorToken::Condition(value),
            "action" => BehaviorToken::Action(value),
            "block_start" => BehaviorToken::BlockStart,
            "block_end" => BehaviorToken::BlockEnd,
            other => return Err(BehaviorError::UnknownStructure(other.to_string())),
        });
    }
    Ok(tokens)
}

enum Composite {
    Sequence,
    Selector,
}

/// Stack-machine construction. `block_start` stashes the sibling buffer as
/// the pending children of the innermost open structure; `block_end` closes
/// it and pushes the finished composite onto the enclosing buffer.
pub fn build_tree(tokens: &[BehaviorToken]) -> Result<Arc<BehaviorNode>, BehaviorError> {
    let mut stack: Vec<(Composite, Vec<BehaviorNode>)> = Vec::new();
    let mut buffer: Vec<BehaviorNode> = Vec::new();

    for token in tokens {
        match token {
            BehaviorToken::Structure(name) => {
                let composite = match name.as_str() {
                    "sequence" => Composite::Sequence,
                    "selector" => Composite::Selector,
                    other => return Err(BehaviorError::UnknownStructure(other.to_string())),
                };
                stack.push((composite, Vec::new()));
            }
            BehaviorToken::Condition(name) => {
                let kind = condition_by_name(name)
                    .ok_or_else(|| BehaviorError::UnknownCondition(name.clone()))?;
                buffer.push(BehaviorNode::Condition(kind));
            }
            BehaviorToken::Action(name) => {
                let kind = action_by_name(name)
                    .ok_or_else(|| BehaviorError::UnknownAction(name.clone()))?;
                buffer.push(BehaviorNode::Action(kind));
            }
            BehaviorToken::BlockStart => {
                let top = stack.last_mut().ok_or(BehaviorError::Unbalanced)?;
                top.1 = std::mem::take(&mut buffer);
            }
            BehaviorToken::BlockEnd => {
                let (composite, mut children) = stack.pop().ok_or(BehaviorError::Unbalanced)?;
                children.append(&mut buffer);
                buffer.push(match composite {
                    Composite::Sequence => BehaviorNode::Sequence(children),
                    Composite::Selector => BehaviorNode::Selector(children),
                });
            }
        }
    }

    if buffer.len() != 1 {
        return Err(BehaviorError::Malformed(buffer.len()));
    }
    Ok(Arc::new(buffer.pop().unwrap()))
}

pub fn tree_from_json(raw: &str) -> Result<Arc<BehaviorNode>, BehaviorError> {
    build_tree(&tokens_from_json(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_tokens() -> Vec<BehaviorToken> {
        vec![
            BehaviorToken::Structure("sequence".into()),
            BehaviorToken::Condition("timer-2s".into()),
            BehaviorToken::BlockStart,
            BehaviorToken::Action("wander".into()),
            BehaviorToken::BlockEnd,
        ]
    }

    #[test]
    fn builds_condition_gated_sequence() {
        let tree = build_tree(&seq_tokens()).unwrap();
        match &*tree {
            BehaviorNode::Sequence(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(
                    children[0],
                    BehaviorNode::Condition(ConditionKind::Timer { millis: 2_000 })
                ));
                assert!(matches!(children[1], BehaviorNode::Action(ActionKind::Wander)));
            }
            other => panic!("expected sequence root, got {other:?}"),
        }
    }

    #[test]
    fn nested_selector_closes_into_parent_buffer() {
        let tokens = vec![
            BehaviorToken::Structure("selector".into()),
            BehaviorToken::Structure("sequence".into()),
            BehaviorToken::Condition("hp-lower-30".into()),
            BehaviorToken::BlockStart,
            BehaviorToken::Action("scurry".into()),
            BehaviorToken::BlockEnd,
            BehaviorToken::BlockStart,
            BehaviorToken::Action("wander".into()),
            BehaviorToken::BlockEnd,
        ];
        let tree = build_tree(&tokens).unwrap();
        match &*tree {
            BehaviorNode::Selector(children) => {
                assert!(matches!(children[0], BehaviorNode::Sequence(_)));
                assert!(matches!(children[1], BehaviorNode::Action(ActionKind::Wander)));
            }
            other => panic!("expected selector root, got {other:?}"),
        }
    }

    #[test]
    fn two_roots_is_a_construction_error() {
        let tokens = vec![
            BehaviorToken::Action("wander".into()),
            BehaviorToken::Action("scurry".into()),
        ];
        assert!(matches!(
            build_tree(&tokens),
            Err(BehaviorError::Malformed(2))
        ));
    }

    #[test]
    fn unknown_names_are_fatal() {
        let tokens = vec![BehaviorToken::Condition("moon-phase".into())];
        assert!(matches!(
            build_tree(&tokens),
            Err(BehaviorError::UnknownCondition(_))
        ));
        let tokens = vec![BehaviorToken::Action("teleport".into())];
        assert!(matches!(
            build_tree(&tokens),
            Err(BehaviorError::UnknownAction(_))
        ));
    }

    #[test]
    fn block_marker_without_structure_is_unbalanced() {
        let tokens = vec![BehaviorToken::BlockEnd];
        assert!(matches!(build_tree(&tokens), Err(BehaviorError::Unbalanced)));
    }

    #[test]
    fn parses_pair_list_json() {
        let raw = r#"[["structure","sequence"],["condition","timer-2s"],["block_start"],["action","wander"],["block_end"]]"#;
        let tokens = tokens_from_json(raw).unwrap();
        assert_eq!(tokens, seq_tokens());
        assert!(tree_from_json(raw).is_ok());
    }

    #[test]
    fn name_registry_covers_parametrized_families() {
        assert_eq!(
            condition_by_name("timer-30s"),
            Some(ConditionKind::Timer { millis: 30_000 })
        );
        assert_eq!(condition_by_name("timer-3s"), None);
        assert_eq!(
            condition_by_name("hp-higher-75"),
            Some(ConditionKind::HpAbove { percent: 75 })
        );
        assert_eq!(condition_by_name("hp-lower-42"), None);
        assert_eq!(
            condition_by_name("player-within-300"),
            Some(ConditionKind::PlayerWithin { radius_px: 300 })
        );
        assert_eq!(action_by_name("laser-burst"), Some(ActionKind::LaserBurst));
        assert_eq!(action_by_name("fly"), None);
    }
}
