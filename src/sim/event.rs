/// Events emitted during a simulation step.
/// The shell consumes these for logging; tests use them to observe a tick.

use crate::domain::entity::Position;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerMoved { to: Position },
    Dug { at: Position },
    GoldPicked { at: Position, score: usize },
    EnemySpawned { id: usize, at: Position },
    AllGoldCollected,
    PlayerCaught { enemy: usize, at: Position },
}
