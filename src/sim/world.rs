/// Session: the complete state of one play-through.
///
/// Everything the tick loop mutates lives here as owned fields: the grid,
/// the player, the enemy list, score and the phase. There is exactly one
/// writer (the step function), so nothing is shared or locked.
///
/// ## Timing
///
/// Each rate-limited phase keeps its own "last action" timestamp in
/// milliseconds since the loop started. The step function compares the
/// tick timestamp against these; nothing here reads a clock.

use rand::rngs::StdRng;

use crate::config::{GridConfig, SpeedConfig};
use crate::domain::entity::{Enemy, Player, Position};
use crate::domain::grid::Grid;
use crate::sim::mapgen;

/// Where the player appears on every new map.
pub const PLAYER_START: Position = Position::new(1, 1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Running,
    Won,
    Lost,
}

impl Phase {
    /// Won and Lost have no way out except `reset`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

pub struct Session {
    // ── Map ──
    pub grid: Grid,
    /// Gold placed at generation time. Fixed until the next reset.
    pub gold_total: usize,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub next_enemy_id: usize,

    // ── Game tracking ──
    pub score: usize,
    pub phase: Phase,
    /// How many sessions have been started, including this one.
    pub round: u32,

    // ── Config ──
    pub rules: GridConfig,
    pub speed: SpeedConfig,

    // ── Rate-limit clocks (ms) ──
    pub last_move_ms: u64,
    pub last_spawn_ms: u64,
    pub last_enemy_move_ms: u64,

    pub rng: StdRng,
}

impl Session {
    /// Generate a fresh map and start a session at `now_ms`.
    pub fn new(rules: GridConfig, speed: SpeedConfig, mut rng: StdRng, now_ms: u64) -> Self {
        let map = mapgen::generate(&mut rng, rules.cols, rules.rows, rules.gold_count);
        let start = map.grid.clamp(PLAYER_START.x as i64, PLAYER_START.y as i64);
        Session {
            grid: map.grid,
            gold_total: map.gold_total,
            player: Player::new(start.x, start.y),
            enemies: Vec::with_capacity(rules.max_enemies),
            next_enemy_id: 0,
            score: 0,
            phase: Phase::Running,
            round: 1,
            rules,
            speed,
            last_move_ms: now_ms,
            last_spawn_ms: now_ms,
            last_enemy_move_ms: now_ms,
            rng,
        }
    }

    /// Start over: new map, zero score, no enemies, back to Running.
    /// The rng carries on, so the next map differs from the last one.
    pub fn reset(&mut self, now_ms: u64) {
        let map = mapgen::generate(&mut self.rng, self.rules.cols, self.rules.rows, self.rules.gold_count);
        let start = map.grid.clamp(PLAYER_START.x as i64, PLAYER_START.y as i64);
        self.grid = map.grid;
        self.gold_total = map.gold_total;
        self.player = Player::new(start.x, start.y);
        self.enemies.clear();
        self.next_enemy_id = 0;
        self.score = 0;
        self.phase = Phase::Running;
        self.round += 1;
        self.last_move_ms = now_ms;
        self.last_spawn_ms = now_ms;
        self.last_enemy_move_ms = now_ms;
    }

    /// Reset only once the round is over. Returns whether it happened.
    pub fn try_reset(&mut self, now_ms: u64) -> bool {
        if !self.phase.is_terminal() {
            return false;
        }
        self.reset(now_ms);
        true
    }
}

#[cfg(test)]
impl Session {
    /// Session over a hand-built grid. Gold total is whatever gold the
    /// diagram contains; all clocks start at 0.
    pub fn from_grid(grid: Grid, player: Position, seed: u64) -> Self {
        use rand::SeedableRng;

        let rules = GridConfig {
            cols: grid.cols(),
            rows: grid.rows(),
            ..GridConfig::default()
        };
        let gold_total = grid.count(crate::domain::tile::Tile::Gold);
        Session {
            grid,
            gold_total,
            player: Player::new(player.x, player.y),
            enemies: vec![],
            next_enemy_id: 0,
            score: 0,
            phase: Phase::Running,
            round: 1,
            rules,
            speed: SpeedConfig::default(),
            last_move_ms: 0,
            last_spawn_ms: 0,
            last_enemy_move_ms: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Enemy;
    use crate::domain::tile::Tile;
    use rand::SeedableRng;

    fn session(seed: u64) -> Session {
        Session::new(GridConfig::default(), SpeedConfig::default(), StdRng::seed_from_u64(seed), 0)
    }

    #[test]
    fn new_session_is_running_at_start() {
        let s = session(3);
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.player.pos, PLAYER_START);
        assert_eq!(s.gold_total, 10);
        assert_eq!(s.grid.count(Tile::Gold), 10);
        assert!(s.enemies.is_empty());
    }

    #[test]
    fn reset_after_won() {
        let mut s = session(9);
        s.score = s.gold_total;
        s.phase = Phase::Won;
        s.enemies.push(Enemy::new(0, Position::new(3, 3)));
        s.player.pos = Position::new(10, 10);

        s.reset(5_000);

        assert_eq!(s.score, 0);
        assert_eq!(s.phase, Phase::Running);
        assert!(s.enemies.is_empty());
        assert_eq!(s.grid.count(Tile::Gold), 10);
        assert_eq!(s.grid.count(Tile::Empty), 0);
        assert_eq!(s.gold_total, 10);
        assert_eq!(s.player.pos, PLAYER_START);
        assert_eq!(s.last_spawn_ms, 5_000);
        assert_eq!(s.round, 2);
    }

    #[test]
    fn try_reset_ignored_while_running() {
        let mut s = session(4);
        s.score = 2;
        s.enemies.push(Enemy::new(0, Position::new(3, 3)));
        let grid = s.grid.clone();

        assert!(!s.try_reset(7_000));

        assert_eq!(s.score, 2);
        assert_eq!(s.round, 1);
        assert_eq!(s.enemies.len(), 1);
        assert_eq!(s.grid, grid);
        assert_eq!(s.last_spawn_ms, 0);
    }

    #[test]
    fn try_reset_after_lost() {
        let mut s = session(5);
        s.score = 3;
        s.phase = Phase::Lost;
        s.enemies.push(Enemy::new(0, Position::new(2, 2)));

        assert!(s.try_reset(7_000));

        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.score, 0);
        assert!(s.enemies.is_empty());
        assert_eq!(s.round, 2);
        assert_eq!(s.last_move_ms, 7_000);
    }

    #[test]
    fn terminal_phases() {
        assert!(!Phase::Running.is_terminal());
        assert!(Phase::Won.is_terminal());
        assert!(Phase::Lost.is_terminal());
    }
}
