/// The step function: advances the session by one tick.
///
/// Processing order:
///   1. Player movement (rate-limited) incl. digging, gold pickup, win
///   2. Enemy spawn (rate-limited, capacity-bounded)
///   3. Enemy wander (rate-limited)
///   4. Collision / lose check
///
/// Every gate compares the tick timestamp with the phase's own last-action
/// timestamp using a strict `>`, so a phase fires at most once per interval.
/// A terminal session is left untouched.

use rand::seq::SliceRandom;

use crate::domain::entity::{Enemy, Facing, HeldDirs, DIRS};
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::world::{Phase, Session};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(session: &mut Session, held: HeldDirs, now_ms: u64) -> Vec<GameEvent> {
    if session.phase != Phase::Running { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    resolve_player_movement(session, held, now_ms, &mut events);
    if session.phase.is_terminal() { return events; }
    resolve_enemy_spawn(session, now_ms, &mut events);
    resolve_enemy_movement(session, now_ms);
    resolve_collision(session, &mut events);

    events
}

#[inline]
fn elapsed(now_ms: u64, last_ms: u64, interval_ms: u64) -> bool {
    now_ms.saturating_sub(last_ms) > interval_ms
}

// ══════════════════════════════════════════════════════════════
// Player movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(s: &mut Session, held: HeldDirs, now_ms: u64, events: &mut Vec<GameEvent>) {
    if !elapsed(now_ms, s.last_move_ms, s.speed.player_move_ms) { return; }

    let (dx, dy) = held.delta();
    let from = s.player.pos;
    let to = s.grid.clamp(from.x as i64 + dx as i64, from.y as i64 + dy as i64);

    // Blocked by the edge or nothing held: the interval is not consumed.
    if to == from { return; }

    s.player.pos = to;
    if dx < 0 { s.player.facing = Facing::Left; }
    if dx > 0 { s.player.facing = Facing::Right; }
    s.last_move_ms = now_ms;
    events.push(GameEvent::PlayerMoved { to });

    let tile = s.grid.get(to).unwrap_or_default();
    if !tile.is_diggable() { return; }
    s.grid.set(to, Tile::Empty);

    if tile.is_gold() {
        s.score += 1;
        events.push(GameEvent::GoldPicked { at: to, score: s.score });
        if s.score >= s.gold_total {
            s.phase = Phase::Won;
            events.push(GameEvent::AllGoldCollected);
        }
    } else {
        events.push(GameEvent::Dug { at: to });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemy spawn
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_spawn(s: &mut Session, now_ms: u64, events: &mut Vec<GameEvent>) {
    if s.enemies.len() >= s.rules.max_enemies { return; }
    if !elapsed(now_ms, s.last_spawn_ms, s.speed.enemy_spawn_ms) { return; }
    s.last_spawn_ms = now_ms;

    let empties = s.grid.positions_of(Tile::Empty);
    let Some(&at) = empties.choose(&mut s.rng) else { return };

    let id = s.next_enemy_id;
    s.next_enemy_id += 1;
    s.enemies.push(Enemy::new(id, at));
    events.push(GameEvent::EnemySpawned { id, at });
}

// ══════════════════════════════════════════════════════════════
// Enemy wander
//
// Each enemy shuffles the four cardinal directions and takes the first
// one leading to an in-bounds Empty cell. Enemies ignore each other.
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_movement(s: &mut Session, now_ms: u64) {
    if !elapsed(now_ms, s.last_enemy_move_ms, s.speed.enemy_move_ms) { return; }
    s.last_enemy_move_ms = now_ms;

    let Session { grid, enemies, rng, .. } = s;
    let (cols, rows) = (grid.cols(), grid.rows());

    for enemy in enemies.iter_mut() {
        let mut dirs = DIRS;
        dirs.shuffle(rng);
        let next = dirs.iter()
            .filter_map(|&(dx, dy)| enemy.pos.offset(dx, dy, cols, rows))
            .find(|&p| grid.get(p).is_some_and(Tile::is_walkable));
        if let Some(p) = next {
            enemy.pos = p;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

fn resolve_collision(s: &mut Session, events: &mut Vec<GameEvent>) {
    let at = s.player.pos;
    if let Some(enemy) = s.enemies.iter().find(|e| e.pos == at) {
        s.phase = Phase::Lost;
        events.push(GameEvent::PlayerCaught { enemy: enemy.id, at });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Position;
    use crate::domain::grid::Grid;

    const UP: HeldDirs = HeldDirs { up: true, down: false, left: false, right: false };
    const DOWN: HeldDirs = HeldDirs { up: false, down: true, left: false, right: false };
    const LEFT: HeldDirs = HeldDirs { up: false, down: false, left: true, right: false };
    const RIGHT: HeldDirs = HeldDirs { up: false, down: false, left: false, right: true };

    /// Build a session from a diagram ('#'=Dirt '$'=Gold ' '=Empty).
    fn world(rows: &[&str], px: usize, py: usize) -> Session {
        Session::from_grid(Grid::from_rows(rows), Position::new(px, py), 11)
    }

    fn at(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    // ── Player movement ──

    #[test]
    fn empty_input_changes_nothing() {
        let mut s = world(&["###", "#$#", "###"], 1, 1);
        let events = step(&mut s, HeldDirs::NONE, 1_000);
        assert!(events.is_empty());
        assert_eq!(s.player.pos, at(1, 1));
        assert_eq!(s.score, 0);
        assert_eq!(s.last_move_ms, 0);
    }

    #[test]
    fn moving_into_dirt_digs_it() {
        let mut s = world(&["###", "# #", "###"], 1, 1);
        let events = step(&mut s, RIGHT, 200);
        assert_eq!(s.player.pos, at(2, 1));
        assert_eq!(s.grid.get(at(2, 1)), Some(Tile::Empty));
        assert_eq!(s.score, 0);
        assert!(events.contains(&GameEvent::Dug { at: at(2, 1) }));
        assert_eq!(s.player.facing, Facing::Right);
    }

    #[test]
    fn gold_scores_exactly_once() {
        let mut s = world(&["$ $", "   ", "   "], 1, 0);
        step(&mut s, LEFT, 200);
        assert_eq!(s.score, 1);
        assert_eq!(s.grid.get(at(0, 0)), Some(Tile::Empty));

        // Walk off and back onto the same cell: no further score.
        step(&mut s, RIGHT, 400);
        step(&mut s, LEFT, 600);
        assert_eq!(s.player.pos, at(0, 0));
        assert_eq!(s.score, 1);
        assert_eq!(s.phase, Phase::Running);
    }

    #[test]
    fn last_gold_wins_and_stays_won() {
        let mut s = world(&[" $ ", "   ", "   "], 0, 0);
        let events = step(&mut s, RIGHT, 200);
        assert_eq!(s.phase, Phase::Won);
        assert!(events.contains(&GameEvent::AllGoldCollected));

        // Terminal: further ticks are ignored.
        assert!(step(&mut s, RIGHT, 10_000).is_empty());
        assert_eq!(s.player.pos, at(1, 0));
        assert_eq!(s.phase, Phase::Won);
    }

    #[test]
    fn movement_is_rate_limited() {
        let mut s = world(&["     "], 0, 0);
        step(&mut s, RIGHT, 121);
        assert_eq!(s.player.pos, at(1, 0));
        step(&mut s, RIGHT, 200); // 79ms later: ignored
        assert_eq!(s.player.pos, at(1, 0));
        step(&mut s, RIGHT, 241); // exactly 120ms later: still ignored
        assert_eq!(s.player.pos, at(1, 0));
        step(&mut s, RIGHT, 242);
        assert_eq!(s.player.pos, at(2, 0));
    }

    #[test]
    fn blocked_move_keeps_timer() {
        let mut s = world(&["   ", "   ", "   "], 0, 0);
        step(&mut s, LEFT, 500); // into the left edge
        assert_eq!(s.player.pos, at(0, 0));
        assert_eq!(s.last_move_ms, 0);
        // A real move right after is not throttled by the blocked one.
        step(&mut s, DOWN, 510);
        assert_eq!(s.player.pos, at(0, 1));
    }

    #[test]
    fn diagonal_and_cancel() {
        let mut s = world(&["   ", "   ", "   "], 1, 1);
        let up_right = HeldDirs { up: true, right: true, ..HeldDirs::NONE };
        step(&mut s, up_right, 200);
        assert_eq!(s.player.pos, at(2, 0));

        let opposite = HeldDirs { up: true, down: true, ..HeldDirs::NONE };
        step(&mut s, opposite, 400);
        assert_eq!(s.player.pos, at(2, 0));
    }

    #[test]
    fn diagonal_clamps_per_axis() {
        let mut s = world(&["   ", "   ", "   "], 2, 1);
        let up_right = HeldDirs { up: true, right: true, ..HeldDirs::NONE };
        step(&mut s, up_right, 200);
        assert_eq!(s.player.pos, at(2, 0));
    }

    #[test]
    fn player_stays_in_bounds() {
        let mut s = world(&["##", "##"], 0, 0);
        let mut now = 0;
        for held in [UP, LEFT, RIGHT, RIGHT, DOWN, DOWN, DOWN, LEFT, LEFT, UP, UP, UP] {
            now += 200;
            step(&mut s, held, now);
            assert!(s.grid.in_bounds(s.player.pos));
        }
    }

    // ── Spawn ──

    #[test]
    fn spawn_waits_for_interval() {
        let mut s = world(&["   ", "   ", "   "], 0, 0);
        step(&mut s, HeldDirs::NONE, 4_000);
        assert!(s.enemies.is_empty());
        let events = step(&mut s, HeldDirs::NONE, 4_001);
        assert_eq!(s.enemies.len(), 1);
        assert!(matches!(events[0], GameEvent::EnemySpawned { id: 0, .. }));
        assert_eq!(s.last_spawn_ms, 4_001);
    }

    #[test]
    fn spawn_lands_on_empty() {
        let mut s = world(&["## ", "###", "###"], 0, 0);
        step(&mut s, HeldDirs::NONE, 4_001);
        assert_eq!(s.enemies.len(), 1);
        // The only Empty cell; the move phase can't leave it either.
        assert_eq!(s.enemies[0].pos, at(2, 0));
    }

    #[test]
    fn spawn_without_empty_cells_is_noop() {
        let mut s = world(&["###", "#$#", "###"], 1, 1);
        let events = step(&mut s, HeldDirs::NONE, 4_001);
        assert!(events.is_empty());
        assert!(s.enemies.is_empty());
        assert_eq!(s.last_spawn_ms, 4_001);
    }

    #[test]
    fn spawn_respects_capacity() {
        let mut s = world(&["#####", "#   #", "#####"], 0, 0);
        for i in 0..5 {
            s.enemies.push(Enemy::new(i, at(2, 1)));
        }
        step(&mut s, HeldDirs::NONE, 10_000);
        assert_eq!(s.enemies.len(), 5);
        // The timer only restarts when there was room.
        assert_eq!(s.last_spawn_ms, 0);
    }

    // ── Wander ──

    #[test]
    fn enemy_only_walks_on_empty() {
        for seed in 0..20 {
            let grid = Grid::from_rows(&[
                "#######",
                "#  $  #",
                "# ### #",
                "#     #",
                "#######",
            ]);
            let mut s = Session::from_grid(grid, at(0, 0), seed);
            s.enemies.push(Enemy::new(0, at(1, 1)));
            s.enemies.push(Enemy::new(1, at(5, 3)));
            let mut now = 0;
            for _ in 0..100 {
                let before: Vec<_> = s.enemies.iter().map(|e| e.pos).collect();
                let grid_before = s.grid.clone();
                now += 401;
                step(&mut s, HeldDirs::NONE, now);
                for (e, prev) in s.enemies.iter().zip(before) {
                    assert!(
                        e.pos == prev || grid_before.get(e.pos) == Some(Tile::Empty),
                        "enemy {} moved onto {:?}", e.id, grid_before.get(e.pos)
                    );
                    let dist = e.pos.x.abs_diff(prev.x) + e.pos.y.abs_diff(prev.y);
                    assert!(dist <= 1);
                }
            }
        }
    }

    #[test]
    fn boxed_in_enemy_stays() {
        let mut s = world(&["###", "# #", "###"], 0, 0);
        s.enemies.push(Enemy::new(0, at(1, 1)));
        step(&mut s, HeldDirs::NONE, 401);
        assert_eq!(s.enemies[0].pos, at(1, 1));
    }

    #[test]
    fn enemies_share_cells() {
        let mut s = world(&["#####", "#  ##", "#####"], 0, 0);
        s.enemies.push(Enemy::new(0, at(1, 1)));
        s.enemies.push(Enemy::new(1, at(2, 1)));
        step(&mut s, HeldDirs::NONE, 401);
        // Each has exactly one way out: onto the other's old cell.
        assert_eq!(s.enemies[0].pos, at(2, 1));
        assert_eq!(s.enemies[1].pos, at(1, 1));
    }

    // ── Collision ──

    #[test]
    fn walking_into_enemy_loses() {
        let mut s = world(&["   ", "   ", "   "], 0, 1);
        s.enemies.push(Enemy::new(7, at(1, 1)));
        s.last_enemy_move_ms = 1_000; // freeze the enemy this tick
        let events = step(&mut s, RIGHT, 200);
        assert_eq!(s.phase, Phase::Lost);
        assert!(events.contains(&GameEvent::PlayerCaught { enemy: 7, at: at(1, 1) }));
        assert!(step(&mut s, LEFT, 5_000).is_empty());
        assert_eq!(s.player.pos, at(1, 1));
    }

    #[test]
    fn enemy_walking_into_player_loses() {
        // Player at (1,1); the enemy's only Empty neighbor is the player's cell.
        let mut s = world(&["###", "#  ", "###"], 1, 1);
        s.enemies.push(Enemy::new(0, at(2, 1)));
        step(&mut s, HeldDirs::NONE, 401);
        assert_eq!(s.enemies[0].pos, at(1, 1));
        assert_eq!(s.phase, Phase::Lost);
    }

    #[test]
    fn winning_move_skips_enemy_phases() {
        let mut s = world(&["$  ", "   ", "   "], 1, 0);
        s.enemies.push(Enemy::new(0, at(0, 1)));
        step(&mut s, LEFT, 5_000);
        assert_eq!(s.phase, Phase::Won);
        assert_eq!(s.enemies.len(), 1);
    }

    #[test]
    fn reset_after_loss_resumes_ticks() {
        let mut s = world(&["   ", "   ", "   "], 0, 0);
        s.enemies.push(Enemy::new(0, at(0, 0)));
        step(&mut s, HeldDirs::NONE, 10);
        assert_eq!(s.phase, Phase::Lost);

        s.rules = crate::config::GridConfig::default();
        s.reset(20_000);
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.grid.count(Tile::Gold), 10);
        step(&mut s, RIGHT, 20_121);
        assert_eq!(s.player.pos, at(2, 1));
    }
}
