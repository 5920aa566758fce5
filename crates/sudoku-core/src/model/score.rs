use crate::model::player::Player;

/// Points for completing 0, 1, 2 or 3 regions with a single move.
pub const DEFAULT_REGION_POINTS: [u32; 4] = [0, 1, 3, 7];

pub fn region_points(completed: usize, table: &[u32; 4]) -> u32 {
    table[completed.min(3)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScoreBoard {
    totals: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 2] }
    }

    pub const fn from_totals(totals: [u32; 2]) -> Self {
        Self { totals }
    }

    pub fn add_points(&mut self, player: Player, points: u32) {
        self.totals[player.index()] += points;
    }

    pub fn with_points(mut self, player: Player, points: u32) -> Self {
        self.add_points(player, points);
        self
    }

    pub fn set_totals(&mut self, totals: [u32; 2]) {
        self.totals = totals;
    }

    pub fn score(&self, player: Player) -> u32 {
        self.totals[player.index()]
    }

    pub fn standings(&self) -> &[u32; 2] {
        &self.totals
    }

    /// Own score minus the other player's score.
    pub fn differential(&self, perspective: Player) -> i64 {
        self.score(perspective) as i64 - self.score(perspective.other()) as i64
    }

    /// `None` on a tie.
    pub fn leader(&self) -> Option<Player> {
        match self.differential(Player::First) {
            d if d > 0 => Some(Player::First),
            d if d < 0 => Some(Player::Second),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differential_is_antisymmetric() {
        let mut scores = ScoreBoard::new();
        scores.add_points(Player::First, 7);
        scores.add_points(Player::Second, 3);
        assert_eq!(scores.differential(Player::First), 4);
        assert_eq!(scores.differential(Player::Second), -4);
        assert_eq!(scores.leader(), Some(Player::First));
    }

    #[test]
    fn region_points_follow_table() {
        let points: Vec<_> = (0..4)
            .map(|n| region_points(n, &DEFAULT_REGION_POINTS))
            .collect();
        assert_eq!(points, vec![0, 1, 3, 7]);
    }

    #[test]
    fn tie_has_no_leader() {
        assert_eq!(ScoreBoard::from_totals([5, 5]).leader(), None);
    }
}
