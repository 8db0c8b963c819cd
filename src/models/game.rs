use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Game {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub points: i64,
}

impl Game {
    /// Special flag recorded on the profile once the game is finished.
    pub fn flag(&self) -> String {
        format!("game:{}", self.id)
    }
}

pub const GAMES: &[Game] = &[
    Game {
        id: "breathing-bubbles",
        name: "Breathing Bubbles",
        description: "Blow slow bubbles by breathing in and out.",
        points: 5,
    },
    Game {
        id: "emotion-match",
        name: "Feelings Match",
        description: "Match each face to the feeling it shows.",
        points: 5,
    },
    Game {
        id: "feelings-quiz",
        name: "Feelings Quiz",
        description: "Guess how the character in the story feels.",
        points: 8,
    },
];

pub fn find_game(id: &str) -> Option<&'static Game> {
    GAMES.iter().find(|g| g.id == id)
}
