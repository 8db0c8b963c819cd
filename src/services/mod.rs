pub mod flows;
pub mod genai;
pub mod report;
pub mod rewards;
pub mod safety;
pub mod streak;
