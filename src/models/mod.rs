pub mod companion;
pub mod diary_entry;
pub mod emotion;
pub mod game;
pub mod profile;
pub mod reward;
pub mod shop;
