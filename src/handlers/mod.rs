pub mod auth;
pub mod companions;
pub mod diary;
pub mod emotions;
pub mod games;
pub mod health;
pub mod profile;
pub mod report;
pub mod rewards;
pub mod share;
pub mod shop;
pub mod ws;
