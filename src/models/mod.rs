pub mod activity;
pub mod pin;
pub mod reward;
pub mod scan;
pub mod stats;
pub mod user;
