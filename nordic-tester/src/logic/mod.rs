pub mod clicks;
pub mod reports;
pub mod roamer;
pub mod runner;
pub mod storage;

pub use clicks::parse_clicks;
pub use runner::{GameSetup, TesterReport, replay_file, run_scripted, verify_file};
