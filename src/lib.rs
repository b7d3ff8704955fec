pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{DataSourceError, GolfDataSource, MockDataSource, SlashGolfDataSource};
pub use db::{init_db, Repository};
pub use domain::{
    Disposition, Golfer, GolferId, Money, Pick, PickId, PickRole, Resolution, Season,
    SeasonPlayerUsage, TimeMs, Tournament, TournamentFormat, TournamentId, TournamentResult,
    TournamentStatus, UserId, Withdrawal,
};
pub use error::AppError;
