pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

pub use api::{ApiClient, ApiError, ApiResult, RemoteApi};
pub use config::AppConfig;
pub use logic::{
    filter_records, FieldUpdateDispatcher, Notice, NoticeLevel, Notifications, RowFilterEvaluator,
    TableView, UpdateOutcome,
};
pub use model::*;
pub use store::{LoadingKey, LoadingRegistry, RowStore, SessionFile};

/// Initialise `env_logger` with `default_filter` unless `RUST_LOG` says otherwise
pub fn init_logging(default_filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .try_init();
}
