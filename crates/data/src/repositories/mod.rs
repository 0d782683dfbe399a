pub mod conversion_rate_repo;
pub mod level_graph_repo;
pub mod network_reward_repo;
pub mod user_repo;

pub use conversion_rate_repo::ConversionRateRepository;
pub use level_graph_repo::LevelGraphRepository;
pub use network_reward_repo::NetworkRewardRepository;
pub use user_repo::UserRepository;
