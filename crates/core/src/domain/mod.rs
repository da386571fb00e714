pub mod contract;
pub mod config;
pub mod forecast;
pub mod meal;
pub mod plan;
pub mod votes;
