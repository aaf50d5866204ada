pub mod dataset;
pub mod matcher;
pub mod output;
pub mod session;
pub mod stats;
