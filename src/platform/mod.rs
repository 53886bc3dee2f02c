pub mod client;
pub mod datasets;
pub mod evals;
pub mod protect;

pub use client::PlatformClient;
pub use datasets::{ColumnMapping, DatasetApi};
pub use evals::EvalApi;
pub use protect::ProtectApi;
