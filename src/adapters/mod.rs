// 佈建引擎的具體實作
pub mod http;
pub mod simulated;

pub use http::HttpProvisioner;
pub use simulated::SimulatedProvisioner;
