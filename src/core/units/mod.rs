pub mod data_pipeline;
pub mod moderation_service;
pub mod network;
pub mod proxy;
pub mod search_cluster;
pub mod upload_storage;

pub use data_pipeline::{DataPipelineHandles, DataPipelineProps, DataPipelineUnit, RagJobSettings};
pub use moderation_service::{ModerationServiceHandles, ModerationServiceProps, ModerationServiceUnit};
pub use network::{NetworkHandles, NetworkProvider};
pub use proxy::{ProxyHandles, ProxyTarget, ProxyUnit};
pub use search_cluster::{SearchClusterHandles, SearchClusterUnit};
pub use upload_storage::{UploadStorageHandles, UploadStorageUnit};
