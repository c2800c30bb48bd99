pub mod anchor_service;
pub mod deploy_service;
pub mod deployer_service;
pub mod events_service;
pub mod hash_service;
pub mod metrics_service;
pub mod phala_service;
pub mod validation_service;
