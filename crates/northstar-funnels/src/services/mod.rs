mod service;

pub use service::FunnelService;
