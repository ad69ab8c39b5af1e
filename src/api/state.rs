use std::sync::Arc;
use crate::{
    api::middleware::rate_limit::RateLimiter,
    config::Settings,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub rate_limiter: Arc<RateLimiter>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        settings: Arc<Settings>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit.clone()));
        Self {
            service_context,
            rate_limiter,
            settings,
        }
    }
}
