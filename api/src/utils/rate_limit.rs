use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::ApiError;

pub type ClientRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Keyed limiter allowing `per_minute` requests per client IP.
pub fn client_rate_limiter(per_minute: u32) -> Arc<ClientRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// Drops state for clients that have gone quiet so the key store stays bounded.
pub fn spawn_limiter_cleanup(limiter: Arc<ClientRateLimiter>) {
    let interval = Duration::from_secs(60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            limiter.retain_recent();
            tracing::trace!(clients = limiter.len(), "rate limiter storage pruned");
        }
    });
}

pub async fn limit_by_client_ip(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    // Without connect info (e.g. in-process tests) everyone shares one bucket.
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if limiter.check_key(&client_ip).is_err() {
        tracing::warn!(client_ip = %client_ip, path = %request.uri().path(), "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}
