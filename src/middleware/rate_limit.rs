use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::ApiError;
use crate::state::AppState;

/// Tracked clients before stale entries are pruned
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Per-client login attempt budget: `attempts` per `window`, refilled evenly.
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl LoginRateLimiter {
    pub fn new(attempts: u32, window: Duration) -> Self {
        let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / attempts.get())
            .unwrap_or_else(|| Quota::per_second(attempts))
            .allow_burst(attempts);

        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Consume one attempt for `client`; `false` once the budget is spent
    pub fn check(&self, client: IpAddr) -> bool {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client).is_ok()
    }
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_ip(&request);
    if !state.login_limiter.check(client) {
        tracing::warn!("Login rate limit exceeded for {}", client);
        return Err(ApiError::too_many_requests(format!(
            "Too many login attempts, please try again in {} minutes",
            state.config.api.login_window_secs.div_ceil(60)
        )));
    }
    Ok(next.run(request).await)
}

/// Socket peer when served with connect info, else the first forwarded hop
fn client_ip(request: &Request) -> IpAddr {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
