use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use toolchat_common::Result;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::{AppState, SharedState};

pub struct GatewayServer {
    state: SharedState,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Bind the configured address and serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let gateway = &self.state.config.gateway;
        let addr = format!("{}:{}", gateway.host, gateway.port);
        let mut app = build_router(Arc::clone(&self.state));

        let rl = &gateway.rate_limit;
        if rl.enabled {
            match GovernorConfigBuilder::default()
                .per_second(rl.per_second)
                .burst_size(rl.burst_size)
                .finish()
            {
                Some(governor_conf) => {
                    let governor_limiter = governor_conf.limiter().clone();
                    app = app.layer(GovernorLayer::new(governor_conf));

                    // Drop limiter state for peers that have gone quiet.
                    tokio::spawn(async move {
                        let interval = Duration::from_secs(60);
                        loop {
                            tokio::time::sleep(interval).await;
                            governor_limiter.retain_recent();
                        }
                    });
                    info!(
                        "rate limiting enabled: {}s period, burst {}",
                        rl.per_second, rl.burst_size
                    );
                }
                None => warn!("invalid rate limit settings, rate limiting disabled"),
            }
        }

        let listener = TcpListener::bind(&addr).await?;
        info!("toolchat gateway listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
