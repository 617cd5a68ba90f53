use schooltest_backend::{
    api_router,
    config::{get_config, init_config},
    database::pool::create_pool,
    services::attempt_service::AttemptService,
    AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            let attempt_svc = AttemptService::new(state.pool.clone());
            loop {
                match attempt_svc.abandon_expired().await {
                    Ok(0) => {}
                    Ok(n) => info!("Marked {} expired attempts as abandoned", n),
                    Err(e) => tracing::error!("Attempt expiry sweeper error: {:?}", e),
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        });
    }

    let app = api_router(app_state, config.student_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
