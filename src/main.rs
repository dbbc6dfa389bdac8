mod db;
mod routes;
mod services;
mod spa;
mod state;

use spa::bundle::{self, BuildConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let build_config = BuildConfig::from_env();
    let build_plan = bundle::resolve(&build_config).expect("build plan resolution failed");
    tracing::info!(
        mode = build_plan.mode.as_str(),
        public_path = %build_plan.output.public_path,
        stats_file = build_plan.stats_file,
        "client bundle plan resolved"
    );

    let stats_root = std::env::current_dir().expect("working directory unavailable");
    let state = state::AppState::new(pool, build_plan, stats_root);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "riskmodel listening");
    axum::serve(listener, app).await.expect("server failed");
}
