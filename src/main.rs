use jsonrpc_bind::{build_app, config::Config, logging, methods::build_registry, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging("info");

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.api_token.clone(), build_registry());
    let methods = state.registry.method_names().join(",");
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        auth = config.api_token.is_some(),
        methods = %methods,
        "jsonrpc server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
