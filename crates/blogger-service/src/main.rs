use blogger_service::{
    AppState, DefaultAppState, config::Config, db, models::NewUser, repositories::UserRepository,
    routes::create_router,
};
use clap::{Parser, Subcommand};
use std::sync::{Arc, Mutex};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "blogger-service")]
#[command(about = "Blogger publishing service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Provision a user account and its empty profile
    CreateUser {
        username: String,
        email: String,
        /// Display name shown on the user's page
        #[arg(long)]
        full_name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = Config::from_env().unwrap_or_else(|err| {
        eprintln!("Configuration error: {err}");
        std::process::exit(1);
    });

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    let connection = db::establish_connection(&config.database_url).unwrap_or_else(|err| {
        error!(database_url = %config.database_url, error = %err, "Failed to open database");
        std::process::exit(1);
    });

    info!(database_url = %config.database_url, "Connected to database");

    let app_state = DefaultAppState::new(Arc::new(Mutex::new(connection)));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, app_state).await,
        Command::CreateUser {
            username,
            email,
            full_name,
        } => {
            let new_user = NewUser { username, email };
            let full_name = full_name.unwrap_or_default();
            match app_state.user_repo().create(&new_user, &full_name).await {
                Ok(user) => info!(id = user.id, username = %user.username, "Created user"),
                Err(err) => {
                    error!(username = %new_user.username, error = %err, "Failed to create user");
                    std::process::exit(1);
                }
            }
        }
    }
}

async fn serve(config: Config, app_state: DefaultAppState) {
    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout)),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|err| {
            error!(bind_address = %config.bind_addr, error = %err, "Failed to bind to address");
            std::process::exit(1);
        });

    info!(bind_address = %config.bind_addr, "Server running");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight requests");
}
