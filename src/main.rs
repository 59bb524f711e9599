use actix_web::{web, App, HttpServer};
use tracing_subscriber::EnvFilter;
use webhook_receiver::config::{Config, LogFormat};
use webhook_receiver::{handlers, Application};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    configure_logging(&config);

    let app = Application::start(config).await?;
    let state = app.state.clone();

    tracing::info!("webhook receiver ready, starting http server");
    let server = HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::register_routes)
    })
    .bind(("0.0.0.0", 8080))?
    .run();

    server.await?;
    app.shutdown().await;
    Ok(())
}

fn configure_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
