use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::ai_client::AiClient;
use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::logger::RequestLogger;
use crate::middleware::RouteGuard;
use crate::routes::{
    analyze_sentiment, check_username, current_user, delete_message, enhance_message,
    generate_message, get_messages, health_check, register, send_message, sign_in, sign_out,
    toggle_acceptance, verify_email,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let secure_cookies = settings.application.is_production();
    let jwt_config = settings.jwt.clone();

    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(settings.jwt.clone());
    let app_settings = web::Data::new(settings.application.clone());
    let email_client = web::Data::new(EmailClient::from_settings(&settings.email));
    let ai_client = web::Data::new(AiClient::from_settings(&settings.ai));

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)
            .wrap(RouteGuard::new(jwt_config.clone(), secure_cookies))

            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .app_data(app_settings.clone())
            .app_data(email_client.clone())
            .app_data(ai_client.clone())

            .route("/health_check", web::get().to(health_check))

            // Account lifecycle
            .route("/api/register", web::post().to(register))
            .route("/api/check-username", web::get().to(check_username))
            .route("/api/verify", web::post().to(verify_email))
            .route("/api/sign-in", web::post().to(sign_in))
            .route("/api/sign-out", web::post().to(sign_out))
            .route("/api/user", web::get().to(current_user))
            .route("/api/toggle-acceptance", web::post().to(toggle_acceptance))

            // Messages
            .route("/api/send-message", web::post().to(send_message))
            .route("/api/messages", web::get().to(get_messages))
            .route("/api/messages/{message_id}", web::delete().to(delete_message))

            // AI assistant
            .route("/api/ai/enhance", web::post().to(enhance_message))
            .route("/api/ai/generate", web::post().to(generate_message))
            .route("/api/ai/analyze-sentiment", web::post().to(analyze_sentiment))

            // Static pages (must be last to not override API routes)
            .service(fs::Files::new("/", "./public").index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
