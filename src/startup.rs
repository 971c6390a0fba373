use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::{AuthService, IdentityResolver, RefreshTokenStore, SessionIssuer, TokenCodec};
use crate::configuration::{ApplicationSettings, JwtSettings};
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::IdentityMiddleware;
use crate::routes::{
    get_current_user, health_check, idioms_by_letter, idioms_by_synonym, login, logout,
    random_idiom, refresh, register, search_idioms,
};
use crate::store::{IdiomStore, Stores};

pub fn run(
    listener: TcpListener,
    stores: Stores,
    jwt_config: JwtSettings,
    application: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let codec = TokenCodec::new(&jwt_config);
    let refresh_tokens =
        RefreshTokenStore::new(stores.refresh_tokens.clone(), jwt_config.refresh_token_expiry);
    let sessions = SessionIssuer::new(codec.clone(), refresh_tokens);

    let auth_service = web::Data::new(AuthService::new(stores.users.clone(), sessions));
    let resolver = IdentityResolver::new(codec, stores.users.clone());
    let idioms: web::Data<dyn IdiomStore> = web::Data::from(stores.idioms.clone());
    let application = web::Data::new(application);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth_service.clone())
            .app_data(idioms.clone())
            .app_data(application.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::Validation(ValidationError::InvalidFormat(format!(
                    "request body: {}",
                    err
                )))
                .into()
            }))

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout))
                    .service(
                        web::resource("/me")
                            .wrap(IdentityMiddleware::new(resolver.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )

            // Protected routes (require a live identity)
            .service(
                web::scope("/idioms")
                    .wrap(IdentityMiddleware::new(resolver.clone()))
                    .route("/search/{phrase}", web::get().to(search_idioms))
                    .route("/by-letter/{letter}", web::get().to(idioms_by_letter))
                    .route("/by-synonym/{synonym}", web::get().to(idioms_by_synonym))
                    .route("/random", web::get().to(random_idiom)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
