use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;
use std::sync::Arc;

use lendhub_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::TwilioService,
    handlers,
    middlewares::create_cors,
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to connect to the database");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.access_secret,
        &config.jwt.refresh_secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let twilio_service = TwilioService::new(config.twilio.clone());
    if !twilio_service.is_configured() {
        log::warn!("Twilio is not configured; SMS delivery is disabled");
    }

    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        twilio_service.clone(),
        config.otp.clone(),
    );
    let user_service = UserService::new(pool.clone());
    let membership_service = MembershipService::new(pool.clone());
    let notifier: Arc<dyn ApplicantNotifier> =
        Arc::new(SmsNotifier::new(pool.clone(), twilio_service));
    let loan_service = LoanService::new(pool.clone(), membership_service.clone(), notifier);
    let cash_lending_service = CashLendingService::new(pool.clone());
    let bank_partner_service = BankPartnerService::new(pool.clone());
    let content_service = ContentService::new(pool.clone());
    let enquiry_service = EnquiryService::new(pool.clone());
    let report_service = ReportService::new(pool.clone());

    if let Some(admin) = &config.admin {
        match auth_service.bootstrap_admin(admin).await {
            Ok(true) => log::info!("Bootstrap admin account created for {}", admin.email),
            Ok(false) => {}
            Err(e) => log::error!("Failed to create bootstrap admin: {e:?}"),
        }
    }

    tasks::spawn_all(membership_service.clone(), cash_lending_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&cors_config))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(loan_service.clone()))
            .app_data(web::Data::new(membership_service.clone()))
            .app_data(web::Data::new(cash_lending_service.clone()))
            .app_data(web::Data::new(bank_partner_service.clone()))
            .app_data(web::Data::new(content_service.clone()))
            .app_data(web::Data::new(enquiry_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::loan_config)
                    .configure(handlers::membership_config)
                    .configure(handlers::cash_lending_config)
                    .configure(handlers::bank_partner_config)
                    .configure(handlers::content_config)
                    .configure(handlers::enquiry_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
