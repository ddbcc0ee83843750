use crate::error::RelayError;
use crate::relay_state::{RelayConfig, RelayState};
use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, web};
use futures::StreamExt;
use std::io::Write;

pub const CHAT_PATH: &str = "/api/chat";

const CORS_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Credentials", "true"),
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Methods",
        "GET,OPTIONS,PATCH,DELETE,POST,PUT",
    ),
    (
        "Access-Control-Allow-Headers",
        "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version",
    ),
];

/// Applied around the chat resource so framework-generated responses carry it too.
pub fn cors_headers() -> DefaultHeaders {
    CORS_HEADERS
        .into_iter()
        .fold(DefaultHeaders::new(), |headers, header| headers.add(header))
}

fn error_response(err: &RelayError, development: bool) -> HttpResponse {
    let (status, body) = err.to_response_parts(development);
    HttpResponse::build(status).json(body)
}

// No size cap: the whole body is buffered. A broken stream leaves an empty
// body, which then fails validation.
async fn read_body(mut payload: web::Payload) -> web::Bytes {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        match chunk {
            Ok(chunk) => body.extend_from_slice(&chunk),
            Err(e) => {
                log::warn!("Failed to read request body: {}", e);
                return web::Bytes::new();
            }
        }
    }
    body.freeze()
}

#[get("/health")]
pub async fn health(_req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

/// Single chat endpoint; the method is checked here rather than by routing.
pub async fn chat(
    req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<RelayState>,
) -> HttpResponse {
    let development = app_state.is_development();
    if req.method() == Method::OPTIONS {
        return HttpResponse::Ok().finish();
    }
    if req.method() != Method::POST {
        return error_response(&RelayError::MethodNotAllowed, development);
    }

    let body = read_body(payload).await;
    match app_state.relay(&body).await {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(e @ RelayError::InvalidMessage) => error_response(&e, development),
        Err(e @ RelayError::MissingApiKey) => {
            log::error!("OpenAI API key is not configured in the environment");
            error_response(&e, development)
        }
        Err(e) => {
            log::error!("OpenAI API Error: {}", e);
            error_response(&e, development)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::resource(CHAT_PATH)
            .wrap(cors_headers())
            .route(web::route().to(chat)),
    );
}

pub fn init_logging(level: log::LevelFilter) {
    // tests and embedders may already have a logger
    let res = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .try_init();
    if let Err(e) = res {
        log::debug!("Keeping existing logger: {}", e);
    }
}

pub async fn startup(relay_config: RelayConfig, relay_state: RelayState) -> std::io::Result<()> {
    let app_state = web::Data::new(relay_state);

    init_logging(relay_config.log_level);
    log::info!(
        "Starting server at {}:{}",
        relay_config.host,
        relay_config.port
    );
    if app_state.api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set; chat requests will fail until it is configured");
    }

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((relay_config.host, relay_config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
