use crate::{
    config::ServerConfig, error::SketchError, lightx::SketchProvider, logger, models::GenerateForm,
    pipeline::Orchestrator, validation::MAX_SKETCH_BYTES,
};
use actix_multipart::{
    form::{text::Text, MultipartForm, MultipartFormConfig},
    MultipartError,
};
use actix_web::{
    dev::Payload,
    error::{JsonPayloadError, PayloadError, UrlencodedError},
    http::{
        header::{ContentDisposition, DispositionParam, DispositionType},
        StatusCode,
    },
    mime, web, App, FromRequest, HttpMessage, HttpRequest, HttpResponse, HttpServer,
    ResponseError,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Base64 length of a sketch at the size cap.
const MAX_SKETCH_BASE64_CHARS: usize = (MAX_SKETCH_BYTES + 2) / 3 * 4;
/// Prompt, data-URI prefix and field framing.
const BODY_HEADROOM: usize = 64 * 1024;

/// Limit for JSON and multipart bodies, which carry the base64 text as is.
pub const MAX_BODY_BYTES: usize = MAX_SKETCH_BASE64_CHARS + BODY_HEADROOM;

/// Limit for url-encoded bodies. `+`, `/` and `=` each encode to three bytes.
pub const MAX_FORM_BYTES: usize = MAX_SKETCH_BASE64_CHARS * 3 + BODY_HEADROOM;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl ResponseError for SketchError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self)).json(ErrorBody {
            error: self.to_string(),
            details: self.details(),
        })
    }
}

/// `FormData` as posted by a browser.
#[derive(MultipartForm)]
struct SketchUpload {
    prompt: Option<Text<String>>,
    sketch: Option<Text<String>>,
}

impl From<SketchUpload> for GenerateForm {
    fn from(upload: SketchUpload) -> Self {
        GenerateForm {
            prompt: upload.prompt.map(|text| text.0),
            sketch: upload.sketch.map(|text| text.0),
        }
    }
}

fn form_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        UrlencodedError::Overflow { .. } => SketchError::PayloadTooLarge {
            limit: MAX_FORM_BYTES,
        },
        UrlencodedError::ContentType => SketchError::UnsupportedMediaType(
            "expected application/x-www-form-urlencoded".into(),
        ),
        other => SketchError::UnreadableBody(other.to_string()),
    }
    .into()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            SketchError::PayloadTooLarge {
                limit: MAX_BODY_BYTES,
            }
        }
        JsonPayloadError::ContentType => {
            SketchError::UnsupportedMediaType("expected application/json".into())
        }
        other => SketchError::UnreadableBody(other.to_string()),
    }
    .into()
}

fn multipart_error(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        MultipartError::Payload(PayloadError::Overflow) => SketchError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        },
        other => SketchError::UnreadableBody(other.to_string()),
    }
    .into()
}

/// Reads `prompt` and `sketch` from a url-encoded, JSON or multipart body.
async fn read_form(
    req: &HttpRequest,
    mut payload: Payload,
) -> Result<GenerateForm, actix_web::Error> {
    let content_type = req
        .mime_type()
        .map_err(|e| SketchError::UnsupportedMediaType(e.to_string()))?;
    let Some(content_type) = content_type else {
        return Err(SketchError::UnsupportedMediaType("missing Content-Type".into()).into());
    };

    if content_type.type_() == mime::MULTIPART && content_type.subtype() == mime::FORM_DATA {
        let upload = MultipartForm::<SketchUpload>::from_request(req, &mut payload).await?;
        Ok(upload.into_inner().into())
    } else if content_type.type_() == mime::APPLICATION
        && content_type.subtype() == mime::WWW_FORM_URLENCODED
    {
        let form = web::Form::<GenerateForm>::from_request(req, &mut payload).await?;
        Ok(form.into_inner())
    } else if content_type.type_() == mime::APPLICATION
        && (content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON))
    {
        let json = web::Json::<GenerateForm>::from_request(req, &mut payload).await?;
        Ok(json.into_inner())
    } else {
        Err(SketchError::UnsupportedMediaType(content_type.essence_str().to_string()).into())
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

async fn generate<P: SketchProvider + 'static>(
    orchestrator: web::Data<Orchestrator<P>>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, actix_web::Error> {
    let request_id = Uuid::new_v4();
    log::debug!("📥 Received request to /generate [req:{}]", request_id);

    let form = read_form(&req, payload.into_inner()).await.map_err(|e| {
        log::warn!("⚠️  Rejected body [req:{}]: {}", request_id, e);
        e
    })?;

    let _timer = logger::timer(&format!("generate [req:{}]", request_id));
    let image = orchestrator.run(&form).await?;

    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(image.filename.to_string())],
        })
        .body(image.data))
}

/// Registers the routes and body limits. The caller provides
/// `web::Data<Orchestrator<P>>`.
pub fn configure<P: SketchProvider + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::FormConfig::default()
            .limit(MAX_FORM_BYTES)
            .error_handler(form_error),
    )
    .app_data(
        web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(json_error),
    )
    .app_data(
        MultipartFormConfig::default()
            .total_limit(MAX_BODY_BYTES)
            .memory_limit(MAX_BODY_BYTES)
            .error_handler(multipart_error),
    )
    .route("/health", web::get().to(health))
    .route("/generate", web::post().to(generate::<P>));
}

pub async fn run<P: SketchProvider + 'static>(
    orchestrator: Orchestrator<P>,
    config: &ServerConfig,
) -> std::io::Result<()> {
    let orchestrator = web::Data::new(orchestrator);
    HttpServer::new(move || {
        App::new()
            .app_data(orchestrator.clone())
            .configure(configure::<P>)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
