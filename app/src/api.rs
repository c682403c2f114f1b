use actix_web::{http::StatusCode, middleware, web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::cnpj::{self, CnpjError};
use crate::config::ServerConfig;
use crate::grouping;
use crate::models::{CheckDigitsResponse, CnpjResponse, ErrorResponse, HealthResponse, ValidationItem};
use crate::ui;

pub struct AppState {
    pub started_at: DateTime<Local>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Cnpj(#[from] CnpjError),

    #[error("Corpo da requisição inválido: {0}")]
    Payload(String),
}

impl ApiError {
    fn input(&self) -> Option<String> {
        match self {
            ApiError::Cnpj(CnpjError::OutOfRange { value })
            | ApiError::Cnpj(CnpjError::BatchElementOutOfRange { value, .. })
            | ApiError::Cnpj(CnpjError::BaseOutOfRange { value }) => Some(value.to_string()),
            ApiError::Cnpj(CnpjError::Malformed { input }) => Some(input.clone()),
            ApiError::Payload(_) => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            input: self.input(),
        })
    }
}

pub async fn consultar_cnpj(raw: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let decomposition = cnpj::parse_integer(&raw)
        .and_then(cnpj::decompose_and_validate)
        .inspect_err(|e| {
            warn!(input = %raw, error = %e, "CNPJ rejeitado");
        })?;

    debug!(
        cnpj = decomposition.cnpj.value(),
        region = decomposition.region.code(),
        valid = decomposition.valid,
        "CNPJ decomposto"
    );
    Ok(HttpResponse::Ok().json(CnpjResponse::from(decomposition)))
}

pub async fn agrupar_cnpjs(cnpjs: web::Json<Vec<i64>>) -> Result<HttpResponse, ApiError> {
    let groups = grouping::group_batch(&cnpjs).inspect_err(|e| {
        warn!(batch_size = cnpjs.len(), error = %e, "Lote rejeitado");
    })?;

    debug!(batch_size = cnpjs.len(), groups = groups.len(), "Lote agrupado");
    Ok(HttpResponse::Ok().json(groups))
}

pub async fn validar_lote(cnpjs: web::Json<Vec<i64>>) -> Result<HttpResponse, ApiError> {
    let parsed = grouping::parse_batch(&cnpjs).inspect_err(|e| {
        warn!(batch_size = cnpjs.len(), error = %e, "Lote rejeitado");
    })?;

    let items: Vec<ValidationItem> = parsed.into_iter().map(ValidationItem::from).collect();
    debug!(
        batch_size = items.len(),
        valid = items.iter().filter(|i| i.valid).count(),
        "Lote validado"
    );
    Ok(HttpResponse::Ok().json(items))
}

pub async fn calcular_digitos(base: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let result = cnpj::parse_integer(&base)
        .and_then(cnpj::compute_check_digits)
        .inspect_err(|e| {
            warn!(input = %base, error = %e, "Base rejeitada");
        })?;

    debug!(base = result.base, cnpj = result.cnpj.value(), "Dígitos calculados");
    Ok(HttpResponse::Ok().json(CheckDigitsResponse::from(result)))
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "API CNPJ está funcionando".to_string(),
        started_at: state.started_at.to_rfc3339(),
    })
}

/// Registra as rotas. O limite de payload vale para os lotes JSON.
pub fn configure(cfg: &mut web::ServiceConfig, max_payload: usize) {
    let json_config = web::JsonConfig::default()
        .limit(max_payload)
        .error_handler(|err, _req| ApiError::Payload(err.to_string()).into());

    cfg.app_data(json_config)
        .route("/cnpj/check-digits/{base}", web::get().to(calcular_digitos))
        .route("/cnpj/group", web::post().to(agrupar_cnpjs))
        .route("/cnpj/validate", web::post().to(validar_lote))
        .route("/cnpj/{cnpj}", web::get().to(consultar_cnpj))
        .route("/health", web::get().to(health_check));
}

pub async fn start_server(config: &ServerConfig) -> anyhow::Result<()> {
    let app_state = web::Data::new(AppState {
        started_at: Local::now(),
    });

    let address = config.address();
    let max_payload = config.max_payload;

    ui::print_header("🌐 Servidor API REST");
    ui::print_success(&format!("Servidor iniciando em http://{}", address));
    ui::print_info("Endpoints disponíveis:");
    use colored::Colorize;
    println!("  {} GET  /cnpj/{{cnpj}}                - Decompõe e valida um CNPJ", "•".cyan());
    println!("  {} POST /cnpj/group                 - Agrupa um lote de CNPJs por região", "•".cyan());
    println!("  {} POST /cnpj/validate              - Valida um lote de CNPJs", "•".cyan());
    println!("  {} GET  /cnpj/check-digits/{{base}}   - Calcula os dígitos verificadores", "•".cyan());
    println!("  {} GET  /health                     - Verifica status do servidor", "•".cyan());
    ui::print_verbose(&format!("Exemplo: curl http://{}/cnpj/11222333000181", address));
    ui::print_verbose(&format!(
        "Workers: {} | Limite de payload: {} bytes",
        config.workers, max_payload
    ));
    ui::print_separator();

    info!(%address, workers = config.workers, max_payload, "Iniciando servidor");

    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(|cfg| configure(cfg, max_payload))
    })
    .bind(&address)
    .with_context(|| format!("Falha ao abrir porta em {}", address))?
    .workers(config.workers)
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    const LIMIT: usize = 1024;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState {
                        started_at: Local::now(),
                    }))
                    .configure(|cfg| configure(cfg, LIMIT)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn decomposes_valid_cnpj() {
        let app = app!();
        let req = test::TestRequest::get().uri("/cnpj/11222333000181").to_request();
        let body: CnpjResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            CnpjResponse {
                cnpj: 11222333000181,
                region: 11,
                branch: 181,
                valid: true,
                formatted: "11.222.333/0001-81".to_string(),
            }
        );
    }

    #[actix_web::test]
    async fn upper_bound_is_accepted() {
        let app = app!();
        let req = test::TestRequest::get().uri("/cnpj/99999999999999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn out_of_range_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::get().uri("/cnpj/100000000000000").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["input"], "100000000000000");
    }

    #[actix_web::test]
    async fn negative_and_malformed_are_bad_request() {
        let app = app!();
        for uri in ["/cnpj/-1", "/cnpj/abc", "/cnpj/11.222.333"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn groups_batch_by_region() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/cnpj/group")
            .set_json(json!([11222333000181_i64, 191, 11000000000100_i64, 11222333000181_i64]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            json!({
                "0": [191],
                "11": [11222333000181_i64, 11000000000100_i64, 11222333000181_i64]
            })
        );
    }

    #[actix_web::test]
    async fn empty_batch_groups_to_empty_object() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/cnpj/group")
            .set_json(json!([]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({}));
    }

    #[actix_web::test]
    async fn batch_with_out_of_range_element_is_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/cnpj/group")
            .set_json(json!([191, 100000000000000_i64]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn malformed_and_oversized_bodies_are_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/cnpj/group")
            .insert_header(("content-type", "application/json"))
            .set_payload("[1, \"dois\"]")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let big: Vec<i64> = vec![11222333000181; LIMIT];
        let req = test::TestRequest::post()
            .uri("/cnpj/group")
            .set_json(big)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn validates_batch_in_input_order() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/cnpj/validate")
            .set_json(json!([11222333000182_i64, 191]))
            .to_request();
        let body: Vec<ValidationItem> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            vec![
                ValidationItem { cnpj: 11222333000182, valid: false },
                ValidationItem { cnpj: 191, valid: true },
            ]
        );
    }

    #[actix_web::test]
    async fn computes_check_digits() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/cnpj/check-digits/112223330001")
            .to_request();
        let body: CheckDigitsResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.check_digits, "81");
        assert_eq!(body.cnpj, 11222333000181);
        assert_eq!(body.formatted, "11.222.333/0001-81");
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }
}
