use crate::server::api::{self, ApiError, ProjectPayload, ServerContext};

const BRACKETS_PREFIX: &str = "/api/brackets/";

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type,
            body,
        }
    }

    fn json(body: String) -> Self {
        Self::ok("application/json", body)
    }
}

pub fn route_request(method: &str, path: &str, body: &str, ctx: &ServerContext) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    match (method, path) {
        ("GET", "/api/health") => respond(api::health_payload()),
        ("POST", "/api/standings") => respond(api::standings_payload(body, ctx)),
        ("POST", "/api/weeks") => respond(api::weeks_payload(body, ctx)),
        ("POST", "/api/outcomes") => respond(api::outcomes_payload(body)),
        ("POST", "/api/project") => match api::project_payload(body, ctx) {
            Ok(ProjectPayload::Json(payload)) => HttpResponse::json(payload),
            Ok(ProjectPayload::Csv(payload)) => HttpResponse::ok("text/csv; charset=utf-8", payload),
            Err(err) => api_error_response(err),
        },
        (method, path) if path.starts_with(BRACKETS_PREFIX) => {
            let Some(tournament) = tournament_segment(path) else {
                return error_response(400, "Bad Request", "tournament name is required");
            };
            match method {
                "GET" => respond(api::brackets_get_payload(&tournament, ctx)),
                "PUT" => respond(api::brackets_put_payload(&tournament, body, ctx)),
                _ => error_response(405, "Method Not Allowed", "Use GET or PUT"),
            }
        }
        (_, "/api/health" | "/api/standings" | "/api/weeks" | "/api/outcomes" | "/api/project") => {
            error_response(405, "Method Not Allowed", "Method not allowed for this route")
        }
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

/// Decoded tournament name from `/api/brackets/{tournament}`.
fn tournament_segment(path: &str) -> Option<String> {
    let raw = path.trim_start_matches(BRACKETS_PREFIX).trim_end_matches('/');
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    let decoded = urlencoding::decode(raw).ok()?;
    let trimmed = decoded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn respond(result: Result<String, ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json(payload),
        Err(err) => api_error_response(err),
    }
}

fn api_error_response(err: ApiError) -> HttpResponse {
    match err {
        ApiError::Validation(payload) => validation_error_response(400, "Bad Request", payload),
        err if err.is_client_error() => error_response(400, "Bad Request", &err.to_string()),
        err => {
            tracing::error!(error = %err, "request failed");
            error_response(500, "Internal Server Error", &err.to_string())
        }
    }
}

fn validation_error_response(
    status_code: u16,
    status_text: &'static str,
    payload: api::ValidationErrorResponse,
) -> HttpResponse {
    let fallback =
        "{\n  \"status\": \"error\",\n  \"message\": \"Validation failed\"\n}".to_string();

    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&payload).unwrap_or(fallback),
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}
