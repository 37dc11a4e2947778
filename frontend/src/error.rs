use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures talking to the budget backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Erro de comunicação com o servidor: {0}")]
    Network(String),

    #[error("Sessão expirada. Faça login novamente.")]
    Unauthorized,

    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("Resposta inválida do servidor: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("Erro no navegador: {0}")]
    Browser(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds the error for a non-2xx response from its status line and body.
    pub fn from_response(status: u16, status_text: &str, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        let detail = server_detail(body).unwrap_or_else(|| {
            if status_text.is_empty() {
                format!("Erro {}", status)
            } else {
                format!("Erro {}: {}", status, status_text)
            }
        });
        ApiError::Status { status, detail }
    }
}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
            other => ApiError::Network(other.to_string()),
        }
    }
}

impl From<wasm_bindgen::JsValue> for ApiError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ApiError::Browser(format!("{:?}", value))
    }
}

/// Extracts FastAPI's `detail` field, which is either a string or a list of validation errors.
fn server_detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Failures while producing a report file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Erro ao gerar planilha: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Erro ao gerar PDF: {0}")]
    Pdf(String),

    #[error("Erro no navegador: {0}")]
    Browser(String),
}

impl From<wasm_bindgen::JsValue> for ExportError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ExportError::Browser(format!("{:?}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_surfaced() {
        let err = ApiError::from_response(
            404,
            "Not Found",
            r#"{"detail":"Atividade 'Piso' não encontrada"}"#,
        );
        assert_eq!(err.to_string(), "Atividade 'Piso' não encontrada");
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body = r#"{"detail":[{"loc":["body","payer"],"msg":"field required"},{"msg":"value is not a valid float"}]}"#;
        let err = ApiError::from_response(422, "Unprocessable Entity", body);
        assert_eq!(
            err,
            ApiError::Status {
                status: 422,
                detail: "field required; value is not a valid float".into()
            }
        );
    }

    #[test]
    fn plain_body_falls_back_to_status_line() {
        let err = ApiError::from_response(500, "Internal Server Error", "boom");
        assert_eq!(err.to_string(), "Erro 500: Internal Server Error");
        let err = ApiError::from_response(502, "", "");
        assert_eq!(err.to_string(), "Erro 502");
    }

    #[test]
    fn unauthorized_is_recognised() {
        let err = ApiError::from_response(401, "Unauthorized", r#"{"detail":"Credenciais inválidas"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(ApiError::Network("offline".into()).status_code(), None);
    }
}
