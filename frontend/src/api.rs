//! Client for the budget REST backend.
//!
//! Every call carries the session's bearer token. Failures are logged here
//! and returned as [`ApiError`]; callers decide what to show.

use gloo_net::http::{Request, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use web_sys::{File, FormData, UrlSearchParams};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    Activity, ActivityPayload, AlexPaid, DiegoPaid, LoginResponse, Payer, PaymentRequest,
    ReceiptExtraction, TotalPaid, TotalValue,
};
use crate::session::Session;

#[derive(Clone, Debug, PartialEq)]
pub struct ApiClient {
    config: AppConfig,
    token: Option<String>,
}

/// The four money KPIs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Totals {
    pub total_value: Decimal,
    pub total_paid: Decimal,
    pub paid_diego: Decimal,
    pub paid_alex: Decimal,
}

impl Totals {
    pub fn paid_by(&self, payer: Payer) -> Decimal {
        match payer {
            Payer::DiegoAna => self.paid_diego,
            Payer::AlexRute => self.paid_alex,
        }
    }
}

/// Everything the dashboard shows, fetched in one parallel round.
/// Lists fail independently so one broken endpoint does not blank the page.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardSnapshot {
    pub all: ApiResult<Vec<Activity>>,
    pub pending: ApiResult<Vec<Activity>>,
    pub paid: ApiResult<Vec<Activity>>,
    pub totals: Totals,
}

async fn check(response: Response) -> ApiResult<Response> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let status_text = response.status_text();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_response(status, &status_text, &body))
}

fn form_data(payload: &ActivityPayload) -> ApiResult<FormData> {
    let form = FormData::new()?;
    form.append_with_str("atividade", &payload.atividade)?;
    form.append_with_str("valor", &payload.valor)?;
    form.append_with_str("setor", &payload.setor)?;
    form.append_with_str("data", &payload.data)?;
    Ok(form)
}

/// Shown once a payment is accepted, whatever the server's own wording.
pub const PAYMENT_REGISTERED: &str = "Pagamento registrado com sucesso!";

const INVALID_CREDENTIALS: &str = "Usuário ou senha inválidos";

/// Keeps a zero in place of a failed total, unless the session is gone.
fn total_or_zero(result: ApiResult<Decimal>, what: &str) -> ApiResult<Decimal> {
    match result {
        Ok(v) => Ok(v),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
        Err(err) => {
            warn!(%err, what, "could not load total");
            Ok(Decimal::ZERO)
        }
    }
}

fn merge_totals(
    total_value: ApiResult<Decimal>,
    total_paid: ApiResult<Decimal>,
    paid_diego: ApiResult<Decimal>,
    paid_alex: ApiResult<Decimal>,
) -> ApiResult<Totals> {
    Ok(Totals {
        total_value: total_or_zero(total_value, "valor-total")?,
        total_paid: total_or_zero(total_paid, "valor-total-pago")?,
        paid_diego: total_or_zero(paid_diego, "valor-pago-diego")?,
        paid_alex: total_or_zero(paid_alex, "valor-pago-alex")?,
    })
}

/// A 401 from any list fails the whole snapshot; other list errors stay per list.
fn assemble_snapshot(
    all: ApiResult<Vec<Activity>>,
    pending: ApiResult<Vec<Activity>>,
    paid: ApiResult<Vec<Activity>>,
    totals: ApiResult<Totals>,
) -> ApiResult<DashboardSnapshot> {
    if [&all, &pending, &paid]
        .into_iter()
        .any(|list| matches!(list, Err(ApiError::Unauthorized)))
    {
        return Err(ApiError::Unauthorized);
    }
    Ok(DashboardSnapshot {
        all,
        pending,
        paid,
        totals: totals?,
    })
}

fn login_failure(err: ApiError) -> ApiError {
    match err {
        ApiError::Unauthorized => ApiError::Validation(INVALID_CREDENTIALS.into()),
        other => other,
    }
}

fn payment_confirmation(body: &serde_json::Value) -> &'static str {
    if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
        debug!(message, "payment accepted");
    }
    PAYMENT_REGISTERED
}

impl ApiClient {
    pub fn new(config: &AppConfig, session: Option<&Session>) -> Self {
        ApiClient {
            config: config.clone(),
            token: session.map(|s| s.token.clone()),
        }
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.authorize(Request::get(&url)).send().await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            ApiError::from(e)
        })?;
        let response = check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(&self, request: Request, url: &str) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            ApiError::from(e)
        })?;
        check(response).await
    }

    pub async fn list_activities(&self) -> ApiResult<Vec<Activity>> {
        self.get_json("atividades").await
    }

    pub async fn list_pending(&self) -> ApiResult<Vec<Activity>> {
        self.get_json("atividades-pendentes").await
    }

    pub async fn list_paid(&self) -> ApiResult<Vec<Activity>> {
        self.get_json("atividades-pagas").await
    }

    pub async fn total_value(&self) -> ApiResult<Decimal> {
        Ok(self.get_json::<TotalValue>("valor-total").await?.total)
    }

    pub async fn total_paid(&self) -> ApiResult<Decimal> {
        Ok(self.get_json::<TotalPaid>("valor-total-pago").await?.total_pago)
    }

    pub async fn paid_by(&self, payer: Payer) -> ApiResult<Decimal> {
        match payer {
            Payer::DiegoAna => Ok(self
                .get_json::<DiegoPaid>("valor-pago-diego")
                .await?
                .total_pago_diego),
            Payer::AlexRute => Ok(self
                .get_json::<AlexPaid>("valor-pago-alex")
                .await?
                .total_pago_alex),
        }
    }

    pub async fn totals(&self) -> ApiResult<Totals> {
        let (total_value, total_paid, paid_diego, paid_alex) = futures::join!(
            self.total_value(),
            self.total_paid(),
            self.paid_by(Payer::DiegoAna),
            self.paid_by(Payer::AlexRute),
        );
        merge_totals(total_value, total_paid, paid_diego, paid_alex)
    }

    pub async fn dashboard_snapshot(&self) -> ApiResult<DashboardSnapshot> {
        let (all, pending, paid, totals) = futures::join!(
            self.list_activities(),
            self.list_pending(),
            self.list_paid(),
            self.totals(),
        );
        assemble_snapshot(all, pending, paid, totals)
    }

    pub async fn add_activity(&self, payload: &ActivityPayload) -> ApiResult<serde_json::Value> {
        let url = self.url("add-activity");
        info!(activity = %payload.atividade, valor = %payload.valor, "adding activity");
        let request = self.authorize(Request::post(&url)).body(form_data(payload)?)?;
        let response = self.send(request, &url).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn edit_activity(
        &self,
        id: i64,
        payload: &ActivityPayload,
    ) -> ApiResult<serde_json::Value> {
        let url = self.url(&format!("edit-activity/{}", id));
        info!(id, activity = %payload.atividade, "editing activity");
        let request = self.authorize(Request::put(&url)).body(form_data(payload)?)?;
        let response = self.send(request, &url).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn delete_activity(&self, id: i64) -> ApiResult<()> {
        let url = self.url(&format!("delete-activity/{}", id));
        info!(id, "deleting activity");
        let request = self.authorize(Request::delete(&url)).build()?;
        self.send(request, &url).await?;
        Ok(())
    }

    pub async fn process_receipt(&self, file: &File) -> ApiResult<ReceiptExtraction> {
        let url = self.url("process-receipt");
        info!(file = %file.name(), size = file.size(), "sending receipt for extraction");
        let form = FormData::new()?;
        form.append_with_blob_and_filename("file", file, &file.name())?;
        let request = self.authorize(Request::post(&url)).body(form)?;
        let response = self.send(request, &url).await?;
        let extracted = response
            .json::<ReceiptExtraction>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        debug!(value = ?extracted.value, date = ?extracted.date, name = ?extracted.name, "receipt extracted");
        Ok(extracted)
    }

    pub async fn register_payment(&self, payment: &PaymentRequest) -> ApiResult<&'static str> {
        let url = self.url("register-payment");
        info!(activity = %payment.activity, payer = %payment.payer, value = %payment.value, "registering payment");
        let request = self.authorize(Request::post(&url)).json(payment)?;
        let response = self.send(request, &url).await?;
        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(payment_confirmation(&body))
    }

    /// Exchanges credentials for a token. Works without a session.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let url = self.url("token");
        info!(username, "logging in");
        let params = UrlSearchParams::new()?;
        params.append("username", username);
        params.append("password", password);
        let request = Request::post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(params.to_string())?;
        match self.send(request, &url).await {
            Ok(response) => response
                .json::<LoginResponse>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string())),
            Err(err) => Err(login_failure(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            detail: "Erro 500".into(),
        }
    }

    #[test]
    fn failed_totals_fall_back_to_zero() {
        let totals = merge_totals(
            Ok(dec("1000")),
            Err(server_error()),
            Ok(dec("300")),
            Err(ApiError::Network("offline".into())),
        )
        .unwrap();
        assert_eq!(totals.total_value, dec("1000"));
        assert_eq!(totals.total_paid, Decimal::ZERO);
        assert_eq!(totals.paid_by(Payer::DiegoAna), dec("300"));
        assert_eq!(totals.paid_by(Payer::AlexRute), Decimal::ZERO);
    }

    #[test]
    fn rejected_session_on_a_total_fails_the_totals() {
        let result = merge_totals(
            Ok(dec("1000")),
            Ok(dec("0")),
            Err(ApiError::Unauthorized),
            Ok(dec("0")),
        );
        assert_eq!(result, Err(ApiError::Unauthorized));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn rejected_session_on_any_list_fails_the_snapshot(#[case] which: usize) {
        let mut lists: Vec<ApiResult<Vec<Activity>>> = vec![Ok(vec![]), Ok(vec![]), Ok(vec![])];
        lists[which] = Err(ApiError::Unauthorized);
        let paid = lists.pop().unwrap();
        let pending = lists.pop().unwrap();
        let all = lists.pop().unwrap();
        let result = assemble_snapshot(all, pending, paid, Ok(Totals::default()));
        assert_eq!(result, Err(ApiError::Unauthorized));
    }

    #[test]
    fn other_list_errors_stay_with_their_list() {
        let snapshot = assemble_snapshot(
            Ok(vec![]),
            Err(server_error()),
            Ok(vec![]),
            Ok(Totals::default()),
        )
        .unwrap();
        assert_eq!(snapshot.pending, Err(server_error()));
        assert_eq!(snapshot.all, Ok(vec![]));
    }

    #[test]
    fn rejected_session_on_totals_fails_the_snapshot() {
        let result = assemble_snapshot(Ok(vec![]), Ok(vec![]), Ok(vec![]), Err(ApiError::Unauthorized));
        assert_eq!(result, Err(ApiError::Unauthorized));
    }

    #[rstest]
    #[case(ApiError::Unauthorized, ApiError::Validation("Usuário ou senha inválidos".into()))]
    #[case(ApiError::Network("offline".into()), ApiError::Network("offline".into()))]
    #[case(server_error(), server_error())]
    fn login_maps_only_401_to_bad_credentials(#[case] err: ApiError, #[case] expected: ApiError) {
        assert_eq!(login_failure(err), expected);
    }

    #[rstest]
    #[case(serde_json::json!({"message": "Payment registered successfully!", "activity": "Pintura"}))]
    #[case(serde_json::json!({}))]
    fn payment_confirmation_is_always_portuguese(#[case] body: serde_json::Value) {
        assert_eq!(payment_confirmation(&body), "Pagamento registrado com sucesso!");
    }
}
