use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::money;

fn null_as_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or_default())
}

/// One line-item of the construction budget.
///
/// The three list endpoints disagree on field names (`value` vs
/// `total_value`) and on nullability of the payer columns; this type
/// accepts all of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(alias = "total_value", default, deserialize_with = "null_as_zero")]
    pub value: Decimal,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub diego_ana: Decimal,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub alex_rute: Decimal,
    #[serde(default)]
    pub valor_restante: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityStatus {
    Pending,
    Paid,
}

impl ActivityStatus {
    pub fn label(self) -> &'static str {
        match self {
            ActivityStatus::Pending => "Pendente",
            ActivityStatus::Paid => "Concluído",
        }
    }
}

impl Activity {
    pub fn paid_total(&self) -> Decimal {
        self.diego_ana + self.alex_rute
    }

    pub fn remaining(&self) -> Decimal {
        self.valor_restante
            .unwrap_or_else(|| self.value - self.paid_total())
    }

    pub fn status(&self) -> ActivityStatus {
        if self.paid_total() >= self.value {
            ActivityStatus::Paid
        } else {
            ActivityStatus::Pending
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status() == ActivityStatus::Paid
    }

    pub fn sector_label(&self) -> &str {
        match self.sector.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => "-",
        }
    }

    pub fn activity_label(&self) -> &str {
        if self.activity.trim().is_empty() {
            "-"
        } else {
            &self.activity
        }
    }

    pub fn date_label(&self) -> &str {
        match self.date.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => "-",
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(money::parse_date)
    }

    /// The cells a table row shows, as displayed. Search matches against these.
    pub fn display_cells(&self) -> Vec<String> {
        vec![
            self.sector_label().to_string(),
            self.activity_label().to_string(),
            money::format_brl(self.value),
            money::format_brl(self.diego_ana),
            money::format_brl(self.alex_rute),
            self.date_label().to_string(),
            self.status().label().to_string(),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Payer {
    DiegoAna,
    AlexRute,
}

impl Payer {
    pub const ALL: [Payer; 2] = [Payer::DiegoAna, Payer::AlexRute];

    /// Name as shown and as the backend expects it in `payer`.
    pub fn label(self) -> &'static str {
        match self {
            Payer::DiegoAna => "Diego-Ana",
            Payer::AlexRute => "Alex-Rute",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Payer::DiegoAna => "diego",
            Payer::AlexRute => "alex",
        }
    }

    pub fn from_key(key: &str) -> Option<Payer> {
        Payer::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn share(self, activity: &Activity) -> Decimal {
        match self {
            Payer::DiegoAna => activity.diego_ana,
            Payer::AlexRute => activity.alex_rute,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Payer::DiegoAna => "#3B82F6",
            Payer::AlexRute => "#FBBF24",
        }
    }
}

/// Raw add/edit form input, as typed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityForm {
    pub activity: String,
    pub value: String,
    pub sector: String,
    /// `YYYY-MM-DD` from the date input.
    pub date: String,
}

/// Validated form, field names as the backend's form handler reads them.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityPayload {
    pub atividade: String,
    pub valor: String,
    pub setor: String,
    pub data: String,
}

impl ActivityForm {
    pub fn from_activity(activity: &Activity) -> Self {
        ActivityForm {
            activity: activity.activity.clone(),
            value: money::to_wire_amount(activity.value),
            sector: activity.sector.clone().unwrap_or_default(),
            date: activity.date.as_deref().map(money::br_to_iso).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> ApiResult<ActivityPayload> {
        let activity = self.activity.trim();
        let sector = self.sector.trim();
        let date = self.date.trim();
        let value = self.value.trim();
        if activity.is_empty() || sector.is_empty() || date.is_empty() || value.is_empty() {
            return Err(ApiError::Validation("Preencha todos os campos.".into()));
        }
        let amount = money::parse_brl(value)
            .filter(|v| v.is_sign_positive() && !v.is_zero())
            .ok_or_else(|| ApiError::Validation("O valor deve ser um número positivo.".into()))?;
        Ok(ActivityPayload {
            atividade: activity.to_string(),
            valor: money::to_wire_amount(amount),
            setor: sector.to_string(),
            data: date.to_string(),
        })
    }
}

/// Fields the OCR endpoint managed to read from a receipt.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ReceiptExtraction {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub activity: String,
    pub sector: Option<String>,
    pub payer: String,
    pub value: String,
    pub date: String,
}

impl PaymentRequest {
    /// Combines the target activity, the chosen payer and the receipt.
    /// A non-empty `manual_value` overrides whatever OCR read.
    pub fn build(
        activity: &Activity,
        payer: Payer,
        receipt: &ReceiptExtraction,
        manual_value: &str,
        today_iso: &str,
    ) -> ApiResult<PaymentRequest> {
        let manual_value = manual_value.trim();
        let amount = if manual_value.is_empty() {
            receipt.value.as_deref().and_then(money::parse_brl).ok_or_else(|| {
                ApiError::Validation(
                    "Não foi possível identificar o valor no comprovante. Informe o valor manualmente."
                        .into(),
                )
            })?
        } else {
            money::parse_brl(manual_value)
                .ok_or_else(|| ApiError::Validation("Valor informado inválido.".into()))?
        };
        if amount.is_sign_negative() || amount.is_zero() {
            return Err(ApiError::Validation("O valor do pagamento deve ser positivo.".into()));
        }
        let date = receipt
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(today_iso)
            .to_string();
        Ok(PaymentRequest {
            activity: activity.activity.clone(),
            sector: activity
                .sector
                .clone()
                .filter(|s| !s.trim().is_empty()),
            payer: payer.label().to_string(),
            value: money::to_wire_amount(amount),
            date,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TotalValue {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TotalPaid {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_pago: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DiegoPaid {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_pago_diego: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlexPaid {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_pago_alex: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn activity(value: &str, diego: &str, alex: &str) -> Activity {
        Activity {
            id: 1,
            activity: "Piso".into(),
            sector: Some("Cozinha".into()),
            value: dec(value),
            date: Some("10/01/2024".into()),
            diego_ana: dec(diego),
            alex_rute: dec(alex),
            valor_restante: None,
            status: None,
        }
    }

    #[test]
    fn decodes_all_activities_payload() {
        let raw = r#"[{"id":3,"activity":"Pintura","sector":null,"value":1500.5,"date":"02/02/2024","diego_ana":null,"alex_rute":200}]"#;
        let list: Vec<Activity> = serde_json::from_str(raw).unwrap();
        assert_eq!(list[0].value, dec("1500.5"));
        assert_eq!(list[0].diego_ana, Decimal::ZERO);
        assert_eq!(list[0].alex_rute, dec("200"));
        assert_eq!(list[0].sector_label(), "-");
        assert_eq!(list[0].status(), ActivityStatus::Pending);
    }

    #[test]
    fn decodes_pending_payload_with_total_value_and_remaining() {
        let raw = r#"{"id":7,"activity":"Telhado","sector":"Externo","total_value":1000,"valor_restante":250,"date":null,"diego_ana":500,"alex_rute":250}"#;
        let a: Activity = serde_json::from_str(raw).unwrap();
        assert_eq!(a.value, dec("1000"));
        assert_eq!(a.remaining(), dec("250"));
        assert_eq!(a.date_label(), "-");
    }

    #[test]
    fn status_is_paid_once_both_shares_cover_value() {
        assert_eq!(activity("100", "50", "49.99").status(), ActivityStatus::Pending);
        assert_eq!(activity("100", "50", "50").status(), ActivityStatus::Paid);
        assert_eq!(activity("100", "80", "40").status(), ActivityStatus::Paid);
        assert_eq!(activity("100", "80", "40").remaining(), dec("-20"));
    }

    #[test]
    fn form_validation_normalises_value() {
        let form = ActivityForm {
            activity: " Piso ".into(),
            value: "1.250,50".into(),
            sector: "Sala".into(),
            date: "2024-05-01".into(),
        };
        let payload = form.validate().unwrap();
        assert_eq!(payload.atividade, "Piso");
        assert_eq!(payload.valor, "1250.5");
        assert_eq!(payload.data, "2024-05-01");
    }

    #[test]
    fn form_validation_rejects_missing_or_bad_values() {
        let mut form = ActivityForm {
            activity: "Piso".into(),
            value: "".into(),
            sector: "Sala".into(),
            date: "2024-05-01".into(),
        };
        assert!(matches!(form.validate(), Err(ApiError::Validation(_))));
        form.value = "-10".into();
        assert!(matches!(form.validate(), Err(ApiError::Validation(_))));
        form.value = "dez".into();
        assert!(matches!(form.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn edit_form_prefills_from_activity() {
        let form = ActivityForm::from_activity(&activity("1500.00", "0", "0"));
        assert_eq!(form.value, "1500");
        assert_eq!(form.date, "2024-01-10");
        assert_eq!(form.sector, "Cozinha");
    }

    #[test]
    fn payment_uses_receipt_value_and_date() {
        let receipt = ReceiptExtraction {
            value: Some("R$ 1.234,56".into()),
            date: Some("05/03/2024".into()),
            ..Default::default()
        };
        let req = PaymentRequest::build(&activity("5000", "0", "0"), Payer::AlexRute, &receipt, "", "2024-03-06").unwrap();
        assert_eq!(req.value, "1234.56");
        assert_eq!(req.date, "05/03/2024");
        assert_eq!(req.payer, "Alex-Rute");
        assert_eq!(req.sector.as_deref(), Some("Cozinha"));
    }

    #[test]
    fn payment_falls_back_to_today_and_manual_value() {
        let receipt = ReceiptExtraction::default();
        let a = activity("5000", "0", "0");
        let err = PaymentRequest::build(&a, Payer::DiegoAna, &receipt, "", "2024-03-06").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let req = PaymentRequest::build(&a, Payer::DiegoAna, &receipt, "300,00", "2024-03-06").unwrap();
        assert_eq!(req.value, "300");
        assert_eq!(req.date, "2024-03-06");
    }

    #[test]
    fn payment_serialises_missing_sector_as_null() {
        let mut a = activity("10", "0", "0");
        a.sector = Some("  ".into());
        let req = PaymentRequest::build(&a, Payer::DiegoAna, &ReceiptExtraction::default(), "10", "2024-01-01").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert!(json["sector"].is_null());
        assert_eq!(json["payer"], "Diego-Ana");
    }

    #[test]
    fn totals_tolerate_null_sums() {
        let t: TotalPaid = serde_json::from_str(r#"{"total_pago":null}"#).unwrap();
        assert_eq!(t.total_pago, Decimal::ZERO);
        let t: TotalValue = serde_json::from_str(r#"{"total":98765.43}"#).unwrap();
        assert_eq!(t.total, dec("98765.43"));
    }
}
