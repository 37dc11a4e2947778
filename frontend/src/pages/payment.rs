//! Payment registration: receipt upload, OCR extraction, then the payment itself.

use gloo_file::futures::read_as_data_url;
use tracing::{info, warn};
use wasm_bindgen_futures::spawn_local;
use web_sys::{File, HtmlInputElement};
use yew::prelude::*;

use crate::api::ApiClient;
use crate::components::{bind_input, Modal};
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::model::{Activity, Payer, PaymentRequest};
use crate::money::{format_brl, today_iso};

async fn submit_payment(
    client: &ApiClient,
    activity: &Activity,
    payer: Payer,
    receipt_file: &File,
    manual_value: &str,
) -> ApiResult<&'static str> {
    let receipt = client.process_receipt(receipt_file).await?;
    let request = PaymentRequest::build(activity, payer, &receipt, manual_value, &today_iso())?;
    client.register_payment(&request).await
}

#[derive(Properties, PartialEq)]
pub struct PaymentModalProps {
    pub activity: Activity,
    pub on_close: Callback<()>,
    /// Called with the confirmation to show.
    pub on_paid: Callback<String>,
}

#[function_component(PaymentModal)]
pub fn payment_modal(props: &PaymentModalProps) -> Html {
    let ctx = use_context::<AppContext>();
    let Some(ctx) = ctx else {
        return html! {};
    };
    let file = use_state(|| None::<File>);
    let preview = use_state(|| None::<String>);
    let payer = use_state(|| None::<Payer>);
    let manual_value = use_state(String::new);
    let busy = use_state(|| false);
    let error = use_state(|| None::<String>);

    let on_file_change = {
        let file = file.clone();
        let preview = preview.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let selected = input.files().and_then(|files| files.get(0));
            file.set(selected.clone());
            preview.set(None);
            if let Some(selected) = selected {
                let preview = preview.clone();
                spawn_local(async move {
                    match read_as_data_url(&gloo_file::File::from(selected)).await {
                        Ok(url) => preview.set(Some(url)),
                        Err(err) => warn!(%err, "could not preview receipt"),
                    }
                });
            }
        })
    };

    let on_confirm = {
        let ctx = ctx.clone();
        let activity = props.activity.clone();
        let file = file.clone();
        let payer = payer.clone();
        let manual_value = manual_value.clone();
        let busy = busy.clone();
        let error = error.clone();
        let on_paid = props.on_paid.clone();
        Callback::from(move |_| {
            let Some(receipt_file) = (*file).clone() else {
                error.set(Some("Por favor, selecione um comprovante.".to_string()));
                return;
            };
            let Some(chosen) = *payer else {
                error.set(Some("Por favor, selecione um pagador.".to_string()));
                return;
            };
            error.set(None);
            busy.set(true);

            let ctx = ctx.clone();
            let activity = activity.clone();
            let manual = (*manual_value).clone();
            let busy = busy.clone();
            let error = error.clone();
            let on_paid = on_paid.clone();
            spawn_local(async move {
                let result = submit_payment(&ctx.client(), &activity, chosen, &receipt_file, &manual).await;
                busy.set(false);
                match result {
                    Ok(message) => {
                        info!(activity = %activity.activity, payer = chosen.label(), "payment registered");
                        on_paid.emit(message.to_string());
                    }
                    Err(err) => error.set(Some(ctx.report("register payment", &err))),
                }
            });
        })
    };

    let activity = &props.activity;
    html! {
        <Modal title="Registrar Pagamento" on_close={props.on_close.clone()}>
            <div class="space-y-4 text-sm">
                <div class="grid grid-cols-2 gap-2 bg-secondary/40 rounded-lg p-3">
                    <span class="text-muted-foreground">{"Atividade"}</span>
                    <span class="font-medium text-foreground">{ activity.activity_label().to_string() }</span>
                    <span class="text-muted-foreground">{"Setor"}</span>
                    <span class="font-medium text-foreground">{ activity.sector_label().to_string() }</span>
                    <span class="text-muted-foreground">{"Valor pendente"}</span>
                    <span class="font-medium text-foreground">{ format_brl(activity.remaining()) }</span>
                </div>

                <div class="space-y-1">
                    <label class="font-medium text-foreground">{"Comprovante"}</label>
                    <input type="file" accept="image/*" onchange={on_file_change} class="w-full text-sm" />
                    if let Some(url) = &*preview {
                        <img src={url.clone()} alt="Pré-visualização do comprovante" class="mt-2 max-h-48 rounded-lg border border-border" />
                    }
                </div>

                <div class="space-y-1">
                    <span class="font-medium text-foreground">{"Pagador"}</span>
                    <div class="flex gap-4">
                        { for Payer::ALL.into_iter().map(|p| {
                            let payer = payer.clone();
                            html! {
                                <label class="flex items-center gap-2">
                                    <input type="radio" name="payer" value={p.key()} checked={*payer == Some(p)}
                                        onchange={Callback::from(move |_| payer.set(Some(p)))} />
                                    { p.label() }
                                </label>
                            }
                        }) }
                    </div>
                </div>

                <div class="space-y-1">
                    <label class="font-medium text-foreground">{"Valor (opcional)"}</label>
                    <input
                        type="text"
                        placeholder="Usa o valor lido do comprovante"
                        class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                        value={(*manual_value).clone()}
                        oninput={bind_input(&manual_value)}
                    />
                </div>

                if let Some(msg) = &*error {
                    <div class="text-sm text-red-500">{ msg.clone() }</div>
                }

                <button
                    type="button"
                    class="w-full bg-primary text-primary-foreground py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                    disabled={*busy}
                    onclick={on_confirm}
                >
                    { if *busy { "Processando pagamento..." } else { "Confirmar Pagamento" } }
                </button>
            </div>
        </Modal>
    }
}
