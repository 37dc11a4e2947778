use tracing::info;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::components::{bind_input, flash, page_shell, Notice, NoticeBanner};
use crate::config::{self, normalize_base_url, AppConfig, LOG_LEVELS};

#[function_component(SettingsPage)]
pub fn settings_page() -> Html {
    let config = use_context::<UseStateHandle<AppConfig>>();
    let Some(config) = config else {
        return html! {};
    };
    let api_url = use_state(|| config.api_base_url.clone());
    let log_level = use_state(|| config.log_level.clone());
    let notice = use_state(|| None::<Notice>);

    let on_level_change = {
        let log_level = log_level.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            log_level.set(select.value());
        })
    };

    let on_save = {
        let config = config.clone();
        let api_url = api_url.clone();
        let log_level = log_level.clone();
        let notice = notice.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let url = normalize_base_url(&api_url);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                flash(&notice, Notice::error("Informe uma URL começando com http:// ou https://."));
                return;
            }
            let next = AppConfig {
                api_base_url: url,
                log_level: (*log_level).clone(),
            };
            config::save_config(&next);
            info!(api = %next.api_base_url, level = %next.log_level, "settings saved");
            api_url.set(next.api_base_url.clone());
            config.set(next);
            flash(
                &notice,
                Notice::success("Configurações salvas. O nível de log vale a partir do próximo carregamento."),
            );
        })
    };

    let on_reset = {
        let config = config.clone();
        let api_url = api_url.clone();
        let log_level = log_level.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            let defaults = config::reset_config();
            info!(api = %defaults.api_base_url, "settings reset to defaults");
            api_url.set(defaults.api_base_url.clone());
            log_level.set(defaults.log_level.clone());
            config.set(defaults);
            flash(&notice, Notice::success("Configurações restauradas para o padrão."));
        })
    };

    let input_class = "w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary";

    html! {
        <>
            <NoticeBanner notice={(*notice).clone()} />
            { page_shell(
                "Configurações",
                html! {},
                html! {
                    <form class="bg-card rounded-lg p-6 border border-border max-w-2xl space-y-4" onsubmit={on_save}>
                        <h2 class="text-xl font-bold text-foreground">{"Servidor"}</h2>
                        <div class="space-y-1">
                            <label class="block text-sm font-medium text-foreground">{"URL da API"}</label>
                            <input type="url" class={input_class} value={(*api_url).clone()} oninput={bind_input(&api_url)} />
                            <p class="text-xs text-muted-foreground">{"Endereço do backend que fornece atividades, totais e pagamentos."}</p>
                        </div>
                        <div class="space-y-1">
                            <label class="block text-sm font-medium text-foreground">{"Nível de log"}</label>
                            <select class={input_class} onchange={on_level_change}>
                                { for LOG_LEVELS.iter().map(|level| html! {
                                    <option value={*level} selected={*level == log_level.as_str()}>{ *level }</option>
                                }) }
                            </select>
                            <p class="text-xs text-muted-foreground">{"Mensagens aparecem no console do navegador."}</p>
                        </div>
                        <div class="flex gap-2 pt-2">
                            <button type="submit" class="bg-primary text-primary-foreground px-4 py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity">{"Salvar"}</button>
                            <button type="button" class="bg-secondary text-foreground px-4 py-2 rounded-lg font-semibold hover:opacity-80" onclick={on_reset}>{"Restaurar padrões"}</button>
                        </div>
                    </form>
                }
            ) }
        </>
    }
}
