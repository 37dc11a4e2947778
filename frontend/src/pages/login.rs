use tracing::{info, warn};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::ApiClient;
use crate::components::bind_input;
use crate::config::AppConfig;
use crate::session::{self, Session};

#[derive(Properties, PartialEq)]
pub struct AuthScreenProps {
    pub config: AppConfig,
    pub on_authenticated: Callback<Session>,
}

#[function_component(AuthScreen)]
pub fn auth_screen(props: &AuthScreenProps) -> Html {
    let username = use_state(String::new);
    let password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);

    let on_submit = {
        let username = username.clone();
        let password = password.clone();
        let error = error.clone();
        let loading = loading.clone();
        let config = props.config.clone();
        let on_authenticated = props.on_authenticated.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let username_val = username.trim().to_string();
            let password_val = (*password).clone();

            if username_val.is_empty() || password_val.is_empty() {
                error.set(Some("Informe usuário e senha.".to_string()));
                return;
            }

            loading.set(true);
            error.set(None);

            let client = ApiClient::new(&config, None);
            let error = error.clone();
            let loading = loading.clone();
            let on_authenticated = on_authenticated.clone();
            spawn_local(async move {
                match client.login(&username_val, &password_val).await {
                    Ok(response) => {
                        let session = Session::from_login(&response);
                        session::store(&session);
                        info!(user = %session.display_name(), admin = session.is_admin(), "logged in");
                        on_authenticated.emit(session);
                    }
                    Err(err) => {
                        warn!(%err, "login failed");
                        error.set(Some(err.to_string()));
                    }
                }
                loading.set(false);
            });
        })
    };

    html! {
        <div class="min-h-screen flex items-center justify-center bg-background">
            <div class="w-full max-w-md bg-card border border-border rounded-2xl shadow-lg p-8">
                <div class="text-center mb-6">
                    <h1 class="text-2xl font-bold text-foreground">{"Gestão de Gastos da Obra"}</h1>
                    <p class="text-sm text-muted-foreground mt-2">{"Entre para continuar."}</p>
                </div>

                <form class="space-y-4" onsubmit={on_submit}>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Usuário"}</label>
                        <input
                            type="text"
                            autocomplete="username"
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*username).clone()}
                            oninput={bind_input(&username)}
                        />
                    </div>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Senha"}</label>
                        <input
                            type="password"
                            autocomplete="current-password"
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*password).clone()}
                            oninput={bind_input(&password)}
                        />
                    </div>

                    if let Some(msg) = &*error {
                        <div class="text-sm text-red-500">{ msg.clone() }</div>
                    }

                    <button
                        type="submit"
                        class="w-full bg-primary text-primary-foreground py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                        disabled={*loading}
                    >
                        { if *loading { "Entrando..." } else { "Entrar" } }
                    </button>
                </form>
            </div>
        </div>
    }
}
