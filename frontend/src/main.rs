mod api;
mod charts;
mod components;
mod config;
mod context;
mod error;
mod export;
mod logging;
mod model;
mod money;
mod pages;
mod session;
mod stats;
mod storage;

use tracing::info;
use yew::prelude::*;

use crate::components::{Layout, Page};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::pages::{AuthScreen, ChartsPage, DashboardPage, SettingsPage};
use crate::session::Session;

#[function_component(App)]
fn app() -> Html {
    let active_page = use_state(|| Page::Dashboard);
    let config = use_state(config::load_config);
    let current_session = use_state(session::restore);

    let on_select = {
        let active_page = active_page.clone();
        Callback::from(move |page: Page| active_page.set(page))
    };

    let on_logout = {
        let current_session = current_session.clone();
        let active_page = active_page.clone();
        Callback::from(move |_: ()| {
            session::clear();
            info!("logged out");
            active_page.set(Page::Dashboard);
            current_session.set(None);
        })
    };

    let on_authenticated = {
        let current_session = current_session.clone();
        Callback::from(move |s: Session| current_session.set(Some(s)))
    };

    let Some(active_session) = (*current_session).clone() else {
        return html! { <AuthScreen config={(*config).clone()} {on_authenticated} /> };
    };

    let ctx = AppContext {
        config: (*config).clone(),
        session: active_session.clone(),
        on_unauthorized: on_logout.clone(),
    };

    let content = match *active_page {
        Page::Dashboard => html! { <DashboardPage /> },
        Page::Charts => html! { <ChartsPage /> },
        Page::Settings => html! { <SettingsPage /> },
    };

    html! {
        <ContextProvider<UseStateHandle<AppConfig>> context={config}>
            <ContextProvider<AppContext> context={ctx}>
                <Layout
                    active_page={*active_page}
                    {on_select}
                    {on_logout}
                    username={active_session.display_name()}
                    is_admin={active_session.is_admin()}
                >
                    { content }
                </Layout>
            </ContextProvider<AppContext>>
        </ContextProvider<UseStateHandle<AppConfig>>>
    }
}

fn main() {
    logging::init(&config::load_config());
    yew::Renderer::<App>::new().render();
}
