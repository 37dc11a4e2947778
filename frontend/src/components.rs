use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use gloo_timers::callback::Timeout;
use web_sys::HtmlInputElement;
use yew::prelude::*;

const NOTICE_MS: u32 = 5_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Charts,
    Settings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatIcon {
    List,
    Clock,
    Wallet,
    Check,
    User,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

static NEXT_NOTICE: AtomicU32 = AtomicU32::new(1);

/// A toast message. `seq` tells apart two flashes with the same text.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    seq: u32,
}

impl Notice {
    fn new(kind: NoticeKind, text: String) -> Self {
        Notice {
            kind,
            text,
            seq: NEXT_NOTICE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Notice::new(NoticeKind::Success, text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice::new(NoticeKind::Error, text.into())
    }
}

/// Shows a notice. [`NoticeBanner`] hides it five seconds after it last changed.
pub fn flash(handle: &UseStateHandle<Option<Notice>>, notice: Notice) {
    handle.set(Some(notice));
}

fn notice_visible(notice: &Notice, expired: Option<u32>) -> bool {
    expired != Some(notice.seq)
}

/// Bumped to re-run a page's fetch effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshCounter(pub u32);

impl Reducible for RefreshCounter {
    type Action = ();

    fn reduce(self: Rc<Self>, _: ()) -> Rc<Self> {
        Rc::new(RefreshCounter(self.0.wrapping_add(1)))
    }
}

/// Text-input callback writing into a `String` state.
pub fn bind_input(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        state.set(input.value());
    })
}

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
    pub notice: Option<Notice>,
}

#[function_component(NoticeBanner)]
pub fn notice_banner(props: &NoticeBannerProps) -> Html {
    let expired = use_state(|| None::<u32>);
    {
        let expired = expired.clone();
        let seq = props.notice.as_ref().map(|n| n.seq);
        use_effect_with_deps(
            move |seq| {
                // Dropping the timeout cancels it.
                let timer = seq.map(|seq| Timeout::new(NOTICE_MS, move || expired.set(Some(seq))));
                move || drop(timer)
            },
            seq,
        );
    }
    match &props.notice {
        Some(notice) if notice_visible(notice, *expired) => {
            let class_name = match notice.kind {
                NoticeKind::Success => "fixed top-20 right-6 z-50 px-4 py-3 rounded-xl shadow-lg text-sm font-medium bg-green-100 text-green-800 border border-green-300",
                NoticeKind::Error => "fixed top-20 right-6 z-50 px-4 py-3 rounded-xl shadow-lg text-sm font-medium bg-red-100 text-red-800 border border-red-300",
            };
            html! { <div class={class_name} role="status">{ notice.text.clone() }</div> }
        }
        _ => html! {},
    }
}

#[derive(Properties, PartialEq)]
pub struct ModalProps {
    pub title: String,
    pub on_close: Callback<()>,
    pub children: Children,
}

#[function_component(Modal)]
pub fn modal(props: &ModalProps) -> Html {
    let on_close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_| on_close.emit(()))
    };
    html! {
        <div class="fixed inset-0 z-40 flex items-center justify-center bg-black/40">
            <div class="w-full max-w-lg bg-card border border-border rounded-2xl shadow-lg p-6 max-h-[90vh] overflow-y-auto">
                <div class="flex items-center justify-between mb-4">
                    <h3 class="text-lg font-bold text-foreground">{ props.title.clone() }</h3>
                    <button type="button" class="p-1 hover:bg-secondary rounded-full" aria-label="Fechar" onclick={on_close}>
                        { icon_x() }
                    </button>
                </div>
                { for props.children.iter() }
            </div>
        </div>
    }
}

#[function_component(Loader)]
pub fn loader() -> Html {
    html! {
        <div class="flex items-center justify-center py-10 text-muted-foreground text-sm gap-2">
            <span class="inline-block w-5 h-5 border-2 border-primary border-t-transparent rounded-full animate-spin"></span>
            {"Carregando..."}
        </div>
    }
}

pub fn page_shell(title: &'static str, actions: Html, children: Html) -> Html {
    html! {
        <div class="p-6 max-w-7xl mx-auto">
            <div class="flex flex-wrap items-center justify-between gap-3 pb-4 border-b border-border">
                <h1 class="text-2xl font-bold text-foreground">{ title }</h1>
                { actions }
            </div>
            <div class="pt-5 space-y-6">
                { children }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatCardProps {
    pub title: &'static str,
    pub value: String,
    pub icon: StatIcon,
}

#[function_component(StatCard)]
pub fn stat_card(props: &StatCardProps) -> Html {
    html! {
        <div class="bg-card p-6 rounded-[10px] shadow-sm border border-border flex justify-between items-start">
            <div>
                <p class="text-muted-foreground text-[10px] font-bold mb-1 tracking-widest uppercase">{ props.title }</p>
                <h3 class="text-2xl font-bold text-[#1D617A] tracking-tight">{ props.value.clone() }</h3>
            </div>
            <div class="p-3 bg-[#eef4f9] rounded-[10px]">
                {
                    match props.icon {
                        StatIcon::List => icon_list(),
                        StatIcon::Clock => icon_clock(),
                        StatIcon::Wallet => icon_wallet(),
                        StatIcon::Check => icon_check(),
                        StatIcon::User => icon_user(),
                    }
                }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LayoutProps {
    pub children: Children,
    pub active_page: Page,
    pub on_select: Callback<Page>,
    pub on_logout: Callback<()>,
    pub username: String,
    pub is_admin: bool,
}

#[function_component(Layout)]
pub fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="flex h-screen bg-background">
            <div class="hidden md:flex">
                <Sidebar active_page={props.active_page} on_select={props.on_select.clone()} on_logout={props.on_logout.clone()} />
            </div>

            <div class="flex-1 flex flex-col overflow-hidden">
                <Header username={props.username.clone()} is_admin={props.is_admin} active_page={props.active_page} on_select={props.on_select.clone()} />
                <main class="flex-1 overflow-y-auto">
                    { for props.children.iter() }
                </main>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct HeaderProps {
    pub username: String,
    pub is_admin: bool,
    pub active_page: Page,
    pub on_select: Callback<Page>,
}

#[function_component(Header)]
pub fn header(props: &HeaderProps) -> Html {
    html! {
        <header class="bg-[#D8E1E8] border-b border-border h-16 flex items-center justify-between px-6">
            // compact navigation for screens where the sidebar is hidden
            <nav class="flex md:hidden gap-2">
                { for NAV_ITEMS.iter().map(|item| {
                    let on_select = props.on_select.clone();
                    let page = item.page;
                    let class_name = if page == props.active_page { "p-2 rounded-lg bg-[#B2CBDE]" } else { "p-2 rounded-lg" };
                    html! {
                        <button type="button" class={class_name} aria-label={item.label} onclick={Callback::from(move |_| on_select.emit(page))}>
                            { (item.icon)() }
                        </button>
                    }
                }) }
            </nav>
            <div class="flex-1"></div>
            <div class="flex items-center gap-3">
                { icon_user() }
                <span class="text-sm font-bold text-[#173E63]">{ props.username.clone() }</span>
                if props.is_admin {
                    <span class="text-[10px] font-bold px-2 py-0.5 rounded-full bg-[#173E63] text-white tracking-widest">{"ADM"}</span>
                }
            </div>
        </header>
    }
}

struct NavItem {
    label: &'static str,
    page: Page,
    icon: fn() -> Html,
}

const NAV_ITEMS: [NavItem; 3] = [
    NavItem {
        label: "Dashboard",
        page: Page::Dashboard,
        icon: icon_layout_grid,
    },
    NavItem {
        label: "Gráficos",
        page: Page::Charts,
        icon: icon_bar_chart,
    },
    NavItem {
        label: "Configurações",
        page: Page::Settings,
        icon: icon_settings,
    },
];

#[derive(Properties, PartialEq)]
pub struct SidebarProps {
    pub active_page: Page,
    pub on_select: Callback<Page>,
    pub on_logout: Callback<()>,
}

#[function_component(Sidebar)]
pub fn sidebar(props: &SidebarProps) -> Html {
    let on_logout = {
        let on_logout = props.on_logout.clone();
        Callback::from(move |_| on_logout.emit(()))
    };

    html! {
        <div class="w-[220px] h-screen bg-[#D8E1E8] p-4 flex flex-col">
            <div class="flex items-center gap-3 px-2 mb-8">
                <div class="w-12 h-12 bg-[#173E63] rounded-full flex items-center justify-center text-white">
                    { icon_home() }
                </div>
                <span class="text-[#173E63] text-xl font-black tracking-tight leading-5">{"Gastos"}<br />{"da Obra"}</span>
            </div>

            <div class="flex-1 bg-[#173E63] rounded-[24px] flex flex-col py-6 px-3 shadow-lg">
                <nav class="flex-1 space-y-2">
                    { for NAV_ITEMS.iter().map(|item| {
                        let is_active = item.page == props.active_page;
                        let class_name = if is_active {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium bg-[#B2CBDE] text-[#173E63] w-full"
                        } else {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium text-slate-300 hover:bg-white/5 hover:text-white w-full"
                        };
                        let on_select = props.on_select.clone();
                        let page = item.page;

                        html! {
                            <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(page))}>
                                <span class="shrink-0">{ (item.icon)() }</span>
                                <span class="truncate whitespace-nowrap text-left">{ item.label }</span>
                            </button>
                        }
                    }) }
                </nav>

                <div class="mt-auto pt-4">
                    <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-xl hover:bg-white/10 transition-colors text-[13px] font-medium text-slate-300">
                        { icon_log_out() }
                        <span>{"Sair"}</span>
                    </button>
                </div>
            </div>
        </div>
    }
}

fn icon_base(path: &'static str) -> Html {
    html! {
        <svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">
            <path d={path}></path>
        </svg>
    }
}

pub fn icon_layout_grid() -> Html {
    icon_base("M3 3h8v8H3zM13 3h8v8h-8zM3 13h8v8H3zM13 13h8v8h-8z")
}
pub fn icon_wallet() -> Html {
    icon_base("M3 7h18v10H3zM16 7V5H5v2")
}
pub fn icon_bar_chart() -> Html {
    icon_base("M4 20V10M10 20V4M16 20v-6M22 20H2")
}
pub fn icon_settings() -> Html {
    icon_base("M12 1v3M12 20v3M4.2 4.2l2.1 2.1M17.7 17.7l2.1 2.1M1 12h3M20 12h3M4.2 19.8l2.1-2.1M17.7 6.3l2.1-2.1")
}
pub fn icon_log_out() -> Html {
    icon_base("M9 21H5a2 2 0 01-2-2V5a2 2 0 012-2h4M16 17l5-5-5-5M21 12H9")
}
pub fn icon_plus() -> Html {
    icon_base("M12 5v14M5 12h14")
}
pub fn icon_x() -> Html {
    icon_base("M18 6L6 18M6 6l12 12")
}
pub fn icon_list() -> Html {
    icon_base("M8 6h13M8 12h13M8 18h13M3 6h.01M3 12h.01M3 18h.01")
}
pub fn icon_clock() -> Html {
    icon_base("M12 21a9 9 0 100-18 9 9 0 000 18zM12 7v5l3 3")
}
pub fn icon_check() -> Html {
    icon_base("M20 6L9 17l-5-5")
}
pub fn icon_user() -> Html {
    icon_base("M20 21v-2a4 4 0 00-4-4H8a4 4 0 00-4 4v2M12 11a4 4 0 100-8 4 4 0 000 8z")
}
pub fn icon_home() -> Html {
    icon_base("M3 12l9-9 9 9M5 10v10h14V10")
}
pub fn icon_search() -> Html {
    icon_base("M11 19a8 8 0 100-16 8 8 0 000 16zM21 21l-4.35-4.35")
}
pub fn icon_refresh() -> Html {
    icon_base("M23 4v6h-6M1 20v-6h6M3.51 9a9 9 0 0114.85-3.36L23 10M1 14l4.64 4.36A9 9 0 0020.49 15")
}
pub fn icon_download() -> Html {
    icon_base("M21 15v4a2 2 0 01-2 2H5a2 2 0 01-2-2v-4M7 10l5 5 5-5M12 15V3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_flashed_twice_is_a_new_notice() {
        assert_ne!(Notice::success("Salvo"), Notice::success("Salvo"));
    }

    #[test]
    fn expiry_of_an_older_notice_does_not_hide_a_newer_one() {
        let first = Notice::success("Atividade adicionada com sucesso!");
        let second = Notice::error("Erro 500");
        assert!(notice_visible(&first, None));
        assert!(!notice_visible(&first, Some(first.seq)));
        assert!(notice_visible(&second, Some(first.seq)));
    }
}
