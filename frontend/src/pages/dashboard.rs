use tracing::{debug, info};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::api::{DashboardSnapshot, Totals};
use crate::components::{
    bind_input, flash, icon_plus, icon_search, page_shell, Loader, Modal, Notice, NoticeBanner,
    RefreshCounter, StatCard, StatIcon,
};
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::model::{Activity, ActivityForm, ActivityStatus};
use crate::money::format_brl;
use crate::stats;

use super::payment::PaymentModal;

const DELETE_CONFIRMATION: &str = "Tem certeza que deseja deletar esta atividade?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Pending,
    Paid,
    All,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Pending, Tab::Paid, Tab::All];

    fn label(self) -> &'static str {
        match self {
            Tab::Pending => "Pendentes",
            Tab::Paid => "Pagas",
            Tab::All => "Todas",
        }
    }

    fn empty_text(self) -> &'static str {
        match self {
            Tab::Pending => "Nenhuma atividade pendente encontrada",
            Tab::Paid => "Nenhuma atividade paga encontrada",
            Tab::All => "Nenhuma atividade encontrada",
        }
    }

    fn rows(self, snapshot: &DashboardSnapshot) -> &ApiResult<Vec<Activity>> {
        match self {
            Tab::Pending => &snapshot.pending,
            Tab::Paid => &snapshot.paid,
            Tab::All => &snapshot.all,
        }
    }
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let ctx = use_context::<AppContext>();
    let Some(ctx) = ctx else {
        return html! {};
    };
    let snapshot = use_state(|| None::<DashboardSnapshot>);
    let loading = use_state(|| true);
    let refresh = use_reducer(RefreshCounter::default);
    let notice = use_state(|| None::<Notice>);

    let tab = use_state(|| Tab::Pending);
    let query_input = use_state(String::new);
    let query = use_state(String::new);

    let selected = use_state(|| None::<Activity>);
    let paying = use_state(|| None::<Activity>);
    let editing = use_state(|| None::<(i64, ActivityForm)>);
    let edit_saving = use_state(|| false);
    let edit_error = use_state(|| None::<String>);

    let show_add = use_state(|| false);
    let add_form = use_state(ActivityForm::default);
    let adding = use_state(|| false);
    let add_error = use_state(|| None::<String>);

    {
        let ctx = ctx.clone();
        let snapshot = snapshot.clone();
        let loading = loading.clone();
        let notice = notice.clone();
        use_effect_with_deps(
            move |round| {
                debug!(round, "loading dashboard");
                loading.set(true);
                spawn_local(async move {
                    match ctx.client().dashboard_snapshot().await {
                        Ok(next) => snapshot.set(Some(next)),
                        Err(err) => flash(&notice, Notice::error(ctx.report("load dashboard", &err))),
                    }
                    loading.set(false);
                });
                || ()
            },
            refresh.0,
        );
    }

    let on_tab = {
        let tab = tab.clone();
        let query_input = query_input.clone();
        let query = query.clone();
        Callback::from(move |next: Tab| {
            tab.set(next);
            query_input.set(String::new());
            query.set(String::new());
        })
    };

    let apply_search = {
        let query_input = query_input.clone();
        let query = query.clone();
        Callback::from(move |_: ()| query.set(query_input.trim().to_string()))
    };
    let on_search_key = {
        let apply_search = apply_search.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                apply_search.emit(());
            }
        })
    };

    let on_select = {
        let selected = selected.clone();
        Callback::from(move |activity: Activity| selected.set(Some(activity)))
    };
    let close_info = {
        let selected = selected.clone();
        Callback::from(move |_: ()| selected.set(None))
    };

    let on_pay = {
        let selected = selected.clone();
        let paying = paying.clone();
        Callback::from(move |activity: Activity| {
            selected.set(None);
            paying.set(Some(activity));
        })
    };
    let close_payment = {
        let paying = paying.clone();
        Callback::from(move |_: ()| paying.set(None))
    };
    let on_paid = {
        let paying = paying.clone();
        let notice = notice.clone();
        let refresh = refresh.clone();
        Callback::from(move |message: String| {
            paying.set(None);
            flash(&notice, Notice::success(message));
            refresh.dispatch(());
        })
    };

    let on_edit = {
        let selected = selected.clone();
        let editing = editing.clone();
        let edit_error = edit_error.clone();
        Callback::from(move |activity: Activity| {
            selected.set(None);
            edit_error.set(None);
            editing.set(Some((activity.id, ActivityForm::from_activity(&activity))));
        })
    };
    let on_edit_change = {
        let editing = editing.clone();
        Callback::from(move |form: ActivityForm| {
            if let Some((id, _)) = &*editing {
                editing.set(Some((*id, form)));
            }
        })
    };
    let close_edit = {
        let editing = editing.clone();
        Callback::from(move |_: ()| editing.set(None))
    };
    let on_edit_save = {
        let ctx = ctx.clone();
        let editing = editing.clone();
        let edit_saving = edit_saving.clone();
        let edit_error = edit_error.clone();
        let notice = notice.clone();
        let refresh = refresh.clone();
        Callback::from(move |_| {
            let Some((id, form)) = (*editing).clone() else {
                return;
            };
            let payload = match form.validate() {
                Ok(payload) => payload,
                Err(err) => {
                    edit_error.set(Some(err.to_string()));
                    return;
                }
            };
            edit_saving.set(true);
            edit_error.set(None);
            let ctx = ctx.clone();
            let editing = editing.clone();
            let edit_saving = edit_saving.clone();
            let edit_error = edit_error.clone();
            let notice = notice.clone();
            let refresh = refresh.clone();
            spawn_local(async move {
                match ctx.client().edit_activity(id, &payload).await {
                    Ok(_) => {
                        info!(id, "activity updated");
                        editing.set(None);
                        flash(&notice, Notice::success("Atividade atualizada com sucesso!"));
                        refresh.dispatch(());
                    }
                    Err(err) => edit_error.set(Some(ctx.report("edit activity", &err))),
                }
                edit_saving.set(false);
            });
        })
    };

    let on_delete = {
        let ctx = ctx.clone();
        let selected = selected.clone();
        let notice = notice.clone();
        let refresh = refresh.clone();
        Callback::from(move |activity: Activity| {
            if !confirm(DELETE_CONFIRMATION) {
                return;
            }
            selected.set(None);
            let ctx = ctx.clone();
            let notice = notice.clone();
            let refresh = refresh.clone();
            spawn_local(async move {
                match ctx.client().delete_activity(activity.id).await {
                    Ok(()) => {
                        info!(id = activity.id, "activity deleted");
                        flash(&notice, Notice::success("Atividade deletada com sucesso!"));
                        refresh.dispatch(());
                    }
                    Err(err) => flash(&notice, Notice::error(ctx.report("delete activity", &err))),
                }
            });
        })
    };

    let on_toggle_add = {
        let show_add = show_add.clone();
        let add_error = add_error.clone();
        Callback::from(move |_| {
            show_add.set(!*show_add);
            add_error.set(None);
        })
    };
    let on_add_change = {
        let add_form = add_form.clone();
        Callback::from(move |form: ActivityForm| add_form.set(form))
    };
    let on_add_submit = {
        let ctx = ctx.clone();
        let add_form = add_form.clone();
        let adding = adding.clone();
        let add_error = add_error.clone();
        let notice = notice.clone();
        let refresh = refresh.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let payload = match add_form.validate() {
                Ok(payload) => payload,
                Err(err) => {
                    add_error.set(Some(err.to_string()));
                    return;
                }
            };
            adding.set(true);
            add_error.set(None);
            let ctx = ctx.clone();
            let add_form = add_form.clone();
            let adding = adding.clone();
            let add_error = add_error.clone();
            let notice = notice.clone();
            let refresh = refresh.clone();
            spawn_local(async move {
                match ctx.client().add_activity(&payload).await {
                    Ok(_) => {
                        info!(activity = %payload.atividade, "activity added");
                        add_form.set(ActivityForm::default());
                        flash(&notice, Notice::success("Atividade adicionada com sucesso!"));
                        refresh.dispatch(());
                    }
                    Err(err) => add_error.set(Some(ctx.report("add activity", &err))),
                }
                adding.set(false);
            });
        })
    };

    let is_admin = ctx.is_admin();
    let totals = (*snapshot)
        .as_ref()
        .map(|s| s.totals.clone())
        .unwrap_or_default();
    let all_count = (*snapshot)
        .as_ref()
        .and_then(|s| s.all.as_ref().ok())
        .map(Vec::len)
        .unwrap_or(0);
    let pending_count = (*snapshot)
        .as_ref()
        .and_then(|s| s.pending.as_ref().ok())
        .map(Vec::len)
        .unwrap_or(0);
    let known_sectors = (*snapshot)
        .as_ref()
        .and_then(|s| s.all.as_ref().ok())
        .map(|all| {
            stats::sectors(all)
                .into_iter()
                .filter(|s| s != "-")
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let table = match &*snapshot {
        None if *loading => html! { <Loader /> },
        None => html! {},
        Some(snapshot) => match tab.rows(snapshot) {
            Ok(rows) => html! {
                <ActivityTable
                    rows={stats::search(rows, &query)}
                    empty_text={tab.empty_text()}
                    show_remaining={*tab == Tab::Pending}
                    show_status={*tab == Tab::All}
                    on_select={on_select.clone()}
                />
            },
            Err(err) => html! {
                <p class="text-sm text-red-500 py-6 text-center">{ err.to_string() }</p>
            },
        },
    };

    html! {
        <>
            <NoticeBanner notice={(*notice).clone()} />
            { page_shell(
                "Dashboard",
                if is_admin {
                    html! {
                        <button onclick={on_toggle_add} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                            { icon_plus() }
                            { if *show_add { "Fechar" } else { "Adicionar Atividade" } }
                        </button>
                    }
                } else {
                    html! {}
                },
                html! {
                    <>
                        <KpiGrid totals={totals} all_count={all_count} pending_count={pending_count} />

                        if is_admin && *show_add {
                            <form class="bg-card rounded-[10px] p-6 border border-border space-y-4" onsubmit={on_add_submit}>
                                <h3 class="font-bold text-foreground text-lg">{"Nova Atividade"}</h3>
                                <ActivityFormFields form={(*add_form).clone()} sectors={known_sectors.clone()} on_change={on_add_change} />
                                if let Some(msg) = &*add_error {
                                    <p class="text-sm text-red-500">{ msg.clone() }</p>
                                }
                                <button type="submit" disabled={*adding} class="bg-primary text-primary-foreground px-4 py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity">
                                    { if *adding { "Adicionando..." } else { "Adicionar" } }
                                </button>
                            </form>
                        }

                        <div class="bg-card rounded-[10px] p-6 border border-border">
                            <div class="flex flex-wrap items-center justify-between gap-3 mb-4">
                                <div class="flex gap-2">
                                    { for Tab::ALL.into_iter().map(|t| {
                                        let on_tab = on_tab.clone();
                                        let class_name = if t == *tab {
                                            "px-4 py-2 rounded-lg text-sm font-bold bg-[#173E63] text-white"
                                        } else {
                                            "px-4 py-2 rounded-lg text-sm font-medium bg-secondary text-foreground hover:opacity-80"
                                        };
                                        html! {
                                            <button type="button" class={class_name} onclick={Callback::from(move |_| on_tab.emit(t))}>
                                                { t.label() }
                                            </button>
                                        }
                                    }) }
                                </div>
                                <div class="flex gap-2">
                                    <input
                                        type="search"
                                        placeholder="Pesquisar..."
                                        class="px-3 py-2 bg-input border border-input rounded-lg text-sm text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                                        value={(*query_input).clone()}
                                        oninput={bind_input(&query_input)}
                                        onkeypress={on_search_key}
                                    />
                                    <button type="button" class="p-2 rounded-lg bg-secondary hover:opacity-80" aria-label="Pesquisar" onclick={apply_search.reform(|_: MouseEvent| ())}>
                                        { icon_search() }
                                    </button>
                                </div>
                            </div>
                            if *loading && snapshot.is_some() {
                                <p class="text-xs text-muted-foreground mb-2">{"Atualizando..."}</p>
                            }
                            { table }
                        </div>
                    </>
                }
            ) }

            if let Some(activity) = &*selected {
                <InfoModal
                    activity={activity.clone()}
                    is_admin={is_admin}
                    on_close={close_info}
                    on_pay={on_pay}
                    on_edit={on_edit}
                    on_delete={on_delete}
                />
            }

            if let Some(activity) = &*paying {
                <PaymentModal activity={activity.clone()} on_close={close_payment} on_paid={on_paid} />
            }

            if let Some((_, form)) = &*editing {
                <Modal title="Editar Atividade" on_close={close_edit.clone()}>
                    <div class="space-y-4">
                        <ActivityFormFields form={form.clone()} sectors={known_sectors.clone()} on_change={on_edit_change} />
                        if let Some(msg) = &*edit_error {
                            <p class="text-sm text-red-500">{ msg.clone() }</p>
                        }
                        <div class="flex justify-end gap-2">
                            <button type="button" class="px-4 py-2 rounded-lg bg-secondary text-foreground" onclick={close_edit.reform(|_: MouseEvent| ())}>{"Cancelar"}</button>
                            <button type="button" disabled={*edit_saving} class="px-4 py-2 rounded-lg bg-primary text-primary-foreground font-semibold" onclick={on_edit_save}>
                                { if *edit_saving { "Salvando..." } else { "Salvar" } }
                            </button>
                        </div>
                    </div>
                </Modal>
            }
        </>
    }
}

#[derive(Properties, PartialEq)]
struct KpiGridProps {
    totals: Totals,
    all_count: usize,
    pending_count: usize,
}

#[function_component(KpiGrid)]
fn kpi_grid(props: &KpiGridProps) -> Html {
    let totals = &props.totals;
    html! {
        <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
            <StatCard title="Total de Atividades" value={props.all_count.to_string()} icon={StatIcon::List} />
            <StatCard title="Atividades Pendentes" value={props.pending_count.to_string()} icon={StatIcon::Clock} />
            <StatCard title="Valor Total" value={format_brl(totals.total_value)} icon={StatIcon::Wallet} />
            <StatCard title="Valor Pago" value={format_brl(totals.total_paid)} icon={StatIcon::Check} />
            <StatCard title="Pago por Diego-Ana" value={format_brl(totals.paid_diego)} icon={StatIcon::User} />
            <StatCard title="Pago por Alex-Rute" value={format_brl(totals.paid_alex)} icon={StatIcon::User} />
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ActivityTableProps {
    rows: Vec<Activity>,
    empty_text: &'static str,
    show_remaining: bool,
    show_status: bool,
    on_select: Callback<Activity>,
}

#[function_component(ActivityTable)]
fn activity_table(props: &ActivityTableProps) -> Html {
    let columns = 7 + usize::from(props.show_remaining) + usize::from(props.show_status);
    html! {
        <div class="overflow-x-auto">
            <table class="w-full text-sm">
                <thead>
                    <tr class="text-left text-muted-foreground border-b border-border">
                        <th class="py-2 pr-3">{"Setor"}</th>
                        <th class="py-2 pr-3">{"Atividade"}</th>
                        <th class="py-2 pr-3">{"Valor"}</th>
                        <th class="py-2 pr-3">{"Diego-Ana"}</th>
                        <th class="py-2 pr-3">{"Alex-Rute"}</th>
                        if props.show_remaining {
                            <th class="py-2 pr-3">{"Restante"}</th>
                        }
                        <th class="py-2 pr-3">{"Data"}</th>
                        if props.show_status {
                            <th class="py-2 pr-3">{"Status"}</th>
                        }
                        <th class="py-2"></th>
                    </tr>
                </thead>
                <tbody>
                    if props.rows.is_empty() {
                        <tr>
                            <td colspan={columns.to_string()} class="py-6 text-center text-muted-foreground">{ props.empty_text }</td>
                        </tr>
                    }
                    { for props.rows.iter().map(|activity| {
                        let on_select = props.on_select.clone();
                        let row = activity.clone();
                        let status = activity.status();
                        let badge = match status {
                            ActivityStatus::Paid => "px-2 py-0.5 rounded-full text-xs bg-green-100 text-green-800",
                            ActivityStatus::Pending => "px-2 py-0.5 rounded-full text-xs bg-amber-100 text-amber-800",
                        };
                        html! {
                            <tr class="border-b border-border hover:bg-slate-50">
                                <td class="py-2 pr-3">{ activity.sector_label().to_string() }</td>
                                <td class="py-2 pr-3 font-medium">{ activity.activity_label().to_string() }</td>
                                <td class="py-2 pr-3">{ format_brl(activity.value) }</td>
                                <td class="py-2 pr-3">{ format_brl(activity.diego_ana) }</td>
                                <td class="py-2 pr-3">{ format_brl(activity.alex_rute) }</td>
                                if props.show_remaining {
                                    <td class="py-2 pr-3">{ format_brl(activity.remaining()) }</td>
                                }
                                <td class="py-2 pr-3">{ activity.date_label().to_string() }</td>
                                if props.show_status {
                                    <td class="py-2 pr-3"><span class={badge}>{ status.label() }</span></td>
                                }
                                <td class="py-2 text-right">
                                    <button type="button" class="text-primary font-semibold text-xs hover:underline" onclick={Callback::from(move |_| on_select.emit(row.clone()))}>
                                        {"Detalhes"}
                                    </button>
                                </td>
                            </tr>
                        }
                    }) }
                </tbody>
            </table>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct InfoModalProps {
    activity: Activity,
    is_admin: bool,
    on_close: Callback<()>,
    on_pay: Callback<Activity>,
    on_edit: Callback<Activity>,
    on_delete: Callback<Activity>,
}

#[function_component(InfoModal)]
fn info_modal(props: &InfoModalProps) -> Html {
    let activity = &props.activity;
    let pending = !activity.is_paid();
    let action = |callback: &Callback<Activity>| {
        let callback = callback.clone();
        let activity = activity.clone();
        Callback::from(move |_| callback.emit(activity.clone()))
    };

    html! {
        <Modal title={activity.activity_label().to_string()} on_close={props.on_close.clone()}>
            <div class="grid grid-cols-2 gap-2 text-sm">
                <span class="text-muted-foreground">{"Setor"}</span>
                <span class="font-medium">{ activity.sector_label().to_string() }</span>
                <span class="text-muted-foreground">{"Pago por Diego-Ana"}</span>
                <span class="font-medium">{ format_brl(activity.diego_ana) }</span>
                <span class="text-muted-foreground">{"Pago por Alex-Rute"}</span>
                <span class="font-medium">{ format_brl(activity.alex_rute) }</span>
                if pending {
                    <span class="text-muted-foreground">{"Valor restante"}</span>
                    <span class="font-medium">{ format_brl(activity.remaining()) }</span>
                }
                <span class="text-muted-foreground">{"Valor total"}</span>
                <span class="font-medium">{ format_brl(activity.value) }</span>
                <span class="text-muted-foreground">{"Data"}</span>
                <span class="font-medium">{ activity.date_label().to_string() }</span>
                <span class="text-muted-foreground">{"Status"}</span>
                <span class="font-medium">{ activity.status().label() }</span>
            </div>
            if pending {
                <div class="flex flex-wrap justify-end gap-2 mt-6">
                    if props.is_admin {
                        <button type="button" class="px-4 py-2 rounded-lg bg-red-600 text-white text-sm font-semibold" onclick={action(&props.on_delete)}>{"Excluir"}</button>
                        <button type="button" class="px-4 py-2 rounded-lg bg-secondary text-foreground text-sm font-semibold" onclick={action(&props.on_edit)}>{"Editar"}</button>
                    }
                    <button type="button" class="px-4 py-2 rounded-lg bg-primary text-primary-foreground text-sm font-semibold" onclick={action(&props.on_pay)}>{"Pagar"}</button>
                </div>
            }
        </Modal>
    }
}

#[derive(Properties, PartialEq)]
struct ActivityFormFieldsProps {
    form: ActivityForm,
    sectors: Vec<String>,
    on_change: Callback<ActivityForm>,
}

#[function_component(ActivityFormFields)]
fn activity_form_fields(props: &ActivityFormFieldsProps) -> Html {
    let field = |update: fn(&mut ActivityForm, String)| {
        let form = props.form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = form.clone();
            update(&mut next, input.value());
            on_change.emit(next);
        })
    };
    let input_class = "w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary";

    html! {
        <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
            <div class="space-y-1">
                <label class="text-sm font-medium text-foreground">{"Atividade"}</label>
                <input type="text" class={input_class} value={props.form.activity.clone()}
                    oninput={field(|f, v| f.activity = v)} />
            </div>
            <div class="space-y-1">
                <label class="text-sm font-medium text-foreground">{"Valor"}</label>
                <input type="text" inputmode="decimal" placeholder="0,00" class={input_class} value={props.form.value.clone()}
                    oninput={field(|f, v| f.value = v)} />
            </div>
            <div class="space-y-1">
                <label class="text-sm font-medium text-foreground">{"Setor"}</label>
                <input type="text" list="known-sectors" class={input_class} value={props.form.sector.clone()}
                    oninput={field(|f, v| f.sector = v)} />
                <datalist id="known-sectors">
                    { for props.sectors.iter().map(|s| html! { <option value={s.clone()} /> }) }
                </datalist>
            </div>
            <div class="space-y-1">
                <label class="text-sm font-medium text-foreground">{"Data"}</label>
                <input type="date" class={input_class} value={props.form.date.clone()}
                    oninput={field(|f, v| f.date = v)} />
            </div>
        </div>
    }
}
