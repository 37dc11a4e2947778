use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::api::Totals;
use crate::charts::{BarChart, LineChart, PieChart, Series, AMBER, BLUE, GREEN};
use crate::components::{
    flash, icon_download, icon_refresh, page_shell, Loader, Notice, NoticeBanner, RefreshCounter,
};
use crate::context::AppContext;
use crate::export;
use crate::model::{Activity, Payer};
use crate::money::{format_percent, today};
use crate::stats::{self, Period, Summary};

/// Every chart the page can show, as `(svg id, export name)`.
const CHARTS: [(&str, &str); 14] = [
    ("chart-status", "Status"),
    ("chart-expense-distribution", "Distribuicao de Gastos"),
    ("chart-expense-evolution", "Evolucao dos Gastos"),
    ("chart-payment-comparison", "Comparacao de Pagamentos"),
    ("chart-sector-spend", "Gastos por Setor"),
    ("chart-sector-count", "Atividades por Setor"),
    ("chart-sector-detail", "Detalhamento do Setor"),
    ("chart-timeline", "Linha do Tempo"),
    ("chart-activities-per-date", "Atividades por Data"),
    ("chart-payments-per-date", "Pagamentos por Data"),
    ("chart-payer-comparison", "Comparacao entre Pagadores"),
    ("chart-sector-payments", "Historico de Pagamentos por Setor"),
    ("chart-payment-distribution", "Distribuicao de Pagamentos"),
    ("chart-sector-contribution", "Contribuicao por Setor"),
];

const ALL_KEY: &str = "all";

const BUTTON_CLASS: &str = "flex items-center gap-2 bg-secondary text-foreground px-3 py-2 rounded-xl font-bold text-sm hover:opacity-80 transition-all";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChartTab {
    Overview,
    Sector,
    Timeline,
    Payments,
}

impl ChartTab {
    const ALL: [ChartTab; 4] = [
        ChartTab::Overview,
        ChartTab::Sector,
        ChartTab::Timeline,
        ChartTab::Payments,
    ];

    fn label(self) -> &'static str {
        match self {
            ChartTab::Overview => "Visão Geral",
            ChartTab::Sector => "Setor",
            ChartTab::Timeline => "Linha do Tempo",
            ChartTab::Payments => "Pagamentos",
        }
    }
}

fn amount(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn payer_series(payers: &[Payer], values: impl Fn(Payer) -> Vec<f64>) -> Vec<Series> {
    payers
        .iter()
        .map(|p| Series::new(p.label(), p.color(), values(*p)))
        .collect()
}

fn selected_payers(payer: Option<Payer>) -> Vec<Payer> {
    match payer {
        Some(p) => vec![p],
        None => Payer::ALL.to_vec(),
    }
}

fn filter_select(
    label: &'static str,
    value: String,
    options: Vec<(String, String)>,
    on_change: Callback<String>,
) -> Html {
    let onchange = Callback::from(move |e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        on_change.emit(select.value());
    });
    html! {
        <label class="flex items-center gap-2 text-sm">
            <span class="text-muted-foreground">{ label }</span>
            <select {onchange} class="px-3 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary">
                { for options.into_iter().map(|(key, text)| {
                    let selected = key == value;
                    html! { <option value={key} {selected}>{ text }</option> }
                }) }
            </select>
        </label>
    }
}

fn period_options() -> Vec<(String, String)> {
    Period::ALL
        .iter()
        .map(|p| (p.key().to_string(), p.label().to_string()))
        .collect()
}

fn set_string(state: &UseStateHandle<String>) -> Callback<String> {
    let state = state.clone();
    Callback::from(move |v: String| state.set(v))
}

#[function_component(ChartsPage)]
pub fn charts_page() -> Html {
    let ctx = use_context::<AppContext>();
    let Some(ctx) = ctx else {
        return html! {};
    };
    let activities = use_state(Vec::<Activity>::new);
    let totals = use_state(Totals::default);
    let loading = use_state(|| true);
    let refresh = use_reducer(RefreshCounter::default);
    let notice = use_state(|| None::<Notice>);
    let tab = use_state(|| ChartTab::Overview);

    let sector_filter = use_state(|| ALL_KEY.to_string());
    let sector_period = use_state(|| Period::All.key().to_string());
    let timeline_period = use_state(|| Period::All.key().to_string());
    let payer_filter = use_state(|| ALL_KEY.to_string());
    let payment_period = use_state(|| Period::All.key().to_string());

    {
        let ctx = ctx.clone();
        let activities = activities.clone();
        let totals = totals.clone();
        let loading = loading.clone();
        let notice = notice.clone();
        use_effect_with_deps(
            move |round| {
                debug!(round, "loading chart data");
                loading.set(true);
                spawn_local(async move {
                    let client = ctx.client();
                    let (list, sums) = futures::join!(client.list_activities(), client.totals());
                    match list.and_then(|list| sums.map(|sums| (list, sums))) {
                        Ok((list, sums)) => {
                            activities.set(list);
                            totals.set(sums);
                        }
                        Err(err) => flash(&notice, Notice::error(ctx.report("load charts", &err))),
                    }
                    loading.set(false);
                });
                || ()
            },
            refresh.0,
        );
    }

    let on_refresh = {
        let refresh = refresh.clone();
        Callback::from(move |_: MouseEvent| refresh.dispatch(()))
    };

    let summary = stats::summarize(&totals, &activities);

    let on_export_excel = {
        let activities = activities.clone();
        let summary = summary.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            let sectors = stats::by_sector(&activities);
            match export::export_excel(&activities, &summary, &sectors) {
                Ok(()) => {
                    info!(rows = activities.len(), "excel exported");
                    flash(&notice, Notice::success("Planilha Excel exportada com sucesso!"));
                }
                Err(err) => {
                    error!(%err, "excel export failed");
                    flash(&notice, Notice::error(err.to_string()));
                }
            }
        })
    };
    let on_export_pdf = {
        let activities = activities.clone();
        let summary = summary.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            let sectors = stats::by_sector(&activities);
            match export::export_pdf(&summary, &sectors, &activities, today()) {
                Ok(()) => {
                    info!(rows = activities.len(), "pdf exported");
                    flash(&notice, Notice::success("Relatório PDF exportado com sucesso!"));
                }
                Err(err) => {
                    error!(%err, "pdf export failed");
                    flash(&notice, Notice::error(err.to_string()));
                }
            }
        })
    };
    let on_export_images = {
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| match export::export_chart_images(&CHARTS) {
            Ok(0) => flash(&notice, Notice::error("Nenhum gráfico disponível para exportação.")),
            Ok(count) => {
                info!(count, "chart images exported");
                flash(&notice, Notice::success(format!("{} gráfico(s) exportado(s) com sucesso!", count)));
            }
            Err(err) => {
                error!(%err, "chart export failed");
                flash(&notice, Notice::error(err.to_string()));
            }
        })
    };

    let refresh_button = html! {
        <button type="button" class={BUTTON_CLASS} onclick={on_refresh} disabled={*loading}>
            { icon_refresh() }
            { refresh_label(*loading) }
        </button>
    };

    let content = if *loading && activities.is_empty() {
        html! { <Loader /> }
    } else {
        let today = today();
        match *tab {
            ChartTab::Overview => html! {
                <>
                    { tab_toolbar(html! {}, refresh_button) }
                    { overview_tab(&activities, &summary) }
                </>
            },
            ChartTab::Sector => {
                let sector = Some(sector_filter.as_str()).filter(|s| *s != ALL_KEY);
                let in_period =
                    stats::filter_by_period(&activities, Period::from_key(&sector_period), today);
                let filtered = stats::filter_by_sector(&in_period, sector);
                let mut sector_options = vec![(ALL_KEY.to_string(), "Todos os setores".to_string())];
                sector_options.extend(stats::sectors(&activities).into_iter().map(|s| (s.clone(), s)));
                html! {
                    <>
                        { tab_toolbar(
                            html! {
                                <>
                                    { filter_select("Setor", (*sector_filter).clone(), sector_options, set_string(&sector_filter)) }
                                    { filter_select("Período", (*sector_period).clone(), period_options(), set_string(&sector_period)) }
                                </>
                            },
                            refresh_button,
                        ) }
                        { sector_tab(&filtered) }
                    </>
                }
            }
            ChartTab::Timeline => {
                let filtered = stats::filter_by_period(&activities, Period::from_key(&timeline_period), today);
                html! {
                    <>
                        { tab_toolbar(
                            html! {
                                <>
                                    { filter_select("Período", (*timeline_period).clone(), period_options(), set_string(&timeline_period)) }
                                </>
                            },
                            refresh_button,
                        ) }
                        { timeline_tab(&filtered) }
                    </>
                }
            }
            ChartTab::Payments => {
                let payer = Payer::from_key(&payer_filter);
                let filtered = stats::filter_by_period(&activities, Period::from_key(&payment_period), today);
                let mut payer_options = vec![(ALL_KEY.to_string(), "Todos".to_string())];
                payer_options.extend(Payer::ALL.iter().map(|p| (p.key().to_string(), p.label().to_string())));
                html! {
                    <>
                        { tab_toolbar(
                            html! {
                                <>
                                    { filter_select("Pagador", (*payer_filter).clone(), payer_options, set_string(&payer_filter)) }
                                    { filter_select("Período", (*payment_period).clone(), period_options(), set_string(&payment_period)) }
                                </>
                            },
                            refresh_button,
                        ) }
                        { payments_tab(&filtered, payer) }
                    </>
                }
            }
        }
    };

    html! {
        <>
            <NoticeBanner notice={(*notice).clone()} />
            { page_shell(
                "Gráficos",
                html! {
                    <div class="flex flex-wrap gap-2">
                        <button type="button" class={BUTTON_CLASS} onclick={on_export_excel}>{ icon_download() }{"Excel"}</button>
                        <button type="button" class={BUTTON_CLASS} onclick={on_export_pdf}>{ icon_download() }{"PDF"}</button>
                        <button type="button" class={BUTTON_CLASS} onclick={on_export_images}>{ icon_download() }{"Imagens"}</button>
                    </div>
                },
                html! {
                    <>
                        <SummaryPanel summary={summary.clone()} />
                        <div class="flex flex-wrap gap-2">
                                { for ChartTab::ALL.into_iter().map(|t| {
                                    let tab = tab.clone();
                                    let class_name = if t == *tab {
                                        "px-4 py-2 rounded-lg text-sm font-bold bg-[#173E63] text-white"
                                    } else {
                                        "px-4 py-2 rounded-lg text-sm font-medium bg-secondary text-foreground hover:opacity-80"
                                    };
                                    html! {
                                        <button type="button" class={class_name} onclick={Callback::from(move |_| tab.set(t))}>
                                            { t.label() }
                                        </button>
                                    }
                                }) }
                        </div>
                        { content }
                    </>
                }
            ) }
        </>
    }
}

#[derive(Properties, PartialEq)]
struct SummaryPanelProps {
    summary: Summary,
}

#[function_component(SummaryPanel)]
fn summary_panel(props: &SummaryPanelProps) -> Html {
    let s = &props.summary;
    let progress = amount(s.progress_pct).clamp(0.0, 100.0);
    let diego = amount(s.diego_pct).clamp(0.0, 100.0);
    let alex = amount(s.alex_pct).clamp(0.0, 100.0);
    html! {
        <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
            <div class="bg-card rounded-[10px] p-6 border border-border">
                <p class="text-muted-foreground text-[10px] font-bold mb-2 tracking-widest uppercase">{"Progresso dos Pagamentos"}</p>
                <div class="h-3 w-full bg-secondary rounded-full overflow-hidden">
                    <div class="h-full" style={format!("width: {:.2}%; background: {}", progress, GREEN)}></div>
                </div>
                <p class="mt-2 text-sm font-bold text-foreground">{ format_percent(s.progress_pct) }</p>
            </div>
            <div class="bg-card rounded-[10px] p-6 border border-border">
                <p class="text-muted-foreground text-[10px] font-bold mb-2 tracking-widest uppercase">{"Equilíbrio entre Pagadores"}</p>
                <div class="h-3 w-full bg-secondary rounded-full overflow-hidden flex">
                    <div class="h-full" style={format!("width: {:.2}%; background: {}", diego, BLUE)}></div>
                    <div class="h-full" style={format!("width: {:.2}%; background: {}", alex, AMBER)}></div>
                </div>
                <div class="mt-2 flex justify-between text-sm">
                    <span>{ format!("Diego-Ana: {}", format_percent(s.diego_pct)) }</span>
                    <span>{ format!("Alex-Rute: {}", format_percent(s.alex_pct)) }</span>
                </div>
            </div>
            <div class="bg-card rounded-[10px] p-6 border border-border grid grid-cols-3 text-center">
                <div>
                    <p class="text-2xl font-bold text-[#1D617A]">{ s.completed.to_string() }</p>
                    <p class="text-xs text-muted-foreground">{"Concluídas"}</p>
                </div>
                <div>
                    <p class="text-2xl font-bold text-[#1D617A]">{ s.pending.to_string() }</p>
                    <p class="text-xs text-muted-foreground">{"Pendentes"}</p>
                </div>
                <div>
                    <p class="text-2xl font-bold text-[#1D617A]">{ s.total.to_string() }</p>
                    <p class="text-xs text-muted-foreground">{"Total"}</p>
                </div>
            </div>
        </div>
    }
}

fn refresh_label(loading: bool) -> &'static str {
    if loading {
        "Atualizando..."
    } else {
        "Atualizar"
    }
}

/// Filters on the left, the tab's refresh button on the right.
fn tab_toolbar(filters: Html, refresh_button: Html) -> Html {
    html! {
        <div class="flex flex-wrap items-end justify-between gap-4">
            <div class="flex flex-wrap gap-4">{ filters }</div>
            { refresh_button }
        </div>
    }
}

fn grid(children: Html) -> Html {
    html! { <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">{ children }</div> }
}

fn activity_labels(activities: &[Activity]) -> Vec<String> {
    activities
        .iter()
        .map(|a| a.activity_label().to_string())
        .collect()
}

fn overview_tab(activities: &[Activity], summary: &Summary) -> Html {
    let labels = activity_labels(activities);
    let timeline = stats::timeline(activities);
    grid(html! {
        <>
            <PieChart
                id="chart-status"
                title="Status das Atividades"
                labels={vec!["Concluídas".to_string(), "Pendentes".to_string()]}
                values={vec![summary.completed as f64, summary.pending as f64]}
                colors={vec![GREEN, AMBER]}
            />
            <BarChart
                id="chart-expense-distribution"
                title="Distribuição de Gastos"
                labels={labels.clone()}
                series={vec![Series::new("Valor", BLUE, activities.iter().map(|a| amount(a.value)).collect())]}
            />
            <LineChart
                id="chart-expense-evolution"
                title="Evolução dos Gastos"
                labels={timeline.iter().map(|p| p.date.clone()).collect::<Vec<_>>()}
                series={vec![Series::new("Valor", BLUE, timeline.iter().map(|p| amount(p.value)).collect())]}
            />
            <BarChart
                id="chart-payment-comparison"
                title="Comparação de Pagamentos"
                labels={labels}
                series={payer_series(&Payer::ALL, |p| activities.iter().map(|a| amount(p.share(a))).collect())}
                show_legend={true}
            />
        </>
    })
}

fn sector_tab(activities: &[Activity]) -> Html {
    let sectors = stats::by_sector(activities);
    let sector_labels: Vec<String> = sectors.iter().map(|s| s.sector.clone()).collect();
    grid(html! {
        <>
            <BarChart
                id="chart-sector-spend"
                title="Gastos por Setor"
                labels={sector_labels.clone()}
                series={vec![Series::new("Valor Total", BLUE, sectors.iter().map(|s| amount(s.total)).collect())]}
            />
            <BarChart
                id="chart-sector-count"
                title="Atividades por Setor"
                labels={sector_labels}
                series={vec![Series::new("Atividades", GREEN, sectors.iter().map(|s| s.count as f64).collect())]}
            />
            <BarChart
                id="chart-sector-detail"
                title="Detalhamento do Setor"
                labels={activity_labels(activities)}
                series={vec![Series::new("Valor", AMBER, activities.iter().map(|a| amount(a.value)).collect())]}
            />
        </>
    })
}

fn timeline_tab(activities: &[Activity]) -> Html {
    let timeline = stats::timeline(activities);
    let dates = stats::by_date(activities);
    let date_labels: Vec<String> = dates.iter().map(|d| d.date.clone()).collect();
    grid(html! {
        <>
            <LineChart
                id="chart-timeline"
                title="Linha do Tempo"
                labels={timeline.iter().map(|p| p.date.clone()).collect::<Vec<_>>()}
                series={vec![
                    Series::new("Valor", BLUE, timeline.iter().map(|p| amount(p.value)).collect()),
                    Series::new("Acumulado", GREEN, timeline.iter().map(|p| amount(p.cumulative)).collect()),
                ]}
                show_legend={true}
            />
            <BarChart
                id="chart-activities-per-date"
                title="Atividades por Data"
                labels={date_labels.clone()}
                series={vec![Series::new("Atividades", AMBER, dates.iter().map(|d| d.count as f64).collect())]}
            />
            <BarChart
                id="chart-payments-per-date"
                title="Pagamentos por Data"
                labels={date_labels}
                series={vec![Series::new("Pagamentos", GREEN, dates.iter().map(|d| amount(d.payments)).collect())]}
            />
        </>
    })
}

fn payments_tab(activities: &[Activity], payer: Option<Payer>) -> Html {
    let payers = selected_payers(payer);
    let sectors = stats::by_sector(activities);
    let sector_labels: Vec<String> = sectors.iter().map(|s| s.sector.clone()).collect();
    let (diego, alex) = stats::payer_totals(activities);
    let contribution_label = payer.map(Payer::label).unwrap_or("Total Pago");
    grid(html! {
        <>
            <BarChart
                id="chart-payer-comparison"
                title="Comparação entre Pagadores"
                labels={activity_labels(activities)}
                series={payer_series(&payers, |p| activities.iter().map(|a| amount(p.share(a))).collect())}
                show_legend={true}
            />
            <BarChart
                id="chart-sector-payments"
                title="Histórico de Pagamentos por Setor"
                labels={sector_labels.clone()}
                series={payer_series(&payers, |p| sectors.iter().map(|s| amount(s.paid_by(Some(p)))).collect())}
                show_legend={true}
            />
            <PieChart
                id="chart-payment-distribution"
                title="Distribuição de Pagamentos"
                labels={Payer::ALL.iter().map(|p| p.label().to_string()).collect::<Vec<_>>()}
                values={vec![amount(diego), amount(alex)]}
                colors={Payer::ALL.iter().map(|p| p.color()).collect::<Vec<_>>()}
            />
            <BarChart
                id="chart-sector-contribution"
                title="Contribuição por Setor"
                labels={sector_labels}
                series={vec![Series::new(contribution_label, payer.map(Payer::color).unwrap_or(GREEN), sectors.iter().map(|s| amount(s.paid_by(payer))).collect())]}
            />
        </>
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_ids_are_unique() {
        let mut ids: Vec<&str> = CHARTS.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CHARTS.len());
    }

    #[test]
    fn payer_filter_selects_series() {
        assert_eq!(selected_payers(None), vec![Payer::DiegoAna, Payer::AlexRute]);
        assert_eq!(selected_payers(Some(Payer::AlexRute)), vec![Payer::AlexRute]);
    }

    #[test]
    fn refresh_button_shows_progress_while_loading() {
        assert_eq!(refresh_label(false), "Atualizar");
        assert_eq!(refresh_label(true), "Atualizando...");
    }
}
