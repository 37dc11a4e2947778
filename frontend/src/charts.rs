//! Inline SVG charts. Each chart's `<svg>` carries an id so it can be exported.

use yew::prelude::*;

pub const BLUE: &str = "#3B82F6";
pub const AMBER: &str = "#FBBF24";
pub const GREEN: &str = "#10B981";
const PALETTE: [&str; 8] = [
    BLUE, AMBER, GREEN, "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 56.0;
const TICKS: usize = 5;
const MAX_X_LABELS: usize = 12;

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: &'static str,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(label: impl Into<String>, color: &'static str, values: Vec<f64>) -> Self {
        Series {
            label: label.into(),
            color,
            values,
        }
    }
}

/// Rounds an axis maximum up to 1, 2 or 5 times a power of ten.
pub fn nice_max(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(max.log10().floor());
    for step in [1.0, 2.0, 5.0, 10.0] {
        if step * magnitude >= max {
            return step * magnitude;
        }
    }
    10.0 * magnitude
}

/// Short tick labels: `850`, `12 mil`, `1,5 mi`.
pub fn axis_label(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{} mi", trim_decimal(value / 1_000_000.0))
    } else if abs >= 1_000.0 {
        format!("{} mil", trim_decimal(value / 1_000.0))
    } else {
        trim_decimal(value)
    }
}

fn trim_decimal(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded).replace('.', ",")
    }
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// SVG path for a pie slice between two angles (radians, clockwise from 12 o'clock).
pub fn pie_slice_path(cx: f64, cy: f64, r: f64, start: f64, end: f64) -> String {
    let (sx, sy) = (cx + r * start.sin(), cy - r * start.cos());
    let (ex, ey) = (cx + r * end.sin(), cy - r * end.cos());
    let large_arc = if end - start > std::f64::consts::PI { 1 } else { 0 };
    format!(
        "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z",
        cx, cy, sx, sy, r, r, large_arc, ex, ey
    )
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn y_for(value: f64, max: f64) -> f64 {
    MARGIN_TOP + plot_height() * (1.0 - (value.max(0.0) / max))
}

fn series_max(series: &[Series]) -> f64 {
    series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0, f64::max)
}

fn label_step(count: usize) -> usize {
    ((count + MAX_X_LABELS - 1) / MAX_X_LABELS).max(1)
}

fn y_axis(max: f64) -> Html {
    html! {
        <g>
            { for (0..=TICKS).map(|i| {
                let value = max * i as f64 / TICKS as f64;
                let y = y_for(value, max);
                html! {
                    <g>
                        <line x1={MARGIN_LEFT.to_string()} x2={(WIDTH - MARGIN_RIGHT).to_string()} y1={y.to_string()} y2={y.to_string()} stroke="#E5E7EB" stroke-width="1" />
                        <text x={(MARGIN_LEFT - 6.0).to_string()} y={(y + 4.0).to_string()} text-anchor="end" font-size="10" fill="#6B7280">{ axis_label(value) }</text>
                    </g>
                }
            }) }
        </g>
    }
}

fn x_labels(labels: &[String], center_of: impl Fn(usize) -> f64) -> Html {
    let step = label_step(labels.len());
    html! {
        <g>
            { for labels.iter().enumerate().filter(|(i, _)| i % step == 0).map(|(i, label)| {
                let x = center_of(i);
                let y = HEIGHT - MARGIN_BOTTOM + 14.0;
                html! {
                    <text x={x.to_string()} y={y.to_string()} text-anchor="end" font-size="10" fill="#374151" transform={format!("rotate(-30 {:.1} {:.1})", x, y)}>
                        { truncate_label(label, 14) }
                    </text>
                }
            }) }
        </g>
    }
}

fn legend(items: Vec<(String, &'static str)>) -> Html {
    html! {
        <div class="flex flex-wrap gap-4 justify-center text-xs text-gray-600 mt-2">
            { for items.into_iter().map(|(label, color)| html! {
                <span class="flex items-center gap-1">
                    <span class="inline-block w-3 h-3 rounded-sm" style={format!("background:{}", color)}></span>
                    { label }
                </span>
            }) }
        </div>
    }
}

fn empty_state(title: &str) -> Html {
    html! {
        <div class="bg-white rounded-lg shadow-md p-4">
            <h4 class="font-semibold text-gray-700 mb-2">{ title.to_string() }</h4>
            <div class="h-48 flex items-center justify-center text-sm text-gray-400">{"Sem dados para exibir"}</div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct BarChartProps {
    pub id: &'static str,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    #[prop_or(false)]
    pub show_legend: bool,
}

#[function_component(BarChart)]
pub fn bar_chart(props: &BarChartProps) -> Html {
    if props.labels.is_empty() || props.series.is_empty() {
        return empty_state(&props.title);
    }
    let max = nice_max(series_max(&props.series));
    let band = plot_width() / props.labels.len() as f64;
    let group = band * 0.8;
    let bar = group / props.series.len() as f64;
    let center_of = move |i: usize| MARGIN_LEFT + band * (i as f64 + 0.5);

    html! {
        <div class="bg-white rounded-lg shadow-md p-4">
            <h4 class="font-semibold text-gray-700 mb-2">{ props.title.clone() }</h4>
            <svg id={props.id} xmlns="http://www.w3.org/2000/svg" viewBox={format!("0 0 {} {}", WIDTH, HEIGHT)} class="w-full h-auto">
                { y_axis(max) }
                { for props.series.iter().enumerate().map(|(si, s)| html! {
                    <g fill={s.color}>
                        { for s.values.iter().enumerate().take(props.labels.len()).map(|(i, v)| {
                            let x = MARGIN_LEFT + band * i as f64 + (band - group) / 2.0 + bar * si as f64;
                            let y = y_for(*v, max);
                            let h = (MARGIN_TOP + plot_height() - y).max(0.0);
                            html! {
                                <rect x={format!("{:.2}", x)} y={format!("{:.2}", y)} width={format!("{:.2}", (bar - 1.0).max(1.0))} height={format!("{:.2}", h)}>
                                    <title>{ format!("{} · {}: {}", props.labels[i], s.label, axis_label(*v)) }</title>
                                </rect>
                            }
                        }) }
                    </g>
                }) }
                { x_labels(&props.labels, center_of) }
            </svg>
            if props.show_legend {
                { legend(props.series.iter().map(|s| (s.label.clone(), s.color)).collect()) }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LineChartProps {
    pub id: &'static str,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    #[prop_or(false)]
    pub show_legend: bool,
}

#[function_component(LineChart)]
pub fn line_chart(props: &LineChartProps) -> Html {
    if props.labels.is_empty() || props.series.is_empty() {
        return empty_state(&props.title);
    }
    let max = nice_max(series_max(&props.series));
    let n = props.labels.len();
    let x_of = move |i: usize| {
        if n == 1 {
            MARGIN_LEFT + plot_width() / 2.0
        } else {
            MARGIN_LEFT + plot_width() * i as f64 / (n - 1) as f64
        }
    };

    html! {
        <div class="bg-white rounded-lg shadow-md p-4">
            <h4 class="font-semibold text-gray-700 mb-2">{ props.title.clone() }</h4>
            <svg id={props.id} xmlns="http://www.w3.org/2000/svg" viewBox={format!("0 0 {} {}", WIDTH, HEIGHT)} class="w-full h-auto">
                { y_axis(max) }
                { for props.series.iter().map(|s| {
                    let points: Vec<String> = s.values.iter().take(n).enumerate()
                        .map(|(i, v)| format!("{:.2},{:.2}", x_of(i), y_for(*v, max)))
                        .collect();
                    html! {
                        <g>
                            <polyline points={points.join(" ")} fill="none" stroke={s.color} stroke-width="2" />
                            { for s.values.iter().take(n).enumerate().map(|(i, v)| html! {
                                <circle cx={format!("{:.2}", x_of(i))} cy={format!("{:.2}", y_for(*v, max))} r="3" fill={s.color}>
                                    <title>{ format!("{} · {}: {}", props.labels[i], s.label, axis_label(*v)) }</title>
                                </circle>
                            }) }
                        </g>
                    }
                }) }
                { x_labels(&props.labels, x_of) }
            </svg>
            if props.show_legend {
                { legend(props.series.iter().map(|s| (s.label.clone(), s.color)).collect()) }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct PieChartProps {
    pub id: &'static str,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[prop_or_default]
    pub colors: Vec<&'static str>,
}

#[function_component(PieChart)]
pub fn pie_chart(props: &PieChartProps) -> Html {
    let total: f64 = props.values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return empty_state(&props.title);
    }
    let (cx, cy, r) = (WIDTH / 2.0, HEIGHT / 2.0, HEIGHT / 2.0 - 16.0);
    let color_at = |i: usize| {
        props
            .colors
            .get(i)
            .copied()
            .unwrap_or(PALETTE[i % PALETTE.len()])
    };

    let mut start = 0.0;
    let mut slices = Vec::new();
    for (i, v) in props.values.iter().enumerate() {
        if *v <= 0.0 {
            continue;
        }
        let sweep = v / total * std::f64::consts::TAU;
        let label = props.labels.get(i).cloned().unwrap_or_default();
        let tooltip = format!("{}: {:.1}%", label, v / total * 100.0);
        let shape = if sweep >= std::f64::consts::TAU - 1e-9 {
            html! { <circle cx={cx.to_string()} cy={cy.to_string()} r={r.to_string()} fill={color_at(i)}><title>{ tooltip }</title></circle> }
        } else {
            html! { <path d={pie_slice_path(cx, cy, r, start, start + sweep)} fill={color_at(i)} stroke="#FFFFFF" stroke-width="1"><title>{ tooltip }</title></path> }
        };
        slices.push(shape);
        start += sweep;
    }

    let legend_items = props
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let v = props.values.get(i).copied().unwrap_or(0.0);
            (format!("{} ({:.1}%)", label, v.max(0.0) / total * 100.0), color_at(i))
        })
        .collect();

    html! {
        <div class="bg-white rounded-lg shadow-md p-4">
            <h4 class="font-semibold text-gray-700 mb-2">{ props.title.clone() }</h4>
            <svg id={props.id} xmlns="http://www.w3.org/2000/svg" viewBox={format!("0 0 {} {}", WIDTH, HEIGHT)} class="w-full h-auto">
                { for slices.into_iter() }
            </svg>
            { legend(legend_items) }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(-5.0, 1.0)]
    #[case(7.0, 10.0)]
    #[case(10.0, 10.0)]
    #[case(13.0, 20.0)]
    #[case(420.0, 500.0)]
    #[case(51_000.0, 100_000.0)]
    fn rounds_axis_maximum(#[case] input: f64, #[case] expected: f64) {
        assert!((nice_max(input) - expected).abs() < 1e-6, "{} -> {}", input, nice_max(input));
    }

    #[rstest]
    #[case(0.0, "0")]
    #[case(850.0, "850")]
    #[case(12_000.0, "12 mil")]
    #[case(2_500.0, "2,5 mil")]
    #[case(1_500_000.0, "1,5 mi")]
    fn compact_axis_labels(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(axis_label(value), expected);
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate_label("Piso", 14), "Piso");
        assert_eq!(truncate_label("Impermeabilização", 8), "Imperme…");
    }

    #[test]
    fn quarter_slice_path() {
        let path = pie_slice_path(100.0, 100.0, 50.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert_eq!(path, "M 100.00 100.00 L 100.00 50.00 A 50.00 50.00 0 0 1 150.00 100.00 Z");
    }

    #[test]
    fn large_slices_use_large_arc_flag() {
        let path = pie_slice_path(0.0, 0.0, 10.0, 0.0, 4.0);
        assert!(path.contains(" 0 1 1 "));
    }

    #[test]
    fn label_step_caps_visible_labels() {
        assert_eq!(label_step(5), 1);
        assert_eq!(label_step(12), 1);
        assert_eq!(label_step(13), 2);
        assert_eq!(label_step(40), 4);
    }
}
