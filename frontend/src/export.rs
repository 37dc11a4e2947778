//! Report downloads: Excel workbook, PDF report and SVG chart images.
//!
//! File contents are built by pure functions so they can be tested natively;
//! only [`download_bytes`] and [`export_chart_images`] touch the DOM.

use chrono::NaiveDate;
use gloo_file::{Blob, ObjectUrl};
use gloo_timers::callback::Timeout;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

use crate::charts::truncate_label;
use crate::error::ExportError;
use crate::model::{Activity, ActivityStatus};
use crate::money::{format_brl, format_date, format_percent};
use crate::stats::{SectorStats, Summary};

pub const EXCEL_FILE: &str = "Gestao_Gastos_Obra.xlsx";
pub const PDF_FILE: &str = "Relatorio_Gestao_Gastos_Obra.pdf";
const EXCEL_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const PDF_MIME: &str = "application/pdf";
const SVG_MIME: &str = "image/svg+xml";

pub const SYSTEM_NAME: &str = "Sistema de Gestão de Gastos da Obra";
const REPORT_TITLE: &str = "Relatório de Gestão de Gastos da Obra";

/// Starts a browser download of `bytes` under `filename`.
pub fn download_bytes(bytes: &[u8], mime: &str, filename: &str) -> Result<(), ExportError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ExportError::Browser("documento indisponível".into()))?;
    let url = ObjectUrl::from(Blob::new_with_options(bytes, Some(mime)));
    let anchor: HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into()
        .map_err(|_| ExportError::Browser("elemento <a> inválido".into()))?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();
    // the object URL is revoked on drop; the download must have started by then
    Timeout::new(1_000, move || drop(url)).forget();
    info!(filename, size = bytes.len(), "download started");
    Ok(())
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Count(usize),
    Money(Decimal),
    /// 0..=100, written as a spreadsheet percentage.
    Percent(Decimal),
}

pub const ACTIVITY_HEADERS: [&str; 10] = [
    "ID",
    "Data",
    "Atividade",
    "Setor",
    "Valor",
    "Pago Diego-Ana",
    "Pago Alex-Rute",
    "Total Pago",
    "Restante",
    "Status",
];
pub const SUMMARY_HEADERS: [&str; 2] = ["Descrição", "Valor"];
pub const SECTOR_HEADERS: [&str; 6] = [
    "Setor",
    "Total Atividades",
    "Valor Total",
    "Valor Pago",
    "Valor Pendente",
    "Progresso",
];

fn spreadsheet_status(status: ActivityStatus) -> &'static str {
    match status {
        ActivityStatus::Paid => "Concluída",
        ActivityStatus::Pending => "Pendente",
    }
}

pub fn activity_rows(activities: &[Activity]) -> Vec<Vec<Cell>> {
    activities
        .iter()
        .map(|a| {
            vec![
                Cell::Text(a.id.to_string()),
                Cell::Text(a.date_label().to_string()),
                Cell::Text(a.activity_label().to_string()),
                Cell::Text(a.sector_label().to_string()),
                Cell::Money(a.value),
                Cell::Money(a.diego_ana),
                Cell::Money(a.alex_rute),
                Cell::Money(a.paid_total()),
                Cell::Money(a.remaining()),
                Cell::Text(spreadsheet_status(a.status()).to_string()),
            ]
        })
        .collect()
}

pub fn summary_rows(summary: &Summary) -> Vec<Vec<Cell>> {
    let row = |label: &str, cell: Cell| vec![Cell::Text(label.to_string()), cell];
    vec![
        row("Valor Total", Cell::Money(summary.total_value)),
        row("Valor Pago", Cell::Money(summary.total_paid)),
        row("Valor Restante", Cell::Money(summary.remaining)),
        row("Pago Diego-Ana", Cell::Money(summary.paid_diego)),
        row("Pago Alex-Rute", Cell::Money(summary.paid_alex)),
        row("Progresso", Cell::Percent(summary.progress_pct)),
    ]
}

pub fn sector_rows(sectors: &[SectorStats]) -> Vec<Vec<Cell>> {
    sectors
        .iter()
        .map(|s| {
            vec![
                Cell::Text(s.sector.clone()),
                Cell::Count(s.count),
                Cell::Money(s.total),
                Cell::Money(s.paid),
                Cell::Money(s.pending()),
                Cell::Percent(s.progress_pct()),
            ]
        })
        .collect()
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    headers: &[&str],
    rows: &[Vec<Cell>],
) -> Result<(), ExportError> {
    let header = Format::new()
        .set_bold()
        .set_background_color("#3B82F6")
        .set_font_color("#FFFFFF");
    let money = Format::new().set_num_format("\"R$\" #,##0.00");
    let percent = Format::new().set_num_format("0.00%");

    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    for (col, title) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, 18)?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Text(text) => sheet.write_string(r, c, text)?,
                Cell::Count(n) => sheet.write_number(r, c, *n as f64)?,
                Cell::Money(v) => sheet.write_number_with_format(r, c, to_f64(*v), &money)?,
                Cell::Percent(p) => {
                    sheet.write_number_with_format(r, c, to_f64(*p) / 100.0, &percent)?
                }
            };
        }
    }
    Ok(())
}

pub fn build_workbook(
    activities: &[Activity],
    summary: &Summary,
    sectors: &[SectorStats],
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, "Atividades", &ACTIVITY_HEADERS, &activity_rows(activities))?;
    write_sheet(&mut workbook, "Resumo Financeiro", &SUMMARY_HEADERS, &summary_rows(summary))?;
    write_sheet(&mut workbook, "Análise por Setor", &SECTOR_HEADERS, &sector_rows(sectors))?;
    Ok(workbook.save_to_buffer()?)
}

pub fn export_excel(
    activities: &[Activity],
    summary: &Summary,
    sectors: &[SectorStats],
) -> Result<(), ExportError> {
    let bytes = build_workbook(activities, summary, sectors)?;
    download_bytes(&bytes, EXCEL_MIME, EXCEL_FILE)
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const CONTENT_TOP: f32 = PAGE_HEIGHT - MARGIN;
const CONTENT_BOTTOM: f32 = 22.0;
const FOOTER_Y: f32 = 10.0;
const HEADING_KEEP_WITH_NEXT: f32 = 20.0;

const TEXT_COLUMNS: &[f32] = &[MARGIN];
const SECTOR_COLUMNS: &[f32] = &[MARGIN, 85.0, 120.0, 165.0, 210.0, 255.0];
const ACTIVITY_COLUMNS: &[f32] = &[MARGIN, 42.0, 130.0, 175.0, 205.0, 235.0, 265.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Subtitle,
    Heading,
    Text,
    TableHeader,
    TableRow,
}

impl LineStyle {
    fn font_size(self) -> f32 {
        match self {
            LineStyle::Title => 18.0,
            LineStyle::Heading => 13.0,
            LineStyle::Subtitle | LineStyle::Text => 10.0,
            LineStyle::TableHeader | LineStyle::TableRow => 9.0,
        }
    }

    /// Vertical space the line takes, in mm.
    fn height(self) -> f32 {
        match self {
            LineStyle::Title => 10.0,
            LineStyle::Subtitle => 8.0,
            LineStyle::Heading => 11.0,
            LineStyle::Text => 6.0,
            LineStyle::TableHeader => 7.0,
            LineStyle::TableRow => 5.5,
        }
    }

    fn bold(self) -> bool {
        matches!(
            self,
            LineStyle::Title | LineStyle::Heading | LineStyle::TableHeader
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportLine {
    pub style: LineStyle,
    pub cells: Vec<String>,
    columns: &'static [f32],
}

impl ReportLine {
    fn text(style: LineStyle, text: impl Into<String>) -> Self {
        ReportLine {
            style,
            cells: vec![text.into()],
            columns: TEXT_COLUMNS,
        }
    }

    fn row(style: LineStyle, columns: &'static [f32], cells: Vec<String>) -> Self {
        ReportLine {
            style,
            cells,
            columns,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub line: ReportLine,
    /// Baseline, in mm from the bottom of the page.
    pub y: f32,
}

pub fn footer_text(page: usize, pages: usize) -> String {
    format!("Página {} de {}", page, pages)
}

pub fn report_lines(
    summary: &Summary,
    sectors: &[SectorStats],
    activities: &[Activity],
    exported_on: NaiveDate,
) -> Vec<ReportLine> {
    let mut lines = vec![
        ReportLine::text(LineStyle::Title, REPORT_TITLE),
        ReportLine::text(
            LineStyle::Subtitle,
            format!("Exportado em {}", format_date(exported_on)),
        ),
        ReportLine::text(LineStyle::Heading, "Resumo Financeiro"),
        ReportLine::text(LineStyle::Text, format!("Valor Total: {}", format_brl(summary.total_value))),
        ReportLine::text(LineStyle::Text, format!("Valor Pago: {}", format_brl(summary.total_paid))),
        ReportLine::text(LineStyle::Text, format!("Valor Restante: {}", format_brl(summary.remaining))),
        ReportLine::text(
            LineStyle::Text,
            format!(
                "Pago por Diego-Ana: {} ({})",
                format_brl(summary.paid_diego),
                format_percent(summary.diego_pct)
            ),
        ),
        ReportLine::text(
            LineStyle::Text,
            format!(
                "Pago por Alex-Rute: {} ({})",
                format_brl(summary.paid_alex),
                format_percent(summary.alex_pct)
            ),
        ),
        ReportLine::text(LineStyle::Text, format!("Progresso: {}", format_percent(summary.progress_pct))),
        ReportLine::text(
            LineStyle::Text,
            format!(
                "Atividades: {} concluídas, {} pendentes, {} no total",
                summary.completed, summary.pending, summary.total
            ),
        ),
        ReportLine::text(LineStyle::Heading, "Análise por Setor"),
        ReportLine::row(
            LineStyle::TableHeader,
            SECTOR_COLUMNS,
            ["Setor", "Atividades", "Valor Total", "Valor Pago", "Pendente", "Progresso"]
                .map(String::from)
                .to_vec(),
        ),
    ];
    lines.extend(sectors.iter().map(|s| {
        ReportLine::row(
            LineStyle::TableRow,
            SECTOR_COLUMNS,
            vec![
                truncate_label(&s.sector, 30),
                s.count.to_string(),
                format_brl(s.total),
                format_brl(s.paid),
                format_brl(s.pending()),
                format_percent(s.progress_pct()),
            ],
        )
    }));
    lines.push(ReportLine::text(LineStyle::Heading, "Atividades"));
    lines.push(ReportLine::row(
        LineStyle::TableHeader,
        ACTIVITY_COLUMNS,
        ["Data", "Atividade", "Setor", "Valor", "Diego-Ana", "Alex-Rute", "Status"]
            .map(String::from)
            .to_vec(),
    ));
    lines.extend(activities.iter().map(|a| {
        ReportLine::row(
            LineStyle::TableRow,
            ACTIVITY_COLUMNS,
            vec![
                a.date_label().to_string(),
                truncate_label(a.activity_label(), 45),
                truncate_label(a.sector_label(), 22),
                format_brl(a.value),
                format_brl(a.diego_ana),
                format_brl(a.alex_rute),
                spreadsheet_status(a.status()).to_string(),
            ],
        )
    }));
    lines
}

/// Places lines top to bottom, breaking pages at the footer area.
///
/// Headings are not left alone at the bottom of a page, and a table that
/// continues on a new page repeats its header row.
pub fn paginate(lines: &[ReportLine]) -> Vec<Vec<PlacedLine>> {
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut cursor = CONTENT_TOP;
    let mut table_header: Option<&ReportLine> = None;

    for line in lines {
        let needed = match line.style {
            LineStyle::Heading => line.style.height() + HEADING_KEEP_WITH_NEXT,
            style => style.height(),
        };
        if cursor - needed < CONTENT_BOTTOM {
            pages.push(Vec::new());
            cursor = CONTENT_TOP;
            if line.style == LineStyle::TableRow {
                if let Some(header) = table_header {
                    cursor -= header.style.height();
                    if let Some(page) = pages.last_mut() {
                        page.push(PlacedLine {
                            line: header.clone(),
                            y: cursor,
                        });
                    }
                }
            }
        }
        match line.style {
            LineStyle::TableHeader => table_header = Some(line),
            LineStyle::TableRow => {}
            _ => table_header = None,
        }
        cursor -= line.style.height();
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                line: line.clone(),
                y: cursor,
            });
        }
    }
    pages
}

fn pdf_error(err: impl std::fmt::Debug) -> ExportError {
    ExportError::Pdf(format!("{:?}", err))
}

pub fn build_pdf(lines: &[ReportLine]) -> Result<Vec<u8>, ExportError> {
    let pages = paginate(lines);
    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Camada 1");
    let regular: IndirectFontRef = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold: IndirectFontRef = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let total = pages.len();
    for (index, placed_lines) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Camada 1");
            doc.get_page(page).get_layer(layer)
        };
        for placed in placed_lines {
            let style = placed.line.style;
            let font = if style.bold() { &bold } else { &regular };
            for (x, cell) in placed.line.columns.iter().zip(&placed.line.cells) {
                layer.use_text(cell.clone(), style.font_size(), Mm(*x), Mm(placed.y), font);
            }
        }
        layer.use_text(SYSTEM_NAME, 8.0, Mm(MARGIN), Mm(FOOTER_Y), &regular);
        layer.use_text(
            footer_text(index + 1, total),
            8.0,
            Mm(PAGE_WIDTH - MARGIN - 25.0),
            Mm(FOOTER_Y),
            &regular,
        );
    }
    doc.save_to_bytes().map_err(pdf_error)
}

pub fn export_pdf(
    summary: &Summary,
    sectors: &[SectorStats],
    activities: &[Activity],
    exported_on: NaiveDate,
) -> Result<(), ExportError> {
    let lines = report_lines(summary, sectors, activities, exported_on);
    let bytes = build_pdf(&lines)?;
    download_bytes(&bytes, PDF_MIME, PDF_FILE)
}

// ---------------------------------------------------------------------------
// Chart images
// ---------------------------------------------------------------------------

/// `Evolução dos Gastos` -> `Grafico_Evolução_dos_Gastos.svg`
pub fn chart_file_name(name: &str) -> String {
    let slug: Vec<&str> = name.split_whitespace().collect();
    format!("Grafico_{}.svg", slug.join("_"))
}

/// Saves every listed chart present in the document. Returns how many were saved.
pub fn export_chart_images(charts: &[(&str, &str)]) -> Result<usize, ExportError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ExportError::Browser("documento indisponível".into()))?;
    let mut saved = 0;
    for (id, name) in charts {
        let Some(element) = document.get_element_by_id(id) else {
            continue;
        };
        let svg = element.outer_html();
        match download_bytes(svg.as_bytes(), SVG_MIME, &chart_file_name(name)) {
            Ok(()) => saved += 1,
            Err(err) => warn!(%err, chart = %name, "could not export chart"),
        }
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Totals;
    use crate::stats::{by_sector, summarize};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn activity(id: i64, name: &str, sector: &str, value: &str, diego: &str, alex: &str) -> Activity {
        Activity {
            id,
            activity: name.into(),
            sector: Some(sector.into()),
            value: dec(value),
            date: Some("10/01/2024".into()),
            diego_ana: dec(diego),
            alex_rute: dec(alex),
            valor_restante: None,
            status: None,
        }
    }

    fn sample() -> Vec<Activity> {
        vec![
            activity(1, "Piso", "Cozinha", "1000", "500", "500"),
            activity(2, "Pintura", "Sala", "400", "100", "0"),
        ]
    }

    fn totals() -> Totals {
        Totals {
            total_value: dec("1400"),
            total_paid: dec("1100"),
            paid_diego: dec("600"),
            paid_alex: dec("500"),
        }
    }

    #[test]
    fn activity_sheet_rows() {
        let rows = activity_rows(&sample());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), ACTIVITY_HEADERS.len());
        assert_eq!(rows[0][7], Cell::Money(dec("1000")));
        assert_eq!(rows[0][9], Cell::Text("Concluída".into()));
        assert_eq!(rows[1][8], Cell::Money(dec("300")));
        assert_eq!(rows[1][9], Cell::Text("Pendente".into()));
    }

    #[test]
    fn summary_sheet_rows() {
        let summary = summarize(&totals(), &sample());
        let rows = summary_rows(&summary);
        assert_eq!(rows[2], vec![Cell::Text("Valor Restante".into()), Cell::Money(dec("300"))]);
        assert_eq!(rows[5][1], Cell::Percent(summary.progress_pct));
    }

    #[test]
    fn sector_sheet_rows() {
        let rows = sector_rows(&by_sector(&sample()));
        assert_eq!(rows[1][0], Cell::Text("Sala".into()));
        assert_eq!(rows[1][1], Cell::Count(1));
        assert_eq!(rows[1][4], Cell::Money(dec("300")));
        assert_eq!(rows[1][5], Cell::Percent(dec("25")));
    }

    #[test]
    fn workbook_is_a_zip_archive() {
        let acts = sample();
        let bytes = build_workbook(&acts, &summarize(&totals(), &acts), &by_sector(&acts)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn report_starts_with_title_and_export_date() {
        let acts = sample();
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let lines = report_lines(&summarize(&totals(), &acts), &by_sector(&acts), &acts, date);
        assert_eq!(lines[0].cells[0], REPORT_TITLE);
        assert_eq!(lines[1].cells[0], "Exportado em 20/03/2024");
        assert!(lines.iter().any(|l| l.cells[0] == "Valor Restante: R$ 300,00"));
        assert_eq!(lines.last().unwrap().cells[1], "Pintura");
    }

    #[test]
    fn long_reports_break_pages_and_repeat_table_headers() {
        let acts: Vec<Activity> = (0..120)
            .map(|i| activity(i, &format!("Item {}", i), "Obra", "10", "0", "0"))
            .collect();
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let lines = report_lines(&summarize(&totals(), &acts), &by_sector(&acts), &acts, date);
        let pages = paginate(&lines);

        assert!(pages.len() > 2);
        let placed: usize = pages.iter().map(|p| p.len()).sum();
        assert_eq!(placed, lines.len() + pages.len() - 1);
        for page in &pages {
            assert!(page.iter().all(|p| p.y >= CONTENT_BOTTOM && p.y <= CONTENT_TOP));
        }
        for page in &pages[1..] {
            assert_eq!(page[0].line.style, LineStyle::TableHeader);
            assert_eq!(page[0].line.cells[0], "Data");
        }
    }

    #[test]
    fn empty_report_still_has_one_page() {
        assert_eq!(paginate(&[]).len(), 1);
    }

    #[test]
    fn pdf_bytes_have_pdf_header() {
        let acts = sample();
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let lines = report_lines(&summarize(&totals(), &acts), &by_sector(&acts), &acts, date);
        let bytes = build_pdf(&lines).unwrap();
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn footer_and_chart_file_names() {
        assert_eq!(footer_text(2, 5), "Página 2 de 5");
        assert_eq!(chart_file_name("Status"), "Grafico_Status.svg");
        assert_eq!(chart_file_name("Evolução dos Gastos"), "Grafico_Evolução_dos_Gastos.svg");
    }
}
