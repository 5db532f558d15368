//! 読み取りモデルのテキスト表示（CLI用）

use inventory_report_common::{ComparisonRow, ExportRecord, Report, Summary};

use crate::view_model::ReadModel;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn check_mark(value: bool) -> &'static str {
    if value {
        "✔"
    } else {
        "✘"
    }
}

pub fn render_report(report: &Report) -> String {
    format!(
        "ID: {}\nステータス: {}\nバルクスキャン: {}\n参照ファイル: {}\n作成日時: {}\n更新日時: {}\n",
        report.id,
        report.status,
        report.bulk_scan_file_name,
        report.reference_file_name,
        report.created_at.format(DATE_FORMAT),
        report.updated_at.format(DATE_FORMAT),
    )
}

/// レポート一覧（1行1レポート）
pub fn render_report_list(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "レポートがありません\n".to_string();
    }

    let mut out = String::new();
    for r in reports {
        out.push_str(&format!(
            "{:>5}  {:<10}  {}  {} / {}\n",
            r.id,
            r.status.as_str(),
            r.created_at.format(DATE_FORMAT),
            r.bulk_scan_file_name,
            r.reference_file_name,
        ));
    }
    out
}

pub fn render_summary(summary: &Summary) -> String {
    summary
        .iter()
        .map(|(label, count)| format!("  {}: {}\n", label, count))
        .collect()
}

pub fn render_rows(rows: &[ComparisonRow]) -> String {
    let headers = ["Location", "Scanned", "Occupied", "Actual Barcodes", "Expected Barcodes", "Result"];
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.location.clone(),
                check_mark(r.scanned).to_string(),
                check_mark(r.occupied).to_string(),
                r.actual_barcodes.join(", "),
                r.expected_barcodes.join(", "),
                r.result.clone(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |values: Vec<&str>| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{}{}", v, " ".repeat(w - v.chars().count())))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(headers.to_vec());
    out.push_str(&format!(
        "{}\n",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    ));
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

pub fn render_exports(records: &[ExportRecord]) -> String {
    if records.is_empty() {
        return "  エクスポート済みファイルはありません\n".to_string();
    }

    records
        .iter()
        .map(|r| {
            let state = if r.status.is_completed() {
                "ダウンロード可".to_string()
            } else {
                r.status.to_string()
            };
            format!("  [{}] {} ({})\n", r.id, r.file_name, state)
        })
        .collect()
}

/// 読み取りモデル全体（スライスごとにエラー・取得中を表示）
pub fn render_read_model(model: &ReadModel) -> String {
    let mut out = String::new();

    match (&model.report, &model.errors.report, model.loading.report) {
        (Some(report), _, _) => out.push_str(&render_report(report)),
        (None, Some(err), _) => out.push_str(&format!("⚠ レポートを取得できません: {}\n", err)),
        (None, None, true) => out.push_str("読み込み中...\n"),
        (None, None, false) => {}
    }

    out.push_str("\nエクスポート:\n");
    match &model.errors.exports {
        Some(err) => out.push_str(&format!("  ⚠ 一覧を取得できません: {}\n", err)),
        None => out.push_str(&render_exports(&model.export_records)),
    }
    if let Some(err) = &model.errors.export_command {
        out.push_str(&format!("  ⚠ {}\n", err));
    }

    out.push_str("\n集計:\n");
    out.push_str(&render_summary(&model.summary));

    out.push('\n');
    if let Some(err) = &model.errors.rows {
        out.push_str(&format!("⚠ 比較結果を取得できません: {}\n", err));
    } else if model.loading.rows {
        out.push_str("比較結果を読み込み中...\n");
    } else {
        if !model.search_query.is_empty() {
            out.push_str(&format!(
                "検索: \"{}\" ({}/{}件)\n",
                model.search_query,
                model.filtered_rows.len(),
                model.total_rows
            ));
        }
        out.push_str(&render_rows(&model.filtered_rows));
    }

    out
}
