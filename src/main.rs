use std::sync::Arc;

use clap::Parser;
use inventory_report::{cli, config, logging, render};
use inventory_report::{DirectorySink, HttpGateway, ReportDetailViewModel};
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;

    let mut config = Config::load()?;
    if let Some(url) = cli.base_url.clone() {
        config.override_base_url(url)?;
    }

    match cli.command {
        Commands::List => {
            let gateway = HttpGateway::from_config(&config)?;
            let reports = gateway.list_reports().await?;
            print!("{}", render::render_report_list(&reports));
        }

        Commands::Show { report_id, search, json } => {
            let gateway = Arc::new(HttpGateway::from_config(&config)?);
            let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
            let mut vm = ReportDetailViewModel::new(gateway, sink);

            vm.activate(report_id);
            vm.settle().await;
            if let Some(query) = search {
                vm.set_search_query(query);
            }

            let model = vm.read_model();
            if json {
                println!("{}", serde_json::to_string_pretty(&model)?);
            } else {
                print!("{}", render::render_read_model(&model));
            }
        }

        Commands::Export { report_id, format } => {
            println!("📄 inventory-report - エクスポート\n");

            let gateway = Arc::new(HttpGateway::from_config(&config)?);
            let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));
            let mut vm = ReportDetailViewModel::new(gateway, sink);

            vm.activate(report_id);
            vm.settle().await;

            let record = vm.initiate_export(&format).await?;
            println!("✔ エクスポートを作成: [{}] {} ({})", record.id, record.file_name, record.status);

            vm.settle().await;
            println!("\nエクスポート:");
            print!("{}", render::render_exports(vm.export_records()));
        }

        Commands::Download { report_id, export_id, output } => {
            let dir = output.unwrap_or_else(|| config.download_dir.clone());
            let gateway = Arc::new(HttpGateway::from_config(&config)?);
            let sink = Arc::new(DirectorySink::new(dir));
            let mut vm = ReportDetailViewModel::new(gateway, sink);

            vm.activate(report_id);
            vm.settle().await;

            let path = vm.download_export(export_id).await?;
            println!("✔ 保存しました: {}", path.display());
        }

        Commands::BulkScans => {
            let gateway = HttpGateway::from_config(&config)?;
            let records = gateway.list_bulk_scan_records().await?;
            if records.is_empty() {
                println!("バルクスキャンレコードがありません");
            }
            for r in records {
                println!("{:>5}  {:<10}  {}", r.id, r.status.as_str(), r.file_name);
            }
        }

        Commands::Create { bulk_scan_file, csv } => {
            if !csv.exists() {
                anyhow::bail!("CSVファイルが見つかりません: {}", csv.display());
            }

            let gateway = HttpGateway::from_config(&config)?;
            let report = gateway.create_report(&bulk_scan_file, &csv).await?;
            println!("✔ レポートを作成しました\n");
            print!("{}", render::render_report(&report));
        }

        Commands::Config { set_base_url, set_download_dir, show } => {
            // --base-urlは一時的な上書きなので保存対象に含めない
            let mut config = Config::load()?;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ ベースURLを設定しました");
            }

            if let Some(dir) = set_download_dir {
                config.set_download_dir(dir)?;
                println!("✔ ダウンロード先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  ベースURL: {}", config.base_url);
                println!("  ダウンロード先: {}", config.download_dir.display());
                match config.timeout_seconds {
                    Some(secs) => println!("  タイムアウト: {}秒", secs),
                    None => println!("  タイムアウト: 既定値"),
                }
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
