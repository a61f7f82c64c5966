use std::{fs::File, io::Write, path::Path, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use chainwatch_auditor::{checks::Auditor, config::Config, store::PgIndexStore};
use chainwatch_common::{config::VERSION, rpc::NodeClient};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let mut config = Config::parse();
    if let Some(path) = config.config_file.clone() {
        if config.generate_config_template {
            if Path::new(&path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(ExitCode::FAILURE);
            }

            let mut file = File::create(&path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config)
                .context("Error while serializing config file")?;
            file.write_all(json.as_bytes())
                .context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(ExitCode::SUCCESS);
        }

        let file = File::open(&path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
    } else if config.generate_config_template {
        eprintln!("Provided config file path is required to generate the template with --config-file");
        return Ok(ExitCode::FAILURE);
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str())).init();

    info!("chainwatch auditor v{}", VERSION);
    info!(
        "auditing node {} against store {}:{}/{} (schema '{}')",
        config.node_address,
        config.store_host,
        config.store_port,
        config.store_dbname,
        config.store_schema
    );

    let node = NodeClient::with_config(&config.node_address, config.node_client_config())
        .context("Error while building the node client")?;
    let store =
        PgIndexStore::new(&config.store_config()).context("Error while building the store pool")?;

    let auditor = Auditor::new(&node, &store, config.thresholds());
    let report = match auditor.run_all().await {
        Ok(report) => report,
        Err(e) => {
            error!("audit run aborted: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut failed = false;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(verdict) if verdict.is_pass() => info!("{}: {}", outcome.check, verdict),
            Ok(verdict) => {
                failed = true;
                error!("{}: {}", outcome.check, verdict);
            }
            Err(e) => {
                failed = true;
                error!("{}", e);
            }
        }
    }

    if failed {
        return Ok(ExitCode::FAILURE);
    }

    info!("all consistency checks passed");
    Ok(ExitCode::SUCCESS)
}
