//! vultaddr 主入口
//! 读取 .vult 金库，离线派生各链地址

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use vultaddr::{
    config::Config,
    domain::{ChainRegistry, VaultRecord},
    error::{AddressError, ErrorBody},
    infrastructure::{logging, password::Password},
    service::{container_codec, AddressDerivationService},
    utils::AddressValidator,
};

#[derive(Debug, Parser)]
#[command(name = "vultaddr", version, about = "Watch-only addresses from a .vult vault")]
struct Cli {
    /// TOML 配置文件（覆盖环境变量）
    #[arg(long, global = true, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 派生地址
    Addresses {
        #[arg(long)]
        vault: Option<PathBuf>,
        /// 逗号分隔的链列表，缺省为配置中的链或全部链
        #[arg(long, value_delimiter = ',')]
        chains: Vec<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// 显示金库元数据
    Info {
        #[arg(long)]
        vault: Option<PathBuf>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// 列出支持的链
    Chains {
        #[arg(long)]
        json: bool,
    },
    /// 校验地址格式
    Verify {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        address: String,
    },
}

fn main() -> ExitCode {
    // 1. 加载 .env（可选）
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    // 2. 加载并校验配置
    let config = Config::from_env_and_file(cli.config.as_deref())?;
    config.validate().context("Invalid configuration")?;

    // 3. 初始化日志（stderr）
    logging::init_logging(&config.logging)?;

    match cli.command {
        Command::Addresses {
            vault,
            chains,
            password,
            json,
        } => {
            let record = match load_record(&config, vault.as_deref(), password, json)? {
                Some(record) => record,
                None => return Ok(ExitCode::FAILURE),
            };
            let service = AddressDerivationService::from_config(&config.derivation)?;

            let names = if chains.is_empty() {
                config.derivation.chains.clone()
            } else {
                chains
            };
            let results = if names.is_empty() {
                service
                    .derive_all(&record)
                    .into_iter()
                    .map(|(chain, result)| (chain.as_str().to_string(), result))
                    .collect()
            } else {
                service.derive_named(&record, &names)
            };

            print_addresses(&results, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Info {
            vault,
            password,
            json,
        } => {
            let record = match load_record(&config, vault.as_deref(), password, json)? {
                Some(record) => record,
                None => return Ok(ExitCode::FAILURE),
            };
            print_info(&record, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Chains { json } => {
            let registry = ChainRegistry::shared();
            registry.validate()?;
            print_chains(&registry, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { chain, address } => {
            let valid = AddressValidator::validate(&chain, &address)?;
            println!("{}", if valid { "valid" } else { "invalid" });
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// 读取并解码金库；容器级错误已输出时返回 None
fn load_record(
    config: &Config,
    vault: Option<&Path>,
    password: Option<String>,
    json: bool,
) -> Result<Option<VaultRecord>> {
    let path = vault
        .map(Path::to_path_buf)
        .or_else(|| config.vault.path.clone())
        .context("No vault file given (use --vault or VAULT_PATH)")?;
    let input =
        std::fs::read(&path).with_context(|| format!("Failed to read vault file: {:?}", path))?;

    // 命令行密码优先于配置
    let password = password.map(Password::new).or_else(|| config.vault.password.clone());
    let kdf = config.vault.key_derivation()?;

    match container_codec::load_vault_with(&input, password.as_ref().map(Password::as_str), kdf) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::error!(error_code = e.code(), path = ?path, "failed to load vault");
            if json {
                let body = ErrorBody {
                    code: e.code(),
                    message: e.to_string(),
                };
                println!("{}", serde_json::to_string_pretty(&json!({ "error": body }))?);
            } else {
                eprintln!("Error: {}", e);
            }
            Ok(None)
        }
    }
}

fn print_addresses(results: &[(String, Result<String, AddressError>)], json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = results
            .iter()
            .map(|(chain, result)| match result {
                Ok(address) => json!({ "chain": chain, "address": address }),
                Err(e) => json!({ "chain": chain, "error": ErrorBody::from(e) }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (chain, result) in results {
        match result {
            Ok(address) => println!("{:<8} {}", chain, address),
            Err(e) => println!("{:<8} Error: {}", chain, e),
        }
    }
    Ok(())
}

fn print_info(record: &VaultRecord, json: bool) -> Result<()> {
    let summary = record.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let none = || "-".to_string();
    println!("Name:            {}", summary.name);
    println!("Signers:         {}", summary.signers.join(", "));
    println!("Local party:     {}", summary.local_party_id);
    println!("Lib type:        {:?}", summary.lib_type);
    println!(
        "Created at:      {}",
        summary.created_at.map(|t| t.to_rfc3339()).unwrap_or_else(none)
    );
    println!(
        "Reshare prefix:  {}",
        summary.reshare_prefix.unwrap_or_else(none)
    );
    println!(
        "ECDSA key:       {}",
        summary.public_key_ecdsa.unwrap_or_else(none)
    );
    println!(
        "EdDSA key:       {}",
        summary.public_key_eddsa.unwrap_or_else(none)
    );
    println!(
        "Chain code:      {}",
        summary.hex_chain_code.unwrap_or_else(none)
    );
    Ok(())
}

fn print_chains(registry: &ChainRegistry, json: bool) -> Result<()> {
    let profiles = registry.list_all();
    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    for profile in profiles {
        println!(
            "{:<6} {:<20} {:<10} {:<20} {:<16} {}",
            profile.chain.as_str(),
            profile.chain.name(),
            profile.algorithm.curve(),
            profile.path_notation,
            profile.derivation_path.to_string(),
            profile.address_strategy.tag()
        );
    }
    Ok(())
}
