//! sgaclc entry point.
//!
//! Compiles security group ACLs offline from a directory snapshot and
//! prints the resulting records as JSON.

mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use sgacl::{AclCompiler, CompilerConfig, InMemoryDirectory, LookupCache, DEFAULT_CONFIG_PATH};

use crate::output::JsonApplier;

/// Security group ACL compiler
#[derive(Parser, Debug)]
#[command(name = "sgaclc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Compiler configuration file (TOML)
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    /// Directory snapshot (JSON with ports, subnets and security_groups)
    #[arg(short = 's', long)]
    snapshot: PathBuf,

    /// Force external (non-native) DHCP responses
    #[arg(long)]
    external_dhcp: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the complete ACL set of one or more ports
    Port {
        /// Port IDs; all ports in the snapshot when omitted
        ids: Vec<String>,
    },
    /// Compile the per-port entries for one added or removed rule
    RuleChange {
        /// Security group the rule belongs to
        #[arg(short = 'g', long)]
        group: String,

        /// Index of the rule within the group
        #[arg(short = 'r', long)]
        rule_index: usize,

        /// Retract the entries instead of inserting them
        #[arg(long)]
        remove: bool,
    },
    /// List the addresses ports contribute to their groups' address sets
    Addresses {
        /// Port IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = CompilerConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if args.external_dhcp {
        config.native_dhcp = false;
        config.validate();
    }

    let directory = InMemoryDirectory::from_json_file(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;
    info!(
        "Snapshot: {} ports, {} subnets, {} security groups",
        directory.ports.len(),
        directory.subnets.len(),
        directory.security_groups.len()
    );

    let applier = JsonApplier::new(io::stdout().lock());
    let compiler = AclCompiler::new(config, &directory);
    let mut cache = LookupCache::new();

    match args.command {
        Command::Port { ids } => {
            let ports = if ids.is_empty() {
                directory.ports.clone()
            } else {
                ids.iter()
                    .map(|id| {
                        directory
                            .port(id)
                            .cloned()
                            .ok_or_else(|| anyhow!("port {} not in snapshot", id))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?
            };

            for port in &ports {
                compiler
                    .apply_port(port, &mut cache, &applier)
                    .with_context(|| format!("compiling port {}", port.id))?;
            }
            info!("Compiled {} ports, cache {:?}", ports.len(), cache.stats());
        }
        Command::RuleChange {
            group,
            rule_index,
            remove,
        } => {
            let sg = directory
                .security_groups
                .iter()
                .find(|g| g.id == group)
                .ok_or_else(|| anyhow!("security group {} not in snapshot", group))?;
            let Some(rule) = sg.rules.get(rule_index) else {
                bail!(
                    "security group {} has {} rules, no index {}",
                    group,
                    sg.rules.len(),
                    rule_index
                );
            };

            let applied = compiler
                .apply_rule_change(&group, rule, !remove, &mut cache, &applier)
                .with_context(|| format!("compiling rule {} of {}", rule_index, group))?;
            if !applied {
                warn!("Rule change for {} affects no ports", group);
            }
        }
        Command::Addresses { ids } => {
            for id in &ids {
                let port = directory
                    .port(id)
                    .ok_or_else(|| anyhow!("port {} not in snapshot", id))?;
                let addresses =
                    sgacl::port_addresses(port, compiler.config().security_groups_enabled);
                applier
                    .write_addresses(id, &addresses)
                    .map_err(|e| anyhow!(e))?;
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
