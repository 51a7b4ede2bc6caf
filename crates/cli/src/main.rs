mod config;
mod error;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use guard::{PolicyGuard, RouteParams};
use mcp::{Channel, EchoDispatcher, ToolPermissionMapper};
use policy::{AbilityBuilder, Action, Instance, Principal, Role, Subject};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "authz.toml";

#[derive(Parser)]
#[command(name = "authz")]
#[command(about = "Inspect and evaluate role/attribute-based permissions", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./authz.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// The principal a command evaluates for.
#[derive(Args)]
struct PrincipalArgs {
    /// Principal id
    #[arg(long)]
    id: String,

    /// Principal role (ADMIN or USER)
    #[arg(long)]
    role: Role,

    /// Principal email
    #[arg(long, default_value = "")]
    email: String,
}

impl PrincipalArgs {
    fn principal(&self) -> Principal {
        Principal::new(&self.id, &self.email, self.role)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rules built for a principal
    Rules {
        #[command(flatten)]
        principal: PrincipalArgs,
    },
    /// Check one action against a resource type or a JSON object
    Check {
        #[command(flatten)]
        principal: PrincipalArgs,
        /// Action (manage, create, read, list, update, delete, access, execute)
        action: Action,
        /// Resource type name, or a JSON object to classify
        subject: String,
    },
    /// Evaluate a route's policies
    Route {
        #[command(flatten)]
        principal: PrincipalArgs,
        /// Route name (e.g. users.read)
        name: String,
        /// Route parameter as key=value
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Run a command-channel message through the full gate
    Message {
        #[command(flatten)]
        principal: PrincipalArgs,
        /// File holding the JSON message body (stdin when omitted)
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.debug, &config.logging.level);

    match cli.command {
        Commands::Rules { principal } => cmd_rules(&config, &principal.principal()),
        Commands::Check {
            principal,
            action,
            subject,
        } => cmd_check(&config, &principal.principal(), action, &subject),
        Commands::Route {
            principal,
            name,
            params,
        } => cmd_route(&config, &principal.principal(), &name, &params),
        Commands::Message { principal, file } => {
            cmd_message(config, &principal.principal(), file.as_deref()).await
        }
    }
}

fn cmd_rules(config: &Config, principal: &Principal) -> Result<()> {
    let ability = AbilityBuilder::new(config.rules.clone()).build(principal);
    println!("{}", serde_json::to_string_pretty(&ability)?);
    Ok(())
}

fn cmd_check(config: &Config, principal: &Principal, action: Action, subject: &str) -> Result<()> {
    let subject = parse_subject(subject)?;
    let ability = AbilityBuilder::new(config.rules.clone()).build(principal);
    let allowed = ability.can_subject(action, &subject);
    debug!(%action, resource = %subject.resource(), allowed, "check");
    println!("{}", if allowed { "allow" } else { "deny" });
    Ok(())
}

fn cmd_route(config: &Config, principal: &Principal, name: &str, params: &[String]) -> Result<()> {
    let params = parse_params(params)?;
    let route = config.routes.get(name)?;
    let guard = PolicyGuard::new(AbilityBuilder::new(config.rules.clone()));

    match guard.authorize(Some(principal), &params, route) {
        Ok(_) => println!("allow"),
        Err(guard::Error::Forbidden) => println!("deny"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn cmd_message(config: Config, principal: &Principal, file: Option<&Path>) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut body = String::new();
            io::stdin().read_to_string(&mut body)?;
            body
        }
    };

    let channel = Channel::new(
        PolicyGuard::new(AbilityBuilder::new(config.rules)),
        &config.routes,
        ToolPermissionMapper::new(config.channel),
        EchoDispatcher,
    )?;
    let response = channel.handle_body(Some(principal), &body).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn parse_subject(subject: &str) -> Result<Subject> {
    if subject.trim_start().starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(subject)?;
        let instance = Instance::from_value(value)
            .ok_or_else(|| Error::InvalidSubject(format!("cannot determine type of {subject}")))?;
        Ok(Subject::Instance(instance))
    } else {
        Ok(Subject::Type(subject.parse()?))
    }
}

fn parse_params(params: &[String]) -> Result<RouteParams> {
    params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| Error::InvalidParam(param.clone()))
        })
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Ok(Config::load(path)?);
    }

    let default_path = Path::new(CONFIG_FILE);
    if default_path.exists() {
        Ok(Config::load(default_path)?)
    } else {
        Ok(Config::default_config())
    }
}

fn init_tracing(debug: bool, level: &str) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy::ResourceType;

    #[test]
    fn subject_type_names() {
        assert_eq!(parse_subject("MCP").unwrap(), Subject::Type(ResourceType::Mcp));
        assert!(matches!(parse_subject("Invoice"), Err(Error::Policy(_))));
    }

    #[test]
    fn subject_objects_are_classified() {
        let subject = parse_subject(r#"{"userId": "u1", "public": true}"#).unwrap();
        assert_eq!(subject.resource(), ResourceType::Resource);
        assert!(matches!(
            parse_subject(r#"{"__type": "Invoice"}"#),
            Err(Error::InvalidSubject(_))
        ));
    }

    #[test]
    fn route_params() {
        let params = parse_params(&["id=u1".to_string(), "tag=a=b".to_string()]).unwrap();
        assert_eq!(params["id"], "u1");
        assert_eq!(params["tag"], "a=b");
        assert!(matches!(
            parse_params(&["id".to_string()]),
            Err(Error::InvalidParam(_))
        ));
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "authz", "check", "--id", "u1", "--role", "USER", "read", r#"{"id":"u1"}"#,
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Check { action: Action::Read, .. }));

        assert!(Cli::try_parse_from(["authz", "rules", "--id", "u1", "--role", "GUEST"]).is_err());
    }
}
