use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;

use sure_infra_core::context::StackContext;
use sure_infra_core::deploy::{ApplyOutcome, Deployment, ResourceOutcome};
use sure_infra_core::output::OutputSource;
use sure_infra_core::resource::{ResourceDeclaration, Value};
use sure_infra_stack::config::StackConfig;
use sure_infra_stack::declare_stack;

mod simulate;

use simulate::SimulationEngine;

#[derive(Parser)]
#[command(name = "sure-infra")]
#[command(about = "Declarative deployment of the sure-oracle service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StackArgs {
    /// Domain the TLS certificate is requested for
    #[arg(long)]
    domain: Option<String>,

    /// Container, repository and image name
    #[arg(long)]
    container_name: Option<String>,

    /// Port the container listens on
    #[arg(long)]
    container_port: Option<u16>,

    /// Number of service replicas
    #[arg(long)]
    desired_count: Option<i64>,

    /// Image build context directory
    #[arg(long)]
    build_context: Option<String>,

    /// Build file path
    #[arg(long)]
    dockerfile: Option<String>,
}

impl StackArgs {
    fn into_config(self) -> StackConfig {
        let mut config = StackConfig::default();
        if let Some(domain) = self.domain {
            config.domain = domain;
        }
        if let Some(container_name) = self.container_name {
            config.container_name = container_name;
        }
        if let Some(container_port) = self.container_port {
            config.container_port = container_port;
        }
        if let Some(desired_count) = self.desired_count {
            config.desired_count = desired_count;
        }
        if let Some(build_context) = self.build_context {
            config.build_context = build_context;
        }
        if let Some(dockerfile) = self.dockerfile {
            config.dockerfile = dockerfile;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the declaration sequence without submitting anything
    Preview {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// Run the declaration pass against the local simulation engine
    Apply {
        #[command(flatten)]
        stack: StackArgs,

        /// Directory the simulation state file lives in
        #[arg(long, default_value = ".sure")]
        state_dir: PathBuf,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Preview { stack } => run_preview(stack.into_config()),
        Commands::Apply { stack, state_dir } => run_apply(stack.into_config(), state_dir).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "sure-infra",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_context(config: &StackConfig) -> Result<StackContext, String> {
    let mut ctx = StackContext::new();
    declare_stack(&mut ctx, config).map_err(|e| e.to_string())?;
    Ok(ctx)
}

fn run_preview(config: StackConfig) -> Result<(), String> {
    let ctx = build_context(&config)?;
    print_declarations(&ctx);
    print_pending_exports(&ctx);
    Ok(())
}

async fn run_apply(config: StackConfig, state_dir: PathBuf) -> Result<(), String> {
    let ctx = build_context(&config)?;
    print_declarations(&ctx);
    println!();

    println!("{}", "Applying declarations...".cyan().bold());
    println!();

    let deployment = Deployment::new(SimulationEngine::new(state_dir));
    let outcome = deployment.run(ctx).await.map_err(|e| e.to_string())?;

    for resource in &outcome.outcomes {
        println!("  {} {}", "✓".green(), format_outcome(resource));
    }

    print_outputs(&outcome);

    println!();
    println!(
        "{}",
        format!("Apply complete! {} resources.", outcome.outcomes.len())
            .green()
            .bold()
    );
    Ok(())
}

fn format_outcome(outcome: &ResourceOutcome) -> String {
    match outcome {
        ResourceOutcome::Read { id } => format!("Read {}", id),
        ResourceOutcome::Created { id } => format!("Create {}", id),
    }
}

fn print_declarations(ctx: &StackContext) {
    println!("{}", "Declaration Plan:".cyan().bold());
    println!();

    for declaration in ctx.declarations() {
        let symbol = if declaration.read_only {
            "?".normal()
        } else {
            "+".green().bold()
        };
        println!(
            "  {} {} {}",
            symbol,
            declaration.id.resource_type.cyan().bold(),
            declaration.id.name.white().bold()
        );
        print_properties(ctx, declaration);
    }

    let reads = ctx.declarations().iter().filter(|d| d.read_only).count();
    let creates = ctx.declarations().len() - reads;
    println!();
    println!(
        "Plan: {} to add, {} to look up.",
        creates.to_string().green(),
        reads.to_string().normal()
    );
}

fn print_properties(ctx: &StackContext, declaration: &ResourceDeclaration) {
    let mut keys: Vec<_> = declaration.properties.keys().collect();
    keys.sort();
    for key in keys {
        println!(
            "      {}: {}",
            key,
            format_value(ctx, &declaration.properties[key]).green()
        );
    }
    if !declaration.depends_on.is_empty() {
        let deps: Vec<_> = declaration
            .depends_on
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!("      {}: [{}]", "depends_on".yellow(), deps.join(", "));
    }
}

/// Render a property value, with deferred references shown symbolically
fn format_value(ctx: &StackContext, value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(|v| format_value(ctx, v)).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let strs: Vec<_> = keys
                .iter()
                .map(|k| format!("{}: {}", k, format_value(ctx, &map[*k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
        Value::Ref(r) => match ctx.source(*r) {
            Some(OutputSource::Attribute {
                resource,
                attribute,
            }) => format!("${{{}.{}}}", resource, attribute),
            Some(OutputSource::Transform { name, .. }) => format!("apply({})", name),
            None => r.to_string(),
        },
    }
}

fn print_pending_exports(ctx: &StackContext) {
    if ctx.exports().is_empty() {
        return;
    }
    println!();
    println!("{}", "Exports:".cyan().bold());
    for (name, value) in ctx.exports() {
        println!("  {} = {}", name.bold(), format_value(ctx, value).green());
    }
}

fn print_outputs(outcome: &ApplyOutcome) {
    if outcome.outputs.is_empty() {
        return;
    }
    println!();
    println!("{}", "Outputs:".cyan().bold());
    for (name, value) in &outcome.outputs {
        println!("  {} = {}", name.bold(), value);
    }
}
