//! syscfg CLI
//!
//! Entry point for the `syscfg` command-line tool.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use syscfg::logging;
use syscfg::{Pipeline, PipelineConfig, PipelineError, Resolution};

#[derive(Parser)]
#[command(name = "syscfg")]
#[command(about = "Resolve package settings and generate syscfg.h", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// Project root holding package manifests and syscfg.toml
    #[arg(long, short = 'p', default_value = ".")]
    project: PathBuf,

    /// Directory under which include/syscfg/syscfg.h is written
    #[arg(long)]
    target_root: Option<PathBuf>,

    /// Declared API (repeatable)
    #[arg(long = "api")]
    apis: Vec<String>,

    /// Initially truthy feature (repeatable)
    #[arg(long = "feature")]
    features: Vec<String>,

    /// Injected setting as NAME=VALUE (repeatable)
    #[arg(long = "inject", value_parser = parse_injection)]
    injected: Vec<(String, String)>,

    /// Report same-tier conflicts as warnings instead of failing
    #[arg(long)]
    allow_ambiguity: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve settings and write the header if it changed
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve settings and print them without writing anything
    Show {
        #[command(flatten)]
        input: InputArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Print the header that would be written instead of the settings
        #[arg(long, conflicts_with = "json")]
        header: bool,
    },

    /// Show how one setting got its value
    Explain {
        /// Setting name
        name: String,

        #[command(flatten)]
        input: InputArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn parse_injection(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

impl InputArgs {
    /// CLI configuration layer. Only flags that were given appear.
    fn overrides(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();

        if let Some(root) = &self.target_root {
            map.insert(
                "target_root".to_string(),
                serde_json::Value::String(root.to_string_lossy().to_string()),
            );
        }
        if !self.apis.is_empty() {
            map.insert("apis".to_string(), serde_json::json!(self.apis));
        }
        if !self.features.is_empty() {
            map.insert("features".to_string(), serde_json::json!(self.features));
        }
        if !self.injected.is_empty() {
            let injected: serde_json::Map<String, serde_json::Value> = self
                .injected
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("injected".to_string(), serde_json::Value::Object(injected));
        }
        if self.allow_ambiguity {
            map.insert("fail_on_ambiguity".to_string(), serde_json::Value::Bool(false));
        }

        serde_json::Value::Object(map)
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(PipelineConfig::new(&self.project).with_overrides(self.overrides()))
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Generate { input, json } => run_generate(&input, json),
        Commands::Show {
            input,
            json,
            header,
        } => run_show(&input, json, header),
        Commands::Explain { name, input, json } => run_explain(&name, &input, json),
    }
}

fn fail(e: PipelineError) -> ! {
    eprintln!("Error: {}", e);
    process::exit(e.exit_code());
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_generate(input: &InputArgs, json_output: bool) {
    let report = input.pipeline().run().unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&report);
        return;
    }

    let state = if report.written { "written" } else { "unchanged" };
    println!("{} ({})", report.header_path.display(), state);
    println!("  packages:       {}", report.package_count);
    println!("  settings:       {}", report.setting_count);
    println!("  resolution key: {}", report.resolution_key);
    if !report.orphans.is_empty() {
        println!("  orphans:        {}", report.orphans.len());
    }
    if !report.ambiguities.is_empty() {
        println!("  ambiguities:");
        for ambiguity in &report.ambiguities {
            println!("    {}", ambiguity.text());
        }
    }
}

fn resolve_or_exit(input: &InputArgs) -> Resolution {
    input.pipeline().show().unwrap_or_else(|e| fail(e))
}

fn run_show(input: &InputArgs, json_output: bool, header: bool) {
    if header {
        let text = input.pipeline().preview().unwrap_or_else(|e| fail(e));
        print!("{}", text);
        return;
    }

    let res = resolve_or_exit(input);

    if json_output {
        print_json(&res);
        return;
    }

    for setting in res.settings.values() {
        println!(
            "{} = {}  ({})  {}",
            setting.name,
            setting.value,
            setting.kind.as_str(),
            setting.history_text()
        );
    }
}

fn run_explain(name: &str, input: &InputArgs, json_output: bool) {
    let res = resolve_or_exit(input);

    let setting = match res.get(name) {
        Some(s) => s,
        None => {
            eprintln!("Setting '{}' is not defined.", name);
            if let Some(points) = res.orphans.get(name) {
                let points: Vec<String> = points.iter().map(|p| p.text()).collect();
                eprintln!("Overridden without a definition: [{}]", points.join(", "));
            }
            process::exit(3);
        }
    };

    if json_output {
        print_json(&serde_json::json!({
            "setting": setting,
            "unfixed_value": setting.unfixed_value(),
        }));
        return;
    }

    println!("{}", setting.name);
    if !setting.description.is_empty() {
        println!("  description:   {}", setting.description);
    }
    println!("  kind:          {}", setting.kind.as_str());
    println!("  defined by:    {}", setting.definer().source.label());
    println!("  value:         {}", setting.value);
    println!("  unfixed value: {}", setting.unfixed_value());
    println!("  history:");
    for point in setting.history() {
        println!("    {}", point.text());
    }
}
