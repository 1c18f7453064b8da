//! `prompt-fields`: extract and fill placeholder blocks in prompt templates.
use anyhow::{Context, Result, ensure};
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

mod ctx;
mod render;
mod template;
mod util;

use ctx::Ctx;
use render::{engine, parser};
use template::Template;

#[derive(Parser)]
#[command(name = "prompt-fields", about = "Fill placeholder blocks in prompt templates")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List templates in the library
    List,

    /// Print the fields a template asks for
    Fields {
        /// Library name, file path, or `-` for stdin
        template: String,
        #[arg(long)]
        json: bool,
    },

    /// Fill a template's fields and print or write the result
    Fill {
        /// Library name, file path, or `-` for stdin
        template: String,
        /// TOML file mapping field ids to values
        #[arg(long)]
        values: Option<PathBuf>,
        /// Set one field, e.g. `--set field-1=Alice` (overrides --values)
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_set)]
        set: Vec<(String, String)>,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Refuse templates with duplicate blocks
        #[arg(long)]
        strict: bool,
        /// Refuse to fill when any field has no value
        #[arg(long)]
        require_all: bool,
    },

    /// Report duplicate blocks and stray delimiters
    Check {
        /// Library name, file path, or `-` for stdin
        template: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Ctx::new().context("initialise context")?;

    match cli.cmd {
        Cmd::List => cmd_list(&ctx),

        Cmd::Fields { template, json } => {
            let tpl = Template::resolve(&ctx.templates_dir, &template)?;
            print_fields(&tpl.fields(), json)
        }

        Cmd::Fill {
            template,
            values,
            set,
            out,
            strict,
            require_all,
        } => {
            let tpl = Template::resolve(&ctx.templates_dir, &template)?;
            let vals = engine::merge_values(values.as_deref(), set).context("load values")?;
            let policy = engine::FillPolicy { strict, require_all };
            cmd_fill(&tpl, &vals, out.as_deref(), policy)
        }

        Cmd::Check { template } => {
            let tpl = Template::resolve(&ctx.templates_dir, &template)?;
            let issues = parser::lint(&tpl.content);
            let label = tpl
                .path
                .as_ref()
                .map_or_else(|| tpl.name.clone(), |p| p.display().to_string());
            for issue in &issues {
                println!("{label}: {issue}");
            }
            ensure!(issues.is_empty(), "{} issue(s) in '{}'", issues.len(), tpl.name);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn parse_set(raw: &str) -> Result<(String, String)> {
    engine::parse_assignment(raw)
}

fn cmd_list(ctx: &Ctx) -> Result<()> {
    let names = template::list(&ctx.templates_dir).with_context(|| {
        format!(
            "set templates_dir in {} or {}",
            ctx.config_file.display(),
            ctx::TEMPLATES_ENV
        )
    })?;

    for name in names {
        let tpl = Template::load(&ctx.templates_dir, &name)?;
        let count = tpl.fields().len();
        let desc = tpl.meta.description.as_deref().unwrap_or("");
        if tpl.meta.policies.is_empty() {
            println!("{name}\t{count} field(s)\t{desc}");
        } else {
            let policies = tpl.meta.policies.join(", ");
            println!("{name}\t{count} field(s)\t{desc}\t[policies: {policies}]");
        }
    }
    Ok(())
}

fn print_fields(fields: &[parser::Field], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(fields).context("encode fields")?);
        return Ok(());
    }
    for f in fields {
        println!("{}\t{}", f.id, f.title);
        for line in f.description.lines() {
            println!("\t{line}");
        }
    }
    Ok(())
}

fn cmd_fill(
    tpl: &Template,
    values: &HashMap<String, String>,
    out: Option<&Path>,
    policy: engine::FillPolicy,
) -> Result<()> {
    info!("'{}': {} field(s), {} value(s)", tpl.name, tpl.fields().len(), values.len());

    let rendered = engine::fill_checked(&tpl.content, values, policy)
        .with_context(|| format!("fill '{}'", tpl.name))?;
    render::write_output(out, &rendered)
}
