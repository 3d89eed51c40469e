use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use skillbridge_core::bootstrap::{
    build_loaded_runtime, create_provider, load_config, resolve_config_path,
};
use skillbridge_core::{Config, InvocationRequest, SkillRuntime};
use skillbridge_llm::CompletionProvider;
use skillbridge_skills::{ScaffoldOptions, create_skill_template, validate_skill};

/// Resolve requests to file-based skills and dispatch them to an LLM provider.
#[derive(Parser)]
#[command(name = "skillbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List loaded skills
    List,

    /// Show one skill's metadata and resources
    Show {
        name: String,
    },

    /// Check a skill directory and report problems
    Validate {
        dir: PathBuf,
    },

    /// Scaffold a new skill directory
    New {
        name: String,

        #[arg(short, long)]
        description: String,

        /// Parent directory for the new skill
        #[arg(short, long, default_value = "skills")]
        output: PathBuf,

        #[arg(long)]
        scripts: bool,

        #[arg(long)]
        references: bool,

        #[arg(long)]
        assets: bool,
    },

    /// Send a query through the skill runtime
    Ask {
        query: String,

        /// Use this skill instead of matching one
        #[arg(short, long)]
        skill: Option<String>,

        /// Do not auto-match a skill
        #[arg(long)]
        no_auto_match: bool,

        /// Include reference documents in the prompt
        #[arg(long)]
        references: bool,

        /// Offer skills to the model as tools
        #[arg(long, conflicts_with = "skill")]
        tools: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Command::List => {
            let runtime = load_runtime(&config_path)?.1;
            list(&runtime);
        }
        Command::Show { name } => {
            let runtime = load_runtime(&config_path)?.1;
            show(&runtime, &name)?;
        }
        Command::Validate { dir } => {
            let report = validate_skill(&dir);
            print!("{report}");
            if !report.is_valid() {
                bail!("{} is not a valid skill", dir.display());
            }
            println!("{} is valid", dir.display());
        }
        Command::New {
            name,
            description,
            output,
            scripts,
            references,
            assets,
        } => {
            let options = ScaffoldOptions {
                include_scripts: scripts,
                include_references: references,
                include_assets: assets,
                ..ScaffoldOptions::default()
            };
            let dir = create_skill_template(&output, &name, &description, &options)
                .context("failed to create skill template")?;
            println!("created {}", dir.display());
        }
        Command::Ask {
            query,
            skill,
            no_auto_match,
            references,
            tools,
        } => {
            let (config, runtime) = load_runtime(&config_path)?;
            let provider = create_provider(&config)?;
            tracing::info!(
                provider = provider.name(),
                model = provider.model(),
                skills = runtime.registry().len(),
                "dispatching query"
            );

            let answer = if tools {
                runtime.execute_with_tools(&query, &[], &[], &provider)?
            } else {
                let mut request = InvocationRequest::new(query)
                    .with_auto_match(!no_auto_match)
                    .with_references(references || config.skills.include_references);
                request.skill_name = skill;
                runtime.execute(&request, &provider)?
            };
            println!("{answer}");
        }
    }

    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_runtime(config_path: &Path) -> anyhow::Result<(Config, SkillRuntime)> {
    let config = load_config(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let runtime = build_loaded_runtime(&config);
    Ok((config, runtime))
}

fn list(runtime: &SkillRuntime) {
    let skills = runtime.list_skills();
    if skills.is_empty() {
        println!("no skills loaded");
        return;
    }
    for meta in skills {
        println!("{:<24} {}", meta.name, meta.description);
    }
}

fn show(runtime: &SkillRuntime, name: &str) -> anyhow::Result<()> {
    let Some(skill) = runtime.get_skill(name) else {
        bail!("skill '{name}' is not loaded");
    };
    let meta = skill.metadata();

    println!("name:        {}", meta.name);
    println!("description: {}", meta.description);
    println!("path:        {}", skill.path().display());
    for (label, value) in [
        ("license:", &meta.license),
        ("version:", &meta.version),
        ("author:", &meta.author),
        ("compat:", &meta.compatibility),
    ] {
        if let Some(v) = value {
            println!("{label:<12} {v}");
        }
    }
    if !meta.allowed_tools.is_empty() {
        println!("tools:       {}", meta.allowed_tools.join(", "));
    }
    for key in meta.extensions.keys() {
        println!("extension:   {key}");
    }
    for (file, script) in skill.scripts() {
        println!("script:      {file} ({})", script.language);
    }
    for file in skill.references().keys() {
        println!("reference:   {file}");
    }
    for asset in skill.assets() {
        println!("asset:       {}", asset.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_ask_flags() {
        let cli = Cli::parse_from([
            "skillbridge",
            "--config",
            "my.toml",
            "ask",
            "fill the form",
            "--skill",
            "pdf",
            "--references",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        let Command::Ask {
            query,
            skill,
            references,
            tools,
            no_auto_match,
        } = cli.command
        else {
            panic!("expected ask");
        };
        assert_eq!(query, "fill the form");
        assert_eq!(skill.as_deref(), Some("pdf"));
        assert!(references);
        assert!(!tools);
        assert!(!no_auto_match);
    }

    #[test]
    fn tools_conflicts_with_skill() {
        let result = Cli::try_parse_from(["skillbridge", "ask", "q", "--tools", "--skill", "pdf"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_new_defaults() {
        let cli = Cli::parse_from(["skillbridge", "new", "my-skill", "-d", "Does things"]);
        let Command::New { output, scripts, .. } = cli.command else {
            panic!("expected new");
        };
        assert_eq!(output, PathBuf::from("skills"));
        assert!(!scripts);
    }
}
