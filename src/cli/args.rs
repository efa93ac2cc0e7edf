//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(name = "beanscope", version)]
#[command(about = "Find bean definitions and injection sites in annotation-driven Java code")]
#[command(styles = clap_cargo_style())]
pub struct Cli {
    /// Path to a settings file (defaults to .beanscope/settings.toml)
    #[arg(short, long, global = true, env = "BS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .beanscope/settings.toml
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Display the effective settings
    Config,

    /// List bean definitions and injection sites of a source file
    Scan {
        /// Java source file
        file: PathBuf,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Go to the bean an injection point receives
    Resolve {
        /// Injected type name
        type_name: String,

        /// File containing the injection point
        #[arg(short, long)]
        file: PathBuf,

        /// Line of the injection point (1-based)
        #[arg(short, long)]
        line: u32,

        /// Required qualifier literal
        #[arg(short, long)]
        qualifier: Option<String>,
    },

    /// List implementations of a type
    Class {
        /// Type name
        type_name: String,

        /// File referencing the type
        #[arg(short, long)]
        file: PathBuf,

        /// Line referencing the type (1-based)
        #[arg(short, long)]
        line: u32,
    },

    /// Find injection points that receive a bean
    Usages {
        /// Produced type of the bean
        type_name: String,

        /// File containing the bean definition
        #[arg(short, long)]
        file: PathBuf,

        /// Line of the bean definition (1-based)
        #[arg(short, long)]
        line: u32,

        /// Qualifier of the bean
        #[arg(short, long)]
        qualifier: Option<String>,

        /// The bean is marked primary
        #[arg(long)]
        primary: bool,
    },
}
