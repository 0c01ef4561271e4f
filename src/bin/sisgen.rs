// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use sisgen::{
    deploy::{apply_directives, Platform, ResolveOptions},
    path::HostFileSystem,
    project::{PackageGenerator, Project},
    uid::UidCache,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "sisgen [options] <sisgen-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Log debug output by default.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Pkg(opts) => run_pkg(opts),
            Command::Deploy(opts) => run_deploy(opts),
            Command::Uid(opts) => run_uid(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate package manifests, resource files, and plugin stubs.
    #[command(override_usage = "sisgen pkg [options] <project>")]
    Pkg(PkgOptions),

    /// Resolve deployment list of project for a platform.
    #[command(override_usage = "sisgen deploy [options] --platform <platform> --build <build> <project>")]
    Deploy(DeployOptions),

    /// Print stable hash of names.
    #[command(override_usage = "sisgen uid [options] <name>...")]
    Uid(UidOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PkgOptions {
    /// Path to project definition file.
    #[arg(required = true, value_name = "project")]
    pub project: PathBuf,

    /// Directory to write generated files into.
    #[arg(short, long, default_value = ".", value_name = "dir")]
    pub out_dir: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeployOptions {
    /// Path to project definition file.
    #[arg(required = true, value_name = "project")]
    pub project: PathBuf,

    /// Directory to write plugin stubs into.
    #[arg(short, long, default_value = ".", value_name = "dir")]
    pub out_dir: PathBuf,

    /// Target platform, i.e., "rom", "emulator", or a hardware platform.
    #[arg(short, long, value_name = "platform")]
    pub platform: String,

    /// Build variant, e.g., "udeb" or "urel".
    #[arg(short, long, value_name = "build")]
    pub build: String,

    /// Deploy compiled binaries too.
    #[arg(long)]
    pub binaries: bool,

    /// Root that relative deployment paths are anchored to.
    #[arg(short, long, value_name = "path")]
    pub target_path: Option<String>,

    /// Copy resolved files to their destinations.
    #[arg(long)]
    pub apply: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct UidOptions {
    /// Names to hash.
    #[arg(required = true, value_name = "name")]
    pub names: Vec<String>,

    /// Print test UIDs instead of plain hashes.
    #[arg(short, long)]
    pub test: bool,
}

fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer().compact();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = cli.run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run_pkg(opts: PkgOptions) -> Result<()> {
    let fs = HostFileSystem::new();
    let mut cache = UidCache::new();
    let project = Project::load(&fs, &opts.project, &mut cache)?;

    let artifacts = PackageGenerator::new(&fs, &opts.out_dir).generate(&project);
    for file in artifacts.files() {
        println!("{}", file.display());
    }

    Ok(())
}

fn run_deploy(opts: DeployOptions) -> Result<()> {
    let fs = HostFileSystem::new();
    let mut cache = UidCache::new();
    let project = Project::load(&fs, &opts.project, &mut cache)?;

    let platform: Platform = opts.platform.parse()?;
    let resolve_opts = ResolveOptions {
        target_path: opts
            .target_path
            .unwrap_or_else(|| project.default_target_path(&platform)),
        deploy_binaries: opts.binaries,
        full_system_build: project.full_system_build,
        platform,
        build: opts.build,
    };

    let resolution = project.resolve(&fs, &opts.out_dir, &resolve_opts);
    for directive in &resolution.directives {
        println!("{directive}");
    }

    if opts.apply {
        let copied = apply_directives(&fs, &resolution.directives);
        info!("copied {copied} of {} files", resolution.directives.len());
    }

    Ok(())
}

fn run_uid(opts: UidOptions) -> Result<()> {
    let mut cache = UidCache::new();
    for name in opts.names {
        let hash = if opts.test {
            cache.compute_test_hash(&name)
        } else {
            cache.compute_hash(&name)
        };
        println!("{hash}\t{name}");
    }

    Ok(())
}
