// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: One positional deployment request plus tuning flags.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relevo")]
#[command(about = "Zero-downtime canary deployment with automatic rollback")]
#[command(version)]
pub struct Cli {
    /// Name for the new service instance
    pub new_service_name: String,

    /// Image reference the new instance runs
    pub new_image_ref: String,

    /// Workspace directory of the old service
    pub old_workspace: PathBuf,

    /// Name of the old (currently live) instance
    pub old_instance_name: String,

    /// Port the service binds inside the instance
    pub binding_port: u16,

    /// Settings file (YAML); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the route document path
    #[arg(long)]
    pub routes: Option<PathBuf>,

    /// Override the public entrypoint probed during validation
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Break a held deploy lock
    #[arg(long)]
    pub force: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
