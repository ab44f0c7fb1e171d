//! fileshare CLI Client
//!
//! Command-line front end for a fileshare server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fileshare::{Client, ClientConfig, FileEntry};
use tracing_subscriber::{fmt, EnvFilter};

/// fileshare CLI
#[derive(Parser, Debug)]
#[command(name = "fileshare-cli")]
#[command(about = "CLI for a fileshare server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:1234")]
    server: String,

    /// Local folder uploads come from and downloads go to
    #[arg(short, long, default_value = ".")]
    local_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List files on the server
    Ls,

    /// List files in the local folder
    Local,

    /// Upload a file from the local folder
    Upload {
        /// Name of the file inside the local folder
        name: String,
    },

    /// Download a file from the server
    Download {
        /// Name of the file on the server
        name: String,

        /// Save here instead of the local folder
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .server_addr(&args.server)
        .local_dir(&args.local_dir)
        .build();

    let client = match Client::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Ls => client.list_remote_files().map(print_entries),
        Commands::Local => client.list_local_files().map(print_entries),
        Commands::Upload { name } => client
            .upload(&name)
            .map(|n| println!("uploaded {} ({} bytes)", name, n)),
        Commands::Download { name, output } => match output {
            Some(path) => client.download_to(&name, &path),
            None => client.download(&name),
        }
        .map(|n| println!("downloaded {} ({} bytes)", name, n)),
    };

    if let Err(e) = result {
        eprintln!("error ({:?}): {}", e.kind(), e);
        std::process::exit(1);
    }
}

fn print_entries(mut entries: Vec<FileEntry>) {
    entries.sort();
    for entry in entries {
        println!("{}", entry);
    }
}
