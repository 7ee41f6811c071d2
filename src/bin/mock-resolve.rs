//! Offline resolution check for a mock tree.
//!
//! Prints which file a request would be answered from, without starting a
//! server.

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use api_mocker::routing::path::{display_path, normalize};
use api_mocker::routing::{resolve, MethodFiles, RouteIndex, TargetKind};

#[derive(Parser)]
#[command(name = "mock-resolve")]
#[command(about = "Show which mock file answers a request", long_about = None)]
struct Cli {
    /// Mock directory
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// URL prefix the directory is mounted under
    #[arg(short, long)]
    base_url: Option<String>,

    /// Data file extension
    #[arg(short = 't', long = "type", default_value = "json")]
    ext: String,

    /// HTTP method
    method: String,

    /// Request path, query string allowed
    path: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(segments) = normalize(&cli.path, cli.base_url.as_deref()) else {
        println!("{}", json!({ "resolved": false, "reason": "outside base URL" }));
        return Ok(());
    };

    let index = RouteIndex::scan(&cli.dir);
    let files = MethodFiles::new(&cli.method, Some(cli.ext.as_str()));

    let report = match resolve(&index, &segments, &files) {
        Some(target) => json!({
            "resolved": true,
            "file": target.file_path,
            "kind": match target.kind {
                TargetKind::Data => "data",
                TargetKind::Executable => "handler",
            },
            "params": target.params.to_json(),
        }),
        None => json!({
            "resolved": false,
            "path": display_path(&segments),
            "probed": files.names().collect::<Vec<_>>(),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
