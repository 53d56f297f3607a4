use anyhow::Result;
use clap::{Parser, Subcommand};
use netscope_app::{GraphSnapshot, ViewerController, ViewerSettings};
use netscope_core::LayoutDirection;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a graph payload and print the render snapshot as JSON
    Layout(LayoutArgs),
}

#[derive(clap::Args, Debug)]
struct LayoutArgs {
    /// Raw graph JSON ({nodes, edges})
    graph: PathBuf,

    /// Flow direction: tb or lr
    #[arg(short, long)]
    direction: Option<LayoutDirection>,

    /// Settings file; defaults to the user config directory
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Omit tensor names from edges
    #[arg(long)]
    no_labels: bool,

    /// Print the category legend to stderr
    #[arg(long)]
    legend: bool,

    /// Print operator counts to stderr
    #[arg(long)]
    summary: bool,

    #[arg(long)]
    pretty: bool,
}

fn settings_for(args: &LayoutArgs) -> Result<ViewerSettings> {
    let mut settings = match &args.settings {
        Some(path) => ViewerSettings::load_from(path)?,
        None => ViewerSettings::load(),
    };
    if let Some(direction) = args.direction {
        settings.layout_direction = direction;
    }
    if args.no_labels {
        settings.show_edge_labels = false;
    }
    Ok(settings)
}

fn legend_lines(snapshot: &GraphSnapshot) -> Vec<String> {
    let mut lines = vec![format!("{} nodes", snapshot.legend.total_nodes)];
    for category in &snapshot.legend.categories {
        lines.push(format!(
            "{:<20} {:>5} {:>5.1}%",
            category.category, category.count, category.percentage
        ));
        for ty in &category.types {
            lines.push(format!("  {} {:<18} {:>5}", ty.icon, ty.op_type, ty.count));
        }
    }
    lines
}

fn run_layout(args: &LayoutArgs) -> Result<String> {
    let controller = ViewerController::new(settings_for(args)?);
    tracing::debug!(path = %args.graph.display(), "loading graph");
    let snapshot = controller.load_file(&args.graph)?;

    if let Some(warning) = snapshot.warning {
        eprintln!("warning: {warning}");
    }
    if args.summary
        && let Some(summary) = controller.summary()
    {
        eprintln!("{} nodes, {} edges", summary.num_nodes, summary.num_edges);
        for (op_type, count) in &summary.op_types {
            eprintln!("  {op_type}: {count}");
        }
    }
    if args.legend {
        for line in legend_lines(&snapshot) {
            eprintln!("{line}");
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&*snapshot)?
    } else {
        serde_json::to_string(&*snapshot)?
    };
    Ok(json)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Layout(args) => {
            let json = run_layout(&args)?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(graph: PathBuf) -> LayoutArgs {
        LayoutArgs {
            graph,
            direction: Some(LayoutDirection::LeftToRight),
            settings: None,
            no_labels: true,
            legend: false,
            summary: false,
            pretty: false,
        }
    }

    #[test]
    fn test_parses_layout_command() {
        let cli = Cli::try_parse_from([
            "netscope-cli",
            "layout",
            "model.json",
            "--direction",
            "lr",
            "--no-labels",
        ])
        .unwrap();
        let Command::Layout(args) = cli.command;
        assert_eq!(args.direction, Some(LayoutDirection::LeftToRight));
        assert!(args.no_labels);
        assert!(Cli::try_parse_from(["netscope-cli", "layout", "m.json", "-d", "up"]).is_err());
    }

    #[test]
    fn test_layout_writes_snapshot_json() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("g.json");
        std::fs::write(
            &graph,
            r#"{"nodes": [{"id": "a", "type": "Conv"}, {"id": "b", "type": "Relu"}],
                "edges": [{"source": "a", "target": "b", "data": {"tensor_name": "t"}}]}"#,
        )
        .unwrap();
        let settings = dir.path().join("settings.json");
        ViewerSettings::default().save_to(&settings).unwrap();

        let mut args = args(graph);
        args.settings = Some(settings);
        let json: serde_json::Value = serde_json::from_str(&run_layout(&args).unwrap()).unwrap();

        assert_eq!(json["direction"], "LeftToRight");
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(json["edges"][0]["id"], "e0");
        assert!(json["edges"][0].get("label").is_none());
        assert_eq!(json["legend"]["total_nodes"], 2);
    }

    #[test]
    fn test_bad_graph_reports_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("g.json");
        std::fs::write(&graph, r#"{"nodes": [], "edges": [{"source": "x", "target": "y"}]}"#)
            .unwrap();
        let settings = dir.path().join("settings.json");
        ViewerSettings::default().save_to(&settings).unwrap();

        let mut args = args(graph);
        args.settings = Some(settings);
        let err = run_layout(&args).unwrap_err();
        assert!(err.to_string().starts_with("failed to load graph"));
    }
}
