use miette::{IntoDiagnostic, Result, WrapErr};
use quire_editor_core::{
    EditorAction, EditorConfig, EditorEvent, RichTextEditor, execute_action, tabs,
};
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Quire - rich-text editor core tooling", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tab stop list (JSON), e.g. '[{"direction":"left","position":100}]'
    #[arg(long, global = true)]
    tab_stops: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a serialized value to projected HTML
    Render {
        /// Value file, or `-` for stdin
        input: PathBuf,
    },
    /// Print the normalized serialization of a value
    Normalize {
        /// Value file, or `-` for stdin
        input: PathBuf,
    },
    /// Replay a scripted editing session and print the resulting value
    Replay {
        /// JSON array of editor actions
        script: PathBuf,

        /// Initial value file
        #[arg(long)]
        value: Option<PathBuf>,

        /// Print every settled event as it is drained
        #[arg(long)]
        events: bool,
    },
}

fn main() -> Result<()> {
    init_miette();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut editor = build_editor(cli.config.as_deref(), cli.tab_stops.as_deref())?;

    match cli.command {
        Commands::Render { input } => {
            editor.set_value(&read_input(&input)?);
            report_diagnostics(&mut editor);
            println!("{}", editor.html());
        }
        Commands::Normalize { input } => {
            editor.set_value(&read_input(&input)?);
            report_diagnostics(&mut editor);
            println!("{}", editor.value());
        }
        Commands::Replay {
            script,
            value,
            events,
        } => {
            if let Some(path) = value {
                editor.set_value(&read_input(&path)?);
                editor.take_events();
            }
            let script = read_input(&script)?;
            let actions: Vec<EditorAction> = serde_json::from_str(&script)
                .into_diagnostic()
                .wrap_err("couldn't parse the action script")?;
            replay(&mut editor, &actions, events)?;
            println!("{}", editor.value());
        }
    }

    Ok(())
}

fn build_editor(config: Option<&Path>, tab_stops: Option<&str>) -> Result<RichTextEditor> {
    let config = match config {
        Some(path) => EditorConfig::from_json(&read_input(path)?)?,
        None => EditorConfig::default(),
    };
    let mut editor = RichTextEditor::new(config)?;
    if let Some(stops) = tab_stops {
        editor.set_tab_stops(tabs::parse_stops(stops)?)?;
        editor.take_events();
    }
    Ok(editor)
}

fn replay(editor: &mut RichTextEditor, actions: &[EditorAction], print_events: bool) -> Result<()> {
    tracing::debug!(target: "quire::cli", steps = actions.len(), "replaying script");
    editor.focus();
    for (step, action) in actions.iter().enumerate() {
        execute_action(editor, action)
            .into_diagnostic()
            .wrap_err_with(|| format!("step {step} ({action:?}) failed"))?;
        report_diagnostics(editor);
        drain_events(editor, print_events);
    }
    editor.blur();
    drain_events(editor, print_events);
    Ok(())
}

fn drain_events(editor: &mut RichTextEditor, print: bool) {
    for event in editor.take_events() {
        if !print {
            continue;
        }
        match event {
            EditorEvent::ValueChanged(value) => eprintln!("value: {value}"),
            EditorEvent::HtmlChanged(html) => eprintln!("html: {html}"),
            EditorEvent::Change { value } => eprintln!("change: {value}"),
            EditorEvent::TabStopsChanged(stops) => eprintln!("tab stops: {stops:?}"),
            other => eprintln!("{other:?}"),
        }
    }
}

fn report_diagnostics(editor: &mut RichTextEditor) {
    for diagnostic in editor.take_diagnostics() {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .into_diagnostic()
            .wrap_err("couldn't read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("couldn't read {}", path.display()))
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
