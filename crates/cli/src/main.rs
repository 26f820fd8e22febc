use clap::{ArgAction, Parser, Subcommand};
use formtree_core::form::{FieldValue, Form, FormConfig, FormError};
use formtree_core::Document;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formtree", about = "Fill HTML forms without a browser")]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a form and print the resulting HTML
    Fill {
        /// The HTML file to read (use - for stdin)
        file: String,

        /// Which form of the page to fill, in document order
        #[arg(long, default_value_t = 0)]
        form: usize,

        /// Set a field; repeat a name to pass several values
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Set a field from a JSON value (booleans, numbers, lists)
        #[arg(long = "set-json", value_name = "NAME=JSON")]
        set_json: Vec<String>,

        /// Create an input for names that match no control
        #[arg(long)]
        force: bool,

        /// Keep already checked boxes when checking new ones
        #[arg(long)]
        keep_checked: bool,

        /// Name of the submit control to activate
        #[arg(long)]
        submit: Option<String>,

        /// Print the whole document instead of the form only
        #[arg(long)]
        document: bool,
    },
    /// List the controls of a form
    Inspect {
        /// The HTML file to read (use - for stdin)
        file: String,

        /// Which form of the page to inspect, in document order
        #[arg(long, default_value_t = 0)]
        form: usize,

        /// Output as JSON instead of one tag per line
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_html(file: &str) -> Result<String, String> {
    if file == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).map_err(|e| format!("Failed to read {}: {}", file, e))
    }
}

fn split_assignment(arg: &str) -> Result<(&str, &str), String> {
    arg.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("Expected NAME=VALUE, got {:?}", arg))
}

/// Group `--set` and `--set-json` arguments by name, keeping first-seen order.
/// A name given several times with `--set` becomes a list.
fn collect_values(set: &[String], set_json: &[String]) -> Result<Vec<(String, FieldValue)>, String> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for arg in set {
        let (name, value) = split_assignment(arg)?;
        match grouped.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value.to_string()),
            None => grouped.push((name.to_string(), vec![value.to_string()])),
        }
    }

    let mut values: Vec<(String, FieldValue)> = grouped
        .into_iter()
        .map(|(name, mut items)| {
            let value = if items.len() == 1 {
                FieldValue::Text(items.remove(0))
            } else {
                FieldValue::from(items)
            };
            (name, value)
        })
        .collect();

    for arg in set_json {
        let (name, raw) = split_assignment(arg)?;
        let json: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| format!("Invalid JSON for {}: {}", name, e))?;
        let value = FieldValue::from_json(&json)
            .ok_or_else(|| format!("Unsupported JSON value for {}: {}", name, raw))?;
        values.push((name.to_string(), value));
    }

    Ok(values)
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn open_form(doc: &Document, index: usize) -> Form<'_> {
    Form::find(doc, index).unwrap_or_else(|e| fail(e))
}

fn fill(
    doc: &Document,
    index: usize,
    values: Vec<(String, FieldValue)>,
    force: bool,
    keep_checked: bool,
    submit: Option<String>,
) -> Result<Form<'_>, FormError> {
    let mut form = Form::find(doc, index)?.with_config(FormConfig {
        uncheck_other_boxes: !keep_checked,
    });
    for (name, value) in values {
        let kind = form.set(&name, value, force)?;
        tracing::info!(field = %name, kind = kind.as_str(), "filled");
    }
    if let Some(submit) = submit {
        form.choose_submit(submit)?;
    }
    Ok(form)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fill {
            file,
            form,
            set,
            set_json,
            force,
            keep_checked,
            submit,
            document,
        } => {
            let html = read_html(&file).unwrap_or_else(|e| fail(e));
            let values = collect_values(&set, &set_json).unwrap_or_else(|e| fail(e));
            let doc = formtree_core::parse(&html);

            match fill(&doc, form, values, force, keep_checked, submit) {
                Ok(_) if document => println!("{}", doc.to_html()),
                Ok(filled) => println!("{}", filled.to_html()),
                Err(e) => fail(e),
            }
        }
        Commands::Inspect { file, form, json } => {
            let html = read_html(&file).unwrap_or_else(|e| fail(e));
            let doc = formtree_core::parse(&html);
            let form = open_form(&doc, form);

            if json {
                match serde_json::to_string_pretty(&form.fields()) {
                    Ok(out) => println!("{}", out),
                    Err(e) => fail(e),
                }
            } else {
                println!("{}", form.summary());
            }
        }
    }
}
