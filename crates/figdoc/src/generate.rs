use std::path::PathBuf;

use colored::Colorize;

use crate::figma::FigmaClient;
use crate::pipeline::{self, validate_link, validate_report, Generated};
use crate::prelude::{eprintln, println, *};
use crate::store::PdfStore;

#[derive(Debug, clap::Args, Clone)]
pub struct GenerateOptions {
    /// Figma file, design or prototype link
    #[clap(env = "FIGMA_LINK")]
    link: String,

    /// JSON report to merge into the fetched design
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Directory to write the PDF into
    #[arg(short, long, env = "FIGDOC_OUTPUT_DIR", default_value = "generated_pdfs")]
    output_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let link = validate_link(Some(options.link.as_str()))?;

    let uploaded = match &options.report {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| f!("Failed to read {}", path.display()))?;
            validate_report(Some(bytes.as_slice()))?
        }
        None => None,
    };

    let client = FigmaClient::new(global.figma_config())
        .map_err(|e| eyre!("Failed to build the Figma client: {e}"))?;
    let store = PdfStore::new(&options.output_dir)
        .with_context(|| f!("Failed to create {}", options.output_dir.display()))?;

    if global.verbose {
        eprintln!("Fetching {link}...");
    }

    let generated = pipeline::generate(&client, &store, &link, uploaded).await?;
    let path = store.dir().join(&generated.filename);

    if options.json {
        let mut value = serde_json::to_value(&generated)?;
        value["path"] = serde_json::Value::String(path.display().to_string());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        display_summary(&generated, &path);
    }

    Ok(())
}

fn display_summary(generated: &Generated, path: &std::path::Path) {
    println!(
        "\n{}\n",
        format!("Generated report for {}", generated.project_name)
            .green()
            .bold()
    );
    println!("{}", summary_table(generated, path));
}

fn summary_table(generated: &Generated, path: &std::path::Path) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "File".bold().cyan(),
        path.display().to_string().bright_white()
    ]);
    table.add_row(prettytable::row![
        "Pages".bold().cyan(),
        generated.pages.to_string()
    ]);
    table.add_row(prettytable::row![
        "Size".bold().cyan(),
        format!("{} bytes", generated.size)
    ]);

    let diagram = if generated.text_only {
        "text only".bright_red().to_string()
    } else if generated.placeholder_diagram {
        "placeholder".bright_yellow().to_string()
    } else {
        "rendered".green().to_string()
    };
    table.add_row(prettytable::row!["Diagram".bold().cyan(), diagram]);
    table.add_row(prettytable::row![
        "Request".bold().cyan(),
        generated.request_id.bright_black().to_string()
    ]);

    table
}
