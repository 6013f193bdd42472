//! plistkit CLI - Command-line tool for converting and inspecting property lists.
//!
//! This is the main entry point for the plistkit command-line application.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use plistkit::prelude::*;

/// plistkit - Apple property list conversion tool
#[derive(Parser)]
#[command(name = "plistkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a plist between XML and binary, or export it as JSON
    Convert {
        /// Input plist file (XML or binary)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,
    },

    /// Show format, root kind and layout details of a plist
    Info {
        /// Input plist file (XML or binary)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Xml,
    Binary,
    /// One-way export; dates become strings and UIDs `{"CF$UID": n}`
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { input, output, format } => {
            cmd_convert(&input, &output, format)?;
        }
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
    }

    Ok(())
}

fn cmd_convert(input: &PathBuf, output: &PathBuf, format: OutputFormat) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let start = Instant::now();
    let data = fs::read(input).context("Failed to read input file")?;
    let document = Document::from_bytes(&data).context("Failed to parse plist")?;

    println!(
        "Loaded {} plist with {} nodes in {:?}",
        document.format(),
        document.root().count(),
        start.elapsed()
    );

    let bytes = match format {
        OutputFormat::Xml => document
            .to_format(Format::Xml)
            .context("Failed to encode XML plist")?,
        OutputFormat::Binary => document
            .to_format(Format::Binary)
            .context("Failed to encode binary plist")?,
        OutputFormat::Json => {
            serde_json::to_vec_pretty(document.root()).context("Failed to encode JSON")?
        }
    };
    fs::write(output, &bytes).context("Failed to write output file")?;

    println!("Wrote {} bytes", bytes.len());

    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let document = Document::from_bytes(&data).context("Failed to parse plist")?;
    let root = document.root();

    println!("File:   {}", input.display());
    println!("Format: {}", document.format());
    println!("Size:   {} bytes", data.len());
    println!("Root:   {}", root.kind());
    println!("Nodes:  {}", root.count());

    if let Some(dict) = root.as_dictionary() {
        println!("Keys:   {}", dict.len());
    } else if let Some(array) = root.as_array() {
        println!("Items:  {}", array.len());
    }

    if document.is_binary() {
        let plist = BinaryPlist::parse(&data).context("Failed to parse binary plist")?;
        let trailer = plist.trailer();

        println!("\nTrailer:");
        println!("  Objects:         {}", trailer.object_count.get());
        println!("  Root object:     {}", trailer.root_object.get());
        println!("  Offset table at: {:#x}", trailer.offset_table_offset.get());
        println!("  Offset size:     {} bytes", trailer.offset_size);
        println!("  Reference size:  {} bytes", trailer.object_ref_size);
    }

    Ok(())
}
