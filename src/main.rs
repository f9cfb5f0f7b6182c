use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use rle_engine::{deflate_file, inflate_file};

#[derive(Parser)]
#[command(name = "rle")]
#[command(about = "Lossless run-length codec for arbitrary files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deflate a file into a .rle container
    #[command(visible_alias = "d")]
    Deflate {
        /// File to deflate
        input: PathBuf,
        /// Output path (defaults to <input>.rle)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inflate a .rle container back into the original file
    #[command(visible_alias = "i")]
    Inflate {
        /// Container to inflate
        input: PathBuf,
        /// Output path (defaults to <input> without its .rle suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn deflated_name(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".rle");
    PathBuf::from(name)
}

fn inflated_name(input: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if input.extension().and_then(|e| e.to_str()) != Some("rle") {
        return Err(format!(
            "{} does not end in .rle; use --output to name the result",
            input.display()
        )
        .into());
    }
    Ok(input.with_extension(""))
}

fn deflate(input: &Path, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| deflated_name(input));

    if let Err(e) = deflate_file(input, &output) {
        // A failed deflate leaves the output contents undefined.
        let _ = fs::remove_file(&output);
        return Err(e.into());
    }

    let original = fs::metadata(input)?.len();
    let deflated = fs::metadata(&output)?.len();
    let percentage = (deflated * 10_000 / original) as f64 / 100.0;
    println!(
        "Deflated: {} -> {} bytes ({:.2}% of original)",
        original, deflated, percentage
    );
    println!("Saved to: {}", output.display());
    Ok(())
}

fn inflate(input: &Path, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let output = match output {
        Some(path) => path,
        None => inflated_name(input)?,
    };

    if let Err(e) = inflate_file(input, &output) {
        let _ = fs::remove_file(&output);
        return Err(e.into());
    }

    let restored = fs::metadata(&output)?.len();
    println!("Inflated: {} bytes", restored);
    println!("Saved to: {}", output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Deflate { input, output } => deflate(&input, output),
        Commands::Inflate { input, output } => inflate(&input, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
