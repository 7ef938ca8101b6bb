use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use photo_gallery::authoring;

#[derive(Parser, Debug)]
#[command(name = "gallery-admin", about = "Prepare a photo gallery store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write manifest.json into every collection folder
    Manifest {
        /// Store directory holding one folder per collection
        #[arg(default_value = "public/images")]
        dir: PathBuf,
    },
    /// Regenerate galleries.json from the collection folders
    Catalog {
        #[arg(default_value = "public/images")]
        dir: PathBuf,
    },
    /// Add an access code and download link for a collection
    Secret {
        /// secrets.json to update (created if missing)
        file: PathBuf,
        /// Collection folder name
        name: String,
        password: String,
        /// Full-resolution download link (http, https, ftp or ftps)
        link: String,
        /// Replace an existing entry
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    photo_gallery::logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Manifest { dir } => authoring::write_manifests(&dir).map(|written| {
            let images: usize = written.iter().map(|(_, count)| count).sum();
            println!(
                "✅ {} manifests written ({} images)",
                written.len(),
                images
            );
        }),
        Command::Catalog { dir } => authoring::write_catalog(&dir).map(|catalog| {
            for gallery in &catalog.galleries {
                println!("  {} -> {} ({})", gallery.name, gallery.title, gallery.cover_photo);
            }
            println!("✅ {} collections in catalog", catalog.galleries.len());
        }),
        Command::Secret {
            file,
            name,
            password,
            link,
            force,
        } => authoring::set_secret(&file, &name, &password, &link, force)
            .map(|()| println!("✅ Secret stored for {}", name)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
