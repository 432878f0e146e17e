use annotator::cli::{Cli, Commands};
use clap::Parser;
use tracing::Level;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Annotate {
            input,
            output,
            summary,
            categories,
            context_size,
            max_image_mb,
            no_context,
            provider,
        } => annotator::cli::annotate::run(annotator::cli::annotate::AnnotateArgs {
            input,
            output,
            summary,
            categories,
            context_size,
            max_image_mb,
            no_context,
            provider,
        }),
        Commands::Probe { image, provider } => annotator::cli::probe::run(image, provider),
        Commands::Schema => annotator::cli::schema::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
