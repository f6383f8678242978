//! The `specimen classify` command: classify image files without the web
//! front door, writing one record per image.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use specimen_core::pipeline::discover;
use specimen_core::{
    ClassificationRecord, Config, ImageProcessor, OutputFormat as CoreFormat, RecordWriter,
};

use super::theme;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image file or directory to classify
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// A single pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<OutputFormat> for CoreFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreFormat::Json,
            OutputFormat::Jsonl => CoreFormat::JsonLines,
        }
    }
}

pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let files = discover(&args.input);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {}", args.input.display());
    }
    tracing::info!("Found {} image(s) to classify", files.len());

    let classifier = {
        let config = config.clone();
        Arc::new(tokio::task::spawn_blocking(move || super::load_classifier(&config)).await??)
    };
    let processor = ImageProcessor::new(&config, classifier);

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer: RecordWriter<_, ClassificationRecord> =
        RecordWriter::new(sink, args.format.into(), true);

    let pb = (args.output.is_some() && files.len() > 1)
        .then(|| super::progress_bar(files.len() as u64));
    let mut failed = 0usize;

    for file in &files {
        let classification = processor.classify_path(&file.path).await;
        if !classification.is_identified() {
            failed += 1;
        }

        writer.push(ClassificationRecord::new(file.path.clone(), &classification))?;
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    let count = writer.count();
    let mut out = writer.finish()?;
    out.flush()?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    eprintln!(
        "{} classified, {} failed {}",
        theme::highlight(count - failed),
        failed,
        theme::dim(format!("({} total)", count))
    );
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        args: ClassifyArgs,
    }

    #[test]
    fn test_only_the_best_label_is_offered() {
        let parsed = Harness::try_parse_from(["classify", "photos", "--format", "jsonl"]).unwrap();
        assert!(matches!(parsed.args.format, OutputFormat::Jsonl));
        assert!(Harness::try_parse_from(["classify", "photos", "--top", "3"]).is_err());
    }
}
