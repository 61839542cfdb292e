use anyhow::{Context, Result};
use clap::Parser;
use coco_multilabel::{
    config::Config,
    dataset::{CocoMultiLabel, RandomAccessDataset, Sample},
    index::CocoIndex,
};
use label::{LabelEncoder, VOCABULARY};
use prettytable::{cell, row, Table};
use std::{env, path::PathBuf};
use tch::Kind;
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
/// Inspect COCO multi-label indexes and samples
enum Opts {
    /// Print statistics of the configured index
    Info {
        #[clap(long, default_value = "dataset.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Load a sample and print its tensors
    Show {
        #[clap(long, default_value = "dataset.json5")]
        /// configuration file
        config_file: PathBuf,
        /// record index
        index: usize,
    },
    /// Convert a token sequence to category names
    Decode {
        /// token indices
        tokens: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Opts::parse() {
        Opts::Info { config_file } => {
            let config = open_config(config_file)?;
            print_info(&config).await?;
        }
        Opts::Show { config_file, index } => {
            let config = open_config(config_file)?;
            show_sample(&config, index).await?;
        }
        Opts::Decode { tokens } => {
            let names = label::decode(&tokens)?;
            println!("{}", names.join(", "));
        }
    }

    Ok(())
}

fn open_config(config_file: PathBuf) -> Result<Config> {
    Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))
}

async fn print_info(config: &Config) -> Result<()> {
    let index_file = config.dataset.index_file();
    let index = CocoIndex::open(&index_file).await?;
    let stats = index.stats();
    let max_length = config.dataset.max_length();
    let encoder = LabelEncoder::new(max_length, config.dataset.sort_by_freq);

    info!("loaded index file '{}'", index_file.display());

    if stats.max_categories > encoder.max_labels() {
        warn!(
            "images with up to {} labels exceed max_length {}, their sequences are not padded",
            stats.max_categories, max_length
        );
    }

    // print summary
    {
        let mut table = Table::new();
        table.add_row(row!["split", format!("{:?}", config.dataset.split)]);
        table.add_row(row!["records", stats.num_records]);
        table.add_row(row!["max labels per image", stats.max_categories]);
        table.add_row(row!["max_length", max_length]);
        table.add_row(row!["required max_length", stats.required_max_length()]);
        table.printstd();
    }

    // print per-category statistics
    {
        let mut table = Table::new();
        table.add_row(row!["index", "category", "frequency weight", "count"]);

        stats
            .category_counts
            .iter()
            .enumerate()
            .try_for_each(|(class_index, (name, count))| -> Result<_> {
                let weight = VOCABULARY.frequency_weight(name)?;
                table.add_row(row![class_index, name, weight, count]);
                Ok(())
            })?;

        table.printstd();
    }

    Ok(())
}

async fn show_sample(config: &Config, index: usize) -> Result<()> {
    let dataset = CocoMultiLabel::load(config).await?;
    let path = dataset
        .image_path(index)
        .with_context(|| format!("invalid index {}", index))?;
    let sample = dataset.nth(index).await?;

    let present: Vec<_> = {
        let multi_hot: Vec<f32> = sample.multi_hot().to_kind(Kind::Float).into();
        multi_hot
            .into_iter()
            .enumerate()
            .filter(|&(_, value)| value > 0.5)
            .map(|(class_index, _)| VOCABULARY.classes()[class_index].as_str())
            .collect()
    };

    let mut table = Table::new();
    table.add_row(row!["path", path.display()]);
    table.add_row(row!["image", format!("{:?}", sample.image().size())]);
    table.add_row(row!["categories", present.join(", ")]);

    if let Sample::Sequential {
        labels,
        label_number,
        ..
    } = &sample
    {
        let tokens: Vec<i64> = labels.shallow_clone().into();
        let names: Vec<_> = tokens
            .iter()
            .map(|&token| VOCABULARY.token_name(token))
            .collect::<Result<_, _>>()?;

        table.add_row(row!["labels", format!("{:?}", tokens)]);
        table.add_row(row!["tokens", names.join(" ")]);
        table.add_row(row!["label_number", label_number]);
    }

    table.printstd();

    Ok(())
}
