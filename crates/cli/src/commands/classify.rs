//! `tileharvest classify`

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use tileharvest_core::{Config, ResolutionTier, TileClassifier};

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Request URLs to classify.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Print one JSON object per URL.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Classification<'a> {
    url: &'a str,
    tile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<ResolutionTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
}

fn classify<'a>(classifier: &TileClassifier, url: &'a str) -> Classification<'a> {
    match classifier.record(url) {
        Some(record) => Classification {
            url,
            tile: true,
            tier: Some(record.tier),
            file_name: Some(record.file_name),
        },
        None => Classification {
            url,
            tile: false,
            tier: None,
            file_name: None,
        },
    }
}

pub fn run(args: ClassifyArgs, config: &Config) -> Result<i32> {
    let classifier = TileClassifier::new(config.classifier.clone());

    for url in &args.urls {
        let result = classify(&classifier, url);
        if args.json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            match (&result.tier, &result.file_name) {
                (Some(tier), Some(file_name)) => println!("{tier}\t{file_name}\t{url}"),
                _ => println!("-\t-\t{url}"),
            }
        }
    }
    Ok(0)
}
