use anyhow::Result;
use approx::assert_abs_diff_eq;
use coco_multilabel::{
    config::{Config, Mode, Split},
    dataset::{CocoMultiLabel, GenericDataset, RandomAccessDataset, Sample, StreamingDataset},
};
use futures::stream::StreamExt as _;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tch::{IndexOp, Kind};

const END: i64 = 80;
const START: i64 = 81;
const PAD: i64 = 82;

/// A temporary image corpus with `train2014` and `val2014` directories.
struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new() -> Result<Self> {
        let dir = env::temp_dir().join(format!(
            "coco-multilabel-test-{:016x}",
            rand::random::<u64>()
        ));
        fs::create_dir_all(dir.join("train2014"))?;
        fs::create_dir_all(dir.join("val2014"))?;

        RgbImage::from_pixel(40, 30, Rgb([255, 0, 0])).save(dir.join("val2014/red.png"))?;
        GrayImage::from_pixel(24, 36, Luma([255])).save(dir.join("val2014/gray.png"))?;
        fs::write(dir.join("val2014/broken.jpg"), b"not an image")?;
        RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]))
            .save(dir.join("train2014/gradient.jpg"))?;

        fs::write(
            dir.join("coco_val.json"),
            r#"{
                "red.png": { "categories": ["dog", "person"] },
                "gray.png": { "categories": [], "width": 24 },
                "broken.jpg": { "categories": ["cat"] }
            }"#,
        )?;
        fs::write(
            dir.join("coco_train.json"),
            r#"{
                "gradient.jpg": { "categories": ["hair drier", "dog", "person"] }
            }"#,
        )?;

        Ok(Self { dir })
    }

    fn config(&self, split: Split, mode: Mode, extra: &str) -> Result<Config> {
        let index_file = self.dir.join(split.default_index_file());
        let text = format!(
            r#"{{
                dataset: {{
                    split: "{split}",
                    mode: "{mode}",
                    image_dir: "{image_dir}",
                    index_file: "{index_file}",
                    {extra}
                }},
                preprocessor: {{ image_size: 32 }},
            }}"#,
            split = match split {
                Split::Train => "train",
                Split::Val => "val",
            },
            mode = match mode {
                Mode::Classification => "classification",
                Mode::Sequential => "sequential",
            },
            image_dir = self.dir.display(),
            index_file = index_file.display(),
            extra = extra,
        );
        let path = self.dir.join(format!("config-{}.json5", rand::random::<u32>()));
        fs::write(&path, text)?;
        Config::open(&path)
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

#[tokio::test]
async fn classification_sample() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Val, Mode::Classification, "")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    assert_eq!(dataset.num_records(), 3);
    assert_eq!(dataset.input_channels(), 3);
    assert_eq!(dataset.classes().len(), 80);
    assert_eq!(
        dataset.image_path(0),
        Some(fixture.path().join("val2014").join("red.png"))
    );

    let sample = dataset.nth(0).await?;
    assert!(matches!(sample, Sample::Classification { .. }));
    assert!(sample.labels().is_none());
    assert!(sample.label_number().is_none());

    let image = sample.image();
    assert_eq!(image.size(), vec![3, 32, 32]);
    assert_eq!(image.kind(), Kind::Float);
    assert_abs_diff_eq!(
        f64::from(image.i((0, 10, 10))),
        (1.0 - 0.485) / 0.229,
        epsilon = 1e-4
    );
    assert_abs_diff_eq!(
        f64::from(image.i((1, 10, 10))),
        -0.456 / 0.224,
        epsilon = 1e-4
    );

    let multi_hot = sample.multi_hot();
    assert_eq!(multi_hot.size(), vec![80]);
    assert_eq!(multi_hot.kind(), Kind::Float);
    assert_eq!(f64::from(multi_hot.sum(Kind::Float)), 2.0);
    assert_eq!(f64::from(multi_hot.i(28)), 1.0);
    assert_eq!(f64::from(multi_hot.i(49)), 1.0);
    Ok(())
}

#[tokio::test]
async fn val_split_is_deterministic() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Val, Mode::Classification, "")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    let lhs = dataset.nth(0).await?;
    let rhs = dataset.nth(0).await?;
    assert!(lhs.image().equal(rhs.image()));
    Ok(())
}

#[tokio::test]
async fn grayscale_image_is_converted() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Val, Mode::Sequential, "")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    let sample = dataset.nth(1).await?;
    let image = sample.image();
    assert_eq!(image.size(), vec![3, 32, 32]);
    // white pixels on every channel
    assert_abs_diff_eq!(
        f64::from(image.i((2, 0, 0))),
        (1.0 - 0.406) / 0.225,
        epsilon = 1e-4
    );

    // no labels: <start>, <end> and padding up to the val maximum length 17
    let labels: Vec<i64> = sample.labels().unwrap().shallow_clone().into();
    let mut expect = vec![START, END];
    expect.extend(std::iter::repeat(PAD).take(16));
    assert_eq!(labels, expect);
    assert_eq!(sample.label_number(), Some(2));
    Ok(())
}

#[tokio::test]
async fn sequential_sample_sorted_by_frequency() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Train, Mode::Sequential, "sort_by_freq: true,")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    match dataset.nth(0).await? {
        Sample::Sequential {
            image,
            labels,
            label_number,
            multi_hot,
        } => {
            assert_eq!(image.size(), vec![3, 32, 32]);
            assert_eq!(labels.kind(), Kind::Int64);
            assert_eq!(labels.size(), vec![21]);
            assert_eq!(label_number, 5);

            let labels: Vec<i64> = labels.into();
            assert_eq!(&labels[..5], &[START, 49, 28, 35, END]);
            assert!(labels[5..].iter().all(|&token| token == PAD));
            assert_eq!(f64::from(multi_hot.sum(Kind::Float)), 3.0);
        }
        other => panic!("unexpected sample {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn max_length_override() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Val, Mode::Sequential, "max_length: 4,")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    let labels = dataset.labels(0)?;
    assert_eq!(labels.sequence, vec![START, 28, 49, END, PAD]);
    assert_eq!(labels.label_number, 4);
    Ok(())
}

#[tokio::test]
async fn invalid_records() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Val, Mode::Classification, "")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    assert!(dataset.nth(3).await.is_err());

    let err = dataset.nth(2).await.unwrap_err();
    let message = format!("{:#}", err);
    assert_eq!(message.matches("broken.jpg").count(), 1, "{}", message);
    Ok(())
}

#[tokio::test]
async fn stream_reports_failures() -> Result<()> {
    let fixture = Fixture::new()?;
    let config = fixture.config(Split::Val, Mode::Classification, "")?;
    let dataset = CocoMultiLabel::load(&config).await?;

    let results: Vec<_> = dataset.stream()?.collect().await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
    Ok(())
}

#[tokio::test]
async fn stream_skips_failures() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut config = fixture.config(Split::Val, Mode::Sequential, "")?;
    config.stream.skip_failed = true;
    config.stream.shuffle = true;
    config.stream.seed = Some(1);
    let dataset = CocoMultiLabel::load(&config).await?;

    let samples: Vec<_> = dataset.stream()?.collect().await;
    assert_eq!(samples.len(), 2);

    let mut label_numbers: Vec<_> = samples
        .into_iter()
        .map(|result| -> Result<_> { Ok(result?.label_number()) })
        .collect::<Result<_>>()?;
    label_numbers.sort();
    assert_eq!(label_numbers, vec![Some(2), Some(4)]);
    Ok(())
}

#[tokio::test]
async fn reject_unknown_category() -> Result<()> {
    let fixture = Fixture::new()?;
    fs::write(
        fixture.path().join("coco_val.json"),
        r#"{ "red.png": { "categories": ["dog", "griffin"] } }"#,
    )?;
    let config = fixture.config(Split::Val, Mode::Classification, "")?;

    let err = CocoMultiLabel::load(&config).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("red.png"));
    assert!(message.contains("griffin"));
    Ok(())
}
