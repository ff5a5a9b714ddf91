mod config;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};

use slowscan_core::config::StreamingOptions;
use slowscan_core::encoder::{encode, EncoderOptions};
use slowscan_core::events::SstvEvent;
use slowscan_core::streaming::StreamingDecoder;
use slowscan_core::{modes, Mode};

use config::CliConfig;
use logging::LogFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "SSTV encoder/decoder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Optional TOML file overriding decode options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format for the per-run signal log
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode an image into an SSTV waveform.
    Encode {
        image: PathBuf,
        out_wav: PathBuf,

        /// Mode name, e.g. "martin-m1", "scottie-s1", "robot-36", "pd-90"
        #[arg(long, default_value = "martin-m1")]
        mode: String,

        #[arg(long, default_value_t = 48_000.0)]
        sample_rate: f64,

        /// Prepend the Martin/Scottie style calibration header
        #[arg(long)]
        calibration_header: bool,

        /// Prepend a VOX tone sequence before the calibration/VIS header
        #[arg(long)]
        vox: bool,
    },
    /// Decode an SSTV waveform into an image.
    Decode {
        in_wav: PathBuf,
        out_png: PathBuf,

        /// Skip VIS detection and decode directly as this mode.
        #[arg(long)]
        force_mode: Option<String>,
    },
}

fn mode_by_name(name: &str) -> Result<Mode> {
    let normalized = name.replace(['-', '_'], " ");
    modes::all()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(&normalized))
        .ok_or_else(|| eyre!("unknown mode: {name}"))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let overrides = match &cli.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };

    match cli.command {
        Command::Encode {
            image,
            out_wav,
            mode,
            sample_rate,
            calibration_header,
            vox,
        } => run_encode(&image, &out_wav, &mode, sample_rate, calibration_header, vox),
        Command::Decode {
            in_wav,
            out_png,
            force_mode,
        } => run_decode(&in_wav, &out_png, force_mode.as_deref(), overrides, cli.log_format),
    }
}

fn run_encode(
    image_path: &PathBuf,
    out_wav: &PathBuf,
    mode_name: &str,
    sample_rate: f64,
    add_calibration_header: bool,
    add_vox_tones: bool,
) -> Result<()> {
    let mode = mode_by_name(mode_name)?;
    let img = image::open(image_path)
        .wrap_err_with(|| format!("failed to open image: {}", image_path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();

    let options = EncoderOptions {
        mode,
        sample_rate,
        add_calibration_header,
        add_vox_tones,
    };
    let samples = encode(&options, img.as_raw(), width, height).map_err(|e| eyre!("encode failed: {e}"))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(out_wav, spec)
        .wrap_err_with(|| format!("failed to create {}", out_wav.display()))?;
    for sample in &samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    println!(
        "encoded {} ({width}x{height}, {}) -> {}",
        image_path.display(),
        mode.name,
        out_wav.display()
    );
    Ok(())
}

fn run_decode(
    in_wav: &PathBuf,
    out_png: &PathBuf,
    force_mode: Option<&str>,
    overrides: CliConfig,
    log_format: LogFormat,
) -> Result<()> {
    let mut reader = hound::WavReader::open(in_wav).wrap_err_with(|| format!("failed to open {}", in_wav.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    let mono: Vec<f32> = if channels > 1 {
        samples.chunks(channels).map(|frame| frame[0]).collect()
    } else {
        samples
    };

    let mut options = overrides.streaming.apply(StreamingOptions {
        sample_rate: spec.sample_rate as f64,
        ..StreamingOptions::default()
    });
    if let Some(name) = force_mode {
        options.force_mode = Some(mode_by_name(name)?.id);
    }

    let mut decoder = StreamingDecoder::new(options).map_err(|e| eyre!("invalid decode options: {e}"))?;
    decoder.events.set_callback(|event| {
        if let SstvEvent::ModeDetected { mode, .. } = event {
            println!("mode detected: {}", mode.name);
        }
    });

    const CHUNK: usize = 8192;
    let progress = indicatif::ProgressBar::new(mono.len() as u64);
    progress.set_style(
        indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} samples")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
    );
    for chunk in mono.chunks(CHUNK) {
        decoder.process(chunk);
        progress.inc(chunk.len() as u64);
    }
    progress.finish_and_clear();
    let decoded = decoder.flush().ok_or_else(|| eyre!("no SSTV signal detected in {}", in_wav.display()))?;

    let image_buf = image::RgbImage::from_raw(decoded.width, decoded.height, decoded.rgb)
        .ok_or_else(|| eyre!("decoded buffer size does not match its own dimensions"))?;
    image_buf
        .save(out_png)
        .wrap_err_with(|| format!("failed to write {}", out_png.display()))?;

    println!(
        "decoded {} lines of {} from {} -> {}",
        decoded.lines_decoded,
        decoded.mode_name,
        in_wav.display(),
        out_png.display()
    );
    logging::print_log(&decoder.logger, log_format);
    Ok(())
}
