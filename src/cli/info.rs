use std::path::Path;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;

use super::command::{Cli, InfoArgs, ReportFormat};
use crate::input::InputReader;
use crate::timestamp::time_str;
use ac3::process::StreamStats;
use ac3::process::extract::Extractor;
use ac3::structs::header::{FrameHeader, MAX_FRAME_LEN};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing AC-3 stream: {}", args.input.display());

    let report = analyze_stream(&args.input, args.verify_crc, cli, multi)?;

    match args.format {
        ReportFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
        ReportFormat::Plain => display_report(&report),
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct StreamReport {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<FormatReport>,
    frames: u64,
    format_changes: u64,
    duration: String,
    duration_secs: f64,
    size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    average_kbps: Option<f64>,
    sync: SyncReport,
}

#[derive(Debug, Serialize)]
struct FormatReport {
    sample_rate: u32,
    bit_rate_kbps: f64,
    frame_len: usize,
    channel_mode: String,
    lfe: bool,
    bsid: u8,
    bsmod: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    dolby_surround: Option<&'static str>,
}

impl From<&FrameHeader> for FormatReport {
    fn from(header: &FrameHeader) -> Self {
        Self {
            sample_rate: header.sample_rate,
            bit_rate_kbps: header.bit_rate as f64 / 1000.0,
            frame_len: header.frame_len,
            channel_mode: header.acmod.to_string(),
            lfe: header.lfe,
            bsid: header.bsid,
            bsmod: header.bsmod,
            dolby_surround: header.dsurmod.map(|mode| match mode {
                0 => "Not indicated",
                1 => "Not encoded",
                2 => "Encoded",
                _ => "Reserved",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct SyncReport {
    crc_verified: bool,
    headers: u64,
    no_sync: u64,
    bytes_skipped: u64,
    crc_failures: u64,
    bytes_discarded: u64,
}

impl SyncReport {
    fn new(stats: &StreamStats, crc_verified: bool) -> Self {
        Self {
            crc_verified,
            headers: stats.headers,
            no_sync: stats.no_sync,
            bytes_skipped: stats.bytes_skipped,
            crc_failures: stats.crc_failures,
            bytes_discarded: stats.bytes_discarded,
        }
    }
}

#[derive(Default)]
struct AnalysisContext {
    first: Option<FrameHeader>,
    last: Option<FrameHeader>,
    format_changes: u64,
    frame_count: u64,
    duration_secs: f64,
    pb: Option<ProgressBar>,
}

impl AnalysisContext {
    fn process_frame(&mut self, header: FrameHeader) {
        if let Some(last) = &self.last {
            if last.sample_rate != header.sample_rate || last.flags != header.flags {
                self.format_changes += 1;
                log::info!(
                    "Format change at frame {}: {} Hz {} -> {} Hz {}",
                    self.frame_count,
                    last.sample_rate,
                    last.flags,
                    header.sample_rate,
                    header.flags
                );
            }
        }

        self.first.get_or_insert(header);
        self.last = Some(header);

        // Each frame at its own rate
        self.duration_secs += header.samples() as f64 / header.sample_rate as f64;
        self.frame_count += 1;

        if self.frame_count.is_multiple_of(500) {
            if let Some(ref pb) = self.pb {
                pb.set_message(format!("Analyzing frames...       {}", self.frame_count));
            }
        }
    }
}

fn analyze_stream(
    input_path: &Path,
    verify_crc: bool,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<StreamReport> {
    let mut input_reader = InputReader::new(input_path)?;
    let mut extractor = Extractor::new(MAX_FRAME_LEN, verify_crc);
    let mut context = AnalysisContext::default();

    if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg} [{bytes}]")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Analyzing frames...");
        context.pb = Some(pb);
    }

    let total_bytes = input_reader.process_chunks(cli.chunk_size as usize, |chunk| {
        let mut input = chunk;
        while let Some(header) = extractor.next_frame(&mut input) {
            context.process_frame(header);
        }

        if let Some(ref pb) = context.pb {
            pb.inc(chunk.len() as u64);
        }
        Ok(())
    })?;

    extractor.finish();

    if let Some(ref pb) = context.pb {
        pb.finish_and_clear();
    }

    if context.first.is_none() {
        log::warn!("No AC-3 sync frame found in {}", input_path.display());
    }

    let duration_secs = context.duration_secs;
    let average_kbps =
        (duration_secs > 0.0).then(|| total_bytes as f64 * 8.0 / (duration_secs * 1000.0));

    Ok(StreamReport {
        input: input_path.display().to_string(),
        format: context.first.as_ref().map(FormatReport::from),
        frames: context.frame_count,
        format_changes: context.format_changes,
        duration: time_str(duration_secs),
        duration_secs,
        size_bytes: total_bytes,
        average_kbps,
        sync: SyncReport::new(extractor.stats(), verify_crc),
    })
}

fn display_report(report: &StreamReport) {
    println!();
    println!("AC-3 Stream Information");
    println!("=======================");
    println!();

    match &report.format {
        Some(format) => display_format(format),
        None => {
            println!("No AC-3 sync frame found in the input.");
            println!();
        }
    }

    println!("Analysis Summary");
    println!("  Frames processed          {}", report.frames);
    if report.format_changes > 0 {
        println!("  Format changes            {}", report.format_changes);
    }

    let size_mb = report.size_bytes as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        report.size_bytes
    );
    println!("  Duration                  {}", report.duration);
    if let Some(kbps) = report.average_kbps {
        println!("  Average data rate         {kbps:.1} kbps");
    }
    println!();

    display_sync(&report.sync);
}

fn display_format(format: &FormatReport) {
    println!("Stream Information");
    println!("  Sampling rate             {} Hz", format.sample_rate);
    println!("  Bit rate                  {} kbps", format.bit_rate_kbps);
    println!("  Frame size                {} bytes", format.frame_len);
    println!("  Audio coding mode         {}", format.channel_mode);
    println!("  LFE                       {}", format.lfe);
    if let Some(surround) = format.dolby_surround {
        println!("  Dolby Surround            {surround}");
    }
    println!("  Bitstream ID              {}", format.bsid);
    println!("  Bitstream mode            {}", format.bsmod);
    println!();
}

fn display_sync(sync: &SyncReport) {
    println!("Synchronization");
    println!("  Headers found             {}", sync.headers);
    println!("  Bytes skipped             {}", sync.bytes_skipped);
    println!("  Trailing bytes dropped    {}", sync.bytes_discarded);
    if sync.crc_verified {
        println!("  CRC failures              {}", sync.crc_failures);
    } else {
        println!("  CRC failures              not checked");
    }
    println!();
}
