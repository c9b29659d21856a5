use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::{Cli, ExtractArgs};
use crate::input::InputReader;
use ac3::process::extract::Extractor;
use ac3::structs::header::MAX_FRAME_LEN;

pub fn cmd_extract(args: &ExtractArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Extracting AC-3 frames: {} -> {} (CRC check: {})",
        args.input.display(),
        args.output.display(),
        args.verify_crc
    );

    let mut input_reader = InputReader::new(&args.input)?;
    if input_reader.is_pipe() {
        log::debug!("Reading from stdin");
    }

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template(
                "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
            )?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        }
        None => None,
    };

    let mut extractor = Extractor::new(MAX_FRAME_LEN, args.verify_crc);
    let mut written = 0u64;

    input_reader.process_chunks(cli.chunk_size as usize, |chunk| {
        let mut input = chunk;
        while extractor.next_frame(&mut input).is_some() {
            if let Some(frame) = extractor.frame() {
                writer.write_all(frame)?;
                written += frame.len() as u64;
            }

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
        }

        if let Some(ref pb) = pb {
            pb.set_message(format!("{written} bytes written"));
        }
        Ok(())
    })?;

    extractor.finish();
    writer.flush()?;

    if let Some(ref pb) = pb {
        pb.finish_and_clear();
    }

    let stats = extractor.stats();
    log::info!(
        "Wrote {} frames ({written} bytes), skipped {} bytes, dropped {} frames on CRC, {} trailing bytes",
        stats.frames - stats.crc_failures,
        stats.bytes_skipped,
        stats.crc_failures,
        stats.bytes_discarded
    );

    Ok(())
}
